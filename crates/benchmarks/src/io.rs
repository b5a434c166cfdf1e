//! I/O operations for benchmark results.
//!
//! Reports are written under an output directory:
//! - `raw/<target>_<run_id>.json` - one file per search
//! - `all_results.json` - every record of this invocation
//! - `summary.md` - Markdown summary

use crate::markdown;
use crate::result::BenchmarkResult;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Raw results subdirectory.
pub const RAW_DIR: &str = "raw";

/// Combined results file name.
pub const ALL_RESULTS_FILE: &str = "all_results.json";

/// Summary file name.
pub const SUMMARY_FILE: &str = "summary.md";

/// Output formats that can be written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Raw and combined JSON only.
    Json,
    /// Markdown summary only.
    Markdown,
    /// JSON and Markdown.
    Both,
}

impl OutputFormat {
    fn json(self) -> bool {
        matches!(self, OutputFormat::Json | OutputFormat::Both)
    }

    fn markdown(self) -> bool {
        matches!(self, OutputFormat::Markdown | OutputFormat::Both)
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            "both" => Ok(OutputFormat::Both),
            other => Err(format!("unknown output format: {}", other)),
        }
    }
}

/// Ensure output directories exist.
pub fn ensure_output_dirs(output_dir: &Path) -> io::Result<()> {
    fs::create_dir_all(output_dir.join(RAW_DIR))
}

/// Write benchmark results to JSON file.
pub fn write_results_json(results: &[BenchmarkResult], path: impl AsRef<Path>) -> io::Result<()> {
    let json = serde_json::to_string_pretty(results)
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
    fs::write(path, json)
}

/// Write individual result to the raw directory and return its path.
pub fn write_raw_result(output_dir: &Path, result: &BenchmarkResult) -> io::Result<PathBuf> {
    ensure_output_dirs(output_dir)?;
    let path = output_dir
        .join(RAW_DIR)
        .join(format!("{}.json", result.file_stem()));
    let json = serde_json::to_string_pretty(result)
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
    fs::write(&path, json)?;
    Ok(path)
}

/// Write summary markdown file.
pub fn write_summary(output_dir: &Path, results: &[BenchmarkResult]) -> io::Result<()> {
    ensure_output_dirs(output_dir)?;
    let summary = markdown::generate_summary(results);
    fs::write(output_dir.join(SUMMARY_FILE), summary)
}

/// Write all benchmark outputs in `format`.
pub fn write_all_outputs(
    output_dir: &Path,
    results: &[BenchmarkResult],
    format: OutputFormat,
) -> io::Result<()> {
    ensure_output_dirs(output_dir)?;

    if format.json() {
        for result in results {
            write_raw_result(output_dir, result)?;
        }
        write_results_json(results, output_dir.join(ALL_RESULTS_FILE))?;
    }

    if format.markdown() {
        write_summary(output_dir, results)?;
    }

    Ok(())
}

/// Read results from JSON file.
pub fn read_results_json(path: impl AsRef<Path>) -> io::Result<Vec<BenchmarkResult>> {
    let content = fs::read_to_string(path)?;
    serde_json::from_str(&content)
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))
}
