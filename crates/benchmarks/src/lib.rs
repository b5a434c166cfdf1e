//! Canonical benchmark records for MQ Throughput.
//!
//! Every completed search is turned into a [`BenchmarkResult`] and written
//! as JSON and Markdown.
//!
//! # Quick Start
//!
//! ```no_run
//! use mq_throughput_benchmarks::{write_search_report, OutputFormat};
//! use mq_throughput_core::{MaximumSearch, RunIdentity};
//! use std::path::Path;
//!
//! let identity = RunIdentity::collect();
//! let outcome = MaximumSearch::default().into_outcome();
//! let record = write_search_report(
//!     Path::new("benchmarks/output"),
//!     &identity,
//!     "in-memory",
//!     &outcome,
//!     OutputFormat::Both,
//! )?;
//! println!("{}: {}", record.target_id, record.metrics);
//! # Ok::<(), std::io::Error>(())
//! ```
//!
//! # Modules
//!
//! - [`result`] - The canonical `BenchmarkResult` struct
//! - [`io`] - I/O operations for reading/writing results
//! - [`markdown`] - Markdown report generation

#![warn(missing_docs, rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod io;
pub mod markdown;
pub mod result;

pub use io::OutputFormat;
pub use result::BenchmarkResult;

use mq_throughput_core::{RunIdentity, SearchOutcome};
use std::path::Path;

/// Record a completed search and write its outputs under `output_dir`.
///
/// # Errors
///
/// Returns an `io::Error` if writing output files fails.
pub fn write_search_report(
    output_dir: &Path,
    identity: &RunIdentity,
    connector: &str,
    outcome: &SearchOutcome,
    format: OutputFormat,
) -> std::io::Result<BenchmarkResult> {
    let record = BenchmarkResult::from_search(identity, connector, outcome);
    io::write_all_outputs(output_dir, std::slice::from_ref(&record), format)?;
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use mq_throughput_core::{find_maximum_within, Results, SearchBounds, WorkerResult};

    fn outcome() -> SearchOutcome {
        let rates = [(1usize, 100u64), (2, 200), (4, 400), (8, 360), (5, 350)];
        find_maximum_within(
            |w: usize| -> Option<Results> {
                let rate = rates.iter().find(|(workers, _)| *workers == w)?.1;
                let mut results = Results::new();
                results.add(WorkerResult::new(1, rate, 1_000_000_000));
                Some(results)
            },
            SearchBounds::default(),
        )
    }

    #[test]
    fn test_benchmark_result_has_required_fields() {
        let result = BenchmarkResult::new("test", serde_json::json!({"key": "value"}));
        assert_eq!(result.target_id, "test");
        assert!(result.metrics.is_object());
        assert!(result.timestamp <= Utc::now());
    }

    #[test]
    fn test_from_search_records_best_and_samples() {
        let identity = RunIdentity::collect();
        let record = BenchmarkResult::from_search(&identity, "in-memory", &outcome());

        assert_eq!(record.target_id, "mq/in-memory");
        assert_eq!(record.best_workers(), Some(4));
        assert_eq!(record.best_messages_per_second(), Some(400.0));
        assert_eq!(record.sample_count(), 5);
        assert_eq!(record.metrics["samples"][3]["phase"], "probing");
        assert_eq!(record.metrics["samples"][4]["phase"], "refining");
        assert_eq!(
            record.metrics["run_id"].as_str(),
            Some(identity.run_id.to_string().as_str())
        );
    }

    #[test]
    fn test_from_empty_search() {
        let identity = RunIdentity::collect();
        let record = BenchmarkResult::from_search(&identity, "in-memory", &SearchOutcome::default());
        assert!(record.metrics["best"].is_null());
        assert_eq!(record.best_workers(), None);
        assert_eq!(record.sample_count(), 0);
    }

    #[test]
    fn test_summary_lists_samples() {
        let identity = RunIdentity::collect();
        let record = BenchmarkResult::from_search(&identity, "in-memory", &outcome());
        let summary = markdown::generate_summary(std::slice::from_ref(&record));

        assert!(summary.contains("| mq/in-memory |"));
        assert!(summary.contains("| 4 | 400.00 | 5 |"));
        assert!(summary.contains("| 8 | probing | 360 | 360.00 | no |"));
        assert!(summary.contains("Total searches: 1"));
    }

    #[test]
    fn test_write_search_report() {
        let dir = tempfile::tempdir().unwrap();
        let identity = RunIdentity::collect();

        let record =
            write_search_report(dir.path(), &identity, "in-memory", &outcome(), OutputFormat::Both)
                .unwrap();

        let raw = dir
            .path()
            .join(io::RAW_DIR)
            .join(format!("{}.json", record.file_stem()));
        assert!(raw.exists());
        assert!(dir.path().join(io::SUMMARY_FILE).exists());

        let read = io::read_results_json(dir.path().join(io::ALL_RESULTS_FILE)).unwrap();
        assert_eq!(read.len(), 1);
        assert_eq!(read[0].best_workers(), Some(4));
    }

    #[test]
    fn test_markdown_only_skips_json() {
        let dir = tempfile::tempdir().unwrap();
        let identity = RunIdentity::collect();

        write_search_report(dir.path(), &identity, "in-memory", &outcome(), OutputFormat::Markdown)
            .unwrap();

        assert!(dir.path().join(io::SUMMARY_FILE).exists());
        assert!(!dir.path().join(io::ALL_RESULTS_FILE).exists());
    }

    #[test]
    fn test_output_format_parsing() {
        assert_eq!("json".parse::<OutputFormat>(), Ok(OutputFormat::Json));
        assert_eq!("MD".parse::<OutputFormat>(), Ok(OutputFormat::Markdown));
        assert_eq!("both".parse::<OutputFormat>(), Ok(OutputFormat::Both));
        assert!("xml".parse::<OutputFormat>().is_err());
    }
}
