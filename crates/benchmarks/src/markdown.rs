//! Markdown output generation for benchmark results.

use crate::result::BenchmarkResult;
use std::fmt::Write;

/// Generate a markdown summary from benchmark results.
pub fn generate_summary(results: &[BenchmarkResult]) -> String {
    let mut output = String::new();

    writeln!(output, "# Throughput Search Summary").unwrap();
    writeln!(output).unwrap();
    writeln!(output, "Generated: {}", chrono::Utc::now().to_rfc3339()).unwrap();
    writeln!(output).unwrap();
    writeln!(output, "## Results").unwrap();
    writeln!(output).unwrap();
    writeln!(output, "| Target ID | Timestamp | Best Workers | Messages/s | Samples |").unwrap();
    writeln!(output, "|-----------|-----------|--------------|------------|---------|").unwrap();

    for result in results {
        let workers = result
            .best_workers()
            .map_or_else(|| "-".to_string(), |w| w.to_string());
        let rate = result
            .best_messages_per_second()
            .map_or_else(|| "-".to_string(), |r| format!("{:.2}", r));
        writeln!(
            output,
            "| {} | {} | {} | {} | {} |",
            result.target_id,
            result.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
            workers,
            rate,
            result.sample_count()
        )
        .unwrap();
    }

    for result in results {
        writeln!(output).unwrap();
        write_samples(&mut output, result);
    }

    writeln!(output).unwrap();
    writeln!(output, "---").unwrap();
    writeln!(output, "Total searches: {}", results.len()).unwrap();

    output
}

fn write_samples(output: &mut String, result: &BenchmarkResult) {
    writeln!(output, "### {} samples", result.target_id).unwrap();
    writeln!(output).unwrap();
    writeln!(output, "| Workers | Phase | Messages | Messages/s | Improved |").unwrap();
    writeln!(output, "|---------|-------|----------|------------|----------|").unwrap();

    let samples = result.metrics["samples"].as_array().cloned().unwrap_or_default();
    for sample in &samples {
        writeln!(
            output,
            "| {} | {} | {} | {:.2} | {} |",
            sample["workers"],
            sample["phase"].as_str().unwrap_or("-"),
            sample["messages_total"],
            sample["messages_per_second"].as_f64().unwrap_or(0.0),
            if sample["improved"].as_bool().unwrap_or(false) {
                "yes"
            } else {
                "no"
            }
        )
        .unwrap();
    }
}
