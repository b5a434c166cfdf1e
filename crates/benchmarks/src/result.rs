//! Benchmark result types.
//!
//! This module provides the canonical BenchmarkResult record written for
//! every completed search.

use chrono::{DateTime, Utc};
use mq_throughput_core::{RunIdentity, SearchOutcome};
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Canonical benchmark result structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkResult {
    /// Unique identifier for the benchmark target.
    pub target_id: String,
    /// Metrics data in JSON format.
    pub metrics: serde_json::Value,
    /// Timestamp when the benchmark was executed.
    pub timestamp: DateTime<Utc>,
}

impl BenchmarkResult {
    /// Create a new BenchmarkResult.
    pub fn new(target_id: impl Into<String>, metrics: serde_json::Value) -> Self {
        Self {
            target_id: target_id.into(),
            metrics,
            timestamp: Utc::now(),
        }
    }

    /// Build the record of a completed search against `connector`.
    ///
    /// `metrics` carries the run identity, the best worker count with its
    /// totals and rate, and every sample taken.
    pub fn from_search(identity: &RunIdentity, connector: &str, outcome: &SearchOutcome) -> Self {
        let best = outcome.best.as_ref().map(|best| {
            json!({
                "workers": outcome.best_workers,
                "messages_total": best.messages_total(),
                "duration_ns": best.duration_ns(),
                "messages_per_second": best.messages_per_second(),
                "per_worker": best.workers(),
            })
        });

        Self::new(
            format!("mq/{}", connector),
            json!({
                "run_id": identity.run_id,
                "run": identity,
                "connector": connector,
                "best": best,
                "samples": outcome.history,
            }),
        )
    }

    /// Worker count of the best sample, if the record has one.
    pub fn best_workers(&self) -> Option<u64> {
        self.metrics["best"]["workers"].as_u64()
    }

    /// Rate of the best sample, if the record has one.
    pub fn best_messages_per_second(&self) -> Option<f64> {
        self.metrics["best"]["messages_per_second"].as_f64()
    }

    /// Number of samples in the record.
    pub fn sample_count(&self) -> usize {
        self.metrics["samples"].as_array().map_or(0, |s| s.len())
    }

    /// File-system friendly name of this record.
    pub fn file_stem(&self) -> String {
        let run_id = self.metrics["run_id"].as_str().unwrap_or("run");
        format!("{}_{}", self.target_id.replace('/', "_"), run_id)
    }
}
