// Copyright 2025 MQ Throughput Contributors
// SPDX-License-Identifier: Apache-2.0

//! Measurement model for throughput samples.
//!
//! A [`WorkerResult`] is the immutable outcome of one worker's run. A
//! [`Results`] aggregates the worker outcomes of one sample (one worker
//! count) and keeps its derived rates current on every addition.
//!
//! Rates are always derived from totals (sum of messages over sum of
//! durations), never by averaging per-worker rates.
//!
//! # Degenerate measurements
//!
//! A measurement with a zero duration has no meaningful rate. Its stored
//! `messages_per_second` is `0.0` so it prints cleanly, and its
//! [`Throughput`] is [`Throughput::Degenerate`], which ranks below every
//! measured rate (including a measured `0.0`).

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::time::Duration;

const NANOS_PER_SECOND: f64 = 1e9;

/// Comparable throughput of a measurement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Throughput {
    /// Zero elapsed time; the rate is undefined.
    Degenerate,
    /// Messages per second over a non-zero duration.
    Measured(f64),
}

impl PartialOrd for Throughput {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Throughput::Degenerate, Throughput::Degenerate) => Some(Ordering::Equal),
            (Throughput::Degenerate, Throughput::Measured(_)) => Some(Ordering::Less),
            (Throughput::Measured(_), Throughput::Degenerate) => Some(Ordering::Greater),
            (Throughput::Measured(a), Throughput::Measured(b)) => a.partial_cmp(b),
        }
    }
}

fn derive_rates(messages_total: u64, duration_ns: u64) -> (f64, f64) {
    let duration_seconds = duration_ns as f64 / NANOS_PER_SECOND;
    let messages_per_second = if duration_ns == 0 {
        0.0
    } else {
        messages_total as f64 / duration_seconds
    };
    (duration_seconds, messages_per_second)
}

fn throughput(duration_ns: u64, messages_per_second: f64) -> Throughput {
    if duration_ns == 0 || !messages_per_second.is_finite() {
        Throughput::Degenerate
    } else {
        Throughput::Measured(messages_per_second)
    }
}

/// Outcome of a single worker's run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerResult {
    worker_id: u32,
    messages_total: u64,
    duration_ns: u64,
    duration_seconds: f64,
    messages_per_second: f64,
}

impl WorkerResult {
    /// Create a worker result, deriving its rates immediately.
    pub fn new(worker_id: u32, messages_total: u64, duration_ns: u64) -> Self {
        let (duration_seconds, messages_per_second) = derive_rates(messages_total, duration_ns);
        Self {
            worker_id,
            messages_total,
            duration_ns,
            duration_seconds,
            messages_per_second,
        }
    }

    /// Create a worker result from a measured elapsed time.
    ///
    /// Durations beyond `u64::MAX` nanoseconds saturate.
    pub fn from_elapsed(worker_id: u32, messages_total: u64, elapsed: Duration) -> Self {
        let duration_ns = u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX);
        Self::new(worker_id, messages_total, duration_ns)
    }

    /// Caller-assigned worker identifier.
    pub fn worker_id(&self) -> u32 {
        self.worker_id
    }

    /// Messages processed by this worker.
    pub fn messages_total(&self) -> u64 {
        self.messages_total
    }

    /// Elapsed time in nanoseconds.
    pub fn duration_ns(&self) -> u64 {
        self.duration_ns
    }

    /// Elapsed time in seconds.
    pub fn duration_seconds(&self) -> f64 {
        self.duration_seconds
    }

    /// Messages per second, `0.0` for a degenerate measurement.
    pub fn messages_per_second(&self) -> f64 {
        self.messages_per_second
    }

    /// Comparable rate of this worker.
    pub fn throughput(&self) -> Throughput {
        throughput(self.duration_ns, self.messages_per_second)
    }
}

/// Aggregate of worker results for one sample.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Results {
    workers: Vec<WorkerResult>,
    messages_total: u64,
    duration_ns: u64,
    duration_seconds: f64,
    messages_per_second: f64,
}

impl Results {
    /// Create an empty aggregate.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a worker result and recompute the derived rates from the
    /// updated totals.
    pub fn add(&mut self, worker: WorkerResult) {
        self.messages_total = self.messages_total.saturating_add(worker.messages_total);
        self.duration_ns = self.duration_ns.saturating_add(worker.duration_ns);
        self.workers.push(worker);

        let (duration_seconds, messages_per_second) =
            derive_rates(self.messages_total, self.duration_ns);
        self.duration_seconds = duration_seconds;
        self.messages_per_second = messages_per_second;
    }

    /// Worker results in insertion order.
    pub fn workers(&self) -> &[WorkerResult] {
        &self.workers
    }

    /// Number of worker results added.
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Whether no worker result has been added.
    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }

    /// Sum of messages over all workers.
    pub fn messages_total(&self) -> u64 {
        self.messages_total
    }

    /// Sum of worker durations in nanoseconds (aggregate work, not wall-clock).
    pub fn duration_ns(&self) -> u64 {
        self.duration_ns
    }

    /// Sum of worker durations in seconds.
    pub fn duration_seconds(&self) -> f64 {
        self.duration_seconds
    }

    /// Aggregate messages per second, `0.0` for a degenerate aggregate.
    pub fn messages_per_second(&self) -> f64 {
        self.messages_per_second
    }

    /// Comparable aggregate rate.
    pub fn throughput(&self) -> Throughput {
        throughput(self.duration_ns, self.messages_per_second)
    }

    /// Whether this aggregate's rate is strictly greater than `other`'s.
    ///
    /// Equal rates do not improve, and a degenerate rate never improves on
    /// anything.
    pub fn improves_on(&self, other: &Results) -> bool {
        matches!(
            self.throughput().partial_cmp(&other.throughput()),
            Some(Ordering::Greater)
        )
    }

    /// Print the per-worker counts and the aggregate totals to stdout.
    pub fn print(&self) {
        println!("{}", self);
    }
}

impl Extend<WorkerResult> for Results {
    fn extend<I: IntoIterator<Item = WorkerResult>>(&mut self, iter: I) {
        for worker in iter {
            self.add(worker);
        }
    }
}

impl FromIterator<WorkerResult> for Results {
    fn from_iter<I: IntoIterator<Item = WorkerResult>>(iter: I) -> Self {
        let mut results = Results::new();
        results.extend(iter);
        results
    }
}

impl fmt::Display for Results {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for worker in &self.workers {
            writeln!(f, "{}: {}", worker.worker_id, worker.messages_total)?;
        }
        writeln!(f, "Total: {}", self.messages_total)?;
        write!(f, "Total mps: {:.6}", self.messages_per_second)
    }
}
