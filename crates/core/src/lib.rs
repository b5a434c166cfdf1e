// Copyright 2025 MQ Throughput Contributors
// SPDX-License-Identifier: Apache-2.0

//! Core types for worker-count throughput optimization.
//!
//! # Modules
//!
//! - [`measurement`] - `WorkerResult` and the `Results` aggregate
//! - [`search`] - the two-phase maximum search over worker counts
//! - [`runtime`] - run identity metadata for tagging exported results
//!
//! # Example
//!
//! ```
//! use mq_throughput_core::{find_maximum, Results, WorkerResult};
//!
//! // Throughput peaks at 6 workers.
//! let best = find_maximum(|workers: usize| {
//!     let rate = 600 - 50 * (workers as i64 - 6).unsigned_abs();
//!     let mut results = Results::new();
//!     results.add(WorkerResult::new(1, rate, 1_000_000_000));
//!     Some(results)
//! });
//!
//! assert_eq!(best.unwrap().messages_per_second(), 600.0);
//! ```

#![warn(missing_docs, rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod error;
pub mod measurement;
pub mod runtime;
pub mod search;

pub use error::{Error, Result};
pub use measurement::{Results, Throughput, WorkerResult};
pub use runtime::RunIdentity;
pub use search::{
    find_maximum, find_maximum_within, MaximumSearch, SamplePoint, Sampler, SearchBounds,
    SearchOutcome, SearchPhase,
};
