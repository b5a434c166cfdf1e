// Copyright 2025 MQ Throughput Contributors
// SPDX-License-Identifier: Apache-2.0

//! Adapters connecting the maximum search to real infrastructure.
//!
//! - **Configuration**: layered defaults, TOML file and `MQ_` environment
//! - **Queue**: the [`Connector`]/[`Producer`] seam and an in-memory queue
//! - **Sampler**: [`QueueSampler`], a threaded implementation of
//!   [`mq_throughput_core::Sampler`]
//! - **Prometheus**: metrics recording and push-gateway egress
//!
//! # Example
//!
//! ```no_run
//! use mq_throughput_adapters::prelude::*;
//! use mq_throughput_core::find_maximum;
//! use std::time::Duration;
//!
//! let connector = InMemoryConnector::new(1024)?;
//! let sampler = QueueSampler::new(connector, Duration::from_secs(3));
//! let best = find_maximum(sampler);
//! # Ok::<(), mq_throughput_adapters::AdapterError>(())
//! ```

#![warn(missing_docs, rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod config;
pub mod error;
pub mod prometheus;
pub mod queue;
pub mod sampler;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use super::config::{BenchConfig, ConfigError};
    pub use super::error::{AdapterError, Result};
    pub use super::prometheus::MetricsPusher;
    pub use super::queue::{Connector, InMemoryConnector, Producer};
    pub use super::sampler::QueueSampler;
}

pub use config::BenchConfig;
pub use error::AdapterError;
pub use prometheus::MetricsPusher;
pub use queue::{Connector, InMemoryConnector, Producer};
pub use sampler::QueueSampler;
