// Copyright 2025 MQ Throughput Contributors
// SPDX-License-Identifier: Apache-2.0

//! Errors raised by the sampling harness and metrics egress.

use thiserror::Error;

/// Errors that can occur while sampling or exporting results.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// A worker could not connect to the queue.
    #[error("Connection failed: {0}")]
    Connect(String),

    /// The queue stopped accepting messages.
    #[error("Queue closed")]
    QueueClosed,

    /// The sample was called off before workers started sending.
    #[error("Sample aborted before start")]
    Aborted,

    /// A worker failed or panicked during a sample.
    #[error("Worker error: {0}")]
    Worker(String),

    /// Installing or rendering the metrics recorder failed.
    #[error("Metrics error: {0}")]
    Metrics(String),

    /// Pushing metrics to the gateway failed.
    #[error("Push to {url} failed: {reason}")]
    Push {
        /// Target URL of the push.
        url: String,
        /// Failure description.
        reason: String,
    },

    /// IO error
    #[error("IO error")]
    Io(#[from] std::io::Error),
}

/// Result type for adapter operations.
pub type Result<T> = std::result::Result<T, AdapterError>;
