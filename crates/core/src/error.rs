// Copyright 2025 MQ Throughput Contributors
// SPDX-License-Identifier: Apache-2.0

//! Error type shared by the core crate.

use thiserror::Error;

/// Errors produced by the measurement model and search configuration.
#[derive(Debug, Error)]
pub enum Error {
    /// A caller supplied a value outside the accepted range.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl Error {
    /// Build an [`Error::InvalidInput`] from any message.
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Error::InvalidInput(msg.into())
    }
}

/// Result alias for core operations.
pub type Result<T> = std::result::Result<T, Error>;
