// Copyright 2025 MQ Throughput Contributors
// SPDX-License-Identifier: Apache-2.0

//! Benchmark configuration.
//!
//! Settings are layered, lowest precedence first:
//!
//! 1. Built-in defaults
//! 2. An optional TOML file
//! 3. Environment variables prefixed with `MQ_` (a `.env` file is honoured)
//!
//! Loading does not validate. Callers apply their own overrides first and
//! then call [`BenchConfig::validate`].
//!
//! # Example
//!
//! ```ignore
//! use mq_throughput_adapters::config::BenchConfig;
//!
//! // MQ_DURATION_SECS=5 MQ_MAX_WORKERS=64
//! let config = BenchConfig::load(None)?;
//! config.validate()?;
//! let bounds = config.search_bounds()?;
//! ```

use mq_throughput_core::SearchBounds;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Prefix of environment variables read by [`BenchConfig::load`].
pub const ENV_PREFIX: &str = "MQ";

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Reading or deserializing a source failed.
    #[error("Failed to load configuration")]
    Load(#[from] config::ConfigError),

    /// A value is out of range.
    #[error("Invalid configuration value for {key}: {reason}")]
    Invalid {
        /// Offending key.
        key: &'static str,
        /// Why it was rejected.
        reason: String,
    },

    /// The search bounds are inconsistent.
    #[error("Invalid search bounds")]
    Bounds(#[from] mq_throughput_core::Error),
}

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Settings for a benchmark run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchConfig {
    /// Length of each sample in seconds.
    pub duration_secs: u64,
    /// First probe is `2^starting_power` workers.
    pub starting_power: u32,
    /// Upper limit on the worker count.
    pub max_workers: Option<usize>,
    /// Capacity of the in-memory queue.
    pub queue_capacity: usize,
    /// Base URL of the Prometheus push gateway.
    pub pushgateway_url: String,
    /// Job name used when pushing metrics.
    pub job_name: String,
    /// Directory reports are written to.
    pub output_dir: PathBuf,
    /// Default log filter when `RUST_LOG` is unset.
    pub log_level: String,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            duration_secs: 3,
            starting_power: 0,
            max_workers: None,
            queue_capacity: 1024,
            pushgateway_url: "http://localhost:9091".to_string(),
            job_name: "mq-producer".to_string(),
            output_dir: PathBuf::from("benchmarks/output"),
            log_level: "info".to_string(),
        }
    }
}

impl BenchConfig {
    /// Load configuration from defaults, an optional file, `.env` and the
    /// process environment.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        // Missing .env is fine
        let _ = dotenvy::dotenv();
        Self::from_sources(file, None)
    }

    /// Load configuration using `env` in place of the process environment.
    ///
    /// Keys in `env` carry the `MQ_` prefix, as real environment variables do.
    pub fn from_sources(file: Option<&Path>, env: Option<HashMap<String, String>>) -> Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = file {
            builder = builder.add_source(config::File::from(path).required(true));
        }
        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .try_parsing(true)
                .source(env),
        );

        Ok(builder.build()?.try_deserialize()?)
    }

    /// Reject values the harness cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.duration_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "duration_secs",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.queue_capacity == 0 {
            return Err(ConfigError::Invalid {
                key: "queue_capacity",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.job_name.is_empty() {
            return Err(ConfigError::Invalid {
                key: "job_name",
                reason: "must not be empty".to_string(),
            });
        }
        self.search_bounds()?;
        Ok(())
    }

    /// Search bounds derived from `starting_power` and `max_workers`.
    pub fn search_bounds(&self) -> Result<SearchBounds> {
        Ok(SearchBounds::new(self.starting_power, self.max_workers)?)
    }

    /// Length of each sample.
    pub fn sample_duration(&self) -> Duration {
        Duration::from_secs(self.duration_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> Option<HashMap<String, String>> {
        Some(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn test_defaults() {
        let config = BenchConfig::from_sources(None, env(&[])).unwrap();
        assert_eq!(config, BenchConfig::default());
        assert_eq!(config.sample_duration(), Duration::from_secs(3));
        assert_eq!(config.search_bounds().unwrap(), SearchBounds::default());
    }

    #[test]
    fn test_environment_overrides() {
        let config = BenchConfig::from_sources(
            None,
            env(&[
                ("MQ_DURATION_SECS", "5"),
                ("MQ_MAX_WORKERS", "64"),
                ("MQ_JOB_NAME", "bench"),
            ]),
        )
        .unwrap();

        assert_eq!(config.duration_secs, 5);
        assert_eq!(config.max_workers, Some(64));
        assert_eq!(config.job_name, "bench");
        assert_eq!(config.queue_capacity, 1024);
    }

    #[test]
    fn test_file_then_environment() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "duration_secs = 10").unwrap();
        writeln!(file, "starting_power = 2").unwrap();
        writeln!(file, "queue_capacity = 16").unwrap();

        let config =
            BenchConfig::from_sources(Some(file.path()), env(&[("MQ_DURATION_SECS", "7")])).unwrap();

        assert_eq!(config.duration_secs, 7);
        assert_eq!(config.starting_power, 2);
        assert_eq!(config.queue_capacity, 16);
    }

    #[test]
    fn test_rejects_zero_duration() {
        let config = BenchConfig::from_sources(None, env(&[("MQ_DURATION_SECS", "0")])).unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("duration_secs"));
    }

    #[test]
    fn test_inconsistent_bounds_load_but_fail_validation() {
        let config = BenchConfig::from_sources(
            None,
            env(&[("MQ_STARTING_POWER", "4"), ("MQ_MAX_WORKERS", "8")]),
        )
        .unwrap();
        assert_eq!(config.max_workers, Some(8));

        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Bounds(_)));
        assert_eq!(err.to_string(), "Invalid search bounds");
        let source = std::error::Error::source(&err).unwrap().to_string();
        assert!(source.contains("exceeds max_workers 8"));
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let result = BenchConfig::from_sources(Some(Path::new("/nonexistent/mq.toml")), env(&[]));
        assert!(matches!(result, Err(ConfigError::Load(_))));
    }
}
