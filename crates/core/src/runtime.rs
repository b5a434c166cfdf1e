// Copyright 2025 MQ Throughput Contributors
// SPDX-License-Identifier: Apache-2.0

//! Run identity metadata.
//!
//! Identifies one benchmark process for tagging exported results. None of
//! this feeds into the search itself.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const KERNEL_RELEASE_PATH: &str = "/proc/sys/kernel/osrelease";
const UNKNOWN: &str = "unknown";

/// Identity and platform metadata of a benchmark run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunIdentity {
    /// Process start time.
    pub started_at: DateTime<Utc>,
    /// Unique identifier of this run.
    pub run_id: Uuid,
    /// Implementation language.
    pub lang: String,
    /// Language version the crate was built for.
    pub lang_version: String,
    /// Runtime name.
    pub runtime: String,
    /// Operating system.
    pub os: String,
    /// Kernel release, `unknown` where it cannot be read.
    pub kernel: String,
    /// CPU architecture.
    pub arch: String,
}

impl RunIdentity {
    /// Collect identity metadata for the current process.
    pub fn collect() -> Self {
        Self {
            started_at: Utc::now(),
            run_id: Uuid::new_v4(),
            lang: "rust".to_string(),
            lang_version: env!("CARGO_PKG_RUST_VERSION").to_string(),
            runtime: "std-thread".to_string(),
            os: std::env::consts::OS.to_string(),
            kernel: kernel_release(),
            arch: std::env::consts::ARCH.to_string(),
        }
    }

    /// Label pairs used to tag exported metrics.
    pub fn labels(&self) -> Vec<(&'static str, String)> {
        vec![
            ("run_id", self.run_id.to_string()),
            ("lang", self.lang.clone()),
            ("lang_version", self.lang_version.clone()),
            ("runtime", self.runtime.clone()),
            ("os", self.os.clone()),
            ("kernel", self.kernel.clone()),
            ("arch", self.arch.clone()),
        ]
    }
}

fn kernel_release() -> String {
    std::fs::read_to_string(KERNEL_RELEASE_PATH)
        .map(|release| release.trim().to_string())
        .ok()
        .filter(|release| !release.is_empty())
        .unwrap_or_else(|| UNKNOWN.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collect_fills_platform_fields() {
        let identity = RunIdentity::collect();
        assert_eq!(identity.lang, "rust");
        assert_eq!(identity.os, std::env::consts::OS);
        assert_eq!(identity.arch, std::env::consts::ARCH);
        assert!(!identity.kernel.is_empty());
        assert!(identity.started_at <= Utc::now());
    }

    #[test]
    fn test_run_ids_are_unique() {
        let a = RunIdentity::collect();
        let b = RunIdentity::collect();
        assert_ne!(a.run_id, b.run_id);
    }

    #[test]
    fn test_labels_include_run_id() {
        let identity = RunIdentity::collect();
        let labels = identity.labels();
        assert!(labels
            .iter()
            .any(|(k, v)| *k == "run_id" && *v == identity.run_id.to_string()));
        assert_eq!(labels.len(), 7);
    }

    #[test]
    fn test_serialization_roundtrip() {
        let identity = RunIdentity::collect();
        let json = serde_json::to_string(&identity).unwrap();
        let back: RunIdentity = serde_json::from_str(&json).unwrap();
        assert_eq!(back, identity);
    }
}
