// Copyright 2025 MQ Throughput Contributors
// SPDX-License-Identifier: Apache-2.0

//! Prometheus metrics egress.
//!
//! Samples are recorded through the `metrics` facade into a
//! `metrics-exporter-prometheus` recorder. After a search, the rendered
//! exposition is pushed to a push gateway with push-add semantics
//! (`POST`, existing series of other jobs are kept).
//!
//! Pushing is fire-and-forget from the search's point of view: a failed
//! push never changes the search result.

use crate::error::{AdapterError, Result};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use mq_throughput_core::{Results, RunIdentity};
use reqwest::header::CONTENT_TYPE;
use std::time::Duration;
use tracing::{debug, info};

/// Rate of each sample, labelled by worker count.
pub const MESSAGES_PER_SECOND: &str = "mq_messages_per_second";
/// Message total of each sample, labelled by worker count.
pub const MESSAGES_TOTAL: &str = "mq_messages_total";
/// Number of samples taken.
pub const SAMPLES_TOTAL: &str = "mq_samples_total";
/// Worker count of the best sample.
pub const BEST_WORKERS: &str = "mq_best_workers";
/// Rate of the best sample.
pub const BEST_MESSAGES_PER_SECOND: &str = "mq_best_messages_per_second";

const EXPOSITION_CONTENT_TYPE: &str = "text/plain; version=0.0.4";
const PUSH_TIMEOUT: Duration = Duration::from_secs(10);

/// Install the Prometheus recorder as the global `metrics` recorder.
pub fn install_recorder() -> Result<PrometheusHandle> {
    PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| AdapterError::Metrics(e.to_string()))
}

/// Record one sample.
pub fn record_sample(workers: usize, results: &Results) {
    let label = workers.to_string();
    metrics::gauge!(MESSAGES_PER_SECOND, "workers" => label.clone())
        .set(results.messages_per_second());
    metrics::gauge!(MESSAGES_TOTAL, "workers" => label).set(results.messages_total() as f64);
    metrics::counter!(SAMPLES_TOTAL).increment(1);
}

/// Record the final answer of a search.
pub fn record_best(workers: usize, results: &Results) {
    metrics::gauge!(BEST_WORKERS).set(workers as f64);
    metrics::gauge!(BEST_MESSAGES_PER_SECOND).set(results.messages_per_second());
}

/// Pushes rendered metrics to a Prometheus push gateway.
#[derive(Debug, Clone)]
pub struct MetricsPusher {
    client: reqwest::Client,
    gateway_url: String,
    job: String,
    grouping: Vec<(String, String)>,
}

impl MetricsPusher {
    /// Create a pusher for `job` on the gateway at `gateway_url`.
    pub fn new(gateway_url: impl Into<String>, job: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(PUSH_TIMEOUT)
            .build()
            .map_err(|e| AdapterError::Metrics(e.to_string()))?;
        Ok(Self {
            client,
            gateway_url: gateway_url.into(),
            job: job.into(),
            grouping: Vec::new(),
        })
    }

    /// Add a grouping key to the push path.
    pub fn with_grouping(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.grouping.push((key.into(), value.into()));
        self
    }

    /// Group pushes by language and run id.
    pub fn for_run(self, identity: &RunIdentity) -> Self {
        self.with_grouping("lang", identity.lang.clone())
            .with_grouping("run_id", identity.run_id.to_string())
    }

    /// Push-gateway URL this pusher posts to.
    pub fn push_url(&self) -> String {
        let mut url = format!(
            "{}/metrics/job/{}",
            self.gateway_url.trim_end_matches('/'),
            self.job
        );
        for (key, value) in &self.grouping {
            url.push('/');
            url.push_str(key);
            url.push('/');
            url.push_str(value);
        }
        url
    }

    /// Push a rendered exposition body.
    pub async fn push(&self, body: String) -> Result<()> {
        let url = self.push_url();
        debug!(url = %url, bytes = body.len(), "Pushing metrics");

        let response = self
            .client
            .post(&url)
            .header(CONTENT_TYPE, EXPOSITION_CONTENT_TYPE)
            .body(body)
            .send()
            .await
            .map_err(|e| AdapterError::Push {
                url: url.clone(),
                reason: e.to_string(),
            })?;
        response.error_for_status().map_err(|e| AdapterError::Push {
            url: url.clone(),
            reason: e.to_string(),
        })?;

        info!(url = %url, "Metrics pushed");
        Ok(())
    }

    /// Render `handle` and push it.
    pub async fn push_handle(&self, handle: &PrometheusHandle) -> Result<()> {
        self.push(handle.render()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mq_throughput_core::WorkerResult;

    fn sample(messages: u64) -> Results {
        let mut results = Results::new();
        results.add(WorkerResult::new(1, messages, 1_000_000_000));
        results
    }

    #[test]
    fn test_records_sample_and_best() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();

        metrics::with_local_recorder(&recorder, || {
            record_sample(4, &sample(400));
            record_sample(8, &sample(360));
            record_best(4, &sample(400));
        });

        let rendered = handle.render();
        assert!(rendered.contains("mq_messages_per_second{workers=\"4\"} 400"));
        assert!(rendered.contains("mq_messages_per_second{workers=\"8\"} 360"));
        assert!(rendered.contains("mq_samples_total 2"));
        assert!(rendered.contains("mq_best_workers 4"));
    }

    #[test]
    fn test_push_url() {
        let pusher = MetricsPusher::new("http://localhost:9091/", "mq-producer")
            .unwrap()
            .with_grouping("lang", "rust");
        assert_eq!(
            pusher.push_url(),
            "http://localhost:9091/metrics/job/mq-producer/lang/rust"
        );
    }

    #[test]
    fn test_push_url_for_run() {
        let identity = RunIdentity::collect();
        let pusher = MetricsPusher::new("http://gateway:9091", "job")
            .unwrap()
            .for_run(&identity);
        assert_eq!(
            pusher.push_url(),
            format!("http://gateway:9091/metrics/job/job/lang/rust/run_id/{}", identity.run_id)
        );
    }

    #[tokio::test]
    async fn test_push_to_unreachable_gateway_fails() {
        let pusher = MetricsPusher::new("http://127.0.0.1:1", "mq-producer").unwrap();
        let err = pusher.push("test 2\n".to_string()).await.unwrap_err();
        assert!(matches!(err, AdapterError::Push { .. }));
    }
}
