// Copyright 2025 MQ Throughput Contributors
// SPDX-License-Identifier: Apache-2.0

//! Threaded throughput sampler.
//!
//! One sample runs `n` worker threads against a [`Connector`] for a fixed
//! duration:
//!
//! 1. Every worker connects, then waits at a start gate the coordinator
//!    opens once all spawned workers have arrived, so connection setup is
//!    not timed.
//! 2. Workers send sequential messages until the coordinator raises the
//!    stop flag after the sample duration.
//! 3. Each worker reports its own message count and elapsed time; the
//!    coordinator folds them into one [`Results`].
//!
//! If a worker thread cannot be spawned or a worker fails to connect, the
//! gate opens with an abort signal and the sample fails.

use crate::error::{AdapterError, Result};
use crate::queue::Connector;
use mq_throughput_core::{Results, Sampler, WorkerResult};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Samples throughput of a connector at a given worker count.
pub struct QueueSampler<C> {
    connector: C,
    duration: Duration,
}

impl<C: Connector> QueueSampler<C> {
    /// Create a sampler running each sample for `duration`.
    pub fn new(connector: C, duration: Duration) -> Self {
        Self {
            connector,
            duration,
        }
    }

    /// Consume the sampler and return its connector.
    pub fn into_connector(self) -> C {
        self.connector
    }

    /// Run `workers` concurrent workers for the sample duration.
    ///
    /// Fails if any worker cannot be spawned, connect or send, or if
    /// `workers` is zero.
    pub fn sample_workers(&self, workers: usize) -> Result<Results> {
        if workers == 0 {
            return Err(AdapterError::Worker("worker count must be positive".to_string()));
        }
        let last_id = u32::try_from(workers)
            .map_err(|_| AdapterError::Worker(format!("{} workers exceeds worker id range", workers)))?;

        info!(workers, connector = self.connector.name(), "Sampling workers");

        let gate = StartGate::new();
        let stop = AtomicBool::new(false);
        let failed = AtomicBool::new(false);

        let outcomes = thread::scope(|scope| -> Result<Vec<Result<WorkerResult>>> {
            let mut handles = Vec::with_capacity(workers);
            for worker_id in 1..=last_id {
                let gate = &gate;
                let stop = &stop;
                let failed = &failed;
                let connector = &self.connector;
                let spawned = thread::Builder::new()
                    .name(format!("mq-worker-{}", worker_id))
                    .spawn_scoped(scope, move || {
                        run_worker(worker_id, connector, gate, stop, failed)
                    });
                match spawned {
                    Ok(handle) => handles.push(handle),
                    Err(e) => {
                        warn!(worker_id, error = %e, "Failed to spawn worker, aborting sample");
                        // Release the workers already waiting at the gate.
                        gate.open(false);
                        return Err(AdapterError::Io(e));
                    }
                }
            }

            gate.wait_for(handles.len());
            let go = !failed.load(Ordering::Acquire);
            gate.open(go);
            if go {
                debug!(duration_ms = self.duration.as_millis() as u64, "Workers running");
                thread::sleep(self.duration);
            } else {
                warn!(workers, "Worker failed during setup, aborting sample");
            }
            stop.store(true, Ordering::Release);

            Ok(handles
                .into_iter()
                .enumerate()
                .map(|(index, handle)| {
                    handle.join().unwrap_or_else(|_| {
                        Err(AdapterError::Worker(format!("worker {} panicked", index + 1)))
                    })
                })
                .collect())
        })?;

        let mut results = Results::new();
        let mut aborted = false;
        for outcome in outcomes {
            match outcome {
                Ok(worker) => {
                    debug!(
                        worker_id = worker.worker_id(),
                        messages = worker.messages_total(),
                        "Worker result"
                    );
                    results.add(worker);
                }
                Err(AdapterError::Aborted) => aborted = true,
                Err(e) => return Err(e),
            }
        }
        if aborted {
            return Err(AdapterError::Aborted);
        }

        info!(
            workers,
            messages_total = results.messages_total(),
            messages_per_second = results.messages_per_second(),
            "Sample result"
        );
        Ok(results)
    }
}

/// Start line shared by the coordinator and the workers of one sample.
///
/// Unlike a barrier sized up front, the coordinator decides how many
/// arrivals to wait for and can open the gate before they all arrive.
struct StartGate {
    state: Mutex<GateState>,
    changed: Condvar,
}

#[derive(Default)]
struct GateState {
    arrived: usize,
    /// `Some(true)` to start, `Some(false)` to abort.
    signal: Option<bool>,
}

impl StartGate {
    fn new() -> Self {
        Self {
            state: Mutex::new(GateState::default()),
            changed: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, GateState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a ready worker and block until the gate opens. Returns
    /// whether the worker should run.
    fn arrive(&self) -> bool {
        let mut state = self.lock();
        state.arrived += 1;
        self.changed.notify_all();
        let state = self
            .changed
            .wait_while(state, |s| s.signal.is_none())
            .unwrap_or_else(PoisonError::into_inner);
        state.signal.unwrap_or(false)
    }

    /// Block until `workers` workers have arrived or the gate is open.
    fn wait_for(&self, workers: usize) {
        let state = self.lock();
        let _state = self
            .changed
            .wait_while(state, |s| s.arrived < workers && s.signal.is_none())
            .unwrap_or_else(PoisonError::into_inner);
    }

    fn open(&self, go: bool) {
        self.lock().signal = Some(go);
        self.changed.notify_all();
    }
}

fn run_worker<C: Connector>(
    worker_id: u32,
    connector: &C,
    gate: &StartGate,
    stop: &AtomicBool,
    failed: &AtomicBool,
) -> Result<WorkerResult> {
    let connected = connector.connect();
    if connected.is_err() {
        failed.store(true, Ordering::Release);
    }
    // Always arrive so the coordinator is never left waiting.
    let go = gate.arrive();
    let mut producer = connected?;
    if !go {
        return Err(AdapterError::Aborted);
    }

    let started = Instant::now();
    let mut sent: u64 = 0;
    while !stop.load(Ordering::Acquire) {
        if let Err(e) = producer.send(sent) {
            failed.store(true, Ordering::Release);
            return Err(e);
        }
        sent += 1;
    }

    Ok(WorkerResult::from_elapsed(worker_id, sent, started.elapsed()))
}

impl<C: Connector> Sampler for QueueSampler<C> {
    fn sample(&mut self, workers: usize) -> Option<Results> {
        match self.sample_workers(workers) {
            Ok(results) => Some(results),
            Err(e) => {
                error!(workers, error = %e, "Sample failed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::{InMemoryConnector, Producer};

    struct RefusingConnector;

    impl Connector for RefusingConnector {
        fn name(&self) -> &str {
            "refusing"
        }

        fn connect(&self) -> Result<Box<dyn Producer>> {
            Err(AdapterError::Connect("connection refused".to_string()))
        }
    }

    #[test]
    fn test_sample_collects_every_worker() {
        let connector = InMemoryConnector::new(64).unwrap();
        let sampler = QueueSampler::new(connector, Duration::from_millis(50));

        let results = sampler.sample_workers(3).unwrap();
        assert_eq!(results.worker_count(), 3);
        let ids: Vec<u32> = results.workers().iter().map(|w| w.worker_id()).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert!(results.messages_total() > 0);
        assert!(results.messages_per_second() > 0.0);
        assert!(results.duration_ns() > 0);
    }

    #[test]
    fn test_zero_workers_is_rejected() {
        let sampler = QueueSampler::new(InMemoryConnector::new(1).unwrap(), Duration::from_millis(1));
        assert!(sampler.sample_workers(0).is_err());
    }

    #[test]
    fn test_connect_failure_fails_sample() {
        let sampler = QueueSampler::new(RefusingConnector, Duration::from_secs(60));
        let started = Instant::now();
        let err = sampler.sample_workers(2).unwrap_err();

        assert!(matches!(err, AdapterError::Connect(_)));
        // The sample stops early instead of waiting out its duration.
        assert!(started.elapsed() < Duration::from_secs(60));
    }

    #[test]
    fn test_gate_releases_every_arrival() {
        let gate = StartGate::new();
        thread::scope(|scope| {
            let handles: Vec<_> = (0..3).map(|_| scope.spawn(|| gate.arrive())).collect();
            gate.wait_for(3);
            gate.open(true);
            for handle in handles {
                assert!(handle.join().unwrap());
            }
        });
    }

    #[test]
    fn test_gate_opened_early_aborts_waiting_workers() {
        // Two of three expected workers arrive; the third was never spawned.
        let gate = StartGate::new();
        thread::scope(|scope| {
            let handles: Vec<_> = (0..2).map(|_| scope.spawn(|| gate.arrive())).collect();
            gate.wait_for(2);
            gate.open(false);
            for handle in handles {
                assert!(!handle.join().unwrap());
            }
        });
        // Late arrivals do not block once the gate is open.
        assert!(!gate.arrive());
    }

    #[test]
    fn test_failed_sample_yields_none() {
        let mut sampler = QueueSampler::new(RefusingConnector, Duration::from_millis(10));
        assert!(sampler.sample(1).is_none());
    }
}
