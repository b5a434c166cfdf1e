// Copyright 2025 MQ Throughput Contributors
// SPDX-License-Identifier: Apache-2.0

//! Message queue connectors.
//!
//! A [`Connector`] hands out one [`Producer`] per worker. The bundled
//! [`InMemoryConnector`] is a bounded channel drained by a background
//! thread, which keeps the measured path free of external services.

use crate::error::{AdapterError, Result};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tokio::sync::mpsc;
use tracing::debug;

/// Sends messages to a queue on behalf of one worker.
pub trait Producer: Send {
    /// Enqueue message number `seq`, blocking while the queue is full.
    fn send(&mut self, seq: u64) -> Result<()>;
}

/// Creates producers for a queue backend.
pub trait Connector: Send + Sync {
    /// Backend name used in logs and reports.
    fn name(&self) -> &str;

    /// Open a producer for one worker.
    fn connect(&self) -> Result<Box<dyn Producer>>;
}

/// Bounded in-process queue with a draining consumer thread.
pub struct InMemoryConnector {
    sender: mpsc::Sender<u64>,
    consumed: Arc<AtomicU64>,
    drain: JoinHandle<()>,
}

impl InMemoryConnector {
    /// Connector name.
    pub const NAME: &'static str = "in-memory";

    /// Create a queue holding at most `capacity` pending messages.
    pub fn new(capacity: usize) -> Result<Self> {
        let (sender, mut receiver) = mpsc::channel::<u64>(capacity.max(1));
        let consumed = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&consumed);

        let drain = thread::Builder::new()
            .name("mq-drain".to_string())
            .spawn(move || {
                while receiver.blocking_recv().is_some() {
                    counter.fetch_add(1, Ordering::Relaxed);
                }
            })?;

        Ok(Self {
            sender,
            consumed,
            drain,
        })
    }

    /// Close the queue, wait for the consumer to drain it and return the
    /// total number of messages consumed.
    ///
    /// Producers still alive keep the consumer running, so drop them first.
    pub fn shutdown(self) -> Result<u64> {
        let Self {
            sender,
            consumed,
            drain,
        } = self;
        drop(sender);
        drain
            .join()
            .map_err(|_| AdapterError::Worker("queue drain thread panicked".to_string()))?;
        let total = consumed.load(Ordering::Relaxed);
        debug!(consumed = total, "In-memory queue drained");
        Ok(total)
    }
}

impl Connector for InMemoryConnector {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn connect(&self) -> Result<Box<dyn Producer>> {
        if self.sender.is_closed() {
            return Err(AdapterError::QueueClosed);
        }
        Ok(Box::new(InMemoryProducer {
            sender: self.sender.clone(),
        }))
    }
}

struct InMemoryProducer {
    sender: mpsc::Sender<u64>,
}

impl Producer for InMemoryProducer {
    fn send(&mut self, seq: u64) -> Result<()> {
        self.sender
            .blocking_send(seq)
            .map_err(|_| AdapterError::QueueClosed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_are_consumed() {
        let connector = InMemoryConnector::new(4).unwrap();
        let mut producer = connector.connect().unwrap();
        for seq in 0..100 {
            producer.send(seq).unwrap();
        }
        drop(producer);

        assert_eq!(connector.shutdown().unwrap(), 100);
    }

    #[test]
    fn test_producers_from_several_threads() {
        let connector = InMemoryConnector::new(8).unwrap();
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let mut producer = connector.connect().unwrap();
                std::thread::spawn(move || {
                    for seq in 0..250 {
                        producer.send(seq).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(connector.shutdown().unwrap(), 1_000);
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let connector = InMemoryConnector::new(0).unwrap();
        let mut producer = connector.connect().unwrap();
        producer.send(1).unwrap();
        drop(producer);
        assert_eq!(connector.shutdown().unwrap(), 1);
    }

    #[test]
    fn test_name() {
        let connector = InMemoryConnector::new(1).unwrap();
        assert_eq!(connector.name(), "in-memory");
    }
}
