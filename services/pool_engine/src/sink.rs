//! Event sinks
//!
//! Sinks receive every [`PoolEvent`] while the pool's write lock is still
//! held, so per-pool delivery order matches apply order. A failing sink is
//! logged and skipped; the mutation it reports has already been committed.

use crossbeam_channel::{Receiver, Sender, TrySendError};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::fmt::Debug;
use swap_amm::PoolEvent;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SinkError {
    #[error("Buffer full, event dropped (sequence {sequence})")]
    BufferFull { sequence: u64 },

    #[error("Sink closed")]
    Closed,
}

pub trait EventSink: Send + Sync + Debug {
    /// Deliver one event; must not block on the engine
    fn send(&self, event: &PoolEvent) -> Result<(), SinkError>;

    fn name(&self) -> &str {
        "event-sink"
    }
}

/// Forwards events into a crossbeam channel
#[derive(Debug, Clone)]
pub struct ChannelSink {
    sender: Sender<PoolEvent>,
    name: String,
}

impl ChannelSink {
    /// Bounded channel; events are dropped with [`SinkError::BufferFull`] when full
    pub fn bounded(capacity: usize) -> (Self, Receiver<PoolEvent>) {
        let (sender, receiver) = crossbeam_channel::bounded(capacity);
        (Self::from_sender(sender), receiver)
    }

    pub fn unbounded() -> (Self, Receiver<PoolEvent>) {
        let (sender, receiver) = crossbeam_channel::unbounded();
        (Self::from_sender(sender), receiver)
    }

    pub fn from_sender(sender: Sender<PoolEvent>) -> Self {
        Self {
            sender,
            name: "channel".to_string(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

impl EventSink for ChannelSink {
    fn send(&self, event: &PoolEvent) -> Result<(), SinkError> {
        self.sender.try_send(event.clone()).map_err(|err| match err {
            TrySendError::Full(event) => SinkError::BufferFull {
                sequence: event.sequence(),
            },
            TrySendError::Disconnected(_) => SinkError::Closed,
        })
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Keeps the most recent events in memory
#[derive(Debug)]
pub struct CollectorSink {
    events: Mutex<VecDeque<PoolEvent>>,
    max_events: usize,
}

impl CollectorSink {
    pub fn new() -> Self {
        Self::with_capacity(1000)
    }

    /// Oldest events are evicted beyond `max_events`
    pub fn with_capacity(max_events: usize) -> Self {
        Self {
            events: Mutex::new(VecDeque::with_capacity(max_events.min(1024))),
            max_events,
        }
    }

    pub fn events(&self) -> Vec<PoolEvent> {
        self.events.lock().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    pub fn drain(&self) -> Vec<PoolEvent> {
        self.events.lock().drain(..).collect()
    }
}

impl Default for CollectorSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for CollectorSink {
    fn send(&self, event: &PoolEvent) -> Result<(), SinkError> {
        let mut events = self.events.lock();
        if self.max_events == 0 {
            return Ok(());
        }
        while events.len() >= self.max_events {
            events.pop_front();
        }
        events.push_back(event.clone());
        Ok(())
    }

    fn name(&self) -> &str {
        "collector"
    }
}

/// Writes each event to the `tracing` stream
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn send(&self, event: &PoolEvent) -> Result<(), SinkError> {
        info!(
            pool = %event.pool(),
            sequence = event.sequence(),
            user = ?event.user(),
            "{}",
            event.name()
        );
        Ok(())
    }

    fn name(&self) -> &str {
        "tracing"
    }
}
