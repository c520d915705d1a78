//! Notification sinks for simulation events.
//!
//! The controller never talks to a transport directly. It hands each
//! [`SimulationEvent`] to an [`EventSink`], and the sink decides how the
//! event reaches observers: a broadcast channel for in-process
//! subscribers, a recorder for tests, or nothing at all.

use std::sync::{Mutex, PoisonError};

use life_types::SimulationEvent;
use tokio::sync::broadcast;

/// Capacity of the [`BroadcastSink`] channel.
///
/// A subscriber that falls behind by more than this many events receives
/// [`broadcast::error::RecvError::Lagged`] and skips to the newest one.
const BROADCAST_CAPACITY: usize = 256;

/// Destination for outbound simulation events.
///
/// Called while the controller's state lock is held, from whichever
/// thread or task produced the event, so events arrive in the order the
/// changes were applied. Delivery is fire-and-forget; `notify` should
/// return promptly and must not call back into the
/// [`Simulation`](crate::simulation::Simulation), which would deadlock.
pub trait EventSink: Send + Sync {
    /// Publish one event.
    fn notify(&self, event: &SimulationEvent);
}

/// A sink that discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpSink;

impl EventSink for NoOpSink {
    fn notify(&self, _event: &SimulationEvent) {}
}

/// Fans events out to any number of subscribers over a
/// [`tokio::sync::broadcast`] channel.
#[derive(Debug, Clone)]
pub struct BroadcastSink {
    tx: broadcast::Sender<SimulationEvent>,
}

impl BroadcastSink {
    /// Create a sink with no subscribers.
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self { tx }
    }

    /// Subscribe to events published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<SimulationEvent> {
        self.tx.subscribe()
    }

    /// Number of live subscribers.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for BroadcastSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for BroadcastSink {
    fn notify(&self, event: &SimulationEvent) {
        // send fails only when nobody is subscribed, which is normal.
        let _ = self.tx.send(event.clone());
    }
}

/// Keeps every event in publication order.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<SimulationEvent>>,
}

impl RecordingSink {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything recorded so far.
    pub fn events(&self) -> Vec<SimulationEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of events recorded so far.
    pub fn len(&self) -> usize {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl EventSink for RecordingSink {
    fn notify(&self, event: &SimulationEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
    }
}
