//! Event publisher that keeps everything it is given.

use parking_lot::Mutex;
use shared_bus::{EventPublisher, OracleEvent};
use std::sync::atomic::{AtomicU64, Ordering};

/// Stores published events in order.
#[derive(Debug, Default)]
pub struct RecordingPublisher {
    events: Mutex<Vec<OracleEvent>>,
    published: AtomicU64,
}

impl RecordingPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every event so far.
    pub fn events(&self) -> Vec<OracleEvent> {
        self.events.lock().clone()
    }

    /// Remove and return every event so far.
    pub fn take(&self) -> Vec<OracleEvent> {
        std::mem::take(&mut *self.events.lock())
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }
}

impl EventPublisher for RecordingPublisher {
    fn publish(&self, event: OracleEvent) -> usize {
        self.published.fetch_add(1, Ordering::Relaxed);
        self.events.lock().push(event);
        1
    }

    fn events_published(&self) -> u64 {
        self.published.load(Ordering::Relaxed)
    }
}
