//! # Shared Bus - Audit Event Bus
//!
//! Carries the oracle's audit events (token added/removed, rate updated,
//! proof verified/failed, ...) to any number of subscribers.
//!
//! ```text
//! ┌──────────────┐                    ┌──────────────┐
//! │ Price Oracle │                    │  Metrics /   │
//! │   Service    │    publish()       │  Auditors    │
//! │              │ ──────┐            │              │
//! └──────────────┘       │            └──────────────┘
//!                        ▼                    ↑
//!                  ┌──────────────┐          │
//!                  │  Event Bus   │          │
//!                  │              │ ─────────┘
//!                  └──────────────┘  subscribe()
//! ```
//!
//! Publishing never blocks: the oracle's entry points are atomic and must not
//! suspend, so events are pushed onto a bounded broadcast channel and dropped
//! for subscribers that lag behind.

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod events;
pub mod publisher;
pub mod subscriber;

// Re-export main types
pub use events::{EventFilter, EventTopic, OracleEvent};
pub use publisher::{EventPublisher, InMemoryEventBus, NoopPublisher};
pub use subscriber::{Subscription, SubscriptionError};

/// Maximum events to buffer per subscriber before old events are dropped.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_capacity() {
        assert_eq!(DEFAULT_CHANNEL_CAPACITY, 1000);
    }
}
