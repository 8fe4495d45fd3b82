//! # Ports Layer
//!
//! Trait definitions for the hexagonal architecture.
//! - **Inbound (Driving)**: the controller API and the consumer `convert`
//! - **Outbound (Driven)**: data-fetch service and authorization collaborators

pub mod inbound;
pub mod outbound;
