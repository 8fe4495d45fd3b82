//! # Adapters Module
//!
//! In-process implementations of the ports, used by the node harness and
//! by tests.

pub mod authorization;
pub mod query_service;
pub mod recorder;
pub mod signer;

pub use authorization::StaticAuthorization;
pub use query_service::{IssuedQuery, SimulatedQueryService};
pub use recorder::RecordingPublisher;
pub use signer::LocalApiSigner;
