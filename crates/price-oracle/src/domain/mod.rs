//! # Domain Layer
//!
//! Pure oracle logic with no I/O dependencies: the token registry, the query
//! correlator, the proof parser and the three verification stages.
//! This is the inner layer of the hexagonal architecture.

pub mod correlator;
pub mod date;
pub mod entities;
pub mod errors;
pub mod proof;
pub mod rate;
pub mod registry;
pub mod signature;
