//! # Shared Types Crate
//!
//! Primitive identifiers and numeric types used across the oracle workspace.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: addresses, hashes and query identifiers are
//!   defined once here so every crate agrees on their width.
//! - **No Ambient State**: this crate holds types and pure helpers only.

pub mod entities;
pub mod errors;

pub use entities::*;
pub use errors::*;
