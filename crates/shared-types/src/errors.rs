//! # Error Types
//!
//! Errors raised while decoding the primitive types in this crate.

use thiserror::Error;

/// Errors that can occur when parsing hex-encoded identifiers.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HexParseError {
    /// The input is not valid hexadecimal.
    #[error("Invalid hex: {0}")]
    InvalidHex(String),

    /// The decoded byte length does not match the target type.
    #[error("Invalid length: expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
}
