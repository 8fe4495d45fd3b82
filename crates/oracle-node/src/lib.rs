//! # Oracle Node Library
//!
//! Exposes the node's configuration, simulated pricing feed and runtime for
//! testing. The main entry point is the `main.rs` binary.

pub mod config;
pub mod feed;
pub mod runtime;

pub use config::{ConfigError, NodeConfig, TokenEntry};
pub use feed::{composed_timestamp, http_date, PriceFeed, SignedAnswer};
pub use runtime::{NodeService, OracleNode, TickReport};
