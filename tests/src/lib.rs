//! # Token Rate Oracle Test Suite
//!
//! Unified test crate containing:
//!
//! ## Structure
//!
//! ```text
//! tests/
//! ├── benches/          # Criterion benchmarks of the proof pipeline
//! └── src/integration/  # Cross-crate flows through the event bus
//!     ├── flows.rs      # Request -> callback -> commit/reject
//!     └── node.rs       # Node harness tick cycle
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p oracle-tests
//! cargo test -p oracle-tests integration::flows
//! cargo bench -p oracle-tests
//! ```

pub mod integration;
