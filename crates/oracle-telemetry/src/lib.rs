//! # Oracle Telemetry
//!
//! Logging and metrics for the token rate oracle.
//!
//! ## Components
//!
//! - **Logging**: `tracing-subscriber` fmt layer with `EnvFilter`, text or JSON
//! - **Metrics**: Prometheus counters and gauges fed from the audit event bus
//!
//! ## Usage
//!
//! ```rust,ignore
//! use oracle_telemetry::{init_telemetry, TelemetryConfig};
//!
//! fn main() {
//!     init_telemetry(&TelemetryConfig::from_env()).expect("telemetry");
//!     // Logs and metrics are now being collected
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `ORACLE_SERVICE_NAME` | `token-rate-oracle` | Service name in logs |
//! | `ORACLE_LOG_LEVEL` | `info` | Log filter directive (falls back to `RUST_LOG`) |
//! | `ORACLE_JSON_LOGS` | `false` | JSON log lines |
//! | `ORACLE_LOG_TARGET` | `true` | Include module targets |

mod config;
mod logging;
pub mod metrics;

pub use config::TelemetryConfig;
pub use logging::{build_filter, init_logging};
pub use metrics::{
    encode_metrics, record_event, register_metrics, PROOFS_VERIFIED, PROOF_FAILURES,
    RATE_UPDATES, REGISTERED_TOKENS, UPDATE_REQUESTS, UPDATE_REQUEST_FAILURES,
};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Register metrics, then install the global log subscriber.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    register_metrics()?;
    init_logging(config)
}

