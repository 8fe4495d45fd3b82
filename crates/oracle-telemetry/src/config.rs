//! Telemetry configuration from environment variables.

use std::env;

/// Configuration for logging and metrics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    /// Service name attached to every log line.
    pub service_name: String,

    /// Log level filter directive (`info`, `price_oracle=debug,warn`, ...).
    pub log_level: String,

    /// Emit JSON lines instead of the human-readable format.
    pub json_logs: bool,

    /// Include the event target (module path) in log lines.
    pub with_target: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "token-rate-oracle".to_string(),
            log_level: "info".to_string(),
            json_logs: false,
            with_target: true,
        }
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    ///
    /// - `ORACLE_SERVICE_NAME`: Service name (default: token-rate-oracle)
    /// - `ORACLE_LOG_LEVEL` or `RUST_LOG`: Filter directive (default: info)
    /// - `ORACLE_JSON_LOGS`: JSON output (default: false, true in containers)
    /// - `ORACLE_LOG_TARGET`: Include targets (default: true)
    pub fn from_env() -> Self {
        let is_container =
            env::var("KUBERNETES_SERVICE_HOST").is_ok() || env::var("DOCKER_CONTAINER").is_ok();

        Self {
            service_name: env::var("ORACLE_SERVICE_NAME")
                .unwrap_or_else(|_| "token-rate-oracle".to_string()),

            log_level: env::var("ORACLE_LOG_LEVEL")
                .or_else(|_| env::var("RUST_LOG"))
                .unwrap_or_else(|_| "info".to_string()),

            json_logs: env::var("ORACLE_JSON_LOGS")
                .map(|v| parse_flag(&v))
                .unwrap_or(is_container),

            with_target: env::var("ORACLE_LOG_TARGET")
                .map(|v| parse_flag(&v))
                .unwrap_or(true),
        }
    }

    /// Same configuration with a different filter directive.
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on")
}
