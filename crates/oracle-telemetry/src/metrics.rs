//! Prometheus metrics for the oracle.
//!
//! All metrics follow the naming convention `oracle_<metric>[_<unit>]` and
//! live in a dedicated registry so the node can expose exactly this set.

use lazy_static::lazy_static;
use prometheus::{Counter, CounterVec, Encoder, Gauge, Opts, Registry, TextEncoder};
use shared_bus::OracleEvent;
use std::sync::Once;

use crate::TelemetryError;

lazy_static! {
    /// Oracle metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // PROOF METRICS
    // =========================================================================

    /// Callback proofs that passed every verification stage
    pub static ref PROOFS_VERIFIED: Counter = Counter::new(
        "oracle_proofs_verified_total",
        "Total callback proofs that passed verification"
    ).expect("metric creation failed");

    /// Rejected callback proofs by failing stage
    pub static ref PROOF_FAILURES: CounterVec = CounterVec::new(
        Opts::new("oracle_proof_failures_total", "Rejected callback proofs by stage"),
        &["stage"]  // stage: date/hash/signature/rate
    ).expect("metric creation failed");

    // =========================================================================
    // RATE METRICS
    // =========================================================================

    /// Rate overwrites, manual or proof-verified
    pub static ref RATE_UPDATES: Counter = Counter::new(
        "oracle_rate_updates_total",
        "Total token rate updates"
    ).expect("metric creation failed");

    /// Currently registered tokens
    pub static ref REGISTERED_TOKENS: Gauge = Gauge::new(
        "oracle_registered_tokens",
        "Number of tokens in the registry"
    ).expect("metric creation failed");

    // =========================================================================
    // QUERY METRICS
    // =========================================================================

    /// Data-fetch requests issued
    pub static ref UPDATE_REQUESTS: Counter = Counter::new(
        "oracle_update_requests_total",
        "Total data-fetch update requests issued"
    ).expect("metric creation failed");

    /// Batch update requests that were skipped
    pub static ref UPDATE_REQUEST_FAILURES: Counter = Counter::new(
        "oracle_update_request_failures_total",
        "Total batch update requests skipped"
    ).expect("metric creation failed");
}

static REGISTER: Once = Once::new();

/// Register all metrics with the oracle registry. Safe to call repeatedly.
pub fn register_metrics() -> Result<(), TelemetryError> {
    let mut outcome = Ok(());
    REGISTER.call_once(|| {
        let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
            Box::new(PROOFS_VERIFIED.clone()),
            Box::new(PROOF_FAILURES.clone()),
            Box::new(RATE_UPDATES.clone()),
            Box::new(REGISTERED_TOKENS.clone()),
            Box::new(UPDATE_REQUESTS.clone()),
            Box::new(UPDATE_REQUEST_FAILURES.clone()),
        ];

        for metric in metrics {
            if let Err(e) = REGISTRY.register(metric) {
                outcome = Err(TelemetryError::MetricsInit(e.to_string()));
                return;
            }
        }
    });
    outcome
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}

/// Fold one audit event into the metrics.
pub fn record_event(event: &OracleEvent) {
    match event {
        OracleEvent::TokenAdded { .. } => REGISTERED_TOKENS.inc(),
        OracleEvent::TokenRemoved { .. } => REGISTERED_TOKENS.dec(),
        OracleEvent::TokenRateUpdated { .. } => RATE_UPDATES.inc(),
        OracleEvent::UpdateRequested { .. } => UPDATE_REQUESTS.inc(),
        OracleEvent::UpdateRequestFailed { .. } => UPDATE_REQUEST_FAILURES.inc(),
        OracleEvent::ProofVerified { .. } => PROOFS_VERIFIED.inc(),
        OracleEvent::ProofVerificationFailed { reason, .. } => {
            PROOF_FAILURES.with_label_values(&[reason.as_str()]).inc()
        }
        OracleEvent::GasPriceSet { .. }
        | OracleEvent::ApiPublicKeySet { .. }
        | OracleEvent::Deposited { .. }
        | OracleEvent::Withdrawn { .. } => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use primitive_types::U256;

    // Metrics are process-global and tests run in parallel, so assertions
    // compare against a reading taken just before.

    #[test]
    fn test_register_metrics_is_idempotent() {
        assert!(register_metrics().is_ok());
        assert!(register_metrics().is_ok());
    }

    #[test]
    fn test_record_proof_failure_by_stage() {
        let before = PROOF_FAILURES.with_label_values(&["signature"]).get();
        record_event(&OracleEvent::ProofVerificationFailed {
            public_key: vec![0u8; 64],
            result: "0.1".to_string(),
            reason: "signature".to_string(),
        });
        assert!(PROOF_FAILURES.with_label_values(&["signature"]).get() >= before + 1.0);
    }

    #[test]
    fn test_record_rate_update() {
        let before = RATE_UPDATES.get();
        record_event(&OracleEvent::TokenRateUpdated {
            sender: [1u8; 20],
            token: [2u8; 20],
            rate: U256::from(5u8),
        });
        assert!(RATE_UPDATES.get() >= before + 1.0);
    }

    #[test]
    fn test_encode_contains_oracle_metrics() {
        register_metrics().unwrap();
        PROOFS_VERIFIED.inc();

        let text = encode_metrics().unwrap();
        assert!(text.contains("oracle_proofs_verified_total"));
    }
}
