//! # Token Rate Oracle Node
//!
//! Runs the oracle against the simulated data-fetch service: registers the
//! configured tokens, requests fresh rates on every tick and delivers signed
//! answers back through the proof-verifying callback.
//!
//! ## Configuration
//!
//! The config file path is taken from the first argument or `ORACLE_CONFIG`;
//! without one the built-in defaults apply. `ORACLE_*` variables override
//! file values (see `NodeConfig::apply_overrides`).

use anyhow::{Context, Result};
use chrono::Utc;
use oracle_node::{NodeConfig, OracleNode};
use oracle_telemetry::{encode_metrics, init_telemetry, TelemetryConfig};
use tracing::{debug, info};

/// Load configuration from file and environment.
fn load_config() -> Result<NodeConfig> {
    let path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("ORACLE_CONFIG").ok());

    let mut config = match path {
        Some(path) => {
            info!(%path, "Loading configuration");
            NodeConfig::load(&path)?
        }
        None => {
            info!("No config file given, using defaults");
            NodeConfig::default()
        }
    };
    config.apply_env()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    init_telemetry(&TelemetryConfig::from_env()).context("Failed to initialize telemetry")?;

    let config = load_config()?;
    let node = OracleNode::new(&config)?;
    let recorder = node.spawn_metrics_recorder();

    node.bootstrap(Utc::now())
        .context("Failed to bootstrap oracle")?;

    info!("Oracle node is running. Press Ctrl+C to stop.");
    tokio::select! {
        result = node.run() => result?,
        signal = tokio::signal::ctrl_c() => {
            signal.context("Failed to listen for Ctrl+C")?;
        }
    }

    node.shutdown();
    recorder.await.context("Metrics recorder panicked")?;

    let metrics = encode_metrics()?;
    debug!("Final metrics:\n{}", metrics);
    info!("Shutdown complete");
    Ok(())
}
