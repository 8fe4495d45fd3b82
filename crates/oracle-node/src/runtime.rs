//! # Oracle Node Runtime
//!
//! Owns the oracle service and its collaborators and drives the update
//! cycle: every tick issues a batch of update requests, drains them from the
//! simulated data-fetch service and delivers the signed answers back through
//! the oracle callback.
//!
//! ## Startup Sequence
//!
//! 1. Validate configuration
//! 2. Create shared infrastructure (event bus, data-fetch service)
//! 3. Create the oracle service with the trusted key
//! 4. Start the metrics recorder (bus subscriber)
//! 5. Fund the oracle and register the configured tokens
//! 6. Tick until shutdown

use crate::config::NodeConfig;
use crate::feed::{composed_timestamp, PriceFeed};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use price_oracle::{
    BatchOutcome, CallbackOutcome, LocalApiSigner, OracleError, PriceOracleApi,
    PriceOracleService, SimulatedQueryService, StaticAuthorization, U256,
};
use shared_bus::{EventFilter, InMemoryEventBus};
use shared_types::{format_address, format_hash, Address};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Oracle service as wired by the node.
pub type NodeService =
    PriceOracleService<Arc<SimulatedQueryService>, StaticAuthorization, Arc<InMemoryEventBus>>;

/// Counters for one update cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Update requests issued.
    pub requested: usize,
    /// Callbacks whose proof committed a rate.
    pub committed: usize,
    /// Callbacks whose proof failed a verification stage.
    pub rejected: usize,
    /// Callbacks the oracle refused outright.
    pub failed: usize,
    /// Requests the feed had no quote for.
    pub unanswered: usize,
}

/// The main node runtime.
pub struct OracleNode {
    service: Arc<NodeService>,
    query_service: Arc<SimulatedQueryService>,
    bus: Arc<InMemoryEventBus>,
    /// Absent when only a public key is configured.
    feed: Option<PriceFeed>,
    controller: Address,
    dispatch: Address,
    tokens: Vec<(Address, String, U256)>,
    initial_deposit: U256,
    gas_price: Option<U256>,
    gas_limit: u64,
    tick_interval: Duration,
    max_ticks: Option<u64>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
}

impl OracleNode {
    /// Create a node from validated configuration.
    pub fn new(config: &NodeConfig) -> Result<Self> {
        config.validate().context("Invalid node configuration")?;

        let controllers = config.controllers()?;
        let controller = *controllers
            .first()
            .context("No controller configured")?;
        let dispatch = config.dispatch_address()?;

        let (feed_signer, trusted_key) = match (config.signer()?, config.trusted_key()?) {
            (Some(signer), Some(key)) => (Some(signer), key),
            (None, Some(key)) => {
                warn!("No API secret key configured; callbacks will not be delivered");
                (None, key)
            }
            (_, None) => {
                let signer = LocalApiSigner::random();
                warn!(
                    signer = %format_address(&signer.address()),
                    "No API key configured; signing with a fresh random key"
                );
                let key = signer.public_key();
                (Some(signer), key)
            }
        };

        let query_service = Arc::new(SimulatedQueryService::new(
            dispatch,
            &config.oracle.query_kind,
            U256::from(config.data_fetch.query_price),
        ));
        let bus = Arc::new(InMemoryEventBus::new());
        let service = Arc::new(PriceOracleService::new(
            Arc::clone(&query_service),
            StaticAuthorization::new(controllers),
            Arc::clone(&bus),
            config.oracle_config(trusted_key),
        ));

        let startup_tokens = config.tokens()?;
        let feed = feed_signer.map(|signer| {
            let mut feed = PriceFeed::new(signer);
            for (_, symbol, _, quote) in &startup_tokens {
                if let Some(quote) = quote {
                    feed.set_quote(service.config().query_for(symbol), quote.clone());
                }
            }
            feed
        });
        let tokens = startup_tokens
            .into_iter()
            .map(|(address, symbol, magnitude, _)| (address, symbol, magnitude))
            .collect();

        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        info!(
            controller = %format_address(&controller),
            dispatch = %format_address(&dispatch),
            api_key = %trusted_key.to_hex(),
            "Oracle node created"
        );

        Ok(Self {
            service,
            query_service,
            bus,
            feed,
            controller,
            dispatch,
            tokens,
            initial_deposit: U256::from(config.schedule.initial_deposit),
            gas_price: config.data_fetch.gas_price.map(U256::from),
            gas_limit: config.data_fetch.gas_limit,
            tick_interval: Duration::from_secs(config.schedule.tick_interval_secs),
            max_ticks: config.schedule.max_ticks,
            shutdown_tx,
            shutdown_rx,
        })
    }

    /// Fund the oracle, forward the gas price and register startup tokens.
    pub fn bootstrap(&self, now: DateTime<Utc>) -> Result<(), OracleError> {
        if !self.initial_deposit.is_zero() {
            let balance = self.service.deposit(self.controller, self.initial_deposit)?;
            info!(%balance, "Initial deposit");
        }
        if let Some(gas_price) = self.gas_price {
            self.service.set_custom_gas_price(self.controller, gas_price)?;
        }
        if self.tokens.is_empty() {
            warn!("No tokens configured");
            return Ok(());
        }

        let addresses: Vec<Address> = self.tokens.iter().map(|(a, _, _)| *a).collect();
        let symbols: Vec<String> = self.tokens.iter().map(|(_, s, _)| s.clone()).collect();
        let magnitudes: Vec<U256> = self.tokens.iter().map(|(_, _, m)| *m).collect();
        self.service.add_tokens(
            self.controller,
            &addresses,
            &symbols,
            &magnitudes,
            composed_timestamp(now),
        )?;

        info!(tokens = self.tokens.len(), "Tokens registered");
        Ok(())
    }

    /// Subscribe to the bus and fold every event into the metrics until
    /// shutdown.
    pub fn spawn_metrics_recorder(&self) -> JoinHandle<()> {
        let mut subscription = self.bus.subscribe(EventFilter::all());
        let mut shutdown = self.shutdown_rx.clone();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    event = subscription.recv() => match event {
                        Some(event) => oracle_telemetry::record_event(&event),
                        None => break,
                    },
                    _ = shutdown.changed() => {
                        // Flush what is already buffered
                        for event in subscription.drain() {
                            oracle_telemetry::record_event(&event);
                        }
                        break;
                    }
                }
            }
            debug!(lagged = subscription.lagged(), "Metrics recorder stopped");
        })
    }

    /// Run one update cycle at wall-clock time `now`.
    pub fn run_tick(&self, now: DateTime<Utc>) -> Result<TickReport, OracleError> {
        let mut report = TickReport::default();

        match self.service.update_token_rates(self.controller, self.gas_limit)? {
            BatchOutcome::Requested(queries) => report.requested = queries.len(),
            BatchOutcome::Skipped(reason) => {
                warn!(%reason, "Batch update skipped");
            }
        }

        for query in self.query_service.take_pending() {
            let answer = match self.feed.as_ref().and_then(|feed| feed.answer(&query, now)) {
                Some(Ok(answer)) => answer,
                Some(Err(e)) => {
                    warn!(query_id = %format_hash(&query.query_id), error = %e, "Signing failed");
                    report.failed += 1;
                    continue;
                }
                None => {
                    debug!(query = %query.query, "No quote for query");
                    report.unanswered += 1;
                    continue;
                }
            };

            match self
                .service
                .callback(self.dispatch, answer.query_id, &answer.result, &answer.proof)
            {
                Ok(CallbackOutcome::Committed { .. }) => report.committed += 1,
                Ok(CallbackOutcome::Rejected { .. }) => report.rejected += 1,
                Err(e) => {
                    warn!(query_id = %format_hash(&answer.query_id), error = %e, "Callback refused");
                    report.failed += 1;
                }
            }
        }

        Ok(report)
    }

    /// Tick on the configured interval until shutdown or `max_ticks`.
    pub async fn run(&self) -> Result<()> {
        let mut interval = tokio::time::interval(self.tick_interval);
        let mut shutdown = self.shutdown_rx.clone();
        let mut ticks = 0u64;

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    ticks += 1;
                    let report = self
                        .run_tick(Utc::now())
                        .context("Update cycle failed")?;
                    info!(
                        tick = ticks,
                        requested = report.requested,
                        committed = report.committed,
                        rejected = report.rejected,
                        failed = report.failed,
                        unanswered = report.unanswered,
                        "Update cycle complete"
                    );

                    if self.max_ticks.is_some_and(|max| ticks >= max) {
                        info!(ticks, "Tick limit reached");
                        break;
                    }
                }
                _ = shutdown.changed() => {
                    info!("Shutdown signal received");
                    break;
                }
            }
        }
        Ok(())
    }

    /// Signal the tick loop and the metrics recorder to stop.
    pub fn shutdown(&self) {
        info!("Initiating graceful shutdown...");
        // No receivers left only means everything already stopped
        let _ = self.shutdown_tx.send(true);
    }

    pub fn service(&self) -> Arc<NodeService> {
        Arc::clone(&self.service)
    }

    pub fn bus(&self) -> Arc<InMemoryEventBus> {
        Arc::clone(&self.bus)
    }

    pub fn controller(&self) -> Address {
        self.controller
    }

    pub fn dispatch(&self) -> Address {
        self.dispatch
    }

    /// Whether signed answers are produced for issued requests.
    pub fn delivers_callbacks(&self) -> bool {
        self.feed.is_some()
    }
}
