//! # Node Harness Flows
//!
//! Drives the node runtime through several update cycles from a TOML
//! configuration and checks what reaches the registry and the bus.

#[cfg(test)]
mod tests {
    use chrono::{DateTime, TimeZone, Utc};
    use oracle_node::{NodeConfig, OracleNode, TickReport};
    use price_oracle::{FailedProofPolicy, PriceOracleApi, RateConverter};
    use shared_bus::{EventFilter, EventTopic, OracleEvent};
    use shared_types::U256;

    const CONFIG: &str = r#"
        [oracle]
        controllers = ["0xc0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0"]
        api_secret_key = "4242424242424242424242424242424242424242424242424242424242424242"
        failed_proof_policy = "discard"

        [data_fetch]
        dispatch_address = "0xd1d1d1d1d1d1d1d1d1d1d1d1d1d1d1d1d1d1d1d1"
        query_price = 100

        [schedule]
        tick_interval_secs = 1
        initial_deposit = 450

        [[tokens]]
        address = "0xa1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1"
        symbol = "KNC"
        decimals = 18
        quote = "0.001234"

        [[tokens]]
        address = "0xb2b2b2b2b2b2b2b2b2b2b2b2b2b2b2b2b2b2b2b2"
        symbol = "DGX"
        decimals = 9
        quote = "1.2e-1"
    "#;

    const KNC: [u8; 20] = [0xa1; 20];
    const DGX: [u8; 20] = [0xb2; 20];

    fn at(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 9, minute, 0).unwrap()
    }

    fn node() -> OracleNode {
        let config = NodeConfig::parse(CONFIG).unwrap();
        assert_eq!(config.oracle.failed_proof_policy, FailedProofPolicy::Discard);
        OracleNode::new(&config).unwrap()
    }

    /// Two funded cycles commit, the third runs out of funds
    #[test]
    fn test_ticks_until_funds_run_out() {
        let node = node();
        node.bootstrap(at(0)).unwrap();
        let mut sub = node.bus().subscribe(EventFilter::topics(vec![
            EventTopic::Rates,
            EventTopic::Queries,
        ]));

        let funded = TickReport {
            requested: 2,
            committed: 2,
            ..TickReport::default()
        };
        assert_eq!(node.run_tick(at(1)).unwrap(), funded);
        assert_eq!(node.run_tick(at(2)).unwrap(), funded);
        assert_eq!(node.run_tick(at(3)).unwrap(), TickReport::default());

        let service = node.service();
        assert_eq!(service.balance(), U256::from(50u32));
        assert_eq!(service.token(&KNC).unwrap().last_update, 20250301090200);
        assert_eq!(
            service.token(&DGX).unwrap().rate,
            U256::from(120_000_000_000_000_000u64)
        );
        // 10 DGX (9 decimals) at 0.12
        assert_eq!(
            service.convert(&DGX, U256::from(10_000_000_000u64)),
            Ok(U256::from(1_200_000_000_000_000_000u64))
        );

        let events = sub.drain();
        let requested = events
            .iter()
            .filter(|e| matches!(e, OracleEvent::UpdateRequested { .. }))
            .count();
        let updated = events
            .iter()
            .filter(|e| matches!(e, OracleEvent::TokenRateUpdated { .. }))
            .count();
        assert_eq!(requested, 4);
        assert_eq!(updated, 4);
        assert!(matches!(
            events.last(),
            Some(OracleEvent::UpdateRequestFailed { .. })
        ));
    }

    /// Under the discard policy a stale answer leaves nothing pending
    #[test]
    fn test_stale_answers_are_discarded() {
        let node = node();
        node.bootstrap(at(0)).unwrap();
        node.run_tick(at(5)).unwrap();

        let report = node.run_tick(at(4)).unwrap();
        assert_eq!(report.rejected, 2);
        assert!(node.service().pending_queries().is_empty());
        assert_eq!(
            node.service().token(&KNC).unwrap().last_update,
            20250301090500
        );
    }

    /// Removed tokens stop being requested
    #[test]
    fn test_removed_token_not_requested() {
        let node = node();
        node.bootstrap(at(0)).unwrap();
        node.service()
            .remove_tokens(node.controller(), &[DGX])
            .unwrap();

        let report = node.run_tick(at(1)).unwrap();
        assert_eq!(report.requested, 1);
        assert_eq!(report.committed, 1);
        assert_eq!(node.service().token_addresses(), vec![KNC]);
    }
}
