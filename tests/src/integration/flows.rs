//! # Integration Test Flows
//!
//! Tests that the oracle service, the simulated data-fetch service and the
//! local API signer work together through the shared bus.
//!
//! ## Flows Tested:
//!
//! 1. **Request -> callback -> commit**: a batch request is drained, signed
//!    off-chain and delivered back; the rate lands and the audit trail shows it
//! 2. **Rejections**: tampered payloads, rotated keys and stale dates fail
//!    their stage without touching the registry
//! 3. **Correlation policy**: retained vs discarded correlations after a
//!    rejected proof
//! 4. **Subscriber filtering**: topic and token filters over the audit trail

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::time::timeout;

    // Shared infrastructure
    use shared_bus::{EventFilter, EventTopic, InMemoryEventBus, OracleEvent};
    use shared_types::{Address, U256};

    use price_oracle::{
        BatchOutcome, BatchShortfall, CallbackOutcome, FailedProofPolicy, IssuedQuery,
        LocalApiSigner, OracleConfig, OracleError, PriceOracleApi, PriceOracleService,
        RateConverter, SimulatedQueryService, StaticAuthorization, VerificationStage,
    };

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    const CONTROLLER: Address = [0xC0; 20];
    const DISPATCH: Address = [0xD1; 20];
    const KNC: Address = [0xA1; 20];
    const OMG: Address = [0xB2; 20];

    const QUERY_PRICE: u64 = 10;
    const REGISTERED_AT: u64 = 20180101000000;
    const DATE: &str = "Wed, 12 Sep 2018 15:18:14 GMT";
    const LATER_DATE: &str = "Wed, 12 Sep 2018 15:18:15 GMT";

    type Service =
        PriceOracleService<Arc<SimulatedQueryService>, StaticAuthorization, Arc<InMemoryEventBus>>;

    /// Oracle wired to in-process collaborators, funded, with KNC and OMG registered.
    struct Oracle {
        service: Service,
        query_service: Arc<SimulatedQueryService>,
        bus: Arc<InMemoryEventBus>,
        signer: LocalApiSigner,
    }

    impl Oracle {
        fn new(policy: FailedProofPolicy) -> Self {
            let signer = LocalApiSigner::from_secret(&[0x42u8; 32]).unwrap();
            let query_service = Arc::new(SimulatedQueryService::new(
                DISPATCH,
                "URL",
                U256::from(QUERY_PRICE),
            ));
            let bus = Arc::new(InMemoryEventBus::new());
            let service = PriceOracleService::new(
                Arc::clone(&query_service),
                StaticAuthorization::new([CONTROLLER]),
                Arc::clone(&bus),
                OracleConfig {
                    failed_proof_policy: policy,
                    api_public_key: signer.public_key(),
                    ..OracleConfig::default()
                },
            );

            service
                .add_tokens(
                    CONTROLLER,
                    &[KNC, OMG],
                    &["KNC".to_string(), "OMG".to_string()],
                    &[U256::exp10(18), U256::exp10(9)],
                    REGISTERED_AT,
                )
                .unwrap();
            service.deposit(CONTROLLER, U256::from(1000u32)).unwrap();

            Self {
                service,
                query_service,
                bus,
                signer,
            }
        }

        /// Issue a batch and drain the requests the data-fetch service saw.
        fn request_all(&self) -> Vec<IssuedQuery> {
            let outcome = self.service.update_token_rates(CONTROLLER, 200_000).unwrap();
            assert_eq!(outcome.issued(), 2);
            self.query_service.take_pending()
        }

        fn deliver(
            &self,
            query: &IssuedQuery,
            result: &str,
            date: &str,
        ) -> Result<CallbackOutcome, OracleError> {
            self.deliver_signed(&self.signer, query, result, result, date)
        }

        /// Sign `signed_result` but deliver `delivered_result`.
        fn deliver_signed(
            &self,
            signer: &LocalApiSigner,
            query: &IssuedQuery,
            signed_result: &str,
            delivered_result: &str,
            date: &str,
        ) -> Result<CallbackOutcome, OracleError> {
            let proof = signer.sign_result(signed_result, date).unwrap();
            self.service
                .callback(DISPATCH, query.query_id, delivered_result, &proof)
        }
    }

    fn query_for<'a>(queries: &'a [IssuedQuery], symbol: &str) -> &'a IssuedQuery {
        let needle = format!("fsym={symbol}&");
        queries
            .iter()
            .find(|q| q.query.contains(&needle))
            .expect("query for symbol")
    }

    fn failure_reasons(events: &[OracleEvent]) -> Vec<String> {
        events
            .iter()
            .filter_map(|e| match e {
                OracleEvent::ProofVerificationFailed { reason, .. } => Some(reason.clone()),
                _ => None,
            })
            .collect()
    }

    // =============================================================================
    // INTEGRATION TESTS: REQUEST -> CALLBACK -> COMMIT
    // =============================================================================

    /// A verified callback commits the rate and the bus carries the audit trail
    #[tokio::test]
    async fn test_full_update_cycle_through_bus() {
        let oracle = Oracle::new(FailedProofPolicy::Retain);
        let mut sub = oracle.bus.subscribe(EventFilter::all());

        let queries = oracle.request_all();
        assert_eq!(queries.len(), 2);
        assert_eq!(oracle.service.balance(), U256::from(1000 - 2 * QUERY_PRICE));

        for expected in ["KNC", "OMG"] {
            let event = timeout(Duration::from_millis(100), sub.recv())
                .await
                .expect("timeout waiting for event")
                .expect("should receive event");
            match event {
                OracleEvent::UpdateRequested { symbol, .. } => assert_eq!(symbol, expected),
                _ => panic!("Expected UpdateRequested, got {:?}", event),
            }
        }

        let outcome = oracle
            .deliver(query_for(&queries, "KNC"), "0.001234", DATE)
            .unwrap();
        assert_eq!(
            outcome,
            CallbackOutcome::Committed {
                token: KNC,
                rate: U256::from(1_234_000_000_000_000u64),
                timestamp: 20180912151814,
            }
        );

        let verified = timeout(Duration::from_millis(100), sub.recv())
            .await
            .unwrap()
            .unwrap();
        assert!(matches!(verified, OracleEvent::ProofVerified { ref result, .. } if result == "0.001234"));

        let updated = timeout(Duration::from_millis(100), sub.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            updated,
            OracleEvent::TokenRateUpdated {
                sender: DISPATCH,
                token: KNC,
                rate: U256::from(1_234_000_000_000_000u64),
            }
        );

        // 2 KNC at 0.001234 base units each
        assert_eq!(
            oracle.service.convert(&KNC, U256::from(2u8) * U256::exp10(18)),
            Ok(U256::from(2_468_000_000_000_000u64))
        );
        // OMG still waits for its answer
        assert_eq!(oracle.service.pending_queries().len(), 1);
        assert_eq!(
            oracle.service.convert(&OMG, U256::one()),
            Err(OracleError::NotFound(OMG))
        );
    }

    /// Scientific notation from the pricing API lands as the exact wei value
    #[test]
    fn test_scientific_notation_payload() {
        let oracle = Oracle::new(FailedProofPolicy::Retain);
        let queries = oracle.request_all();

        oracle
            .deliver(query_for(&queries, "OMG"), "7.5e-5", DATE)
            .unwrap();

        let token = oracle.service.token(&OMG).unwrap();
        assert_eq!(token.rate, U256::from(75_000_000_000_000u64));
        // 1.5 OMG (9 decimals)
        assert_eq!(
            oracle.service.convert(&OMG, U256::from(1_500_000_000u64)),
            Ok(U256::from(112_500_000_000_000u64))
        );
    }

    // =============================================================================
    // INTEGRATION TESTS: REJECTIONS
    // =============================================================================

    /// A payload that differs from the signed one fails the hash stage
    #[test]
    fn test_tampered_result_fails_hash_stage() {
        let oracle = Oracle::new(FailedProofPolicy::Retain);
        let queries = oracle.request_all();
        let mut sub = oracle.bus.subscribe(EventFilter::topics(vec![EventTopic::Proofs]));

        let outcome = oracle
            .deliver_signed(
                &oracle.signer,
                query_for(&queries, "KNC"),
                "0.001234",
                "0.002",
                DATE,
            )
            .unwrap();

        assert_eq!(outcome.rejected_stage(), Some(VerificationStage::Hash));
        assert!(!oracle.service.token(&KNC).unwrap().has_rate());

        let events = sub.drain();
        assert_eq!(failure_reasons(&events), vec!["hash"]);
        match &events[0] {
            OracleEvent::ProofVerificationFailed {
                public_key, result, ..
            } => {
                assert_eq!(public_key.as_slice(), oracle.signer.public_key().as_bytes());
                assert_eq!(result, "0.002");
            }
            other => panic!("Expected ProofVerificationFailed, got {:?}", other),
        }
    }

    /// After key rotation only the new signer's proofs verify
    #[test]
    fn test_key_rotation() {
        let oracle = Oracle::new(FailedProofPolicy::Retain);
        let queries = oracle.request_all();
        let knc = query_for(&queries, "KNC");

        let rotated = LocalApiSigner::random();
        oracle
            .service
            .update_api_public_key(CONTROLLER, rotated.public_key().as_bytes())
            .unwrap();
        assert_eq!(oracle.service.api_public_key(), rotated.public_key());

        let stale_signer = oracle.deliver(knc, "0.001234", DATE).unwrap();
        assert_eq!(
            stale_signer.rejected_stage(),
            Some(VerificationStage::Signature)
        );

        // Retained correlation accepts the proof from the new key
        let outcome = oracle
            .deliver_signed(&rotated, knc, "0.001234", "0.001234", DATE)
            .unwrap();
        assert!(outcome.is_committed());
    }

    /// An older proof cannot overwrite a newer committed rate
    #[test]
    fn test_out_of_order_callbacks() {
        let oracle = Oracle::new(FailedProofPolicy::Retain);
        let first = oracle.request_all();
        let second = oracle.request_all();

        oracle
            .deliver(query_for(&second, "KNC"), "0.002", LATER_DATE)
            .unwrap();
        let late = oracle
            .deliver(query_for(&first, "KNC"), "0.001", DATE)
            .unwrap();

        assert_eq!(late.rejected_stage(), Some(VerificationStage::Date));
        let token = oracle.service.token(&KNC).unwrap();
        assert_eq!(token.rate, U256::from(2_000_000_000_000_000u64));
        assert_eq!(token.last_update, 20180912151815);
    }

    /// Same-second proofs are stale: freshness is strictly increasing
    #[test]
    fn test_equal_timestamp_is_stale() {
        let oracle = Oracle::new(FailedProofPolicy::Retain);
        let first = oracle.request_all();
        let second = oracle.request_all();

        assert!(oracle
            .deliver(query_for(&first, "KNC"), "0.001", DATE)
            .unwrap()
            .is_committed());
        assert_eq!(
            oracle
                .deliver(query_for(&second, "KNC"), "0.002", DATE)
                .unwrap()
                .rejected_stage(),
            Some(VerificationStage::Date)
        );
    }

    // =============================================================================
    // INTEGRATION TESTS: CORRELATION POLICY
    // =============================================================================

    #[test]
    fn test_retain_policy_accepts_corrected_proof() {
        let oracle = Oracle::new(FailedProofPolicy::Retain);
        let queries = oracle.request_all();
        let knc = query_for(&queries, "KNC");

        let bad = oracle
            .deliver_signed(&oracle.signer, knc, "1", "2", DATE)
            .unwrap();
        assert!(!bad.is_committed());

        assert!(oracle.deliver(knc, "2", DATE).unwrap().is_committed());
        // Committed correlations close
        assert_eq!(
            oracle.deliver(knc, "2", LATER_DATE),
            Err(OracleError::UnknownQuery(knc.query_id))
        );
    }

    #[test]
    fn test_discard_policy_closes_correlation() {
        let oracle = Oracle::new(FailedProofPolicy::Discard);
        let queries = oracle.request_all();
        let knc = query_for(&queries, "KNC");

        let bad = oracle
            .deliver_signed(&oracle.signer, knc, "1", "2", DATE)
            .unwrap();
        assert_eq!(bad.rejected_stage(), Some(VerificationStage::Hash));

        assert_eq!(
            oracle.deliver(knc, "2", DATE),
            Err(OracleError::UnknownQuery(knc.query_id))
        );
        assert_eq!(oracle.service.pending_queries().len(), 1);
    }

    // =============================================================================
    // INTEGRATION TESTS: ABORTS
    // =============================================================================

    #[test]
    fn test_callback_from_non_dispatcher_unauthorized() {
        let oracle = Oracle::new(FailedProofPolicy::Retain);
        let queries = oracle.request_all();
        let knc = query_for(&queries, "KNC");
        let proof = oracle.signer.sign_result("0.1", DATE).unwrap();

        assert_eq!(
            oracle.service.callback(CONTROLLER, knc.query_id, "0.1", &proof),
            Err(OracleError::Unauthorized(CONTROLLER))
        );
        assert_eq!(oracle.service.pending_queries().len(), 2);
    }

    #[test]
    fn test_callback_for_removed_token() {
        let oracle = Oracle::new(FailedProofPolicy::Retain);
        let queries = oracle.request_all();

        oracle.service.remove_tokens(CONTROLLER, &[KNC]).unwrap();

        let knc = query_for(&queries, "KNC");
        assert_eq!(
            oracle.deliver(knc, "0.1", DATE),
            Err(OracleError::UnknownQuery(knc.query_id))
        );
        assert_eq!(oracle.service.pending_queries().len(), 1);
        assert_eq!(oracle.service.token_addresses(), vec![OMG]);
    }

    #[test]
    fn test_truncated_proof_is_malformed() {
        let oracle = Oracle::new(FailedProofPolicy::Retain);
        let queries = oracle.request_all();
        let knc = query_for(&queries, "KNC");

        let mut proof = oracle.signer.sign_result("0.1", DATE).unwrap();
        proof.truncate(40);

        assert!(matches!(
            oracle.service.callback(DISPATCH, knc.query_id, "0.1", &proof),
            Err(OracleError::MalformedProof(_))
        ));
    }

    /// An unaffordable batch issues nothing and says why on the bus
    #[test]
    fn test_unfunded_batch_is_skipped() {
        let oracle = Oracle::new(FailedProofPolicy::Retain);
        oracle
            .service
            .withdraw(CONTROLLER, CONTROLLER, U256::from(995u32))
            .unwrap();
        let mut sub = oracle.bus.subscribe(EventFilter::topics(vec![EventTopic::Queries]));

        let outcome = oracle.service.update_token_rates(CONTROLLER, 200_000).unwrap();
        assert_eq!(
            outcome,
            BatchOutcome::Skipped(BatchShortfall::InsufficientFunds {
                required: U256::from(2 * QUERY_PRICE),
                available: U256::from(5u8),
            })
        );
        assert_eq!(oracle.query_service.pending_count(), 0);
        assert!(oracle.service.pending_queries().is_empty());

        let events = sub.drain();
        assert!(matches!(
            events.as_slice(),
            [OracleEvent::UpdateRequestFailed { .. }]
        ));
    }

    // =============================================================================
    // INTEGRATION TESTS: SUBSCRIBER FILTERING
    // =============================================================================

    /// A rates-only subscriber sees manual and verified updates, nothing else
    #[test]
    fn test_rates_subscriber() {
        let oracle = Oracle::new(FailedProofPolicy::Retain);
        let mut rates = oracle.bus.subscribe(EventFilter::topics(vec![EventTopic::Rates]));

        oracle
            .service
            .update_token_rate(CONTROLLER, OMG, U256::from(42u8), REGISTERED_AT + 1)
            .unwrap();
        let queries = oracle.request_all();
        oracle
            .deliver(query_for(&queries, "KNC"), "0.5", DATE)
            .unwrap();

        let senders: Vec<_> = rates
            .drain()
            .into_iter()
            .map(|e| match e {
                OracleEvent::TokenRateUpdated { sender, .. } => sender,
                other => panic!("Unexpected event {:?}", other),
            })
            .collect();
        assert_eq!(senders, vec![CONTROLLER, DISPATCH]);
    }

    /// A token subscriber only hears about its token
    #[test]
    fn test_token_subscriber() {
        let oracle = Oracle::new(FailedProofPolicy::Retain);
        let mut omg_only = oracle.bus.subscribe(EventFilter::for_tokens(vec![OMG]));

        let queries = oracle.request_all();
        oracle
            .deliver(query_for(&queries, "KNC"), "0.5", DATE)
            .unwrap();
        oracle
            .deliver(query_for(&queries, "OMG"), "0.25", DATE)
            .unwrap();
        oracle.service.remove_tokens(CONTROLLER, &[OMG]).unwrap();

        let events = omg_only.drain();
        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|e| e.token() == Some(OMG)));
        assert!(matches!(events[1], OracleEvent::TokenRemoved { .. }));
    }
}
