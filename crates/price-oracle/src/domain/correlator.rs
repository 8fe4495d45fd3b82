//! # Query Correlator
//!
//! Links each issued data request to the token that asked for it until a
//! verified callback closes it.

use super::entities::{Address, QueryId};
use super::errors::OracleError;
use shared_types::ZERO_ADDRESS;
use std::collections::HashMap;

/// Pending data requests keyed by correlation id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryCorrelator {
    pending: HashMap<QueryId, Address>,
}

impl QueryCorrelator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a request. Ids are unique per transport, so no check is made.
    pub fn open(&mut self, query_id: QueryId, token: Address) {
        self.pending.insert(query_id, token);
    }

    /// The token awaiting `query_id`. The record is kept.
    pub fn resolve(&self, query_id: &QueryId) -> Result<Address, OracleError> {
        match self.pending.get(query_id) {
            Some(token) if *token != ZERO_ADDRESS => Ok(*token),
            _ => Err(OracleError::UnknownQuery(*query_id)),
        }
    }

    /// Forget a request.
    pub fn close(&mut self, query_id: &QueryId) -> Option<Address> {
        self.pending.remove(query_id)
    }

    /// Forget every request awaiting `token`. Returns how many were closed.
    pub fn close_token(&mut self, token: &Address) -> usize {
        let before = self.pending.len();
        self.pending.retain(|_, pending| pending != token);
        before - self.pending.len()
    }

    pub fn contains(&self, query_id: &QueryId) -> bool {
        self.pending.contains_key(query_id)
    }

    /// Pending requests, sorted by id.
    pub fn pending(&self) -> Vec<(QueryId, Address)> {
        let mut entries: Vec<_> = self.pending.iter().map(|(q, a)| (*q, *a)).collect();
        entries.sort_unstable();
        entries
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_then_resolve() {
        let mut correlator = QueryCorrelator::new();
        correlator.open([1u8; 32], [9u8; 20]);

        assert_eq!(correlator.resolve(&[1u8; 32]), Ok([9u8; 20]));
        // resolve does not consume
        assert!(correlator.contains(&[1u8; 32]));
        assert_eq!(correlator.len(), 1);
    }

    #[test]
    fn test_close_token_drops_only_its_requests() {
        let mut correlator = QueryCorrelator::new();
        correlator.open([1u8; 32], [9u8; 20]);
        correlator.open([2u8; 32], [9u8; 20]);
        correlator.open([3u8; 32], [7u8; 20]);

        assert_eq!(correlator.close_token(&[9u8; 20]), 2);
        assert_eq!(correlator.pending(), vec![([3u8; 32], [7u8; 20])]);
        assert_eq!(correlator.close_token(&[9u8; 20]), 0);
    }

    #[test]
    fn test_resolve_unknown() {
        let correlator = QueryCorrelator::new();
        assert_eq!(
            correlator.resolve(&[2u8; 32]),
            Err(OracleError::UnknownQuery([2u8; 32]))
        );
    }

    #[test]
    fn test_zero_token_is_unknown() {
        let mut correlator = QueryCorrelator::new();
        correlator.open([3u8; 32], ZERO_ADDRESS);
        assert_eq!(
            correlator.resolve(&[3u8; 32]),
            Err(OracleError::UnknownQuery([3u8; 32]))
        );
    }

    #[test]
    fn test_close_removes() {
        let mut correlator = QueryCorrelator::new();
        correlator.open([1u8; 32], [9u8; 20]);

        assert_eq!(correlator.close(&[1u8; 32]), Some([9u8; 20]));
        assert_eq!(correlator.close(&[1u8; 32]), None);
        assert!(correlator.is_empty());
        assert!(correlator.resolve(&[1u8; 32]).is_err());
    }

    #[test]
    fn test_pending_sorted() {
        let mut correlator = QueryCorrelator::new();
        correlator.open([5u8; 32], [1u8; 20]);
        correlator.open([2u8; 32], [2u8; 20]);

        assert_eq!(
            correlator.pending(),
            vec![([2u8; 32], [2u8; 20]), ([5u8; 32], [1u8; 20])]
        );
    }
}
