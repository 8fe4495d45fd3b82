//! # Simulated Pricing API
//!
//! Answers drained data-fetch requests the way the signed pricing endpoint
//! does: the quote text as the result, plus a proof whose header block is
//! dated with the current HTTP date and signed by the API key.

use chrono::{DateTime, Datelike, Timelike, Utc};
use price_oracle::{HeaderDate, IssuedQuery, LocalApiSigner, OracleError, QueryId};
use std::collections::HashMap;

/// `strftime` pattern of an RFC 7231 IMF-fixdate.
pub const HTTP_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// HTTP date header value for `now`.
pub fn http_date(now: DateTime<Utc>) -> String {
    now.format(HTTP_DATE_FORMAT).to_string()
}

/// Freshness marker for `now`, composed as `YYYYMMDDHHMMSS`.
pub fn composed_timestamp(now: DateTime<Utc>) -> u64 {
    HeaderDate {
        year: u64::from(now.year().unsigned_abs()),
        month: u64::from(now.month()),
        day: u64::from(now.day()),
        hour: u64::from(now.hour()),
        minute: u64::from(now.minute()),
        second: u64::from(now.second()),
    }
    .timestamp()
}

/// A signed answer ready for the oracle callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedAnswer {
    pub query_id: QueryId,
    pub result: String,
    pub proof: Vec<u8>,
}

/// Quote table plus the key that signs the answers.
#[derive(Clone)]
pub struct PriceFeed {
    signer: LocalApiSigner,
    quotes: HashMap<String, String>,
}

impl PriceFeed {
    pub fn new(signer: LocalApiSigner) -> Self {
        Self {
            signer,
            quotes: HashMap::new(),
        }
    }

    /// Answer `query` (the full query string) with `quote`.
    pub fn set_quote(&mut self, query: impl Into<String>, quote: impl Into<String>) {
        self.quotes.insert(query.into(), quote.into());
    }

    pub fn signer(&self) -> &LocalApiSigner {
        &self.signer
    }

    pub fn quote_count(&self) -> usize {
        self.quotes.len()
    }

    /// Sign an answer for `query`; `None` when no quote is configured for it.
    pub fn answer(
        &self,
        query: &IssuedQuery,
        now: DateTime<Utc>,
    ) -> Option<Result<SignedAnswer, OracleError>> {
        let quote = self.quotes.get(&query.query)?;
        let answer = self
            .signer
            .sign_result(quote, &http_date(now))
            .map(|proof| SignedAnswer {
                query_id: query.query_id,
                result: quote.clone(),
                proof,
            });
        Some(answer)
    }
}
