//! # Token Registry
//!
//! Keyed token store plus the insertion-ordered identity list used for batch
//! iteration. The list always holds exactly the registered identities;
//! removal swaps the last identity into the vacated slot.

use super::entities::{Address, Token, U256};
use super::errors::OracleError;
use shared_types::{U512, ZERO_ADDRESS};
use std::collections::HashMap;

/// Registry of tokens and their current rates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenRegistry {
    tokens: HashMap<Address, Token>,
    order: Vec<Address>,
}

impl TokenRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a token with no rate.
    pub fn add(
        &mut self,
        identity: Address,
        symbol: &str,
        magnitude: U256,
        as_of: u64,
    ) -> Result<(), OracleError> {
        if self.tokens.contains_key(&identity) {
            return Err(OracleError::AlreadyExists(identity));
        }
        if identity == ZERO_ADDRESS {
            return Err(invalid_token(identity, "zero address"));
        }
        if symbol.is_empty() {
            return Err(invalid_token(identity, "empty symbol"));
        }
        if magnitude.is_zero() {
            return Err(invalid_token(identity, "zero magnitude"));
        }

        self.tokens
            .insert(identity, Token::new(symbol, magnitude, as_of));
        self.order.push(identity);
        Ok(())
    }

    /// Remove a token, returning its last state.
    pub fn remove(&mut self, identity: &Address) -> Result<Token, OracleError> {
        let token = self
            .tokens
            .remove(identity)
            .ok_or(OracleError::NotFound(*identity))?;

        if let Some(index) = self.order.iter().position(|a| a == identity) {
            self.order.swap_remove(index);
        }
        Ok(token)
    }

    /// Overwrite a token's rate and freshness marker unconditionally.
    pub fn set_rate(
        &mut self,
        identity: &Address,
        rate: U256,
        as_of: u64,
    ) -> Result<(), OracleError> {
        let token = self
            .tokens
            .get_mut(identity)
            .ok_or(OracleError::NotFound(*identity))?;
        token.rate = rate;
        token.last_update = as_of;
        Ok(())
    }

    /// Price `amount` of a token in the base currency: `amount * rate / magnitude`.
    ///
    /// The product is formed in 512 bits so only a quotient wider than 256
    /// bits fails.
    pub fn convert(&self, identity: &Address, amount: U256) -> Result<U256, OracleError> {
        let token = self
            .tokens
            .get(identity)
            .filter(|t| t.has_rate())
            .ok_or(OracleError::NotFound(*identity))?;

        let quotient = amount.full_mul(token.rate) / U512::from(token.magnitude);
        U256::try_from(quotient).map_err(|_| OracleError::Overflow)
    }

    /// Register several tokens, failing on the first bad entry.
    ///
    /// Entries before the failure stay applied; run on a scratch copy for
    /// all-or-nothing semantics.
    pub fn add_batch<'a, I>(&mut self, entries: I, as_of: u64) -> Result<(), OracleError>
    where
        I: IntoIterator<Item = (Address, &'a str, U256)>,
    {
        for (identity, symbol, magnitude) in entries {
            self.add(identity, symbol, magnitude, as_of)?;
        }
        Ok(())
    }

    /// Remove several tokens; a duplicate fails its own existence check.
    pub fn remove_batch(&mut self, identities: &[Address]) -> Result<(), OracleError> {
        for identity in identities {
            self.remove(identity)?;
        }
        Ok(())
    }

    pub fn get(&self, identity: &Address) -> Option<&Token> {
        self.tokens.get(identity)
    }

    pub fn contains(&self, identity: &Address) -> bool {
        self.tokens.contains_key(identity)
    }

    /// Registered identities in list order.
    pub fn addresses(&self) -> &[Address] {
        &self.order
    }

    /// Tokens in list order.
    pub fn iter(&self) -> impl Iterator<Item = (&Address, &Token)> {
        self.order
            .iter()
            .filter_map(move |a| self.tokens.get(a).map(|t| (a, t)))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

fn invalid_token(token: Address, reason: &str) -> OracleError {
    OracleError::InvalidToken {
        token,
        reason: reason.to_string(),
    }
}
