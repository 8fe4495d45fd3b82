//! Fixed controller set.

use crate::domain::entities::Address;
use crate::ports::outbound::AuthorizationGateway;
use std::collections::HashSet;

/// Authorizes a static set of controller identities.
#[derive(Debug, Clone, Default)]
pub struct StaticAuthorization {
    controllers: HashSet<Address>,
}

impl StaticAuthorization {
    pub fn new(controllers: impl IntoIterator<Item = Address>) -> Self {
        Self {
            controllers: controllers.into_iter().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.controllers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.controllers.is_empty()
    }
}

impl AuthorizationGateway for StaticAuthorization {
    fn is_authorized(&self, caller: &Address) -> bool {
        self.controllers.contains(caller)
    }
}
