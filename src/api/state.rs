//! Application state for the pay ledger API.

use std::sync::Arc;

use crate::config::LedgerConfig;
use crate::ledger::Ledger;

/// Shared application state.
///
/// Holds the ledger and the configuration it was built from.
#[derive(Clone)]
pub struct AppState {
    ledger: Arc<Ledger>,
    config: Arc<LedgerConfig>,
}

impl AppState {
    /// Creates a new application state.
    pub fn new(config: LedgerConfig, ledger: Ledger) -> Self {
        Self {
            ledger: Arc::new(ledger),
            config: Arc::new(config),
        }
    }

    /// Returns the ledger.
    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Returns the configuration.
    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_state_is_clone() {
        // axum state must be Clone
        fn assert_clone<T: Clone + Send + Sync + 'static>() {}
        assert_clone::<AppState>();
    }
}
