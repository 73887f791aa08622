//! # Config State
//!
//! Read-only settings the commands need after start-up: receipt header and
//! footer, paper width and the currency symbol.

use till_client::RegisterConfig;
use till_core::{Money, StoreInfo};

#[derive(Debug, Clone)]
pub struct ConfigState {
    store: StoreInfo,
    paper_width: usize,
}

impl ConfigState {
    pub fn new(store: StoreInfo, paper_width: usize) -> Self {
        ConfigState { store, paper_width }
    }

    pub fn store_info(&self) -> &StoreInfo {
        &self.store
    }

    pub fn paper_width(&self) -> usize {
        self.paper_width
    }

    /// Formats an amount with the store's currency symbol.
    pub fn format(&self, amount: Money) -> String {
        amount.format_with(&self.store.currency_symbol)
    }
}

impl From<&RegisterConfig> for ConfigState {
    fn from(config: &RegisterConfig) -> Self {
        ConfigState::new(config.store_info(), config.receipt.paper_width)
    }
}

impl Default for ConfigState {
    fn default() -> Self {
        ConfigState::from(&RegisterConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_register_config() {
        let mut config = RegisterConfig::default();
        config.store.name = "Corner Shop".to_string();
        config.store.currency_symbol = "£".to_string();
        config.receipt.paper_width = 48;

        let state = ConfigState::from(&config);
        assert_eq!(state.store_info().name, "Corner Shop");
        assert_eq!(state.paper_width(), 48);
        assert_eq!(state.format(Money::from_cents(1099)), "£10.99");
    }
}
