//! Configuration types for the pay ledger.
//!
//! These are deserialized from `ledger.yaml`. Every section has a default
//! so a partial file only overrides what it names.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calculation::DEFAULT_VAT_RATE;

/// VAT settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VatConfig {
    /// The VAT rate as a fraction (e.g., `0.20` for 20%).
    pub rate: Decimal,
}

impl Default for VatConfig {
    fn default() -> Self {
        Self {
            rate: DEFAULT_VAT_RATE,
        }
    }
}

/// Currency settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrencyConfig {
    /// ISO 4217 currency code reported alongside amounts.
    pub code: String,
}

impl Default for CurrencyConfig {
    fn default() -> Self {
        Self {
            code: "GBP".to_string(),
        }
    }
}

/// The complete ledger configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// VAT settings.
    #[serde(default)]
    pub vat: VatConfig,
    /// Currency settings.
    #[serde(default)]
    pub currency: CurrencyConfig,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_default_config() {
        let config = LedgerConfig::default();
        assert_eq!(config.vat.rate, dec!(0.20));
        assert_eq!(config.currency.code, "GBP");
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config: LedgerConfig = serde_yaml::from_str("vat:\n  rate: \"0.15\"\n").unwrap();
        assert_eq!(config.vat.rate, dec!(0.15));
        assert_eq!(config.currency.code, "GBP");
    }
}
