//! Configuration loading for the pay ledger.
//!
//! # Example
//!
//! ```no_run
//! use pay_ledger::config::ConfigLoader;
//!
//! let config = ConfigLoader::load("./config").unwrap();
//! println!("Currency: {}", config.config().currency.code);
//! ```

mod loader;
mod types;

pub use loader::{CONFIG_FILE, ConfigLoader};
pub use types::{CurrencyConfig, LedgerConfig, VatConfig};
