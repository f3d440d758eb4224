//! Pure calculation rules for the pay ledger.
//!
//! This module holds everything that can be decided without touching a
//! store: currency rounding, VAT applicability, the non-negativity guard and
//! week aggregation.

mod aggregation;
mod guard;
mod rounding;
mod vat;

pub use aggregation::WeekAggregator;
pub use guard::{GuardReport, Violation, check_total, validate};
pub use rounding::{CURRENCY_SCALE, add2, mul2, round2};
pub use vat::{DEFAULT_VAT_RATE, charge_vat_date, is_vat_applicable, vat_on};
