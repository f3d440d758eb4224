//! VAT applicability rules.
//!
//! VAT is charged on a contribution only when the worker is registered and
//! the contribution's date is on or after the registration's effective date.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::rounding::mul2;
use crate::models::{ServiceWeek, Worker};

/// The standard VAT rate used when no configuration overrides it.
pub const DEFAULT_VAT_RATE: Decimal = dec!(0.20);

/// Decides whether VAT applies to a record dated `record_date`.
///
/// # Examples
///
/// ```
/// use pay_ledger::calculation::is_vat_applicable;
/// use pay_ledger::models::{VatProfile, Worker};
/// use chrono::NaiveDate;
/// use rust_decimal_macros::dec;
///
/// let from = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
/// let worker = Worker::new("w-1", "driver", dec!(100)).with_vat(VatProfile::registered_from(from));
///
/// assert!(!is_vat_applicable(&worker, NaiveDate::from_ymd_opt(2024, 5, 31).unwrap()));
/// assert!(is_vat_applicable(&worker, from));
/// ```
pub fn is_vat_applicable(worker: &Worker, record_date: NaiveDate) -> bool {
    if !worker.vat.registered {
        return false;
    }
    match worker.vat.effective_date {
        Some(effective) => record_date >= effective,
        None => true,
    }
}

/// The date an additional charge is evaluated against: the Monday of its week.
pub fn charge_vat_date(service_week: ServiceWeek) -> NaiveDate {
    service_week.start_date()
}

/// VAT owed on `amount` at `rate`, rounded to currency precision.
pub fn vat_on(amount: Decimal, rate: Decimal) -> Decimal {
    mul2(amount, rate)
}
