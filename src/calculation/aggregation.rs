//! Week aggregation.
//!
//! Recomputes a week invoice's totals from its day records and embedded
//! charges. The computation is pure and idempotent: feeding it the same
//! records twice yields the same totals.

use rust_decimal::Decimal;

use super::rounding::add2;
use super::vat::{DEFAULT_VAT_RATE, charge_vat_date, is_vat_applicable, vat_on};
use crate::models::{AdditionalChargeSnapshot, DayRecord, ServiceWeek, WeekInvoice, WeekTotals, Worker};

/// Computes week totals with a fixed VAT rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeekAggregator {
    vat_rate: Decimal,
}

impl Default for WeekAggregator {
    fn default() -> Self {
        Self::new(DEFAULT_VAT_RATE)
    }
}

impl WeekAggregator {
    /// Creates an aggregator charging `vat_rate` on applicable contributions.
    pub fn new(vat_rate: Decimal) -> Self {
        Self { vat_rate }
    }

    /// The VAT rate in use.
    pub fn vat_rate(&self) -> Decimal {
        self.vat_rate
    }

    /// Computes totals for one worker-week.
    ///
    /// 1. `base_total` is the rounded running sum of day totals.
    /// 2. `vat_total` sums `day.base_total * vat_rate` over VAT-applicable days.
    /// 3. Each charge adds its signed rate to `base_total`. When the week's
    ///    Monday is VAT-applicable, `rate * vat_rate` is added to `vat_total`
    ///    for either kind.
    /// 4. `total = base_total + vat_total`.
    ///
    /// Every step rounds to two places.
    ///
    /// # Examples
    ///
    /// ```
    /// use pay_ledger::calculation::WeekAggregator;
    /// use pay_ledger::models::{DayRecord, ServiceWeek, Worker};
    /// use chrono::NaiveDate;
    /// use rust_decimal_macros::dec;
    ///
    /// let worker = Worker::new("w-1", "driver", dec!(100));
    /// let day = DayRecord::new("w-1", "driver", NaiveDate::from_ymd_opt(2024, 6, 3).unwrap(), dec!(100), true);
    /// let totals = WeekAggregator::default().compute(&worker, day.service_week, [&day], &[]);
    /// assert_eq!(totals.total, dec!(100.00));
    /// ```
    pub fn compute<'a>(
        &self,
        worker: &Worker,
        service_week: ServiceWeek,
        days: impl IntoIterator<Item = &'a DayRecord>,
        charges: &[AdditionalChargeSnapshot],
    ) -> WeekTotals {
        let mut base_total = Decimal::ZERO;
        let mut vat_total = Decimal::ZERO;

        for day in days {
            base_total = add2(base_total, day.base_total);
            if is_vat_applicable(worker, day.date) {
                vat_total = add2(vat_total, vat_on(day.base_total, self.vat_rate));
            }
        }

        let charges_taxable = is_vat_applicable(worker, charge_vat_date(service_week));
        for charge in charges {
            base_total = add2(base_total, charge.kind.signed(charge.rate));
            // VAT is on the charge rate whatever the kind.
            if charges_taxable {
                vat_total = add2(vat_total, vat_on(charge.rate, self.vat_rate));
            }
        }

        WeekTotals {
            base_total,
            vat_total,
            total: add2(base_total, vat_total),
        }
    }

    /// Recomputes and stores the totals on `invoice`, returning true if they changed.
    ///
    /// `days` must be exactly the records referenced by the invoice, in their
    /// post-mutation state.
    pub fn recompute<'a>(
        &self,
        worker: &Worker,
        invoice: &mut WeekInvoice,
        days: impl IntoIterator<Item = &'a DayRecord>,
    ) -> bool {
        let totals = self.compute(worker, invoice.service_week, days, &invoice.charges);
        let changed = totals != invoice.totals;
        invoice.totals = totals;
        changed
    }
}
