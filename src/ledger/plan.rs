//! Projected writes for one logical operation.
//!
//! A [`Plan`] holds the complete post-operation state of every record an
//! operation touches. It is built in memory, checked by the guard, and then
//! handed to [`LedgerStore::commit`](crate::store::LedgerStore::commit) which
//! applies it all at once or not at all.
//!
//! Day records and week invoices carry the version they were read at. A
//! version of `0` marks a record that has never been stored.

use std::collections::BTreeMap;

use uuid::Uuid;

use crate::models::{AdditionalCharge, DayRecord, Deduction, Incentive, WeekInvoice};

/// The full set of writes for one operation.
#[derive(Debug, Clone, Default)]
pub struct Plan {
    pub(crate) day_records: BTreeMap<Uuid, DayRecord>,
    pub(crate) removed_day_records: BTreeMap<Uuid, u64>,
    pub(crate) week_invoices: BTreeMap<Uuid, WeekInvoice>,
    pub(crate) removed_week_invoices: BTreeMap<Uuid, u64>,
    pub(crate) deductions: BTreeMap<Uuid, Deduction>,
    pub(crate) removed_deductions: Vec<Uuid>,
    pub(crate) incentives: BTreeMap<Uuid, Incentive>,
    pub(crate) removed_incentives: Vec<Uuid>,
    pub(crate) charges: BTreeMap<Uuid, AdditionalCharge>,
    pub(crate) removed_charges: Vec<Uuid>,
}

impl Plan {
    /// Creates an empty plan.
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes a day record in its projected state.
    pub fn put_day_record(&mut self, record: DayRecord) {
        self.day_records.insert(record.id, record);
    }

    /// Deletes a day record read at `record.version`.
    pub fn remove_day_record(&mut self, record: &DayRecord) {
        self.day_records.remove(&record.id);
        self.removed_day_records.insert(record.id, record.version);
    }

    /// Writes a week invoice in its projected state.
    pub fn put_week_invoice(&mut self, invoice: WeekInvoice) {
        self.week_invoices.insert(invoice.id, invoice);
    }

    /// Deletes a week invoice read at `invoice.version`.
    pub fn remove_week_invoice(&mut self, invoice: &WeekInvoice) {
        self.week_invoices.remove(&invoice.id);
        self.removed_week_invoices.insert(invoice.id, invoice.version);
    }

    /// Inserts or replaces a deduction.
    pub fn put_deduction(&mut self, deduction: Deduction) {
        self.deductions.insert(deduction.id, deduction);
    }

    /// Deletes a deduction.
    pub fn remove_deduction(&mut self, id: Uuid) {
        self.deductions.remove(&id);
        self.removed_deductions.push(id);
    }

    /// Inserts or replaces an incentive.
    pub fn put_incentive(&mut self, incentive: Incentive) {
        self.incentives.insert(incentive.id, incentive);
    }

    /// Deletes an incentive.
    pub fn remove_incentive(&mut self, id: Uuid) {
        self.incentives.remove(&id);
        self.removed_incentives.push(id);
    }

    /// Inserts or replaces an additional charge.
    pub fn put_additional_charge(&mut self, charge: AdditionalCharge) {
        self.charges.insert(charge.id, charge);
    }

    /// Deletes an additional charge.
    pub fn remove_additional_charge(&mut self, id: Uuid) {
        self.charges.remove(&id);
        self.removed_charges.push(id);
    }

    /// Projected day records written by this plan.
    pub fn day_records(&self) -> impl Iterator<Item = &DayRecord> {
        self.day_records.values()
    }

    /// Projected week invoices written by this plan.
    pub fn week_invoices(&self) -> impl Iterator<Item = &WeekInvoice> {
        self.week_invoices.values()
    }

    /// Ids of every day record written or deleted.
    pub fn touched_day_records(&self) -> Vec<Uuid> {
        self.day_records
            .keys()
            .chain(self.removed_day_records.keys())
            .copied()
            .collect()
    }

    /// Ids of every week invoice written or deleted.
    pub fn touched_week_invoices(&self) -> Vec<Uuid> {
        self.week_invoices
            .keys()
            .chain(self.removed_week_invoices.keys())
            .copied()
            .collect()
    }

    /// True when the plan writes nothing.
    pub fn is_empty(&self) -> bool {
        self.day_records.is_empty()
            && self.removed_day_records.is_empty()
            && self.week_invoices.is_empty()
            && self.removed_week_invoices.is_empty()
            && self.deductions.is_empty()
            && self.removed_deductions.is_empty()
            && self.incentives.is_empty()
            && self.removed_incentives.is_empty()
            && self.charges.is_empty()
            && self.removed_charges.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn make_day() -> DayRecord {
        DayRecord::new(
            "w-1",
            "driver",
            NaiveDate::from_ymd_opt(2024, 6, 3).unwrap(),
            dec!(100),
            false,
        )
    }

    #[test]
    fn test_new_plan_is_empty() {
        assert!(Plan::new().is_empty());
    }

    #[test]
    fn test_put_replaces_earlier_projection() {
        let mut plan = Plan::new();
        let mut day = make_day();
        plan.put_day_record(day.clone());
        day.base_total = dec!(70);
        plan.put_day_record(day.clone());

        assert_eq!(plan.day_records().count(), 1);
        assert_eq!(plan.day_records().next().unwrap().base_total, dec!(70));
    }

    #[test]
    fn test_remove_overrides_put() {
        let mut plan = Plan::new();
        let day = make_day();
        plan.put_day_record(day.clone());
        plan.remove_day_record(&day);

        assert_eq!(plan.day_records().count(), 0);
        assert_eq!(plan.touched_day_records(), vec![day.id]);
        assert!(!plan.is_empty());
    }
}
