//! Day record model.
//!
//! A [`DayRecord`] holds one worker's pay for one calendar date. Its
//! `base_total` is always re-derivable as the pay entry plus the deltas of
//! every adjustment snapshot embedded in it.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ServiceWeek;
use crate::calculation::round2;

/// The kind of day-level adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdjustmentKind {
    /// Money taken off the day.
    Deduction,
    /// Money added to the day.
    Incentive,
}

impl AdjustmentKind {
    /// The signed delta an adjustment of this kind contributes for `rate`.
    pub fn delta(self, rate: Decimal) -> Decimal {
        match self {
            AdjustmentKind::Deduction => -rate,
            AdjustmentKind::Incentive => rate,
        }
    }
}

/// Snapshot of an adjustment applied to a day record, kept for audit and reversal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjustmentSnapshot {
    /// The deduction or incentive that produced this delta.
    pub adjustment_id: Uuid,
    /// Deduction or incentive.
    pub kind: AdjustmentKind,
    /// The unsigned rate of the adjustment.
    pub rate: Decimal,
    /// The signed amount added to the day.
    pub delta: Decimal,
}

impl AdjustmentSnapshot {
    /// Creates a snapshot, deriving the delta from the kind.
    pub fn new(adjustment_id: Uuid, kind: AdjustmentKind, rate: Decimal) -> Self {
        let rate = round2(rate);
        Self {
            adjustment_id,
            kind,
            rate,
            delta: kind.delta(rate),
        }
    }
}

/// One worker's pay for one date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayRecord {
    /// Unique identifier.
    pub id: Uuid,
    /// The worker this record belongs to.
    pub worker_id: String,
    /// The worker's role when the record was created or last re-priced.
    pub role: String,
    /// The worked date.
    pub date: NaiveDate,
    /// The service week the date belongs to.
    pub service_week: ServiceWeek,
    /// The entered pay before adjustments.
    pub base_pay: Decimal,
    /// Whether `base_pay` came from the worker's daily rate and follows it.
    pub priced_from_daily_rate: bool,
    /// Every adjustment currently applied, in application order.
    #[serde(default)]
    pub adjustments: Vec<AdjustmentSnapshot>,
    /// `base_pay` plus every adjustment delta.
    pub base_total: Decimal,
    /// Optimistic concurrency version, bumped by the store on every write.
    #[serde(default)]
    pub version: u64,
}

impl DayRecord {
    /// Creates a record with no adjustments.
    pub fn new(
        worker_id: impl Into<String>,
        role: impl Into<String>,
        date: NaiveDate,
        base_pay: Decimal,
        priced_from_daily_rate: bool,
    ) -> Self {
        let base_pay = round2(base_pay);
        Self {
            id: Uuid::new_v4(),
            worker_id: worker_id.into(),
            role: role.into(),
            date,
            service_week: ServiceWeek::from_date(date),
            base_pay,
            priced_from_daily_rate,
            adjustments: Vec::new(),
            base_total: base_pay,
            version: 0,
        }
    }

    /// Re-derives `base_total` from the pay entry and the embedded adjustments.
    ///
    /// Rounds after each addition so totals never accumulate drift.
    pub fn derive_base_total(&self) -> Decimal {
        self.adjustments
            .iter()
            .fold(self.base_pay, |total, adj| round2(total + adj.delta))
    }

    /// Returns true if the adjustment has already been applied to this record.
    pub fn has_adjustment(&self, adjustment_id: Uuid) -> bool {
        self.adjustments
            .iter()
            .any(|adj| adj.adjustment_id == adjustment_id)
    }

    /// Finds an applied adjustment by id.
    pub fn adjustment(&self, adjustment_id: Uuid) -> Option<&AdjustmentSnapshot> {
        self.adjustments
            .iter()
            .find(|adj| adj.adjustment_id == adjustment_id)
    }

    /// The natural key used for the uniqueness constraint.
    pub fn key(&self) -> String {
        format!("{}@{}", self.worker_id, self.date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn make_record(base_pay: Decimal) -> DayRecord {
        DayRecord::new(
            "w-1",
            "driver",
            NaiveDate::from_ymd_opt(2024, 6, 3).unwrap(),
            base_pay,
            false,
        )
    }

    #[test]
    fn test_new_record_total_equals_rounded_pay() {
        let record = make_record(dec!(100.005));
        assert_eq!(record.base_pay, dec!(100.01));
        assert_eq!(record.base_total, dec!(100.01));
        assert_eq!(record.service_week.to_string(), "2024-W23");
        assert!(record.adjustments.is_empty());
    }

    #[test]
    fn test_derive_base_total_sums_deltas() {
        let mut record = make_record(dec!(100));
        record.adjustments.push(AdjustmentSnapshot::new(
            Uuid::new_v4(),
            AdjustmentKind::Deduction,
            dec!(30),
        ));
        record.adjustments.push(AdjustmentSnapshot::new(
            Uuid::new_v4(),
            AdjustmentKind::Incentive,
            dec!(12.50),
        ));
        assert_eq!(record.derive_base_total(), dec!(82.50));
    }

    #[test]
    fn test_adjustment_kind_delta_sign() {
        assert_eq!(AdjustmentKind::Deduction.delta(dec!(5)), dec!(-5));
        assert_eq!(AdjustmentKind::Incentive.delta(dec!(5)), dec!(5));
    }

    #[test]
    fn test_has_adjustment_by_id() {
        let mut record = make_record(dec!(100));
        let id = Uuid::new_v4();
        record
            .adjustments
            .push(AdjustmentSnapshot::new(id, AdjustmentKind::Incentive, dec!(1)));
        assert!(record.has_adjustment(id));
        assert!(!record.has_adjustment(Uuid::new_v4()));
        assert_eq!(record.adjustment(id).map(|a| a.delta), Some(dec!(1.00)));
    }

    #[test]
    fn test_key_combines_worker_and_date() {
        assert_eq!(make_record(dec!(1)).key(), "w-1@2024-06-03");
    }
}
