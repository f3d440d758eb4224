//! Standalone adjustment records: deductions, incentives and additional charges.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ServiceWeek;

/// Direction of an additional charge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChargeKind {
    /// Added to the week.
    Charge,
    /// Taken off the week.
    Deduction,
}

impl ChargeKind {
    /// Applies the sign of this kind to `rate`.
    pub fn signed(self, rate: Decimal) -> Decimal {
        match self {
            ChargeKind::Charge => rate,
            ChargeKind::Deduction => -rate,
        }
    }
}

/// A deduction against one worker-day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deduction {
    /// Unique identifier, also used as the adjustment id on the day record.
    pub id: Uuid,
    /// The worker being deducted.
    pub worker_id: String,
    /// The date the deduction applies to.
    pub date: NaiveDate,
    /// The unsigned amount.
    pub rate: Decimal,
    /// Free-text reason shown on documents.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// The day record carrying the delta; `None` when no record existed.
    pub linked_day_record: Option<Uuid>,
    /// When the deduction was recorded.
    pub created_at: DateTime<Utc>,
}

impl Deduction {
    /// Returns true if the deduction has no day-side effect.
    pub fn is_unlinked(&self) -> bool {
        self.linked_day_record.is_none()
    }
}

/// One day record touched by an incentive fan-out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncentiveApplication {
    /// The day record that received the delta.
    pub day_record_id: Uuid,
    /// Owner of the day record.
    pub worker_id: String,
    /// Week of the day record.
    pub service_week: ServiceWeek,
    /// The signed amount added.
    pub delta: Decimal,
}

/// A role-wide incentive over an inclusive date range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Incentive {
    /// Unique identifier, also used as the adjustment id on each day record.
    pub id: Uuid,
    /// The role the incentive targets.
    pub role: String,
    /// The unsigned amount added per matching day.
    pub rate: Decimal,
    /// First date in range.
    pub start_date: NaiveDate,
    /// Last date in range.
    pub end_date: NaiveDate,
    /// Free-text reason shown on documents.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Every day record the incentive was applied to.
    #[serde(default)]
    pub applications: Vec<IncentiveApplication>,
    /// When the incentive was recorded.
    pub created_at: DateTime<Utc>,
}

impl Incentive {
    /// Checks whether `date` is inside the incentive's range.
    pub fn covers(&self, date: NaiveDate) -> bool {
        date >= self.start_date && date <= self.end_date
    }
}

/// A week-level charge or credit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdditionalCharge {
    /// Unique identifier.
    pub id: Uuid,
    /// The worker whose week is adjusted.
    pub worker_id: String,
    /// The adjusted week.
    pub service_week: ServiceWeek,
    /// The unsigned amount.
    pub rate: Decimal,
    /// Whether the amount is added or taken off.
    pub kind: ChargeKind,
    /// Free-text reason shown on documents.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// When the charge was recorded.
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_charge_kind_serialization() {
        assert_eq!(serde_json::to_string(&ChargeKind::Charge).unwrap(), "\"charge\"");
        assert_eq!(
            serde_json::to_string(&ChargeKind::Deduction).unwrap(),
            "\"deduction\""
        );
    }

    #[test]
    fn test_charge_kind_signed() {
        assert_eq!(ChargeKind::Charge.signed(dec!(20)), dec!(20));
        assert_eq!(ChargeKind::Deduction.signed(dec!(20)), dec!(-20));
    }

    #[test]
    fn test_incentive_covers_inclusive_range() {
        let incentive = Incentive {
            id: Uuid::new_v4(),
            role: "driver".to_string(),
            rate: dec!(10),
            start_date: NaiveDate::from_ymd_opt(2024, 6, 3).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 6, 5).unwrap(),
            reason: None,
            applications: vec![],
            created_at: Utc::now(),
        };
        assert!(incentive.covers(NaiveDate::from_ymd_opt(2024, 6, 3).unwrap()));
        assert!(incentive.covers(NaiveDate::from_ymd_opt(2024, 6, 5).unwrap()));
        assert!(!incentive.covers(NaiveDate::from_ymd_opt(2024, 6, 6).unwrap()));
    }
}
