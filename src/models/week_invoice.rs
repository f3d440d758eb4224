//! Week invoice model.

use std::collections::BTreeSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{ChargeKind, ServiceWeek};

/// Snapshot of an additional charge embedded in its week invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdditionalChargeSnapshot {
    /// The charge this snapshot was taken from.
    pub charge_id: Uuid,
    /// The unsigned amount.
    pub rate: Decimal,
    /// Whether the amount is added or taken off.
    pub kind: ChargeKind,
}

/// The derived totals of a week invoice.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekTotals {
    /// Sum of day totals and signed charges.
    pub base_total: Decimal,
    /// VAT on the VAT-applicable contributions.
    pub vat_total: Decimal,
    /// `base_total + vat_total`.
    pub total: Decimal,
}

/// The payable total for one worker over one service week.
///
/// Totals are only ever written by the week aggregator; nothing else edits
/// them directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekInvoice {
    /// Unique identifier.
    pub id: Uuid,
    /// The worker being paid.
    pub worker_id: String,
    /// The week being paid.
    pub service_week: ServiceWeek,
    /// Every day record aggregated into this invoice.
    pub day_records: BTreeSet<Uuid>,
    /// Additional charges and credits on this week.
    #[serde(default)]
    pub charges: Vec<AdditionalChargeSnapshot>,
    /// Derived totals.
    #[serde(flatten)]
    pub totals: WeekTotals,
    /// Optimistic concurrency version, bumped by the store on every write.
    #[serde(default)]
    pub version: u64,
}

impl WeekInvoice {
    /// Creates an empty invoice for a worker-week.
    pub fn new(worker_id: impl Into<String>, service_week: ServiceWeek) -> Self {
        Self {
            id: Uuid::new_v4(),
            worker_id: worker_id.into(),
            service_week,
            day_records: BTreeSet::new(),
            charges: Vec::new(),
            totals: WeekTotals::default(),
            version: 0,
        }
    }

    /// The payable total.
    pub fn total(&self) -> Decimal {
        self.totals.total
    }

    /// Finds an embedded charge snapshot.
    pub fn charge(&self, charge_id: Uuid) -> Option<&AdditionalChargeSnapshot> {
        self.charges.iter().find(|c| c.charge_id == charge_id)
    }

    /// The natural key used for the uniqueness constraint.
    pub fn key(&self) -> String {
        format!("{}@{}", self.worker_id, self.service_week)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_new_invoice_is_empty_and_zero() {
        let week: ServiceWeek = "2024-W23".parse().unwrap();
        let invoice = WeekInvoice::new("w-1", week);
        assert!(invoice.day_records.is_empty());
        assert!(invoice.charges.is_empty());
        assert_eq!(invoice.total(), Decimal::ZERO);
        assert_eq!(invoice.key(), "w-1@2024-W23");
    }

    #[test]
    fn test_totals_serialize_flat() {
        let week: ServiceWeek = "2024-W23".parse().unwrap();
        let mut invoice = WeekInvoice::new("w-1", week);
        invoice.totals = WeekTotals {
            base_total: dec!(100.00),
            vat_total: dec!(20.00),
            total: dec!(120.00),
        };
        let json = serde_json::to_value(&invoice).unwrap();
        assert_eq!(json["total"], "120.00");
        assert_eq!(json["vat_total"], "20.00");
        assert_eq!(json["service_week"], "2024-W23");
    }

    #[test]
    fn test_charge_lookup() {
        let week: ServiceWeek = "2024-W23".parse().unwrap();
        let mut invoice = WeekInvoice::new("w-1", week);
        let id = Uuid::new_v4();
        invoice.charges.push(AdditionalChargeSnapshot {
            charge_id: id,
            rate: dec!(20),
            kind: ChargeKind::Charge,
        });
        assert!(invoice.charge(id).is_some());
        assert!(invoice.charge(Uuid::new_v4()).is_none());
    }
}
