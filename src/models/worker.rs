//! Worker profile as seen by the ledger.
//!
//! Workers are owned by an external profile provider; the ledger only ever
//! reads them, most importantly for VAT decisions and daily-rate pricing.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A worker's VAT registration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VatProfile {
    /// Whether the worker is VAT registered.
    pub registered: bool,
    /// The first date on which VAT is charged. `None` on a registered worker
    /// means VAT applies to every record.
    #[serde(default)]
    pub effective_date: Option<NaiveDate>,
}

impl VatProfile {
    /// A profile for a worker that is not VAT registered.
    pub fn unregistered() -> Self {
        Self::default()
    }

    /// A profile for a worker registered from `effective_date`.
    pub fn registered_from(effective_date: NaiveDate) -> Self {
        Self {
            registered: true,
            effective_date: Some(effective_date),
        }
    }
}

/// A worker whose pay is tracked by the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Worker {
    /// Identifier assigned by the profile provider.
    pub id: String,
    /// The worker's role, used to target incentives.
    pub role: String,
    /// The default pay for one worked day.
    pub daily_rate: Decimal,
    /// VAT registration details.
    #[serde(default)]
    pub vat: VatProfile,
}

impl Worker {
    /// Creates a worker that is not VAT registered.
    ///
    /// # Examples
    ///
    /// ```
    /// use pay_ledger::models::Worker;
    /// use rust_decimal_macros::dec;
    ///
    /// let worker = Worker::new("w-1", "driver", dec!(100));
    /// assert!(!worker.vat.registered);
    /// ```
    pub fn new(id: impl Into<String>, role: impl Into<String>, daily_rate: Decimal) -> Self {
        Self {
            id: id.into(),
            role: role.into(),
            daily_rate,
            vat: VatProfile::unregistered(),
        }
    }

    /// Returns the worker with the given VAT profile.
    pub fn with_vat(mut self, vat: VatProfile) -> Self {
        self.vat = vat;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_deserialize_worker_without_vat_defaults_to_unregistered() {
        let json = r#"{
            "id": "w-1",
            "role": "driver",
            "daily_rate": "100.00"
        }"#;

        let worker: Worker = serde_json::from_str(json).unwrap();
        assert_eq!(worker.daily_rate, dec!(100.00));
        assert_eq!(worker.vat, VatProfile::unregistered());
    }

    #[test]
    fn test_deserialize_registered_worker() {
        let json = r#"{
            "id": "w-2",
            "role": "porter",
            "daily_rate": "85.50",
            "vat": { "registered": true, "effective_date": "2024-06-01" }
        }"#;

        let worker: Worker = serde_json::from_str(json).unwrap();
        assert!(worker.vat.registered);
        assert_eq!(
            worker.vat.effective_date,
            NaiveDate::from_ymd_opt(2024, 6, 1)
        );
    }

    #[test]
    fn test_with_vat_replaces_profile() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let worker = Worker::new("w-1", "driver", dec!(100)).with_vat(VatProfile::registered_from(date));
        assert_eq!(worker.vat.effective_date, Some(date));
    }
}
