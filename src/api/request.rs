//! Request types for the pay ledger API.
//!
//! Each body maps onto the matching ledger input. Client-supplied ids are
//! optional and make a retried request idempotent.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ledger::{NewAdditionalCharge, NewDayRecord, NewDeduction, NewIncentive};
use crate::models::{ChargeKind, ServiceWeek};

/// Request body for `POST /day-records`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayRecordRequest {
    /// The worker who worked the day.
    pub worker_id: String,
    /// The worked date.
    pub date: NaiveDate,
    /// The pay for the day; the worker's daily rate when omitted.
    #[serde(default)]
    pub base_total: Option<Decimal>,
}

/// Request body for `PUT /day-records/:id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateDayRecordRequest {
    /// The new pay entry.
    pub base_total: Decimal,
}

/// Request body for `POST /deductions`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeductionRequest {
    /// Optional client id for safe retries.
    #[serde(default)]
    pub id: Option<Uuid>,
    /// The worker being deducted.
    pub worker_id: String,
    /// The date to deduct from.
    pub date: NaiveDate,
    /// The amount to deduct.
    pub rate: Decimal,
    /// Free-text reason.
    #[serde(default)]
    pub reason: Option<String>,
}

/// Request body for `POST /incentives`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncentiveRequest {
    /// Optional client id for safe retries.
    #[serde(default)]
    pub id: Option<Uuid>,
    /// The targeted role.
    pub role: String,
    /// First covered date.
    pub start_date: NaiveDate,
    /// Last covered date.
    pub end_date: NaiveDate,
    /// Amount per covered day.
    pub rate: Decimal,
    /// Free-text reason.
    #[serde(default)]
    pub reason: Option<String>,
}

/// Request body for `POST /additional-charges`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdditionalChargeRequest {
    /// Optional client id for safe retries.
    #[serde(default)]
    pub id: Option<Uuid>,
    /// The worker whose week is charged.
    pub worker_id: String,
    /// The charged week, e.g. `"2024-W23"`.
    pub service_week: ServiceWeek,
    /// The amount.
    pub rate: Decimal,
    /// `charge` adds to the week, `deduction` takes off it.
    #[serde(default = "default_charge_kind")]
    pub kind: ChargeKind,
    /// Free-text reason.
    #[serde(default)]
    pub reason: Option<String>,
}

fn default_charge_kind() -> ChargeKind {
    ChargeKind::Charge
}

impl From<DayRecordRequest> for NewDayRecord {
    fn from(req: DayRecordRequest) -> Self {
        NewDayRecord {
            worker_id: req.worker_id,
            date: req.date,
            base_total: req.base_total,
        }
    }
}

impl From<DeductionRequest> for NewDeduction {
    fn from(req: DeductionRequest) -> Self {
        NewDeduction {
            id: req.id,
            worker_id: req.worker_id,
            date: req.date,
            rate: req.rate,
            reason: req.reason,
        }
    }
}

impl From<IncentiveRequest> for NewIncentive {
    fn from(req: IncentiveRequest) -> Self {
        NewIncentive {
            id: req.id,
            role: req.role,
            start_date: req.start_date,
            end_date: req.end_date,
            rate: req.rate,
            reason: req.reason,
        }
    }
}

impl From<AdditionalChargeRequest> for NewAdditionalCharge {
    fn from(req: AdditionalChargeRequest) -> Self {
        NewAdditionalCharge {
            id: req.id,
            worker_id: req.worker_id,
            service_week: req.service_week,
            rate: req.rate,
            kind: req.kind,
            reason: req.reason,
        }
    }
}
