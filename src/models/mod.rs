//! Core data models for the pay ledger.
//!
//! This module contains the ledger's entities, the read-only worker view and
//! the tenant and event types that travel with every operation.

mod adjustment;
mod day_record;
mod event;
mod service_week;
mod week_invoice;
mod worker;

pub use adjustment::{AdditionalCharge, ChargeKind, Deduction, Incentive, IncentiveApplication};
pub use day_record::{AdjustmentKind, AdjustmentSnapshot, DayRecord};
pub use event::{ChangeEvent, ChangeKind, TenantContext};
pub use service_week::ServiceWeek;
pub use week_invoice::{AdditionalChargeSnapshot, WeekInvoice, WeekTotals};
pub use worker::{VatProfile, Worker};
