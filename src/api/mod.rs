//! HTTP API for the pay ledger.
//!
//! This module exposes the ledger operations as JSON endpoints. The tenant
//! travels in the `x-tenant-id` header on every request.

mod handlers;
mod request;
mod response;
mod state;

pub use handlers::{TENANT_HEADER, create_router};
pub use request::{
    AdditionalChargeRequest, DayRecordRequest, DeductionRequest, IncentiveRequest,
    UpdateDayRecordRequest,
};
pub use response::{ApiError, ApiErrorResponse, WeekInvoiceResponse};
pub use state::AppState;
