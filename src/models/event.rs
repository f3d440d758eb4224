//! Tenant context and change events.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The tenant an operation runs against.
///
/// Passed explicitly into every ledger operation; the store partitions all
/// entities by `tenant_id`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TenantContext {
    /// The tenant identifier.
    pub tenant_id: String,
}

impl TenantContext {
    /// Creates a context for `tenant_id`.
    pub fn new(tenant_id: impl Into<String>) -> Self {
        Self {
            tenant_id: tenant_id.into(),
        }
    }
}

/// What a change event reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChangeKind {
    /// One or more day records were written.
    DayRecordUpdated,
    /// One or more week invoices were written or deleted.
    WeekInvoiceUpdated,
    /// An operation was rejected by the guard; ids name the offenders.
    AdjustmentRejected,
}

/// A best-effort notification emitted after a commit or rejection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    /// The tenant the change happened in.
    pub tenant_id: String,
    /// What happened.
    pub kind: ChangeKind,
    /// The affected entity ids.
    pub ids: Vec<Uuid>,
}
