//! Boundaries between the ledger and its external collaborators.
//!
//! The ledger reads workers from a [`WorkerProvider`], persists through a
//! [`LedgerStore`] and announces commits to a [`ChangeNotifier`]. In-memory
//! implementations of all three live alongside the traits.

mod directory;
mod memory;
mod notifier;

use chrono::NaiveDate;
use uuid::Uuid;

use crate::error::LedgerResult;
use crate::ledger::Plan;
use crate::models::{
    AdditionalCharge, ChangeEvent, DayRecord, Deduction, Incentive, ServiceWeek, TenantContext,
    WeekInvoice, Worker,
};

pub use directory::InMemoryWorkerDirectory;
pub use memory::InMemoryStore;
pub use notifier::{RecordingNotifier, TracingNotifier};

/// Read-only access to worker profiles.
///
/// Implementations must reflect every profile write committed before the
/// ledger operation starts. The ledger does not re-validate what it gets.
pub trait WorkerProvider: Send + Sync {
    /// Returns the worker, or `NotFound`.
    fn get_worker(&self, tenant: &TenantContext, worker_id: &str) -> LedgerResult<Worker>;
}

/// Document store for ledger entities.
///
/// Day records are unique on `(worker, date)` and week invoices on
/// `(worker, service_week)`. [`commit`](LedgerStore::commit) must apply a
/// plan atomically: it checks every expected version and uniqueness
/// constraint first and writes nothing if any check fails.
pub trait LedgerStore: Send + Sync {
    /// Finds a day record by id.
    fn day_record(&self, tenant: &TenantContext, id: Uuid) -> LedgerResult<Option<DayRecord>>;

    /// Finds the day record for a worker-date.
    fn day_record_by_key(
        &self,
        tenant: &TenantContext,
        worker_id: &str,
        date: NaiveDate,
    ) -> LedgerResult<Option<DayRecord>>;

    /// Every day record dated within `[start, end]`, ordered by date.
    fn day_records_in_range(
        &self,
        tenant: &TenantContext,
        start: NaiveDate,
        end: NaiveDate,
    ) -> LedgerResult<Vec<DayRecord>>;

    /// Every day record of one worker, ordered by date.
    fn day_records_for_worker(
        &self,
        tenant: &TenantContext,
        worker_id: &str,
    ) -> LedgerResult<Vec<DayRecord>>;

    /// Finds a week invoice by id.
    fn week_invoice(&self, tenant: &TenantContext, id: Uuid) -> LedgerResult<Option<WeekInvoice>>;

    /// Finds the week invoice for a worker-week.
    fn week_invoice_by_key(
        &self,
        tenant: &TenantContext,
        worker_id: &str,
        service_week: ServiceWeek,
    ) -> LedgerResult<Option<WeekInvoice>>;

    /// Every week invoice of one worker, ordered by week.
    fn week_invoices_for_worker(
        &self,
        tenant: &TenantContext,
        worker_id: &str,
    ) -> LedgerResult<Vec<WeekInvoice>>;

    /// Every week invoice in the tenant.
    fn week_invoices(&self, tenant: &TenantContext) -> LedgerResult<Vec<WeekInvoice>>;

    /// Finds a deduction by id.
    fn deduction(&self, tenant: &TenantContext, id: Uuid) -> LedgerResult<Option<Deduction>>;

    /// Finds an incentive by id.
    fn incentive(&self, tenant: &TenantContext, id: Uuid) -> LedgerResult<Option<Incentive>>;

    /// Finds an additional charge by id.
    fn additional_charge(
        &self,
        tenant: &TenantContext,
        id: Uuid,
    ) -> LedgerResult<Option<AdditionalCharge>>;

    /// Applies every write in `plan`, or none of them.
    fn commit(&self, tenant: &TenantContext, plan: Plan) -> LedgerResult<()>;
}

/// Fire-and-forget sink for change events.
///
/// A failed delivery is logged by the caller and never rolls back the
/// committed ledger state.
pub trait ChangeNotifier: Send + Sync {
    /// Delivers one event.
    fn notify(&self, event: &ChangeEvent) -> LedgerResult<()>;
}
