//! The cascade orchestrator.
//!
//! Every ledger operation runs the same sequence: locate the affected
//! records, project their post-operation state into a [`Plan`], run the
//! guard over every projected total, and only then commit the plan in one
//! atomic store call. A rejection writes nothing. A commit is followed by
//! best-effort change events.

use std::collections::HashMap;
use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::Plan;
use crate::calculation::{GuardReport, WeekAggregator};
use crate::config::LedgerConfig;
use crate::error::{EntityKind, LedgerError, LedgerResult};
use crate::models::{
    ChangeEvent, ChangeKind, DayRecord, ServiceWeek, TenantContext, WeekInvoice, Worker,
};
use crate::store::{ChangeNotifier, LedgerStore, WorkerProvider};

/// How guard violations are turned into an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum GuardMode {
    /// One logical target: the first violation is reported as `NegativeTotal`.
    Single,
    /// A fan-out: every violation is reported as `PartialBatchConflict`.
    Batch,
}

/// Ids written by a committed operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitSummary {
    /// Day records written or deleted.
    pub day_records: Vec<Uuid>,
    /// Week invoices written or deleted.
    pub week_invoices: Vec<Uuid>,
}

/// The pay ledger.
///
/// Holds the store, the worker provider, the change sink and the week
/// aggregator. Operations are grouped by concern in the sibling modules.
pub struct Ledger {
    pub(crate) store: Arc<dyn LedgerStore>,
    pub(crate) workers: Arc<dyn WorkerProvider>,
    pub(crate) notifier: Arc<dyn ChangeNotifier>,
    pub(crate) aggregator: WeekAggregator,
}

impl Ledger {
    /// Creates a ledger over the given collaborators.
    pub fn new(
        config: &LedgerConfig,
        store: Arc<dyn LedgerStore>,
        workers: Arc<dyn WorkerProvider>,
        notifier: Arc<dyn ChangeNotifier>,
    ) -> Self {
        Self {
            store,
            workers,
            notifier,
            aggregator: WeekAggregator::new(config.vat.rate),
        }
    }

    /// The VAT rate applied by this ledger.
    pub fn vat_rate(&self) -> Decimal {
        self.aggregator.vat_rate()
    }

    /// Read access to the underlying store.
    pub fn store(&self) -> &dyn LedgerStore {
        self.store.as_ref()
    }

    /// Returns the week invoice for a worker-week.
    pub fn week_invoice(
        &self,
        tenant: &TenantContext,
        worker_id: &str,
        service_week: ServiceWeek,
    ) -> LedgerResult<WeekInvoice> {
        self.store
            .week_invoice_by_key(tenant, worker_id, service_week)?
            .ok_or_else(|| {
                LedgerError::not_found(EntityKind::WeekInvoice, format!("{}@{}", worker_id, service_week))
            })
    }

    /// Returns a day record by id.
    pub fn day_record(&self, tenant: &TenantContext, id: Uuid) -> LedgerResult<DayRecord> {
        self.store
            .day_record(tenant, id)?
            .ok_or_else(|| LedgerError::not_found(EntityKind::DayRecord, id))
    }

    /// Fails with `DuplicateRecord` if `id` belongs to an adjustment of another kind.
    pub(crate) fn ensure_adjustment_id_free(
        &self,
        tenant: &TenantContext,
        id: Uuid,
        kind: EntityKind,
    ) -> LedgerResult<()> {
        let taken = match kind {
            EntityKind::Deduction => {
                self.store.incentive(tenant, id)?.is_some()
                    || self.store.additional_charge(tenant, id)?.is_some()
            }
            EntityKind::Incentive => {
                self.store.deduction(tenant, id)?.is_some()
                    || self.store.additional_charge(tenant, id)?.is_some()
            }
            EntityKind::AdditionalCharge => {
                self.store.deduction(tenant, id)?.is_some()
                    || self.store.incentive(tenant, id)?.is_some()
            }
            _ => false,
        };
        if taken {
            return Err(LedgerError::DuplicateRecord {
                entity: kind,
                key: id.to_string(),
            });
        }
        Ok(())
    }

    pub(crate) fn project<'a>(&'a self, tenant: &'a TenantContext) -> Projection<'a> {
        Projection {
            ledger: self,
            tenant,
            plan: Plan::new(),
            workers: HashMap::new(),
        }
    }

    /// Guards the projection and, if it passes, commits it and emits events.
    pub(crate) fn execute(
        &self,
        tenant: &TenantContext,
        projection: Projection<'_>,
        mode: GuardMode,
        operation: &'static str,
    ) -> LedgerResult<CommitSummary> {
        let plan = projection.plan;

        let mut report = GuardReport::new();
        for record in plan.day_records() {
            report.check_day(record.id, record.base_total);
        }
        for invoice in plan.week_invoices() {
            report.check_week(invoice.id, invoice.total());
        }
        let verdict = match mode {
            GuardMode::Single => report.finish_single(),
            GuardMode::Batch => report.finish_batch(),
        };
        if let Err(err) = verdict {
            self.reject(tenant, operation, &err);
            return Err(err);
        }

        if plan.is_empty() {
            debug!(tenant_id = %tenant.tenant_id, operation, "Nothing to commit");
            return Ok(CommitSummary::default());
        }

        let summary = CommitSummary {
            day_records: plan.touched_day_records(),
            week_invoices: plan.touched_week_invoices(),
        };

        if let Err(err) = self.store.commit(tenant, plan) {
            warn!(
                tenant_id = %tenant.tenant_id,
                operation,
                error = %err,
                "Commit failed"
            );
            return Err(err);
        }

        info!(
            tenant_id = %tenant.tenant_id,
            operation,
            day_records = summary.day_records.len(),
            week_invoices = summary.week_invoices.len(),
            "Committed"
        );

        if !summary.day_records.is_empty() {
            self.emit(tenant, ChangeKind::DayRecordUpdated, summary.day_records.clone());
        }
        if !summary.week_invoices.is_empty() {
            self.emit(tenant, ChangeKind::WeekInvoiceUpdated, summary.week_invoices.clone());
        }

        Ok(summary)
    }

    fn reject(&self, tenant: &TenantContext, operation: &'static str, err: &LedgerError) {
        let ids: Vec<Uuid> = err.violations().iter().map(|v| v.id).collect();
        warn!(
            tenant_id = %tenant.tenant_id,
            operation,
            violations = ids.len(),
            error = %err,
            "Rejected by guard"
        );
        self.emit(tenant, ChangeKind::AdjustmentRejected, ids);
    }

    fn emit(&self, tenant: &TenantContext, kind: ChangeKind, ids: Vec<Uuid>) {
        let event = ChangeEvent {
            tenant_id: tenant.tenant_id.clone(),
            kind,
            ids,
        };
        if let Err(err) = self.notifier.notify(&event) {
            warn!(
                tenant_id = %tenant.tenant_id,
                kind = ?kind,
                error = %err,
                "Change notification failed"
            );
        }
    }
}

/// The in-memory post-operation view of the records an operation touches.
///
/// Reads go through the plan first, so a record already projected (or
/// deleted) in this operation is seen in its projected state.
pub(crate) struct Projection<'a> {
    ledger: &'a Ledger,
    tenant: &'a TenantContext,
    plan: Plan,
    workers: HashMap<String, Worker>,
}

impl Projection<'_> {
    /// Reads a worker once per operation.
    pub(crate) fn worker(&mut self, worker_id: &str) -> LedgerResult<Worker> {
        if let Some(worker) = self.workers.get(worker_id) {
            return Ok(worker.clone());
        }
        let worker = self.ledger.workers.get_worker(self.tenant, worker_id)?;
        self.workers.insert(worker_id.to_string(), worker.clone());
        Ok(worker)
    }

    pub(crate) fn day_record(&self, id: Uuid) -> LedgerResult<Option<DayRecord>> {
        if self.plan.removed_day_records.contains_key(&id) {
            return Ok(None);
        }
        if let Some(record) = self.plan.day_records.get(&id) {
            return Ok(Some(record.clone()));
        }
        self.ledger.store.day_record(self.tenant, id)
    }

    pub(crate) fn require_day_record(&self, id: Uuid) -> LedgerResult<DayRecord> {
        self.day_record(id)?
            .ok_or_else(|| LedgerError::not_found(EntityKind::DayRecord, id))
    }

    pub(crate) fn week_invoice(
        &self,
        worker_id: &str,
        service_week: ServiceWeek,
    ) -> LedgerResult<Option<WeekInvoice>> {
        if let Some(invoice) = self
            .plan
            .week_invoices
            .values()
            .find(|w| w.worker_id == worker_id && w.service_week == service_week)
        {
            return Ok(Some(invoice.clone()));
        }
        let stored = self
            .ledger
            .store
            .week_invoice_by_key(self.tenant, worker_id, service_week)?;
        Ok(stored.filter(|w| !self.plan.removed_week_invoices.contains_key(&w.id)))
    }

    pub(crate) fn require_week_invoice(
        &self,
        worker_id: &str,
        service_week: ServiceWeek,
    ) -> LedgerResult<WeekInvoice> {
        self.week_invoice(worker_id, service_week)?.ok_or_else(|| {
            LedgerError::not_found(EntityKind::WeekInvoice, format!("{}@{}", worker_id, service_week))
        })
    }

    /// Recomputes an invoice against projected day records without staging it.
    ///
    /// References to day records that no longer exist are dropped. Returns the
    /// invoice and whether its totals or references changed.
    pub(crate) fn recompute(&mut self, mut invoice: WeekInvoice) -> LedgerResult<(WeekInvoice, bool)> {
        let worker = self.worker(&invoice.worker_id)?;

        let mut days = Vec::with_capacity(invoice.day_records.len());
        let mut dangling = Vec::new();
        for id in &invoice.day_records {
            match self.day_record(*id)? {
                Some(day) => days.push(day),
                None => dangling.push(*id),
            }
        }
        for id in &dangling {
            invoice.day_records.remove(id);
        }

        let totals_changed = self.ledger.aggregator.recompute(&worker, &mut invoice, &days);
        debug!(
            tenant_id = %self.tenant.tenant_id,
            worker_id = %invoice.worker_id,
            service_week = %invoice.service_week,
            base_total = %invoice.totals.base_total,
            vat_total = %invoice.totals.vat_total,
            total = %invoice.totals.total,
            dangling = dangling.len(),
            "Projected week"
        );
        Ok((invoice, totals_changed || !dangling.is_empty()))
    }

    /// Recomputes an invoice and stages it in the plan.
    pub(crate) fn recompute_and_stage(&mut self, invoice: WeekInvoice) -> LedgerResult<WeekInvoice> {
        let (invoice, _) = self.recompute(invoice)?;
        self.plan.put_week_invoice(invoice.clone());
        Ok(invoice)
    }

    pub(crate) fn plan_mut(&mut self) -> &mut Plan {
        &mut self.plan
    }
}
