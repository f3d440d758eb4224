//! In-memory ledger store.
//!
//! Entities are partitioned by tenant behind a single `RwLock`. `commit`
//! holds the write lock for the whole validate-then-apply pass, which makes
//! each plan an atomic compare-and-swap over every record it touches.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::NaiveDate;
use uuid::Uuid;

use super::LedgerStore;
use crate::error::{EntityKind, LedgerError, LedgerResult};
use crate::ledger::Plan;
use crate::models::{
    AdditionalCharge, DayRecord, Deduction, Incentive, ServiceWeek, TenantContext, WeekInvoice,
};

#[derive(Debug, Default)]
struct Partition {
    day_records: HashMap<Uuid, DayRecord>,
    day_keys: HashMap<(String, NaiveDate), Uuid>,
    week_invoices: HashMap<Uuid, WeekInvoice>,
    week_keys: HashMap<(String, ServiceWeek), Uuid>,
    deductions: HashMap<Uuid, Deduction>,
    incentives: HashMap<Uuid, Incentive>,
    charges: HashMap<Uuid, AdditionalCharge>,
}

impl Partition {
    /// Checks every version and uniqueness constraint in `plan`.
    fn check(&self, plan: &Plan) -> LedgerResult<()> {
        for (id, version) in &plan.removed_day_records {
            match self.day_records.get(id) {
                Some(stored) if stored.version == *version => {}
                _ => return Err(conflict(EntityKind::DayRecord, id)),
            }
        }

        for record in plan.day_records.values() {
            let key = (record.worker_id.clone(), record.date);
            match self.day_records.get(&record.id) {
                None if record.version == 0 => {
                    let taken = self
                        .day_keys
                        .get(&key)
                        .is_some_and(|owner| !plan.removed_day_records.contains_key(owner));
                    if taken {
                        return Err(LedgerError::DuplicateRecord {
                            entity: EntityKind::DayRecord,
                            key: record.key(),
                        });
                    }
                }
                Some(stored)
                    if stored.version == record.version
                        && stored.worker_id == record.worker_id
                        && stored.date == record.date => {}
                _ => return Err(conflict(EntityKind::DayRecord, &record.id)),
            }
        }

        for (id, version) in &plan.removed_week_invoices {
            match self.week_invoices.get(id) {
                Some(stored) if stored.version == *version => {}
                _ => return Err(conflict(EntityKind::WeekInvoice, id)),
            }
        }

        for invoice in plan.week_invoices.values() {
            let key = (invoice.worker_id.clone(), invoice.service_week);
            match self.week_invoices.get(&invoice.id) {
                None if invoice.version == 0 => {
                    let taken = self
                        .week_keys
                        .get(&key)
                        .is_some_and(|owner| !plan.removed_week_invoices.contains_key(owner));
                    if taken {
                        // Another operation created the same worker-week first.
                        return Err(conflict(EntityKind::WeekInvoice, &invoice.key()));
                    }
                }
                Some(stored)
                    if stored.version == invoice.version
                        && stored.worker_id == invoice.worker_id
                        && stored.service_week == invoice.service_week => {}
                _ => return Err(conflict(EntityKind::WeekInvoice, &invoice.id)),
            }
        }

        Ok(())
    }

    fn apply(&mut self, plan: Plan) {
        for id in plan.removed_day_records.keys() {
            if let Some(record) = self.day_records.remove(id) {
                self.day_keys.remove(&(record.worker_id, record.date));
            }
        }
        for (id, mut record) in plan.day_records {
            record.version += 1;
            self.day_keys
                .insert((record.worker_id.clone(), record.date), id);
            self.day_records.insert(id, record);
        }

        for id in plan.removed_week_invoices.keys() {
            if let Some(invoice) = self.week_invoices.remove(id) {
                self.week_keys
                    .remove(&(invoice.worker_id, invoice.service_week));
            }
        }
        for (id, mut invoice) in plan.week_invoices {
            invoice.version += 1;
            self.week_keys
                .insert((invoice.worker_id.clone(), invoice.service_week), id);
            self.week_invoices.insert(id, invoice);
        }

        for id in plan.removed_deductions {
            self.deductions.remove(&id);
        }
        self.deductions.extend(plan.deductions);

        for id in plan.removed_incentives {
            self.incentives.remove(&id);
        }
        self.incentives.extend(plan.incentives);

        for id in plan.removed_charges {
            self.charges.remove(&id);
        }
        self.charges.extend(plan.charges);
    }
}

fn conflict(entity: EntityKind, id: &impl ToString) -> LedgerError {
    LedgerError::ConcurrentModification {
        entity,
        id: id.to_string(),
    }
}

/// A [`LedgerStore`] kept entirely in memory.
///
/// # Example
///
/// ```
/// use pay_ledger::models::TenantContext;
/// use pay_ledger::store::{InMemoryStore, LedgerStore};
///
/// let store = InMemoryStore::new();
/// let tenant = TenantContext::new("acme");
/// assert!(store.week_invoices(&tenant).unwrap().is_empty());
/// ```
#[derive(Debug, Default)]
pub struct InMemoryStore {
    tenants: RwLock<HashMap<String, Partition>>,
}

impl InMemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> LedgerResult<RwLockReadGuard<'_, HashMap<String, Partition>>> {
        self.tenants.read().map_err(|_| LedgerError::Storage {
            message: "store lock poisoned".to_string(),
        })
    }

    fn write(&self) -> LedgerResult<RwLockWriteGuard<'_, HashMap<String, Partition>>> {
        self.tenants.write().map_err(|_| LedgerError::Storage {
            message: "store lock poisoned".to_string(),
        })
    }

    fn with_partition<T>(
        &self,
        tenant: &TenantContext,
        f: impl FnOnce(&Partition) -> T,
    ) -> LedgerResult<T>
    where
        T: Default,
    {
        let tenants = self.read()?;
        Ok(tenants.get(&tenant.tenant_id).map(f).unwrap_or_default())
    }
}

impl LedgerStore for InMemoryStore {
    fn day_record(&self, tenant: &TenantContext, id: Uuid) -> LedgerResult<Option<DayRecord>> {
        self.with_partition(tenant, |p| p.day_records.get(&id).cloned())
    }

    fn day_record_by_key(
        &self,
        tenant: &TenantContext,
        worker_id: &str,
        date: NaiveDate,
    ) -> LedgerResult<Option<DayRecord>> {
        self.with_partition(tenant, |p| {
            p.day_keys
                .get(&(worker_id.to_string(), date))
                .and_then(|id| p.day_records.get(id))
                .cloned()
        })
    }

    fn day_records_in_range(
        &self,
        tenant: &TenantContext,
        start: NaiveDate,
        end: NaiveDate,
    ) -> LedgerResult<Vec<DayRecord>> {
        self.with_partition(tenant, |p| {
            let mut records: Vec<DayRecord> = p
                .day_records
                .values()
                .filter(|r| r.date >= start && r.date <= end)
                .cloned()
                .collect();
            records.sort_by(|a, b| (a.date, &a.worker_id).cmp(&(b.date, &b.worker_id)));
            records
        })
    }

    fn day_records_for_worker(
        &self,
        tenant: &TenantContext,
        worker_id: &str,
    ) -> LedgerResult<Vec<DayRecord>> {
        self.with_partition(tenant, |p| {
            let mut records: Vec<DayRecord> = p
                .day_records
                .values()
                .filter(|r| r.worker_id == worker_id)
                .cloned()
                .collect();
            records.sort_by_key(|r| r.date);
            records
        })
    }

    fn week_invoice(&self, tenant: &TenantContext, id: Uuid) -> LedgerResult<Option<WeekInvoice>> {
        self.with_partition(tenant, |p| p.week_invoices.get(&id).cloned())
    }

    fn week_invoice_by_key(
        &self,
        tenant: &TenantContext,
        worker_id: &str,
        service_week: ServiceWeek,
    ) -> LedgerResult<Option<WeekInvoice>> {
        self.with_partition(tenant, |p| {
            p.week_keys
                .get(&(worker_id.to_string(), service_week))
                .and_then(|id| p.week_invoices.get(id))
                .cloned()
        })
    }

    fn week_invoices_for_worker(
        &self,
        tenant: &TenantContext,
        worker_id: &str,
    ) -> LedgerResult<Vec<WeekInvoice>> {
        self.with_partition(tenant, |p| {
            let mut invoices: Vec<WeekInvoice> = p
                .week_invoices
                .values()
                .filter(|w| w.worker_id == worker_id)
                .cloned()
                .collect();
            invoices.sort_by_key(|w| w.service_week);
            invoices
        })
    }

    fn week_invoices(&self, tenant: &TenantContext) -> LedgerResult<Vec<WeekInvoice>> {
        self.with_partition(tenant, |p| {
            let mut invoices: Vec<WeekInvoice> = p.week_invoices.values().cloned().collect();
            invoices.sort_by(|a, b| {
                (&a.worker_id, a.service_week).cmp(&(&b.worker_id, b.service_week))
            });
            invoices
        })
    }

    fn deduction(&self, tenant: &TenantContext, id: Uuid) -> LedgerResult<Option<Deduction>> {
        self.with_partition(tenant, |p| p.deductions.get(&id).cloned())
    }

    fn incentive(&self, tenant: &TenantContext, id: Uuid) -> LedgerResult<Option<Incentive>> {
        self.with_partition(tenant, |p| p.incentives.get(&id).cloned())
    }

    fn additional_charge(
        &self,
        tenant: &TenantContext,
        id: Uuid,
    ) -> LedgerResult<Option<AdditionalCharge>> {
        self.with_partition(tenant, |p| p.charges.get(&id).cloned())
    }

    fn commit(&self, tenant: &TenantContext, plan: Plan) -> LedgerResult<()> {
        let mut tenants = self.write()?;
        let partition = tenants.entry(tenant.tenant_id.clone()).or_default();
        partition.check(&plan)?;
        partition.apply(plan);
        Ok(())
    }
}
