//! Cascades from outside the adjustment flow: worker profile changes and
//! explicit recomputation.

use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use super::engine::{GuardMode, Ledger};
use crate::calculation::round2;
use crate::error::{EntityKind, LedgerError, LedgerResult};
use crate::models::{ServiceWeek, TenantContext, WeekInvoice};

/// What a worker profile change rewrote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileChangeOutcome {
    /// The worker whose profile changed.
    pub worker_id: String,
    /// Day records repriced or given the new role.
    pub day_records: Vec<Uuid>,
    /// Week invoices whose totals changed, as stored.
    pub week_invoices: Vec<WeekInvoice>,
}

/// Counts from a tenant-wide recompute.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecomputeReport {
    /// Week invoices examined.
    pub checked: usize,
    /// Week invoices whose totals or references were corrected.
    pub updated: usize,
    /// Week invoices deleted because no day records remained.
    pub removed: usize,
}

impl Ledger {
    /// Re-reads a worker's profile and brings their records in line with it.
    ///
    /// Day records take the new role. Records priced from the daily rate are
    /// repriced. Every week invoice of the worker is recomputed, which picks
    /// up VAT registration changes.
    ///
    /// # Errors
    ///
    /// `PartialBatchConflict` if any repriced total would go negative.
    pub fn apply_profile_change(
        &self,
        tenant: &TenantContext,
        worker_id: &str,
    ) -> LedgerResult<ProfileChangeOutcome> {
        let mut projection = self.project(tenant);
        let worker = projection.worker(worker_id)?;
        let daily_rate = round2(worker.daily_rate);

        let mut day_records = Vec::new();
        for mut day in self.store.day_records_for_worker(tenant, &worker.id)? {
            let mut changed = false;
            if day.role != worker.role {
                day.role = worker.role.clone();
                changed = true;
            }
            if day.priced_from_daily_rate && day.base_pay != daily_rate {
                day.base_pay = daily_rate;
                day.base_total = day.derive_base_total();
                changed = true;
            }
            if changed {
                day_records.push(day.id);
                projection.plan_mut().put_day_record(day);
            }
        }

        let mut week_ids = Vec::new();
        for invoice in self.store.week_invoices_for_worker(tenant, &worker.id)? {
            let (invoice, changed) = projection.recompute(invoice)?;
            if changed {
                week_ids.push(invoice.id);
                projection.plan_mut().put_week_invoice(invoice);
            }
        }

        self.execute(tenant, projection, GuardMode::Batch, "apply_profile_change")?;
        info!(
            tenant_id = %tenant.tenant_id,
            worker_id = %worker.id,
            day_records = day_records.len(),
            week_invoices = week_ids.len(),
            "Profile change applied"
        );

        let mut week_invoices = Vec::with_capacity(week_ids.len());
        for id in week_ids {
            if let Some(invoice) = self.store.week_invoice(tenant, id)? {
                week_invoices.push(invoice);
            }
        }
        Ok(ProfileChangeOutcome {
            worker_id: worker.id,
            day_records,
            week_invoices,
        })
    }

    /// Recomputes one week invoice from its current inputs.
    ///
    /// Writes only when the stored totals differ, so calling it twice in a
    /// row changes nothing the second time.
    pub fn recompute_week(
        &self,
        tenant: &TenantContext,
        worker_id: &str,
        service_week: ServiceWeek,
    ) -> LedgerResult<WeekInvoice> {
        let mut projection = self.project(tenant);
        let invoice = projection.require_week_invoice(worker_id, service_week)?;
        let (invoice, changed) = projection.recompute(invoice)?;
        if !changed {
            return Ok(invoice);
        }

        let id = invoice.id;
        projection.plan_mut().put_week_invoice(invoice);
        self.execute(tenant, projection, GuardMode::Single, "recompute_week")?;
        self.store
            .week_invoice(tenant, id)?
            .ok_or_else(|| LedgerError::not_found(EntityKind::WeekInvoice, id))
    }

    /// Recomputes every week invoice in the tenant in one batch.
    ///
    /// Invoices left without day records are deleted with their charges.
    pub fn recompute_all(&self, tenant: &TenantContext) -> LedgerResult<RecomputeReport> {
        let mut projection = self.project(tenant);
        let mut report = RecomputeReport::default();

        for invoice in self.store.week_invoices(tenant)? {
            report.checked += 1;
            let (invoice, changed) = projection.recompute(invoice)?;
            if invoice.day_records.is_empty() {
                for charge in &invoice.charges {
                    projection.plan_mut().remove_additional_charge(charge.charge_id);
                }
                projection.plan_mut().remove_week_invoice(&invoice);
                report.removed += 1;
            } else if changed {
                projection.plan_mut().put_week_invoice(invoice);
                report.updated += 1;
            }
        }

        self.execute(tenant, projection, GuardMode::Batch, "recompute_all")?;
        info!(
            tenant_id = %tenant.tenant_id,
            checked = report.checked,
            updated = report.updated,
            removed = report.removed,
            "Recompute finished"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::Plan;
    use crate::ledger::tests::{date, fixture};
    use crate::models::{VatProfile, Worker};
    use crate::store::LedgerStore;
    use rust_decimal_macros::dec;

    #[test]
    fn test_rate_change_reprices_only_daily_rate_records() {
        let fx = fixture();
        let priced = fx.create_day("w-1", "2024-06-03", None);
        let manual = fx.create_day("w-1", "2024-06-04", Some(dec!(60)));
        fx.deduct("w-1", "2024-06-03", dec!(30));

        fx.directory
            .upsert(&fx.tenant, Worker::new("w-1", "driver", dec!(120)))
            .unwrap();
        let outcome = fx.ledger.apply_profile_change(&fx.tenant, "w-1").unwrap();

        assert_eq!(outcome.day_records, vec![priced.day_record.id]);
        let repriced = fx.ledger.day_record(&fx.tenant, priced.day_record.id).unwrap();
        assert_eq!(repriced.base_pay, dec!(120));
        assert_eq!(repriced.base_total, dec!(90));
        let untouched = fx.ledger.day_record(&fx.tenant, manual.day_record.id).unwrap();
        assert_eq!(untouched.base_total, dec!(60));
        assert_eq!(fx.week("w-1", "2024-W23").total(), dec!(150));
    }

    #[test]
    fn test_vat_registration_change_recomputes_weeks() {
        let fx = fixture();
        fx.create_day("w-1", "2024-06-03", Some(dec!(100)));
        fx.create_day("w-1", "2024-06-10", Some(dec!(100)));

        fx.directory
            .upsert(
                &fx.tenant,
                Worker::new("w-1", "driver", dec!(100))
                    .with_vat(VatProfile::registered_from(date("2024-06-10"))),
            )
            .unwrap();
        let outcome = fx.ledger.apply_profile_change(&fx.tenant, "w-1").unwrap();

        assert_eq!(outcome.week_invoices.len(), 1);
        assert_eq!(fx.week("w-1", "2024-W23").total(), dec!(100));
        assert_eq!(fx.week("w-1", "2024-W24").total(), dec!(120));
    }

    #[test]
    fn test_role_change_moves_records_to_new_role() {
        let fx = fixture();
        let day = fx.create_day("w-1", "2024-06-03", Some(dec!(100)));

        fx.directory
            .upsert(&fx.tenant, Worker::new("w-1", "porter", dec!(100)))
            .unwrap();
        fx.ledger.apply_profile_change(&fx.tenant, "w-1").unwrap();
        assert_eq!(
            fx.ledger.day_record(&fx.tenant, day.day_record.id).unwrap().role,
            "porter"
        );

        fx.incentive("porter", "2024-06-03", "2024-06-03", dec!(5));
        assert_eq!(fx.week("w-1", "2024-W23").total(), dec!(105));
    }

    #[test]
    fn test_rate_cut_below_deductions_is_rejected() {
        let fx = fixture();
        fx.create_day("w-1", "2024-06-03", None);
        fx.deduct("w-1", "2024-06-03", dec!(80));

        fx.directory
            .upsert(&fx.tenant, Worker::new("w-1", "driver", dec!(50)))
            .unwrap();
        let result = fx.ledger.apply_profile_change(&fx.tenant, "w-1");
        assert!(matches!(result, Err(LedgerError::PartialBatchConflict { .. })));
        assert_eq!(fx.week("w-1", "2024-W23").total(), dec!(20));
    }

    #[test]
    fn test_recompute_week_is_idempotent() {
        let fx = fixture();
        fx.create_day("w-1", "2024-06-03", Some(dec!(100)));
        let week: ServiceWeek = "2024-W23".parse().unwrap();
        let before = fx.week("w-1", "2024-W23");

        let first = fx.ledger.recompute_week(&fx.tenant, "w-1", week).unwrap();
        let second = fx.ledger.recompute_week(&fx.tenant, "w-1", week).unwrap();
        assert_eq!(first, before);
        assert_eq!(second, before);
    }

    #[test]
    fn test_recompute_all_repairs_stale_totals() {
        let fx = fixture();
        fx.create_day("w-1", "2024-06-03", Some(dec!(100)));
        fx.create_day("w-3", "2024-06-03", Some(dec!(90)));

        let mut stale = fx.week("w-1", "2024-W23");
        stale.totals.total = dec!(1);
        let mut plan = Plan::new();
        plan.put_week_invoice(stale);
        fx.store.commit(&fx.tenant, plan).unwrap();

        let report = fx.ledger.recompute_all(&fx.tenant).unwrap();
        assert_eq!(
            report,
            RecomputeReport {
                checked: 2,
                updated: 1,
                removed: 0
            }
        );
        assert_eq!(fx.week("w-1", "2024-W23").total(), dec!(100));
    }

    #[test]
    fn test_recompute_all_on_empty_tenant() {
        let fx = fixture();
        let report = fx.ledger.recompute_all(&fx.tenant).unwrap();
        assert_eq!(report, RecomputeReport::default());
    }
}
