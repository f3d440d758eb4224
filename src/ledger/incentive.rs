//! Incentive fan-out.
//!
//! An incentive applies to every day record of a role within a date range.
//! All affected records and their weeks are projected together and the
//! batch is committed only if no projected total goes negative.

use std::collections::BTreeSet;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use super::day_ledger::{apply_delta, remove_delta};
use super::engine::{GuardMode, Ledger, Projection};
use crate::calculation::round2;
use crate::error::{EntityKind, LedgerError, LedgerResult};
use crate::models::{
    AdjustmentKind, AdjustmentSnapshot, DayRecord, Incentive, IncentiveApplication, ServiceWeek,
    TenantContext, WeekInvoice,
};

/// Input for [`Ledger::apply_incentive`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewIncentive {
    /// Client-supplied id; retrying with the same id does not apply twice.
    #[serde(default)]
    pub id: Option<Uuid>,
    /// The role the incentive targets.
    pub role: String,
    /// First covered date, inclusive.
    pub start_date: NaiveDate,
    /// Last covered date, inclusive.
    pub end_date: NaiveDate,
    /// Amount added to each covered day; negative for a clawback.
    pub rate: Decimal,
    /// Free-text reason.
    #[serde(default)]
    pub reason: Option<String>,
}

/// An incentive and every record its operation wrote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncentiveOutcome {
    /// The stored (or, on removal, deleted) incentive.
    pub incentive: Incentive,
    /// Day records after the operation.
    pub day_records: Vec<DayRecord>,
    /// Week invoices after the operation.
    pub week_invoices: Vec<WeekInvoice>,
}

type WeekKey = (String, ServiceWeek);

impl NewIncentive {
    fn validate(&self) -> LedgerResult<Decimal> {
        if self.role.trim().is_empty() {
            return Err(LedgerError::invalid("role", "must not be empty"));
        }
        if self.start_date > self.end_date {
            return Err(LedgerError::invalid("end_date", "must not be before start_date"));
        }
        let rate = round2(self.rate);
        if rate.is_zero() {
            return Err(LedgerError::invalid("rate", "must not be zero"));
        }
        Ok(rate)
    }
}

impl Ledger {
    /// Applies an incentive to every matching day record, all or nothing.
    ///
    /// # Errors
    ///
    /// `PartialBatchConflict` listing every day record and week invoice
    /// that would go negative; nothing is written in that case.
    pub fn apply_incentive(
        &self,
        tenant: &TenantContext,
        input: NewIncentive,
    ) -> LedgerResult<IncentiveOutcome> {
        let rate = input.validate()?;
        let id = input.id.unwrap_or_else(Uuid::new_v4);

        if let Some(existing) = self.store.incentive(tenant, id)? {
            if existing.role != input.role
                || existing.start_date != input.start_date
                || existing.end_date != input.end_date
                || existing.rate != rate
            {
                return Err(LedgerError::DuplicateRecord {
                    entity: EntityKind::Incentive,
                    key: id.to_string(),
                });
            }
            info!(
                tenant_id = %tenant.tenant_id,
                incentive_id = %id,
                "Incentive already applied; returning stored result"
            );
            let day_ids: Vec<Uuid> = existing.applications.iter().map(|a| a.day_record_id).collect();
            let weeks = existing
                .applications
                .iter()
                .map(|a| (a.worker_id.clone(), a.service_week))
                .collect();
            return self.incentive_outcome(tenant, existing, &day_ids, &weeks);
        }
        self.ensure_adjustment_id_free(tenant, id, EntityKind::Incentive)?;

        let mut incentive = Incentive {
            id,
            role: input.role,
            rate,
            start_date: input.start_date,
            end_date: input.end_date,
            reason: input.reason,
            applications: Vec::new(),
            created_at: Utc::now(),
        };

        let mut projection = self.project(tenant);
        let mut weeks: BTreeSet<WeekKey> = BTreeSet::new();
        let mut day_ids = Vec::new();

        let days = self
            .store
            .day_records_in_range(tenant, incentive.start_date, incentive.end_date)?;
        for mut day in days.into_iter().filter(|d| d.role == incentive.role) {
            if day.has_adjustment(id) {
                return Err(LedgerError::DuplicateRecord {
                    entity: EntityKind::Incentive,
                    key: id.to_string(),
                });
            }
            let snapshot = AdjustmentSnapshot::new(id, AdjustmentKind::Incentive, rate);
            incentive.applications.push(IncentiveApplication {
                day_record_id: day.id,
                worker_id: day.worker_id.clone(),
                service_week: day.service_week,
                delta: snapshot.delta,
            });
            apply_delta(&mut day, snapshot);
            weeks.insert((day.worker_id.clone(), day.service_week));
            day_ids.push(day.id);
            projection.plan_mut().put_day_record(day);
        }

        stage_weeks(&mut projection, &weeks)?;
        projection.plan_mut().put_incentive(incentive.clone());

        self.execute(tenant, projection, GuardMode::Batch, "apply_incentive")?;
        info!(
            tenant_id = %tenant.tenant_id,
            role = %incentive.role,
            start_date = %incentive.start_date,
            end_date = %incentive.end_date,
            rate = %rate,
            day_records = day_ids.len(),
            week_invoices = weeks.len(),
            "Incentive applied"
        );

        self.incentive_outcome(tenant, incentive, &day_ids, &weeks)
    }

    /// Reverses every application of an incentive and deletes it.
    ///
    /// Day records deleted since the incentive was applied are skipped.
    pub fn remove_incentive(&self, tenant: &TenantContext, id: Uuid) -> LedgerResult<IncentiveOutcome> {
        let incentive = self
            .store
            .incentive(tenant, id)?
            .ok_or_else(|| LedgerError::not_found(EntityKind::Incentive, id))?;

        let mut projection = self.project(tenant);
        let mut weeks: BTreeSet<WeekKey> = BTreeSet::new();
        let mut day_ids = Vec::new();

        for application in &incentive.applications {
            let Some(mut day) = projection.day_record(application.day_record_id)? else {
                continue;
            };
            if remove_delta(&mut day, id, AdjustmentKind::Incentive).is_none() {
                continue;
            }
            weeks.insert((day.worker_id.clone(), day.service_week));
            day_ids.push(day.id);
            projection.plan_mut().put_day_record(day);
        }

        stage_weeks(&mut projection, &weeks)?;
        projection.plan_mut().remove_incentive(id);

        self.execute(tenant, projection, GuardMode::Batch, "remove_incentive")?;
        info!(
            tenant_id = %tenant.tenant_id,
            role = %incentive.role,
            day_records = day_ids.len(),
            "Incentive removed"
        );

        self.incentive_outcome(tenant, incentive, &day_ids, &weeks)
    }

    fn incentive_outcome(
        &self,
        tenant: &TenantContext,
        incentive: Incentive,
        day_ids: &[Uuid],
        weeks: &BTreeSet<WeekKey>,
    ) -> LedgerResult<IncentiveOutcome> {
        let mut day_records = Vec::with_capacity(day_ids.len());
        for id in day_ids {
            if let Some(day) = self.store.day_record(tenant, *id)? {
                day_records.push(day);
            }
        }
        let mut week_invoices = Vec::with_capacity(weeks.len());
        for (worker_id, week) in weeks {
            if let Some(invoice) = self.store.week_invoice_by_key(tenant, worker_id, *week)? {
                week_invoices.push(invoice);
            }
        }
        Ok(IncentiveOutcome {
            incentive,
            day_records,
            week_invoices,
        })
    }
}

/// Recomputes each distinct week once, after every day in it is projected.
fn stage_weeks(projection: &mut Projection<'_>, weeks: &BTreeSet<WeekKey>) -> LedgerResult<()> {
    for (worker_id, week) in weeks {
        let invoice = projection.require_week_invoice(worker_id, *week)?;
        projection.recompute_and_stage(invoice)?;
    }
    Ok(())
}
