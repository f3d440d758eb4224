//! Day ledger operations.
//!
//! Creating, editing and deleting day records, plus the delta primitives the
//! adjustment appliers use on projected records.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use super::engine::{GuardMode, Ledger};
use crate::calculation::{add2, round2};
use crate::error::{EntityKind, LedgerError, LedgerResult};
use crate::models::{AdjustmentKind, AdjustmentSnapshot, DayRecord, TenantContext, WeekInvoice};

/// Input for [`Ledger::create_day_record`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewDayRecord {
    /// The worker who worked the day.
    pub worker_id: String,
    /// The worked date.
    pub date: NaiveDate,
    /// The pay for the day; the worker's daily rate when omitted.
    #[serde(default)]
    pub base_total: Option<Decimal>,
}

/// A day record and its week invoice after a committed operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayRecordOutcome {
    /// The day record as stored.
    pub day_record: DayRecord,
    /// The week invoice as stored.
    pub week_invoice: WeekInvoice,
}

/// What deleting a day record did to its week.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayRecordRemoval {
    /// The deleted day record.
    pub day_record_id: Uuid,
    /// The week invoice after the delete; `None` if the week was deleted too.
    pub week_invoice: Option<WeekInvoice>,
    /// Deductions that lost their day record.
    pub unlinked_deductions: Vec<Uuid>,
}

/// Adds an adjustment's delta to a projected day record and records its snapshot.
///
/// Only the projection is changed; the guard decides whether it is committed.
pub fn apply_delta(record: &mut DayRecord, snapshot: AdjustmentSnapshot) {
    record.base_total = add2(record.base_total, snapshot.delta);
    record.adjustments.push(snapshot);
}

/// Reverses a previously applied adjustment and strips its snapshot.
///
/// Returns the removed snapshot, or `None` if no adjustment of that kind and
/// id was applied.
pub fn remove_delta(
    record: &mut DayRecord,
    adjustment_id: Uuid,
    kind: AdjustmentKind,
) -> Option<AdjustmentSnapshot> {
    let position = record
        .adjustments
        .iter()
        .position(|adj| adj.adjustment_id == adjustment_id && adj.kind == kind)?;
    let snapshot = record.adjustments.remove(position);
    record.base_total = record.derive_base_total();
    Some(snapshot)
}

fn check_pay(value: Decimal) -> LedgerResult<Decimal> {
    if value < Decimal::ZERO {
        return Err(LedgerError::invalid("base_total", "must not be negative"));
    }
    Ok(round2(value))
}

impl Ledger {
    /// Creates the day record for a worker-date and folds it into its week.
    ///
    /// The week invoice is created with the first day of the week.
    pub fn create_day_record(
        &self,
        tenant: &TenantContext,
        input: NewDayRecord,
    ) -> LedgerResult<DayRecordOutcome> {
        let base_total = input.base_total.map(check_pay).transpose()?;

        let mut projection = self.project(tenant);
        let worker = projection.worker(&input.worker_id)?;

        if self
            .store
            .day_record_by_key(tenant, &worker.id, input.date)?
            .is_some()
        {
            return Err(LedgerError::DuplicateRecord {
                entity: EntityKind::DayRecord,
                key: format!("{}@{}", worker.id, input.date),
            });
        }

        let record = DayRecord::new(
            worker.id.clone(),
            worker.role.clone(),
            input.date,
            base_total.unwrap_or(worker.daily_rate),
            base_total.is_none(),
        );
        let mut invoice = projection
            .week_invoice(&worker.id, record.service_week)?
            .unwrap_or_else(|| WeekInvoice::new(worker.id.clone(), record.service_week));
        invoice.day_records.insert(record.id);

        let record_id = record.id;
        projection.plan_mut().put_day_record(record);
        let invoice = projection.recompute_and_stage(invoice)?;

        self.execute(tenant, projection, GuardMode::Single, "create_day_record")?;
        info!(
            tenant_id = %tenant.tenant_id,
            worker_id = %worker.id,
            date = %input.date,
            "Day record created"
        );
        self.day_outcome(tenant, record_id, invoice.id)
    }

    /// Replaces the pay entry of a day record, keeping every applied adjustment.
    ///
    /// The record stops following the worker's daily rate.
    pub fn update_day_record(
        &self,
        tenant: &TenantContext,
        id: Uuid,
        base_pay: Decimal,
    ) -> LedgerResult<DayRecordOutcome> {
        let base_pay = check_pay(base_pay)?;

        let mut projection = self.project(tenant);
        let mut record = projection.require_day_record(id)?;
        record.base_pay = base_pay;
        record.priced_from_daily_rate = false;
        record.base_total = record.derive_base_total();

        let invoice = projection.require_week_invoice(&record.worker_id, record.service_week)?;
        projection.plan_mut().put_day_record(record);
        let invoice = projection.recompute_and_stage(invoice)?;

        self.execute(tenant, projection, GuardMode::Single, "update_day_record")?;
        self.day_outcome(tenant, id, invoice.id)
    }

    /// Deletes a day record and detaches it from its week.
    ///
    /// The week invoice goes with its last day record, together with its
    /// additional charges. Deductions on the record become unlinked and
    /// incentives forget the application.
    pub fn delete_day_record(&self, tenant: &TenantContext, id: Uuid) -> LedgerResult<DayRecordRemoval> {
        let mut projection = self.project(tenant);
        let record = projection.require_day_record(id)?;
        let mut invoice = projection.require_week_invoice(&record.worker_id, record.service_week)?;

        let mut unlinked_deductions = Vec::new();
        for snapshot in &record.adjustments {
            match snapshot.kind {
                AdjustmentKind::Deduction => {
                    if let Some(mut deduction) = self.store.deduction(tenant, snapshot.adjustment_id)? {
                        deduction.linked_day_record = None;
                        unlinked_deductions.push(deduction.id);
                        projection.plan_mut().put_deduction(deduction);
                    }
                }
                AdjustmentKind::Incentive => {
                    if let Some(mut incentive) = self.store.incentive(tenant, snapshot.adjustment_id)? {
                        incentive.applications.retain(|a| a.day_record_id != id);
                        projection.plan_mut().put_incentive(incentive);
                    }
                }
            }
        }

        projection.plan_mut().remove_day_record(&record);
        invoice.day_records.remove(&id);

        let week_id = invoice.id;
        let remaining = if invoice.day_records.is_empty() {
            for charge in &invoice.charges {
                projection.plan_mut().remove_additional_charge(charge.charge_id);
            }
            projection.plan_mut().remove_week_invoice(&invoice);
            false
        } else {
            projection.recompute_and_stage(invoice)?;
            true
        };

        self.execute(tenant, projection, GuardMode::Single, "delete_day_record")?;
        info!(
            tenant_id = %tenant.tenant_id,
            worker_id = %record.worker_id,
            date = %record.date,
            week_deleted = !remaining,
            "Day record deleted"
        );

        let week_invoice = if remaining {
            self.store.week_invoice(tenant, week_id)?
        } else {
            None
        };
        Ok(DayRecordRemoval {
            day_record_id: id,
            week_invoice,
            unlinked_deductions,
        })
    }

    fn day_outcome(
        &self,
        tenant: &TenantContext,
        day_id: Uuid,
        week_id: Uuid,
    ) -> LedgerResult<DayRecordOutcome> {
        let day_record = self.day_record(tenant, day_id)?;
        let week_invoice = self
            .store
            .week_invoice(tenant, week_id)?
            .ok_or_else(|| LedgerError::not_found(EntityKind::WeekInvoice, week_id))?;
        Ok(DayRecordOutcome {
            day_record,
            week_invoice,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::tests::{date, fixture};
    use crate::models::{ChangeKind, ServiceWeek};
    use crate::store::LedgerStore;
    use rust_decimal_macros::dec;

    #[test]
    fn test_apply_and_remove_delta_round_trip() {
        let mut record = DayRecord::new("w-1", "driver", date("2024-06-03"), dec!(100), false);
        let id = Uuid::new_v4();
        apply_delta(&mut record, AdjustmentSnapshot::new(id, AdjustmentKind::Deduction, dec!(30)));
        assert_eq!(record.base_total, dec!(70));
        assert_eq!(record.adjustments.len(), 1);

        assert!(remove_delta(&mut record, id, AdjustmentKind::Incentive).is_none());
        assert_eq!(record.base_total, dec!(70));

        let removed = remove_delta(&mut record, id, AdjustmentKind::Deduction).unwrap();
        assert_eq!(removed.delta, dec!(-30));
        assert_eq!(record.base_total, dec!(100));
        assert!(remove_delta(&mut record, id, AdjustmentKind::Deduction).is_none());
    }

    #[test]
    fn test_remove_delta_matches_kind_as_well_as_id() {
        let mut record = DayRecord::new("w-1", "driver", date("2024-06-03"), dec!(100), false);
        let id = Uuid::new_v4();
        apply_delta(&mut record, AdjustmentSnapshot::new(id, AdjustmentKind::Incentive, dec!(10)));
        apply_delta(&mut record, AdjustmentSnapshot::new(id, AdjustmentKind::Deduction, dec!(30)));
        assert_eq!(record.base_total, dec!(80));

        remove_delta(&mut record, id, AdjustmentKind::Deduction).unwrap();
        assert_eq!(record.base_total, dec!(110));
        assert_eq!(record.adjustments.len(), 1);
        assert_eq!(record.adjustments[0].kind, AdjustmentKind::Incentive);
    }

    #[test]
    fn test_create_uses_daily_rate_when_omitted() {
        let fx = fixture();
        let outcome = fx.create_day("w-1", "2024-06-03", None);

        assert_eq!(outcome.day_record.base_total, dec!(100));
        assert!(outcome.day_record.priced_from_daily_rate);
        assert_eq!(outcome.day_record.service_week.to_string(), "2024-W23");
        assert_eq!(outcome.week_invoice.total(), dec!(100.00));
        assert!(outcome.week_invoice.day_records.contains(&outcome.day_record.id));
        assert_eq!(outcome.day_record.version, 1);
    }

    #[test]
    fn test_create_twice_is_duplicate() {
        let fx = fixture();
        fx.create_day("w-1", "2024-06-03", Some(dec!(80)));

        let result = fx.ledger.create_day_record(
            &fx.tenant,
            NewDayRecord {
                worker_id: "w-1".to_string(),
                date: date("2024-06-03"),
                base_total: Some(dec!(50)),
            },
        );
        assert!(matches!(result, Err(LedgerError::DuplicateRecord { .. })));
    }

    #[test]
    fn test_create_for_unknown_worker_is_not_found() {
        let fx = fixture();
        let result = fx.ledger.create_day_record(
            &fx.tenant,
            NewDayRecord {
                worker_id: "nobody".to_string(),
                date: date("2024-06-03"),
                base_total: None,
            },
        );
        assert!(matches!(
            result,
            Err(LedgerError::NotFound { entity: EntityKind::Worker, .. })
        ));
    }

    #[test]
    fn test_create_rejects_negative_pay() {
        let fx = fixture();
        let result = fx.ledger.create_day_record(
            &fx.tenant,
            NewDayRecord {
                worker_id: "w-1".to_string(),
                date: date("2024-06-03"),
                base_total: Some(dec!(-1)),
            },
        );
        assert!(matches!(result, Err(LedgerError::InvalidInput { .. })));
    }

    #[test]
    fn test_days_in_same_week_share_an_invoice() {
        let fx = fixture();
        let first = fx.create_day("w-1", "2024-06-03", Some(dec!(100)));
        let second = fx.create_day("w-1", "2024-06-04", Some(dec!(50.50)));

        assert_eq!(first.week_invoice.id, second.week_invoice.id);
        assert_eq!(second.week_invoice.day_records.len(), 2);
        assert_eq!(second.week_invoice.total(), dec!(150.50));
    }

    #[test]
    fn test_update_keeps_adjustments() {
        let fx = fixture();
        let day = fx.create_day("w-1", "2024-06-03", Some(dec!(100)));
        fx.deduct("w-1", "2024-06-03", dec!(30));

        let outcome = fx
            .ledger
            .update_day_record(&fx.tenant, day.day_record.id, dec!(120))
            .unwrap();
        assert_eq!(outcome.day_record.base_pay, dec!(120));
        assert_eq!(outcome.day_record.base_total, dec!(90));
        assert!(!outcome.day_record.priced_from_daily_rate);
        assert_eq!(outcome.week_invoice.total(), dec!(90));
    }

    #[test]
    fn test_update_below_applied_deductions_is_rejected() {
        let fx = fixture();
        let day = fx.create_day("w-1", "2024-06-03", Some(dec!(100)));
        fx.deduct("w-1", "2024-06-03", dec!(30));

        let result = fx.ledger.update_day_record(&fx.tenant, day.day_record.id, dec!(20));
        match result {
            Err(LedgerError::NegativeTotal { violation }) => {
                assert_eq!(violation.entity, EntityKind::DayRecord);
                assert_eq!(violation.amount, dec!(-10));
            }
            other => panic!("Expected NegativeTotal, got {:?}", other),
        }
        let stored = fx.ledger.day_record(&fx.tenant, day.day_record.id).unwrap();
        assert_eq!(stored.base_total, dec!(70));
    }

    #[test]
    fn test_delete_last_day_deletes_week_and_charges() {
        let fx = fixture();
        let day = fx.create_day("w-1", "2024-06-03", Some(dec!(100)));
        let charge = fx.charge("w-1", "2024-W23", dec!(20));

        let removal = fx.ledger.delete_day_record(&fx.tenant, day.day_record.id).unwrap();
        assert!(removal.week_invoice.is_none());

        let week: ServiceWeek = "2024-W23".parse().unwrap();
        assert!(fx.ledger.week_invoice(&fx.tenant, "w-1", week).is_err());
        assert!(fx.store.additional_charge(&fx.tenant, charge).unwrap().is_none());
    }

    #[test]
    fn test_delete_one_of_two_days_recomputes_week() {
        let fx = fixture();
        let first = fx.create_day("w-1", "2024-06-03", Some(dec!(100)));
        fx.create_day("w-1", "2024-06-04", Some(dec!(40)));

        let removal = fx.ledger.delete_day_record(&fx.tenant, first.day_record.id).unwrap();
        let invoice = removal.week_invoice.unwrap();
        assert_eq!(invoice.total(), dec!(40));
        assert_eq!(invoice.day_records.len(), 1);
    }

    #[test]
    fn test_delete_unlinks_deductions() {
        let fx = fixture();
        let day = fx.create_day("w-1", "2024-06-03", Some(dec!(100)));
        let deduction = fx.deduct("w-1", "2024-06-03", dec!(30));

        let removal = fx.ledger.delete_day_record(&fx.tenant, day.day_record.id).unwrap();
        assert_eq!(removal.unlinked_deductions, vec![deduction]);
        let stored = fx.store.deduction(&fx.tenant, deduction).unwrap().unwrap();
        assert!(stored.is_unlinked());
    }

    #[test]
    fn test_delete_rejected_when_week_charges_exceed_remaining_days() {
        let fx = fixture();
        let first = fx.create_day("w-1", "2024-06-03", Some(dec!(100)));
        fx.create_day("w-1", "2024-06-04", Some(dec!(10)));
        fx.ledger
            .apply_additional_charge(
                &fx.tenant,
                crate::ledger::NewAdditionalCharge {
                    id: None,
                    worker_id: "w-1".to_string(),
                    service_week: "2024-W23".parse().unwrap(),
                    rate: dec!(50),
                    kind: crate::models::ChargeKind::Deduction,
                    reason: None,
                },
            )
            .unwrap();

        let result = fx.ledger.delete_day_record(&fx.tenant, first.day_record.id);
        assert!(matches!(result, Err(LedgerError::NegativeTotal { .. })));
        assert!(fx.ledger.day_record(&fx.tenant, first.day_record.id).is_ok());
    }

    #[test]
    fn test_create_emits_day_and_week_events() {
        let fx = fixture();
        fx.create_day("w-1", "2024-06-03", None);

        let kinds: Vec<ChangeKind> = fx.events.events().iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![ChangeKind::DayRecordUpdated, ChangeKind::WeekInvoiceUpdated]
        );
    }
}
