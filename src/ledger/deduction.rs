//! Deduction applier.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use super::day_ledger::{apply_delta, remove_delta};
use super::engine::{GuardMode, Ledger};
use crate::calculation::round2;
use crate::error::{EntityKind, LedgerError, LedgerResult};
use crate::models::{
    AdjustmentKind, AdjustmentSnapshot, DayRecord, Deduction, TenantContext, WeekInvoice,
};

/// Input for [`Ledger::apply_deduction`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewDeduction {
    /// Client-supplied id; retrying with the same id does not apply twice.
    #[serde(default)]
    pub id: Option<Uuid>,
    /// The worker being deducted.
    pub worker_id: String,
    /// The date to deduct from.
    pub date: NaiveDate,
    /// The amount to take off, greater than zero.
    pub rate: Decimal,
    /// Free-text reason.
    #[serde(default)]
    pub reason: Option<String>,
}

/// A deduction and the records it touched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeductionOutcome {
    /// The stored (or, on removal, deleted) deduction.
    pub deduction: Deduction,
    /// The linked day record after the operation, if any.
    pub day_record: Option<DayRecord>,
    /// The linked week invoice after the operation, if any.
    pub week_invoice: Option<WeekInvoice>,
}

pub(crate) fn check_rate(rate: Decimal) -> LedgerResult<Decimal> {
    let rate = round2(rate);
    if rate <= Decimal::ZERO {
        return Err(LedgerError::invalid("rate", "must be greater than zero"));
    }
    Ok(rate)
}

impl Ledger {
    /// Deducts `rate` from a worker-day and cascades to its week.
    ///
    /// With no day record for the worker-date the deduction is stored
    /// unlinked and has no effect on any total.
    ///
    /// # Errors
    ///
    /// `NegativeTotal` if the projected day or week total would go below
    /// zero; nothing is written in that case.
    pub fn apply_deduction(
        &self,
        tenant: &TenantContext,
        input: NewDeduction,
    ) -> LedgerResult<DeductionOutcome> {
        let rate = check_rate(input.rate)?;
        let id = input.id.unwrap_or_else(Uuid::new_v4);

        if let Some(existing) = self.store.deduction(tenant, id)? {
            return self.replayed_deduction(tenant, existing, &input, rate);
        }
        self.ensure_adjustment_id_free(tenant, id, EntityKind::Deduction)?;

        let mut projection = self.project(tenant);
        let worker = projection.worker(&input.worker_id)?;
        let day = self.store.day_record_by_key(tenant, &worker.id, input.date)?;

        let mut deduction = Deduction {
            id,
            worker_id: worker.id.clone(),
            date: input.date,
            rate,
            reason: input.reason,
            linked_day_record: None,
            created_at: Utc::now(),
        };

        let Some(mut day) = day else {
            warn!(
                tenant_id = %tenant.tenant_id,
                worker_id = %worker.id,
                date = %input.date,
                deduction_id = %id,
                "No day record for deduction; stored unlinked"
            );
            projection.plan_mut().put_deduction(deduction.clone());
            self.execute(tenant, projection, GuardMode::Single, "apply_deduction")?;
            return Ok(DeductionOutcome {
                deduction,
                day_record: None,
                week_invoice: None,
            });
        };

        if day.has_adjustment(id) {
            return Err(LedgerError::DuplicateRecord {
                entity: EntityKind::Deduction,
                key: id.to_string(),
            });
        }
        apply_delta(&mut day, AdjustmentSnapshot::new(id, AdjustmentKind::Deduction, rate));
        deduction.linked_day_record = Some(day.id);

        let invoice = projection.require_week_invoice(&day.worker_id, day.service_week)?;
        let day_id = day.id;
        projection.plan_mut().put_day_record(day);
        let invoice = projection.recompute_and_stage(invoice)?;
        projection.plan_mut().put_deduction(deduction.clone());

        self.execute(tenant, projection, GuardMode::Single, "apply_deduction")?;
        info!(
            tenant_id = %tenant.tenant_id,
            worker_id = %deduction.worker_id,
            date = %deduction.date,
            rate = %rate,
            "Deduction applied"
        );

        Ok(DeductionOutcome {
            deduction,
            day_record: self.store.day_record(tenant, day_id)?,
            week_invoice: self.store.week_invoice(tenant, invoice.id)?,
        })
    }

    /// Reverses a deduction and deletes it.
    pub fn remove_deduction(&self, tenant: &TenantContext, id: Uuid) -> LedgerResult<DeductionOutcome> {
        let deduction = self
            .store
            .deduction(tenant, id)?
            .ok_or_else(|| LedgerError::not_found(EntityKind::Deduction, id))?;

        let mut projection = self.project(tenant);
        let mut touched = None;

        if let Some(day_id) = deduction.linked_day_record
            && let Some(mut day) = projection.day_record(day_id)?
            && remove_delta(&mut day, id, AdjustmentKind::Deduction).is_some()
        {
            let invoice = projection.require_week_invoice(&day.worker_id, day.service_week)?;
            projection.plan_mut().put_day_record(day);
            let invoice = projection.recompute_and_stage(invoice)?;
            touched = Some((day_id, invoice.id));
        }
        projection.plan_mut().remove_deduction(id);

        self.execute(tenant, projection, GuardMode::Single, "remove_deduction")?;
        info!(
            tenant_id = %tenant.tenant_id,
            worker_id = %deduction.worker_id,
            date = %deduction.date,
            "Deduction removed"
        );

        let (day_record, week_invoice) = match touched {
            Some((day_id, week_id)) => (
                self.store.day_record(tenant, day_id)?,
                self.store.week_invoice(tenant, week_id)?,
            ),
            None => (None, None),
        };
        Ok(DeductionOutcome {
            deduction,
            day_record,
            week_invoice,
        })
    }

    fn replayed_deduction(
        &self,
        tenant: &TenantContext,
        existing: Deduction,
        input: &NewDeduction,
        rate: Decimal,
    ) -> LedgerResult<DeductionOutcome> {
        if existing.worker_id != input.worker_id || existing.date != input.date || existing.rate != rate {
            return Err(LedgerError::DuplicateRecord {
                entity: EntityKind::Deduction,
                key: existing.id.to_string(),
            });
        }
        info!(
            tenant_id = %tenant.tenant_id,
            deduction_id = %existing.id,
            "Deduction already applied; returning stored result"
        );

        let day_record = match existing.linked_day_record {
            Some(day_id) => self.store.day_record(tenant, day_id)?,
            None => None,
        };
        let week_invoice = match &day_record {
            Some(day) => self
                .store
                .week_invoice_by_key(tenant, &day.worker_id, day.service_week)?,
            None => None,
        };
        Ok(DeductionOutcome {
            deduction: existing,
            day_record,
            week_invoice,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::tests::{date, fixture};
    use crate::models::ChangeKind;
    use crate::store::LedgerStore;
    use rust_decimal_macros::dec;

    fn deduction(worker: &str, day: &str, rate: Decimal) -> NewDeduction {
        NewDeduction {
            id: None,
            worker_id: worker.to_string(),
            date: date(day),
            rate,
            reason: Some("damaged goods".to_string()),
        }
    }

    #[test]
    fn test_id_owned_by_incentive_is_rejected() {
        let fx = fixture();
        fx.create_day("w-1", "2024-06-03", Some(dec!(100)));
        let incentive_id = fx.incentive("driver", "2024-06-03", "2024-06-03", dec!(10));

        let mut input = deduction("w-1", "2024-06-03", dec!(30));
        input.id = Some(incentive_id);
        let result = fx.ledger.apply_deduction(&fx.tenant, input);
        assert!(matches!(
            result,
            Err(LedgerError::DuplicateRecord { entity: EntityKind::Deduction, .. })
        ));

        let day = fx.store.day_record_by_key(&fx.tenant, "w-1", date("2024-06-03")).unwrap().unwrap();
        assert_eq!(day.base_total, dec!(110));
        assert_eq!(day.adjustments.len(), 1);
        assert!(fx.store.deduction(&fx.tenant, incentive_id).unwrap().is_none());

        // The incentive still reverses cleanly.
        fx.ledger.remove_incentive(&fx.tenant, incentive_id).unwrap();
        assert_eq!(fx.week("w-1", "2024-W23").total(), dec!(100));
    }

    #[test]
    fn test_apply_reduces_day_and_week() {
        let fx = fixture();
        fx.create_day("w-1", "2024-06-03", Some(dec!(100)));

        let outcome = fx
            .ledger
            .apply_deduction(&fx.tenant, deduction("w-1", "2024-06-03", dec!(30)))
            .unwrap();

        let day = outcome.day_record.unwrap();
        assert_eq!(day.base_total, dec!(70));
        assert_eq!(day.adjustments.len(), 1);
        assert_eq!(outcome.week_invoice.unwrap().total(), dec!(70.00));
        assert_eq!(outcome.deduction.linked_day_record, Some(day.id));
    }

    #[test]
    fn test_apply_then_remove_restores_totals() {
        let fx = fixture();
        fx.create_day("w-2", "2024-06-03", Some(dec!(123.45)));
        let week = fx.week("w-2", "2024-W23");

        let applied = fx
            .ledger
            .apply_deduction(&fx.tenant, deduction("w-2", "2024-06-03", dec!(33.33)))
            .unwrap();
        assert_ne!(applied.week_invoice.as_ref().unwrap().totals, week.totals);

        let removed = fx
            .ledger
            .remove_deduction(&fx.tenant, applied.deduction.id)
            .unwrap();
        let day = removed.day_record.unwrap();
        assert_eq!(day.base_total, dec!(123.45));
        assert!(day.adjustments.is_empty());
        assert_eq!(removed.week_invoice.unwrap().totals, week.totals);
        assert!(fx.store.deduction(&fx.tenant, applied.deduction.id).unwrap().is_none());
    }

    #[test]
    fn test_overdraw_is_rejected_without_writes() {
        let fx = fixture();
        let created = fx.create_day("w-1", "2024-06-03", Some(dec!(100)));
        fx.events.drain();

        let result = fx
            .ledger
            .apply_deduction(&fx.tenant, deduction("w-1", "2024-06-03", dec!(200)));
        match result {
            Err(LedgerError::NegativeTotal { violation }) => {
                assert_eq!(violation.id, created.day_record.id);
                assert_eq!(violation.amount, dec!(-100));
            }
            other => panic!("Expected NegativeTotal, got {:?}", other),
        }

        let day = fx.ledger.day_record(&fx.tenant, created.day_record.id).unwrap();
        assert_eq!(day.base_total, dec!(100));
        assert!(day.adjustments.is_empty());
        assert_eq!(fx.week("w-1", "2024-W23").total(), dec!(100));

        let events = fx.events.drain();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, ChangeKind::AdjustmentRejected);
        assert_eq!(events[0].ids, vec![created.day_record.id]);
    }

    #[test]
    fn test_deduction_to_exactly_zero_is_allowed() {
        let fx = fixture();
        fx.create_day("w-1", "2024-06-03", Some(dec!(100)));
        let outcome = fx
            .ledger
            .apply_deduction(&fx.tenant, deduction("w-1", "2024-06-03", dec!(100)))
            .unwrap();
        assert_eq!(outcome.day_record.unwrap().base_total, dec!(0));
    }

    #[test]
    fn test_without_day_record_is_stored_unlinked() {
        let fx = fixture();
        let outcome = fx
            .ledger
            .apply_deduction(&fx.tenant, deduction("w-1", "2024-06-05", dec!(10)))
            .unwrap();

        assert!(outcome.deduction.is_unlinked());
        assert!(outcome.day_record.is_none());
        assert!(outcome.week_invoice.is_none());
        assert!(fx.store.deduction(&fx.tenant, outcome.deduction.id).unwrap().is_some());

        fx.ledger.remove_deduction(&fx.tenant, outcome.deduction.id).unwrap();
        assert!(fx.store.deduction(&fx.tenant, outcome.deduction.id).unwrap().is_none());
    }

    #[test]
    fn test_retry_with_same_id_applies_once() {
        let fx = fixture();
        fx.create_day("w-1", "2024-06-03", Some(dec!(100)));
        let mut input = deduction("w-1", "2024-06-03", dec!(30));
        input.id = Some(Uuid::new_v4());

        fx.ledger.apply_deduction(&fx.tenant, input.clone()).unwrap();
        let retried = fx.ledger.apply_deduction(&fx.tenant, input.clone()).unwrap();

        assert_eq!(retried.day_record.unwrap().base_total, dec!(70));
        assert_eq!(retried.week_invoice.unwrap().total(), dec!(70));

        input.rate = dec!(31);
        assert!(matches!(
            fx.ledger.apply_deduction(&fx.tenant, input),
            Err(LedgerError::DuplicateRecord { .. })
        ));
    }

    #[test]
    fn test_non_positive_rate_is_invalid() {
        let fx = fixture();
        fx.create_day("w-1", "2024-06-03", Some(dec!(100)));
        for rate in [dec!(0), dec!(-5), dec!(0.004)] {
            let result = fx
                .ledger
                .apply_deduction(&fx.tenant, deduction("w-1", "2024-06-03", rate));
            assert!(matches!(result, Err(LedgerError::InvalidInput { .. })));
        }
    }

    #[test]
    fn test_remove_unknown_is_not_found() {
        let fx = fixture();
        assert!(matches!(
            fx.ledger.remove_deduction(&fx.tenant, Uuid::new_v4()),
            Err(LedgerError::NotFound { entity: EntityKind::Deduction, .. })
        ));
    }

    #[test]
    fn test_remove_after_incentive_keeps_incentive() {
        let fx = fixture();
        fx.create_day("w-1", "2024-06-03", Some(dec!(100)));
        let applied = fx
            .ledger
            .apply_deduction(&fx.tenant, deduction("w-1", "2024-06-03", dec!(30)))
            .unwrap();
        fx.incentive("driver", "2024-06-03", "2024-06-03", dec!(15));

        let removed = fx.ledger.remove_deduction(&fx.tenant, applied.deduction.id).unwrap();
        assert_eq!(removed.day_record.unwrap().base_total, dec!(115));
    }
}
