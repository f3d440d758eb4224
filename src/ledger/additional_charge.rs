//! Additional charges and credits on a week invoice.

use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use super::deduction::check_rate;
use super::engine::{GuardMode, Ledger};
use crate::error::{EntityKind, LedgerError, LedgerResult};
use crate::models::{
    AdditionalCharge, AdditionalChargeSnapshot, ChargeKind, ServiceWeek, TenantContext,
    WeekInvoice,
};

/// Input for [`Ledger::apply_additional_charge`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAdditionalCharge {
    /// Client-supplied id; retrying with the same id does not apply twice.
    #[serde(default)]
    pub id: Option<Uuid>,
    /// The worker whose week is charged.
    pub worker_id: String,
    /// The charged week.
    pub service_week: ServiceWeek,
    /// The amount, greater than zero.
    pub rate: Decimal,
    /// Whether the amount is added to or taken off the week.
    pub kind: ChargeKind,
    /// Free-text reason.
    #[serde(default)]
    pub reason: Option<String>,
}

/// A charge and its week after the operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChargeOutcome {
    /// The stored (or, on removal, deleted) charge.
    pub charge: AdditionalCharge,
    /// The week invoice after the operation; `None` if it no longer exists.
    pub week_invoice: Option<WeekInvoice>,
}

impl Ledger {
    /// Adds a charge or credit to an existing week invoice.
    ///
    /// # Errors
    ///
    /// `NotFound` if the worker has no invoice for the week, and
    /// `NegativeTotal` if the week total would go below zero.
    pub fn apply_additional_charge(
        &self,
        tenant: &TenantContext,
        input: NewAdditionalCharge,
    ) -> LedgerResult<ChargeOutcome> {
        let rate = check_rate(input.rate)?;
        let id = input.id.unwrap_or_else(Uuid::new_v4);

        if let Some(existing) = self.store.additional_charge(tenant, id)? {
            if existing.worker_id != input.worker_id
                || existing.service_week != input.service_week
                || existing.rate != rate
                || existing.kind != input.kind
            {
                return Err(LedgerError::DuplicateRecord {
                    entity: EntityKind::AdditionalCharge,
                    key: id.to_string(),
                });
            }
            let week_invoice =
                self.store
                    .week_invoice_by_key(tenant, &existing.worker_id, existing.service_week)?;
            return Ok(ChargeOutcome {
                charge: existing,
                week_invoice,
            });
        }
        self.ensure_adjustment_id_free(tenant, id, EntityKind::AdditionalCharge)?;

        let mut projection = self.project(tenant);
        let mut invoice = projection.require_week_invoice(&input.worker_id, input.service_week)?;

        let charge = AdditionalCharge {
            id,
            worker_id: input.worker_id,
            service_week: input.service_week,
            rate,
            kind: input.kind,
            reason: input.reason,
            created_at: Utc::now(),
        };
        invoice.charges.push(AdditionalChargeSnapshot {
            charge_id: id,
            rate,
            kind: charge.kind,
        });
        let invoice = projection.recompute_and_stage(invoice)?;
        projection.plan_mut().put_additional_charge(charge.clone());

        self.execute(tenant, projection, GuardMode::Single, "apply_additional_charge")?;
        info!(
            tenant_id = %tenant.tenant_id,
            worker_id = %charge.worker_id,
            service_week = %charge.service_week,
            kind = ?charge.kind,
            rate = %rate,
            "Additional charge applied"
        );

        Ok(ChargeOutcome {
            charge,
            week_invoice: self.store.week_invoice(tenant, invoice.id)?,
        })
    }

    /// Removes a charge from its week and deletes it.
    pub fn remove_additional_charge(
        &self,
        tenant: &TenantContext,
        id: Uuid,
    ) -> LedgerResult<ChargeOutcome> {
        let charge = self
            .store
            .additional_charge(tenant, id)?
            .ok_or_else(|| LedgerError::not_found(EntityKind::AdditionalCharge, id))?;

        let mut projection = self.project(tenant);
        let mut week_id = None;
        if let Some(mut invoice) = projection.week_invoice(&charge.worker_id, charge.service_week)? {
            invoice.charges.retain(|c| c.charge_id != id);
            week_id = Some(projection.recompute_and_stage(invoice)?.id);
        }
        projection.plan_mut().remove_additional_charge(id);

        self.execute(tenant, projection, GuardMode::Single, "remove_additional_charge")?;
        info!(
            tenant_id = %tenant.tenant_id,
            worker_id = %charge.worker_id,
            service_week = %charge.service_week,
            "Additional charge removed"
        );

        let week_invoice = match week_id {
            Some(week_id) => self.store.week_invoice(tenant, week_id)?,
            None => None,
        };
        Ok(ChargeOutcome {
            charge,
            week_invoice,
        })
    }
}
