//! Non-negativity guard.
//!
//! The guard is a pure predicate over *projected* totals: callers fold the
//! pending change in first and hand over the would-be values. It never reads
//! state itself.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{EntityKind, LedgerError, LedgerResult};

/// A projected total that would go negative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// Day record or week invoice.
    pub entity: EntityKind,
    /// The id of the offending entity.
    pub id: Uuid,
    /// The projected, negative amount.
    pub amount: Decimal,
}

impl Violation {
    /// Creates a violation record.
    pub fn new(entity: EntityKind, id: Uuid, amount: Decimal) -> Self {
        Self { entity, id, amount }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} '{}' would total {}", self.entity, self.id, self.amount)
    }
}

/// Checks one projected total.
pub fn check_total(entity: EntityKind, id: Uuid, amount: Decimal) -> Result<(), Violation> {
    if amount < Decimal::ZERO {
        Err(Violation::new(entity, id, amount))
    } else {
        Ok(())
    }
}

/// Validates a projected day total (when the operation touches a day) and a
/// projected week total.
///
/// The day is checked first, so a change that breaks both reports the day.
///
/// # Examples
///
/// ```
/// use pay_ledger::calculation::validate;
/// use rust_decimal_macros::dec;
/// use uuid::Uuid;
///
/// let day = Uuid::new_v4();
/// let week = Uuid::new_v4();
/// assert!(validate(Some((day, dec!(0))), (week, dec!(10))).is_ok());
/// assert!(validate(Some((day, dec!(-0.01))), (week, dec!(10))).is_err());
/// assert!(validate(None, (week, dec!(-5))).is_err());
/// ```
pub fn validate(day: Option<(Uuid, Decimal)>, week: (Uuid, Decimal)) -> Result<(), Violation> {
    if let Some((id, amount)) = day {
        check_total(EntityKind::DayRecord, id, amount)?;
    }
    check_total(EntityKind::WeekInvoice, week.0, week.1)
}

/// Collects every violation across a set of projected totals.
///
/// Used wherever more than one total is projected, so that a rejection can
/// name all offenders rather than the first one found.
#[derive(Debug, Clone, Default)]
pub struct GuardReport {
    violations: Vec<Violation>,
}

impl GuardReport {
    /// Creates an empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Checks a projected day total.
    pub fn check_day(&mut self, id: Uuid, amount: Decimal) {
        self.check(EntityKind::DayRecord, id, amount);
    }

    /// Checks a projected week total.
    pub fn check_week(&mut self, id: Uuid, amount: Decimal) {
        self.check(EntityKind::WeekInvoice, id, amount);
    }

    fn check(&mut self, entity: EntityKind, id: Uuid, amount: Decimal) {
        if let Err(violation) = check_total(entity, id, amount) {
            self.violations.push(violation);
        }
    }

    /// True when nothing failed.
    pub fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }

    /// The violations found so far.
    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    /// Finishes a single-target operation: the first violation becomes
    /// `NegativeTotal`.
    pub fn finish_single(self) -> LedgerResult<()> {
        match self.violations.into_iter().next() {
            Some(violation) => Err(LedgerError::NegativeTotal { violation }),
            None => Ok(()),
        }
    }

    /// Finishes a batch operation: any violation rejects the whole batch with
    /// every offender listed.
    pub fn finish_batch(self) -> LedgerResult<()> {
        if self.violations.is_empty() {
            Ok(())
        } else {
            Err(LedgerError::PartialBatchConflict {
                conflicts: self.violations,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_zero_is_allowed() {
        assert!(check_total(EntityKind::DayRecord, Uuid::new_v4(), Decimal::ZERO).is_ok());
    }

    #[test]
    fn test_validate_reports_day_before_week() {
        let day = Uuid::new_v4();
        let week = Uuid::new_v4();
        let violation = validate(Some((day, dec!(-1))), (week, dec!(-1))).unwrap_err();
        assert_eq!(violation.entity, EntityKind::DayRecord);
        assert_eq!(violation.id, day);
        assert_eq!(violation.amount, dec!(-1));
    }

    #[test]
    fn test_validate_week_only() {
        let week = Uuid::new_v4();
        let violation = validate(None, (week, dec!(-0.01))).unwrap_err();
        assert_eq!(violation.entity, EntityKind::WeekInvoice);
    }

    #[test]
    fn test_report_collects_every_violation() {
        let mut report = GuardReport::new();
        report.check_day(Uuid::new_v4(), dec!(5));
        report.check_day(Uuid::new_v4(), dec!(-5));
        report.check_week(Uuid::new_v4(), dec!(-2));
        assert!(!report.is_clean());
        assert_eq!(report.violations().len(), 2);

        match report.finish_batch() {
            Err(LedgerError::PartialBatchConflict { conflicts }) => assert_eq!(conflicts.len(), 2),
            other => panic!("Expected PartialBatchConflict, got {:?}", other),
        }
    }

    #[test]
    fn test_finish_single_keeps_first_violation() {
        let first = Uuid::new_v4();
        let mut report = GuardReport::new();
        report.check_day(first, dec!(-1));
        report.check_week(Uuid::new_v4(), dec!(-1));

        match report.finish_single() {
            Err(LedgerError::NegativeTotal { violation }) => assert_eq!(violation.id, first),
            other => panic!("Expected NegativeTotal, got {:?}", other),
        }
    }

    #[test]
    fn test_clean_report_passes_both_modes() {
        let mut report = GuardReport::new();
        report.check_week(Uuid::new_v4(), dec!(0));
        assert!(report.clone().finish_single().is_ok());
        assert!(report.finish_batch().is_ok());
    }

    proptest! {
        #[test]
        fn prop_guard_passes_iff_non_negative(cents in -1_000_000i64..1_000_000) {
            let amount = Decimal::new(cents, 2);
            let result = check_total(EntityKind::WeekInvoice, Uuid::nil(), amount);
            prop_assert_eq!(result.is_ok(), cents >= 0);
        }
    }
}
