//! Error types for the pay ledger.
//!
//! Every ledger operation returns [`LedgerResult`]. Guard rejections carry the
//! offending entities and projected amounts so callers can decide what to
//! override; nothing in this module ever panics.

use std::fmt;

use thiserror::Error;

use crate::calculation::Violation;

/// The kinds of entity the ledger reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// A worker profile, owned by the external profile provider.
    Worker,
    /// A per-worker, per-day pay record.
    DayRecord,
    /// A per-worker, per-week invoice.
    WeekInvoice,
    /// A standalone deduction against one worker-day.
    Deduction,
    /// A role-wide incentive over a date range.
    Incentive,
    /// A week-level charge or credit.
    AdditionalCharge,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityKind::Worker => "worker",
            EntityKind::DayRecord => "day record",
            EntityKind::WeekInvoice => "week invoice",
            EntityKind::Deduction => "deduction",
            EntityKind::Incentive => "incentive",
            EntityKind::AdditionalCharge => "additional charge",
        };
        f.write_str(name)
    }
}

/// The main error type for the pay ledger.
///
/// # Example
///
/// ```
/// use pay_ledger::error::{EntityKind, LedgerError};
///
/// let error = LedgerError::NotFound {
///     entity: EntityKind::DayRecord,
///     id: "42".to_string(),
/// };
/// assert_eq!(error.to_string(), "day record not found: 42");
/// ```
#[derive(Debug, Error)]
pub enum LedgerError {
    /// A referenced entity does not exist.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// The kind of entity that was looked up.
        entity: EntityKind,
        /// The id or key used for the lookup.
        id: String,
    },

    /// A create would break one of the uniqueness constraints.
    #[error("Duplicate {entity}: {key}")]
    DuplicateRecord {
        /// The kind of entity being created.
        entity: EntityKind,
        /// The natural key that already exists.
        key: String,
    },

    /// The guard rejected a mutation because a projected total is negative.
    #[error("Rejected: {violation}")]
    NegativeTotal {
        /// The single offending total.
        violation: Violation,
    },

    /// Part of a batch would go negative; every violation is listed.
    #[error("Rejected batch: {} total(s) would go negative", conflicts.len())]
    PartialBatchConflict {
        /// Every projected total that failed the guard.
        conflicts: Vec<Violation>,
    },

    /// A record changed between being read and the plan being committed.
    #[error("Concurrent modification of {entity} '{id}'")]
    ConcurrentModification {
        /// The kind of entity whose version moved.
        entity: EntityKind,
        /// The id of the entity.
        id: String,
    },

    /// A request field was invalid.
    #[error("Invalid input '{field}': {message}")]
    InvalidInput {
        /// The offending field.
        field: String,
        /// What was wrong with it.
        message: String,
    },

    /// The underlying store failed.
    #[error("Storage error: {message}")]
    Storage {
        /// A description of the failure.
        message: String,
    },

    /// Configuration file was not found at the specified path.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Configuration file could not be parsed.
    #[error("Failed to parse configuration file '{path}': {message}")]
    ConfigParseError {
        /// The path to the file that failed to parse.
        path: String,
        /// A description of the parse error.
        message: String,
    },
}

impl LedgerError {
    pub(crate) fn not_found(entity: EntityKind, id: impl ToString) -> Self {
        LedgerError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub(crate) fn invalid(field: &str, message: impl Into<String>) -> Self {
        LedgerError::InvalidInput {
            field: field.to_string(),
            message: message.into(),
        }
    }

    /// Returns true if this is a guard rejection, single or batched.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            LedgerError::NegativeTotal { .. } | LedgerError::PartialBatchConflict { .. }
        )
    }

    /// Returns the guard violations carried by this error, if any.
    pub fn violations(&self) -> &[Violation] {
        match self {
            LedgerError::NegativeTotal { violation } => std::slice::from_ref(violation),
            LedgerError::PartialBatchConflict { conflicts } => conflicts,
            _ => &[],
        }
    }
}

/// A type alias for Results that return LedgerError.
pub type LedgerResult<T> = Result<T, LedgerError>;
