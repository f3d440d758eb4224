//! Ledger operations and the cascade that keeps day and week totals consistent.

mod additional_charge;
mod day_ledger;
mod deduction;
mod engine;
mod incentive;
mod plan;
mod profile;

pub use additional_charge::{ChargeOutcome, NewAdditionalCharge};
pub use day_ledger::{
    DayRecordOutcome, DayRecordRemoval, NewDayRecord, apply_delta, remove_delta,
};
pub use deduction::{DeductionOutcome, NewDeduction};
pub use engine::{CommitSummary, Ledger};
pub use incentive::{IncentiveOutcome, NewIncentive};
pub use plan::Plan;
pub use profile::{ProfileChangeOutcome, RecomputeReport};
