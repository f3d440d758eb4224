//! Multi-tenant personnel pay ledger.
//!
//! This crate records what each worker is owed per day and per service week.
//! Deductions, incentives and additional charges cascade into the day and
//! week totals, and no committed total is ever negative.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use pay_ledger::config::LedgerConfig;
//! use pay_ledger::ledger::{Ledger, NewDayRecord, NewDeduction};
//! use pay_ledger::models::{TenantContext, Worker};
//! use pay_ledger::store::{InMemoryStore, InMemoryWorkerDirectory, TracingNotifier};
//! use rust_decimal_macros::dec;
//!
//! let tenant = TenantContext::new("acme");
//! let workers = Arc::new(InMemoryWorkerDirectory::new());
//! workers.upsert(&tenant, Worker::new("w-1", "driver", dec!(100)))?;
//!
//! let ledger = Ledger::new(
//!     &LedgerConfig::default(),
//!     Arc::new(InMemoryStore::new()),
//!     workers,
//!     Arc::new(TracingNotifier),
//! );
//!
//! let date = chrono::NaiveDate::from_ymd_opt(2024, 6, 3).unwrap();
//! ledger.create_day_record(&tenant, NewDayRecord { worker_id: "w-1".into(), date, base_total: None })?;
//! let outcome = ledger.apply_deduction(
//!     &tenant,
//!     NewDeduction { id: None, worker_id: "w-1".into(), date, rate: dec!(30), reason: None },
//! )?;
//! assert_eq!(outcome.week_invoice.unwrap().total(), dec!(70));
//! # Ok::<(), pay_ledger::error::LedgerError>(())
//! ```

#![warn(missing_docs)]

pub mod api;
pub mod calculation;
pub mod config;
pub mod error;
pub mod ledger;
pub mod models;
pub mod store;
