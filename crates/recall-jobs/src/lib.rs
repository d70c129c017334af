//! # recall-jobs
//!
//! Reminder lifecycle processing for recall.
//!
//! This crate provides:
//! - [`ReminderSweeper`]: one sweep claims due reminders, sends each
//!   notification, records `COMPLETED` or `FAILED`, and purges old
//!   completed reminders
//! - [`SweepWorker`]: an optional in-process interval trigger with
//!   graceful shutdown and broadcast events
//!
//! ## Example
//!
//! ```ignore
//! use recall_jobs::{ReminderSweeper, SweepWorker, SweepWorkerConfig};
//!
//! let sweeper = ReminderSweeper::new(store.reminders.clone(), notifier);
//! let report = sweeper.sweep(chrono::Utc::now()).await?;
//!
//! if let Some(worker) = SweepWorker::new(sweeper, SweepWorkerConfig::from_env()) {
//!     let handle = worker.start();
//!     // ...
//!     handle.shutdown().await?;
//! }
//! ```

pub mod sweeper;
pub mod worker;

pub use sweeper::{ReminderSweeper, SweepConfig};
pub use worker::{SweepEvent, SweepWorker, SweepWorkerConfig, SweepWorkerHandle};
