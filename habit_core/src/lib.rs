#![forbid(unsafe_code)]

//! Core domain model and statistics for the habit tracker.
//!
//! This crate provides:
//! - Domain types (habits, recurrence rules, daily entries, statistics)
//! - Recurrence evaluation ("is this habit due today?")
//! - Streak and completion-rate statistics
//! - Habit and entry stores (in-memory and file-backed)
//! - Reminder scheduling hooks and CSV export

pub mod types;
pub mod error;
pub mod date;
pub mod config;
pub mod logging;
pub mod recurrence;
pub mod stats;
pub mod store;
pub mod persist;
pub mod reminder;
pub mod tracker;
pub mod export;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use config::Config;
pub use recurrence::{is_due, is_due_at, weekly_anchor};
pub use stats::{compute_stats, compute_stats_with_window, is_completed};
pub use store::{EntryStore, HabitStore, MemoryStore};
pub use persist::FileStore;
pub use reminder::{LogScheduler, NoopScheduler, ReminderScheduler};
pub use tracker::{DueHabit, HabitTracker};
pub use export::export_entries_csv;
