//! Due/overdue evaluation for feedings and stock.
//!
//! Evaluation is pure and idempotent: the same schedules and stock produce
//! the same due events no matter how often it runs. The recurring sweep and
//! the on-demand post-deduction path share one evaluation function.

pub mod due;
pub mod engine;
pub mod runner;
pub mod schedule;

pub use due::{DedupeKey, DueEvent, DueKind};
pub use engine::{InMemoryScheduleSource, ScheduleEngine, ScheduleSource, SweepConfig};
pub use runner::{SweepRunnerConfig, SweepRunnerHandle, SweepStats, spawn_sweep};
pub use schedule::{FeedingSchedule, ScheduleState};
