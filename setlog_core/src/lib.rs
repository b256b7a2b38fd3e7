#![forbid(unsafe_code)]

//! Core domain model and business logic for SetLog.
//!
//! This crate provides:
//! - Domain types (plans, workouts, exercises, workout records)
//! - Schedule resolution for once and repeating plans
//! - Superset grouping
//! - The live session state machine and its timers
//! - Persistence (plan store, workout log, CSV export)

pub mod types;
pub mod error;
pub mod plan;
pub mod schedule;
pub mod superset;
pub mod timer;
pub mod session;
pub mod repository;
pub mod catalog;
pub mod config;
pub mod logging;
pub mod plan_store;
pub mod workout_log;
pub mod history;
pub mod export;

#[cfg(test)]
mod test_support;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use catalog::{get_default_catalog, BuiltinCatalog};
pub use config::Config;
pub use plan_store::FilePlanStore;
pub use repository::{CatalogEntry, ExerciseCatalog, PlanRepository, WorkoutRepository};
pub use schedule::{next_scheduled_workout, scheduled_workout_for_date};
pub use session::{SessionContext, SessionSettings, WorkoutSession};
pub use timer::{Clock, SystemClock};
pub use workout_log::JsonlWorkoutLog;
