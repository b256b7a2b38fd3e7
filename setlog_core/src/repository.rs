//! Collaborator interfaces: where plans come from, where finished workouts
//! go, and how exercises are classified.
//!
//! File-backed implementations live in [`plan_store`](crate::plan_store),
//! [`workout_log`](crate::workout_log) and [`catalog`](crate::catalog).

use crate::{ExerciseType, Plan, Result, WorkoutRecord};
use uuid::Uuid;

/// Plan storage
pub trait PlanRepository {
    /// The plan currently active for `user_id`, if any
    fn active_plan(&self, user_id: &str) -> Result<Option<Plan>>;

    fn plan(&self, id: Uuid) -> Result<Option<Plan>>;

    /// Store a new plan. Invalid plans are rejected.
    fn save_plan(&mut self, plan: &Plan) -> Result<()>;

    /// Replace an existing plan. Invalid plans are rejected.
    fn update_plan(&mut self, plan: &Plan) -> Result<()>;

    /// Remove a plan; returns whether it existed
    fn delete_plan(&mut self, id: Uuid) -> Result<bool>;

    fn activate_plan(&mut self, user_id: &str, id: Uuid) -> Result<()>;
}

/// Finished workout storage
pub trait WorkoutRepository {
    fn save_workout(&mut self, record: &WorkoutRecord) -> Result<()>;
}

/// A catalog entry: canonical id and whether the exercise is timed
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CatalogEntry {
    pub exercise_id: String,
    pub name: String,
    pub kind: ExerciseType,
}

/// Exercise lookup by id or name
pub trait ExerciseCatalog {
    fn lookup(&self, name_or_id: &str) -> Option<CatalogEntry>;
}
