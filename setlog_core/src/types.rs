//! Core domain types for SetLog.
//!
//! This module defines the fundamental types used throughout the system:
//! - Plans, their weekly grid and workout definitions
//! - Exercise definitions and their dynamic/static branch
//! - Schedule slots and the two week index schemes
//! - Finalized workout records handed to persistence

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

// ============================================================================
// Plan Types
// ============================================================================

/// Whether a plan runs once or repeats its weekly grid forever
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PlanType {
    Once,
    Repeat,
}

impl fmt::Display for PlanType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanType::Once => write!(f, "once"),
            PlanType::Repeat => write!(f, "repeat"),
        }
    }
}

/// A training plan: `num_weeks` rows of seven day cells, each cell either
/// "rest" or a letter keying into `workouts`
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Plan {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub name: String,
    pub start_date: NaiveDate,
    pub num_weeks: u32,
    pub plan_type: PlanType,
    pub schedule: Vec<Vec<String>>,
    pub workouts: BTreeMap<String, WorkoutDefinition>,
}

/// One lettered workout of a plan
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct WorkoutDefinition {
    pub name: String,
    pub exercises: Vec<ExerciseDefinition>,
}

// ============================================================================
// Exercise Types
// ============================================================================

/// A prescribed exercise.
///
/// Exactly one of `reps` and `duration` must be set; [`Plan::validate`]
/// enforces this at load time.
///
/// [`Plan::validate`]: crate::Plan::validate
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExerciseDefinition {
    pub exercise_id: String,
    pub exercise_name: String,
    pub sets: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reps: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
    #[serde(default)]
    pub rest_seconds: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub superset_group: Option<String>,
}

/// Rep-counted or timed
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExerciseKind {
    Dynamic { reps: u32 },
    Static { duration: u32 },
}

impl ExerciseKind {
    pub fn exercise_type(&self) -> ExerciseType {
        match self {
            ExerciseKind::Dynamic { .. } => ExerciseType::Dynamic,
            ExerciseKind::Static { .. } => ExerciseType::Static,
        }
    }
}

/// Persisted tag telling whether recorded values are reps or hold-seconds
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ExerciseType {
    Static,
    Dynamic,
}

impl fmt::Display for ExerciseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExerciseType::Static => write!(f, "static"),
            ExerciseType::Dynamic => write!(f, "dynamic"),
        }
    }
}

impl ExerciseDefinition {
    /// The branch this exercise runs on, or None if the reps/duration
    /// exclusivity is violated (zero values count as absent)
    pub fn kind(&self) -> Option<ExerciseKind> {
        match (self.reps.filter(|r| *r > 0), self.duration.filter(|d| *d > 0)) {
            (Some(reps), None) => Some(ExerciseKind::Dynamic { reps }),
            (None, Some(duration)) => Some(ExerciseKind::Static { duration }),
            _ => None,
        }
    }

    /// Superset tag, if any; blank tags are treated as untagged
    pub fn superset_tag(&self) -> Option<&str> {
        self.superset_group
            .as_deref()
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
    }

    /// Structural problems with this exercise, empty when valid
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.exercise_name.trim().is_empty() {
            errors.push(format!("Exercise '{}' has empty name", self.exercise_id));
        }
        if self.sets == 0 {
            errors.push(format!("Exercise '{}' has zero sets", self.exercise_name));
        }
        match (self.reps, self.duration) {
            (Some(_), Some(_)) => errors.push(format!(
                "Exercise '{}' sets both reps and duration",
                self.exercise_name
            )),
            (None, None) => errors.push(format!(
                "Exercise '{}' sets neither reps nor duration",
                self.exercise_name
            )),
            (Some(0), None) => {
                errors.push(format!("Exercise '{}' has zero reps", self.exercise_name))
            }
            (None, Some(0)) => errors.push(format!(
                "Exercise '{}' has zero duration",
                self.exercise_name
            )),
            _ => {}
        }

        errors
    }
}

// ============================================================================
// Schedule Types
// ============================================================================

/// Content of one schedule cell
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ScheduleSlot {
    Rest,
    Workout(String),
}

impl ScheduleSlot {
    /// Interpret a raw grid cell; "rest" matches case-insensitively
    pub fn from_cell(cell: &str) -> Self {
        let trimmed = cell.trim();
        if trimmed.eq_ignore_ascii_case("rest") {
            ScheduleSlot::Rest
        } else {
            ScheduleSlot::Workout(trimmed.to_string())
        }
    }

    pub fn is_rest(&self) -> bool {
        matches!(self, ScheduleSlot::Rest)
    }

    pub fn letter(&self) -> Option<&str> {
        match self {
            ScheduleSlot::Rest => None,
            ScheduleSlot::Workout(letter) => Some(letter),
        }
    }
}

impl fmt::Display for ScheduleSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScheduleSlot::Rest => write!(f, "rest"),
            ScheduleSlot::Workout(letter) => write!(f, "{}", letter),
        }
    }
}

/// Weeks since the plan start, never wrapped. Drives week paging.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AbsoluteWeekIndex(pub u32);

/// Row into a plan's schedule grid: wrapped for repeat plans, bounded for
/// once plans.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ScheduleWeekIndex(pub u32);

impl fmt::Display for AbsoluteWeekIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for ScheduleWeekIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Workout Record Types
// ============================================================================

/// One exercise of a persisted workout. `reps` holds the per-set values:
/// rep counts for dynamic exercises, hold-seconds for static ones.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecordedExercise {
    pub exercise_id: String,
    pub exercise_name: String,
    pub exercise_type: ExerciseType,
    pub sets: u32,
    pub reps: Vec<u32>,
    pub order_index: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub superset_group: Option<String>,
}

/// A finalized workout as handed to the workout repository
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct WorkoutRecord {
    pub id: Uuid,
    pub title: String,
    pub exercises: Vec<RecordedExercise>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan_workout_letter: Option<String>,
    pub scheduled_date: NaiveDate,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

impl WorkoutRecord {
    /// Total number of recorded sets across all exercises
    pub fn total_sets(&self) -> usize {
        self.exercises.iter().map(|e| e.reps.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exercise(reps: Option<u32>, duration: Option<u32>) -> ExerciseDefinition {
        ExerciseDefinition {
            exercise_id: "ex".into(),
            exercise_name: "Push-up".into(),
            sets: 3,
            reps,
            duration,
            rest_seconds: 60,
            superset_group: None,
        }
    }

    #[test]
    fn test_kind_selects_branch() {
        assert_eq!(
            exercise(Some(10), None).kind(),
            Some(ExerciseKind::Dynamic { reps: 10 })
        );
        assert_eq!(
            exercise(None, Some(30)).kind(),
            Some(ExerciseKind::Static { duration: 30 })
        );
        assert_eq!(exercise(Some(10), Some(30)).kind(), None);
        assert_eq!(exercise(None, None).kind(), None);
    }

    #[test]
    fn test_validate_reports_exclusivity() {
        assert!(exercise(Some(10), None).validate().is_empty());
        assert_eq!(exercise(Some(10), Some(30)).validate().len(), 1);
        assert_eq!(exercise(None, None).validate().len(), 1);
        assert_eq!(exercise(Some(0), None).validate().len(), 1);
    }

    #[test]
    fn test_blank_superset_tag_is_untagged() {
        let mut ex = exercise(Some(5), None);
        ex.superset_group = Some("  ".into());
        assert_eq!(ex.superset_tag(), None);
        ex.superset_group = Some("A1".into());
        assert_eq!(ex.superset_tag(), Some("A1"));
    }

    #[test]
    fn test_slot_from_cell() {
        assert_eq!(ScheduleSlot::from_cell("Rest"), ScheduleSlot::Rest);
        assert_eq!(ScheduleSlot::from_cell("REST"), ScheduleSlot::Rest);
        assert_eq!(
            ScheduleSlot::from_cell("B"),
            ScheduleSlot::Workout("B".into())
        );
    }

    #[test]
    fn test_plan_deserializes_wire_shape() {
        let json = r#"{
            "start_date": "2024-01-07",
            "num_weeks": 1,
            "plan_type": "repeat",
            "schedule": [["A","rest","rest","rest","rest","rest","rest"]],
            "workouts": {
                "A": {
                    "name": "Full body",
                    "exercises": [
                        {"exercise_id": "plank", "exercise_name": "Plank",
                         "sets": 2, "duration": 30, "rest_seconds": 45}
                    ]
                }
            }
        }"#;
        let plan: Plan = serde_json::from_str(json).unwrap();
        assert_eq!(plan.plan_type, PlanType::Repeat);
        assert_eq!(
            plan.workouts["A"].exercises[0].kind(),
            Some(ExerciseKind::Static { duration: 30 })
        );
        assert!(plan.name.is_empty());
    }
}
