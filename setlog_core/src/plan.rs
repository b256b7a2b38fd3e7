//! Plan loading and structural validation.
//!
//! Plans usually arrive as JSON produced by an upstream extractor or typed by
//! hand. Anything structurally wrong is rejected here, at load time, so a
//! session never discovers a broken plan half way through.

use crate::{Error, Plan, Result, ScheduleSlot, ScheduleWeekIndex, WorkoutDefinition};
use std::path::Path;

pub const DAYS_PER_WEEK: usize = 7;

impl Plan {
    /// Validate the plan's structure
    ///
    /// Returns a list of problems, empty if the plan is usable.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.num_weeks == 0 {
            errors.push("Plan has zero weeks".to_string());
        }

        if self.schedule.len() != self.num_weeks as usize {
            errors.push(format!(
                "Schedule has {} weeks but num_weeks is {}",
                self.schedule.len(),
                self.num_weeks
            ));
        }

        for (week, row) in self.schedule.iter().enumerate() {
            if row.len() != DAYS_PER_WEEK {
                errors.push(format!(
                    "Schedule week {} has {} days, expected {}",
                    week,
                    row.len(),
                    DAYS_PER_WEEK
                ));
            }

            for (day, cell) in row.iter().enumerate() {
                if let ScheduleSlot::Workout(letter) = ScheduleSlot::from_cell(cell) {
                    if letter.is_empty() {
                        errors.push(format!("Schedule week {} day {} is empty", week, day));
                    } else if !self.workouts.contains_key(&letter) {
                        errors.push(format!(
                            "Schedule week {} day {} references unknown workout '{}'",
                            week, day, letter
                        ));
                    }
                }
            }
        }

        for (letter, workout) in &self.workouts {
            if workout.exercises.is_empty() {
                errors.push(format!("Workout '{}' has no exercises", letter));
            }
            for exercise in &workout.exercises {
                for problem in exercise.validate() {
                    errors.push(format!("Workout '{}': {}", letter, problem));
                }
            }
        }

        errors
    }

    /// Fail with `Error::PlanValidation` unless `validate` finds nothing
    pub fn ensure_valid(&self) -> Result<()> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(Error::PlanValidation(errors.join("; ")))
        }
    }

    /// Parse and validate a plan from its JSON form
    pub fn from_json_str(json: &str) -> Result<Self> {
        let plan: Plan = serde_json::from_str(json)?;
        plan.ensure_valid()?;
        Ok(plan)
    }

    /// Load and validate a plan from a JSON file
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let plan = Self::from_json_str(&contents)?;
        tracing::info!(
            "Loaded plan '{}' ({} weeks, {}) from {:?}",
            plan.name,
            plan.num_weeks,
            plan.plan_type,
            path
        );
        Ok(plan)
    }

    /// Look up a workout by its letter
    pub fn workout(&self, letter: &str) -> Option<&WorkoutDefinition> {
        self.workouts.get(letter)
    }

    /// Cell content at a schedule row and weekday, if the grid has one
    pub fn slot_at(&self, week: ScheduleWeekIndex, day: usize) -> Option<ScheduleSlot> {
        self.schedule
            .get(week.0 as usize)
            .and_then(|row| row.get(day))
            .map(|cell| ScheduleSlot::from_cell(cell))
    }
}
