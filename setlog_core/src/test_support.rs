//! Shared fixtures for unit tests.

use crate::{
    ExerciseDefinition, ExerciseType, Plan, PlanType, RecordedExercise, WorkoutDefinition,
    WorkoutRecord,
};
use chrono::{Duration, NaiveDate, Utc};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Two-week plan starting Sunday 2024-01-07:
/// `[[A,rest,B,rest,A,rest,rest],[B,rest,A,rest,B,rest,rest]]`
pub fn sample_plan(plan_type: PlanType) -> Plan {
    let row = |cells: [&str; 7]| cells.iter().map(|c| c.to_string()).collect::<Vec<_>>();

    let mut workouts = BTreeMap::new();
    workouts.insert(
        "A".to_string(),
        WorkoutDefinition {
            name: "Upper".into(),
            exercises: vec![
                ExerciseDefinition {
                    exercise_id: "push_up".into(),
                    exercise_name: "Push-up".into(),
                    sets: 3,
                    reps: Some(10),
                    duration: None,
                    rest_seconds: 30,
                    superset_group: None,
                },
                ExerciseDefinition {
                    exercise_id: "bent_over_row".into(),
                    exercise_name: "Bent-over Row".into(),
                    sets: 3,
                    reps: Some(8),
                    duration: None,
                    rest_seconds: 60,
                    superset_group: Some("s1".into()),
                },
                ExerciseDefinition {
                    exercise_id: "overhead_press".into(),
                    exercise_name: "Overhead Press".into(),
                    sets: 3,
                    reps: Some(8),
                    duration: None,
                    rest_seconds: 60,
                    superset_group: Some("s1".into()),
                },
            ],
        },
    );
    workouts.insert(
        "B".to_string(),
        WorkoutDefinition {
            name: "Core".into(),
            exercises: vec![
                ExerciseDefinition {
                    exercise_id: "plank".into(),
                    exercise_name: "Plank".into(),
                    sets: 2,
                    reps: None,
                    duration: Some(20),
                    rest_seconds: 30,
                    superset_group: None,
                },
                ExerciseDefinition {
                    exercise_id: "squat".into(),
                    exercise_name: "Squat".into(),
                    sets: 2,
                    reps: Some(12),
                    duration: None,
                    rest_seconds: 45,
                    superset_group: None,
                },
            ],
        },
    );

    Plan {
        id: Uuid::new_v4(),
        user_id: "local".into(),
        name: "Sample".into(),
        start_date: NaiveDate::from_ymd_opt(2024, 1, 7).unwrap(),
        num_weeks: 2,
        plan_type,
        schedule: vec![
            row(["A", "rest", "B", "rest", "A", "rest", "rest"]),
            row(["B", "rest", "A", "rest", "B", "rest", "rest"]),
        ],
        workouts,
    }
}

/// A finished workout record started `days_ago` days before now
pub fn sample_record(letter: &str, days_ago: i64) -> WorkoutRecord {
    let start = Utc::now() - Duration::days(days_ago);
    WorkoutRecord {
        id: Uuid::new_v4(),
        title: format!("Workout {}", letter),
        exercises: vec![
            RecordedExercise {
                exercise_id: "push_up".into(),
                exercise_name: "Push-up".into(),
                exercise_type: ExerciseType::Dynamic,
                sets: 3,
                reps: vec![10, 9, 8],
                order_index: 0,
                superset_group: None,
            },
            RecordedExercise {
                exercise_id: "plank".into(),
                exercise_name: "Plank".into(),
                exercise_type: ExerciseType::Static,
                sets: 2,
                reps: vec![30, 25],
                order_index: 1,
                superset_group: None,
            },
        ],
        plan_id: None,
        plan_workout_letter: Some(letter.to_string()),
        scheduled_date: start.date_naive(),
        start_time: start,
        end_time: start + Duration::minutes(40),
    }
}
