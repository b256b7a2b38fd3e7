//! Workout history queries over the workout log.

use crate::{Result, WorkoutRecord};
use chrono::{DateTime, Duration, Utc};
use std::path::Path;
use uuid::Uuid;

/// Workouts started within the last `days` days, newest first. A window
/// reaching past the start of the calendar covers all history.
pub fn load_recent_workouts(log_path: &Path, days: i64) -> Result<Vec<WorkoutRecord>> {
    let records = crate::workout_log::read_workouts(log_path)?;
    let cutoff = Duration::try_days(days)
        .and_then(|window| Utc::now().checked_sub_signed(window))
        .unwrap_or(DateTime::<Utc>::MIN_UTC);
    let recent = workouts_since(records, cutoff);

    tracing::info!(
        "Loaded {} workouts from last {} days",
        recent.len(),
        days
    );
    Ok(recent)
}

/// Records started at or after `cutoff`, newest first
pub fn workouts_since(records: Vec<WorkoutRecord>, cutoff: DateTime<Utc>) -> Vec<WorkoutRecord> {
    let mut recent: Vec<_> = records
        .into_iter()
        .filter(|r| r.start_time >= cutoff)
        .collect();
    recent.sort_by(|a, b| b.start_time.cmp(&a.start_time));
    recent
}

/// Most recent record of a plan's lettered workout
pub fn last_workout_for_letter<'a>(
    records: &'a [WorkoutRecord],
    plan_id: Uuid,
    letter: &str,
) -> Option<&'a WorkoutRecord> {
    records
        .iter()
        .filter(|r| r.plan_id == Some(plan_id) && r.plan_workout_letter.as_deref() == Some(letter))
        .max_by_key(|r| r.start_time)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::WorkoutRepository;
    use crate::test_support::sample_record;
    use crate::workout_log::JsonlWorkoutLog;

    #[test]
    fn test_recent_window_newest_first() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("workouts.jsonl");
        let mut log = JsonlWorkoutLog::new(&path);
        for days_ago in [10, 1, 3] {
            log.save_workout(&sample_record("A", days_ago)).unwrap();
        }

        let recent = load_recent_workouts(&path, 7).unwrap();
        assert_eq!(recent.len(), 2);
        assert!(recent[0].start_time > recent[1].start_time);
    }

    #[test]
    fn test_huge_window_covers_all_history() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("workouts.jsonl");
        let mut log = JsonlWorkoutLog::new(&path);
        for days_ago in [400, 0] {
            log.save_workout(&sample_record("A", days_ago)).unwrap();
        }

        assert_eq!(load_recent_workouts(&path, 100_000_000_000).unwrap().len(), 2);
        assert_eq!(load_recent_workouts(&path, i64::MAX).unwrap().len(), 2);
    }

    #[test]
    fn test_last_workout_for_letter() {
        let plan_id = Uuid::new_v4();
        let mut records = vec![
            sample_record("A", 5),
            sample_record("A", 2),
            sample_record("B", 1),
        ];
        for record in &mut records {
            record.plan_id = Some(plan_id);
        }

        let last = last_workout_for_letter(&records, plan_id, "A").unwrap();
        assert_eq!(last.start_time, records[1].start_time);
        assert!(last_workout_for_letter(&records, plan_id, "C").is_none());
        assert!(last_workout_for_letter(&records, Uuid::new_v4(), "A").is_none());
    }
}
