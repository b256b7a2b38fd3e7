//! CSV export of the workout log.
//!
//! Writes one row per recorded set so the data opens cleanly in a
//! spreadsheet. The CSV is a snapshot of the whole log: every export
//! replaces the previous file, so exporting twice yields the same rows.

use crate::{Error, Result, WorkoutRecord};
use fs2::FileExt;
use std::path::Path;
use tempfile::NamedTempFile;

/// A row in the CSV output
#[derive(Debug, serde::Serialize)]
struct CsvRow<'a> {
    workout_id: String,
    title: &'a str,
    scheduled_date: String,
    start_time: String,
    plan_workout_letter: Option<&'a str>,
    exercise_id: &'a str,
    exercise_name: &'a str,
    exercise_type: String,
    superset_group: Option<&'a str>,
    set_number: usize,
    value: u32,
}

fn rows(record: &WorkoutRecord) -> impl Iterator<Item = CsvRow<'_>> {
    record.exercises.iter().flat_map(move |exercise| {
        exercise
            .reps
            .iter()
            .enumerate()
            .map(move |(set, value)| CsvRow {
                workout_id: record.id.to_string(),
                title: &record.title,
                scheduled_date: record.scheduled_date.to_string(),
                start_time: record.start_time.to_rfc3339(),
                plan_workout_letter: record.plan_workout_letter.as_deref(),
                exercise_id: &exercise.exercise_id,
                exercise_name: &exercise.exercise_name,
                exercise_type: exercise.exercise_type.to_string(),
                superset_group: exercise.superset_group.as_deref(),
                set_number: set + 1,
                value: *value,
            })
    })
}

/// Export every workout in `log_path` to `csv_path`
///
/// Returns the number of rows written.
pub fn export_csv(log_path: &Path, csv_path: &Path) -> Result<usize> {
    let records = crate::workout_log::read_workouts(log_path)?;
    if records.is_empty() {
        tracing::info!("No workouts to export");
        return Ok(0);
    }
    write_csv(&records, csv_path)
}

/// Replace `csv_path` with rows for `records` (temp file, fsync, rename)
pub fn write_csv(records: &[WorkoutRecord], csv_path: &Path) -> Result<usize> {
    let parent = match csv_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        Some(_) => Path::new("."),
        None => {
            return Err(Error::Other(format!(
                "export path {:?} has no parent",
                csv_path
            )))
        }
    };
    std::fs::create_dir_all(parent)?;

    let temp = NamedTempFile::new_in(parent)?;
    temp.as_file().lock_exclusive()?;

    let mut count = 0;
    {
        let mut writer = csv::Writer::from_writer(temp.as_file());
        for record in records {
            for row in rows(record) {
                writer.serialize(row)?;
                count += 1;
            }
        }
        writer.flush()?;
    }

    temp.as_file().sync_all()?;
    temp.as_file().unlock()?;
    temp.persist(csv_path).map_err(|e| Error::Io(e.error))?;

    tracing::info!("Exported {} sets from {} workouts", count, records.len());
    Ok(count)
}
