//! Recovery tests for damaged data files.
//!
//! A workout log with garbage lines keeps working (bad lines are skipped).
//! A corrupted plan store is reported instead of being silently replaced.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;
use tempfile::TempDir;

const PLAN_JSON: &str = r#"{
    "name": "Daily",
    "start_date": "2024-01-01",
    "num_weeks": 1,
    "plan_type": "once",
    "schedule": [["A", "rest", "A", "rest", "A", "rest", "rest"]],
    "workouts": {
        "A": {
            "name": "Quick",
            "exercises": [
                {"exercise_id": "push_up", "exercise_name": "Push-up", "sets": 2, "reps": 5, "rest_seconds": 10}
            ]
        }
    }
}"#;

fn cli() -> Command {
    Command::cargo_bin("setlog").expect("Failed to find setlog binary")
}

fn setup_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

fn import_plan(data_dir: &Path) {
    let plan_path = data_dir.join("plan.json");
    fs::write(&plan_path, PLAN_JSON).expect("Failed to write plan");
    cli()
        .args(["plan", "import"])
        .arg(&plan_path)
        .arg("--data-dir")
        .arg(data_dir)
        .assert()
        .success();
}

fn log_workout(data_dir: &Path) {
    cli()
        .args(["start", "--date", "2024-01-01", "--auto-complete"])
        .arg("--data-dir")
        .arg(data_dir)
        .assert()
        .success();
}

#[test]
fn test_garbage_log_lines_are_skipped() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();
    import_plan(data_dir);
    log_workout(data_dir);

    // Simulate a crash mid-write
    let log_path = data_dir.join("workouts.jsonl");
    let mut file = OpenOptions::new().append(true).open(&log_path).unwrap();
    writeln!(file, "{{\"id\": \"truncated").unwrap();
    drop(file);

    log_workout(data_dir);

    cli()
        .arg("export")
        .arg("--data-dir")
        .arg(data_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("Exported 4 sets"));

    let content = fs::read_to_string(&log_path).unwrap();
    assert_eq!(content.lines().count(), 3);
}

#[test]
fn test_corrupted_plan_store_is_reported() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();
    import_plan(data_dir);

    let store_path = data_dir.join("plans.json");
    fs::write(&store_path, "{ \"plans\": [ broken").unwrap();

    cli()
        .args(["today", "--date", "2024-01-01"])
        .arg("--data-dir")
        .arg(data_dir)
        .assert()
        .failure();

    // Left untouched for the user to repair
    assert_eq!(
        fs::read_to_string(&store_path).unwrap(),
        "{ \"plans\": [ broken"
    );
}

#[test]
fn test_once_plan_ends_after_last_week() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();
    import_plan(data_dir);

    cli()
        .args(["today", "--date", "2024-01-08"])
        .arg("--data-dir")
        .arg(data_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("No workout scheduled"));
}
