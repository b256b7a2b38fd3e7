//! Concurrency tests for the setlog binary.
//!
//! These tests verify that multiple processes can safely:
//! - Append to the workout log simultaneously (file locking)
//! - Read the plan store while workouts are being logged

use assert_cmd::Command;
use std::path::Path;
use std::thread;
use tempfile::TempDir;

const PLAN_JSON: &str = r#"{
    "name": "Daily",
    "start_date": "2024-01-01",
    "num_weeks": 1,
    "plan_type": "repeat",
    "schedule": [["A", "A", "A", "A", "A", "A", "A"]],
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
    std::fs::write(&plan_path, PLAN_JSON).expect("Failed to write plan");
    cli()
        .args(["plan", "import"])
        .arg(&plan_path)
        .arg("--data-dir")
        .arg(data_dir)
        .assert()
        .success();
}

#[test]
fn test_concurrent_workout_logging() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path().to_path_buf();
    import_plan(&data_dir);

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let data_dir = data_dir.clone();
            thread::spawn(move || {
                cli()
                    .args(["start", "--auto-complete"])
                    .arg("--data-dir")
                    .arg(&data_dir)
                    .assert()
                    .success();
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("Thread panicked");
    }

    // Every line must be a complete record
    let log = std::fs::read_to_string(data_dir.join("workouts.jsonl"))
        .expect("Failed to read workout log");
    let lines: Vec<_> = log.lines().collect();
    assert_eq!(lines.len(), 8, "Expected 8 workouts, got {}", lines.len());
    for line in lines {
        let record: serde_json::Value =
            serde_json::from_str(line).expect("Interleaved or truncated record");
        assert_eq!(record["plan_workout_letter"], "A");
    }
}

#[test]
fn test_concurrent_reads_and_writes() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path().to_path_buf();
    import_plan(&data_dir);

    let writers: Vec<_> = (0..4)
        .map(|_| {
            let data_dir = data_dir.clone();
            thread::spawn(move || {
                cli()
                    .args(["start", "--auto-complete"])
                    .arg("--data-dir")
                    .arg(&data_dir)
                    .assert()
                    .success();
            })
        })
        .collect();

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let data_dir = data_dir.clone();
            thread::spawn(move || {
                cli()
                    .args(["week"])
                    .arg("--data-dir")
                    .arg(&data_dir)
                    .assert()
                    .success();
                cli()
                    .arg("history")
                    .arg("--data-dir")
                    .arg(&data_dir)
                    .assert()
                    .success();
            })
        })
        .collect();

    for handle in writers.into_iter().chain(readers) {
        handle.join().expect("Thread panicked");
    }

    let log = std::fs::read_to_string(data_dir.join("workouts.jsonl"))
        .expect("Failed to read workout log");
    assert_eq!(log.lines().count(), 4);
}
