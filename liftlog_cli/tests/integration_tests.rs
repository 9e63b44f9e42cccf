//! Integration tests for the liftlog binary.
//!
//! These tests verify end-to-end behavior including:
//! - Workout creation, listing, update and deletion
//! - Set logging and the summary / eligibility reports
//! - Progression application
//! - Rejection of invalid input without partial writes

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Helper to create a test data directory
fn setup_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

/// Helper to get the path to the CLI binary
fn cli() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("liftlog"))
}

fn db_path(dir: &TempDir) -> PathBuf {
    dir.path().join("liftlog.sqlite")
}

const LEG_DAY: &str = r#"{
    "name": "Leg day",
    "exercises": [
        {"name": "Squat", "current_weight": 100, "target_sets": 3, "target_reps": 8, "weight_modifier": 5},
        {"name": "Lunge", "current_weight": 40, "target_sets": 2, "target_reps": 10, "weight_modifier": 2.5}
    ]
}"#;

/// Run a read command and parse its JSON output
fn read_json(db: &Path, args: &[&str]) -> Value {
    let output = cli()
        .arg("--db")
        .arg(db)
        .args(args)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    serde_json::from_slice(&output).expect("stdout is JSON")
}

fn create_leg_day(db: &Path) {
    cli()
        .arg("--db")
        .arg(db)
        .args(["create", "--user", "1", "--json", LEG_DAY])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created workout 1 with 2 exercises"));
}

#[test]
fn test_cli_help() {
    cli()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Workout tracking with automatic weight progression",
        ));
}

#[test]
fn test_create_and_list() {
    let temp_dir = setup_test_dir();
    let db = db_path(&temp_dir);

    create_leg_day(&db);
    assert!(db.exists());

    let workouts = read_json(&db, &["workouts", "--user", "1"]);
    assert_eq!(workouts.as_array().unwrap().len(), 1);
    assert_eq!(workouts[0]["name"], "Leg day");

    let exercises = read_json(&db, &["exercises", "--workout", "1"]);
    let names: Vec<&str> = exercises
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Squat", "Lunge"]);
}

#[test]
fn test_create_from_file() {
    let temp_dir = setup_test_dir();
    let db = db_path(&temp_dir);
    let body = temp_dir.path().join("workout.json");
    std::fs::write(&body, LEG_DAY).unwrap();

    cli()
        .arg("--db")
        .arg(&db)
        .args(["create", "--user", "7", "--file"])
        .arg(&body)
        .assert()
        .success();

    let workouts = read_json(&db, &["workouts", "--user", "7"]);
    assert_eq!(workouts.as_array().unwrap().len(), 1);
}

#[test]
fn test_invalid_workout_is_rejected_without_writes() {
    let temp_dir = setup_test_dir();
    let db = db_path(&temp_dir);

    let body = r#"{"name": "Bad", "exercises": [
        {"name": "Squat", "current_weight": -10, "target_sets": 3, "target_reps": 8, "weight_modifier": 5}
    ]}"#;

    cli()
        .arg("--db")
        .arg(&db)
        .args(["create", "--user", "1", "--json", body])
        .assert()
        .failure()
        .stderr(predicate::str::contains("current_weight"));

    let workouts = read_json(&db, &["workouts", "--user", "1"]);
    assert!(workouts.as_array().unwrap().is_empty());
}

#[test]
fn test_update_rename_and_replace() {
    let temp_dir = setup_test_dir();
    let db = db_path(&temp_dir);
    create_leg_day(&db);

    let body = r#"{"exercises": [
        {"name": "Deadlift", "current_weight": 140, "target_sets": 1, "target_reps": 5, "weight_modifier": 5}
    ]}"#;
    cli()
        .arg("--db")
        .arg(&db)
        .args(["update", "--workout", "1", "--name", "Pull day", "--json", body])
        .assert()
        .success()
        .stdout(predicate::str::contains("Workout 1 updated"));

    let workouts = read_json(&db, &["workouts", "--user", "1"]);
    assert_eq!(workouts[0]["name"], "Pull day");

    let exercises = read_json(&db, &["exercises", "--workout", "1"]);
    assert_eq!(exercises.as_array().unwrap().len(), 1);
    assert_eq!(exercises[0]["name"], "Deadlift");
}

#[test]
fn test_update_missing_workout_fails() {
    let temp_dir = setup_test_dir();
    let db = db_path(&temp_dir);
    create_leg_day(&db);

    cli()
        .arg("--db")
        .arg(&db)
        .args(["update", "--workout", "99", "--name", "Ghost"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("NotFound"));
}

#[test]
fn test_delete_workout() {
    let temp_dir = setup_test_dir();
    let db = db_path(&temp_dir);
    create_leg_day(&db);

    cli()
        .arg("--db")
        .arg(&db)
        .args(["delete", "--workout", "1"])
        .assert()
        .success();

    let workouts = read_json(&db, &["workouts", "--user", "1"]);
    assert!(workouts.as_array().unwrap().is_empty());
    let exercises = read_json(&db, &["exercises", "--workout", "1"]);
    assert!(exercises.as_array().unwrap().is_empty());
}

#[test]
fn test_log_sets_then_progress() {
    let temp_dir = setup_test_dir();
    let db = db_path(&temp_dir);
    create_leg_day(&db);

    // Squat (exercise 1): three good sets. Lunge (exercise 2): one short set.
    for reps in ["8", "9", "8"] {
        cli()
            .arg("--db")
            .arg(&db)
            .args(["log-set", "--exercise", "1", "--weight", "100", "--reps", reps])
            .assert()
            .success();
    }
    cli()
        .arg("--db")
        .arg(&db)
        .args(["log-set", "--exercise", "2", "--weight", "40", "--reps", "6"])
        .assert()
        .success();

    let summary = read_json(&db, &["summary", "--user", "1"]);
    let rows = summary.as_array().unwrap();
    assert_eq!(rows.len(), 4);
    // Ordered by exercise name: Lunge before Squat
    assert_eq!(rows[0]["exercise_name"], "Lunge");

    let eligible = read_json(&db, &["eligible", "--user", "1"]);
    let eligible = eligible.as_array().unwrap();
    assert_eq!(eligible.len(), 1);
    assert_eq!(eligible[0]["exercise_id"], 1);

    cli()
        .arg("--db")
        .arg(&db)
        .args(["progress", "--verify", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Squat → 105"));

    let exercises = read_json(&db, &["exercises", "--workout", "1"]);
    assert_eq!(exercises[0]["current_weight"], 105.0);
    assert_eq!(exercises[1]["current_weight"], 40.0);
}

#[test]
fn test_verified_progress_refuses_ineligible() {
    let temp_dir = setup_test_dir();
    let db = db_path(&temp_dir);
    create_leg_day(&db);

    cli()
        .arg("--db")
        .arg(&db)
        .args(["progress", "--verify", "2"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("NotEligible"));

    // Without verification the caller's decision is trusted
    cli()
        .arg("--db")
        .arg(&db)
        .args(["progress", "2"])
        .assert()
        .success();

    let exercises = read_json(&db, &["exercises", "--workout", "1"]);
    assert_eq!(exercises[1]["current_weight"], 42.5);
}

#[test]
fn test_summary_csv() {
    let temp_dir = setup_test_dir();
    let db = db_path(&temp_dir);
    create_leg_day(&db);

    cli()
        .arg("--db")
        .arg(&db)
        .args(["log-set", "--exercise", "1", "--weight", "100", "--reps", "8"])
        .assert()
        .success();

    cli()
        .arg("--db")
        .arg(&db)
        .args(["summary", "--user", "1", "--csv"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with(
            "workout_id,workout_name,exercise_id,exercise_name,weight,reps,performed_at",
        ))
        .stdout(predicate::str::contains("1,Leg day,1,Squat,100.0,8,"));
}

#[test]
fn test_log_set_for_unknown_exercise_fails() {
    let temp_dir = setup_test_dir();
    let db = db_path(&temp_dir);

    cli()
        .arg("--db")
        .arg(&db)
        .args(["log-set", "--exercise", "5", "--weight", "20", "--reps", "5"])
        .assert()
        .failure();
}

#[test]
fn test_show_workout_and_sets() {
    let temp_dir = setup_test_dir();
    let db = db_path(&temp_dir);
    create_leg_day(&db);

    let workout = read_json(&db, &["workout", "--id", "1"]);
    assert_eq!(workout["name"], "Leg day");
    assert_eq!(workout["user_id"], 1);

    for reps in ["5", "6"] {
        cli()
            .arg("--db")
            .arg(&db)
            .args(["log-set", "--exercise", "2", "--weight", "40", "--reps", reps])
            .assert()
            .success();
    }

    let sets = read_json(&db, &["sets", "--exercise", "2"]);
    let reps: Vec<i64> = sets
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["reps"].as_i64().unwrap())
        .collect();
    assert_eq!(reps, vec![5, 6]);

    cli()
        .arg("--db")
        .arg(&db)
        .args(["workout", "--id", "9"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("NotFound"));
}

#[test]
fn test_init_config_writes_toml() {
    let temp_dir = setup_test_dir();
    let db = db_path(&temp_dir);
    let config_path = temp_dir.path().join("conf").join("config.toml");

    cli()
        .arg("--db")
        .arg(&db)
        .arg("init-config")
        .arg("--path")
        .arg(&config_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote config"));

    let contents = std::fs::read_to_string(&config_path).unwrap();
    assert!(contents.contains("[data]"));
    assert!(contents.contains("liftlog.sqlite"));
    assert!(contents.contains("[server]"));
    // No store is opened for this command
    assert!(!db.exists());

    cli()
        .arg("init-config")
        .arg("--path")
        .arg(&config_path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));

    cli()
        .arg("init-config")
        .arg("--force")
        .arg("--path")
        .arg(&config_path)
        .assert()
        .success();
}
