//! Integration tests for the hab binary.
//!
//! These tests verify end-to-end behavior including:
//! - Habit creation and due-today listing
//! - Check-ins, measured values and statistics
//! - Archive, delete cascade and export
//! - Rejection of invalid input and corrupt data files

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Helper to create a test data directory
fn setup_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

/// Helper to get the path to the CLI binary
fn cli() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("hab"))
}

/// Run a command against `data_dir` and expect success
fn run(data_dir: &Path, args: &[&str]) {
    cli()
        .arg("--data-dir")
        .arg(data_dir)
        .args(args)
        .assert()
        .success();
}

/// Run `stats --json` and parse the output
fn stats_json(data_dir: &Path, habit: &str, today: &str) -> serde_json::Value {
    let output = cli()
        .arg("--data-dir")
        .arg(data_dir)
        .args(["stats", habit, "--today", today, "--json"])
        .output()
        .expect("Failed to run stats");
    assert!(output.status.success(), "stats failed: {:?}", output);
    serde_json::from_slice(&output.stdout).expect("stats output is not JSON")
}

#[test]
fn test_cli_help() {
    cli()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Habit tracker"));
}

#[test]
fn test_add_creates_data_file() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    cli()
        .arg("--data-dir")
        .arg(data_dir)
        .args(["add", "Walk"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Added 'Walk' (daily)"));

    let contents = fs::read_to_string(data_dir.join("habits.json")).expect("Failed to read data");
    assert!(contents.contains("\"Walk\""));
}

#[test]
fn test_today_lists_due_habits() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    run(data_dir, &["add", "Walk"]);
    run(data_dir, &["add", "Gym", "--days", "mon,wed,fri"]);
    run(data_dir, &["done", "Walk", "--date", "2024-06-03"]);

    // 2024-06-03 is a Monday
    cli()
        .arg("--data-dir")
        .arg(data_dir)
        .args(["today", "--date", "2024-06-03"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[x] Walk"))
        .stdout(predicate::str::contains("[ ] Gym"))
        .stdout(predicate::str::contains("1/2 done"));

    // Tuesday: Gym is not due
    cli()
        .arg("--data-dir")
        .arg(data_dir)
        .args(["today", "--date", "2024-06-04"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Walk"))
        .stdout(predicate::str::contains("Gym").not());
}

#[test]
fn test_streaks_from_check_ins() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    run(data_dir, &["add", "Floss"]);
    for day in 1..=5 {
        run(data_dir, &["done", "Floss", "--date", &format!("2024-01-0{}", day)]);
    }
    run(data_dir, &["done", "Floss", "--date", "2024-01-10"]);
    run(data_dir, &["done", "Floss", "--date", "2024-01-11"]);

    let stats = stats_json(data_dir, "Floss", "2024-01-11");
    assert_eq!(stats["best_streak"], 5);
    assert_eq!(stats["current_streak"], 2);
    assert_eq!(stats["total_completions"], 7);
    assert_eq!(stats["last_completed"], "2024-01-11");
    assert!(stats["average_value"].is_null());

    // Not yet done today, streak still counts through yesterday
    let stats = stats_json(data_dir, "Floss", "2024-01-12");
    assert_eq!(stats["current_streak"], 2);

    // A whole day missed
    let stats = stats_json(data_dir, "Floss", "2024-01-13");
    assert_eq!(stats["current_streak"], 0);
}

#[test]
fn test_undo_breaks_streak() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    run(data_dir, &["add", "Floss"]);
    run(data_dir, &["done", "Floss", "--date", "2024-01-01"]);
    run(data_dir, &["done", "Floss", "--date", "2024-01-02"]);
    run(data_dir, &["undo", "Floss", "--date", "2024-01-02"]);

    let stats = stats_json(data_dir, "Floss", "2024-01-02");
    assert_eq!(stats["current_streak"], 1);
    assert_eq!(stats["total_completions"], 1);
    assert_eq!(stats["completion_rate"], 50);
}

#[test]
fn test_measurable_habit_values() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    run(data_dir, &["add", "Read", "--target", "10", "--unit", "pages"]);

    cli()
        .arg("--data-dir")
        .arg(data_dir)
        .args(["log", "Read", "12", "--date", "2024-02-01"])
        .assert()
        .success()
        .stdout(predicate::str::contains("target reached"));
    run(data_dir, &["log", "Read", "5", "--date", "2024-02-02"]);

    let stats = stats_json(data_dir, "Read", "2024-02-02");
    assert_eq!(stats["total_completions"], 1);
    assert_eq!(stats["total_value"], 17.0);
    assert_eq!(stats["average_value"], 8.5);
    assert_eq!(stats["completion_rate"], 50);
}

#[test]
fn test_measurable_habit_without_history_has_no_values() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    run(data_dir, &["add", "Read", "--target", "10", "--unit", "pages"]);

    let stats = stats_json(data_dir, "Read", "2024-02-02");
    assert_eq!(stats["total_completions"], 0);
    assert_eq!(stats["best_streak"], 0);
    assert!(stats["total_value"].is_null());
    assert!(stats["average_value"].is_null());
}

#[test]
fn test_editing_target_reevaluates_history() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    run(data_dir, &["add", "Read", "--target", "10", "--unit", "pages"]);
    run(data_dir, &["log", "Read", "12", "--date", "2024-02-01"]);
    assert_eq!(stats_json(data_dir, "Read", "2024-02-01")["total_completions"], 1);

    run(data_dir, &["edit", "Read", "--target", "20"]);
    assert_eq!(stats_json(data_dir, "Read", "2024-02-01")["total_completions"], 0);

    cli()
        .arg("--data-dir")
        .arg(data_dir)
        .args(["stats", "Read", "--today", "2024-02-01"])
        .assert()
        .success()
        .stdout(predicate::str::contains("12 pages"));
}

#[test]
fn test_log_rejected_for_boolean_habit() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    run(data_dir, &["add", "Walk"]);

    cli()
        .arg("--data-dir")
        .arg(data_dir)
        .args(["log", "Walk", "3"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("takes no value"));
}

#[test]
fn test_negative_value_rejected() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    run(data_dir, &["add", "Read", "--target", "10"]);

    cli()
        .arg("--data-dir")
        .arg(data_dir)
        .args(["log", "Read", "-2"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("negative"));
}

#[test]
fn test_invalid_inputs_rejected() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    cli()
        .arg("--data-dir")
        .arg(data_dir)
        .args(["add", "Gym", "--days", ","])
        .assert()
        .failure();

    cli()
        .arg("--data-dir")
        .arg(data_dir)
        .args(["add", "Read", "--target", "0"])
        .assert()
        .failure();

    cli()
        .arg("--data-dir")
        .arg(data_dir)
        .args(["add", "Walk", "--color", "green"])
        .assert()
        .failure();

    cli()
        .arg("--data-dir")
        .arg(data_dir)
        .args(["add", "Walk", "--weekly", "--days", "mon"])
        .assert()
        .failure();

    cli()
        .arg("--data-dir")
        .arg(data_dir)
        .args(["today", "--date", "2024-02-30"])
        .assert()
        .failure();

    // nothing was created
    assert!(!data_dir.join("habits.json").exists());
}

#[test]
fn test_archive_hides_from_today() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    run(data_dir, &["add", "Walk"]);
    run(data_dir, &["done", "Walk", "--date", "2024-03-01"]);
    run(data_dir, &["archive", "Walk"]);

    cli()
        .arg("--data-dir")
        .arg(data_dir)
        .args(["today", "--date", "2024-03-01"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Nothing due"));

    cli()
        .arg("--data-dir")
        .arg(data_dir)
        .args(["list", "--all", "--today", "2024-03-01"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[archived]"))
        .stdout(predicate::str::contains("streak 1"));

    // history kept
    assert_eq!(stats_json(data_dir, "Walk", "2024-03-01")["total_completions"], 1);

    run(data_dir, &["restore", "Walk"]);
    cli()
        .arg("--data-dir")
        .arg(data_dir)
        .args(["today", "--date", "2024-03-01"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[x] Walk"));
}

#[test]
fn test_delete_removes_history() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    run(data_dir, &["add", "Walk"]);
    run(data_dir, &["done", "Walk", "--date", "2024-03-01"]);
    run(data_dir, &["delete", "Walk"]);

    let contents = fs::read_to_string(data_dir.join("habits.json")).expect("Failed to read data");
    let document: serde_json::Value = serde_json::from_str(&contents).unwrap();
    assert_eq!(document["habits"].as_array().unwrap().len(), 0);
    assert_eq!(document["entries"].as_array().unwrap().len(), 0);

    cli()
        .arg("--data-dir")
        .arg(data_dir)
        .args(["stats", "Walk"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_weekly_habit_due_once_a_week() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    run(data_dir, &["add", "Review", "--weekly"]);

    let mut due_days = 0;
    for day in 1..=7 {
        let output = cli()
            .arg("--data-dir")
            .arg(data_dir)
            .args(["today", "--date", &format!("2024-04-0{}", day)])
            .output()
            .expect("Failed to run today");
        assert!(output.status.success());
        if String::from_utf8_lossy(&output.stdout).contains("Review") {
            due_days += 1;
        }
    }
    assert_eq!(due_days, 1);
}

#[test]
fn test_export_csv() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();
    let csv_path = data_dir.join("export").join("history.csv");

    run(data_dir, &["add", "Walk"]);
    run(data_dir, &["add", "Read", "--target", "10", "--unit", "pages"]);
    run(data_dir, &["done", "Walk", "--date", "2024-03-01"]);
    run(data_dir, &["log", "Read", "4", "--date", "2024-03-01"]);

    cli()
        .arg("--data-dir")
        .arg(data_dir)
        .arg("export")
        .arg(&csv_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Exported 2 entries"));

    let contents = fs::read_to_string(&csv_path).expect("Failed to read CSV");
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(lines[0], "habit_id,habit_name,day,completed,value,unit");
    assert_eq!(lines.len(), 3);
    assert!(lines[1].contains(",Read,2024-03-01,false,4.0,pages"));
    assert!(lines[2].contains(",Walk,2024-03-01,true,,"));
}

#[test]
fn test_corrupt_data_file_is_not_overwritten() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();
    let data_file = data_dir.join("habits.json");

    fs::write(&data_file, "{ invalid json }}}}").expect("Failed to write corrupt data");

    cli()
        .arg("--data-dir")
        .arg(data_dir)
        .args(["add", "Walk"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("corrupt"));

    assert_eq!(
        fs::read_to_string(&data_file).unwrap(),
        "{ invalid json }}}}"
    );
}
