//! Integration tests for the trainlog binary.
//!
//! These tests verify end-to-end behavior including:
//! - Timers surviving process restarts
//! - Weekly log and suggestions
//! - Journal and CSV rollup
//!
//! Every invocation pins the clock with `--at` so results don't depend on
//! when the tests run.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Thursday of week 3
const WEEK3: &str = "2026-01-15T10:00:00Z";
/// Thursday of week 2
const WEEK2: &str = "2026-01-08T10:00:00Z";

fn setup_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

/// The binary with a private data dir and no user config
fn trainlog(dir: &Path, at: &str) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("trainlog"));
    cmd.env("XDG_CONFIG_HOME", dir.join("config"))
        .env_remove("RUST_LOG")
        .arg("--data-dir")
        .arg(dir.join("data"))
        .arg("--at")
        .arg(at);
    cmd
}

fn state_json(dir: &Path) -> serde_json::Value {
    let raw = fs::read_to_string(dir.join("data/state/trainlog_state_v1.json"))
        .expect("Failed to read state file");
    serde_json::from_str(&raw).expect("State file is not JSON")
}

#[test]
fn test_cli_help() {
    Command::new(assert_cmd::cargo::cargo_bin!("trainlog"))
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Training log"));
}

#[test]
fn test_today_is_default_command() {
    let temp_dir = setup_test_dir();

    trainlog(temp_dir.path(), WEEK3)
        .assert()
        .success()
        .stdout(predicate::str::contains("Week 3 | Mon - Strength A (treadmill)"))
        .stdout(predicate::str::contains("Trap Bar Deadlift (trap) 4 x 3"))
        .stdout(predicate::str::contains("Streak: 0 day(s)"));

    assert!(temp_dir
        .path()
        .join("data/state/trainlog_state_v1.json")
        .exists());
}

#[test]
fn test_day_and_mode_persist() {
    let temp_dir = setup_test_dir();

    trainlog(temp_dir.path(), WEEK3)
        .args(["day", "tue"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Selected Tue - Intervals"));
    trainlog(temp_dir.path(), WEEK3)
        .args(["mode", "outdoor"])
        .assert()
        .success();

    trainlog(temp_dir.path(), WEEK3)
        .arg("today")
        .assert()
        .success()
        .stdout(predicate::str::contains("(outdoor)"))
        .stdout(predicate::str::contains("Route: flat loop / track"));
}

#[test]
fn test_unknown_day_is_rejected() {
    let temp_dir = setup_test_dir();

    trainlog(temp_dir.path(), WEEK3)
        .args(["day", "someday"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown day"));
}

#[test]
fn test_session_elapsed_survives_restart() {
    let temp_dir = setup_test_dir();

    trainlog(temp_dir.path(), "2026-01-15T10:00:00Z")
        .args(["session", "start"])
        .assert()
        .success();

    // A different process, 5 minutes later
    trainlog(temp_dir.path(), "2026-01-15T10:05:00Z")
        .args(["session", "pause"])
        .assert()
        .success()
        .stdout(predicate::str::contains("00:05:00 (paused)"));

    // Time spent paused does not count
    trainlog(temp_dir.path(), "2026-01-15T11:00:00Z")
        .args(["session", "start"])
        .assert()
        .success();
    trainlog(temp_dir.path(), "2026-01-15T11:03:00Z")
        .args(["session", "end"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Workout logged: 00:08:00"))
        .stdout(predicate::str::contains("Streak: 1 day(s)"));

    let journal = fs::read_to_string(temp_dir.path().join("data/history/sessions.jsonl"))
        .expect("Failed to read journal");
    assert_eq!(journal.lines().count(), 1);
    assert!(journal.contains("\"elapsed_ms\":480000"));
}

#[test]
fn test_log_and_done_update_the_week() {
    let temp_dir = setup_test_dir();

    trainlog(temp_dir.path(), WEEK3)
        .args(["log", "--exercise", "trap", "--set", "1", "--load", "100", "--reps", "3"])
        .assert()
        .success()
        .stdout(predicate::str::contains("trap set 1: load 100, reps 3"));

    trainlog(temp_dir.path(), WEEK3)
        .args(["done", "--exercise", "trap", "--set", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("done, rest 01:30"));

    let state = state_json(temp_dir.path());
    let record = &state["weekly_log"]["3"]["mon"]["trap"]["1"];
    assert_eq!(record["load_value"], 100.0);
    assert_eq!(record["done"], true);
    assert!(record["rest_expires_at"].is_i64());
}

#[test]
fn test_log_rejects_unknown_exercise() {
    let temp_dir = setup_test_dir();

    trainlog(temp_dir.path(), WEEK3)
        .args(["log", "--exercise", "squat", "--set", "1", "--load", "80"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no exercise"));
}

#[test]
fn test_rest_countdown_fires_once_across_processes() {
    let temp_dir = setup_test_dir();

    trainlog(temp_dir.path(), WEEK3)
        .args(["rest", "60"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Rest: 60s"));
    trainlog(temp_dir.path(), "2026-01-15T10:00:00Z")
        .args(["done", "--exercise", "bss", "--set", "2"])
        .assert()
        .success();

    trainlog(temp_dir.path(), "2026-01-15T10:00:30Z")
        .arg("poll")
        .assert()
        .success()
        .stdout(predicate::str::contains("No timers finished"));

    trainlog(temp_dir.path(), "2026-01-15T10:01:00Z")
        .arg("poll")
        .assert()
        .success()
        .stdout(predicate::str::contains("Rest finished: mon bss set 2"));

    trainlog(temp_dir.path(), "2026-01-15T10:05:00Z")
        .arg("poll")
        .assert()
        .success()
        .stdout(predicate::str::contains("Rest finished").not());
}

#[test]
fn test_rest_seconds_are_clamped() {
    let temp_dir = setup_test_dir();

    trainlog(temp_dir.path(), WEEK3)
        .args(["rest", "5000"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Rest: 600s"));
}

#[test]
fn test_poll_watch_waits_for_mobility() {
    let temp_dir = setup_test_dir();

    trainlog(temp_dir.path(), WEEK3)
        .args(["mobility", "start", "couch"])
        .assert()
        .success()
        .stdout(predicate::str::contains("couch: 01:00 left"));

    trainlog(temp_dir.path(), WEEK3)
        .args(["poll", "--watch"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Mobility finished: mon couch"));
}

#[test]
fn test_mobility_done_shows_in_today() {
    let temp_dir = setup_test_dir();

    trainlog(temp_dir.path(), WEEK3)
        .args(["mobility", "done", "glute"])
        .assert()
        .success();

    trainlog(temp_dir.path(), WEEK3)
        .assert()
        .success()
        .stdout(predicate::str::contains("Glute stretch (glute): done"));
}

#[test]
fn test_suggestion_from_last_week() {
    let temp_dir = setup_test_dir();

    for (set, load) in [("1", "100"), ("2", "100"), ("3", "102.5"), ("4", "102.5")] {
        trainlog(temp_dir.path(), WEEK2)
            .args(["log", "--exercise", "trap", "--set", set, "--load", load, "--reps", "3"])
            .assert()
            .success();
    }

    trainlog(temp_dir.path(), WEEK3)
        .arg("suggest")
        .assert()
        .success()
        .stdout(predicate::str::contains("trap: 103.5"))
        .stdout(predicate::str::contains("bss: no suggestion"));
}

#[test]
fn test_run_day_suggestions() {
    let temp_dir = setup_test_dir();

    trainlog(temp_dir.path(), WEEK3)
        .args(["day", "sun"])
        .assert()
        .success();

    trainlog(temp_dir.path(), WEEK3)
        .arg("suggest")
        .assert()
        .success()
        .stdout(predicate::str::contains("Long run: 60 min"));

    // Week 4 is a deload
    trainlog(temp_dir.path(), "2026-01-22T10:00:00Z")
        .arg("suggest")
        .assert()
        .success()
        .stdout(predicate::str::contains("Long run: 45 min"));
}

#[test]
fn test_reset_day_clears_only_selected_day() {
    let temp_dir = setup_test_dir();

    trainlog(temp_dir.path(), WEEK3)
        .args(["log", "--exercise", "trap", "--set", "1", "--load", "90"])
        .assert()
        .success();
    trainlog(temp_dir.path(), WEEK3)
        .args(["reset-day"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Cleared mon for week 3"));

    let state = state_json(temp_dir.path());
    assert!(state["weekly_log"]["3"]["mon"].is_null());
}

#[test]
fn test_streak_counts_consecutive_days() {
    let temp_dir = setup_test_dir();

    for at in ["2026-01-13T18:00:00Z", "2026-01-14T18:00:00Z"] {
        trainlog(temp_dir.path(), at)
            .args(["session", "start"])
            .assert()
            .success();
        trainlog(temp_dir.path(), at)
            .args(["session", "end"])
            .assert()
            .success();
    }

    trainlog(temp_dir.path(), "2026-01-14T20:00:00Z")
        .arg("streak")
        .assert()
        .success()
        .stdout(predicate::str::contains("Streak: 2 day(s)"));

    // A missed day breaks it
    trainlog(temp_dir.path(), "2026-01-16T08:00:00Z")
        .arg("streak")
        .assert()
        .success()
        .stdout(predicate::str::contains("Streak: 0 day(s)"));
}

#[test]
fn test_interval_runs_to_completion() {
    let temp_dir = setup_test_dir();

    trainlog(temp_dir.path(), WEEK3)
        .args(["interval", "--work", "10", "--rest", "5", "--rounds", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Intervals: 2 x 10s work / 5s rest"))
        .stdout(predicate::str::contains("Interval Work done (round 1), next: Rest"))
        .stdout(predicate::str::contains("Interval Rest done (round 2), next: Stopped"))
        .stdout(predicate::str::contains("Intervals finished"));
}

#[test]
fn test_interval_manual_stops_after_one_phase() {
    let temp_dir = setup_test_dir();

    trainlog(temp_dir.path(), WEEK3)
        .args(["interval", "--work", "1", "--manual"])
        .assert()
        .success()
        // Work is clamped up to 5 seconds
        .stdout(predicate::str::contains("x 5s work"))
        .stdout(predicate::str::contains("next: Stopped"))
        .stdout(predicate::str::contains("next: Rest").not());
}

#[test]
fn test_rollup_creates_csv() {
    let temp_dir = setup_test_dir();

    for _ in 0..3 {
        trainlog(temp_dir.path(), WEEK3)
            .args(["session", "start"])
            .assert()
            .success();
        trainlog(temp_dir.path(), WEEK3)
            .args(["session", "end"])
            .assert()
            .success();
    }

    trainlog(temp_dir.path(), WEEK3)
        .arg("rollup")
        .assert()
        .success()
        .stdout(predicate::str::contains("Rolled up 3 workouts"));

    let csv_content = fs::read_to_string(temp_dir.path().join("data/sessions.csv"))
        .expect("Failed to read CSV");
    assert!(csv_content.starts_with("id,date,week,day,elapsed_seconds"));
    assert_eq!(csv_content.lines().count(), 4);
}

#[test]
fn test_rollup_with_cleanup() {
    let temp_dir = setup_test_dir();

    trainlog(temp_dir.path(), WEEK3)
        .args(["session", "end"])
        .assert()
        .success();

    trainlog(temp_dir.path(), WEEK3)
        .args(["rollup", "--cleanup"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Cleaned up 1 processed journals"));

    let leftovers: Vec<_> = fs::read_dir(temp_dir.path().join("data/history"))
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().ends_with(".processed"))
        .collect();
    assert!(leftovers.is_empty());
}

#[test]
fn test_empty_rollup() {
    let temp_dir = setup_test_dir();

    trainlog(temp_dir.path(), WEEK3)
        .arg("rollup")
        .assert()
        .success()
        .stdout(predicate::str::contains("nothing to roll up"));
}

#[test]
fn test_config_file_sets_defaults() {
    let temp_dir = setup_test_dir();
    let config_path = temp_dir.path().join("custom.toml");
    fs::write(
        &config_path,
        "[engine]\nrest_default_seconds = 45\n\n[progression]\nlong_run_base_minutes = 50\n",
    )
    .unwrap();

    trainlog(temp_dir.path(), WEEK3)
        .arg("--config")
        .arg(&config_path)
        .args(["done", "--exercise", "calf", "--set", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("rest 00:45"));

    trainlog(temp_dir.path(), WEEK3)
        .arg("--config")
        .arg(&config_path)
        .args(["day", "sun"])
        .assert()
        .success();
    trainlog(temp_dir.path(), WEEK3)
        .arg("--config")
        .arg(&config_path)
        .arg("suggest")
        .assert()
        .success()
        .stdout(predicate::str::contains("Long run: 65 min"));
}
