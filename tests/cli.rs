#![forbid(unsafe_code)]
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

#[test]
fn generate_then_check_round_trip() {
    let dir = tempdir().unwrap();
    let store = dir.path().join("store.json");
    let schedule = dir.path().join("schedule.json");
    fs::write(&store, SAMPLE_STORE).unwrap();

    generate(&store, &schedule);

    let raw = fs::read_to_string(&schedule).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(parsed["group"], "ops");
    // 5 lundis en septembre 2025, effectif 2
    assert_eq!(parsed["entries"].as_array().unwrap().len(), 10);

    Command::cargo_bin("roulement-cli")
        .unwrap()
        .arg("--data")
        .arg(&store)
        .arg("check")
        .arg("--schedule")
        .arg(&schedule)
        .assert()
        .success()
        .stdout(predicate::str::contains("OK"));
}

#[test]
fn check_flags_a_tampered_schedule() {
    let dir = tempdir().unwrap();
    let store = dir.path().join("store.json");
    let schedule = dir.path().join("schedule.json");
    let report = dir.path().join("issues.csv");
    fs::write(&store, SAMPLE_STORE).unwrap();

    generate(&store, &schedule);

    // retire une entrée : un créneau passe sous l'effectif
    let raw = fs::read_to_string(&schedule).unwrap();
    let mut parsed: serde_json::Value = serde_json::from_str(&raw).unwrap();
    parsed["entries"].as_array_mut().unwrap().pop();
    fs::write(&schedule, serde_json::to_string_pretty(&parsed).unwrap()).unwrap();

    Command::cargo_bin("roulement-cli")
        .unwrap()
        .arg("--data")
        .arg(&store)
        .arg("check")
        .arg("--schedule")
        .arg(&schedule)
        .arg("--report")
        .arg(&report)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("finding"));

    let csv = fs::read_to_string(&report).unwrap();
    assert!(csv.contains("coverage_gap"));
}

#[test]
fn days_lists_the_selected_operating_days() {
    let dir = tempdir().unwrap();
    let store = dir.path().join("store.json");
    fs::write(&store, SAMPLE_STORE).unwrap();

    Command::cargo_bin("roulement-cli")
        .unwrap()
        .arg("--data")
        .arg(&store)
        .arg("days")
        .arg("--month")
        .arg("2025-09")
        .arg("--group")
        .arg("ops")
        .assert()
        .success()
        .stdout(predicate::str::contains("2025-09-01"))
        .stdout(predicate::str::contains("2025-09-29"));
}

#[test]
fn malformed_month_is_rejected() {
    Command::cargo_bin("roulement-cli")
        .unwrap()
        .arg("generate")
        .arg("--month")
        .arg("septembre")
        .arg("--group")
        .arg("ops")
        .assert()
        .failure()
        .stderr(predicate::str::contains("expected YYYY-MM"));
}

fn generate(store: &Path, schedule: &Path) {
    Command::cargo_bin("roulement-cli")
        .unwrap()
        .arg("--data")
        .arg(store)
        .arg("generate")
        .arg("--month")
        .arg("2025-09")
        .arg("--group")
        .arg("ops")
        .arg("--out")
        .arg(schedule)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"stage\": \"validated\""));
}

const SAMPLE_STORE: &str = r#"{
  "employees": [
    {"id": 1, "name": "Alice", "group": "ops"},
    {"id": 2, "name": "Bruno", "group": "ops"},
    {"id": 3, "name": "Chloe", "group": "ops"}
  ],
  "shift_types": [
    {"id": 1, "name": "Matin", "group": "ops", "headcount": 2}
  ],
  "configs": [
    {"group": "ops", "open_days": ["monday"]}
  ],
  "absences": []
}"#;
