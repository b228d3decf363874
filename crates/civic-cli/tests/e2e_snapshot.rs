//! E2E tests for the `civic` binary over snapshot files.
//!
//! Each test writes a snapshot into an isolated temp directory and runs the
//! binary there, so no user or project config leaks in.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Test Harness
// ---------------------------------------------------------------------------

fn civic_cmd(dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("civic"));
    cmd.current_dir(dir);
    cmd.env("CIVIC_LOG", "error");
    cmd.env_remove("CIVIC_FORMAT");
    cmd.env_remove("CIVIC_PAGE_SIZE");
    cmd.env("XDG_CONFIG_HOME", dir.join("xdg"));
    cmd.env("HOME", dir);
    cmd
}

const SNAPSHOT: &str = r#"{
  "requests": [
    {"id": 1, "document_type": "Barangay Clearance", "purpose": "Employment",
     "status_text": "ready", "created_at": "2025-01-01T10:00",
     "processed_at": "2025-01-01T14:00", "fee": 50, "resident_id": 7,
     "resident_name": "Juan Dela Cruz", "processed_by": "Clerk Reyes"},
    {"id": 2, "document_type": "Barangay Clearance", "purpose": "Loan",
     "status_text": "claimed", "created_at": "2024-06-01 09:00:00",
     "processed_at": "2024-06-03 09:00:00", "resident_id": 7,
     "resident_name": "Juan Dela Cruz"},
    {"id": 3, "document_type": "Cedula", "purpose": "Travel",
     "status_text": "rejected", "remarks": "Blurry ID photo",
     "created_at": "2024-11-02 08:30:00", "resident_id": 8,
     "resident_name": "Ana Santos"},
    {"id": 4, "document_type": "Certificate of Indigency", "purpose": "Scholarship",
     "status_text": "pending", "created_at": "2024-12-20 13:00:00", "resident_id": 8,
     "resident_name": "Ana Santos"}
  ],
  "residents": [
    {"id": 7, "first_name": "Juan", "last_name": "Dela Cruz", "birth_date": "1950-03-04",
     "purok": "Purok 2", "is_active": 1},
    {"id": 8, "first_name": "Ana", "last_name": "Santos", "birth_date": "2001-09-10",
     "purok": "Purok 1", "is_active": "1"},
    {"id": 9, "first_name": "Pedro", "last_name": "Ramos", "birth_date": "1980-01-01",
     "purok": "Purok 2", "is_active": 0}
  ],
  "users": [
    {"id": 1, "username": "admin", "full_name": "Maria Clara", "role": "admin", "is_active": true},
    {"id": 2, "username": "clerk", "full_name": "Jose Rizal", "role": "staff", "is_active": false}
  ]
}"#;

fn project() -> TempDir {
    let dir = TempDir::new().expect("create temp dir");
    fs::write(dir.path().join("snapshot.json"), SNAPSHOT).expect("write snapshot");
    dir
}

fn run_json(dir: &Path, args: &[&str]) -> Value {
    let output = civic_cmd(dir)
        .args(args)
        .arg("--json")
        .output()
        .expect("civic should not crash");
    assert!(
        output.status.success(),
        "civic {args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("--json should produce valid JSON")
}

// ---------------------------------------------------------------------------
// timeline
// ---------------------------------------------------------------------------

#[test]
fn timeline_uses_real_completion_time() {
    let dir = project();
    let json = run_json(dir.path(), &["timeline", "snapshot.json", "1"]);
    let steps = json["steps"].as_array().expect("steps array");
    assert_eq!(steps.len(), 4);
    assert_eq!(steps[0]["status"], "ready");
    assert_eq!(steps[0]["timestamp"], "2025-01-01T14:00:00");
    assert_eq!(steps[0]["is_synthesized"], false);
    assert_eq!(steps[3]["status"], "submitted");
}

#[test]
fn timeline_shows_rejection_reason() {
    let dir = project();
    let json = run_json(dir.path(), &["timeline", "snapshot.json", "3"]);
    assert_eq!(json["status"], "rejected");
    assert_eq!(json["steps"][0]["reason"], "Blurry ID photo");
}

#[test]
fn timeline_unknown_request_fails_with_code() {
    let dir = project();
    civic_cmd(dir.path())
        .args(["timeline", "snapshot.json", "99", "--json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("E2001"));
}

#[test]
fn timeline_pretty_marks_approximate_times() {
    let dir = project();
    civic_cmd(dir.path())
        .args(["--format", "pretty", "timeline", "snapshot.json", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Ready for Pickup"))
        .stdout(predicate::str::contains("(approx.)"))
        .stdout(predicate::str::contains("Handled by"));
}

// ---------------------------------------------------------------------------
// groups
// ---------------------------------------------------------------------------

#[test]
fn groups_for_one_resident() {
    let dir = project();
    let json = run_json(dir.path(), &["groups", "snapshot.json", "--resident", "7"]);
    let groups = json.as_array().expect("groups array");
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0]["document_type"], "Barangay Clearance");
    assert_eq!(groups[0]["active_id"], 1);
    assert_eq!(groups[0]["request_ids"], serde_json::json!([1, 2]));
}

#[test]
fn groups_put_open_requests_first() {
    let dir = project();
    let json = run_json(dir.path(), &["groups", "snapshot.json", "--history"]);
    let names: Vec<&str> = json
        .as_array()
        .expect("groups array")
        .iter()
        .filter_map(|g| g["document_type"].as_str())
        .collect();
    assert_eq!(names, vec!["Barangay Clearance", "Certificate of Indigency", "Cedula"]);
    assert!(json[0]["history"].is_array());
}

// ---------------------------------------------------------------------------
// list
// ---------------------------------------------------------------------------

#[test]
fn list_requests_newest_first_with_filter() {
    let dir = project();
    let json = run_json(dir.path(), &["list", "requests", "snapshot.json"]);
    let ids: Vec<u64> = json["items"]
        .as_array()
        .expect("items")
        .iter()
        .filter_map(|r| r["id"].as_u64())
        .collect();
    assert_eq!(ids, vec![1, 4, 3, 2]);

    let json = run_json(
        dir.path(),
        &["list", "requests", "snapshot.json", "--filter", "status=completed"],
    );
    assert_eq!(json["total_count"], 1);
    assert_eq!(json["items"][0]["id"], 2);
}

#[test]
fn list_residents_defaults_to_active() {
    let dir = project();
    let json = run_json(
        dir.path(),
        &["list", "residents", "snapshot.json", "--as-of", "2025-01-01"],
    );
    assert_eq!(json["total_count"], 2);
    assert_eq!(json["page_size"], 25);

    let json = run_json(
        dir.path(),
        &[
            "list",
            "residents",
            "snapshot.json",
            "--as-of",
            "2025-01-01",
            "--filter",
            "age_bracket=senior",
        ],
    );
    assert_eq!(json["total_count"], 1);
    assert_eq!(json["items"][0]["id"], 7);
}

#[test]
fn list_users_text_output() {
    let dir = project();
    civic_cmd(dir.path())
        .args(["--format", "text", "list", "users", "snapshot.json", "-f", "status=inactive"])
        .assert()
        .success()
        .stdout(predicate::str::contains("USERNAME"))
        .stdout(predicate::str::contains("clerk"))
        .stdout(predicate::str::contains("admin\t").not());
}

#[test]
fn list_rejects_unknown_sort_and_page_size() {
    let dir = project();
    civic_cmd(dir.path())
        .args(["list", "requests", "snapshot.json", "--sort", "salary", "--json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("E3001"));

    civic_cmd(dir.path())
        .args(["list", "requests", "snapshot.json", "--page-size", "7"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("E3003"));
}

#[test]
fn page_size_comes_from_project_config() {
    let dir = project();
    fs::create_dir_all(dir.path().join(".civic")).expect("create .civic");
    fs::write(
        dir.path().join(".civic/config.toml"),
        "[query]\ndefault_page_size = 2\n",
    )
    .expect("write config");

    let json = run_json(dir.path(), &["list", "requests", "snapshot.json", "--page", "9"]);
    assert_eq!(json["page_size"], 2);
    assert_eq!(json["total_pages"], 2);
    assert_eq!(json["current_page"], 2);
}

// ---------------------------------------------------------------------------
// status and errors
// ---------------------------------------------------------------------------

#[test]
fn status_aliases_and_unknowns() {
    let dir = project();
    let json = run_json(dir.path(), &["status", "claimed"]);
    assert_eq!(json["status"], "completed");
    assert_eq!(json["terminal"], true);
    assert_eq!(json["next"], serde_json::json!([]));

    let json = run_json(dir.path(), &["status", "awaiting signature"]);
    assert!(json["status"].is_null());
    assert_eq!(json["label"], "Pending Review");

    civic_cmd(dir.path())
        .args(["status", "awaiting signature", "--strict"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("E2004"));
}

#[test]
fn malformed_snapshot_reports_parse_error() {
    let dir = project();
    fs::write(dir.path().join("broken.json"), "{ not json").expect("write broken");
    civic_cmd(dir.path())
        .args(["list", "requests", "broken.json", "--json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("E1002"));
}

#[test]
fn null_fields_and_api_timestamps_keep_the_snapshot() {
    let dir = project();
    fs::write(
        dir.path().join("loose.json"),
        r#"{
          "requests": [
            {"id": 11, "document_type": "Cedula", "purpose": null, "status_text": null,
             "created_at": "2025-02-01 08:00:00", "resident_name": null},
            {"id": 12, "document_type": null, "created_at": null}
          ],
          "residents": [
            {"id": "21", "first_name": "Rosa", "last_name": null,
             "birth_date": "1958-05-05 00:00:00", "registered_at": "2024-03-01 09:00:00",
             "is_active": 1}
          ]
        }"#,
    )
    .expect("write loose snapshot");

    let requests = run_json(dir.path(), &["list", "requests", "loose.json"]);
    assert_eq!(requests["total_count"], 1);
    assert_eq!(requests["items"][0]["id"], 11);
    assert_eq!(requests["items"][0]["status"], "pending");

    let residents = run_json(
        dir.path(),
        &["list", "residents", "loose.json", "--as-of", "2025-01-01"],
    );
    assert_eq!(residents["total_count"], 1);
    assert_eq!(residents["items"][0]["id"], 21);
}
