//! E2E workspace and project lifecycle tests.
//!
//! Each test runs `mf` as a subprocess in an isolated temp directory.

use assert_cmd::Command;
use serde_json::Value;
use std::path::Path;
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Test Harness
// ---------------------------------------------------------------------------

/// Build a Command targeting the mf binary, rooted in `dir`.
fn mf_cmd(dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("mf"));
    cmd.current_dir(dir);
    // Suppress tracing output that goes to stderr
    cmd.env("MAPFORM_LOG", "error");
    cmd
}

/// Initialize a workspace in `dir`.
fn init_workspace(dir: &Path) {
    mf_cmd(dir).args(["init"]).assert().success();
}

/// Create a project via CLI, return (project_id, first_page_id).
fn create_project(dir: &Path, name: &str) -> (i64, i64) {
    let output = mf_cmd(dir)
        .args(["project", "create", "--name", name, "--json"])
        .output()
        .expect("project create should not crash");
    assert!(
        output.status.success(),
        "project create failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let json: Value = serde_json::from_slice(&output.stdout)
        .expect("project create --json should produce valid JSON");
    (
        json["id"].as_i64().expect("id field"),
        json["first_page_id"].as_i64().expect("first_page_id field"),
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[test]
fn init_creates_store_and_reports_workspace() {
    let dir = TempDir::new().expect("temp dir");

    let output = mf_cmd(dir.path())
        .args(["init", "--name", "Acme Maps", "--json"])
        .output()
        .expect("init should not crash");
    assert!(output.status.success());

    let json: Value = serde_json::from_slice(&output.stdout).expect("valid JSON");
    assert_eq!(json["name"], "Acme Maps");
    assert!(json["workspace_id"].as_i64().is_some());

    assert!(dir.path().join(".mapform/store.sqlite3").exists());
    assert!(dir.path().join(".mapform/config.toml").exists());
}

#[test]
fn init_twice_fails() {
    let dir = TempDir::new().expect("temp dir");
    init_workspace(dir.path());

    mf_cmd(dir.path())
        .args(["init"])
        .assert()
        .failure()
        .stderr(predicates::str::contains("already initialized"));
}

#[test]
fn commands_require_init() {
    let dir = TempDir::new().expect("temp dir");

    mf_cmd(dir.path())
        .args(["project", "list"])
        .assert()
        .failure()
        .stderr(predicates::str::contains("not initialized"));
}

#[test]
fn project_create_seeds_first_page() {
    let dir = TempDir::new().expect("temp dir");
    init_workspace(dir.path());

    let (project_id, first_page_id) = create_project(dir.path(), "Field Survey");

    let output = mf_cmd(dir.path())
        .args(["page", "list", "--project", &project_id.to_string(), "--json"])
        .output()
        .expect("page list should not crash");
    assert!(output.status.success());
    let pages: Vec<Value> = serde_json::from_slice(&output.stdout).expect("valid JSON array");
    assert_eq!(pages.len(), 1);
    assert_eq!(pages[0]["id"].as_i64(), Some(first_page_id));
    assert_eq!(pages[0]["position"].as_i64(), Some(0));
    assert_eq!(pages[0]["title"], "Untitled");
}

#[test]
fn project_list_rename_delete_round_trip() {
    let dir = TempDir::new().expect("temp dir");
    init_workspace(dir.path());
    let (project_id, _) = create_project(dir.path(), "Before");

    let output = mf_cmd(dir.path())
        .args(["project", "list", "--json"])
        .output()
        .expect("list");
    let projects: Vec<Value> = serde_json::from_slice(&output.stdout).expect("valid JSON array");
    assert_eq!(projects.len(), 1);
    assert_eq!(projects[0]["name"], "Before");

    mf_cmd(dir.path())
        .args([
            "project",
            "rename",
            &project_id.to_string(),
            "--name",
            "After",
        ])
        .assert()
        .success();

    let output = mf_cmd(dir.path())
        .args(["project", "list", "--json"])
        .output()
        .expect("list");
    let projects: Vec<Value> = serde_json::from_slice(&output.stdout).expect("valid JSON array");
    assert_eq!(projects[0]["name"], "After");

    mf_cmd(dir.path())
        .args(["project", "delete", &project_id.to_string()])
        .assert()
        .success();

    let output = mf_cmd(dir.path())
        .args(["project", "list", "--json"])
        .output()
        .expect("list");
    let projects: Vec<Value> = serde_json::from_slice(&output.stdout).expect("valid JSON array");
    assert!(projects.is_empty());
}

#[test]
fn unknown_project_is_a_clean_error() {
    let dir = TempDir::new().expect("temp dir");
    init_workspace(dir.path());

    mf_cmd(dir.path())
        .args(["project", "rename", "42", "--name", "Nope"])
        .assert()
        .failure()
        .stderr(predicates::str::contains("not found"));
}
