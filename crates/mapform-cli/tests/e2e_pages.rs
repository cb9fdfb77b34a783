//! E2E page ordering tests: append positions, reorder persistence across
//! process restarts, the last-page guard, and partial edits.

use assert_cmd::Command;
use serde_json::Value;
use std::path::Path;
use tempfile::TempDir;

fn mf_cmd(dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("mf"));
    cmd.current_dir(dir);
    cmd.env("MAPFORM_LOG", "error");
    cmd
}

/// Initialize a workspace and one project; returns (project_id, seeded page id).
fn setup_project(dir: &Path) -> (i64, i64) {
    mf_cmd(dir).args(["init"]).assert().success();
    let output = mf_cmd(dir)
        .args(["project", "create", "--name", "Demo", "--json"])
        .output()
        .expect("project create");
    assert!(output.status.success());
    let json: Value = serde_json::from_slice(&output.stdout).expect("valid JSON");
    (
        json["id"].as_i64().expect("id"),
        json["first_page_id"].as_i64().expect("first_page_id"),
    )
}

/// Append a page and return its id.
fn add_page(dir: &Path, project_id: i64, title: &str) -> i64 {
    let output = mf_cmd(dir)
        .args([
            "page",
            "add",
            "--project",
            &project_id.to_string(),
            "--title",
            title,
            "--json",
        ])
        .output()
        .expect("page add");
    assert!(
        output.status.success(),
        "page add failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let json: Value = serde_json::from_slice(&output.stdout).expect("valid JSON");
    json["id"].as_i64().expect("id")
}

/// List pages and return (id, position, title) triples in listing order.
fn list_pages(dir: &Path, project_id: i64) -> Vec<(i64, i64, String)> {
    let output = mf_cmd(dir)
        .args(["page", "list", "--project", &project_id.to_string(), "--json"])
        .output()
        .expect("page list");
    assert!(output.status.success());
    let pages: Vec<Value> = serde_json::from_slice(&output.stdout).expect("valid JSON array");
    pages
        .iter()
        .map(|p| {
            (
                p["id"].as_i64().expect("id"),
                p["position"].as_i64().expect("position"),
                p["title"].as_str().expect("title").to_string(),
            )
        })
        .collect()
}

#[test]
fn pages_append_with_sequential_positions() {
    let dir = TempDir::new().expect("temp dir");
    let (project_id, seeded) = setup_project(dir.path());

    let second = add_page(dir.path(), project_id, "Second");
    let third = add_page(dir.path(), project_id, "Third");

    let pages = list_pages(dir.path(), project_id);
    let ids: Vec<i64> = pages.iter().map(|(id, _, _)| *id).collect();
    assert_eq!(ids, vec![seeded, second, third]);
    let positions: Vec<i64> = pages.iter().map(|(_, pos, _)| *pos).collect();
    assert_eq!(positions, vec![0, 1, 2]);
}

#[test]
fn reorder_persists_across_process_restarts() {
    let dir = TempDir::new().expect("temp dir");
    let (project_id, p1) = setup_project(dir.path());
    let p2 = add_page(dir.path(), project_id, "P2");
    let p3 = add_page(dir.path(), project_id, "P3");

    // move P3 to the front (the drag-P3-onto-P1 outcome)
    mf_cmd(dir.path())
        .args(["page", "move", &p3.to_string(), "--to", "0"])
        .assert()
        .success();

    // a fresh process reads the store cold: positions must be rewritten
    let pages = list_pages(dir.path(), project_id);
    let ids: Vec<i64> = pages.iter().map(|(id, _, _)| *id).collect();
    assert_eq!(ids, vec![p3, p1, p2]);
    let positions: Vec<i64> = pages.iter().map(|(_, pos, _)| *pos).collect();
    assert_eq!(positions, vec![0, 1, 2]);
}

#[test]
fn move_clamps_out_of_range_targets() {
    let dir = TempDir::new().expect("temp dir");
    let (project_id, p1) = setup_project(dir.path());
    let p2 = add_page(dir.path(), project_id, "P2");

    mf_cmd(dir.path())
        .args(["page", "move", &p1.to_string(), "--to", "99"])
        .assert()
        .success();

    let pages = list_pages(dir.path(), project_id);
    let ids: Vec<i64> = pages.iter().map(|(id, _, _)| *id).collect();
    assert_eq!(ids, vec![p2, p1]);
}

#[test]
fn deleting_the_last_page_is_rejected() {
    let dir = TempDir::new().expect("temp dir");
    let (project_id, seeded) = setup_project(dir.path());

    mf_cmd(dir.path())
        .args(["page", "remove", &seeded.to_string()])
        .assert()
        .failure()
        .stderr(predicates::str::contains("E2006"));

    // the page is still there
    assert_eq!(list_pages(dir.path(), project_id).len(), 1);

    // with a sibling present the delete goes through
    let second = add_page(dir.path(), project_id, "Second");
    mf_cmd(dir.path())
        .args(["page", "remove", &seeded.to_string()])
        .assert()
        .success();
    let pages = list_pages(dir.path(), project_id);
    assert_eq!(pages.len(), 1);
    assert_eq!(pages[0].0, second);
}

#[test]
fn rename_merges_without_touching_viewport() {
    let dir = TempDir::new().expect("temp dir");
    let (project_id, _) = setup_project(dir.path());
    let page = add_page(dir.path(), project_id, "Before");

    mf_cmd(dir.path())
        .args([
            "page",
            "recenter",
            &page.to_string(),
            "--lng",
            "-73.98",
            "--lat",
            "40.75",
            "--zoom",
            "11",
        ])
        .assert()
        .success();

    mf_cmd(dir.path())
        .args(["page", "rename", &page.to_string(), "--title", "After"])
        .assert()
        .success();

    let output = mf_cmd(dir.path())
        .args(["page", "show", &page.to_string(), "--json"])
        .output()
        .expect("page show");
    assert!(output.status.success());
    let json: Value = serde_json::from_slice(&output.stdout).expect("valid JSON");
    assert_eq!(json["title"], "After");
    assert_eq!(json["center_lng"].as_f64(), Some(-73.98));
    assert_eq!(json["center_lat"].as_f64(), Some(40.75));
    assert_eq!(json["zoom"].as_f64(), Some(11.0));
}

#[test]
fn blank_titles_are_rejected_by_the_store() {
    let dir = TempDir::new().expect("temp dir");
    let (project_id, _) = setup_project(dir.path());

    mf_cmd(dir.path())
        .args([
            "page",
            "add",
            "--project",
            &project_id.to_string(),
            "--title",
            "   ",
        ])
        .assert()
        .failure();
}
