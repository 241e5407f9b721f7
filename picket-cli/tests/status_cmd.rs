//! End-to-end tests for `picket status` table and JSON output.

use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::Path;
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::str::contains;
use tempfile::TempDir;

fn picket_cmd(home: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("picket"));
    cmd.env("HOME", home).env("USERPROFILE", home);
    cmd
}

fn run_git(dir: &Path, args: &[&str]) {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
}

fn make_repo(dir: &Path) {
    fs::create_dir_all(dir).unwrap();
    run_git(dir, &["init"]);
    run_git(dir, &["config", "user.name", "test-user"]);
    run_git(dir, &["config", "user.email", "test@example.com"]);
    fs::write(dir.join("greeting.txt"), "hello\n").unwrap();
    run_git(dir, &["add", "."]);
    run_git(dir, &["commit", "-m", "initial"]);
    run_git(dir, &["branch", "-M", "master"]);
}

fn write_plan(home: &Path, contents: &str) {
    let dir = home.join(".picket");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("plan.yaml"), contents).unwrap();
}

/// Plan over three checkouts: one clean, one with an untracked file, one
/// whose directory does not exist.
fn seed_world(home: &TempDir, world: &TempDir) {
    let clean = world.path().join("clean_api");
    let dirty = world.path().join("dirty_api");
    make_repo(&clean);
    make_repo(&dirty);
    fs::write(dirty.join("leftover.txt"), "wip\n").unwrap();

    write_plan(
        home.path(),
        &format!(
            "\
version: 1
defaults:
  host: gerrit.example.com
repos:
  - path: {}
    project: tools/clean
    changes: [850035]
  - path: {}
    project: tools/dirty
  - path: {}
    project: tools/gone
",
            clean.display(),
            dirty.display(),
            world.path().join("gone_api").display()
        ),
    );
}

#[test]
fn status_json_reports_schema_states_and_counts() {
    let home = TempDir::new().unwrap();
    let world = TempDir::new().unwrap();
    seed_world(&home, &world);

    let assert = picket_cmd(home.path())
        .args(["status", "--json"])
        .assert()
        .success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).expect("stdout utf8");
    let payload: serde_json::Value = serde_json::from_str(&stdout).expect("parse status json");

    let top_keys: BTreeSet<String> = payload
        .as_object()
        .expect("status root object")
        .keys()
        .cloned()
        .collect();
    let expected_top: BTreeSet<String> = ["summary", "repos"]
        .into_iter()
        .map(str::to_string)
        .collect();
    assert_eq!(top_keys, expected_top, "status root schema changed");

    let summary = payload["summary"].as_object().expect("summary object");
    let summary_keys: BTreeSet<String> = summary.keys().cloned().collect();
    let expected_summary: BTreeSet<String> =
        ["host", "repos", "queued_changes", "needs_attention"]
            .into_iter()
            .map(str::to_string)
            .collect();
    assert_eq!(summary_keys, expected_summary, "summary schema changed");
    assert_eq!(payload["summary"]["host"], "gerrit.example.com");
    assert_eq!(payload["summary"]["repos"], 3);
    assert_eq!(payload["summary"]["queued_changes"], 1);
    assert_eq!(payload["summary"]["needs_attention"], 2);

    let rows = payload["repos"].as_array().expect("repos array");
    assert_eq!(rows.len(), 3, "expected every plan entry in status output");

    let expected_row_fields: BTreeSet<String> = [
        "path", "project", "state", "detail", "branch", "clean", "pending", "queued",
    ]
    .into_iter()
    .map(str::to_string)
    .collect();

    let mut by_project = HashMap::new();
    for row in rows {
        let object = row.as_object().expect("row object");
        let keys: BTreeSet<String> = object.keys().cloned().collect();
        assert_eq!(keys, expected_row_fields, "repo row schema changed");

        let project = row["project"].as_str().expect("project").to_string();
        by_project.insert(project, row.clone());
    }

    let clean = &by_project["tools/clean"];
    assert_eq!(clean["state"], "clean");
    assert_eq!(clean["branch"], "master");
    assert_eq!(clean["queued"], 1);
    assert_eq!(clean["pending"], serde_json::Value::Null);

    assert_eq!(by_project["tools/dirty"]["state"], "dirty");
    assert_eq!(by_project["tools/gone"]["state"], "missing");
    assert_eq!(
        by_project["tools/gone"]["branch"],
        serde_json::Value::Null
    );
}

#[test]
fn status_table_lists_every_repo_with_indicators() {
    let home = TempDir::new().unwrap();
    let world = TempDir::new().unwrap();
    seed_world(&home, &world);

    picket_cmd(home.path())
        .arg("status")
        .assert()
        .success()
        .stdout(contains("Picket v"))
        .stdout(contains("gerrit.example.com"))
        .stdout(contains("3 repo(s)"))
        .stdout(contains("2 need attention"))
        .stdout(contains("clean_api"))
        .stdout(contains("dirty_api"))
        .stdout(contains("MISSING"))
        .stdout(contains("picket reset"));
}

#[test]
fn repo_filter_narrows_the_survey() {
    let home = TempDir::new().unwrap();
    let world = TempDir::new().unwrap();
    seed_world(&home, &world);

    let assert = picket_cmd(home.path())
        .args(["status", "--json", "--repo", "clean_api"])
        .assert()
        .success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).expect("stdout utf8");
    let payload: serde_json::Value = serde_json::from_str(&stdout).expect("parse status json");

    let rows = payload["repos"].as_array().expect("repos array");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["project"], "tools/clean");
}

#[test]
fn explicit_plan_path_overrides_the_default_location() {
    let home = TempDir::new().unwrap();
    let world = TempDir::new().unwrap();
    let ws = world.path().join("solo");
    make_repo(&ws);

    let plan_path = world.path().join("other-plan.yaml");
    fs::write(
        &plan_path,
        format!(
            "\
version: 1
defaults:
  host: review.example.org
repos:
  - path: {}
    project: tools/solo
",
            ws.display()
        ),
    )
    .unwrap();

    picket_cmd(home.path())
        .args(["status", "--plan", plan_path.to_str().unwrap()])
        .assert()
        .success()
        .stdout(contains("review.example.org"))
        .stdout(contains("solo"));
}
