//! Plan-file error-message and validation integration tests.
//! Storage layout under test: ~/.picket/plan.yaml (+ --plan overrides).

use assert_fs::prelude::*;
use picket_core::{plan, PlanError};
use predicates::prelude::predicate;
use std::fs;

fn seed_plan(home: &assert_fs::TempDir, contents: &str) {
    let dir = home.path().join(".picket");
    fs::create_dir_all(&dir).expect("mkdir .picket");
    fs::write(dir.join("plan.yaml"), contents).expect("write plan");
}

const GOOD_PLAN: &str = "\
version: 1
defaults:
  host: gerrit.example.com
  port: 29418
  user: jenkins
repos:
  - path: ~/src/widget
    project: tools/widget
    changes: [850035]
";

// ---------------------------------------------------------------------------
// 1. Load error messages
// ---------------------------------------------------------------------------

#[test]
fn load_missing_plan_reports_expected_path() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    let err = plan::load_plan_at(home.path(), None).unwrap_err();
    assert!(matches!(err, PlanError::PlanNotFound { .. }), "got: {err}");
    assert!(err.to_string().contains("plan not found"));
    assert!(err.to_string().contains("plan.yaml"));
}

#[test]
fn load_corrupt_yaml_returns_parse_error_with_path() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    seed_plan(&home, ": : corrupt : yaml : !!!\n  - broken: [unclosed");

    let err = plan::load_plan_at(home.path(), None).unwrap_err();
    assert!(matches!(err, PlanError::Parse { .. }), "got: {err}");
    let msg = err.to_string();
    assert!(msg.contains("plan.yaml"), "must contain file path, got: {msg}");
    let source_msg = match &err {
        PlanError::Parse { source, .. } => source.to_string(),
        _ => unreachable!(),
    };
    assert!(!source_msg.is_empty(), "serde_yaml must provide error context");
}

#[test]
fn load_wrong_type_yaml_returns_parse_error() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    seed_plan(&home, "- this is a list, not a mapping\n");

    let err = plan::load_plan_at(home.path(), None).unwrap_err();
    assert!(matches!(err, PlanError::Parse { .. }), "got: {err}");
}

#[test]
fn missing_host_is_a_parse_error() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    seed_plan(&home, "version: 1\ndefaults:\n  port: 29418\nrepos: []\n");

    let err = plan::load_plan_at(home.path(), None).unwrap_err();
    assert!(matches!(err, PlanError::Parse { .. }), "got: {err}");
    assert!(err.to_string().contains("host"), "got: {err}");
}

// ---------------------------------------------------------------------------
// 2. Validation
// ---------------------------------------------------------------------------

#[test]
fn duplicate_paths_surface_the_offending_path() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    seed_plan(
        &home,
        "\
version: 1
defaults:
  host: gerrit.example.com
repos:
  - path: /srv/checkouts/widget
    project: a
  - path: /srv/checkouts/widget
    project: b
",
    );

    let err = plan::load_plan_at(home.path(), None).unwrap_err();
    assert!(matches!(err, PlanError::DuplicateRepoPath { .. }), "got: {err}");
    assert!(err.to_string().contains("/srv/checkouts/widget"));
}

#[test]
fn tilde_paths_count_as_duplicates_of_their_expansion() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    let expanded = home.path().join("src/widget").display().to_string();
    seed_plan(
        &home,
        &format!(
            "\
version: 1
defaults:
  host: gerrit.example.com
repos:
  - path: ~/src/widget
    project: a
  - path: {expanded}
    project: b
"
        ),
    );

    let err = plan::load_plan_at(home.path(), None).unwrap_err();
    assert!(matches!(err, PlanError::DuplicateRepoPath { .. }), "got: {err}");
}

// ---------------------------------------------------------------------------
// 3. Override path and filter errors
// ---------------------------------------------------------------------------

#[test]
fn override_path_is_used_verbatim() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    let custom = home.child("elsewhere/my-plan.yaml");
    custom.write_str(GOOD_PLAN).expect("write custom plan");
    custom.assert(predicate::path::exists());

    let plan = plan::load_plan_at(home.path(), Some(custom.path())).expect("load");
    assert_eq!(plan.repos.len(), 1);
    // Tilde expansion still anchors to home, not to the plan file location.
    assert_eq!(plan.repos[0].path, home.path().join("src/widget"));
}

#[test]
fn repo_filter_errors_name_the_filter() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    seed_plan(&home, GOOD_PLAN);
    let loaded = plan::load_plan_at(home.path(), None).expect("load");

    let err = plan::select_repo(&loaded, "gadget").unwrap_err();
    assert!(matches!(err, PlanError::NoSuchRepo { .. }));
    assert!(err.to_string().contains("gadget"));
}
