//! Plan file loading and validation.
//!
//! # Storage layout
//!
//! ```text
//! ~/.picket/
//!   plan.yaml   (the default plan — overridable with --plan)
//!   logs/       (per-run journals, see `journal`)
//! ```
//!
//! # API pattern
//!
//! Every function touching the filesystem has two forms:
//! - `fn_at(home: &Path, …)` — explicit home; used in tests with `TempDir`
//! - `fn(…)` — derives home from `dirs::home_dir()`, delegates to `_at`
//!
//! Tests must NEVER call the no-arg wrappers; always use `_at`.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::error::PlanError;
use crate::types::PatchPlan;

// ---------------------------------------------------------------------------
// 1. Path helpers
// ---------------------------------------------------------------------------

/// `<home>/.picket/plan.yaml` — pure, no I/O.
pub fn default_plan_path_at(home: &Path) -> PathBuf {
    home.join(".picket").join("plan.yaml")
}

/// Expand a leading `~` or `~/` against `home`. Anything else passes
/// through unchanged (`~user` forms are not supported).
pub fn expand_tilde(path: &Path, home: &Path) -> PathBuf {
    match path.to_str() {
        Some("~") => home.to_path_buf(),
        Some(s) if s.starts_with("~/") => home.join(&s[2..]),
        _ => path.to_path_buf(),
    }
}

// ---------------------------------------------------------------------------
// 2. Load
// ---------------------------------------------------------------------------

/// Load and validate a plan.
///
/// Reads `path_override` when given, `<home>/.picket/plan.yaml` otherwise.
/// Repo paths have `~` expanded against `home` before validation.
///
/// Returns `PlanError::PlanNotFound` if absent,
/// `PlanError::Parse` (with path + line context) if malformed YAML,
/// `PlanError::DuplicateRepoPath` if two entries name the same checkout.
pub fn load_plan_at(home: &Path, path_override: Option<&Path>) -> Result<PatchPlan, PlanError> {
    let path = match path_override {
        Some(p) => p.to_path_buf(),
        None => default_plan_path_at(home),
    };
    if !path.exists() {
        return Err(PlanError::PlanNotFound { path });
    }
    let contents = std::fs::read_to_string(&path)?;
    let mut plan: PatchPlan =
        serde_yaml::from_str(&contents).map_err(|e| PlanError::Parse { path, source: e })?;

    for task in &mut plan.repos {
        task.path = expand_tilde(&task.path, home);
    }
    validate(&plan)?;
    Ok(plan)
}

/// `load_plan_at` convenience wrapper.
pub fn load_plan(path_override: Option<&Path>) -> Result<PatchPlan, PlanError> {
    load_plan_at(&home()?, path_override)
}

// ---------------------------------------------------------------------------
// 3. Task filtering
// ---------------------------------------------------------------------------

/// Narrow a plan to the single repo named by `name`.
///
/// `name` matches either the full configured path or the final path
/// component. Zero matches is `NoSuchRepo`; more than one is
/// `AmbiguousRepo` (disambiguate with the full path).
pub fn select_repo(plan: &PatchPlan, name: &str) -> Result<PatchPlan, PlanError> {
    let wanted = Path::new(name);
    let matches: Vec<_> = plan
        .repos
        .iter()
        .filter(|task| {
            task.path == wanted
                || task
                    .path
                    .file_name()
                    .map(|f| f == wanted.as_os_str())
                    .unwrap_or(false)
        })
        .cloned()
        .collect();

    match matches.len() {
        0 => Err(PlanError::NoSuchRepo {
            name: name.to_owned(),
        }),
        1 => Ok(PatchPlan {
            version: plan.version,
            defaults: plan.defaults.clone(),
            repos: matches,
        }),
        _ => Err(PlanError::AmbiguousRepo {
            name: name.to_owned(),
            matches: matches.into_iter().map(|t| t.path).collect(),
        }),
    }
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

fn home() -> Result<PathBuf, PlanError> {
    dirs::home_dir().ok_or(PlanError::HomeNotFound)
}

fn validate(plan: &PatchPlan) -> Result<(), PlanError> {
    let mut seen = BTreeSet::new();
    for task in &plan.repos {
        if !seen.insert(task.path.clone()) {
            return Err(PlanError::DuplicateRepoPath {
                path: task.path.clone(),
            });
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
