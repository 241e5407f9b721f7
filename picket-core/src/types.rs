//! Domain types for picket plans and run reporting.
//!
//! All path fields use `PathBuf`; never `&str` or `String` for filesystem paths.
//! Plan types are serializable/deserializable via serde + serde_yaml.

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// An opaque review-change identifier as written in a plan file.
///
/// Gerrit change ids are numeric, but plans (and Gerrit's own JSON) carry
/// them both quoted and bare, so deserialization accepts either form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ChangeId(pub String);

impl fmt::Display for ChangeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for ChangeId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ChangeId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<u64> for ChangeId {
    fn from(n: u64) -> Self {
        Self(n.to_string())
    }
}

impl<'de> Deserialize<'de> for ChangeId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(u64),
            Text(String),
        }
        Ok(match Raw::deserialize(deserializer)? {
            Raw::Number(n) => ChangeId(n.to_string()),
            Raw::Text(s) => ChangeId(s),
        })
    }
}

// ---------------------------------------------------------------------------
// Plan types
// ---------------------------------------------------------------------------

/// Backend and branching defaults shared by every task in a plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanDefaults {
    /// Review backend host (SSH).
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// SSH user for query and fetch; `None` lets ssh pick the current user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    /// Working branch created before applying; `None` uses the built-in name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    #[serde(default = "default_trunk")]
    pub trunk: String,
    #[serde(default = "default_remote")]
    pub remote: String,
}

pub(crate) fn default_port() -> u16 {
    29418
}

pub(crate) fn default_trunk() -> String {
    "master".to_owned()
}

pub(crate) fn default_remote() -> String {
    "origin".to_owned()
}

/// One repository entry in a plan: where it lives, what the backend calls
/// it, and which changes to apply there, in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoTask {
    /// Local checkout root on disk.
    pub path: PathBuf,
    /// Project name on the review backend (the fetch endpoint path).
    pub project: String,
    /// Changes to apply, in apply order. Empty is a valid no-op.
    #[serde(default)]
    pub changes: Vec<ChangeId>,
}

/// Root of the picket YAML plan. Task order is execution order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchPlan {
    pub version: u32,
    pub defaults: PlanDefaults,
    #[serde(default)]
    pub repos: Vec<RepoTask>,
}

impl PatchPlan {
    /// Total number of changes queued across every task.
    pub fn queued_changes(&self) -> usize {
        self.repos.iter().map(|t| t.changes.len()).sum()
    }
}

// ---------------------------------------------------------------------------
// Observed workspace state
// ---------------------------------------------------------------------------

/// A point-in-time observation of one local checkout. Never cached across
/// mutations; re-observe after anything that touches the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceState {
    pub path: PathBuf,
    /// Current branch name, `None` when HEAD is detached.
    pub branch: Option<String>,
    pub clean: bool,
    pub is_repo: bool,
}

// ---------------------------------------------------------------------------
// Run reporting
// ---------------------------------------------------------------------------

/// Why a task was skipped without touching the repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The configured path does not exist.
    Missing,
    /// The path exists but is not inside a git work tree.
    NotARepo,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Missing => write!(f, "directory missing"),
            SkipReason::NotARepo => write!(f, "not a git repository"),
        }
    }
}

/// The stage at which a single change failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeFailureKind {
    Resolution,
    Fetch,
    Conflict,
    Apply,
}

impl fmt::Display for ChangeFailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeFailureKind::Resolution => write!(f, "resolution"),
            ChangeFailureKind::Fetch => write!(f, "fetch"),
            ChangeFailureKind::Conflict => write!(f, "conflict"),
            ChangeFailureKind::Apply => write!(f, "apply"),
        }
    }
}

/// One change that could not be applied, with the stage and detail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeFailure {
    pub id: ChangeId,
    pub kind: ChangeFailureKind,
    pub detail: String,
    /// Conflicting paths, populated for [`ChangeFailureKind::Conflict`] only.
    pub files: Vec<String>,
}

/// Why a whole task failed (as opposed to individual changes within it).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskFailure {
    /// Uncommitted local changes; nothing was fetched or applied.
    Dirty { lines: Vec<String> },
    /// The working branch could not be established.
    Branch { detail: String },
    /// A repository-level git operation failed outside the per-change loop.
    Repo { detail: String },
    /// One or more queued changes failed; see the per-change failures.
    Changes,
}

impl fmt::Display for TaskFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskFailure::Dirty { lines } => {
                write!(f, "working tree has {} uncommitted change(s)", lines.len())
            }
            TaskFailure::Branch { detail } => write!(f, "branch setup failed: {detail}"),
            TaskFailure::Repo { detail } => write!(f, "git operation failed: {detail}"),
            TaskFailure::Changes => write!(f, "one or more changes failed"),
        }
    }
}

/// Terminal outcome of one task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    Succeeded,
    Failed { reason: TaskFailure },
    Skipped { reason: SkipReason },
}

/// Per-task report. Every task in the executed plan produces exactly one,
/// whatever happened to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskReport {
    pub path: PathBuf,
    pub project: String,
    pub outcome: TaskOutcome,
    /// Changes applied (or, in a dry run, that would have been applied).
    pub applied: Vec<ResolvedChange>,
    pub failed: Vec<ChangeFailure>,
}

impl TaskReport {
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, TaskOutcome::Succeeded)
    }

    pub fn is_skip(&self) -> bool {
        matches!(self.outcome, TaskOutcome::Skipped { .. })
    }

    pub fn is_failure(&self) -> bool {
        matches!(self.outcome, TaskOutcome::Failed { .. })
    }
}

/// Aggregated outcome of an apply or reset run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunResult {
    pub dry_run: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub tasks: Vec<TaskReport>,
}

impl RunResult {
    pub fn succeeded_tasks(&self) -> usize {
        self.tasks.iter().filter(|t| t.is_success()).count()
    }

    pub fn failed_tasks(&self) -> usize {
        self.tasks.iter().filter(|t| t.is_failure()).count()
    }

    pub fn skipped_tasks(&self) -> usize {
        self.tasks.iter().filter(|t| t.is_skip()).count()
    }

    pub fn applied_changes(&self) -> usize {
        self.tasks.iter().map(|t| t.applied.len()).sum()
    }

    pub fn failed_changes(&self) -> usize {
        self.tasks.iter().map(|t| t.failed.len()).sum()
    }

    /// True only when no task failed. Skips do not count against success.
    pub fn is_success(&self) -> bool {
        self.failed_tasks() == 0
    }
}

// ---------------------------------------------------------------------------
// Resolved changes
// ---------------------------------------------------------------------------

/// A change id resolved against the backend: its number, current patchset,
/// and the exact reference to fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedChange {
    pub id: ChangeId,
    pub number: u64,
    pub patchset: u32,
    /// `refs/changes/<shard>/<number>/<patchset>`.
    pub fetch_ref: String,
}

impl fmt::Display for ResolvedChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{} ({})", self.number, self.patchset, self.fetch_ref)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
