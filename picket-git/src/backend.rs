//! The version-control capability surface consumed by the engines.
//!
//! One [`Git`] value serves every repository in a run; each call carries
//! the checkout directory it operates on, so the process working directory
//! is never changed.

use std::fmt;
use std::path::Path;

use crate::error::GitError;

// ---------------------------------------------------------------------------
// Operation outcomes
// ---------------------------------------------------------------------------

/// A sequencer operation git left half-finished in a work tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingOp {
    CherryPick,
    Merge,
    Rebase,
}

impl fmt::Display for PendingOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PendingOp::CherryPick => write!(f, "cherry-pick"),
            PendingOp::Merge => write!(f, "merge"),
            PendingOp::Rebase => write!(f, "rebase"),
        }
    }
}

/// Outcome of cherry-picking `FETCH_HEAD`.
///
/// A conflict is an expected, reportable outcome, not an error; the caller
/// decides whether to abort the half-applied pick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CherryPickOutcome {
    Applied,
    Conflict { files: Vec<String> },
}

// ---------------------------------------------------------------------------
// The Git trait
// ---------------------------------------------------------------------------

/// Everything the apply and reset engines need from version control.
///
/// Implementations: [`GitCli`](crate::GitCli) (real subprocess),
/// [`DryRunGit`](crate::DryRunGit) (journals mutations instead of running
/// them), and [`fakes::FakeGit`](crate::fakes::FakeGit) for tests.
pub trait Git {
    /// `git --version` — availability probe, run before any real work.
    fn version(&self) -> Result<String, GitError>;

    // --- reads -------------------------------------------------------------

    /// Whether `dir` is inside a git work tree.
    fn is_work_tree(&self, dir: &Path) -> bool;

    /// Porcelain status lines; empty means the tree is clean.
    fn status_lines(&self, dir: &Path) -> Result<Vec<String>, GitError>;

    /// Current branch name, `None` when HEAD is detached.
    fn current_branch(&self, dir: &Path) -> Result<Option<String>, GitError>;

    fn branch_exists(&self, dir: &Path, name: &str) -> Result<bool, GitError>;

    /// Short names of all local branches.
    fn local_branches(&self, dir: &Path) -> Result<Vec<String>, GitError>;

    /// A cherry-pick / merge / rebase left in progress, if any.
    fn pending_operation(&self, dir: &Path) -> Result<Option<PendingOp>, GitError>;

    /// Resolve `rev` to a commit id; `None` when it does not exist.
    fn rev_parse(&self, dir: &Path, rev: &str) -> Result<Option<String>, GitError>;

    // --- mutations ---------------------------------------------------------

    fn checkout(&self, dir: &Path, branch: &str) -> Result<(), GitError>;

    /// Create `branch` at HEAD and switch to it (`checkout -b`).
    fn create_branch(&self, dir: &Path, branch: &str) -> Result<(), GitError>;

    /// Force-delete a local branch (`branch -D`).
    fn delete_branch(&self, dir: &Path, branch: &str) -> Result<(), GitError>;

    /// Fetch a single ref from an explicit URL into `FETCH_HEAD`.
    fn fetch_ref(&self, dir: &Path, url: &str, reference: &str) -> Result<(), GitError>;

    /// Fetch a configured remote by name.
    fn fetch_remote(&self, dir: &Path, remote: &str) -> Result<(), GitError>;

    fn cherry_pick_fetch_head(&self, dir: &Path) -> Result<CherryPickOutcome, GitError>;

    /// Abort a half-finished sequencer operation.
    fn abort_operation(&self, dir: &Path, op: PendingOp) -> Result<(), GitError>;

    /// `reset --hard` to `target`, or to HEAD when `None`.
    fn reset_hard(&self, dir: &Path, target: Option<&str>) -> Result<(), GitError>;

    /// Delete untracked files and directories (`clean -fd`).
    fn clean_untracked(&self, dir: &Path) -> Result<(), GitError>;
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_op_display() {
        assert_eq!(PendingOp::CherryPick.to_string(), "cherry-pick");
        assert_eq!(PendingOp::Merge.to_string(), "merge");
        assert_eq!(PendingOp::Rebase.to_string(), "rebase");
    }
}
