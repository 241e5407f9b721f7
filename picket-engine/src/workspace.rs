//! One local checkout under orchestration.
//!
//! [`Workspace::open`] classifies a plan path — missing, not a repository,
//! or usable — and the instance methods are the apply-side operations.
//! Reset sequencing lives in [`crate::reset`] and reuses the same handle.

use std::path::{Path, PathBuf};

use picket_core::{BranchPolicy, ResolvedChange, RunJournal, SkipReason, WorkspaceState};
use picket_git::{CherryPickOutcome, Git};

use crate::error::TaskError;

/// Why one change failed to apply. Fetch and conflict are distinct so the
/// report can say which phase went wrong.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyFailure {
    Fetch { detail: String },
    Conflict { files: Vec<String> },
    Pick { detail: String },
}

pub struct Workspace<'a> {
    pub(crate) path: PathBuf,
    pub(crate) git: &'a dyn Git,
}

impl<'a> Workspace<'a> {
    /// Classify and open a plan path. Missing directories and non-repos
    /// are soft failures the caller records as skips.
    pub fn open(path: &Path, git: &'a dyn Git) -> Result<Workspace<'a>, SkipReason> {
        if !path.exists() {
            return Err(SkipReason::Missing);
        }
        if !git.is_work_tree(path) {
            return Err(SkipReason::NotARepo);
        }
        Ok(Workspace {
            path: path.to_path_buf(),
            git,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Point-in-time view of branch and cleanliness.
    pub fn observe(&self) -> Result<WorkspaceState, TaskError> {
        let branch = self.git.current_branch(&self.path)?;
        let dirty = self.git.status_lines(&self.path)?;
        Ok(WorkspaceState {
            path: self.path.clone(),
            branch,
            clean: dirty.is_empty(),
            is_repo: true,
        })
    }

    /// Refuse to continue when uncommitted or staged changes exist.
    pub fn assert_clean(&self) -> Result<(), TaskError> {
        let lines = self.git.status_lines(&self.path)?;
        if lines.is_empty() {
            Ok(())
        } else {
            Err(TaskError::Dirty { lines })
        }
    }

    /// Establish the working branch per policy. An existing branch is
    /// switched onto with a warning, never deleted or recreated.
    pub fn ensure_branch(
        &self,
        policy: &BranchPolicy,
        journal: &RunJournal,
    ) -> Result<(), TaskError> {
        let BranchPolicy::Create { name } = policy else {
            return Ok(());
        };

        let current = self
            .git
            .current_branch(&self.path)
            .map_err(TaskError::branch)?;
        if current.as_deref() == Some(name.as_str()) {
            journal.info(format!("{}: already on branch '{name}'", self.path.display()));
            return Ok(());
        }

        let exists = self
            .git
            .branch_exists(&self.path, name)
            .map_err(TaskError::branch)?;
        if exists {
            journal.warn(format!(
                "{}: branch '{name}' already exists; switching onto it",
                self.path.display()
            ));
            self.git.checkout(&self.path, name).map_err(TaskError::branch)?;
        } else {
            journal.info(format!("{}: creating branch '{name}'", self.path.display()));
            self.git
                .create_branch(&self.path, name)
                .map_err(TaskError::branch)?;
        }
        Ok(())
    }

    /// Two-phase application: fetch the change ref, then cherry-pick it
    /// onto the current branch. A conflicted pick is reported with its
    /// files and left in place; cleanup is the reset engine's job.
    pub fn apply_change(&self, change: &ResolvedChange, url: &str) -> Result<(), ApplyFailure> {
        if let Err(e) = self.git.fetch_ref(&self.path, url, &change.fetch_ref) {
            return Err(ApplyFailure::Fetch {
                detail: e.to_string(),
            });
        }
        match self.git.cherry_pick_fetch_head(&self.path) {
            Ok(CherryPickOutcome::Applied) => Ok(()),
            Ok(CherryPickOutcome::Conflict { files }) => Err(ApplyFailure::Conflict { files }),
            Err(e) => Err(ApplyFailure::Pick {
                detail: e.to_string(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
