//! Task-scoped errors — each one ends the current task, never the run.

use picket_core::TaskFailure;
use picket_git::GitError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TaskError {
    #[error("working tree has {} uncommitted change(s)", lines.len())]
    Dirty { lines: Vec<String> },

    #[error("branch setup failed: {detail}")]
    Branch { detail: String },

    #[error(transparent)]
    Git(#[from] GitError),
}

impl TaskError {
    /// Wrap a git failure that happened while establishing a branch, so it
    /// surfaces as a branch problem rather than a generic one.
    pub(crate) fn branch(e: GitError) -> TaskError {
        TaskError::Branch {
            detail: e.to_string(),
        }
    }

    /// The report-side value recorded for this error.
    pub fn into_failure(self) -> TaskFailure {
        match self {
            TaskError::Dirty { lines } => TaskFailure::Dirty { lines },
            TaskError::Branch { detail } => TaskFailure::Branch { detail },
            TaskError::Git(e) => TaskFailure::Repo {
                detail: e.to_string(),
            },
        }
    }
}
