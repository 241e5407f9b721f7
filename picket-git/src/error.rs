//! Error types for picket-git.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise from driving git.
#[derive(Debug, Error)]
pub enum GitError {
    /// The `git` binary could not be spawned at all.
    #[error("failed to run git: {0}")]
    Spawn(#[from] std::io::Error),

    /// A git command exited non-zero; `stderr` is trimmed for display.
    #[error("git {args} failed in {dir}: {stderr}")]
    Command {
        dir: PathBuf,
        args: String,
        stderr: String,
    },
}
