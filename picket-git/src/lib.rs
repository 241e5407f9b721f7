//! Picket git library — the [`Git`] seam and its implementations.
//!
//! Engines never shell out directly; they hold a `&dyn Git` and every call
//! names the repository directory, so the process working directory is never
//! changed. Implementations:
//! - [`GitCli`] — real `git -C <dir> …` subprocesses
//! - [`DryRunGit`] — wraps any [`Git`], journals mutations instead of
//!   running them
//! - [`fakes::FakeGit`] — scripted in-memory double for engine tests

pub mod backend;
pub mod cli;
pub mod dry_run;
pub mod error;
pub mod fakes;

pub use backend::{CherryPickOutcome, Git, PendingOp};
pub use cli::GitCli;
pub use dry_run::DryRunGit;
pub use error::GitError;
