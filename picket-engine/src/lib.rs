//! Picket engine library — apply and reset orchestration.
//!
//! Both engines walk the plan sequentially and reach the outside world
//! only through the [`Git`](picket_git::Git) and
//! [`ChangeQuery`](picket_gerrit::ChangeQuery) seams, so dry-run and tests
//! swap implementations without touching orchestration. Every failure is
//! recorded in the returned [`RunResult`](picket_core::RunResult); a run
//! never aborts partway.

pub mod apply;
pub mod error;
pub mod reset;
pub mod status;
pub mod workspace;

pub use error::TaskError;
pub use status::{survey, RepoStatus};
pub use workspace::{ApplyFailure, Workspace};
