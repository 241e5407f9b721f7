//! Picket core library — domain types, plan loading, run configuration,
//! and the per-run journal.
//!
//! Public API surface:
//! - [`types`] — newtypes, plan structs, run reports
//! - [`error`] — [`PlanError`]
//! - [`plan`] — load / validate / select
//! - [`config`] — [`RunConfig`] merge of plan defaults and CLI flags
//! - [`journal`] — [`RunJournal`] file + console run log

pub mod config;
pub mod error;
pub mod journal;
pub mod plan;
pub mod types;

pub use config::{BranchPolicy, Overrides, RunConfig};
pub use error::PlanError;
pub use journal::{RunJournal, Severity};
pub use types::{
    ChangeFailure, ChangeFailureKind, ChangeId, PatchPlan, PlanDefaults, RepoTask, ResolvedChange,
    RunResult, SkipReason, TaskFailure, TaskOutcome, TaskReport, WorkspaceState,
};
