//! Run configuration: plan defaults merged with CLI overrides.
//!
//! A [`RunConfig`] is built exactly once, before any repository is touched,
//! and passed by reference for the rest of the run. Nothing reads ambient
//! environment after this point.

use crate::types::PlanDefaults;

/// Built-in working-branch name used when neither the plan nor the CLI
/// names one.
pub const DEFAULT_BRANCH: &str = "picket/patches";

/// SSH connect timeout for backend queries, in seconds.
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

// ---------------------------------------------------------------------------
// Branch policy
// ---------------------------------------------------------------------------

/// What to do about branches before applying changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BranchPolicy {
    /// Switch to (creating if needed) a named working branch first.
    Create { name: String },
    /// Apply onto whatever branch is currently checked out.
    Current,
}

// ---------------------------------------------------------------------------
// Run configuration
// ---------------------------------------------------------------------------

/// CLI-level overrides applied on top of the plan's `defaults` block.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub user: Option<String>,
    pub branch: Option<String>,
    pub no_branch: bool,
    pub trunk: Option<String>,
    pub dry_run: bool,
}

/// Immutable configuration for one run. Precedence per field:
/// CLI flag, then plan default, then built-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub host: String,
    pub port: u16,
    /// SSH user; `None` lets ssh fall back to its own configuration.
    pub user: Option<String>,
    pub branch: BranchPolicy,
    pub trunk: String,
    pub remote: String,
    pub connect_timeout_secs: u64,
    pub dry_run: bool,
}

impl RunConfig {
    /// Merge plan defaults and CLI overrides into a run configuration.
    pub fn resolve(defaults: &PlanDefaults, overrides: &Overrides) -> RunConfig {
        let branch = if overrides.no_branch {
            BranchPolicy::Current
        } else {
            let name = overrides
                .branch
                .clone()
                .or_else(|| defaults.branch.clone())
                .unwrap_or_else(|| DEFAULT_BRANCH.to_owned());
            BranchPolicy::Create { name }
        };

        RunConfig {
            host: overrides
                .host
                .clone()
                .unwrap_or_else(|| defaults.host.clone()),
            port: overrides.port.unwrap_or(defaults.port),
            user: overrides.user.clone().or_else(|| defaults.user.clone()),
            branch,
            trunk: overrides
                .trunk
                .clone()
                .unwrap_or_else(|| defaults.trunk.clone()),
            remote: defaults.remote.clone(),
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            dry_run: overrides.dry_run,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
