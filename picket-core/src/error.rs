//! Error types for picket-core.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise from plan loading and validation.
///
/// Every variant here is fatal to the whole run: a bad plan means nothing
/// has been touched yet and nothing will be.
#[derive(Debug, Error)]
pub enum PlanError {
    /// Underlying I/O failure (permission denied, unreadable file, etc.).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization error (write/save path).
    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// YAML parse error on load — includes file path and line context from serde_yaml.
    #[error("failed to parse plan at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// `dirs::home_dir()` returned `None` — cannot locate `~/.picket/`.
    #[error("cannot determine home directory; set $HOME or equivalent")]
    HomeNotFound,

    /// The plan YAML file did not exist at the expected path.
    #[error("plan not found at {path}")]
    PlanNotFound { path: PathBuf },

    /// Two repo entries expand to the same local path.
    #[error("duplicate repo path in plan: {path}")]
    DuplicateRepoPath { path: PathBuf },

    /// A `--repo` filter matched no plan entry.
    #[error("no repo named '{name}' in the plan")]
    NoSuchRepo { name: String },

    /// A `--repo` filter matched more than one plan entry.
    #[error("repo name '{name}' is ambiguous; use a full path (matches: {})",
        .matches.iter().map(|p| p.display().to_string()).collect::<Vec<_>>().join(", "))]
    AmbiguousRepo { name: String, matches: Vec<PathBuf> },
}
