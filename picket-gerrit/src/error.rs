//! Resolution errors — always scoped to a single change id.

use thiserror::Error;

/// Why one change id could not be resolved. The apply engine records these
/// per change and moves on; none of them stops a run.
#[derive(Debug, Error)]
pub enum ResolutionError {
    #[error("change id '{id}' has no numeric part")]
    InvalidId { id: String },

    #[error("change {number} not found on the review backend")]
    NotFound { number: u64 },

    #[error("could not decode review backend response: {detail}")]
    Unparseable { detail: String },

    #[error("review backend {host} unreachable: {detail}")]
    Timeout { host: String, detail: String },

    #[error("review backend query failed: {detail}")]
    Backend { detail: String },

    #[error("failed to run ssh: {0}")]
    Spawn(#[from] std::io::Error),
}
