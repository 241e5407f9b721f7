//! Picket gerrit library — change resolution against the review backend.
//!
//! [`ChangeQuery`] is the lookup seam: [`SshQuery`] implements it with one
//! `ssh … gerrit query` subprocess per change, [`fakes::FakeQuery`] scripts
//! it for tests. [`resolve`] normalizes a plan-supplied id, asks the backend
//! for the current patchset, and derives the fetch ref locally — given a
//! (number, patchset) pair the ref is reproducible offline.

pub mod error;
pub mod fakes;
pub mod ssh;

use picket_core::{ChangeId, ResolvedChange};

pub use error::ResolutionError;
pub use ssh::SshQuery;

// ---------------------------------------------------------------------------
// Lookup seam
// ---------------------------------------------------------------------------

/// A backend's answer for one change: its number and current patchset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeRecord {
    pub number: u64,
    pub patchset: u32,
}

/// Review-backend lookup. One call per change id, never batched, so a
/// failing id cannot take its neighbors down with it.
pub trait ChangeQuery {
    fn lookup(&self, number: u64) -> Result<ChangeRecord, ResolutionError>;
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// Extract the change number from a plan-supplied id.
///
/// Ids arrive hand-pasted; the first contiguous digit run is the number, so
/// decorations like `#850035` or an `850035,3` patchset tail are tolerated.
/// An id with no digits at all is a plan mistake and fails as [`ResolutionError::InvalidId`].
pub fn normalize_id(id: &ChangeId) -> Result<u64, ResolutionError> {
    let digits: String = id
        .0
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits
        .parse()
        .map_err(|_| ResolutionError::InvalidId { id: id.to_string() })
}

/// `refs/changes/<shard>/<number>/<patchset>` — shard is the last two
/// digits of the change number, zero-padded.
pub fn fetch_ref(number: u64, patchset: u32) -> String {
    format!("refs/changes/{:02}/{}/{}", number % 100, number, patchset)
}

/// Fetch endpoint for a backend project: `ssh://[user@]host:port/project`.
pub fn fetch_url(user: Option<&str>, host: &str, port: u16, project: &str) -> String {
    match user {
        Some(u) => format!("ssh://{u}@{host}:{port}/{project}"),
        None => format!("ssh://{host}:{port}/{project}"),
    }
}

/// Resolve one change id to a fetchable reference.
pub fn resolve(
    query: &dyn ChangeQuery,
    id: &ChangeId,
) -> Result<ResolvedChange, ResolutionError> {
    let number = normalize_id(id)?;
    let record = query.lookup(number)?;
    tracing::debug!(
        "resolved change '{id}' to {}/{}",
        record.number,
        record.patchset
    );
    Ok(ResolvedChange {
        id: id.clone(),
        number: record.number,
        patchset: record.patchset,
        fetch_ref: fetch_ref(record.number, record.patchset),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
