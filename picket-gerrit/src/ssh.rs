//! SSH transport for change lookups.
//!
//! One `ssh … gerrit query --format=JSON --current-patch-set <number>`
//! subprocess per lookup. Gerrit answers line-oriented JSON: one object per
//! matching change, then a `{"type":"stats",…}` trailer. Only the first
//! change row matters here; numbers are accepted as JSON ints or strings
//! since older backends quote them.

use std::process::Command;

use serde::Deserialize;

use crate::error::ResolutionError;
use crate::{ChangeQuery, ChangeRecord};

/// [`ChangeQuery`] over an OpenSSH client on `PATH`.
#[derive(Debug, Clone)]
pub struct SshQuery {
    host: String,
    port: u16,
    user: Option<String>,
    connect_timeout_secs: u64,
}

impl SshQuery {
    pub fn new(
        host: impl Into<String>,
        port: u16,
        user: Option<String>,
        connect_timeout_secs: u64,
    ) -> Self {
        SshQuery {
            host: host.into(),
            port,
            user,
            connect_timeout_secs,
        }
    }

    /// `user@host` when a user is configured, bare `host` otherwise — ssh's
    /// own configuration picks the user in the latter case.
    fn destination(&self) -> String {
        match &self.user {
            Some(user) => format!("{user}@{}", self.host),
            None => self.host.clone(),
        }
    }

    fn argv(&self, number: u64) -> Vec<String> {
        vec![
            "-o".to_owned(),
            "BatchMode=yes".to_owned(),
            "-o".to_owned(),
            format!("ConnectTimeout={}", self.connect_timeout_secs),
            "-p".to_owned(),
            self.port.to_string(),
            self.destination(),
            "gerrit".to_owned(),
            "query".to_owned(),
            "--format=JSON".to_owned(),
            "--current-patch-set".to_owned(),
            number.to_string(),
        ]
    }
}

impl ChangeQuery for SshQuery {
    fn lookup(&self, number: u64) -> Result<ChangeRecord, ResolutionError> {
        let args = self.argv(number);
        tracing::debug!("run: ssh {}", args.join(" "));
        let out = Command::new("ssh").args(&args).output()?;

        if !out.status.success() {
            let stderr = String::from_utf8_lossy(&out.stderr).trim().to_owned();
            return Err(transport_error(&self.host, out.status.code(), stderr));
        }

        parse_query_output(&String::from_utf8_lossy(&out.stdout), number)
    }
}

/// Probe for a usable ssh client; process-fatal when absent.
///
/// OpenSSH prints its version banner on stderr and exits 0.
pub fn ssh_version() -> Result<String, ResolutionError> {
    let out = Command::new("ssh").arg("-V").output()?;
    let banner = String::from_utf8_lossy(&out.stderr).trim().to_owned();
    if banner.is_empty() {
        return Ok(String::from_utf8_lossy(&out.stdout).trim().to_owned());
    }
    Ok(banner)
}

/// Sort a failed ssh invocation into the resolution taxonomy.
///
/// OpenSSH reserves exit 255 for its own failures, but that bucket holds
/// auth and host-key trouble alongside dead networks. Only connection-class
/// stderr marks the backend unreachable; every other failure, whatever the
/// exit status, is a query error.
fn transport_error(host: &str, code: Option<i32>, stderr: String) -> ResolutionError {
    const UNREACHABLE: &[&str] = &[
        "timed out",
        "Connection refused",
        "No route to host",
        "Could not resolve hostname",
        "Network is unreachable",
    ];
    if code == Some(255) && UNREACHABLE.iter().any(|m| stderr.contains(m)) {
        return ResolutionError::Timeout {
            host: host.to_owned(),
            detail: stderr,
        };
    }
    ResolutionError::Backend { detail: stderr }
}

// ---------------------------------------------------------------------------
// Wire format
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum LenientNumber {
    Int(u64),
    Text(String),
}

impl LenientNumber {
    fn value(&self) -> Result<u64, ResolutionError> {
        match self {
            LenientNumber::Int(n) => Ok(*n),
            LenientNumber::Text(s) => s.trim().parse().map_err(|_| ResolutionError::Unparseable {
                detail: format!("non-numeric number field: '{s}'"),
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
struct PatchSetRow {
    number: LenientNumber,
}

#[derive(Debug, Deserialize)]
struct QueryRow {
    #[serde(default, rename = "type")]
    row_type: Option<String>,
    #[serde(default)]
    number: Option<LenientNumber>,
    #[serde(default, rename = "currentPatchSet")]
    current_patch_set: Option<PatchSetRow>,
}

fn parse_query_output(raw: &str, number: u64) -> Result<ChangeRecord, ResolutionError> {
    for line in raw.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let row: QueryRow =
            serde_json::from_str(line).map_err(|e| ResolutionError::Unparseable {
                detail: e.to_string(),
            })?;
        if row.row_type.as_deref() == Some("stats") {
            // Trailer reached without a change row: zero matches.
            break;
        }

        let Some(patch_set) = row.current_patch_set else {
            return Err(ResolutionError::NotFound { number });
        };
        let patchset = u32::try_from(patch_set.number.value()?).map_err(|_| {
            ResolutionError::Unparseable {
                detail: "patchset number out of range".to_owned(),
            }
        })?;
        let answered = match row.number {
            Some(n) => n.value()?,
            None => number,
        };
        return Ok(ChangeRecord {
            number: answered,
            patchset,
        });
    }
    Err(ResolutionError::NotFound { number })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
