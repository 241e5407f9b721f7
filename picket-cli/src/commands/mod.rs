//! Subcommand implementations and the plumbing they share.

pub mod apply;
pub mod reset;
pub mod status;

use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;
use dialoguer::Confirm;
use serde::Serialize;

use picket_core::plan;
use picket_core::{PatchPlan, RunResult, TaskOutcome, TaskReport};
use picket_gerrit::ssh;
use picket_git::Git;

// ---------------------------------------------------------------------------
// Shared plumbing
// ---------------------------------------------------------------------------

/// Load the plan (explicit `--plan` path or `~/.picket/plan.yaml`) and
/// narrow it to a single repository when `--repo` was given.
pub(crate) fn load_plan_narrowed(
    home: &Path,
    plan_override: Option<&Path>,
    repo: Option<&str>,
) -> Result<PatchPlan> {
    let plan = plan::load_plan_at(home, plan_override).context("failed to load plan")?;
    match repo {
        Some(name) => Ok(plan::select_repo(&plan, name)?),
        None => Ok(plan),
    }
}

/// Verify the external tools this run will shell out to. `git` is always
/// required; `ssh` only when changes will be resolved against the backend.
pub(crate) fn preflight(git: &dyn Git, need_ssh: bool) -> Result<()> {
    git.version()
        .context("git is required but was not found on PATH")?;
    if need_ssh {
        ssh::ssh_version().context("ssh is required but was not found on PATH")?;
    }
    Ok(())
}

/// Interactive yes/no gate. Declining (or a non-interactive stdin) counts
/// as "no".
pub(crate) fn confirmed(prompt: &str) -> bool {
    Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()
        .unwrap_or(false)
}

/// Exit code for a finished run: the failed-task count capped at 100, or
/// `None` when every task succeeded or was skipped.
pub(crate) fn exit_code(result: &RunResult) -> Option<i32> {
    let failed = result.failed_tasks();
    (failed > 0).then(|| failed.min(100) as i32)
}

// ---------------------------------------------------------------------------
// Run summary
// ---------------------------------------------------------------------------

/// Print the end-of-run summary: one line per task, failed changes
/// enumerated underneath, counts at the bottom.
pub(crate) fn print_run_summary(result: &RunResult, log: Option<&Path>) {
    println!();
    let prefix = if result.dry_run { "[dry-run] " } else { "" };

    for task in &result.tasks {
        let path = task.path.display();
        match &task.outcome {
            TaskOutcome::Succeeded => {
                if task.applied.is_empty() {
                    println!("{prefix}{} {path}", "✓".green().bold());
                } else {
                    println!(
                        "{prefix}{} {path} ({} change(s) applied)",
                        "✓".green().bold(),
                        task.applied.len()
                    );
                }
            }
            TaskOutcome::Skipped { reason } => {
                println!(
                    "{prefix}{} {path} skipped: {reason}",
                    "→".bright_black().bold()
                );
            }
            TaskOutcome::Failed { reason } => {
                println!("{prefix}{} {path} failed: {reason}", "✗".red().bold());
                for failure in &task.failed {
                    let mut line =
                        format!("    {} {}: {}", failure.kind, failure.id, failure.detail);
                    if !failure.files.is_empty() {
                        line.push_str(&format!(" ({})", failure.files.join(", ")));
                    }
                    println!("{}", line.red());
                }
            }
        }
    }

    let mut tally = format!(
        "{} succeeded, {} failed, {} skipped",
        result.succeeded_tasks(),
        result.failed_tasks(),
        result.skipped_tasks()
    );
    if result.applied_changes() + result.failed_changes() > 0 {
        tally.push_str(&format!(
            "; {} change(s) applied, {} failed",
            result.applied_changes(),
            result.failed_changes()
        ));
    }
    println!("\n{prefix}{tally}");

    if let Some(path) = log {
        println!("log: {}", path.display());
    }
}

// ---------------------------------------------------------------------------
// JSON summary
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct RunResultJson {
    dry_run: bool,
    started_at: String,
    finished_at: String,
    summary: RunSummaryJson,
    tasks: Vec<TaskReportJson>,
    log: Option<String>,
}

#[derive(Serialize)]
struct RunSummaryJson {
    succeeded: usize,
    failed: usize,
    skipped: usize,
    applied_changes: usize,
    failed_changes: usize,
}

#[derive(Serialize)]
struct TaskReportJson {
    path: String,
    project: String,
    outcome: String,
    reason: Option<String>,
    applied: Vec<ResolvedChangeJson>,
    failed: Vec<ChangeFailureJson>,
}

#[derive(Serialize)]
struct ResolvedChangeJson {
    id: String,
    number: u64,
    patchset: u32,
    fetch_ref: String,
}

#[derive(Serialize)]
struct ChangeFailureJson {
    id: String,
    kind: String,
    detail: String,
    files: Vec<String>,
}

/// Print the finished run as pretty JSON on stdout. Callers pair this with
/// a quiet journal so stdout carries nothing else.
pub(crate) fn print_json_summary(result: &RunResult, log: Option<&Path>) -> Result<()> {
    let payload = RunResultJson {
        dry_run: result.dry_run,
        started_at: result.started_at.to_rfc3339(),
        finished_at: result.finished_at.to_rfc3339(),
        summary: RunSummaryJson {
            succeeded: result.succeeded_tasks(),
            failed: result.failed_tasks(),
            skipped: result.skipped_tasks(),
            applied_changes: result.applied_changes(),
            failed_changes: result.failed_changes(),
        },
        tasks: result.tasks.iter().map(task_json).collect(),
        log: log.map(|p| p.display().to_string()),
    };
    println!(
        "{}",
        serde_json::to_string_pretty(&payload).context("failed to serialize run summary JSON")?
    );
    Ok(())
}

fn task_json(task: &TaskReport) -> TaskReportJson {
    let (outcome, reason) = match &task.outcome {
        TaskOutcome::Succeeded => ("succeeded", None),
        TaskOutcome::Failed { reason } => ("failed", Some(reason.to_string())),
        TaskOutcome::Skipped { reason } => ("skipped", Some(reason.to_string())),
    };
    TaskReportJson {
        path: task.path.display().to_string(),
        project: task.project.clone(),
        outcome: outcome.to_owned(),
        reason,
        applied: task
            .applied
            .iter()
            .map(|c| ResolvedChangeJson {
                id: c.id.to_string(),
                number: c.number,
                patchset: c.patchset,
                fetch_ref: c.fetch_ref.clone(),
            })
            .collect(),
        failed: task
            .failed
            .iter()
            .map(|f| ChangeFailureJson {
                id: f.id.to_string(),
                kind: f.kind.to_string(),
                detail: f.detail.clone(),
                files: f.files.clone(),
            })
            .collect(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use picket_core::{TaskFailure, TaskReport};
    use std::path::PathBuf;

    fn result_with_failures(failed: usize) -> RunResult {
        let now = Utc::now();
        RunResult {
            dry_run: false,
            started_at: now,
            finished_at: now,
            tasks: (0..failed)
                .map(|i| TaskReport {
                    path: PathBuf::from(format!("/repo{i}")),
                    project: format!("p{i}"),
                    outcome: TaskOutcome::Failed {
                        reason: TaskFailure::Changes,
                    },
                    applied: vec![],
                    failed: vec![],
                })
                .collect(),
        }
    }

    #[test]
    fn exit_code_is_none_on_success() {
        assert_eq!(exit_code(&result_with_failures(0)), None);
    }

    #[test]
    fn exit_code_counts_failed_tasks() {
        assert_eq!(exit_code(&result_with_failures(1)), Some(1));
        assert_eq!(exit_code(&result_with_failures(3)), Some(3));
    }

    #[test]
    fn exit_code_is_capped() {
        assert_eq!(exit_code(&result_with_failures(150)), Some(100));
    }
}
