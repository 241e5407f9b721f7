//! Apply engine: walk the plan task by task, change by change.
//!
//! Failure isolation, outermost first: the run always completes; a task
//! failure (dirty tree, branch setup) drops that task's changes only; a
//! change failure (resolution, fetch, conflict) drops that change only.
//! A conflicted cherry-pick is never aborted here — the workspace is left
//! as-is for inspection or an explicit reset, which also means git refuses
//! the remaining picks in that task and they are recorded as apply
//! failures rather than silently skipped.

use chrono::Utc;

use picket_core::{
    ChangeFailure, ChangeFailureKind, PatchPlan, RepoTask, RunConfig, RunJournal, RunResult,
    TaskFailure, TaskOutcome, TaskReport,
};
use picket_gerrit::{fetch_url, resolve, ChangeQuery};
use picket_git::Git;

use crate::workspace::{ApplyFailure, Workspace};

/// Execute an apply run over every task in the plan, in order.
pub fn run(
    plan: &PatchPlan,
    cfg: &RunConfig,
    git: &dyn Git,
    query: &dyn ChangeQuery,
    journal: &RunJournal,
) -> RunResult {
    let started_at = Utc::now();
    let mode = if cfg.dry_run { " (dry-run)" } else { "" };
    journal.info(format!(
        "apply run{mode}: {} repo(s), {} change(s) queued",
        plan.repos.len(),
        plan.queued_changes()
    ));
    tracing::debug!(
        "apply config: host={} port={} trunk={} branch={:?}",
        cfg.host,
        cfg.port,
        cfg.trunk,
        cfg.branch
    );

    let mut tasks = Vec::with_capacity(plan.repos.len());
    for task in &plan.repos {
        let report = run_task(task, cfg, git, query, journal);
        match &report.outcome {
            TaskOutcome::Succeeded => journal.success(format!(
                "{}: {} change(s) applied",
                task.path.display(),
                report.applied.len()
            )),
            TaskOutcome::Failed { reason } => {
                journal.error(format!("{}: {reason}", task.path.display()))
            }
            TaskOutcome::Skipped { reason } => {
                journal.warn(format!("{}: skipped ({reason})", task.path.display()))
            }
        }
        tasks.push(report);
    }

    let result = RunResult {
        dry_run: cfg.dry_run,
        started_at,
        finished_at: Utc::now(),
        tasks,
    };
    journal.info(format!(
        "apply run complete: {} succeeded, {} failed, {} skipped",
        result.succeeded_tasks(),
        result.failed_tasks(),
        result.skipped_tasks()
    ));
    result
}

fn run_task(
    task: &RepoTask,
    cfg: &RunConfig,
    git: &dyn Git,
    query: &dyn ChangeQuery,
    journal: &RunJournal,
) -> TaskReport {
    journal.info(format!(
        "{}: {} change(s) queued for '{}'",
        task.path.display(),
        task.changes.len(),
        task.project
    ));

    let bare = |outcome| TaskReport {
        path: task.path.clone(),
        project: task.project.clone(),
        outcome,
        applied: Vec::new(),
        failed: Vec::new(),
    };

    let ws = match Workspace::open(&task.path, git) {
        Ok(ws) => ws,
        Err(reason) => return bare(TaskOutcome::Skipped { reason }),
    };

    if task.changes.is_empty() {
        // Nothing to apply; still look at the tree so problems surface.
        match ws.observe() {
            Ok(state) if !state.clean => journal.warn(format!(
                "{}: nothing to apply, but the working tree has uncommitted changes",
                task.path.display()
            )),
            Ok(_) => {}
            Err(e) => {
                return bare(TaskOutcome::Failed {
                    reason: e.into_failure(),
                })
            }
        }
        return bare(TaskOutcome::Succeeded);
    }

    if let Err(e) = ws.assert_clean() {
        return bare(TaskOutcome::Failed {
            reason: e.into_failure(),
        });
    }
    if let Err(e) = ws.ensure_branch(&cfg.branch, journal) {
        return bare(TaskOutcome::Failed {
            reason: e.into_failure(),
        });
    }

    let url = fetch_url(cfg.user.as_deref(), &cfg.host, cfg.port, &task.project);
    let mut applied = Vec::new();
    let mut failed = Vec::new();
    for id in &task.changes {
        let resolved = match resolve(query, id) {
            Ok(resolved) => resolved,
            Err(e) => {
                journal.error(format!("change {id}: {e}"));
                failed.push(ChangeFailure {
                    id: id.clone(),
                    kind: ChangeFailureKind::Resolution,
                    detail: e.to_string(),
                    files: Vec::new(),
                });
                continue;
            }
        };

        journal.info(format!("change {id}: applying {resolved}"));
        match ws.apply_change(&resolved, &url) {
            Ok(()) => {
                journal.success(format!("change {id}: applied"));
                applied.push(resolved);
            }
            Err(ApplyFailure::Fetch { detail }) => {
                journal.error(format!("change {id}: fetch failed: {detail}"));
                failed.push(ChangeFailure {
                    id: id.clone(),
                    kind: ChangeFailureKind::Fetch,
                    detail,
                    files: Vec::new(),
                });
            }
            Err(ApplyFailure::Conflict { files }) => {
                journal.error(format!(
                    "change {id}: cherry-pick conflict: {}",
                    files.join(", ")
                ));
                failed.push(ChangeFailure {
                    id: id.clone(),
                    kind: ChangeFailureKind::Conflict,
                    detail: "cherry-pick conflict".to_owned(),
                    files,
                });
            }
            Err(ApplyFailure::Pick { detail }) => {
                journal.error(format!("change {id}: {detail}"));
                failed.push(ChangeFailure {
                    id: id.clone(),
                    kind: ChangeFailureKind::Apply,
                    detail,
                    files: Vec::new(),
                });
            }
        }
    }

    let outcome = if failed.is_empty() {
        TaskOutcome::Succeeded
    } else {
        TaskOutcome::Failed {
            reason: TaskFailure::Changes,
        }
    };
    TaskReport {
        path: task.path.clone(),
        project: task.project.clone(),
        outcome,
        applied,
        failed,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
