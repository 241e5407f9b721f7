//! Reset engine: drive each checkout back to a clean trunk.
//!
//! Order per repository: abort any in-progress sequencer operation, hard
//! reset and drop untracked files, switch to trunk, prune every other
//! local branch, then sync trunk to its remote tracking ref. The remote
//! leg is best-effort — an unreachable remote or a missing tracking ref
//! downgrades to a warning and trunk stays at the local HEAD.

use chrono::Utc;

use picket_core::{PatchPlan, RepoTask, RunConfig, RunJournal, RunResult, TaskOutcome, TaskReport};
use picket_git::Git;

use crate::error::TaskError;
use crate::workspace::Workspace;

/// Execute a reset run over every task in the plan, in order.
pub fn run(plan: &PatchPlan, cfg: &RunConfig, git: &dyn Git, journal: &RunJournal) -> RunResult {
    let started_at = Utc::now();
    let mode = if cfg.dry_run { " (dry-run)" } else { "" };
    journal.info(format!("reset run{mode}: {} repo(s)", plan.repos.len()));
    tracing::debug!("reset config: trunk={} remote={}", cfg.trunk, cfg.remote);

    let mut tasks = Vec::with_capacity(plan.repos.len());
    for task in &plan.repos {
        let report = reset_task(task, cfg, git, journal);
        match &report.outcome {
            TaskOutcome::Succeeded => journal.success(format!(
                "{}: reset onto '{}'",
                task.path.display(),
                cfg.trunk
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
        "reset run complete: {} succeeded, {} failed, {} skipped",
        result.succeeded_tasks(),
        result.failed_tasks(),
        result.skipped_tasks()
    ));
    result
}

fn reset_task(
    task: &RepoTask,
    cfg: &RunConfig,
    git: &dyn Git,
    journal: &RunJournal,
) -> TaskReport {
    let outcome = match Workspace::open(&task.path, git) {
        Ok(ws) => match reset_steps(&ws, cfg, journal) {
            Ok(()) => TaskOutcome::Succeeded,
            Err(e) => TaskOutcome::Failed {
                reason: e.into_failure(),
            },
        },
        Err(reason) => TaskOutcome::Skipped { reason },
    };
    TaskReport {
        path: task.path.clone(),
        project: task.project.clone(),
        outcome,
        applied: Vec::new(),
        failed: Vec::new(),
    }
}

fn reset_steps(ws: &Workspace<'_>, cfg: &RunConfig, journal: &RunJournal) -> Result<(), TaskError> {
    let dir = ws.path();
    let git = ws.git;

    if let Some(op) = git.pending_operation(dir)? {
        journal.warn(format!("{}: aborting in-progress {op}", dir.display()));
        if let Err(e) = git.abort_operation(dir, op) {
            journal.warn(format!("{}: abort failed, continuing: {e}", dir.display()));
        }
    }

    git.reset_hard(dir, None)?;
    git.clean_untracked(dir)?;

    git.checkout(dir, &cfg.trunk).map_err(|e| TaskError::Branch {
        detail: format!("cannot switch to trunk '{}': {e}", cfg.trunk),
    })?;

    // Prune is per-branch best-effort; a stuck branch should not stop the
    // remote sync below.
    for branch in git.local_branches(dir)? {
        if branch == cfg.trunk {
            continue;
        }
        journal.info(format!("{}: deleting branch '{branch}'", dir.display()));
        if let Err(e) = git.delete_branch(dir, &branch) {
            journal.warn(format!(
                "{}: could not delete '{branch}': {e}",
                dir.display()
            ));
        }
    }

    let tracking = format!("{}/{}", cfg.remote, cfg.trunk);
    match git.fetch_remote(dir, &cfg.remote) {
        Ok(()) => match git.rev_parse(dir, &tracking)? {
            Some(sha) => {
                git.reset_hard(dir, Some(&sha))?;
                journal.info(format!("{}: trunk synced to {tracking}", dir.display()));
            }
            None => {
                git.reset_hard(dir, None)?;
                journal.warn(format!(
                    "{}: no tracking ref {tracking}; trunk left at local HEAD",
                    dir.display()
                ));
            }
        },
        Err(e) => {
            git.reset_hard(dir, None)?;
            journal.warn(format!(
                "{}: remote '{}' unreachable; trunk left at local HEAD ({e})",
                dir.display(),
                cfg.remote
            ));
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    use picket_core::{Overrides, PlanDefaults, Severity, TaskFailure};
    use picket_git::fakes::FakeGit;
    use picket_git::{DryRunGit, PendingOp};
    use tempfile::TempDir;

    fn logging() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn plan_for(paths: &[&Path]) -> PatchPlan {
        PatchPlan {
            version: 1,
            defaults: PlanDefaults {
                host: "gerrit.example.com".into(),
                port: 29418,
                user: None,
                branch: None,
                trunk: "master".into(),
                remote: "origin".into(),
            },
            repos: paths
                .iter()
                .map(|path| RepoTask {
                    path: path.to_path_buf(),
                    project: "tools/frontend".into(),
                    changes: Vec::new(),
                })
                .collect(),
        }
    }

    fn config(plan: &PatchPlan) -> RunConfig {
        RunConfig::resolve(&plan.defaults, &Overrides::default())
    }

    fn wreck(fake: &FakeGit, repo: &Path) {
        fake.add_branch(repo, "picket/patches");
        fake.checkout(repo, "picket/patches").unwrap();
        fake.set_dirty(repo, &["UU src/api.rs", "?? scratch.txt"]);
        fake.set_pending(repo, PendingOp::CherryPick);
    }

    #[test]
    fn reset_drives_a_wrecked_repo_back_to_trunk() {
        logging();
        let dir = TempDir::new().unwrap();
        let repo = dir.path();
        let fake = FakeGit::new();
        fake.add_repo(repo, "master");
        wreck(&fake, repo);
        fake.set_remote_ref(repo, "origin/master", "1234abcd");
        let plan = plan_for(&[repo]);
        let cfg = config(&plan);
        let journal = RunJournal::memory();

        let result = run(&plan, &cfg, &fake, &journal);

        assert!(result.is_success());
        assert_eq!(fake.current_branch_of(repo).as_deref(), Some("master"));
        assert_eq!(fake.branches_of(repo), vec!["master"]);
        assert!(fake.is_clean(repo));
        assert_eq!(fake.pending_of(repo), None);

        let commands = fake.commands().join("\n");
        assert!(commands.contains("cherry-pick --abort"));
        assert!(commands.contains("clean -fd"));
        assert!(commands.contains("checkout master"));
        assert!(commands.contains("branch -D picket/patches"));
        assert!(commands.contains("fetch origin"));
        assert!(commands.contains("reset --hard 1234abcd"));
    }

    #[test]
    fn unreachable_remote_downgrades_sync_to_warning() {
        logging();
        let dir = TempDir::new().unwrap();
        let repo = dir.path();
        let fake = FakeGit::new();
        fake.add_repo(repo, "master");
        fake.offline_remote("origin");
        let plan = plan_for(&[repo]);
        let cfg = config(&plan);
        let journal = RunJournal::memory();

        let result = run(&plan, &cfg, &fake, &journal);

        assert!(result.is_success(), "offline reset must still succeed");
        assert!(journal
            .entries()
            .iter()
            .any(|e| e.severity == Severity::Warn && e.message.contains("unreachable")));
        // Only the bare no-op resets ran, never one onto a tracking sha.
        assert!(fake
            .commands()
            .iter()
            .all(|c| !c.contains("reset --hard origin")
                && !c.contains("reset --hard 1234abcd")));
    }

    #[test]
    fn missing_tracking_ref_warns_and_keeps_local_head() {
        logging();
        let dir = TempDir::new().unwrap();
        let repo = dir.path();
        let fake = FakeGit::new();
        fake.add_repo(repo, "master");
        let plan = plan_for(&[repo]);
        let cfg = config(&plan);
        let journal = RunJournal::memory();

        let result = run(&plan, &cfg, &fake, &journal);

        assert!(result.is_success());
        assert!(journal
            .messages()
            .iter()
            .any(|m| m.contains("no tracking ref origin/master")));
    }

    #[test]
    fn missing_trunk_branch_fails_that_task_only() {
        logging();
        let dir = TempDir::new().unwrap();
        let good = dir.path().join("good");
        let wrong = dir.path().join("wrong");
        std::fs::create_dir_all(&good).unwrap();
        std::fs::create_dir_all(&wrong).unwrap();

        let fake = FakeGit::new();
        fake.add_repo(&good, "master");
        fake.add_repo(&wrong, "main"); // no "master" branch here
        let plan = plan_for(&[&good, &wrong]);
        let cfg = config(&plan);
        let journal = RunJournal::memory();

        let result = run(&plan, &cfg, &fake, &journal);

        assert!(result.tasks[0].is_success());
        assert!(matches!(
            result.tasks[1].outcome,
            TaskOutcome::Failed {
                reason: TaskFailure::Branch { .. }
            }
        ));
        assert_eq!(result.failed_tasks(), 1);
        assert!(!result.is_success());
    }

    #[test]
    fn reset_is_idempotent_on_a_clean_repo() {
        logging();
        let dir = TempDir::new().unwrap();
        let repo = dir.path();
        let fake = FakeGit::new();
        fake.add_repo(repo, "master");
        fake.set_remote_ref(repo, "origin/master", "1234abcd");
        let plan = plan_for(&[repo]);
        let cfg = config(&plan);

        let first = run(&plan, &cfg, &fake, &RunJournal::memory());
        let second = run(&plan, &cfg, &fake, &RunJournal::memory());

        assert!(first.is_success());
        assert!(second.is_success());
        assert_eq!(fake.branches_of(repo), vec!["master"]);
        assert!(fake.is_clean(repo));
    }

    #[test]
    fn dry_run_reset_mutates_nothing() {
        logging();
        let dir = TempDir::new().unwrap();
        let repo = dir.path();
        let fake = FakeGit::new();
        fake.add_repo(repo, "master");
        wreck(&fake, repo);
        fake.set_remote_ref(repo, "origin/master", "1234abcd");
        let plan = plan_for(&[repo]);
        let mut cfg = config(&plan);
        cfg.dry_run = true;
        let journal = RunJournal::memory();
        let dry = DryRunGit::new(&fake, &journal);

        let result = run(&plan, &cfg, &dry, &journal);

        assert!(result.dry_run);
        assert!(result.is_success());
        // The wreckage is untouched; only would-run lines were journaled.
        assert_eq!(fake.pending_of(repo), Some(PendingOp::CherryPick));
        assert!(!fake.is_clean(repo));
        assert_eq!(
            fake.current_branch_of(repo).as_deref(),
            Some("picket/patches")
        );
        let messages = journal.messages();
        assert!(messages
            .iter()
            .any(|m| m.contains("would run") && m.contains("cherry-pick --abort")));
        assert!(messages
            .iter()
            .any(|m| m.contains("would run") && m.contains("branch -D picket/patches")));
    }
}
