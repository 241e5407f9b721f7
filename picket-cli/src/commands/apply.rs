//! `picket apply` — fetch and cherry-pick queued changes across the plan.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use picket_core::{Overrides, RunConfig, RunJournal};
use picket_engine::apply;
use picket_gerrit::SshQuery;
use picket_git::{DryRunGit, Git, GitCli};

use super::{
    confirmed, exit_code, load_plan_narrowed, preflight, print_json_summary, print_run_summary,
};

#[derive(Args, Debug)]
pub struct ApplyArgs {
    /// Plan file to execute (defaults to ~/.picket/plan.yaml).
    #[arg(long, value_name = "FILE")]
    pub plan: Option<PathBuf>,

    /// Only run the repository matching this path or directory name.
    #[arg(long, value_name = "NAME")]
    pub repo: Option<String>,

    /// Report every command without touching any repository.
    #[arg(long)]
    pub dry_run: bool,

    /// Skip the confirmation prompt.
    #[arg(long)]
    pub force: bool,

    /// Working branch to switch to before applying (overrides the plan).
    #[arg(long, value_name = "NAME", conflicts_with = "no_branch")]
    pub branch: Option<String>,

    /// Apply onto whatever branch each repository has checked out.
    #[arg(long)]
    pub no_branch: bool,

    /// Review backend host (overrides the plan).
    #[arg(long, value_name = "HOST")]
    pub host: Option<String>,

    /// Review backend SSH port (overrides the plan).
    #[arg(long, value_name = "PORT")]
    pub port: Option<u16>,

    /// Review backend SSH user (overrides the plan).
    #[arg(long, value_name = "USER")]
    pub user: Option<String>,

    /// Emit a machine-readable JSON run summary on stdout.
    #[arg(long)]
    pub json: bool,
}

impl ApplyArgs {
    pub fn run(self) -> Result<()> {
        let home = dirs::home_dir().context("could not determine home directory")?;
        let plan = load_plan_narrowed(&home, self.plan.as_deref(), self.repo.as_deref())?;

        let overrides = Overrides {
            host: self.host,
            port: self.port,
            user: self.user,
            branch: self.branch,
            no_branch: self.no_branch,
            trunk: None,
            dry_run: self.dry_run,
        };
        let cfg = RunConfig::resolve(&plan.defaults, &overrides);

        let real = GitCli::new();
        preflight(&real, plan.queued_changes() > 0)?;

        if !self.force && !cfg.dry_run {
            let prompt = format!(
                "Apply {} change(s) across {} repo(s) via {}?",
                plan.queued_changes(),
                plan.repos.len(),
                cfg.host
            );
            if !confirmed(&prompt) {
                println!("{}", "aborted; nothing was touched".yellow());
                return Ok(());
            }
        }

        let journal = RunJournal::to_file_at(&home, "apply").context("could not open run log")?;
        // JSON mode keeps stdout parseable; the log file still gets every line.
        let journal = if self.json { journal.quiet() } else { journal };

        let query = SshQuery::new(
            cfg.host.clone(),
            cfg.port,
            cfg.user.clone(),
            cfg.connect_timeout_secs,
        );

        let dry;
        let git: &dyn Git = if cfg.dry_run {
            dry = DryRunGit::new(&real, &journal);
            &dry
        } else {
            &real
        };

        let result = apply::run(&plan, &cfg, git, &query, &journal);
        if self.json {
            print_json_summary(&result, journal.path())?;
        } else {
            print_run_summary(&result, journal.path());
        }

        if let Some(code) = exit_code(&result) {
            std::process::exit(code);
        }
        Ok(())
    }
}
