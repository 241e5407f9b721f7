//! `picket reset` — drive every plan repository back to a clean trunk.
//!
//! Destructive by design: uncommitted work, untracked files, and any
//! non-trunk local branches are discarded. The confirmation gate exists
//! for exactly this command; `--force` is meant for scripts.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use picket_core::{Overrides, RunConfig, RunJournal};
use picket_engine::reset;
use picket_git::{DryRunGit, Git, GitCli};

use super::{
    confirmed, exit_code, load_plan_narrowed, preflight, print_json_summary, print_run_summary,
};

#[derive(Args, Debug)]
pub struct ResetArgs {
    /// Plan file to execute (defaults to ~/.picket/plan.yaml).
    #[arg(long, value_name = "FILE")]
    pub plan: Option<PathBuf>,

    /// Only reset the repository matching this path or directory name.
    #[arg(long, value_name = "NAME")]
    pub repo: Option<String>,

    /// Trunk branch to reset onto (overrides the plan).
    #[arg(long, value_name = "BRANCH")]
    pub trunk: Option<String>,

    /// Report every command without touching any repository.
    #[arg(long)]
    pub dry_run: bool,

    /// Skip the confirmation prompt.
    #[arg(long)]
    pub force: bool,

    /// Emit a machine-readable JSON run summary on stdout.
    #[arg(long)]
    pub json: bool,
}

impl ResetArgs {
    pub fn run(self) -> Result<()> {
        let home = dirs::home_dir().context("could not determine home directory")?;
        let plan = load_plan_narrowed(&home, self.plan.as_deref(), self.repo.as_deref())?;

        let overrides = Overrides {
            trunk: self.trunk,
            dry_run: self.dry_run,
            ..Overrides::default()
        };
        let cfg = RunConfig::resolve(&plan.defaults, &overrides);

        let real = GitCli::new();
        preflight(&real, false)?;

        if !self.force && !cfg.dry_run {
            let prompt = format!(
                "Reset {} repo(s) onto '{}', discarding uncommitted work?",
                plan.repos.len(),
                cfg.trunk
            );
            if !confirmed(&prompt) {
                println!("{}", "aborted; nothing was touched".yellow());
                return Ok(());
            }
        }

        let journal = RunJournal::to_file_at(&home, "reset").context("could not open run log")?;
        // JSON mode keeps stdout parseable; the log file still gets every line.
        let journal = if self.json { journal.quiet() } else { journal };

        let dry;
        let git: &dyn Git = if cfg.dry_run {
            dry = DryRunGit::new(&real, &journal);
            &dry
        } else {
            &real
        };

        let result = reset::run(&plan, &cfg, git, &journal);
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
