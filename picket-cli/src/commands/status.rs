//! `picket status` — plan-wide repository visibility.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use picket_engine::{survey, RepoStatus};
use picket_git::{GitCli, PendingOp};

use super::load_plan_narrowed;

/// Arguments for `picket status`.
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Plan file to inspect (defaults to ~/.picket/plan.yaml).
    #[arg(long, value_name = "FILE")]
    pub plan: Option<PathBuf>,

    /// Filter to the repository matching this path or directory name.
    #[arg(long, value_name = "NAME")]
    pub repo: Option<String>,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

impl StatusArgs {
    pub fn run(self) -> Result<()> {
        let home: PathBuf = dirs::home_dir().context("could not determine home directory")?;
        let plan = load_plan_narrowed(&home, self.plan.as_deref(), self.repo.as_deref())?;

        let git = GitCli::new();
        let rows = survey(&plan, &git).context("status survey failed")?;
        let report = build_report(plan.defaults.host.clone(), rows);

        if self.json {
            print_json(report)?;
            return Ok(());
        }

        print_table(report);
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum RepoSignal {
    Clean,
    Dirty,
    Pending(PendingOp),
    Missing,
    NotARepo,
}

#[derive(Debug, Clone)]
struct PlanReport {
    host: String,
    queued: usize,
    attention_count: usize,
    repos: Vec<RepoStatus>,
}

#[derive(Serialize)]
struct PlanReportJson {
    summary: PlanSummaryJson,
    repos: Vec<RepoStatusJson>,
}

#[derive(Serialize)]
struct PlanSummaryJson {
    host: String,
    repos: usize,
    queued_changes: usize,
    needs_attention: usize,
}

#[derive(Serialize)]
struct RepoStatusJson {
    path: String,
    project: String,
    state: String,
    detail: String,
    branch: Option<String>,
    clean: bool,
    pending: Option<String>,
    queued: usize,
}

#[derive(Tabled)]
struct StatusTableRow {
    #[tabled(rename = "repository")]
    repository: String,
    #[tabled(rename = "state")]
    state: String,
    #[tabled(rename = "detail")]
    detail: String,
    #[tabled(rename = "branch")]
    branch: String,
    #[tabled(rename = "queued")]
    queued: usize,
}

fn build_report(host: String, rows: Vec<RepoStatus>) -> PlanReport {
    let queued = rows.iter().map(|r| r.queued).sum();
    let attention_count = rows
        .iter()
        .filter(|r| !matches!(signal_of(r), RepoSignal::Clean))
        .count();
    PlanReport {
        host,
        queued,
        attention_count,
        repos: rows,
    }
}

fn signal_of(row: &RepoStatus) -> RepoSignal {
    if !row.exists {
        RepoSignal::Missing
    } else if !row.is_repo {
        RepoSignal::NotARepo
    } else if let Some(op) = row.pending {
        RepoSignal::Pending(op)
    } else if !row.clean {
        RepoSignal::Dirty
    } else {
        RepoSignal::Clean
    }
}

/// Short name shown in the table; the same name `--repo` matches on.
fn repo_label(row: &RepoStatus) -> String {
    row.path
        .file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_else(|| row.path.display().to_string())
}

fn print_json(report: PlanReport) -> Result<()> {
    let payload = PlanReportJson {
        summary: PlanSummaryJson {
            host: report.host,
            repos: report.repos.len(),
            queued_changes: report.queued,
            needs_attention: report.attention_count,
        },
        repos: report
            .repos
            .into_iter()
            .map(|row| {
                let signal = signal_of(&row);
                RepoStatusJson {
                    path: row.path.display().to_string(),
                    project: row.project.clone(),
                    state: signal_key(&signal).to_string(),
                    detail: signal_detail(&signal),
                    branch: row.branch.clone(),
                    clean: row.clean,
                    pending: row.pending.map(|op| op.to_string()),
                    queued: row.queued,
                }
            })
            .collect(),
    };
    println!(
        "{}",
        serde_json::to_string_pretty(&payload).context("failed to serialize status JSON")?
    );
    Ok(())
}

fn print_table(report: PlanReport) {
    println!(
        "Picket v{} | {} | {} repo(s) | {} change(s) queued | {} need attention",
        env!("CARGO_PKG_VERSION"),
        report.host,
        report.repos.len(),
        report.queued,
        report.attention_count,
    );

    if report.repos.is_empty() {
        println!("Plan lists no repositories.");
        return;
    }

    let separator = "■".repeat(67).bright_black().to_string();
    println!("{separator}");
    println!(
        "Indicators: {} CLEAN  {} DIRTY  {} CONFLICT  {} MISSING  {} NOT A REPO",
        signal_indicator(&RepoSignal::Clean),
        signal_indicator(&RepoSignal::Dirty),
        signal_indicator(&RepoSignal::Pending(PendingOp::CherryPick)),
        signal_indicator(&RepoSignal::Missing),
        signal_indicator(&RepoSignal::NotARepo),
    );
    println!("{separator}");

    let table_rows: Vec<StatusTableRow> = report
        .repos
        .iter()
        .map(|row| {
            let signal = signal_of(row);
            StatusTableRow {
                repository: repo_label(row),
                state: signal_label(&signal).to_string(),
                detail: signal_detail(&signal),
                branch: row.branch.clone().unwrap_or_else(|| "-".to_string()),
                queued: row.queued,
            }
        })
        .collect();
    let mut table = Table::new(table_rows);
    table.with(Style::rounded());
    println!("{table}");
    println!("{separator}");

    if report.attention_count > 0 {
        println!("Run 'picket reset' to drive repositories back to a clean trunk.");
    }
}

fn signal_key(signal: &RepoSignal) -> &'static str {
    match signal {
        RepoSignal::Clean => "clean",
        RepoSignal::Dirty => "dirty",
        RepoSignal::Pending(_) => "conflict",
        RepoSignal::Missing => "missing",
        RepoSignal::NotARepo => "not_a_repo",
    }
}

fn signal_label(signal: &RepoSignal) -> &'static str {
    match signal {
        RepoSignal::Clean => "CLEAN",
        RepoSignal::Dirty => "DIRTY",
        RepoSignal::Pending(_) => "CONFLICT",
        RepoSignal::Missing => "MISSING",
        RepoSignal::NotARepo => "NOT A REPO",
    }
}

fn signal_indicator(signal: &RepoSignal) -> String {
    match signal {
        RepoSignal::Clean => "■".green().bold().to_string(),
        RepoSignal::Dirty => "■".yellow().bold().to_string(),
        RepoSignal::Pending(_) => "■".red().bold().to_string(),
        RepoSignal::Missing => "■".bright_black().bold().to_string(),
        RepoSignal::NotARepo => "■".magenta().bold().to_string(),
    }
}

fn signal_detail(signal: &RepoSignal) -> String {
    match signal {
        RepoSignal::Clean => "clean working tree".to_string(),
        RepoSignal::Dirty => "uncommitted changes".to_string(),
        RepoSignal::Pending(op) => format!("{op} in progress"),
        RepoSignal::Missing => "directory missing".to_string(),
        RepoSignal::NotARepo => "not a git repository".to_string(),
    }
}
