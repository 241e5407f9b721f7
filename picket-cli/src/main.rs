//! `picket` — apply and reset Gerrit changes across multiple repositories.
//!
//! ```text
//! picket apply                     # apply the plan's queued changes
//! picket apply --repo frontend     # one repository only
//! picket apply --dry-run           # report every command, touch nothing
//! picket reset --force             # drive every repository back to trunk
//! picket status --json             # machine-readable plan survey
//! ```
//!
//! The plan lives at `~/.picket/plan.yaml` unless `--plan` says otherwise;
//! every mutating run writes a journal under `~/.picket/logs/`.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{apply::ApplyArgs, reset::ResetArgs, status::StatusArgs};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "picket",
    version,
    about = "Apply and reset Gerrit changes across multiple repositories",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Fetch and cherry-pick every queued change, repository by repository.
    Apply(ApplyArgs),

    /// Return every plan repository to a clean trunk.
    Reset(ResetArgs),

    /// Show what state each plan repository is in.
    Status(StatusArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Apply(args) => args.run(),
        Commands::Reset(args) => args.run(),
        Commands::Status(args) => args.run(),
    }
}
