//! Command-line interface using clap.

pub mod commands;

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

/// Mission/expense snapshot exchange.
#[derive(Debug, Parser)]
#[command(name = "mex", version, about)]
pub struct Cli {
    /// Increase log verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Workspace directory override (skips discovery).
    #[arg(long, global = true, env = "MEX_DIR")]
    pub dir: Option<PathBuf>,

    /// Emit machine-readable JSON output.
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Create a new workspace in the current (or given) directory.
    Init(InitArgs),
    /// Seed the workspace with a deterministic sample data set.
    Demo,
    /// Export missions into a snapshot archive.
    Export(ExportArgs),
    /// Preview importing a snapshot archive (read-only diff).
    Check(CheckArgs),
}

#[derive(Debug, clap::Args)]
pub struct InitArgs {
    /// Directory to create the workspace in (default: current).
    pub path: Option<PathBuf>,
}

#[derive(Debug, clap::Args)]
pub struct ExportArgs {
    /// Mission ids to export (default: all missions).
    #[arg(long = "mission", value_name = "ID")]
    pub missions: Vec<i64>,

    /// Output archive path.
    #[arg(short, long, default_value = "snapshot.zip")]
    pub output: PathBuf,
}

#[derive(Debug, clap::Args)]
pub struct CheckArgs {
    /// Snapshot archive to preview.
    pub archive: PathBuf,
}

/// Parse-free entry point: initialize logging and dispatch.
///
/// # Errors
///
/// Returns an error if the command fails; the binary maps this to a
/// nonzero exit code.
pub fn run(cli: &Cli) -> anyhow::Result<()> {
    crate::logging::init_logging(cli.verbose, cli.quiet, None)?;

    match &cli.command {
        Commands::Init(args) => commands::init::execute(args)?,
        Commands::Demo => commands::demo::execute(cli.dir.as_deref())?,
        Commands::Export(args) => commands::export::execute(args, cli.dir.as_deref())?,
        Commands::Check(args) => commands::check::execute(args, cli.json, cli.dir.as_deref())?,
    }
    Ok(())
}
