//! Init command implementation.

use crate::cli::InitArgs;
use crate::config;
use crate::error::Result;
use tracing::info;

/// Execute the init command.
///
/// # Errors
///
/// Returns an error if the workspace already exists or cannot be
/// created.
pub fn execute(args: &InitArgs) -> Result<()> {
    let parent = match &args.path {
        Some(path) => path.clone(),
        None => std::env::current_dir()?,
    };
    let paths = config::init_workspace(&parent)?;

    info!(dir = %paths.mex_dir.display(), "workspace created");
    println!("Initialized workspace in {}", paths.mex_dir.display());
    println!("  database: {}", paths.db_path.display());
    println!("  media:    {}", paths.media_root.display());
    Ok(())
}
