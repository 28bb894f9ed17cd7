//! Check command implementation: read-only import preview.

use crate::cli::commands::open_workspace;
use crate::cli::CheckArgs;
use crate::error::Result;
use crate::snapshot::MissionImporter;
use std::path::Path;
use tracing::info;

/// Execute the check command.
///
/// # Errors
///
/// Returns an error on a malformed archive, a hierarchy mismatch or an
/// ambiguous natural key. Field drift and unmatched entries are
/// reported as tags, not errors.
pub fn execute(args: &CheckArgs, json: bool, dir: Option<&Path>) -> Result<()> {
    let (storage, _paths) = open_workspace(dir)?;

    let importer = MissionImporter::new(&args.archive);
    let (snapshot, report) = importer.preview(&storage)?;
    info!(entries = report.entries.len(), "preview complete");

    if json {
        println!("{}", serde_json::to_string_pretty(&snapshot.to_value())?);
    } else {
        print!("{report}");
        if report.is_clean() {
            println!("Archive matches the live store; an import would change nothing.");
        }
    }
    Ok(())
}
