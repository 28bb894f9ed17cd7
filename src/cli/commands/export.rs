//! Export command implementation.

use crate::cli::commands::open_workspace;
use crate::cli::ExportArgs;
use crate::error::Result;
use crate::snapshot::MissionExporter;
use std::path::Path;
use tracing::info;

/// Execute the export command.
///
/// # Errors
///
/// Returns an error if the workspace cannot be opened, a selected
/// mission is missing, or the archive cannot be written.
pub fn execute(args: &ExportArgs, dir: Option<&Path>) -> Result<()> {
    let (storage, paths) = open_workspace(dir)?;

    let mission_ids = if args.missions.is_empty() {
        storage.mission_ids()?
    } else {
        args.missions.clone()
    };
    info!(missions = mission_ids.len(), output = %args.output.display(), "exporting");

    let exporter = MissionExporter::new(&storage, &paths.media_root);
    let summary = exporter.export_to_path(&mission_ids, &args.output)?;

    println!(
        "Exported {} mission{} ({} expenses, {} attachments, {} bytes) to {}",
        summary.missions,
        if summary.missions == 1 { "" } else { "s" },
        summary.expenses,
        summary.images,
        summary.archive_bytes,
        args.output.display()
    );
    Ok(())
}
