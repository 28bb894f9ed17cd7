//! Command implementations.

pub mod check;
pub mod demo;
pub mod export;
pub mod init;

use crate::config;
use crate::error::Result;
use crate::storage::SqliteStorage;
use std::path::Path;

/// Discover (or take the override) and open the workspace.
pub(crate) fn open_workspace(dir: Option<&Path>) -> Result<(SqliteStorage, config::ConfigPaths)> {
    let mex_dir = match dir {
        Some(path) => path.to_path_buf(),
        None => config::discover_mex_dir(None)?,
    };
    config::open_storage(&mex_dir)
}
