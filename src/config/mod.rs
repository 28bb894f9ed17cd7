//! Workspace discovery and metadata for `mex`.
//!
//! A workspace is a `.mex` directory holding the database, the media
//! root for expense attachments, and a `metadata.json` describing
//! both. Discovery honors `MEX_DIR` when set, otherwise walks up from
//! the working directory.

use crate::error::{MexError, Result};
use crate::storage::SqliteStorage;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Default database filename used when metadata is missing.
const DEFAULT_DB_FILENAME: &str = "mex.db";
/// Default media directory used when metadata is missing.
const DEFAULT_MEDIA_DIRNAME: &str = "media";

/// Startup metadata describing DB + media paths.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Metadata {
    pub database: String,
    pub media_dir: String,
}

impl Default for Metadata {
    fn default() -> Self {
        Self {
            database: DEFAULT_DB_FILENAME.to_string(),
            media_dir: DEFAULT_MEDIA_DIRNAME.to_string(),
        }
    }
}

impl Metadata {
    /// Load metadata.json from the workspace directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(mex_dir: &Path) -> Result<Self> {
        let path = mex_dir.join("metadata.json");
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(&path)?;
        let mut metadata: Self = serde_json::from_str(&contents)?;

        if metadata.database.trim().is_empty() {
            metadata.database = DEFAULT_DB_FILENAME.to_string();
        }
        if metadata.media_dir.trim().is_empty() {
            metadata.media_dir = DEFAULT_MEDIA_DIRNAME.to_string();
        }

        Ok(metadata)
    }

    /// Write metadata.json into the workspace directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save(&self, mex_dir: &Path) -> Result<()> {
        let path = mex_dir.join("metadata.json");
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

/// Resolved paths for this workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigPaths {
    pub mex_dir: PathBuf,
    pub db_path: PathBuf,
    pub media_root: PathBuf,
    pub metadata: Metadata,
}

impl ConfigPaths {
    /// Resolve database + media paths using metadata.
    ///
    /// # Errors
    ///
    /// Returns an error if metadata cannot be read.
    pub fn resolve(mex_dir: &Path) -> Result<Self> {
        let metadata = Metadata::load(mex_dir)?;
        let db_path = mex_dir.join(&metadata.database);
        let media_root = mex_dir.join(&metadata.media_dir);

        Ok(Self {
            mex_dir: mex_dir.to_path_buf(),
            db_path,
            media_root,
            metadata,
        })
    }
}

/// Discover the active `.mex` directory.
///
/// Honors `MEX_DIR` when set, otherwise walks up from `start` (or CWD).
///
/// # Errors
///
/// Returns an error if no workspace is found or the CWD cannot be read.
pub fn discover_mex_dir(start: Option<&Path>) -> Result<PathBuf> {
    if let Ok(value) = env::var("MEX_DIR") {
        if !value.trim().is_empty() {
            let path = PathBuf::from(value);
            if path.is_dir() {
                return Ok(path);
            }
        }
    }

    let mut current = match start {
        Some(path) => path.to_path_buf(),
        None => env::current_dir()?,
    };

    loop {
        let candidate = current.join(".mex");
        if candidate.is_dir() {
            return Ok(candidate);
        }

        if !current.pop() {
            break;
        }
    }

    Err(MexError::NotInitialized)
}

/// Open storage using resolved config paths, returning the storage and
/// the paths used.
///
/// # Errors
///
/// Returns an error if metadata cannot be read or the database cannot
/// be opened.
pub fn open_storage(mex_dir: &Path) -> Result<(SqliteStorage, ConfigPaths)> {
    let paths = ConfigPaths::resolve(mex_dir)?;
    let storage = SqliteStorage::open(&paths.db_path)?;
    Ok((storage, paths))
}

/// Create a fresh workspace under `parent`: the `.mex` directory,
/// metadata, database (schema applied) and media directory.
///
/// # Errors
///
/// Returns a config error if a workspace already exists there.
pub fn init_workspace(parent: &Path) -> Result<ConfigPaths> {
    let mex_dir = parent.join(".mex");
    if mex_dir.exists() {
        return Err(MexError::Config(format!(
            "workspace already exists at {}",
            mex_dir.display()
        )));
    }
    fs::create_dir_all(&mex_dir)?;

    let metadata = Metadata::default();
    metadata.save(&mex_dir)?;

    let paths = ConfigPaths::resolve(&mex_dir)?;
    fs::create_dir_all(&paths.media_root)?;
    SqliteStorage::open(&paths.db_path)?;
    Ok(paths)
}
