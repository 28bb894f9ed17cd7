//! Error types for `mex`.

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, MexError>;

/// All errors surfaced by the library.
#[derive(Debug, Error)]
pub enum MexError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("validation error: {0}")]
    Validation(String),

    /// A tree entity's recorded path disagrees with the live store.
    /// Always aborts the whole import preview.
    #[error("hierarchy mismatch in '{section}' entry {key}: snapshot has '{expected}', store has '{found}'")]
    HierarchyMismatch {
        section: String,
        key: String,
        expected: String,
        found: String,
    },

    /// A natural key matched more than one live record.
    #[error("ambiguous natural key in '{section}' entry {key}: multiple records match")]
    AmbiguousKey { section: String, key: String },

    #[error("attachment '{path}' referenced by expense {expense} not found")]
    MissingImage { expense: String, path: String },

    #[error("no .mex workspace found (run 'mex init' first)")]
    NotInitialized,

    #[error("mission {id} not found")]
    MissionNotFound { id: i64 },
}
