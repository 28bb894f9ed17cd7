#![allow(dead_code)]

use mex::storage::SqliteStorage;
use std::sync::Once;
use tempfile::TempDir;

pub mod cli;
pub mod fixtures;

static INIT: Once = Once::new();

pub fn init_test_logging() {
    INIT.call_once(|| {
        mex::logging::init_test_logging();
    });
}

pub fn test_db() -> SqliteStorage {
    init_test_logging();
    SqliteStorage::open_memory().expect("Failed to create test database")
}

/// In-memory store plus a temp directory usable as a media root.
pub fn test_db_with_media() -> (SqliteStorage, TempDir) {
    let storage = test_db();
    let media = TempDir::new().expect("Failed to create media dir");
    (storage, media)
}
