//! `SQLite` live-store layer for `mex`.
//!
//! The matcher treats this as an opaque keyed store: a natural-key
//! `lookup` returning at most one record, and a `render_path` for tree
//! entities. Records cross the boundary in their canonical JSON
//! representation, fixed by the entity registry.
//!
//! # Submodules
//!
//! - [`schema`] - Database schema definitions
//! - [`sqlite`] - Main `SQLite` storage implementation

pub mod schema;
pub mod sqlite;

pub use sqlite::{Lookup, Record, SqliteStorage};
