//! Snapshot archives: format, validation, export and import preview.
//!
//! A snapshot is a zip archive with two required members: `data.json`,
//! a JSON object keyed by section name where each section maps a
//! snapshot-local ordinal id to a field map, and an `images/` directory
//! holding expense attachments. Anything else is rejected before any
//! diffing begins.
//!
//! # Submodules
//!
//! - [`export`] - `MissionExporter`: records + attachments -> archive
//! - [`matcher`] - natural-key resolution and EXISTS/AMEND/ADD tagging
//! - [`report`] - the check report produced by an import preview

pub mod export;
pub mod matcher;
pub mod report;

pub use export::{ExportSummary, MissionExporter};
pub use matcher::{preview, AmendField, KeyField, SectionSpec, CHECK_SEQUENCE};
pub use report::{CheckEntry, CheckReport, Tag};

use crate::error::{MexError, Result};
use crate::storage::SqliteStorage;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::fmt::Write as _;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Manifest member name inside the archive.
pub const DATA_MEMBER: &str = "data.json";
/// Attachment directory member name inside the archive.
pub const IMAGES_MEMBER: &str = "images/";

/// Section names in the order they appear in `data.json`.
pub const SECTIONS: &[&str] = &[
    "clients",
    "countries",
    "projects",
    "cities",
    "resources",
    "currencies",
    "categories",
    "payment_types",
    "missions",
    "expenses",
];

/// Key under which the matcher records an entry's tag.
pub const CHECK_KEY: &str = "__check__";

/// A parsed `data.json` document.
///
/// Entries are annotated in place by the matcher; the document is
/// transient and never written back to the store.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    sections: Map<String, Value>,
}

impl Snapshot {
    /// Parse and validate a `data.json` document.
    ///
    /// All sections must be present and be objects of objects; every
    /// key outside `currencies` (whose records key by ISO code) must be
    /// an ordinal id.
    ///
    /// # Errors
    ///
    /// Returns a validation error on any structural problem.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let document: Value = serde_json::from_slice(bytes)?;
        let Value::Object(sections) = document else {
            return Err(MexError::Validation("data.json must be a JSON object".into()));
        };

        for &name in SECTIONS {
            let Some(section) = sections.get(name) else {
                return Err(MexError::Validation(format!("missing section '{name}'")));
            };
            let Value::Object(entries) = section else {
                return Err(MexError::Validation(format!(
                    "section '{name}' must be an object"
                )));
            };
            for (key, entry) in entries {
                if name != "currencies" && key.parse::<i64>().is_err() {
                    return Err(MexError::Validation(format!(
                        "section '{name}' key '{key}' is not an ordinal id"
                    )));
                }
                if !entry.is_object() {
                    return Err(MexError::Validation(format!(
                        "section '{name}' entry {key} must be an object"
                    )));
                }
            }
        }

        Ok(Self { sections })
    }

    /// Start an empty document with all sections present.
    #[must_use]
    pub fn empty() -> Self {
        let mut sections = Map::new();
        for &name in SECTIONS {
            sections.insert(name.to_string(), Value::Object(Map::new()));
        }
        Self { sections }
    }

    /// Borrow a section's entries.
    ///
    /// # Panics
    ///
    /// Never panics for section names in [`SECTIONS`]; construction
    /// guarantees their presence.
    #[must_use]
    pub fn section(&self, name: &str) -> &Map<String, Value> {
        self.sections
            .get(name)
            .and_then(Value::as_object)
            .unwrap_or_else(|| unreachable!("validated section '{name}'"))
    }

    /// Mutably borrow a section's entries.
    pub fn section_mut(&mut self, name: &str) -> &mut Map<String, Value> {
        self.sections
            .get_mut(name)
            .and_then(Value::as_object_mut)
            .unwrap_or_else(|| unreachable!("validated section '{name}'"))
    }

    /// The document as a JSON value.
    #[must_use]
    pub fn to_value(&self) -> Value {
        Value::Object(self.sections.clone())
    }

    /// Serialize the document compactly.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.sections)?)
    }
}

/// Import-preview driver for a snapshot archive on disk.
pub struct MissionImporter {
    path: PathBuf,
}

impl MissionImporter {
    #[must_use]
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    /// Check that the file is a zip archive with the required members.
    ///
    /// # Errors
    ///
    /// Returns a validation error for anything that is not a snapshot
    /// archive. Runs before any parsing or diffing.
    pub fn validate(&self) -> Result<()> {
        let file = File::open(&self.path)?;
        let archive = zip::ZipArchive::new(file).map_err(|_| {
            MexError::Validation(format!("{} is not a zip archive", self.path.display()))
        })?;

        let names: Vec<&str> = archive.file_names().collect();
        for required in [DATA_MEMBER, IMAGES_MEMBER] {
            if !names.contains(&required) {
                return Err(MexError::Validation(format!(
                    "{} does not look like a valid snapshot archive (missing {required})",
                    self.path.display()
                )));
            }
        }
        Ok(())
    }

    /// Validate the archive and parse its `data.json`.
    ///
    /// # Errors
    ///
    /// Returns a validation error on a malformed archive or document.
    pub fn read(&self) -> Result<Snapshot> {
        self.validate()?;

        let file = File::open(&self.path)?;
        let mut archive = zip::ZipArchive::new(file)?;
        let mut bytes = Vec::new();
        archive.by_name(DATA_MEMBER)?.read_to_end(&mut bytes)?;

        let snapshot = Snapshot::from_slice(&bytes)?;
        self.verify_images(&mut archive, &snapshot)?;
        Ok(snapshot)
    }

    /// Run the full import preview: parse, then tag every entry
    /// against the live store. Read-only with respect to the store.
    ///
    /// # Errors
    ///
    /// Returns a validation error on a malformed archive, and a hard
    /// error on a hierarchy mismatch or ambiguous natural key; field
    /// drift and unmatched entries are reported as tags instead.
    pub fn preview(&self, storage: &SqliteStorage) -> Result<(Snapshot, CheckReport)> {
        let mut snapshot = self.read()?;
        tracing::info!(archive = %self.path.display(), "running import preview");
        let report = matcher::preview(storage, &mut snapshot)?;
        Ok((snapshot, report))
    }

    /// Verify that every referenced attachment is present and matches
    /// its recorded checksum.
    fn verify_images(
        &self,
        archive: &mut zip::ZipArchive<File>,
        snapshot: &Snapshot,
    ) -> Result<()> {
        for (key, entry) in snapshot.section("expenses") {
            let Some(entry) = entry.as_object() else {
                continue;
            };
            let Some(name) = entry.get("image").and_then(Value::as_str) else {
                continue;
            };

            let member = format!("images/{name}");
            let mut bytes = Vec::new();
            archive
                .by_name(&member)
                .map_err(|_| {
                    MexError::Validation(format!(
                        "expense {key} references missing attachment {member}"
                    ))
                })?
                .read_to_end(&mut bytes)?;

            if let Some(expected) = entry.get("image_sha256").and_then(Value::as_str) {
                let actual = sha256_hex(&bytes);
                if actual != expected {
                    return Err(MexError::Validation(format!(
                        "checksum mismatch for {member} (expected {expected}, got {actual})"
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Lowercase hex SHA-256 digest.
#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    let mut out = String::with_capacity(64);
    for byte in digest {
        let _ = write!(out, "{byte:02x}");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_has_all_sections() {
        let snapshot = Snapshot::empty();
        for &name in SECTIONS {
            assert!(snapshot.section(name).is_empty());
        }
    }

    #[test]
    fn parse_rejects_missing_section() {
        let err = Snapshot::from_slice(b"{\"clients\": {}}").unwrap_err();
        assert!(err.to_string().contains("missing section"));
    }

    #[test]
    fn parse_rejects_non_ordinal_keys() {
        let mut snapshot = Snapshot::empty().to_value();
        snapshot["clients"]["abc"] = serde_json::json!({"name": "x"});
        let bytes = serde_json::to_vec(&snapshot).unwrap();
        let err = Snapshot::from_slice(&bytes).unwrap_err();
        assert!(err.to_string().contains("not an ordinal id"));
    }

    #[test]
    fn currency_keys_may_be_codes() {
        let mut snapshot = Snapshot::empty().to_value();
        snapshot["currencies"]["EUR"] = serde_json::json!({"title": "Euro"});
        let bytes = serde_json::to_vec(&snapshot).unwrap();
        assert!(Snapshot::from_slice(&bytes).is_ok());
    }

    #[test]
    fn sha256_hex_known_vector() {
        assert_eq!(
            sha256_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
