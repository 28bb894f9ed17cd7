//! Snapshot archive writer.
//!
//! Walks the selected missions' relations to collect the closed set of
//! referenced records, serializes them section by section into
//! `data.json`, and packages the document plus expense attachments
//! into a deflated zip archive built in memory.

use crate::error::{MexError, Result};
use crate::model::Entity;
use crate::snapshot::{sha256_hex, Snapshot, DATA_MEMBER};
use crate::storage::{Record, SqliteStorage};
use serde_json::Value;
use std::collections::BTreeMap;
use std::io::{Cursor, Write};
use std::path::Path;
use tracing::{debug, info};
use zip::write::FileOptions;

/// Result of an export run.
#[derive(Debug, Clone, Copy)]
pub struct ExportSummary {
    pub missions: usize,
    pub expenses: usize,
    pub images: usize,
    /// Size of the produced archive in bytes.
    pub archive_bytes: usize,
}

/// Serializes missions and their related records into a snapshot
/// archive. Read-only with respect to the store.
pub struct MissionExporter<'a> {
    storage: &'a SqliteStorage,
    media_root: &'a Path,
}

impl<'a> MissionExporter<'a> {
    #[must_use]
    pub fn new(storage: &'a SqliteStorage, media_root: &'a Path) -> Self {
        Self {
            storage,
            media_root,
        }
    }

    /// Export the given missions into an in-memory archive.
    ///
    /// # Errors
    ///
    /// Returns an error if a mission is missing, a referenced record is
    /// dangling, or a referenced attachment is absent from the media
    /// root.
    pub fn export(&self, mission_ids: &[i64]) -> Result<(Vec<u8>, ExportSummary)> {
        let mut snapshot = Snapshot::empty();
        let mut images: BTreeMap<String, Vec<u8>> = BTreeMap::new();
        let mut expense_count = 0usize;

        for &mission_id in mission_ids {
            let mission = self
                .storage
                .fetch(Entity::Mission, &Value::from(mission_id))?
                .ok_or(MexError::MissionNotFound { id: mission_id })?;
            debug!(mission = mission_id, "exporting mission");

            if let Some(currency) = mission.get("default_currency").cloned() {
                if !currency.is_null() {
                    self.add_record(&mut snapshot, "currencies", Entity::Currency, &currency)?;
                }
            }
            let project = self.add_record(
                &mut snapshot,
                "projects",
                Entity::Project,
                &mission["project"],
            )?;
            self.add_record(&mut snapshot, "clients", Entity::Client, &project["client"])?;
            let city =
                self.add_record(&mut snapshot, "cities", Entity::City, &mission["city"])?;
            self.add_record(
                &mut snapshot,
                "countries",
                Entity::Country,
                &city["country"],
            )?;
            self.add_record(
                &mut snapshot,
                "resources",
                Entity::Resource,
                &mission["resource"],
            )?;

            for expense in self.storage.expenses_for_mission(mission_id)? {
                expense_count += 1;
                let mut record = self
                    .storage
                    .fetch(Entity::Expense, &Value::from(expense.id))?
                    .ok_or_else(|| {
                        MexError::Validation(format!("expense {} vanished mid-export", expense.id))
                    })?;

                self.add_record(
                    &mut snapshot,
                    "currencies",
                    Entity::Currency,
                    &record["currency"],
                )?;
                let category_id = record["category"].clone();
                self.add_record(
                    &mut snapshot,
                    "categories",
                    Entity::ExpenseCategory,
                    &category_id,
                )?;
                self.annotate_tree(
                    &mut snapshot,
                    "categories",
                    Entity::ExpenseCategory,
                    &category_id,
                )?;
                let payment_id = record["payment_type"].clone();
                self.add_record(
                    &mut snapshot,
                    "payment_types",
                    Entity::PaymentCategory,
                    &payment_id,
                )?;
                self.annotate_tree(
                    &mut snapshot,
                    "payment_types",
                    Entity::PaymentCategory,
                    &payment_id,
                )?;

                if let Some(image) = record.get("image").and_then(Value::as_str) {
                    let (name, bytes) = self.load_image(expense.id, image)?;
                    record.insert("image_sha256".to_string(), Value::from(sha256_hex(&bytes)));
                    record.insert("image".to_string(), Value::from(name.clone()));
                    images.insert(name, bytes);
                }

                snapshot
                    .section_mut("expenses")
                    .insert(expense.id.to_string(), Value::Object(record));
            }

            snapshot
                .section_mut("missions")
                .insert(mission_id.to_string(), Value::Object(mission));
        }

        let archive = build_archive(&snapshot, &images)?;
        let summary = ExportSummary {
            missions: mission_ids.len(),
            expenses: expense_count,
            images: images.len(),
            archive_bytes: archive.len(),
        };
        info!(
            missions = summary.missions,
            expenses = summary.expenses,
            images = summary.images,
            "export complete"
        );
        Ok((archive, summary))
    }

    /// Export straight to a file.
    ///
    /// # Errors
    ///
    /// As [`Self::export`], plus I/O errors writing the file.
    pub fn export_to_path(&self, mission_ids: &[i64], out: &Path) -> Result<ExportSummary> {
        let (archive, summary) = self.export(mission_ids)?;
        std::fs::write(out, archive)?;
        Ok(summary)
    }

    /// Add a record to a section once, keyed by its primary key.
    /// Returns the section's record for the key.
    fn add_record(
        &self,
        snapshot: &mut Snapshot,
        section: &str,
        entity: Entity,
        pk: &Value,
    ) -> Result<Record> {
        let key = match pk {
            Value::Number(n) => n.to_string(),
            Value::String(s) => s.clone(),
            other => {
                return Err(MexError::Validation(format!(
                    "invalid {section} reference {other}"
                )))
            }
        };

        if let Some(existing) = snapshot.section(section).get(&key).and_then(Value::as_object) {
            return Ok(existing.clone());
        }

        let record = self.storage.fetch(entity, pk)?.ok_or_else(|| {
            MexError::Validation(format!("dangling {section} reference {key}"))
        })?;
        snapshot
            .section_mut(section)
            .insert(key, Value::Object(record.clone()));
        Ok(record)
    }

    /// Record a tree entity's rendered hierarchy path on its entry.
    fn annotate_tree(
        &self,
        snapshot: &mut Snapshot,
        section: &str,
        entity: Entity,
        pk: &Value,
    ) -> Result<()> {
        let id = pk.as_i64().ok_or_else(|| {
            MexError::Validation(format!("invalid {section} reference {pk}"))
        })?;
        let path = self.storage.render_path(entity, id)?;
        if let Some(entry) = snapshot
            .section_mut(section)
            .get_mut(&id.to_string())
            .and_then(Value::as_object_mut)
        {
            entry.insert("tree".to_string(), Value::from(path));
        }
        Ok(())
    }

    /// Read an attachment from the media root; returns its archive
    /// name and contents.
    fn load_image(&self, expense: i64, image: &str) -> Result<(String, Vec<u8>)> {
        let source = self.media_root.join(image);
        let name = Path::new(image)
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| MexError::Validation(format!("invalid attachment path {image}")))?
            .to_string();
        let bytes = std::fs::read(&source).map_err(|_| MexError::MissingImage {
            expense: expense.to_string(),
            path: source.display().to_string(),
        })?;
        Ok((name, bytes))
    }
}

/// Package the document and attachments into a deflated zip. The
/// `images/` directory member is always present, required by the
/// importer's validator.
fn build_archive(snapshot: &Snapshot, images: &BTreeMap<String, Vec<u8>>) -> Result<Vec<u8>> {
    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    zip.add_directory("images", options)?;
    for (name, bytes) in images {
        zip.start_file(format!("images/{name}"), options)?;
        zip.write_all(bytes)?;
    }
    zip.start_file(DATA_MEMBER, options)?;
    zip.write_all(snapshot.to_json()?.as_bytes())?;

    let cursor = zip.finish()?;
    Ok(cursor.into_inner())
}
