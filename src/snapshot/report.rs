//! Import-preview check report.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Outcome of matching one snapshot entry against the live store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Tag {
    /// Found by natural key, all watched fields match.
    Exists,
    /// Found by natural key, at least one watched field differs.
    Amend,
    /// Not found by natural key.
    Add,
}

impl Tag {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Exists => "EXISTS",
            Self::Amend => "AMEND",
            Self::Add => "ADD",
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One checked snapshot entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckEntry {
    pub section: String,
    pub key: String,
    pub tag: Tag,
    /// For `AMEND`: the first mismatching watched field, in
    /// declaration order. Later mismatches are not inspected.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amend_field: Option<String>,
}

/// Aggregated result of an import preview.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CheckReport {
    pub entries: Vec<CheckEntry>,
}

impl CheckReport {
    pub(crate) fn record(
        &mut self,
        section: &str,
        key: &str,
        tag: Tag,
        amend_field: Option<String>,
    ) {
        self.entries.push(CheckEntry {
            section: section.to_string(),
            key: key.to_string(),
            tag,
            amend_field,
        });
    }

    /// Number of entries with the given tag.
    #[must_use]
    pub fn count(&self, tag: Tag) -> usize {
        self.entries.iter().filter(|e| e.tag == tag).count()
    }

    /// Per-section (exists, amend, add) tallies, sorted by section name.
    #[must_use]
    pub fn section_totals(&self) -> BTreeMap<String, (usize, usize, usize)> {
        let mut totals: BTreeMap<String, (usize, usize, usize)> = BTreeMap::new();
        for entry in &self.entries {
            let slot = totals.entry(entry.section.clone()).or_default();
            match entry.tag {
                Tag::Exists => slot.0 += 1,
                Tag::Amend => slot.1 += 1,
                Tag::Add => slot.2 += 1,
            }
        }
        totals
    }

    /// True if an import would change nothing.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.entries.iter().all(|e| e.tag == Tag::Exists)
    }
}

impl fmt::Display for CheckReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "checked {} entries: {} EXISTS, {} AMEND, {} ADD",
            self.entries.len(),
            self.count(Tag::Exists),
            self.count(Tag::Amend),
            self.count(Tag::Add)
        )?;
        for (section, (exists, amend, add)) in self.section_totals() {
            writeln!(f, "  {section}: {exists} EXISTS, {amend} AMEND, {add} ADD")?;
        }
        for entry in self.entries.iter().filter(|e| e.tag == Tag::Amend) {
            if let Some(field) = &entry.amend_field {
                writeln!(
                    f,
                    "  amend {}[{}]: field '{field}' differs",
                    entry.section, entry.key
                )?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tallies_and_cleanliness() {
        let mut report = CheckReport::default();
        report.record("clients", "1", Tag::Exists, None);
        report.record("projects", "1", Tag::Amend, Some("notes".to_string()));
        report.record("projects", "2", Tag::Add, None);

        assert_eq!(report.count(Tag::Exists), 1);
        assert_eq!(report.count(Tag::Amend), 1);
        assert_eq!(report.count(Tag::Add), 1);
        assert!(!report.is_clean());
        assert_eq!(report.section_totals()["projects"], (0, 1, 1));
    }
}
