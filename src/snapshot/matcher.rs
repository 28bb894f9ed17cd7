//! Natural-key matching of snapshot entries against the live store.
//!
//! Every section is checked in dependency order: independents first,
//! because later sections resolve their cross-section key fields
//! through the primary keys written back onto earlier sections'
//! entries. Each entry receives exactly one tag under `__check__`:
//! `EXISTS`, `AMEND` or `ADD`. Tree sections additionally verify the
//! recorded hierarchy path; a path mismatch aborts the whole preview
//! rather than tagging.

use crate::error::{MexError, Result};
use crate::model::Entity;
use crate::snapshot::report::{CheckReport, Tag};
use crate::snapshot::{Snapshot, CHECK_KEY};
use crate::storage::{Lookup, Record, SqliteStorage};
use serde_json::Value;
use tracing::{debug, trace};

/// One rule of a section's natural key.
#[derive(Debug, Clone, Copy)]
pub enum KeyField {
    /// Compare the live column against the entry's own value.
    Direct(&'static str),
    /// The entry's value under `field` is an ordinal reference into
    /// `section`; the filter value is that referenced entry's
    /// written-back primary key.
    CrossSection {
        field: &'static str,
        section: &'static str,
    },
}

/// One watched field of a section's amend list.
#[derive(Clone, Copy)]
pub enum AmendField {
    /// Compare against the live record's canonical value.
    Direct(&'static str),
    /// Compare against a value derived from the live record.
    Derived(&'static str, fn(&Record) -> Value),
}

impl AmendField {
    const fn name(&self) -> &'static str {
        match self {
            Self::Direct(name) | Self::Derived(name, _) => name,
        }
    }
}

impl std::fmt::Debug for AmendField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Direct(name) => f.debug_tuple("Direct").field(name).finish(),
            Self::Derived(name, _) => f.debug_tuple("Derived").field(name).finish(),
        }
    }
}

/// How one snapshot section is matched.
#[derive(Debug, Clone, Copy)]
pub struct SectionSpec {
    pub section: &'static str,
    pub entity: Entity,
    pub key: &'static [KeyField],
    pub amend: &'static [AmendField],
    /// Live pk column, written back onto matched entries under the
    /// same name for dependent sections.
    pub pk_field: &'static str,
    /// Tree sections verify the rendered hierarchy path.
    pub tree: bool,
}

fn from_date_value(record: &Record) -> Value {
    date_only(record, "from_date")
}

fn to_date_value(record: &Record) -> Value {
    date_only(record, "to_date")
}

/// Strip the time component off an RFC 3339 date or datetime.
fn date_only(record: &Record, field: &str) -> Value {
    match record.get(field).and_then(Value::as_str) {
        Some(text) => Value::from(text.split('T').next().unwrap_or(text)),
        None => Value::Null,
    }
}

/// Canonical (uppercase) currency code, or null.
fn currency_code(record: &Record) -> Value {
    match record.get("default_currency").and_then(Value::as_str) {
        Some(code) => Value::from(code.to_ascii_uppercase()),
        None => Value::Null,
    }
}

/// Section specifications in dependency order. Later sections resolve
/// cross-section key fields through earlier sections' written-back pks.
/// `resources` is exported for completeness but never matched.
pub static CHECK_SEQUENCE: &[SectionSpec] = &[
    SectionSpec {
        section: "clients",
        entity: Entity::Client,
        key: &[KeyField::Direct("name")],
        amend: &[],
        pk_field: "id",
        tree: false,
    },
    SectionSpec {
        section: "countries",
        entity: Entity::Country,
        key: &[KeyField::Direct("name")],
        amend: &[],
        pk_field: "id",
        tree: false,
    },
    SectionSpec {
        section: "projects",
        entity: Entity::Project,
        key: &[
            KeyField::Direct("name"),
            KeyField::CrossSection {
                field: "client",
                section: "clients",
            },
        ],
        amend: &[AmendField::Direct("notes")],
        pk_field: "id",
        tree: false,
    },
    SectionSpec {
        section: "cities",
        entity: Entity::City,
        key: &[
            KeyField::Direct("name"),
            KeyField::CrossSection {
                field: "country",
                section: "countries",
            },
        ],
        amend: &[],
        pk_field: "id",
        tree: false,
    },
    SectionSpec {
        section: "currencies",
        entity: Entity::Currency,
        key: &[KeyField::Direct("title")],
        amend: &[
            AmendField::Direct("symbol"),
            AmendField::Direct("base"),
            AmendField::Direct("fractional_unit"),
            AmendField::Direct("decimals"),
        ],
        pk_field: "iso3",
        tree: false,
    },
    SectionSpec {
        section: "categories",
        entity: Entity::ExpenseCategory,
        key: &[KeyField::Direct("title")],
        amend: &[AmendField::Direct("active")],
        pk_field: "id",
        tree: true,
    },
    SectionSpec {
        section: "payment_types",
        entity: Entity::PaymentCategory,
        key: &[KeyField::Direct("title")],
        amend: &[AmendField::Direct("active")],
        pk_field: "id",
        tree: true,
    },
    SectionSpec {
        section: "missions",
        entity: Entity::Mission,
        key: &[KeyField::Direct("number"), KeyField::Direct("year")],
        amend: &[
            AmendField::Direct("title"),
            AmendField::Derived("from_date", from_date_value),
            AmendField::Derived("to_date", to_date_value),
            AmendField::Derived("default_currency", currency_code),
        ],
        pk_field: "id",
        tree: false,
    },
    SectionSpec {
        section: "expenses",
        entity: Entity::Expense,
        key: &[
            KeyField::Direct("day"),
            KeyField::Direct("amount_currency"),
            KeyField::Direct("amount_base"),
            KeyField::Direct("amount_reimbursement"),
            KeyField::Direct("detail"),
            KeyField::Direct("created_ts"),
            KeyField::Direct("modified_ts"),
            KeyField::Direct("currency"),
            KeyField::Direct("category"),
            KeyField::Direct("payment_type"),
            KeyField::Direct("document_type"),
            KeyField::Direct("reimbursement"),
        ],
        amend: &[],
        pk_field: "id",
        tree: false,
    },
];

/// Run the matcher over every section in dependency order.
///
/// Annotates the snapshot in place and returns the check report.
///
/// # Errors
///
/// Returns a hard error on a hierarchy mismatch or an ambiguous
/// natural key; sections after the failure point are left untouched.
pub fn preview(storage: &SqliteStorage, snapshot: &mut Snapshot) -> Result<CheckReport> {
    let mut report = CheckReport::default();
    for spec in CHECK_SEQUENCE {
        check_section(storage, spec, snapshot, &mut report)?;
    }
    Ok(report)
}

/// Tag every entry of one section.
///
/// # Errors
///
/// Returns a hard error on a hierarchy mismatch or an ambiguous key.
pub fn check_section(
    storage: &SqliteStorage,
    spec: &SectionSpec,
    snapshot: &mut Snapshot,
    report: &mut CheckReport,
) -> Result<()> {
    let keys: Vec<String> = snapshot.section(spec.section).keys().cloned().collect();
    debug!(section = spec.section, entries = keys.len(), "checking section");

    for key in keys {
        let filter = resolve_key(spec, &key, snapshot);

        let live = match filter {
            Some(filter) => match storage.lookup(spec.entity, &filter)? {
                Lookup::One(record) => Some(record),
                Lookup::Missing => None,
                Lookup::Many => {
                    return Err(MexError::AmbiguousKey {
                        section: spec.section.to_string(),
                        key,
                    })
                }
            },
            None => None,
        };

        let Some(live) = live else {
            trace!(section = spec.section, key = %key, "no live match");
            annotate(snapshot, spec, &key, Tag::Add);
            report.record(spec.section, &key, Tag::Add, None);
            continue;
        };

        if spec.tree {
            verify_hierarchy(storage, spec, snapshot, &key, &live)?;
        }

        let mut tag = Tag::Exists;
        let mut amend_field = None;
        for rule in spec.amend {
            let live_value = match rule {
                AmendField::Direct(name) => live.get(*name).cloned().unwrap_or(Value::Null),
                AmendField::Derived(_, derive) => derive(&live),
            };
            let snapshot_value = snapshot
                .section(spec.section)
                .get(&key)
                .and_then(|entry| entry.get(rule.name()))
                .cloned()
                .unwrap_or(Value::Null);
            if snapshot_value != live_value {
                tag = Tag::Amend;
                amend_field = Some(rule.name().to_string());
                break;
            }
        }

        let pk = live.get(spec.pk_field).cloned().unwrap_or(Value::Null);
        write_back(snapshot, spec, &key, &pk);
        annotate(snapshot, spec, &key, tag);
        report.record(spec.section, &key, tag, amend_field);
    }
    Ok(())
}

/// Build the lookup filter for one entry, or `None` when the key
/// cannot be resolved (classified as `ADD` by the caller).
fn resolve_key(spec: &SectionSpec, key: &str, snapshot: &Snapshot) -> Option<Vec<(String, Value)>> {
    let entry = snapshot.section(spec.section).get(key)?.as_object()?;

    let mut filter = Vec::with_capacity(spec.key.len());
    for rule in spec.key {
        match rule {
            KeyField::Direct(name) => {
                filter.push((
                    (*name).to_string(),
                    entry.get(*name).cloned().unwrap_or(Value::Null),
                ));
            }
            KeyField::CrossSection { field, section } => {
                let reference = entry.get(*field)?;
                let ref_key = match reference {
                    Value::Number(n) => n.to_string(),
                    Value::String(s) => s.clone(),
                    _ => return None,
                };
                let referenced = snapshot.section(section).get(&ref_key)?.as_object()?;
                // exported entries carry their source-store pk; only a
                // matched entry's pk refers to this store
                let tag = referenced.get(CHECK_KEY).and_then(Value::as_str)?;
                if tag != Tag::Exists.as_str() && tag != Tag::Amend.as_str() {
                    return None;
                }
                let pk = referenced.get(section_pk(section))?;
                if pk.is_null() {
                    return None;
                }
                filter.push(((*field).to_string(), pk.clone()));
            }
        }
    }
    Some(filter)
}

/// Pk field of a section, per its spec.
fn section_pk(section: &str) -> &'static str {
    CHECK_SEQUENCE
        .iter()
        .find(|spec| spec.section == section)
        .map_or("id", |spec| spec.pk_field)
}

/// Compare the live record's rendered hierarchy path against the
/// entry's recorded one. A mismatch is a hard failure.
fn verify_hierarchy(
    storage: &SqliteStorage,
    spec: &SectionSpec,
    snapshot: &Snapshot,
    key: &str,
    live: &Record,
) -> Result<()> {
    let id = live.get("id").and_then(Value::as_i64).ok_or_else(|| {
        MexError::Validation(format!("{} record without id", spec.entity.table()))
    })?;
    let found = storage.render_path(spec.entity, id)?;
    let expected = snapshot
        .section(spec.section)
        .get(key)
        .and_then(|entry| entry.get("tree"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    if expected != found {
        return Err(MexError::HierarchyMismatch {
            section: spec.section.to_string(),
            key: key.to_string(),
            expected,
            found,
        });
    }
    Ok(())
}

fn annotate(snapshot: &mut Snapshot, spec: &SectionSpec, key: &str, tag: Tag) {
    if let Some(entry) = snapshot
        .section_mut(spec.section)
        .get_mut(key)
        .and_then(Value::as_object_mut)
    {
        entry.insert(CHECK_KEY.to_string(), Value::from(tag.as_str()));
    }
}

fn write_back(snapshot: &mut Snapshot, spec: &SectionSpec, key: &str, pk: &Value) {
    if let Some(entry) = snapshot
        .section_mut(spec.section)
        .get_mut(key)
        .and_then(Value::as_object_mut)
    {
        entry.insert(spec.pk_field.to_string(), pk.clone());
    }
}
