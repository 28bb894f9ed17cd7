//! `SQLite` storage implementation.
//!
//! The live store the matcher diffs snapshots against. All reads used
//! by the reconciliation core go through the entity registry
//! ([`Entity`]), which fixes each record's canonical JSON
//! representation: registry columns in order, booleans decoded from
//! their INTEGER storage.

use crate::error::{MexError, Result};
use crate::model::{
    City, Client, Country, Currency, DocumentType, Entity, Expense, ExpenseCategory, Mission,
    PaymentCategory, Project, Reimbursement, Resource,
};
use crate::storage::schema::apply_schema;
use rusqlite::types::ValueRef;
use rusqlite::Connection;
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::path::Path;

/// A live record in its canonical external representation.
pub type Record = Map<String, Value>;

/// Outcome of a natural-key lookup.
#[derive(Debug)]
pub enum Lookup {
    /// No live record matches the filter.
    Missing,
    /// Exactly one live record matches.
    One(Record),
    /// The filter is satisfied by more than one record.
    Many,
}

/// SQLite-based live store.
#[derive(Debug)]
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Open a connection to the database at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established or
    /// schema application fails.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        apply_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Open an in-memory database for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        apply_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Insert a record given in canonical representation.
    ///
    /// # Errors
    ///
    /// Returns an error on constraint violation or unknown fields.
    pub fn insert(&self, entity: Entity, record: &Record) -> Result<()> {
        let columns = entity.columns();
        for key in record.keys() {
            if !columns.contains(&key.as_str()) {
                return Err(MexError::Validation(format!(
                    "unknown field '{key}' for {}",
                    entity.table()
                )));
            }
        }

        let placeholders = vec!["?"; columns.len()].join(", ");
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            entity.table(),
            columns.join(", "),
            placeholders
        );

        let mut params: Vec<rusqlite::types::Value> = Vec::with_capacity(columns.len());
        for col in columns {
            params.push(to_sql_value(record.get(*col).unwrap_or(&Value::Null))?);
        }
        self.conn
            .execute(&sql, rusqlite::params_from_iter(params))?;
        Ok(())
    }

    /// Fetch one record by primary key, in canonical representation.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn fetch(&self, entity: Entity, pk: &Value) -> Result<Option<Record>> {
        match self.lookup(entity, &[(entity.pk().to_string(), pk.clone())])? {
            Lookup::One(record) => Ok(Some(record)),
            Lookup::Missing => Ok(None),
            // pk columns are unique by schema
            Lookup::Many => Err(MexError::Validation(format!(
                "duplicate primary key in {}",
                entity.table()
            ))),
        }
    }

    /// Look a record up by a field -> value filter.
    ///
    /// Predicates use SQLite's null-safe `IS`, so a `null` filter value
    /// matches a NULL column. Filter fields must be registry columns.
    ///
    /// # Errors
    ///
    /// Returns an error on unknown filter fields or query failure.
    pub fn lookup(&self, entity: Entity, filter: &[(String, Value)]) -> Result<Lookup> {
        let columns = entity.columns();
        let mut clauses = Vec::with_capacity(filter.len());
        let mut params: Vec<rusqlite::types::Value> = Vec::with_capacity(filter.len());
        for (field, value) in filter {
            if !columns.contains(&field.as_str()) {
                return Err(MexError::Validation(format!(
                    "unknown lookup field '{field}' for {}",
                    entity.table()
                )));
            }
            clauses.push(format!("{field} IS ?"));
            params.push(to_sql_value(value)?);
        }

        let sql = format!(
            "SELECT {} FROM {} WHERE {} LIMIT 2",
            columns.join(", "),
            entity.table(),
            clauses.join(" AND ")
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(rusqlite::params_from_iter(params))?;

        let Some(row) = rows.next()? else {
            return Ok(Lookup::Missing);
        };
        let record = row_to_record(entity, row)?;
        if rows.next()?.is_some() {
            return Ok(Lookup::Many);
        }
        Ok(Lookup::One(record))
    }

    /// Render the root-to-node hierarchy path of a tree entity,
    /// joining ancestor titles with `:`.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not tree-structured, a node is
    /// missing, or the parent chain contains a cycle.
    pub fn render_path(&self, entity: Entity, id: i64) -> Result<String> {
        if !entity.is_tree() {
            return Err(MexError::Validation(format!(
                "{} is not a tree entity",
                entity.table()
            )));
        }

        let mut titles = Vec::new();
        let mut seen = HashSet::new();
        let mut current = Some(id);
        while let Some(node) = current {
            if !seen.insert(node) {
                return Err(MexError::Validation(format!(
                    "cycle in {} parent chain at id {node}",
                    entity.table()
                )));
            }
            let record = self
                .fetch(entity, &Value::from(node))?
                .ok_or_else(|| MexError::Validation(format!(
                    "missing {} node {node}",
                    entity.table()
                )))?;
            let title = record
                .get("title")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            titles.push(title);
            current = record.get("parent").and_then(Value::as_i64);
        }

        titles.reverse();
        Ok(titles.join(":"))
    }

    /// Number of rows in an entity's table.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn count(&self, entity: Entity) -> Result<i64> {
        let sql = format!("SELECT COUNT(*) FROM {}", entity.table());
        Ok(self.conn.query_row(&sql, [], |row| row.get(0))?)
    }

    /// All mission ids, ascending.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn mission_ids(&self) -> Result<Vec<i64>> {
        let mut stmt = self.conn.prepare("SELECT id FROM missions ORDER BY id")?;
        let ids = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<i64>>>()?;
        Ok(ids)
    }

    /// Expenses attached to a mission, ascending by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a row is malformed.
    pub fn expenses_for_mission(&self, mission: i64) -> Result<Vec<Expense>> {
        let columns = Entity::Expense.columns().join(", ");
        let sql = format!("SELECT {columns} FROM expenses WHERE mission = ? ORDER BY id");
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query([mission])?;

        let mut expenses = Vec::new();
        while let Some(row) = rows.next()? {
            let record = row_to_record(Entity::Expense, row)?;
            expenses.push(serde_json::from_value(Value::Object(record))?);
        }
        Ok(expenses)
    }

    pub fn insert_client(&self, client: &Client) -> Result<()> {
        self.insert(Entity::Client, &to_record(client)?)
    }

    pub fn insert_country(&self, country: &Country) -> Result<()> {
        self.insert(Entity::Country, &to_record(country)?)
    }

    pub fn insert_currency(&self, currency: &Currency) -> Result<()> {
        self.insert(Entity::Currency, &to_record(currency)?)
    }

    pub fn insert_project(&self, project: &Project) -> Result<()> {
        self.insert(Entity::Project, &to_record(project)?)
    }

    pub fn insert_city(&self, city: &City) -> Result<()> {
        self.insert(Entity::City, &to_record(city)?)
    }

    pub fn insert_resource(&self, resource: &Resource) -> Result<()> {
        self.insert(Entity::Resource, &to_record(resource)?)
    }

    pub fn insert_expense_category(&self, category: &ExpenseCategory) -> Result<()> {
        self.insert(Entity::ExpenseCategory, &to_record(category)?)
    }

    pub fn insert_payment_category(&self, category: &PaymentCategory) -> Result<()> {
        self.insert(Entity::PaymentCategory, &to_record(category)?)
    }

    pub fn insert_document_type(&self, document_type: &DocumentType) -> Result<()> {
        self.insert(Entity::DocumentType, &to_record(document_type)?)
    }

    pub fn insert_reimbursement(&self, reimbursement: &Reimbursement) -> Result<()> {
        self.insert(Entity::Reimbursement, &to_record(reimbursement)?)
    }

    pub fn insert_mission(&self, mission: &Mission) -> Result<()> {
        self.insert(Entity::Mission, &to_record(mission)?)
    }

    pub fn insert_expense(&self, expense: &Expense) -> Result<()> {
        self.insert(Entity::Expense, &to_record(expense)?)
    }
}

fn to_record<T: serde::Serialize>(value: &T) -> Result<Record> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        _ => Err(MexError::Validation("record must serialize to an object".into())),
    }
}

/// Convert a JSON value to an SQLite parameter. Booleans become 0/1.
fn to_sql_value(value: &Value) -> Result<rusqlite::types::Value> {
    use rusqlite::types::Value as Sql;
    match value {
        Value::Null => Ok(Sql::Null),
        Value::Bool(b) => Ok(Sql::Integer(i64::from(*b))),
        Value::Number(n) => n.as_i64().map(Sql::Integer).map_or_else(
            || {
                n.as_f64()
                    .map(Sql::Real)
                    .ok_or_else(|| MexError::Validation(format!("unrepresentable number {n}")))
            },
            Ok,
        ),
        Value::String(s) => Ok(Sql::Text(s.clone())),
        Value::Array(_) | Value::Object(_) => Err(MexError::Validation(
            "nested values cannot be stored".into(),
        )),
    }
}

/// Decode a row into the canonical representation for `entity`.
fn row_to_record(entity: Entity, row: &rusqlite::Row<'_>) -> Result<Record> {
    let mut record = Map::new();
    for (idx, col) in entity.columns().iter().enumerate() {
        let value = match row.get_ref(idx)? {
            ValueRef::Null => Value::Null,
            ValueRef::Integer(i) => {
                if entity.bool_columns().contains(col) {
                    Value::Bool(i != 0)
                } else {
                    Value::from(i)
                }
            }
            ValueRef::Real(f) => Value::from(f),
            ValueRef::Text(text) => Value::String(
                String::from_utf8(text.to_vec())
                    .map_err(|e| MexError::Validation(format!("non-UTF8 text in {col}: {e}")))?,
            ),
            ValueRef::Blob(_) => {
                return Err(MexError::Validation(format!(
                    "unexpected blob column {col} in {}",
                    entity.table()
                )))
            }
        };
        record.insert((*col).to_string(), value);
    }
    Ok(record)
}
