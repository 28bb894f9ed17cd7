//! Database schema definitions.

use rusqlite::{Connection, Result};

/// The complete SQL schema for the mex database.
///
/// Column names match the snapshot JSON field names; foreign keys store
/// the referenced primary key under the bare relation name. Booleans
/// are INTEGER 0/1, amounts are exact decimal TEXT, dates `YYYY-MM-DD`
/// TEXT, timestamps RFC 3339 TEXT.
pub const SCHEMA_SQL: &str = r"
    CREATE TABLE IF NOT EXISTS clients (
        id INTEGER PRIMARY KEY,
        name TEXT NOT NULL UNIQUE
    );

    CREATE TABLE IF NOT EXISTS currencies (
        iso3 TEXT PRIMARY KEY CHECK(length(iso3) = 3),
        title TEXT NOT NULL UNIQUE,
        symbol TEXT NOT NULL,
        decimals INTEGER,
        fractional_unit TEXT NOT NULL,
        base INTEGER NOT NULL
    );

    CREATE TABLE IF NOT EXISTS countries (
        id INTEGER PRIMARY KEY,
        name TEXT NOT NULL UNIQUE,
        default_currency TEXT REFERENCES currencies(iso3) ON DELETE SET NULL
    );

    CREATE TABLE IF NOT EXISTS projects (
        id INTEGER PRIMARY KEY,
        name TEXT NOT NULL UNIQUE,
        client INTEGER NOT NULL REFERENCES clients(id) ON DELETE CASCADE,
        start_date TEXT,
        end_date TEXT,
        notes TEXT
    );
    CREATE INDEX IF NOT EXISTS idx_projects_client ON projects(client);

    CREATE TABLE IF NOT EXISTS cities (
        id INTEGER PRIMARY KEY,
        name TEXT NOT NULL,
        country INTEGER NOT NULL REFERENCES countries(id) ON DELETE CASCADE,
        UNIQUE(name, country)
    );

    CREATE TABLE IF NOT EXISTS resources (
        id INTEGER PRIMARY KEY,
        first_name TEXT NOT NULL DEFAULT '',
        last_name TEXT NOT NULL DEFAULT '',
        active INTEGER NOT NULL DEFAULT 1
    );

    CREATE TABLE IF NOT EXISTS expense_categories (
        id INTEGER PRIMARY KEY,
        title TEXT NOT NULL,
        active INTEGER NOT NULL DEFAULT 1,
        parent INTEGER REFERENCES expense_categories(id) ON DELETE CASCADE,
        UNIQUE(title, parent)
    );
    CREATE INDEX IF NOT EXISTS idx_expense_categories_parent
        ON expense_categories(parent) WHERE parent IS NOT NULL;

    CREATE TABLE IF NOT EXISTS payment_categories (
        id INTEGER PRIMARY KEY,
        title TEXT NOT NULL,
        active INTEGER NOT NULL DEFAULT 1,
        personal_expense INTEGER NOT NULL DEFAULT 0,
        parent INTEGER REFERENCES payment_categories(id) ON DELETE CASCADE,
        UNIQUE(title, parent)
    );
    CREATE INDEX IF NOT EXISTS idx_payment_categories_parent
        ON payment_categories(parent) WHERE parent IS NOT NULL;

    CREATE TABLE IF NOT EXISTS document_types (
        id INTEGER PRIMARY KEY,
        title TEXT NOT NULL UNIQUE,
        active INTEGER NOT NULL DEFAULT 1,
        is_default INTEGER NOT NULL DEFAULT 0
    );

    CREATE TABLE IF NOT EXISTS reimbursements (
        id INTEGER PRIMARY KEY,
        number INTEGER NOT NULL,
        year INTEGER NOT NULL,
        title TEXT NOT NULL,
        issue_date TEXT NOT NULL,
        resource INTEGER NOT NULL REFERENCES resources(id),
        paid_date TEXT,
        UNIQUE(number, year)
    );

    CREATE TABLE IF NOT EXISTS missions (
        id INTEGER PRIMARY KEY,
        status TEXT NOT NULL DEFAULT 'DRAFT'
            CHECK(status IN ('DRAFT', 'SUBMITTED', 'CANCELLED')),
        number INTEGER,
        title TEXT,
        from_date TEXT NOT NULL,
        to_date TEXT NOT NULL,
        year INTEGER NOT NULL,
        default_currency TEXT REFERENCES currencies(iso3),
        project INTEGER NOT NULL REFERENCES projects(id),
        city INTEGER NOT NULL REFERENCES cities(id),
        resource INTEGER NOT NULL REFERENCES resources(id),
        -- to_date must not precede from_date
        CHECK(to_date >= from_date),
        UNIQUE(number, year)
    );
    CREATE INDEX IF NOT EXISTS idx_missions_year ON missions(year);

    CREATE TABLE IF NOT EXISTS expenses (
        id INTEGER PRIMARY KEY,
        mission INTEGER NOT NULL REFERENCES missions(id) ON DELETE CASCADE,
        day TEXT NOT NULL,
        amount_currency TEXT NOT NULL,
        currency TEXT NOT NULL REFERENCES currencies(iso3),
        amount_base TEXT,
        amount_reimbursement TEXT,
        detail TEXT,
        category INTEGER NOT NULL REFERENCES expense_categories(id),
        document_type INTEGER NOT NULL REFERENCES document_types(id),
        payment_type INTEGER NOT NULL REFERENCES payment_categories(id),
        reimbursement INTEGER REFERENCES reimbursements(id) ON DELETE SET NULL,
        image TEXT,
        image_sha256 TEXT,
        created_ts TEXT NOT NULL,
        modified_ts TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_expenses_mission ON expenses(mission);
    CREATE INDEX IF NOT EXISTS idx_expenses_reimbursement
        ON expenses(reimbursement) WHERE reimbursement IS NOT NULL;
";

/// Apply the schema to a connection. Idempotent.
///
/// # Errors
///
/// Returns an error if any DDL statement fails.
pub fn apply_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.execute_batch(SCHEMA_SQL)
}
