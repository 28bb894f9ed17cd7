//! Domain types and the entity registry.
//!
//! Field names deliberately match both the live-store column names and
//! the snapshot JSON keys, so a record has exactly one external
//! representation. Foreign keys hold the referenced record's primary
//! key under the bare relation name (`project`, not `project_id`).
//!
//! Monetary amounts are exact decimal strings; dates are `YYYY-MM-DD`;
//! timestamps are RFC 3339.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Every entity type that can appear in a snapshot or the live store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Entity {
    Client,
    Country,
    Currency,
    Project,
    City,
    Resource,
    ExpenseCategory,
    PaymentCategory,
    DocumentType,
    Reimbursement,
    Mission,
    Expense,
}

impl Entity {
    /// Live-store table name.
    #[must_use]
    pub const fn table(self) -> &'static str {
        match self {
            Self::Client => "clients",
            Self::Country => "countries",
            Self::Currency => "currencies",
            Self::Project => "projects",
            Self::City => "cities",
            Self::Resource => "resources",
            Self::ExpenseCategory => "expense_categories",
            Self::PaymentCategory => "payment_categories",
            Self::DocumentType => "document_types",
            Self::Reimbursement => "reimbursements",
            Self::Mission => "missions",
            Self::Expense => "expenses",
        }
    }

    /// Columns in canonical order. This is the single source of truth
    /// for a record's external representation: fetching a row through
    /// the registry yields exactly these keys.
    #[must_use]
    pub const fn columns(self) -> &'static [&'static str] {
        match self {
            Self::Client => &["id", "name"],
            Self::Country => &["id", "name", "default_currency"],
            Self::Currency => &[
                "iso3",
                "title",
                "symbol",
                "decimals",
                "fractional_unit",
                "base",
            ],
            Self::Project => &["id", "name", "client", "start_date", "end_date", "notes"],
            Self::City => &["id", "name", "country"],
            Self::Resource => &["id", "first_name", "last_name", "active"],
            Self::ExpenseCategory => &["id", "title", "active", "parent"],
            Self::PaymentCategory => &["id", "title", "active", "personal_expense", "parent"],
            Self::DocumentType => &["id", "title", "active", "is_default"],
            Self::Reimbursement => &[
                "id",
                "number",
                "year",
                "title",
                "issue_date",
                "resource",
                "paid_date",
            ],
            Self::Mission => &[
                "id",
                "status",
                "number",
                "title",
                "from_date",
                "to_date",
                "year",
                "default_currency",
                "project",
                "city",
                "resource",
            ],
            Self::Expense => &[
                "id",
                "mission",
                "day",
                "amount_currency",
                "currency",
                "amount_base",
                "amount_reimbursement",
                "detail",
                "category",
                "document_type",
                "payment_type",
                "reimbursement",
                "image",
                "image_sha256",
                "created_ts",
                "modified_ts",
            ],
        }
    }

    /// Columns stored as INTEGER 0/1 but rendered as JSON booleans.
    #[must_use]
    pub const fn bool_columns(self) -> &'static [&'static str] {
        match self {
            Self::Resource => &["active"],
            Self::ExpenseCategory => &["active"],
            Self::PaymentCategory => &["active", "personal_expense"],
            Self::DocumentType => &["active", "is_default"],
            _ => &[],
        }
    }

    /// Primary key column.
    #[must_use]
    pub const fn pk(self) -> &'static str {
        match self {
            Self::Currency => "iso3",
            _ => "id",
        }
    }

    /// Tree-structured entities carry a parent pointer and a rendered
    /// hierarchy path.
    #[must_use]
    pub const fn is_tree(self) -> bool {
        matches!(self, Self::ExpenseCategory | Self::PaymentCategory)
    }
}

/// Mission lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MissionStatus {
    #[default]
    Draft,
    Submitted,
    Cancelled,
}

impl MissionStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "DRAFT",
            Self::Submitted => "SUBMITTED",
            Self::Cancelled => "CANCELLED",
        }
    }
}

impl std::str::FromStr for MissionStatus {
    type Err = String;

    fn from_str(input: &str) -> std::result::Result<Self, Self::Err> {
        match input {
            "DRAFT" => Ok(Self::Draft),
            "SUBMITTED" => Ok(Self::Submitted),
            "CANCELLED" => Ok(Self::Cancelled),
            other => Err(format!("invalid mission status: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Country {
    pub id: i64,
    pub name: String,
    pub default_currency: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Currency {
    pub iso3: String,
    pub title: String,
    pub symbol: String,
    pub decimals: Option<i64>,
    pub fractional_unit: String,
    pub base: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: i64,
    pub name: String,
    pub client: i64,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct City {
    pub id: i64,
    pub name: String,
    pub country: i64,
}

/// A person, e.g. an employee or external contractor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseCategory {
    pub id: i64,
    pub title: String,
    pub active: bool,
    pub parent: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentCategory {
    pub id: i64,
    pub title: String,
    pub active: bool,
    pub personal_expense: bool,
    pub parent: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentType {
    pub id: i64,
    pub title: String,
    pub active: bool,
    pub is_default: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reimbursement {
    pub id: i64,
    pub number: i64,
    pub year: i64,
    pub title: String,
    pub issue_date: NaiveDate,
    pub resource: i64,
    pub paid_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mission {
    pub id: i64,
    pub status: MissionStatus,
    pub number: Option<i64>,
    pub title: Option<String>,
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
    pub year: i64,
    pub default_currency: Option<String>,
    pub project: i64,
    pub city: i64,
    pub resource: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expense {
    pub id: i64,
    pub mission: i64,
    pub day: NaiveDate,
    /// Amount in `currency`, exact decimal string.
    pub amount_currency: String,
    pub currency: String,
    /// Amount converted to the base currency, if calculated.
    pub amount_base: Option<String>,
    pub amount_reimbursement: Option<String>,
    pub detail: Option<String>,
    pub category: i64,
    pub document_type: i64,
    pub payment_type: i64,
    pub reimbursement: Option<i64>,
    /// Attachment path relative to the media root.
    pub image: Option<String>,
    pub image_sha256: Option<String>,
    pub created_ts: DateTime<Utc>,
    pub modified_ts: DateTime<Utc>,
}
