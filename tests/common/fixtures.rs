#![allow(dead_code)]

use mex::model::{
    City, Client, Country, Currency, DocumentType, Expense, ExpenseCategory, Mission,
    MissionStatus, PaymentCategory, Resource,
};
use mex::storage::SqliteStorage;
use serde_json::{json, Value};

pub fn currency(iso3: &str, title: &str) -> Currency {
    Currency {
        iso3: iso3.to_string(),
        title: title.to_string(),
        symbol: "¤".to_string(),
        decimals: Some(2),
        fractional_unit: "cent".to_string(),
        base: 1,
    }
}

pub fn expense_category(id: i64, title: &str, parent: Option<i64>) -> ExpenseCategory {
    ExpenseCategory {
        id,
        title: title.to_string(),
        active: true,
        parent,
    }
}

pub fn payment_category(id: i64, title: &str, parent: Option<i64>) -> PaymentCategory {
    PaymentCategory {
        id,
        title: title.to_string(),
        active: true,
        personal_expense: false,
        parent,
    }
}

pub fn mission(id: i64, number: i64, year: i64) -> Mission {
    Mission {
        id,
        status: MissionStatus::Submitted,
        number: Some(number),
        title: Some("Kickoff".to_string()),
        from_date: "2024-03-04".parse().unwrap(),
        to_date: "2024-03-08".parse().unwrap(),
        year,
        default_currency: Some("EUR".to_string()),
        project: 1,
        city: 1,
        resource: 1,
    }
}

pub fn expense(id: i64, mission: i64, category: i64) -> Expense {
    Expense {
        id,
        mission,
        day: "2024-03-05".parse().unwrap(),
        amount_currency: "42.00".to_string(),
        currency: "EUR".to_string(),
        amount_base: None,
        amount_reimbursement: None,
        detail: Some(format!("expense {id}")),
        category,
        document_type: 1,
        payment_type: 1,
        reimbursement: None,
        image: None,
        image_sha256: None,
        created_ts: "2024-03-06T18:00:00Z".parse().unwrap(),
        modified_ts: "2024-03-06T18:00:00Z".parse().unwrap(),
    }
}

/// Seed the base records most matcher tests need: one of each
/// independent entity plus small category trees.
pub fn seed_base(storage: &SqliteStorage) {
    storage.insert_currency(&currency("EUR", "Euro")).unwrap();
    storage
        .insert_client(&Client {
            id: 1,
            name: "Acme Corp".to_string(),
        })
        .unwrap();
    storage
        .insert_country(&Country {
            id: 1,
            name: "Italy".to_string(),
            default_currency: Some("EUR".to_string()),
        })
        .unwrap();
    storage
        .insert_project(&mex::model::Project {
            id: 1,
            name: "Warehouse rollout".to_string(),
            client: 1,
            start_date: None,
            end_date: None,
            notes: Some("phase one".to_string()),
        })
        .unwrap();
    storage
        .insert_city(&City {
            id: 1,
            name: "Milan".to_string(),
            country: 1,
        })
        .unwrap();
    storage
        .insert_resource(&Resource {
            id: 1,
            first_name: "Ada".to_string(),
            last_name: "Rossi".to_string(),
            active: true,
        })
        .unwrap();
    storage
        .insert_expense_category(&expense_category(1, "Travel", None))
        .unwrap();
    storage
        .insert_expense_category(&expense_category(2, "Train", Some(1)))
        .unwrap();
    storage
        .insert_payment_category(&payment_category(1, "Company", None))
        .unwrap();
    storage
        .insert_document_type(&DocumentType {
            id: 1,
            title: "Receipt".to_string(),
            active: true,
            is_default: true,
        })
        .unwrap();
}

/// A snapshot document with every section empty.
pub fn empty_document() -> Value {
    mex::snapshot::Snapshot::empty().to_value()
}

/// A complete `currencies` entry matching `currency("EUR", "Euro")`.
pub fn euro_entry() -> Value {
    json!({
        "iso3": "EUR",
        "title": "Euro",
        "symbol": "¤",
        "decimals": 2,
        "fractional_unit": "cent",
        "base": 1
    })
}

/// Parse a hand-built document into a snapshot.
pub fn snapshot_from(document: &Value) -> mex::snapshot::Snapshot {
    mex::snapshot::Snapshot::from_slice(&serde_json::to_vec(document).unwrap()).unwrap()
}
