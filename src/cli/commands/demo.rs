//! Demo command implementation.
//!
//! Seeds a deterministic sample data set: one mission with three
//! expenses spread over four currencies and two category trees, plus
//! placeholder attachment files in the media directory. Used by demos
//! and the e2e tests.

use crate::cli::commands::open_workspace;
use crate::error::{MexError, Result};
use crate::model::{
    City, Client, Country, Currency, DocumentType, Entity, Expense, ExpenseCategory, Mission,
    MissionStatus, PaymentCategory, Reimbursement, Resource,
};
use chrono::{DateTime, NaiveDate, Utc};
use std::path::Path;
use tracing::info;

/// Execute the demo command.
///
/// # Errors
///
/// Returns an error if the workspace is missing or already populated.
pub fn execute(dir: Option<&Path>) -> Result<()> {
    let (storage, paths) = open_workspace(dir)?;

    if storage.count(Entity::Mission)? > 0 {
        return Err(MexError::Config(
            "workspace already contains missions; demo data needs an empty store".into(),
        ));
    }

    seed(&storage, &paths.media_root)?;

    info!("demo data seeded");
    println!(
        "Seeded demo data: {} missions, {} expenses, {} currencies",
        storage.count(Entity::Mission)?,
        storage.count(Entity::Expense)?,
        storage.count(Entity::Currency)?,
    );
    Ok(())
}

/// Insert the sample records and write the attachment files.
///
/// # Errors
///
/// Returns an error on constraint violations or I/O failures.
pub fn seed(storage: &crate::storage::SqliteStorage, media_root: &Path) -> Result<()> {
    for (iso3, title, symbol, fractional_unit, decimals) in [
        ("EUR", "Euro", "€", "cent", Some(2)),
        ("USD", "US Dollar", "$", "cent", Some(2)),
        ("GBP", "Pound Sterling", "£", "penny", Some(2)),
        ("JPY", "Yen", "¥", "sen", Some(0)),
    ] {
        storage.insert_currency(&Currency {
            iso3: iso3.to_string(),
            title: title.to_string(),
            symbol: symbol.to_string(),
            decimals,
            fractional_unit: fractional_unit.to_string(),
            base: 1,
        })?;
    }

    storage.insert_client(&Client {
        id: 1,
        name: "Acme Corp".to_string(),
    })?;
    storage.insert_country(&Country {
        id: 1,
        name: "Italy".to_string(),
        default_currency: Some("EUR".to_string()),
    })?;
    storage.insert_project(&crate::model::Project {
        id: 1,
        name: "Warehouse rollout".to_string(),
        client: 1,
        start_date: Some(day("2024-01-08")?),
        end_date: None,
        notes: Some("phase one".to_string()),
    })?;
    storage.insert_city(&City {
        id: 1,
        name: "Milan".to_string(),
        country: 1,
    })?;
    storage.insert_resource(&Resource {
        id: 1,
        first_name: "Ada".to_string(),
        last_name: "Rossi".to_string(),
        active: true,
    })?;

    for (id, title, parent) in [
        (1, "Travel", None),
        (2, "Train", Some(1)),
        (3, "Hotel", Some(1)),
    ] {
        storage.insert_expense_category(&ExpenseCategory {
            id,
            title: title.to_string(),
            active: true,
            parent,
        })?;
    }
    for (id, title, personal, parent) in [
        (1, "Personal", true, None),
        (2, "Company", false, None),
        (3, "Card", false, Some(2)),
    ] {
        storage.insert_payment_category(&PaymentCategory {
            id,
            title: title.to_string(),
            active: true,
            personal_expense: personal,
            parent,
        })?;
    }
    for (id, title, is_default) in [(1, "Receipt", true), (2, "Invoice", false)] {
        storage.insert_document_type(&DocumentType {
            id,
            title: title.to_string(),
            active: true,
            is_default,
        })?;
    }

    storage.insert_reimbursement(&Reimbursement {
        id: 1,
        number: 1,
        year: 2024,
        title: "March reimbursements".to_string(),
        issue_date: day("2024-04-02")?,
        resource: 1,
        paid_date: None,
    })?;

    storage.insert_mission(&Mission {
        id: 1,
        status: MissionStatus::Submitted,
        number: Some(1),
        title: Some("Kickoff".to_string()),
        from_date: day("2024-03-04")?,
        to_date: day("2024-03-08")?,
        year: 2024,
        default_currency: Some("EUR".to_string()),
        project: 1,
        city: 1,
        resource: 1,
    })?;

    let attachments = media_root.join("missions/2024/0001");
    std::fs::create_dir_all(&attachments)?;

    // expense 2 is already settled by the March reimbursement run
    let expenses = [
        (1, "2024-03-04", "120.00", "USD", 1, 1, Some("taxi.jpg"), None),
        (2, "2024-03-05", "89.50", "GBP", 2, 2, Some("train.jpg"), Some(1)),
        (3, "2024-03-06", "9400", "JPY", 3, 3, None, None),
    ];
    for (id, on, amount, currency, category, payment_type, image, reimbursement) in expenses {
        if let Some(name) = image {
            std::fs::write(
                attachments.join(name),
                format!("placeholder receipt {id}\n"),
            )?;
        }
        storage.insert_expense(&Expense {
            id,
            mission: 1,
            day: day(on)?,
            amount_currency: amount.to_string(),
            currency: currency.to_string(),
            amount_base: None,
            amount_reimbursement: reimbursement.map(|_| amount.to_string()),
            detail: Some(format!("expense {id}")),
            category,
            document_type: 1,
            payment_type,
            reimbursement,
            image: image.map(|name| format!("missions/2024/0001/{name}")),
            image_sha256: None,
            created_ts: ts("2024-03-06T18:00:00Z")?,
            modified_ts: ts("2024-03-06T18:00:00Z")?,
        })?;
    }

    Ok(())
}

fn day(text: &str) -> Result<NaiveDate> {
    text.parse()
        .map_err(|_| MexError::Config(format!("invalid demo date {text}")))
}

fn ts(text: &str) -> Result<DateTime<Utc>> {
    text.parse()
        .map_err(|_| MexError::Config(format!("invalid demo timestamp {text}")))
}
