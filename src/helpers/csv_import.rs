//! Bulk student import from CSV.
//!
//! Rows are upserted by enrollment number. A bad row is reported and skipped;
//! it never aborts the rest of the batch. Error messages are numbered by
//! spreadsheet row, where row 1 is the header.

use std::collections::HashMap;
use std::str::FromStr;

use chrono::Utc;
use common::ImportSummary;
use model::entities::{prelude::*, student};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
};
use tracing::{info, warn};

use crate::error::ApiError;

/// One parsed and validated CSV row.
#[derive(Debug)]
struct StudentRow {
    enrollment_number: String,
    name: String,
    email: String,
    phone: String,
    branch: String,
    year: String,
    cgpa: Decimal,
    skills: String,
    is_placed: bool,
}

fn field(record: &HashMap<String, String>, key: &str) -> String {
    record.get(key).map(|v| v.trim().to_string()).unwrap_or_default()
}

fn parse_row(record: &HashMap<String, String>) -> Result<StudentRow, String> {
    let enrollment_number = field(record, "enrollment_number").to_uppercase();
    if enrollment_number.is_empty() {
        return Err("missing enrollment_number".to_string());
    }
    let name = field(record, "name");
    if name.is_empty() {
        return Err("missing name".to_string());
    }
    let email = field(record, "email");
    if email.is_empty() {
        return Err("missing email".to_string());
    }

    let cgpa_raw = field(record, "cgpa");
    let cgpa = Decimal::from_str(&cgpa_raw)
        .map_err(|_| format!("invalid cgpa '{}'", cgpa_raw))?;
    if cgpa < Decimal::ZERO || cgpa > Decimal::from(10) {
        return Err(format!("cgpa {} out of range 0-10", cgpa));
    }

    Ok(StudentRow {
        enrollment_number,
        name,
        email,
        phone: field(record, "phone"),
        branch: field(record, "branch"),
        year: field(record, "year"),
        cgpa,
        skills: field(record, "skills"),
        is_placed: field(record, "is_placed").eq_ignore_ascii_case("true"),
    })
}

async fn upsert_row(db: &DatabaseConnection, row: StudentRow) -> Result<bool, ApiError> {
    let now = Utc::now();
    let existing = Student::find()
        .filter(student::Column::EnrollmentNumber.eq(&row.enrollment_number))
        .one(db)
        .await?;

    match existing {
        Some(profile) => {
            let mut active: student::ActiveModel = profile.into();
            active.name = Set(row.name);
            active.email = Set(row.email);
            active.phone = Set(row.phone);
            active.branch = Set(row.branch);
            active.year = Set(row.year);
            active.cgpa = Set(row.cgpa);
            active.skills = Set(row.skills);
            active.is_placed = Set(row.is_placed);
            active.updated_at = Set(now);
            active.update(db).await?;
            Ok(false)
        }
        None => {
            let active = student::ActiveModel {
                user_id: Set(None),
                enrollment_number: Set(row.enrollment_number),
                name: Set(row.name),
                email: Set(row.email),
                phone: Set(row.phone),
                branch: Set(row.branch),
                year: Set(row.year),
                cgpa: Set(row.cgpa),
                skills: Set(row.skills),
                is_placed: Set(row.is_placed),
                created_at: Set(now),
                updated_at: Set(now),
                ..Default::default()
            };
            active.insert(db).await?;
            Ok(true)
        }
    }
}

/// Import students from raw CSV bytes, returning created/updated counts and
/// one error string per failed row.
pub async fn import_students(
    db: &DatabaseConnection,
    bytes: &[u8],
) -> Result<ImportSummary, ApiError> {
    let mut reader = csv::Reader::from_reader(bytes);
    let mut summary = ImportSummary::new();

    for (index, record) in reader.deserialize::<HashMap<String, String>>().enumerate() {
        // Header is row 1, first data row is row 2.
        let row_number = index + 2;
        let record = match record {
            Ok(record) => record,
            Err(e) => {
                summary
                    .errors
                    .push(format!("Row {}: malformed record ({})", row_number, e));
                continue;
            }
        };

        let row = match parse_row(&record) {
            Ok(row) => row,
            Err(message) => {
                summary.errors.push(format!("Row {}: {}", row_number, message));
                continue;
            }
        };

        match upsert_row(db, row).await {
            Ok(true) => summary.created += 1,
            Ok(false) => summary.updated += 1,
            Err(ApiError::Database(db_error)) => {
                let text = db_error.to_string();
                warn!("import row {} failed: {}", row_number, text);
                if text.to_lowercase().contains("unique") {
                    summary
                        .errors
                        .push(format!("Row {}: duplicate email", row_number));
                } else {
                    summary.errors.push(format!("Row {}: {}", row_number, text));
                }
            }
            Err(other) => return Err(other),
        }
    }

    info!(
        created = summary.created,
        updated = summary.updated,
        failed = summary.errors.len(),
        "student import finished"
    );
    Ok(summary)
}
