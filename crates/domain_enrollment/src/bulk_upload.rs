//! Bulk enrollee registration from CSV
//!
//! Employer groups send member lists as spreadsheets with inconsistent
//! headers ("Full Name", "Surname", "D.O.B", "NHIA No" ...). Columns are
//! matched by case-insensitive substring, one role per column, in the order
//! listed in [`ColumnRole::detect`]. Bad rows are reported individually and
//! never abort the whole upload; only a missing name column does.

use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord, Trim};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use core_kernel::{age_on, parse_flexible_date, EnrolleeId, UploadId};
use crate::enrollee::{Gender, NewEnrollee};
use crate::error::EnrollmentError;
use crate::plan::PlanTier;
use crate::validation::validate_new_enrollee;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnRole {
    Employer,
    Nhia,
    DateOfBirth,
    Gender,
    Plan,
    Phone,
    Email,
    Address,
    FirstName,
    LastName,
    FullName,
}

impl ColumnRole {
    /// Order matters: "Employer Name" must be claimed before the name checks
    fn detect(header: &str) -> Option<ColumnRole> {
        let h = header.trim().to_ascii_lowercase();
        let has = |needle: &str| h.contains(needle);

        if has("employer") || has("company") || has("organisation") || has("organization") {
            Some(ColumnRole::Employer)
        } else if has("nhia") {
            Some(ColumnRole::Nhia)
        } else if has("dob") || has("birth") || has("d.o.b") {
            Some(ColumnRole::DateOfBirth)
        } else if has("gender") || has("sex") {
            Some(ColumnRole::Gender)
        } else if has("plan") {
            Some(ColumnRole::Plan)
        } else if has("phone") || has("mobile") {
            Some(ColumnRole::Phone)
        } else if has("email") || has("e-mail") {
            Some(ColumnRole::Email)
        } else if has("address") {
            Some(ColumnRole::Address)
        } else if has("first") || has("given") {
            Some(ColumnRole::FirstName)
        } else if has("last") || has("surname") || has("family") {
            Some(ColumnRole::LastName)
        } else if has("name") {
            Some(ColumnRole::FullName)
        } else {
            None
        }
    }
}

#[derive(Debug, Default)]
struct ColumnMap {
    columns: Vec<(ColumnRole, usize)>,
}

impl ColumnMap {
    fn from_headers(headers: &StringRecord) -> Self {
        let mut map = ColumnMap::default();
        for (index, header) in headers.iter().enumerate() {
            if let Some(role) = ColumnRole::detect(header) {
                if map.index_of(role).is_none() {
                    map.columns.push((role, index));
                }
            }
        }
        map
    }

    fn index_of(&self, role: ColumnRole) -> Option<usize> {
        self.columns.iter().find(|(r, _)| *r == role).map(|(_, i)| *i)
    }

    fn has_name(&self) -> bool {
        self.index_of(ColumnRole::FullName).is_some()
            || (self.index_of(ColumnRole::FirstName).is_some()
                && self.index_of(ColumnRole::LastName).is_some())
    }

    fn value<'r>(&self, record: &'r StringRecord, role: ColumnRole) -> Option<&'r str> {
        self.index_of(role)
            .and_then(|i| record.get(i))
            .map(str::trim)
            .filter(|v| !v.is_empty())
    }
}

/// A row that could not be turned into an enrollee
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowError {
    /// 1-based line number in the uploaded file
    pub line: u64,
    pub message: String,
}

/// A successfully parsed row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedRow {
    pub line: u64,
    pub enrollee: NewEnrollee,
    pub age: u32,
}

/// Result of reading an upload, before anything is persisted
#[derive(Debug, Clone)]
pub struct ParsedUpload {
    pub upload_id: UploadId,
    pub rows: Vec<ParsedRow>,
    pub errors: Vec<RowError>,
}

/// Summary returned to the uploader once rows have been persisted
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadReport {
    pub upload_id: UploadId,
    pub total_rows: usize,
    pub accepted: Vec<EnrolleeId>,
    pub rejected: Vec<RowError>,
}

impl UploadReport {
    pub fn accepted_count(&self) -> usize {
        self.accepted.len()
    }

    pub fn rejected_count(&self) -> usize {
        self.rejected.len()
    }
}

/// Parses an enrollee CSV upload
///
/// `enrolled_on` is both the enrollment date written to every row and the
/// reference date for age and date-of-birth checks.
///
/// # Errors
///
/// Returns `EnrollmentError::UploadRejected` when the header cannot be read or
/// has no usable name column. Problems in individual rows are returned in
/// `ParsedUpload::errors`.
pub fn parse_enrollee_csv(text: &str, enrolled_on: NaiveDate) -> Result<ParsedUpload, EnrollmentError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(text.as_bytes());

    let headers = reader.headers()?.clone();
    let columns = ColumnMap::from_headers(&headers);
    if !columns.has_name() {
        return Err(EnrollmentError::UploadRejected(
            "no name column found in header".to_string(),
        ));
    }
    debug!(?columns, "Detected upload columns");

    let mut rows = Vec::new();
    let mut errors = Vec::new();

    for (index, result) in reader.records().enumerate() {
        // Header is line 1
        let fallback_line = index as u64 + 2;
        let record = match result {
            Ok(record) => record,
            Err(err) => {
                let line = err.position().map(|p| p.line()).unwrap_or(fallback_line);
                errors.push(RowError { line, message: err.to_string() });
                continue;
            }
        };
        let line = record.position().map(|p| p.line()).unwrap_or(fallback_line);

        if record.iter().all(|field| field.trim().is_empty()) {
            continue;
        }

        match parse_row(&columns, &record, enrolled_on) {
            Ok(row) => rows.push(ParsedRow {
                line,
                age: row.1,
                enrollee: row.0,
            }),
            Err(message) => errors.push(RowError { line, message }),
        }
    }

    let upload = ParsedUpload {
        upload_id: UploadId::new_v7(),
        rows,
        errors,
    };
    info!(
        upload_id = %upload.upload_id,
        parsed = upload.rows.len(),
        rejected = upload.errors.len(),
        "Parsed enrollee upload"
    );
    Ok(upload)
}

fn parse_row(
    columns: &ColumnMap,
    record: &StringRecord,
    enrolled_on: NaiveDate,
) -> Result<(NewEnrollee, u32), String> {
    let (first_name, last_name) = match (
        columns.value(record, ColumnRole::FirstName),
        columns.value(record, ColumnRole::LastName),
    ) {
        (Some(first), Some(last)) => (first.to_string(), last.to_string()),
        _ => {
            let full = columns
                .value(record, ColumnRole::FullName)
                .ok_or_else(|| "name is missing".to_string())?;
            split_full_name(full)?
        }
    };

    let dob_raw = columns
        .value(record, ColumnRole::DateOfBirth)
        .ok_or_else(|| "date of birth is missing".to_string())?;
    let date_of_birth = parse_flexible_date(dob_raw).map_err(|e| e.to_string())?;
    let age = age_on(date_of_birth, enrolled_on).map_err(|e| e.to_string())?;

    let plan = match columns.value(record, ColumnRole::Plan) {
        Some(raw) => raw.parse::<PlanTier>().map_err(|e| e.to_string())?,
        None => PlanTier::default(),
    };

    let gender = columns
        .value(record, ColumnRole::Gender)
        .map(Gender::parse_lenient)
        .unwrap_or_default();

    let owned = |role| columns.value(record, role).map(str::to_string);

    let enrollee = NewEnrollee {
        first_name,
        last_name,
        date_of_birth,
        gender,
        nhia_number: owned(ColumnRole::Nhia),
        phone: owned(ColumnRole::Phone),
        email: owned(ColumnRole::Email),
        address: owned(ColumnRole::Address),
        employer: owned(ColumnRole::Employer),
        plan,
        enrolled_on,
    };

    validate_new_enrollee(&enrollee, enrolled_on).map_err(|e| e.to_string())?;
    Ok((enrollee, age))
}

/// Splits "Chukwuemeka Obi" into first and last name on the last space
fn split_full_name(full: &str) -> Result<(String, String), String> {
    let full = full.split_whitespace().collect::<Vec<_>>().join(" ");
    match full.rsplit_once(' ') {
        Some((first, last)) => Ok((first.to_string(), last.to_string())),
        None => Err(format!("name '{}' needs both first and last name", full)),
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn prop_last_word_becomes_last_name(
            words in prop::collection::vec("[A-Za-z]{1,12}", 2..5),
            padding in " {0,3}",
        ) {
            let full = format!("{}{}{}", padding, words.join("  "), padding);
            let (first, last) = split_full_name(&full).unwrap();
            prop_assert_eq!(&last, words.last().unwrap());
            prop_assert_eq!(first, words[..words.len() - 1].join(" "));
        }
    }
}
