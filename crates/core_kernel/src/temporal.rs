//! Calendar helpers
//!
//! Provider contracts and payment periods are inclusive date ranges; member
//! ages are computed in whole calendar years.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors related to date handling
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemporalError {
    #[error("Invalid period: start {start} must not be after end {end}")]
    InvalidPeriod {
        start: String,
        end: String,
    },

    #[error("Date {0} is in the future")]
    FutureDate(String),

    #[error("Unrecognised date: {0}")]
    UnparseableDate(String),
}

/// An inclusive range of calendar dates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, TemporalError> {
        if start > end {
            return Err(TemporalError::InvalidPeriod {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        Ok(Self { start, end })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    /// Number of days between start and end
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days()
    }

    pub fn overlaps(&self, other: &DateRange) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    /// The calendar month containing `date`
    pub fn month_of(date: NaiveDate) -> Self {
        let start = date.with_day(1).unwrap_or(date);
        let next_month = if start.month() == 12 {
            NaiveDate::from_ymd_opt(start.year() + 1, 1, 1)
        } else {
            NaiveDate::from_ymd_opt(start.year(), start.month() + 1, 1)
        };
        let end = next_month
            .and_then(|d| d.pred_opt())
            .unwrap_or(start);
        Self { start, end }
    }
}

/// Age in whole years on `on`, counting a birthday as reached on the day
///
/// Members born on 29 February turn a year older on 1 March in common years.
pub fn age_on(date_of_birth: NaiveDate, on: NaiveDate) -> Result<u32, TemporalError> {
    if date_of_birth > on {
        return Err(TemporalError::FutureDate(date_of_birth.to_string()));
    }

    let mut years = on.year() - date_of_birth.year();
    if (on.month(), on.day()) < (date_of_birth.month(), date_of_birth.day()) {
        years -= 1;
    }
    Ok(years.max(0) as u32)
}

/// Parses the date formats seen in member spreadsheets
///
/// Accepts `YYYY-MM-DD`, `DD/MM/YYYY` and `DD-MM-YYYY`.
pub fn parse_flexible_date(raw: &str) -> Result<NaiveDate, TemporalError> {
    let trimmed = raw.trim();
    ["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
        .ok_or_else(|| TemporalError::UnparseableDate(trimmed.to_string()))
}
