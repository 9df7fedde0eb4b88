//! Pre-built test fixtures
//!
//! Fixed values so assertions in different suites line up: a 2024 contract
//! year, a mid-year "today" and naira amounts.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;

use core_kernel::Money;

/// Builds a date, panicking on an impossible one
pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid fixture date")
}

/// The day fixtures treat as today
pub fn today() -> NaiveDate {
    date(2024, 7, 1)
}

/// A fixed instant on [`today`]
pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 7, 1, 9, 30, 0)
        .single()
        .expect("valid fixture instant")
}

/// Contract covering the whole of 2024
pub fn contract_year() -> (NaiveDate, NaiveDate) {
    (date(2024, 1, 1), date(2024, 12, 31))
}

pub fn ngn(amount: Decimal) -> Money {
    Money::ngn(amount)
}

/// A spreadsheet export with loose headers and mixed date formats
///
/// Lines 2 and 3 are valid. Line 4 has no name and line 5 a date of birth in
/// the future.
pub const SAMPLE_ENROLLEE_CSV: &str = "\
Full Name,NHIA No,D.O.B,Sex,Plan,Phone,Email,Employer
Ngozi Adeyemi,NH-20001,1988-03-14,F,gold,08031234567,ngozi@example.com,Zenith Bank
Ibrahim Musa,NH-20002,22/11/1975,M,silver,,,Zenith Bank
,NH-20003,1990-01-01,F,bronze,,,
Kemi Balogun,NH-20004,05/05/2090,F,bronze,,,
";
