//! Enrollee validation rules
//!
//! Field-level rules (name lengths, email format) are declared on
//! [`NewEnrollee`] with `validator`; the date rules below need the current
//! date and are checked here.
//!
//! - Date of birth must not be in the future
//! - Age must be at most 120 years
//! - Enrollment date must not precede the date of birth

use chrono::NaiveDate;
use validator::Validate;

use core_kernel::age_on;
use crate::enrollee::NewEnrollee;
use crate::error::EnrollmentError;

const MAX_AGE_YEARS: u32 = 120;

/// Validates a registration request as of `today`
///
/// All problems are reported together, sorted, separated by `; `.
pub fn validate_new_enrollee(data: &NewEnrollee, today: NaiveDate) -> Result<(), EnrollmentError> {
    let mut errors = Vec::new();

    if let Err(field_errors) = data.validate() {
        for (field, errs) in field_errors.field_errors() {
            for err in errs.iter() {
                let message = err
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| err.code.to_string());
                errors.push(format!("{}: {}", field, message));
            }
        }
    }

    match age_on(data.date_of_birth, today) {
        Ok(age) if age > MAX_AGE_YEARS => {
            errors.push(format!("date_of_birth: age {} exceeds {}", age, MAX_AGE_YEARS));
        }
        Ok(_) => {}
        Err(_) => errors.push("date_of_birth: must not be in the future".to_string()),
    }

    if data.enrolled_on < data.date_of_birth {
        errors.push("enrolled_on: must not precede date of birth".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        errors.sort();
        Err(EnrollmentError::validation_failed(errors))
    }
}
