//! ICD-10 diagnosis codes
//!
//! A code is accepted when it matches the ICD-10 shape (letter, two
//! characters, optional dot and up to four more) and appears in the
//! catalogue of diagnoses the HMO pays for.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

use crate::error::ClaimError;

static ICD10_FORMAT: Lazy<Result<Regex, regex::Error>> =
    Lazy::new(|| Regex::new(r"^[A-TV-Z][0-9][0-9A-Z](\.[0-9A-Z]{1,4})?$"));

const CATALOGUE: &[(&str, &str)] = &[
    ("A01.0", "Typhoid fever"),
    ("A09", "Diarrhoea and gastroenteritis of presumed infectious origin"),
    ("A15.0", "Tuberculosis of lung"),
    ("B20", "HIV disease resulting in infectious and parasitic diseases"),
    ("B50.9", "Plasmodium falciparum malaria, unspecified"),
    ("B54", "Unspecified malaria"),
    ("D50.9", "Iron deficiency anaemia, unspecified"),
    ("E11.9", "Type 2 diabetes mellitus without complications"),
    ("E66.9", "Obesity, unspecified"),
    ("H10.9", "Conjunctivitis, unspecified"),
    ("H52.1", "Myopia"),
    ("H66.9", "Otitis media, unspecified"),
    ("I10", "Essential (primary) hypertension"),
    ("I20.9", "Angina pectoris, unspecified"),
    ("J06.9", "Acute upper respiratory infection, unspecified"),
    ("J18.9", "Pneumonia, unspecified"),
    ("J45.9", "Asthma, unspecified"),
    ("K02.9", "Dental caries, unspecified"),
    ("K29.7", "Gastritis, unspecified"),
    ("K35.8", "Acute appendicitis, other and unspecified"),
    ("K40.9", "Unilateral or unspecified inguinal hernia"),
    ("L30.9", "Dermatitis, unspecified"),
    ("M54.5", "Low back pain"),
    ("N39.0", "Urinary tract infection, site not specified"),
    ("N40", "Hyperplasia of prostate"),
    ("O14.9", "Pre-eclampsia, unspecified"),
    ("O80", "Single spontaneous delivery"),
    ("O82", "Single delivery by caesarean section"),
    ("R50.9", "Fever, unspecified"),
    ("S52.5", "Fracture of lower end of radius"),
    ("Z00.0", "General medical examination"),
    ("Z34.9", "Supervision of normal pregnancy, unspecified"),
];

static BY_CODE: Lazy<HashMap<&'static str, &'static str>> =
    Lazy::new(|| CATALOGUE.iter().copied().collect());

/// Returns the description of a catalogued code
pub fn lookup(code: &str) -> Option<&'static str> {
    BY_CODE.get(normalise(code).as_str()).copied()
}

/// Checks only the shape of the code, not catalogue membership
pub fn is_well_formed(code: &str) -> bool {
    match ICD10_FORMAT.as_ref() {
        Ok(re) => re.is_match(&normalise(code)),
        Err(_) => false,
    }
}

/// Validates a diagnosis code and returns it normalised to upper case
pub fn validate_icd10(code: &str) -> Result<String, ClaimError> {
    let normalised = normalise(code);
    let re = ICD10_FORMAT
        .as_ref()
        .map_err(|e| ClaimError::Internal(format!("ICD-10 pattern: {}", e)))?;
    if !re.is_match(&normalised) {
        return Err(ClaimError::MalformedDiagnosis(code.trim().to_string()));
    }
    if !BY_CODE.contains_key(normalised.as_str()) {
        return Err(ClaimError::UnknownDiagnosis(normalised));
    }
    Ok(normalised)
}

/// All catalogued codes, sorted
pub fn catalogue() -> impl Iterator<Item = (&'static str, &'static str)> {
    CATALOGUE.iter().copied()
}

fn normalise(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}
