//! Property-Based Test Generators
//!
//! Proptest strategies that only produce values the domain accepts: naira
//! prices with kobo precision, quantities of at least one, and catalogued
//! diagnoses.

use proptest::prelude::*;
use rust_decimal::Decimal;

use core_kernel::Money;
use domain_claims::{NewTreatment, ServiceType};
use domain_enrollment::PlanTier;

/// Diagnoses known to the ICD-10 catalogue
pub const CATALOGUED_DIAGNOSES: &[&str] = &["B54", "J06.9", "I10", "E11.9", "N39.0", "K29.7"];

/// Unit prices from 1.00 to 500,000.00 naira
pub fn ngn_price_strategy() -> impl Strategy<Value = Money> {
    (100i64..50_000_000i64).prop_map(|kobo| Money::ngn(Decimal::new(kobo, 2)))
}

pub fn quantity_strategy() -> impl Strategy<Value = u32> {
    1u32..=30u32
}

pub fn service_type_strategy() -> impl Strategy<Value = ServiceType> {
    prop::sample::select(ServiceType::ALL.to_vec())
}

pub fn plan_tier_strategy() -> impl Strategy<Value = PlanTier> {
    prop::sample::select(PlanTier::ALL.to_vec())
}

pub fn diagnosis_strategy() -> impl Strategy<Value = String> {
    prop::sample::select(CATALOGUED_DIAGNOSES.to_vec()).prop_map(str::to_string)
}

pub fn treatment_strategy() -> impl Strategy<Value = NewTreatment> {
    (
        service_type_strategy(),
        "[A-Za-z][A-Za-z ]{2,30}",
        quantity_strategy(),
        ngn_price_strategy(),
    )
        .prop_map(|(service_type, description, quantity, unit_price)| NewTreatment {
            service_type,
            description,
            quantity,
            unit_price,
        })
}

/// One to eight treatment lines
pub fn treatments_strategy() -> impl Strategy<Value = Vec<NewTreatment>> {
    prop::collection::vec(treatment_strategy(), 1..=8)
}
