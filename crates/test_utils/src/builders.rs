//! Test Data Builders
//!
//! Builders fill in plausible defaults (fake names, a 2024 contract, a
//! two-line claim) so a test only spells out the fields it asserts on.

use chrono::NaiveDate;
use fake::faker::company::en::CompanyName;
use fake::faker::name::en::{FirstName, LastName};
use fake::Fake;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use core_kernel::{EnrolleeId, Money, ProviderId};
use domain_claims::{Claim, LineApproval, NewClaim, NewTreatment, PaCode, ServiceType};
use domain_enrollment::{Enrollee, EnrolleeStatus, Gender, NewEnrollee, PlanTier};
use domain_provider::{NewProvider, Provider, ProviderCategory, ProviderTier};

use crate::fixtures::{contract_year, date, today};

/// Builder for enrollee registrations
pub struct EnrolleeBuilder {
    first_name: String,
    last_name: String,
    date_of_birth: NaiveDate,
    gender: Gender,
    nhia_number: Option<String>,
    employer: Option<String>,
    plan: PlanTier,
    enrolled_on: NaiveDate,
    status: EnrolleeStatus,
}

impl Default for EnrolleeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl EnrolleeBuilder {
    pub fn new() -> Self {
        Self {
            first_name: FirstName().fake(),
            last_name: LastName().fake(),
            date_of_birth: date(1987, 9, 12),
            gender: Gender::Female,
            nhia_number: None,
            employer: None,
            plan: PlanTier::Silver,
            enrolled_on: date(2024, 1, 15),
            status: EnrolleeStatus::Active,
        }
    }

    pub fn with_name(mut self, first: impl Into<String>, last: impl Into<String>) -> Self {
        self.first_name = first.into();
        self.last_name = last.into();
        self
    }

    pub fn with_date_of_birth(mut self, dob: NaiveDate) -> Self {
        self.date_of_birth = dob;
        self
    }

    pub fn with_gender(mut self, gender: Gender) -> Self {
        self.gender = gender;
        self
    }

    pub fn with_nhia_number(mut self, nhia: impl Into<String>) -> Self {
        self.nhia_number = Some(nhia.into());
        self
    }

    pub fn with_employer(mut self, employer: impl Into<String>) -> Self {
        self.employer = Some(employer.into());
        self
    }

    pub fn with_plan(mut self, plan: PlanTier) -> Self {
        self.plan = plan;
        self
    }

    pub fn enrolled_on(mut self, date: NaiveDate) -> Self {
        self.enrolled_on = date;
        self
    }

    /// Status applied by [`build`](Self::build); registration itself always starts active
    pub fn with_status(mut self, status: EnrolleeStatus) -> Self {
        self.status = status;
        self
    }

    /// The registration request, ignoring any status set on the builder
    pub fn new_enrollee(&self) -> NewEnrollee {
        NewEnrollee {
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            date_of_birth: self.date_of_birth,
            gender: self.gender,
            nhia_number: self.nhia_number.clone(),
            phone: None,
            email: None,
            address: None,
            employer: self.employer.clone(),
            plan: self.plan,
            enrolled_on: self.enrolled_on,
        }
    }

    pub fn build(self) -> Enrollee {
        let mut enrollee = Enrollee::new(self.new_enrollee());
        enrollee.status = self.status;
        enrollee
    }
}

/// Builder for network providers
pub struct ProviderBuilder {
    name: String,
    tier: ProviderTier,
    category: ProviderCategory,
    contract_start: NaiveDate,
    contract_end: NaiveDate,
}

impl Default for ProviderBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ProviderBuilder {
    pub fn new() -> Self {
        let (start, end) = contract_year();
        let company: String = CompanyName().fake();
        Self {
            name: format!("{} Hospital", company),
            tier: ProviderTier::Secondary,
            category: ProviderCategory::Hospital,
            contract_start: start,
            contract_end: end,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_tier(mut self, tier: ProviderTier) -> Self {
        self.tier = tier;
        self
    }

    pub fn with_category(mut self, category: ProviderCategory) -> Self {
        self.category = category;
        self
    }

    pub fn with_contract(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.contract_start = start;
        self.contract_end = end;
        self
    }

    pub fn new_provider(&self) -> NewProvider {
        NewProvider {
            name: self.name.clone(),
            tier: self.tier,
            category: self.category,
            contract_start: self.contract_start,
            contract_end: self.contract_end,
            contact_email: None,
            contact_phone: None,
            address: None,
            bank_details: None,
        }
    }

    /// # Panics
    ///
    /// Panics when the builder holds an inverted contract
    pub fn build(self) -> Provider {
        Provider::new(self.new_provider()).expect("builder produced an invalid provider")
    }
}

/// Builder for submitted claims
///
/// Defaults to a consultation at 5,000 and two malaria tests at 2,500,
/// 10,000 in total.
pub struct ClaimBuilder {
    enrollee_id: EnrolleeId,
    provider_id: ProviderId,
    plan_tier: PlanTier,
    pa_code: Option<PaCode>,
    diagnosis_codes: Vec<String>,
    encounter_date: NaiveDate,
    treatments: Vec<NewTreatment>,
}

impl Default for ClaimBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ClaimBuilder {
    pub fn new() -> Self {
        Self {
            enrollee_id: EnrolleeId::new_v7(),
            provider_id: ProviderId::new_v7(),
            plan_tier: PlanTier::Silver,
            pa_code: None,
            diagnosis_codes: vec!["B54".to_string()],
            encounter_date: today(),
            treatments: vec![
                treatment(ServiceType::Consultation, "GP consultation", 1, dec!(5000)),
                treatment(ServiceType::Laboratory, "Malaria parasite test", 2, dec!(2500)),
            ],
        }
    }

    pub fn for_enrollee(mut self, id: EnrolleeId) -> Self {
        self.enrollee_id = id;
        self
    }

    pub fn at_provider(mut self, id: ProviderId) -> Self {
        self.provider_id = id;
        self
    }

    pub fn with_plan(mut self, plan: PlanTier) -> Self {
        self.plan_tier = plan;
        self
    }

    pub fn with_pa_code(mut self, code: PaCode) -> Self {
        self.pa_code = Some(code);
        self
    }

    pub fn with_diagnosis(mut self, codes: &[&str]) -> Self {
        self.diagnosis_codes = codes.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn on(mut self, encounter_date: NaiveDate) -> Self {
        self.encounter_date = encounter_date;
        self
    }

    /// Replaces the default lines
    pub fn with_treatments(mut self, treatments: Vec<NewTreatment>) -> Self {
        self.treatments = treatments;
        self
    }

    pub fn new_claim(&self) -> NewClaim {
        NewClaim {
            enrollee_id: self.enrollee_id,
            provider_id: self.provider_id,
            plan_tier: self.plan_tier,
            pa_code: self.pa_code.clone(),
            diagnosis_codes: self.diagnosis_codes.clone(),
            encounter_date: self.encounter_date,
            treatments: self.treatments.clone(),
        }
    }

    /// # Panics
    ///
    /// Panics when the builder holds no lines or a malformed diagnosis
    pub fn build(self) -> Claim {
        Claim::new(self.new_claim()).expect("builder produced an invalid claim")
    }

    /// A claim taken through both vetting stages and approved in full
    pub fn build_approved(self) -> Claim {
        self.build_approved_with(&[])
    }

    /// Like [`build_approved`](Self::build_approved) with explicit line amounts
    pub fn build_approved_with(self, line_approvals: &[LineApproval]) -> Claim {
        let mut claim = self.build();
        claim.pick_for_initial_vetting("vetter").expect("pick for vetting");
        claim.forward_to_doctor("vetter", None).expect("forward to doctor");
        claim.pick_for_doctor_review("doctor").expect("pick for review");
        claim.approve("doctor", line_approvals).expect("approve");
        claim
    }
}

/// A naira-priced treatment line
pub fn treatment(service: ServiceType, description: &str, quantity: u32, unit_price: Decimal) -> NewTreatment {
    NewTreatment {
        service_type: service,
        description: description.to_string(),
        quantity,
        unit_price: Money::ngn(unit_price),
    }
}
