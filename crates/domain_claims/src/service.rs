//! Claims domain services
//!
//! Operations that span the enrollment, provider and claims ports: issuing
//! PA codes and accepting claims from providers.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use core_kernel::{ClaimId, OperationMetadata, PortError, TreatmentLineId};
use domain_enrollment::{check_eligibility, EnrolleePort};
use domain_provider::ProviderPort;

use crate::authorization::{NewAuthorization, PaCode, PriorAuthorization};
use crate::benefits::BenefitSchedule;
use crate::claim::{Claim, LineApproval, NewClaim};
use crate::error::ClaimError;
use crate::ports::ClaimsPort;
use crate::treatment::NewTreatment;
use crate::vetting::VettingStage;

/// Attempts made to find an unused PA code before giving up
pub const MAX_PA_CODE_ATTEMPTS: usize = 5;

/// Orchestrates PA issuance and claim submission
#[derive(Clone)]
pub struct ClaimsService {
    claims: Arc<dyn ClaimsPort>,
    enrollees: Arc<dyn EnrolleePort>,
    providers: Arc<dyn ProviderPort>,
    benefits: Arc<BenefitSchedule>,
}

impl ClaimsService {
    pub fn new(
        claims: Arc<dyn ClaimsPort>,
        enrollees: Arc<dyn EnrolleePort>,
        providers: Arc<dyn ProviderPort>,
        benefits: Arc<BenefitSchedule>,
    ) -> Self {
        Self {
            claims,
            enrollees,
            providers,
            benefits,
        }
    }

    pub fn benefits(&self) -> &BenefitSchedule {
        &self.benefits
    }

    /// Issues a PA code for an active enrollee at a contracted provider
    ///
    /// Generated codes are checked against the port; on a clash a new code is
    /// drawn, up to [`MAX_PA_CODE_ATTEMPTS`] times.
    ///
    /// # Errors
    ///
    /// - `ClaimError::NotEligible` if the enrollee is not active
    /// - `ClaimError::ProviderNotContracted` if the provider has no contract today
    /// - `ClaimError::Port(PortError::Conflict)` if no free code was found
    #[instrument(skip(self, request), fields(enrollee = %request.enrollee_id))]
    pub async fn issue_authorization(
        &self,
        request: NewAuthorization,
        issued_by: &str,
        now: DateTime<Utc>,
    ) -> Result<PriorAuthorization, ClaimError> {
        let metadata = Some(OperationMetadata::for_user(issued_by));
        let enrollee = self.enrollees.get_enrollee(request.enrollee_id, metadata.clone()).await?;
        if !enrollee.is_active() {
            return Err(ClaimError::NotEligible(format!(
                "{} is {}",
                enrollee.enrollee_number, enrollee.status
            )));
        }
        let provider = self.providers.get_provider(request.provider_id, metadata.clone()).await?;
        if !provider.is_contracted_on(now.date_naive()) {
            return Err(ClaimError::ProviderNotContracted(provider.provider_code));
        }

        for attempt in 1..=MAX_PA_CODE_ATTEMPTS {
            let code = PaCode::generate(now);
            if self.claims.pa_code_exists(&code).await? {
                warn!(%code, attempt, "PA code already issued, regenerating");
                continue;
            }
            let authorization = PriorAuthorization::issue(code, request.clone(), issued_by, now)?;
            match self.claims.save_authorization(&authorization, metadata.clone()).await {
                Ok(()) => {
                    info!(code = %authorization.code, "Prior authorization issued");
                    return Ok(authorization);
                }
                Err(PortError::Conflict { .. }) => {
                    warn!(code = %authorization.code, attempt, "PA code taken concurrently, regenerating");
                }
                Err(err) => return Err(err.into()),
            }
        }
        Err(PortError::conflict(format!(
            "no unused PA code after {} attempts",
            MAX_PA_CODE_ATTEMPTS
        ))
        .into())
    }

    /// Accepts a claim from a provider
    ///
    /// Checks, in order: eligibility of the enrollee for every line's service
    /// on the encounter date, the quoted PA code, and the provider's contract.
    /// The benefit schedule is then applied and the PA code marked used.
    #[instrument(skip(self, request), fields(enrollee = %request.enrollee_id, provider = %request.provider_id))]
    pub async fn submit_claim(
        &self,
        mut request: NewClaim,
        submitted_by: &str,
        now: DateTime<Utc>,
    ) -> Result<Claim, ClaimError> {
        let metadata = Some(OperationMetadata::for_user(submitted_by));

        let enrollee = self.enrollees.get_enrollee(request.enrollee_id, metadata.clone()).await?;
        // Limits follow the plan the member holds, whatever the submitter sent
        request.plan_tier = enrollee.plan;
        let mut reasons = Vec::new();
        for treatment in &request.treatments {
            let result = check_eligibility(&enrollee, treatment.service_type, request.encounter_date);
            for reason in result.reasons {
                let text = format!("{}: {}", treatment.service_type, reason.describe());
                if !reasons.contains(&text) {
                    reasons.push(text);
                }
            }
        }
        if !reasons.is_empty() {
            return Err(ClaimError::NotEligible(reasons.join("; ")));
        }

        let mut authorization = match request.pa_code {
            Some(ref code) => Some(self.verify_authorization(code, &request, now).await?),
            None => None,
        };

        let provider = self.providers.get_provider(request.provider_id, metadata.clone()).await?;
        if !provider.is_contracted_on(request.encounter_date) {
            return Err(ClaimError::ProviderNotContracted(format!(
                "{} on {}",
                provider.provider_code, request.encounter_date
            )));
        }

        let mut claim = Claim::new(request)?;
        let amount = claim.submitted_amount()?;
        claim.apply_benefit_schedule(&self.benefits);
        self.claims.create_claim(&claim, metadata.clone()).await?;

        if let Some(ref mut pa) = authorization {
            pa.mark_used(now)?;
            self.claims.update_authorization(pa, metadata).await?;
        }

        info!(
            claim = %claim.claim_number,
            %amount,
            flagged = claim.flagged_lines().len(),
            "Claim submitted"
        );
        Ok(claim)
    }

    pub async fn get_claim(&self, id: ClaimId) -> Result<Claim, ClaimError> {
        Ok(self.claims.get_claim(id, None).await?)
    }

    /// Adds a line and re-applies the benefit schedule
    #[instrument(skip(self, data), fields(claim_id = %id))]
    pub async fn add_treatment(
        &self,
        id: ClaimId,
        data: NewTreatment,
        actor: &str,
    ) -> Result<Claim, ClaimError> {
        let benefits = Arc::clone(&self.benefits);
        self.modify(id, actor, move |claim| {
            claim.add_treatment(actor, data)?;
            claim.apply_benefit_schedule(&benefits);
            Ok(())
        })
        .await
    }

    /// Corrects the quantity and/or unit price of one line
    #[instrument(skip(self), fields(claim_id = %id, line_id = %line_id))]
    pub async fn update_treatment(
        &self,
        id: ClaimId,
        line_id: TreatmentLineId,
        quantity: Option<u32>,
        unit_price: Option<Decimal>,
        actor: &str,
    ) -> Result<Claim, ClaimError> {
        let benefits = Arc::clone(&self.benefits);
        self.modify(id, actor, move |claim| {
            if let Some(quantity) = quantity {
                claim.update_treatment_quantity(actor, line_id, quantity)?;
            }
            if let Some(price) = unit_price {
                claim.update_treatment_price(actor, line_id, price)?;
            }
            claim.apply_benefit_schedule(&benefits);
            Ok(())
        })
        .await
    }

    /// Takes the claim from whichever queue it is waiting in
    #[instrument(skip(self), fields(claim_id = %id))]
    pub async fn pick(&self, id: ClaimId, actor: &str) -> Result<Claim, ClaimError> {
        let claim = self
            .modify(id, actor, |claim| match claim.stage {
                VettingStage::PendingDoctorReview => claim.pick_for_doctor_review(actor),
                _ => claim.pick_for_initial_vetting(actor),
            })
            .await?;
        info!(claim = %claim.claim_number, stage = %claim.stage, actor, "Claim picked");
        Ok(claim)
    }

    #[instrument(skip(self, note), fields(claim_id = %id))]
    pub async fn forward_to_doctor(
        &self,
        id: ClaimId,
        note: Option<String>,
        actor: &str,
    ) -> Result<Claim, ClaimError> {
        self.modify(id, actor, |claim| claim.forward_to_doctor(actor, note)).await
    }

    #[instrument(skip(self), fields(claim_id = %id))]
    pub async fn release(&self, id: ClaimId, actor: &str) -> Result<Claim, ClaimError> {
        self.modify(id, actor, |claim| claim.release(actor)).await
    }

    #[instrument(skip(self, line_approvals), fields(claim_id = %id))]
    pub async fn approve(
        &self,
        id: ClaimId,
        line_approvals: Vec<LineApproval>,
        actor: &str,
    ) -> Result<Claim, ClaimError> {
        self.modify(id, actor, |claim| claim.approve(actor, &line_approvals).map(|_| ()))
            .await
    }

    #[instrument(skip(self, reason), fields(claim_id = %id))]
    pub async fn reject(&self, id: ClaimId, reason: &str, actor: &str) -> Result<Claim, ClaimError> {
        self.modify(id, actor, |claim| claim.reject(actor, reason)).await
    }

    /// Loads a claim, applies `change` and stores the result
    async fn modify<F>(&self, id: ClaimId, actor: &str, change: F) -> Result<Claim, ClaimError>
    where
        F: FnOnce(&mut Claim) -> Result<(), ClaimError> + Send,
    {
        let metadata = Some(OperationMetadata::for_user(actor));
        let mut claim = self.claims.get_claim(id, metadata.clone()).await?;
        change(&mut claim)?;
        self.claims.update_claim(&claim, metadata).await?;
        Ok(claim)
    }

    async fn verify_authorization(
        &self,
        code: &PaCode,
        request: &NewClaim,
        now: DateTime<Utc>,
    ) -> Result<PriorAuthorization, ClaimError> {
        let pa = match self.claims.get_authorization_by_code(code).await {
            Ok(pa) => pa,
            Err(err) if err.is_not_found() => {
                return Err(ClaimError::invalid_authorization(format!("{} was never issued", code)))
            }
            Err(err) => return Err(err.into()),
        };
        if !pa.is_valid_at(now) {
            return Err(ClaimError::invalid_authorization(format!(
                "{} is {}",
                code,
                pa.status_at(now)
            )));
        }
        if pa.enrollee_id != request.enrollee_id {
            return Err(ClaimError::invalid_authorization(format!(
                "{} was issued for another enrollee",
                code
            )));
        }
        if pa.provider_id != request.provider_id {
            return Err(ClaimError::invalid_authorization(format!(
                "{} was issued to another provider",
                code
            )));
        }
        Ok(pa)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::mock::InMemoryClaimsPort;
    use chrono::{Duration, NaiveDate, TimeZone};
    use core_kernel::Money;
    use domain_enrollment::{Enrollee, Gender, InMemoryEnrolleePort, NewEnrollee, PlanTier, ServiceType};
    use domain_provider::{InMemoryProviderPort, NewProvider, Provider, ProviderCategory, ProviderTier};
    use rust_decimal_macros::dec;
    use core_kernel::{DomainPort, HealthCheckResult, HealthCheckable};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 8, 15, 10, 0, 0).unwrap()
    }

    fn member(plan: PlanTier) -> Enrollee {
        Enrollee::new(NewEnrollee {
            first_name: "Chiamaka".to_string(),
            last_name: "Obi".to_string(),
            date_of_birth: NaiveDate::from_ymd_opt(1991, 4, 9).unwrap(),
            gender: Gender::Female,
            nhia_number: None,
            phone: None,
            email: None,
            address: None,
            employer: None,
            plan,
            enrolled_on: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        })
    }

    fn hospital() -> Provider {
        Provider::new(NewProvider {
            name: "Lagos Island General".to_string(),
            tier: ProviderTier::Secondary,
            category: ProviderCategory::Hospital,
            contract_start: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            contract_end: NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
            contact_email: None,
            contact_phone: None,
            address: None,
            bank_details: None,
        })
        .unwrap()
    }

    struct Fixture {
        service: ClaimsService,
        claims: InMemoryClaimsPort,
        enrollee: Enrollee,
        provider: Provider,
    }

    async fn fixture(plan: PlanTier) -> Fixture {
        let enrollee = member(plan);
        let provider = hospital();
        let claims = InMemoryClaimsPort::new();
        let service = ClaimsService::new(
            Arc::new(claims.clone()),
            Arc::new(InMemoryEnrolleePort::with_enrollees(vec![enrollee.clone()]).await),
            Arc::new(InMemoryProviderPort::with_providers(vec![provider.clone()]).await),
            Arc::new(BenefitSchedule::default()),
        );
        Fixture {
            service,
            claims,
            enrollee,
            provider,
        }
    }

    fn claim_request(f: &Fixture, service: ServiceType, price: rust_decimal::Decimal) -> NewClaim {
        NewClaim {
            enrollee_id: f.enrollee.id,
            provider_id: f.provider.id,
            plan_tier: PlanTier::Platinum,
            pa_code: None,
            diagnosis_codes: vec!["K35.8".to_string()],
            encounter_date: NaiveDate::from_ymd_opt(2024, 8, 14).unwrap(),
            treatments: vec![NewTreatment {
                service_type: service,
                description: "Appendicectomy".to_string(),
                quantity: 1,
                unit_price: Money::ngn(price),
            }],
        }
    }

    fn pa_request(f: &Fixture) -> NewAuthorization {
        NewAuthorization {
            enrollee_id: f.enrollee.id,
            provider_id: f.provider.id,
            diagnosis_code: "K35.8".to_string(),
            services: vec![ServiceType::Surgery],
            validity_days: None,
        }
    }

    #[tokio::test]
    async fn test_submit_with_pa_consumes_it() {
        let f = fixture(PlanTier::Silver).await;
        let pa = f.service.issue_authorization(pa_request(&f), "desk", now()).await.unwrap();

        let mut request = claim_request(&f, ServiceType::Surgery, dec!(400000));
        request.pa_code = Some(pa.code.clone());
        let claim = f.service.submit_claim(request, "provider-portal", now()).await.unwrap();

        assert_eq!(claim.stage, VettingStage::ReadyForInitialVetting);
        // Silver surgery limit is 375,000 and the plan snapshot comes from the member
        assert_eq!(claim.plan_tier, PlanTier::Silver);
        assert_eq!(claim.flagged_lines().len(), 1);

        let stored = f.claims.get_authorization_by_code(&pa.code).await.unwrap();
        assert_eq!(stored.status, crate::authorization::AuthorizationStatus::Used);

        let mut again = claim_request(&f, ServiceType::Surgery, dec!(1000));
        again.pa_code = Some(pa.code);
        let err = f.service.submit_claim(again, "provider-portal", now()).await.unwrap_err();
        assert!(matches!(err, ClaimError::InvalidAuthorization(_)));
    }

    #[tokio::test]
    async fn test_uncovered_service_is_not_eligible() {
        let f = fixture(PlanTier::Bronze).await;
        let request = claim_request(&f, ServiceType::Surgery, dec!(1000));
        let err = f.service.submit_claim(request, "provider-portal", now()).await.unwrap_err();
        match err {
            ClaimError::NotEligible(message) => assert!(message.contains("does not cover surgery")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unknown_pa_code_rejected() {
        let f = fixture(PlanTier::Gold).await;
        let mut request = claim_request(&f, ServiceType::Consultation, dec!(5000));
        request.pa_code = Some(PaCode::generate(now()));
        let err = f.service.submit_claim(request, "provider-portal", now()).await.unwrap_err();
        assert!(matches!(err, ClaimError::InvalidAuthorization(_)));
        assert!(f.claims.find_claims(Default::default(), None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_expired_pa_code_rejected() {
        let f = fixture(PlanTier::Gold).await;
        let pa = f.service.issue_authorization(pa_request(&f), "desk", now()).await.unwrap();
        let mut request = claim_request(&f, ServiceType::Surgery, dec!(5000));
        request.pa_code = Some(pa.code);
        let later = now() + Duration::days(31);
        let err = f.service.submit_claim(request, "provider-portal", later).await.unwrap_err();
        assert!(err.to_string().contains("expired"));
    }

    #[tokio::test]
    async fn test_encounter_outside_contract_rejected() {
        let f = fixture(PlanTier::Gold).await;
        let mut request = claim_request(&f, ServiceType::Consultation, dec!(5000));
        request.encounter_date = NaiveDate::from_ymd_opt(2025, 1, 2).unwrap();
        let err = f.service.submit_claim(request, "provider-portal", now()).await.unwrap_err();
        assert!(matches!(err, ClaimError::ProviderNotContracted(_)));
    }

    #[tokio::test]
    async fn test_pa_for_suspended_member_refused() {
        let mut enrollee = member(PlanTier::Gold);
        enrollee.suspend().unwrap();
        let provider = hospital();
        let service = ClaimsService::new(
            Arc::new(InMemoryClaimsPort::new()),
            Arc::new(InMemoryEnrolleePort::with_enrollees(vec![enrollee.clone()]).await),
            Arc::new(InMemoryProviderPort::with_providers(vec![provider.clone()]).await),
            Arc::new(BenefitSchedule::default()),
        );
        let request = NewAuthorization {
            enrollee_id: enrollee.id,
            provider_id: provider.id,
            diagnosis_code: "I10".to_string(),
            services: vec![ServiceType::Consultation],
            validity_days: Some(7),
        };
        assert!(matches!(
            service.issue_authorization(request, "desk", now()).await,
            Err(ClaimError::NotEligible(_))
        ));
    }
    /// Claims port whose first `taken` code lookups and `conflicts` saves report a clash
    #[derive(Clone)]
    struct CrowdedCodes {
        inner: InMemoryClaimsPort,
        taken: usize,
        conflicts: usize,
        lookups: Arc<AtomicUsize>,
        saves: Arc<AtomicUsize>,
    }

    impl CrowdedCodes {
        fn new(taken: usize, conflicts: usize) -> Self {
            Self {
                inner: InMemoryClaimsPort::new(),
                taken,
                conflicts,
                lookups: Arc::new(AtomicUsize::new(0)),
                saves: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    impl DomainPort for CrowdedCodes {}

    #[async_trait::async_trait]
    impl HealthCheckable for CrowdedCodes {
        async fn health_check(&self) -> HealthCheckResult {
            self.inner.health_check().await
        }
    }

    #[async_trait::async_trait]
    impl ClaimsPort for CrowdedCodes {
        async fn get_claim(&self, id: ClaimId, metadata: Option<OperationMetadata>) -> Result<Claim, PortError> {
            self.inner.get_claim(id, metadata).await
        }

        async fn find_claims(
            &self,
            query: crate::ports::ClaimQuery,
            metadata: Option<OperationMetadata>,
        ) -> Result<Vec<Claim>, PortError> {
            self.inner.find_claims(query, metadata).await
        }

        async fn create_claim(&self, claim: &Claim, metadata: Option<OperationMetadata>) -> Result<(), PortError> {
            self.inner.create_claim(claim, metadata).await
        }

        async fn update_claim(&self, claim: &Claim, metadata: Option<OperationMetadata>) -> Result<(), PortError> {
            self.inner.update_claim(claim, metadata).await
        }

        async fn pa_code_exists(&self, code: &PaCode) -> Result<bool, PortError> {
            if self.lookups.fetch_add(1, Ordering::SeqCst) < self.taken {
                return Ok(true);
            }
            self.inner.pa_code_exists(code).await
        }

        async fn save_authorization(
            &self,
            authorization: &PriorAuthorization,
            metadata: Option<OperationMetadata>,
        ) -> Result<(), PortError> {
            if self.saves.fetch_add(1, Ordering::SeqCst) < self.conflicts {
                return Err(PortError::conflict(format!("PA code {} already issued", authorization.code)));
            }
            self.inner.save_authorization(authorization, metadata).await
        }

        async fn get_authorization_by_code(&self, code: &PaCode) -> Result<PriorAuthorization, PortError> {
            self.inner.get_authorization_by_code(code).await
        }

        async fn update_authorization(
            &self,
            authorization: &PriorAuthorization,
            metadata: Option<OperationMetadata>,
        ) -> Result<(), PortError> {
            self.inner.update_authorization(authorization, metadata).await
        }
    }

    async fn service_over(claims: CrowdedCodes) -> (ClaimsService, Enrollee, Provider) {
        let enrollee = member(PlanTier::Gold);
        let provider = hospital();
        let service = ClaimsService::new(
            Arc::new(claims),
            Arc::new(InMemoryEnrolleePort::with_enrollees(vec![enrollee.clone()]).await),
            Arc::new(InMemoryProviderPort::with_providers(vec![provider.clone()]).await),
            Arc::new(BenefitSchedule::default()),
        );
        (service, enrollee, provider)
    }

    fn surgery_pa(enrollee: &Enrollee, provider: &Provider) -> NewAuthorization {
        NewAuthorization {
            enrollee_id: enrollee.id,
            provider_id: provider.id,
            diagnosis_code: "K35.8".to_string(),
            services: vec![ServiceType::Surgery],
            validity_days: None,
        }
    }

    #[tokio::test]
    async fn test_pa_issue_gives_up_when_every_code_is_taken() {
        let claims = CrowdedCodes::new(usize::MAX, 0);
        let (service, enrollee, provider) = service_over(claims.clone()).await;

        let err = service
            .issue_authorization(surgery_pa(&enrollee, &provider), "desk", now())
            .await
            .unwrap_err();
        assert!(matches!(err, ClaimError::Port(PortError::Conflict { .. })));
        assert_eq!(claims.lookups.load(Ordering::SeqCst), MAX_PA_CODE_ATTEMPTS);
        assert_eq!(claims.saves.load(Ordering::SeqCst), 0);
        assert_eq!(claims.inner.authorization_count().await, 0);
    }

    #[tokio::test]
    async fn test_pa_issue_retries_after_existing_code() {
        let claims = CrowdedCodes::new(2, 0);
        let (service, enrollee, provider) = service_over(claims.clone()).await;

        let pa = service
            .issue_authorization(surgery_pa(&enrollee, &provider), "desk", now())
            .await
            .unwrap();
        assert_eq!(claims.lookups.load(Ordering::SeqCst), 3);
        assert_eq!(claims.inner.get_authorization_by_code(&pa.code).await.unwrap().id, pa.id);
    }

    #[tokio::test]
    async fn test_pa_issue_retries_after_concurrent_save() {
        let claims = CrowdedCodes::new(0, 1);
        let (service, enrollee, provider) = service_over(claims.clone()).await;

        let pa = service
            .issue_authorization(surgery_pa(&enrollee, &provider), "desk", now())
            .await
            .unwrap();
        assert_eq!(claims.saves.load(Ordering::SeqCst), 2);
        assert_eq!(claims.inner.authorization_count().await, 1);
        assert_eq!(pa.enrollee_id, enrollee.id);
    }

    #[tokio::test]
    async fn test_second_vetter_cannot_edit_picked_claim() {
        let f = fixture(PlanTier::Gold).await;
        let request = claim_request(&f, ServiceType::Consultation, dec!(15000));
        let claim = f.service.submit_claim(request, "provider-portal", now()).await.unwrap();
        let claim = f.service.pick(claim.id, "vetter.ada").await.unwrap();
        let line_id = claim.treatments[0].id;

        let err = f
            .service
            .update_treatment(claim.id, line_id, Some(9), None, "vetter.bola")
            .await
            .unwrap_err();
        assert!(matches!(err, ClaimError::NotAssignee { .. }));

        let extra = NewTreatment {
            service_type: ServiceType::Laboratory,
            description: "Full blood count".to_string(),
            quantity: 1,
            unit_price: Money::ngn(dec!(4000)),
        };
        let err = f.service.add_treatment(claim.id, extra, "vetter.bola").await.unwrap_err();
        assert!(matches!(err, ClaimError::NotAssignee { .. }));

        let stored = f.service.get_claim(claim.id).await.unwrap();
        assert_eq!(stored.submitted_amount().unwrap(), Money::ngn(dec!(15000)));
    }

    #[tokio::test]
    async fn test_vetting_round_trip_through_service() {
        let f = fixture(PlanTier::Gold).await;
        let request = claim_request(&f, ServiceType::Consultation, dec!(15000));
        let claim = f.service.submit_claim(request, "provider-portal", now()).await.unwrap();

        let claim = f.service.pick(claim.id, "vetter-1").await.unwrap();
        assert_eq!(claim.stage, VettingStage::UnderInitialVetting);
        let line_id = claim.treatments[0].id;
        let claim = f
            .service
            .update_treatment(claim.id, line_id, Some(2), None, "vetter-1")
            .await
            .unwrap();
        assert_eq!(claim.submitted_amount().unwrap(), Money::ngn(dec!(30000)));

        f.service
            .forward_to_doctor(claim.id, Some("check dosage".to_string()), "vetter-1")
            .await
            .unwrap();
        let claim = f.service.pick(claim.id, "dr-ade").await.unwrap();
        assert_eq!(claim.stage, VettingStage::UnderDoctorReview);

        let err = f.service.approve(claim.id, Vec::new(), "vetter-1").await.unwrap_err();
        assert!(matches!(err, ClaimError::NotAssignee { .. }));

        let approved = f.service.approve(claim.id, Vec::new(), "dr-ade").await.unwrap();
        assert_eq!(approved.approved_amount, Some(Money::ngn(dec!(30000))));
        let stored = f.service.get_claim(claim.id).await.unwrap();
        assert_eq!(stored.stage, VettingStage::Approved);
        assert_eq!(stored.history.len(), 4);
    }
}
