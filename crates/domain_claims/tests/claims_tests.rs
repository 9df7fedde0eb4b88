//! Tests for domain_claims: vetting workflow, approvals and benefit flags

use chrono::NaiveDate;
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use core_kernel::{EnrolleeId, Money, PaymentBatchId, ProviderId, TreatmentLineId};
use domain_claims::{
    BenefitSchedule, Claim, ClaimError, LineApproval, NewClaim, NewTreatment, ServiceType,
    VettingStage,
};
use domain_enrollment::PlanTier;
use test_utils::{assert_approval_balanced, assert_history_consistent, ClaimBuilder};

fn treatment(service: ServiceType, quantity: u32, price: Decimal) -> NewTreatment {
    test_utils::treatment(service, &format!("{} item", service), quantity, price)
}

fn create_test_claim(plan: PlanTier, treatments: Vec<NewTreatment>) -> Claim {
    ClaimBuilder::new()
        .with_plan(plan)
        .with_diagnosis(&["B50.9", "D50.9"])
        .on(NaiveDate::from_ymd_opt(2024, 5, 20).unwrap())
        .with_treatments(treatments)
        .build()
}

fn malaria_claim() -> Claim {
    create_test_claim(
        PlanTier::Bronze,
        vec![
            treatment(ServiceType::Consultation, 1, dec!(5000)),
            treatment(ServiceType::Laboratory, 2, dec!(3500)),
            treatment(ServiceType::Pharmacy, 3, dec!(4500)),
        ],
    )
}

/// Walks a claim to the doctor's desk
fn under_doctor_review(mut claim: Claim) -> Claim {
    claim.pick_for_initial_vetting("vetter.amina").unwrap();
    claim.forward_to_doctor("vetter.amina", Some("lab results attached".to_string())).unwrap();
    claim.pick_for_doctor_review("dr.okafor").unwrap();
    claim
}

// ============================================================================
// Claim Creation Tests
// ============================================================================

mod creation_tests {
    use super::*;

    #[test]
    fn test_submitted_amount_sums_lines() {
        let claim = malaria_claim();
        assert_eq!(claim.submitted_amount().unwrap(), Money::ngn(dec!(25500)));
        assert_eq!(claim.stage, VettingStage::ReadyForInitialVetting);
        assert!(claim.history.is_empty());
    }

    #[test]
    fn test_claim_needs_lines() {
        let result = Claim::new(NewClaim {
            enrollee_id: EnrolleeId::new_v7(),
            provider_id: ProviderId::new_v7(),
            plan_tier: PlanTier::Gold,
            pa_code: None,
            diagnosis_codes: vec!["I10".to_string()],
            encounter_date: NaiveDate::from_ymd_opt(2024, 5, 20).unwrap(),
            treatments: vec![],
        });
        assert!(matches!(result, Err(ClaimError::NoTreatments)));
    }

    #[test]
    fn test_unknown_diagnosis_rejected() {
        let result = Claim::new(NewClaim {
            enrollee_id: EnrolleeId::new_v7(),
            provider_id: ProviderId::new_v7(),
            plan_tier: PlanTier::Gold,
            pa_code: None,
            diagnosis_codes: vec!["I10".to_string(), "ZZZ".to_string()],
            encounter_date: NaiveDate::from_ymd_opt(2024, 5, 20).unwrap(),
            treatments: vec![treatment(ServiceType::Consultation, 1, dec!(5000))],
        });
        assert!(matches!(result, Err(ClaimError::MalformedDiagnosis(_))));
    }

    #[test]
    fn test_mixed_currencies_rejected() {
        let mut usd_line = treatment(ServiceType::Pharmacy, 1, dec!(20));
        usd_line.unit_price = Money::new(dec!(20), core_kernel::Currency::USD);
        let result = Claim::new(NewClaim {
            enrollee_id: EnrolleeId::new_v7(),
            provider_id: ProviderId::new_v7(),
            plan_tier: PlanTier::Gold,
            pa_code: None,
            diagnosis_codes: vec!["I10".to_string()],
            encounter_date: NaiveDate::from_ymd_opt(2024, 5, 20).unwrap(),
            treatments: vec![treatment(ServiceType::Consultation, 1, dec!(5000)), usd_line],
        });
        assert!(matches!(result, Err(ClaimError::InvalidTreatment(_))));
    }
}

// ============================================================================
// Vetting Workflow Tests
// ============================================================================

mod workflow_tests {
    use super::*;

    #[test]
    fn test_full_path_to_approval() {
        let mut claim = under_doctor_review(malaria_claim());
        let approved = claim.approve("dr.okafor", &[]).unwrap();

        assert_eq!(approved, Money::ngn(dec!(25500)));
        assert_eq!(claim.stage, VettingStage::Approved);
        assert_eq!(claim.approved_amount, Some(approved));
        assert!(claim.assigned_to.is_none());

        let stages: Vec<VettingStage> = claim.history.iter().map(|h| h.to).collect();
        assert_eq!(
            stages,
            vec![
                VettingStage::UnderInitialVetting,
                VettingStage::PendingDoctorReview,
                VettingStage::UnderDoctorReview,
                VettingStage::Approved,
            ]
        );
        assert_eq!(claim.history[1].note.as_deref(), Some("lab results attached"));
        assert_eq!(claim.history[3].actor, "dr.okafor");
        assert_history_consistent(&claim);
        assert_approval_balanced(&claim);
    }

    #[test]
    fn test_initial_vetter_cannot_approve() {
        let mut claim = malaria_claim();
        claim.pick_for_initial_vetting("vetter.amina").unwrap();
        assert!(matches!(
            claim.approve("vetter.amina", &[]),
            Err(ClaimError::InvalidStageTransition { .. })
        ));
    }

    #[test]
    fn test_initial_vetter_may_reject() {
        let mut claim = malaria_claim();
        claim.pick_for_initial_vetting("vetter.amina").unwrap();
        claim.reject("vetter.amina", "Duplicate of CLM-2024-0000042").unwrap();
        assert_eq!(claim.stage, VettingStage::Rejected);
        assert_eq!(claim.rejection_reason.as_deref(), Some("Duplicate of CLM-2024-0000042"));
    }

    #[test]
    fn test_reject_requires_reason() {
        let mut claim = under_doctor_review(malaria_claim());
        assert!(matches!(claim.reject("dr.okafor", "   "), Err(ClaimError::RejectionReasonRequired)));
        assert_eq!(claim.stage, VettingStage::UnderDoctorReview);
    }

    #[test]
    fn test_rejected_is_terminal() {
        let mut claim = under_doctor_review(malaria_claim());
        claim.reject("dr.okafor", "Not medically necessary").unwrap();
        assert!(claim.pick_for_initial_vetting("vetter.amina").is_err());
        assert!(claim.approve("dr.okafor", &[]).is_err());
    }

    #[test]
    fn test_doctor_release_returns_to_queue() {
        let mut claim = under_doctor_review(malaria_claim());
        claim.release("dr.okafor").unwrap();
        assert_eq!(claim.stage, VettingStage::PendingDoctorReview);
        claim.pick_for_doctor_review("dr.bello").unwrap();
        assert_eq!(claim.assigned_to.as_deref(), Some("dr.bello"));
        assert_history_consistent(&claim);
    }

    #[test]
    fn test_release_from_queue_is_invalid() {
        let mut claim = malaria_claim();
        assert!(claim.release("vetter.amina").is_err());
    }
}

// ============================================================================
// Treatment Editing Tests
// ============================================================================

mod treatment_edit_tests {
    use super::*;

    #[test]
    fn test_edit_updates_submitted_amount() {
        let mut claim = malaria_claim();
        let pharmacy = claim.treatments[2].id;
        claim.update_treatment_quantity("vetter.amina", pharmacy, 1).unwrap();
        assert_eq!(claim.submitted_amount().unwrap(), Money::ngn(dec!(16500)));

        let added = claim.add_treatment("vetter.amina", treatment(ServiceType::Radiology, 1, dec!(12000))).unwrap();
        assert_eq!(claim.submitted_amount().unwrap(), Money::ngn(dec!(28500)));
        claim.remove_treatment("vetter.amina", added).unwrap();
        assert_eq!(claim.submitted_amount().unwrap(), Money::ngn(dec!(16500)));
    }

    #[test]
    fn test_pending_doctor_review_locks_lines() {
        let mut claim = malaria_claim();
        claim.pick_for_initial_vetting("vetter.amina").unwrap();
        claim.forward_to_doctor("vetter.amina", None).unwrap();
        let line = claim.treatments[0].id;
        assert!(matches!(claim.update_treatment_quantity("vetter.amina", line, 2), Err(ClaimError::ClaimLocked(_))));
    }

    #[test]
    fn test_doctor_can_correct_lines() {
        let mut claim = under_doctor_review(malaria_claim());
        let line = claim.treatments[1].id;
        claim.update_treatment_price("dr.okafor", line, dec!(3000)).unwrap();
        assert_eq!(claim.treatments[1].total(), Money::ngn(dec!(6000)));
    }

    #[test]
    fn test_unknown_line_reported() {
        let mut claim = malaria_claim();
        assert!(matches!(
            claim.update_treatment_quantity("vetter.amina", TreatmentLineId::new_v7(), 2),
            Err(ClaimError::TreatmentNotFound(_))
        ));
    }
}

// ============================================================================
// Approval and Benefit Limit Tests
// ============================================================================

mod approval_tests {
    use super::*;

    #[test]
    fn test_partial_approval_caps_each_line() {
        let mut claim = under_doctor_review(malaria_claim());
        let consult = claim.treatments[0].id;
        let lab = claim.treatments[1].id;

        let approved = claim
            .approve(
                "dr.okafor",
                &[
                    LineApproval { line_id: consult, amount: dec!(9000) },
                    LineApproval { line_id: lab, amount: dec!(4000) },
                ],
            )
            .unwrap();

        // 5000 (capped) + 4000 + 13500 (defaulted to line total)
        assert_eq!(approved, Money::ngn(dec!(22500)));
        assert_eq!(claim.treatments[0].approved_amount, Some(Money::ngn(dec!(5000))));
        assert_approval_balanced(&claim);
    }

    #[test]
    fn test_negative_approval_rejected() {
        let mut claim = under_doctor_review(malaria_claim());
        let consult = claim.treatments[0].id;
        let result = claim.approve("dr.okafor", &[LineApproval { line_id: consult, amount: dec!(-1) }]);
        assert!(matches!(result, Err(ClaimError::InvalidApproval(_))));
        assert_eq!(claim.stage, VettingStage::UnderDoctorReview);
    }

    #[test]
    fn test_flagged_lines_can_still_be_approved() {
        let mut claim = create_test_claim(
            PlanTier::Bronze,
            vec![
                treatment(ServiceType::Consultation, 3, dec!(5000)),
                treatment(ServiceType::Dental, 1, dec!(8000)),
            ],
        );
        let checks = claim.apply_benefit_schedule(&BenefitSchedule::default());
        assert!(checks.iter().all(|c| c.exceeds));
        assert_eq!(claim.flagged_lines().len(), 2);

        let mut claim = under_doctor_review(claim);
        assert_eq!(claim.approve("dr.okafor", &[]).unwrap(), Money::ngn(dec!(23000)));
    }

    #[test]
    fn test_batch_assignment_rules() {
        let mut claim = malaria_claim();
        let batch = PaymentBatchId::new_v7();
        assert!(matches!(claim.assign_to_batch(batch), Err(ClaimError::NotApproved(_))));

        let mut claim = under_doctor_review(claim);
        claim.approve("dr.okafor", &[]).unwrap();
        assert!(claim.is_payable());
        claim.assign_to_batch(batch).unwrap();
        assert!(!claim.is_payable());
        assert!(matches!(
            claim.assign_to_batch(PaymentBatchId::new_v7()),
            Err(ClaimError::AlreadyBatched(_))
        ));

        claim.clear_batch(batch);
        assert!(claim.is_payable());
    }
}

// ============================================================================
// Property Tests
// ============================================================================

mod property_tests {
    use super::*;

    proptest! {
        #[test]
        fn line_total_is_price_times_quantity(
            lines in prop::collection::vec((1u32..50, 0i64..5_000_000), 1..8),
            new_quantity in 1u32..100,
        ) {
            let treatments = lines
                .iter()
                .map(|(q, kobo)| NewTreatment {
                    service_type: ServiceType::Pharmacy,
                    description: "drug".to_string(),
                    quantity: *q,
                    unit_price: Money::from_minor(*kobo, core_kernel::Currency::NGN),
                })
                .collect();
            let mut claim = create_test_claim(PlanTier::Gold, treatments);

            let first = claim.treatments[0].id;
            claim.update_treatment_quantity("vetter.amina", first, new_quantity).unwrap();

            let mut expected = Decimal::ZERO;
            for line in &claim.treatments {
                prop_assert_eq!(line.total().amount(), line.unit_price().amount() * Decimal::from(line.quantity()));
                expected += line.total().amount();
            }
            prop_assert_eq!(claim.submitted_amount().unwrap().amount(), expected);
        }

        #[test]
        fn approved_never_exceeds_submitted(
            lines in prop::collection::vec((1u32..10, 1i64..1_000_000), 1..6),
            asks in prop::collection::vec(0i64..10_000_000, 6),
        ) {
            let treatments = lines
                .iter()
                .map(|(q, kobo)| NewTreatment {
                    service_type: ServiceType::Consultation,
                    description: "visit".to_string(),
                    quantity: *q,
                    unit_price: Money::from_minor(*kobo, core_kernel::Currency::NGN),
                })
                .collect();
            let mut claim = under_doctor_review(create_test_claim(PlanTier::Gold, treatments));
            let approvals: Vec<LineApproval> = claim
                .treatments
                .iter()
                .zip(&asks)
                .map(|(line, kobo)| LineApproval { line_id: line.id, amount: Decimal::new(*kobo, 2) })
                .collect();

            let approved = claim.approve("dr.okafor", &approvals).unwrap();
            prop_assert!(approved.amount() <= claim.submitted_amount().unwrap().amount());
            assert_approval_balanced(&claim);
        }
    }
}
