//! Custom Test Assertions
//!
//! Assertions over domain types with messages that name the claim or batch
//! at fault instead of dumping both structs.

use rust_decimal::Decimal;

use core_kernel::Money;
use domain_billing::PaymentBatch;
use domain_claims::{Claim, VettingStage};

/// Asserts two amounts agree in currency and value
pub fn assert_money_eq(actual: &Money, expected: &Money) {
    assert_eq!(
        actual.currency(),
        expected.currency(),
        "Currency mismatch: actual={}, expected={}",
        actual.currency(),
        expected.currency()
    );
    assert_eq!(
        actual.amount(),
        expected.amount(),
        "Amount mismatch: actual={}, expected={}",
        actual,
        expected
    );
}

/// Asserts the stage history is a connected chain ending at the current stage
///
/// The first change must leave `ReadyForInitialVetting`, each change must
/// start where the previous one ended and every step must be an allowed
/// transition.
pub fn assert_history_consistent(claim: &Claim) {
    let mut stage = VettingStage::ReadyForInitialVetting;
    for (index, change) in claim.history.iter().enumerate() {
        assert_eq!(
            change.from, stage,
            "Claim {} history entry {} starts at {} but previous stage was {}",
            claim.claim_number, index, change.from, stage
        );
        assert!(
            change.from.can_transition_to(change.to),
            "Claim {} history entry {} records illegal move {} -> {}",
            claim.claim_number,
            index,
            change.from,
            change.to
        );
        stage = change.to;
    }
    assert_eq!(
        stage, claim.stage,
        "Claim {} is at {} but history ends at {}",
        claim.claim_number, claim.stage, stage
    );
}

/// Asserts approved line amounts add up to the claim's approved amount
pub fn assert_approval_balanced(claim: &Claim) {
    let approved = claim
        .approved_amount
        .unwrap_or_else(|| panic!("Claim {} has no approved amount", claim.claim_number));
    let lines: Decimal = claim
        .treatments
        .iter()
        .map(|t| {
            t.approved_amount
                .unwrap_or_else(|| panic!("Claim {} line {} not approved", claim.claim_number, t.id))
                .amount()
        })
        .sum();
    assert_eq!(
        lines,
        approved.amount(),
        "Claim {} lines approve {} but claim approves {}",
        claim.claim_number,
        lines,
        approved
    );
}

/// Asserts provider subtotals add up to the batch total
pub fn assert_batch_balanced(batch: &PaymentBatch) {
    let summaries = batch
        .provider_summaries()
        .unwrap_or_else(|e| panic!("Batch {} summaries failed: {}", batch.batch_number, e));
    let batch_total = batch
        .total()
        .unwrap_or_else(|e| panic!("Batch {} total failed: {}", batch.batch_number, e));
    let claims: usize = summaries.iter().map(|s| s.claim_count).sum();
    let total: Decimal = summaries.iter().map(|s| s.total.amount()).sum();
    assert_eq!(
        claims,
        batch.items.len(),
        "Batch {} summaries count {} claims, batch holds {}",
        batch.batch_number,
        claims,
        batch.items.len()
    );
    assert_eq!(
        total,
        batch_total.amount(),
        "Batch {} summaries total {} but batch totals {}",
        batch.batch_number,
        total,
        batch_total
    );
}
