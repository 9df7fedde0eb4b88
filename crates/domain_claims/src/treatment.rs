//! Treatment line items

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::{Money, TreatmentLineId};
use domain_enrollment::ServiceType;
use crate::error::ClaimError;

/// A treatment line as submitted by a provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTreatment {
    pub service_type: ServiceType,
    pub description: String,
    pub quantity: u32,
    pub unit_price: Money,
}

/// One billed item on a claim
///
/// `total` is always `unit_price * quantity`; it has no setter and is
/// recomputed by every method that changes either factor, including
/// deserialization. A change whose total would overflow is refused and leaves
/// the line as it was.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "StoredTreatmentLine")]
pub struct TreatmentLine {
    pub id: TreatmentLineId,
    pub service_type: ServiceType,
    pub description: String,
    quantity: u32,
    unit_price: Money,
    total: Money,
    /// Set when the claim is approved
    pub approved_amount: Option<Money>,
    /// Line total is above the plan's benefit limit, or the plan has no limit for the service
    pub exceeds_benefit_limit: bool,
}

impl TreatmentLine {
    pub fn new(data: NewTreatment) -> Result<Self, ClaimError> {
        validate_quantity(data.quantity)?;
        validate_price(&data.unit_price)?;
        let description = data.description.trim().to_string();
        if description.is_empty() {
            return Err(ClaimError::invalid_treatment("description is required"));
        }
        Ok(Self {
            id: TreatmentLineId::new_v7(),
            service_type: data.service_type,
            description,
            quantity: data.quantity,
            unit_price: data.unit_price,
            total: data.unit_price.times(data.quantity)?,
            approved_amount: None,
            exceeds_benefit_limit: false,
        })
    }

    /// Rebuilds a stored line, recomputing the total
    pub fn restore(
        id: TreatmentLineId,
        data: NewTreatment,
        approved_amount: Option<Money>,
        exceeds_benefit_limit: bool,
    ) -> Result<Self, ClaimError> {
        Ok(Self {
            id,
            service_type: data.service_type,
            description: data.description,
            quantity: data.quantity,
            unit_price: data.unit_price,
            total: data.unit_price.times(data.quantity)?,
            approved_amount,
            exceeds_benefit_limit,
        })
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn unit_price(&self) -> Money {
        self.unit_price
    }

    pub fn total(&self) -> Money {
        self.total
    }

    pub fn set_quantity(&mut self, quantity: u32) -> Result<(), ClaimError> {
        validate_quantity(quantity)?;
        self.total = self.unit_price.times(quantity)?;
        self.quantity = quantity;
        Ok(())
    }

    pub fn set_unit_price(&mut self, unit_price: Decimal) -> Result<(), ClaimError> {
        let price = Money::new(unit_price, self.unit_price.currency());
        validate_price(&price)?;
        self.total = price.times(self.quantity)?;
        self.unit_price = price;
        Ok(())
    }
}

#[derive(Deserialize)]
struct StoredTreatmentLine {
    id: TreatmentLineId,
    service_type: ServiceType,
    description: String,
    quantity: u32,
    unit_price: Money,
    #[serde(default)]
    approved_amount: Option<Money>,
    #[serde(default)]
    exceeds_benefit_limit: bool,
}

impl TryFrom<StoredTreatmentLine> for TreatmentLine {
    type Error = ClaimError;

    fn try_from(stored: StoredTreatmentLine) -> Result<Self, Self::Error> {
        TreatmentLine::restore(
            stored.id,
            NewTreatment {
                service_type: stored.service_type,
                description: stored.description,
                quantity: stored.quantity,
                unit_price: stored.unit_price,
            },
            stored.approved_amount,
            stored.exceeds_benefit_limit,
        )
    }
}

fn validate_quantity(quantity: u32) -> Result<(), ClaimError> {
    if quantity == 0 {
        return Err(ClaimError::invalid_treatment("quantity must be at least 1"));
    }
    Ok(())
}

fn validate_price(price: &Money) -> Result<(), ClaimError> {
    if price.is_negative() {
        return Err(ClaimError::invalid_treatment(format!(
            "unit price {} is negative",
            price
        )));
    }
    Ok(())
}
