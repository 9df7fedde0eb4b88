//! Plan tiers and the services they cover

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::EnrollmentError;

/// Health plan tier
///
/// Tiers are ordered: every service covered by a lower tier is also covered
/// by the tiers above it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanTier {
    #[default]
    Bronze,
    Silver,
    Gold,
    Platinum,
}

impl PlanTier {
    pub const ALL: [PlanTier; 4] = [
        PlanTier::Bronze,
        PlanTier::Silver,
        PlanTier::Gold,
        PlanTier::Platinum,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PlanTier::Bronze => "bronze",
            PlanTier::Silver => "silver",
            PlanTier::Gold => "gold",
            PlanTier::Platinum => "platinum",
        }
    }

    /// The lowest tier that covers `service`
    fn minimum_tier_for(service: ServiceType) -> PlanTier {
        match service {
            ServiceType::Consultation
            | ServiceType::Laboratory
            | ServiceType::Pharmacy
            | ServiceType::Radiology
            | ServiceType::Maternity
            | ServiceType::Admission => PlanTier::Bronze,
            ServiceType::Surgery | ServiceType::Physiotherapy => PlanTier::Silver,
            ServiceType::Dental => PlanTier::Gold,
            ServiceType::Optical => PlanTier::Platinum,
        }
    }

    pub fn covers(&self, service: ServiceType) -> bool {
        *self >= Self::minimum_tier_for(service)
    }
}

impl fmt::Display for PlanTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlanTier {
    type Err = EnrollmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bronze" => Ok(PlanTier::Bronze),
            "silver" => Ok(PlanTier::Silver),
            "gold" => Ok(PlanTier::Gold),
            "platinum" => Ok(PlanTier::Platinum),
            other => Err(EnrollmentError::invalid(format!("unknown plan '{}'", other))),
        }
    }
}

/// Category of medical service rendered at a provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceType {
    Consultation,
    Laboratory,
    Radiology,
    Pharmacy,
    Surgery,
    Maternity,
    Dental,
    Optical,
    Physiotherapy,
    Admission,
}

impl ServiceType {
    pub const ALL: [ServiceType; 10] = [
        ServiceType::Consultation,
        ServiceType::Laboratory,
        ServiceType::Radiology,
        ServiceType::Pharmacy,
        ServiceType::Surgery,
        ServiceType::Maternity,
        ServiceType::Dental,
        ServiceType::Optical,
        ServiceType::Physiotherapy,
        ServiceType::Admission,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceType::Consultation => "consultation",
            ServiceType::Laboratory => "laboratory",
            ServiceType::Radiology => "radiology",
            ServiceType::Pharmacy => "pharmacy",
            ServiceType::Surgery => "surgery",
            ServiceType::Maternity => "maternity",
            ServiceType::Dental => "dental",
            ServiceType::Optical => "optical",
            ServiceType::Physiotherapy => "physiotherapy",
            ServiceType::Admission => "admission",
        }
    }

    /// Days a member must have been enrolled before the service is payable
    pub fn waiting_period_days(&self) -> i64 {
        match self {
            ServiceType::Surgery => 90,
            ServiceType::Maternity => 270,
            _ => 0,
        }
    }
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServiceType {
    type Err = EnrollmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        ServiceType::ALL
            .iter()
            .copied()
            .find(|service| service.as_str() == wanted)
            .ok_or_else(|| EnrollmentError::invalid(format!("unknown service '{}'", wanted)))
    }
}
