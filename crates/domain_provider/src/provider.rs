//! Provider aggregate and contract lifecycle

use chrono::{DateTime, NaiveDate, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use validator::Validate;

use core_kernel::{DateRange, ProviderId};
use crate::error::ProviderError;

/// Referral level of a facility
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderTier {
    /// First point of contact: clinics, GP practices
    Primary,
    /// General hospitals taking referrals from primary care
    Secondary,
    /// Teaching and specialist hospitals
    Tertiary,
}

impl ProviderTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderTier::Primary => "primary",
            ProviderTier::Secondary => "secondary",
            ProviderTier::Tertiary => "tertiary",
        }
    }

    /// Letter used in provider codes
    pub fn code_letter(&self) -> char {
        match self {
            ProviderTier::Primary => 'P',
            ProviderTier::Secondary => 'S',
            ProviderTier::Tertiary => 'T',
        }
    }
}

impl fmt::Display for ProviderTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderTier {
    type Err = ProviderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "primary" => Ok(ProviderTier::Primary),
            "secondary" => Ok(ProviderTier::Secondary),
            "tertiary" => Ok(ProviderTier::Tertiary),
            other => Err(ProviderError::invalid(format!("unknown tier '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderCategory {
    Hospital,
    Clinic,
    Pharmacy,
    Laboratory,
    Diagnostic,
    Dental,
    Optical,
    Specialist,
}

impl ProviderCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderCategory::Hospital => "hospital",
            ProviderCategory::Clinic => "clinic",
            ProviderCategory::Pharmacy => "pharmacy",
            ProviderCategory::Laboratory => "laboratory",
            ProviderCategory::Diagnostic => "diagnostic",
            ProviderCategory::Dental => "dental",
            ProviderCategory::Optical => "optical",
            ProviderCategory::Specialist => "specialist",
        }
    }
}

impl fmt::Display for ProviderCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderCategory {
    type Err = ProviderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hospital" => Ok(ProviderCategory::Hospital),
            "clinic" => Ok(ProviderCategory::Clinic),
            "pharmacy" => Ok(ProviderCategory::Pharmacy),
            "laboratory" | "lab" => Ok(ProviderCategory::Laboratory),
            "diagnostic" => Ok(ProviderCategory::Diagnostic),
            "dental" => Ok(ProviderCategory::Dental),
            "optical" => Ok(ProviderCategory::Optical),
            "specialist" => Ok(ProviderCategory::Specialist),
            other => Err(ProviderError::invalid(format!("unknown category '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderStatus {
    Active,
    Suspended,
    Terminated,
}

impl ProviderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderStatus::Active => "active",
            ProviderStatus::Suspended => "suspended",
            ProviderStatus::Terminated => "terminated",
        }
    }
}

impl fmt::Display for ProviderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderStatus {
    type Err = ProviderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(ProviderStatus::Active),
            "suspended" => Ok(ProviderStatus::Suspended),
            "terminated" => Ok(ProviderStatus::Terminated),
            other => Err(ProviderError::invalid(format!("unknown status '{}'", other))),
        }
    }
}

/// Settlement account used when a payment batch is paid out
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankDetails {
    pub account_name: String,
    /// 10-digit NUBAN account number
    pub account_number: String,
    pub bank_name: String,
}

impl BankDetails {
    fn problems(&self) -> Vec<String> {
        let mut problems = Vec::new();
        if self.account_name.trim().is_empty() {
            problems.push("bank_details.account_name: is required".to_string());
        }
        if self.account_number.len() != 10 || !self.account_number.chars().all(|c| c.is_ascii_digit()) {
            problems.push("bank_details.account_number: must be 10 digits".to_string());
        }
        if self.bank_name.trim().is_empty() {
            problems.push("bank_details.bank_name: is required".to_string());
        }
        problems
    }
}

/// Data required to onboard a provider
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewProvider {
    #[validate(length(min = 1, max = 200, message = "name is required"))]
    pub name: String,
    pub tier: ProviderTier,
    pub category: ProviderCategory,
    pub contract_start: NaiveDate,
    pub contract_end: NaiveDate,
    #[validate(email(message = "email address is malformed"))]
    pub contact_email: Option<String>,
    #[validate(length(min = 7, max = 20, message = "phone number must be 7-20 characters"))]
    pub contact_phone: Option<String>,
    pub address: Option<String>,
    pub bank_details: Option<BankDetails>,
}

impl NewProvider {
    /// Runs field rules plus the contract and bank account checks
    pub fn check(&self) -> Result<DateRange, ProviderError> {
        let mut errors = Vec::new();

        if let Err(field_errors) = self.validate() {
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
        if self.name.trim().is_empty() && !errors.iter().any(|e| e.starts_with("name:")) {
            errors.push("name: name is required".to_string());
        }
        if let Some(ref bank) = self.bank_details {
            errors.extend(bank.problems());
        }

        let contract = DateRange::new(self.contract_start, self.contract_end);
        if let Err(ref err) = contract {
            errors.push(format!("contract: {}", err));
        }

        if !errors.is_empty() {
            errors.sort();
            return Err(ProviderError::validation_failed(errors));
        }
        Ok(contract?)
    }
}

/// A facility in the provider network
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provider {
    pub id: ProviderId,
    /// `PRV-<tier letter>-<4 digits>`
    pub provider_code: String,
    pub name: String,
    pub tier: ProviderTier,
    pub category: ProviderCategory,
    pub contract: DateRange,
    pub status: ProviderStatus,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub address: Option<String>,
    pub bank_details: Option<BankDetails>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Provider {
    /// Onboards a provider after validating the request
    pub fn new(data: NewProvider) -> Result<Self, ProviderError> {
        let contract = data.check()?;
        let now = Utc::now();
        Ok(Self {
            id: ProviderId::new_v7(),
            provider_code: generate_provider_code(data.tier),
            name: data.name.trim().to_string(),
            tier: data.tier,
            category: data.category,
            contract,
            status: ProviderStatus::Active,
            contact_email: data.contact_email.map(|e| e.trim().to_ascii_lowercase()),
            contact_phone: data.contact_phone,
            address: data.address,
            bank_details: data.bank_details,
            created_at: now,
            updated_at: now,
        })
    }

    /// True when the provider may be paid for an encounter on `date`
    pub fn is_contracted_on(&self, date: NaiveDate) -> bool {
        self.status == ProviderStatus::Active && self.contract.contains(date)
    }

    /// Days left on the contract; negative once it has lapsed
    pub fn days_to_contract_expiry(&self, today: NaiveDate) -> i64 {
        (self.contract.end - today).num_days()
    }

    /// Extends the contract to `new_end`
    pub fn renew_contract(&mut self, new_end: NaiveDate) -> Result<(), ProviderError> {
        if self.status == ProviderStatus::Terminated {
            return Err(ProviderError::Terminated);
        }
        if new_end <= self.contract.end {
            return Err(ProviderError::ContractNotExtended {
                current: self.contract.end,
                requested: new_end,
            });
        }
        self.contract = DateRange::new(self.contract.start, new_end)?;
        self.updated_at = Utc::now();
        tracing::info!(provider = %self.provider_code, until = %new_end, "Provider contract renewed");
        Ok(())
    }

    pub fn suspend(&mut self) -> Result<(), ProviderError> {
        self.transition(ProviderStatus::Suspended)
    }

    pub fn reinstate(&mut self) -> Result<(), ProviderError> {
        self.transition(ProviderStatus::Active)
    }

    pub fn terminate(&mut self) -> Result<(), ProviderError> {
        self.transition(ProviderStatus::Terminated)
    }

    pub fn set_status(&mut self, status: ProviderStatus) -> Result<(), ProviderError> {
        self.transition(status)
    }

    fn transition(&mut self, target: ProviderStatus) -> Result<(), ProviderError> {
        use ProviderStatus::*;
        let allowed = matches!(
            (self.status, target),
            (Active, Suspended) | (Suspended, Active) | (Active, Terminated) | (Suspended, Terminated)
        );
        if !allowed {
            return Err(ProviderError::InvalidStatusTransition {
                from: self.status.to_string(),
                to: target.to_string(),
            });
        }
        self.status = target;
        self.updated_at = Utc::now();
        Ok(())
    }
}

fn generate_provider_code(tier: ProviderTier) -> String {
    let serial: u32 = rand::thread_rng().gen_range(0..10_000);
    format!("PRV-{}-{:04}", tier.code_letter(), serial)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn request() -> NewProvider {
        NewProvider {
            name: "Reddington Hospital".to_string(),
            tier: ProviderTier::Secondary,
            category: ProviderCategory::Hospital,
            contract_start: date(2024, 1, 1),
            contract_end: date(2024, 12, 31),
            contact_email: Some("Claims@Reddington.ng".to_string()),
            contact_phone: Some("012345678".to_string()),
            address: Some("12 Idowu Martins St, Victoria Island".to_string()),
            bank_details: Some(BankDetails {
                account_name: "Reddington Hospital Ltd".to_string(),
                account_number: "0123456789".to_string(),
                bank_name: "GTBank".to_string(),
            }),
        }
    }

    #[test]
    fn test_provider_code_format() {
        let provider = Provider::new(request()).unwrap();
        let code = &provider.provider_code;
        assert!(code.starts_with("PRV-S-"));
        assert_eq!(code.len(), 10);
        assert!(code[6..].chars().all(|c| c.is_ascii_digit()));
        assert_eq!(provider.contact_email.as_deref(), Some("claims@reddington.ng"));
    }

    #[test]
    fn test_inverted_contract_rejected() {
        let mut bad = request();
        bad.contract_end = date(2023, 12, 31);
        let err = Provider::new(bad).unwrap_err();
        assert!(err.to_string().contains("contract"));
    }

    #[test]
    fn test_bad_account_number_rejected() {
        let mut bad = request();
        if let Some(ref mut bank) = bad.bank_details {
            bank.account_number = "12345".to_string();
        }
        assert!(matches!(Provider::new(bad), Err(ProviderError::ValidationFailed(_))));
    }

    #[test]
    fn test_contract_bounds_are_inclusive() {
        let provider = Provider::new(request()).unwrap();
        assert!(provider.is_contracted_on(date(2024, 1, 1)));
        assert!(provider.is_contracted_on(date(2024, 12, 31)));
        assert!(!provider.is_contracted_on(date(2025, 1, 1)));
    }

    #[test]
    fn test_suspended_provider_not_contracted() {
        let mut provider = Provider::new(request()).unwrap();
        provider.suspend().unwrap();
        assert!(!provider.is_contracted_on(date(2024, 6, 1)));
        provider.reinstate().unwrap();
        assert!(provider.is_contracted_on(date(2024, 6, 1)));
    }

    #[test]
    fn test_renewal_must_extend() {
        let mut provider = Provider::new(request()).unwrap();
        assert!(matches!(
            provider.renew_contract(date(2024, 12, 31)),
            Err(ProviderError::ContractNotExtended { .. })
        ));
        provider.renew_contract(date(2025, 12, 31)).unwrap();
        assert_eq!(provider.contract.end, date(2025, 12, 31));
        assert_eq!(provider.days_to_contract_expiry(date(2025, 12, 1)), 30);
    }

    #[test]
    fn test_terminated_cannot_renew() {
        let mut provider = Provider::new(request()).unwrap();
        provider.terminate().unwrap();
        assert!(matches!(provider.renew_contract(date(2026, 1, 1)), Err(ProviderError::Terminated)));
        assert!(provider.reinstate().is_err());
    }
}
