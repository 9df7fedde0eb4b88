//! Provider DTOs

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use domain_provider::{
    BankDetails, Provider, ProviderCategory, ProviderQuery, ProviderStatus, ProviderTier,
};

use super::page_limit;

#[derive(Debug, Default, Deserialize)]
pub struct ProviderListParams {
    pub tier: Option<ProviderTier>,
    pub category: Option<ProviderCategory>,
    pub status: Option<ProviderStatus>,
    /// Only providers with a contract covering this date
    pub contracted_on: Option<NaiveDate>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl From<ProviderListParams> for ProviderQuery {
    fn from(params: ProviderListParams) -> Self {
        ProviderQuery {
            tier: params.tier,
            category: params.category,
            status: params.status,
            contracted_on: params.contracted_on,
            limit: Some(page_limit(params.limit)),
            offset: params.offset,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RenewContractRequest {
    pub contract_end: NaiveDate,
}

#[derive(Debug, Deserialize)]
pub struct SetProviderStatusRequest {
    pub status: ProviderStatus,
}

#[derive(Debug, Serialize)]
pub struct ProviderResponse {
    pub id: Uuid,
    pub provider_code: String,
    pub name: String,
    pub tier: ProviderTier,
    pub category: ProviderCategory,
    pub status: ProviderStatus,
    pub contract_start: NaiveDate,
    pub contract_end: NaiveDate,
    /// Negative once the contract has lapsed
    pub days_to_contract_expiry: i64,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub address: Option<String>,
    pub bank_details: Option<BankDetails>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Provider> for ProviderResponse {
    fn from(provider: Provider) -> Self {
        Self {
            id: provider.id.into(),
            days_to_contract_expiry: provider.days_to_contract_expiry(Utc::now().date_naive()),
            provider_code: provider.provider_code,
            name: provider.name,
            tier: provider.tier,
            category: provider.category,
            status: provider.status,
            contract_start: provider.contract.start,
            contract_end: provider.contract.end,
            contact_email: provider.contact_email,
            contact_phone: provider.contact_phone,
            address: provider.address,
            bank_details: provider.bank_details,
            created_at: provider.created_at,
            updated_at: provider.updated_at,
        }
    }
}
