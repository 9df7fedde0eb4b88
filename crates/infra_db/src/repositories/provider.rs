//! Provider repository

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use core_kernel::{DateRange, ProviderId};
use domain_provider::{BankDetails, Provider, ProviderQuery};

use super::{page_bound, parse_column};
use crate::error::DatabaseError;

const SELECT_PROVIDERS: &str = r#"
    SELECT provider_id, provider_code, name, tier, category, contract_start, contract_end,
           status, contact_email, contact_phone, address, bank_account_name,
           bank_account_number, bank_name, created_at, updated_at
    FROM providers
"#;

#[derive(Debug, Clone)]
pub struct ProviderRepository {
    pool: PgPool,
}

impl ProviderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<ProviderRow, DatabaseError> {
        sqlx::query_as::<_, ProviderRow>(&format!("{SELECT_PROVIDERS} WHERE provider_id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::not_found("Provider", ProviderId::from(id)))
    }

    pub async fn find(&self, query: &ProviderQuery) -> Result<Vec<ProviderRow>, DatabaseError> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(SELECT_PROVIDERS);
        builder.push(" WHERE TRUE");

        if let Some(tier) = query.tier {
            builder.push(" AND tier = ").push_bind(tier.as_str());
        }
        if let Some(category) = query.category {
            builder.push(" AND category = ").push_bind(category.as_str());
        }
        if let Some(status) = query.status {
            builder.push(" AND status = ").push_bind(status.as_str());
        }
        if let Some(date) = query.contracted_on {
            builder
                .push(" AND contract_start <= ")
                .push_bind(date)
                .push(" AND contract_end >= ")
                .push_bind(date);
        }

        builder
            .push(" ORDER BY name LIMIT ")
            .push_bind(page_bound(query.limit, i64::MAX))
            .push(" OFFSET ")
            .push_bind(page_bound(query.offset, 0));

        Ok(builder.build_query_as::<ProviderRow>().fetch_all(&self.pool).await?)
    }

    pub async fn insert(&self, provider: &Provider) -> Result<(), DatabaseError> {
        let bank = provider.bank_details.as_ref();
        sqlx::query(
            r#"
            INSERT INTO providers (
                provider_id, provider_code, name, tier, category, contract_start, contract_end,
                status, contact_email, contact_phone, address, bank_account_name,
                bank_account_number, bank_name, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            "#,
        )
        .bind(Uuid::from(provider.id))
        .bind(&provider.provider_code)
        .bind(&provider.name)
        .bind(provider.tier.as_str())
        .bind(provider.category.as_str())
        .bind(provider.contract.start)
        .bind(provider.contract.end)
        .bind(provider.status.as_str())
        .bind(&provider.contact_email)
        .bind(&provider.contact_phone)
        .bind(&provider.address)
        .bind(bank.map(|b| b.account_name.clone()))
        .bind(bank.map(|b| b.account_number.clone()))
        .bind(bank.map(|b| b.bank_name.clone()))
        .bind(provider.created_at)
        .bind(provider.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn update(&self, provider: &Provider) -> Result<(), DatabaseError> {
        let bank = provider.bank_details.as_ref();
        let result = sqlx::query(
            r#"
            UPDATE providers SET
                name = $2, tier = $3, category = $4, contract_start = $5, contract_end = $6,
                status = $7, contact_email = $8, contact_phone = $9, address = $10,
                bank_account_name = $11, bank_account_number = $12, bank_name = $13,
                updated_at = $14
            WHERE provider_id = $1
            "#,
        )
        .bind(Uuid::from(provider.id))
        .bind(&provider.name)
        .bind(provider.tier.as_str())
        .bind(provider.category.as_str())
        .bind(provider.contract.start)
        .bind(provider.contract.end)
        .bind(provider.status.as_str())
        .bind(&provider.contact_email)
        .bind(&provider.contact_phone)
        .bind(&provider.address)
        .bind(bank.map(|b| b.account_name.clone()))
        .bind(bank.map(|b| b.account_number.clone()))
        .bind(bank.map(|b| b.bank_name.clone()))
        .bind(provider.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found("Provider", provider.id));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct ProviderRow {
    pub provider_id: Uuid,
    pub provider_code: String,
    pub name: String,
    pub tier: String,
    pub category: String,
    pub contract_start: NaiveDate,
    pub contract_end: NaiveDate,
    pub status: String,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub address: Option<String>,
    pub bank_account_name: Option<String>,
    pub bank_account_number: Option<String>,
    pub bank_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<ProviderRow> for Provider {
    type Error = DatabaseError;

    fn try_from(row: ProviderRow) -> Result<Self, Self::Error> {
        let contract = DateRange::new(row.contract_start, row.contract_end)
            .map_err(|e| DatabaseError::decode("contract_end", e))?;
        // Bank details are stored flat; all three columns are set together
        let bank_details = match (row.bank_account_name, row.bank_account_number, row.bank_name) {
            (Some(account_name), Some(account_number), Some(bank_name)) => Some(BankDetails {
                account_name,
                account_number,
                bank_name,
            }),
            _ => None,
        };

        Ok(Provider {
            id: ProviderId::from(row.provider_id),
            provider_code: row.provider_code,
            name: row.name,
            tier: parse_column("tier", &row.tier)?,
            category: parse_column("category", &row.category)?,
            contract,
            status: parse_column("status", &row.status)?,
            contact_email: row.contact_email,
            contact_phone: row.contact_phone,
            address: row.address,
            bank_details,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
