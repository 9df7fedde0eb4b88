//! Enrollee repository
//!
//! Bulk registration runs in a single transaction so a spreadsheet upload
//! either lands completely or not at all.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use core_kernel::EnrolleeId;
use domain_enrollment::{Enrollee, EnrolleeQuery, Gender};

use super::{page_bound, parse_column};
use crate::error::DatabaseError;

const SELECT_ENROLLEES: &str = r#"
    SELECT enrollee_id, enrollee_number, first_name, last_name, date_of_birth,
           gender, nhia_number, phone, email, address, employer, plan, status,
           enrolled_on, created_at, updated_at
    FROM enrollees
"#;

#[derive(Debug, Clone)]
pub struct EnrolleeRepository {
    pool: PgPool,
}

impl EnrolleeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<EnrolleeRow, DatabaseError> {
        sqlx::query_as::<_, EnrolleeRow>(&format!("{SELECT_ENROLLEES} WHERE enrollee_id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::not_found("Enrollee", EnrolleeId::from(id)))
    }

    /// Filtered search ordered by membership number
    pub async fn find(&self, query: &EnrolleeQuery) -> Result<Vec<EnrolleeRow>, DatabaseError> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(SELECT_ENROLLEES);
        builder.push(" WHERE TRUE");

        if let Some(status) = query.status {
            builder.push(" AND status = ").push_bind(status.as_str());
        }
        if let Some(plan) = query.plan {
            builder.push(" AND plan = ").push_bind(plan.as_str());
        }
        if let Some(ref employer) = query.employer {
            builder.push(" AND LOWER(employer) = LOWER(").push_bind(employer.clone()).push(")");
        }
        if let Some(ref text) = query.search {
            let pattern = format!("%{}%", text.trim());
            builder
                .push(" AND (first_name || ' ' || last_name ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR enrollee_number ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR nhia_number ILIKE ")
                .push_bind(pattern)
                .push(")");
        }

        builder
            .push(" ORDER BY enrollee_number LIMIT ")
            .push_bind(page_bound(query.limit, i64::MAX))
            .push(" OFFSET ")
            .push_bind(page_bound(query.offset, 0));

        let rows = builder
            .build_query_as::<EnrolleeRow>()
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Inserts all enrollees or none of them
    pub async fn insert_all(&self, enrollees: &[Enrollee]) -> Result<(), DatabaseError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DatabaseError::TransactionFailed(e.to_string()))?;

        for enrollee in enrollees {
            sqlx::query(
                r#"
                INSERT INTO enrollees (
                    enrollee_id, enrollee_number, first_name, last_name, date_of_birth,
                    gender, nhia_number, phone, email, address, employer, plan, status,
                    enrolled_on, created_at, updated_at
                ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
                "#,
            )
            .bind(Uuid::from(enrollee.id))
            .bind(&enrollee.enrollee_number)
            .bind(&enrollee.first_name)
            .bind(&enrollee.last_name)
            .bind(enrollee.date_of_birth)
            .bind(enrollee.gender.as_str())
            .bind(&enrollee.nhia_number)
            .bind(&enrollee.phone)
            .bind(&enrollee.email)
            .bind(&enrollee.address)
            .bind(&enrollee.employer)
            .bind(enrollee.plan.as_str())
            .bind(enrollee.status.as_str())
            .bind(enrollee.enrolled_on)
            .bind(enrollee.created_at)
            .bind(enrollee.updated_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit()
            .await
            .map_err(|e| DatabaseError::TransactionFailed(e.to_string()))?;
        Ok(())
    }

    pub async fn update(&self, enrollee: &Enrollee) -> Result<(), DatabaseError> {
        let result = sqlx::query(
            r#"
            UPDATE enrollees SET
                first_name = $2, last_name = $3, date_of_birth = $4, gender = $5,
                nhia_number = $6, phone = $7, email = $8, address = $9, employer = $10,
                plan = $11, status = $12, enrolled_on = $13, updated_at = $14
            WHERE enrollee_id = $1
            "#,
        )
        .bind(Uuid::from(enrollee.id))
        .bind(&enrollee.first_name)
        .bind(&enrollee.last_name)
        .bind(enrollee.date_of_birth)
        .bind(enrollee.gender.as_str())
        .bind(&enrollee.nhia_number)
        .bind(&enrollee.phone)
        .bind(&enrollee.email)
        .bind(&enrollee.address)
        .bind(&enrollee.employer)
        .bind(enrollee.plan.as_str())
        .bind(enrollee.status.as_str())
        .bind(enrollee.enrolled_on)
        .bind(enrollee.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found("Enrollee", enrollee.id));
        }
        Ok(())
    }

    pub async fn nhia_number_exists(&self, nhia_number: &str) -> Result<bool, DatabaseError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM enrollees WHERE LOWER(nhia_number) = LOWER($1))",
        )
        .bind(nhia_number.trim())
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct EnrolleeRow {
    pub enrollee_id: Uuid,
    pub enrollee_number: String,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: NaiveDate,
    pub gender: String,
    pub nhia_number: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub employer: Option<String>,
    pub plan: String,
    pub status: String,
    pub enrolled_on: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<EnrolleeRow> for Enrollee {
    type Error = DatabaseError;

    fn try_from(row: EnrolleeRow) -> Result<Self, Self::Error> {
        Ok(Enrollee {
            id: EnrolleeId::from(row.enrollee_id),
            enrollee_number: row.enrollee_number,
            first_name: row.first_name,
            last_name: row.last_name,
            date_of_birth: row.date_of_birth,
            gender: Gender::parse_lenient(&row.gender),
            nhia_number: row.nhia_number,
            phone: row.phone,
            email: row.email,
            address: row.address,
            employer: row.employer,
            plan: parse_column("plan", &row.plan)?,
            status: parse_column("status", &row.status)?,
            enrolled_on: row.enrolled_on,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
