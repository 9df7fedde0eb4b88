//! Enrollment orchestration over [`EnrolleePort`]

use std::collections::HashSet;
use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{info, instrument};

use core_kernel::{EnrolleeId, OperationMetadata};

use crate::bulk_upload::{parse_enrollee_csv, RowError, UploadReport};
use crate::eligibility::{check_eligibility, EligibilityResult};
use crate::enrollee::{Enrollee, EnrolleeStatus, NewEnrollee};
use crate::error::EnrollmentError;
use crate::plan::{PlanTier, ServiceType};
use crate::ports::EnrolleePort;
use crate::validation::validate_new_enrollee;

#[derive(Clone)]
pub struct EnrollmentService {
    enrollees: Arc<dyn EnrolleePort>,
}

impl EnrollmentService {
    pub fn new(enrollees: Arc<dyn EnrolleePort>) -> Self {
        Self { enrollees }
    }

    /// Registers one member after validation and an NHIA duplicate check
    #[instrument(skip(self, data))]
    pub async fn register(
        &self,
        data: NewEnrollee,
        today: NaiveDate,
        actor: &str,
    ) -> Result<Enrollee, EnrollmentError> {
        validate_new_enrollee(&data, today)?;
        if let Some(ref nhia) = data.nhia_number {
            if self.enrollees.nhia_number_exists(nhia).await? {
                return Err(EnrollmentError::DuplicateEnrollee(format!(
                    "NHIA number {} already registered",
                    nhia
                )));
            }
        }

        let enrollee = Enrollee::new(data);
        self.enrollees
            .create_enrollee(&enrollee, Some(OperationMetadata::for_user(actor)))
            .await?;
        info!(enrollee_number = %enrollee.enrollee_number, plan = %enrollee.plan, "Enrollee registered");
        Ok(enrollee)
    }

    /// Registers every acceptable row of a CSV upload in one write
    ///
    /// Rows are validated while parsing. Rows repeating an NHIA number that is
    /// already on file or earlier in the same sheet are reported and skipped.
    #[instrument(skip(self, csv_text), fields(bytes = csv_text.len()))]
    pub async fn bulk_register(
        &self,
        csv_text: &str,
        today: NaiveDate,
        actor: &str,
    ) -> Result<UploadReport, EnrollmentError> {
        let parsed = parse_enrollee_csv(csv_text, today)?;
        let total_rows = parsed.rows.len() + parsed.errors.len();
        let mut rejected = parsed.errors;
        let mut accepted = Vec::with_capacity(parsed.rows.len());
        let mut seen_nhia = HashSet::new();

        for row in parsed.rows {
            if let Some(ref nhia) = row.enrollee.nhia_number {
                let key = nhia.to_ascii_lowercase();
                if seen_nhia.contains(&key) || self.enrollees.nhia_number_exists(nhia).await? {
                    rejected.push(RowError {
                        line: row.line,
                        message: format!("NHIA number {} already registered", nhia),
                    });
                    continue;
                }
                seen_nhia.insert(key);
            }
            accepted.push(Enrollee::new(row.enrollee));
        }

        if !accepted.is_empty() {
            self.enrollees
                .create_enrollees(&accepted, Some(OperationMetadata::for_user(actor)))
                .await?;
        }
        rejected.sort_by_key(|e| e.line);

        let report = UploadReport {
            upload_id: parsed.upload_id,
            total_rows,
            accepted: accepted.iter().map(|e| e.id).collect(),
            rejected,
        };
        info!(
            upload_id = %report.upload_id,
            accepted = report.accepted_count(),
            rejected = report.rejected_count(),
            "Enrollee upload processed"
        );
        Ok(report)
    }

    pub async fn change_plan(
        &self,
        id: EnrolleeId,
        plan: PlanTier,
        actor: &str,
    ) -> Result<Enrollee, EnrollmentError> {
        let metadata = Some(OperationMetadata::for_user(actor));
        let mut enrollee = self.enrollees.get_enrollee(id, metadata.clone()).await?;
        enrollee.change_plan(plan)?;
        self.enrollees.update_enrollee(&enrollee, metadata).await?;
        Ok(enrollee)
    }

    pub async fn set_status(
        &self,
        id: EnrolleeId,
        status: EnrolleeStatus,
        actor: &str,
    ) -> Result<Enrollee, EnrollmentError> {
        let metadata = Some(OperationMetadata::for_user(actor));
        let mut enrollee = self.enrollees.get_enrollee(id, metadata.clone()).await?;
        enrollee.set_status(status)?;
        self.enrollees.update_enrollee(&enrollee, metadata).await?;
        info!(enrollee_number = %enrollee.enrollee_number, status = %status, actor, "Membership status changed");
        Ok(enrollee)
    }

    pub async fn check_eligibility(
        &self,
        id: EnrolleeId,
        service: ServiceType,
        on: NaiveDate,
    ) -> Result<EligibilityResult, EnrollmentError> {
        let enrollee = self.enrollees.get_enrollee(id, None).await?;
        Ok(check_eligibility(&enrollee, service, on))
    }
}
