use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use super::domain::{
    Applicant, ApplicantId, ApplicantInput, Application, ApplicationFilter, ApplicationId,
    ApplicationInput, Benefit, BenefitId, HouseholdMember, HouseholdMemberId, Scheme, SchemeId,
    SchemeInput,
};
use super::eligibility;
use super::repository::{AssistanceRepository, RepositoryError};
use super::validation::{ValidationError, Validator};

/// Service composing input validation, the repository, and the eligibility scan.
pub struct AssistanceService<R> {
    repository: Arc<R>,
    validator: Validator,
}

impl<R> AssistanceService<R>
where
    R: AssistanceRepository + 'static,
{
    pub fn new(repository: Arc<R>) -> Self {
        Self::with_validator(repository, Validator::new())
    }

    pub fn with_validator(repository: Arc<R>, validator: Validator) -> Self {
        Self {
            repository,
            validator,
        }
    }

    /// Register an applicant together with their household in one write.
    pub fn register_applicant(
        &self,
        input: ApplicantInput,
    ) -> Result<Applicant, AssistanceServiceError> {
        let draft = self.validator.applicant(&input)?;
        let id = ApplicantId::generate();
        let now = Utc::now();

        let household = draft
            .household
            .into_iter()
            .map(|member| HouseholdMember {
                id: HouseholdMemberId::generate(),
                applicant_id: id.clone(),
                name: member.name,
                employment_status: member.employment_status,
                sex: member.sex,
                date_of_birth: member.date_of_birth,
                relation: member.relation,
                school_level: member.school_level,
            })
            .collect();

        let applicant = self.repository.insert_applicant(Applicant {
            id,
            name: draft.name,
            employment_status: draft.employment_status,
            sex: draft.sex,
            date_of_birth: draft.date_of_birth,
            household,
            created_at: now,
            updated_at: now,
        })?;

        info!(
            applicant_id = %applicant.id,
            household = applicant.household.len(),
            "applicant registered"
        );
        Ok(applicant)
    }

    pub fn applicants(&self) -> Result<Vec<Applicant>, AssistanceServiceError> {
        Ok(self.repository.list_applicants()?)
    }

    pub fn applicant(&self, id: &ApplicantId) -> Result<Applicant, AssistanceServiceError> {
        self.repository
            .fetch_applicant(id)?
            .ok_or_else(|| AssistanceServiceError::ApplicantNotFound(id.clone()))
    }

    /// Overwrite the applicant and replace the household wholesale.
    ///
    /// Members whose id already belongs to this applicant keep it; every other member
    /// receives a fresh identifier.
    pub fn update_applicant(
        &self,
        id: &ApplicantId,
        input: ApplicantInput,
    ) -> Result<Applicant, AssistanceServiceError> {
        let draft = self.validator.applicant(&input)?;
        let existing = self.applicant(id)?;

        let known: HashSet<&HouseholdMemberId> =
            existing.household.iter().map(|member| &member.id).collect();

        let household = draft
            .household
            .into_iter()
            .map(|member| HouseholdMember {
                id: member
                    .id
                    .filter(|candidate| known.contains(candidate))
                    .unwrap_or_else(HouseholdMemberId::generate),
                applicant_id: existing.id.clone(),
                name: member.name,
                employment_status: member.employment_status,
                sex: member.sex,
                date_of_birth: member.date_of_birth,
                relation: member.relation,
                school_level: member.school_level,
            })
            .collect();

        let updated = Applicant {
            id: existing.id.clone(),
            name: draft.name,
            employment_status: draft.employment_status,
            sex: draft.sex,
            date_of_birth: draft.date_of_birth,
            household,
            created_at: existing.created_at,
            updated_at: Utc::now(),
        };

        let stored = self
            .repository
            .replace_applicant(updated)
            .map_err(|err| {
                not_found_as(err, || AssistanceServiceError::ApplicantNotFound(id.clone()))
            })?;

        info!(applicant_id = %stored.id, "applicant updated");
        Ok(stored)
    }

    /// Delete the applicant, their household, and their applications.
    pub fn delete_applicant(&self, id: &ApplicantId) -> Result<(), AssistanceServiceError> {
        self.repository
            .delete_applicant(id)
            .map_err(|err| {
                not_found_as(err, || AssistanceServiceError::ApplicantNotFound(id.clone()))
            })?;
        info!(applicant_id = %id, "applicant deleted");
        Ok(())
    }

    pub fn create_scheme(&self, input: SchemeInput) -> Result<Scheme, AssistanceServiceError> {
        let draft = self.validator.scheme(&input)?;
        let id = SchemeId::generate();
        let now = Utc::now();

        let benefits = draft
            .benefits
            .into_iter()
            .map(|benefit| Benefit {
                id: BenefitId::generate(),
                scheme_id: id.clone(),
                name: benefit.name,
                amount: benefit.amount,
            })
            .collect();

        let scheme = self.repository.insert_scheme(Scheme {
            id,
            name: draft.name,
            criteria: draft.criteria,
            benefits,
            created_at: now,
            updated_at: now,
        })?;

        info!(
            scheme_id = %scheme.id,
            benefits = scheme.benefits.len(),
            "scheme created"
        );
        Ok(scheme)
    }

    pub fn schemes(&self) -> Result<Vec<Scheme>, AssistanceServiceError> {
        Ok(self.repository.list_schemes()?)
    }

    pub fn scheme(&self, id: &SchemeId) -> Result<Scheme, AssistanceServiceError> {
        self.repository
            .fetch_scheme(id)?
            .ok_or_else(|| AssistanceServiceError::SchemeNotFound(id.clone()))
    }

    /// Overwrite the scheme and replace its benefits wholesale, keeping known benefit ids.
    pub fn update_scheme(
        &self,
        id: &SchemeId,
        input: SchemeInput,
    ) -> Result<Scheme, AssistanceServiceError> {
        let draft = self.validator.scheme(&input)?;
        let existing = self.scheme(id)?;

        let known: HashSet<&BenefitId> =
            existing.benefits.iter().map(|benefit| &benefit.id).collect();

        let benefits = draft
            .benefits
            .into_iter()
            .map(|benefit| Benefit {
                id: benefit
                    .id
                    .filter(|candidate| known.contains(candidate))
                    .unwrap_or_else(BenefitId::generate),
                scheme_id: existing.id.clone(),
                name: benefit.name,
                amount: benefit.amount,
            })
            .collect();

        let updated = Scheme {
            id: existing.id.clone(),
            name: draft.name,
            criteria: draft.criteria,
            benefits,
            created_at: existing.created_at,
            updated_at: Utc::now(),
        };

        let stored = self
            .repository
            .replace_scheme(updated)
            .map_err(|err| {
                not_found_as(err, || AssistanceServiceError::SchemeNotFound(id.clone()))
            })?;

        info!(scheme_id = %stored.id, "scheme updated");
        Ok(stored)
    }

    /// Delete the scheme, its benefits, and applications made to it.
    pub fn delete_scheme(&self, id: &SchemeId) -> Result<(), AssistanceServiceError> {
        self.repository
            .delete_scheme(id)
            .map_err(|err| {
                not_found_as(err, || AssistanceServiceError::SchemeNotFound(id.clone()))
            })?;
        info!(scheme_id = %id, "scheme deleted");
        Ok(())
    }

    /// Schemes the applicant currently qualifies for, in store order.
    pub fn eligible_schemes(
        &self,
        applicant_id: &ApplicantId,
    ) -> Result<Vec<Scheme>, AssistanceServiceError> {
        let applicant = self.applicant(applicant_id)?;
        let schemes = self.repository.list_schemes()?;
        Ok(eligibility::scan_schemes(&applicant, schemes))
    }

    /// Record an application. A second application for the same pair is a conflict.
    pub fn submit_application(
        &self,
        input: ApplicationInput,
    ) -> Result<Application, AssistanceServiceError> {
        let (applicant_id, scheme_id) = self.resolve_pair(input)?;
        let now = Utc::now();

        let application = self
            .repository
            .insert_application(Application {
                id: ApplicationId::generate(),
                applicant_id: applicant_id.clone(),
                scheme_id: scheme_id.clone(),
                created_at: now,
                updated_at: now,
            })
            .map_err(|err| application_write_error(err, &applicant_id, &scheme_id))?;

        info!(
            application_id = %application.id,
            applicant_id = %applicant_id,
            scheme_id = %scheme_id,
            "application submitted"
        );
        Ok(application)
    }

    pub fn applications(
        &self,
        filter: &ApplicationFilter,
    ) -> Result<Vec<Application>, AssistanceServiceError> {
        Ok(self.repository.find_applications(filter)?)
    }

    pub fn application(&self, id: &ApplicationId) -> Result<Application, AssistanceServiceError> {
        self.repository
            .fetch_application(id)?
            .ok_or_else(|| AssistanceServiceError::ApplicationNotFound(id.clone()))
    }

    /// Re-point an application at another applicant/scheme pair.
    pub fn update_application(
        &self,
        id: &ApplicationId,
        input: ApplicationInput,
    ) -> Result<Application, AssistanceServiceError> {
        let existing = self.application(id)?;
        let (applicant_id, scheme_id) = self.resolve_pair(input)?;

        let updated = Application {
            id: existing.id,
            applicant_id: applicant_id.clone(),
            scheme_id: scheme_id.clone(),
            created_at: existing.created_at,
            updated_at: Utc::now(),
        };

        let stored = self
            .repository
            .replace_application(updated)
            .map_err(|err| match err {
                RepositoryError::NotFound => AssistanceServiceError::ApplicationNotFound(id.clone()),
                other => application_write_error(other, &applicant_id, &scheme_id),
            })?;

        info!(application_id = %stored.id, "application updated");
        Ok(stored)
    }

    pub fn delete_application(&self, id: &ApplicationId) -> Result<(), AssistanceServiceError> {
        self.repository
            .delete_application(id)
            .map_err(|err| {
                not_found_as(err, || AssistanceServiceError::ApplicationNotFound(id.clone()))
            })?;
        info!(application_id = %id, "application deleted");
        Ok(())
    }

    /// Remove every application of the applicant, returning how many were removed.
    pub fn withdraw_applications(
        &self,
        applicant_id: &ApplicantId,
    ) -> Result<usize, AssistanceServiceError> {
        let removed = self.repository.delete_applications_for(applicant_id)?;
        info!(applicant_id = %applicant_id, removed, "applications withdrawn");
        Ok(removed)
    }

    /// Early rejection for blank or unknown ids. The repository re-checks both
    /// references under its own lock when the application is written.
    fn resolve_pair(
        &self,
        input: ApplicationInput,
    ) -> Result<(ApplicantId, SchemeId), AssistanceServiceError> {
        if input.applicant_id.trim().is_empty() {
            return Err(ValidationError::Empty {
                field: "applicant_id".to_string(),
            }
            .into());
        }
        if input.scheme_id.trim().is_empty() {
            return Err(ValidationError::Empty {
                field: "scheme_id".to_string(),
            }
            .into());
        }

        let applicant_id = ApplicantId(input.applicant_id);
        let scheme_id = SchemeId(input.scheme_id);

        if self.repository.fetch_applicant(&applicant_id)?.is_none() {
            return Err(AssistanceServiceError::ApplicantNotFound(applicant_id));
        }
        if self.repository.fetch_scheme(&scheme_id)?.is_none() {
            return Err(AssistanceServiceError::SchemeNotFound(scheme_id));
        }

        Ok((applicant_id, scheme_id))
    }
}

fn not_found_as<F>(err: RepositoryError, missing: F) -> AssistanceServiceError
where
    F: FnOnce() -> AssistanceServiceError,
{
    match err {
        RepositoryError::NotFound => missing(),
        other => AssistanceServiceError::Repository(other),
    }
}

/// Map a failed application write onto the pair it was written for.
fn application_write_error(
    err: RepositoryError,
    applicant_id: &ApplicantId,
    scheme_id: &SchemeId,
) -> AssistanceServiceError {
    match err {
        RepositoryError::Conflict => AssistanceServiceError::DuplicateApplication {
            applicant_id: applicant_id.clone(),
            scheme_id: scheme_id.clone(),
        },
        RepositoryError::MissingApplicant => {
            AssistanceServiceError::ApplicantNotFound(applicant_id.clone())
        }
        RepositoryError::MissingScheme => AssistanceServiceError::SchemeNotFound(scheme_id.clone()),
        other => AssistanceServiceError::Repository(other),
    }
}

/// Error raised by the assistance service.
#[derive(Debug, thiserror::Error)]
pub enum AssistanceServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("applicant {0} not found")]
    ApplicantNotFound(ApplicantId),
    #[error("scheme {0} not found")]
    SchemeNotFound(SchemeId),
    #[error("application {0} not found")]
    ApplicationNotFound(ApplicationId),
    #[error("applicant {applicant_id} has already applied for scheme {scheme_id}")]
    DuplicateApplication {
        applicant_id: ApplicantId,
        scheme_id: SchemeId,
    },
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
