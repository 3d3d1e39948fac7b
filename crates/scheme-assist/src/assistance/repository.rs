use super::domain::{
    Applicant, ApplicantId, Application, ApplicationFilter, ApplicationId, Scheme, SchemeId,
};

/// Storage capability consumed by the service.
///
/// Each call is one atomic unit: aggregate writes (applicant with household, scheme
/// with benefits) and cascading deletes either apply in full or not at all.
pub trait AssistanceRepository: Send + Sync {
    fn insert_applicant(&self, applicant: Applicant) -> Result<Applicant, RepositoryError>;
    /// Replace the stored applicant, including its whole household.
    fn replace_applicant(&self, applicant: Applicant) -> Result<Applicant, RepositoryError>;
    fn fetch_applicant(&self, id: &ApplicantId) -> Result<Option<Applicant>, RepositoryError>;
    fn list_applicants(&self) -> Result<Vec<Applicant>, RepositoryError>;
    /// Remove the applicant, its household, and its applications.
    fn delete_applicant(&self, id: &ApplicantId) -> Result<(), RepositoryError>;

    fn insert_scheme(&self, scheme: Scheme) -> Result<Scheme, RepositoryError>;
    /// Replace the stored scheme, including its whole benefit list.
    fn replace_scheme(&self, scheme: Scheme) -> Result<Scheme, RepositoryError>;
    fn fetch_scheme(&self, id: &SchemeId) -> Result<Option<Scheme>, RepositoryError>;
    /// All schemes in insertion order.
    fn list_schemes(&self) -> Result<Vec<Scheme>, RepositoryError>;
    /// Remove the scheme, its benefits, and applications made to it.
    fn delete_scheme(&self, id: &SchemeId) -> Result<(), RepositoryError>;

    /// Fails with [`RepositoryError::Conflict`] when the (applicant, scheme) pair exists and
    /// with a missing-reference error when either side is not stored at write time.
    fn insert_application(&self, application: Application)
        -> Result<Application, RepositoryError>;
    /// Same reference and pair checks as [`AssistanceRepository::insert_application`].
    fn replace_application(
        &self,
        application: Application,
    ) -> Result<Application, RepositoryError>;
    fn fetch_application(&self, id: &ApplicationId)
        -> Result<Option<Application>, RepositoryError>;
    fn find_applications(
        &self,
        filter: &ApplicationFilter,
    ) -> Result<Vec<Application>, RepositoryError>;
    fn delete_application(&self, id: &ApplicationId) -> Result<(), RepositoryError>;
    /// Returns the number of applications removed.
    fn delete_applications_for(&self, applicant_id: &ApplicantId) -> Result<usize, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("referenced applicant does not exist")]
    MissingApplicant,
    #[error("referenced scheme does not exist")]
    MissingScheme,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
