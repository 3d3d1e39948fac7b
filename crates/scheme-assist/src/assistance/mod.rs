//! Applicant registry, scheme catalogue, applications, and eligibility.
//!
//! Inbound payloads pass through [`Validator`] before the [`AssistanceService`] binds
//! them to identities and persists them through an [`AssistanceRepository`]. The
//! eligibility evaluator is pure and can be used without any storage.

pub mod domain;
pub mod eligibility;
pub mod memory;
pub mod repository;
pub mod router;
pub mod service;
pub mod validation;
pub mod views;

#[cfg(test)]
mod tests;

pub use domain::{
    Applicant, ApplicantId, ApplicantInput, Application, ApplicationFilter, ApplicationId,
    ApplicationInput, Benefit, BenefitId, BenefitInput, ChildCriteriaInput, Comparator,
    CriteriaInput, EmploymentStatus, HouseholdMember, HouseholdMemberId, HouseholdMemberInput,
    Relation, Scheme, SchemeId, SchemeInput, SchoolLevel, Sex,
};
pub use eligibility::{is_eligible, scan_schemes, ChildCriteria, Criteria, CriteriaDescription};
pub use memory::InMemoryRepository;
pub use repository::{AssistanceRepository, RepositoryError};
pub use router::assistance_router;
pub use service::{AssistanceService, AssistanceServiceError};
pub use validation::{ValidationError, Validator};
pub use views::SchemeView;
