use std::io;
use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::http::{header, Request};
use axum::response::Response;
use chrono::{NaiveDate, TimeZone, Utc};
use serde_json::Value;
use tracing_subscriber::fmt::MakeWriter;

use crate::assistance::domain::{
    Applicant, ApplicantId, ApplicantInput, Application, ApplicationFilter, ApplicationId,
    BenefitInput, ChildCriteriaInput, Comparator, CriteriaInput, EmploymentStatus,
    HouseholdMember, HouseholdMemberId, HouseholdMemberInput, Relation, Scheme, SchemeId,
    SchemeInput, SchoolLevel, Sex,
};
use crate::assistance::eligibility::Criteria;
use crate::assistance::repository::{AssistanceRepository, RepositoryError};
use crate::assistance::{AssistanceService, InMemoryRepository, Validator};

pub(super) fn reference_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 1).expect("valid date")
}

pub(super) fn validator() -> Validator {
    Validator::as_of(reference_date())
}

pub(super) fn member_input(name: &str, relation: &str, school_level: u8) -> HouseholdMemberInput {
    HouseholdMemberInput {
        id: None,
        name: name.to_string(),
        employment_status: "student".to_string(),
        sex: "male".to_string(),
        date_of_birth: "2012-03-14".to_string(),
        relation: relation.to_string(),
        school_level: school_level.into(),
    }
}

/// Employed applicant with one son in secondary school.
pub(super) fn alice_input() -> ApplicantInput {
    ApplicantInput {
        name: "Alice".to_string(),
        employment_status: "employed".to_string(),
        sex: "female".to_string(),
        date_of_birth: "1985-07-22".to_string(),
        household: vec![member_input("Bob", "son", SchoolLevel::Secondary.ordinal())],
    }
}

pub(super) fn benefit_input(name: &str, amount: f64) -> BenefitInput {
    BenefitInput {
        id: None,
        name: name.to_string(),
        amount,
    }
}

/// Employed applicants with a child at primary level or above.
pub(super) fn s1_input() -> SchemeInput {
    SchemeInput {
        name: "S1".to_string(),
        criteria: CriteriaInput {
            employment_status: "employed".to_string(),
            has_children: Some(ChildCriteriaInput {
                school_level: SchoolLevel::Primary.ordinal().into(),
                school_level_condition: Comparator::AtLeast.code().into(),
            }),
        },
        benefits: vec![benefit_input("School meal vouchers", 120.0)],
    }
}

/// Unemployed applicants only.
pub(super) fn s2_input() -> SchemeInput {
    SchemeInput {
        name: "S2".to_string(),
        criteria: CriteriaInput {
            employment_status: "unemployed".to_string(),
            has_children: None,
        },
        benefits: vec![benefit_input("Retraining grant", 500.0)],
    }
}

pub(super) fn applicant_with(
    employment_status: EmploymentStatus,
    household: &[(Relation, SchoolLevel)],
) -> Applicant {
    let id = ApplicantId::from("applicant-fixture");
    let created = Utc
        .with_ymd_and_hms(2025, 1, 1, 9, 0, 0)
        .single()
        .expect("valid timestamp");

    Applicant {
        household: household
            .iter()
            .enumerate()
            .map(|(index, (relation, school_level))| HouseholdMember {
                id: HouseholdMemberId(format!("member-{index}")),
                applicant_id: id.clone(),
                name: format!("Member {index}"),
                employment_status: EmploymentStatus::Student,
                sex: Sex::Female,
                date_of_birth: NaiveDate::from_ymd_opt(2014, 5, 2).expect("valid date"),
                relation: *relation,
                school_level: *school_level,
            })
            .collect(),
        id,
        name: "Fixture".to_string(),
        employment_status,
        sex: Sex::Female,
        date_of_birth: NaiveDate::from_ymd_opt(1980, 1, 1).expect("valid date"),
        created_at: created,
        updated_at: created,
    }
}

pub(super) fn scheme_with(name: &str, criteria: Criteria) -> Scheme {
    let created = Utc
        .with_ymd_and_hms(2025, 1, 1, 9, 0, 0)
        .single()
        .expect("valid timestamp");

    Scheme {
        id: SchemeId(format!("scheme-{name}")),
        name: name.to_string(),
        criteria,
        benefits: Vec::new(),
        created_at: created,
        updated_at: created,
    }
}

pub(super) fn build_service() -> (AssistanceService<InMemoryRepository>, Arc<InMemoryRepository>) {
    let repository = Arc::new(InMemoryRepository::new());
    let service = AssistanceService::with_validator(repository.clone(), validator());
    (service, repository)
}

pub(super) struct UnavailableRepository;

fn offline<T>() -> Result<T, RepositoryError> {
    Err(RepositoryError::Unavailable("database offline".to_string()))
}

impl AssistanceRepository for UnavailableRepository {
    fn insert_applicant(&self, _applicant: Applicant) -> Result<Applicant, RepositoryError> {
        offline()
    }

    fn replace_applicant(&self, _applicant: Applicant) -> Result<Applicant, RepositoryError> {
        offline()
    }

    fn fetch_applicant(&self, _id: &ApplicantId) -> Result<Option<Applicant>, RepositoryError> {
        offline()
    }

    fn list_applicants(&self) -> Result<Vec<Applicant>, RepositoryError> {
        offline()
    }

    fn delete_applicant(&self, _id: &ApplicantId) -> Result<(), RepositoryError> {
        offline()
    }

    fn insert_scheme(&self, _scheme: Scheme) -> Result<Scheme, RepositoryError> {
        offline()
    }

    fn replace_scheme(&self, _scheme: Scheme) -> Result<Scheme, RepositoryError> {
        offline()
    }

    fn fetch_scheme(&self, _id: &SchemeId) -> Result<Option<Scheme>, RepositoryError> {
        offline()
    }

    fn list_schemes(&self) -> Result<Vec<Scheme>, RepositoryError> {
        offline()
    }

    fn delete_scheme(&self, _id: &SchemeId) -> Result<(), RepositoryError> {
        offline()
    }

    fn insert_application(
        &self,
        _application: Application,
    ) -> Result<Application, RepositoryError> {
        offline()
    }

    fn replace_application(
        &self,
        _application: Application,
    ) -> Result<Application, RepositoryError> {
        offline()
    }

    fn fetch_application(
        &self,
        _id: &ApplicationId,
    ) -> Result<Option<Application>, RepositoryError> {
        offline()
    }

    fn find_applications(
        &self,
        _filter: &ApplicationFilter,
    ) -> Result<Vec<Application>, RepositoryError> {
        offline()
    }

    fn delete_application(&self, _id: &ApplicationId) -> Result<(), RepositoryError> {
        offline()
    }

    fn delete_applications_for(&self, _applicant_id: &ApplicantId) -> Result<usize, RepositoryError> {
        offline()
    }
}

pub(super) fn json_request(method: &str, uri: &str, payload: &impl serde::Serialize) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(payload).expect("serialize payload")))
        .expect("request")
}

pub(super) fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("request")
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

/// In-memory sink for formatted log lines, shared between the subscriber and the test.
#[derive(Debug, Clone, Default)]
pub(super) struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    pub(super) fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().expect("log buffer")).into_owned()
    }

    /// Run `f` with a plain-text subscriber writing into this buffer.
    pub(super) fn capture<T>(&self, f: impl FnOnce() -> T) -> T {
        let subscriber = tracing_subscriber::fmt()
            .with_writer(self.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::DEBUG)
            .finish();
        tracing::subscriber::with_default(subscriber, f)
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().expect("log buffer").extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedLogs;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}
