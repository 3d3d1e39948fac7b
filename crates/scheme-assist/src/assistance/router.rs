use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get},
    Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use super::domain::{
    ApplicantId, ApplicantInput, ApplicationFilter, ApplicationId, ApplicationInput, SchemeId,
    SchemeInput,
};
use super::repository::AssistanceRepository;
use super::service::{AssistanceService, AssistanceServiceError};
use super::views::{scheme_views, SchemeView};

type SharedService<R> = State<Arc<AssistanceService<R>>>;
type JsonBody<T> = Result<axum::Json<T>, JsonRejection>;

/// Router exposing applicant, scheme, application, and eligibility endpoints.
pub fn assistance_router<R>(service: Arc<AssistanceService<R>>) -> Router
where
    R: AssistanceRepository + 'static,
{
    Router::new()
        .route(
            "/api/applicants",
            get(list_applicants_handler::<R>).post(register_applicant_handler::<R>),
        )
        .route(
            "/api/applicants/:applicant_id",
            get(applicant_handler::<R>)
                .put(update_applicant_handler::<R>)
                .delete(delete_applicant_handler::<R>),
        )
        .route(
            "/api/applicants/:applicant_id/eligible-schemes",
            get(eligible_schemes_handler::<R>),
        )
        .route(
            "/api/applicants/:applicant_id/applications",
            delete(withdraw_applications_handler::<R>),
        )
        .route(
            "/api/schemes",
            get(list_schemes_handler::<R>).post(create_scheme_handler::<R>),
        )
        .route(
            "/api/schemes/:scheme_id",
            get(scheme_handler::<R>)
                .put(update_scheme_handler::<R>)
                .delete(delete_scheme_handler::<R>),
        )
        .route(
            "/api/applications",
            get(list_applications_handler::<R>).post(submit_application_handler::<R>),
        )
        .route(
            "/api/applications/:application_id",
            get(application_handler::<R>)
                .put(update_application_handler::<R>)
                .delete(delete_application_handler::<R>),
        )
        .with_state(service)
}

/// Map a service failure onto an HTTP status and JSON error body.
pub(crate) fn error_response(err: AssistanceServiceError) -> Response {
    let status = match &err {
        AssistanceServiceError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        AssistanceServiceError::ApplicantNotFound(_)
        | AssistanceServiceError::SchemeNotFound(_)
        | AssistanceServiceError::ApplicationNotFound(_) => StatusCode::NOT_FOUND,
        AssistanceServiceError::DuplicateApplication { .. } => StatusCode::CONFLICT,
        AssistanceServiceError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    let payload = match &err {
        AssistanceServiceError::Validation(violation) => json!({
            "error": violation.to_string(),
            "field": violation.field(),
        }),
        AssistanceServiceError::Repository(source) => {
            error!(error = %source, "repository failure");
            json!({ "error": err.to_string() })
        }
        _ => json!({ "error": err.to_string() }),
    };

    (status, axum::Json(payload)).into_response()
}

/// Unwrap a request body, answering malformed JSON with the same error shape as the service.
fn body<T>(payload: JsonBody<T>) -> Result<T, Response> {
    payload.map(|axum::Json(input)| input).map_err(|rejection| {
        (
            rejection.status(),
            axum::Json(json!({ "error": rejection.body_text() })),
        )
            .into_response()
    })
}

fn message(status: StatusCode, text: &str) -> Response {
    (status, axum::Json(json!({ "message": text }))).into_response()
}

pub(crate) async fn register_applicant_handler<R>(
    State(service): SharedService<R>,
    payload: JsonBody<ApplicantInput>,
) -> Response
where
    R: AssistanceRepository + 'static,
{
    let input = match body(payload) {
        Ok(input) => input,
        Err(response) => return response,
    };
    match service.register_applicant(input) {
        Ok(applicant) => (
            StatusCode::CREATED,
            axum::Json(json!({ "applicant": applicant })),
        )
            .into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn list_applicants_handler<R>(State(service): SharedService<R>) -> Response
where
    R: AssistanceRepository + 'static,
{
    match service.applicants() {
        Ok(applicants) => axum::Json(json!({ "applicants": applicants })).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn applicant_handler<R>(
    State(service): SharedService<R>,
    Path(applicant_id): Path<String>,
) -> Response
where
    R: AssistanceRepository + 'static,
{
    match service.applicant(&ApplicantId(applicant_id)) {
        Ok(applicant) => axum::Json(json!({ "applicant": applicant })).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn update_applicant_handler<R>(
    State(service): SharedService<R>,
    Path(applicant_id): Path<String>,
    payload: JsonBody<ApplicantInput>,
) -> Response
where
    R: AssistanceRepository + 'static,
{
    let input = match body(payload) {
        Ok(input) => input,
        Err(response) => return response,
    };
    match service.update_applicant(&ApplicantId(applicant_id), input) {
        Ok(applicant) => axum::Json(json!({ "applicant": applicant })).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn delete_applicant_handler<R>(
    State(service): SharedService<R>,
    Path(applicant_id): Path<String>,
) -> Response
where
    R: AssistanceRepository + 'static,
{
    match service.delete_applicant(&ApplicantId(applicant_id)) {
        Ok(()) => message(StatusCode::OK, "applicant deleted"),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn eligible_schemes_handler<R>(
    State(service): SharedService<R>,
    Path(applicant_id): Path<String>,
) -> Response
where
    R: AssistanceRepository + 'static,
{
    match service.eligible_schemes(&ApplicantId(applicant_id)) {
        Ok(schemes) => {
            axum::Json(json!({ "eligible_schemes": scheme_views(schemes) })).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn withdraw_applications_handler<R>(
    State(service): SharedService<R>,
    Path(applicant_id): Path<String>,
) -> Response
where
    R: AssistanceRepository + 'static,
{
    match service.withdraw_applications(&ApplicantId(applicant_id)) {
        Ok(removed) => axum::Json(json!({ "removed": removed })).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn create_scheme_handler<R>(
    State(service): SharedService<R>,
    payload: JsonBody<SchemeInput>,
) -> Response
where
    R: AssistanceRepository + 'static,
{
    let input = match body(payload) {
        Ok(input) => input,
        Err(response) => return response,
    };
    match service.create_scheme(input) {
        Ok(scheme) => (
            StatusCode::CREATED,
            axum::Json(json!({ "scheme": SchemeView::from(scheme) })),
        )
            .into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn list_schemes_handler<R>(State(service): SharedService<R>) -> Response
where
    R: AssistanceRepository + 'static,
{
    match service.schemes() {
        Ok(schemes) => axum::Json(json!({ "schemes": scheme_views(schemes) })).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn scheme_handler<R>(
    State(service): SharedService<R>,
    Path(scheme_id): Path<String>,
) -> Response
where
    R: AssistanceRepository + 'static,
{
    match service.scheme(&SchemeId(scheme_id)) {
        Ok(scheme) => axum::Json(json!({ "scheme": SchemeView::from(scheme) })).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn update_scheme_handler<R>(
    State(service): SharedService<R>,
    Path(scheme_id): Path<String>,
    payload: JsonBody<SchemeInput>,
) -> Response
where
    R: AssistanceRepository + 'static,
{
    let input = match body(payload) {
        Ok(input) => input,
        Err(response) => return response,
    };
    match service.update_scheme(&SchemeId(scheme_id), input) {
        Ok(scheme) => axum::Json(json!({ "scheme": SchemeView::from(scheme) })).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn delete_scheme_handler<R>(
    State(service): SharedService<R>,
    Path(scheme_id): Path<String>,
) -> Response
where
    R: AssistanceRepository + 'static,
{
    match service.delete_scheme(&SchemeId(scheme_id)) {
        Ok(()) => message(StatusCode::OK, "scheme deleted"),
        Err(err) => error_response(err),
    }
}

/// Query string for application listings; blank values are ignored.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ApplicationQuery {
    #[serde(default)]
    applicant_id: Option<String>,
    #[serde(default)]
    scheme_id: Option<String>,
}

impl ApplicationQuery {
    fn into_filter(self) -> ApplicationFilter {
        ApplicationFilter {
            applicant_id: self
                .applicant_id
                .filter(|id| !id.is_empty())
                .map(ApplicantId),
            scheme_id: self.scheme_id.filter(|id| !id.is_empty()).map(SchemeId),
        }
    }
}

pub(crate) async fn submit_application_handler<R>(
    State(service): SharedService<R>,
    payload: JsonBody<ApplicationInput>,
) -> Response
where
    R: AssistanceRepository + 'static,
{
    let input = match body(payload) {
        Ok(input) => input,
        Err(response) => return response,
    };
    match service.submit_application(input) {
        Ok(application) => (
            StatusCode::CREATED,
            axum::Json(json!({ "application": application })),
        )
            .into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn list_applications_handler<R>(
    State(service): SharedService<R>,
    Query(query): Query<ApplicationQuery>,
) -> Response
where
    R: AssistanceRepository + 'static,
{
    match service.applications(&query.into_filter()) {
        Ok(applications) => {
            axum::Json(json!({ "applications": applications })).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn application_handler<R>(
    State(service): SharedService<R>,
    Path(application_id): Path<String>,
) -> Response
where
    R: AssistanceRepository + 'static,
{
    match service.application(&ApplicationId(application_id)) {
        Ok(application) => axum::Json(json!({ "application": application })).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn update_application_handler<R>(
    State(service): SharedService<R>,
    Path(application_id): Path<String>,
    payload: JsonBody<ApplicationInput>,
) -> Response
where
    R: AssistanceRepository + 'static,
{
    let input = match body(payload) {
        Ok(input) => input,
        Err(response) => return response,
    };
    match service.update_application(&ApplicationId(application_id), input) {
        Ok(application) => axum::Json(json!({ "application": application })).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn delete_application_handler<R>(
    State(service): SharedService<R>,
    Path(application_id): Path<String>,
) -> Response
where
    R: AssistanceRepository + 'static,
{
    match service.delete_application(&ApplicationId(application_id)) {
        Ok(()) => message(StatusCode::OK, "application deleted"),
        Err(err) => error_response(err),
    }
}
