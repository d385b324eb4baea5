use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use tokio_util::sync::CancellationToken;

use crate::advisors::AnalysisError;
use crate::repository::{RepositoryError, SubmissionRepository};
use crate::scoring::{OrganizationId, QuestionFilter, ResponseSet, Submission};
use crate::service::{AnalysisService, AnalysisServiceError};

/// Router builder exposing submission, snapshot, and analysis endpoints.
pub fn analysis_router<R>(service: Arc<AnalysisService<R>>) -> Router
where
    R: SubmissionRepository + 'static,
{
    Router::new()
        .route("/api/v1/submissions", post(submit_handler::<R>))
        .route(
            "/api/v1/organizations/:organization_id/snapshot",
            get(snapshot_handler::<R>),
        )
        .route(
            "/api/v1/organizations/:organization_id/analysis",
            post(analysis_handler::<R>).delete(invalidate_handler::<R>),
        )
        .route("/api/v1/rubric/questions", get(questions_handler::<R>))
        .route("/api/v1/advisors", get(advisors_handler::<R>))
        .with_state(service)
}

/// Inbound survey payload; the timestamp defaults to receipt time.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionRequest {
    pub organization_id: OrganizationId,
    pub responses: ResponseSet,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

impl From<SubmissionRequest> for Submission {
    fn from(request: SubmissionRequest) -> Self {
        Submission {
            organization_id: request.organization_id,
            responses: request.responses,
            timestamp: request.timestamp.unwrap_or_else(Utc::now),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct FilterParams {
    pub filter: Option<String>,
}

impl FilterParams {
    fn parse(&self) -> Result<Option<QuestionFilter>, Response> {
        match self.filter.as_deref() {
            None => Ok(None),
            Some(raw) => QuestionFilter::parse(raw).map(Some).ok_or_else(|| {
                let payload = json!({
                    "error": format!("unknown question filter `{raw}`"),
                });
                (StatusCode::BAD_REQUEST, axum::Json(payload)).into_response()
            }),
        }
    }
}

pub(crate) async fn submit_handler<R>(
    State(service): State<Arc<AnalysisService<R>>>,
    axum::Json(request): axum::Json<SubmissionRequest>,
) -> Response
where
    R: SubmissionRepository + 'static,
{
    match service.submit(request.into()) {
        Ok(snapshot) => (StatusCode::ACCEPTED, axum::Json(snapshot)).into_response(),
        Err(AnalysisServiceError::InvalidSubmission(message)) => {
            let payload = json!({ "error": message });
            (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response()
        }
        Err(other) => error_response(other),
    }
}

pub(crate) async fn snapshot_handler<R>(
    State(service): State<Arc<AnalysisService<R>>>,
    Path(organization_id): Path<String>,
    Query(params): Query<FilterParams>,
) -> Response
where
    R: SubmissionRepository + 'static,
{
    let filter = match params.parse() {
        Ok(filter) => filter,
        Err(response) => return response,
    };

    match service.snapshot(&OrganizationId::new(organization_id), filter) {
        Ok(snapshot) => (StatusCode::OK, axum::Json(snapshot)).into_response(),
        Err(error) => error_response(error),
    }
}

/// Dropping the request future (client disconnect) cancels in-flight
/// completion calls.
pub(crate) async fn analysis_handler<R>(
    State(service): State<Arc<AnalysisService<R>>>,
    Path(organization_id): Path<String>,
) -> Response
where
    R: SubmissionRepository + 'static,
{
    let cancel = CancellationToken::new();
    let _abort_on_drop = cancel.clone().drop_guard();

    let organization_id = OrganizationId::new(organization_id);
    match service
        .comprehensive_analysis(&organization_id, &cancel)
        .await
    {
        Ok(analysis) => (StatusCode::OK, axum::Json(analysis.as_ref())).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn invalidate_handler<R>(
    State(service): State<Arc<AnalysisService<R>>>,
    Path(organization_id): Path<String>,
) -> StatusCode
where
    R: SubmissionRepository + 'static,
{
    service.invalidate(&OrganizationId::new(organization_id));
    StatusCode::NO_CONTENT
}

pub(crate) async fn questions_handler<R>(
    State(service): State<Arc<AnalysisService<R>>>,
    Query(params): Query<FilterParams>,
) -> Response
where
    R: SubmissionRepository + 'static,
{
    let filter = match params.parse() {
        Ok(filter) => filter.unwrap_or_default(),
        Err(response) => return response,
    };

    let questions = service.engine().rubric().questions(filter);
    (
        StatusCode::OK,
        axum::Json(json!({
            "filter": filter,
            "questions": questions,
        })),
    )
        .into_response()
}

pub(crate) async fn advisors_handler<R>(State(service): State<Arc<AnalysisService<R>>>) -> Response
where
    R: SubmissionRepository + 'static,
{
    let manager = service.manager();
    (
        StatusCode::OK,
        axum::Json(json!({
            "completionService": manager.has_completion_client(),
            "advisors": manager.registry().summaries(),
        })),
    )
        .into_response()
}

fn error_response(error: AnalysisServiceError) -> Response {
    let status = match &error {
        AnalysisServiceError::InvalidSubmission(_) => StatusCode::UNPROCESSABLE_ENTITY,
        AnalysisServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        AnalysisServiceError::Repository(RepositoryError::Unavailable(_)) => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        AnalysisServiceError::Analysis(AnalysisError::Cancelled) => StatusCode::REQUEST_TIMEOUT,
    };
    if status.is_server_error() {
        tracing::error!(%error, "analysis request failed");
    }
    let payload = json!({ "error": error.to_string() });
    (status, axum::Json(payload)).into_response()
}
