use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::error;

use super::domain::{AnswerSubmission, Session, SessionId, SessionStatus};
use super::events::SurveyNotifier;
use super::mapper;
use super::questions::Question;
use super::repository::SessionRepository;
use super::service::{SessionManager, SurveyServiceError};

/// Router builder exposing the survey REST surface.
pub fn survey_router<R, N>(service: Arc<SessionManager<R, N>>) -> Router
where
    R: SessionRepository + 'static,
    N: SurveyNotifier + 'static,
{
    Router::new()
        .route(
            "/sessions",
            post(create_handler::<R, N>)
                .get(list_handler::<R, N>)
                .delete(purge_handler::<R, N>),
        )
        .route(
            "/sessions/:session_id",
            get(session_handler::<R, N>).delete(delete_handler::<R, N>),
        )
        .route(
            "/sessions/:session_id/answers",
            post(answer_handler::<R, N>),
        )
        .route(
            "/sessions/:session_id/summary",
            get(summary_handler::<R, N>),
        )
        .route("/tags/scan", post(create_handler::<R, N>))
        .route("/tags/:tag_id/state", get(tag_state_handler))
        .route("/stats", get(stats_handler::<R, N>))
        .route("/report.csv", get(report_handler::<R, N>))
        .with_state(service)
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    #[serde(default)]
    pub tag_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionCreatedResponse {
    pub session: Session,
    pub questions: &'static [Question],
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerRequest {
    #[serde(default)]
    pub question_id: Option<i64>,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub transcript: Option<String>,
}

impl AnswerRequest {
    fn into_submission(self) -> Result<AnswerSubmission, SurveyServiceError> {
        let question_id = self
            .question_id
            .ok_or_else(|| SurveyServiceError::Validation("questionId is required".to_string()))?;
        let value = self
            .value
            .ok_or_else(|| SurveyServiceError::Validation("value is required".to_string()))?;
        Ok(AnswerSubmission {
            question_id,
            value,
            transcript: self.transcript,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurgeQuery {
    #[serde(default)]
    pub older_than_days: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SessionListResponse {
    pub total: usize,
    pub sessions: Vec<Session>,
}

impl IntoResponse for SurveyServiceError {
    fn into_response(self) -> Response {
        let status = match &self {
            SurveyServiceError::Validation(_) => StatusCode::BAD_REQUEST,
            SurveyServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            SurveyServiceError::Conflict { .. } => StatusCode::CONFLICT,
            SurveyServiceError::Repository(_) | SurveyServiceError::Report(_) => {
                error!(error = %self, "survey request failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let payload = json!({
            "error": self.kind(),
            "message": self.to_string(),
        });
        (status, Json(payload)).into_response()
    }
}

fn parse_session_id(raw: &str) -> Result<SessionId, SurveyServiceError> {
    raw.parse::<SessionId>().map_err(|_| {
        SurveyServiceError::Validation(format!("session id '{raw}' must be a positive integer"))
    })
}

fn read_json<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, SurveyServiceError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| SurveyServiceError::Validation(rejection.body_text()))
}

pub(crate) async fn create_handler<R, N>(
    State(service): State<Arc<SessionManager<R, N>>>,
    payload: Result<Json<CreateSessionRequest>, JsonRejection>,
) -> Result<Response, SurveyServiceError>
where
    R: SessionRepository + 'static,
    N: SurveyNotifier + 'static,
{
    let request = read_json(payload)?;
    let tag_id = request
        .tag_id
        .ok_or_else(|| SurveyServiceError::Validation("tagId is required".to_string()))?;
    let session = service.create_session(&tag_id)?;

    let body = SessionCreatedResponse {
        session,
        questions: service.questions().questions(),
    };
    Ok((StatusCode::CREATED, Json(body)).into_response())
}

pub(crate) async fn answer_handler<R, N>(
    State(service): State<Arc<SessionManager<R, N>>>,
    Path(session_id): Path<String>,
    payload: Result<Json<AnswerRequest>, JsonRejection>,
) -> Result<Response, SurveyServiceError>
where
    R: SessionRepository + 'static,
    N: SurveyNotifier + 'static,
{
    let session_id = parse_session_id(&session_id)?;
    let submission = read_json(payload)?.into_submission()?;
    let progress = service.record_answer(session_id, submission)?;
    Ok((StatusCode::OK, Json(progress)).into_response())
}

pub(crate) async fn session_handler<R, N>(
    State(service): State<Arc<SessionManager<R, N>>>,
    Path(session_id): Path<String>,
) -> Result<Response, SurveyServiceError>
where
    R: SessionRepository + 'static,
    N: SurveyNotifier + 'static,
{
    let session = service.get_session(parse_session_id(&session_id)?)?;
    Ok((StatusCode::OK, Json(session)).into_response())
}

pub(crate) async fn summary_handler<R, N>(
    State(service): State<Arc<SessionManager<R, N>>>,
    Path(session_id): Path<String>,
) -> Result<Response, SurveyServiceError>
where
    R: SessionRepository + 'static,
    N: SurveyNotifier + 'static,
{
    let summary = service.summary(parse_session_id(&session_id)?)?;
    Ok((StatusCode::OK, Json(summary)).into_response())
}

pub(crate) async fn list_handler<R, N>(
    State(service): State<Arc<SessionManager<R, N>>>,
    Query(query): Query<ListQuery>,
) -> Result<Response, SurveyServiceError>
where
    R: SessionRepository + 'static,
    N: SurveyNotifier + 'static,
{
    let status = query
        .status
        .filter(|raw| !raw.trim().is_empty())
        .map(|raw| raw.parse::<SessionStatus>())
        .transpose()
        .map_err(|err| SurveyServiceError::Validation(err.to_string()))?;

    let sessions = service.list_sessions(status)?;
    let body = SessionListResponse {
        total: sessions.len(),
        sessions,
    };
    Ok((StatusCode::OK, Json(body)).into_response())
}

pub(crate) async fn delete_handler<R, N>(
    State(service): State<Arc<SessionManager<R, N>>>,
    Path(session_id): Path<String>,
) -> Result<Response, SurveyServiceError>
where
    R: SessionRepository + 'static,
    N: SurveyNotifier + 'static,
{
    let removed = service.delete_session(parse_session_id(&session_id)?)?;
    let payload = json!({
        "sessionId": removed.id,
        "deleted": true,
    });
    Ok((StatusCode::OK, Json(payload)).into_response())
}

pub(crate) async fn purge_handler<R, N>(
    State(service): State<Arc<SessionManager<R, N>>>,
    Query(query): Query<PurgeQuery>,
) -> Result<Response, SurveyServiceError>
where
    R: SessionRepository + 'static,
    N: SurveyNotifier + 'static,
{
    let days = query
        .older_than_days
        .as_deref()
        .map(str::trim)
        .and_then(|raw| raw.parse::<i64>().ok())
        .filter(|days| *days > 0)
        .ok_or_else(|| {
            SurveyServiceError::Validation(
                "olderThanDays must be a positive number of days".to_string(),
            )
        })?;

    let cutoff = Utc::now() - Duration::days(days);
    let removed = service.purge_older_than(cutoff)?;
    let payload = json!({
        "removed": removed,
        "cutoff": cutoff,
    });
    Ok((StatusCode::OK, Json(payload)).into_response())
}

pub(crate) async fn stats_handler<R, N>(
    State(service): State<Arc<SessionManager<R, N>>>,
) -> Result<Response, SurveyServiceError>
where
    R: SessionRepository + 'static,
    N: SurveyNotifier + 'static,
{
    let stats = service.statistics()?;
    Ok((StatusCode::OK, Json(stats)).into_response())
}

pub(crate) async fn report_handler<R, N>(
    State(service): State<Arc<SessionManager<R, N>>>,
) -> Result<Response, SurveyServiceError>
where
    R: SessionRepository + 'static,
    N: SurveyNotifier + 'static,
{
    let csv = service.export_csv()?;
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"report.csv\"",
            ),
        ],
        csv,
    )
        .into_response())
}

pub(crate) async fn tag_state_handler(Path(tag_id): Path<String>) -> Json<serde_json::Value> {
    Json(json!({
        "initialState": mapper::map_tag(&tag_id),
        "mapped": mapper::lookup(&tag_id).is_some(),
        "tagId": tag_id,
    }))
}
