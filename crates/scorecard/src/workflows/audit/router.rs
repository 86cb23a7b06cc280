use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use super::backend::DataBackend;
use super::service::{AuditService, AuditServiceError, SessionId};

#[derive(Debug, Clone, Deserialize)]
pub struct SelectRequest {
    pub step_id: String,
    pub option: String,
}

/// Router builder exposing the audit session and admin review endpoints.
pub fn audit_router<B>(service: Arc<AuditService<B>>) -> Router
where
    B: DataBackend + ?Sized + 'static,
{
    Router::new()
        .route("/api/v1/audit/questions", get(questions_handler::<B>))
        .route("/api/v1/audit/sessions", post(start_handler::<B>))
        .route(
            "/api/v1/audit/sessions/:session_id",
            get(view_handler::<B>).delete(abandon_handler::<B>),
        )
        .route(
            "/api/v1/audit/sessions/:session_id/select",
            post(select_handler::<B>),
        )
        .route(
            "/api/v1/audit/sessions/:session_id/advance",
            post(advance_handler::<B>),
        )
        .route(
            "/api/v1/audit/sessions/:session_id/retreat",
            post(retreat_handler::<B>),
        )
        .route(
            "/api/v1/audit/sessions/:session_id/reset",
            post(reset_handler::<B>),
        )
        .route("/api/v1/admin/audits", get(submissions_handler::<B>))
        .with_state(service)
}

pub(crate) async fn questions_handler<B>(State(service): State<Arc<AuditService<B>>>) -> Response
where
    B: DataBackend + ?Sized + 'static,
{
    (StatusCode::OK, Json(service.bank())).into_response()
}

pub(crate) async fn start_handler<B>(State(service): State<Arc<AuditService<B>>>) -> Response
where
    B: DataBackend + ?Sized + 'static,
{
    (StatusCode::CREATED, Json(service.start())).into_response()
}

pub(crate) async fn view_handler<B>(
    State(service): State<Arc<AuditService<B>>>,
    Path(session_id): Path<String>,
) -> Response
where
    B: DataBackend + ?Sized + 'static,
{
    view_response(service.view(&SessionId(session_id)))
}

pub(crate) async fn select_handler<B>(
    State(service): State<Arc<AuditService<B>>>,
    Path(session_id): Path<String>,
    Json(request): Json<SelectRequest>,
) -> Response
where
    B: DataBackend + ?Sized + 'static,
{
    view_response(service.select(
        &SessionId(session_id),
        &request.step_id,
        &request.option,
    ))
}

pub(crate) async fn advance_handler<B>(
    State(service): State<Arc<AuditService<B>>>,
    Path(session_id): Path<String>,
) -> Response
where
    B: DataBackend + ?Sized + 'static,
{
    view_response(service.advance(&SessionId(session_id)))
}

pub(crate) async fn retreat_handler<B>(
    State(service): State<Arc<AuditService<B>>>,
    Path(session_id): Path<String>,
) -> Response
where
    B: DataBackend + ?Sized + 'static,
{
    view_response(service.retreat(&SessionId(session_id)))
}

pub(crate) async fn reset_handler<B>(
    State(service): State<Arc<AuditService<B>>>,
    Path(session_id): Path<String>,
) -> Response
where
    B: DataBackend + ?Sized + 'static,
{
    view_response(service.reset(&SessionId(session_id)))
}

pub(crate) async fn abandon_handler<B>(
    State(service): State<Arc<AuditService<B>>>,
    Path(session_id): Path<String>,
) -> Response
where
    B: DataBackend + ?Sized + 'static,
{
    match service.abandon(&SessionId(session_id)) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn submissions_handler<B>(
    State(service): State<Arc<AuditService<B>>>,
    headers: HeaderMap,
) -> Response
where
    B: DataBackend + ?Sized + 'static,
{
    let Some(token) = bearer_token(&headers) else {
        return error_response(AuditServiceError::Unauthorized);
    };

    let auth = match service.authenticate(token).await {
        Ok(auth) => auth,
        Err(err) => return error_response(err),
    };

    match service.submissions(&auth).await {
        Ok(records) => {
            let payload = json!({
                "count": records.len(),
                "submissions": records,
            });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

fn view_response<T: serde::Serialize>(result: Result<T, AuditServiceError>) -> Response {
    match result {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(err) => error_response(err),
    }
}

fn error_response(err: AuditServiceError) -> Response {
    let status = match &err {
        AuditServiceError::UnknownSession(_) => StatusCode::NOT_FOUND,
        AuditServiceError::Unauthorized => StatusCode::UNAUTHORIZED,
        AuditServiceError::Forbidden => StatusCode::FORBIDDEN,
        AuditServiceError::Backend(_) => StatusCode::BAD_GATEWAY,
    };
    let payload = json!({ "error": err.to_string() });
    (status, Json(payload)).into_response()
}
