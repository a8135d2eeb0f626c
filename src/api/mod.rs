//! HTTP surface.

pub mod admin;
pub mod ai;
pub mod analysis;
pub mod survey;

use std::sync::Arc;

use axum::extract::{FromRef, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use log::{error, warn};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

use crate::ai::{AiError, ProviderRegistry};
use crate::assessment::AssessmentService;
use crate::auth::{AuthConfig, AuthError};
use crate::database::DatabaseError;
use crate::session::{SessionError, SessionRegistry};
use crate::survey::ValidationError;

#[derive(Clone)]
pub struct AppState {
    pub assessments: Arc<AssessmentService>,
    pub sessions: Arc<SessionRegistry>,
    pub providers: Arc<ProviderRegistry>,
    pub auth: Arc<AuthConfig>,
}

impl FromRef<AppState> for Arc<AuthConfig> {
    fn from_ref(state: &AppState) -> Self {
        state.auth.clone()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/survey/questions", get(survey::questions))
        .route("/api/survey/sessions", post(survey::start_session))
        .route(
            "/api/survey/sessions/:id",
            get(survey::session_progress).delete(survey::discard_session),
        )
        .route("/api/survey/sessions/:id/responses", put(survey::record_response))
        .route("/api/survey/sessions/:id/complete", post(survey::complete_session))
        .route("/api/survey/submit", post(survey::submit))
        .route("/api/survey/stats", get(survey::stats))
        .route("/api/analysis/user/:user_id", get(analysis::list_for_user))
        .route("/api/analysis/:id", get(analysis::get_analysis))
        .route("/api/analysis/:id/ai-insights", post(ai::generate_insight))
        .route("/api/ai/providers", get(ai::providers))
        .route("/api/ai/compare", post(ai::compare_providers))
        .route("/api/admin/analysis/:id", get(admin::get_analysis))
        .route("/api/admin/analyses", get(admin::list_analyses))
        .route("/api/admin/reports/team/:organization", get(admin::team_report))
        .route("/api/admin/fallback", get(admin::fallback_status))
        .route("/api/admin/fallback/reconcile", post(admin::reconcile))
        .with_state(state)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    store: &'static str,
    pending_fallback: usize,
    ai_providers: usize,
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let store_up = match state.assessments.ping().await {
        Ok(()) => true,
        Err(e) => {
            warn!("Health check: store unavailable: {}", e);
            false
        }
    };

    Json(HealthResponse {
        status: if store_up { "ok" } else { "degraded" },
        store: if store_up { "up" } else { "down" },
        pending_fallback: state.assessments.fallback().len(),
        ai_providers: state.providers.list().len(),
    })
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Validation failed")]
    Validation(Vec<String>),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("Access denied")]
    Forbidden,
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    BadGateway(String),
    #[error("{0}")]
    Unavailable(String),
    #[error("{0}")]
    Internal(String),
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::BadGateway(_) => StatusCode::BAD_GATEWAY,
            ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed ({}): {}", status, self);
        }

        let body = match &self {
            ApiError::Validation(details) => json!({ "error": self.to_string(), "details": details }),
            _ => json!({ "error": self.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::DuplicateSubmission { .. } => ApiError::Conflict(err.to_string()),
            _ => ApiError::Validation(err.messages()),
        }
    }
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::NotFound(_) => ApiError::NotFound(err.to_string()),
            SessionError::Forbidden => ApiError::Forbidden,
            SessionError::AlreadyCompleted(_) => ApiError::Conflict(err.to_string()),
            SessionError::Invalid(e) => e.into(),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingToken | AuthError::InvalidToken(_) => ApiError::Unauthorized(err.to_string()),
            AuthError::Forbidden => ApiError::Forbidden,
        }
    }
}

impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::NotFound(_) => ApiError::NotFound(err.to_string()),
            DatabaseError::InvalidRecord(_) => ApiError::Internal(err.to_string()),
            DatabaseError::ConnectionFailed(_) | DatabaseError::QueryFailed(_) => {
                ApiError::Unavailable(format!("Storage unavailable: {}", err))
            }
        }
    }
}

impl From<AiError> for ApiError {
    fn from(err: AiError) -> Self {
        match err {
            AiError::NotConfigured(_) => ApiError::BadRequest(err.to_string()),
            _ => ApiError::BadGateway(err.to_string()),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        ApiError::from(self).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_map_to_status_codes() {
        let cases = [
            (ApiError::from(ValidationError::StraightLining), StatusCode::UNPROCESSABLE_ENTITY),
            (
                ApiError::from(ValidationError::DuplicateSubmission { submitted_at: chrono::Utc::now() }),
                StatusCode::CONFLICT,
            ),
            (ApiError::from(AuthError::MissingToken), StatusCode::UNAUTHORIZED),
            (ApiError::from(AuthError::Forbidden), StatusCode::FORBIDDEN),
            (ApiError::from(DatabaseError::QueryFailed("x".into())), StatusCode::SERVICE_UNAVAILABLE),
            (ApiError::from(DatabaseError::NotFound(uuid::Uuid::nil())), StatusCode::NOT_FOUND),
            (ApiError::from(AiError::EmptyResponse("openai".into())), StatusCode::BAD_GATEWAY),
            (ApiError::from(AiError::NotConfigured("gemini".into())), StatusCode::BAD_REQUEST),
            (
                ApiError::from(SessionError::AlreadyCompleted(uuid::Uuid::nil())),
                StatusCode::CONFLICT,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(err.status(), status, "{:?}", err);
        }
    }

    #[test]
    fn validation_lists_every_message() {
        let err = ApiError::from(ValidationError::Multiple(vec![
            ValidationError::UnknownQuestion("x".into()),
            ValidationError::StraightLining,
        ]));
        match err {
            ApiError::Validation(details) => assert_eq!(details.len(), 2),
            other => panic!("unexpected {:?}", other),
        }
    }
}
