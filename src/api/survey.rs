use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use log::info;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{ApiError, ApiResult, AppState};
use crate::assessment::{AnalysisView, Storage};
use crate::auth::AuthUser;
use crate::database::{SurveyRecord, SurveyStats};
use crate::session::{Respondent, SessionProgress};
use crate::survey::{catalog, validate_submission, PublicCatalog, Response, SurveySubmission, ValidationReport};

#[derive(Serialize, Deserialize, Debug)]
pub struct SubmissionResponse {
    pub analysis: AnalysisView,
    pub storage: Storage,
    pub validation: ValidationReport,
}

pub async fn questions() -> Json<PublicCatalog> {
    Json(catalog().public_view())
}

pub async fn start_session(
    user: AuthUser,
    State(state): State<AppState>,
    Json(respondent): Json<Respondent>,
) -> ApiResult<(StatusCode, Json<SessionProgress>)> {
    let progress = state.sessions.start(&user.user_id, respondent)?;
    Ok((StatusCode::CREATED, Json(progress)))
}

pub async fn session_progress(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<SessionProgress>> {
    Ok(Json(state.sessions.get(id, &user.user_id)?))
}

pub async fn record_response(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(response): Json<Response>,
) -> ApiResult<Json<SessionProgress>> {
    let progress = state
        .sessions
        .record(id, &user.user_id, &response.question_id, response.value)?;
    Ok(Json(progress))
}

pub async fn discard_session(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    // ownership check first
    state.sessions.get(id, &user.user_id)?;
    state.sessions.discard(id);
    Ok(StatusCode::NO_CONTENT)
}

pub async fn complete_session(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<(StatusCode, Json<SubmissionResponse>)> {
    let mut completed = state.sessions.complete(id, &user.user_id)?;

    let respondent = completed.respondent;
    let duplicate_warnings = state
        .assessments
        .screen_duplicates(&respondent.email, &completed.responses)
        .await?;
    completed.report.warnings.extend(duplicate_warnings);

    let mut survey = SurveyRecord::new(completed.user_id, respondent.name, respondent.email)
        .with_report(&completed.report);
    survey.organization = respondent.organization;
    survey.department = respondent.department;
    survey.position = respondent.position;
    survey.completion_time_seconds = i32::try_from(completed.completion_time_seconds).ok();

    let outcome = state.assessments.submit(survey, &completed.responses).await;
    info!("Survey session {} stored as analysis {}", id, outcome.analysis.record.id);

    Ok((
        StatusCode::CREATED,
        Json(SubmissionResponse {
            analysis: AnalysisView::from(&outcome.analysis),
            storage: outcome.storage,
            validation: completed.report,
        }),
    ))
}

pub async fn submit(
    user: AuthUser,
    State(state): State<AppState>,
    Json(submission): Json<SurveySubmission>,
) -> ApiResult<(StatusCode, Json<SubmissionResponse>)> {
    let owner = match &submission.user_id {
        Some(id) if id != &user.user_id => {
            if !user.is_admin {
                return Err(ApiError::Forbidden);
            }
            id.clone()
        }
        _ => user.user_id.clone(),
    };

    let mut validated = validate_submission(&submission)?;
    let duplicate_warnings = state
        .assessments
        .screen_duplicates(&submission.email, &validated.responses)
        .await?;
    validated.report.warnings.extend(duplicate_warnings);

    let mut survey = SurveyRecord::new(owner, submission.name, submission.email)
        .with_report(&validated.report);
    survey.organization = submission.organization;
    survey.department = submission.department;
    survey.position = submission.position;
    survey.completion_time_seconds = submission
        .completion_time_seconds
        .and_then(|s| i32::try_from(s).ok());

    let outcome = state.assessments.submit(survey, &validated.responses).await;

    Ok((
        StatusCode::CREATED,
        Json(SubmissionResponse {
            analysis: AnalysisView::from(&outcome.analysis),
            storage: outcome.storage,
            validation: validated.report,
        }),
    ))
}

pub async fn stats(_user: AuthUser, State(state): State<AppState>) -> ApiResult<Json<SurveyStats>> {
    Ok(Json(state.assessments.stats().await?))
}
