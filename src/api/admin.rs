//! Admin-only routes. These are the only handlers that return concealed scores.

use axum::extract::{Path, Query, State};
use axum::Json;
use log::info;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{ApiError, ApiResult, AppState};
use crate::assessment::AdminAnalysisView;
use crate::auth::{require_admin, AuthUser};
use crate::database::{PendingSummary, ReconcileReport};
use crate::report::TeamReport;

const DEFAULT_LIMIT: usize = 50;
const MAX_LIMIT: usize = 500;

#[derive(Deserialize, Debug, Default)]
pub struct ListQuery {
    pub limit: Option<usize>,
}

#[derive(Deserialize, Debug, Default)]
pub struct TeamQuery {
    pub department: Option<String>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct FallbackStatus {
    pub count: usize,
    pub pending: Vec<PendingSummary>,
}

pub async fn get_analysis(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<AdminAnalysisView>> {
    require_admin(&user)?;
    let stored = state
        .assessments
        .get(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Analysis not found: {}", id)))?;

    info!("🔐 Admin {} viewed concealed scores of analysis {}", user.user_id, id);
    Ok(Json(AdminAnalysisView::from(&stored)))
}

pub async fn list_analyses(
    user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Vec<AdminAnalysisView>>> {
    require_admin(&user)?;
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let list = state.assessments.list_recent(limit).await?;
    Ok(Json(list.iter().map(AdminAnalysisView::from).collect()))
}

pub async fn team_report(
    user: AuthUser,
    State(state): State<AppState>,
    Path(organization): Path<String>,
    Query(query): Query<TeamQuery>,
) -> ApiResult<Json<TeamReport>> {
    require_admin(&user)?;
    let department = query.department.as_deref().filter(|d| !d.trim().is_empty());
    let report = state
        .assessments
        .team_report(&organization, department)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("No analyses found for organization {}", organization)))?;

    info!("🔐 Admin {} viewed the team report for {}", user.user_id, organization);
    Ok(Json(report))
}

pub async fn fallback_status(user: AuthUser, State(state): State<AppState>) -> ApiResult<Json<FallbackStatus>> {
    require_admin(&user)?;
    let pending = state.assessments.fallback().pending();
    Ok(Json(FallbackStatus {
        count: pending.len(),
        pending,
    }))
}

pub async fn reconcile(user: AuthUser, State(state): State<AppState>) -> ApiResult<Json<ReconcileReport>> {
    require_admin(&user)?;
    info!("Admin {} triggered fallback reconciliation", user.user_id);
    Ok(Json(state.assessments.reconcile().await))
}
