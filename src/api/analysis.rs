use axum::extract::{Path, State};
use axum::Json;
use uuid::Uuid;

use super::{ApiError, ApiResult, AppState};
use crate::assessment::{AnalysisView, StoredAnalysis};
use crate::auth::AuthUser;

/// Load an analysis the caller is allowed to read.
pub(crate) async fn load_owned(state: &AppState, user: &AuthUser, id: Uuid) -> ApiResult<StoredAnalysis> {
    let stored = state
        .assessments
        .get(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Analysis not found: {}", id)))?;

    user.ensure_access(&stored.record.user_id)?;
    Ok(stored)
}

pub async fn get_analysis(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<AnalysisView>> {
    let stored = load_owned(&state, &user, id).await?;
    Ok(Json(AnalysisView::from(&stored)))
}

pub async fn list_for_user(
    user: AuthUser,
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<Vec<AnalysisView>>> {
    user.ensure_access(&user_id)?;
    let list = state.assessments.list_for_user(&user_id).await?;
    Ok(Json(list.iter().map(AnalysisView::from).collect()))
}
