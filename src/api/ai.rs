use axum::extract::{Path, Query, State};
use axum::Json;
use log::info;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::analysis::load_owned;
use super::{ApiError, ApiResult, AppState};
use crate::ai::{compare, ProviderComparison, ProviderInfo};
use crate::auth::AuthUser;
use crate::database::AiInsightEntry;

#[derive(Deserialize, Debug, Default)]
pub struct InsightQuery {
    pub provider: Option<String>,
    pub context: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct CompareRequest {
    pub analysis_id: Uuid,
    #[serde(default)]
    pub providers: Vec<String>,
    #[serde(default)]
    pub context: Option<String>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct CompareResponse {
    pub analysis_id: Uuid,
    pub results: Vec<ProviderComparison>,
}

/// Ask one provider for coaching text and append it to the analysis.
pub async fn generate_insight(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<InsightQuery>,
) -> ApiResult<Json<AiInsightEntry>> {
    let stored = load_owned(&state, &user, id).await?;
    let provider = state.providers.get(query.provider.as_deref())?;

    info!("🤖 Generating {} insight for analysis {}", provider.name(), id);
    let request = stored.record.insight_request(query.context);
    let insight = provider.generate(&request).await?;

    let entry = AiInsightEntry::from(insight);
    state.assessments.append_ai_insight(id, entry.clone()).await?;
    Ok(Json(entry))
}

pub async fn providers(_user: AuthUser, State(state): State<AppState>) -> Json<Vec<ProviderInfo>> {
    Json(state.providers.list())
}

/// Same request to several providers at once; nothing is stored.
pub async fn compare_providers(
    user: AuthUser,
    State(state): State<AppState>,
    Json(body): Json<CompareRequest>,
) -> ApiResult<Json<CompareResponse>> {
    let stored = load_owned(&state, &user, body.analysis_id).await?;
    let providers = state.providers.select(&body.providers)?;
    if providers.is_empty() {
        return Err(ApiError::BadRequest("No AI providers configured".to_string()));
    }

    let request = stored.record.insight_request(body.context);
    let results = compare(&providers, &request).await;

    Ok(Json(CompareResponse {
        analysis_id: body.analysis_id,
        results,
    }))
}
