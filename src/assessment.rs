//! Scoring plus storage: the path every finished survey takes.
//!
//! Writes go to the configured store and fall back to the local cache when
//! the store refuses them. Reads consult the store first, then the cache.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::database::{
    AiInsightEntry, AnalysisRecord, AssessmentStore, DatabaseError, FallbackCache,
    ReconcileReport, Submission, SurveyRecord, SurveyStats,
};
use crate::pipeline::analyze;
use crate::report::TeamReport;
use crate::scoring::{
    trait_levels, BlakeMoutonStyle, CandorQuadrant, ConcealedScores, Insights, LmxLevel,
    RiskLevel, TraitLevels, VisibleScores,
};
use crate::survey::{ResponseStore, ValidationError};

/// Identical answers from the same email inside this window are refused.
pub const DUPLICATE_WINDOW_HOURS: i64 = 24;
/// This many earlier submissions inside the window earns a warning.
pub const FREQUENT_SUBMISSIONS: usize = 3;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Storage {
    Persisted,
    Fallback,
}

/// A record plus where it currently lives.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredAnalysis {
    pub record: AnalysisRecord,
    pub pending_reconciliation: bool,
}

#[derive(Debug, Clone)]
pub struct SubmissionOutcome {
    pub analysis: StoredAnalysis,
    pub storage: Storage,
}

/// What a respondent may see. No concealed scores, no risk level.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisView {
    pub id: Uuid,
    pub survey_id: Uuid,
    pub user_id: String,
    pub scores: VisibleScores,
    pub blake_mouton_style: BlakeMoutonStyle,
    pub candor_quadrant: CandorQuadrant,
    pub lmx_level: LmxLevel,
    pub insights: Insights,
    pub ai_insights: Vec<AiInsightEntry>,
    pub pending_reconciliation: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&StoredAnalysis> for AnalysisView {
    fn from(stored: &StoredAnalysis) -> Self {
        let r = &stored.record;
        Self {
            id: r.id,
            survey_id: r.survey_id,
            user_id: r.user_id.clone(),
            scores: r.scores.visible(),
            blake_mouton_style: r.blake_mouton_style,
            candor_quadrant: r.candor_quadrant,
            lmx_level: r.lmx_level,
            insights: r.insights.clone(),
            ai_insights: r.ai_insights.clone(),
            pending_reconciliation: stored.pending_reconciliation,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

/// Full record for administrators.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AdminAnalysisView {
    #[serde(flatten)]
    pub analysis: AnalysisView,
    pub concealed_scores: ConcealedScores,
    pub trait_levels: TraitLevels,
    pub risk_level: RiskLevel,
}

impl From<&StoredAnalysis> for AdminAnalysisView {
    fn from(stored: &StoredAnalysis) -> Self {
        let concealed = stored.record.scores.concealed();
        Self {
            analysis: AnalysisView::from(stored),
            concealed_scores: concealed,
            trait_levels: trait_levels(&concealed),
            risk_level: stored.record.risk_level,
        }
    }
}

pub struct AssessmentService {
    store: Arc<dyn AssessmentStore>,
    fallback: Arc<FallbackCache>,
}

impl AssessmentService {
    pub fn new(store: Arc<dyn AssessmentStore>, fallback: Arc<FallbackCache>) -> Self {
        Self { store, fallback }
    }

    pub fn fallback(&self) -> &FallbackCache {
        &self.fallback
    }

    /// Score a complete answer set and store the result.
    ///
    /// Never fails on storage: a refused write lands in the fallback cache.
    pub async fn submit(&self, mut survey: SurveyRecord, responses: &ResponseStore) -> SubmissionOutcome {
        survey.answer_pattern = responses.answer_pattern();
        let analysis = analyze(responses);
        let record = AnalysisRecord::new(survey.id, survey.user_id.clone(), &analysis);

        info!(
            "📊 Survey {} scored: {} / {} / {}",
            survey.id, record.blake_mouton_style, record.candor_quadrant, record.lmx_level
        );

        let submission = Submission {
            survey,
            responses: responses.to_responses(),
            analysis: record,
        };

        match self.store.save_submission(&submission).await {
            Ok(()) => SubmissionOutcome {
                analysis: StoredAnalysis {
                    record: submission.analysis,
                    pending_reconciliation: false,
                },
                storage: Storage::Persisted,
            },
            Err(e) => {
                let record = submission.analysis.clone();
                self.fallback.stash(submission, e.to_string());
                SubmissionOutcome {
                    analysis: StoredAnalysis {
                        record,
                        pending_reconciliation: true,
                    },
                    storage: Storage::Fallback,
                }
            }
        }
    }

    /// Refuse a repeat of identical answers from the same email within the
    /// duplicate window. Returns warnings for frequent submitters, or when the
    /// store could not be checked.
    pub async fn screen_duplicates(&self, email: &str, responses: &ResponseStore) -> Result<Vec<String>, ValidationError> {
        let since = Utc::now() - Duration::hours(DUPLICATE_WINDOW_HOURS);
        let mut warnings = Vec::new();

        let mut recent = self.fallback.recent_surveys(email, since);
        match self.store.recent_surveys(email, since).await {
            Ok(stored) => recent.extend(stored),
            Err(e) => {
                warn!("Duplicate check for {} skipped: {}", email, e);
                warnings.push(format!("Duplicate check could not reach the store: {}", e));
            }
        }

        let pattern = responses.answer_pattern();
        if let Some(earlier) = recent.iter().find(|s| s.answer_pattern == pattern) {
            warn!("❌ Duplicate submission from {} (first at {})", email, earlier.created_at);
            return Err(ValidationError::DuplicateSubmission {
                submitted_at: earlier.created_at,
            });
        }

        if recent.len() >= FREQUENT_SUBMISSIONS {
            warnings.push(format!(
                "{} submissions from this email in the last {} hours",
                recent.len(),
                DUPLICATE_WINDOW_HOURS
            ));
        }
        Ok(warnings)
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<StoredAnalysis>, DatabaseError> {
        let cached = |record| StoredAnalysis {
            record,
            pending_reconciliation: true,
        };

        match self.store.get_analysis(id).await {
            Ok(Some(record)) => Ok(Some(StoredAnalysis {
                record,
                pending_reconciliation: false,
            })),
            Ok(None) => Ok(self.fallback.get_analysis(id).map(cached)),
            Err(e) => match self.fallback.get_analysis(id) {
                Some(record) => Ok(Some(cached(record))),
                None => Err(e),
            },
        }
    }

    pub async fn list_for_user(&self, user_id: &str) -> Result<Vec<StoredAnalysis>, DatabaseError> {
        let cached = self.fallback.list_for_user(user_id);
        let stored = match self.store.list_analyses_for_user(user_id).await {
            Ok(records) => records,
            Err(e) if !cached.is_empty() => {
                warn!("Store unavailable, listing cached analyses only for {}: {}", user_id, e);
                Vec::new()
            }
            Err(e) => return Err(e),
        };

        Ok(merge(stored, cached, usize::MAX))
    }

    pub async fn list_recent(&self, limit: usize) -> Result<Vec<StoredAnalysis>, DatabaseError> {
        let cached = self.fallback.list_all();
        let stored = match self.store.list_analyses(limit).await {
            Ok(records) => records,
            Err(e) if !cached.is_empty() => {
                warn!("Store unavailable, listing cached analyses only: {}", e);
                Vec::new()
            }
            Err(e) => return Err(e),
        };

        Ok(merge(stored, cached, limit))
    }

    /// Roll-up for one organization, optionally narrowed to a department.
    pub async fn team_report(
        &self,
        organization: &str,
        department: Option<&str>,
    ) -> Result<Option<TeamReport>, DatabaseError> {
        let cached = self.fallback.team_analyses(organization, department);
        let mut analyses = match self.store.team_analyses(organization, department).await {
            Ok(records) => records,
            Err(e) if !cached.is_empty() => {
                warn!("Store unavailable, team report for {} uses cached analyses only: {}", organization, e);
                Vec::new()
            }
            Err(e) => return Err(e),
        };
        analyses.extend(cached);

        Ok(TeamReport::build(organization, department, &analyses))
    }

    pub async fn append_ai_insight(&self, id: Uuid, entry: AiInsightEntry) -> Result<(), DatabaseError> {
        if self.fallback.append_ai_insight(id, &entry) {
            return Ok(());
        }
        self.store.append_ai_insight(id, &entry).await
    }

    pub async fn stats(&self) -> Result<SurveyStats, DatabaseError> {
        self.store.stats().await
    }

    pub async fn reconcile(&self) -> ReconcileReport {
        self.fallback.reconcile(self.store.as_ref()).await
    }

    pub async fn ping(&self) -> Result<(), DatabaseError> {
        self.store.ping().await
    }
}

fn merge(stored: Vec<AnalysisRecord>, cached: Vec<AnalysisRecord>, limit: usize) -> Vec<StoredAnalysis> {
    let mut all: Vec<StoredAnalysis> = stored
        .into_iter()
        .map(|record| StoredAnalysis {
            record,
            pending_reconciliation: false,
        })
        .chain(cached.into_iter().map(|record| StoredAnalysis {
            record,
            pending_reconciliation: true,
        }))
        .collect();

    all.sort_by(|a, b| b.record.created_at.cmp(&a.record.created_at));
    all.truncate(limit);
    all
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::AiInsight;
    use crate::database::MemoryStore;
    use crate::survey::catalog;

    fn answers() -> ResponseStore {
        let mut store = ResponseStore::new();
        for (i, q) in catalog().questions().enumerate() {
            store.record(&q.id, (i as u8 % 3) + 2).unwrap();
        }
        store
    }

    fn service() -> (Arc<MemoryStore>, AssessmentService) {
        let store = Arc::new(MemoryStore::new());
        let service = AssessmentService::new(store.clone(), Arc::new(FallbackCache::new()));
        (store, service)
    }

    #[tokio::test]
    async fn submit_persists_when_store_is_up() {
        let (store, service) = service();
        let outcome = service
            .submit(SurveyRecord::new("u1", "Lee", "lee@example.com"), &answers())
            .await;

        assert_eq!(outcome.storage, Storage::Persisted);
        assert_eq!(store.len(), 1);
        let fetched = service.get(outcome.analysis.record.id).await.unwrap().unwrap();
        assert!(!fetched.pending_reconciliation);
    }

    #[tokio::test]
    async fn outage_falls_back_and_reconciles_later() {
        let (store, service) = service();
        store.set_unavailable(true);

        let outcome = service
            .submit(SurveyRecord::new("u1", "Lee", "lee@example.com"), &answers())
            .await;
        let id = outcome.analysis.record.id;
        assert_eq!(outcome.storage, Storage::Fallback);
        assert!(store.is_empty());

        // readable while the store is still down
        let cached = service.get(id).await.unwrap().unwrap();
        assert!(cached.pending_reconciliation);
        assert_eq!(service.list_for_user("u1").await.unwrap().len(), 1);

        service
            .append_ai_insight(id, AiInsightEntry::from(AiInsight::default()))
            .await
            .unwrap();

        store.set_unavailable(false);
        let report = service.reconcile().await;
        assert_eq!(report.reconciled, vec![id]);

        let stored = service.get(id).await.unwrap().unwrap();
        assert!(!stored.pending_reconciliation);
        assert_eq!(stored.record.ai_insights.len(), 1);
    }

    #[tokio::test]
    async fn unknown_ids_and_store_errors() {
        let (store, service) = service();
        assert_eq!(service.get(Uuid::new_v4()).await.unwrap(), None);

        store.set_unavailable(true);
        assert!(service.get(Uuid::new_v4()).await.is_err());
        assert!(service.list_for_user("nobody").await.is_err());
    }

    #[tokio::test]
    async fn recent_list_serves_cache_during_outage() {
        let (store, service) = service();
        service
            .submit(SurveyRecord::new("u1", "Lee", "lee@example.com"), &answers())
            .await;

        store.set_unavailable(true);
        assert!(service.list_recent(10).await.is_err());

        let outcome = service
            .submit(SurveyRecord::new("u2", "Park", "park@example.com"), &answers())
            .await;
        let listed = service.list_recent(10).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].record.id, outcome.analysis.record.id);
        assert!(listed[0].pending_reconciliation);
    }

    #[tokio::test]
    async fn identical_answers_from_the_same_email_are_refused() {
        let (_, service) = service();
        let first = answers();
        assert!(service.screen_duplicates("lee@example.com", &first).await.unwrap().is_empty());
        service
            .submit(SurveyRecord::new("u1", "Lee", "lee@example.com"), &first)
            .await;

        let err = service.screen_duplicates("LEE@example.com", &first).await.unwrap_err();
        assert!(matches!(err, ValidationError::DuplicateSubmission { .. }));

        // a different email is unaffected
        assert!(service.screen_duplicates("kim@example.com", &first).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn frequent_submitters_get_a_warning() {
        let (_, service) = service();
        for seed in 0..FREQUENT_SUBMISSIONS as u8 {
            let mut varied = answers();
            varied.record("lmx_1", seed + 1).unwrap();
            service
                .submit(SurveyRecord::new("u1", "Lee", "lee@example.com"), &varied)
                .await;
        }

        let mut fresh = answers();
        fresh.record("lmx_1", 7).unwrap();
        let warnings = service.screen_duplicates("lee@example.com", &fresh).await.unwrap();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].starts_with("3 submissions"));
    }

    #[tokio::test]
    async fn duplicates_in_the_fallback_cache_count_during_outage() {
        let (store, service) = service();
        store.set_unavailable(true);
        service
            .submit(SurveyRecord::new("u1", "Lee", "lee@example.com"), &answers())
            .await;

        assert!(matches!(
            service.screen_duplicates("lee@example.com", &answers()).await,
            Err(ValidationError::DuplicateSubmission { .. })
        ));

        let mut other = answers();
        other.record("lmx_1", 7).unwrap();
        let warnings = service.screen_duplicates("lee@example.com", &other).await.unwrap();
        assert!(warnings[0].contains("could not reach the store"));
    }

    #[tokio::test]
    async fn team_report_combines_store_and_cache() {
        let (store, service) = service();
        let mut survey = SurveyRecord::new("u1", "Lee", "lee@example.com");
        survey.organization = Some("Acme".to_string());
        service.submit(survey, &answers()).await;

        store.set_unavailable(true);
        let mut survey = SurveyRecord::new("u2", "Park", "park@example.com");
        survey.organization = Some("Acme".to_string());
        service.submit(survey, &answers()).await;
        assert_eq!(service.team_report("Acme", None).await.unwrap().map(|r| r.analyses), Some(1));

        store.set_unavailable(false);
        let report = service.team_report("Acme", None).await.unwrap().unwrap();
        assert_eq!(report.members, 2);
        assert_eq!(report.analyses, 2);
        assert_eq!(service.team_report("Globex", None).await.unwrap(), None);
    }

    #[test]
    fn public_view_hides_concealed_data() {
        let analysis = analyze(&answers());
        let stored = StoredAnalysis {
            record: AnalysisRecord::new(Uuid::new_v4(), "u1", &analysis),
            pending_reconciliation: false,
        };

        let public = serde_json::to_value(AnalysisView::from(&stored)).unwrap();
        let text = public.to_string();
        assert!(!text.contains("machiavellianism"));
        assert!(!text.contains("risk_level"));
        assert!(public["scores"].get("people").is_some());

        let admin = serde_json::to_value(AdminAnalysisView::from(&stored)).unwrap();
        assert!(admin["concealed_scores"].get("narcissism").is_some());
        assert!(admin.get("risk_level").is_some());
        assert_eq!(admin["id"], public["id"]);
    }
}
