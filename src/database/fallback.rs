//! Local stand-in for the database when a write fails.
//!
//! Entries live in memory, optionally mirrored to a JSON file, and stay
//! flagged `pending_reconciliation` until an admin replays them against the
//! store. Nothing here retries on its own.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use log::{error, info, warn};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::models::*;
use super::AssessmentStore;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PendingSubmission {
    pub submission: Submission,
    pub reason: String,
    pub cached_at: DateTime<Utc>,
    pub pending_reconciliation: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PendingSummary {
    pub analysis_id: Uuid,
    pub survey_id: Uuid,
    pub user_id: String,
    pub reason: String,
    pub cached_at: DateTime<Utc>,
    pub pending_reconciliation: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ReconcileFailure {
    pub analysis_id: Uuid,
    pub error: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ReconcileReport {
    pub attempted: usize,
    pub reconciled: Vec<Uuid>,
    pub failed: Vec<ReconcileFailure>,
}

#[derive(Default)]
pub struct FallbackCache {
    entries: Mutex<IndexMap<Uuid, PendingSubmission>>,
    mirror_path: Option<PathBuf>,
}

impl FallbackCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache mirrored to `path`. Entries already in the file are loaded.
    pub fn with_mirror(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = Self::read_mirror(&path);
        if !entries.is_empty() {
            warn!(
                "⚠️ Loaded {} unreconciled submissions from {}",
                entries.len(),
                path.display()
            );
        }

        Self {
            entries: Mutex::new(entries),
            mirror_path: Some(path),
        }
    }

    fn read_mirror(path: &Path) -> IndexMap<Uuid, PendingSubmission> {
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return IndexMap::new(),
            Err(e) => {
                error!("Failed to read fallback mirror {}: {}", path.display(), e);
                return IndexMap::new();
            }
        };

        match serde_json::from_slice::<Vec<PendingSubmission>>(&bytes) {
            Ok(list) => list
                .into_iter()
                .map(|p| (p.submission.analysis.id, p))
                .collect(),
            Err(e) => {
                error!("Fallback mirror {} is corrupt: {}", path.display(), e);
                IndexMap::new()
            }
        }
    }

    fn write_mirror(&self) {
        let Some(path) = &self.mirror_path else {
            return;
        };

        let snapshot: Vec<PendingSubmission> = self.entries.lock().values().cloned().collect();
        let result = serde_json::to_vec_pretty(&snapshot)
            .map_err(|e| e.to_string())
            .and_then(|json| std::fs::write(path, json).map_err(|e| e.to_string()));

        if let Err(e) = result {
            error!("Failed to write fallback mirror {}: {}", path.display(), e);
        }
    }

    /// Keep a submission the store refused. Always logged at warn level.
    pub fn stash(&self, submission: Submission, reason: impl Into<String>) {
        let reason = reason.into();
        let id = submission.analysis.id;
        warn!(
            "⚠️ Analysis {} (user {}) saved to local fallback cache, pending reconciliation: {}",
            id, submission.analysis.user_id, reason
        );

        self.entries.lock().insert(
            id,
            PendingSubmission {
                submission,
                reason,
                cached_at: Utc::now(),
                pending_reconciliation: true,
            },
        );
        self.write_mirror();
    }

    pub fn get_analysis(&self, id: Uuid) -> Option<AnalysisRecord> {
        self.entries
            .lock()
            .get(&id)
            .map(|p| p.submission.analysis.clone())
    }

    pub fn list_for_user(&self, user_id: &str) -> Vec<AnalysisRecord> {
        self.entries
            .lock()
            .values()
            .filter(|p| p.submission.analysis.user_id == user_id)
            .map(|p| p.submission.analysis.clone())
            .collect()
    }

    pub fn list_all(&self) -> Vec<AnalysisRecord> {
        self.entries
            .lock()
            .values()
            .map(|p| p.submission.analysis.clone())
            .collect()
    }

    pub fn recent_surveys(&self, email: &str, since: DateTime<Utc>) -> Vec<SurveyRecord> {
        self.entries
            .lock()
            .values()
            .filter(|p| p.submission.survey.email_matches(email) && p.submission.survey.created_at >= since)
            .map(|p| p.submission.survey.clone())
            .collect()
    }

    pub fn team_analyses(&self, organization: &str, department: Option<&str>) -> Vec<AnalysisRecord> {
        self.entries
            .lock()
            .values()
            .filter(|p| p.submission.survey.in_team(organization, department))
            .map(|p| p.submission.analysis.clone())
            .collect()
    }

    /// Returns false when the analysis is not in the cache.
    pub fn append_ai_insight(&self, id: Uuid, entry: &AiInsightEntry) -> bool {
        let appended = match self.entries.lock().get_mut(&id) {
            Some(pending) => {
                pending.submission.analysis.push_ai_insight(entry.clone());
                true
            }
            None => false,
        };
        if appended {
            self.write_mirror();
        }
        appended
    }

    pub fn pending(&self) -> Vec<PendingSummary> {
        self.entries
            .lock()
            .values()
            .map(|p| PendingSummary {
                analysis_id: p.submission.analysis.id,
                survey_id: p.submission.survey.id,
                user_id: p.submission.analysis.user_id.clone(),
                reason: p.reason.clone(),
                cached_at: p.cached_at,
                pending_reconciliation: p.pending_reconciliation,
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Replay cached submissions against `store`; successes leave the cache.
    pub async fn reconcile(&self, store: &dyn AssessmentStore) -> ReconcileReport {
        // the lock is never held across an await
        let snapshot: Vec<Submission> = self
            .entries
            .lock()
            .values()
            .filter(|p| p.pending_reconciliation)
            .map(|p| p.submission.clone())
            .collect();

        let mut report = ReconcileReport {
            attempted: snapshot.len(),
            ..ReconcileReport::default()
        };

        info!("🔄 Reconciling {} cached submissions", snapshot.len());

        for submission in snapshot {
            let id = submission.analysis.id;
            match store.save_submission(&submission).await {
                Ok(()) => {
                    // insights appended while the save was in flight
                    let late: Vec<AiInsightEntry> = self
                        .entries
                        .lock()
                        .shift_remove(&id)
                        .map(|p| {
                            p.submission
                                .analysis
                                .ai_insights
                                .into_iter()
                                .skip(submission.analysis.ai_insights.len())
                                .collect()
                        })
                        .unwrap_or_default();

                    for entry in &late {
                        if let Err(e) = store.append_ai_insight(id, entry).await {
                            error!("Lost AI insight for analysis {} during reconciliation: {}", id, e);
                        }
                    }
                    report.reconciled.push(id);
                }
                Err(e) => {
                    warn!("❌ Reconciliation of analysis {} failed: {}", id, e);
                    report.failed.push(ReconcileFailure {
                        analysis_id: id,
                        error: e.to_string(),
                    });
                }
            }
        }

        self.write_mirror();
        info!(
            "✅ Reconciliation finished: {} stored, {} still pending",
            report.reconciled.len(),
            report.failed.len()
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::AiInsight;
    use crate::database::memory::tests::sample_submission;
    use crate::database::MemoryStore;

    #[test]
    fn stashed_entries_are_readable_and_flagged() {
        let cache = FallbackCache::new();
        let submission = sample_submission("u1", 0);
        let id = submission.analysis.id;
        cache.stash(submission, "connection refused");

        assert!(cache.get_analysis(id).is_some());
        assert_eq!(cache.list_for_user("u1").len(), 1);
        assert!(cache.list_for_user("u2").is_empty());
        let pending = cache.pending();
        assert_eq!(pending.len(), 1);
        assert!(pending[0].pending_reconciliation);
        assert_eq!(pending[0].reason, "connection refused");
    }

    #[test]
    fn ai_insights_append_to_cached_records() {
        let cache = FallbackCache::new();
        let submission = sample_submission("u1", 0);
        let id = submission.analysis.id;
        cache.stash(submission, "down");

        let entry = AiInsightEntry::from(AiInsight::default());
        assert!(cache.append_ai_insight(id, &entry));
        assert!(!cache.append_ai_insight(Uuid::new_v4(), &entry));
        assert_eq!(cache.get_analysis(id).map(|a| a.ai_insights.len()), Some(1));
    }

    #[tokio::test]
    async fn reconcile_moves_entries_into_the_store() {
        let cache = FallbackCache::new();
        let store = MemoryStore::new();
        let first = sample_submission("u1", 0);
        let second = sample_submission("u2", 1);
        let first_id = first.analysis.id;
        cache.stash(first, "down");
        cache.stash(second, "down");

        store.set_unavailable(true);
        let report = cache.reconcile(&store).await;
        assert_eq!(report.attempted, 2);
        assert!(report.reconciled.is_empty());
        assert_eq!(report.failed.len(), 2);
        assert_eq!(cache.len(), 2);

        store.set_unavailable(false);
        let report = cache.reconcile(&store).await;
        assert_eq!(report.reconciled.len(), 2);
        assert!(cache.is_empty());
        assert!(store.get_analysis(first_id).await.unwrap().is_some());
    }

    #[test]
    fn mirror_file_survives_a_restart() {
        let path = std::env::temp_dir().join(format!("l4dx-fallback-{}.json", Uuid::new_v4()));
        let submission = sample_submission("u1", 0);
        let id = submission.analysis.id;
        {
            let cache = FallbackCache::with_mirror(&path);
            cache.stash(submission, "down");
        }

        let reloaded = FallbackCache::with_mirror(&path);
        assert!(reloaded.get_analysis(id).is_some());
        let _ = std::fs::remove_file(&path);
    }
}
