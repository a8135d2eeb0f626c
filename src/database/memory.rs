use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use log::{debug, info};
use parking_lot::RwLock;
use uuid::Uuid;

use super::models::*;
use super::{AssessmentStore, DatabaseError, Result};

/// In-process store for tests and `STORAGE_BACKEND=memory`.
///
/// `set_unavailable(true)` makes every call fail the way a dropped database
/// connection would.
#[derive(Default)]
pub struct MemoryStore {
    submissions: RwLock<IndexMap<Uuid, Submission>>,
    unavailable: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        info!("Using in-memory assessment store");
        Self::default()
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.submissions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn responses_for(&self, analysis_id: Uuid) -> Option<usize> {
        self.submissions.read().get(&analysis_id).map(|s| s.responses.len())
    }

    fn check(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(DatabaseError::ConnectionFailed("memory store marked unavailable".to_string()));
        }
        Ok(())
    }

    fn newest_first<'a>(records: impl Iterator<Item = &'a Submission>) -> Vec<AnalysisRecord> {
        let mut list: Vec<AnalysisRecord> = records.map(|s| s.analysis.clone()).collect();
        list.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        list
    }
}

#[async_trait]
impl AssessmentStore for MemoryStore {
    async fn save_submission(&self, submission: &Submission) -> Result<()> {
        self.check()?;
        debug!("Storing analysis {} in memory", submission.analysis.id);
        self.submissions
            .write()
            .insert(submission.analysis.id, submission.clone());
        Ok(())
    }

    async fn get_analysis(&self, id: Uuid) -> Result<Option<AnalysisRecord>> {
        self.check()?;
        Ok(self.submissions.read().get(&id).map(|s| s.analysis.clone()))
    }

    async fn list_analyses_for_user(&self, user_id: &str) -> Result<Vec<AnalysisRecord>> {
        self.check()?;
        let submissions = self.submissions.read();
        Ok(Self::newest_first(
            submissions.values().filter(|s| s.analysis.user_id == user_id),
        ))
    }

    async fn list_analyses(&self, limit: usize) -> Result<Vec<AnalysisRecord>> {
        self.check()?;
        let submissions = self.submissions.read();
        let mut list = Self::newest_first(submissions.values());
        list.truncate(limit);
        Ok(list)
    }

    async fn append_ai_insight(&self, id: Uuid, entry: &AiInsightEntry) -> Result<()> {
        self.check()?;
        let mut submissions = self.submissions.write();
        let submission = submissions.get_mut(&id).ok_or(DatabaseError::NotFound(id))?;
        submission.analysis.push_ai_insight(entry.clone());
        Ok(())
    }

    async fn recent_surveys(&self, email: &str, since: DateTime<Utc>) -> Result<Vec<SurveyRecord>> {
        self.check()?;
        Ok(self
            .submissions
            .read()
            .values()
            .filter(|s| s.survey.email_matches(email) && s.survey.created_at >= since)
            .map(|s| s.survey.clone())
            .collect())
    }

    async fn team_analyses(&self, organization: &str, department: Option<&str>) -> Result<Vec<AnalysisRecord>> {
        self.check()?;
        let submissions = self.submissions.read();
        Ok(Self::newest_first(
            submissions.values().filter(|s| s.survey.in_team(organization, department)),
        ))
    }

    async fn stats(&self) -> Result<SurveyStats> {
        self.check()?;
        Ok(SurveyStats::from_submissions(self.submissions.read().values()))
    }

    async fn ping(&self) -> Result<()> {
        self.check()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::ai::AiInsight;
    use crate::pipeline::analyze;
    use crate::survey::{catalog, ResponseStore};

    pub fn sample_submission(user_id: &str, seed: u8) -> Submission {
        let mut store = ResponseStore::new();
        for (i, q) in catalog().questions().enumerate() {
            let value = ((i as u8 + seed) % q.scale.max) + 1;
            store.record(&q.id, value).unwrap();
        }
        let analysis = analyze(&store);
        let mut survey = SurveyRecord::new(user_id, "Kim", "kim@example.com");
        survey.completion_time_seconds = Some(300 + seed as i32);
        let record = AnalysisRecord::new(survey.id, user_id, &analysis);
        Submission {
            survey,
            responses: store.to_responses(),
            analysis: record,
        }
    }

    #[tokio::test]
    async fn saves_and_reads_back() {
        let store = MemoryStore::new();
        let submission = sample_submission("u1", 0);
        let id = submission.analysis.id;
        store.save_submission(&submission).await.unwrap();

        assert_eq!(store.get_analysis(id).await.unwrap(), Some(submission.analysis.clone()));
        assert_eq!(store.responses_for(id), Some(43));
        assert_eq!(store.list_analyses_for_user("u1").await.unwrap().len(), 1);
        assert!(store.list_analyses_for_user("u2").await.unwrap().is_empty());
        assert_eq!(store.get_analysis(Uuid::new_v4()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn ai_insights_are_appended() {
        let store = MemoryStore::new();
        let submission = sample_submission("u1", 1);
        let id = submission.analysis.id;
        store.save_submission(&submission).await.unwrap();

        let entry = AiInsightEntry::from(AiInsight {
            provider: "openai".to_string(),
            ..AiInsight::default()
        });
        store.append_ai_insight(id, &entry).await.unwrap();
        store.append_ai_insight(id, &entry).await.unwrap();

        let record = store.get_analysis(id).await.unwrap().unwrap();
        assert_eq!(record.ai_insights.len(), 2);
        assert_eq!(record.scores, submission.analysis.scores);

        let missing = store.append_ai_insight(Uuid::new_v4(), &entry).await;
        assert!(matches!(missing, Err(DatabaseError::NotFound(_))));
    }

    #[tokio::test]
    async fn recent_surveys_match_email_and_window() {
        let store = MemoryStore::new();
        let mut old = sample_submission("u1", 0);
        old.survey.created_at = Utc::now() - chrono::Duration::hours(30);
        store.save_submission(&old).await.unwrap();
        store.save_submission(&sample_submission("u1", 1)).await.unwrap();

        let since = Utc::now() - chrono::Duration::hours(24);
        assert_eq!(store.recent_surveys("KIM@example.com", since).await.unwrap().len(), 1);
        assert!(store.recent_surveys("other@example.com", since).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn team_analyses_filter_by_organization_and_department() {
        let store = MemoryStore::new();
        for (user, department) in [("u1", "Sales"), ("u2", "Ops"), ("u3", "Sales")] {
            let mut submission = sample_submission(user, 0);
            submission.survey.organization = Some("Acme".to_string());
            submission.survey.department = Some(department.to_string());
            store.save_submission(&submission).await.unwrap();
        }
        store.save_submission(&sample_submission("u4", 0)).await.unwrap();

        assert_eq!(store.team_analyses("Acme", None).await.unwrap().len(), 3);
        assert_eq!(store.team_analyses("Acme", Some("Sales")).await.unwrap().len(), 2);
        assert!(store.team_analyses("Globex", None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn stats_and_outage() {
        let store = MemoryStore::new();
        store.save_submission(&sample_submission("u1", 0)).await.unwrap();
        store.save_submission(&sample_submission("u2", 2)).await.unwrap();

        let stats = store.stats().await.unwrap();
        assert_eq!(stats.total_responses, 2);
        assert_eq!(stats.average_completion_seconds, Some(301.0));
        assert_eq!(stats.style_distribution.values().sum::<u64>(), 2);

        store.set_unavailable(true);
        assert!(store.ping().await.is_err());
        assert!(store.save_submission(&sample_submission("u3", 0)).await.is_err());
        assert!(matches!(store.list_analyses(10).await, Err(DatabaseError::ConnectionFailed(_))));
    }
}
