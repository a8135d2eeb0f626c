pub mod fallback;
pub mod memory;
pub mod models;
pub mod postgres;

pub use fallback::{FallbackCache, PendingSummary, ReconcileReport};
pub use memory::MemoryStore;
pub use models::{AiInsightEntry, AnalysisRecord, Submission, SurveyRecord, SurveyStats};
pub use postgres::DatabaseManager;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
    #[error("Query failed: {0}")]
    QueryFailed(String),
    #[error("Analysis not found: {0}")]
    NotFound(Uuid),
    #[error("Invalid record: {0}")]
    InvalidRecord(String),
}

pub type Result<T> = std::result::Result<T, DatabaseError>;

/// Durable storage for submissions and their analyses.
#[async_trait]
pub trait AssessmentStore: Send + Sync {
    /// Write the survey, its responses and the analysis atomically.
    async fn save_submission(&self, submission: &Submission) -> Result<()>;

    async fn get_analysis(&self, id: Uuid) -> Result<Option<AnalysisRecord>>;

    /// Newest first.
    async fn list_analyses_for_user(&self, user_id: &str) -> Result<Vec<AnalysisRecord>>;

    /// Newest first, at most `limit` records.
    async fn list_analyses(&self, limit: usize) -> Result<Vec<AnalysisRecord>>;

    /// Append-only; fails with `NotFound` for an unknown analysis.
    async fn append_ai_insight(&self, id: Uuid, entry: &AiInsightEntry) -> Result<()>;

    /// Surveys submitted from `email` (case-insensitive) since `since`.
    async fn recent_surveys(&self, email: &str, since: DateTime<Utc>) -> Result<Vec<SurveyRecord>>;

    /// Analyses whose survey names this organization (and department, when given).
    async fn team_analyses(&self, organization: &str, department: Option<&str>) -> Result<Vec<AnalysisRecord>>;

    async fn stats(&self) -> Result<SurveyStats>;

    async fn ping(&self) -> Result<()>;
}
