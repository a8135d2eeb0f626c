pub mod manager;

pub use manager::*;

use chrono::{DateTime, Duration, Utc};
use serde::{Serialize, Deserialize};
use thiserror::Error;
use uuid::Uuid;
use validator::Validate;

use crate::survey::{Response, ResponseStore, ValidationError, ValidationReport};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SessionError {
    #[error("Survey session not found: {0}")]
    NotFound(Uuid),
    #[error("Survey session belongs to another user")]
    Forbidden,
    #[error("Survey session already completed: {0}")]
    AlreadyCompleted(Uuid),
    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

pub type Result<T> = std::result::Result<T, SessionError>;

/// Who is filling in the survey. Collected when the session starts.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Validate)]
pub struct Respondent {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[serde(default)]
    #[validate(length(max = 100))]
    pub organization: Option<String>,
    #[serde(default)]
    #[validate(length(max = 100))]
    pub department: Option<String>,
    #[serde(default)]
    #[validate(length(max = 100))]
    pub position: Option<String>,
}

#[derive(Clone, Debug)]
pub struct SurveySession {
    pub id: Uuid,
    pub user_id: String,
    pub respondent: Respondent,
    pub started_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    pub responses: ResponseStore,
}

impl SurveySession {
    pub fn new(user_id: impl Into<String>, respondent: Respondent) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.into(),
            respondent,
            started_at: now,
            last_activity: now,
            responses: ResponseStore::new(),
        }
    }

    pub fn is_idle(&self, now: DateTime<Utc>, idle_ttl: Duration) -> bool {
        now - self.last_activity > idle_ttl
    }

    pub fn progress(&self) -> SessionProgress {
        SessionProgress {
            session_id: self.id,
            answered: self.responses.len(),
            total: self.responses.catalog().len(),
            missing: self.responses.missing().into_iter().map(str::to_string).collect(),
            responses: self.responses.to_responses(),
            started_at: self.started_at,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct SessionProgress {
    pub session_id: Uuid,
    pub answered: usize,
    pub total: usize,
    pub missing: Vec<String>,
    pub responses: Vec<Response>,
    pub started_at: DateTime<Utc>,
}

/// A finished answer set, ready for scoring.
#[derive(Clone, Debug)]
pub struct CompletedSession {
    pub session_id: Uuid,
    pub user_id: String,
    pub respondent: Respondent,
    pub responses: ResponseStore,
    pub report: ValidationReport,
    pub completion_time_seconds: u32,
}
