use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use log::{info, warn};
use parking_lot::Mutex;
use uuid::Uuid;

use super::{CompletedSession, Respondent, Result, SessionError, SessionProgress, SurveySession};
use crate::survey::{assess_responses, field_errors, ValidationError};

pub const DEFAULT_IDLE_MINUTES: i64 = 120;

/// In-flight survey sessions. Owned by the application state.
///
/// Completed sessions leave the live map; their ids are remembered for the
/// idle window so a repeated completion is still refused.
pub struct SessionRegistry {
    sessions: Mutex<HashMap<Uuid, SurveySession>>,
    completed: Mutex<HashMap<Uuid, (String, DateTime<Utc>)>>,
    idle_ttl: Duration,
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::with_idle_ttl(Duration::minutes(DEFAULT_IDLE_MINUTES))
    }
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_idle_ttl(idle_ttl: Duration) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            completed: Mutex::new(HashMap::new()),
            idle_ttl,
        }
    }

    pub fn idle_ttl(&self) -> Duration {
        self.idle_ttl
    }

    pub fn start(&self, user_id: &str, respondent: Respondent) -> Result<SessionProgress> {
        if let Some(err) = ValidationError::from_list(field_errors(&respondent)) {
            return Err(err.into());
        }

        let session = SurveySession::new(user_id, respondent);
        let progress = session.progress();
        info!("🆕 Survey session {} started for user {}", session.id, user_id);
        self.sessions.lock().insert(session.id, session);
        Ok(progress)
    }

    /// Error for an id missing from the live map.
    fn check_completed<T>(&self, id: Uuid, user_id: &str) -> Result<T> {
        match self.completed.lock().get(&id) {
            Some((owner, _)) if owner != user_id => {
                warn!("❌ Access denied: session {} does not belong to user {}", id, user_id);
                Err(SessionError::Forbidden)
            }
            Some(_) => Err(SessionError::AlreadyCompleted(id)),
            None => Err(SessionError::NotFound(id)),
        }
    }

    fn with_owned<T>(
        &self,
        id: Uuid,
        user_id: &str,
        f: impl FnOnce(&mut SurveySession) -> Result<T>,
    ) -> Result<T> {
        let mut sessions = self.sessions.lock();
        let Some(session) = sessions.get_mut(&id) else {
            return self.check_completed(id, user_id);
        };
        if session.user_id != user_id {
            warn!("❌ Access denied: session {} does not belong to user {}", id, user_id);
            return Err(SessionError::Forbidden);
        }
        f(session)
    }

    pub fn get(&self, id: Uuid, user_id: &str) -> Result<SessionProgress> {
        self.with_owned(id, user_id, |session| Ok(session.progress()))
    }

    /// Record or overwrite one answer.
    pub fn record(&self, id: Uuid, user_id: &str, question_id: &str, value: u8) -> Result<SessionProgress> {
        self.with_owned(id, user_id, |session| {
            session.responses.record(question_id, value)?;
            session.last_activity = Utc::now();
            Ok(session.progress())
        })
    }

    /// Validate the answer set and close the session.
    pub fn complete(&self, id: Uuid, user_id: &str) -> Result<CompletedSession> {
        let mut sessions = self.sessions.lock();
        let Some(session) = sessions.get(&id) else {
            return self.check_completed(id, user_id);
        };
        if session.user_id != user_id {
            warn!("❌ Access denied: session {} does not belong to user {}", id, user_id);
            return Err(SessionError::Forbidden);
        }

        let now = Utc::now();
        let elapsed = (now - session.started_at).num_seconds().max(0);
        let completion_time_seconds = u32::try_from(elapsed).unwrap_or(u32::MAX);
        let report = assess_responses(&session.responses, Some(completion_time_seconds))?;

        let Some(session) = sessions.remove(&id) else {
            return Err(SessionError::NotFound(id));
        };
        self.completed.lock().insert(id, (session.user_id.clone(), now));
        drop(sessions);

        info!(
            "✅ Survey session {} completed in {}s ({} warnings)",
            id,
            completion_time_seconds,
            report.warnings.len()
        );

        Ok(CompletedSession {
            session_id: id,
            user_id: session.user_id,
            respondent: session.respondent,
            responses: session.responses,
            report,
            completion_time_seconds,
        })
    }

    pub fn discard(&self, id: Uuid) -> bool {
        self.sessions.lock().remove(&id).is_some()
    }

    /// Drop sessions idle for longer than the idle window, and completion
    /// markers older than it. Returns how many open sessions were dropped.
    pub fn evict_idle(&self, now: DateTime<Utc>) -> usize {
        let ttl = self.idle_ttl;
        let evicted = {
            let mut sessions = self.sessions.lock();
            let before = sessions.len();
            sessions.retain(|_, s| !s.is_idle(now, ttl));
            before - sessions.len()
        };
        self.completed.lock().retain(|_, (_, at)| now - *at <= ttl);

        if evicted > 0 {
            info!("🧹 Evicted {} idle survey sessions", evicted);
        }
        evicted
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::survey::catalog;

    fn respondent() -> Respondent {
        Respondent {
            name: "Park".to_string(),
            email: "park@example.com".to_string(),
            organization: None,
            department: None,
            position: None,
        }
    }

    fn answer_all(registry: &SessionRegistry, id: Uuid, user: &str) {
        for (i, q) in catalog().questions().enumerate() {
            registry.record(id, user, &q.id, (i % 4) as u8 + 1).unwrap();
        }
    }

    #[test]
    fn respondent_details_are_validated() {
        let registry = SessionRegistry::new();
        let bad = Respondent {
            email: "not-an-email".to_string(),
            ..respondent()
        };
        assert!(matches!(
            registry.start("u1", bad),
            Err(SessionError::Invalid(ValidationError::InvalidField { .. }))
        ));
        assert!(registry.is_empty());
    }

    #[test]
    fn answers_accumulate_and_overwrite() {
        let registry = SessionRegistry::new();
        let id = registry.start("u1", respondent()).unwrap().session_id;

        registry.record(id, "u1", "bm_people_1", 3).unwrap();
        let progress = registry.record(id, "u1", "bm_people_1", 6).unwrap();
        assert_eq!(progress.answered, 1);
        assert_eq!(progress.total, 43);
        assert_eq!(progress.missing.len(), 42);
        assert_eq!(progress.responses[0].value, 6);
    }

    #[test]
    fn invalid_answers_are_rejected() {
        let registry = SessionRegistry::new();
        let id = registry.start("u1", respondent()).unwrap().session_id;

        assert!(matches!(
            registry.record(id, "u1", "ig_1", 6),
            Err(SessionError::Invalid(ValidationError::OutOfScale { .. }))
        ));
        assert!(matches!(
            registry.record(id, "u1", "nope", 1),
            Err(SessionError::Invalid(ValidationError::UnknownQuestion(_)))
        ));
    }

    #[test]
    fn sessions_are_private_to_their_owner() {
        let registry = SessionRegistry::new();
        let id = registry.start("u1", respondent()).unwrap().session_id;

        assert_eq!(registry.get(id, "u2"), Err(SessionError::Forbidden));
        assert_eq!(registry.record(id, "u2", "lmx_1", 4), Err(SessionError::Forbidden));
        assert!(matches!(registry.get(Uuid::new_v4(), "u1"), Err(SessionError::NotFound(_))));
    }

    #[test]
    fn completion_requires_every_answer() {
        let registry = SessionRegistry::new();
        let id = registry.start("u1", respondent()).unwrap().session_id;
        registry.record(id, "u1", "lmx_1", 4).unwrap();

        assert!(matches!(
            registry.complete(id, "u1"),
            Err(SessionError::Invalid(ValidationError::Incomplete { answered: 1, total: 43 }))
        ));
    }

    #[test]
    fn completed_sessions_are_closed() {
        let registry = SessionRegistry::new();
        let id = registry.start("u1", respondent()).unwrap().session_id;
        answer_all(&registry, id, "u1");

        let done = registry.complete(id, "u1").unwrap();
        assert_eq!(done.responses.len(), 43);
        assert_eq!(done.user_id, "u1");
        // finished instantly, so flagged as too fast
        assert!(done.report.warnings.iter().any(|w| w.contains("seconds")));

        // the live entry is gone but the id still answers 409
        assert!(registry.is_empty());
        assert_eq!(registry.get(id, "u1"), Err(SessionError::AlreadyCompleted(id)));
        assert_eq!(registry.complete(id, "u1").unwrap_err(), SessionError::AlreadyCompleted(id));
        assert_eq!(registry.record(id, "u1", "lmx_1", 4), Err(SessionError::AlreadyCompleted(id)));
        assert_eq!(registry.complete(id, "u2").unwrap_err(), SessionError::Forbidden);
        assert!(!registry.discard(id));
    }

    #[test]
    fn idle_sessions_are_evicted() {
        let registry = SessionRegistry::with_idle_ttl(Duration::minutes(30));
        let stale = registry.start("u1", respondent()).unwrap().session_id;
        let fresh = registry.start("u2", respondent()).unwrap().session_id;
        registry.record(fresh, "u2", "lmx_1", 4).unwrap();

        // nothing is idle yet
        assert_eq!(registry.evict_idle(Utc::now()), 0);
        assert_eq!(registry.len(), 2);

        registry.sessions.lock().get_mut(&stale).unwrap().last_activity = Utc::now() - Duration::minutes(31);
        assert_eq!(registry.evict_idle(Utc::now()), 1);
        assert_eq!(registry.len(), 1);
        assert!(matches!(registry.get(stale, "u1"), Err(SessionError::NotFound(_))));
        assert_eq!(registry.get(fresh, "u2").unwrap().answered, 1);
    }

    #[test]
    fn completion_markers_expire_with_the_idle_window() {
        let registry = SessionRegistry::with_idle_ttl(Duration::minutes(30));
        let id = registry.start("u1", respondent()).unwrap().session_id;
        answer_all(&registry, id, "u1");
        registry.complete(id, "u1").unwrap();

        registry.evict_idle(Utc::now() + Duration::minutes(10));
        assert_eq!(registry.get(id, "u1"), Err(SessionError::AlreadyCompleted(id)));

        registry.evict_idle(Utc::now() + Duration::minutes(31));
        assert!(matches!(registry.get(id, "u1"), Err(SessionError::NotFound(_))));
    }
}
