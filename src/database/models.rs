use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ai::{AiInsight, InsightRequest};
use crate::pipeline::Analysis;
use crate::scoring::{BlakeMoutonStyle, CandorQuadrant, DimensionScores, Insights, LmxLevel, RiskLevel};
use crate::survey::{Response, ValidationReport};

/// Respondent and survey-level metadata (`survey_results`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SurveyRecord {
    pub id: Uuid,
    pub user_id: String,
    pub name: String,
    pub email: String,
    pub organization: Option<String>,
    pub department: Option<String>,
    pub position: Option<String>,
    pub completion_time_seconds: Option<i32>,
    pub consistency: f64,
    pub warnings: Vec<String>,
    /// `ResponseStore::answer_pattern` of the submitted answers.
    #[serde(default)]
    pub answer_pattern: String,
    pub created_at: DateTime<Utc>,
}

impl SurveyRecord {
    pub fn new(user_id: impl Into<String>, name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.into(),
            name: name.into(),
            email: email.into(),
            organization: None,
            department: None,
            position: None,
            completion_time_seconds: None,
            consistency: 1.0,
            warnings: Vec::new(),
            answer_pattern: String::new(),
            created_at: Utc::now(),
        }
    }

    pub fn with_report(mut self, report: &ValidationReport) -> Self {
        self.consistency = report.consistency;
        self.warnings = report.warnings.clone();
        self
    }

    pub fn email_matches(&self, email: &str) -> bool {
        self.email.eq_ignore_ascii_case(email.trim())
    }

    pub fn in_team(&self, organization: &str, department: Option<&str>) -> bool {
        self.organization.as_deref() == Some(organization)
            && department.map_or(true, |d| self.department.as_deref() == Some(d))
    }
}

/// Scored result of one survey (`leadership_analysis`).
///
/// Holds the concealed trait scores and the risk level; never serialize it
/// straight to a respondent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisRecord {
    pub id: Uuid,
    pub survey_id: Uuid,
    pub user_id: String,
    pub scores: DimensionScores,
    pub blake_mouton_style: BlakeMoutonStyle,
    pub candor_quadrant: CandorQuadrant,
    pub lmx_level: LmxLevel,
    pub risk_level: RiskLevel,
    pub insights: Insights,
    #[serde(default)]
    pub ai_insights: Vec<AiInsightEntry>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AnalysisRecord {
    pub fn new(survey_id: Uuid, user_id: impl Into<String>, analysis: &Analysis) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            survey_id,
            user_id: user_id.into(),
            scores: analysis.scores,
            blake_mouton_style: analysis.classification.blake_mouton,
            candor_quadrant: analysis.classification.candor,
            lmx_level: analysis.classification.lmx,
            risk_level: analysis.risk_level,
            insights: analysis.insights.clone(),
            ai_insights: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// The part of the record an AI provider is allowed to see.
    pub fn insight_request(&self, context: Option<String>) -> InsightRequest {
        InsightRequest {
            scores: self.scores.visible(),
            blake_mouton: self.blake_mouton_style,
            candor: self.candor_quadrant,
            lmx_level: self.lmx_level,
            context,
        }
    }

    pub fn push_ai_insight(&mut self, entry: AiInsightEntry) {
        self.updated_at = entry.created_at;
        self.ai_insights.push(entry);
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AiInsightEntry {
    #[serde(flatten)]
    pub insight: AiInsight,
    pub created_at: DateTime<Utc>,
}

impl From<AiInsight> for AiInsightEntry {
    fn from(insight: AiInsight) -> Self {
        Self {
            insight,
            created_at: Utc::now(),
        }
    }
}

/// Everything written in one go when a survey is finished.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Submission {
    pub survey: SurveyRecord,
    pub responses: Vec<Response>,
    pub analysis: AnalysisRecord,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct SurveyStats {
    pub total_responses: u64,
    pub average_completion_seconds: Option<f64>,
    pub last_response_at: Option<DateTime<Utc>>,
    pub style_distribution: BTreeMap<String, u64>,
}

impl SurveyStats {
    pub fn from_submissions<'a, I>(submissions: I) -> Self
    where
        I: IntoIterator<Item = &'a Submission>,
    {
        let mut stats = SurveyStats::default();
        let mut completion_total = 0i64;
        let mut completion_count = 0i64;

        for submission in submissions {
            stats.total_responses += 1;
            if let Some(seconds) = submission.survey.completion_time_seconds {
                completion_total += i64::from(seconds);
                completion_count += 1;
            }
            let created = submission.survey.created_at;
            if stats.last_response_at.map_or(true, |last| created > last) {
                stats.last_response_at = Some(created);
            }
            *stats
                .style_distribution
                .entry(submission.analysis.blake_mouton_style.to_string())
                .or_insert(0) += 1;
        }

        if completion_count > 0 {
            stats.average_completion_seconds =
                Some(completion_total as f64 / completion_count as f64);
        }
        stats
    }
}
