//! Organization and team roll-ups over stored analyses.
//!
//! A team report carries the risk distribution, so it is admin-only.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::database::AnalysisRecord;
use crate::scoring::RiskLevel;

pub const MAX_TEAM_RECOMMENDATIONS: usize = 5;
/// Fewer distinct Blake-Mouton styles than this counts as a narrow team.
pub const MIN_STYLE_VARIETY: usize = 3;
/// Team averages below this trigger a targeted recommendation.
pub const LOW_TEAM_AVERAGE: f64 = 4.0;
/// Share of high-risk analyses above which coaching is recommended.
pub const HIGH_RISK_COACHING_RATIO: f64 = 0.3;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TeamHealth {
    Excellent,
    Good,
    Moderate,
    NeedsAttention,
}

impl TeamHealth {
    pub fn assess(averages: &TeamAverages, high_risk_ratio: f64) -> Self {
        let overall = averages.overall();
        if overall >= 5.0 && high_risk_ratio < 0.2 {
            TeamHealth::Excellent
        } else if overall >= 4.0 && high_risk_ratio < 0.3 {
            TeamHealth::Good
        } else if overall >= 3.0 && high_risk_ratio < 0.5 {
            TeamHealth::Moderate
        } else {
            TeamHealth::NeedsAttention
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
pub struct TeamAverages {
    pub people: f64,
    pub production: f64,
    pub lmx: f64,
}

impl TeamAverages {
    pub fn overall(&self) -> f64 {
        (self.people + self.production + self.lmx) / 3.0
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TeamReport {
    pub organization: String,
    pub department: Option<String>,
    /// Distinct respondents.
    pub members: usize,
    pub analyses: usize,
    pub style_distribution: BTreeMap<String, u64>,
    pub risk_distribution: BTreeMap<String, u64>,
    pub average_scores: TeamAverages,
    pub team_health: TeamHealth,
    pub recommendations: Vec<String>,
}

impl TeamReport {
    /// `None` when there is nothing to report on.
    pub fn build(organization: &str, department: Option<&str>, analyses: &[AnalysisRecord]) -> Option<Self> {
        if analyses.is_empty() {
            return None;
        }

        let members: BTreeSet<&str> = analyses.iter().map(|a| a.user_id.as_str()).collect();

        let mut styles: BTreeMap<String, u64> = BTreeMap::new();
        let mut risks: BTreeMap<String, u64> = [RiskLevel::Low, RiskLevel::Medium, RiskLevel::High]
            .iter()
            .map(|r| (r.as_str().to_string(), 0))
            .collect();
        let mut totals = TeamAverages::default();

        for analysis in analyses {
            *styles.entry(analysis.blake_mouton_style.to_string()).or_insert(0) += 1;
            *risks.entry(analysis.risk_level.as_str().to_string()).or_insert(0) += 1;
            totals.people += analysis.scores.people;
            totals.production += analysis.scores.production;
            totals.lmx += analysis.scores.lmx;
        }

        let n = analyses.len() as f64;
        let averages = TeamAverages {
            people: totals.people / n,
            production: totals.production / n,
            lmx: totals.lmx / n,
        };

        let high = risks.get(RiskLevel::High.as_str()).copied().unwrap_or(0);
        let high_risk_ratio = high as f64 / n;

        Some(Self {
            organization: organization.to_string(),
            department: department.map(str::to_string),
            members: members.len(),
            analyses: analyses.len(),
            team_health: TeamHealth::assess(&averages, high_risk_ratio),
            recommendations: team_recommendations(styles.len(), high_risk_ratio, &averages),
            style_distribution: styles,
            risk_distribution: risks,
            average_scores: averages,
        })
    }
}

fn team_recommendations(style_count: usize, high_risk_ratio: f64, averages: &TeamAverages) -> Vec<String> {
    let mut recommendations = Vec::new();

    if style_count < MIN_STYLE_VARIETY {
        recommendations.push("Introduce training that broadens the range of leadership styles in the team".to_string());
    }
    if high_risk_ratio > HIGH_RISK_COACHING_RATIO {
        recommendations.push("Run focused coaching for members with a high influence risk".to_string());
    }
    if averages.people < LOW_TEAM_AVERAGE {
        recommendations.push("Improve working relationships through team-building activities".to_string());
    }
    if averages.production < LOW_TEAM_AVERAGE {
        recommendations.push("Strengthen goal setting and performance management".to_string());
    }
    if averages.lmx < LOW_TEAM_AVERAGE {
        recommendations.push("Hold leader-member trust-building workshops".to_string());
    }

    recommendations.truncate(MAX_TEAM_RECOMMENDATIONS);
    recommendations
}
