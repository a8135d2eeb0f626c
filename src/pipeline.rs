//! Single-pass scoring: responses -> dimension scores -> labels -> insights.

use serde::{Serialize, Deserialize};

use crate::scoring::{self, Classification, DimensionScores, Insights, RiskLevel};
use crate::survey::ResponseStore;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Analysis {
    pub scores: DimensionScores,
    pub classification: Classification,
    pub risk_level: RiskLevel,
    pub insights: Insights,
}

/// Score a response set. Pure; running it twice gives the same result.
pub fn analyze(responses: &ResponseStore) -> Analysis {
    let scores = DimensionScores::aggregate(responses.catalog(), responses.raw());
    let classification = scoring::classify(&scores);
    let risk_level = scoring::overall_risk(&scores.concealed());
    let insights = scoring::insights::generate(&scores, &classification);

    Analysis {
        scores,
        classification,
        risk_level,
        insights,
    }
}
