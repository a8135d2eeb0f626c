use serde::{Serialize, Deserialize};

use super::aggregator::DimensionScores;
use super::classifier::{
    BlakeMoutonStyle, CandorQuadrant, Classification, LmxLevel, MID_CUTOFF,
};

const MAX_PLAN_ITEMS: usize = 5;

/// Rule-based coaching text. Always available, with or without AI.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
pub struct Insights {
    pub strengths: Vec<String>,
    pub improvements: Vec<String>,
    pub recommendations: Vec<String>,
    pub style_description: String,
    pub development_plan: Vec<String>,
}

pub fn generate(scores: &DimensionScores, classification: &Classification) -> Insights {
    let mut insights = Insights {
        style_description: style_description(classification.blake_mouton).to_string(),
        development_plan: development_plan(scores, classification.blake_mouton),
        ..Insights::default()
    };

    match classification.blake_mouton {
        BlakeMoutonStyle::TeamManagement => {
            insights.strengths.push(
                "You pursue your team's growth and its results in balance, the ideal leadership pattern.".to_string(),
            );
            insights.recommendations.push(
                "Keep this balanced approach and build more flexibility for different situations.".to_string(),
            );
        }
        BlakeMoutonStyle::CountryClub => {
            insights.strengths.push(
                "You excel at building relationships and a positive team atmosphere.".to_string(),
            );
            insights.improvements.push(
                "Raise your focus on results to improve how often the team hits its goals.".to_string(),
            );
            insights.recommendations.push(
                "Introduce clear goals and a way of measuring progress to build a results-oriented culture.".to_string(),
            );
        }
        BlakeMoutonStyle::AuthorityCompliance => {
            insights.strengths.push(
                "You drive hard towards goals and deliver results.".to_string(),
            );
            insights.improvements.push(
                "Pay more attention to your team members' emotional needs and personal growth.".to_string(),
            );
            insights.recommendations.push(
                "Hold regular one-on-ones and actively take in feedback from the team.".to_string(),
            );
        }
        BlakeMoutonStyle::MiddleOfTheRoad | BlakeMoutonStyle::Impoverished => {}
    }

    match classification.candor {
        CandorQuadrant::RadicalCandor => {
            insights.strengths.push(
                "Your feedback is direct and caring, which helps people grow.".to_string(),
            );
        }
        CandorQuadrant::RuinousEmpathy => {
            insights.improvements.push(
                "Find the courage to give candid feedback even when it is uncomfortable.".to_string(),
            );
            insights.recommendations.push(
                "Practise specific, constructive feedback and don't hold back advice people need to grow.".to_string(),
            );
        }
        CandorQuadrant::ObnoxiousAggression => {
            insights.improvements.push(
                "Your feedback can land as aggressive; show that you care about the person.".to_string(),
            );
            insights.recommendations.push(
                "Open feedback conversations by acknowledging the person before addressing the problem.".to_string(),
            );
        }
        CandorQuadrant::ManipulativeInsincerity => {
            insights.improvements.push(
                "Feedback is neither caring nor direct; people may not know where they stand.".to_string(),
            );
            insights.recommendations.push(
                "Schedule regular feedback conversations and commit to saying what you actually think, kindly.".to_string(),
            );
        }
    }

    match classification.lmx {
        LmxLevel::High => {
            insights.strengths.push(
                "You have built strong trust with your team, which makes collaboration effective.".to_string(),
            );
        }
        LmxLevel::Low => {
            insights.improvements.push(
                "Invest more time and effort in building trust with your team.".to_string(),
            );
            insights.recommendations.push(
                "Create regular team-building moments and open communication channels to improve relationship quality.".to_string(),
            );
        }
        LmxLevel::Medium => {}
    }

    insights
}

pub fn style_description(style: BlakeMoutonStyle) -> &'static str {
    match style {
        BlakeMoutonStyle::TeamManagement => {
            "Ideal leadership that values both people and results."
        }
        BlakeMoutonStyle::CountryClub => "Friendly, people-centred leadership.",
        BlakeMoutonStyle::AuthorityCompliance => "Results-driven, authoritative leadership.",
        BlakeMoutonStyle::MiddleOfTheRoad => "Moderate leadership that seeks balance.",
        BlakeMoutonStyle::Impoverished => "Passive leadership with low engagement.",
    }
}

fn development_plan(scores: &DimensionScores, style: BlakeMoutonStyle) -> Vec<String> {
    let mut plan: Vec<&str> = match style {
        BlakeMoutonStyle::Impoverished => vec![
            "Join a foundational leadership skills programme.",
            "Learn from a role model through a mentoring programme.",
            "Take full ownership of a small project first.",
        ],
        BlakeMoutonStyle::TeamManagement => vec![
            "Develop your current strengths further.",
            "Mentor other leaders.",
            "Lead improvements to leadership culture across the organisation.",
        ],
        _ => Vec::new(),
    };

    if scores.people < MID_CUTOFF {
        plan.push("Attend an emotional intelligence workshop.");
    }
    if scores.production < MID_CUTOFF {
        plan.push("Learn goal management and performance measurement techniques.");
    }
    if scores.lmx < MID_CUTOFF {
        plan.push("Develop communication skills that build trust.");
    }

    plan.into_iter()
        .take(MAX_PLAN_ITEMS)
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::classifier::classify;

    fn scores(people: f64, production: f64, care: f64, challenge: f64, lmx: f64) -> DimensionScores {
        DimensionScores {
            people,
            production,
            care,
            challenge,
            lmx,
            ..DimensionScores::default()
        }
    }

    #[test]
    fn team_management_gets_fixed_congratulation_and_recommendation() {
        let s = scores(6.2, 7.1, 5.8, 6.5, 6.3);
        let insights = generate(&s, &classify(&s));
        assert_eq!(insights.strengths.len(), 3);
        assert!(insights.strengths[0].contains("in balance"));
        assert_eq!(insights.recommendations.len(), 1);
        assert!(insights.improvements.is_empty());
        assert_eq!(insights.style_description, style_description(BlakeMoutonStyle::TeamManagement));
        assert_eq!(insights.development_plan.len(), 3);
    }

    #[test]
    fn ruinous_empathy_and_low_lmx_add_improvements() {
        let s = scores(6.5, 3.0, 5.0, 2.0, 2.5);
        let insights = generate(&s, &classify(&s));
        // country club, ruinous empathy, low lmx
        assert_eq!(insights.improvements.len(), 3);
        assert_eq!(insights.recommendations.len(), 3);
        assert_eq!(insights.strengths.len(), 1);
    }

    #[test]
    fn development_plan_is_capped() {
        let s = scores(1.0, 1.0, 1.0, 1.0, 1.0);
        let insights = generate(&s, &classify(&s));
        assert_eq!(insights.development_plan.len(), MAX_PLAN_ITEMS);
        assert!(insights.development_plan[0].contains("foundational"));
    }

    #[test]
    fn generation_is_deterministic() {
        let s = scores(4.5, 5.0, 3.0, 4.5, 4.0);
        let c = classify(&s);
        assert_eq!(generate(&s, &c), generate(&s, &c));
    }
}
