use indexmap::IndexMap;
use once_cell::sync::Lazy;
use serde::{Serialize, Deserialize};

use super::{Category, Dimension, Scale};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Question {
    pub id: String,
    pub text: String,
    pub dimension: Dimension,
    pub category: Category,
    pub scale: Scale,
    #[serde(default)]
    pub is_reverse: bool,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct SectionInfo {
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: Category,
}

/// Question as shown to respondents. Concealed items carry no dimension.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct PublicQuestion {
    pub id: String,
    pub text: String,
    pub category: Category,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimension: Option<Dimension>,
    pub scale: Scale,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct SurveySection {
    pub id: String,
    pub title: String,
    pub description: String,
    pub questions: Vec<PublicQuestion>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct PublicCatalog {
    pub total_questions: usize,
    pub sections: Vec<SurveySection>,
}

#[derive(Debug, Clone)]
pub struct QuestionCatalog {
    questions: IndexMap<String, Question>,
    sections: Vec<SectionInfo>,
}

static STANDARD_CATALOG: Lazy<QuestionCatalog> = Lazy::new(QuestionCatalog::standard);

/// The 43-item Leadership 4Dx survey.
pub fn catalog() -> &'static QuestionCatalog {
    &STANDARD_CATALOG
}

impl QuestionCatalog {
    pub fn new(questions: Vec<Question>, sections: Vec<SectionInfo>) -> Self {
        let questions = questions
            .into_iter()
            .map(|q| (q.id.clone(), q))
            .collect();
        Self { questions, sections }
    }

    pub fn get(&self, id: &str) -> Option<&Question> {
        self.questions.get(id)
    }

    pub fn questions(&self) -> impl Iterator<Item = &Question> {
        self.questions.values()
    }

    pub fn sections(&self) -> &[SectionInfo] {
        &self.sections
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Question IDs belonging to a dimension, in catalog order.
    pub fn ids_for(&self, dimension: Dimension) -> Vec<&str> {
        self.questions
            .values()
            .filter(|q| q.dimension == dimension)
            .map(|q| q.id.as_str())
            .collect()
    }

    pub fn public_view(&self) -> PublicCatalog {
        let sections = self
            .sections
            .iter()
            .map(|section| SurveySection {
                id: section.id.clone(),
                title: section.title.clone(),
                description: section.description.clone(),
                questions: self
                    .questions
                    .values()
                    .filter(|q| q.category == section.category)
                    .map(|q| PublicQuestion {
                        id: q.id.clone(),
                        text: q.text.clone(),
                        category: q.category,
                        dimension: (!q.dimension.is_concealed()).then_some(q.dimension),
                        scale: q.scale,
                    })
                    .collect(),
            })
            .collect();

        PublicCatalog {
            total_questions: self.len(),
            sections,
        }
    }

    fn standard() -> Self {
        use Category::{BlakeMouton, Feedback, InfluenceGauge};
        use Dimension::{Care, Challenge, Machiavellianism, Narcissism, People, Production, Psychopathy};

        let seven = Scale::SEVEN_POINT;
        let five = Scale::FIVE_POINT;

        let items: [(&str, &str, Dimension, Category, Scale, bool); 43] = [
            // Blake-Mouton: concern for people
            ("bm_people_1", "I listen to team members' personal concerns as seriously as I listen to work issues.", People, BlakeMouton, seven, false),
            ("bm_people_2", "After every project I check my team's fatigue and plan time to recover.", People, BlakeMouton, seven, false),
            ("bm_people_3", "When team members set growth goals, I secure the training budget they need first.", People, BlakeMouton, seven, false),
            ("bm_people_4", "In meetings I give quieter members the first chance to speak.", People, BlakeMouton, seven, false),
            ("bm_people_5", "I help people treat their mistakes as learning opportunities rather than reprimanding them.", People, BlakeMouton, seven, false),
            ("bm_people_6", "I use organisational resources to mark team members' birthdays and milestones.", People, BlakeMouton, seven, false),
            ("bm_people_7", "When conflict arises I listen neutrally and look for a solution everyone accepts.", People, BlakeMouton, seven, false),
            ("bm_people_8", "When psychological safety drops I discuss remedies with the team right away.", People, BlakeMouton, seven, false),
            // Blake-Mouton: concern for production
            ("bm_production_1", "I set clear numeric targets and review progress against them regularly.", Production, BlakeMouton, seven, false),
            ("bm_production_2", "When I spot a likely schedule slip I immediately rebalance resources and priorities.", Production, BlakeMouton, seven, false),
            ("bm_production_3", "I standardise repetitive work to make it more efficient.", Production, BlakeMouton, seven, false),
            ("bm_production_4", "When results fall short I ask for a root-cause analysis and a concrete improvement plan.", Production, BlakeMouton, seven, false),
            ("bm_production_5", "I track key metrics consistently for customer and investor reporting.", Production, BlakeMouton, seven, false),
            ("bm_production_6", "Even when we cut working hours I never lower the quality bar.", Production, BlakeMouton, seven, false),
            ("bm_production_7", "I benchmark good practices and build them into the team's process.", Production, BlakeMouton, seven, false),
            ("bm_production_8", "I make unpopular decisions without hesitation when the goal requires it.", Production, BlakeMouton, seven, false),
            // Feedback: care
            ("fb_care_1", "I try to understand my team members' lives and values.", Care, Feedback, seven, false),
            ("fb_care_2", "When someone shows signs of burnout, rebalancing their work is the first thing I consider.", Care, Feedback, seven, false),
            ("fb_care_3", "I point people going through hard times to support beyond their work.", Care, Feedback, seven, false),
            ("fb_care_4", "I respect the person even when giving feedback on a mistake.", Care, Feedback, seven, false),
            // Feedback: challenge
            ("fb_challenge_1", "When performance misses the bar I say so right away, citing concrete numbers.", Challenge, Feedback, seven, false),
            ("fb_challenge_2", "I raise uncomfortable facts directly in meetings rather than avoiding conflict.", Challenge, Feedback, seven, false),
            ("fb_challenge_3", "When my decision turns out wrong I admit it in front of the team and correct it.", Challenge, Feedback, seven, false),
            ("fb_challenge_4", "I end feedback with a concrete action plan instead of \"good\" or \"fine\".", Challenge, Feedback, seven, false),
            // Leader-member exchange
            ("lmx_1", "My leader (or report) trusts me almost completely at work.", Dimension::Lmx, Category::Lmx, seven, false),
            ("lmx_2", "Before important decisions we exchange opinions candidly.", Dimension::Lmx, Category::Lmx, seven, false),
            ("lmx_3", "I am confident we would fully support each other in a crisis.", Dimension::Lmx, Category::Lmx, seven, false),
            ("lmx_4", "When extra effort is needed we volunteer help or ask for it.", Dimension::Lmx, Category::Lmx, seven, false),
            ("lmx_5", "The other person recognises my work as highly professional.", Dimension::Lmx, Category::Lmx, seven, false),
            ("lmx_6", "We give each other fair credit for achievements.", Dimension::Lmx, Category::Lmx, seven, false),
            ("lmx_7", "Our relationship is strong enough to discuss matters outside work.", Dimension::Lmx, Category::Lmx, seven, false),
            // Influence Gauge
            ("ig_1", "I have shared information selectively to get a new proposal approved.", Machiavellianism, InfluenceGauge, five, false),
            ("ig_2", "I have reached my goal by steering a conversation without the other person noticing.", Machiavellianism, InfluenceGauge, five, false),
            ("ig_3", "I have used other people's wants to reach a team goal.", Machiavellianism, InfluenceGauge, five, false),
            ("ig_4", "Even when a lot is at stake, I never use false information.", Machiavellianism, InfluenceGauge, five, true),
            ("ig_5", "When results are good, special incentives for me are only natural.", Narcissism, InfluenceGauge, five, false),
            ("ig_6", "Sometimes getting credit for my work matters more than the team.", Narcissism, InfluenceGauge, five, false),
            ("ig_7", "I don't mind working quietly without recognition.", Narcissism, InfluenceGauge, five, true),
            ("ig_8", "When my opinion is ignored it feels unfair and I show it immediately.", Narcissism, InfluenceGauge, five, false),
            ("ig_9", "As long as the work turns out well, other people's feelings matter less.", Psychopathy, InfluenceGauge, five, false),
            ("ig_10", "In urgent situations I tend to boldly choose the risky option.", Psychopathy, InfluenceGauge, five, false),
            ("ig_11", "I feel little sympathy for losses caused by other people's mistakes.", Psychopathy, InfluenceGauge, five, false),
            ("ig_12", "I always weigh the consequences carefully before deciding.", Psychopathy, InfluenceGauge, five, true),
        ];

        let questions = items
            .iter()
            .map(|(id, text, dimension, category, scale, is_reverse)| Question {
                id: id.to_string(),
                text: text.to_string(),
                dimension: *dimension,
                category: *category,
                scale: *scale,
                is_reverse: *is_reverse,
            })
            .collect();

        let sections = vec![
            SectionInfo {
                id: "blake_mouton".to_string(),
                title: "Leadership style".to_string(),
                description: "Questions about how you balance people and results.".to_string(),
                category: BlakeMouton,
            },
            SectionInfo {
                id: "feedback".to_string(),
                title: "Feedback style".to_string(),
                description: "Questions about how you give and receive feedback.".to_string(),
                category: Feedback,
            },
            SectionInfo {
                id: "lmx".to_string(),
                title: "Leader-member relationship".to_string(),
                description: "Questions about the quality of the relationship between leader and team.".to_string(),
                category: Category::Lmx,
            },
            SectionInfo {
                id: "influence_gauge".to_string(),
                title: "Influence Gauge".to_string(),
                description: "Questions about your patterns of influence.".to_string(),
                category: InfluenceGauge,
            },
        ];

        Self::new(questions, sections)
    }
}
