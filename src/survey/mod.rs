pub mod questions;
pub mod responses;
pub mod validation;

pub use questions::*;
pub use responses::*;
pub use validation::*;

use chrono::{DateTime, Utc};
use serde::{Serialize, Deserialize};
use thiserror::Error;

/// One scored axis of the assessment.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Dimension {
    #[serde(rename = "people")]
    People,
    #[serde(rename = "production")]
    Production,
    #[serde(rename = "care")]
    Care,
    #[serde(rename = "challenge")]
    Challenge,
    #[serde(rename = "lmx")]
    Lmx,
    #[serde(rename = "hidden_m")]
    Machiavellianism,
    #[serde(rename = "hidden_n")]
    Narcissism,
    #[serde(rename = "hidden_p")]
    Psychopathy,
}

impl Dimension {
    pub const ALL: [Dimension; 8] = [
        Dimension::People,
        Dimension::Production,
        Dimension::Care,
        Dimension::Challenge,
        Dimension::Lmx,
        Dimension::Machiavellianism,
        Dimension::Narcissism,
        Dimension::Psychopathy,
    ];

    /// Influence Gauge traits are scored but never shown to the respondent.
    pub fn is_concealed(&self) -> bool {
        matches!(
            self,
            Dimension::Machiavellianism | Dimension::Narcissism | Dimension::Psychopathy
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Dimension::People => "people",
            Dimension::Production => "production",
            Dimension::Care => "care",
            Dimension::Challenge => "challenge",
            Dimension::Lmx => "lmx",
            Dimension::Machiavellianism => "hidden_m",
            Dimension::Narcissism => "hidden_n",
            Dimension::Psychopathy => "hidden_p",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Dimension::People => "People",
            Dimension::Production => "Production",
            Dimension::Care => "Care",
            Dimension::Challenge => "Challenge",
            Dimension::Lmx => "LMX",
            Dimension::Machiavellianism => "Machiavellianism",
            Dimension::Narcissism => "Narcissism",
            Dimension::Psychopathy => "Psychopathy",
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    BlakeMouton,
    Feedback,
    Lmx,
    InfluenceGauge,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::BlakeMouton => "blake_mouton",
            Category::Feedback => "feedback",
            Category::Lmx => "lmx",
            Category::InfluenceGauge => "influence_gauge",
        }
    }
}

/// Inclusive answer range of a question.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct Scale {
    pub min: u8,
    pub max: u8,
}

impl Scale {
    pub const SEVEN_POINT: Scale = Scale { min: 1, max: 7 };
    pub const FIVE_POINT: Scale = Scale { min: 1, max: 5 };

    pub fn contains(&self, value: u8) -> bool {
        (self.min..=self.max).contains(&value)
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Unknown question: {0}")]
    UnknownQuestion(String),
    #[error("Answer {value} for {question_id} is outside the {min}-{max} scale")]
    OutOfScale {
        question_id: String,
        value: u8,
        min: u8,
        max: u8,
    },
    #[error("Survey incomplete: {answered} of {total} questions answered")]
    Incomplete { answered: usize, total: usize },
    #[error("All answers have the same value")]
    StraightLining,
    #[error("Identical answers were already submitted within 24 hours (at {submitted_at})")]
    DuplicateSubmission { submitted_at: DateTime<Utc> },
    #[error("Invalid field {field}: {message}")]
    InvalidField { field: String, message: String },
    #[error("{} validation errors", .0.len())]
    Multiple(Vec<ValidationError>),
}

impl ValidationError {
    /// Collapse a list of failures; a single failure is returned as is.
    pub fn from_list(mut errors: Vec<ValidationError>) -> Option<ValidationError> {
        match errors.len() {
            0 => None,
            1 => errors.pop(),
            _ => Some(ValidationError::Multiple(errors)),
        }
    }

    pub fn messages(&self) -> Vec<String> {
        match self {
            ValidationError::Multiple(errors) => errors.iter().flat_map(|e| e.messages()).collect(),
            other => vec![other.to_string()],
        }
    }
}

pub type Result<T> = std::result::Result<T, ValidationError>;
