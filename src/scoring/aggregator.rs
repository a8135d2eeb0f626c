use std::collections::HashMap;

use serde::{Serialize, Deserialize};

use crate::survey::{Dimension, QuestionCatalog};

/// Mean of the answers whose question ID is in `ids`.
///
/// Unanswered IDs are skipped. No answers at all yields 0.0. Values are
/// range-checked when recorded, not here.
pub fn mean_for<V>(ids: &[&str], responses: &HashMap<String, V>) -> f64
where
    V: Copy + Into<f64>,
{
    let (sum, count) = ids
        .iter()
        .filter_map(|id| responses.get(*id))
        .fold((0.0_f64, 0usize), |(sum, count), value| {
            (sum + (*value).into(), count + 1)
        });

    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct DimensionScore {
    pub dimension: Dimension,
    pub value: f64,
}

/// Scores shown to the respondent.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Default)]
pub struct VisibleScores {
    pub people: f64,
    pub production: f64,
    pub care: f64,
    pub challenge: f64,
    pub lmx: f64,
}

/// Influence Gauge scores, 1-5 scale. Admin only.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Default)]
pub struct ConcealedScores {
    pub machiavellianism: f64,
    pub narcissism: f64,
    pub psychopathy: f64,
}

impl ConcealedScores {
    pub fn average(&self) -> f64 {
        (self.machiavellianism + self.narcissism + self.psychopathy) / 3.0
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Default)]
pub struct DimensionScores {
    pub people: f64,
    pub production: f64,
    pub care: f64,
    pub challenge: f64,
    pub lmx: f64,
    pub machiavellianism: f64,
    pub narcissism: f64,
    pub psychopathy: f64,
}

impl DimensionScores {
    /// Score every dimension, looking up membership in the catalog.
    pub fn aggregate<V>(catalog: &QuestionCatalog, responses: &HashMap<String, V>) -> Self
    where
        V: Copy + Into<f64>,
    {
        let score = |dimension| mean_for(&catalog.ids_for(dimension), responses);

        Self {
            people: score(Dimension::People),
            production: score(Dimension::Production),
            care: score(Dimension::Care),
            challenge: score(Dimension::Challenge),
            lmx: score(Dimension::Lmx),
            machiavellianism: score(Dimension::Machiavellianism),
            narcissism: score(Dimension::Narcissism),
            psychopathy: score(Dimension::Psychopathy),
        }
    }

    pub fn get(&self, dimension: Dimension) -> f64 {
        match dimension {
            Dimension::People => self.people,
            Dimension::Production => self.production,
            Dimension::Care => self.care,
            Dimension::Challenge => self.challenge,
            Dimension::Lmx => self.lmx,
            Dimension::Machiavellianism => self.machiavellianism,
            Dimension::Narcissism => self.narcissism,
            Dimension::Psychopathy => self.psychopathy,
        }
    }

    pub fn as_list(&self) -> Vec<DimensionScore> {
        Dimension::ALL
            .iter()
            .map(|d| DimensionScore {
                dimension: *d,
                value: self.get(*d),
            })
            .collect()
    }

    pub fn visible(&self) -> VisibleScores {
        VisibleScores {
            people: self.people,
            production: self.production,
            care: self.care,
            challenge: self.challenge,
            lmx: self.lmx,
        }
    }

    pub fn concealed(&self) -> ConcealedScores {
        ConcealedScores {
            machiavellianism: self.machiavellianism,
            narcissism: self.narcissism,
            psychopathy: self.psychopathy,
        }
    }
}
