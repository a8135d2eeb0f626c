use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Deserialize};
use thiserror::Error;

use super::aggregator::{ConcealedScores, DimensionScore, DimensionScores};
use crate::survey::Dimension;

/// Upper band cutoff on the seven point scale.
pub const HIGH_CUTOFF: f64 = 6.0;
/// Lower band cutoff on the seven point scale.
pub const MID_CUTOFF: f64 = 4.0;

/// Risk cutoffs on the averaged 1-5 Influence Gauge scores.
pub const RISK_HIGH_CUTOFF: f64 = 3.5;
pub const RISK_MEDIUM_CUTOFF: f64 = 2.5;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BlakeMoutonStyle {
    #[serde(rename = "Team Management")]
    TeamManagement,
    #[serde(rename = "Country Club")]
    CountryClub,
    #[serde(rename = "Authority-Compliance")]
    AuthorityCompliance,
    #[serde(rename = "Middle-of-the-Road")]
    MiddleOfTheRoad,
    #[serde(rename = "Impoverished")]
    Impoverished,
}

impl BlakeMoutonStyle {
    pub fn classify(people: f64, production: f64) -> Self {
        if people >= HIGH_CUTOFF && production >= HIGH_CUTOFF {
            BlakeMoutonStyle::TeamManagement
        } else if people >= HIGH_CUTOFF {
            BlakeMoutonStyle::CountryClub
        } else if production >= HIGH_CUTOFF {
            BlakeMoutonStyle::AuthorityCompliance
        } else if people >= MID_CUTOFF && production >= MID_CUTOFF {
            BlakeMoutonStyle::MiddleOfTheRoad
        } else {
            BlakeMoutonStyle::Impoverished
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BlakeMoutonStyle::TeamManagement => "Team Management",
            BlakeMoutonStyle::CountryClub => "Country Club",
            BlakeMoutonStyle::AuthorityCompliance => "Authority-Compliance",
            BlakeMoutonStyle::MiddleOfTheRoad => "Middle-of-the-Road",
            BlakeMoutonStyle::Impoverished => "Impoverished",
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CandorQuadrant {
    #[serde(rename = "Radical Candor")]
    RadicalCandor,
    #[serde(rename = "Ruinous Empathy")]
    RuinousEmpathy,
    #[serde(rename = "Obnoxious Aggression")]
    ObnoxiousAggression,
    #[serde(rename = "Manipulative Insincerity")]
    ManipulativeInsincerity,
}

impl CandorQuadrant {
    pub fn classify(care: f64, challenge: f64) -> Self {
        match (care >= MID_CUTOFF, challenge >= MID_CUTOFF) {
            (true, true) => CandorQuadrant::RadicalCandor,
            (true, false) => CandorQuadrant::RuinousEmpathy,
            (false, true) => CandorQuadrant::ObnoxiousAggression,
            (false, false) => CandorQuadrant::ManipulativeInsincerity,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CandorQuadrant::RadicalCandor => "Radical Candor",
            CandorQuadrant::RuinousEmpathy => "Ruinous Empathy",
            CandorQuadrant::ObnoxiousAggression => "Obnoxious Aggression",
            CandorQuadrant::ManipulativeInsincerity => "Manipulative Insincerity",
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LmxLevel {
    #[serde(rename = "High-Quality Exchange")]
    High,
    #[serde(rename = "Medium-Quality Exchange")]
    Medium,
    #[serde(rename = "Low-Quality Exchange")]
    Low,
}

impl LmxLevel {
    pub fn classify(score: f64) -> Self {
        if score >= HIGH_CUTOFF {
            LmxLevel::High
        } else if score >= MID_CUTOFF {
            LmxLevel::Medium
        } else {
            LmxLevel::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LmxLevel::High => "High-Quality Exchange",
            LmxLevel::Medium => "Medium-Quality Exchange",
            LmxLevel::Low => "Low-Quality Exchange",
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// Bucket a single 1-5 score.
    pub fn from_score(score: f64) -> Self {
        if score >= RISK_HIGH_CUTOFF {
            RiskLevel::High
        } else if score >= RISK_MEDIUM_CUTOFF {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        }
    }
}

/// Overall risk from the mean of the three concealed traits.
pub fn overall_risk(concealed: &ConcealedScores) -> RiskLevel {
    RiskLevel::from_score(concealed.average())
}

/// Per-trait levels for the admin view. Same cutoffs as `overall_risk`.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct TraitLevels {
    pub machiavellianism: RiskLevel,
    pub narcissism: RiskLevel,
    pub psychopathy: RiskLevel,
}

pub fn trait_levels(concealed: &ConcealedScores) -> TraitLevels {
    TraitLevels {
        machiavellianism: RiskLevel::from_score(concealed.machiavellianism),
        narcissism: RiskLevel::from_score(concealed.narcissism),
        psychopathy: RiskLevel::from_score(concealed.psychopathy),
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Classification {
    pub blake_mouton: BlakeMoutonStyle,
    pub candor: CandorQuadrant,
    pub lmx: LmxLevel,
    pub components: Vec<DimensionScore>,
}

/// Classify the visible dimensions. Risk is handled by `overall_risk`.
pub fn classify(scores: &DimensionScores) -> Classification {
    let components = [
        Dimension::People,
        Dimension::Production,
        Dimension::Care,
        Dimension::Challenge,
        Dimension::Lmx,
    ]
    .iter()
    .map(|d| DimensionScore {
        dimension: *d,
        value: scores.get(*d),
    })
    .collect();

    Classification {
        blake_mouton: BlakeMoutonStyle::classify(scores.people, scores.production),
        candor: CandorQuadrant::classify(scores.care, scores.challenge),
        lmx: LmxLevel::classify(scores.lmx),
        components,
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown label: {0}")]
pub struct UnknownLabel(pub String);

macro_rules! label_enum {
    ($ty:ident, [$($variant:ident),+ $(,)?]) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = UnknownLabel;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                $(
                    if s == $ty::$variant.as_str() {
                        return Ok($ty::$variant);
                    }
                )+
                Err(UnknownLabel(s.to_string()))
            }
        }
    };
}

label_enum!(BlakeMoutonStyle, [TeamManagement, CountryClub, AuthorityCompliance, MiddleOfTheRoad, Impoverished]);
label_enum!(CandorQuadrant, [RadicalCandor, RuinousEmpathy, ObnoxiousAggression, ManipulativeInsincerity]);
label_enum!(LmxLevel, [High, Medium, Low]);
label_enum!(RiskLevel, [Low, Medium, High]);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blake_mouton_boundaries() {
        assert_eq!(BlakeMoutonStyle::classify(6.0, 6.0), BlakeMoutonStyle::TeamManagement);
        assert_eq!(BlakeMoutonStyle::classify(6.0, 5.99), BlakeMoutonStyle::CountryClub);
        assert_eq!(BlakeMoutonStyle::classify(5.99, 6.0), BlakeMoutonStyle::AuthorityCompliance);
        assert_eq!(BlakeMoutonStyle::classify(4.0, 4.0), BlakeMoutonStyle::MiddleOfTheRoad);
        assert_eq!(BlakeMoutonStyle::classify(3.99, 4.0), BlakeMoutonStyle::Impoverished);
        assert_eq!(BlakeMoutonStyle::classify(6.2, 7.1), BlakeMoutonStyle::TeamManagement);
    }

    #[test]
    fn blake_mouton_is_total_over_the_grid() {
        let steps: Vec<f64> = (0..=60).map(|i| 1.0 + i as f64 * 0.1).collect();
        for &people in &steps {
            for &production in &steps {
                let style = BlakeMoutonStyle::classify(people, production);
                let expected = if people >= 6.0 && production >= 6.0 {
                    BlakeMoutonStyle::TeamManagement
                } else if people >= 6.0 {
                    BlakeMoutonStyle::CountryClub
                } else if production >= 6.0 {
                    BlakeMoutonStyle::AuthorityCompliance
                } else if people >= 4.0 && production >= 4.0 {
                    BlakeMoutonStyle::MiddleOfTheRoad
                } else {
                    BlakeMoutonStyle::Impoverished
                };
                assert_eq!(style, expected, "people={} production={}", people, production);
            }
        }
    }

    #[test]
    fn candor_quadrants() {
        assert_eq!(CandorQuadrant::classify(5.8, 6.5), CandorQuadrant::RadicalCandor);
        assert_eq!(CandorQuadrant::classify(4.0, 3.99), CandorQuadrant::RuinousEmpathy);
        assert_eq!(CandorQuadrant::classify(3.99, 4.0), CandorQuadrant::ObnoxiousAggression);
        assert_eq!(CandorQuadrant::classify(1.0, 1.0), CandorQuadrant::ManipulativeInsincerity);
    }

    #[test]
    fn lmx_levels() {
        assert_eq!(LmxLevel::classify(6.3), LmxLevel::High);
        assert_eq!(LmxLevel::classify(6.0), LmxLevel::High);
        assert_eq!(LmxLevel::classify(5.99), LmxLevel::Medium);
        assert_eq!(LmxLevel::classify(4.0), LmxLevel::Medium);
        assert_eq!(LmxLevel::classify(3.9), LmxLevel::Low);
    }

    #[test]
    fn risk_from_concealed_average() {
        let concealed = ConcealedScores {
            machiavellianism: 4.2,
            narcissism: 4.5,
            psychopathy: 3.8,
        };
        assert_eq!(overall_risk(&concealed), RiskLevel::High);

        let medium = ConcealedScores { machiavellianism: 2.5, narcissism: 2.5, psychopathy: 2.5 };
        assert_eq!(overall_risk(&medium), RiskLevel::Medium);

        let low = ConcealedScores { machiavellianism: 1.0, narcissism: 2.0, psychopathy: 3.0 };
        assert_eq!(overall_risk(&low), RiskLevel::Low);
    }

    #[test]
    fn trait_levels_share_risk_cutoffs() {
        let levels = trait_levels(&ConcealedScores {
            machiavellianism: 3.5,
            narcissism: 2.49,
            psychopathy: 2.5,
        });
        assert_eq!(levels.machiavellianism, RiskLevel::High);
        assert_eq!(levels.narcissism, RiskLevel::Low);
        assert_eq!(levels.psychopathy, RiskLevel::Medium);
    }

    #[test]
    fn labels_round_trip_through_strings() {
        assert_eq!("Country Club".parse::<BlakeMoutonStyle>(), Ok(BlakeMoutonStyle::CountryClub));
        assert_eq!("high".parse::<RiskLevel>(), Ok(RiskLevel::High));
        assert!("Team Leader".parse::<BlakeMoutonStyle>().is_err());
        assert_eq!(
            serde_json::to_string(&LmxLevel::Medium).unwrap(),
            "\"Medium-Quality Exchange\""
        );
    }

    #[test]
    fn unknown_labels_are_errors() {
        let err = "Team Leader".parse::<BlakeMoutonStyle>().unwrap_err();
        assert_eq!(err, UnknownLabel("Team Leader".to_string()));
        assert_eq!(err.to_string(), "unknown label: Team Leader");

        let boxed: Box<dyn std::error::Error> = Box::new(err);
        assert!(boxed.source().is_none());
    }
}
