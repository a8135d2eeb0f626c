use std::collections::BTreeMap;

use log::{info, warn};
use serde::{Serialize, Deserialize};
use validator::Validate;

use super::{Dimension, Response, ResponseStore, Result, ValidationError};

/// Surveys finished faster than this are flagged as suspicious.
pub const MIN_COMPLETION_SECONDS: u32 = 60;
/// Surveys that took longer than this are flagged as distracted.
pub const MAX_COMPLETION_SECONDS: u32 = 1800;
/// Every visible dimension mean above this (or below `OUTLIER_LOW_MEAN`) is an outlier pattern.
pub const OUTLIER_HIGH_MEAN: f64 = 6.5;
pub const OUTLIER_LOW_MEAN: f64 = 1.5;
/// People and production means further apart than this are an outlier pattern.
pub const OPPOSED_AXES_GAP: f64 = 5.0;
/// Within-dimension standard deviation above which answers look inconsistent.
pub const HIGH_VARIANCE_THRESHOLD: f64 = 2.5;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SurveySubmission {
    #[serde(default)]
    pub user_id: Option<String>,
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
    pub responses: Vec<Response>,
    #[serde(default)]
    pub completion_time_seconds: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ValidationReport {
    pub completeness: f64,
    pub consistency: f64,
    pub warnings: Vec<String>,
    #[serde(default)]
    pub outliers: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ValidatedSubmission {
    pub responses: ResponseStore,
    pub report: ValidationReport,
}

/// Validate a one-shot submission: fields, answers, completeness, consistency.
pub fn validate_submission(submission: &SurveySubmission) -> Result<ValidatedSubmission> {
    let mut errors = field_errors(submission);

    let responses = match ResponseStore::from_responses(submission.responses.iter().cloned()) {
        Ok(store) => Some(store),
        Err(err) => {
            errors.push(err);
            None
        }
    };

    if let Some(err) = ValidationError::from_list(errors) {
        warn!("❌ Survey submission from {} rejected: {}", submission.email, err);
        return Err(err);
    }

    // from_responses only fails when it pushed an error above
    let responses = responses.unwrap_or_default();
    let report = assess_responses(&responses, submission.completion_time_seconds)?;

    info!(
        "✅ Survey submission from {} validated ({} answers, {} warnings)",
        submission.email,
        responses.len(),
        report.warnings.len()
    );

    Ok(ValidatedSubmission { responses, report })
}

/// Checks that apply to any finished answer set, however it was collected.
pub fn assess_responses(
    responses: &ResponseStore,
    completion_time_seconds: Option<u32>,
) -> Result<ValidationReport> {
    let total = responses.catalog().len();
    let answered = responses.len();

    if !responses.is_complete() {
        return Err(ValidationError::Incomplete { answered, total });
    }

    let mut values = responses.raw().values();
    if let Some(first) = values.next() {
        if answered > 1 && values.all(|v| v == first) {
            return Err(ValidationError::StraightLining);
        }
    }

    let mut warnings = Vec::new();

    match completion_time_seconds {
        Some(seconds) if seconds < MIN_COMPLETION_SECONDS => warnings.push(format!(
            "Survey completed in {} seconds, faster than the expected minimum of {}",
            seconds, MIN_COMPLETION_SECONDS
        )),
        Some(seconds) if seconds > MAX_COMPLETION_SECONDS => warnings.push(format!(
            "Survey took {} minutes, longer than the expected maximum of {}",
            seconds / 60,
            MAX_COMPLETION_SECONDS / 60
        )),
        _ => {}
    }

    let grouped = grouped_answers(responses);

    let mut high_variance = 0usize;
    for (dimension, std_dev) in dimension_spread(&grouped) {
        if std_dev > HIGH_VARIANCE_THRESHOLD {
            high_variance += 1;
            warnings.push(format!(
                "High answer spread for {} (std dev {:.2})",
                dimension.label(),
                std_dev
            ));
        }
    }

    let consistency = if high_variance == 0 {
        1.0
    } else {
        (1.0 - high_variance as f64 * 0.1).max(0.5)
    };

    let outliers = outlier_patterns(&grouped);
    if !outliers.is_empty() {
        warn!("Outlier answer patterns: {}", outliers.join("; "));
        warnings.push("Unusual answer pattern detected, review recommended".to_string());
    }

    Ok(ValidationReport {
        completeness: answered as f64 / total as f64,
        consistency,
        warnings,
        outliers,
    })
}

/// Field-level `validator` failures as `InvalidField` errors, sorted by field.
pub fn field_errors<T: Validate>(value: &T) -> Vec<ValidationError> {
    let Err(errors) = value.validate() else {
        return Vec::new();
    };

    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by_key(|(field, _)| *field);

    fields
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| ValidationError::InvalidField {
                field: field.to_string(),
                message: e
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| e.code.to_string()),
            })
        })
        .collect()
}

fn grouped_answers(responses: &ResponseStore) -> BTreeMap<Dimension, Vec<f64>> {
    let mut grouped: BTreeMap<Dimension, Vec<f64>> = BTreeMap::new();
    for (id, value) in responses.raw() {
        if let Some(q) = responses.catalog().get(id) {
            grouped.entry(q.dimension).or_default().push(f64::from(*value));
        }
    }
    grouped
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation of raw answers per dimension.
fn dimension_spread(grouped: &BTreeMap<Dimension, Vec<f64>>) -> Vec<(Dimension, f64)> {
    grouped
        .iter()
        .filter(|(_, values)| values.len() > 1)
        .map(|(dimension, values)| {
            let m = mean(values);
            let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
            (*dimension, variance.sqrt())
        })
        .collect()
}

/// Extreme score combinations across the visible dimensions.
fn outlier_patterns(grouped: &BTreeMap<Dimension, Vec<f64>>) -> Vec<String> {
    let means: BTreeMap<Dimension, f64> = grouped
        .iter()
        .filter(|(dimension, values)| !dimension.is_concealed() && !values.is_empty())
        .map(|(dimension, values)| (*dimension, mean(values)))
        .collect();

    let mut patterns = Vec::new();
    if means.is_empty() {
        return patterns;
    }

    if means.values().all(|m| *m > OUTLIER_HIGH_MEAN) {
        patterns.push("All leadership scores are very high".to_string());
    } else if means.values().all(|m| *m < OUTLIER_LOW_MEAN) {
        patterns.push("All leadership scores are very low".to_string());
    }

    if let (Some(people), Some(production)) =
        (means.get(&Dimension::People), means.get(&Dimension::Production))
    {
        if (people - production).abs() > OPPOSED_AXES_GAP {
            patterns.push(format!(
                "People and production scores are at opposite extremes ({:.2} vs {:.2})",
                people, production
            ));
        }
    }

    patterns
}
