use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

use super::{AiError, AiInsight, Result};

const MAX_STRENGTHS: usize = 3;
const MAX_IMPROVEMENTS: usize = 3;
const MAX_ACTIONS: usize = 5;

static SECTION_HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(?:#+\s*)?(?:\d+[.)]\s*)?(?:\*\*)?\s*(?:key\s+|main\s+)?(strengths?|areas?\s+for\s+improvement|improvements?|blind\s+spots?|action\s+plans?|development\s+strateg(?:y|ies)|expected\s+outcomes?|outcomes?)\b",
    )
    .unwrap_or_else(|e| panic!("section header pattern: {}", e))
});

static LIST_ITEM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:\d+[.)]|[-•*])\s+(.+)$")
        .unwrap_or_else(|e| panic!("list item pattern: {}", e))
});

#[derive(Deserialize, Default)]
struct RawInsight {
    #[serde(default)]
    strengths: Vec<String>,
    #[serde(default)]
    improvements: Vec<String>,
    #[serde(default)]
    action_plans: Vec<String>,
    #[serde(default)]
    expected_outcomes: String,
}

#[derive(Clone, Copy, PartialEq)]
enum Section {
    Strengths,
    Improvements,
    Actions,
    Outcomes,
}

/// Turn a model reply into an `AiInsight`.
///
/// JSON is tried first (the prompt asks for it). Anything else is read as
/// numbered sections. A reply with no recognisable structure is kept whole
/// as the expected outcomes text.
pub fn parse_insight(text: &str, provider: &str, model: &str) -> Result<AiInsight> {
    let text = text.trim();
    if text.is_empty() {
        return Err(AiError::EmptyResponse(provider.to_string()));
    }

    let raw = parse_json(text).unwrap_or_else(|| parse_sections(text));

    let mut insight = AiInsight {
        strengths: clean(raw.strengths, MAX_STRENGTHS),
        improvements: clean(raw.improvements, MAX_IMPROVEMENTS),
        action_plans: clean(raw.action_plans, MAX_ACTIONS),
        expected_outcomes: raw.expected_outcomes.trim().to_string(),
        provider: provider.to_string(),
        model: model.to_string(),
    };

    if insight.strengths.is_empty()
        && insight.improvements.is_empty()
        && insight.action_plans.is_empty()
        && insight.expected_outcomes.is_empty()
    {
        insight.expected_outcomes = text.to_string();
    }

    Ok(insight)
}

fn parse_json(text: &str) -> Option<RawInsight> {
    // models like to wrap JSON in prose or code fences
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end <= start {
        return None;
    }
    serde_json::from_str(&text[start..=end]).ok()
}

fn parse_sections(text: &str) -> RawInsight {
    let mut raw = RawInsight::default();
    let mut current: Option<Section> = None;
    let mut outcomes: Vec<String> = Vec::new();

    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if let Some(section) = header_section(line) {
            current = Some(section);
            continue;
        }

        let item = LIST_ITEM
            .captures(line)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().trim().to_string());

        match (current, item) {
            (Some(Section::Strengths), Some(item)) => raw.strengths.push(item),
            (Some(Section::Improvements), Some(item)) => raw.improvements.push(item),
            (Some(Section::Actions), Some(item)) => raw.action_plans.push(item),
            (Some(Section::Outcomes), item) => {
                outcomes.push(item.unwrap_or_else(|| line.to_string()));
            }
            _ => {}
        }
    }

    raw.expected_outcomes = outcomes.join(" ");
    raw
}

fn header_section(line: &str) -> Option<Section> {
    let caps = SECTION_HEADER.captures(line)?;
    let keyword = caps.get(1)?.as_str().to_lowercase();

    // a header is short; a long numbered line mentioning "strengths" is an item
    let rest = &line[caps.get(0)?.end()..];
    if rest.trim_matches(|c: char| c == '*' || c == ':' || c.is_whitespace()).len() > 24 {
        return None;
    }

    let section = if keyword.starts_with("strength") {
        Section::Strengths
    } else if keyword.contains("improvement") || keyword.starts_with("blind") {
        Section::Improvements
    } else if keyword.starts_with("action") || keyword.starts_with("development") {
        Section::Actions
    } else {
        Section::Outcomes
    };
    Some(section)
}

fn clean(items: Vec<String>, max: usize) -> Vec<String> {
    items
        .into_iter()
        .map(|s| s.trim_matches(|c: char| c == '*' || c.is_whitespace()).to_string())
        .filter(|s| !s.is_empty())
        .take(max)
        .collect()
}
