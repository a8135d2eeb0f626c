//! AI-written coaching text on top of the rule-based insights.
//!
//! Providers only ever see the visible dimension scores and style labels.
//! A failing provider never affects the stored analysis.

pub mod anthropic;
pub mod compare;
pub mod openai;
pub mod parse;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use indexmap::IndexMap;
use log::info;
use reqwest::Client;
use serde::{Serialize, Deserialize};
use thiserror::Error;

use crate::config::Settings;
use crate::scoring::{BlakeMoutonStyle, CandorQuadrant, LmxLevel, VisibleScores};

pub use anthropic::AnthropicProvider;
pub use compare::{compare, ProviderComparison};
pub use openai::OpenAiProvider;
pub use parse::parse_insight;

pub const OPENAI: &str = "openai";
pub const ANTHROPIC: &str = "anthropic";

const MAX_TOKENS: u32 = 1000;
const TEMPERATURE: f64 = 0.7;

#[derive(Error, Debug)]
pub enum AiError {
    #[error("AI provider not configured: {0}")]
    NotConfigured(String),
    #[error("AI request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("{provider} API error ({status}): {body}")]
    Api {
        provider: String,
        status: u16,
        body: String,
    },
    #[error("{0} returned an empty response")]
    EmptyResponse(String),
}

pub type Result<T> = std::result::Result<T, AiError>;

/// What a provider is told about the respondent.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct InsightRequest {
    pub scores: VisibleScores,
    pub blake_mouton: BlakeMoutonStyle,
    pub candor: CandorQuadrant,
    pub lmx_level: LmxLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct AiInsight {
    pub strengths: Vec<String>,
    pub improvements: Vec<String>,
    pub action_plans: Vec<String>,
    pub expected_outcomes: String,
    pub provider: String,
    pub model: String,
}

#[async_trait]
pub trait InsightProvider: Send + Sync {
    fn name(&self) -> &str;
    fn model(&self) -> &str;
    async fn generate(&self, request: &InsightRequest) -> Result<AiInsight>;
}

pub fn system_prompt() -> &'static str {
    "You are an expert leadership analyst specializing in the 4D Leadership Assessment model. \
     Analyze the provided leadership data based on:\n\
     1. Blake & Mouton Grid (People vs Production)\n\
     2. Radical Candor (Care vs Challenge)\n\
     3. Leader-Member Exchange (LMX)\n\
     Give concrete, actionable insights."
}

pub fn build_prompt(request: &InsightRequest) -> String {
    let s = &request.scores;
    format!(
        "Analyze the following leadership profile:\n\n\
         People: {:.1}/7\n\
         Production: {:.1}/7\n\
         Care: {:.1}/7\n\
         Challenge: {:.1}/7\n\
         LMX: {:.1}/7\n\
         Leadership style: {}\n\
         Feedback style: {}\n\
         Relationship quality: {}\n\
         Organizational context: {}\n\n\
         Respond with a JSON object with these fields:\n\
         \"strengths\": 3 key strengths,\n\
         \"improvements\": 3 areas for improvement,\n\
         \"action_plans\": 5 concrete action plans,\n\
         \"expected_outcomes\": expected results after six months, as one paragraph.\n\
         If you cannot produce JSON, use numbered sections titled \
         Strengths, Improvements, Action Plans and Expected Outcomes.",
        s.people,
        s.production,
        s.care,
        s.challenge,
        s.lmx,
        request.blake_mouton,
        request.candor,
        request.lmx_level,
        request.context.as_deref().unwrap_or("general corporate environment"),
    )
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ProviderInfo {
    pub provider: String,
    pub model: String,
    pub is_default: bool,
}

/// Providers with credentials, in configuration order.
pub struct ProviderRegistry {
    providers: IndexMap<String, Arc<dyn InsightProvider>>,
    default_provider: String,
}

impl ProviderRegistry {
    pub fn new(default_provider: impl Into<String>) -> Self {
        Self {
            providers: IndexMap::new(),
            default_provider: default_provider.into(),
        }
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.ai_timeout_secs))
            .build()?;

        let mut registry = Self::new(settings.default_ai_provider.clone());

        if let Some(key) = &settings.openai_api_key {
            registry.register(Arc::new(OpenAiProvider::new(
                client.clone(),
                key.clone(),
                settings.openai_model.clone(),
                settings.openai_base_url.clone(),
            )));
        }

        if let Some(key) = &settings.anthropic_api_key {
            registry.register(Arc::new(AnthropicProvider::new(
                client,
                key.clone(),
                settings.anthropic_model.clone(),
                settings.anthropic_base_url.clone(),
            )));
        }

        Ok(registry)
    }

    pub fn register(&mut self, provider: Arc<dyn InsightProvider>) {
        info!("🤖 AI provider registered: {} ({})", provider.name(), provider.model());
        self.providers.insert(provider.name().to_string(), provider);
    }

    /// Look up a provider by name, or the default when no name is given.
    pub fn get(&self, name: Option<&str>) -> Result<Arc<dyn InsightProvider>> {
        let name = name.unwrap_or(&self.default_provider).to_lowercase();
        self.providers
            .get(&name)
            .cloned()
            .ok_or(AiError::NotConfigured(name))
    }

    /// Resolve several names at once; an empty list means every provider.
    pub fn select(&self, names: &[String]) -> Result<Vec<Arc<dyn InsightProvider>>> {
        if names.is_empty() {
            return Ok(self.providers.values().cloned().collect());
        }
        names.iter().map(|n| self.get(Some(n))).collect()
    }

    pub fn list(&self) -> Vec<ProviderInfo> {
        self.providers
            .values()
            .map(|p| ProviderInfo {
                provider: p.name().to_string(),
                model: p.model().to_string(),
                is_default: p.name() == self.default_provider,
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}
