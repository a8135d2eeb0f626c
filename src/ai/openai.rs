use async_trait::async_trait;
use log::{error, info};
use reqwest::Client;
use serde::{Serialize, Deserialize};

use super::{
    build_prompt, parse_insight, system_prompt, AiError, AiInsight, InsightProvider,
    InsightRequest, Result, MAX_TOKENS, OPENAI, TEMPERATURE,
};

#[derive(Serialize, Deserialize)]
struct OpenAIMessage {
    role: String,
    content: String,
}

#[derive(Serialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    max_tokens: u32,
    temperature: f64,
    stream: bool,
}

#[derive(Deserialize)]
struct OpenAIChoice {
    message: OpenAIMessage,
}

#[derive(Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
    usage: Option<OpenAIUsage>,
}

#[derive(Deserialize)]
struct OpenAIUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

/// Chat completions client.
#[derive(Clone)]
pub struct OpenAiProvider {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl OpenAiProvider {
    pub fn new(client: Client, api_key: String, model: String, base_url: String) -> Self {
        Self {
            client,
            api_key,
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn complete(&self, system: &str, user: String) -> Result<String> {
        let request = OpenAIRequest {
            model: self.model.clone(),
            messages: vec![
                OpenAIMessage {
                    role: "system".to_string(),
                    content: system.to_string(),
                },
                OpenAIMessage {
                    role: "user".to_string(),
                    content: user,
                },
            ],
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
            stream: false,
        };

        info!("Sending request to OpenAI with model: {}", self.model);

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("OpenAI API error: {}", body);
            return Err(AiError::Api {
                provider: OPENAI.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        let openai_response: OpenAIResponse = response.json().await?;

        if let Some(usage) = openai_response.usage {
            info!(
                "Token usage - Prompt: {}, Completion: {}, Total: {}",
                usage.prompt_tokens, usage.completion_tokens, usage.total_tokens
            );
        }

        openai_response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| AiError::EmptyResponse(OPENAI.to_string()))
    }
}

#[async_trait]
impl InsightProvider for OpenAiProvider {
    fn name(&self) -> &str {
        OPENAI
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, request: &InsightRequest) -> Result<AiInsight> {
        let reply = self.complete(system_prompt(), build_prompt(request)).await?;
        info!("Received response from OpenAI");
        parse_insight(&reply, OPENAI, &self.model)
    }
}
