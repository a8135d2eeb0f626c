use async_trait::async_trait;
use log::{error, info};
use reqwest::Client;
use serde::{Serialize, Deserialize};

use super::{
    build_prompt, parse_insight, system_prompt, AiError, AiInsight, InsightProvider,
    InsightRequest, Result, ANTHROPIC, MAX_TOKENS, TEMPERATURE,
};

const API_VERSION: &str = "2023-06-01";

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f64,
    system: &'a str,
    messages: Vec<Message>,
}

#[derive(Serialize)]
struct Message {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize)]
struct Usage {
    input_tokens: u32,
    output_tokens: u32,
}

/// Messages API client.
#[derive(Clone)]
pub struct AnthropicProvider {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl AnthropicProvider {
    pub fn new(client: Client, api_key: String, model: String, base_url: String) -> Self {
        Self {
            client,
            api_key,
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn complete(&self, system: &str, user: String) -> Result<String> {
        let request = MessagesRequest {
            model: &self.model,
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
            system,
            messages: vec![Message {
                role: "user",
                content: user,
            }],
        };

        info!("Sending request to Anthropic with model: {}", self.model);

        let response = self
            .client
            .post(format!("{}/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Anthropic API error: {}", body);
            return Err(AiError::Api {
                provider: ANTHROPIC.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        let parsed: MessagesResponse = response.json().await?;

        if let Some(usage) = parsed.usage {
            info!(
                "Token usage - Input: {}, Output: {}",
                usage.input_tokens, usage.output_tokens
            );
        }

        let text: String = parsed
            .content
            .into_iter()
            .filter(|block| block.kind == "text")
            .filter_map(|block| block.text)
            .collect::<Vec<_>>()
            .join("\n");

        if text.trim().is_empty() {
            return Err(AiError::EmptyResponse(ANTHROPIC.to_string()));
        }
        Ok(text)
    }
}

#[async_trait]
impl InsightProvider for AnthropicProvider {
    fn name(&self) -> &str {
        ANTHROPIC
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, request: &InsightRequest) -> Result<AiInsight> {
        let reply = self.complete(system_prompt(), build_prompt(request)).await?;
        info!("Received response from Anthropic");
        parse_insight(&reply, ANTHROPIC, &self.model)
    }
}
