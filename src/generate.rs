//! Answer generation: prompt assembly and the language-model provider.
//!
//! Retrieved chunks become numbered context blocks inside the system
//! prompt; recent conversation turns and the user question follow.
//!
//! - **[`DisabledGenerator`]**: returns errors; used when generation is not configured.
//! - **[`OpenAiGenerator`]**: calls the OpenAI chat-completions API with retry and backoff.
//!
//! # Retry Strategy
//!
//! - HTTP 429 (rate limited) and 5xx (server error) → retry
//! - HTTP 4xx (client error, not 429) → fail immediately
//! - Network errors → retry
//! - Backoff: 1s, 2s, 4s, 8s, 16s, 32s (capped at 2^5)

use std::time::Duration;

use anyhow::{bail, Result};
use async_trait::async_trait;
use tracing::warn;

use docchat_core::SearchResult;

use crate::config::GenerationConfig;
use crate::conversation::Role;

const OPENAI_CHAT_URL: &str = "https://api.openai.com/v1/chat/completions";
const EMPTY_COMPLETION_REPLY: &str = "I couldn't generate a response.";

/// One prior message sent to the model.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatTurn {
    pub role: Role,
    pub content: String,
}

/// Everything the model sees for one answer.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub system_prompt: String,
    pub history: Vec<ChatTurn>,
    pub query: String,
}

#[async_trait]
pub trait Generator: Send + Sync {
    fn model_name(&self) -> &str;

    async fn generate(&self, request: &GenerationRequest) -> Result<String>;
}

/// Format results as `[Source i: <document name>]` blocks, numbered from 1.
pub fn build_context(results: &[SearchResult]) -> String {
    results
        .iter()
        .enumerate()
        .map(|(i, r)| format!("[Source {}: {}]\n{}", i + 1, r.document.name, r.chunk()))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Document names of `results`, deduplicated in first-seen order.
pub fn source_names(results: &[SearchResult]) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for r in results {
        if !names.iter().any(|n| n == &r.document.name) {
            names.push(r.document.name.clone());
        }
    }
    names
}

pub fn system_prompt(context: &str) -> String {
    format!(
        "You are a helpful AI assistant that answers questions based on the provided document context.

Guidelines:
- Always base your answers on the provided context
- If the context doesn't contain relevant information, say so clearly
- Provide specific, detailed answers when possible
- Include relevant quotes from the documents when appropriate
- Be concise but comprehensive
- If asked about something not in the context, explain that you can only answer based on the provided documents

Context from documents:
{}",
        context
    )
}

/// Instantiate the generator selected by `config.provider`.
pub fn create_generator(config: &GenerationConfig) -> Result<Box<dyn Generator>> {
    match config.provider.as_str() {
        "disabled" => Ok(Box::new(DisabledGenerator)),
        "openai" => Ok(Box::new(OpenAiGenerator::new(config)?)),
        other => bail!("Unknown generation provider: {}", other),
    }
}

// ============ Disabled Generator ============

/// Always fails; used when `generation.provider = "disabled"`.
pub struct DisabledGenerator;

#[async_trait]
impl Generator for DisabledGenerator {
    fn model_name(&self) -> &str {
        "disabled"
    }

    async fn generate(&self, _request: &GenerationRequest) -> Result<String> {
        bail!("Answer generation is disabled; set [generation] provider = \"openai\" in the config")
    }
}

// ============ OpenAI Generator ============

/// Chat-completions client. Requires `OPENAI_API_KEY`.
pub struct OpenAiGenerator {
    api_key: String,
    config: GenerationConfig,
    client: reqwest::Client,
}

impl OpenAiGenerator {
    pub fn new(config: &GenerationConfig) -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| anyhow::anyhow!("OPENAI_API_KEY environment variable not set"))?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            api_key,
            config: config.clone(),
            client,
        })
    }
}

/// JSON body for the chat-completions endpoint.
pub fn openai_request_body(config: &GenerationConfig, request: &GenerationRequest) -> serde_json::Value {
    let mut messages = Vec::with_capacity(request.history.len() + 2);
    messages.push(serde_json::json!({ "role": "system", "content": request.system_prompt }));
    for turn in &request.history {
        messages.push(serde_json::json!({ "role": turn.role.as_str(), "content": turn.content }));
    }
    messages.push(serde_json::json!({ "role": "user", "content": request.query }));

    serde_json::json!({
        "model": config.model,
        "messages": messages,
        "temperature": config.temperature,
        "max_tokens": config.max_tokens,
    })
}

#[async_trait]
impl Generator for OpenAiGenerator {
    fn model_name(&self) -> &str {
        &self.config.model
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        let body = openai_request_body(&self.config, request);
        let mut last_err = None;

        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                let delay = Duration::from_secs(1 << (attempt - 1).min(5));
                tokio::time::sleep(delay).await;
            }

            let resp = self
                .client
                .post(OPENAI_CHAT_URL)
                .bearer_auth(&self.api_key)
                .json(&body)
                .send()
                .await;

            match resp {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        let json: serde_json::Value = response.json().await?;
                        return parse_openai_response(&json);
                    }

                    let body_text = response.text().await.unwrap_or_default();
                    if status.as_u16() == 429 || status.is_server_error() {
                        warn!(%status, attempt, "OpenAI request failed, retrying");
                        last_err = Some(anyhow::anyhow!("OpenAI API error {}: {}", status, body_text));
                        continue;
                    }

                    bail!("OpenAI API error {}: {}", status, body_text);
                }
                Err(e) => {
                    warn!(error = %e, attempt, "OpenAI request failed, retrying");
                    last_err = Some(e.into());
                }
            }
        }

        Err(last_err.unwrap_or_else(|| anyhow::anyhow!("Generation failed after retries")))
    }
}

/// Extract `choices[0].message.content`; a missing or empty completion
/// becomes a fixed apology.
fn parse_openai_response(json: &serde_json::Value) -> Result<String> {
    let choices = json
        .get("choices")
        .and_then(|c| c.as_array())
        .ok_or_else(|| anyhow::anyhow!("Invalid OpenAI response: missing choices array"))?;

    let content = choices
        .first()
        .and_then(|c| c.pointer("/message/content"))
        .and_then(|c| c.as_str())
        .filter(|c| !c.is_empty())
        .unwrap_or(EMPTY_COMPLETION_REPLY);

    Ok(content.to_string())
}
