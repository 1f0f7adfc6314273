//! Completion service client.
//!
//! Defines the [`ChatModel`] trait the query engine invokes with a fully
//! assembled prompt, plus [`GroqChat`], which calls the Groq
//! OpenAI-compatible `/chat/completions` endpoint.
//!
//! Model identity and temperature are captured at construction time. After
//! a configuration change, the caller must construct a fresh binding
//! (see [`crate::engine::QueryEngine::rebind_chat`]) — a stale binding
//! never silently keeps answering with the old model.

use std::time::Duration;

use anyhow::{bail, Result};
use async_trait::async_trait;

use crate::config::Config;
use crate::prompt::AssembledPrompt;

const GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";

/// Completions can stream for a while server-side; allow more headroom
/// than the embedding calls get.
const REQUEST_TIMEOUT_SECS: u64 = 120;
const MAX_RETRIES: u32 = 3;

/// Generates a text response from an assembled prompt.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Model identifier this binding was constructed with.
    fn model_name(&self) -> &str;

    /// Run one completion. Failures propagate; the engine defines no retry
    /// of its own beyond the transport-level backoff below.
    async fn complete(&self, prompt: &AssembledPrompt) -> Result<String>;
}

/// Chat client for the Groq API.
///
/// Same transport conventions as the embedding client: bounded timeout,
/// exponential backoff on 429/5xx/network errors, immediate failure on
/// other client errors.
pub struct GroqChat {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    temperature: f32,
    max_retries: u32,
}

impl GroqChat {
    /// Create a binding for the configured model and temperature.
    ///
    /// The API key is taken from `GROQ_API_KEY` or, failing that, the
    /// `api_key` config field. A missing key is a configuration error —
    /// the binding is refused up front rather than failing on first use.
    pub fn new(config: &Config) -> Result<Self> {
        let api_key = std::env::var("GROQ_API_KEY")
            .ok()
            .filter(|k| !k.is_empty())
            .unwrap_or_else(|| config.api_key.clone());

        if api_key.is_empty() {
            bail!(
                "GROQ API key not set. Export GROQ_API_KEY or set \"api_key\" in config.json."
            );
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: GROQ_BASE_URL.to_string(),
            api_key,
            model: config.model.clone(),
            temperature: config.temperature,
            max_retries: MAX_RETRIES,
        })
    }
}

#[async_trait]
impl ChatModel for GroqChat {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: &AssembledPrompt) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);

        let mut messages = Vec::with_capacity(prompt.history.len() + 2);
        messages.push(serde_json::json!({
            "role": "system",
            "content": prompt.system,
        }));
        for turn in &prompt.history {
            messages.push(serde_json::json!({
                "role": turn.role.as_str(),
                "content": turn.content,
            }));
        }
        messages.push(serde_json::json!({
            "role": "user",
            "content": prompt.user,
        }));

        let body = serde_json::json!({
            "model": self.model,
            "temperature": self.temperature,
            "messages": messages,
        });

        let mut last_err = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = Duration::from_secs(1 << (attempt - 1).min(5));
                tokio::time::sleep(delay).await;
            }

            let request = self
                .client
                .post(&url)
                .header("Authorization", format!("Bearer {}", self.api_key))
                .json(&body);

            match request.send().await {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        let json: serde_json::Value = response.json().await?;
                        return parse_completion_response(&json);
                    }

                    if status.as_u16() == 429 || status.is_server_error() {
                        let body_text = response.text().await.unwrap_or_default();
                        last_err = Some(anyhow::anyhow!(
                            "Chat API error {}: {}",
                            status,
                            body_text
                        ));
                        continue;
                    }

                    let body_text = response.text().await.unwrap_or_default();
                    bail!("Chat API error {}: {}", status, body_text);
                }
                Err(e) => {
                    last_err = Some(e.into());
                    continue;
                }
            }
        }

        Err(last_err.unwrap_or_else(|| anyhow::anyhow!("Completion failed after retries")))
    }
}

/// Extract `choices[0].message.content` from a chat-completions response.
fn parse_completion_response(json: &serde_json::Value) -> Result<String> {
    json.get("choices")
        .and_then(|c| c.as_array())
        .and_then(|c| c.first())
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|c| c.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| anyhow::anyhow!("Invalid chat response: missing choices[0].message.content"))
}
