//! Chat-model adapter: one reqwest client speaking the chat-completions
//! protocol, normalized to a plain prompt-in/text-out interface.
//!
//! Whatever shape the provider returns is flattened here; callers only ever
//! see a `String` (or an error), which keeps model-client variability out of
//! the pipeline.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::config::ModelConfig;
use crate::contract::{BoxError, ChatModel};

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Chat-completions client over HTTP.
pub struct HttpChatModel {
    client: reqwest::Client,
    config: ModelConfig,
}

impl HttpChatModel {
    pub fn new(config: ModelConfig) -> Result<Self, BoxError> {
        if config.api_key.as_deref().unwrap_or("").is_empty() {
            return Err("model API key is not set".into());
        }
        // Defensive request timeout: an ungoverned model call can stall a
        // worker slot indefinitely.
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self { client, config })
    }
}

#[async_trait::async_trait]
impl ChatModel for HttpChatModel {
    async fn complete(&self, prompt: &str) -> Result<String, BoxError> {
        let url = format!(
            "{}/chat/completions",
            self.config.api_base.trim_end_matches('/')
        );
        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.config.temperature,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(self.config.api_key.as_deref().unwrap_or(""))
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("<failed to decode response body>"));
            error!(url = %url, status = %status, "Model API returned error. Response body: {body}");
            return Err(format!("model API returned {status}: {body}").into());
        }

        let parsed: ChatResponse = response.json().await?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();
        debug!(chars = content.len(), "Model response received");
        Ok(content)
    }
}
