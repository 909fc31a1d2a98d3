// Copyright (c) 2025 TexasFortress.AI
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::time::Duration;

use async_trait::async_trait;
use log::{debug, error, warn};
#[cfg(test)]
use mockall::automock;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::error::DraftError;

pub const DEFAULT_MODEL: &str = "deepseek-chat";
pub const DEFAULT_MAX_TOKENS: u32 = 500;
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Common message structure for OpenAI-compatible chat completion APIs.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct AiChatMessage {
    pub role: String,
    pub content: String,
}

impl AiChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: "system".to_string(), content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: "user".to_string(), content: content.into() }
    }
}

/// Interface of a chat completion backend.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait AiProvider: Send + Sync {
    /// Completion text for the given conversation, untrimmed.
    async fn generate_response(&self, messages: &[AiChatMessage]) -> Result<String, DraftError>;
}

/// Sampling and transport parameters of a completion call.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionOptions {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout: Duration,
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [AiChatMessage],
    max_tokens: u32,
    temperature: f32,
    stream: bool,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: AiChatMessage,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// Adapter for any endpoint speaking the OpenAI `chat/completions` protocol
/// (DeepSeek by default). `api_url` is the full completions URL.
#[derive(Clone)]
pub struct ChatCompletionsAdapter {
    http_client: Client,
    api_url: String,
    api_key: String,
    options: CompletionOptions,
}

impl ChatCompletionsAdapter {
    pub fn new(
        http_client: Client,
        api_url: impl Into<String>,
        api_key: impl Into<String>,
        options: CompletionOptions,
    ) -> Self {
        Self {
            http_client,
            api_url: api_url.into(),
            api_key: api_key.into(),
            options,
        }
    }
}

#[async_trait]
impl AiProvider for ChatCompletionsAdapter {
    async fn generate_response(&self, messages: &[AiChatMessage]) -> Result<String, DraftError> {
        let request_payload = ChatRequest {
            model: &self.options.model,
            messages,
            max_tokens: self.options.max_tokens,
            temperature: self.options.temperature,
            stream: false,
        };

        debug!(
            "Sending completion request: model={}, messages_count={}, url={}",
            request_payload.model,
            messages.len(),
            self.api_url
        );

        let response = self
            .http_client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&request_payload)
            .timeout(self.options.timeout)
            .send()
            .await
            .map_err(|e| {
                error!("Completion request failed: {}", e);
                DraftError::Network(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "<failed to read error body>".to_string());
            error!("Completion API request failed with status {}: {}", status, error_body);
            let message = serde_json::from_str::<ErrorEnvelope>(&error_body)
                .ok()
                .and_then(|e| e.error.message)
                .unwrap_or_else(|| "Unknown error".to_string());
            return Err(DraftError::Upstream {
                status: status.as_u16(),
                message,
            });
        }

        let response_body = response
            .json::<ChatResponse>()
            .await
            .map_err(|e| DraftError::InvalidResponse(e.to_string()))?;

        match response_body.choices.into_iter().next() {
            Some(choice) => {
                debug!("Received completion response");
                Ok(choice.message.content)
            }
            None => {
                warn!("Completion response did not contain any choices");
                Err(DraftError::InvalidResponse("response contained no choices".to_string()))
            }
        }
    }
}
