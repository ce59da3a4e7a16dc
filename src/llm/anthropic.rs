// ABOUTME: Anthropic messages API provider with the system prompt carried in its own field
// ABOUTME: Translates the shared chat request into the vendor body and back
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::fmt::{self, Debug, Formatter};

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument};

use super::{
    http_client, transport_error, ChatRequest, ChatResponse, LlmCapabilities, LlmProvider,
    MessageRole, TokenUsage,
};
use crate::config::{ProviderConfig, ProviderId};
use crate::errors::{AppError, ErrorCode};

/// Messages API version header value
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// `max_tokens` is mandatory for this API
const FALLBACK_MAX_TOKENS: u32 = 2000;

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    messages: Vec<AnthropicMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
    model: Option<String>,
    stop_reason: Option<String>,
    usage: Option<AnthropicUsage>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AnthropicUsage {
    input_tokens: u32,
    output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct AnthropicErrorResponse {
    error: AnthropicErrorDetail,
}

#[derive(Debug, Deserialize)]
struct AnthropicErrorDetail {
    #[serde(rename = "type")]
    error_type: String,
    message: String,
}

/// Anthropic Claude via the messages API
pub struct AnthropicProvider {
    api_key: String,
    client: Client,
    base_url: String,
    default_model: String,
}

impl AnthropicProvider {
    /// Create a provider for `api_key` using the catalog's default model
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(api_key: impl Into<String>) -> Result<Self, AppError> {
        let info = ProviderId::Anthropic.info();
        Ok(Self {
            api_key: api_key.into(),
            client: http_client()?,
            base_url: info.base_url.unwrap_or_default().to_owned(),
            default_model: info.default_model.unwrap_or_default().to_owned(),
        })
    }

    /// Build from a stored provider configuration
    ///
    /// # Errors
    ///
    /// Returns a config error when the API key is missing
    pub fn from_provider_config(config: &ProviderConfig) -> Result<Self, AppError> {
        config.validate()?;
        let mut provider = Self::new(config.api_key.clone())?;
        if let Some(model) = config.resolved_model() {
            provider.default_model = model;
        }
        info!(model = %provider.default_model, "Initializing Anthropic provider");
        Ok(provider)
    }

    /// Set a custom default model
    #[must_use]
    pub fn with_default_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = model.into();
        self
    }

    /// Override the base URL
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn api_url(&self) -> String {
        format!("{}/messages", self.base_url.trim_end_matches('/'))
    }

    fn map_api_error(status: StatusCode, body: &str) -> AppError {
        let detail = serde_json::from_str::<AnthropicErrorResponse>(body).map_or_else(
            |_| body.chars().take(500).collect::<String>(),
            |parsed| format!("{} ({})", parsed.error.message, parsed.error.error_type),
        );
        let code = match status.as_u16() {
            401 => ErrorCode::ExternalAuthFailed,
            403 => ErrorCode::AuthInvalid,
            404 => ErrorCode::ResourceNotFound,
            429 | 529 => ErrorCode::ExternalRateLimited,
            500..=599 => ErrorCode::ExternalServiceUnavailable,
            _ => ErrorCode::ExternalServiceError,
        };
        AppError::new(code, format!("Anthropic API error ({status}): {detail}"))
    }
}

#[async_trait]
impl LlmProvider for AnthropicProvider {
    fn name(&self) -> &'static str {
        ProviderId::Anthropic.as_str()
    }

    fn display_name(&self) -> &'static str {
        ProviderId::Anthropic.info().display_name
    }

    fn capabilities(&self) -> LlmCapabilities {
        LlmCapabilities::conversational()
    }

    fn default_model(&self) -> &str {
        &self.default_model
    }

    fn available_models(&self) -> &'static [&'static str] {
        ProviderId::Anthropic.info().models
    }

    #[instrument(skip(self, request), fields(model = %request.model.as_deref().unwrap_or(&self.default_model)))]
    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, AppError> {
        let model = request.model.as_deref().unwrap_or(&self.default_model);
        let messages = request
            .messages
            .iter()
            .filter(|m| m.role != MessageRole::System)
            .map(|m| AnthropicMessage {
                role: m.role.as_str(),
                content: &m.content,
            })
            .collect();
        let body = MessagesRequest {
            model,
            max_tokens: request.max_tokens.unwrap_or(FALLBACK_MAX_TOKENS),
            system: request.system_prompt(),
            messages,
            temperature: request.temperature,
        };

        let response = self
            .client
            .post(self.api_url())
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to send Anthropic request");
                transport_error(self.display_name(), &e)
            })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| transport_error(self.display_name(), &e))?;
        if !status.is_success() {
            return Err(Self::map_api_error(status, &text));
        }

        let parsed: MessagesResponse = serde_json::from_str(&text).map_err(|e| {
            AppError::external_service("Anthropic", format!("Failed to parse response: {e}"))
        })?;
        let content = parsed
            .content
            .into_iter()
            .filter(|block| block.block_type == "text")
            .find_map(|block| block.text)
            .ok_or_else(|| AppError::external_service("Anthropic", "No text in response"))?;

        debug!(chars = content.len(), stop_reason = ?parsed.stop_reason, "Received Anthropic response");

        Ok(ChatResponse {
            content,
            model: parsed.model.unwrap_or_else(|| model.to_owned()),
            usage: parsed.usage.map(|u| TokenUsage {
                prompt_tokens: u.input_tokens,
                completion_tokens: u.output_tokens,
                total_tokens: u.input_tokens + u.output_tokens,
            }),
            finish_reason: parsed.stop_reason,
        })
    }
}

impl Debug for AnthropicProvider {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnthropicProvider")
            .field("default_model", &self.default_model)
            .field("api_key", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}
