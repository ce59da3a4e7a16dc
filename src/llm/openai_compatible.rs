// ABOUTME: Chat-completions provider shared by xAI, OpenAI and Azure OpenAI
// ABOUTME: Differences are the base URL, the auth header and Azure's deployment-scoped path
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # `OpenAI`-Compatible Provider
//!
//! xAI and `OpenAI` speak the same chat-completions dialect with a bearer
//! token. Azure `OpenAI` uses the same body but routes by deployment:
//!
//! ```text
//! {endpoint}/openai/deployments/{deployment}/chat/completions?api-version={version}
//! ```
//!
//! and authenticates with an `api-key` header.

use std::fmt::{self, Debug, Formatter};

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument};

use super::{
    http_client, transport_error, ChatMessage, ChatRequest, ChatResponse, LlmCapabilities,
    LlmProvider, TokenUsage,
};
use crate::config::{ProviderConfig, ProviderId};
use crate::errors::{AppError, ErrorCode};

// ============================================================================
// API Request/Response Types (OpenAI-compatible format)
// ============================================================================

#[derive(Debug, Serialize)]
struct OpenAiRequest {
    model: String,
    messages: Vec<OpenAiMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct OpenAiMessage {
    role: String,
    content: String,
}

impl From<&ChatMessage> for OpenAiMessage {
    fn from(msg: &ChatMessage) -> Self {
        Self {
            role: msg.role.as_str().to_owned(),
            content: msg.content.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
    #[serde(default)]
    usage: Option<OpenAiUsage>,
    #[serde(default)]
    model: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiUsage {
    #[serde(rename = "prompt_tokens")]
    prompt: u32,
    #[serde(rename = "completion_tokens")]
    completion: u32,
    #[serde(rename = "total_tokens")]
    total: u32,
}

#[derive(Debug, Deserialize)]
struct OpenAiErrorResponse {
    error: OpenAiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct OpenAiErrorDetail {
    message: String,
    #[serde(rename = "type")]
    error_type: Option<String>,
    #[serde(default)]
    code: Option<String>,
}

// ============================================================================
// Provider Configuration
// ============================================================================

/// How the API key is presented
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStyle {
    /// `Authorization: Bearer <key>`
    Bearer,
    /// `api-key: <key>` (Azure)
    ApiKeyHeader,
}

/// Endpoint and identity of one chat-completions backend
#[derive(Clone)]
pub struct OpenAiCompatibleConfig {
    /// Which catalog entry this is
    pub provider: ProviderId,
    /// Base URL, or the Azure resource endpoint
    pub base_url: String,
    /// API key
    pub api_key: String,
    /// Model sent in the body; the deployment name for Azure
    pub default_model: String,
    /// Header carrying the key
    pub auth: AuthStyle,
    /// Azure deployment; switches on deployment-scoped routing
    pub deployment: Option<String>,
    /// Azure `api-version` query parameter
    pub api_version: Option<String>,
}

impl OpenAiCompatibleConfig {
    /// Build from a stored provider configuration
    ///
    /// # Errors
    ///
    /// Returns a config error when the provider does not use chat completions
    /// or required fields are missing
    pub fn from_provider_config(config: &ProviderConfig) -> Result<Self, AppError> {
        config.validate()?;
        let info = config.provider.info();
        match config.provider {
            ProviderId::Xai | ProviderId::OpenAi => {
                let base_url = info.base_url.unwrap_or_default().to_owned();
                Ok(Self {
                    provider: config.provider,
                    base_url,
                    api_key: config.api_key.clone(),
                    default_model: config.resolved_model().unwrap_or_default(),
                    auth: AuthStyle::Bearer,
                    deployment: None,
                    api_version: None,
                })
            }
            ProviderId::Azure => {
                let deployment = config
                    .resolved_deployment()
                    .ok_or_else(|| AppError::config("Azure OpenAI deployment name is required"))?;
                Ok(Self {
                    provider: config.provider,
                    base_url: config.azure_endpoint.clone().unwrap_or_default(),
                    api_key: config.api_key.clone(),
                    default_model: deployment.clone(),
                    auth: AuthStyle::ApiKeyHeader,
                    deployment: Some(deployment),
                    api_version: Some(config.resolved_api_version()),
                })
            }
            ProviderId::Gemini | ProviderId::Anthropic => Err(AppError::config(format!(
                "{} does not use the chat completions API",
                info.display_name
            ))),
        }
    }
}

impl Debug for OpenAiCompatibleConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiCompatibleConfig")
            .field("provider", &self.provider)
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .field("default_model", &self.default_model)
            .field("auth", &self.auth)
            .field("deployment", &self.deployment)
            .field("api_version", &self.api_version)
            .finish()
    }
}

// ============================================================================
// Provider Implementation
// ============================================================================

/// xAI, `OpenAI` or Azure `OpenAI` chat completions
pub struct OpenAiCompatibleProvider {
    client: Client,
    config: OpenAiCompatibleConfig,
}

impl OpenAiCompatibleProvider {
    /// Create a new provider with the given configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(config: OpenAiCompatibleConfig) -> Result<Self, AppError> {
        info!(
            provider = %config.provider,
            model = %config.default_model,
            "Initializing chat completions provider"
        );
        Ok(Self {
            client: http_client()?,
            config,
        })
    }

    /// Override the base URL, e.g. to point at a proxy
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config.base_url = base_url.into();
        self
    }

    /// Chat completions URL for this backend
    pub(crate) fn api_url(&self) -> String {
        let base = self.config.base_url.trim_end_matches('/');
        match (&self.config.deployment, &self.config.api_version) {
            (Some(deployment), Some(version)) => format!(
                "{base}/openai/deployments/{deployment}/chat/completions?api-version={version}"
            ),
            _ => format!("{base}/chat/completions"),
        }
    }

    fn add_auth_header(&self, request: RequestBuilder) -> RequestBuilder {
        match self.config.auth {
            AuthStyle::Bearer => {
                request.header("Authorization", format!("Bearer {}", self.config.api_key))
            }
            AuthStyle::ApiKeyHeader => request.header("api-key", &self.config.api_key),
        }
    }

    /// Error carrying the status and the provider's own wording
    fn parse_error_response(&self, status: StatusCode, body: &str) -> AppError {
        let name = self.display_name();
        let detail = serde_json::from_str::<OpenAiErrorResponse>(body).map_or_else(
            |_| body.chars().take(500).collect::<String>(),
            |parsed| {
                let kind = parsed
                    .error
                    .code
                    .or(parsed.error.error_type)
                    .map(|k| format!(" ({k})"))
                    .unwrap_or_default();
                format!("{}{kind}", parsed.error.message)
            },
        );
        let message = format!("{name} API error ({status}): {detail}");

        let code = match status.as_u16() {
            401 => ErrorCode::ExternalAuthFailed,
            403 => ErrorCode::AuthInvalid,
            404 => ErrorCode::ResourceNotFound,
            429 => ErrorCode::ExternalRateLimited,
            500..=599 => ErrorCode::ExternalServiceUnavailable,
            _ => ErrorCode::ExternalServiceError,
        };
        AppError::new(code, message)
    }
}

#[async_trait]
impl LlmProvider for OpenAiCompatibleProvider {
    fn name(&self) -> &'static str {
        self.config.provider.as_str()
    }

    fn display_name(&self) -> &'static str {
        self.config.provider.info().display_name
    }

    fn capabilities(&self) -> LlmCapabilities {
        LlmCapabilities::conversational()
    }

    fn default_model(&self) -> &str {
        &self.config.default_model
    }

    fn available_models(&self) -> &'static [&'static str] {
        self.config.provider.info().models
    }

    #[instrument(skip(self, request), fields(provider = %self.config.provider))]
    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, AppError> {
        // Azure routes by deployment; the body model must match it
        let model = if self.config.deployment.is_some() {
            self.config.default_model.as_str()
        } else {
            request
                .model
                .as_deref()
                .unwrap_or(&self.config.default_model)
        };

        let openai_request = OpenAiRequest {
            model: model.to_owned(),
            messages: request.messages.iter().map(OpenAiMessage::from).collect(),
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };
        debug!(
            model,
            messages = openai_request.messages.len(),
            "Sending chat completion request"
        );

        let http_request = self
            .client
            .post(self.api_url())
            .header("Content-Type", "application/json")
            .json(&openai_request);

        let response = self
            .add_auth_header(http_request)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to send chat completion request");
                transport_error(self.display_name(), &e)
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| transport_error(self.display_name(), &e))?;

        if !status.is_success() {
            return Err(self.parse_error_response(status, &body));
        }

        let openai_response: OpenAiResponse = serde_json::from_str(&body).map_err(|e| {
            AppError::external_service(
                self.display_name(),
                format!("Failed to parse response: {e}"),
            )
        })?;

        let choice = openai_response.choices.into_iter().next().ok_or_else(|| {
            AppError::external_service(self.display_name(), "API returned no choices")
        })?;
        let content = choice.message.content.unwrap_or_default();

        debug!(
            chars = content.len(),
            finish_reason = ?choice.finish_reason,
            "Received chat completion"
        );

        Ok(ChatResponse {
            content,
            model: openai_response.model.unwrap_or_else(|| model.to_owned()),
            usage: openai_response.usage.map(|u| TokenUsage {
                prompt_tokens: u.prompt,
                completion_tokens: u.completion,
                total_tokens: u.total,
            }),
            finish_reason: choice.finish_reason,
        })
    }
}

impl Debug for OpenAiCompatibleProvider {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiCompatibleProvider")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
