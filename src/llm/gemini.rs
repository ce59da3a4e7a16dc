// ABOUTME: Google Gemini generateContent provider
// ABOUTME: Single-turn calls keyed by API key in the URL; the raw error body is kept for classification
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Gemini Provider
//!
//! Talks to `generativelanguage.googleapis.com` directly. Gemini error bodies
//! carry the rate-limit detail (`RESOURCE_EXHAUSTED`, `retryDelay`) that the
//! classifier reads, so failures keep the body verbatim.

use std::fmt::{Debug, Formatter, Result as FmtResult};

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument};

use super::{
    http_client, transport_error, ChatMessage, ChatRequest, ChatResponse, LlmCapabilities,
    LlmProvider, MessageRole, TokenUsage,
};
use crate::config::{ProviderConfig, ProviderId};
use crate::errors::{AppError, ErrorCode};

/// Base URL for the Gemini API
const API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

// ============================================================================
// API Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<ContentPart>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ContentPart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    candidate_count: u32,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    candidates: Option<Vec<Candidate>>,
    #[serde(rename = "usageMetadata")]
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<GeminiContent>,
    #[serde(rename = "finishReason")]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UsageMetadata {
    #[serde(rename = "promptTokenCount")]
    prompt: Option<u32>,
    #[serde(rename = "candidatesTokenCount")]
    candidates: Option<u32>,
    #[serde(rename = "totalTokenCount")]
    total: Option<u32>,
}

// ============================================================================
// Provider Implementation
// ============================================================================

/// Google Gemini LLM provider
pub struct GeminiProvider {
    api_key: String,
    client: Client,
    base_url: String,
    default_model: String,
}

impl GeminiProvider {
    /// Create a new Gemini provider with an API key
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(api_key: impl Into<String>) -> Result<Self, AppError> {
        let default_model = ProviderId::Gemini
            .info()
            .default_model
            .unwrap_or_default()
            .to_owned();
        Ok(Self {
            api_key: api_key.into(),
            client: http_client()?,
            base_url: API_BASE_URL.to_owned(),
            default_model,
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
        info!(model = %provider.default_model, "Initializing Gemini provider");
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

    /// Convert our message role to Gemini's role format
    const fn convert_role(role: MessageRole) -> &'static str {
        match role {
            MessageRole::System | MessageRole::User => "user",
            MessageRole::Assistant => "model",
        }
    }

    /// Build the API URL for a model and method
    fn build_url(&self, model: &str, method: &str) -> String {
        format!(
            "{}/models/{model}:{method}?key={}",
            self.base_url.trim_end_matches('/'),
            self.api_key
        )
    }

    fn text_content(text: &str, role: Option<&str>) -> GeminiContent {
        GeminiContent {
            role: role.map(str::to_owned),
            parts: vec![ContentPart {
                text: Some(text.to_owned()),
            }],
        }
    }

    fn build_gemini_request(request: &ChatRequest) -> GeminiRequest {
        let contents = request
            .messages
            .iter()
            .filter(|m| m.role != MessageRole::System)
            .map(|m: &ChatMessage| Self::text_content(&m.content, Some(Self::convert_role(m.role))))
            .collect();
        let system_instruction = request
            .system_prompt()
            .map(|prompt| Self::text_content(prompt, None));

        GeminiRequest {
            contents,
            system_instruction,
            generation_config: Some(GenerationConfig {
                temperature: request.temperature,
                max_output_tokens: request.max_tokens,
                candidate_count: 1,
            }),
        }
    }

    fn extract_content(response: &GeminiResponse) -> Result<String, AppError> {
        let text: String = response
            .candidates
            .as_ref()
            .and_then(|c| c.first())
            .and_then(|c| c.content.as_ref())
            .map(|c| c.parts.iter().filter_map(|p| p.text.as_deref()).collect())
            .unwrap_or_default();
        if text.is_empty() {
            return Err(AppError::external_service(
                "Google Gemini",
                "No content in Gemini response",
            ));
        }
        Ok(text)
    }

    /// Status plus the verbatim body
    fn map_api_error(status: StatusCode, body: &str) -> AppError {
        let code = match status.as_u16() {
            400 | 401 => ErrorCode::ExternalAuthFailed,
            403 => ErrorCode::AuthInvalid,
            404 => ErrorCode::ResourceNotFound,
            429 => ErrorCode::ExternalRateLimited,
            500..=599 => ErrorCode::ExternalServiceUnavailable,
            _ => ErrorCode::ExternalServiceError,
        };
        AppError::new(code, format!("Google Gemini API error ({status}): {body}"))
    }
}

#[async_trait]
impl LlmProvider for GeminiProvider {
    fn name(&self) -> &'static str {
        ProviderId::Gemini.as_str()
    }

    fn display_name(&self) -> &'static str {
        ProviderId::Gemini.info().display_name
    }

    fn capabilities(&self) -> LlmCapabilities {
        LlmCapabilities::single_turn()
    }

    fn default_model(&self) -> &str {
        &self.default_model
    }

    fn available_models(&self) -> &'static [&'static str] {
        ProviderId::Gemini.info().models
    }

    #[instrument(skip(self, request), fields(model = %request.model.as_deref().unwrap_or(&self.default_model)))]
    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, AppError> {
        let model = request.model.as_deref().unwrap_or(&self.default_model);
        let url = self.build_url(model, "generateContent");
        let body = Self::build_gemini_request(request);

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                let e = e.without_url();
                error!(error = %e, "Failed to send Gemini request");
                transport_error(self.display_name(), &e)
            })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| transport_error(self.display_name(), &e.without_url()))?;
        if !status.is_success() {
            return Err(Self::map_api_error(status, &text));
        }

        let parsed: GeminiResponse = serde_json::from_str(&text).map_err(|e| {
            AppError::external_service("Google Gemini", format!("Failed to parse response: {e}"))
        })?;
        let content = Self::extract_content(&parsed)?;
        let finish_reason = parsed
            .candidates
            .as_ref()
            .and_then(|c| c.first())
            .and_then(|c| c.finish_reason.clone());

        debug!(chars = content.len(), ?finish_reason, "Received Gemini response");

        Ok(ChatResponse {
            content,
            model: model.to_owned(),
            usage: parsed.usage_metadata.map(|metadata| TokenUsage {
                prompt_tokens: metadata.prompt.unwrap_or(0),
                completion_tokens: metadata.candidates.unwrap_or(0),
                total_tokens: metadata.total.unwrap_or(0),
            }),
            finish_reason,
        })
    }
}

impl Debug for GeminiProvider {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("GeminiProvider")
            .field("default_model", &self.default_model)
            .field("api_key", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}
