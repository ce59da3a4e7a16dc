// ABOUTME: Unified LLM provider selector built from the stored provider configuration
// ABOUTME: Dispatches to the OpenAI-compatible, Gemini or Anthropic backend
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # LLM Provider Selector
//!
//! xAI, `OpenAI` and Azure share the chat-completions wire format and map to
//! [`ChatProvider::OpenAiCompatible`]. Gemini and Anthropic have their own.

use std::fmt;

use async_trait::async_trait;
use tracing::{debug, info};

use super::{
    AnthropicProvider, ChatRequest, ChatResponse, GeminiProvider, LlmCapabilities, LlmProvider,
    OpenAiCompatibleConfig, OpenAiCompatibleProvider,
};
use crate::config::{ProviderConfig, ProviderId};
use crate::errors::AppError;

/// Chat backend selected at runtime
pub enum ChatProvider {
    /// xAI, `OpenAI` or Azure `OpenAI`
    OpenAiCompatible(OpenAiCompatibleProvider),
    /// Google Gemini
    Gemini(GeminiProvider),
    /// Anthropic Claude
    Anthropic(AnthropicProvider),
}

impl ChatProvider {
    /// Create the backend described by `config`
    ///
    /// # Errors
    ///
    /// Returns a config error when the API key is missing, or when Azure lacks
    /// an endpoint or deployment.
    pub fn from_config(config: &ProviderConfig) -> Result<Self, AppError> {
        info!(provider = %config.provider, "Initializing LLM provider");

        let provider = match config.provider {
            ProviderId::Xai | ProviderId::OpenAi | ProviderId::Azure => {
                let compatible = OpenAiCompatibleConfig::from_provider_config(config)?;
                Self::OpenAiCompatible(OpenAiCompatibleProvider::new(compatible)?)
            }
            ProviderId::Gemini => Self::Gemini(GeminiProvider::from_provider_config(config)?),
            ProviderId::Anthropic => {
                Self::Anthropic(AnthropicProvider::from_provider_config(config)?)
            }
        };

        debug!(
            "Provider {} initialized with model: {}",
            provider.display_name(),
            provider.default_model()
        );
        Ok(provider)
    }
}

#[async_trait]
impl LlmProvider for ChatProvider {
    fn name(&self) -> &'static str {
        match self {
            Self::OpenAiCompatible(p) => p.name(),
            Self::Gemini(p) => p.name(),
            Self::Anthropic(p) => p.name(),
        }
    }

    fn display_name(&self) -> &'static str {
        match self {
            Self::OpenAiCompatible(p) => p.display_name(),
            Self::Gemini(p) => p.display_name(),
            Self::Anthropic(p) => p.display_name(),
        }
    }

    fn capabilities(&self) -> LlmCapabilities {
        match self {
            Self::OpenAiCompatible(p) => p.capabilities(),
            Self::Gemini(p) => p.capabilities(),
            Self::Anthropic(p) => p.capabilities(),
        }
    }

    fn default_model(&self) -> &str {
        match self {
            Self::OpenAiCompatible(p) => p.default_model(),
            Self::Gemini(p) => p.default_model(),
            Self::Anthropic(p) => p.default_model(),
        }
    }

    fn available_models(&self) -> &'static [&'static str] {
        match self {
            Self::OpenAiCompatible(p) => p.available_models(),
            Self::Gemini(p) => p.available_models(),
            Self::Anthropic(p) => p.available_models(),
        }
    }

    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, AppError> {
        match self {
            Self::OpenAiCompatible(p) => p.complete(request).await,
            Self::Gemini(p) => p.complete(request).await,
            Self::Anthropic(p) => p.complete(request).await,
        }
    }
}

impl fmt::Debug for ChatProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OpenAiCompatible(p) => f.debug_tuple("OpenAiCompatible").field(p).finish(),
            Self::Gemini(p) => f.debug_tuple("Gemini").field(p).finish(),
            Self::Anthropic(p) => f.debug_tuple("Anthropic").field(p).finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorCode;

    #[test]
    fn test_selects_backend_by_provider() {
        let xai = ChatProvider::from_config(&ProviderConfig::new(ProviderId::Xai, "k")).unwrap();
        assert!(matches!(xai, ChatProvider::OpenAiCompatible(_)));
        assert_eq!(xai.default_model(), "grok-3");

        let claude =
            ChatProvider::from_config(&ProviderConfig::new(ProviderId::Anthropic, "k")).unwrap();
        assert!(matches!(claude, ChatProvider::Anthropic(_)));
        assert!(claude.capabilities().supports_multi_turn());

        let gemini =
            ChatProvider::from_config(&ProviderConfig::new(ProviderId::Gemini, "k")).unwrap();
        assert!(!gemini.capabilities().supports_multi_turn());
    }

    #[test]
    fn test_missing_key_is_rejected() {
        let err =
            ChatProvider::from_config(&ProviderConfig::new(ProviderId::OpenAi, "")).unwrap_err();
        assert_eq!(err.code, ErrorCode::ConfigError);
    }
}
