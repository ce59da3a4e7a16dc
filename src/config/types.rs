// ABOUTME: LLM provider identifiers and the static provider catalog
// ABOUTME: Display names, endpoints, model lists and billing links for the five supported vendors
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::AppError;

/// Supported LLM vendors
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    /// xAI Grok, `OpenAI`-compatible endpoint
    #[default]
    Xai,
    /// `OpenAI` chat completions
    #[serde(rename = "openai")]
    OpenAi,
    /// Azure-hosted `OpenAI` deployment
    Azure,
    /// Google Gemini generative language API
    Gemini,
    /// Anthropic messages API
    Anthropic,
}

impl ProviderId {
    /// Environment variable for selecting the active provider
    pub const ENV_VAR: &'static str = "GARMIN_CHAT_PROVIDER";

    /// Every provider in display order
    pub const ALL: [Self; 5] = [
        Self::Xai,
        Self::OpenAi,
        Self::Azure,
        Self::Gemini,
        Self::Anthropic,
    ];

    /// Stable identifier used in settings files and on the command line
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Xai => "xai",
            Self::OpenAi => "openai",
            Self::Azure => "azure",
            Self::Gemini => "gemini",
            Self::Anthropic => "anthropic",
        }
    }

    /// Environment variable holding this provider's API key
    #[must_use]
    pub const fn api_key_env_var(&self) -> &'static str {
        match self {
            Self::Xai => "XAI_API_KEY",
            Self::OpenAi => "OPENAI_API_KEY",
            Self::Azure => "AZURE_OPENAI_API_KEY",
            Self::Gemini => "GEMINI_API_KEY",
            Self::Anthropic => "ANTHROPIC_API_KEY",
        }
    }

    /// Static catalog entry for this provider
    #[must_use]
    pub fn info(&self) -> &'static ProviderInfo {
        match self {
            Self::Xai => &PROVIDER_CATALOG[0],
            Self::OpenAi => &PROVIDER_CATALOG[1],
            Self::Azure => &PROVIDER_CATALOG[2],
            Self::Gemini => &PROVIDER_CATALOG[3],
            Self::Anthropic => &PROVIDER_CATALOG[4],
        }
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderId {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "xai" | "grok" => Ok(Self::Xai),
            "openai" | "chatgpt" => Ok(Self::OpenAi),
            "azure" | "azure-openai" => Ok(Self::Azure),
            "gemini" | "google" => Ok(Self::Gemini),
            "anthropic" | "claude" => Ok(Self::Anthropic),
            other => Err(AppError::invalid_input(format!(
                "Unsupported provider: {other}. Choose from: xai, openai, azure, gemini, anthropic"
            ))),
        }
    }
}

/// Static metadata describing one provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProviderInfo {
    /// Provider identifier
    pub id: ProviderId,
    /// Human-readable name
    pub display_name: &'static str,
    /// API base URL (`None` when the user supplies it, as for Azure)
    pub base_url: Option<&'static str>,
    /// Models offered in settings
    pub models: &'static [&'static str],
    /// Model used when none is configured
    pub default_model: Option<&'static str>,
    /// Where to manage billing and quota
    pub dashboard_url: &'static str,
    /// Whether an endpoint and deployment must be configured
    pub requires_deployment: bool,
    /// Setup hint shown alongside the provider
    pub note: Option<&'static str>,
}

/// Every supported provider, in [`ProviderId::ALL`] order
pub static PROVIDER_CATALOG: [ProviderInfo; 5] = [
    ProviderInfo {
        id: ProviderId::Xai,
        display_name: "xAI (Grok)",
        base_url: Some("https://api.x.ai/v1"),
        models: &["grok-3", "grok-vision-beta", "grok-2-vision-1212"],
        default_model: Some("grok-3"),
        dashboard_url: "https://console.x.ai/",
        requires_deployment: false,
        note: None,
    },
    ProviderInfo {
        id: ProviderId::OpenAi,
        display_name: "OpenAI (ChatGPT)",
        base_url: Some("https://api.openai.com/v1"),
        models: &["gpt-4o", "gpt-4o-mini", "gpt-4-turbo", "gpt-3.5-turbo"],
        default_model: Some("gpt-4o"),
        dashboard_url: "https://platform.openai.com/account/billing",
        requires_deployment: false,
        note: None,
    },
    ProviderInfo {
        id: ProviderId::Azure,
        display_name: "Azure OpenAI",
        base_url: None,
        models: &[],
        default_model: None,
        dashboard_url: "https://portal.azure.com/",
        requires_deployment: true,
        note: Some("Requires your resource endpoint and a deployment name"),
    },
    ProviderInfo {
        id: ProviderId::Gemini,
        display_name: "Google Gemini",
        base_url: Some("https://generativelanguage.googleapis.com/v1beta"),
        models: &["gemini-1.5-flash", "gemini-1.5-flash-8b", "gemini-1.5-pro"],
        default_model: Some("gemini-1.5-flash"),
        dashboard_url: "https://makersuite.google.com/",
        requires_deployment: false,
        note: Some(
            "If models are not found, your API key may need the Gemini API enabled in Google Cloud Console",
        ),
    },
    ProviderInfo {
        id: ProviderId::Anthropic,
        display_name: "Anthropic (Claude)",
        base_url: Some("https://api.anthropic.com/v1"),
        models: &[
            "claude-opus-4-5-20251101",
            "claude-sonnet-4-5-20250929",
            "claude-3-5-sonnet-20241022",
            "claude-3-5-haiku-20241022",
        ],
        default_model: Some("claude-sonnet-4-5-20250929"),
        dashboard_url: "https://console.anthropic.com/settings/billing",
        requires_deployment: false,
        note: None,
    },
];

/// All providers with their metadata
#[must_use]
pub fn list_providers() -> &'static [ProviderInfo] {
    &PROVIDER_CATALOG
}

/// Models offered for a provider given by identifier; empty for unknown ids
#[must_use]
pub fn provider_models(id: &str) -> &'static [&'static str] {
    id.parse::<ProviderId>()
        .map_or(&[], |provider| provider.info().models)
}
