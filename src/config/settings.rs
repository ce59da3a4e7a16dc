// ABOUTME: Persistent assistant settings stored as JSON under the user's home directory
// ABOUTME: Garmin credentials, per-provider LLM configuration, model migrations and env overrides
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Settings file handling
//!
//! The file lives at `~/.garmin_chat/config.json`. A missing, empty or corrupt
//! file is never fatal: the assistant starts from defaults and the next save
//! rewrites it.

use std::collections::BTreeMap;
use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::types::ProviderId;
use crate::errors::{AppError, AppResult};

/// Directory under the home directory holding settings and history
pub const SETTINGS_DIR_NAME: &str = ".garmin_chat";
/// Settings file name
pub const SETTINGS_FILE_NAME: &str = "config.json";
/// Default Garmin token directory name under the home directory
pub const TOKEN_DIR_NAME: &str = ".garmin_tokens";
/// Default Azure `OpenAI` API version
pub const DEFAULT_AZURE_API_VERSION: &str = "2024-02-15-preview";

/// Retired model names and their replacements, applied on load
const MODEL_MIGRATIONS: &[(&str, &str)] = &[
    ("gemini-2.0-flash-exp", "gemini-1.5-flash"),
    ("gemini-exp-1206", "gemini-1.5-flash"),
    ("gemini-1.5-pro-latest", "gemini-1.5-pro"),
    ("gemini-1.5-flash-latest", "gemini-1.5-flash"),
    ("grok-beta", "grok-3"),
    ("grok-2-1212", "grok-3"),
];

/// Garmin Connect login credentials
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GarminCredentials {
    /// Account email
    #[serde(default)]
    pub email: String,
    /// Account password
    #[serde(default)]
    pub password: String,
}

impl GarminCredentials {
    /// Create credentials from an email and password
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    /// Both fields are filled in
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.email.trim().is_empty() && !self.password.is_empty()
    }
}

impl fmt::Debug for GarminCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GarminCredentials")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Configuration for one LLM provider
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Which provider this entry configures
    pub provider: ProviderId,
    /// API key
    #[serde(default)]
    pub api_key: String,
    /// Selected model; the catalog default applies when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Azure resource endpoint, e.g. `https://my-resource.openai.azure.com`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub azure_endpoint: Option<String>,
    /// Azure deployment name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub azure_deployment: Option<String>,
    /// Azure API version
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub azure_api_version: Option<String>,
}

impl ProviderConfig {
    /// Create a configuration with an API key and catalog defaults
    pub fn new(provider: ProviderId, api_key: impl Into<String>) -> Self {
        Self {
            provider,
            api_key: api_key.into(),
            model: None,
            azure_endpoint: None,
            azure_deployment: None,
            azure_api_version: None,
        }
    }

    /// Set the model
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set the Azure endpoint and deployment
    #[must_use]
    pub fn with_azure(mut self, endpoint: impl Into<String>, deployment: impl Into<String>) -> Self {
        self.azure_endpoint = Some(endpoint.into());
        self.azure_deployment = Some(deployment.into());
        self
    }

    /// Model to use: configured, else the catalog default, else the Azure deployment
    #[must_use]
    pub fn resolved_model(&self) -> Option<String> {
        self.model
            .clone()
            .filter(|m| !m.trim().is_empty())
            .or_else(|| self.provider.info().default_model.map(str::to_owned))
            .or_else(|| self.azure_deployment.clone())
    }

    /// Azure deployment, defaulting to the model name
    #[must_use]
    pub fn resolved_deployment(&self) -> Option<String> {
        self.azure_deployment
            .clone()
            .filter(|d| !d.trim().is_empty())
            .or_else(|| self.model.clone().filter(|m| !m.trim().is_empty()))
    }

    /// Azure API version, defaulting to [`DEFAULT_AZURE_API_VERSION`]
    #[must_use]
    pub fn resolved_api_version(&self) -> String {
        self.azure_api_version
            .clone()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_AZURE_API_VERSION.to_owned())
    }

    /// Check that the fields required to build a client are present
    ///
    /// # Errors
    ///
    /// Returns a config error naming the first missing field
    pub fn validate(&self) -> AppResult<()> {
        let name = self.provider.info().display_name;
        if self.api_key.trim().is_empty() {
            return Err(AppError::config(format!("{name} API key is required")));
        }
        if self.provider.info().requires_deployment {
            if self
                .azure_endpoint
                .as_deref()
                .is_none_or(|e| e.trim().is_empty())
            {
                return Err(AppError::config(format!("{name} endpoint is required")));
            }
            if self.resolved_deployment().is_none() {
                return Err(AppError::config(format!(
                    "{name} deployment name is required"
                )));
            }
        }
        Ok(())
    }
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("provider", &self.provider)
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .field("azure_endpoint", &self.azure_endpoint)
            .field("azure_deployment", &self.azure_deployment)
            .field("azure_api_version", &self.azure_api_version)
            .finish()
    }
}

/// Everything the assistant remembers between runs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssistantSettings {
    /// Garmin Connect credentials
    #[serde(default)]
    pub garmin: GarminCredentials,
    /// Provider used for chat
    #[serde(default)]
    pub active_provider: ProviderId,
    /// Per-provider configuration; switching providers keeps other entries
    #[serde(default)]
    pub providers: BTreeMap<ProviderId, ProviderConfig>,
    /// Override for the Garmin token directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_dir: Option<PathBuf>,
    /// Override for the chat history directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history_dir: Option<PathBuf>,
}

fn home_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("."))
}

impl AssistantSettings {
    /// `~/.garmin_chat`
    #[must_use]
    pub fn settings_dir() -> PathBuf {
        home_dir().join(SETTINGS_DIR_NAME)
    }

    /// `~/.garmin_chat/config.json`
    #[must_use]
    pub fn default_path() -> PathBuf {
        Self::settings_dir().join(SETTINGS_FILE_NAME)
    }

    /// Load from the default path and apply environment overrides
    #[must_use]
    pub fn load() -> Self {
        let mut settings = Self::load_from(&Self::default_path());
        settings.apply_env_overrides();
        settings
    }

    /// Load from a path, falling back to defaults when the file is absent,
    /// empty or unparseable
    #[must_use]
    pub fn load_from(path: &Path) -> Self {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(_) => return Self::default(),
        };
        if raw.trim().is_empty() {
            return Self::default();
        }

        match serde_json::from_str::<Self>(&raw) {
            Ok(mut settings) => {
                if settings.migrate_models() {
                    info!(path = %path.display(), "Migrated retired model names in settings");
                }
                settings
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Settings file is corrupt, using defaults");
                Self::default()
            }
        }
    }

    /// Save to the default path
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or the file written
    pub fn save(&self) -> AppResult<()> {
        self.save_to(&Self::default_path())
    }

    /// Save as pretty JSON, creating parent directories
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or the file written
    pub fn save_to(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Replace retired model names; returns whether anything changed
    pub fn migrate_models(&mut self) -> bool {
        let mut changed = false;
        for config in self.providers.values_mut() {
            let Some(model) = config.model.as_deref() else {
                continue;
            };
            if let Some((_, replacement)) = MODEL_MIGRATIONS.iter().find(|(old, _)| *old == model)
            {
                config.model = Some((*replacement).to_owned());
                changed = true;
            }
        }
        changed
    }

    /// Overlay values from environment variables
    pub fn apply_env_overrides(&mut self) {
        if let Ok(email) = env::var("GARMIN_EMAIL") {
            self.garmin.email = email;
        }
        if let Ok(password) = env::var("GARMIN_PASSWORD") {
            self.garmin.password = password;
        }
        if let Ok(provider) = env::var(ProviderId::ENV_VAR) {
            match provider.parse() {
                Ok(id) => self.active_provider = id,
                Err(e) => warn!(error = %e, "Ignoring {}", ProviderId::ENV_VAR),
            }
        }
        for id in ProviderId::ALL {
            if let Ok(key) = env::var(id.api_key_env_var()) {
                self.provider_config_mut(id).api_key = key;
            }
        }
        if let Ok(endpoint) = env::var("AZURE_OPENAI_ENDPOINT") {
            self.provider_config_mut(ProviderId::Azure).azure_endpoint = Some(endpoint);
        }
        if let Ok(deployment) = env::var("AZURE_OPENAI_DEPLOYMENT") {
            self.provider_config_mut(ProviderId::Azure).azure_deployment = Some(deployment);
        }
        if let Ok(dir) = env::var("GARMIN_TOKEN_DIR") {
            self.token_dir = Some(PathBuf::from(dir));
        }
    }

    /// Configuration entry for a provider, created empty if missing
    pub fn provider_config_mut(&mut self, id: ProviderId) -> &mut ProviderConfig {
        self.providers
            .entry(id)
            .or_insert_with(|| ProviderConfig::new(id, ""))
    }

    /// Configuration for the active provider
    ///
    /// # Errors
    ///
    /// Returns a config error when the active provider has never been configured
    pub fn active_config(&self) -> AppResult<&ProviderConfig> {
        self.providers.get(&self.active_provider).ok_or_else(|| {
            AppError::config(format!(
                "{} is not configured",
                self.active_provider.info().display_name
            ))
        })
    }

    /// Garmin token directory, default `~/.garmin_tokens`
    #[must_use]
    pub fn token_dir(&self) -> PathBuf {
        self.token_dir
            .clone()
            .unwrap_or_else(|| home_dir().join(TOKEN_DIR_NAME))
    }

    /// Chat history directory, default `~/.garmin_chat/chat_history`
    #[must_use]
    pub fn history_dir(&self) -> PathBuf {
        self.history_dir
            .clone()
            .unwrap_or_else(|| Self::settings_dir().join("chat_history"))
    }
}
