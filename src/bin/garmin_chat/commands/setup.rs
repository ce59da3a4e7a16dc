// ABOUTME: Provider catalog and settings commands for garmin-chat
// ABOUTME: Lists providers and models and writes provider, key and Garmin account settings
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::path::Path;

use anyhow::{bail, Result};
use clap::Args;
use garmin_chat::config::{list_providers, AssistantSettings, ProviderId};

use crate::helpers::display::{display_models, display_providers, display_settings};

/// Fields `configure` can change; anything left out stays as it was
#[derive(Args)]
pub struct ConfigureArgs {
    /// Provider to make active (xai, openai, azure, gemini, anthropic)
    #[arg(long)]
    pub provider: Option<String>,

    /// Model for the selected provider
    #[arg(long)]
    pub model: Option<String>,

    /// API key for the selected provider
    #[arg(long)]
    pub api_key: Option<String>,

    /// Azure `OpenAI` resource endpoint
    #[arg(long)]
    pub azure_endpoint: Option<String>,

    /// Azure `OpenAI` deployment name
    #[arg(long)]
    pub azure_deployment: Option<String>,

    /// Azure `OpenAI` API version
    #[arg(long)]
    pub azure_api_version: Option<String>,

    /// Garmin Connect account email
    #[arg(long)]
    pub garmin_email: Option<String>,

    /// Garmin Connect password (prefer the `GARMIN_PASSWORD` variable)
    #[arg(long)]
    pub garmin_password: Option<String>,
}

/// `providers`
pub fn providers(active: ProviderId) {
    display_providers(list_providers(), active.as_str());
}

/// `models <provider>`
pub fn models(provider: &str) -> Result<()> {
    let id: ProviderId = provider.parse()?;
    display_models(id.info());
    Ok(())
}

/// `configure`
pub fn configure(mut settings: AssistantSettings, args: &ConfigureArgs, path: &Path) -> Result<()> {
    let target = match args.provider.as_deref() {
        Some(provider) => provider.parse::<ProviderId>()?,
        None => settings.active_provider,
    };

    if let Some(model) = &args.model {
        let offered = target.info().models;
        if !offered.is_empty() && !offered.contains(&model.as_str()) {
            bail!(
                "Unknown model {model} for {}. Available: {}",
                target.info().display_name,
                offered.join(", ")
            );
        }
    }

    let config = settings.provider_config_mut(target);
    if let Some(model) = &args.model {
        config.model = Some(model.clone());
    }
    if let Some(key) = &args.api_key {
        config.api_key.clone_from(key);
    }
    if let Some(endpoint) = &args.azure_endpoint {
        config.azure_endpoint = Some(endpoint.clone());
    }
    if let Some(deployment) = &args.azure_deployment {
        config.azure_deployment = Some(deployment.clone());
    }
    if let Some(version) = &args.azure_api_version {
        config.azure_api_version = Some(version.clone());
    }
    if args.provider.is_some() {
        settings.active_provider = target;
    }
    if let Some(email) = &args.garmin_email {
        settings.garmin.email.clone_from(email);
    }
    if let Some(password) = &args.garmin_password {
        settings.garmin.password.clone_from(password);
    }

    settings.save_to(path)?;
    display_settings(&settings);
    Ok(())
}
