// ABOUTME: Integration tests for the JSON settings file and environment overrides
// ABOUTME: Covers round trips, corrupt files, retired model migration and provider validation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

use std::env;
use std::fs;

use garmin_chat::config::{
    provider_models, AssistantSettings, GarminCredentials, ProviderConfig, ProviderId,
};
use garmin_chat::errors::ErrorCode;
use serial_test::serial;
use tempfile::TempDir;

const ENV_VARS: &[&str] = &[
    "GARMIN_EMAIL",
    "GARMIN_PASSWORD",
    "GARMIN_CHAT_PROVIDER",
    "OPENAI_API_KEY",
    "AZURE_OPENAI_ENDPOINT",
    "GARMIN_TOKEN_DIR",
];

fn clear_env() {
    for var in ENV_VARS {
        env::remove_var(var);
    }
}

// ============================================================================
// File handling
// ============================================================================

#[test]
fn test_save_and_load_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("config.json");

    let mut settings = AssistantSettings {
        garmin: GarminCredentials::new("runner@example.com", "pw"),
        active_provider: ProviderId::Anthropic,
        ..AssistantSettings::default()
    };
    *settings.provider_config_mut(ProviderId::Anthropic) =
        ProviderConfig::new(ProviderId::Anthropic, "sk-ant").with_model("claude-3-5-haiku-20241022");
    settings.save_to(&path).unwrap();

    let loaded = AssistantSettings::load_from(&path);
    assert_eq!(loaded, settings);

    let raw = fs::read_to_string(&path).unwrap();
    assert!(raw.contains("\"active_provider\": \"anthropic\""));
}

#[test]
fn test_missing_empty_and_corrupt_files_fall_back_to_defaults() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("absent.json");
    assert_eq!(AssistantSettings::load_from(&missing), AssistantSettings::default());

    let empty = dir.path().join("empty.json");
    fs::write(&empty, "  \n").unwrap();
    assert_eq!(AssistantSettings::load_from(&empty), AssistantSettings::default());

    let corrupt = dir.path().join("corrupt.json");
    fs::write(&corrupt, "{ not json").unwrap();
    assert_eq!(AssistantSettings::load_from(&corrupt), AssistantSettings::default());
}

#[test]
fn test_retired_models_are_migrated_on_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.json");
    fs::write(
        &path,
        r#"{
            "active_provider": "gemini",
            "providers": {
                "gemini": { "provider": "gemini", "api_key": "g", "model": "gemini-2.0-flash-exp" },
                "xai": { "provider": "xai", "api_key": "x", "model": "grok-beta" },
                "openai": { "provider": "openai", "api_key": "o", "model": "gpt-4o" }
            }
        }"#,
    )
    .unwrap();

    let settings = AssistantSettings::load_from(&path);
    let model = |id: ProviderId| settings.providers[&id].model.clone().unwrap();
    assert_eq!(model(ProviderId::Gemini), "gemini-1.5-flash");
    assert_eq!(model(ProviderId::Xai), "grok-3");
    assert_eq!(model(ProviderId::OpenAi), "gpt-4o");
}

// ============================================================================
// Environment overrides
// ============================================================================

#[test]
#[serial]
fn test_env_overrides_replace_file_values() {
    clear_env();
    let dir = TempDir::new().unwrap();
    env::set_var("GARMIN_EMAIL", "env@example.com");
    env::set_var("GARMIN_CHAT_PROVIDER", "openai");
    env::set_var("OPENAI_API_KEY", "sk-env");
    env::set_var("GARMIN_TOKEN_DIR", dir.path());

    let mut settings = AssistantSettings {
        garmin: GarminCredentials::new("file@example.com", "file-pw"),
        ..AssistantSettings::default()
    };
    settings.apply_env_overrides();

    assert_eq!(settings.garmin.email, "env@example.com");
    assert_eq!(settings.garmin.password, "file-pw");
    assert_eq!(settings.active_provider, ProviderId::OpenAi);
    assert_eq!(settings.active_config().unwrap().api_key, "sk-env");
    assert_eq!(settings.token_dir(), dir.path());
    clear_env();
}

#[test]
#[serial]
fn test_unknown_provider_in_env_is_ignored() {
    clear_env();
    env::set_var("GARMIN_CHAT_PROVIDER", "mistral");

    let mut settings = AssistantSettings::default();
    settings.apply_env_overrides();
    assert_eq!(settings.active_provider, ProviderId::Xai);
    clear_env();
}

// ============================================================================
// Provider configuration
// ============================================================================

#[test]
fn test_unconfigured_active_provider_is_an_error() {
    let settings = AssistantSettings::default();
    let error = settings.active_config().unwrap_err();
    assert_eq!(error.code, ErrorCode::ConfigError);
}

#[test]
fn test_validation_rules() {
    assert!(ProviderConfig::new(ProviderId::OpenAi, "  ").validate().is_err());
    assert!(ProviderConfig::new(ProviderId::OpenAi, "sk").validate().is_ok());

    let azure = ProviderConfig::new(ProviderId::Azure, "key");
    let error = azure.validate().unwrap_err();
    assert!(error.message.contains("endpoint is required"));

    let azure = azure.with_azure("https://example.openai.azure.com", "gpt4o-prod");
    assert!(azure.validate().is_ok());
    assert_eq!(azure.resolved_deployment().as_deref(), Some("gpt4o-prod"));
    assert_eq!(azure.resolved_api_version(), "2024-02-15-preview");
}

#[test]
fn test_model_resolution() {
    let openai = ProviderConfig::new(ProviderId::OpenAi, "k");
    assert_eq!(openai.resolved_model().as_deref(), Some("gpt-4o"));
    assert_eq!(
        openai.with_model("gpt-4o-mini").resolved_model().as_deref(),
        Some("gpt-4o-mini")
    );

    let azure = ProviderConfig::new(ProviderId::Azure, "k").with_azure("https://e", "dep");
    assert_eq!(azure.resolved_model().as_deref(), Some("dep"));
}

#[test]
fn test_provider_catalog_lookup() {
    assert_eq!(provider_models("xai")[0], "grok-3");
    assert!(provider_models("azure").is_empty());
    assert!(provider_models("nope").is_empty());
    assert!("OpenAI".parse::<ProviderId>().is_ok());
}
