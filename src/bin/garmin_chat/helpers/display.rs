// ABOUTME: Output formatting helpers for garmin-chat
// ABOUTME: Provider catalog tables, chat banner and answer rendering
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use garmin_chat::config::{AssistantSettings, ProviderInfo};

/// Display every provider with its default model and notes
pub fn display_providers(providers: &[ProviderInfo], active: &str) {
    println!("\nSupported AI providers");
    println!("{}", "=".repeat(60));
    for info in providers {
        let marker = if info.id.as_str() == active { "*" } else { " " };
        println!("{marker} {:<10} {}", info.id.as_str(), info.display_name);
        if let Some(model) = info.default_model {
            println!("    default model: {model}");
        }
        if info.requires_deployment {
            println!("    requires: endpoint and deployment name");
        }
        if let Some(note) = info.note {
            println!("    note: {note}");
        }
        println!("    billing: {}", info.dashboard_url);
    }
    println!("\n* active provider");
}

/// Display the model list for one provider
pub fn display_models(info: &ProviderInfo) {
    println!("\n{} models", info.display_name);
    println!("{}", "=".repeat(40));
    if info.models.is_empty() {
        println!("Uses your own deployment name; no fixed model list.");
        return;
    }
    for model in info.models {
        let marker = if info.default_model == Some(*model) {
            " (default)"
        } else {
            ""
        };
        println!("  • {model}{marker}");
    }
}

/// Summary after saving settings
pub fn display_settings(settings: &AssistantSettings) {
    println!("\nSettings saved");
    println!("{}", "=".repeat(40));
    let email = if settings.garmin.email.is_empty() {
        "(not set)"
    } else {
        settings.garmin.email.as_str()
    };
    println!("   Garmin account: {email}");
    println!(
        "   Active provider: {}",
        settings.active_provider.info().display_name
    );
    for (id, config) in &settings.providers {
        let key = if config.api_key.is_empty() {
            "no key"
        } else {
            "key set"
        };
        let model = config.resolved_model().unwrap_or_default();
        println!("   {id}: {key}, model {model}");
    }
}

/// Chat banner with the available slash commands
pub fn display_banner() {
    println!("\nGarmin Chat");
    println!("{}", "=".repeat(40));
    println!("Ask anything about your Garmin data.");
    println!("Commands: /reset  /save  /quit");
}

/// An assistant answer
pub fn display_answer(answer: &str) {
    println!("\nGarmin Chat: {answer}\n");
}
