// ABOUTME: Configuration module for the chat assistant
// ABOUTME: Provider catalog types and the persisted settings file
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Configuration
//!
//! - **Types**: provider identifiers and the static provider catalog
//! - **Settings**: credentials and per-provider configuration persisted as JSON

/// Persisted settings
pub mod settings;
/// Provider identifiers and catalog
pub mod types;

pub use settings::{AssistantSettings, GarminCredentials, ProviderConfig};
pub use types::{list_providers, provider_models, ProviderId, ProviderInfo, PROVIDER_CATALOG};
