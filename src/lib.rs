// ABOUTME: Main library entry point for the Garmin Chat assistant
// ABOUTME: Natural-language questions over Garmin Connect data, answered by a choice of LLM providers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![deny(unsafe_code)]

//! # Garmin Chat
//!
//! Ask questions about your Garmin Connect data in plain language. Each
//! message is routed to a topic and time scope, the matching metrics are
//! fetched and rendered into a text context, and the context is sent with the
//! question to the configured LLM provider.
//!
//! ## Architecture
//!
//! - **Auth**: Garmin session lifecycle with MFA
//! - **Garmin**: Connect SSO and data client, token persistence
//! - **Metrics**: per-category fetchers normalizing Connect responses
//! - **Intent**: topic and time-scope routing
//! - **Context**: text rendering and conversation memory
//! - **LLM**: provider adapters, chat session, error classification
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use garmin_chat::assistant::GarminChat;
//! use garmin_chat::auth::AuthOutcome;
//! use garmin_chat::config::AssistantSettings;
//! use garmin_chat::errors::AppResult;
//!
//! #[tokio::main]
//! async fn main() -> AppResult<()> {
//!     let mut chat = GarminChat::new(AssistantSettings::load())?;
//!     if chat.authenticate().await == AuthOutcome::Success {
//!         let answer = chat.process_message("How did I sleep last night?").await?;
//!         println!("{answer}");
//!     }
//!     Ok(())
//! }
//! ```

/// Request pipeline orchestration
pub mod assistant;

/// Garmin authentication gate
pub mod auth;

/// Provider catalog and persisted settings
pub mod config;

/// Context rendering and conversation memory
pub mod context;

/// Unified error handling
pub mod errors;

/// Garmin Connect client and token storage
pub mod garmin;

/// Message routing by topic and time scope
pub mod intent;

/// LLM providers and chat sessions
pub mod llm;

/// Structured logging setup
pub mod logging;

/// Metric fetchers and normalized records
pub mod metrics;
