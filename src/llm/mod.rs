// ABOUTME: LLM provider abstraction over the hosted chat backends the assistant can talk to
// ABOUTME: Message, request and response types, capability flags and the provider trait
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # LLM Provider Interface
//!
//! Every backend implements [`LlmProvider::complete`] over the same
//! [`ChatRequest`] and [`ChatResponse`] types. Wire formats stay inside each
//! provider module:
//!
//! - **`OpenAiCompatibleProvider`**: xAI, `OpenAI` and Azure `OpenAI` chat completions
//! - **`AnthropicProvider`**: Anthropic messages API with a separate system field
//! - **`GeminiProvider`**: Google `generateContent`, single turn
//!
//! [`ChatSession`] layers conversation history on top, and [`classify`] turns
//! provider failures into readable guidance.
//!
//! ## Example
//!
//! ```rust,no_run
//! use garmin_chat::config::{ProviderConfig, ProviderId};
//! use garmin_chat::llm::ChatSession;
//!
//! # async fn example() -> garmin_chat::errors::AppResult<()> {
//! let config = ProviderConfig::new(ProviderId::OpenAi, "sk-...");
//! let mut session = ChatSession::from_config(&config)?;
//! let answer = session.chat("How did I sleep?", Some("=== Last Night's Sleep ===")).await;
//! println!("{answer}");
//! # Ok(())
//! # }
//! ```

mod anthropic;
pub mod classify;
mod gemini;
mod openai_compatible;
pub mod prompts;
mod provider;
mod session;

pub use anthropic::AnthropicProvider;
pub use classify::{classify_error, describe_error, ErrorCategory};
pub use gemini::GeminiProvider;
pub use openai_compatible::{AuthStyle, OpenAiCompatibleConfig, OpenAiCompatibleProvider};
pub use prompts::get_garmin_system_prompt;
pub use provider::ChatProvider;
pub use session::{ChatSession, DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE};

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;

/// Connection timeout for hosted providers
const CONNECT_TIMEOUT_SECS: u64 = 15;

/// Whole-request timeout; long answers can take a while
const REQUEST_TIMEOUT_SECS: u64 = 120;

/// HTTP client shared by the provider constructors
pub(crate) fn http_client() -> Result<Client, AppError> {
    Client::builder()
        .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
        .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .build()
        .map_err(|e| AppError::internal(format!("Failed to create HTTP client: {e}")))
}

/// Transport failure text that keeps the timeout and connection signals readable
pub(crate) fn transport_error(provider: &str, error: &reqwest::Error) -> AppError {
    let message = if error.is_timeout() {
        format!("{provider} request timed out: {error}")
    } else if error.is_connect() {
        format!("{provider} connection error: {error}")
    } else {
        format!("{provider} request failed: {error}")
    };
    AppError::external_service(provider, message)
}

// ============================================================================
// Capability Flags
// ============================================================================

bitflags::bitflags! {
    /// What a backend accepts in a request
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
    pub struct LlmCapabilities: u8 {
        /// A system instruction can travel with the request
        const SYSTEM_MESSAGES = 0b0000_0001;
        /// Earlier turns can be replayed with each request
        const MULTI_TURN = 0b0000_0010;
        /// Sampling temperature is honoured
        const TEMPERATURE = 0b0000_0100;
    }
}

impl LlmCapabilities {
    /// System prompt, replayed history and temperature
    #[must_use]
    pub const fn conversational() -> Self {
        Self::SYSTEM_MESSAGES
            .union(Self::MULTI_TURN)
            .union(Self::TEMPERATURE)
    }

    /// One prompt per call, no system instruction
    #[must_use]
    pub const fn single_turn() -> Self {
        Self::TEMPERATURE
    }

    /// Check if system instructions are accepted
    #[must_use]
    pub const fn supports_system_messages(&self) -> bool {
        self.contains(Self::SYSTEM_MESSAGES)
    }

    /// Check if history can be replayed
    #[must_use]
    pub const fn supports_multi_turn(&self) -> bool {
        self.contains(Self::MULTI_TURN)
    }
}

// ============================================================================
// Message Types
// ============================================================================

/// Role of a message in the conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// System instruction message
    System,
    /// User input message
    User,
    /// Assistant response message
    Assistant,
}

impl MessageRole {
    /// Wire name used by the chat-completions and messages APIs
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// A single message in a chat conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role of the message sender
    pub role: MessageRole,
    /// Content of the message
    pub content: String,
}

impl ChatMessage {
    /// Create a new chat message
    #[must_use]
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Create a system message
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(MessageRole::System, content)
    }

    /// Create a user message
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    /// Create an assistant message
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Configuration for a chat completion request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Conversation messages
    pub messages: Vec<ChatMessage>,
    /// Model identifier (provider-specific)
    pub model: Option<String>,
    /// Temperature for response randomness (0.0 - 2.0)
    pub temperature: Option<f32>,
    /// Maximum tokens to generate
    pub max_tokens: Option<u32>,
}

impl ChatRequest {
    /// Create a new chat request with messages
    #[must_use]
    pub const fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            model: None,
            temperature: None,
            max_tokens: None,
        }
    }

    /// Set the model to use
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set the temperature
    #[must_use]
    pub const fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the maximum tokens
    #[must_use]
    pub const fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Content of the leading system message, if any
    #[must_use]
    pub fn system_prompt(&self) -> Option<&str> {
        self.messages
            .iter()
            .find(|m| m.role == MessageRole::System)
            .map(|m| m.content.as_str())
    }
}

/// Response from a chat completion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    /// Generated message content
    pub content: String,
    /// Model used for generation
    pub model: String,
    /// Token usage statistics
    pub usage: Option<TokenUsage>,
    /// Finish reason (stop, length, etc.)
    pub finish_reason: Option<String>,
}

/// Token usage statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Number of tokens in the prompt
    pub prompt_tokens: u32,
    /// Number of tokens in the completion
    pub completion_tokens: u32,
    /// Total tokens used
    pub total_tokens: u32,
}

// ============================================================================
// Provider Trait
// ============================================================================

/// Chat completion backend
///
/// Errors carry the provider's raw failure text in `AppError::message` so the
/// classifier can recognise status codes and vendor error names.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Short identifier, e.g. `openai`
    fn name(&self) -> &'static str;

    /// Human-readable display name for the provider
    fn display_name(&self) -> &'static str;

    /// What the backend accepts
    fn capabilities(&self) -> LlmCapabilities;

    /// Model used when the request names none
    fn default_model(&self) -> &str;

    /// Models offered in the catalog
    fn available_models(&self) -> &'static [&'static str];

    /// Perform a chat completion
    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, AppError>;
}
