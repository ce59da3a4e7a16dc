// ABOUTME: Conversation session over one LLM provider with replayed history
// ABOUTME: Builds the per-provider message shape and turns failures into readable text
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use tracing::{debug, error, info, instrument};

use super::{
    describe_error, get_garmin_system_prompt, ChatMessage, ChatProvider, ChatRequest, LlmProvider,
};
use crate::config::{ProviderConfig, ProviderId};
use crate::errors::{AppError, AppResult};

/// Completion token limit sent with every request
pub const DEFAULT_MAX_TOKENS: u32 = 2000;

/// Sampling temperature sent with every request
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Chat history bound to one provider
pub struct ChatSession {
    provider: Box<dyn LlmProvider>,
    provider_id: ProviderId,
    model: String,
    system_prompt: String,
    history: Vec<ChatMessage>,
}

impl ChatSession {
    /// Session over an already constructed provider
    #[must_use]
    pub fn new(provider: Box<dyn LlmProvider>, provider_id: ProviderId) -> Self {
        let model = provider.default_model().to_owned();
        Self {
            provider,
            provider_id,
            model,
            system_prompt: get_garmin_system_prompt().to_owned(),
            history: Vec::new(),
        }
    }

    /// Session for the provider described by `config`
    ///
    /// # Errors
    ///
    /// Returns a config error when required fields are missing
    pub fn from_config(config: &ProviderConfig) -> AppResult<Self> {
        let provider = ChatProvider::from_config(config)?;
        info!(provider = %config.provider, model = provider.default_model(), "Chat session ready");
        Ok(Self::new(Box::new(provider), config.provider))
    }

    /// Replace the system prompt
    #[must_use]
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    /// Provider this session talks to
    #[must_use]
    pub const fn provider_id(&self) -> ProviderId {
        self.provider_id
    }

    /// Model sent with each request
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Completed turns, oldest first
    #[must_use]
    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    /// Forget every earlier turn
    pub fn reset_conversation(&mut self) {
        self.history.clear();
        info!("Conversation history cleared");
    }

    fn user_turn(message: &str, context: Option<&str>) -> String {
        match context {
            Some(context) if !context.is_empty() => {
                format!("{context}\n\nUser Question: {message}")
            }
            _ => message.to_owned(),
        }
    }

    /// Messages for one call given the new user turn
    fn build_messages(&self, user_turn: &str) -> Vec<ChatMessage> {
        if self.provider.capabilities().supports_multi_turn() {
            let mut messages = Vec::with_capacity(self.history.len() + 2);
            messages.push(ChatMessage::system(self.system_prompt.clone()));
            messages.extend(self.history.iter().cloned());
            messages.push(ChatMessage::user(user_turn));
            messages
        } else if self.history.is_empty() {
            vec![ChatMessage::user(format!(
                "{}\n\n{user_turn}",
                self.system_prompt
            ))]
        } else {
            vec![ChatMessage::user(user_turn)]
        }
    }

    /// Send one turn, returning the provider error untouched on failure
    ///
    /// History is only extended after a successful reply.
    ///
    /// # Errors
    ///
    /// Returns the provider's error, whose message carries the raw failure text
    #[instrument(skip_all, fields(provider = %self.provider_id))]
    pub async fn send(&mut self, message: &str, context: Option<&str>) -> AppResult<String> {
        let user_turn = Self::user_turn(message, context);
        let request = ChatRequest::new(self.build_messages(&user_turn))
            .with_model(self.model.clone())
            .with_max_tokens(DEFAULT_MAX_TOKENS)
            .with_temperature(DEFAULT_TEMPERATURE);

        let response = self.provider.complete(&request).await?;
        debug!(
            history = self.history.len(),
            usage = ?response.usage,
            "Provider replied"
        );

        self.history.push(ChatMessage::user(user_turn));
        self.history
            .push(ChatMessage::assistant(response.content.clone()));
        Ok(response.content)
    }

    /// Send one turn; failures come back as remediation text
    pub async fn chat(&mut self, message: &str, context: Option<&str>) -> String {
        match self.send(message, context).await {
            Ok(reply) => reply,
            Err(e) => self.remediation(&e),
        }
    }

    /// Log a failed [`Self::send`] and turn it into user guidance
    #[must_use]
    pub fn remediation(&self, error: &AppError) -> String {
        error!(
            "Error calling {}: {}",
            self.provider_id.info().display_name,
            error.message
        );
        describe_error(self.provider_id, &self.model, &error.message)
    }
}
