// ABOUTME: GarminChat orchestrator tying authentication, routing, context assembly and the LLM together
// ABOUTME: One question in, one answer out, with conversation memory and saved transcripts
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Assistant
//!
//! [`GarminChat`] runs the request pipeline: the message is routed, the
//! matching Garmin data is fetched and rendered, and the result is sent to
//! the active provider. Every await is sequential.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{Local, NaiveDate};
use tracing::info;

use crate::auth::{AuthGate, AuthOutcome, AuthState};
use crate::config::{AssistantSettings, GarminCredentials, ProviderConfig};
use crate::context::{
    memory::{ASSISTANT_SENDER, USER_SENDER},
    ContextAssembler, ConversationMemory, HistoryStore, MemoryEntry,
};
use crate::errors::{AppError, AppResult};
use crate::garmin::{ConnectClient, FileTokenStore, FitnessClient, TokenStore};
use crate::intent::route;
use crate::llm::ChatSession;

/// The chat assistant for one Garmin account
pub struct GarminChat {
    settings: AssistantSettings,
    gate: AuthGate,
    session: Option<ChatSession>,
    memory: ConversationMemory,
    history: HistoryStore,
    transcript: Vec<MemoryEntry>,
}

impl GarminChat {
    /// Assistant backed by Garmin Connect and the token store from `settings`
    ///
    /// # Errors
    ///
    /// Returns an error if the Garmin HTTP client cannot be created
    pub fn new(settings: AssistantSettings) -> AppResult<Self> {
        let client = Arc::new(ConnectClient::new()?);
        let store = Arc::new(FileTokenStore::new(settings.token_dir()));
        Ok(Self::with_parts(settings, client, store))
    }

    /// Assistant over explicit client and token store implementations
    ///
    /// Memory is seeded from the saved chat history.
    #[must_use]
    pub fn with_parts(
        settings: AssistantSettings,
        client: Arc<dyn FitnessClient>,
        store: Arc<dyn TokenStore>,
    ) -> Self {
        let gate = AuthGate::new(client, store, settings.garmin.clone());
        let history = HistoryStore::new(settings.history_dir());
        let memory = history.seed_memory();
        info!(remembered = memory.len(), "Assistant ready");
        Self {
            settings,
            gate,
            session: None,
            memory,
            history,
            transcript: Vec::new(),
        }
    }

    /// Use `session` instead of building one from the active provider
    #[must_use]
    pub fn with_session(mut self, session: ChatSession) -> Self {
        self.session = Some(session);
        self
    }

    /// Current settings
    #[must_use]
    pub const fn settings(&self) -> &AssistantSettings {
        &self.settings
    }

    /// Authentication state
    #[must_use]
    pub const fn auth_state(&self) -> AuthState {
        self.gate.state()
    }

    /// Conversation memory fed into each context
    #[must_use]
    pub const fn memory(&self) -> &ConversationMemory {
        &self.memory
    }

    /// Messages exchanged since the last reset
    #[must_use]
    pub fn transcript(&self) -> &[MemoryEntry] {
        &self.transcript
    }

    /// Resume stored tokens or log in
    pub async fn authenticate(&mut self) -> AuthOutcome {
        self.gate.authenticate().await
    }

    /// Answer a pending MFA challenge
    pub async fn submit_mfa(&mut self, code: &str) -> AuthOutcome {
        self.gate.submit_mfa(code).await
    }

    /// Replace the Garmin credentials, dropping any live session
    pub fn set_credentials(&mut self, credentials: GarminCredentials) {
        self.settings.garmin = credentials.clone();
        self.gate.set_credentials(credentials);
    }

    /// Answer a question about the user's Garmin data
    ///
    /// Provider failures come back as remediation text, not as errors.
    ///
    /// # Errors
    ///
    /// Returns `AuthRequired` before a successful login, `InvalidInput` for a
    /// blank message, and a config error when no provider is usable
    pub async fn process_message(&mut self, message: &str) -> AppResult<String> {
        self.process_message_on(message, Local::now().date_naive())
            .await
    }

    /// [`Self::process_message`] with an explicit "today"
    ///
    /// # Errors
    ///
    /// Same as [`Self::process_message`]
    pub async fn process_message_on(&mut self, message: &str, today: NaiveDate) -> AppResult<String> {
        let message = message.trim();
        if message.is_empty() {
            return Err(AppError::invalid_input("Message is empty"));
        }
        if !self.gate.ensure_fresh().await {
            return Err(AppError::auth_required());
        }
        self.ensure_session()?;

        let decision = route(message, today);
        info!(topic = %decision.topic, scope = ?decision.time_scope, "Routed message");

        let context = {
            let fetcher = self.gate.fetcher_for(today)?;
            ContextAssembler::new(&fetcher)
                .assemble(&decision, &self.memory)
                .await
        };

        let Some(session) = self.session.as_mut() else {
            return Err(AppError::internal("Chat session missing"));
        };
        match session.send(message, Some(&context)).await {
            Ok(reply) => {
                self.memory.record_turn(message, &reply);
                self.transcript.push(MemoryEntry::now(USER_SENDER, message));
                self.transcript
                    .push(MemoryEntry::now(ASSISTANT_SENDER, reply.clone()));
                Ok(reply)
            }
            Err(e) => Ok(session.remediation(&e)),
        }
    }

    fn ensure_session(&mut self) -> AppResult<()> {
        if self.session.is_none() {
            let config = self.settings.active_config()?;
            self.session = Some(ChatSession::from_config(config)?);
        }
        Ok(())
    }

    /// Start a fresh conversation with the provider
    ///
    /// Long-term memory is kept; the provider history and transcript are not.
    pub fn reset_conversation(&mut self) {
        if let Some(session) = self.session.as_mut() {
            session.reset_conversation();
        }
        self.transcript.clear();
    }

    /// Make `config` the active provider
    ///
    /// The new session starts with an empty provider history.
    ///
    /// # Errors
    ///
    /// Returns a config error when required fields are missing; the previous
    /// provider stays active in that case
    pub fn switch_provider(&mut self, config: ProviderConfig) -> AppResult<()> {
        let session = ChatSession::from_config(&config)?;
        info!(provider = %config.provider, model = session.model(), "Switched provider");
        self.settings.active_provider = config.provider;
        self.settings.providers.insert(config.provider, config);
        self.session = Some(session);
        Ok(())
    }

    /// Save the transcript to the history directory
    ///
    /// # Errors
    ///
    /// Returns an error when nothing has been said yet or the file cannot be written
    pub fn save_history(&self) -> AppResult<PathBuf> {
        self.history.save(&self.transcript)
    }
}
