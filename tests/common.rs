// ABOUTME: Shared test utilities and mock implementations for integration tests
// ABOUTME: Scripted Garmin client, in-memory token store and a recording LLM provider
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence
#![allow(
    dead_code,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::unwrap_used,
    clippy::expect_used
)]
//! Shared test utilities for `garmin_chat`
//!
//! Mocks are plain trait implementations; nothing here talks to the network.

use std::collections::HashMap;
use std::env;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};

use async_trait::async_trait;
use chrono::NaiveDate;
use garmin_chat::config::GarminCredentials;
use garmin_chat::errors::{AppError, AppResult, ErrorCode};
use garmin_chat::garmin::{
    ChallengeState, ClientError, DataRequest, FitnessClient, LoginOutcome, OAuth1Token,
    OAuth2Token, SessionTokens, TokenStore,
};
use garmin_chat::llm::{ChatRequest, ChatResponse, LlmCapabilities, LlmProvider};
use serde_json::{json, Value};
use tracing::Level;

static INIT_LOGGER: Once = Once::new();

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        let log_level = match env::var("TEST_LOG").as_deref() {
            Ok("TRACE") => Level::TRACE,
            Ok("DEBUG") => Level::DEBUG,
            Ok("INFO") => Level::INFO,
            _ => Level::WARN,
        };

        tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .init();
    });
}

/// Fixed "today" used across tests
pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 17).unwrap()
}

/// Live, non-expiring tokens
pub fn sample_tokens() -> SessionTokens {
    SessionTokens {
        oauth1: OAuth1Token {
            oauth_token: "oauth1-token".to_owned(),
            oauth_token_secret: "oauth1-secret".to_owned(),
            mfa_token: None,
            mfa_expiration_timestamp: None,
        },
        oauth2: OAuth2Token {
            access_token: "access".to_owned(),
            refresh_token: Some("refresh".to_owned()),
            token_type: "Bearer".to_owned(),
            scope: None,
            expires_in: 3600,
            expires_at: 0,
        },
    }
}

pub fn credentials() -> GarminCredentials {
    GarminCredentials::new("runner@example.com", "hunter2")
}

/// The "Morning Run" activity used by the end-to-end checks
pub fn morning_run() -> Value {
    json!({
        "activityId": 1001,
        "activityName": "Morning Run",
        "activityType": { "typeKey": "running" },
        "startTimeLocal": "2024-01-15 07:00:00",
        "duration": 1800.0,
        "distance": 5000.0,
        "calories": 300
    })
}

/// Leg day with two loaded sets around a rest
pub fn leg_day() -> Value {
    json!({
        "activityId": 2002,
        "activityName": "Leg Day",
        "activityType": { "typeKey": "strength_training" },
        "startTimeLocal": "2024-01-16 18:00:00",
        "duration": 2700.0,
        "calories": 250,
        "exerciseSets": [{
            "exerciseName": "Squat",
            "category": "SQUAT",
            "sets": [
                { "setType": "ACTIVE", "repetitions": 10, "weight": 100, "weightDisplayUnit": "lb" },
                { "setType": "REST", "duration": 60 },
                { "setType": "ACTIVE", "repetitions": 8, "weight": 100, "weightDisplayUnit": "lb" }
            ]
        }]
    })
}

// ============================================================================
// Garmin client mock
// ============================================================================

/// How the mock answers a credential login
#[derive(Debug, Clone)]
pub enum LoginBehavior {
    /// Tokens straight away
    Complete,
    /// An MFA challenge
    Mfa,
    /// A rejected login with this message
    Reject(String),
}

/// Request family a scripted response applies to
pub fn request_kind(request: &DataRequest) -> &'static str {
    match request {
        DataRequest::DailySummary(_) => "summary",
        DataRequest::Stats(_) => "stats",
        DataRequest::HeartRate(_) => "heart_rate",
        DataRequest::Sleep(_) => "sleep",
        DataRequest::Stress(_) => "stress",
        DataRequest::Respiration(_) => "respiration",
        DataRequest::Hydration(_) => "hydration",
        DataRequest::Spo2(_) => "spo2",
        DataRequest::Hrv(_) => "hrv",
        DataRequest::MaxMetrics(_) => "max_metrics",
        DataRequest::TrainingStatus(_) => "training_status",
        DataRequest::TrainingReadiness(_) => "training_readiness",
        DataRequest::NutritionSummary(_) => "nutrition",
        DataRequest::FoodLog(_) => "food_log",
        DataRequest::Activities { .. } => "activities",
        DataRequest::Activity(_) => "activity",
        DataRequest::ExerciseSets(_) => "exercise_sets",
    }
}

/// Scripted Garmin client
///
/// Unscripted requests fail with `Unsupported`. Activities are served as one
/// page at offset zero and an empty page afterwards, unless `endless_pages`
/// repeats the scripted page at every offset.
pub struct MockFitnessClient {
    login: LoginBehavior,
    endless_pages: bool,
    stale_challenges: AtomicUsize,
    responses: Mutex<HashMap<&'static str, Result<Value, ClientError>>>,
    pub requests: Mutex<Vec<DataRequest>>,
    pub logins: AtomicUsize,
    pub mfa_codes: Mutex<Vec<String>>,
}

impl MockFitnessClient {
    pub fn new(login: LoginBehavior) -> Self {
        Self {
            login,
            endless_pages: false,
            stale_challenges: AtomicUsize::new(0),
            responses: Mutex::new(HashMap::new()),
            requests: Mutex::new(Vec::new()),
            logins: AtomicUsize::new(0),
            mfa_codes: Mutex::new(Vec::new()),
        }
    }

    /// Reject the next `count` MFA submissions as stale
    #[must_use]
    pub fn with_stale_challenges(self, count: usize) -> Self {
        self.stale_challenges.store(count, Ordering::SeqCst);
        self
    }

    /// Serve the scripted activity page at every offset
    #[must_use]
    pub const fn with_endless_pages(mut self) -> Self {
        self.endless_pages = true;
        self
    }

    #[must_use]
    pub fn respond(self, kind: &'static str, payload: Value) -> Self {
        self.responses.lock().unwrap().insert(kind, Ok(payload));
        self
    }

    #[must_use]
    pub fn fail(self, kind: &'static str, error: ClientError) -> Self {
        self.responses.lock().unwrap().insert(kind, Err(error));
        self
    }

    pub fn requested(&self, kind: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| request_kind(r) == kind)
            .count()
    }
}

#[async_trait]
impl FitnessClient for MockFitnessClient {
    async fn login(&self, _credentials: &GarminCredentials) -> Result<LoginOutcome, ClientError> {
        self.logins.fetch_add(1, Ordering::SeqCst);
        match &self.login {
            LoginBehavior::Complete => Ok(LoginOutcome::Complete(sample_tokens())),
            LoginBehavior::Mfa => Ok(LoginOutcome::MfaRequired(ChallengeState::new("csrf"))),
            LoginBehavior::Reject(message) => Err(ClientError::LoginRejected(message.clone())),
        }
    }

    async fn resume_login(
        &self,
        _challenge: ChallengeState,
        code: &str,
    ) -> Result<SessionTokens, ClientError> {
        self.mfa_codes.lock().unwrap().push(code.to_owned());
        let stale = self.stale_challenges.load(Ordering::SeqCst);
        if stale > 0 {
            self.stale_challenges.store(stale - 1, Ordering::SeqCst);
            return Err(ClientError::StaleChallenge("csrf mismatch".to_owned()));
        }
        Ok(sample_tokens())
    }

    async fn refresh(&self, _tokens: &SessionTokens) -> Result<SessionTokens, ClientError> {
        Ok(sample_tokens())
    }

    async fn fetch(
        &self,
        _tokens: &SessionTokens,
        request: &DataRequest,
    ) -> Result<Value, ClientError> {
        self.requests.lock().unwrap().push(request.clone());
        if let DataRequest::Activities { start, .. } = request {
            if *start > 0 && !self.endless_pages {
                return Ok(json!([]));
            }
        }
        self.responses
            .lock()
            .unwrap()
            .get(request_kind(request))
            .cloned()
            .unwrap_or_else(|| Err(ClientError::Unsupported(request_kind(request).to_owned())))
    }
}

// ============================================================================
// Token store mock
// ============================================================================

#[derive(Default)]
pub struct MemoryTokenStore {
    pub tokens: Mutex<Option<SessionTokens>>,
    pub saves: AtomicUsize,
}

impl MemoryTokenStore {
    pub fn with_tokens(tokens: SessionTokens) -> Self {
        Self {
            tokens: Mutex::new(Some(tokens)),
            saves: AtomicUsize::new(0),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Option<SessionTokens> {
        self.tokens.lock().unwrap().clone()
    }

    fn save(&self, tokens: &SessionTokens) -> AppResult<()> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        *self.tokens.lock().unwrap() = Some(tokens.clone());
        Ok(())
    }
}

// ============================================================================
// LLM provider mock
// ============================================================================

/// Provider that records every request and answers from a script
///
/// Each call pops the next scripted result; an empty script answers "ok".
pub struct RecordingProvider {
    capabilities: LlmCapabilities,
    script: Mutex<Vec<Result<String, String>>>,
    pub requests: Arc<Mutex<Vec<ChatRequest>>>,
}

impl RecordingProvider {
    pub fn new(capabilities: LlmCapabilities) -> Self {
        Self {
            capabilities,
            script: Mutex::new(Vec::new()),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Queue a successful reply
    #[must_use]
    pub fn reply(self, text: &str) -> Self {
        self.script.lock().unwrap().push(Ok(text.to_owned()));
        self
    }

    /// Queue a failure carrying raw provider text
    #[must_use]
    pub fn failure(self, raw: &str) -> Self {
        self.script.lock().unwrap().push(Err(raw.to_owned()));
        self
    }

    /// Handle onto the recorded requests that survives boxing the provider
    pub fn recorder(&self) -> Arc<Mutex<Vec<ChatRequest>>> {
        Arc::clone(&self.requests)
    }
}

#[async_trait]
impl LlmProvider for RecordingProvider {
    fn name(&self) -> &'static str {
        "recording"
    }

    fn display_name(&self) -> &'static str {
        "Recording"
    }

    fn capabilities(&self) -> LlmCapabilities {
        self.capabilities
    }

    fn default_model(&self) -> &str {
        "test-model"
    }

    fn available_models(&self) -> &'static [&'static str] {
        &["test-model"]
    }

    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, AppError> {
        self.requests.lock().unwrap().push(request.clone());
        let next = {
            let mut script = self.script.lock().unwrap();
            if script.is_empty() {
                Ok("ok".to_owned())
            } else {
                script.remove(0)
            }
        };
        match next {
            Ok(content) => Ok(ChatResponse {
                content,
                model: "test-model".to_owned(),
                usage: None,
                finish_reason: Some("stop".to_owned()),
            }),
            Err(raw) => Err(AppError::new(ErrorCode::ExternalServiceError, raw)),
        }
    }
}
