// ABOUTME: Garmin session gate handling token resume, credential login and the MFA challenge cycle
// ABOUTME: Three-state machine (unauthenticated, MFA pending, authenticated) with a uniform outcome type
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Authentication gate
//!
//! The gate owns the Garmin credentials, the pending MFA challenge and the
//! live token bundle. Callers only see [`AuthOutcome`]; the challenge never
//! leaves the gate.

use std::mem;
use std::sync::Arc;

use chrono::{Local, NaiveDate};
use tracing::{debug, info, warn};

use crate::config::GarminCredentials;
use crate::errors::{AppError, AppResult};
use crate::garmin::{
    ChallengeState, ClientError, DataRequest, FitnessClient, LoginOutcome, SessionTokens,
    TokenStore,
};
use crate::metrics::MetricFetcher;

/// Result of an authentication step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    /// The session is authenticated
    Success,
    /// Garmin wants an MFA code; call [`AuthGate::submit_mfa`]
    MfaRequired,
    /// The attempt failed; the message is meant for the user
    Error(String),
}

impl AuthOutcome {
    /// Whether the outcome is [`AuthOutcome::Success`]
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

/// Public view of the gate's state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    /// No session
    Unauthenticated,
    /// Waiting for an MFA code
    MfaPending,
    /// Tokens are live
    Authenticated,
}

enum AuthSession {
    Unauthenticated,
    MfaPending(ChallengeState),
    Authenticated(SessionTokens),
}

/// Six ASCII digits
#[must_use]
pub fn is_valid_mfa_code(code: &str) -> bool {
    code.len() == 6 && code.bytes().all(|b| b.is_ascii_digit())
}

/// Authentication state machine for one Garmin account
pub struct AuthGate {
    client: Arc<dyn FitnessClient>,
    store: Arc<dyn TokenStore>,
    credentials: GarminCredentials,
    session: AuthSession,
}

impl AuthGate {
    /// Create an unauthenticated gate
    pub fn new(
        client: Arc<dyn FitnessClient>,
        store: Arc<dyn TokenStore>,
        credentials: GarminCredentials,
    ) -> Self {
        Self {
            client,
            store,
            credentials,
            session: AuthSession::Unauthenticated,
        }
    }

    /// Replace the credentials; any session or pending challenge is dropped
    pub fn set_credentials(&mut self, credentials: GarminCredentials) {
        self.credentials = credentials;
        self.session = AuthSession::Unauthenticated;
    }

    /// Current state
    #[must_use]
    pub const fn state(&self) -> AuthState {
        match self.session {
            AuthSession::Unauthenticated => AuthState::Unauthenticated,
            AuthSession::MfaPending(_) => AuthState::MfaPending,
            AuthSession::Authenticated(_) => AuthState::Authenticated,
        }
    }

    /// Whether tokens are live
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        matches!(self.session, AuthSession::Authenticated(_))
    }

    /// Live tokens
    ///
    /// # Errors
    ///
    /// Returns `AuthRequired` when the session is not authenticated
    pub fn tokens(&self) -> AppResult<&SessionTokens> {
        match &self.session {
            AuthSession::Authenticated(tokens) => Ok(tokens),
            _ => Err(AppError::auth_required()),
        }
    }

    /// Metric fetchers bound to the live session, with today as the default date
    ///
    /// # Errors
    ///
    /// Returns `AuthRequired` when the session is not authenticated
    pub fn fetcher(&self) -> AppResult<MetricFetcher<'_>> {
        self.fetcher_for(Local::now().date_naive())
    }

    /// Metric fetchers bound to the live session with an explicit "today"
    ///
    /// # Errors
    ///
    /// Returns `AuthRequired` when the session is not authenticated
    pub fn fetcher_for(&self, today: NaiveDate) -> AppResult<MetricFetcher<'_>> {
        let tokens = self.tokens()?;
        Ok(MetricFetcher::new(self.client.as_ref(), tokens, today))
    }

    /// Resume stored tokens or log in with credentials
    pub async fn authenticate(&mut self) -> AuthOutcome {
        if let Some(tokens) = self.try_resume().await {
            info!("Resumed stored Garmin session");
            self.session = AuthSession::Authenticated(tokens);
            return AuthOutcome::Success;
        }

        self.session = AuthSession::Unauthenticated;
        if !self.credentials.is_complete() {
            return AuthOutcome::Error(
                "Authentication error: Garmin email and password are not configured".to_owned(),
            );
        }

        info!("Starting Garmin login");
        match self.client.login(&self.credentials).await {
            Ok(LoginOutcome::Complete(tokens)) => self.establish(tokens),
            Ok(LoginOutcome::MfaRequired(challenge)) => {
                self.session = AuthSession::MfaPending(challenge);
                AuthOutcome::MfaRequired
            }
            Err(ClientError::LoginRejected(message)) => {
                warn!("Garmin login rejected");
                AuthOutcome::Error(format!("Login failed: {message}"))
            }
            Err(e) => AuthOutcome::Error(format!("Authentication error: {e}")),
        }
    }

    /// Answer the pending MFA challenge
    ///
    /// A stale challenge triggers one fresh login and one more attempt with
    /// the same code.
    pub async fn submit_mfa(&mut self, code: &str) -> AuthOutcome {
        if !matches!(self.session, AuthSession::MfaPending(_)) {
            return AuthOutcome::Error("Must authenticate first before submitting MFA".to_owned());
        }
        let code = code.trim();
        if !is_valid_mfa_code(code) {
            return AuthOutcome::Error(
                "MFA submission failed: the code must be exactly 6 digits".to_owned(),
            );
        }

        let AuthSession::MfaPending(mut challenge) =
            mem::replace(&mut self.session, AuthSession::Unauthenticated)
        else {
            return AuthOutcome::Error("Must authenticate first before submitting MFA".to_owned());
        };

        let mut retries_left = 1;
        loop {
            match self.client.resume_login(challenge, code).await {
                Ok(tokens) => return self.establish(tokens),
                Err(ClientError::StaleChallenge(detail)) if retries_left > 0 => {
                    retries_left -= 1;
                    warn!(detail = %detail, "MFA challenge went stale, restarting login");
                    match self.client.login(&self.credentials).await {
                        Ok(LoginOutcome::MfaRequired(fresh)) => challenge = fresh,
                        Ok(LoginOutcome::Complete(tokens)) => return self.establish(tokens),
                        Err(e) => return AuthOutcome::Error(format!("MFA submission failed: {e}")),
                    }
                }
                Err(e) => return AuthOutcome::Error(format!("MFA submission failed: {e}")),
            }
        }
    }

    /// Refresh an expired access token before use
    ///
    /// Returns whether the session is still authenticated afterwards.
    pub async fn ensure_fresh(&mut self) -> bool {
        let refreshed = match &self.session {
            AuthSession::Authenticated(tokens) if tokens.oauth2.is_expired() => {
                self.client.refresh(tokens).await
            }
            AuthSession::Authenticated(_) => return true,
            _ => return false,
        };

        match refreshed {
            Ok(tokens) => {
                self.persist(&tokens);
                self.session = AuthSession::Authenticated(tokens);
                true
            }
            Err(e) => {
                warn!(error = %e, "Garmin token refresh failed");
                self.session = AuthSession::Unauthenticated;
                false
            }
        }
    }

    fn establish(&mut self, tokens: SessionTokens) -> AuthOutcome {
        self.persist(&tokens);
        self.session = AuthSession::Authenticated(tokens);
        info!("Garmin session authenticated");
        AuthOutcome::Success
    }

    fn persist(&self, tokens: &SessionTokens) {
        if let Err(e) = self.store.save(tokens) {
            warn!(error = %e, "Could not save Garmin tokens");
        }
    }

    async fn verify(&self, tokens: &SessionTokens) -> bool {
        let probe = DataRequest::Activities { start: 0, limit: 1 };
        match self.client.fetch(tokens, &probe).await {
            Ok(_) => true,
            Err(e) => {
                debug!(error = %e, "Stored Garmin session failed verification");
                false
            }
        }
    }

    async fn try_resume(&self) -> Option<SessionTokens> {
        let tokens = self.store.load()?;
        if self.verify(&tokens).await {
            return Some(tokens);
        }

        match self.client.refresh(&tokens).await {
            Ok(refreshed) => {
                self.persist(&refreshed);
                if self.verify(&refreshed).await {
                    return Some(refreshed);
                }
            }
            Err(e) => debug!(error = %e, "Token refresh failed, falling back to login"),
        }
        None
    }
}
