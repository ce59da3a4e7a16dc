// ABOUTME: Garmin Connect client abstraction shared by the auth gate and metric fetchers
// ABOUTME: Defines the FitnessClient trait, request catalog, token bundle and client error signals
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Garmin Connect access
//!
//! [`FitnessClient`] is the seam between the assistant and Garmin Connect.
//! [`ConnectClient`] implements it over HTTP; tests supply their own
//! implementation. Every data call returns raw JSON which the metric fetchers
//! normalize.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use reqwest::cookie::Jar;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::config::GarminCredentials;

/// HTTP implementation over Garmin SSO and connectapi
pub mod connect;
/// OAuth1 request signing
pub mod oauth1;
/// On-disk token persistence
pub mod token_store;

pub use connect::ConnectClient;
pub use token_store::{FileTokenStore, TokenStore};

/// Failure signals from the Garmin client
///
/// The variants matter more than the messages: fetchers collapse
/// `Unsupported` and `Transient` into an unavailable category, the auth gate
/// reacts to `Unauthorized` and `StaleChallenge`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// Endpoint does not exist for this account or device (404/400/501)
    #[error("endpoint not supported: {0}")]
    Unsupported(String),
    /// Network failure, timeout, 5xx or throttling
    #[error("temporary failure: {0}")]
    Transient(String),
    /// Tokens were rejected (401)
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    /// Garmin refused the login
    #[error("{0}")]
    LoginRejected(String),
    /// The MFA challenge expired or its CSRF token no longer matches
    #[error("MFA challenge expired (CSRF token error): {0}")]
    StaleChallenge(String),
    /// Response could not be interpreted
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// OAuth1 token issued after SSO, long lived
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuth1Token {
    /// Token key
    pub oauth_token: String,
    /// Token secret
    pub oauth_token_secret: String,
    /// MFA token presented on every exchange when the account uses MFA
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mfa_token: Option<String>,
    /// Expiry of the MFA token as sent by Garmin
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mfa_expiration_timestamp: Option<String>,
}

impl fmt::Debug for OAuth1Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuth1Token")
            .field("oauth_token", &"[REDACTED]")
            .field("mfa_token", &self.mfa_token.as_ref().map(|_| "[REDACTED]"))
            .finish_non_exhaustive()
    }
}

/// OAuth2 bearer token used for data requests
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuth2Token {
    /// Bearer token
    pub access_token: String,
    /// Refresh token (Garmin refreshes by re-exchanging the OAuth1 token)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Token type, normally `Bearer`
    #[serde(default = "default_token_type")]
    pub token_type: String,
    /// Granted scopes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    /// Lifetime in seconds at issue time
    #[serde(default)]
    pub expires_in: i64,
    /// Unix timestamp after which the token is expired
    #[serde(default)]
    pub expires_at: i64,
}

fn default_token_type() -> String {
    "Bearer".to_owned()
}

impl OAuth2Token {
    /// Whether the access token has passed its expiry
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expires_at > 0 && self.expires_at <= Utc::now().timestamp()
    }
}

impl fmt::Debug for OAuth2Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuth2Token")
            .field("access_token", &"[REDACTED]")
            .field("token_type", &self.token_type)
            .field("expires_at", &self.expires_at)
            .finish_non_exhaustive()
    }
}

/// Authenticated token bundle lent to every fetcher
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionTokens {
    /// OAuth1 token
    pub oauth1: OAuth1Token,
    /// OAuth2 token
    pub oauth2: OAuth2Token,
}

/// Opaque state needed to finish a login after Garmin asks for an MFA code
///
/// Consumed by [`FitnessClient::resume_login`], so it can be replayed once.
pub struct ChallengeState {
    csrf_token: String,
    jar: Arc<Jar>,
}

impl ChallengeState {
    /// Challenge with a fresh cookie jar
    pub fn new(csrf_token: impl Into<String>) -> Self {
        Self::with_jar(csrf_token, Arc::new(Jar::default()))
    }

    /// Challenge bound to the cookies of the SSO conversation that produced it
    pub fn with_jar(csrf_token: impl Into<String>, jar: Arc<Jar>) -> Self {
        Self {
            csrf_token: csrf_token.into(),
            jar,
        }
    }

    /// CSRF token scraped from the MFA page
    #[must_use]
    pub fn csrf_token(&self) -> &str {
        &self.csrf_token
    }

    /// SSO cookie jar
    #[must_use]
    pub fn jar(&self) -> Arc<Jar> {
        Arc::clone(&self.jar)
    }
}

impl fmt::Debug for ChallengeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChallengeState")
            .field("csrf_token", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

/// Result of a credential login
#[derive(Debug)]
pub enum LoginOutcome {
    /// Login finished without MFA
    Complete(SessionTokens),
    /// Garmin wants an MFA code; replay the challenge with it
    MfaRequired(ChallengeState),
}

/// Everything the assistant reads from Garmin Connect
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataRequest {
    /// Daily user summary (steps, calories, floors, intensity, body battery)
    DailySummary(NaiveDate),
    /// Daily stats; Garmin serves these from the summary endpoint
    Stats(NaiveDate),
    /// Daily heart rate
    HeartRate(NaiveDate),
    /// Sleep data for the night ending on the date
    Sleep(NaiveDate),
    /// Stress levels
    Stress(NaiveDate),
    /// Respiration rates
    Respiration(NaiveDate),
    /// Water intake
    Hydration(NaiveDate),
    /// Blood oxygen saturation
    Spo2(NaiveDate),
    /// Heart rate variability
    Hrv(NaiveDate),
    /// VO2 max and fitness age
    MaxMetrics(NaiveDate),
    /// Training load and status
    TrainingStatus(NaiveDate),
    /// Training readiness score
    TrainingReadiness(NaiveDate),
    /// Nutrition totals
    NutritionSummary(NaiveDate),
    /// Logged foods
    FoodLog(NaiveDate),
    /// Page of activities, newest first
    Activities {
        /// Offset into the activity list
        start: usize,
        /// Page size
        limit: usize,
    },
    /// One activity by id
    Activity(i64),
    /// Exercise sets recorded for a strength activity
    ExerciseSets(i64),
}

impl DataRequest {
    /// Whether the path embeds the user's display name
    #[must_use]
    pub const fn needs_display_name(&self) -> bool {
        matches!(
            self,
            Self::DailySummary(_) | Self::Stats(_) | Self::HeartRate(_) | Self::Sleep(_)
        )
    }

    /// Path under the connectapi host
    #[must_use]
    pub fn path(&self, display_name: &str) -> String {
        match self {
            Self::DailySummary(date) | Self::Stats(date) => format!(
                "/usersummary-service/usersummary/daily/{display_name}?calendarDate={date}"
            ),
            Self::HeartRate(date) => {
                format!("/wellness-service/wellness/dailyHeartRate/{display_name}?date={date}")
            }
            Self::Sleep(date) => format!(
                "/wellness-service/wellness/dailySleepData/{display_name}?date={date}&nonSleepBufferMinutes=60"
            ),
            Self::Stress(date) => format!("/wellness-service/wellness/dailyStress/{date}"),
            Self::Respiration(date) => {
                format!("/wellness-service/wellness/daily/respiration/{date}")
            }
            Self::Hydration(date) => {
                format!("/usersummary-service/usersummary/hydration/daily/{date}")
            }
            Self::Spo2(date) => format!("/wellness-service/wellness/daily/spo2/{date}"),
            Self::Hrv(date) => format!("/hrv-service/hrv/{date}"),
            Self::MaxMetrics(date) => format!("/metrics-service/metrics/maxmet/daily/{date}/{date}"),
            Self::TrainingStatus(date) => {
                format!("/metrics-service/metrics/trainingstatus/aggregated/{date}")
            }
            Self::TrainingReadiness(date) => {
                format!("/metrics-service/metrics/trainingreadiness/{date}")
            }
            Self::NutritionSummary(date) => {
                format!("/nutrition-service/food/logs/nutrition/daily/{date}")
            }
            Self::FoodLog(date) => format!("/nutrition-service/food/logs/{date}"),
            Self::Activities { start, limit } => format!(
                "/activitylist-service/activities/search/activities?start={start}&limit={limit}"
            ),
            Self::Activity(id) => format!("/activity-service/activity/{id}"),
            Self::ExerciseSets(id) => format!("/activity-service/activity/{id}/exerciseSets"),
        }
    }
}

/// Access to Garmin Connect
#[async_trait]
pub trait FitnessClient: Send + Sync {
    /// Log in with credentials; MFA is deferred to [`Self::resume_login`]
    async fn login(&self, credentials: &GarminCredentials) -> Result<LoginOutcome, ClientError>;

    /// Finish an MFA login with the user's code
    async fn resume_login(
        &self,
        challenge: ChallengeState,
        code: &str,
    ) -> Result<SessionTokens, ClientError>;

    /// Obtain a fresh OAuth2 token for an existing session
    async fn refresh(&self, tokens: &SessionTokens) -> Result<SessionTokens, ClientError>;

    /// Read one resource as raw JSON
    async fn fetch(&self, tokens: &SessionTokens, request: &DataRequest)
        -> Result<Value, ClientError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_paths() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        let request = DataRequest::DailySummary(date);
        assert!(request.needs_display_name());
        assert_eq!(
            request.path("runner42"),
            "/usersummary-service/usersummary/daily/runner42?calendarDate=2024-01-15"
        );
        assert!(!DataRequest::Hrv(date).needs_display_name());
        assert_eq!(DataRequest::Hrv(date).path("ignored"), "/hrv-service/hrv/2024-01-15");
    }

    #[test]
    fn test_activities_path_carries_paging() {
        let request = DataRequest::Activities {
            start: 50,
            limit: 50,
        };
        assert_eq!(
            request.path(""),
            "/activitylist-service/activities/search/activities?start=50&limit=50"
        );
    }

    #[test]
    fn test_token_debug_is_redacted() {
        let token = OAuth2Token {
            access_token: "secret-access".to_owned(),
            refresh_token: None,
            token_type: "Bearer".to_owned(),
            scope: None,
            expires_in: 3600,
            expires_at: 0,
        };
        assert!(!format!("{token:?}").contains("secret-access"));
        assert!(!token.is_expired());
    }
}
