// ABOUTME: Garmin Connect HTTP client covering SSO login, MFA, OAuth token exchange and data reads
// ABOUTME: Implements FitnessClient over reqwest with cookie-scoped SSO conversations
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Garmin Connect over HTTP
//!
//! Login follows the mobile app's flow: the SSO embed widget hands out a
//! service ticket, the ticket is traded for an OAuth1 token, and the OAuth1
//! token is traded for a short-lived OAuth2 bearer token. Refreshing repeats
//! the last step.

use std::collections::HashMap;
use std::sync::{Arc, LazyLock};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use regex::Regex;
use reqwest::cookie::Jar;
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument};

use super::oauth1::{OAuth1Consumer, OAuth1Signer};
use super::{
    ChallengeState, ClientError, DataRequest, FitnessClient, LoginOutcome, OAuth1Token,
    OAuth2Token, SessionTokens,
};
use crate::config::GarminCredentials;
use crate::errors::{AppError, AppResult};

const SSO_URL: &str = "https://sso.garmin.com/sso";
const SSO_EMBED_URL: &str = "https://sso.garmin.com/sso/embed";
const CONNECT_API_URL: &str = "https://connectapi.garmin.com";
const OAUTH_CONSUMER_URL: &str = "https://thegarth.s3.amazonaws.com/oauth_consumer.json";
const USER_AGENT: &str = "com.garmin.android.apps.connectmobile";
const CONNECT_TIMEOUT_SECS: u64 = 10;
const REQUEST_TIMEOUT_SECS: u64 = 30;

static CSRF_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r#"name="_csrf"\s+value="(.+?)""#).ok());

static TITLE_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"<title>(.+?)</title>").ok());

static TICKET_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r#"embed\?ticket=([^"]+)""#).ok());

/// First capture group of `pattern` in `html`
fn scrape(pattern: &LazyLock<Option<Regex>>, html: &str) -> Option<String> {
    pattern
        .as_ref()?
        .captures(html)?
        .get(1)
        .map(|m| m.as_str().to_owned())
}

/// Parse an `a=1&b=2` body into a map
fn parse_query_string(body: &str) -> HashMap<String, String> {
    body.trim()
        .split('&')
        .filter_map(|pair| {
            let (key, value) = pair.split_once('=')?;
            let value = urlencoding::decode(value).map_or_else(|_| value.to_owned(), |v| v.into_owned());
            Some((key.to_owned(), value))
        })
        .collect()
}

/// Map a non-success data response onto the client's error signals
fn status_error(status: StatusCode, body: &str) -> ClientError {
    let snippet: String = body.chars().take(200).collect();
    let detail = format!("HTTP {}: {snippet}", status.as_u16());
    match status.as_u16() {
        401 => ClientError::Unauthorized(detail),
        400 | 403 | 404 | 501 => ClientError::Unsupported(detail),
        429 | 500..=599 => ClientError::Transient(detail),
        _ => ClientError::InvalidResponse(detail),
    }
}

fn transport_error(error: &reqwest::Error) -> ClientError {
    ClientError::Transient(error.to_string())
}

fn embed_params() -> [(&'static str, &'static str); 3] {
    [
        ("id", "gauth-widget"),
        ("embedWidget", "true"),
        ("gauthHost", SSO_URL),
    ]
}

fn signin_params() -> [(&'static str, &'static str); 5] {
    [
        ("gauthHost", SSO_EMBED_URL),
        ("service", SSO_EMBED_URL),
        ("source", SSO_EMBED_URL),
        ("redirectAfterAccountLoginUrl", SSO_EMBED_URL),
        ("redirectAfterAccountCreationUrl", SSO_EMBED_URL),
    ]
}

#[derive(Deserialize)]
struct SocialProfile {
    #[serde(rename = "displayName")]
    display_name: Option<String>,
}

/// Garmin Connect client
pub struct ConnectClient {
    http: Client,
    consumer: RwLock<Option<OAuth1Consumer>>,
    display_name: RwLock<Option<String>>,
}

impl ConnectClient {
    /// Create a client that fetches the OAuth consumer on first login
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built
    pub fn new() -> AppResult<Self> {
        Ok(Self {
            http: Self::build_http(None)?,
            consumer: RwLock::new(None),
            display_name: RwLock::new(None),
        })
    }

    /// Create a client with known consumer credentials
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built
    pub fn with_consumer(consumer: OAuth1Consumer) -> AppResult<Self> {
        Ok(Self {
            http: Self::build_http(None)?,
            consumer: RwLock::new(Some(consumer)),
            display_name: RwLock::new(None),
        })
    }

    fn build_http(jar: Option<Arc<Jar>>) -> AppResult<Client> {
        let mut builder = Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS));
        if let Some(jar) = jar {
            builder = builder.cookie_provider(jar);
        }
        builder
            .build()
            .map_err(|e| AppError::internal(format!("Failed to build HTTP client: {e}")))
    }

    fn sso_client(jar: Arc<Jar>) -> Result<Client, ClientError> {
        Self::build_http(Some(jar)).map_err(|e| ClientError::InvalidResponse(e.message))
    }

    async fn consumer(&self) -> Result<OAuth1Consumer, ClientError> {
        if let Some(consumer) = self.consumer.read().await.as_ref() {
            return Ok(consumer.clone());
        }

        let consumer: OAuth1Consumer = self
            .http
            .get(OAUTH_CONSUMER_URL)
            .send()
            .await
            .map_err(|e| transport_error(&e))?
            .json()
            .await
            .map_err(|e| ClientError::InvalidResponse(format!("OAuth consumer: {e}")))?;

        *self.consumer.write().await = Some(consumer.clone());
        Ok(consumer)
    }

    /// Read the body of an SSO page, mapping HTTP failures
    async fn sso_page(response: Response) -> Result<String, ClientError> {
        let status = response.status();
        let body = response.text().await.map_err(|e| transport_error(&e))?;
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(ClientError::LoginRejected(
                "Invalid email or password".to_owned(),
            ));
        }
        if !status.is_success() {
            return Err(status_error(status, &body));
        }
        Ok(body)
    }

    /// Trade an SSO ticket for the OAuth1 then OAuth2 tokens
    async fn complete_login(&self, html: &str) -> Result<SessionTokens, ClientError> {
        let ticket = scrape(&TICKET_PATTERN, html)
            .ok_or_else(|| ClientError::InvalidResponse("No service ticket in SSO response".to_owned()))?;
        let oauth1 = self.preauthorize(&ticket).await?;
        let oauth2 = self.exchange(&oauth1).await?;
        *self.display_name.write().await = None;
        info!("Garmin login completed");
        Ok(SessionTokens { oauth1, oauth2 })
    }

    async fn preauthorize(&self, ticket: &str) -> Result<OAuth1Token, ClientError> {
        let consumer = self.consumer().await?;
        let base_url = format!("{CONNECT_API_URL}/oauth-service/oauth/preauthorized");
        let params = vec![
            ("ticket".to_owned(), ticket.to_owned()),
            ("login-url".to_owned(), SSO_EMBED_URL.to_owned()),
            ("accepts-mfa-tokens".to_owned(), "true".to_owned()),
        ];
        let header = OAuth1Signer::new(&consumer).authorization_header("GET", &base_url, &params);

        let response = self
            .http
            .get(&base_url)
            .query(&params)
            .header("Authorization", header)
            .send()
            .await
            .map_err(|e| transport_error(&e))?;
        let status = response.status();
        let body = response.text().await.map_err(|e| transport_error(&e))?;
        if !status.is_success() {
            return Err(status_error(status, &body));
        }

        let mut fields = parse_query_string(&body);
        let oauth_token = fields
            .remove("oauth_token")
            .ok_or_else(|| ClientError::InvalidResponse("Missing oauth_token".to_owned()))?;
        let oauth_token_secret = fields
            .remove("oauth_token_secret")
            .ok_or_else(|| ClientError::InvalidResponse("Missing oauth_token_secret".to_owned()))?;

        Ok(OAuth1Token {
            oauth_token,
            oauth_token_secret,
            mfa_token: fields.remove("mfa_token"),
            mfa_expiration_timestamp: fields.remove("mfa_expiration_timestamp"),
        })
    }

    async fn exchange(&self, oauth1: &OAuth1Token) -> Result<OAuth2Token, ClientError> {
        let consumer = self.consumer().await?;
        let url = format!("{CONNECT_API_URL}/oauth-service/oauth/exchange/user/2.0");
        let form: Vec<(String, String)> = oauth1
            .mfa_token
            .iter()
            .map(|mfa| ("mfa_token".to_owned(), mfa.clone()))
            .collect();
        let header = OAuth1Signer::new(&consumer)
            .with_token(&oauth1.oauth_token, &oauth1.oauth_token_secret)
            .authorization_header("POST", &url, &form);

        let response = self
            .http
            .post(&url)
            .header("Authorization", header)
            .form(&form)
            .send()
            .await
            .map_err(|e| transport_error(&e))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, &body));
        }

        let mut token: OAuth2Token = response
            .json()
            .await
            .map_err(|e| ClientError::InvalidResponse(format!("OAuth2 token: {e}")))?;
        token.expires_at = Utc::now().timestamp() + token.expires_in;
        Ok(token)
    }

    async fn get_json(&self, tokens: &SessionTokens, path: &str) -> Result<Value, ClientError> {
        let url = format!("{CONNECT_API_URL}{path}");
        let response = self
            .http
            .get(&url)
            .bearer_auth(&tokens.oauth2.access_token)
            .send()
            .await
            .map_err(|e| transport_error(&e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| transport_error(&e))?;
        if !status.is_success() {
            return Err(status_error(status, &body));
        }
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&body).map_err(|e| ClientError::InvalidResponse(e.to_string()))
    }

    /// Display name used in per-user paths, looked up once per login
    async fn display_name(&self, tokens: &SessionTokens) -> Result<String, ClientError> {
        if let Some(name) = self.display_name.read().await.as_ref() {
            return Ok(name.clone());
        }

        let profile: SocialProfile = serde_json::from_value(
            self.get_json(tokens, "/userprofile-service/socialProfile")
                .await?,
        )
        .map_err(|e| ClientError::InvalidResponse(format!("Social profile: {e}")))?;
        let name = profile
            .display_name
            .ok_or_else(|| ClientError::InvalidResponse("Profile has no display name".to_owned()))?;

        *self.display_name.write().await = Some(name.clone());
        Ok(name)
    }
}

#[async_trait]
impl FitnessClient for ConnectClient {
    #[instrument(skip_all, fields(email = %credentials.email))]
    async fn login(&self, credentials: &GarminCredentials) -> Result<LoginOutcome, ClientError> {
        let jar = Arc::new(Jar::default());
        let sso = Self::sso_client(Arc::clone(&jar))?;

        // Sets the SSO session cookies
        sso.get(SSO_EMBED_URL)
            .query(&embed_params())
            .send()
            .await
            .map_err(|e| transport_error(&e))?;

        let signin_url = format!("{SSO_URL}/signin");
        let page = Self::sso_page(
            sso.get(&signin_url)
                .query(&signin_params())
                .send()
                .await
                .map_err(|e| transport_error(&e))?,
        )
        .await?;
        let csrf = scrape(&CSRF_PATTERN, &page)
            .ok_or_else(|| ClientError::InvalidResponse("No CSRF token on sign-in page".to_owned()))?;

        let html = Self::sso_page(
            sso.post(&signin_url)
                .query(&signin_params())
                .form(&[
                    ("username", credentials.email.as_str()),
                    ("password", credentials.password.as_str()),
                    ("embed", "true"),
                    ("_csrf", csrf.as_str()),
                ])
                .send()
                .await
                .map_err(|e| transport_error(&e))?,
        )
        .await?;

        let title = scrape(&TITLE_PATTERN, &html).unwrap_or_default();
        if title.contains("MFA") {
            let mfa_csrf = scrape(&CSRF_PATTERN, &html).ok_or_else(|| {
                ClientError::InvalidResponse("No CSRF token on MFA page".to_owned())
            })?;
            info!("Garmin requested an MFA code");
            return Ok(LoginOutcome::MfaRequired(ChallengeState::with_jar(
                mfa_csrf, jar,
            )));
        }
        if title != "Success" {
            return Err(ClientError::LoginRejected(format!(
                "Unexpected sign-in page: {title}"
            )));
        }

        self.complete_login(&html).await.map(LoginOutcome::Complete)
    }

    #[instrument(skip_all)]
    async fn resume_login(
        &self,
        challenge: ChallengeState,
        code: &str,
    ) -> Result<SessionTokens, ClientError> {
        let sso = Self::sso_client(challenge.jar())?;
        let response = sso
            .post(format!("{SSO_URL}/verifyMFA/loginEnterMfaCode"))
            .query(&signin_params())
            .form(&[
                ("mfa-code", code),
                ("embed", "true"),
                ("_csrf", challenge.csrf_token()),
                ("fromPage", "setupEnterMfaCode"),
            ])
            .send()
            .await
            .map_err(|e| transport_error(&e))?;

        let status = response.status();
        let html = response.text().await.map_err(|e| transport_error(&e))?;
        let title = scrape(&TITLE_PATTERN, &html).unwrap_or_default();

        if status == StatusCode::FORBIDDEN
            || (title != "Success" && html.to_lowercase().contains("csrf"))
        {
            return Err(ClientError::StaleChallenge(format!(
                "HTTP {}",
                status.as_u16()
            )));
        }
        if !status.is_success() {
            return Err(status_error(status, &html));
        }
        if title != "Success" {
            return Err(ClientError::LoginRejected(
                "The MFA code was not accepted".to_owned(),
            ));
        }

        self.complete_login(&html).await
    }

    async fn refresh(&self, tokens: &SessionTokens) -> Result<SessionTokens, ClientError> {
        info!("Refreshing Garmin OAuth2 token");
        let oauth2 = self.exchange(&tokens.oauth1).await?;
        Ok(SessionTokens {
            oauth1: tokens.oauth1.clone(),
            oauth2,
        })
    }

    async fn fetch(
        &self,
        tokens: &SessionTokens,
        request: &DataRequest,
    ) -> Result<Value, ClientError> {
        if tokens.oauth2.is_expired() {
            return Err(ClientError::Unauthorized(
                "OAuth2 access token expired".to_owned(),
            ));
        }

        let display_name = if request.needs_display_name() {
            self.display_name(tokens).await?
        } else {
            String::new()
        };
        let path = request.path(&display_name);
        debug!(path = %path, "Garmin data request");
        self.get_json(tokens, &path).await
    }
}
