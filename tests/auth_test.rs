// ABOUTME: Integration tests for the Garmin authentication gate
// ABOUTME: Covers credential login, the MFA cycle, stale challenge retry and stored session resume
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use common::{
    credentials, init_test_logging, sample_tokens, LoginBehavior, MemoryTokenStore,
    MockFitnessClient,
};
use garmin_chat::auth::{AuthGate, AuthOutcome, AuthState};
use garmin_chat::config::GarminCredentials;
use garmin_chat::errors::ErrorCode;
use garmin_chat::garmin::ClientError;
use serde_json::json;

fn gate(client: &Arc<MockFitnessClient>, store: &Arc<MemoryTokenStore>) -> AuthGate {
    AuthGate::new(client.clone(), store.clone(), credentials())
}

// ============================================================================
// Credential login
// ============================================================================

#[tokio::test]
async fn test_login_without_mfa_succeeds_and_persists_tokens() {
    init_test_logging();
    let client = Arc::new(MockFitnessClient::new(LoginBehavior::Complete));
    let store = Arc::new(MemoryTokenStore::default());
    let mut gate = gate(&client, &store);

    assert_eq!(gate.state(), AuthState::Unauthenticated);
    assert_eq!(gate.authenticate().await, AuthOutcome::Success);
    assert!(gate.is_authenticated());
    assert_eq!(store.saves.load(Ordering::SeqCst), 1);
    assert_eq!(gate.tokens().unwrap(), &sample_tokens());
}

#[tokio::test]
async fn test_rejected_login_reports_error() {
    let client = Arc::new(MockFitnessClient::new(LoginBehavior::Reject(
        "Invalid username or password".to_owned(),
    )));
    let store = Arc::new(MemoryTokenStore::default());
    let mut gate = gate(&client, &store);

    let AuthOutcome::Error(message) = gate.authenticate().await else {
        panic!("expected an error outcome");
    };
    assert!(message.starts_with("Login failed"));
    assert!(message.contains("Invalid username or password"));
    assert_eq!(gate.state(), AuthState::Unauthenticated);
}

#[tokio::test]
async fn test_missing_credentials_skip_login() {
    let client = Arc::new(MockFitnessClient::new(LoginBehavior::Complete));
    let store = Arc::new(MemoryTokenStore::default());
    let mut gate = AuthGate::new(
        client.clone(),
        store,
        GarminCredentials::new("runner@example.com", ""),
    );

    assert!(matches!(gate.authenticate().await, AuthOutcome::Error(_)));
    assert_eq!(client.logins.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_tokens_require_authentication() {
    let client = Arc::new(MockFitnessClient::new(LoginBehavior::Complete));
    let store = Arc::new(MemoryTokenStore::default());
    let gate = gate(&client, &store);

    let error = gate.fetcher().err().unwrap();
    assert_eq!(error.code, ErrorCode::AuthRequired);
}

// ============================================================================
// MFA cycle
// ============================================================================

#[tokio::test]
async fn test_mfa_flow_completes_with_valid_code() {
    init_test_logging();
    let client = Arc::new(MockFitnessClient::new(LoginBehavior::Mfa));
    let store = Arc::new(MemoryTokenStore::default());
    let mut gate = gate(&client, &store);

    assert_eq!(gate.authenticate().await, AuthOutcome::MfaRequired);
    assert_eq!(gate.state(), AuthState::MfaPending);

    assert_eq!(gate.submit_mfa(" 123456 ").await, AuthOutcome::Success);
    assert_eq!(gate.state(), AuthState::Authenticated);
    assert_eq!(*client.mfa_codes.lock().unwrap(), vec!["123456".to_owned()]);
    assert!(store.tokens.lock().unwrap().is_some());
}

#[tokio::test]
async fn test_submit_mfa_without_pending_challenge() {
    let client = Arc::new(MockFitnessClient::new(LoginBehavior::Mfa));
    let store = Arc::new(MemoryTokenStore::default());
    let mut gate = gate(&client, &store);

    assert_eq!(
        gate.submit_mfa("123456").await,
        AuthOutcome::Error("Must authenticate first before submitting MFA".to_owned())
    );
    assert!(client.mfa_codes.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_malformed_code_keeps_challenge_pending() {
    let client = Arc::new(MockFitnessClient::new(LoginBehavior::Mfa));
    let store = Arc::new(MemoryTokenStore::default());
    let mut gate = gate(&client, &store);
    gate.authenticate().await;

    for bad in ["12345", "abcdef", "1234567"] {
        let AuthOutcome::Error(message) = gate.submit_mfa(bad).await else {
            panic!("{bad} should be rejected");
        };
        assert!(message.starts_with("MFA submission failed"));
    }
    assert_eq!(gate.state(), AuthState::MfaPending);
    assert!(client.mfa_codes.lock().unwrap().is_empty());

    assert_eq!(gate.submit_mfa("654321").await, AuthOutcome::Success);
}

#[tokio::test]
async fn test_stale_challenge_retries_once_with_fresh_login() {
    let client =
        Arc::new(MockFitnessClient::new(LoginBehavior::Mfa).with_stale_challenges(1));
    let store = Arc::new(MemoryTokenStore::default());
    let mut gate = gate(&client, &store);

    gate.authenticate().await;
    assert_eq!(gate.submit_mfa("123456").await, AuthOutcome::Success);
    assert_eq!(client.logins.load(Ordering::SeqCst), 2);
    assert_eq!(client.mfa_codes.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn test_repeated_stale_challenge_gives_up() {
    let client =
        Arc::new(MockFitnessClient::new(LoginBehavior::Mfa).with_stale_challenges(2));
    let store = Arc::new(MemoryTokenStore::default());
    let mut gate = gate(&client, &store);

    gate.authenticate().await;
    let AuthOutcome::Error(message) = gate.submit_mfa("123456").await else {
        panic!("expected failure after a second stale challenge");
    };
    assert!(message.starts_with("MFA submission failed"));
    assert_eq!(gate.state(), AuthState::Unauthenticated);
    assert_eq!(client.mfa_codes.lock().unwrap().len(), 2);
}

// ============================================================================
// Stored session resume
// ============================================================================

#[tokio::test]
async fn test_stored_tokens_resume_without_login() {
    let client = Arc::new(
        MockFitnessClient::new(LoginBehavior::Reject("should not log in".to_owned()))
            .respond("activities", json!([])),
    );
    let store = Arc::new(MemoryTokenStore::with_tokens(sample_tokens()));
    let mut gate = gate(&client, &store);

    assert_eq!(gate.authenticate().await, AuthOutcome::Success);
    assert_eq!(client.logins.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_unverifiable_tokens_fall_back_to_login() {
    let client = Arc::new(
        MockFitnessClient::new(LoginBehavior::Mfa)
            .fail("activities", ClientError::Unauthorized("401".to_owned())),
    );
    let store = Arc::new(MemoryTokenStore::with_tokens(sample_tokens()));
    let mut gate = gate(&client, &store);

    assert_eq!(gate.authenticate().await, AuthOutcome::MfaRequired);
    assert_eq!(client.logins.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_set_credentials_drops_session() {
    let client = Arc::new(MockFitnessClient::new(LoginBehavior::Complete));
    let store = Arc::new(MemoryTokenStore::default());
    let mut gate = gate(&client, &store);
    gate.authenticate().await;

    gate.set_credentials(GarminCredentials::new("other@example.com", "pw"));
    assert_eq!(gate.state(), AuthState::Unauthenticated);
    assert!(!gate.ensure_fresh().await);
}
