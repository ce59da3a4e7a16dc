// ABOUTME: Integration tests for the provider-agnostic chat session
// ABOUTME: Verifies message shapes per capability, history replay, failure handling and reset
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use common::RecordingProvider;
use garmin_chat::config::ProviderId;
use garmin_chat::llm::{
    describe_error, ChatMessage, ChatSession, LlmCapabilities, MessageRole, DEFAULT_MAX_TOKENS,
    DEFAULT_TEMPERATURE,
};

fn session(provider: RecordingProvider, id: ProviderId) -> ChatSession {
    ChatSession::new(Box::new(provider), id).with_system_prompt("SYSTEM")
}

// ============================================================================
// Conversational providers
// ============================================================================

#[tokio::test]
async fn test_first_turn_has_system_and_context() {
    let provider = RecordingProvider::new(LlmCapabilities::conversational()).reply("Nice run!");
    let requests = provider.recorder();
    let mut session = session(provider, ProviderId::OpenAi);

    let reply = session
        .send("How was my run?", Some("=== Recent Activities (Last 1) ==="))
        .await
        .unwrap();
    assert_eq!(reply, "Nice run!");

    let request = requests.lock().unwrap()[0].clone();
    assert_eq!(
        request.messages,
        vec![
            ChatMessage::system("SYSTEM"),
            ChatMessage::user(
                "=== Recent Activities (Last 1) ===\n\nUser Question: How was my run?"
            ),
        ]
    );
    assert_eq!(request.model.as_deref(), Some("test-model"));
    assert_eq!(request.max_tokens, Some(DEFAULT_MAX_TOKENS));
    assert_eq!(request.temperature, Some(DEFAULT_TEMPERATURE));
}

#[tokio::test]
async fn test_history_is_replayed_in_order() {
    let provider = RecordingProvider::new(LlmCapabilities::conversational())
        .reply("first answer")
        .reply("second answer");
    let requests = provider.recorder();
    let mut session = session(provider, ProviderId::Anthropic);

    session.send("first", None).await.unwrap();
    session.send("second", Some("")).await.unwrap();

    let second = requests.lock().unwrap()[1].clone();
    let roles: Vec<MessageRole> = second.messages.iter().map(|m| m.role).collect();
    assert_eq!(
        roles,
        vec![
            MessageRole::System,
            MessageRole::User,
            MessageRole::Assistant,
            MessageRole::User
        ]
    );
    assert_eq!(second.messages[2].content, "first answer");
    // Empty context sends the bare question
    assert_eq!(second.messages[3].content, "second");
    assert_eq!(session.history().len(), 4);
}

// ============================================================================
// Single-turn providers
// ============================================================================

#[tokio::test]
async fn test_single_turn_inlines_system_prompt_once() {
    let provider = RecordingProvider::new(LlmCapabilities::single_turn());
    let requests = provider.recorder();
    let mut session = session(provider, ProviderId::Gemini);

    session.send("first", Some("CTX")).await.unwrap();
    session.send("second", None).await.unwrap();

    let recorded = requests.lock().unwrap();
    assert_eq!(
        recorded[0].messages,
        vec![ChatMessage::user("SYSTEM\n\nCTX\n\nUser Question: first")]
    );
    assert_eq!(recorded[1].messages, vec![ChatMessage::user("second")]);
    assert!(recorded[0].system_prompt().is_none());
}

// ============================================================================
// Failures and reset
// ============================================================================

#[tokio::test]
async fn test_failed_turn_leaves_history_untouched() {
    let provider = RecordingProvider::new(LlmCapabilities::conversational())
        .reply("ok")
        .failure("OpenAI (ChatGPT) API error (429 Too Many Requests): quota exceeded");
    let mut session = session(provider, ProviderId::OpenAi);

    session.send("one", None).await.unwrap();
    let error = session.send("two", None).await.unwrap_err();
    assert!(error.message.contains("429"));
    assert_eq!(session.history().len(), 2);
}

#[tokio::test]
async fn test_chat_turns_failure_into_guidance() {
    let raw = "Google Gemini API error (429): RESOURCE_EXHAUSTED";
    let provider = RecordingProvider::new(LlmCapabilities::single_turn()).failure(raw);
    let mut session = session(provider, ProviderId::Gemini);

    let text = session.chat("hello", None).await;
    assert!(text.starts_with("⚠️ Gemini Rate Limit Reached"));
    assert!(text.contains(&format!("Error details: {raw}")));
    assert!(session.history().is_empty());
}

#[tokio::test]
async fn test_remediation_matches_chat_guidance() {
    let raw = "xAI (Grok) API error (401 Unauthorized): invalid key";
    let mut failing = session(
        RecordingProvider::new(LlmCapabilities::conversational()).failure(raw),
        ProviderId::Xai,
    );
    let error = failing.send("hello", None).await.unwrap_err();

    let expected = describe_error(ProviderId::Xai, "test-model", raw);
    assert_eq!(failing.remediation(&error), expected);

    let mut chatting = session(
        RecordingProvider::new(LlmCapabilities::conversational()).failure(raw),
        ProviderId::Xai,
    );
    assert_eq!(chatting.chat("hello", None).await, expected);
}

#[tokio::test]
async fn test_reset_restarts_conversation() {
    let provider = RecordingProvider::new(LlmCapabilities::single_turn());
    let requests = provider.recorder();
    let mut session = session(provider, ProviderId::Gemini);

    session.send("first", None).await.unwrap();
    session.reset_conversation();
    assert!(session.history().is_empty());

    session.send("again", None).await.unwrap();
    assert_eq!(
        requests.lock().unwrap()[1].messages,
        vec![ChatMessage::user("SYSTEM\n\nagain")]
    );
}

#[test]
fn test_model_comes_from_provider() {
    let session = session(
        RecordingProvider::new(LlmCapabilities::conversational()),
        ProviderId::Xai,
    );
    assert_eq!(session.model(), "test-model");
    assert_eq!(session.provider_id(), ProviderId::Xai);
}
