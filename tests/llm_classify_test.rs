// ABOUTME: Integration tests for provider error classification and remediation text
// ABOUTME: Covers category precedence, Gemini specifics, suggested models and retry hints
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

use garmin_chat::config::ProviderId;
use garmin_chat::llm::{classify_error, describe_error, ErrorCategory};

// ============================================================================
// Categories
// ============================================================================

#[test]
fn test_categories_by_keyword() {
    let cases = [
        ("HTTP 401 Unauthorized", ErrorCategory::InvalidAuth),
        ("Incorrect API key provided: invalid key", ErrorCategory::InvalidAuth),
        ("403 Forbidden", ErrorCategory::Forbidden),
        ("request timed out after 30s", ErrorCategory::Timeout),
        ("connection refused", ErrorCategory::Connection),
        ("network unreachable", ErrorCategory::Connection),
        ("500 Internal Server Error", ErrorCategory::Generic),
    ];
    for (raw, expected) in cases {
        assert_eq!(classify_error(ProviderId::OpenAi, raw), expected, "{raw}");
    }
}

#[test]
fn test_quota_is_rate_limit() {
    assert_eq!(
        classify_error(ProviderId::OpenAi, "429 You exceeded your current quota"),
        ErrorCategory::RateLimit {
            retry_seconds: None
        }
    );
}

#[test]
fn test_deprecated_model_outranks_rate_limit() {
    let raw = "404 model gpt-3 not found, deprecated; quota unaffected";
    assert!(matches!(
        classify_error(ProviderId::OpenAi, raw),
        ErrorCategory::DeprecatedModel { .. }
    ));
}

#[test]
fn test_gemini_not_found_is_unavailable() {
    let raw = "Google Gemini API error (404): models/gemini-1.5-flash is not found for API version v1beta";
    assert_eq!(
        classify_error(ProviderId::Gemini, raw),
        ErrorCategory::GeminiUnavailable
    );
    // Other providers read the same text as a retired model
    assert!(matches!(
        classify_error(ProviderId::Anthropic, raw),
        ErrorCategory::DeprecatedModel { suggested: None }
    ));
}

#[test]
fn test_gemini_retry_hint_is_extracted() {
    let raw = "429 RESOURCE_EXHAUSTED. Please retry in 41.2s";
    assert_eq!(
        classify_error(ProviderId::Gemini, raw),
        ErrorCategory::RateLimit {
            retry_seconds: Some(41)
        }
    );
    // Only Gemini hints are parsed
    assert_eq!(
        classify_error(ProviderId::Xai, raw),
        ErrorCategory::RateLimit {
            retry_seconds: None
        }
    );
}

// ============================================================================
// Remediation text
// ============================================================================

#[test]
fn test_quota_message_names_dashboard() {
    let raw = "OpenAI (ChatGPT) API error (429 Too Many Requests): quota exceeded";
    let text = describe_error(ProviderId::OpenAi, "gpt-4o", raw);

    assert!(text.starts_with("⚠️ API Quota Exceeded"));
    assert!(text.contains("Your OpenAI (ChatGPT) account has exceeded its quota"));
    assert!(text.contains("https://platform.openai.com/account/billing"));
    assert!(text.ends_with(&format!("Error details: {raw}")));
}

#[test]
fn test_gemini_rate_limit_message_includes_wait() {
    let text = describe_error(
        ProviderId::Gemini,
        "gemini-1.5-flash",
        "429 quota exceeded retry_delay { seconds: 37 }",
    );
    assert!(text.starts_with("⚠️ Gemini Rate Limit Reached"));
    assert!(text.contains("⏱️ Retry in: 37 seconds"));
}

#[test]
fn test_deprecated_message_lists_models_and_suggestion() {
    let text = describe_error(
        ProviderId::Xai,
        "grok-beta",
        "The model grok-beta was deprecated. Please use grok-3 instead.",
    );
    assert!(text.contains("The AI model 'grok-beta' has been deprecated"));
    assert!(text.contains("Recommended: Use 'grok-3' instead."));
    assert!(text.contains("  • grok-vision-beta\n"));
    assert!(text.contains("Select xAI (Grok)"));
}

#[test]
fn test_every_message_carries_raw_details() {
    let raws = [
        "401 Unauthorized",
        "403 forbidden",
        "timeout",
        "connection reset",
        "something odd",
    ];
    for raw in raws {
        for provider in ProviderId::ALL {
            let text = describe_error(provider, "m", raw);
            assert!(text.contains(&format!("Error details: {raw}")), "{provider:?} {raw}");
        }
    }
}

#[test]
fn test_auth_message_names_provider() {
    let text = describe_error(ProviderId::Anthropic, "claude", "401 invalid x-api-key");
    assert!(text.starts_with("🔑 Invalid API Key"));
    assert!(text.contains("Your Anthropic (Claude) API key appears to be invalid or expired."));
}
