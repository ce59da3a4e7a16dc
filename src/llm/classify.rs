// ABOUTME: Turns raw LLM provider failures into readable guidance for the user
// ABOUTME: Keyword classification over the lowercased provider text plus remediation messages
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Provider Error Classification
//!
//! Checks run in a fixed order over the lowercased error text, so a message
//! mentioning both a 404 model error and a quota hits the deprecated-model
//! branch first. Classification never fails; anything unrecognised is
//! [`ErrorCategory::Generic`].

use std::fmt::Write as _;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::config::ProviderId;

static SECONDS_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"seconds:\s*(\d+)").ok());
static RETRY_DELAY_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r#""retrydelay":\s*"(\d+)s""#).ok());
static RETRY_IN_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"retry in (\d+(?:\.\d+)?)\s*s").ok());

/// Where Gemini API access is switched on
const GOOGLE_CLOUD_CONSOLE: &str = "https://console.cloud.google.com/";

/// Kind of provider failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "category", rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Gemini model not reachable with this key
    GeminiUnavailable,
    /// The configured model has been retired
    DeprecatedModel {
        /// Replacement named by the provider, if any
        suggested: Option<String>,
    },
    /// Quota or rate limit hit
    RateLimit {
        /// Wait hinted by the provider
        retry_seconds: Option<u64>,
    },
    /// Key rejected
    InvalidAuth,
    /// Key lacks permission
    Forbidden,
    /// Request took too long
    Timeout,
    /// Network failure
    Connection,
    /// Anything else
    Generic,
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| haystack.contains(needle))
}

fn capture_number(pattern: &LazyLock<Option<Regex>>, text: &str) -> Option<u64> {
    pattern
        .as_ref()
        .and_then(|re| re.captures(text))
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().split('.').next())
        .and_then(|digits| digits.parse().ok())
}

fn suggested_model(lower: &str) -> Option<String> {
    let (_, rest) = lower.split_once("please use ")?;
    let token = rest.split(' ').next()?.trim_matches('.');
    (!token.is_empty()).then(|| token.to_owned())
}

fn retry_seconds(lower: &str) -> Option<u64> {
    let from_seconds = if lower.contains("retry_delay") {
        capture_number(&SECONDS_PATTERN, lower)
    } else {
        None
    };
    from_seconds
        .or_else(|| capture_number(&RETRY_DELAY_PATTERN, lower))
        .or_else(|| capture_number(&RETRY_IN_PATTERN, lower))
        .filter(|seconds| *seconds > 0)
}

/// Classify a raw provider error for `provider`
#[must_use]
pub fn classify_error(provider: ProviderId, raw: &str) -> ErrorCategory {
    let lower = raw.to_lowercase();

    if lower.contains("deprecated") || (lower.contains("404") && lower.contains("model")) {
        if provider == ProviderId::Gemini && lower.contains("404") && lower.contains("not found") {
            return ErrorCategory::GeminiUnavailable;
        }
        return ErrorCategory::DeprecatedModel {
            suggested: suggested_model(&lower),
        };
    }
    if contains_any(&lower, &["429", "quota", "rate limit", "resource_exhausted"]) {
        let retry_seconds = if provider == ProviderId::Gemini {
            retry_seconds(&lower)
        } else {
            None
        };
        return ErrorCategory::RateLimit { retry_seconds };
    }
    if lower.contains("401")
        || lower.contains("unauthorized")
        || (lower.contains("invalid") && lower.contains("key"))
    {
        return ErrorCategory::InvalidAuth;
    }
    if contains_any(&lower, &["403", "forbidden"]) {
        return ErrorCategory::Forbidden;
    }
    if contains_any(&lower, &["timeout", "timed out"]) {
        return ErrorCategory::Timeout;
    }
    if contains_any(&lower, &["connection", "network"]) {
        return ErrorCategory::Connection;
    }
    ErrorCategory::Generic
}

/// Remediation text for a failed call to `provider` using `model`
///
/// Always ends with or contains `Error details: {raw}`.
#[must_use]
pub fn describe_error(provider: ProviderId, model: &str, raw: &str) -> String {
    let info = provider.info();
    let name = info.display_name;
    let dashboard = info.dashboard_url;

    match classify_error(provider, raw) {
        ErrorCategory::GeminiUnavailable => format!(
            "🚫 Gemini API Issue\n\n\
             The Gemini model '{model}' is not accessible with your API key.\n\n\
             This usually means:\n\
             1. 🔑 Your API key doesn't have Gemini API enabled\n\
             2. 🌍 Gemini may not be available in your region\n\
             3. 📋 You need to enable the Generative Language API\n\n\
             Solutions:\n\
             1. Enable Gemini API:\n   \
             • Go to: {GOOGLE_CLOUD_CONSOLE}\n   \
             • Enable 'Generative Language API'\n   \
             • Create new API key if needed\n\n\
             2. Switch to a working provider (RECOMMENDED):\n   \
             • Open Settings\n   \
             • Choose: xAI, OpenAI, or Anthropic\n   \
             • These providers work reliably!\n\n\
             ⚠️ NOTE: Gemini API setup is complex. For immediate use,\n\
             we strongly recommend switching to OpenAI or Anthropic.\n\n\
             Error details: {raw}"
        ),
        ErrorCategory::DeprecatedModel { suggested } => {
            let mut msg = format!(
                "🔄 Model Deprecated\n\n\
                 The AI model '{model}' has been deprecated and is no longer available.\n\n"
            );
            if let Some(suggested) = suggested {
                let _ = write!(msg, "Recommended: Use '{suggested}' instead.\n\n");
            }
            let _ = write!(
                msg,
                "Solutions:\n\
                 1. Open Settings in Garmin Chat\n\
                 2. Select {name}\n\
                 3. Choose a different model from the dropdown\n\
                 4. Save and try again\n\n\
                 Available models:\n"
            );
            for available in info.models {
                let _ = writeln!(msg, "  • {available}");
            }
            let _ = write!(msg, "\nError details: {raw}");
            msg
        }
        ErrorCategory::RateLimit { retry_seconds } if provider == ProviderId::Gemini => {
            let mut msg = String::from(
                "⚠️ Gemini Rate Limit Reached\n\n\
                 You've hit Google Gemini's free tier rate limits.\n\n\
                 Free Tier Limits:\n\
                 • 15 requests per minute (RPM)\n\
                 • 1,500 requests per day (RPD)\n\
                 • 1 million tokens per minute (TPM)\n\n",
            );
            if let Some(seconds) = retry_seconds {
                let _ = write!(msg, "⏱️ Retry in: {seconds} seconds\n\n");
            }
            let _ = write!(
                msg,
                "Solutions:\n\
                 1. ⏰ WAIT ~60 seconds then try again (easiest)\n\
                 2. 💳 Upgrade to paid tier at: {dashboard}\n   \
                 - Paid tier: 2,000 RPM, much higher limits\n\
                 3. 🔄 Switch to a different AI provider in Settings\n   \
                 - Try xAI, OpenAI, or Anthropic (no free tier limits)\n\n\
                 💡 Tip: Gemini free tier is great but has strict rate limits.\n\
                 For heavy usage, consider:\n\
                 • Upgrading Gemini to paid ($$$)\n\
                 • Switching to OpenAI gpt-4o-mini ($ cheap!)\n\
                 • Switching to Anthropic claude-haiku ($ cheap!)\n\n\
                 Error details: {raw}"
            );
            msg
        }
        ErrorCategory::RateLimit { .. } => format!(
            "⚠️ API Quota Exceeded\n\n\
             Your {name} account has exceeded its quota or rate limit.\n\n\
             Solutions:\n\
             1. Add credits or upgrade your plan at: {dashboard}\n\
             2. Wait a few minutes if you hit a rate limit\n\
             3. Switch to a different AI provider in Settings\n\n\
             Common causes:\n\
             • Unpaid bill or expired credit card\n\
             • Free tier exhausted\n\
             • Too many requests in a short time\n\n\
             Error details: {raw}"
        ),
        ErrorCategory::InvalidAuth => format!(
            "🔑 Invalid API Key\n\n\
             Your {name} API key appears to be invalid or expired.\n\n\
             Solutions:\n\
             • Check your API key in Settings\n\
             • Generate a new API key from the provider's website\n\
             • Make sure you copied the entire key with no extra spaces\n\n\
             Error details: {raw}"
        ),
        ErrorCategory::Forbidden => format!(
            "🚫 Access Denied\n\n\
             Your {name} API key doesn't have permission to access this resource.\n\n\
             Solutions:\n\
             • Check that your API key has the correct permissions\n\
             • Verify your account is in good standing\n\
             • For Azure: verify your endpoint and deployment name\n\n\
             Error details: {raw}"
        ),
        ErrorCategory::Timeout => format!(
            "⏱️ Request Timeout\n\n\
             The request to {name} took too long.\n\n\
             Solutions:\n\
             • Check your internet connection\n\
             • Try again in a moment\n\
             • The AI service may be experiencing high load\n\n\
             Error details: {raw}"
        ),
        ErrorCategory::Connection => format!(
            "🌐 Connection Error\n\n\
             Could not connect to {name}.\n\n\
             Solutions:\n\
             • Check your internet connection\n\
             • Verify the provider's service is online\n\
             • Try again in a moment\n\n\
             Error details: {raw}"
        ),
        ErrorCategory::Generic => format!(
            "❌ AI Service Error\n\n\
             An error occurred while communicating with {name}.\n\n\
             Error details: {raw}\n\n\
             You can try:\n\
             • Switching to a different AI provider in Settings\n\
             • Checking the provider's status page\n\
             • Trying again in a moment"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suggested_model_strips_trailing_period() {
        let raw = "The model grok-beta was deprecated. Please use grok-3. Thanks";
        assert_eq!(
            classify_error(ProviderId::Xai, raw),
            ErrorCategory::DeprecatedModel {
                suggested: Some("grok-3".to_owned())
            }
        );
    }

    #[test]
    fn test_retry_delay_forms() {
        assert_eq!(
            retry_seconds("429 quota exceeded retry_delay { seconds: 37 }"),
            Some(37)
        );
        assert_eq!(
            retry_seconds(r#"{"retrydelay": "12s"}"#),
            Some(12)
        );
        assert_eq!(retry_seconds("please retry in 8.5 s"), Some(8));
        assert_eq!(retry_seconds("resource_exhausted"), None);
    }

    #[test]
    fn test_rate_limit_beats_auth() {
        let raw = "OpenAI (ChatGPT) API error (429 Too Many Requests): invalid key quota";
        assert_eq!(
            classify_error(ProviderId::OpenAi, raw),
            ErrorCategory::RateLimit {
                retry_seconds: None
            }
        );
    }
}
