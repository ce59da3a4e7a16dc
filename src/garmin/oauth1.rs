// ABOUTME: OAuth1 HMAC-SHA1 request signing for Garmin's token exchange endpoints
// ABOUTME: Builds signature base strings and Authorization headers per RFC 5849
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::Utc;
use ring::hmac;
use serde::Deserialize;
use uuid::Uuid;

/// Consumer credentials Garmin's mobile app uses for the OAuth1 exchange
#[derive(Clone, Deserialize)]
pub struct OAuth1Consumer {
    /// Consumer key
    pub consumer_key: String,
    /// Consumer secret
    pub consumer_secret: String,
}

/// Percent-encode using the RFC 3986 unreserved set
fn encode(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

/// Signature base string: method, base URL and sorted encoded parameters
#[must_use]
pub fn signature_base_string(method: &str, base_url: &str, params: &[(String, String)]) -> String {
    let mut encoded: Vec<(String, String)> = params
        .iter()
        .map(|(k, v)| (encode(k), encode(v)))
        .collect();
    encoded.sort();

    let normalized = encoded
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");

    format!(
        "{}&{}&{}",
        method.to_uppercase(),
        encode(base_url),
        encode(&normalized)
    )
}

/// Base64 HMAC-SHA1 of the base string keyed with both secrets
#[must_use]
pub fn sign(base_string: &str, consumer_secret: &str, token_secret: Option<&str>) -> String {
    let signing_key = format!(
        "{}&{}",
        encode(consumer_secret),
        encode(token_secret.unwrap_or_default())
    );
    let key = hmac::Key::new(hmac::HMAC_SHA1_FOR_LEGACY_USE_ONLY, signing_key.as_bytes());
    STANDARD.encode(hmac::sign(&key, base_string.as_bytes()).as_ref())
}

/// Signs requests for one consumer and optional resource-owner token
pub struct OAuth1Signer<'a> {
    consumer: &'a OAuth1Consumer,
    token: Option<(&'a str, &'a str)>,
}

impl<'a> OAuth1Signer<'a> {
    /// Signer with no resource-owner token (the preauthorized step)
    #[must_use]
    pub const fn new(consumer: &'a OAuth1Consumer) -> Self {
        Self {
            consumer,
            token: None,
        }
    }

    /// Add the resource-owner token and secret
    #[must_use]
    pub const fn with_token(mut self, token: &'a str, secret: &'a str) -> Self {
        self.token = Some((token, secret));
        self
    }

    /// `Authorization` header with a fresh nonce and the current time
    #[must_use]
    pub fn authorization_header(
        &self,
        method: &str,
        base_url: &str,
        request_params: &[(String, String)],
    ) -> String {
        let nonce = Uuid::new_v4().simple().to_string();
        self.authorization_header_at(
            method,
            base_url,
            request_params,
            &nonce,
            Utc::now().timestamp(),
        )
    }

    /// `Authorization` header for a fixed nonce and timestamp
    #[must_use]
    pub fn authorization_header_at(
        &self,
        method: &str,
        base_url: &str,
        request_params: &[(String, String)],
        nonce: &str,
        timestamp: i64,
    ) -> String {
        let mut oauth_params = vec![
            ("oauth_consumer_key".to_owned(), self.consumer.consumer_key.clone()),
            ("oauth_nonce".to_owned(), nonce.to_owned()),
            ("oauth_signature_method".to_owned(), "HMAC-SHA1".to_owned()),
            ("oauth_timestamp".to_owned(), timestamp.to_string()),
            ("oauth_version".to_owned(), "1.0".to_owned()),
        ];
        if let Some((token, _)) = self.token {
            oauth_params.push(("oauth_token".to_owned(), token.to_owned()));
        }

        let mut all_params = oauth_params.clone();
        all_params.extend_from_slice(request_params);
        let base = signature_base_string(method, base_url, &all_params);
        let signature = sign(
            &base,
            &self.consumer.consumer_secret,
            self.token.map(|(_, secret)| secret),
        );
        oauth_params.push(("oauth_signature".to_owned(), signature));

        let fields = oauth_params
            .iter()
            .map(|(k, v)| format!("{k}=\"{}\"", encode(v)))
            .collect::<Vec<_>>()
            .join(", ");
        format!("OAuth {fields}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[test]
    fn test_hmac_sha1_known_vector() {
        // RFC 2202 test case 2
        let key = hmac::Key::new(hmac::HMAC_SHA1_FOR_LEGACY_USE_ONLY, b"Jefe");
        let tag = hmac::sign(&key, b"what do ya want for nothing?");
        assert_eq!(STANDARD.encode(tag.as_ref()), "7/zfauXrL6LSdBbV8YTfnCWafHk=");
    }

    #[test]
    fn test_base_string_sorts_and_double_encodes() {
        let params = pairs(&[
            ("oauth_consumer_key", "ck"),
            ("oauth_nonce", "abc123"),
            ("oauth_signature_method", "HMAC-SHA1"),
            ("oauth_timestamp", "1700000000"),
            ("oauth_version", "1.0"),
            ("oauth_token", "tok"),
            ("ticket", "ST-1 x"),
            ("accepts-mfa-tokens", "true"),
        ]);
        let base = signature_base_string(
            "get",
            "https://connectapi.garmin.com/oauth-service/oauth/preauthorized",
            &params,
        );
        assert_eq!(
            base,
            "GET&https%3A%2F%2Fconnectapi.garmin.com%2Foauth-service%2Foauth%2Fpreauthorized&accepts-mfa-tokens%3Dtrue%26oauth_consumer_key%3Dck%26oauth_nonce%3Dabc123%26oauth_signature_method%3DHMAC-SHA1%26oauth_timestamp%3D1700000000%26oauth_token%3Dtok%26oauth_version%3D1.0%26ticket%3DST-1%2520x"
        );
        assert_eq!(sign(&base, "cs", Some("ts")), "pImr0BwaxqIShxb0byV6yU99li8=");
    }

    #[test]
    fn test_header_contains_signature_and_token() {
        let consumer = OAuth1Consumer {
            consumer_key: "ck".to_owned(),
            consumer_secret: "cs".to_owned(),
        };
        let signer = OAuth1Signer::new(&consumer).with_token("tok", "ts");
        let header = signer.authorization_header_at(
            "GET",
            "https://connectapi.garmin.com/oauth-service/oauth/preauthorized",
            &pairs(&[("ticket", "ST-1 x"), ("accepts-mfa-tokens", "true")]),
            "abc123",
            1_700_000_000,
        );
        assert!(header.starts_with("OAuth oauth_consumer_key=\"ck\""));
        assert!(header.contains("oauth_token=\"tok\""));
        assert!(header.contains("oauth_signature=\"pImr0BwaxqIShxb0byV6yU99li8%3D\""));
    }

    #[test]
    fn test_fresh_nonce_per_header() {
        let consumer = OAuth1Consumer {
            consumer_key: "ck".to_owned(),
            consumer_secret: "cs".to_owned(),
        };
        let signer = OAuth1Signer::new(&consumer);
        let first = signer.authorization_header("POST", "https://example.com/x", &[]);
        let second = signer.authorization_header("POST", "https://example.com/x", &[]);
        assert_ne!(first, second);
        assert!(!first.contains("oauth_token="));
    }
}
