// ABOUTME: Persistence for Garmin session tokens between runs
// ABOUTME: TokenStore trait plus a file-backed store writing oauth1/oauth2 JSON blobs
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use tracing::debug;

use super::{OAuth1Token, OAuth2Token, SessionTokens};
use crate::errors::AppResult;

const OAUTH1_FILE: &str = "oauth1_token.json";
const OAUTH2_FILE: &str = "oauth2_token.json";

/// Where session tokens are kept between runs
pub trait TokenStore: Send + Sync {
    /// Stored tokens, or `None` when either blob is missing or unreadable
    fn load(&self) -> Option<SessionTokens>;

    /// Persist tokens
    ///
    /// # Errors
    ///
    /// Returns an error if the tokens cannot be written
    fn save(&self, tokens: &SessionTokens) -> AppResult<()>;
}

/// Token store keeping one JSON file per token in a directory
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    dir: PathBuf,
}

impl FileTokenStore {
    /// Store rooted at `dir`; the directory is created on first save
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Token directory
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn read_blob<T: DeserializeOwned>(&self, name: &str) -> Option<T> {
        let path = self.dir.join(name);
        let raw = fs::read_to_string(&path).ok()?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                debug!(path = %path.display(), error = %e, "Ignoring unreadable token file");
                None
            }
        }
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Option<SessionTokens> {
        let oauth1 = self.read_blob::<OAuth1Token>(OAUTH1_FILE)?;
        let oauth2 = self.read_blob::<OAuth2Token>(OAUTH2_FILE)?;
        Some(SessionTokens { oauth1, oauth2 })
    }

    fn save(&self, tokens: &SessionTokens) -> AppResult<()> {
        fs::create_dir_all(&self.dir)?;
        fs::write(
            self.dir.join(OAUTH1_FILE),
            serde_json::to_string_pretty(&tokens.oauth1)?,
        )?;
        fs::write(
            self.dir.join(OAUTH2_FILE),
            serde_json::to_string_pretty(&tokens.oauth2)?,
        )?;
        Ok(())
    }
}
