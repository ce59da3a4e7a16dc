// ABOUTME: Short-term conversation memory and the on-disk chat history it is seeded from
// ABOUTME: Bounded entry queue rendered into the context tail, plus chat_<timestamp>.json files
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::collections::VecDeque;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::Local;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::errors::{AppError, AppResult};

/// Entries kept in memory
pub const MAX_MEMORY_ENTRIES: usize = 10;
/// Entries rendered into the context tail
pub const CONTEXT_MEMORY_ENTRIES: usize = 5;
/// Characters kept per rendered entry
pub const CONTEXT_MESSAGE_CHARS: usize = 100;
/// Sender label for the user's turns
pub const USER_SENDER: &str = "You";
/// Sender label for the assistant's turns
pub const ASSISTANT_SENDER: &str = "Garmin Chat";

const HISTORY_FILES_TO_SEED: usize = 5;
const MESSAGES_PER_FILE: usize = 3;

/// One remembered message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryEntry {
    /// Who said it
    #[serde(default)]
    pub sender: String,
    /// What was said
    #[serde(default)]
    pub message: String,
    /// ISO 8601 local time
    #[serde(default)]
    pub timestamp: String,
}

impl MemoryEntry {
    /// Entry stamped with the current local time
    #[must_use]
    pub fn now(sender: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            sender: sender.into(),
            message: message.into(),
            timestamp: Local::now().to_rfc3339(),
        }
    }
}

/// Bounded, oldest-first conversation memory
#[derive(Debug, Clone)]
pub struct ConversationMemory {
    entries: VecDeque<MemoryEntry>,
    capacity: usize,
}

impl Default for ConversationMemory {
    fn default() -> Self {
        Self::new()
    }
}

impl ConversationMemory {
    /// Empty memory holding up to [`MAX_MEMORY_ENTRIES`]
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(MAX_MEMORY_ENTRIES)
    }

    /// Empty memory holding up to `capacity` entries
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append, evicting the oldest entries past capacity
    pub fn push(&mut self, entry: MemoryEntry) {
        self.entries.push_back(entry);
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }

    /// Append many entries in order
    pub fn extend(&mut self, entries: impl IntoIterator<Item = MemoryEntry>) {
        for entry in entries {
            self.push(entry);
        }
    }

    /// Remember a completed exchange
    pub fn record_turn(&mut self, question: &str, answer: &str) {
        self.push(MemoryEntry::now(USER_SENDER, question));
        self.push(MemoryEntry::now(ASSISTANT_SENDER, answer));
    }

    /// Entries, oldest first
    pub fn entries(&self) -> impl Iterator<Item = &MemoryEntry> {
        self.entries.iter()
    }

    /// Number of entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is remembered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Forget everything
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Context tail listing the most recent entries, or empty when there are none
    #[must_use]
    pub fn render(&self) -> String {
        if self.entries.is_empty() {
            return String::new();
        }
        let skip = self.entries.len().saturating_sub(CONTEXT_MEMORY_ENTRIES);
        let mut out = String::from("\n\nPrevious conversation context:\n");
        for entry in self.entries.iter().skip(skip) {
            let preview: String = entry.message.chars().take(CONTEXT_MESSAGE_CHARS).collect();
            let _ = writeln!(out, "{}: {preview}...", entry.sender);
        }
        out
    }
}

#[derive(Serialize, Deserialize)]
struct HistoryFile {
    #[serde(default)]
    saved_at: String,
    #[serde(default)]
    messages: Vec<MemoryEntry>,
}

/// Saved conversations under one directory
#[derive(Debug, Clone)]
pub struct HistoryStore {
    dir: PathBuf,
}

impl HistoryStore {
    /// Store rooted at `dir`; nothing is touched until the first save
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory holding the history files
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write a conversation to a new `chat_<timestamp>.json` file
    ///
    /// # Errors
    ///
    /// Returns an error if `messages` is empty or the file cannot be written
    pub fn save(&self, messages: &[MemoryEntry]) -> AppResult<PathBuf> {
        if messages.is_empty() {
            return Err(AppError::invalid_input("No chat history to save"));
        }
        fs::create_dir_all(&self.dir)?;

        let now = Local::now();
        let stamp = now.format("%Y%m%d_%H%M%S").to_string();
        let mut path = self.dir.join(format!("chat_{stamp}.json"));
        let mut suffix = 1;
        while path.exists() {
            path = self.dir.join(format!("chat_{stamp}_{suffix}.json"));
            suffix += 1;
        }

        let file = HistoryFile {
            saved_at: now.to_rfc3339(),
            messages: messages.to_vec(),
        };
        fs::write(&path, serde_json::to_string_pretty(&file)?)?;
        info!(path = %path.display(), count = messages.len(), "Saved chat history");
        Ok(path)
    }

    /// History files, newest first by modification time
    fn history_files(&self) -> Vec<PathBuf> {
        let Ok(read_dir) = fs::read_dir(&self.dir) else {
            return Vec::new();
        };
        let mut files: Vec<(SystemTime, PathBuf)> = read_dir
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| {
                path.file_name()
                    .and_then(|name| name.to_str())
                    .is_some_and(|name| name.starts_with("chat_") && name.ends_with(".json"))
            })
            .map(|path| {
                let modified = fs::metadata(&path)
                    .and_then(|meta| meta.modified())
                    .unwrap_or(SystemTime::UNIX_EPOCH);
                (modified, path)
            })
            .collect();
        files.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| b.1.cmp(&a.1)));
        files.into_iter().map(|(_, path)| path).collect()
    }

    /// Last three messages from each of the five newest files, oldest file first
    ///
    /// Unreadable or corrupt files are skipped.
    #[must_use]
    pub fn load_recent(&self) -> Vec<MemoryEntry> {
        let mut newest = self.history_files();
        newest.truncate(HISTORY_FILES_TO_SEED);

        let mut seeded = Vec::new();
        for path in newest.iter().rev() {
            let parsed = fs::read_to_string(path)
                .map_err(AppError::from)
                .and_then(|raw| serde_json::from_str::<HistoryFile>(&raw).map_err(AppError::from));
            match parsed {
                Ok(file) => {
                    let skip = file.messages.len().saturating_sub(MESSAGES_PER_FILE);
                    seeded.extend(file.messages.into_iter().skip(skip));
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Skipping unreadable chat history");
                }
            }
        }
        seeded
    }

    /// Memory seeded from saved history, trimmed to capacity
    #[must_use]
    pub fn seed_memory(&self) -> ConversationMemory {
        let mut memory = ConversationMemory::new();
        memory.extend(self.load_recent());
        memory
    }
}
