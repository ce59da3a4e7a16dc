// ABOUTME: System prompts for LLM interactions loaded at compile time
// ABOUTME: Provides the Garmin fitness assistant system prompt sent with every conversation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # System Prompts
//!
//! Prompts are loaded at compile time from markdown files for easy maintenance.

/// Garmin fitness assistant system prompt
///
/// Describes the assistant's role, the metric families that can appear in the
/// context, and how to read activity counts versus date ranges.
pub const GARMIN_SYSTEM_PROMPT: &str = include_str!("garmin_system.md");

/// Get the default system prompt for a new chat session
#[must_use]
pub const fn get_garmin_system_prompt() -> &'static str {
    GARMIN_SYSTEM_PROMPT
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_mentions_context() {
        let prompt = get_garmin_system_prompt();
        assert!(prompt.starts_with("You are a helpful fitness and health assistant"));
        assert!(prompt.contains("Body Battery"));
        assert!(prompt
            .trim_end()
            .ends_with("The user's Garmin data will be provided in the context below."));
    }
}
