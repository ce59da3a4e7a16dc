// ABOUTME: Query intent router choosing a time scope and a data topic for each chat message
// ABOUTME: Pure keyword and pattern matching with a fixed precedence and an injected today
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Intent Router
//!
//! [`route`] reads a free-text message and decides which slice of Garmin data
//! is worth fetching. It never fails and never looks at the clock; the caller
//! passes today's date in.

use std::fmt;
use std::sync::LazyLock;

use chrono::{Datelike, Days, NaiveDate};
use regex::{Captures, Regex};
use serde::Serialize;

/// Activities listed when the message gives no count
pub const DEFAULT_ACTIVITY_LIMIT: usize = 5;
/// Activities listed when the user asks for more or all
pub const EXPANDED_ACTIVITY_LIMIT: usize = 30;
/// Upper bound for an explicit count
pub const MAX_ACTIVITY_LIMIT: usize = 50;

const EXPAND_PHRASES: &[&str] = &[
    "show me more",
    "more activities",
    "all activities",
    "all my activities",
    "show all",
    "recent activities",
];

static RELATIVE_RANGE_PATTERN: LazyLock<Option<Regex>> = LazyLock::new(|| {
    // Matches: last 5 days, past 2 weeks, last 3 months
    Regex::new(r"(?:last|past)\s+(\d+)\s+(day|week|month)s?").ok()
});

static NAMED_RANGE_PATTERN: LazyLock<Option<Regex>> = LazyLock::new(|| {
    // Matches: this week, last month, past year
    Regex::new(r"(last|past|this)\s+(month|week|year)").ok()
});

static COUNT_PATTERN: LazyLock<Option<Regex>> = LazyLock::new(|| {
    // Matches: last 10, recent 20
    Regex::new(r"(?:last|past|recent)\s+(\d+)").ok()
});

/// Data category a message is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Topic {
    /// Detailed strength workouts
    Strength,
    /// Recent activities
    Activities,
    /// Last night's sleep
    Sleep,
    /// Steps and calories
    Summary,
    /// Body Battery
    BodyBattery,
    /// Stress
    Stress,
    /// Breathing
    Respiration,
    /// Water
    Hydration,
    /// Food and macros
    Nutrition,
    /// Floors
    Floors,
    /// Intensity minutes
    Intensity,
    /// Blood oxygen
    Spo2,
    /// Heart rate variability
    Hrv,
    /// VO2 max and training status
    Training,
    /// Wide health overview
    Comprehensive,
    /// Anything else
    All,
}

/// Keyword table in precedence order; the first topic with a match wins
const TOPIC_KEYWORDS: &[(Topic, &[&str])] = &[
    (
        Topic::Strength,
        &["strength", "lifting", "weight training", "sets and reps"],
    ),
    (
        Topic::Activities,
        &["activity", "activities", "workout", "run", "walk", "bike", "exercise"],
    ),
    (Topic::Sleep, &["sleep", "rest", "bed"]),
    (Topic::Summary, &["step", "walk", "distance", "calorie"]),
    (Topic::BodyBattery, &["body battery", "energy"]),
    (Topic::Stress, &["stress", "stressed", "tension"]),
    (Topic::Respiration, &["respiration", "breathing", "breath"]),
    (Topic::Hydration, &["hydration", "water", "drink", "fluid"]),
    (
        Topic::Nutrition,
        &[
            "nutrition",
            "food",
            "eat",
            "meal",
            "diet",
            "protein",
            "carbs",
            "fat",
            "macros",
            "calories consumed",
            "food log",
            "logged",
        ],
    ),
    (Topic::Floors, &["floor", "climb", "stairs", "elevation"]),
    (Topic::Intensity, &["intensity", "vigorous", "moderate"]),
    (Topic::Spo2, &["spo2", "oxygen", "pulse ox"]),
    (
        Topic::Hrv,
        &["hrv", "heart rate variability", "variability"],
    ),
    (
        Topic::Training,
        &["vo2", "fitness age", "training status", "training load"],
    ),
    (
        Topic::Comprehensive,
        &["health", "wellness", "overview", "summary"],
    ),
];

impl Topic {
    /// Lowercase label for logs
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Strength => "strength",
            Self::Activities => "activities",
            Self::Sleep => "sleep",
            Self::Summary => "summary",
            Self::BodyBattery => "body_battery",
            Self::Stress => "stress",
            Self::Respiration => "respiration",
            Self::Hydration => "hydration",
            Self::Nutrition => "nutrition",
            Self::Floors => "floors",
            Self::Intensity => "intensity",
            Self::Spo2 => "spo2",
            Self::Hrv => "hrv",
            Self::Training => "training",
            Self::Comprehensive => "comprehensive",
            Self::All => "all",
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How far back to look
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TimeScope {
    /// Calendar range ending today
    DateRange {
        /// First day, inclusive
        start: NaiveDate,
        /// Last day, inclusive
        end: NaiveDate,
        /// Count used if the range yields nothing
        fallback_limit: usize,
    },
    /// Most recent N items
    CountLimit(usize),
}

impl TimeScope {
    /// Item count for the count-based path
    #[must_use]
    pub const fn limit(&self) -> usize {
        match self {
            Self::DateRange { fallback_limit, .. } => *fallback_limit,
            Self::CountLimit(limit) => *limit,
        }
    }
}

/// What to fetch for one message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IntentDecision {
    /// Time window
    pub time_scope: TimeScope,
    /// Data category
    pub topic: Topic,
}

fn days_before(today: NaiveDate, days: u64) -> NaiveDate {
    today
        .checked_sub_days(Days::new(days))
        .unwrap_or(NaiveDate::MIN)
}

fn relative_range(caps: &Captures<'_>, today: NaiveDate) -> Option<NaiveDate> {
    let amount: u64 = caps.get(1)?.as_str().parse().ok()?;
    let per_unit = match caps.get(2)?.as_str() {
        "week" => 7,
        "month" => 30,
        _ => 1,
    };
    Some(days_before(today, amount.saturating_mul(per_unit)))
}

fn named_range(caps: &Captures<'_>, today: NaiveDate) -> Option<NaiveDate> {
    let qualifier = caps.get(1)?.as_str();
    let unit = caps.get(2)?.as_str();
    let start = match (qualifier, unit) {
        ("this", "month") => today.with_day(1)?,
        ("this", "week") => days_before(today, u64::from(today.weekday().num_days_from_monday())),
        ("this", _) => NaiveDate::from_ymd_opt(today.year(), 1, 1)?,
        (_, "month") => days_before(today, 30),
        (_, "week") => days_before(today, 7),
        _ => days_before(today, 365),
    };
    Some(start)
}

fn range_start(message: &str, today: NaiveDate) -> Option<NaiveDate> {
    if let Some(caps) = RELATIVE_RANGE_PATTERN
        .as_ref()
        .and_then(|re| re.captures(message))
    {
        if let Some(start) = relative_range(&caps, today) {
            return Some(start);
        }
    }
    NAMED_RANGE_PATTERN
        .as_ref()
        .and_then(|re| re.captures(message))
        .and_then(|caps| named_range(&caps, today))
}

fn count_limit(message: &str) -> usize {
    let explicit = COUNT_PATTERN
        .as_ref()
        .and_then(|re| re.captures(message))
        .and_then(|caps| caps.get(1)?.as_str().parse::<usize>().ok());
    if let Some(count) = explicit {
        return count.clamp(1, MAX_ACTIVITY_LIMIT);
    }
    if EXPAND_PHRASES.iter().any(|phrase| message.contains(phrase)) {
        EXPANDED_ACTIVITY_LIMIT
    } else {
        DEFAULT_ACTIVITY_LIMIT
    }
}

fn topic(message: &str) -> Topic {
    TOPIC_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| message.contains(k)))
        .map_or(Topic::All, |(topic, _)| *topic)
}

/// Decide the time scope and topic for a message
#[must_use]
pub fn route(message: &str, today: NaiveDate) -> IntentDecision {
    let message = message.to_lowercase();
    let limit = count_limit(&message);
    let time_scope = range_start(&message, today).map_or(TimeScope::CountLimit(limit), |start| {
        TimeScope::DateRange {
            start,
            end: today,
            fallback_limit: limit,
        }
    });

    IntentDecision {
        time_scope,
        topic: topic(&message),
    }
}
