// ABOUTME: Context assembler turning an intent decision into the text handed to the language model
// ABOUTME: Runs the fetchers a topic needs in order, renders their blocks and appends conversation memory
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Context Assembly
//!
//! [`ContextAssembler`] is the bridge between the intent router and the model.
//! Fetches run one after another; a category that is empty or fails simply
//! contributes no block. When nothing at all is available the data part is the
//! literal [`NO_DATA`], and the memory tail is appended after that check.

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::intent::{IntentDecision, TimeScope, Topic};
use crate::metrics::{FetchOutcome, MetricFetcher};

mod format;
/// Conversation memory and saved chat history
pub mod memory;

pub use memory::{ConversationMemory, HistoryStore, MemoryEntry};

/// Data context when no category produced anything
pub const NO_DATA: &str = "No data available";

const SUMMARY_TOPICS: &[Topic] = &[Topic::Summary, Topic::All];
const ACTIVITY_TOPICS: &[Topic] = &[Topic::Activities, Topic::All];
const SLEEP_TOPICS: &[Topic] = &[Topic::Sleep, Topic::All];
const BODY_BATTERY_TOPICS: &[Topic] = &[Topic::BodyBattery, Topic::Comprehensive, Topic::All];
const STRESS_TOPICS: &[Topic] = &[Topic::Stress, Topic::Comprehensive, Topic::All];
const RESPIRATION_TOPICS: &[Topic] = &[Topic::Respiration, Topic::Comprehensive];
const HYDRATION_TOPICS: &[Topic] = &[Topic::Hydration, Topic::Nutrition, Topic::Comprehensive];
const NUTRITION_TOPICS: &[Topic] = &[Topic::Nutrition, Topic::Comprehensive, Topic::All];
const FLOORS_TOPICS: &[Topic] = &[Topic::Floors, Topic::Comprehensive, Topic::All];
const INTENSITY_TOPICS: &[Topic] = &[Topic::Intensity, Topic::Comprehensive, Topic::All];
const SPO2_TOPICS: &[Topic] = &[Topic::Spo2, Topic::Comprehensive];
const HRV_TOPICS: &[Topic] = &[Topic::Hrv, Topic::Comprehensive];
const TRAINING_TOPICS: &[Topic] = &[Topic::Training, Topic::Comprehensive];

/// Builds grounding context from live Garmin data
pub struct ContextAssembler<'a> {
    fetcher: &'a MetricFetcher<'a>,
}

impl<'a> ContextAssembler<'a> {
    /// Assemble through an authenticated fetcher
    #[must_use]
    pub const fn new(fetcher: &'a MetricFetcher<'a>) -> Self {
        Self { fetcher }
    }

    fn today(&self) -> NaiveDate {
        self.fetcher.today()
    }

    /// Data blocks followed by the memory tail
    pub async fn assemble(&self, decision: &IntentDecision, memory: &ConversationMemory) -> String {
        let mut context = self.build_data_context(decision).await;
        context.push_str(&memory.render());
        context
    }

    /// Data blocks only; [`NO_DATA`] when none were produced
    ///
    /// A date range that finds activities is the whole context. An empty or
    /// failed range falls back to the topic blocks with the count listing.
    pub async fn build_data_context(&self, decision: &IntentDecision) -> String {
        if let Some(lines) = self.range_listing(&decision.time_scope).await {
            debug!(lines = lines.len(), "Assembled date range context");
            return lines.join("\n");
        }

        let topic = decision.topic;
        let limit = decision.time_scope.limit();
        let wants = |topics: &[Topic]| topics.contains(&topic);
        let mut parts: Vec<String> = Vec::new();

        if wants(SUMMARY_TOPICS) {
            if let Some(summary) = self.fetcher.fetch_summary(None).await.available("summary") {
                parts.extend(format::summary(&summary, self.today()));
            }
        }

        if wants(ACTIVITY_TOPICS) {
            if let Some(activities) = self
                .fetcher
                .fetch_activities(limit)
                .await
                .available("activities")
            {
                parts.extend(format::recent_activities(&activities));
            }
        }

        if wants(SLEEP_TOPICS) {
            if let Some(sleep) = self.fetcher.fetch_sleep(None).await.available("sleep") {
                parts.extend(format::sleep(&sleep));
            }
        }

        if wants(BODY_BATTERY_TOPICS) {
            let record = self.fetcher.fetch_body_battery(None).await;
            parts.extend(
                record
                    .available("body_battery")
                    .as_ref()
                    .and_then(format::body_battery)
                    .unwrap_or_default(),
            );
        }

        if wants(STRESS_TOPICS) {
            let record = self.fetcher.fetch_stress(None).await;
            parts.extend(
                record
                    .available("stress")
                    .as_ref()
                    .and_then(format::stress)
                    .unwrap_or_default(),
            );
        }

        if wants(RESPIRATION_TOPICS) {
            let record = self.fetcher.fetch_respiration(None).await;
            parts.extend(
                record
                    .available("respiration")
                    .as_ref()
                    .and_then(format::respiration)
                    .unwrap_or_default(),
            );
        }

        if wants(HYDRATION_TOPICS) {
            let record = self.fetcher.fetch_hydration(None).await;
            if let Some(hydration) = record.available("hydration") {
                parts.extend(format::hydration(&hydration));
            }
        }

        if wants(NUTRITION_TOPICS) {
            let calories = self.fetcher.fetch_calories(None).await;
            parts.extend(
                calories
                    .available("calories")
                    .as_ref()
                    .and_then(format::calories)
                    .unwrap_or_default(),
            );

            let nutrition = self.fetcher.fetch_nutrition(None).await;
            parts.extend(
                nutrition
                    .available("nutrition")
                    .as_ref()
                    .and_then(format::nutrition)
                    .unwrap_or_default(),
            );

            let food_log = self.fetcher.fetch_food_log(None).await;
            parts.extend(
                food_log
                    .available("food_log")
                    .as_deref()
                    .and_then(format::food_log)
                    .unwrap_or_default(),
            );
        }

        if wants(FLOORS_TOPICS) {
            let record = self.fetcher.fetch_floors(None).await;
            parts.extend(
                record
                    .available("floors")
                    .as_ref()
                    .and_then(format::floors)
                    .unwrap_or_default(),
            );
        }

        if wants(INTENSITY_TOPICS) {
            let record = self.fetcher.fetch_intensity_minutes(None).await;
            if let Some(intensity) = record.available("intensity") {
                parts.extend(format::intensity(&intensity));
            }
        }

        if wants(SPO2_TOPICS) {
            let record = self.fetcher.fetch_spo2(None).await;
            parts.extend(
                record
                    .available("spo2")
                    .as_ref()
                    .and_then(format::spo2)
                    .unwrap_or_default(),
            );
        }

        if wants(HRV_TOPICS) {
            let record = self.fetcher.fetch_hrv(None).await;
            parts.extend(
                record
                    .available("hrv")
                    .as_ref()
                    .and_then(format::hrv)
                    .unwrap_or_default(),
            );
        }

        if wants(TRAINING_TOPICS) {
            let performance = self.fetcher.fetch_performance(None).await;
            parts.extend(
                performance
                    .available("performance")
                    .as_ref()
                    .and_then(format::performance)
                    .unwrap_or_default(),
            );

            let status = self.fetcher.fetch_training_status(None).await;
            parts.extend(
                status
                    .available("training_status")
                    .as_ref()
                    .and_then(format::training_status)
                    .unwrap_or_default(),
            );
        }

        if topic == Topic::Strength {
            parts.extend(self.strength_block(limit).await);
        }

        debug!(topic = %topic, lines = parts.len(), "Assembled data context");
        if parts.is_empty() {
            NO_DATA.to_owned()
        } else {
            parts.join("\n")
        }
    }

    async fn range_listing(&self, scope: &TimeScope) -> Option<Vec<String>> {
        let TimeScope::DateRange { start, end, .. } = *scope else {
            return None;
        };
        match self.fetcher.fetch_activities_by_date_range(start, end).await {
            FetchOutcome::Success(activities) => {
                Some(format::activities_in_range(&activities, start, end))
            }
            FetchOutcome::Empty => {
                info!(%start, %end, "No activities in range, using topic blocks");
                None
            }
            FetchOutcome::Error(e) => {
                warn!(
                    %start, %end, error = %e,
                    "Date range fetch failed, using topic blocks"
                );
                None
            }
        }
    }

    async fn strength_block(&self, limit: usize) -> Vec<String> {
        let Some(activities) = self
            .fetcher
            .find_strength_activities(limit)
            .await
            .available("strength")
        else {
            return format::no_strength();
        };

        let mut lines = format::strength_header(activities.len());
        for (i, activity) in activities.iter().enumerate() {
            match self.fetcher.fetch_strength_workout(activity.id).await {
                FetchOutcome::Success(workout) => lines.extend(format::strength_detailed(&workout)),
                FetchOutcome::Empty => lines.extend(format::strength_basic(i + 1, activity)),
                FetchOutcome::Error(e) => {
                    debug!(activity_id = activity.id, error = %e, "Strength details unavailable");
                    lines.extend(format::strength_basic(i + 1, activity));
                }
            }
        }
        lines
    }
}
