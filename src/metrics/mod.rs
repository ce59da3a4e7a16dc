// ABOUTME: Metric fetchers reading one health category each from Garmin Connect
// ABOUTME: Uniform FetchOutcome results that separate success, no data and failure
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Metric Fetchers
//!
//! [`MetricFetcher`] borrows the live token bundle from the auth gate and
//! exposes one `fetch_*` operation per category. Every operation returns a
//! [`FetchOutcome`]: a normalized record, `Empty` when the category holds no
//! data for the date, or a [`FetchError`] telling unsupported endpoints apart
//! from transient failures.

use chrono::NaiveDate;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::garmin::{ClientError, DataRequest, FitnessClient, SessionTokens};

/// Activity range pagination and strength workouts
pub mod activities;
/// Normalized record types
pub mod records;
/// Strength workout decomposition and formatting
pub mod strength;

pub use records::{
    Activity, BodyBattery, Calories, DailySummary, Floors, FoodLogEntry, HeartRate, Hrv,
    Hydration, IntensityMinutes, Nutrition, Performance, Respiration, Sleep, Spo2, StressRecord,
    TrainingReadiness, TrainingStatus,
};
pub use strength::{format_strength_workout, Exercise, StrengthSet, StrengthWorkout, WorkoutMetrics};

/// Why a category could not be read
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The endpoint or method does not exist for this account or device
    #[error("not supported: {0}")]
    Unsupported(String),
    /// Network, timeout, server or throttling failure
    #[error("temporarily unavailable: {0}")]
    Transient(String),
    /// The session was rejected
    #[error("session rejected: {0}")]
    Unauthorized(String),
    /// The payload could not be interpreted
    #[error("unexpected data: {0}")]
    InvalidData(String),
    /// Strength decomposition was asked for a non-strength activity
    #[error("Not a strength training activity (type: {0})")]
    NotStrengthActivity(String),
}

impl From<ClientError> for FetchError {
    fn from(error: ClientError) -> Self {
        match error {
            ClientError::Unsupported(detail) => Self::Unsupported(detail),
            ClientError::Transient(detail) => Self::Transient(detail),
            ClientError::Unauthorized(detail) => Self::Unauthorized(detail),
            other => Self::InvalidData(other.to_string()),
        }
    }
}

/// Result of reading one category
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome<T> {
    /// Normalized record
    Success(T),
    /// The category holds no data
    Empty,
    /// The category could not be read
    Error(FetchError),
}

impl<T> FetchOutcome<T> {
    /// Whether a record was produced
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Record if present; failures are logged at debug level and dropped
    pub fn available(self, category: &str) -> Option<T> {
        match self {
            Self::Success(record) => Some(record),
            Self::Empty => None,
            Self::Error(e) => {
                debug!(category, error = %e, "Metric unavailable");
                None
            }
        }
    }

    /// Transform the record
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> FetchOutcome<U> {
        match self {
            Self::Success(record) => FetchOutcome::Success(f(record)),
            Self::Empty => FetchOutcome::Empty,
            Self::Error(e) => FetchOutcome::Error(e),
        }
    }
}

impl<T> From<Option<T>> for FetchOutcome<T> {
    fn from(record: Option<T>) -> Self {
        record.map_or(Self::Empty, Self::Success)
    }
}

/// Per-category reads against an authenticated session
pub struct MetricFetcher<'a> {
    client: &'a dyn FitnessClient,
    tokens: &'a SessionTokens,
    today: NaiveDate,
}

impl<'a> MetricFetcher<'a> {
    /// Bind to a client and live tokens; `today` is the default date
    #[must_use]
    pub fn new(client: &'a dyn FitnessClient, tokens: &'a SessionTokens, today: NaiveDate) -> Self {
        Self {
            client,
            tokens,
            today,
        }
    }

    /// Date used when a fetch is called without one
    #[must_use]
    pub const fn today(&self) -> NaiveDate {
        self.today
    }

    fn resolve(&self, date: Option<NaiveDate>) -> NaiveDate {
        date.unwrap_or(self.today)
    }

    async fn request(&self, request: DataRequest) -> Result<Value, FetchError> {
        self.client
            .fetch(self.tokens, &request)
            .await
            .map_err(FetchError::from)
    }

    async fn fetch_parsed<T>(
        &self,
        request: DataRequest,
        parse: impl FnOnce(&Value) -> Option<T> + Send,
    ) -> FetchOutcome<T> {
        match self.request(request).await {
            Ok(Value::Null) => FetchOutcome::Empty,
            Ok(payload) => parse(&payload).into(),
            Err(e) => FetchOutcome::Error(e),
        }
    }

    /// Steps, calories and distance
    pub async fn fetch_summary(&self, date: Option<NaiveDate>) -> FetchOutcome<DailySummary> {
        let date = self.resolve(date);
        self.fetch_parsed(DataRequest::DailySummary(date), DailySummary::from_json)
            .await
    }

    /// Body Battery levels
    pub async fn fetch_body_battery(&self, date: Option<NaiveDate>) -> FetchOutcome<BodyBattery> {
        let date = self.resolve(date);
        self.fetch_parsed(DataRequest::DailySummary(date), BodyBattery::from_json)
            .await
    }

    /// Stress levels
    pub async fn fetch_stress(&self, date: Option<NaiveDate>) -> FetchOutcome<StressRecord> {
        let date = self.resolve(date);
        self.fetch_parsed(DataRequest::Stress(date), StressRecord::from_json)
            .await
    }

    /// Respiration rates
    pub async fn fetch_respiration(&self, date: Option<NaiveDate>) -> FetchOutcome<Respiration> {
        let date = self.resolve(date);
        self.fetch_parsed(DataRequest::Respiration(date), Respiration::from_json)
            .await
    }

    /// Water intake
    pub async fn fetch_hydration(&self, date: Option<NaiveDate>) -> FetchOutcome<Hydration> {
        let date = self.resolve(date);
        self.fetch_parsed(DataRequest::Hydration(date), Hydration::from_json)
            .await
    }

    /// Floors climbed
    pub async fn fetch_floors(&self, date: Option<NaiveDate>) -> FetchOutcome<Floors> {
        let date = self.resolve(date);
        self.fetch_parsed(DataRequest::DailySummary(date), Floors::from_json)
            .await
    }

    /// Intensity minutes
    pub async fn fetch_intensity_minutes(
        &self,
        date: Option<NaiveDate>,
    ) -> FetchOutcome<IntensityMinutes> {
        let date = self.resolve(date);
        self.fetch_parsed(DataRequest::DailySummary(date), IntensityMinutes::from_json)
            .await
    }

    /// Calories burned and consumed
    pub async fn fetch_calories(&self, date: Option<NaiveDate>) -> FetchOutcome<Calories> {
        let date = self.resolve(date);
        self.fetch_parsed(DataRequest::DailySummary(date), Calories::from_json)
            .await
    }

    /// Nutrition totals
    ///
    /// Tries the dedicated nutrition endpoint first; when that yields nothing
    /// the daily summary and then the stats endpoint contribute consumed
    /// calories and the calorie goal, later sources overriding earlier ones.
    pub async fn fetch_nutrition(&self, date: Option<NaiveDate>) -> FetchOutcome<Nutrition> {
        let date = self.resolve(date);
        match self.request(DataRequest::NutritionSummary(date)).await {
            Ok(payload) => {
                if let Some(nutrition) = Nutrition::from_nutrition_json(&payload) {
                    return FetchOutcome::Success(nutrition);
                }
            }
            Err(e) => debug!(error = %e, "Nutrition summary endpoint unavailable"),
        }

        let mut nutrition = Nutrition::default();
        let mut last_error = None;
        let mut any_read = false;
        for request in [DataRequest::DailySummary(date), DataRequest::Stats(date)] {
            match self.request(request).await {
                Ok(payload) => {
                    any_read = true;
                    nutrition.merge_summary(&payload);
                }
                Err(e) => last_error = Some(e),
            }
        }

        if nutrition.has_data() {
            FetchOutcome::Success(nutrition)
        } else if let (false, Some(e)) = (any_read, last_error) {
            FetchOutcome::Error(e)
        } else {
            FetchOutcome::Empty
        }
    }

    /// Logged foods
    pub async fn fetch_food_log(&self, date: Option<NaiveDate>) -> FetchOutcome<Vec<FoodLogEntry>> {
        let date = self.resolve(date);
        self.fetch_parsed(DataRequest::FoodLog(date), |payload| {
            let entries = FoodLogEntry::list_from_json(payload);
            (!entries.is_empty()).then_some(entries)
        })
        .await
    }

    /// Blood oxygen
    pub async fn fetch_spo2(&self, date: Option<NaiveDate>) -> FetchOutcome<Spo2> {
        let date = self.resolve(date);
        self.fetch_parsed(DataRequest::Spo2(date), Spo2::from_json)
            .await
    }

    /// Heart rate variability
    pub async fn fetch_hrv(&self, date: Option<NaiveDate>) -> FetchOutcome<Hrv> {
        let date = self.resolve(date);
        self.fetch_parsed(DataRequest::Hrv(date), Hrv::from_json).await
    }

    /// VO2 max and fitness age
    pub async fn fetch_performance(&self, date: Option<NaiveDate>) -> FetchOutcome<Performance> {
        let date = self.resolve(date);
        self.fetch_parsed(DataRequest::MaxMetrics(date), Performance::from_json)
            .await
    }

    /// Training load and focus
    pub async fn fetch_training_status(
        &self,
        date: Option<NaiveDate>,
    ) -> FetchOutcome<TrainingStatus> {
        let date = self.resolve(date);
        self.fetch_parsed(DataRequest::TrainingStatus(date), TrainingStatus::from_json)
            .await
    }

    /// Training readiness
    pub async fn fetch_training_readiness(
        &self,
        date: Option<NaiveDate>,
    ) -> FetchOutcome<TrainingReadiness> {
        let date = self.resolve(date);
        self.fetch_parsed(
            DataRequest::TrainingReadiness(date),
            TrainingReadiness::from_json,
        )
        .await
    }

    /// Resting, minimum and maximum heart rate
    pub async fn fetch_heart_rate(&self, date: Option<NaiveDate>) -> FetchOutcome<HeartRate> {
        let date = self.resolve(date);
        self.fetch_parsed(DataRequest::HeartRate(date), HeartRate::from_json)
            .await
    }

    /// Sleep stages
    pub async fn fetch_sleep(&self, date: Option<NaiveDate>) -> FetchOutcome<Sleep> {
        let date = self.resolve(date);
        self.fetch_parsed(DataRequest::Sleep(date), Sleep::from_json)
            .await
    }

    /// Most recent activities, newest first
    pub async fn fetch_activities(&self, limit: usize) -> FetchOutcome<Vec<Activity>> {
        self.fetch_parsed(DataRequest::Activities { start: 0, limit }, |payload| {
            let activities = Activity::list_from_json(payload);
            (!activities.is_empty()).then_some(activities)
        })
        .await
    }
}
