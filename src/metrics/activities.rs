// ABOUTME: Activity reads that span several requests: date-range pagination and strength workouts
// ABOUTME: Walks newest-first pages until the range is covered or the safety cap is hit
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use chrono::NaiveDate;
use serde_json::Value;
use tracing::{info, warn};

use super::records::Activity;
use super::strength::{decompose_strength_workout, StrengthWorkout};
use super::{FetchOutcome, MetricFetcher};
use crate::garmin::DataRequest;

/// Activities requested per page when walking a date range
pub const RANGE_PAGE_SIZE: usize = 50;
/// Stop walking once this many activities have been requested
pub const RANGE_SAFETY_LIMIT: usize = 500;

impl MetricFetcher<'_> {
    /// Activities whose start date falls within `start..=end`, newest first
    ///
    /// Pages through the activity list and stops at the first activity dated
    /// before `start`, at an empty page, or after [`RANGE_SAFETY_LIMIT`]
    /// activities have been requested.
    pub async fn fetch_activities_by_date_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> FetchOutcome<Vec<Activity>> {
        let mut found = Vec::new();
        let mut offset = 0;

        'pages: loop {
            let page = match self
                .request(DataRequest::Activities {
                    start: offset,
                    limit: RANGE_PAGE_SIZE,
                })
                .await
            {
                Ok(payload) => Activity::list_from_json(&payload),
                Err(e) => return FetchOutcome::Error(e),
            };
            info!(offset, count = page.len(), "Fetched activity page");

            if page.is_empty() {
                break;
            }

            for activity in page {
                let Ok(date) = NaiveDate::parse_from_str(activity.date(), "%Y-%m-%d") else {
                    continue;
                };
                if date < start {
                    break 'pages;
                }
                if date <= end {
                    found.push(activity);
                }
            }

            offset += RANGE_PAGE_SIZE;
            if offset >= RANGE_SAFETY_LIMIT {
                warn!(
                    limit = RANGE_SAFETY_LIMIT,
                    "Reached activity safety limit while walking date range"
                );
                break;
            }
        }

        info!(%start, %end, count = found.len(), "Date range activity fetch completed");
        if found.is_empty() {
            FetchOutcome::Empty
        } else {
            FetchOutcome::Success(found)
        }
    }

    /// Strength or training activities among the `limit` most recent
    pub async fn find_strength_activities(&self, limit: usize) -> FetchOutcome<Vec<Activity>> {
        match self.fetch_activities(limit).await {
            FetchOutcome::Success(activities) => {
                let strength: Vec<Activity> = activities
                    .into_iter()
                    .filter(|a| {
                        let type_key = a.type_key.to_lowercase();
                        type_key.contains("strength") || type_key.contains("training")
                    })
                    .collect();
                (!strength.is_empty()).then_some(strength).into()
            }
            other => other,
        }
    }

    /// Exercises, sets and totals for one strength activity
    pub async fn fetch_strength_workout(&self, activity_id: i64) -> FetchOutcome<StrengthWorkout> {
        let mut details = match self.request(DataRequest::Activity(activity_id)).await {
            Ok(Value::Null) => return FetchOutcome::Empty,
            Ok(details) => details,
            Err(e) => return FetchOutcome::Error(e),
        };

        let has_sets = details.get("exerciseSets").is_some() || details.get("sets").is_some();
        if !has_sets && Activity::from_json(&details).is_strength() {
            match self.request(DataRequest::ExerciseSets(activity_id)).await {
                Ok(sets) => {
                    if let (Some(groups), Some(object)) =
                        (sets.get("exerciseSets"), details.as_object_mut())
                    {
                        object.insert("exerciseSets".to_owned(), groups.clone());
                    }
                }
                Err(e) => warn!(activity_id, error = %e, "Exercise sets unavailable"),
            }
        }

        match decompose_strength_workout(&details) {
            Ok(workout) => FetchOutcome::Success(workout),
            Err(e) => FetchOutcome::Error(e),
        }
    }
}
