// ABOUTME: Integration tests for metric fetchers against a scripted Garmin client
// ABOUTME: Covers normalization, empty detection, error signals, nutrition fallback and range paging
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use chrono::{Days, NaiveDate};
use common::{morning_run, sample_tokens, today, LoginBehavior, MockFitnessClient};
use garmin_chat::garmin::{ClientError, DataRequest};
use garmin_chat::metrics::activities::{RANGE_PAGE_SIZE, RANGE_SAFETY_LIMIT};
use garmin_chat::metrics::{FetchError, FetchOutcome, MetricFetcher};
use serde_json::{json, Value};

fn client() -> MockFitnessClient {
    MockFitnessClient::new(LoginBehavior::Complete)
}

fn activity_on(id: i64, date: NaiveDate) -> Value {
    json!({
        "activityId": id,
        "activityName": format!("Activity {id}"),
        "activityType": { "typeKey": "running" },
        "startTimeLocal": format!("{date} 07:00:00"),
        "duration": 1200.0,
        "distance": 3000.0
    })
}

// ============================================================================
// Daily categories
// ============================================================================

#[tokio::test]
async fn test_summary_normalizes_fields_and_defaults_to_today() {
    let client = client().respond(
        "summary",
        json!({
            "totalSteps": 8421,
            "totalKilocalories": 2310.0,
            "activeKilocalories": 540.0,
            "totalDistanceMeters": 6400.0
        }),
    );
    let tokens = sample_tokens();
    let fetcher = MetricFetcher::new(&client, &tokens, today());

    let FetchOutcome::Success(summary) = fetcher.fetch_summary(None).await else {
        panic!("summary should parse");
    };
    assert_eq!(summary.total_steps, Some(8421));
    assert_eq!(summary.active_kilocalories, Some(540.0));
    assert_eq!(
        client.requests.lock().unwrap()[0],
        DataRequest::DailySummary(today())
    );
}

#[tokio::test]
async fn test_explicit_date_is_requested() {
    let client = client().respond("heart_rate", json!({ "restingHeartRate": 52 }));
    let tokens = sample_tokens();
    let fetcher = MetricFetcher::new(&client, &tokens, today());
    let yesterday = today().checked_sub_days(Days::new(1)).unwrap();

    let outcome = fetcher.fetch_heart_rate(Some(yesterday)).await;
    assert_eq!(outcome.map(|hr| hr.resting), FetchOutcome::Success(Some(52)));
    assert_eq!(
        client.requests.lock().unwrap()[0],
        DataRequest::HeartRate(yesterday)
    );
}

#[tokio::test]
async fn test_all_zero_payload_is_empty() {
    let client = client().respond(
        "sleep",
        json!({ "dailySleepDTO": { "sleepTimeSeconds": 0, "deepSleepSeconds": 0 } }),
    );
    let tokens = sample_tokens();
    let fetcher = MetricFetcher::new(&client, &tokens, today());

    assert_eq!(fetcher.fetch_sleep(None).await, FetchOutcome::Empty);
}

#[tokio::test]
async fn test_client_failures_map_to_fetch_errors() {
    let client = client()
        .fail("stress", ClientError::Unsupported("404".to_owned()))
        .fail("hrv", ClientError::Transient("timeout".to_owned()));
    let tokens = sample_tokens();
    let fetcher = MetricFetcher::new(&client, &tokens, today());

    assert!(matches!(
        fetcher.fetch_stress(None).await,
        FetchOutcome::Error(FetchError::Unsupported(_))
    ));
    assert!(matches!(
        fetcher.fetch_hrv(None).await,
        FetchOutcome::Error(FetchError::Transient(_))
    ));
}

#[tokio::test]
async fn test_body_battery_reads_from_summary() {
    let client = client().respond(
        "summary",
        json!({
            "bodyBatteryMostRecentValue": 64,
            "bodyBatteryHighestValue": 91,
            "bodyBatteryLowestValue": 22
        }),
    );
    let tokens = sample_tokens();
    let fetcher = MetricFetcher::new(&client, &tokens, today());

    let battery = fetcher.fetch_body_battery(None).await.available("body battery");
    assert_eq!(battery.and_then(|b| b.highest), Some(91));
}

// ============================================================================
// Nutrition fallback
// ============================================================================

#[tokio::test]
async fn test_nutrition_prefers_dedicated_endpoint() {
    let client = client().respond(
        "nutrition",
        json!({ "totalCalories": 1850, "totalProtein": 120 }),
    );
    let tokens = sample_tokens();
    let fetcher = MetricFetcher::new(&client, &tokens, today());

    let nutrition = fetcher.fetch_nutrition(None).await.available("nutrition").unwrap();
    assert_eq!(nutrition.calories_consumed, Some(1850.0));
    assert_eq!(nutrition.protein_g, Some(120.0));
    assert_eq!(client.requested("summary"), 0);
}

#[tokio::test]
async fn test_nutrition_falls_back_to_summary_and_stats() {
    let client = client()
        .fail("nutrition", ClientError::Unsupported("404".to_owned()))
        .respond("summary", json!({ "consumedCalories": 1500 }))
        .respond("stats", json!({ "consumedCalories": 1600, "netCalorieGoal": 2200 }));
    let tokens = sample_tokens();
    let fetcher = MetricFetcher::new(&client, &tokens, today());

    let nutrition = fetcher.fetch_nutrition(None).await.available("nutrition").unwrap();
    assert_eq!(nutrition.calories_consumed, Some(1600.0));
    assert_eq!(nutrition.calorie_goal, Some(2200.0));
}

#[tokio::test]
async fn test_nutrition_with_every_source_failing_is_an_error() {
    let client = client();
    let tokens = sample_tokens();
    let fetcher = MetricFetcher::new(&client, &tokens, today());

    assert!(matches!(
        fetcher.fetch_nutrition(None).await,
        FetchOutcome::Error(_)
    ));
}

// ============================================================================
// Activities
// ============================================================================

#[tokio::test]
async fn test_recent_activities_parse() {
    let client = client().respond("activities", json!([morning_run()]));
    let tokens = sample_tokens();
    let fetcher = MetricFetcher::new(&client, &tokens, today());

    let activities = fetcher.fetch_activities(5).await.available("activities").unwrap();
    assert_eq!(activities.len(), 1);
    let run = &activities[0];
    assert_eq!(run.name, "Morning Run");
    assert_eq!(run.type_key, "running");
    assert_eq!(run.date(), "2024-01-15");
    assert_eq!(run.duration_minutes(), 30);
    assert_eq!(
        client.requests.lock().unwrap()[0],
        DataRequest::Activities { start: 0, limit: 5 }
    );
}

#[tokio::test]
async fn test_empty_activity_list_is_empty() {
    let client = client().respond("activities", json!([]));
    let tokens = sample_tokens();
    let fetcher = MetricFetcher::new(&client, &tokens, today());

    assert_eq!(fetcher.fetch_activities(10).await, FetchOutcome::Empty);
}

#[tokio::test]
async fn test_date_range_keeps_only_activities_inside_range() {
    let day = |d| NaiveDate::from_ymd_opt(2024, 1, d).unwrap();
    let client = client().respond(
        "activities",
        json!([
            activity_on(5, day(17)),
            activity_on(4, day(12)),
            activity_on(3, day(10)),
            activity_on(2, day(5)),
            activity_on(1, day(1))
        ]),
    );
    let tokens = sample_tokens();
    let fetcher = MetricFetcher::new(&client, &tokens, today());

    let found = fetcher
        .fetch_activities_by_date_range(day(5), day(12))
        .await
        .available("range")
        .unwrap();
    let ids: Vec<i64> = found.iter().map(|a| a.id).collect();
    assert_eq!(ids, vec![4, 3, 2]);
    // Stops at the first activity older than the range start
    assert_eq!(client.requested("activities"), 1);
}

#[tokio::test]
async fn test_date_range_walks_pages_until_empty() {
    let start = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
    let page: Vec<Value> = (0..RANGE_PAGE_SIZE)
        .map(|i| activity_on(i64::try_from(i).unwrap(), today()))
        .collect();
    let client = client().respond("activities", Value::Array(page));
    let tokens = sample_tokens();
    let fetcher = MetricFetcher::new(&client, &tokens, today());

    let found = fetcher
        .fetch_activities_by_date_range(start, today())
        .await
        .available("range")
        .unwrap();
    assert_eq!(found.len(), RANGE_PAGE_SIZE);
    // Second page (offset 50) comes back empty
    assert_eq!(client.requested("activities"), 2);
}

#[tokio::test]
async fn test_date_range_stops_at_safety_limit() {
    let start = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
    let page: Vec<Value> = (0..RANGE_PAGE_SIZE)
        .map(|i| activity_on(i64::try_from(i).unwrap(), today()))
        .collect();
    let client = client()
        .with_endless_pages()
        .respond("activities", Value::Array(page));
    let tokens = sample_tokens();
    let fetcher = MetricFetcher::new(&client, &tokens, today());

    let found = fetcher
        .fetch_activities_by_date_range(start, today())
        .await
        .available("range")
        .unwrap();
    assert_eq!(found.len(), RANGE_SAFETY_LIMIT);
    assert_eq!(
        client.requested("activities"),
        RANGE_SAFETY_LIMIT / RANGE_PAGE_SIZE
    );
}

#[tokio::test]
async fn test_date_range_with_nothing_inside_is_empty() {
    let client = client().respond("activities", json!([morning_run()]));
    let tokens = sample_tokens();
    let fetcher = MetricFetcher::new(&client, &tokens, today());
    let start = NaiveDate::from_ymd_opt(2024, 1, 16).unwrap();

    assert_eq!(
        fetcher.fetch_activities_by_date_range(start, today()).await,
        FetchOutcome::Empty
    );
}
