// ABOUTME: Text renderers turning normalized metric records into labelled context blocks
// ABOUTME: Each renderer yields its lines with a trailing blank, or nothing when the record has no usable fields
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use chrono::NaiveDate;

use crate::metrics::records::display_number;
use crate::metrics::{
    format_strength_workout, Activity, BodyBattery, Calories, DailySummary, Floors, FoodLogEntry,
    Hrv, Hydration, IntensityMinutes, Nutrition, Performance, Respiration, Sleep, Spo2,
    StrengthWorkout, StressRecord, TrainingStatus,
};

const ML_PER_CUP: f64 = 236.588;
const FOOD_LOG_PREVIEW: usize = 5;

fn na<T: ToString>(value: Option<T>) -> String {
    value.map_or_else(|| "N/A".to_owned(), |v| v.to_string())
}

fn na_number(value: Option<f64>) -> String {
    value.map_or_else(|| "N/A".to_owned(), display_number)
}

fn hours(seconds: Option<i64>) -> f64 {
    seconds.unwrap_or_default() as f64 / 3600.0
}

/// Header, body, trailing blank; `None` when the body is empty
fn block(header: String, body: Vec<String>) -> Option<Vec<String>> {
    if body.is_empty() {
        return None;
    }
    let mut lines = Vec::with_capacity(body.len() + 2);
    lines.push(header);
    lines.extend(body);
    lines.push(String::new());
    Some(lines)
}

pub fn summary(record: &DailySummary, today: NaiveDate) -> Vec<String> {
    let mut lines = vec!["=== Today's Summary ===".to_owned(), format!("Date: {today}")];
    if let Some(steps) = record.total_steps {
        lines.push(format!("Steps: {steps}"));
    }
    if let Some(calories) = record.total_kilocalories {
        lines.push(format!("Calories: {}", display_number(calories)));
    }
    if let Some(active) = record.active_kilocalories {
        lines.push(format!("Active Calories: {}", display_number(active)));
    }
    lines.push(String::new());
    lines
}

fn activity_entry(index: usize, activity: &Activity, always_show_distance: bool) -> Vec<String> {
    let km = activity.distance_meters / 1000.0;
    let mut lines = vec![
        format!("{index}. {} ({})", activity.name, activity.type_key),
        format!("   Date: {}", activity.start_time_local),
    ];
    if always_show_distance || km > 0.0 {
        lines.push(format!("   Distance: {km:.2} km"));
    }
    lines.push(format!(
        "   Duration: {:.1} minutes",
        activity.duration_seconds / 60.0
    ));
    lines.push(format!("   Calories: {}", na_number(activity.calories)));
    lines
}

pub fn recent_activities(activities: &[Activity]) -> Vec<String> {
    let mut lines = vec![format!(
        "=== Recent Activities (Last {}) ===",
        activities.len()
    )];
    for (i, activity) in activities.iter().enumerate() {
        lines.extend(activity_entry(i + 1, activity, false));
        if activity.is_strength() {
            lines.push("   💪 Strength Training - detailed exercise data available".to_owned());
        }
        lines.push(String::new());
    }
    lines
}

pub fn activities_in_range(
    activities: &[Activity],
    start: NaiveDate,
    end: NaiveDate,
) -> Vec<String> {
    let mut lines = vec![format!(
        "=== Activities from {start} to {end} ({} activities) ===",
        activities.len()
    )];
    for (i, activity) in activities.iter().enumerate() {
        lines.extend(activity_entry(i + 1, activity, true));
        lines.push(String::new());
    }
    lines
}

pub fn sleep(record: &Sleep) -> Vec<String> {
    vec![
        "=== Last Night's Sleep ===".to_owned(),
        format!("Total Sleep: {:.1} hours", hours(record.total_seconds)),
        format!("Deep Sleep: {:.1} hours", hours(record.deep_seconds)),
        format!("Light Sleep: {:.1} hours", hours(record.light_seconds)),
        format!("REM Sleep: {:.1} hours", hours(record.rem_seconds)),
        format!("Awake Time: {:.1} hours", hours(record.awake_seconds)),
        String::new(),
    ]
}

pub fn body_battery(record: &BodyBattery) -> Option<Vec<String>> {
    let current = record.current.filter(|v| *v != 0)?;
    block(
        "=== Body Battery ===".to_owned(),
        vec![
            format!("Current: {current}"),
            format!("Highest Today: {}", na(record.highest)),
            format!("Lowest Today: {}", na(record.lowest)),
            format!("Charged: +{}", record.charged.unwrap_or_default()),
            format!("Drained: -{}", record.drained.unwrap_or_default()),
        ],
    )
}

pub fn stress(record: &StressRecord) -> Option<Vec<String>> {
    let average = record.average.filter(|v| *v != 0)?;
    let minutes = |seconds: Option<i64>| seconds.unwrap_or_default() as f64 / 60.0;
    block(
        "=== Stress Levels ===".to_owned(),
        vec![
            format!("Average: {average}/100"),
            format!("Max: {}/100", na(record.max)),
            format!("Rest Stress: {}", na(record.rest)),
            format!("Activity Stress: {}", na(record.activity)),
            format!("Low Stress Duration: {:.0} min", minutes(record.low_duration)),
            format!("High Stress Duration: {:.0} min", minutes(record.high_duration)),
        ],
    )
}

pub fn respiration(record: &Respiration) -> Option<Vec<String>> {
    let waking = record.waking_avg.filter(|v| *v != 0.0)?;
    block(
        "=== Respiration ===".to_owned(),
        vec![
            format!("Waking Average: {} breaths/min", display_number(waking)),
            format!(
                "Sleeping Average: {} breaths/min",
                na_number(record.sleeping_avg)
            ),
        ],
    )
}

pub fn hydration(record: &Hydration) -> Vec<String> {
    let ml = record.intake_ml.unwrap_or_default();
    vec![
        "=== Hydration ===".to_owned(),
        format!(
            "Water Intake: {} ml ({:.1} cups)",
            display_number(ml),
            ml / ML_PER_CUP
        ),
        String::new(),
    ]
}

pub fn calories(record: &Calories) -> Option<Vec<String>> {
    let total = record.total_burned.filter(|v| *v != 0.0)?;
    let mut body = vec![
        format!("Total Burned: {} kcal", display_number(total)),
        format!("Active Burned: {} kcal", na_number(record.active_burned)),
        format!("BMR: {} kcal", na_number(record.bmr)),
    ];
    if let Some(consumed) = record.consumed.filter(|v| *v != 0.0) {
        body.push(format!("Consumed: {} kcal", display_number(consumed)));
        body.push(format!("Net: {} kcal", na_number(record.net)));
    }
    block("=== Calories ===".to_owned(), body)
}

pub fn nutrition(record: &Nutrition) -> Option<Vec<String>> {
    let consumed = record.calories_consumed.filter(|v| *v != 0.0)?;
    let mut body = vec![format!("Calories Consumed: {} kcal", display_number(consumed))];
    let macros = [
        ("Protein", record.protein_g),
        ("Carbs", record.carbs_g),
        ("Fat", record.fat_g),
        ("Fiber", record.fiber_g),
        ("Sugar", record.sugar_g),
    ];
    for (label, grams) in macros {
        if let Some(grams) = grams.filter(|g| *g != 0.0) {
            body.push(format!("{label}: {}g", display_number(grams)));
        }
    }
    block("=== Nutrition Details ===".to_owned(), body)
}

pub fn food_log(entries: &[FoodLogEntry]) -> Option<Vec<String>> {
    if entries.is_empty() {
        return None;
    }
    let mut body = vec![format!("Number of meals logged: {}", entries.len())];
    for (i, entry) in entries.iter().take(FOOD_LOG_PREVIEW).enumerate() {
        body.push(format!(
            "{}. {} - {} kcal",
            i + 1,
            entry.name,
            display_number(entry.calories.unwrap_or_default())
        ));
    }
    block("=== Food Log ===".to_owned(), body)
}

pub fn floors(record: &Floors) -> Option<Vec<String>> {
    let ascended = record.ascended.filter(|v| *v != 0)?;
    block(
        "=== Floors Climbed ===".to_owned(),
        vec![
            format!("Ascended: {ascended}"),
            format!("Descended: {}", record.descended.unwrap_or_default()),
            format!("Goal: {}", na(record.goal)),
        ],
    )
}

pub fn intensity(record: &IntensityMinutes) -> Vec<String> {
    let minutes = |value: Option<i64>| value.unwrap_or_default();
    vec![
        "=== Intensity Minutes ===".to_owned(),
        format!("Today Moderate: {} min", minutes(record.moderate)),
        format!("Today Vigorous: {} min", minutes(record.vigorous)),
        format!("Weekly Moderate: {} min", minutes(record.weekly_moderate)),
        format!("Weekly Vigorous: {} min", minutes(record.weekly_vigorous)),
        format!("Weekly Goal: {} min", record.weekly_goal),
        String::new(),
    ]
}

pub fn spo2(record: &Spo2) -> Option<Vec<String>> {
    let body = [
        ("Latest", record.latest),
        ("Lowest", record.lowest),
        ("Average", record.average),
    ]
    .into_iter()
    .filter_map(|(label, value)| value.map(|v| format!("{label}: {}%", display_number(v))))
    .collect();
    block("=== Blood Oxygen (SpO2) ===".to_owned(), body)
}

pub fn hrv(record: &Hrv) -> Option<Vec<String>> {
    let body = [
        ("Last Night Average", record.last_night_avg),
        ("Weekly Average", record.weekly_avg),
    ]
    .into_iter()
    .filter_map(|(label, value)| value.map(|v| format!("{label}: {} ms", display_number(v))))
    .collect();
    block("=== Heart Rate Variability ===".to_owned(), body)
}

pub fn performance(record: &Performance) -> Option<Vec<String>> {
    let mut body = Vec::new();
    if let Some(vo2) = record.vo2_max {
        body.push(format!("VO2 Max: {}", display_number(vo2)));
    }
    if let Some(age) = record.fitness_age {
        body.push(format!("Fitness Age: {}", display_number(age)));
    }
    block("=== Performance Metrics ===".to_owned(), body)
}

pub fn training_status(record: &TrainingStatus) -> Option<Vec<String>> {
    let mut body = Vec::new();
    if let Some(load) = record.training_load {
        body.push(format!("Load: {}", display_number(load)));
    }
    if let Some(focus) = &record.load_focus {
        body.push(format!("Focus: {focus}"));
    }
    block("=== Training Status ===".to_owned(), body)
}

pub fn strength_header(count: usize) -> Vec<String> {
    vec![
        format!("=== Recent Strength Training ({count} workouts) ==="),
        String::new(),
    ]
}

pub fn strength_detailed(workout: &StrengthWorkout) -> Vec<String> {
    vec![
        format_strength_workout(workout),
        String::new(),
        "---".to_owned(),
        String::new(),
    ]
}

pub fn strength_basic(index: usize, activity: &Activity) -> Vec<String> {
    vec![
        format!("{index}. {}", activity.name),
        format!("   Date: {}", activity.date()),
        format!("   Duration: {} minutes", activity.duration_minutes()),
        format!("   Calories: {}", na_number(activity.calories)),
        "   (Detailed exercise data not available)".to_owned(),
        String::new(),
    ]
}

pub fn no_strength() -> Vec<String> {
    vec![
        "=== Strength Training ===".to_owned(),
        "No strength training activities found in recent workouts.".to_owned(),
        String::new(),
    ]
}

#[cfg(test)]
mod tests {
    use std::slice;

    use super::*;

    #[test]
    fn test_body_battery_needs_current() {
        let record = BodyBattery {
            current: None,
            highest: Some(80),
            lowest: Some(20),
            charged: Some(40),
            drained: Some(30),
        };
        assert!(body_battery(&record).is_none());
    }

    #[test]
    fn test_hydration_cups() {
        let lines = hydration(&Hydration {
            intake_ml: Some(473.176),
            goal_ml: None,
        });
        assert_eq!(lines[1], "Water Intake: 473.176 ml (2.0 cups)");
    }

    #[test]
    fn test_spo2_without_fields_is_omitted() {
        let record = Spo2 {
            latest: None,
            lowest: None,
            average: None,
        };
        assert!(spo2(&record).is_none());
    }

    #[test]
    fn test_count_path_hides_zero_distance() {
        let activity = Activity {
            id: 1,
            name: "Leg Day".to_owned(),
            type_key: "strength_training".to_owned(),
            start_time_local: "2024-01-16 18:00:00".to_owned(),
            duration_seconds: 2700.0,
            distance_meters: 0.0,
            calories: None,
        };
        let lines = recent_activities(slice::from_ref(&activity));
        assert!(!lines.iter().any(|l| l.contains("Distance")));
        assert!(lines.iter().any(|l| l == "   Calories: N/A"));
        assert!(lines.iter().any(|l| l.contains("💪")));

        let start = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 1, 17).unwrap();
        let ranged = activities_in_range(slice::from_ref(&activity), start, end);
        assert_eq!(ranged[0], "=== Activities from 2024-01-10 to 2024-01-17 (1 activities) ===");
        assert!(ranged.iter().any(|l| l == "   Distance: 0.00 km"));
    }
}
