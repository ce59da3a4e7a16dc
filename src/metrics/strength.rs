// ABOUTME: Strength workout decomposition into exercises, sets, rest periods and volume
// ABOUTME: Also renders a decomposed workout as readable text for chat context
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::fmt::Write as _;

use serde::Serialize;
use serde_json::Value;

use super::records::{display_number, integer, number, text, Activity};
use super::FetchError;

/// One working set
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StrengthSet {
    /// 1-based position among the exercise's active sets
    pub set_number: u32,
    /// Repetitions
    pub reps: i64,
    /// Load, zero for bodyweight
    pub weight: f64,
    /// Unit of `weight`
    pub weight_unit: String,
    /// Time under tension in seconds
    pub duration_seconds: f64,
}

/// One exercise and its sets
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Exercise {
    /// Exercise name
    pub name: String,
    /// Garmin exercise category
    pub category: String,
    /// Active sets in order
    pub sets: Vec<StrengthSet>,
    /// Rest periods recorded between sets
    pub rest_times_seconds: Vec<f64>,
    /// Sum of reps
    pub total_reps: i64,
    /// Sum of reps × weight over loaded sets
    pub total_volume: f64,
}

impl Exercise {
    /// Mean rest between sets
    #[must_use]
    pub fn average_rest(&self) -> Option<f64> {
        (!self.rest_times_seconds.is_empty()).then(|| {
            self.rest_times_seconds.iter().sum::<f64>() / self.rest_times_seconds.len() as f64
        })
    }
}

/// Whole-workout totals
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WorkoutMetrics {
    /// Exercises with at least one active set
    pub total_exercises: usize,
    /// Active sets
    pub total_sets: usize,
    /// Reps across all sets
    pub total_reps: i64,
    /// Volume, one decimal
    pub total_volume: f64,
    /// Average rest in seconds, one decimal
    pub average_rest_time: f64,
}

/// A strength activity broken down into exercises
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StrengthWorkout {
    /// Garmin activity id
    pub activity_id: i64,
    /// Activity name
    pub activity_name: String,
    /// `YYYY-MM-DD`
    pub date: String,
    /// Duration in seconds
    pub duration_seconds: f64,
    /// Kilocalories
    pub calories: Option<f64>,
    /// Exercises performed
    pub exercises: Vec<Exercise>,
    /// Totals
    pub metrics: WorkoutMetrics,
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// `repetitions` falls through to `reps` when absent or zero
fn set_reps(set: &Value) -> i64 {
    ["repetitions", "reps"]
        .iter()
        .filter_map(|key| integer(set, &[key]))
        .find(|reps| *reps != 0)
        .unwrap_or_default()
}

fn parse_exercise(group: &Value, all_rest: &mut Vec<f64>) -> Exercise {
    let name = text(group, &["exerciseName", "category"])
        .unwrap_or_else(|| "Unknown Exercise".to_owned());
    let mut exercise = Exercise {
        name,
        category: text(group, &["category"]).unwrap_or_default(),
        sets: Vec::new(),
        rest_times_seconds: Vec::new(),
        total_reps: 0,
        total_volume: 0.0,
    };

    let sets = group.get("sets").and_then(Value::as_array);
    for set in sets.into_iter().flatten() {
        let set_type = text(set, &["setType"]).unwrap_or_default();
        if set_type.eq_ignore_ascii_case("active") {
            let reps = set_reps(set);
            let weight = number(set, &["weight"]).unwrap_or_default();
            exercise.total_reps += reps;
            if weight > 0.0 && reps > 0 {
                exercise.total_volume += weight * reps as f64;
            }
            exercise.sets.push(StrengthSet {
                set_number: exercise.sets.len() as u32 + 1,
                reps,
                weight,
                weight_unit: text(set, &["weightDisplayUnit"]).unwrap_or_else(|| "lb".to_owned()),
                duration_seconds: number(set, &["duration"]).unwrap_or_default(),
            });
        } else if set_type.eq_ignore_ascii_case("rest") {
            let rest = number(set, &["duration"]).unwrap_or_default();
            if rest > 0.0 {
                exercise.rest_times_seconds.push(rest);
                all_rest.push(rest);
            }
        }
    }
    exercise
}

/// Break an activity detail payload into exercises and totals
///
/// # Errors
///
/// Returns [`FetchError::NotStrengthActivity`] when the activity type is not a
/// strength type
pub fn decompose_strength_workout(details: &Value) -> Result<StrengthWorkout, FetchError> {
    let activity = Activity::from_json(details);
    if !activity.is_strength() {
        return Err(FetchError::NotStrengthActivity(activity.type_key));
    }

    let groups = details
        .get("exerciseSets")
        .and_then(Value::as_array)
        .filter(|groups| !groups.is_empty())
        .or_else(|| details.get("sets").and_then(Value::as_array));

    let mut all_rest = Vec::new();
    let exercises: Vec<Exercise> = groups
        .into_iter()
        .flatten()
        .map(|group| parse_exercise(group, &mut all_rest))
        .filter(|exercise| !exercise.sets.is_empty())
        .collect();

    let average_rest = if all_rest.is_empty() {
        0.0
    } else {
        all_rest.iter().sum::<f64>() / all_rest.len() as f64
    };
    let metrics = WorkoutMetrics {
        total_exercises: exercises.len(),
        total_sets: exercises.iter().map(|e| e.sets.len()).sum(),
        total_reps: exercises.iter().map(|e| e.total_reps).sum(),
        total_volume: round1(exercises.iter().map(|e| e.total_volume).sum()),
        average_rest_time: round1(average_rest),
    };

    let name = if activity.name == "Unknown" {
        "Strength Training".to_owned()
    } else {
        activity.name.clone()
    };
    Ok(StrengthWorkout {
        activity_id: activity.id,
        activity_name: name,
        date: activity.date().to_owned(),
        duration_seconds: activity.duration_seconds,
        calories: activity.calories,
        exercises,
        metrics,
    })
}

/// `1234.5` → `1,234.5`
fn with_thousands(value: f64) -> String {
    let fixed = format!("{value:.1}");
    let (whole, frac) = fixed.split_once('.').unwrap_or((fixed.as_str(), "0"));
    let (sign, digits) = whole
        .strip_prefix('-')
        .map_or(("", whole), |rest| ("-", rest));

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("{sign}{grouped}.{frac}")
}

/// Render a decomposed workout for chat context
#[must_use]
pub fn format_strength_workout(workout: &StrengthWorkout) -> String {
    let mut out = String::new();
    let calories = workout
        .calories
        .map_or_else(|| "0".to_owned(), display_number);
    let _ = writeln!(out, "**{}**", workout.activity_name);
    let _ = writeln!(out, "Date: {}", workout.date);
    let _ = writeln!(
        out,
        "Duration: {} minutes",
        (workout.duration_seconds / 60.0).floor() as i64
    );
    let _ = writeln!(out, "Calories: {calories}");
    out.push('\n');

    if !workout.exercises.is_empty() {
        out.push_str("**Exercises Performed:**\n\n");
        for (i, exercise) in workout.exercises.iter().enumerate() {
            let _ = writeln!(out, "{}. **{}**", i + 1, exercise.name);
            for set in &exercise.sets {
                let load = if set.weight > 0.0 {
                    format!(" @ {} {}", display_number(set.weight), set.weight_unit)
                } else {
                    String::new()
                };
                let _ = writeln!(out, "   Set {}: {} reps{load}", set.set_number, set.reps);
            }
            if let Some(rest) = exercise.average_rest() {
                let _ = writeln!(out, "   Rest: {rest:.0}s average");
            }
            if exercise.total_volume > 0.0 {
                let _ = writeln!(
                    out,
                    "   Total: {} reps, {:.1} lbs volume",
                    exercise.total_reps, exercise.total_volume
                );
            } else {
                let _ = writeln!(out, "   Total: {} reps", exercise.total_reps);
            }
            out.push('\n');
        }
    }

    let metrics = &workout.metrics;
    out.push_str("**Workout Summary:**\n");
    let _ = writeln!(out, "- Total Exercises: {}", metrics.total_exercises);
    let _ = writeln!(out, "- Total Sets: {}", metrics.total_sets);
    let _ = write!(out, "- Total Reps: {}", metrics.total_reps);
    if metrics.total_volume > 0.0 {
        let _ = write!(out, "\n- Total Volume: {} lbs", with_thousands(metrics.total_volume));
    }
    if metrics.average_rest_time > 0.0 {
        let _ = write!(out, "\n- Average Rest: {:.0}s", metrics.average_rest_time);
    }
    out
}
