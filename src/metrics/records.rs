// ABOUTME: Typed daily health records normalized from Garmin Connect JSON payloads
// ABOUTME: Field maps, one-element list unwrapping and the all-absent-means-empty rule
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Normalized metric records
//!
//! Each record parses from the raw payload with `from_json`, which returns
//! `None` when none of the record's key fields carry data. Absent fields stay
//! `None`; a reported zero stays `Some(0)`.

use serde::Serialize;
use serde_json::Value;

/// Unwrap a payload that arrives as a list holding one object
#[must_use]
pub fn unwrap_single(value: &Value) -> &Value {
    match value {
        Value::Array(items) => items.first().unwrap_or(value),
        other => other,
    }
}

/// First present numeric value among `keys`
pub(crate) fn number(value: &Value, keys: &[&str]) -> Option<f64> {
    keys.iter().find_map(|key| match value.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    })
}

/// First present numeric value among `keys`, rounded to an integer
pub(crate) fn integer(value: &Value, keys: &[&str]) -> Option<i64> {
    number(value, keys).map(|n| n.round() as i64)
}

/// First present non-empty string among `keys`
pub(crate) fn text(value: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| {
        value
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_owned)
    })
}

/// Render a number the way Garmin reports it: whole values without decimals
#[must_use]
pub fn display_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

fn has_data_i(fields: &[Option<i64>]) -> bool {
    fields.iter().any(|f| f.is_some_and(|v| v != 0))
}

fn has_data_f(fields: &[Option<f64>]) -> bool {
    fields.iter().any(|f| f.is_some_and(|v| v != 0.0))
}

/// Steps and calories from the daily summary
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailySummary {
    /// Steps taken
    pub total_steps: Option<i64>,
    /// Total kilocalories burned
    pub total_kilocalories: Option<f64>,
    /// Active kilocalories burned
    pub active_kilocalories: Option<f64>,
    /// Distance covered in meters
    pub total_distance_meters: Option<f64>,
}

impl DailySummary {
    /// Parse from the user summary payload
    #[must_use]
    pub fn from_json(value: &Value) -> Option<Self> {
        let v = unwrap_single(value);
        let record = Self {
            total_steps: integer(v, &["totalSteps"]),
            total_kilocalories: number(v, &["totalKilocalories"]),
            active_kilocalories: number(v, &["activeKilocalories"]),
            total_distance_meters: number(v, &["totalDistanceMeters"]),
        };
        (has_data_i(&[record.total_steps])
            || has_data_f(&[
                record.total_kilocalories,
                record.active_kilocalories,
                record.total_distance_meters,
            ]))
        .then_some(record)
    }
}

/// Body Battery energy levels
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BodyBattery {
    /// Most recent value
    pub current: Option<i64>,
    /// Highest value today
    pub highest: Option<i64>,
    /// Lowest value today
    pub lowest: Option<i64>,
    /// Energy gained
    pub charged: Option<i64>,
    /// Energy spent
    pub drained: Option<i64>,
}

impl BodyBattery {
    /// Parse from the user summary payload
    #[must_use]
    pub fn from_json(value: &Value) -> Option<Self> {
        let v = unwrap_single(value);
        let record = Self {
            current: integer(v, &["bodyBatteryMostRecentValue"]),
            highest: integer(v, &["bodyBatteryHighestValue"]),
            lowest: integer(v, &["bodyBatteryLowestValue"]),
            charged: integer(v, &["bodyBatteryChargedValue"]),
            drained: integer(v, &["bodyBatteryDrainedValue"]),
        };
        has_data_i(&[
            record.current,
            record.highest,
            record.lowest,
            record.charged,
            record.drained,
        ])
        .then_some(record)
    }
}

/// Stress levels and time spent per stress band
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StressRecord {
    /// Average stress (0-100)
    pub average: Option<i64>,
    /// Maximum stress
    pub max: Option<i64>,
    /// Stress while resting
    pub rest: Option<i64>,
    /// Stress during activity
    pub activity: Option<i64>,
    /// Seconds at low stress
    pub low_duration: Option<i64>,
    /// Seconds at medium stress
    pub medium_duration: Option<i64>,
    /// Seconds at high stress
    pub high_duration: Option<i64>,
}

impl StressRecord {
    /// Parse from the daily stress payload
    #[must_use]
    pub fn from_json(value: &Value) -> Option<Self> {
        let v = unwrap_single(value);
        let record = Self {
            average: integer(v, &["averageStressLevel", "avgStressLevel"]),
            max: integer(v, &["maxStressLevel"]),
            rest: integer(v, &["restStressLevel", "restStressDuration"]),
            activity: integer(v, &["activityStressLevel"]),
            low_duration: integer(v, &["lowStressDuration"]),
            medium_duration: integer(v, &["mediumStressDuration"]),
            high_duration: integer(v, &["highStressDuration"]),
        };
        has_data_i(&[
            record.average,
            record.max,
            record.low_duration,
            record.medium_duration,
            record.high_duration,
        ])
        .then_some(record)
    }
}

/// Breathing rates in breaths per minute
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Respiration {
    /// Average while awake
    pub waking_avg: Option<f64>,
    /// Average while asleep
    pub sleeping_avg: Option<f64>,
    /// Highest reading
    pub highest: Option<f64>,
    /// Lowest reading
    pub lowest: Option<f64>,
}

impl Respiration {
    /// Parse from the respiration payload
    #[must_use]
    pub fn from_json(value: &Value) -> Option<Self> {
        let v = unwrap_single(value);
        let record = Self {
            waking_avg: number(v, &["avgWakingRespirationValue"]),
            sleeping_avg: number(v, &["avgSleepRespirationValue"]),
            highest: number(v, &["highestRespirationValue"]),
            lowest: number(v, &["lowestRespirationValue"]),
        };
        has_data_f(&[
            record.waking_avg,
            record.sleeping_avg,
            record.highest,
            record.lowest,
        ])
        .then_some(record)
    }
}

/// Water intake
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Hydration {
    /// Intake in milliliters
    pub intake_ml: Option<f64>,
    /// Daily goal in milliliters
    pub goal_ml: Option<f64>,
}

impl Hydration {
    /// Parse from the hydration payload
    #[must_use]
    pub fn from_json(value: &Value) -> Option<Self> {
        let v = unwrap_single(value);
        let record = Self {
            intake_ml: number(v, &["valueInML"]),
            goal_ml: number(v, &["goalInML"]),
        };
        has_data_f(&[record.intake_ml, record.goal_ml]).then_some(record)
    }
}

/// Floors climbed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Floors {
    /// Floors ascended
    pub ascended: Option<i64>,
    /// Floors descended
    pub descended: Option<i64>,
    /// Daily goal
    pub goal: Option<i64>,
}

impl Floors {
    /// Parse from the user summary payload
    #[must_use]
    pub fn from_json(value: &Value) -> Option<Self> {
        let v = unwrap_single(value);
        let record = Self {
            ascended: integer(v, &["floorsAscended"]),
            descended: integer(v, &["floorsDescended"]),
            goal: integer(v, &["floorsAscendedGoal", "userFloorsAscendedGoal"]),
        };
        has_data_i(&[record.ascended, record.descended]).then_some(record)
    }
}

/// Default weekly intensity-minute goal
pub const DEFAULT_INTENSITY_GOAL: i64 = 150;

/// Moderate and vigorous activity minutes
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IntensityMinutes {
    /// Moderate minutes today
    pub moderate: Option<i64>,
    /// Vigorous minutes today
    pub vigorous: Option<i64>,
    /// Moderate minutes this week
    pub weekly_moderate: Option<i64>,
    /// Vigorous minutes this week
    pub weekly_vigorous: Option<i64>,
    /// Weekly goal
    pub weekly_goal: i64,
}

impl IntensityMinutes {
    /// Parse from the user summary payload
    #[must_use]
    pub fn from_json(value: &Value) -> Option<Self> {
        let v = unwrap_single(value);
        let record = Self {
            moderate: integer(v, &["moderateIntensityMinutes"]),
            vigorous: integer(v, &["vigorousIntensityMinutes"]),
            weekly_moderate: integer(v, &["weeklyModerateIntensityMinutes"]),
            weekly_vigorous: integer(v, &["weeklyVigorousIntensityMinutes"]),
            weekly_goal: integer(v, &["intensityMinutesGoal"]).unwrap_or(DEFAULT_INTENSITY_GOAL),
        };
        has_data_i(&[
            record.moderate,
            record.vigorous,
            record.weekly_moderate,
            record.weekly_vigorous,
        ])
        .then_some(record)
    }
}

/// Energy balance for the day
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Calories {
    /// Total kilocalories burned
    pub total_burned: Option<f64>,
    /// Active kilocalories burned
    pub active_burned: Option<f64>,
    /// Basal metabolic rate
    pub bmr: Option<f64>,
    /// Kilocalories consumed
    pub consumed: Option<f64>,
    /// Net calorie goal
    pub net: Option<f64>,
}

impl Calories {
    /// Parse from the user summary payload; requires a burned total
    #[must_use]
    pub fn from_json(value: &Value) -> Option<Self> {
        let v = unwrap_single(value);
        let record = Self {
            total_burned: number(v, &["totalKilocalories"]),
            active_burned: number(v, &["activeKilocalories"]),
            bmr: number(v, &["bmrKilocalories"]),
            consumed: number(v, &["consumedCalories"]),
            net: number(v, &["netCalorieGoal"]),
        };
        has_data_f(&[record.total_burned]).then_some(record)
    }
}

/// Nutrition totals for the day
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Nutrition {
    /// Kilocalories consumed
    pub calories_consumed: Option<f64>,
    /// Calorie goal
    pub calorie_goal: Option<f64>,
    /// Protein grams
    pub protein_g: Option<f64>,
    /// Carbohydrate grams
    pub carbs_g: Option<f64>,
    /// Fat grams
    pub fat_g: Option<f64>,
    /// Fiber grams
    pub fiber_g: Option<f64>,
    /// Sugar grams
    pub sugar_g: Option<f64>,
    /// Sodium milligrams
    pub sodium_mg: Option<f64>,
    /// Water milliliters
    pub water_ml: Option<f64>,
}

impl Nutrition {
    /// Parse from the dedicated nutrition endpoint
    #[must_use]
    pub fn from_nutrition_json(value: &Value) -> Option<Self> {
        let v = unwrap_single(value);
        let record = Self {
            calories_consumed: number(v, &["totalCalories", "consumedCalories"]),
            calorie_goal: None,
            protein_g: number(v, &["totalProtein"]),
            carbs_g: number(v, &["totalCarbs"]),
            fat_g: number(v, &["totalFat"]),
            fiber_g: number(v, &["totalFiber"]),
            sugar_g: number(v, &["totalSugar"]),
            sodium_mg: number(v, &["totalSodium"]),
            water_ml: number(v, &["totalWater"]),
        };
        record.has_data().then_some(record)
    }

    /// Overlay consumed calories and goal from a summary or stats payload
    pub fn merge_summary(&mut self, value: &Value) {
        let v = unwrap_single(value);
        if let Some(consumed) = number(v, &["consumedCalories"]) {
            self.calories_consumed = Some(consumed);
        }
        if let Some(goal) = number(v, &["netCalorieGoal"]) {
            self.calorie_goal = Some(goal);
        }
    }

    /// Whether any field carries a non-zero value
    #[must_use]
    pub fn has_data(&self) -> bool {
        has_data_f(&[
            self.calories_consumed,
            self.calorie_goal,
            self.protein_g,
            self.carbs_g,
            self.fat_g,
            self.fiber_g,
            self.sugar_g,
            self.sodium_mg,
            self.water_ml,
        ])
    }
}

/// One logged food item
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FoodLogEntry {
    /// Food or meal name
    pub name: String,
    /// Kilocalories
    pub calories: Option<f64>,
}

impl FoodLogEntry {
    /// Parse a food log list; non-list payloads hold no entries
    #[must_use]
    pub fn list_from_json(value: &Value) -> Vec<Self> {
        value
            .as_array()
            .map(|items| {
                items
                    .iter()
                    .map(|item| Self {
                        name: text(item, &["name", "foodName"])
                            .unwrap_or_else(|| "Unknown".to_owned()),
                        calories: number(item, &["calories"]),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Blood oxygen saturation percentages
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Spo2 {
    /// Latest reading
    pub latest: Option<f64>,
    /// Lowest reading
    pub lowest: Option<f64>,
    /// Average
    pub average: Option<f64>,
}

impl Spo2 {
    /// Parse from the `SpO2` payload
    #[must_use]
    pub fn from_json(value: &Value) -> Option<Self> {
        let v = unwrap_single(value);
        let record = Self {
            latest: number(v, &["latestSpO2Value"]),
            lowest: number(v, &["lowestSpO2Value"]),
            average: number(v, &["averageSpO2Value"]),
        };
        has_data_f(&[record.latest, record.lowest, record.average]).then_some(record)
    }
}

/// Heart rate variability in milliseconds
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Hrv {
    /// Last night's average
    pub last_night_avg: Option<f64>,
    /// Seven-day average
    pub weekly_avg: Option<f64>,
}

impl Hrv {
    /// Parse from the HRV payload, top level or under `hrvSummary`
    #[must_use]
    pub fn from_json(value: &Value) -> Option<Self> {
        let v = unwrap_single(value);
        let summary = v.get("hrvSummary").unwrap_or(&Value::Null);
        let record = Self {
            last_night_avg: number(v, &["lastNightAvg"])
                .or_else(|| number(summary, &["lastNightAvg"])),
            weekly_avg: number(v, &["weeklyAvg"]).or_else(|| number(summary, &["weeklyAvg"])),
        };
        has_data_f(&[record.last_night_avg, record.weekly_avg]).then_some(record)
    }
}

/// VO2 max and fitness age
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Performance {
    /// VO2 max
    pub vo2_max: Option<f64>,
    /// Fitness age in years
    pub fitness_age: Option<f64>,
}

impl Performance {
    /// Parse from the max metrics payload
    #[must_use]
    pub fn from_json(value: &Value) -> Option<Self> {
        let v = unwrap_single(value);
        let generic = v.get("generic").unwrap_or(&Value::Null);
        let record = Self {
            vo2_max: number(v, &["vo2Max"]).or_else(|| number(generic, &["vo2MaxPreciseValue"])),
            fitness_age: number(v, &["fitnessAge"]).or_else(|| number(generic, &["fitnessAge"])),
        };
        has_data_f(&[record.vo2_max, record.fitness_age]).then_some(record)
    }
}

/// Training load and focus
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrainingStatus {
    /// Acute training load
    pub training_load: Option<f64>,
    /// Load focus label
    pub load_focus: Option<String>,
}

impl TrainingStatus {
    /// Parse from the training status payload
    #[must_use]
    pub fn from_json(value: &Value) -> Option<Self> {
        let v = unwrap_single(value);
        let record = Self {
            training_load: number(v, &["trainingLoad"]),
            load_focus: text(v, &["loadFocus"]),
        };
        (has_data_f(&[record.training_load]) || record.load_focus.is_some()).then_some(record)
    }
}

/// Training readiness score
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrainingReadiness {
    /// Score 0-100
    pub score: Option<f64>,
    /// Readiness level label
    pub level: Option<String>,
}

impl TrainingReadiness {
    /// Parse from the readiness payload
    #[must_use]
    pub fn from_json(value: &Value) -> Option<Self> {
        let v = unwrap_single(value);
        let record = Self {
            score: number(v, &["score"]),
            level: text(v, &["level"]),
        };
        (has_data_f(&[record.score]) || record.level.is_some()).then_some(record)
    }
}

/// Daily heart rate figures in beats per minute
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeartRate {
    /// Resting heart rate
    pub resting: Option<i64>,
    /// Maximum heart rate
    pub max: Option<i64>,
    /// Minimum heart rate
    pub min: Option<i64>,
}

impl HeartRate {
    /// Parse from the daily heart rate payload
    #[must_use]
    pub fn from_json(value: &Value) -> Option<Self> {
        let v = unwrap_single(value);
        let record = Self {
            resting: integer(v, &["restingHeartRate"]),
            max: integer(v, &["maxHeartRate"]),
            min: integer(v, &["minHeartRate"]),
        };
        has_data_i(&[record.resting, record.max, record.min]).then_some(record)
    }
}

/// Sleep stages in seconds
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Sleep {
    /// Total sleep
    pub total_seconds: Option<i64>,
    /// Deep sleep
    pub deep_seconds: Option<i64>,
    /// Light sleep
    pub light_seconds: Option<i64>,
    /// REM sleep
    pub rem_seconds: Option<i64>,
    /// Awake time
    pub awake_seconds: Option<i64>,
}

impl Sleep {
    /// Parse from the sleep payload's `dailySleepDTO`
    #[must_use]
    pub fn from_json(value: &Value) -> Option<Self> {
        let dto = unwrap_single(value).get("dailySleepDTO")?;
        let record = Self {
            total_seconds: integer(dto, &["sleepTimeSeconds"]),
            deep_seconds: integer(dto, &["deepSleepSeconds"]),
            light_seconds: integer(dto, &["lightSleepSeconds"]),
            rem_seconds: integer(dto, &["remSleepSeconds"]),
            awake_seconds: integer(dto, &["awakeSleepSeconds"]),
        };
        has_data_i(&[
            record.total_seconds,
            record.deep_seconds,
            record.light_seconds,
            record.rem_seconds,
        ])
        .then_some(record)
    }
}

/// One recorded activity
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Activity {
    /// Garmin activity id
    pub id: i64,
    /// Activity name
    pub name: String,
    /// Activity type key, e.g. `running`
    pub type_key: String,
    /// Local start time as reported, `YYYY-MM-DD HH:MM:SS`
    pub start_time_local: String,
    /// Duration in seconds
    pub duration_seconds: f64,
    /// Distance in meters
    pub distance_meters: f64,
    /// Kilocalories
    pub calories: Option<f64>,
}

impl Activity {
    /// Parse one activity from a list or detail payload
    ///
    /// Detail payloads nest the type under `activityTypeDTO` and the figures
    /// under `summaryDTO`; both shapes are accepted.
    #[must_use]
    pub fn from_json(value: &Value) -> Self {
        let type_key = ["activityType", "activityTypeDTO"]
            .iter()
            .find_map(|key| value.get(key).and_then(|t| text(t, &["typeKey"])))
            .unwrap_or_else(|| "Unknown".to_owned());
        let summary = value.get("summaryDTO").unwrap_or(&Value::Null);
        let num = |key: &str| number(value, &[key]).or_else(|| number(summary, &[key]));
        Self {
            id: integer(value, &["activityId"]).unwrap_or_default(),
            name: text(value, &["activityName"]).unwrap_or_else(|| "Unknown".to_owned()),
            type_key,
            start_time_local: text(value, &["startTimeLocal"])
                .or_else(|| text(summary, &["startTimeLocal"]))
                .unwrap_or_default(),
            duration_seconds: num("duration").unwrap_or_default(),
            distance_meters: num("distance").unwrap_or_default(),
            calories: num("calories"),
        }
    }

    /// Parse a list of activities
    #[must_use]
    pub fn list_from_json(value: &Value) -> Vec<Self> {
        value
            .as_array()
            .map(|items| items.iter().map(Self::from_json).collect())
            .unwrap_or_default()
    }

    /// Calendar date part of the start time
    #[must_use]
    pub fn date(&self) -> &str {
        self.start_time_local
            .get(..10)
            .unwrap_or(&self.start_time_local)
    }

    /// Whether the type key marks a strength workout
    #[must_use]
    pub fn is_strength(&self) -> bool {
        self.type_key.to_lowercase().contains("strength")
    }

    /// Duration in whole minutes
    #[must_use]
    pub fn duration_minutes(&self) -> i64 {
        (self.duration_seconds / 60.0).floor() as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_display_number() {
        assert_eq!(display_number(300.0), "300");
        assert_eq!(display_number(52.5), "52.5");
    }

    #[test]
    fn test_single_element_list_is_unwrapped() {
        let payload = json!([{ "valueInML": 1500, "goalInML": 2500 }]);
        let hydration = Hydration::from_json(&payload).unwrap();
        assert_eq!(hydration.intake_ml, Some(1500.0));
        assert_eq!(hydration.goal_ml, Some(2500.0));
    }

    #[test]
    fn test_all_zero_is_empty_but_zero_field_is_kept() {
        assert!(Floors::from_json(&json!({ "floorsAscended": 0, "floorsDescended": 0 })).is_none());
        let floors = Floors::from_json(&json!({ "floorsAscended": 4, "floorsDescended": 0 })).unwrap();
        assert_eq!(floors.descended, Some(0));
        assert_eq!(floors.goal, None);
    }

    #[test]
    fn test_stress_alternate_keys() {
        let stress = StressRecord::from_json(&json!({
            "avgStressLevel": 31,
            "maxStressLevel": 88,
            "lowStressDuration": 3600
        }))
        .unwrap();
        assert_eq!(stress.average, Some(31));
        assert_eq!(stress.low_duration, Some(3600));
        assert_eq!(stress.rest, None);
    }

    #[test]
    fn test_intensity_goal_default() {
        let intensity = IntensityMinutes::from_json(&json!({ "moderateIntensityMinutes": 20 })).unwrap();
        assert_eq!(intensity.weekly_goal, DEFAULT_INTENSITY_GOAL);
    }

    #[test]
    fn test_hrv_nested_summary() {
        let hrv = Hrv::from_json(&json!({ "hrvSummary": { "lastNightAvg": 42, "weeklyAvg": 45 } })).unwrap();
        assert_eq!(hrv.last_night_avg, Some(42.0));
        assert_eq!(hrv.weekly_avg, Some(45.0));
    }

    #[test]
    fn test_performance_generic_fallback() {
        let perf = Performance::from_json(&json!([{ "generic": { "vo2MaxPreciseValue": 51.3 } }])).unwrap();
        assert_eq!(perf.vo2_max, Some(51.3));
    }

    #[test]
    fn test_activity_fields() {
        let activity = Activity::from_json(&json!({
            "activityId": 123,
            "activityName": "Morning Run",
            "activityType": { "typeKey": "running" },
            "startTimeLocal": "2024-01-15 07:00:00",
            "duration": 1800.0,
            "distance": 5000.0,
            "calories": 300
        }));
        assert_eq!(activity.date(), "2024-01-15");
        assert_eq!(activity.duration_minutes(), 30);
        assert!(!activity.is_strength());
    }
}
