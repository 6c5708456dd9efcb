//! Workout statistics record and the pure engine that evolves it.
//!
//! The record is stored next to the settings under its own keys. Only
//! functions in [`engine`] produce new values; everything else reads.

mod engine;

pub use engine::{
    completions_on, history_within_days, record_completion, record_reminder_shown, reset,
    summarize, StatsSummary, HISTORY_RETENTION_DAYS,
};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Storage keys that make up the stats record.
pub const STATS_KEYS: [&str; 6] = [
    "streak",
    "bestStreak",
    "completedWorkouts",
    "totalReminders",
    "lastWorkoutDate",
    "workoutHistory",
];

/// Lifetime workout counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    /// Consecutive calendar days with at least one completion.
    pub streak: u32,
    /// Highest streak ever reached.
    pub best_streak: u32,
    /// Every "Done" acknowledgement.
    pub completed_workouts: u64,
    /// Every reminder presented, answered or not.
    pub total_reminders: u64,
    /// Empty until the first completion.
    #[serde(with = "calendar_date::optional")]
    pub last_workout_date: Option<NaiveDate>,
    /// Completions of the last 30 days, oldest first.
    pub workout_history: Vec<HistoryEntry>,
}

/// One completed workout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    #[serde(with = "calendar_date")]
    pub date: NaiveDate,
    pub timestamp: DateTime<Utc>,
}

/// Parse a calendar date in ISO form or the `Sat Oct 17 2026` form older
/// versions wrote.
pub fn parse_calendar_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%a %b %d %Y"))
        .ok()
}

mod calendar_date {
    use chrono::NaiveDate;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&date.format("%Y-%m-%d").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_calendar_date(&raw)
            .ok_or_else(|| de::Error::custom(format!("invalid calendar date: {raw}")))
    }

    /// `None` is stored as the empty string.
    pub mod optional {
        use chrono::NaiveDate;
        use serde::{de, Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(
            date: &Option<NaiveDate>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match date {
                Some(date) => super::serialize(date, serializer),
                None => serializer.serialize_str(""),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<NaiveDate>, D::Error> {
            let raw = Option::<String>::deserialize(deserializer)?.unwrap_or_default();
            if raw.trim().is_empty() {
                return Ok(None);
            }
            crate::stats::parse_calendar_date(&raw)
                .map(Some)
                .ok_or_else(|| de::Error::custom(format!("invalid calendar date: {raw}")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_date_roundtrips_as_empty_string() {
        let stats = Stats::default();
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["lastWorkoutDate"], json!(""));
        let back: Stats = serde_json::from_value(json).unwrap();
        assert_eq!(back.last_workout_date, None);
    }

    #[test]
    fn reads_legacy_date_strings() {
        let stats: Stats = serde_json::from_value(json!({
            "streak": 3,
            "bestStreak": 3,
            "completedWorkouts": 7,
            "totalReminders": 12,
            "lastWorkoutDate": "Sat Oct 17 2026",
            "workoutHistory": [
                { "date": "Sat Oct 17 2026", "timestamp": "2026-10-17T08:15:00.000Z" }
            ]
        }))
        .unwrap();
        let day = NaiveDate::from_ymd_opt(2026, 10, 17).unwrap();
        assert_eq!(stats.last_workout_date, Some(day));
        assert_eq!(stats.workout_history[0].date, day);

        // Written back in ISO form.
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["lastWorkoutDate"], json!("2026-10-17"));
    }

    #[test]
    fn rejects_garbage_dates() {
        let result = serde_json::from_value::<Stats>(json!({
            "streak": 0,
            "bestStreak": 0,
            "completedWorkouts": 0,
            "totalReminders": 0,
            "lastWorkoutDate": "yesterday-ish",
            "workoutHistory": []
        }));
        assert!(result.is_err());
    }

    #[test]
    fn stats_use_storage_key_names() {
        let json = serde_json::to_value(Stats::default()).unwrap();
        let obj = json.as_object().unwrap();
        for key in STATS_KEYS {
            assert!(obj.contains_key(key), "missing {key}");
        }
        assert_eq!(obj.len(), STATS_KEYS.len());
    }
}
