//! User-facing reminder settings.
//!
//! One record per installation. Field names follow the storage keys the
//! extension has always written (`interval`, `soundEnabled`, ...), so exported
//! snapshots stay readable by older versions.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ValidationError;

/// Maximum length of a custom workout suggestion, in characters.
pub const MAX_WORKOUT_LEN: usize = 100;

/// Storage keys that make up the settings record.
pub const SETTINGS_KEYS: [&str; 4] = ["enabled", "interval", "soundEnabled", "customWorkouts"];

/// Minutes between reminders, always within `[MIN, MAX]`.
///
/// Construction through [`IntervalMinutes::new`] rejects out-of-range values;
/// deserialization clamps them, so a stale or imported record can never
/// schedule outside the range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(into = "u32")]
pub struct IntervalMinutes(u32);

impl IntervalMinutes {
    pub const MIN: u32 = 5;
    pub const MAX: u32 = 480;
    pub const DEFAULT: u32 = 60;

    /// Validate a user-supplied interval.
    pub fn new(minutes: u32) -> Result<Self, ValidationError> {
        if (Self::MIN..=Self::MAX).contains(&minutes) {
            Ok(Self(minutes))
        } else {
            Err(ValidationError::IntervalOutOfRange {
                value: minutes,
                min: Self::MIN,
                max: Self::MAX,
            })
        }
    }

    /// Force a value into range.
    pub fn clamped(minutes: u32) -> Self {
        Self(minutes.clamp(Self::MIN, Self::MAX))
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl Default for IntervalMinutes {
    fn default() -> Self {
        Self(Self::DEFAULT)
    }
}

impl From<IntervalMinutes> for u32 {
    fn from(value: IntervalMinutes) -> Self {
        value.0
    }
}

impl TryFrom<u32> for IntervalMinutes {
    type Error = ValidationError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for IntervalMinutes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} min", self.0)
    }
}

impl<'de> Deserialize<'de> for IntervalMinutes {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // Older writers stored plain JS numbers, occasionally with a fraction.
        let raw = f64::deserialize(deserializer)?;
        if !raw.is_finite() {
            return Err(serde::de::Error::custom("interval must be a finite number"));
        }
        let rounded = raw.round().clamp(f64::from(Self::MIN), f64::from(Self::MAX));
        Ok(Self(rounded as u32))
    }
}

/// Reminder settings record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub enabled: bool,
    #[serde(rename = "interval")]
    pub interval_minutes: IntervalMinutes,
    pub sound_enabled: bool,
    pub custom_workouts: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_minutes: IntervalMinutes::default(),
            sound_enabled: true,
            custom_workouts: Vec::new(),
        }
    }
}

impl Settings {
    /// Custom workouts with `text` appended.
    ///
    /// The text is trimmed first; duplicates are an exact, case-sensitive match.
    pub fn with_custom_workout(&self, text: &str) -> Result<Vec<String>, ValidationError> {
        let workout = normalize_workout(text)?;
        if self.custom_workouts.iter().any(|w| *w == workout) {
            return Err(ValidationError::DuplicateWorkout(workout));
        }
        let mut workouts = self.custom_workouts.clone();
        workouts.push(workout);
        Ok(workouts)
    }

    /// Run a whole list through the same rules as one-at-a-time adds.
    pub fn checked_custom_workouts(workouts: &[String]) -> Result<Vec<String>, ValidationError> {
        workouts.iter().try_fold(Vec::new(), |accepted, text| {
            Settings {
                custom_workouts: accepted,
                ..Settings::default()
            }
            .with_custom_workout(text)
        })
    }

    /// Custom workouts with the entry at `index` removed, plus the removed text.
    pub fn without_custom_workout(
        &self,
        index: usize,
    ) -> Result<(Vec<String>, String), ValidationError> {
        if index >= self.custom_workouts.len() {
            return Err(ValidationError::OutOfBounds {
                collection: "custom workouts".into(),
                index,
                len: self.custom_workouts.len(),
            });
        }
        let mut workouts = self.custom_workouts.clone();
        let removed = workouts.remove(index);
        Ok((workouts, removed))
    }
}

/// Trim and length-check a custom workout suggestion.
pub fn normalize_workout(text: &str) -> Result<String, ValidationError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyWorkout);
    }
    let len = trimmed.chars().count();
    if len > MAX_WORKOUT_LEN {
        return Err(ValidationError::WorkoutTooLong {
            len,
            max: MAX_WORKOUT_LEN,
        });
    }
    Ok(trimmed.to_string())
}

/// Partial settings update. Only `Some` fields are written.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(rename = "interval", skip_serializing_if = "Option::is_none")]
    pub interval_minutes: Option<IntervalMinutes>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sound_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_workouts: Option<Vec<String>>,
}

impl SettingsPatch {
    pub fn is_empty(&self) -> bool {
        self.enabled.is_none()
            && self.interval_minutes.is_none()
            && self.sound_enabled.is_none()
            && self.custom_workouts.is_none()
    }

    /// Apply onto an in-memory record.
    pub fn apply_to(&self, settings: &mut Settings) {
        if let Some(enabled) = self.enabled {
            settings.enabled = enabled;
        }
        if let Some(interval) = self.interval_minutes {
            settings.interval_minutes = interval;
        }
        if let Some(sound) = self.sound_enabled {
            settings.sound_enabled = sound;
        }
        if let Some(ref workouts) = self.custom_workouts {
            settings.custom_workouts = workouts.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_product_defaults() {
        let settings = Settings::default();
        assert!(settings.enabled);
        assert_eq!(settings.interval_minutes.get(), 60);
        assert!(settings.sound_enabled);
        assert!(settings.custom_workouts.is_empty());
    }

    #[test]
    fn interval_bounds_are_inclusive() {
        assert!(IntervalMinutes::new(5).is_ok());
        assert!(IntervalMinutes::new(480).is_ok());
        assert!(IntervalMinutes::new(4).is_err());
        assert!(IntervalMinutes::new(481).is_err());
    }

    #[test]
    fn interval_deserialization_clamps() {
        let low: IntervalMinutes = serde_json::from_str("1").unwrap();
        let high: IntervalMinutes = serde_json::from_str("10000").unwrap();
        let frac: IntervalMinutes = serde_json::from_str("29.6").unwrap();
        assert_eq!(low.get(), 5);
        assert_eq!(high.get(), 480);
        assert_eq!(frac.get(), 30);
        assert!(serde_json::from_str::<IntervalMinutes>("\"soon\"").is_err());
    }

    #[test]
    fn settings_use_storage_key_names() {
        let json = serde_json::to_value(Settings::default()).unwrap();
        let obj = json.as_object().unwrap();
        for key in SETTINGS_KEYS {
            assert!(obj.contains_key(key), "missing {key}");
        }
        assert_eq!(obj.len(), SETTINGS_KEYS.len());
    }

    #[test]
    fn add_workout_trims_and_rejects_duplicates() {
        let settings = Settings {
            custom_workouts: vec!["Plank for 30 seconds".into()],
            ..Settings::default()
        };
        let err = settings.with_custom_workout("  Plank for 30 seconds ").unwrap_err();
        assert_eq!(
            err,
            ValidationError::DuplicateWorkout("Plank for 30 seconds".into())
        );

        // Case-sensitive: a different casing is a different workout.
        let workouts = settings.with_custom_workout("plank for 30 seconds").unwrap();
        assert_eq!(workouts, vec!["Plank for 30 seconds", "plank for 30 seconds"]);
    }

    #[test]
    fn checked_list_trims_and_rejects_duplicates() {
        let list = vec![" Plank ".to_string(), "Lunges".to_string()];
        assert_eq!(
            Settings::checked_custom_workouts(&list).unwrap(),
            vec!["Plank", "Lunges"]
        );

        let dupes = vec!["Plank".to_string(), "  Plank".to_string()];
        assert_eq!(
            Settings::checked_custom_workouts(&dupes).unwrap_err(),
            ValidationError::DuplicateWorkout("Plank".into())
        );
        assert_eq!(
            Settings::checked_custom_workouts(&["  ".to_string()]).unwrap_err(),
            ValidationError::EmptyWorkout
        );
        assert!(Settings::checked_custom_workouts(&[]).unwrap().is_empty());
    }

    #[test]
    fn add_workout_rejects_blank_and_overlong() {
        let settings = Settings::default();
        assert_eq!(
            settings.with_custom_workout("   ").unwrap_err(),
            ValidationError::EmptyWorkout
        );
        let long = "x".repeat(MAX_WORKOUT_LEN + 1);
        assert!(matches!(
            settings.with_custom_workout(&long),
            Err(ValidationError::WorkoutTooLong { len: 101, max: 100 })
        ));
        assert!(settings.with_custom_workout(&"x".repeat(MAX_WORKOUT_LEN)).is_ok());
    }

    #[test]
    fn remove_workout_checks_bounds() {
        let settings = Settings {
            custom_workouts: vec!["A".into(), "B".into(), "C".into()],
            ..Settings::default()
        };
        let (remaining, removed) = settings.without_custom_workout(1).unwrap();
        assert_eq!(removed, "B");
        assert_eq!(remaining, vec!["A", "C"]);
        assert!(matches!(
            settings.without_custom_workout(3),
            Err(ValidationError::OutOfBounds { index: 3, len: 3, .. })
        ));
    }

    #[test]
    fn patch_serializes_only_present_fields() {
        let patch = SettingsPatch {
            interval_minutes: Some(IntervalMinutes::new(45).unwrap()),
            ..SettingsPatch::default()
        };
        let json = serde_json::to_value(&patch).unwrap();
        assert_eq!(json, serde_json::json!({ "interval": 45 }));
        assert!(SettingsPatch::default().is_empty());
    }
}
