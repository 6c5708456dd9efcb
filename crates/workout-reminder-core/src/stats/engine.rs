//! Streak and completion bookkeeping.
//!
//! Pure functions: prior stats plus "today" and "now" in, new stats out.
//! Day boundaries are decided by comparing calendar dates, never by rounding
//! elapsed milliseconds, so DST shifts and late-evening/early-morning pairs
//! classify correctly.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::{HistoryEntry, Stats};

/// Completions older than this are dropped whenever a completion is added.
pub const HISTORY_RETENTION_DAYS: u32 = 30;

/// Record a "Done" acknowledgement.
///
/// Same-day completions count toward `completed_workouts` but leave the
/// streak alone. A completion the day after the last one extends the streak;
/// anything else restarts it at 1.
pub fn record_completion(stats: &Stats, today: NaiveDate, now: DateTime<Utc>) -> Stats {
    let streak = match stats.last_workout_date {
        Some(last) if last == today => stats.streak,
        Some(last) if today.pred_opt() == Some(last) => stats.streak.saturating_add(1),
        _ => 1,
    };

    let mut workout_history = stats.workout_history.clone();
    workout_history.push(HistoryEntry {
        date: today,
        timestamp: now,
    });
    let cutoff = now - Duration::days(i64::from(HISTORY_RETENTION_DAYS));
    workout_history.retain(|entry| entry.timestamp > cutoff);

    Stats {
        streak,
        best_streak: stats.best_streak.max(streak),
        completed_workouts: stats.completed_workouts.saturating_add(1),
        total_reminders: stats.total_reminders,
        last_workout_date: Some(today),
        workout_history,
    }
}

/// Count one presented reminder.
pub fn record_reminder_shown(stats: &Stats) -> Stats {
    Stats {
        total_reminders: stats.total_reminders.saturating_add(1),
        ..stats.clone()
    }
}

/// Zeroed stats.
pub fn reset() -> Stats {
    Stats::default()
}

/// History entries newer than `days * 24h` before `now`, in stored order.
pub fn history_within_days(stats: &Stats, days: u32, now: DateTime<Utc>) -> Vec<HistoryEntry> {
    let cutoff = now - Duration::days(i64::from(days));
    stats
        .workout_history
        .iter()
        .filter(|entry| entry.timestamp > cutoff)
        .cloned()
        .collect()
}

/// Number of completions recorded on `day`.
pub fn completions_on(stats: &Stats, day: NaiveDate) -> usize {
    stats
        .workout_history
        .iter()
        .filter(|entry| entry.date == day)
        .count()
}

/// Read-only view of the stats for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsSummary {
    pub streak: u32,
    pub best_streak: u32,
    pub completed_workouts: u64,
    pub total_reminders: u64,
    pub last_workout_date: Option<NaiveDate>,
    pub completed_today: usize,
    /// Percentage of reminders answered with "Done" (0.0 - 100.0).
    pub completion_rate: f64,
}

pub fn summarize(stats: &Stats, today: NaiveDate) -> StatsSummary {
    let completion_rate = if stats.total_reminders == 0 {
        0.0
    } else {
        (stats.completed_workouts as f64 / stats.total_reminders as f64 * 100.0).min(100.0)
    };
    StatsSummary {
        streak: stats.streak,
        best_streak: stats.best_streak,
        completed_workouts: stats.completed_workouts,
        total_reminders: stats.total_reminders,
        last_workout_date: stats.last_workout_date,
        completed_today: completions_on(stats, today),
        completion_rate,
    }
}
