//! Alarm backends.
//!
//! An alarm is a named, minute-granularity timer that fires once after a delay
//! and optionally keeps firing with a period. Scheduling a name that already
//! exists replaces it.
//!
//! Every successful schedule gets a fresh generation number, and each fire
//! carries the generation it came from. A fire that was already queued when
//! its alarm got replaced can then be told apart from the replacement.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, sleep, Instant};

use crate::error::{CoreError, Result};

/// When an alarm fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlarmSpec {
    pub delay_minutes: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period_minutes: Option<u32>,
}

impl AlarmSpec {
    pub fn once(delay_minutes: u32) -> Self {
        Self {
            delay_minutes,
            period_minutes: None,
        }
    }

    /// First fire after one period, then every period.
    pub fn repeating(period_minutes: u32) -> Self {
        Self {
            delay_minutes: period_minutes,
            period_minutes: Some(period_minutes),
        }
    }
}

/// One fire of a named alarm.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlarmFired {
    pub name: String,
    /// Generation returned by the `schedule` call that produced this fire.
    pub generation: u64,
}

/// Named alarm service.
#[async_trait]
pub trait AlarmBackend: Send + Sync {
    /// Create or replace the alarm called `name`. Returns the generation its
    /// fires will carry; generations are never reused by one backend.
    async fn schedule(&self, name: &str, spec: AlarmSpec) -> Result<u64>;

    /// Remove the alarm called `name`. Returns whether one existed;
    /// cancelling an unknown name is not an error.
    async fn cancel(&self, name: &str) -> Result<bool>;
}

/// Alarms backed by tokio tasks.
///
/// Each alarm is a spawned task that sleeps, then pushes an [`AlarmFired`]
/// onto the channel returned by [`TokioAlarms::new`]. Must be used from
/// within a tokio runtime.
pub struct TokioAlarms {
    tasks: Mutex<HashMap<String, JoinHandle<()>>>,
    fired: mpsc::UnboundedSender<AlarmFired>,
    last_generation: AtomicU64,
}

impl TokioAlarms {
    /// Backend plus the receiving end of its fire notifications.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<AlarmFired>) {
        let (fired, rx) = mpsc::unbounded_channel();
        (
            Self {
                tasks: Mutex::new(HashMap::new()),
                fired,
                last_generation: AtomicU64::new(0),
            },
            rx,
        )
    }

    /// Whether `name` is still going to fire.
    pub fn is_scheduled(&self, name: &str) -> bool {
        self.tasks
            .lock()
            .map(|tasks| tasks.get(name).is_some_and(|t| !t.is_finished()))
            .unwrap_or(false)
    }

    fn minutes(m: u32) -> Duration {
        Duration::from_secs(u64::from(m) * 60)
    }
}

#[async_trait]
impl AlarmBackend for TokioAlarms {
    async fn schedule(&self, name: &str, spec: AlarmSpec) -> Result<u64> {
        if self.fired.is_closed() {
            return Err(CoreError::SchedulingFailed {
                alarm: name.to_string(),
                message: "nobody is listening for alarms".into(),
            });
        }

        let mut tasks = self.tasks.lock().map_err(|_| CoreError::SchedulingFailed {
            alarm: name.to_string(),
            message: "alarm table poisoned".into(),
        })?;
        let generation = self.last_generation.fetch_add(1, Ordering::Relaxed) + 1;
        let tx = self.fired.clone();
        let fire = AlarmFired {
            name: name.to_string(),
            generation,
        };
        let delay = Self::minutes(spec.delay_minutes);
        let period = spec.period_minutes.map(Self::minutes);
        let handle = tokio::spawn(async move {
            sleep(delay).await;
            if tx.send(fire.clone()).is_err() {
                return;
            }
            if let Some(period) = period {
                let mut ticker = interval_at(Instant::now() + period, period);
                loop {
                    ticker.tick().await;
                    if tx.send(fire.clone()).is_err() {
                        break;
                    }
                }
            }
        });

        if let Some(previous) = tasks.insert(name.to_string(), handle) {
            previous.abort();
        }
        tracing::debug!(alarm = name, generation, ?spec, "alarm scheduled");
        Ok(generation)
    }

    async fn cancel(&self, name: &str) -> Result<bool> {
        let mut tasks = self.tasks.lock().map_err(|_| CoreError::SchedulingFailed {
            alarm: name.to_string(),
            message: "alarm table poisoned".into(),
        })?;
        match tasks.remove(name) {
            Some(handle) => {
                let live = !handle.is_finished();
                handle.abort();
                tracing::debug!(alarm = name, "alarm cancelled");
                Ok(live)
            }
            None => Ok(false),
        }
    }
}

impl Drop for TokioAlarms {
    fn drop(&mut self) {
        if let Ok(tasks) = self.tasks.get_mut() {
            for (_, handle) in tasks.drain() {
                handle.abort();
            }
        }
    }
}
