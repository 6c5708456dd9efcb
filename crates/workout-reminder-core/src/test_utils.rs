//! Recording fakes for the alarm and presentation backends.
//!
//! Both are cheap to clone; clones share the same call log, so a test keeps
//! one handle and gives the other to the controller.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::error::{CoreError, Result};
use crate::reminder::{Notification, Presenter};
use crate::scheduler::{AlarmBackend, AlarmFired, AlarmSpec};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlarmCall {
    Schedule(String, AlarmSpec),
    Cancel(String),
}

/// Alarm backend that never fires on its own and records every call.
#[derive(Clone, Default)]
pub struct RecordingAlarms {
    calls: Arc<Mutex<Vec<AlarmCall>>>,
    live: Arc<Mutex<HashMap<String, u64>>>,
    last_generation: Arc<AtomicU64>,
    failing: Arc<AtomicBool>,
}

impl RecordingAlarms {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<AlarmCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn clear_calls(&self) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.clear();
        }
    }

    /// Most recent schedule for `name`, if any.
    pub fn last_schedule(&self, name: &str) -> Option<AlarmSpec> {
        self.calls().into_iter().rev().find_map(|c| match c {
            AlarmCall::Schedule(n, spec) if n == name => Some(spec),
            _ => None,
        })
    }

    pub fn is_scheduled(&self, name: &str) -> bool {
        self.live.lock().map(|l| l.contains_key(name)).unwrap_or(false)
    }

    /// The fire `name` would deliver right now. Unscheduled names get
    /// generation 0, which no schedule call ever returns.
    pub fn fire(&self, name: &str) -> AlarmFired {
        let generation = self
            .live
            .lock()
            .ok()
            .and_then(|l| l.get(name).copied())
            .unwrap_or(0);
        AlarmFired {
            name: name.to_string(),
            generation,
        }
    }

    /// While failing, every call is recorded and then rejected.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn record(&self, call: AlarmCall) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }

    fn check(&self, name: &str) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            Err(CoreError::SchedulingFailed {
                alarm: name.to_string(),
                message: "alarm service unavailable".into(),
            })
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl AlarmBackend for RecordingAlarms {
    async fn schedule(&self, name: &str, spec: AlarmSpec) -> Result<u64> {
        self.record(AlarmCall::Schedule(name.to_string(), spec));
        self.check(name)?;
        let generation = self.last_generation.fetch_add(1, Ordering::SeqCst) + 1;
        if let Ok(mut live) = self.live.lock() {
            live.insert(name.to_string(), generation);
        }
        Ok(generation)
    }

    async fn cancel(&self, name: &str) -> Result<bool> {
        self.record(AlarmCall::Cancel(name.to_string()));
        self.check(name)?;
        Ok(self
            .live
            .lock()
            .map(|mut l| l.remove(name).is_some())
            .unwrap_or(false))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresenterCall {
    Present(String, Notification),
    Clear(String),
    Speak(String),
}

/// Presenter that records what would have been shown.
#[derive(Clone, Default)]
pub struct RecordingPresenter {
    calls: Arc<Mutex<Vec<PresenterCall>>>,
    failing: Arc<AtomicBool>,
    speech_failing: Arc<AtomicBool>,
}

impl RecordingPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<PresenterCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn clear_calls(&self) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.clear();
        }
    }

    /// Notifications presented so far, oldest first.
    pub fn presented(&self) -> Vec<Notification> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                PresenterCall::Present(_, n) => Some(n),
                _ => None,
            })
            .collect()
    }

    pub fn spoken(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                PresenterCall::Speak(text) => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn clear_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, PresenterCall::Clear(_)))
            .count()
    }

    /// Make `present` fail.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Make `speak` fail.
    pub fn set_speech_failing(&self, failing: bool) {
        self.speech_failing.store(failing, Ordering::SeqCst);
    }

    fn record(&self, call: PresenterCall) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }
}

#[async_trait]
impl Presenter for RecordingPresenter {
    async fn present(&self, id: &str, notification: &Notification) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(CoreError::PresentationFailed("notifications blocked".into()));
        }
        self.record(PresenterCall::Present(id.to_string(), notification.clone()));
        Ok(())
    }

    async fn clear(&self, id: &str) -> Result<()> {
        self.record(PresenterCall::Clear(id.to_string()));
        Ok(())
    }

    async fn speak(&self, text: &str) -> Result<()> {
        if self.speech_failing.load(Ordering::SeqCst) {
            return Err(CoreError::PresentationFailed("speech unavailable".into()));
        }
        self.record(PresenterCall::Speak(text.to_string()));
        Ok(())
    }
}
