//! Test doubles shared by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use trackwatch::fetcher::Fetcher;
use trackwatch::notifier::Notifier;
use trackwatch::{FetchError, NotifyError, Snapshot, StatusRecord};

pub fn rec(status: &str) -> StatusRecord {
    StatusRecord::new().with("status", status)
}

/// Per-identifier scripted responses; the last response repeats once the
/// script runs out
#[derive(Default)]
pub struct ScriptedFetcher {
    scripts: Mutex<HashMap<String, VecDeque<Result<Snapshot, String>>>>,
    last: Mutex<HashMap<String, Result<Snapshot, String>>>,
    calls: Mutex<HashMap<String, u32>>,
    delay: Option<Duration>,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every fetch takes `delay` before answering
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Default::default()
        }
    }

    pub fn script(self, id: &str, steps: Vec<Result<Snapshot, String>>) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert(id.to_string(), steps.into());
        self
    }

    pub fn calls(&self, id: &str) -> u32 {
        self.calls.lock().unwrap().get(id).copied().unwrap_or(0)
    }

    /// Highest number of fetches that were running at the same time
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Fetcher for ScriptedFetcher {
    async fn fetch(&self, identifier: &str) -> Result<Snapshot, FetchError> {
        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(running, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        *self
            .calls
            .lock()
            .unwrap()
            .entry(identifier.to_string())
            .or_insert(0) += 1;

        let next = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(identifier)
            .and_then(|steps| steps.pop_front());

        let step = match next {
            Some(step) => {
                self.last
                    .lock()
                    .unwrap()
                    .insert(identifier.to_string(), step.clone());
                step
            }
            None => self
                .last
                .lock()
                .unwrap()
                .get(identifier)
                .cloned()
                .unwrap_or_else(|| Err(format!("no script for {}", identifier))),
        };

        step.map_err(FetchError::Other)
    }
}

/// Remembers every alert in delivery order
#[derive(Default)]
pub struct RecordingNotifier {
    alerts: Mutex<Vec<(String, StatusRecord)>>,
}

impl RecordingNotifier {
    pub fn alerts(&self) -> Vec<(String, StatusRecord)> {
        self.alerts.lock().unwrap().clone()
    }

    pub fn alerts_for(&self, id: &str) -> Vec<StatusRecord> {
        self.alerts()
            .into_iter()
            .filter(|(alert_id, _)| alert_id == id)
            .map(|(_, record)| record)
            .collect()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, identifier: &str, record: &StatusRecord) -> Result<(), NotifyError> {
        self.alerts
            .lock()
            .unwrap()
            .push((identifier.to_string(), record.clone()));
        Ok(())
    }
}
