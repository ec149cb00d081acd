//! TrackingWorker - the poll loop for one identifier
//!
//! ```text
//! Idle -> Waiting -> Fetching -> Comparing -> Notifying -> Persisting -> Waiting -> ...
//!                                                                     \-> Stopped
//! ```
//!
//! Every error inside a cycle is logged and contained: the worker only stops
//! when the cancellation signal is set.

use super::cancel::CancellationSignal;
use super::detector::diff;
use crate::fetcher::Fetcher;
use crate::models::{Identifier, Snapshot};
use crate::notifier::Notifier;
use crate::state::SnapshotStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::time::Instant;
use tracing::Instrument;

/// Deadline offset used when `now + poll_interval` is not representable
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

/// Lifecycle state of a worker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Idle,
    Waiting,
    Fetching,
    Comparing,
    Notifying,
    Persisting,
    Stopped,
}

/// Timing knobs of a worker
#[derive(Debug, Clone, Copy)]
pub struct WorkerTiming {
    /// Minimum time between the starts of two cycles
    pub poll_interval: Duration,
    /// Upper bound on cancellation latency while waiting
    pub cancel_check_interval: Duration,
    /// Consecutive fetch failures before an escalated error (0 = never)
    pub failure_alert_threshold: u32,
}

/// Counters collected over a worker's lifetime
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkerReport {
    pub identifier: Identifier,
    /// Cycles that reached the fetch step
    pub cycles: u64,
    pub notifications: u64,
    pub fetch_failures: u64,
    pub persist_failures: u64,
    pub notify_failures: u64,
}

pub struct TrackingWorker {
    identifier: Identifier,
    fetcher: Arc<dyn Fetcher>,
    notifier: Arc<dyn Notifier>,
    store: SnapshotStore,
    pool: Arc<Semaphore>,
    cancel: CancellationSignal,
    timing: WorkerTiming,
    current: Snapshot,
    state: WorkerState,
    consecutive_failures: u32,
    report: WorkerReport,
}

impl TrackingWorker {
    pub fn new(
        identifier: impl Into<Identifier>,
        fetcher: Arc<dyn Fetcher>,
        notifier: Arc<dyn Notifier>,
        store: SnapshotStore,
        pool: Arc<Semaphore>,
        cancel: CancellationSignal,
        timing: WorkerTiming,
    ) -> Self {
        let identifier = identifier.into();
        Self {
            report: WorkerReport {
                identifier: identifier.clone(),
                ..Default::default()
            },
            identifier,
            fetcher,
            notifier,
            store,
            pool,
            cancel,
            timing,
            current: Vec::new(),
            state: WorkerState::Idle,
            consecutive_failures: 0,
        }
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn state(&self) -> WorkerState {
        self.state
    }

    /// In-memory snapshot used for the next comparison
    pub fn current(&self) -> &Snapshot {
        &self.current
    }

    /// Run until cancelled
    pub async fn run(self) -> WorkerReport {
        let span = tracing::info_span!("worker", identifier = %self.identifier);
        self.run_inner().instrument(span).await
    }

    async fn run_inner(mut self) -> WorkerReport {
        tracing::info!("tracking started");
        self.load_initial().await;

        // First cycle fires immediately
        let mut next_due = Instant::now();

        loop {
            self.transition(WorkerState::Waiting);
            if !self.wait_until(next_due).await {
                break;
            }

            next_due = next_deadline(Instant::now(), self.timing.poll_interval);

            // Admission slot covers the active part of the cycle only
            let permit = tokio::select! {
                permit = self.pool.clone().acquire_owned() => permit,
                _ = self.cancel.cancelled() => break,
            };
            let Ok(_permit) = permit else {
                tracing::warn!("worker pool closed");
                break;
            };

            self.cycle().await;

            if self.cancel.is_cancelled() {
                break;
            }
        }

        self.transition(WorkerState::Stopped);
        tracing::info!(
            cycles = self.report.cycles,
            notifications = self.report.notifications,
            "tracking stopped"
        );
        self.report
    }

    async fn load_initial(&mut self) {
        let store = self.store.clone();
        let identifier = self.identifier.clone();
        match tokio::task::spawn_blocking(move || store.load(&identifier)).await {
            Ok(Ok(snapshot)) => {
                tracing::debug!(records = snapshot.len(), "loaded persisted snapshot");
                self.current = snapshot;
            }
            Ok(Err(e)) => {
                tracing::warn!(kind = e.kind(), error = %e, "could not load persisted snapshot, starting empty");
            }
            Err(e) => {
                tracing::warn!(kind = "persist", error = %e, "snapshot load task failed, starting empty");
            }
        }
    }

    /// Sleep until `deadline` in slices of at most the cancel check interval.
    /// Returns `false` if cancelled.
    async fn wait_until(&self, deadline: Instant) -> bool {
        loop {
            if self.cancel.is_cancelled() {
                return false;
            }
            let now = Instant::now();
            if now >= deadline {
                return true;
            }
            let slice = (deadline - now).min(self.timing.cancel_check_interval);
            if self.cancel.sleep(slice).await {
                return false;
            }
        }
    }

    /// One fetch -> compare -> notify -> persist pass
    async fn cycle(&mut self) {
        self.report.cycles += 1;

        self.transition(WorkerState::Fetching);
        let fresh = match self.fetcher.fetch(&self.identifier).await {
            Ok(snapshot) => {
                self.record_fetch_success();
                snapshot
            }
            Err(e) => {
                self.record_fetch_failure(e.kind(), &e.to_string());
                return;
            }
        };

        self.transition(WorkerState::Comparing);
        let changes = diff(&fresh, &self.current);
        if changes.is_empty() {
            tracing::debug!(records = fresh.len(), "no change");
            return;
        }

        tracing::info!(new_records = changes.len(), "change detected");

        self.transition(WorkerState::Notifying);
        for record in &changes {
            match self.notifier.notify(&self.identifier, record).await {
                Ok(()) => self.report.notifications += 1,
                Err(e) => {
                    self.report.notify_failures += 1;
                    tracing::warn!(kind = "notify", error = %e, "alert failed");
                }
            }
        }

        self.transition(WorkerState::Persisting);
        // Memory is authoritative for diffing even if the write below fails
        self.current = fresh;
        let store = self.store.clone();
        let identifier = self.identifier.clone();
        let snapshot = self.current.clone();
        match tokio::task::spawn_blocking(move || store.save(&identifier, &snapshot)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                self.report.persist_failures += 1;
                tracing::warn!(kind = e.kind(), error = %e, "failed to persist snapshot");
            }
            Err(e) => {
                self.report.persist_failures += 1;
                tracing::warn!(kind = "persist", error = %e, "snapshot save task failed");
            }
        }
    }

    fn record_fetch_success(&mut self) {
        if self.consecutive_failures > 0 {
            let threshold = self.timing.failure_alert_threshold;
            if threshold > 0 && self.consecutive_failures >= threshold {
                tracing::info!(
                    failures = self.consecutive_failures,
                    "fetching recovered"
                );
            }
            self.consecutive_failures = 0;
        }
    }

    fn record_fetch_failure(&mut self, kind: &str, error: &str) {
        self.report.fetch_failures += 1;
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        tracing::warn!(kind, error, "fetch failed, keeping previous snapshot");

        let threshold = self.timing.failure_alert_threshold;
        if threshold > 0 && self.consecutive_failures == threshold {
            tracing::error!(
                failures = self.consecutive_failures,
                "fetch keeps failing, still retrying every {:?}",
                self.timing.poll_interval
            );
        }
    }

    fn transition(&mut self, next: WorkerState) {
        tracing::trace!(from = ?self.state, to = ?next, "state");
        self.state = next;
    }
}

/// Start of the next cycle, clamped when the interval overflows the clock
fn next_deadline(now: Instant, interval: Duration) -> Instant {
    now.checked_add(interval)
        .or_else(|| now.checked_add(FAR_FUTURE))
        .unwrap_or(now)
}
