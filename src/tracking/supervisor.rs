//! Supervisor - runs one worker per identifier under a bounded pool

use super::cancel::CancellationSignal;
use super::worker::{TrackingWorker, WorkerReport, WorkerTiming};
use crate::error::{PersistError, StartupError};
use crate::fetcher::Fetcher;
use crate::models::{Identifier, TrackerConfig};
use crate::notifier::Notifier;
use crate::state::SnapshotStore;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

/// How a supervised run ended
#[derive(Debug, Default)]
pub struct RunOutcome {
    /// Reports of the workers that reached `Stopped` before the supervisor returned
    pub reports: Vec<WorkerReport>,
    /// Whether the run ended because of an operator interrupt
    pub interrupted: bool,
    /// Workers still running when the shutdown grace period ran out
    pub detached: usize,
}

pub struct Supervisor {
    config: TrackerConfig,
    fetcher: Arc<dyn Fetcher>,
    notifier: Arc<dyn Notifier>,
    store: SnapshotStore,
    cancel: CancellationSignal,
}

impl Supervisor {
    pub fn new(
        config: TrackerConfig,
        fetcher: Arc<dyn Fetcher>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let store = SnapshotStore::new(config.storage_dir.clone());
        Self {
            config,
            fetcher,
            notifier,
            store,
            cancel: CancellationSignal::new(),
        }
    }

    /// Handle to the signal observed by every worker of this supervisor
    pub fn cancellation(&self) -> CancellationSignal {
        self.cancel.clone()
    }

    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    /// Track `identifiers` until Ctrl-C
    pub async fn run(&self, identifiers: &[Identifier]) -> Result<RunOutcome, StartupError> {
        self.run_until(identifiers, async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "cannot listen for Ctrl-C, running until cancelled");
                std::future::pending::<()>().await;
            }
        })
        .await
    }

    /// Track `identifiers` until every worker stops or `interrupt` resolves
    ///
    /// An empty identifier list returns immediately. On interrupt the
    /// cancellation signal is set and workers get a bounded grace period to
    /// stop; any still running after that are left to finish on their own.
    pub async fn run_until<F>(
        &self,
        identifiers: &[Identifier],
        interrupt: F,
    ) -> Result<RunOutcome, StartupError>
    where
        F: Future<Output = ()>,
    {
        let identifiers = unique(identifiers);
        if identifiers.is_empty() {
            tracing::debug!("no identifiers to track");
            return Ok(RunOutcome::default());
        }

        self.config.validate()?;

        self.store.ensure_dir().map_err(|e| match e {
            PersistError::CreateDir { path, source } => StartupError::StorageDir { path, source },
            other => StartupError::StorageDir {
                path: self.store.dir().to_path_buf(),
                source: std::io::Error::other(other.to_string()),
            },
        })?;

        let pool = Arc::new(Semaphore::new(self.config.max_concurrent_workers));
        let timing = WorkerTiming {
            poll_interval: self.config.poll_interval(),
            cancel_check_interval: self.config.cancel_check_interval(),
            failure_alert_threshold: self.config.failure_alert_threshold,
        };

        tracing::info!(
            workers = identifiers.len(),
            cap = self.config.max_concurrent_workers,
            storage = %self.store.dir().display(),
            "starting workers"
        );

        let handles: Vec<JoinHandle<WorkerReport>> = identifiers
            .into_iter()
            .map(|identifier| {
                let worker = TrackingWorker::new(
                    identifier,
                    Arc::clone(&self.fetcher),
                    Arc::clone(&self.notifier),
                    self.store.clone(),
                    Arc::clone(&pool),
                    self.cancel.clone(),
                    timing,
                );
                tokio::spawn(worker.run())
            })
            .collect();

        let poll = self.config.supervisor_poll_interval();
        let mut interrupted = false;

        tokio::pin!(interrupt);
        while !all_finished(&handles) {
            tokio::select! {
                _ = &mut interrupt => {
                    interrupted = true;
                    break;
                }
                _ = tokio::time::sleep(poll) => {}
            }
        }

        if interrupted {
            if self.cancel.cancel() {
                tracing::info!("interrupt received, stopping workers");
            }
            let grace = self.config.shutdown_grace();
            let _ = tokio::time::timeout(grace, async {
                while !all_finished(&handles) {
                    tokio::time::sleep(poll).await;
                }
            })
            .await;
        }

        let mut outcome = RunOutcome {
            interrupted,
            ..Default::default()
        };

        for handle in handles {
            if !handle.is_finished() {
                outcome.detached += 1;
                continue;
            }
            match handle.await {
                Ok(report) => {
                    tracing::info!(
                        identifier = %report.identifier,
                        cycles = report.cycles,
                        notifications = report.notifications,
                        fetch_failures = report.fetch_failures,
                        persist_failures = report.persist_failures,
                        notify_failures = report.notify_failures,
                        "worker finished"
                    );
                    outcome.reports.push(report);
                }
                Err(e) => tracing::error!(error = %e, "worker task failed"),
            }
        }

        if outcome.detached > 0 {
            tracing::warn!(
                detached = outcome.detached,
                "workers still busy after shutdown grace period"
            );
        }

        Ok(outcome)
    }
}

fn all_finished(handles: &[JoinHandle<WorkerReport>]) -> bool {
    handles.iter().all(|h| h.is_finished())
}

/// Identifiers with blanks and duplicates removed, first occurrence wins
fn unique(identifiers: &[Identifier]) -> Vec<Identifier> {
    let mut seen = std::collections::HashSet::new();
    identifiers
        .iter()
        .map(|id| id.trim())
        .filter(|id| !id.is_empty())
        .filter(|id| seen.insert(id.to_string()))
        .map(str::to_string)
        .collect()
}
