//! Polling engine
//!
//! A [`Supervisor`] runs one [`TrackingWorker`] per identifier. Each worker
//! polls its fetcher on a fixed interval, diffs the result against the last
//! known snapshot, alerts on every new record and persists the new snapshot.
//! All workers share one [`CancellationSignal`] and one admission pool.

pub mod cancel;
pub mod detector;
pub mod supervisor;
pub mod worker;

pub use cancel::CancellationSignal;
pub use detector::diff;
pub use supervisor::{RunOutcome, Supervisor};
pub use worker::{TrackingWorker, WorkerReport, WorkerState, WorkerTiming};
