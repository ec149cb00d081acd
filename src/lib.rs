// Trackwatch - shipment status watcher
// Polls tracking pages, detects new status events and alerts on each one

pub mod cli;
pub mod error;
pub mod fetcher;
pub mod models;
pub mod notifier;
pub mod parser;
pub mod state;
pub mod tracking;

pub use anyhow::{Context, Result};
pub use colored::Colorize;

// Re-export commonly used types
pub use error::{FetchError, NotifyError, PersistError, StartupError};
pub use models::{Identifier, Snapshot, StatusRecord, TrackerConfig};
pub use state::SnapshotStore;
pub use tracking::{CancellationSignal, Supervisor};
