//! Snapshot persistence
//!
//! Keeps the last known status history of every tracked identifier on disk so
//! a restart does not re-announce events that were already seen.

mod store;

pub use store::{file_name_for, SnapshotStore};
