pub mod config;
pub mod record;

pub use config::TrackerConfig;
pub use record::{Identifier, Snapshot, StatusRecord};
