//! Notifiers turn a newly observed status record into an alert

pub mod console;

use crate::error::NotifyError;
use crate::models::StatusRecord;
use async_trait::async_trait;

pub use console::ConsoleNotifier;

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Announce one new record for `identifier`. Best effort.
    async fn notify(&self, identifier: &str, record: &StatusRecord) -> Result<(), NotifyError>;
}
