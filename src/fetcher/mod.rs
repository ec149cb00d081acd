//! Fetchers produce the current status history of one identifier

pub mod http;

use crate::error::FetchError;
use crate::models::Snapshot;
use async_trait::async_trait;

pub use http::HttpFetcher;

/// Source of fresh snapshots
///
/// Implementations must be safe to call concurrently for different
/// identifiers; a worker never calls it twice at once for the same one.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch the current ordered list of status records for `identifier`
    ///
    /// # Errors
    /// Network failures, non-success responses and pages without the expected
    /// status table.
    async fn fetch(&self, identifier: &str) -> Result<Snapshot, FetchError>;
}
