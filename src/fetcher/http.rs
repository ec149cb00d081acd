//! Tracking page fetcher
//!
//! Downloads the public tracking page of an identifier and turns its status
//! table into a snapshot: header cells name the fields, each body row is one
//! record.

use super::Fetcher;
use crate::error::FetchError;
use crate::models::{Snapshot, StatusRecord, TrackerConfig};
use crate::parser::table::{extract_tables, HtmlTable};
use async_trait::async_trait;

pub struct HttpFetcher {
    client: reqwest::Client,
    config: TrackerConfig,
}

impl HttpFetcher {
    /// Build a fetcher from the tracker configuration
    pub fn new(config: &TrackerConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(config.fetch_timeout())
            .user_agent(concat!("trackwatch/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            config: config.clone(),
        })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, identifier: &str) -> Result<Snapshot, FetchError> {
        let url = self.config.url_for(identifier);
        tracing::debug!(identifier, url = %url, "fetching tracking page");

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url,
            });
        }

        let body = response.text().await?;
        snapshot_from_html(&body, self.config.table_index)
    }
}

/// Convert the status table at `table_index` of a page into a snapshot
pub fn snapshot_from_html(html: &str, table_index: usize) -> Result<Snapshot, FetchError> {
    let tables = extract_tables(html).map_err(|e| FetchError::MalformedTable(e.to_string()))?;
    let found = tables.len();

    let table = tables
        .into_iter()
        .nth(table_index)
        .ok_or(FetchError::MissingTable {
            index: table_index,
            found,
        })?;

    snapshot_from_table(table)
}

/// Zip each row with the header names; extra cells are dropped
pub fn snapshot_from_table(table: HtmlTable) -> Result<Snapshot, FetchError> {
    if table.headers.is_empty() {
        return Err(FetchError::MalformedTable(
            "table has no header cells".to_string(),
        ));
    }

    Ok(table
        .rows
        .into_iter()
        .map(|row| table.headers.iter().cloned().zip(row).collect::<StatusRecord>())
        .collect())
}
