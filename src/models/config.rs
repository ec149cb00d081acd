//! Tracker configuration (`trackwatch.toml`)

use crate::error::StartupError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::Semaphore;

/// Default config file name, looked up in the working directory
pub const CONFIG_FILE_NAME: &str = "trackwatch.toml";

/// Placeholder replaced by the identifier in `tracking_url`
pub const ID_PLACEHOLDER: &str = "{id}";

/// Longest accepted poll interval (one year)
pub const MAX_POLL_INTERVAL_SECS: u64 = 365 * 24 * 3600;

/// Longest accepted cancellation check, supervisor poll and shutdown grace
pub const MAX_CHECK_INTERVAL_MS: u64 = 60 * 1000;

pub const MAX_FETCH_TIMEOUT_SECS: u64 = 3600;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Cycle length per worker
    #[serde(alias = "pollIntervalSeconds")]
    pub poll_interval_secs: u64,

    /// Maximum number of cycles running at once
    #[serde(alias = "maxConcurrentWorkers")]
    pub max_concurrent_workers: usize,

    /// Where per-identifier snapshots are persisted
    #[serde(alias = "storageDir")]
    pub storage_dir: PathBuf,

    /// Upper bound on how long a waiting worker takes to notice cancellation
    #[serde(alias = "cancelCheckIntervalMs")]
    pub cancel_check_interval_ms: u64,

    /// How often the supervisor checks whether all workers have stopped
    #[serde(alias = "supervisorPollIntervalMs")]
    pub supervisor_poll_interval_ms: u64,

    /// How long the supervisor waits for workers after an interrupt
    #[serde(alias = "shutdownGraceMs")]
    pub shutdown_grace_ms: u64,

    #[serde(alias = "fetchTimeoutSecs")]
    pub fetch_timeout_secs: u64,

    /// Tracking page URL; `{id}` is replaced with the identifier
    #[serde(alias = "trackingUrl")]
    pub tracking_url: String,

    /// Zero-based index of the status table on the tracking page
    #[serde(alias = "tableIndex")]
    pub table_index: usize,

    /// Consecutive fetch failures before an escalated error is logged (0 = never)
    #[serde(alias = "failureAlertThreshold")]
    pub failure_alert_threshold: u32,

    /// Ring the terminal bell with each alert
    pub bell: bool,

    /// Program (plus arguments) run once per alert, e.g. `["aplay", "notification.wav"]`
    #[serde(alias = "soundCommand")]
    pub sound_command: Vec<String>,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 15 * 60,
            max_concurrent_workers: 15,
            storage_dir: PathBuf::from(".trackingfiles"),
            cancel_check_interval_ms: 1000,
            supervisor_poll_interval_ms: 500,
            shutdown_grace_ms: 2000,
            fetch_timeout_secs: 30,
            tracking_url: "https://portal.ekartlogistics.com/track/{id}/".to_string(),
            table_index: 1,
            failure_alert_threshold: 5,
            bell: true,
            sound_command: Vec::new(),
        }
    }
}

impl TrackerConfig {
    /// Resolve and load the configuration
    ///
    /// An explicit path must exist. Otherwise `./trackwatch.toml`, then
    /// `<config dir>/trackwatch/config.toml`, then built-in defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load_from(path);
        }

        for candidate in Self::search_paths() {
            if candidate.exists() {
                return Self::load_from(&candidate);
            }
        }

        Ok(Self::default())
    }

    /// Load and validate a specific config file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: TrackerConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    fn search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(CONFIG_FILE_NAME)];
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("trackwatch").join("config.toml"));
        }
        paths
    }

    /// Reject values that would stall, spin or overflow the engine
    pub fn validate(&self) -> Result<(), StartupError> {
        check_range("poll_interval_secs", self.poll_interval_secs, 1, MAX_POLL_INTERVAL_SECS)?;
        check_range(
            "max_concurrent_workers",
            self.max_concurrent_workers as u64,
            1,
            Semaphore::MAX_PERMITS as u64,
        )?;
        check_range(
            "cancel_check_interval_ms",
            self.cancel_check_interval_ms,
            1,
            MAX_CHECK_INTERVAL_MS,
        )?;
        check_range(
            "supervisor_poll_interval_ms",
            self.supervisor_poll_interval_ms,
            1,
            MAX_CHECK_INTERVAL_MS,
        )?;
        check_range("shutdown_grace_ms", self.shutdown_grace_ms, 0, MAX_CHECK_INTERVAL_MS)?;
        check_range("fetch_timeout_secs", self.fetch_timeout_secs, 1, MAX_FETCH_TIMEOUT_SECS)?;
        if !self.tracking_url.contains(ID_PLACEHOLDER) {
            return Err(StartupError::Config(format!(
                "tracking_url must contain {}",
                ID_PLACEHOLDER
            )));
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn cancel_check_interval(&self) -> Duration {
        Duration::from_millis(self.cancel_check_interval_ms)
    }

    pub fn supervisor_poll_interval(&self) -> Duration {
        Duration::from_millis(self.supervisor_poll_interval_ms)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    /// Tracking page URL for one identifier
    pub fn url_for(&self, identifier: &str) -> String {
        self.tracking_url.replace(ID_PLACEHOLDER, identifier)
    }
}

fn check_range(name: &str, value: u64, min: u64, max: u64) -> Result<(), StartupError> {
    if value < min || value > max {
        return Err(StartupError::Config(format!(
            "{} must be between {} and {} (got {})",
            name, min, max, value
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_are_valid() {
        let config = TrackerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.poll_interval(), Duration::from_secs(900));
        assert_eq!(config.max_concurrent_workers, 15);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: TrackerConfig = toml::from_str("poll_interval_secs = 60\n").unwrap();
        assert_eq!(config.poll_interval_secs, 60);
        assert_eq!(config.max_concurrent_workers, 15);
        assert_eq!(config.storage_dir, PathBuf::from(".trackingfiles"));
    }

    #[test]
    fn test_camel_case_aliases() {
        let config: TrackerConfig =
            toml::from_str("pollIntervalSeconds = 30\nmaxConcurrentWorkers = 2\n").unwrap();
        assert_eq!(config.poll_interval_secs, 30);
        assert_eq!(config.max_concurrent_workers, 2);
    }

    #[test]
    fn test_validate_rejects_zero_cap() {
        let config = TrackerConfig {
            max_concurrent_workers: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(StartupError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_huge_poll_interval() {
        let config: TrackerConfig =
            toml::from_str("pollIntervalSeconds = 9223372036854775807\n").unwrap();
        assert!(matches!(config.validate(), Err(StartupError::Config(_))));

        let at_limit = TrackerConfig {
            poll_interval_secs: MAX_POLL_INTERVAL_SECS,
            ..Default::default()
        };
        assert!(at_limit.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_cap_above_semaphore_limit() {
        let config = TrackerConfig {
            max_concurrent_workers: Semaphore::MAX_PERMITS + 1,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let at_limit = TrackerConfig {
            max_concurrent_workers: Semaphore::MAX_PERMITS,
            ..Default::default()
        };
        assert!(at_limit.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_out_of_range_check_intervals() {
        let cases = [
            TrackerConfig {
                cancel_check_interval_ms: 0,
                ..Default::default()
            },
            TrackerConfig {
                cancel_check_interval_ms: MAX_CHECK_INTERVAL_MS + 1,
                ..Default::default()
            },
            TrackerConfig {
                supervisor_poll_interval_ms: u64::MAX,
                ..Default::default()
            },
            TrackerConfig {
                shutdown_grace_ms: u64::MAX,
                ..Default::default()
            },
            TrackerConfig {
                fetch_timeout_secs: 0,
                ..Default::default()
            },
        ];
        for config in cases {
            assert!(config.validate().is_err(), "accepted {:?}", config);
        }
    }

    #[test]
    fn test_validate_rejects_url_without_placeholder() {
        let config = TrackerConfig {
            tracking_url: "https://example.com/track".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("trackwatch.toml");
        std::fs::write(
            &path,
            "poll_interval_secs = 120\nstorage_dir = \"state\"\nbell = false\n",
        )
        .unwrap();

        let config = TrackerConfig::load(Some(&path)).unwrap();
        assert_eq!(config.poll_interval_secs, 120);
        assert_eq!(config.storage_dir, PathBuf::from("state"));
        assert!(!config.bell);
    }

    #[test]
    fn test_sound_command_from_file() {
        let config: TrackerConfig =
            toml::from_str("sound_command = [\"aplay\", \"notification.wav\"]\n").unwrap();
        assert_eq!(config.sound_command, vec!["aplay", "notification.wav"]);
        assert!(TrackerConfig::default().sound_command.is_empty());
    }

    #[test]
    fn test_load_explicit_missing_file_fails() {
        let temp = TempDir::new().unwrap();
        let result = TrackerConfig::load(Some(&temp.path().join("nope.toml")));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_invalid_values_fails() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("trackwatch.toml");
        std::fs::write(&path, "poll_interval_secs = 0\n").unwrap();
        assert!(TrackerConfig::load_from(&path).is_err());
    }

    #[test]
    fn test_url_for() {
        let config = TrackerConfig::default();
        assert_eq!(
            config.url_for("FMPP123"),
            "https://portal.ekartlogistics.com/track/FMPP123/"
        );
    }
}
