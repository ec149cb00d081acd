//! SnapshotStore - per-identifier JSON persistence
//!
//! One file per identifier under a dedicated directory. A missing file is an
//! empty snapshot. Writes go through a temp file in the same directory and an
//! atomic rename, so a reader never sees a half-written snapshot.

use crate::error::PersistError;
use crate::models::{Snapshot, StatusRecord};
use sha2::{Digest, Sha256};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

#[derive(Debug, Clone)]
pub struct SnapshotStore {
    dir: PathBuf,
}

impl SnapshotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Storage directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the storage directory if absent
    pub fn ensure_dir(&self) -> Result<(), PersistError> {
        fs::create_dir_all(&self.dir).map_err(|source| PersistError::CreateDir {
            path: self.dir.clone(),
            source,
        })
    }

    /// Path of the state file for an identifier
    pub fn path_for(&self, identifier: &str) -> PathBuf {
        self.dir.join(file_name_for(identifier))
    }

    /// Load the persisted snapshot
    ///
    /// Returns an empty snapshot if nothing was saved yet. A file that does not
    /// parse is moved aside to `<name>.json.bak` and treated as empty.
    pub fn load(&self, identifier: &str) -> Result<Snapshot, PersistError> {
        let path = self.path_for(identifier);

        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => return Err(PersistError::Read { path, source }),
        };

        match serde_json::from_str::<Vec<StatusRecord>>(&content) {
            Ok(snapshot) => Ok(snapshot),
            Err(e) => {
                tracing::warn!(
                    identifier,
                    path = %path.display(),
                    error = %e,
                    "corrupt snapshot file, backing up and starting fresh"
                );

                let backup_path = path.with_extension("json.bak");
                if let Err(backup_err) = fs::rename(&path, &backup_path) {
                    tracing::warn!(
                        identifier,
                        error = %backup_err,
                        "failed to back up corrupt snapshot file"
                    );
                }

                Ok(Vec::new())
            }
        }
    }

    /// Atomically replace the persisted snapshot
    pub fn save(&self, identifier: &str, snapshot: &[StatusRecord]) -> Result<(), PersistError> {
        let path = self.path_for(identifier);
        let content = serde_json::to_string_pretty(snapshot)?;

        self.ensure_dir()?;

        let write_err = |source: std::io::Error| PersistError::Write {
            path: path.clone(),
            source,
        };

        let mut temp_file = NamedTempFile::new_in(&self.dir).map_err(write_err)?;
        temp_file.write_all(content.as_bytes()).map_err(write_err)?;
        temp_file.flush().map_err(write_err)?;
        temp_file.as_file().sync_all().map_err(write_err)?;

        temp_file.persist(&path).map_err(|e| write_err(e.error))?;

        Ok(())
    }
}

/// Deterministic file name for an identifier
///
/// Identifiers made of `[A-Za-z0-9_-]` (plus inner dots) map to `<id>.json`.
/// Anything else is sanitized and suffixed with a hash of the raw identifier so
/// two different identifiers never share a file.
pub fn file_name_for(identifier: &str) -> String {
    let is_plain = !identifier.is_empty()
        && !identifier.starts_with('.')
        && identifier
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));

    if is_plain {
        return format!("{}.json", identifier);
    }

    let sanitized: String = identifier
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .take(64)
        .collect();

    let mut hasher = Sha256::new();
    hasher.update(identifier.as_bytes());
    let digest = format!("{:x}", hasher.finalize());

    format!("{}-{}.json", sanitized, &digest[..12])
}
