// ABOUTME: Write-once persistence of configuration snapshots before destructive steps.
// ABOUTME: One pretty-printed JSON file per record, keyed by container name and time.

use crate::snapshot::ConfigurationSnapshot;
use crate::types::ContainerName;
use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Collision suffixes tried before giving up on a key.
const MAX_SUFFIX: u32 = 1000;

/// A persisted snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupRecord {
    pub container_name: ContainerName,
    pub captured_at: DateTime<Utc>,
    /// Machine the backup was taken on.
    pub host: String,
    pub snapshot: ConfigurationSnapshot,
}

impl BackupRecord {
    pub fn new(
        name: &ContainerName,
        snapshot: ConfigurationSnapshot,
        captured_at: DateTime<Utc>,
    ) -> Self {
        Self {
            container_name: name.clone(),
            captured_at,
            host: gethostname::gethostname().to_string_lossy().into_owned(),
            snapshot,
        }
    }

    /// `{name}_{YYYYMMDD_HHMMSS}` in local time.
    pub fn key(&self) -> String {
        format!(
            "{}_{}",
            self.container_name,
            self.captured_at
                .with_timezone(&Local)
                .format("%Y%m%d_%H%M%S")
        )
    }
}

/// A saved record and where it went.
#[derive(Debug, Clone)]
pub struct SavedBackup {
    pub record: BackupRecord,
    pub path: PathBuf,
}

#[derive(Debug, thiserror::Error)]
pub enum BackupError {
    #[error("failed to create backup directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write backup {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to read backup {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("malformed backup {}: {source}", path.display())]
    Malformed {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("failed to serialize backup: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("no free backup key for {0}")]
    Exhausted(String),
}

/// Storage for backup records.
pub trait BackupStore {
    /// Persist a new record. Never overwrites an existing one.
    fn save(
        &self,
        name: &ContainerName,
        snapshot: &ConfigurationSnapshot,
    ) -> Result<SavedBackup, BackupError>;

    /// Read a record back.
    fn load(&self, path: &Path) -> Result<BackupRecord, BackupError>;

    /// All records for `name`, oldest first.
    fn list(&self, name: &ContainerName) -> Result<Vec<SavedBackup>, BackupError>;
}

/// Backups as files in one directory.
#[derive(Debug, Clone)]
pub struct FsBackupStore {
    root: PathBuf,
}

impl FsBackupStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Save with an explicit capture time.
    pub fn save_at(
        &self,
        name: &ContainerName,
        snapshot: &ConfigurationSnapshot,
        captured_at: DateTime<Utc>,
    ) -> Result<SavedBackup, BackupError> {
        std::fs::create_dir_all(&self.root).map_err(|source| BackupError::CreateDir {
            path: self.root.clone(),
            source,
        })?;

        let record = BackupRecord::new(name, snapshot.clone(), captured_at);
        let json = serde_json::to_vec_pretty(&record)?;
        let key = record.key();

        for suffix in 0..MAX_SUFFIX {
            let file_name = match suffix {
                0 => format!("{}.json", key),
                n => format!("{}_{}.json", key, n),
            };
            let path = self.root.join(file_name);

            // create_new is the atomic "must not exist" check
            let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => file,
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(source) => return Err(BackupError::Write { path, source }),
            };

            write_or_discard(&path, || file.write_all(&json).and_then(|()| file.sync_all()))?;

            tracing::debug!(container = %name, path = %path.display(), "wrote backup");
            return Ok(SavedBackup { record, path });
        }

        Err(BackupError::Exhausted(key))
    }
}

/// Run `write` against a freshly created `path`. On failure the partial file
/// is removed so its name does not stay taken by a truncated record.
fn write_or_discard(
    path: &Path,
    write: impl FnOnce() -> std::io::Result<()>,
) -> Result<(), BackupError> {
    write().map_err(|source| {
        if let Err(e) = std::fs::remove_file(path) {
            tracing::warn!(path = %path.display(), error = %e, "could not remove partial backup");
        }
        BackupError::Write {
            path: path.to_path_buf(),
            source,
        }
    })
}

impl BackupStore for FsBackupStore {
    fn save(
        &self,
        name: &ContainerName,
        snapshot: &ConfigurationSnapshot,
    ) -> Result<SavedBackup, BackupError> {
        self.save_at(name, snapshot, Utc::now())
    }

    fn load(&self, path: &Path) -> Result<BackupRecord, BackupError> {
        let content = std::fs::read(path).map_err(|source| BackupError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_slice(&content).map_err(|source| BackupError::Malformed {
            path: path.to_path_buf(),
            source,
        })
    }

    fn list(&self, name: &ContainerName) -> Result<Vec<SavedBackup>, BackupError> {
        let entries = match std::fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(BackupError::Read {
                    path: self.root.clone(),
                    source,
                });
            }
        };

        let prefix = format!("{}_", name);
        let mut saved = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            let matches = path
                .file_name()
                .and_then(|f| f.to_str())
                .is_some_and(|f| f.starts_with(&prefix) && f.ends_with(".json"));
            if !matches {
                continue;
            }
            // Names like `web` and `web_api` share a prefix; the record decides.
            match self.load(&path) {
                Ok(record) if record.container_name == *name => {
                    saved.push(SavedBackup { record, path })
                }
                Ok(_) => {}
                Err(e) => tracing::debug!(error = %e, "skipping unreadable backup"),
            }
        }

        saved.sort_by(|a, b| {
            a.record
                .captured_at
                .cmp(&b.record.captured_at)
                .then_with(|| a.path.cmp(&b.path))
        });
        Ok(saved)
    }
}
