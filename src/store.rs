// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde_json::Value;
use tempfile::NamedTempFile;

use crate::config::{Config, parent_dir};
use crate::error::PersistenceError;
use crate::events::{Event, SharedReporter};
use crate::model::{PodcastDocument, SCHEMA_VERSION};

const BACKUP_MARKER: &str = ".backup-";

/// Durable storage of the single podcast document
#[derive(Clone)]
pub struct Store {
    path: PathBuf,
    dir: PathBuf,
    reporter: SharedReporter,
}

impl Store {
    pub fn new(config: &Config, reporter: SharedReporter) -> Self {
        Self {
            path: config.data_file.clone(),
            dir: config.data_dir().to_path_buf(),
            reporter,
        }
    }

    /// Location of the document file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the data directory and a default document if none exists yet.
    ///
    /// Returns `true` when a new document was written. An existing file is
    /// never touched.
    pub fn initialize(&self) -> Result<bool, PersistenceError> {
        self.ensure_dir()?;

        if self.path.exists() {
            return Ok(false);
        }

        let document = PodcastDocument::default_document();
        self.write(&document)?;
        self.reporter.report(Event::DocumentInitialized {
            path: self.path.clone(),
        });
        Ok(true)
    }

    /// Strict read: `Ok(None)` if there is no document, an error if it is unreadable.
    ///
    /// Only structural damage is an error: invalid JSON, or no `episodes`
    /// array. Odd values inside the podcast info or an episode read as
    /// their defaults.
    pub fn read(&self) -> Result<Option<PodcastDocument>, PersistenceError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(PersistenceError::ReadFailed {
                    path: self.path.clone(),
                    source: e,
                });
            }
        };

        let value: Value =
            serde_json::from_str(&content).map_err(|e| PersistenceError::JsonParseFailed {
                path: self.path.clone(),
                source: e,
            })?;

        if !value.get("episodes").is_some_and(Value::is_array) {
            return Err(PersistenceError::MissingEpisodes {
                path: self.path.clone(),
            });
        }

        serde_json::from_value(value)
            .map(Some)
            .map_err(|e| PersistenceError::JsonParseFailed {
                path: self.path.clone(),
                source: e,
            })
    }

    /// Lenient read that never fails.
    ///
    /// A missing or unreadable document is reported and replaced by the
    /// default document, which is not written back.
    pub fn load(&self) -> PodcastDocument {
        match self.read() {
            Ok(Some(document)) => document,
            Ok(None) => {
                self.reporter.report(Event::DocumentMissing {
                    path: self.path.clone(),
                });
                PodcastDocument::default_document()
            }
            Err(e) => {
                self.reporter.report(Event::DocumentUnreadable {
                    path: self.path.clone(),
                    reason: e.to_string(),
                });
                PodcastDocument::default_document()
            }
        }
    }

    /// Back up the current file, stamp the metadata and atomically replace the document
    pub fn save(&self, document: &mut PodcastDocument) -> Result<(), PersistenceError> {
        self.ensure_dir()?;

        if self.path.exists() {
            let backup = self.back_up(Utc::now().timestamp_millis())?;
            self.reporter.report(Event::BackupCreated { path: backup });
        }

        document.metadata.last_modified = Utc::now().to_rfc3339();
        if document.metadata.version.is_empty() {
            document.metadata.version = SCHEMA_VERSION.to_string();
        }

        self.write(document)?;
        self.reporter.report(Event::DocumentSaved {
            path: self.path.clone(),
            episodes: document.episodes.len(),
        });
        Ok(())
    }

    /// Backup files next to the document, oldest first
    pub fn backups(&self) -> Result<Vec<PathBuf>, PersistenceError> {
        let prefix = format!(
            "{}{BACKUP_MARKER}",
            self.path
                .file_name()
                .map(|n| n.to_string_lossy())
                .unwrap_or_default()
        );

        let entries = std::fs::read_dir(&self.dir).map_err(|e| PersistenceError::ReadFailed {
            path: self.dir.clone(),
            source: e,
        })?;

        let mut backups: Vec<((u128, u32), PathBuf)> = entries
            .filter_map(Result::ok)
            .filter_map(|entry| {
                let name = entry.file_name().to_string_lossy().into_owned();
                let order = backup_order(name.strip_prefix(&prefix)?)?;
                Some((order, entry.path()))
            })
            .collect();
        backups.sort();

        Ok(backups.into_iter().map(|(_, path)| path).collect())
    }

    /// Copy the current document into a backup file that did not exist before.
    ///
    /// Names are `<file>.backup-<millis>`; saves within the same millisecond
    /// get `-1`, `-2`, ... appended.
    fn back_up(&self, stamp: i64) -> Result<PathBuf, PersistenceError> {
        let mut attempt = 0;

        let (backup, mut file) = loop {
            let backup = self.backup_path(stamp, attempt);
            match OpenOptions::new().write(true).create_new(true).open(&backup) {
                Ok(file) => break (backup, file),
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => attempt += 1,
                Err(e) => return Err(self.backup_failed(backup, e)),
            }
        };

        let copied = File::open(&self.path)
            .and_then(|mut source| io::copy(&mut source, &mut file))
            .and_then(|_| file.sync_all());

        if let Err(e) = copied {
            let _ = std::fs::remove_file(&backup);
            return Err(self.backup_failed(backup, e));
        }
        Ok(backup)
    }

    fn backup_path(&self, stamp: i64, attempt: u32) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(format!("{BACKUP_MARKER}{stamp}"));
        if attempt > 0 {
            name.push(format!("-{attempt}"));
        }
        PathBuf::from(name)
    }

    fn backup_failed(&self, backup: PathBuf, source: io::Error) -> PersistenceError {
        PersistenceError::BackupFailed {
            path: self.path.clone(),
            backup,
            source,
        }
    }

    fn ensure_dir(&self) -> Result<(), PersistenceError> {
        std::fs::create_dir_all(&self.dir).map_err(|e| PersistenceError::CreateDirectoryFailed {
            path: self.dir.clone(),
            source: e,
        })
    }

    fn write(&self, document: &PodcastDocument) -> Result<(), PersistenceError> {
        let json = serde_json::to_string_pretty(document)?;
        write_atomically(&self.path, json.as_bytes()).map_err(|e| PersistenceError::WriteFailed {
            path: self.path.clone(),
            source: e,
        })
    }
}

/// Sort key of a backup name suffix: `<millis>` or `<millis>-<attempt>`
fn backup_order(suffix: &str) -> Option<(u128, u32)> {
    match suffix.split_once('-') {
        Some((stamp, attempt)) => Some((stamp.parse().ok()?, attempt.parse().ok()?)),
        None => Some((suffix.parse().ok()?, 0)),
    }
}

/// Write to a temporary file in the target's directory, then rename it over the target
pub(crate) fn write_atomically(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let mut file = NamedTempFile::new_in(parent_dir(path))?;
    file.write_all(contents)?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|e| e.error)?;
    Ok(())
}
