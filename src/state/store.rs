//! Progress persistence.
//!
//! `FileStateStore` keeps a single pretty-printed JSON file and replaces it
//! atomically on every save: the new content goes to a sibling temp file,
//! is fsynced, then renamed over the target. Readers see either the old
//! file or the new one, never a partial write.

use chrono::Utc;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::{BadgeProgress, STATE_VERSION};
use crate::catalog::Catalog;
use crate::errors::{StoreCorruptError, StoreError};

/// Persistence seam for badge progress.
pub trait StateStore {
    /// Load progress, initialising every catalog badge that has no entry.
    fn load(&self, catalog: &Catalog) -> Result<BadgeProgress, StoreError>;

    /// Persist progress in full.
    fn save(&mut self, progress: &BadgeProgress) -> Result<(), StoreError>;
}

/// JSON file store.
#[derive(Debug, Clone)]
pub struct FileStateStore {
    path: PathBuf,
}

impl FileStateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Move an unreadable progress file aside so the next load starts fresh.
    ///
    /// Returns the backup path, or `None` if there was no file.
    pub fn quarantine(&self) -> Result<Option<PathBuf>, StoreError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let file_name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "badge-progress.json".to_string());
        let backup = self.path.with_file_name(format!(
            "{}.corrupt-{}",
            file_name,
            Utc::now().format("%Y%m%dT%H%M%SZ")
        ));
        fs::rename(&self.path, &backup).map_err(|source| StoreError::Write {
            path: backup.clone(),
            source,
        })?;
        warn!(backup = %backup.display(), "Quarantined unreadable badge progress file");
        Ok(Some(backup))
    }

    /// Delete the progress file. Missing files are not an error.
    pub fn reset(&self) -> Result<(), StoreError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StoreError::Write {
                path: self.path.clone(),
                source,
            }),
        }
    }
}

impl StateStore for FileStateStore {
    fn load(&self, catalog: &Catalog) -> Result<BadgeProgress, StoreError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No badge progress yet, starting fresh");
                return Ok(BadgeProgress::for_catalog(catalog));
            }
            Err(source) => {
                return Err(StoreError::Read {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        let mut progress: BadgeProgress =
            serde_json::from_str(&content).map_err(|e| StoreCorruptError {
                path: self.path.clone(),
                reason: e.to_string(),
            })?;
        if progress.version != STATE_VERSION {
            return Err(StoreCorruptError {
                path: self.path.clone(),
                reason: format!(
                    "unsupported format version {} (expected {})",
                    progress.version, STATE_VERSION
                ),
            }
            .into());
        }

        let unknown = progress.reconcile(catalog);
        if !unknown.is_empty() {
            debug!(?unknown, "Ignoring badge ids not present in the catalog");
        }
        Ok(progress)
    }

    fn save(&mut self, progress: &BadgeProgress) -> Result<(), StoreError> {
        let mut json = serde_json::to_string_pretty(progress).map_err(StoreError::Serialize)?;
        json.push('\n');
        write_atomic(&self.path, json.as_bytes()).map_err(|source| StoreError::Write {
            path: self.path.clone(),
            source,
        })
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(dir) = path.parent()
        && !dir.as_os_str().is_empty()
    {
        fs::create_dir_all(dir)?;
    }

    let tmp = path.with_extension(format!("json.tmp.{}", std::process::id()));
    let written = fs::File::create(&tmp).and_then(|mut file| {
        file.write_all(bytes)?;
        file.sync_all()
    });
    if let Err(err) = written.and_then(|()| fs::rename(&tmp, path)) {
        let _ = fs::remove_file(&tmp);
        return Err(err);
    }
    Ok(())
}

/// In-memory store for tests and embedding.
#[derive(Debug, Default, Clone)]
pub struct MemoryStateStore {
    progress: Option<BadgeProgress>,
    saves: usize,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing snapshot.
    pub fn with_progress(progress: BadgeProgress) -> Self {
        Self {
            progress: Some(progress),
            saves: 0,
        }
    }

    /// Last saved snapshot.
    pub fn snapshot(&self) -> Option<&BadgeProgress> {
        self.progress.as_ref()
    }

    /// Number of `save` calls so far.
    pub fn saves(&self) -> usize {
        self.saves
    }
}

impl StateStore for MemoryStateStore {
    fn load(&self, catalog: &Catalog) -> Result<BadgeProgress, StoreError> {
        let mut progress = self
            .progress
            .clone()
            .unwrap_or_else(|| BadgeProgress::for_catalog(catalog));
        progress.reconcile(catalog);
        Ok(progress)
    }

    fn save(&mut self, progress: &BadgeProgress) -> Result<(), StoreError> {
        self.progress = Some(progress.clone());
        self.saves += 1;
        Ok(())
    }
}
