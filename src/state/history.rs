use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use uuid::Uuid;

use super::AttemptResult;

/// Where a history entry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntrySource {
    /// Attempt made by the action runner during `execute`
    Run,
    /// Outcome recorded by hand or by an external check
    Verify,
}

/// One line of the append-only attempt history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub badge: String,
    pub result: AttemptResult,
    pub source: EntrySource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Append-only JSON-lines log of attempts and verifications.
pub struct AttemptLog {
    path: PathBuf,
}

impl AttemptLog {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, entry: &HistoryEntry) -> Result<()> {
        if let Some(dir) = self.path.parent()
            && !dir.as_os_str().is_empty()
        {
            fs::create_dir_all(dir).context("Failed to create history directory")?;
        }

        let mut line = serde_json::to_string(entry).context("Failed to serialize history entry")?;
        line.push('\n');
        // A crash can leave a torn last line; start a fresh one so this
        // entry is not glued onto the fragment.
        if self.ends_mid_line()? {
            line.insert(0, '\n');
        }

        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .context("Failed to open history file")?
            .write_all(line.as_bytes())
            .context("Failed to write history entry")?;

        Ok(())
    }

    /// True when the file is non-empty and its last byte is not a newline.
    fn ends_mid_line(&self) -> Result<bool> {
        let mut file = match fs::File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(e).context("Failed to open history file"),
        };
        let len = file.metadata().context("Failed to stat history file")?.len();
        if len == 0 {
            return Ok(false);
        }
        let mut last = [0u8; 1];
        file.seek(SeekFrom::End(-1))
            .and_then(|_| file.read_exact(&mut last))
            .context("Failed to read history file")?;
        Ok(last[0] != b'\n')
    }

    /// All entries, oldest first. Lines that fail to parse (for example a
    /// write torn by a crash) are skipped.
    pub fn entries(&self) -> Result<Vec<HistoryEntry>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&self.path).context("Failed to read history file")?;
        Ok(content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| serde_json::from_str(line).ok())
            .collect())
    }

    pub fn for_badge(&self, badge: &str) -> Result<Vec<HistoryEntry>> {
        Ok(self
            .entries()?
            .into_iter()
            .filter(|e| e.badge == badge)
            .collect())
    }
}
