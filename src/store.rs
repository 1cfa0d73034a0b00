use anyhow::{Context, Result};
use chrono::Utc;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use tracing::warn;

use crate::models::AggregateStatus;

/// Append-only activity log. The monitor writes one timestamped line per
/// event; the loop must survive a broken log destination, so implementations
/// swallow their own I/O errors.
pub trait ReportLog: Send + Sync {
    fn append(&self, line: &str);
}

pub struct FileLog {
    path: PathBuf,
}

impl FileLog {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl ReportLog for FileLog {
    fn append(&self, line: &str) {
        let entry = format!("{}: {}\n", Utc::now(), line);
        let result = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .and_then(|mut f| f.write_all(entry.as_bytes()));
        if let Err(e) = result {
            warn!("Failed to append to log {}: {}", self.path.display(), e);
        }
    }
}

/// Single durable slot holding the aggregate status of the previous cycle.
pub trait StatusStore: Send + Sync {
    /// `None` when no status has ever been written.
    fn read(&self) -> Result<Option<String>>;
    fn write(&self, status: AggregateStatus) -> Result<()>;
}

pub struct FileStatusStore {
    path: PathBuf,
}

impl FileStatusStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl StatusStore for FileStatusStore {
    fn read(&self) -> Result<Option<String>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let raw = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read status file {}", self.path.display()))?;
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            Ok(None)
        } else {
            Ok(Some(trimmed.to_string()))
        }
    }

    fn write(&self, status: AggregateStatus) -> Result<()> {
        std::fs::write(&self.path, status.as_str())
            .with_context(|| format!("Failed to write status file {}", self.path.display()))
    }
}
