//! Audit sinks
//!
//! [`JsonLinesAuditLog`] appends one JSON object per line. The file is opened
//! for each record and closed again before `append` returns, so a crash never
//! leaves a buffered record behind. A failed write is retried once.

use super::record::AuditRecord;
use crate::domain::{DeidError, Result};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Destination for audit records
///
/// Implementations serialize concurrent appends.
pub trait AuditSink: Send + Sync {
    /// Persist one record
    fn append(&self, record: &AuditRecord) -> Result<()>;

    /// Make every appended record durable
    fn flush(&self) -> Result<()>;

    /// Flush and refuse further appends
    fn close(&self) -> Result<()>;
}

#[derive(Debug)]
struct LogState {
    open: bool,
    records_written: u64,
}

/// Append-only NDJSON audit file
#[derive(Debug)]
pub struct JsonLinesAuditLog {
    path: PathBuf,
    state: Mutex<LogState>,
}

impl JsonLinesAuditLog {
    /// Open (creating if needed) an audit file
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                DeidError::AuditWrite(format!(
                    "Failed to create audit log directory {}: {e}",
                    parent.display()
                ))
            })?;
        }
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| {
                DeidError::AuditWrite(format!("Failed to open audit log {}: {e}", path.display()))
            })?;

        tracing::debug!(path = %path.display(), "Audit log opened");
        Ok(Self {
            path,
            state: Mutex::new(LogState {
                open: true,
                records_written: 0,
            }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_line(&self, line: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(line.as_bytes())?;
        file.flush()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, LogState>> {
        self.state
            .lock()
            .map_err(|_| DeidError::AuditWrite("Audit log lock poisoned".to_string()))
    }
}

impl AuditSink for JsonLinesAuditLog {
    fn append(&self, record: &AuditRecord) -> Result<()> {
        let mut state = self.lock()?;
        if !state.open {
            return Err(DeidError::AuditWrite(format!(
                "Audit log {} is closed",
                self.path.display()
            )));
        }

        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        if let Err(first) = self.write_line(&line) {
            crate::log_retry_attempt!(1, 1, first.to_string());
            self.write_line(&line).map_err(|e| {
                DeidError::AuditWrite(format!(
                    "Failed to append to audit log {}: {e}",
                    self.path.display()
                ))
            })?;
        }

        state.records_written += 1;
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        // Every append is flushed before the file handle is dropped
        let state = self.lock()?;
        if !state.open {
            return Err(DeidError::AuditWrite(format!(
                "Audit log {} is closed",
                self.path.display()
            )));
        }
        Ok(())
    }

    fn close(&self) -> Result<()> {
        let mut state = self.lock()?;
        if state.open {
            state.open = false;
            tracing::info!(
                path = %self.path.display(),
                records = state.records_written,
                "Audit log closed"
            );
        }
        Ok(())
    }
}

/// In-memory sink for tests and embedding
#[derive(Debug, Default)]
pub struct MemoryAuditLog {
    state: Mutex<(Vec<AuditRecord>, bool)>,
}

impl MemoryAuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every record appended so far
    pub fn records(&self) -> Vec<AuditRecord> {
        self.state
            .lock()
            .map(|guard| guard.0.clone())
            .unwrap_or_default()
    }
}

impl AuditSink for MemoryAuditLog {
    fn append(&self, record: &AuditRecord) -> Result<()> {
        let mut guard = self
            .state
            .lock()
            .map_err(|_| DeidError::AuditWrite("Audit log lock poisoned".to_string()))?;
        let (records, closed) = &mut *guard;
        if *closed {
            return Err(DeidError::AuditWrite("Audit log is closed".to_string()));
        }
        records.push(record.clone());
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        Ok(())
    }

    fn close(&self) -> Result<()> {
        if let Ok(mut guard) = self.state.lock() {
            guard.1 = true;
        }
        Ok(())
    }
}
