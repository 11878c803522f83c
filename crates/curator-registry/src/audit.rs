//! Append-only audit log of superseding events
//!
//! The log is the strictly-ordered resource in the system: appends go
//! through a single-writer mutex so entries are never interleaved or
//! partially written. Only the superseding workflow writes here; every
//! other component reads.

use crate::error::StoreError;
use crate::record::SupersedingEvent;
use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

/// Strictly ordered, append-only sequence of superseding events
pub trait AuditLog: Send + Sync {
    /// Append one event
    ///
    /// # Errors
    /// `Io`/`Serde` on persistence failure; the entry is either fully
    /// appended or absent, never partial.
    fn append(&self, event: SupersedingEvent) -> Result<(), StoreError>;

    /// All events, oldest first
    fn entries(&self) -> Result<Vec<SupersedingEvent>, StoreError>;

    /// The most recent `n` events, oldest first
    fn tail(&self, n: usize) -> Result<Vec<SupersedingEvent>, StoreError> {
        let mut events = self.entries()?;
        let skip = events.len().saturating_sub(n);
        Ok(events.split_off(skip))
    }
}

/// In-memory audit log backend
#[derive(Debug, Default)]
pub struct MemoryAuditLog {
    events: Mutex<Vec<SupersedingEvent>>,
}

impl MemoryAuditLog {
    /// Create new empty log
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl AuditLog for MemoryAuditLog {
    fn append(&self, event: SupersedingEvent) -> Result<(), StoreError> {
        self.events.lock().push(event);
        Ok(())
    }

    fn entries(&self) -> Result<Vec<SupersedingEvent>, StoreError> {
        Ok(self.events.lock().clone())
    }
}

/// Durable audit log backend: one JSON object per line
///
/// The file handle stays open in append mode for the life of the log;
/// each append serializes, writes, and flushes under the writer mutex.
#[derive(Debug)]
pub struct JsonlAuditLog {
    path: PathBuf,
    writer: Mutex<File>,
}

impl JsonlAuditLog {
    /// Open (or create) a log at `path`
    ///
    /// # Errors
    /// `Io` if the file cannot be opened for appending.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        tracing::debug!(path = %path.display(), "opened audit log");
        Ok(Self {
            path,
            writer: Mutex::new(file),
        })
    }

    /// Log file location
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AuditLog for JsonlAuditLog {
    fn append(&self, event: SupersedingEvent) -> Result<(), StoreError> {
        let line = serde_json::to_string(&event)?;
        let mut file = self.writer.lock();
        writeln!(file, "{line}")?;
        file.flush()?;
        Ok(())
    }

    fn entries(&self) -> Result<Vec<SupersedingEvent>, StoreError> {
        // Hold the writer lock while reading so a concurrent append
        // cannot hand us a torn final line.
        let _guard = self.writer.lock();
        let file = File::open(&self.path)?;
        let reader = BufReader::new(file);
        let mut events = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            events.push(serde_json::from_str(&line)?);
        }
        Ok(events)
    }
}
