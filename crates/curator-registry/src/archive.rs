//! Archival storage collaborator
//!
//! The superseding workflow retires artifacts through the
//! copy-with-metadata primitive defined here. Archived copies carry a
//! sidecar record so an aborted transaction's orphans can be enumerated
//! and the operation reversed manually.

use crate::error::StoreError;
use crate::record::{ArchiveRecord, EventId};
use chrono::Utc;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// File-existence probe for authoritative artifacts
///
/// Freshness evaluation and conflict detection use this to decide whether
/// an `authority_path` still points at a real artifact.
pub trait ArtifactProbe: Send + Sync {
    /// Check whether the artifact at `path` can be located
    fn exists(&self, path: &str) -> bool;
}

/// Copy/move-with-metadata primitive plus archive enumeration
pub trait ArchiveStorage: ArtifactProbe {
    /// Copy the artifact at `path` to `destination` (relative to the
    /// archive root) and record the retirement
    ///
    /// # Errors
    /// `Io` if the source cannot be read or the copy cannot be written;
    /// nothing is recorded on failure.
    fn archive(
        &self,
        path: &str,
        destination: &str,
        event_id: EventId,
    ) -> Result<ArchiveRecord, StoreError>;

    /// Enumerate every archive record ever written
    ///
    /// Used by the conflict detector to find archives whose event never
    /// committed.
    fn records(&self) -> Result<Vec<ArchiveRecord>, StoreError>;
}

/// Filesystem archive rooted at a directory
///
/// Each archived artifact lands at `<root>/<destination>/<filename>` with
/// a `meta.json` sidecar holding its [`ArchiveRecord`].
#[derive(Debug)]
pub struct FsArchive {
    root: PathBuf,
}

impl FsArchive {
    /// Create an archive rooted at `root`
    #[inline]
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Archive root directory
    #[inline]
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ArtifactProbe for FsArchive {
    fn exists(&self, path: &str) -> bool {
        Path::new(path).exists()
    }
}

impl ArchiveStorage for FsArchive {
    fn archive(
        &self,
        path: &str,
        destination: &str,
        event_id: EventId,
    ) -> Result<ArchiveRecord, StoreError> {
        let source = Path::new(path);
        let file_name = source
            .file_name()
            .ok_or_else(|| StoreError::NotFound(path.to_string()))?;

        let dest_dir = self.root.join(destination);
        fs::create_dir_all(&dest_dir)?;

        let archived_path = dest_dir.join(file_name);
        fs::copy(source, &archived_path)?;

        let record = ArchiveRecord {
            original_path: path.to_string(),
            archived_path: archived_path.to_string_lossy().into_owned(),
            event_id,
            archived_at: Utc::now(),
        };

        let sidecar = dest_dir.join(format!(
            "{}.meta.json",
            file_name.to_string_lossy()
        ));
        fs::write(&sidecar, serde_json::to_string_pretty(&record)?)?;

        tracing::info!(
            original = path,
            archived = %archived_path.display(),
            event = %event_id,
            "archived artifact"
        );
        Ok(record)
    }

    fn records(&self) -> Result<Vec<ArchiveRecord>, StoreError> {
        let mut records = Vec::new();
        if !self.root.exists() {
            return Ok(records);
        }
        collect_sidecars(&self.root, &mut records)?;
        records.sort_by(|a, b| a.event_id.cmp(&b.event_id));
        Ok(records)
    }
}

/// Recursively gather `*.meta.json` sidecars under `dir`
fn collect_sidecars(dir: &Path, out: &mut Vec<ArchiveRecord>) -> Result<(), StoreError> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            collect_sidecars(&path, out)?;
        } else if path
            .file_name()
            .is_some_and(|n| n.to_string_lossy().ends_with(".meta.json"))
        {
            let data = fs::read_to_string(&path)?;
            out.push(serde_json::from_str(&data)?);
        }
    }
    Ok(())
}

/// In-memory archive backend for tests and embedded use
///
/// Sources must be registered with [`MemoryArchive::mark_existing`];
/// archiving an unregistered path fails the way a missing file would.
#[derive(Debug, Default)]
pub struct MemoryArchive {
    existing: Mutex<HashSet<String>>,
    archived: Mutex<Vec<ArchiveRecord>>,
}

impl MemoryArchive {
    /// Create new empty archive
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `path` as a locatable artifact
    pub fn mark_existing(&self, path: impl Into<String>) {
        self.existing.lock().insert(path.into());
    }

    /// Remove `path` from the set of locatable artifacts
    pub fn mark_missing(&self, path: &str) {
        self.existing.lock().remove(path);
    }
}

impl ArtifactProbe for MemoryArchive {
    fn exists(&self, path: &str) -> bool {
        self.existing.lock().contains(path)
    }
}

impl ArchiveStorage for MemoryArchive {
    fn archive(
        &self,
        path: &str,
        destination: &str,
        event_id: EventId,
    ) -> Result<ArchiveRecord, StoreError> {
        if !self.exists(path) {
            return Err(StoreError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("source artifact missing: {path}"),
            )));
        }

        let record = ArchiveRecord {
            original_path: path.to_string(),
            archived_path: format!("{destination}/{path}"),
            event_id,
            archived_at: Utc::now(),
        };
        self.archived.lock().push(record.clone());
        Ok(record)
    }

    fn records(&self) -> Result<Vec<ArchiveRecord>, StoreError> {
        Ok(self.archived.lock().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_archive_requires_existing_source() {
        let archive = MemoryArchive::new();
        let result = archive.archive("reports/old.md", "dest", EventId::new());
        assert!(matches!(result, Err(StoreError::Io(_))));
        assert!(archive.records().unwrap().is_empty());
    }

    #[test]
    fn memory_archive_records_retirement() {
        let archive = MemoryArchive::new();
        archive.mark_existing("reports/old.md");

        let id = EventId::new();
        let record = archive.archive("reports/old.md", "dest", id).unwrap();
        assert_eq!(record.original_path, "reports/old.md");
        assert_eq!(record.event_id, id);
        assert_eq!(archive.records().unwrap().len(), 1);
    }

    #[test]
    fn fs_archive_copies_and_enumerates() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("old.md");
        fs::write(&source, "superseded content").unwrap();

        let archive = FsArchive::new(dir.path().join("archive"));
        let id = EventId::new();
        let record = archive
            .archive(&source.to_string_lossy(), "2026-01-01/alpha/pricing", id)
            .unwrap();

        assert!(Path::new(&record.archived_path).exists());
        assert!(archive.exists(&source.to_string_lossy()));

        let records = archive.records().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].event_id, id);
    }

    #[test]
    fn fs_archive_missing_source_fails_cleanly() {
        let dir = tempfile::tempdir().unwrap();
        let archive = FsArchive::new(dir.path().join("archive"));

        let result = archive.archive(
            &dir.path().join("absent.md").to_string_lossy(),
            "dest",
            EventId::new(),
        );
        assert!(matches!(result, Err(StoreError::Io(_))));
        assert!(archive.records().unwrap().is_empty());
    }
}
