//! Registry Store: versioned, conditionally-written topic records
//!
//! All mutation goes through optimistic concurrency control: callers read
//! a record and its version, compute the replacement, and submit it
//! conditioned on the version being unchanged. A losing writer receives
//! [`StoreError::VersionConflict`] and must re-read. This is the only
//! serialization mechanism, so competing agents can never both win a
//! claim or a supersession.

use crate::error::StoreError;
use crate::record::Topic;
use dashmap::DashMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// A record paired with its optimistic-concurrency version token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Versioned<T> {
    /// The stored record
    pub record: T,
    /// Version token; increments on every successful conditional put
    pub version: u64,
}

/// Durable keyed collection of topic records
///
/// `put_if_version` with `expected = None` creates the key and fails with
/// `VersionConflict` if it already exists; `expected = Some(v)` replaces
/// the record only if its version is still `v`.
pub trait RegistryStore: Send + Sync {
    /// Read a topic record and its version
    ///
    /// # Errors
    /// `NotFound` if the topic was never stored.
    fn get(&self, topic: &str) -> Result<Versioned<Topic>, StoreError>;

    /// Conditionally write a topic record
    ///
    /// Returns the new version on success.
    ///
    /// # Errors
    /// `VersionConflict` if the stored version differs from `expected`
    /// (or the key already exists when `expected` is `None`).
    fn put_if_version(
        &self,
        topic: &str,
        record: Topic,
        expected: Option<u64>,
    ) -> Result<u64, StoreError>;

    /// List all stored topic records
    fn list(&self) -> Result<Vec<Versioned<Topic>>, StoreError>;
}

/// In-memory registry backend
///
/// The conditional put happens under the map's shard entry lock, so the
/// compare and the swap are a single atomic step.
#[derive(Debug, Default)]
pub struct MemoryRegistry {
    topics: DashMap<String, Versioned<Topic>>,
}

impl MemoryRegistry {
    /// Create new empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl RegistryStore for MemoryRegistry {
    fn get(&self, topic: &str) -> Result<Versioned<Topic>, StoreError> {
        self.topics
            .get(topic)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| StoreError::NotFound(topic.to_string()))
    }

    fn put_if_version(
        &self,
        topic: &str,
        record: Topic,
        expected: Option<u64>,
    ) -> Result<u64, StoreError> {
        use dashmap::mapref::entry::Entry;

        match self.topics.entry(topic.to_string()) {
            Entry::Occupied(mut occupied) => {
                let current = occupied.get().version;
                if expected == Some(current) {
                    let next = current + 1;
                    occupied.insert(Versioned {
                        record,
                        version: next,
                    });
                    Ok(next)
                } else {
                    Err(StoreError::VersionConflict(topic.to_string()))
                }
            }
            Entry::Vacant(vacant) => {
                if expected.is_some() {
                    return Err(StoreError::VersionConflict(topic.to_string()));
                }
                vacant.insert(Versioned { record, version: 1 });
                Ok(1)
            }
        }
    }

    fn list(&self) -> Result<Vec<Versioned<Topic>>, StoreError> {
        let mut records: Vec<Versioned<Topic>> = self
            .topics
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        records.sort_by(|a, b| a.record.name.cmp(&b.record.name));
        Ok(records)
    }
}

/// Durable registry backend persisted as a single JSON snapshot
///
/// The whole map is held in memory behind one lock; every successful
/// conditional put rewrites the snapshot through a temp file + rename,
/// so readers never observe a half-written state. A persistence failure
/// rolls the in-memory change back and is fatal to the calling operation.
#[derive(Debug)]
pub struct JsonRegistry {
    path: PathBuf,
    topics: RwLock<HashMap<String, Versioned<Topic>>>,
}

impl JsonRegistry {
    /// Open a registry at `path`, loading the snapshot if one exists
    ///
    /// # Errors
    /// `Io` if the file cannot be read, `Serde` if it cannot be decoded.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let topics = if path.exists() {
            let data = fs::read_to_string(&path)?;
            serde_json::from_str(&data)?
        } else {
            HashMap::new()
        };
        tracing::debug!(path = %path.display(), "opened topic registry");
        Ok(Self {
            path,
            topics: RwLock::new(topics),
        })
    }

    /// Write the snapshot atomically (temp file + rename)
    fn persist(&self, topics: &HashMap<String, Versioned<Topic>>) -> Result<(), StoreError> {
        let data = serde_json::to_string_pretty(topics)?;
        let tmp = self.path.with_extension("json.tmp");
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&tmp, data)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    /// Snapshot file location
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RegistryStore for JsonRegistry {
    fn get(&self, topic: &str) -> Result<Versioned<Topic>, StoreError> {
        self.topics
            .read()
            .get(topic)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(topic.to_string()))
    }

    fn put_if_version(
        &self,
        topic: &str,
        record: Topic,
        expected: Option<u64>,
    ) -> Result<u64, StoreError> {
        let mut topics = self.topics.write();

        let prior = topics.get(topic).cloned();
        let next = match (&prior, expected) {
            (Some(existing), Some(v)) if existing.version == v => v + 1,
            (None, None) => 1,
            _ => return Err(StoreError::VersionConflict(topic.to_string())),
        };

        topics.insert(
            topic.to_string(),
            Versioned {
                record,
                version: next,
            },
        );

        if let Err(e) = self.persist(&topics) {
            // Disk is the source of truth: undo the in-memory change so
            // memory and snapshot never diverge.
            match prior {
                Some(old) => topics.insert(topic.to_string(), old),
                None => topics.remove(topic),
            };
            return Err(e);
        }

        Ok(next)
    }

    fn list(&self) -> Result<Vec<Versioned<Topic>>, StoreError> {
        let mut records: Vec<Versioned<Topic>> = self.topics.read().values().cloned().collect();
        records.sort_by(|a, b| a.record.name.cmp(&b.record.name));
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn topic(name: &str) -> Topic {
        Topic::new(name, 7)
    }

    #[test]
    fn memory_get_missing_is_not_found() {
        let store = MemoryRegistry::new();
        assert!(matches!(
            store.get("pricing-model"),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn memory_create_then_get() {
        let store = MemoryRegistry::new();
        let v = store
            .put_if_version("pricing-model", topic("pricing-model"), None)
            .unwrap();
        assert_eq!(v, 1);

        let read = store.get("pricing-model").unwrap();
        assert_eq!(read.version, 1);
        assert_eq!(read.record.name, "pricing-model");
    }

    #[test]
    fn memory_create_twice_conflicts() {
        let store = MemoryRegistry::new();
        store
            .put_if_version("pricing-model", topic("pricing-model"), None)
            .unwrap();
        let second = store.put_if_version("pricing-model", topic("pricing-model"), None);
        assert!(matches!(second, Err(StoreError::VersionConflict(_))));
    }

    #[test]
    fn memory_stale_version_conflicts() {
        let store = MemoryRegistry::new();
        store
            .put_if_version("pricing-model", topic("pricing-model"), None)
            .unwrap();
        store
            .put_if_version("pricing-model", topic("pricing-model"), Some(1))
            .unwrap();

        // Writer still holding version 1 must lose.
        let stale = store.put_if_version("pricing-model", topic("pricing-model"), Some(1));
        assert!(matches!(stale, Err(StoreError::VersionConflict(_))));
    }

    #[test]
    fn memory_concurrent_creates_single_winner() {
        let store = std::sync::Arc::new(MemoryRegistry::new());
        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = std::sync::Arc::clone(&store);
            handles.push(std::thread::spawn(move || {
                store.put_if_version("pricing-model", topic("pricing-model"), None)
            }));
        }

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let wins = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(wins, 1);
        assert!(results
            .iter()
            .filter(|r| r.is_err())
            .all(|r| matches!(r, Err(StoreError::VersionConflict(_)))));
    }

    #[test]
    fn memory_list_sorted_by_name() {
        let store = MemoryRegistry::new();
        store.put_if_version("zeta", topic("zeta"), None).unwrap();
        store.put_if_version("alpha", topic("alpha"), None).unwrap();

        let names: Vec<String> = store
            .list()
            .unwrap()
            .into_iter()
            .map(|v| v.record.name)
            .collect();
        assert_eq!(names, vec!["alpha".to_string(), "zeta".to_string()]);
    }

    #[test]
    fn json_registry_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("registry.json");

        {
            let store = JsonRegistry::open(&path).unwrap();
            store
                .put_if_version("pricing-model", topic("pricing-model"), None)
                .unwrap();
            store
                .put_if_version("churn-analysis", topic("churn-analysis"), None)
                .unwrap();
        }

        let reopened = JsonRegistry::open(&path).unwrap();
        let read = reopened.get("pricing-model").unwrap();
        assert_eq!(read.version, 1);
        assert_eq!(reopened.list().unwrap().len(), 2);
    }

    #[test]
    fn json_registry_conditional_semantics() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonRegistry::open(dir.path().join("registry.json")).unwrap();

        let v1 = store
            .put_if_version("pricing-model", topic("pricing-model"), None)
            .unwrap();
        let v2 = store
            .put_if_version("pricing-model", topic("pricing-model"), Some(v1))
            .unwrap();
        assert_eq!(v2, 2);

        let stale = store.put_if_version("pricing-model", topic("pricing-model"), Some(v1));
        assert!(matches!(stale, Err(StoreError::VersionConflict(_))));
    }
}
