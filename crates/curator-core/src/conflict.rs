//! Conflict detector
//!
//! Read-only batch scanner comparing registry contents, archive storage,
//! and the audit log to surface contradictions. Never mutates anything.

use crate::error::CoordinatorError;
use curator_registry::{
    AgentId, ArchiveStorage, ArtifactProbe, AuditLog, RegistryStore, Topic, Versioned,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Category of detected contradiction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictKind {
    /// `authority_path` is set but the artifact cannot be located
    MissingAuthorityArtifact,
    /// `authority_path` is set on a topic with no primary owner
    AuthorityWithoutOwner,
    /// The primary owner also appears in the secondary set
    PrimaryListedAsSecondary,
    /// A secondary owner references an agent outside the roster
    UnknownSecondaryAgent,
    /// An archive record's event never committed to the audit log
    OrphanedArchive,
}

impl std::fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::MissingAuthorityArtifact => "missing_authority_artifact",
            Self::AuthorityWithoutOwner => "authority_without_owner",
            Self::PrimaryListedAsSecondary => "primary_listed_as_secondary",
            Self::UnknownSecondaryAgent => "unknown_secondary_agent",
            Self::OrphanedArchive => "orphaned_archive",
        };
        write!(f, "{s}")
    }
}

/// One detected contradiction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictReport {
    /// What kind of contradiction this is
    pub kind: ConflictKind,
    /// The topic involved (empty for archive-level conflicts with no topic)
    pub topic: String,
    /// Human-readable detail
    pub detail: String,
}

/// Ownership-metadata scan over a batch of registry records
pub(crate) fn ownership_conflicts<P: ArtifactProbe + ?Sized>(
    records: &[Versioned<Topic>],
    probe: &P,
    known_agents: &BTreeSet<AgentId>,
) -> Vec<ConflictReport> {
    let mut reports = Vec::new();

    for versioned in records {
        let topic = &versioned.record;

        if let Some(path) = &topic.authority_path {
            if !probe.exists(path) {
                reports.push(ConflictReport {
                    kind: ConflictKind::MissingAuthorityArtifact,
                    topic: topic.name.clone(),
                    detail: format!("authority path {path} cannot be located"),
                });
            }
            if topic.primary_owner.is_none() {
                reports.push(ConflictReport {
                    kind: ConflictKind::AuthorityWithoutOwner,
                    topic: topic.name.clone(),
                    detail: format!("authority path {path} recorded on an unclaimed topic"),
                });
            }
        }

        if let Some(primary) = &topic.primary_owner {
            if topic.secondary_owners.contains(primary) {
                reports.push(ConflictReport {
                    kind: ConflictKind::PrimaryListedAsSecondary,
                    topic: topic.name.clone(),
                    detail: format!("primary owner {primary} also listed as secondary"),
                });
            }
        }

        if !known_agents.is_empty() {
            for secondary in &topic.secondary_owners {
                if !known_agents.contains(secondary) {
                    reports.push(ConflictReport {
                        kind: ConflictKind::UnknownSecondaryAgent,
                        topic: topic.name.clone(),
                        detail: format!("secondary owner {secondary} is not a known agent"),
                    });
                }
            }
        }
    }

    reports
}

/// Read-only scanner across registry, archive, and audit log
#[derive(Clone)]
pub struct ConflictDetector {
    store: Arc<dyn RegistryStore>,
    audit: Arc<dyn AuditLog>,
    archive: Arc<dyn ArchiveStorage>,
}

impl ConflictDetector {
    /// Create a detector over the given collaborators
    #[must_use]
    pub fn new(
        store: Arc<dyn RegistryStore>,
        audit: Arc<dyn AuditLog>,
        archive: Arc<dyn ArchiveStorage>,
    ) -> Self {
        Self {
            store,
            audit,
            archive,
        }
    }

    /// Scan everything: ownership metadata plus orphaned archives
    ///
    /// An empty `known_agents` roster skips the unknown-secondary check.
    ///
    /// # Errors
    /// `Storage` if the registry, log, or archive cannot be read.
    pub fn detect(
        &self,
        known_agents: &BTreeSet<AgentId>,
    ) -> Result<Vec<ConflictReport>, CoordinatorError> {
        let records = self.store.list()?;
        let mut reports = ownership_conflicts(&records, self.archive.as_ref(), known_agents);

        let committed: BTreeSet<_> = self
            .audit
            .entries()?
            .into_iter()
            .map(|event| event.event_id)
            .collect();

        for record in self.archive.records()? {
            if !committed.contains(&record.event_id) {
                reports.push(ConflictReport {
                    kind: ConflictKind::OrphanedArchive,
                    topic: String::new(),
                    detail: format!(
                        "archive of {} (event {}) has no committed superseding event",
                        record.original_path, record.event_id
                    ),
                });
            }
        }

        if !reports.is_empty() {
            tracing::warn!(count = reports.len(), "registry conflicts detected");
        }
        Ok(reports)
    }
}

impl std::fmt::Debug for ConflictDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConflictDetector").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use curator_registry::{EventId, MemoryArchive, MemoryAuditLog, MemoryRegistry};

    fn detector() -> (
        ConflictDetector,
        Arc<MemoryRegistry>,
        Arc<MemoryAuditLog>,
        Arc<MemoryArchive>,
    ) {
        let store = Arc::new(MemoryRegistry::new());
        let audit = Arc::new(MemoryAuditLog::new());
        let archive = Arc::new(MemoryArchive::new());
        let detector = ConflictDetector::new(
            Arc::clone(&store) as Arc<dyn RegistryStore>,
            Arc::clone(&audit) as Arc<dyn AuditLog>,
            Arc::clone(&archive) as Arc<dyn ArchiveStorage>,
        );
        (detector, store, audit, archive)
    }

    #[test]
    fn clean_registry_reports_nothing() {
        let (detector, store, _, archive) = detector();
        let mut topic = Topic::new("pricing-model", 7);
        topic.primary_owner = Some(AgentId::from("alpha"));
        topic.authority_path = Some("v1.md".to_string());
        store.put_if_version("pricing-model", topic, None).unwrap();
        archive.mark_existing("v1.md");

        let reports = detector.detect(&BTreeSet::new()).unwrap();
        assert!(reports.is_empty());
    }

    #[test]
    fn missing_artifact_is_flagged() {
        let (detector, store, _, _) = detector();
        let mut topic = Topic::new("pricing-model", 7);
        topic.primary_owner = Some(AgentId::from("alpha"));
        topic.authority_path = Some("vanished.md".to_string());
        store.put_if_version("pricing-model", topic, None).unwrap();

        let reports = detector.detect(&BTreeSet::new()).unwrap();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].kind, ConflictKind::MissingAuthorityArtifact);
    }

    #[test]
    fn authority_without_owner_is_flagged() {
        let (detector, store, _, archive) = detector();
        let mut topic = Topic::new("pricing-model", 7);
        topic.authority_path = Some("v1.md".to_string());
        store.put_if_version("pricing-model", topic, None).unwrap();
        archive.mark_existing("v1.md");

        let reports = detector.detect(&BTreeSet::new()).unwrap();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].kind, ConflictKind::AuthorityWithoutOwner);
    }

    #[test]
    fn contradictory_ownership_is_flagged() {
        let (detector, store, _, _) = detector();
        let mut topic = Topic::new("pricing-model", 7);
        topic.primary_owner = Some(AgentId::from("alpha"));
        topic.secondary_owners.insert(AgentId::from("alpha"));
        store.put_if_version("pricing-model", topic, None).unwrap();

        let reports = detector.detect(&BTreeSet::new()).unwrap();
        assert!(reports
            .iter()
            .any(|r| r.kind == ConflictKind::PrimaryListedAsSecondary));
    }

    #[test]
    fn unknown_secondary_needs_roster() {
        let (detector, store, _, _) = detector();
        let mut topic = Topic::new("pricing-model", 7);
        topic.primary_owner = Some(AgentId::from("alpha"));
        topic.secondary_owners.insert(AgentId::from("stranger"));
        store.put_if_version("pricing-model", topic, None).unwrap();

        // No roster: the check is skipped.
        assert!(detector.detect(&BTreeSet::new()).unwrap().is_empty());

        let mut roster = BTreeSet::new();
        roster.insert(AgentId::from("alpha"));
        let reports = detector.detect(&roster).unwrap();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].kind, ConflictKind::UnknownSecondaryAgent);
    }

    #[test]
    fn orphaned_archive_is_flagged() {
        let (detector, _, _, archive) = detector();
        archive.mark_existing("old.md");
        // Archive made under an event id that never reached the log.
        archive.archive("old.md", "dest", EventId::new()).unwrap();

        let reports = detector.detect(&BTreeSet::new()).unwrap();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].kind, ConflictKind::OrphanedArchive);
    }
}
