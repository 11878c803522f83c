//! Superseding workflow
//!
//! The one write path that retires artifacts: validate, archive, install
//! the new authority via a conditional write, then append the audit
//! entry. Any precondition failure or lost race aborts with no visible
//! effect. Archived copies made before an abort are orphaned and
//! harmless because nothing committed references them.

use crate::error::CoordinatorError;
use chrono::Utc;
use curator_registry::{
    AgentId, ArchiveStorage, AuditLog, EventId, RegistryStore, SupersedingEvent,
};
use std::sync::Arc;

/// Atomic supersession over registry, archive, and audit log
#[derive(Clone)]
pub struct SupersedingWorkflow {
    store: Arc<dyn RegistryStore>,
    audit: Arc<dyn AuditLog>,
    archive: Arc<dyn ArchiveStorage>,
}

impl SupersedingWorkflow {
    /// Create a workflow over the given collaborators
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

    /// Replace the topic's authority with `new_path`, retiring `superseded_paths`
    ///
    /// # Preconditions (checked, any failure aborts with no side effects)
    /// - `agent` is the primary or a registered secondary owner of `topic`
    /// - every superseded path is the current authority or a recorded
    ///   prior authority of `topic`
    ///
    /// An empty `superseded_paths` installs the first artifact on a
    /// claimed topic.
    ///
    /// # Transaction
    /// 1. Archive each superseded path (abort on failure; copies already
    ///    made are orphans, invisible to readers)
    /// 2. Conditionally write the new topic record (abort with
    ///    `VersionConflict` if a concurrent writer won; caller re-consults)
    /// 3. Append the [`SupersedingEvent`]. This is the durability
    ///    boundary; if the append fails the registry write is rolled back.
    ///
    /// # Errors
    /// `NotFound`, `Unauthorized`, `PreconditionFailed`, `VersionConflict`
    /// or `Storage`, each leaving the committed state unchanged.
    pub fn declare_superseding(
        &self,
        agent: &AgentId,
        topic: &str,
        new_path: &str,
        superseded_paths: &[String],
        reason: &str,
    ) -> Result<SupersedingEvent, CoordinatorError> {
        let versioned = self
            .store
            .get(topic)
            .map_err(|e| CoordinatorError::from_store(e, topic))?;
        let prior_record = versioned.record.clone();
        let mut record = versioned.record;

        if !record.is_primary(agent) && !record.is_secondary(agent) {
            return Err(CoordinatorError::Unauthorized {
                agent: agent.clone(),
                topic: topic.to_string(),
                action: "declare superseding".to_string(),
            });
        }

        for path in superseded_paths {
            if !record.was_authority(path) {
                return Err(CoordinatorError::PreconditionFailed(format!(
                    "{path} is not a current or prior authority of topic {topic}"
                )));
            }
        }

        let event_id = EventId::new();
        let now = Utc::now();

        // Step 1: archive. A failure here aborts before anything is
        // written to the registry or the log.
        let destination = format!(
            "{}/{}/{}/{}",
            now.format("%Y-%m-%d"),
            agent,
            topic,
            event_id
        );
        let mut archives = Vec::with_capacity(superseded_paths.len());
        for path in superseded_paths {
            let archived = self.archive.archive(path, &destination, event_id)?;
            archives.push(archived);
        }

        // Step 2: construct and conditionally install the new record.
        if let Some(old) = record.authority_path.replace(new_path.to_string()) {
            record.prior_authorities.push(old);
        }
        record.last_updated = Some(now);

        let new_version = self
            .store
            .put_if_version(topic, record, Some(versioned.version))
            .map_err(|e| CoordinatorError::from_store(e, topic))?;

        // Step 3: the audit append is the durability boundary.
        let event = SupersedingEvent {
            event_id,
            requesting_agent: agent.clone(),
            topic: topic.to_string(),
            new_authority_path: new_path.to_string(),
            superseded_paths: superseded_paths.to_vec(),
            reason: reason.to_string(),
            timestamp: now,
            archives,
        };

        if let Err(append_err) = self.audit.append(event.clone()) {
            // Without the audit entry the transaction never happened:
            // restore the pre-transaction record.
            if let Err(rollback_err) =
                self.store
                    .put_if_version(topic, prior_record, Some(new_version))
            {
                tracing::error!(
                    topic,
                    error = %rollback_err,
                    "registry rollback failed after audit append failure"
                );
            }
            return Err(CoordinatorError::Storage(append_err));
        }

        tracing::info!(
            topic,
            agent = %agent,
            event = %event_id,
            new_authority = new_path,
            superseded = superseded_paths.len(),
            "supersession committed"
        );
        Ok(event)
    }
}

impl std::fmt::Debug for SupersedingWorkflow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupersedingWorkflow").finish_non_exhaustive()
    }
}
