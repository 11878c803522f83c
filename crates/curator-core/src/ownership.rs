//! Ownership manager
//!
//! Claim, assignment, and collaboration advisory over the registry store.
//! Exclusivity is enforced by the store's conditional writes: a claim or
//! reassignment that loses a race surfaces as `VersionConflict` instead
//! of silently overwriting the winner.

use crate::error::CoordinatorError;
use crate::types::{Authorizer, CoordinatorConfig};
use chrono::Utc;
use curator_registry::{AgentId, OwnershipNote, RegistryStore, StoreError, Topic, Versioned};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;

/// How a non-owner can participate on a topic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollaborationKind {
    /// Requester already holds write-adjacent rights
    SecondaryOwner,
    /// Requester holds no rights and must coordinate
    ExternalContributor,
}

/// Read-side advisory for agents that cannot act unilaterally
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollaborationSuggestion {
    /// Relationship the suggestion assumes
    pub kind: CollaborationKind,
    /// Candidate collaboration modes, most direct first
    pub approaches: Vec<String>,
}

/// Claim / assign / advise operations over topic ownership
#[derive(Clone)]
pub struct OwnershipManager {
    store: Arc<dyn RegistryStore>,
    config: CoordinatorConfig,
}

impl OwnershipManager {
    /// Create a manager over `store`
    #[must_use]
    pub fn new(store: Arc<dyn RegistryStore>, config: CoordinatorConfig) -> Self {
        Self { store, config }
    }

    /// Claim a topic that has no primary owner
    ///
    /// Creates the record if the topic was never registered. The claim
    /// succeeds only if `primary_owner` is empty at claim time, enforced
    /// through the store's conditional put.
    ///
    /// # Errors
    /// `AlreadyOwned` if a primary owner exists; `VersionConflict` if a
    /// competing claim won the race (safe to retry after re-reading).
    pub fn claim_unowned(
        &self,
        topic: &str,
        agent: &AgentId,
        justification: &str,
    ) -> Result<Versioned<Topic>, CoordinatorError> {
        let note = OwnershipNote {
            agent: agent.clone(),
            note: justification.to_string(),
            at: Utc::now(),
        };

        let (mut record, expected) = match self.store.get(topic) {
            Ok(versioned) => {
                if let Some(owner) = &versioned.record.primary_owner {
                    return Err(CoordinatorError::AlreadyOwned {
                        topic: topic.to_string(),
                        owner: owner.clone(),
                    });
                }
                (versioned.record, Some(versioned.version))
            }
            Err(StoreError::NotFound(_)) => (
                Topic::new(topic, self.config.default_freshness_days),
                None,
            ),
            Err(other) => return Err(other.into()),
        };

        record.primary_owner = Some(agent.clone());
        record.ownership_notes.push(note);

        let version = self
            .store
            .put_if_version(topic, record.clone(), expected)
            .map_err(|e| CoordinatorError::from_store(e, topic))?;

        tracing::info!(topic, agent = %agent, "topic claimed");
        Ok(Versioned { record, version })
    }

    /// Reassign primary and secondary ownership
    ///
    /// Only the current primary owner or an administrative override may
    /// reassign. This is the sole exclusivity control.
    ///
    /// # Errors
    /// `Unauthorized` if the authorizer is neither; `NotFound` if the
    /// topic does not exist; `VersionConflict` on a concurrent mutation.
    pub fn assign(
        &self,
        topic: &str,
        new_primary: &AgentId,
        new_secondaries: BTreeSet<AgentId>,
        authorizer: &Authorizer,
    ) -> Result<Versioned<Topic>, CoordinatorError> {
        let versioned = self
            .store
            .get(topic)
            .map_err(|e| CoordinatorError::from_store(e, topic))?;
        let mut record = versioned.record;

        match authorizer {
            Authorizer::Admin => {}
            Authorizer::Agent(agent) => {
                if !record.is_primary(agent) {
                    return Err(CoordinatorError::Unauthorized {
                        agent: agent.clone(),
                        topic: topic.to_string(),
                        action: "reassign ownership".to_string(),
                    });
                }
            }
        }

        let note = match authorizer.agent() {
            Some(agent) => OwnershipNote {
                agent: agent.clone(),
                note: format!("reassigned primary to {new_primary}"),
                at: Utc::now(),
            },
            None => OwnershipNote {
                agent: new_primary.clone(),
                note: "assigned by administrative override".to_string(),
                at: Utc::now(),
            },
        };

        record.primary_owner = Some(new_primary.clone());
        record.secondary_owners = new_secondaries;
        record.ownership_notes.push(note);

        let version = self
            .store
            .put_if_version(topic, record.clone(), Some(versioned.version))
            .map_err(|e| CoordinatorError::from_store(e, topic))?;

        tracing::info!(topic, new_primary = %new_primary, "ownership reassigned");
        Ok(Versioned { record, version })
    }

    /// Advise an agent on how to contribute to a topic it does not own
    ///
    /// Pure read-side logic; mutates nothing.
    ///
    /// # Errors
    /// `NotFound` if the topic does not exist.
    pub fn suggest_collaboration(
        &self,
        agent: &AgentId,
        topic: &str,
    ) -> Result<CollaborationSuggestion, CoordinatorError> {
        let record = self
            .store
            .get(topic)
            .map_err(|e| CoordinatorError::from_store(e, topic))?
            .record;

        if record.is_primary(agent) || record.is_secondary(agent) {
            return Ok(CollaborationSuggestion {
                kind: CollaborationKind::SecondaryOwner,
                approaches: vec![
                    "contribute directly: you already hold write-adjacent rights".to_string(),
                    "coordinate scope with the primary owner before superseding".to_string(),
                ],
            });
        }

        let mut approaches = Vec::new();
        if record.is_unowned() {
            approaches.push("topic is unowned: claim it before producing content".to_string());
        } else {
            let owner = record
                .primary_owner
                .as_ref()
                .map_or_else(String::new, ToString::to_string);
            approaches.push(format!("request secondary ownership from {owner}"));
            approaches.push("propose a complementary scope instead of overlapping".to_string());
            approaches.push(format!("request a primary handoff from {owner}"));
        }

        Ok(CollaborationSuggestion {
            kind: CollaborationKind::ExternalContributor,
            approaches,
        })
    }
}

impl std::fmt::Debug for OwnershipManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OwnershipManager")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
