//! Pre-execution consultant
//!
//! Before producing content on a topic, an agent asks here. The decision
//! table below is the single source of truth for recommendation
//! semantics: evaluated in order, first match wins, and every
//! state × ownership combination maps to exactly one outcome.
//!
//! | state   | relationship      | recommendation       |
//! |---------|-------------------|----------------------|
//! | unowned | any               | proceed              |
//! | missing | any               | update_existing      |
//! | stale   | primary/secondary | update_existing      |
//! | stale   | none              | coordinate_required  |
//! | fresh   | primary           | consider_necessity   |
//! | fresh   | secondary         | coordinate_required  |
//! | fresh   | none              | avoid_duplication    |

use crate::error::CoordinatorError;
use crate::freshness;
use crate::types::{
    ConsultationResult, ExistingKnowledge, LifecycleState, OwnershipStatus, Recommendation,
};
use chrono::{DateTime, Utc};
use curator_registry::{
    AgentId, ArtifactProbe, OwnershipRelation, RegistryStore, StoreError, Topic,
};
use std::sync::Arc;

/// Pre-execution consultation over the registry
#[derive(Clone)]
pub struct Consultant {
    store: Arc<dyn RegistryStore>,
    probe: Arc<dyn ArtifactProbe>,
}

impl Consultant {
    /// Create a consultant reading from `store` and probing via `probe`
    #[must_use]
    pub fn new(store: Arc<dyn RegistryStore>, probe: Arc<dyn ArtifactProbe>) -> Self {
        Self { store, probe }
    }

    /// Consult before producing content on `topic`
    ///
    /// `scope` is the caller's declared scope text; the consultant records
    /// it for the rationale but does not interpret it. Scope comparison
    /// belongs to the decision tree.
    ///
    /// # Errors
    /// `Storage` on a persistence failure. An absent topic is not an
    /// error: it is treated as unowned.
    pub fn consult(
        &self,
        agent: &AgentId,
        topic: &str,
        scope: &str,
    ) -> Result<ConsultationResult, CoordinatorError> {
        self.consult_at(agent, topic, scope, Utc::now())
    }

    /// [`Consultant::consult`] with an injected clock, for deterministic evaluation
    ///
    /// # Errors
    /// `Storage` on a persistence failure.
    pub fn consult_at(
        &self,
        agent: &AgentId,
        topic: &str,
        _scope: &str,
        now: DateTime<Utc>,
    ) -> Result<ConsultationResult, CoordinatorError> {
        let record = match self.store.get(topic) {
            Ok(versioned) => versioned.record,
            // Never registered: same as an unowned topic.
            Err(StoreError::NotFound(_)) => Topic::new(topic, 0),
            Err(other) => return Err(other.into()),
        };

        let state = freshness::lifecycle_state(&record, now, self.probe.as_ref());
        let relationship = record.relationship(agent);
        let (recommendation, rationale) = decide(state, relationship);

        tracing::debug!(
            topic,
            agent = %agent,
            state = %state,
            relationship = %relationship,
            recommendation = %recommendation,
            "consultation"
        );

        Ok(ConsultationResult {
            recommendation,
            state,
            existing_knowledge: record.authority_path.as_ref().map(|path| ExistingKnowledge {
                authority_path: path.clone(),
                last_updated: record.last_updated,
            }),
            ownership_status: OwnershipStatus::of(&record),
            rationale: rationale.to_string(),
        })
    }
}

impl std::fmt::Debug for Consultant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Consultant").finish_non_exhaustive()
    }
}

/// The decision table: total over state × relationship, first match wins
///
/// Returns the recommendation and a rationale naming the matched rule.
#[must_use]
pub fn decide(
    state: LifecycleState,
    relationship: OwnershipRelation,
) -> (Recommendation, &'static str) {
    match (state, relationship) {
        (LifecycleState::Unowned, _) => (
            Recommendation::Proceed,
            "unowned: no authority exists; claim the topic after producing content",
        ),
        (LifecycleState::Missing, _) => (
            Recommendation::UpdateExisting,
            "missing: authority path points at nothing; recreate or repoint it",
        ),
        (LifecycleState::Stale, OwnershipRelation::Primary | OwnershipRelation::Secondary) => (
            Recommendation::UpdateExisting,
            "stale + owner: refresh the authority you hold rights on",
        ),
        (LifecycleState::Stale, OwnershipRelation::None) => (
            Recommendation::CoordinateRequired,
            "stale + non-owner: content is out of date but owned by someone else",
        ),
        (LifecycleState::Fresh, OwnershipRelation::Primary) => (
            Recommendation::ConsiderNecessity,
            "fresh + primary: content is current; consult the decision tree on scope",
        ),
        (LifecycleState::Fresh, OwnershipRelation::Secondary) => (
            Recommendation::CoordinateRequired,
            "fresh + secondary: coordinate with the primary owner before acting",
        ),
        (LifecycleState::Fresh, OwnershipRelation::None) => (
            Recommendation::AvoidDuplication,
            "fresh + non-owner: current authority exists; reference it instead",
        ),
    }
}
