//! The coordinator facade
//!
//! One cohesive API over the registry, ownership arbitration,
//! consultation, supersession, and reporting. The original system ran one
//! script per verb; everything is unified here so the CLI and producer
//! integrations stay thin adapters.
//!
//! # Control flow
//! An agent consults before producing content, optionally asks the
//! decision tree for scope nuance, and after producing content either
//! claims the topic (first artifact on an unowned topic) or declares a
//! supersession. The dashboard and conflict detector run read-only at
//! any time.

use crate::conflict::{ConflictDetector, ConflictReport};
use crate::consultant::Consultant;
use crate::dashboard::{Dashboard, DashboardSummary, TopicDetail};
use crate::decision::{DecisionTree, OverlapPolicy, ScopeAdvice};
use crate::error::CoordinatorError;
use crate::ownership::{CollaborationSuggestion, OwnershipManager};
use crate::supersede::SupersedingWorkflow;
use crate::types::{Authorizer, ConsultationResult, CoordinatorConfig};
use chrono::{DateTime, Utc};
use curator_registry::{
    AgentId, ArchiveStorage, ArtifactProbe, AuditLog, RegistryStore, SupersedingEvent, Topic,
    Versioned,
};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Topic ownership and content lifecycle coordinator
///
/// Holds every component by explicit reference; there is no ambient
/// global state and no lock beyond the store's own conditional writes.
pub struct Coordinator {
    config: CoordinatorConfig,
    store: Arc<dyn RegistryStore>,
    consultant: Consultant,
    decision_tree: DecisionTree,
    ownership: OwnershipManager,
    workflow: SupersedingWorkflow,
    detector: ConflictDetector,
    dashboard: Dashboard,
}

impl Coordinator {
    /// Create a coordinator over concrete storage collaborators
    ///
    /// `archive` serves double duty as the artifact-existence probe.
    #[must_use]
    pub fn new<A>(
        store: Arc<dyn RegistryStore>,
        audit: Arc<dyn AuditLog>,
        archive: Arc<A>,
        config: CoordinatorConfig,
    ) -> Self
    where
        A: ArchiveStorage + 'static,
    {
        let probe: Arc<dyn ArtifactProbe> = Arc::clone(&archive) as Arc<dyn ArtifactProbe>;
        let archive: Arc<dyn ArchiveStorage> = archive;

        Self {
            consultant: Consultant::new(Arc::clone(&store), Arc::clone(&probe)),
            decision_tree: DecisionTree::new(),
            ownership: OwnershipManager::new(Arc::clone(&store), config.clone()),
            workflow: SupersedingWorkflow::new(
                Arc::clone(&store),
                Arc::clone(&audit),
                Arc::clone(&archive),
            ),
            detector: ConflictDetector::new(
                Arc::clone(&store),
                Arc::clone(&audit),
                Arc::clone(&archive),
            ),
            dashboard: Dashboard::new(
                Arc::clone(&store),
                audit,
                probe,
                config.recent_activity_limit,
            ),
            store,
            config,
        }
    }

    /// Use a custom overlap policy for the decision tree
    #[inline]
    #[must_use]
    pub fn with_overlap_policy(mut self, policy: OverlapPolicy) -> Self {
        self.decision_tree = DecisionTree::with_policy(policy);
        self
    }

    /// Consult before producing content on `topic`
    ///
    /// # Errors
    /// `Storage` on persistence failure.
    pub fn consult(
        &self,
        agent: &AgentId,
        topic: &str,
        scope: &str,
    ) -> Result<ConsultationResult, CoordinatorError> {
        self.consultant.consult(agent, topic, scope)
    }

    /// Consult with an injected clock
    ///
    /// # Errors
    /// `Storage` on persistence failure.
    pub fn consult_at(
        &self,
        agent: &AgentId,
        topic: &str,
        scope: &str,
        now: DateTime<Utc>,
    ) -> Result<ConsultationResult, CoordinatorError> {
        self.consultant.consult_at(agent, topic, scope, now)
    }

    /// Scope nuance for `consider_necessity` consultations
    #[must_use]
    pub fn decide_scope(
        &self,
        scope_description: &str,
        existing_scope: Option<&str>,
        force_new: bool,
    ) -> ScopeAdvice {
        self.decision_tree
            .decide(scope_description, existing_scope, force_new)
    }

    /// Claim an unowned topic after producing its first content
    ///
    /// # Errors
    /// `AlreadyOwned` or `VersionConflict` per the ownership manager.
    pub fn claim(
        &self,
        topic: &str,
        agent: &AgentId,
        justification: &str,
    ) -> Result<Versioned<Topic>, CoordinatorError> {
        self.ownership.claim_unowned(topic, agent, justification)
    }

    /// Reassign ownership
    ///
    /// # Errors
    /// `Unauthorized`, `NotFound`, or `VersionConflict`.
    pub fn assign(
        &self,
        topic: &str,
        new_primary: &AgentId,
        new_secondaries: BTreeSet<AgentId>,
        authorizer: &Authorizer,
    ) -> Result<Versioned<Topic>, CoordinatorError> {
        self.ownership
            .assign(topic, new_primary, new_secondaries, authorizer)
    }

    /// Advise a non-owner on collaboration modes
    ///
    /// # Errors
    /// `NotFound` if the topic does not exist.
    pub fn suggest_collaboration(
        &self,
        agent: &AgentId,
        topic: &str,
    ) -> Result<CollaborationSuggestion, CoordinatorError> {
        self.ownership.suggest_collaboration(agent, topic)
    }

    /// Retire old artifacts and install a new authority, atomically
    ///
    /// # Errors
    /// See [`SupersedingWorkflow::declare_superseding`].
    pub fn declare_superseding(
        &self,
        agent: &AgentId,
        topic: &str,
        new_path: &str,
        superseded_paths: &[String],
        reason: &str,
    ) -> Result<SupersedingEvent, CoordinatorError> {
        self.workflow
            .declare_superseding(agent, topic, new_path, superseded_paths, reason)
    }

    /// List all topic records
    ///
    /// # Errors
    /// `Storage` if the registry cannot be listed.
    pub fn list_topics(&self) -> Result<Vec<Versioned<Topic>>, CoordinatorError> {
        Ok(self.store.list()?)
    }

    /// Aggregate health report
    ///
    /// # Errors
    /// `Storage` on persistence failure.
    pub fn dashboard_summary(&self) -> Result<DashboardSummary, CoordinatorError> {
        self.dashboard.summary()
    }

    /// Health report at an injected time
    ///
    /// # Errors
    /// `Storage` on persistence failure.
    pub fn dashboard_summary_at(
        &self,
        now: DateTime<Utc>,
    ) -> Result<DashboardSummary, CoordinatorError> {
        self.dashboard.summary_at(now)
    }

    /// Full view of one topic
    ///
    /// # Errors
    /// `NotFound` if the topic does not exist.
    pub fn topic_detail(&self, topic: &str) -> Result<TopicDetail, CoordinatorError> {
        self.dashboard.topic_detail(topic)
    }

    /// Scan for contradictions across registry, archive, and log
    ///
    /// # Errors
    /// `Storage` on persistence failure.
    pub fn detect_conflicts(
        &self,
        known_agents: &BTreeSet<AgentId>,
    ) -> Result<Vec<ConflictReport>, CoordinatorError> {
        self.detector.detect(known_agents)
    }

    /// Get configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }
}

impl std::fmt::Debug for Coordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Coordinator")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{LifecycleState, Recommendation};
    use curator_registry::{MemoryArchive, MemoryAuditLog, MemoryRegistry};

    fn coordinator() -> (Coordinator, Arc<MemoryArchive>) {
        let archive = Arc::new(MemoryArchive::new());
        let coordinator = Coordinator::new(
            Arc::new(MemoryRegistry::new()) as Arc<dyn RegistryStore>,
            Arc::new(MemoryAuditLog::new()) as Arc<dyn AuditLog>,
            Arc::clone(&archive),
            CoordinatorConfig::new().with_default_freshness_days(7),
        );
        (coordinator, archive)
    }

    #[test]
    fn consult_claim_supersede_cycle() {
        let (coordinator, archive) = coordinator();
        let alpha = AgentId::from("alpha");

        let consult = coordinator.consult(&alpha, "pricing-model", "pricing").unwrap();
        assert_eq!(consult.recommendation, Recommendation::Proceed);

        coordinator.claim("pricing-model", &alpha, "first analysis").unwrap();

        archive.mark_existing("reports/v1.md");
        coordinator
            .declare_superseding(&alpha, "pricing-model", "reports/v1.md", &[], "initial")
            .unwrap();

        let detail = coordinator.topic_detail("pricing-model").unwrap();
        assert_eq!(detail.record.authority_path.as_deref(), Some("reports/v1.md"));
        assert_eq!(detail.state, LifecycleState::Fresh);
        assert_eq!(detail.history.len(), 1);
    }

    #[test]
    fn list_topics_through_facade() {
        let (coordinator, _) = coordinator();
        coordinator
            .claim("pricing-model", &AgentId::from("alpha"), "claim")
            .unwrap();
        coordinator
            .claim("churn-analysis", &AgentId::from("beta"), "claim")
            .unwrap();

        let topics = coordinator.list_topics().unwrap();
        assert_eq!(topics.len(), 2);
    }

    #[test]
    fn decide_scope_passthrough() {
        let (coordinator, _) = coordinator();
        let advice = coordinator.decide_scope(
            "pricing model analysis",
            Some("pricing model analysis for q3"),
            false,
        );
        assert_eq!(
            advice.decision,
            crate::decision::ScopeDecision::ReferenceExisting
        );
    }
}
