//! Dashboard and health reporting
//!
//! Read-only aggregation over the registry and audit log. No write path
//! exists here at all.

use crate::error::CoordinatorError;
use crate::freshness;
use crate::types::LifecycleState;
use chrono::{DateTime, Utc};
use curator_registry::{
    AgentId, ArtifactProbe, AuditLog, RegistryStore, SupersedingEvent, Topic,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Per-topic row in the dashboard
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicHealth {
    /// Topic name
    pub name: String,
    /// Derived lifecycle state at report time
    pub state: LifecycleState,
    /// Primary owner, if any
    pub primary_owner: Option<AgentId>,
    /// Current authority, if any
    pub authority_path: Option<String>,
    /// Last supersession time
    pub last_updated: Option<DateTime<Utc>>,
}

/// Aggregate registry health
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSummary {
    /// When the report was computed
    pub generated_at: DateTime<Utc>,
    /// Number of registered topics
    pub total_topics: usize,
    /// Topics currently fresh
    pub fresh: usize,
    /// Topics currently stale
    pub stale: usize,
    /// Topics whose authority cannot be located
    pub missing: usize,
    /// Topics never claimed
    pub unowned: usize,
    /// Fraction of topics in the fresh state (1.0 for an empty registry)
    pub health_score: f64,
    /// One row per topic, sorted by name
    pub topics: Vec<TopicHealth>,
    /// Most recent audit activity, oldest first
    pub recent_events: Vec<SupersedingEvent>,
}

/// Full view of one topic
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicDetail {
    /// The stored record
    pub record: Topic,
    /// Its current version token
    pub version: u64,
    /// Derived lifecycle state at report time
    pub state: LifecycleState,
    /// Every superseding event recorded for this topic, oldest first
    pub history: Vec<SupersedingEvent>,
}

/// Read-only reporting over registry and audit log
#[derive(Clone)]
pub struct Dashboard {
    store: Arc<dyn RegistryStore>,
    audit: Arc<dyn AuditLog>,
    probe: Arc<dyn ArtifactProbe>,
    recent_limit: usize,
}

impl Dashboard {
    /// Create a dashboard showing at most `recent_limit` recent events
    #[must_use]
    pub fn new(
        store: Arc<dyn RegistryStore>,
        audit: Arc<dyn AuditLog>,
        probe: Arc<dyn ArtifactProbe>,
        recent_limit: usize,
    ) -> Self {
        Self {
            store,
            audit,
            probe,
            recent_limit,
        }
    }

    /// Aggregate per-topic state and global health at `now`
    ///
    /// # Errors
    /// `Storage` if the registry or log cannot be read.
    pub fn summary_at(&self, now: DateTime<Utc>) -> Result<DashboardSummary, CoordinatorError> {
        let records = self.store.list()?;

        let mut fresh = 0usize;
        let mut stale = 0usize;
        let mut missing = 0usize;
        let mut unowned = 0usize;

        let topics: Vec<TopicHealth> = records
            .iter()
            .map(|versioned| {
                let topic = &versioned.record;
                let state = freshness::lifecycle_state(topic, now, self.probe.as_ref());
                match state {
                    LifecycleState::Fresh => fresh += 1,
                    LifecycleState::Stale => stale += 1,
                    LifecycleState::Missing => missing += 1,
                    LifecycleState::Unowned => unowned += 1,
                }
                TopicHealth {
                    name: topic.name.clone(),
                    state,
                    primary_owner: topic.primary_owner.clone(),
                    authority_path: topic.authority_path.clone(),
                    last_updated: topic.last_updated,
                }
            })
            .collect();

        let total_topics = topics.len();
        let health_score = if total_topics == 0 {
            1.0
        } else {
            fresh as f64 / total_topics as f64
        };

        Ok(DashboardSummary {
            generated_at: now,
            total_topics,
            fresh,
            stale,
            missing,
            unowned,
            health_score,
            topics,
            recent_events: self.audit.tail(self.recent_limit)?,
        })
    }

    /// [`Dashboard::summary_at`] evaluated now
    ///
    /// # Errors
    /// `Storage` if the registry or log cannot be read.
    pub fn summary(&self) -> Result<DashboardSummary, CoordinatorError> {
        self.summary_at(Utc::now())
    }

    /// Full record, derived state, and audit history for one topic
    ///
    /// # Errors
    /// `NotFound` if the topic does not exist.
    pub fn topic_detail(&self, topic: &str) -> Result<TopicDetail, CoordinatorError> {
        let versioned = self
            .store
            .get(topic)
            .map_err(|e| CoordinatorError::from_store(e, topic))?;
        let state =
            freshness::lifecycle_state(&versioned.record, Utc::now(), self.probe.as_ref());

        let history = self
            .audit
            .entries()?
            .into_iter()
            .filter(|event| event.topic == topic)
            .collect();

        Ok(TopicDetail {
            record: versioned.record,
            version: versioned.version,
            state,
            history,
        })
    }
}

impl std::fmt::Debug for Dashboard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dashboard")
            .field("recent_limit", &self.recent_limit)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use curator_registry::{EventId, MemoryArchive, MemoryAuditLog, MemoryRegistry};

    fn dashboard() -> (
        Dashboard,
        Arc<MemoryRegistry>,
        Arc<MemoryAuditLog>,
        Arc<MemoryArchive>,
    ) {
        let store = Arc::new(MemoryRegistry::new());
        let audit = Arc::new(MemoryAuditLog::new());
        let archive = Arc::new(MemoryArchive::new());
        let dashboard = Dashboard::new(
            Arc::clone(&store) as Arc<dyn RegistryStore>,
            Arc::clone(&audit) as Arc<dyn AuditLog>,
            Arc::clone(&archive) as Arc<dyn ArtifactProbe>,
            2,
        );
        (dashboard, store, audit, archive)
    }

    fn seed(
        store: &MemoryRegistry,
        archive: &MemoryArchive,
        name: &str,
        owner: Option<&str>,
        authority: Option<&str>,
        updated_days_ago: i64,
        now: DateTime<Utc>,
    ) {
        let mut topic = Topic::new(name, 7);
        topic.primary_owner = owner.map(AgentId::from);
        topic.authority_path = authority.map(ToString::to_string);
        topic.last_updated = Some(now - Duration::days(updated_days_ago));
        if let Some(path) = authority {
            archive.mark_existing(path);
        }
        store.put_if_version(name, topic, None).unwrap();
    }

    #[test]
    fn empty_registry_is_healthy() {
        let (dashboard, _, _, _) = dashboard();
        let summary = dashboard.summary().unwrap();
        assert_eq!(summary.total_topics, 0);
        assert!((summary.health_score - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn health_score_is_fresh_fraction() {
        let (dashboard, store, _, archive) = dashboard();
        let now = Utc::now();
        seed(&store, &archive, "fresh-topic", Some("alpha"), Some("f.md"), 1, now);
        seed(&store, &archive, "stale-topic", Some("alpha"), Some("s.md"), 30, now);
        seed(&store, &archive, "unowned-topic", None, None, 0, now);
        seed(&store, &archive, "another-fresh", Some("beta"), Some("a.md"), 2, now);

        let summary = dashboard.summary_at(now).unwrap();
        assert_eq!(summary.total_topics, 4);
        assert_eq!(summary.fresh, 2);
        assert_eq!(summary.stale, 1);
        assert_eq!(summary.unowned, 1);
        assert!((summary.health_score - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn recent_events_respect_limit() {
        let (dashboard, _, audit, _) = dashboard();
        for i in 0..5 {
            audit
                .append(SupersedingEvent {
                    event_id: EventId::new(),
                    requesting_agent: AgentId::from("alpha"),
                    topic: "pricing-model".to_string(),
                    new_authority_path: format!("v{i}.md"),
                    superseded_paths: Vec::new(),
                    reason: "refresh".to_string(),
                    timestamp: Utc::now(),
                    archives: Vec::new(),
                })
                .unwrap();
        }

        let summary = dashboard.summary().unwrap();
        assert_eq!(summary.recent_events.len(), 2);
        assert_eq!(summary.recent_events[1].new_authority_path, "v4.md");
    }

    #[test]
    fn topic_detail_filters_history() {
        let (dashboard, store, audit, archive) = dashboard();
        let now = Utc::now();
        seed(&store, &archive, "pricing-model", Some("alpha"), Some("v.md"), 1, now);

        for topic in ["pricing-model", "other-topic", "pricing-model"] {
            audit
                .append(SupersedingEvent {
                    event_id: EventId::new(),
                    requesting_agent: AgentId::from("alpha"),
                    topic: topic.to_string(),
                    new_authority_path: "v.md".to_string(),
                    superseded_paths: Vec::new(),
                    reason: "refresh".to_string(),
                    timestamp: now,
                    archives: Vec::new(),
                })
                .unwrap();
        }

        let detail = dashboard.topic_detail("pricing-model").unwrap();
        assert_eq!(detail.history.len(), 2);
        assert_eq!(detail.state, LifecycleState::Fresh);
        assert_eq!(detail.version, 1);

        assert!(matches!(
            dashboard.topic_detail("ghost"),
            Err(CoordinatorError::NotFound(_))
        ));
    }
}
