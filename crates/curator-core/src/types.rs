//! Core types for the coordinator
//!
//! Defines the ephemeral (never persisted) types shared across components:
//! - Lifecycle states and recommendations
//! - Consultation results
//! - Coordinator configuration and authorization

use chrono::{DateTime, Utc};
use curator_registry::{AgentId, Topic};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Derived lifecycle state of a topic
///
/// Never stored; always recomputed from the latest read because staleness
/// is time-relative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    /// Topic has never been claimed
    Unowned,
    /// Authoritative artifact exists and is within its freshness window
    Fresh,
    /// Authoritative artifact is older than the freshness requirement
    Stale,
    /// `authority_path` is set but the artifact cannot be located
    Missing,
}

impl std::fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Unowned => "unowned",
            Self::Fresh => "fresh",
            Self::Stale => "stale",
            Self::Missing => "missing",
        };
        write!(f, "{s}")
    }
}

/// Pre-execution recommendation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    /// No authority exists; produce content and claim the topic after
    Proceed,
    /// Fresh authority owned by someone else; do not duplicate it
    AvoidDuplication,
    /// Content exists but the requester cannot act unilaterally
    CoordinateRequired,
    /// Requester should refresh or repoint the existing authority
    UpdateExisting,
    /// Owner of fresh content; ambiguous, defer to the decision tree
    ConsiderNecessity,
}

impl std::fmt::Display for Recommendation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Proceed => "proceed",
            Self::AvoidDuplication => "avoid_duplication",
            Self::CoordinateRequired => "coordinate_required",
            Self::UpdateExisting => "update_existing",
            Self::ConsiderNecessity => "consider_necessity",
        };
        write!(f, "{s}")
    }
}

/// Pointer to the current authority, as seen at consultation time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExistingKnowledge {
    /// Current authoritative artifact
    pub authority_path: String,
    /// When it was last superseded
    pub last_updated: Option<DateTime<Utc>>,
}

/// Ownership metadata echoed back to the consulting agent
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OwnershipStatus {
    /// Primary owner, if any
    pub primary_owner: Option<AgentId>,
    /// Registered secondary owners
    pub secondary_owners: BTreeSet<AgentId>,
}

impl OwnershipStatus {
    /// Extract the ownership view of a topic record
    #[must_use]
    pub fn of(topic: &Topic) -> Self {
        Self {
            primary_owner: topic.primary_owner.clone(),
            secondary_owners: topic.secondary_owners.clone(),
        }
    }
}

/// Result of a pre-execution consultation (ephemeral, not persisted)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsultationResult {
    /// The recommendation the decision table produced
    pub recommendation: Recommendation,
    /// Lifecycle state the table matched on
    pub state: LifecycleState,
    /// Current authority, if one exists
    pub existing_knowledge: Option<ExistingKnowledge>,
    /// Ownership metadata at consultation time
    pub ownership_status: OwnershipStatus,
    /// Names the matched decision-table rule
    pub rationale: String,
}

/// Authorization context for ownership reassignment
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Authorizer {
    /// A regular agent; must be the topic's current primary owner
    Agent(AgentId),
    /// Administrative override
    Admin,
}

impl Authorizer {
    /// The agent behind this authorization, if any
    #[inline]
    #[must_use]
    pub fn agent(&self) -> Option<&AgentId> {
        match self {
            Self::Agent(a) => Some(a),
            Self::Admin => None,
        }
    }
}

/// Coordinator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoordinatorConfig {
    /// Freshness requirement for topics created by `claim_unowned`
    pub default_freshness_days: i64,
    /// How many audit entries the dashboard's recent-activity view shows
    pub recent_activity_limit: usize,
}

impl CoordinatorConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With default freshness requirement
    #[inline]
    #[must_use]
    pub fn with_default_freshness_days(mut self, days: i64) -> Self {
        self.default_freshness_days = days;
        self
    }

    /// With recent-activity limit
    #[inline]
    #[must_use]
    pub fn with_recent_activity_limit(mut self, limit: usize) -> Self {
        self.recent_activity_limit = limit;
        self
    }
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            default_freshness_days: 30,
            recent_activity_limit: 10,
        }
    }
}
