//! Persistent data model for the coordinator
//!
//! Defines the records the Registry Store owns:
//! - Topics and their ownership metadata
//! - Superseding events (audit trail)
//! - Archive records for retired artifacts

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use ulid::Ulid;

/// External agent identifier
///
/// Agents are external processes; their identifiers are opaque strings
/// chosen by the integration, not allocated here.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentId(pub String);

impl AgentId {
    /// Create new agent ID
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the identifier as a string slice
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for AgentId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for AgentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique audit event identifier (ULID for sortability)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EventId(pub Ulid);

impl EventId {
    /// Generate new event ID
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Ownership-change note kept alongside a topic record
///
/// Claims and reassignments record their justification here, not in the
/// main audit log (which is reserved for supersessions).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnershipNote {
    /// Agent that performed the change
    pub agent: AgentId,
    /// Free-text justification
    pub note: String,
    /// When the change happened
    pub at: DateTime<Utc>,
}

/// Topic record: the unit of knowledge ownership
///
/// # Invariants
/// - At most one `authority_path` at any instant
/// - `primary_owner` is `None` iff the topic has never been claimed
/// - Lifecycle state is derived from this record, never stored
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    /// Unique topic name
    pub name: String,
    /// Exclusive owner, empty if unowned
    pub primary_owner: Option<AgentId>,
    /// Agents with collaborative (non-exclusive) rights
    #[serde(default)]
    pub secondary_owners: BTreeSet<AgentId>,
    /// Location of the single current authoritative artifact
    pub authority_path: Option<String>,
    /// Every path that was previously the topic's authority, oldest first
    #[serde(default)]
    pub prior_authorities: Vec<String>,
    /// Days before the authoritative artifact is considered stale
    pub freshness_requirement_days: i64,
    /// Timestamp of the most recent successful supersession
    pub last_updated: Option<DateTime<Utc>>,
    /// Claim/reassignment history
    #[serde(default)]
    pub ownership_notes: Vec<OwnershipNote>,
}

impl Topic {
    /// Create a new, never-claimed topic record
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>, freshness_requirement_days: i64) -> Self {
        Self {
            name: name.into(),
            primary_owner: None,
            secondary_owners: BTreeSet::new(),
            authority_path: None,
            prior_authorities: Vec::new(),
            freshness_requirement_days,
            last_updated: None,
            ownership_notes: Vec::new(),
        }
    }

    /// Check whether the topic has never been claimed
    #[inline]
    #[must_use]
    pub fn is_unowned(&self) -> bool {
        self.primary_owner.is_none()
    }

    /// Check whether `agent` is the primary owner
    #[inline]
    #[must_use]
    pub fn is_primary(&self, agent: &AgentId) -> bool {
        self.primary_owner.as_ref() == Some(agent)
    }

    /// Check whether `agent` is a registered secondary owner
    #[inline]
    #[must_use]
    pub fn is_secondary(&self, agent: &AgentId) -> bool {
        self.secondary_owners.contains(agent)
    }

    /// Relationship of `agent` to this topic
    #[must_use]
    pub fn relationship(&self, agent: &AgentId) -> OwnershipRelation {
        if self.is_primary(agent) {
            OwnershipRelation::Primary
        } else if self.is_secondary(agent) {
            OwnershipRelation::Secondary
        } else {
            OwnershipRelation::None
        }
    }

    /// Check whether `path` is the current authority or was one previously
    #[must_use]
    pub fn was_authority(&self, path: &str) -> bool {
        self.authority_path.as_deref() == Some(path)
            || self.prior_authorities.iter().any(|p| p == path)
    }
}

/// Relationship between an agent and a topic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OwnershipRelation {
    /// Agent is the primary owner
    Primary,
    /// Agent is a secondary owner
    Secondary,
    /// Agent holds no ownership
    None,
}

impl std::fmt::Display for OwnershipRelation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Primary => "primary",
            Self::Secondary => "secondary",
            Self::None => "none",
        };
        write!(f, "{s}")
    }
}

/// Immutable record of one supersession transaction
///
/// Once appended to the audit log these are never mutated or removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupersedingEvent {
    /// Unique, sortable event identifier
    pub event_id: EventId,
    /// Agent that performed the supersession
    pub requesting_agent: AgentId,
    /// Topic the artifact belongs to
    pub topic: String,
    /// Path installed as the new authority
    pub new_authority_path: String,
    /// Paths retired by this event, in the order the caller listed them
    pub superseded_paths: Vec<String>,
    /// Free-text reason supplied by the caller
    pub reason: String,
    /// Commit timestamp
    pub timestamp: DateTime<Utc>,
    /// One archive record per superseded path
    pub archives: Vec<ArchiveRecord>,
}

/// Archive record for one superseded artifact
///
/// Created only as a side effect of a [`SupersedingEvent`]; never
/// independently created or deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveRecord {
    /// Where the artifact lived before retirement
    pub original_path: String,
    /// Where the archived copy lives
    pub archived_path: String,
    /// Back-reference to the supersession that retired it
    pub event_id: EventId,
    /// When the copy was made
    pub archived_at: DateTime<Utc>,
}
