//! Error types for the coordinator
//!
//! Every failure is a distinguishable typed result so callers can branch
//! on kind: retry on `VersionConflict`, escalate on `Unauthorized`, create
//! on `NotFound`. Nothing is swallowed into a boolean.

use curator_registry::{AgentId, StoreError};

/// Main coordinator error type
#[derive(Debug, thiserror::Error)]
pub enum CoordinatorError {
    /// Topic or artifact is absent; caller may create
    #[error("topic not found: {0}")]
    NotFound(String),

    /// Claim attempted on a topic that already has a primary owner
    #[error("topic {topic} already owned by {owner}")]
    AlreadyOwned {
        /// The contested topic
        topic: String,
        /// Its current primary owner
        owner: AgentId,
    },

    /// Ownership rule violation; never auto-resolved
    #[error("agent {agent} is not authorized to {action} on topic {topic}")]
    Unauthorized {
        /// The requesting agent
        agent: AgentId,
        /// The topic acted on
        topic: String,
        /// The operation that was refused
        action: String,
    },

    /// Concurrent mutation race; caller must re-read and retry
    #[error("version conflict on topic {0}: re-consult and retry")]
    VersionConflict(String),

    /// Superseding request referenced artifacts the topic does not own
    #[error("precondition failed: {0}")]
    PreconditionFailed(String),

    /// Underlying persistence failure, fatal to the in-flight operation
    #[error("storage error: {0}")]
    Storage(#[from] StoreError),
}

impl CoordinatorError {
    /// Check if the caller should re-read and retry
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::VersionConflict(_))
    }

    /// Process exit code for the CLI surface
    ///
    /// 0 is success; 1 is reserved for storage and unexpected failures.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Storage(_) => 1,
            Self::NotFound(_) => 2,
            Self::AlreadyOwned { .. } => 3,
            Self::Unauthorized { .. } => 4,
            Self::VersionConflict(_) => 5,
            Self::PreconditionFailed(_) => 6,
        }
    }

    /// Re-map store-level signals onto domain variants for `topic`
    ///
    /// The store reports `NotFound`/`VersionConflict` generically; at the
    /// operation boundary they become the caller-facing taxonomy.
    pub(crate) fn from_store(err: StoreError, topic: &str) -> Self {
        match err {
            StoreError::NotFound(_) => Self::NotFound(topic.to_string()),
            StoreError::VersionConflict(_) => Self::VersionConflict(topic.to_string()),
            other => Self::Storage(other),
        }
    }
}
