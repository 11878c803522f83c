//! Error types for the registry, audit log, and archive backends

/// Storage-layer error type
///
/// `NotFound` and `VersionConflict` are recoverable signals that callers
/// branch on; `Io` and `Serde` are fatal to the in-flight operation and
/// propagated unchanged.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Topic or artifact is absent
    #[error("not found: {0}")]
    NotFound(String),

    /// Conditional write lost a concurrent race
    #[error("version conflict on {0}")]
    VersionConflict(String),

    /// Underlying persistence failure
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// Record could not be encoded or decoded
    #[error("serialization failed: {0}")]
    Serde(#[from] serde_json::Error),
}

impl StoreError {
    /// Check if the error is a concurrency race the caller may retry
    #[inline]
    #[must_use]
    pub fn is_version_conflict(&self) -> bool {
        matches!(self, Self::VersionConflict(_))
    }
}
