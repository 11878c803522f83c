//! Curator Registry
//!
//! Durable, versioned storage for the topic ownership coordinator.
//!
//! # Core Concepts
//!
//! - [`Topic`]: the unit of knowledge ownership (single authoritative artifact)
//! - [`RegistryStore`]: keyed topic records behind versioned conditional writes
//! - [`AuditLog`]: strictly ordered, append-only [`SupersedingEvent`] sequence
//! - [`ArchiveStorage`]: copy-with-metadata primitive for retired artifacts
//!
//! Optimistic concurrency is the serialization mechanism: every mutation is
//! a read-modify-write conditioned on an unchanged version token, and a
//! losing writer receives [`StoreError::VersionConflict`] instead of
//! silently clobbering the winner.

#![warn(unreachable_pub)]

mod archive;
mod audit;
mod error;
mod record;
mod store;

pub use archive::{ArchiveStorage, ArtifactProbe, FsArchive, MemoryArchive};
pub use audit::{AuditLog, JsonlAuditLog, MemoryAuditLog};
pub use error::StoreError;
pub use record::{
    AgentId, ArchiveRecord, EventId, OwnershipNote, OwnershipRelation, SupersedingEvent, Topic,
};
pub use store::{JsonRegistry, MemoryRegistry, RegistryStore, Versioned};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
