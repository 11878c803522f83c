//! Curator Core
//!
//! Topic ownership arbitration and content lifecycle coordination for
//! independent producer agents.
//!
//! # Core Concepts
//!
//! - [`Coordinator`]: the unified API producers and tooling call
//! - [`Consultant`]: pre-execution decision table (may I write on topic X?)
//! - [`DecisionTree`]: scope-overlap nuance for fresh-and-owned topics
//! - [`OwnershipManager`]: claim / assign / collaboration advisory
//! - [`SupersedingWorkflow`]: atomic retire-archive-install-audit transaction
//! - [`ConflictDetector`] / [`Dashboard`]: read-only health surfaces
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use curator_core::{Coordinator, CoordinatorConfig, Recommendation};
//! use curator_registry::{AgentId, MemoryArchive, MemoryAuditLog, MemoryRegistry};
//!
//! let coordinator = Coordinator::new(
//!     Arc::new(MemoryRegistry::new()),
//!     Arc::new(MemoryAuditLog::new()),
//!     Arc::new(MemoryArchive::new()),
//!     CoordinatorConfig::default(),
//! );
//!
//! let agent = AgentId::from("analyst-1");
//! let result = coordinator.consult(&agent, "pricing-model", "q3 pricing").unwrap();
//! assert_eq!(result.recommendation, Recommendation::Proceed);
//! ```

#![warn(unreachable_pub)]

mod conflict;
mod consultant;
mod coordinator;
mod dashboard;
mod decision;
mod error;
mod freshness;
mod ownership;
mod supersede;
mod types;

pub use conflict::{ConflictDetector, ConflictKind, ConflictReport};
pub use consultant::{decide, Consultant};
pub use coordinator::Coordinator;
pub use dashboard::{Dashboard, DashboardSummary, TopicDetail, TopicHealth};
pub use decision::{scope_overlap, DecisionTree, OverlapPolicy, ScopeAdvice, ScopeDecision};
pub use error::CoordinatorError;
pub use freshness::{age_days, lifecycle_state};
pub use ownership::{CollaborationKind, CollaborationSuggestion, OwnershipManager};
pub use supersede::SupersedingWorkflow;
pub use types::{
    Authorizer, ConsultationResult, CoordinatorConfig, ExistingKnowledge, LifecycleState,
    OwnershipStatus, Recommendation,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
