//! Decision tree for fresh-and-owned topics
//!
//! Invoked when a consultation returns `consider_necessity` (or when a
//! caller forces it): the owner holds fresh content, but the proposed
//! scope may differ from what the authority covers. Scope texts are
//! opaque strings supplied by external collaborators; the comparison is
//! a token-overlap heuristic with no semantic claims. The exact scoring
//! is a policy knob. Only the three-way outcome is contractual.
//!
//! The tree is advisory. It never executes anything; the calling agent
//! may override it.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Three-way scope decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeDecision {
    /// High overlap: the existing authority already covers the scope
    ReferenceExisting,
    /// Moderate or unclear overlap: extend the authority via supersession
    UpdateExisting,
    /// Low overlap and explicitly forced: fork into a new artifact
    CreateNew,
}

impl std::fmt::Display for ScopeDecision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::ReferenceExisting => "reference_existing",
            Self::UpdateExisting => "update_existing",
            Self::CreateNew => "create_new",
        };
        write!(f, "{s}")
    }
}

/// Outcome of a decision-tree evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScopeAdvice {
    /// The recommended action
    pub decision: ScopeDecision,
    /// Overlap score in [0, 1] between proposed and existing scope
    pub overlap: f64,
    /// Explanation of how the decision was reached
    pub rationale: String,
}

/// Overlap thresholds (the policy knob)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OverlapPolicy {
    /// At or above this, the existing content suffices
    pub reference_threshold: f64,
    /// At or above this (but below reference), extend the authority
    pub update_threshold: f64,
}

impl Default for OverlapPolicy {
    fn default() -> Self {
        Self {
            reference_threshold: 0.6,
            update_threshold: 0.25,
        }
    }
}

/// Scope-overlap decision tree
#[derive(Debug, Clone, Copy, Default)]
pub struct DecisionTree {
    policy: OverlapPolicy,
}

impl DecisionTree {
    /// Create a tree with the default overlap policy
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a tree with a custom overlap policy
    #[inline]
    #[must_use]
    pub fn with_policy(policy: OverlapPolicy) -> Self {
        Self { policy }
    }

    /// Decide between referencing, updating, or (if forced) forking
    ///
    /// `existing_scope` is the declared scope of the current authority,
    /// if the collaborator recorded one; absence counts as zero overlap.
    /// `CreateNew` is only ever produced when `force_new` is set, since
    /// fresh-and-owned topics must not silently fork.
    #[must_use]
    pub fn decide(
        &self,
        scope_description: &str,
        existing_scope: Option<&str>,
        force_new: bool,
    ) -> ScopeAdvice {
        let overlap = existing_scope
            .map(|existing| scope_overlap(scope_description, existing))
            .unwrap_or(0.0);

        if overlap >= self.policy.reference_threshold {
            return ScopeAdvice {
                decision: ScopeDecision::ReferenceExisting,
                overlap,
                rationale: format!(
                    "overlap {overlap:.2} >= {:.2}: existing authority already covers this scope",
                    self.policy.reference_threshold
                ),
            };
        }

        if overlap >= self.policy.update_threshold {
            return ScopeAdvice {
                decision: ScopeDecision::UpdateExisting,
                overlap,
                rationale: format!(
                    "overlap {overlap:.2} in [{:.2}, {:.2}): extend the current authority",
                    self.policy.update_threshold, self.policy.reference_threshold
                ),
            };
        }

        if force_new {
            return ScopeAdvice {
                decision: ScopeDecision::CreateNew,
                overlap,
                rationale: format!(
                    "overlap {overlap:.2} below {:.2} and force_new set: fork permitted",
                    self.policy.update_threshold
                ),
            };
        }

        ScopeAdvice {
            decision: ScopeDecision::UpdateExisting,
            overlap,
            rationale: format!(
                "overlap {overlap:.2} below {:.2} but force_new not set: \
                 extend the authority rather than silently forking",
                self.policy.update_threshold
            ),
        }
    }
}

/// Containment coefficient over lowercased alphanumeric tokens
///
/// `|A ∩ B| / min(|A|, |B|)`, so a short scope fully contained in a long
/// one still scores 1.0.
#[must_use]
pub fn scope_overlap(a: &str, b: &str) -> f64 {
    let tokens_a = tokenize(a);
    let tokens_b = tokenize(b);
    if tokens_a.is_empty() || tokens_b.is_empty() {
        return 0.0;
    }

    let shared = tokens_a.intersection(&tokens_b).count();
    let smaller = tokens_a.len().min(tokens_b.len());
    shared as f64 / smaller as f64
}

fn tokenize(text: &str) -> BTreeSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}
