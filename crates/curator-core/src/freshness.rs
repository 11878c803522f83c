//! Freshness evaluator
//!
//! Pure derivation of a topic's lifecycle state from its record, the
//! current time, and an artifact-existence probe. No side effects and no
//! caching: staleness is time-relative and must never be computed from a
//! stored snapshot.

use crate::types::LifecycleState;
use chrono::{DateTime, Utc};
use curator_registry::{ArtifactProbe, Topic};

/// Whole days elapsed between `last_updated` and `now`
#[inline]
#[must_use]
pub fn age_days(now: DateTime<Utc>, last_updated: DateTime<Utc>) -> i64 {
    (now - last_updated).num_days()
}

/// Compute the lifecycle state of `topic` at `now`
///
/// Evaluation order:
/// 1. `Unowned`: no primary owner (never claimed)
/// 2. `Missing`: an authority path is recorded but the probe cannot
///    locate the artifact
/// 3. `Stale`: the authority is older than the freshness requirement,
///    or the topic is owned but has never produced content
/// 4. `Fresh`: otherwise
#[must_use]
pub fn lifecycle_state<P: ArtifactProbe + ?Sized>(
    topic: &Topic,
    now: DateTime<Utc>,
    probe: &P,
) -> LifecycleState {
    if topic.is_unowned() {
        return LifecycleState::Unowned;
    }

    if let Some(path) = &topic.authority_path {
        if !probe.exists(path) {
            return LifecycleState::Missing;
        }
    }

    match (&topic.authority_path, topic.last_updated) {
        (Some(_), Some(updated)) => {
            if age_days(now, updated) > topic.freshness_requirement_days {
                LifecycleState::Stale
            } else {
                LifecycleState::Fresh
            }
        }
        // Claimed but no content yet: the owner still owes an artifact.
        _ => LifecycleState::Stale,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use curator_registry::{AgentId, MemoryArchive};

    fn owned_topic(requirement: i64) -> Topic {
        let mut topic = Topic::new("pricing-model", requirement);
        topic.primary_owner = Some(AgentId::from("alpha"));
        topic
    }

    #[test]
    fn unowned_topic_is_unowned() {
        let probe = MemoryArchive::new();
        let topic = Topic::new("pricing-model", 7);
        assert_eq!(
            lifecycle_state(&topic, Utc::now(), &probe),
            LifecycleState::Unowned
        );
    }

    #[test]
    fn within_requirement_is_fresh() {
        let probe = MemoryArchive::new();
        probe.mark_existing("reports/v1.md");

        let now = Utc::now();
        let mut topic = owned_topic(7);
        topic.authority_path = Some("reports/v1.md".to_string());
        topic.last_updated = Some(now - Duration::days(6));

        assert_eq!(lifecycle_state(&topic, now, &probe), LifecycleState::Fresh);
    }

    #[test]
    fn past_requirement_is_stale() {
        let probe = MemoryArchive::new();
        probe.mark_existing("reports/v1.md");

        let now = Utc::now();
        let mut topic = owned_topic(7);
        topic.authority_path = Some("reports/v1.md".to_string());
        topic.last_updated = Some(now - Duration::days(8));

        assert_eq!(lifecycle_state(&topic, now, &probe), LifecycleState::Stale);
    }

    #[test]
    fn unlocatable_authority_is_missing() {
        let probe = MemoryArchive::new();

        let now = Utc::now();
        let mut topic = owned_topic(7);
        topic.authority_path = Some("reports/vanished.md".to_string());
        topic.last_updated = Some(now);

        assert_eq!(
            lifecycle_state(&topic, now, &probe),
            LifecycleState::Missing
        );
    }

    #[test]
    fn claimed_without_content_is_stale() {
        let probe = MemoryArchive::new();
        let topic = owned_topic(7);
        assert_eq!(
            lifecycle_state(&topic, Utc::now(), &probe),
            LifecycleState::Stale
        );
    }

    #[test]
    fn age_days_is_exact_at_boundary() {
        let now = Utc::now();
        assert_eq!(age_days(now, now - Duration::days(7)), 7);
        // Exactly at the requirement is still fresh: staleness needs age > requirement.
        let probe = MemoryArchive::new();
        probe.mark_existing("reports/v1.md");
        let mut topic = owned_topic(7);
        topic.authority_path = Some("reports/v1.md".to_string());
        topic.last_updated = Some(now - Duration::days(7));
        assert_eq!(lifecycle_state(&topic, now, &probe), LifecycleState::Fresh);
    }
}
