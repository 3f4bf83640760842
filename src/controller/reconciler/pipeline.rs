//! # Pipeline
//!
//! The ordered list of stages a reconcile pass walks through. The list is
//! fixed; each pass re-derives everything it needs from the cluster.

use super::Tier;
use crate::store::ResourceKind;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Create the tier's object of this kind if it is absent
    Ensure(Tier, ResourceKind),
    /// Stop the pass until the tier's workload is ready
    AwaitReady(Tier),
    /// Record the tier's image on the owning app
    RecordStatus(Tier),
    /// Correct the tier's replica count
    CorrectDrift(Tier),
}

const PIPELINE: [Stage; 12] = [
    Stage::Ensure(Tier::Persistence, ResourceKind::Secret),
    Stage::Ensure(Tier::Persistence, ResourceKind::Deployment),
    Stage::Ensure(Tier::Persistence, ResourceKind::Service),
    Stage::AwaitReady(Tier::Persistence),
    Stage::Ensure(Tier::Backend, ResourceKind::Deployment),
    Stage::Ensure(Tier::Backend, ResourceKind::Service),
    Stage::RecordStatus(Tier::Backend),
    Stage::CorrectDrift(Tier::Backend),
    Stage::Ensure(Tier::Frontend, ResourceKind::Deployment),
    Stage::Ensure(Tier::Frontend, ResourceKind::Service),
    Stage::RecordStatus(Tier::Frontend),
    Stage::CorrectDrift(Tier::Frontend),
];

/// Stages run after the owning app has been fetched and validated
#[must_use]
pub fn pipeline() -> &'static [Stage] {
    &PIPELINE
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Ensure(tier, kind) => write!(f, "Ensure{}{}", tier.title(), kind.role()),
            Stage::AwaitReady(tier) => write!(f, "Await{}Ready", tier.title()),
            Stage::RecordStatus(tier) => write!(f, "Record{}Status", tier.title()),
            Stage::CorrectDrift(tier) => write!(f, "Correct{}Drift", tier.title()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_names() {
        let names: Vec<String> = pipeline().iter().map(ToString::to_string).collect();
        assert_eq!(
            names,
            vec![
                "EnsurePersistenceSecret",
                "EnsurePersistenceWorkload",
                "EnsurePersistenceService",
                "AwaitPersistenceReady",
                "EnsureBackendWorkload",
                "EnsureBackendService",
                "RecordBackendStatus",
                "CorrectBackendDrift",
                "EnsureFrontendWorkload",
                "EnsureFrontendService",
                "RecordFrontendStatus",
                "CorrectFrontendDrift",
            ]
        );
    }

    #[test]
    fn test_every_tier_resource_is_ensured_in_tier_order() {
        let ensured: Vec<(Tier, ResourceKind)> = pipeline()
            .iter()
            .filter_map(|stage| match stage {
                Stage::Ensure(tier, kind) => Some((*tier, *kind)),
                _ => None,
            })
            .collect();
        let expected: Vec<(Tier, ResourceKind)> = Tier::ALL
            .iter()
            .flat_map(|tier| tier.resources().iter().map(move |kind| (*tier, *kind)))
            .collect();
        assert_eq!(ensured, expected);
    }

    #[test]
    fn test_backend_waits_for_persistence() {
        let gate = pipeline()
            .iter()
            .position(|s| *s == Stage::AwaitReady(Tier::Persistence))
            .unwrap();
        let first_backend = pipeline()
            .iter()
            .position(|s| matches!(s, Stage::Ensure(Tier::Backend, _)))
            .unwrap();
        assert!(gate < first_backend);
    }
}
