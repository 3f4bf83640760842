//! # Tiers
//!
//! The three layers of a Visitors deployment. Declaration order is both
//! creation order and readiness dependency order.

use crate::crd::{StatusField, VisitorsAppSpec};
use crate::store::ResourceKind;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Tier {
    Persistence,
    Backend,
    Frontend,
}

impl Tier {
    pub const ALL: [Tier; 3] = [Tier::Persistence, Tier::Backend, Tier::Frontend];

    /// Value of the `tier` label and the suffix of derived object names
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Tier::Persistence => "mysql",
            Tier::Backend => "backend",
            Tier::Frontend => "frontend",
        }
    }

    /// Capitalised name used in stage names and log output
    #[must_use]
    pub fn title(self) -> &'static str {
        match self {
            Tier::Persistence => "Persistence",
            Tier::Backend => "Backend",
            Tier::Frontend => "Frontend",
        }
    }

    /// Kinds owned by the tier, in the order they are ensured
    #[must_use]
    pub fn resources(self) -> &'static [ResourceKind] {
        match self {
            Tier::Persistence => &[
                ResourceKind::Secret,
                ResourceKind::Deployment,
                ResourceKind::Service,
            ],
            Tier::Backend | Tier::Frontend => &[ResourceKind::Deployment, ResourceKind::Service],
        }
    }

    /// Replica count the tier's workload is created with and corrected to
    #[must_use]
    pub fn desired_replicas(self, spec: &VisitorsAppSpec) -> i32 {
        match self {
            Tier::Persistence | Tier::Frontend => 1,
            Tier::Backend => spec.size,
        }
    }

    /// Ready replicas the tier needs before it counts as ready
    #[must_use]
    pub fn required_ready(self, spec: &VisitorsAppSpec) -> i32 {
        self.desired_replicas(spec)
    }

    /// Status field recording the tier's deployed image, if any
    #[must_use]
    pub fn status_field(self) -> Option<StatusField> {
        match self {
            Tier::Persistence => None,
            Tier::Backend => Some(StatusField::BackendImage),
            Tier::Frontend => Some(StatusField::FrontendImage),
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(size: i32) -> VisitorsAppSpec {
        VisitorsAppSpec {
            size,
            title: "t".to_string(),
        }
    }

    #[test]
    fn test_only_backend_scales_with_size() {
        let spec = spec(4);
        assert_eq!(Tier::Persistence.desired_replicas(&spec), 1);
        assert_eq!(Tier::Backend.desired_replicas(&spec), 4);
        assert_eq!(Tier::Frontend.desired_replicas(&spec), 1);
    }

    #[test]
    fn test_persistence_owns_the_secret() {
        assert!(Tier::Persistence
            .resources()
            .contains(&ResourceKind::Secret));
        assert!(!Tier::Backend.resources().contains(&ResourceKind::Secret));
        assert!(!Tier::Frontend.resources().contains(&ResourceKind::Secret));
    }

    #[test]
    fn test_tiers_are_ordered_by_dependency() {
        let mut sorted = Tier::ALL;
        sorted.sort();
        assert_eq!(sorted, Tier::ALL);
    }
}
