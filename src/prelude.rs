//! # Prelude
//!
//! Re-exports commonly used types and traits for convenience.
//!
//! ## Usage
//!
//! ```rust
//! use visitors_operator::prelude::*;
//! ```
//!
//! This brings into scope:
//! - The CRD types (`VisitorsApp`, `VisitorsAppSpec`, `VisitorsAppStatus`)
//! - The cluster store trait and its two implementations
//! - Reconciler types (`Reconciler`, `ReconcilerError`, `Verdict`, ...)
//! - Config types (`ControllerConfig`, `ServerConfig`, `ManifestConfig`)

// CRD types - most commonly used
pub use crate::crd::*;

// Store - the reconciler's view of the cluster
pub use crate::store::{
    ClusterStore, KubeClusterStore, ManagedResource, MemoryClusterStore, Mutation, ObjectKey,
    ResourceKind, StoreError,
};

// Reconciler types - core controller functionality
pub use crate::controller::reconciler::{
    reconcile, reconcile_app, BackoffState, ManifestBuilder, Reconciler, ReconcilerError, Stage,
    Tier, Verdict,
};

// Config types - for configuration management
pub use crate::config::{ControllerConfig, ManifestConfig, ServerConfig};
