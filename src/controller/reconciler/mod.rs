//! # Reconciler
//!
//! Core reconciliation logic for `VisitorsApp` resources.
//!
//! The reconciler converges a Visitors deployment one tier at a time:
//!
//! ## Reconciliation Flow
//!
//! 1. Fetch the `VisitorsApp` (gone means deleted: nothing to do)
//! 2. Validate it
//! 3. Persistence tier: ensure the credentials Secret, the MySQL Deployment
//!    and its headless Service, then wait until MySQL is ready
//! 4. Backend tier: ensure Deployment and Service, record the image in
//!    status, correct the replica count to `spec.size`
//! 5. Frontend tier: the same with a single replica
//!
//! Objects are only ever created when absent. The one field corrected on a
//! live object is a workload's replica count.

mod drift;
mod ensure;
pub mod manifests;
pub mod pipeline;
mod readiness;
pub mod reconcile;
mod status;
pub mod tier;
pub mod types;
mod validation;
pub mod verdict;

// Re-export public API
pub use drift::correct_replicas;
pub use ensure::{ensure, Ensured};
pub use manifests::ManifestBuilder;
pub use pipeline::{pipeline, Stage};
pub use readiness::is_ready;
pub use reconcile::{reconcile, reconcile_app};
pub use status::record_status;
pub use tier::Tier;
pub use types::{BackoffState, Reconciler, ReconcilerError};
pub use validation::validate;
pub use verdict::Verdict;
