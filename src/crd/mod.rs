//! # Custom Resource Definitions
//!
//! CRD types for the Visitors Operator.
//!
//! ## Module Structure
//!
//! - `spec.rs` - `VisitorsApp` specification and default values
//! - `status.rs` - Status fields recorded by the reconciler

mod spec;
mod status;

pub use spec::{default_title, VisitorsApp, VisitorsAppSpec};
pub use status::{StatusField, VisitorsAppStatus};
