//! Visitors Operator Library
//!
//! This library provides the core functionality for the Visitors Operator, a
//! Kubernetes controller that converges the three-tier Visitors application
//! (MySQL, backend service, web frontend) toward a `VisitorsApp` resource.
//!
//! ## Quick Start
//!
//! ```rust
//! use visitors_operator::prelude::*;
//! ```
//!
//! This brings commonly used types and traits into scope. For more specific imports,
//! use the individual modules.

pub mod config;
pub mod constants;
pub mod controller;
pub mod crd;
pub mod observability;
pub mod prelude;
pub mod runtime;
pub mod store;
