//! # Runtime
//!
//! Controller bootstrap and the watch loop that drives reconciliation.
//!
//! - `initialization`: rustls, tracing, metrics, probe server, client
//! - `watch_loop`: the kube-runtime controller and its restart loop
//! - `error_policy`: requeue decisions for failed passes and watch errors

pub mod error_policy;
pub mod initialization;
pub mod watch_loop;

pub use initialization::{init_tracing, initialize, InitializationResult};
pub use watch_loop::run_watch_loop;
