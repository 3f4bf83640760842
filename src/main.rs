//! # Visitors Operator
//!
//! A Kubernetes controller that runs the three-tier Visitors application
//! described by `VisitorsApp` resources.
//!
//! ## Overview
//!
//! For every `VisitorsApp` the controller:
//!
//! 1. **Deploys MySQL** - a credentials Secret, a single-replica Deployment and a headless Service
//! 2. **Waits for MySQL** - nothing else is created until the database reports ready
//! 3. **Deploys the backend** - `spec.size` replicas behind a NodePort Service
//! 4. **Deploys the frontend** - one replica behind a NodePort Service, titled `spec.title`
//! 5. **Keeps replica counts in line** - scaled-away workloads are scaled back
//!
//! Every object is owned by its `VisitorsApp`, so deleting the app deletes
//! the whole deployment.
//!
//! ## Features
//!
//! - **Multi-namespace**: Watches `VisitorsApp` resources across all namespaces
//! - **Prometheus metrics**: Exposes metrics for monitoring and observability
//! - **Health probes**: HTTP endpoints for liveness and readiness checks

use anyhow::Result;
use visitors_operator::runtime::{initialize, run_watch_loop};

#[tokio::main]
async fn main() -> Result<()> {
    let init = initialize().await?;

    run_watch_loop(
        init.client,
        init.reconciler,
        init.server_state,
        init.controller_config,
    )
    .await
}
