//! # CRD Generator
//!
//! Generates the Kubernetes CustomResourceDefinition YAML for `VisitorsApp`
//! from the Rust type definitions.
//!
//! ## Usage
//!
//! ```bash
//! # Generate CRD YAML
//! cargo run --bin crdgen > config/crd/visitorsapp.yaml
//!
//! # Generate and apply directly
//! cargo run --bin crdgen | kubectl apply -f -
//! ```

use anyhow::{Context, Result};
use kube::core::CustomResourceExt;
use visitors_operator::crd::VisitorsApp;

fn main() -> Result<()> {
    let yaml =
        serde_yaml::to_string(&VisitorsApp::crd()).context("Failed to serialize CRD to YAML")?;
    print!("{yaml}");
    Ok(())
}
