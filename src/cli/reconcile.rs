//! # Reconcile Command
//!
//! Command to trigger reconciliation for VisitorsApp resources.

use anyhow::{Context, Result};
use kube::{api::Api, api::Patch, Client};
use serde_json::json;
use std::collections::BTreeMap;
use visitors_operator::constants::RECONCILE_ANNOTATION;
use visitors_operator::crd::VisitorsApp;

/// Trigger reconciliation by adding/updating an annotation
///
/// The annotation change is an ordinary watch event, so the controller
/// picks it up like any other update.
pub async fn reconcile_command(
    client: Client,
    name: String,
    namespace: Option<String>,
) -> Result<()> {
    let ns = namespace.as_deref().unwrap_or("default");
    let api: Api<VisitorsApp> = Api::namespaced(client, ns);

    println!("🔄 Triggering reconciliation for VisitorsApp '{ns}/{name}'...");

    api.get(&name)
        .await
        .with_context(|| format!("Failed to get VisitorsApp '{ns}/{name}'"))?;

    let timestamp = chrono::Utc::now().timestamp().to_string();
    let annotations = BTreeMap::from([(RECONCILE_ANNOTATION.to_string(), timestamp.clone())]);
    let patch = json!({
        "metadata": {
            "annotations": annotations
        }
    });

    api.patch(&name, &kube::api::PatchParams::default(), &Patch::Merge(patch))
        .await
        .with_context(|| format!("Failed to trigger reconciliation for VisitorsApp '{ns}/{name}'"))?;

    println!("✅ Reconciliation triggered successfully");
    println!("   Resource: {ns}/{name}");
    println!("   Annotation: {RECONCILE_ANNOTATION}={timestamp}");
    println!("\nThe controller will reconcile this resource shortly.");

    Ok(())
}
