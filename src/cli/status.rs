//! # Status Command
//!
//! Shows a VisitorsApp's recorded status and the live state of each tier.

use anyhow::{Context, Result};
use k8s_openapi::api::apps::v1::Deployment;
use kube::{api::Api, Client};
use visitors_operator::config::ManifestConfig;
use visitors_operator::controller::reconciler::{ManifestBuilder, Tier};
use visitors_operator::crd::VisitorsApp;

pub async fn status_command(client: Client, name: String, namespace: Option<String>) -> Result<()> {
    let ns = namespace.as_deref().unwrap_or("default");
    let apps: Api<VisitorsApp> = Api::namespaced(client.clone(), ns);
    let deployments: Api<Deployment> = Api::namespaced(client, ns);

    let app = apps
        .get(&name)
        .await
        .with_context(|| format!("Failed to get VisitorsApp '{ns}/{name}'"))?;

    println!("VisitorsApp: {ns}/{name}");
    println!("  Size:  {}", app.spec.size);
    println!("  Title: {}", app.spec.title);

    let status = app.status.clone().unwrap_or_default();
    println!("\nStatus:");
    println!(
        "  Backend image:  {}",
        status.backend_image.as_deref().unwrap_or("-")
    );
    println!(
        "  Frontend image: {}",
        status.frontend_image.as_deref().unwrap_or("-")
    );

    let config = ManifestConfig::from_env();
    let builder = ManifestBuilder::new(&app, &config)
        .with_context(|| format!("VisitorsApp '{ns}/{name}' cannot be reconciled"))?;

    println!("\n{:<12} {:<28} {:<10} {:<10}", "TIER", "WORKLOAD", "DESIRED", "READY");
    println!("{}", "-".repeat(62));
    for tier in Tier::ALL {
        let workload = builder.workload_name(tier);
        let desired = tier.desired_replicas(&app.spec);
        let ready = match deployments.get_opt(&workload).await {
            Ok(Some(d)) => d
                .status
                .and_then(|s| s.ready_replicas)
                .unwrap_or(0)
                .to_string(),
            Ok(None) => "absent".to_string(),
            Err(e) => format!("error: {e}"),
        };
        println!(
            "{:<12} {:<28} {:<10} {:<10}",
            tier.title(),
            workload,
            desired,
            ready
        );
    }

    Ok(())
}
