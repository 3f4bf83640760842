//! # List Command
//!
//! Command to list VisitorsApp resources.

use anyhow::{Context, Result};
use kube::{api::Api, Client};
use visitors_operator::crd::VisitorsApp;

/// List VisitorsApp resources in one namespace, or all of them
pub async fn list_command(client: Client, namespace: Option<String>) -> Result<()> {
    let api: Api<VisitorsApp> = if let Some(ns) = &namespace {
        println!("Listing VisitorsApp resources in namespace '{ns}'...");
        Api::namespaced(client, ns)
    } else {
        println!("Listing VisitorsApp resources in all namespaces...");
        Api::all(client)
    };

    let apps = api
        .list(&kube::api::ListParams::default())
        .await
        .context("Failed to list VisitorsApp resources")?;

    if apps.items.is_empty() {
        println!("No VisitorsApp resources found.");
        return Ok(());
    }

    println!(
        "\n{:<24} {:<20} {:<6} {:<32} {:<32}",
        "NAME", "NAMESPACE", "SIZE", "BACKEND", "FRONTEND"
    );
    println!("{}", "-".repeat(118));

    for app in apps.items {
        let name = app.metadata.name.as_deref().unwrap_or("<unknown>");
        let ns = app.metadata.namespace.as_deref().unwrap_or("<unknown>");
        let size = app.spec.size;
        let backend = app
            .status
            .as_ref()
            .and_then(|s| s.backend_image.as_deref())
            .unwrap_or("-");
        let frontend = app
            .status
            .as_ref()
            .and_then(|s| s.frontend_image.as_deref())
            .unwrap_or("-");

        println!("{name:<24} {ns:<20} {size:<6} {backend:<32} {frontend:<32}");
    }

    Ok(())
}
