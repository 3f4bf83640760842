//! # VisitorsApp Spec
//!
//! The owning declaration of a Visitors deployment.

use super::VisitorsAppStatus;
use kube::CustomResource;
use serde::{Deserialize, Serialize};

/// VisitorsApp Custom Resource Definition
///
/// Declares one Visitors application: a MySQL persistence tier, a backend
/// service scaled to `size` replicas, and a web frontend.
///
/// # Example
///
/// ```yaml
/// apiVersion: visitors.octopilot.io/v1
/// kind: VisitorsApp
/// metadata:
///   name: acme
///   namespace: default
/// spec:
///   size: 3
///   title: "Acme Visitors"
/// ```
#[derive(CustomResource, Debug, Clone, PartialEq, Deserialize, Serialize, schemars::JsonSchema)]
#[kube(
    kind = "VisitorsApp",
    group = "visitors.octopilot.io",
    version = "v1",
    namespaced,
    shortname = "va",
    status = "VisitorsAppStatus",
    printcolumn = r#"{"name":"Size", "type":"integer", "jsonPath":".spec.size"}"#,
    printcolumn = r#"{"name":"Backend", "type":"string", "jsonPath":".status.backendImage"}"#,
    printcolumn = r#"{"name":"Frontend", "type":"string", "jsonPath":".status.frontendImage"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct VisitorsAppSpec {
    /// Number of backend replicas
    pub size: i32,
    /// Title shown by the web frontend
    #[serde(default = "default_title")]
    pub title: String,
}

#[must_use]
pub fn default_title() -> String {
    "Visitors".to_string()
}
