//! # VisitorsApp Status
//!
//! Observed state written back by the reconciler.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct VisitorsAppStatus {
    /// Image the backend tier was deployed with
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backend_image: Option<String>,
    /// Image the frontend tier was deployed with
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frontend_image: Option<String>,
}

/// A single status field the reconciler is allowed to write
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusField {
    BackendImage,
    FrontendImage,
}

impl StatusField {
    /// Current value of this field on `status`
    #[must_use]
    pub fn get(self, status: &VisitorsAppStatus) -> Option<&str> {
        match self {
            StatusField::BackendImage => status.backend_image.as_deref(),
            StatusField::FrontendImage => status.frontend_image.as_deref(),
        }
    }

    pub fn set(self, status: &mut VisitorsAppStatus, value: &str) {
        let slot = match self {
            StatusField::BackendImage => &mut status.backend_image,
            StatusField::FrontendImage => &mut status.frontend_image,
        };
        *slot = Some(value.to_string());
    }

    /// JSON name of the field, as it appears under `.status`
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            StatusField::BackendImage => "backendImage",
            StatusField::FrontendImage => "frontendImage",
        }
    }
}

impl fmt::Display for StatusField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_then_get_roundtrips_per_field() {
        let mut status = VisitorsAppStatus::default();
        StatusField::BackendImage.set(&mut status, "backend:1");

        assert_eq!(StatusField::BackendImage.get(&status), Some("backend:1"));
        assert_eq!(StatusField::FrontendImage.get(&status), None);
    }

    #[test]
    fn test_empty_status_serializes_without_fields() {
        let json = serde_json::to_value(VisitorsAppStatus::default()).unwrap();
        assert_eq!(json, serde_json::json!({}));
    }
}
