//! # Validation
//!
//! Checks run on a freshly fetched `VisitorsApp` before any stage touches
//! the cluster. A malformed app is an ordinary error and is retried with
//! backoff like any other; fixing the resource ends the retries.

use super::ReconcilerError;
use crate::crd::VisitorsApp;
use crate::store::ObjectKey;

pub fn validate(app: &VisitorsApp, key: &ObjectKey) -> Result<(), ReconcilerError> {
    let invalid = |reason: String| {
        Err(ReconcilerError::InvalidSpec {
            key: key.clone(),
            reason,
        })
    };

    if app.spec.size < 0 {
        return invalid(format!("spec.size must not be negative, got {}", app.spec.size));
    }
    if app.metadata.namespace.as_deref().unwrap_or_default().is_empty() {
        return invalid("metadata.namespace is missing".to_string());
    }
    if app.metadata.uid.as_deref().unwrap_or_default().is_empty() {
        return invalid("metadata.uid is missing, cannot set owner references".to_string());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::VisitorsAppSpec;

    fn app(size: i32) -> VisitorsApp {
        let mut app = VisitorsApp::new(
            "acme",
            VisitorsAppSpec {
                size,
                title: "t".to_string(),
            },
        );
        app.metadata.namespace = Some("default".to_string());
        app.metadata.uid = Some("uid".to_string());
        app
    }

    fn key() -> ObjectKey {
        ObjectKey::new("default", "acme")
    }

    #[test]
    fn test_zero_size_is_valid() {
        assert!(validate(&app(0), &key()).is_ok());
    }

    #[test]
    fn test_negative_size_is_rejected() {
        let err = validate(&app(-1), &key()).unwrap_err();
        assert!(err.to_string().contains("spec.size must not be negative"));
    }

    #[test]
    fn test_missing_uid_is_rejected() {
        let mut app = app(1);
        app.metadata.uid = None;
        assert!(matches!(
            validate(&app, &key()),
            Err(ReconcilerError::InvalidSpec { .. })
        ));
    }
}
