//! # Status
//!
//! Records observed state on the owning `VisitorsApp`.

use super::ReconcilerError;
use crate::crd::StatusField;
use crate::observability;
use crate::store::{ClusterStore, ObjectKey};
use tracing::{debug, info};

/// Set `status.<field>` to `value` on the freshest copy of the app
///
/// The write carries the `resourceVersion` just read, so a concurrent writer
/// makes it fail with a conflict instead of being overwritten. Nothing is
/// written if the field already holds `value` or the app is gone.
pub async fn record_status(
    store: &dyn ClusterStore,
    key: &ObjectKey,
    field: StatusField,
    value: &str,
) -> Result<(), ReconcilerError> {
    let fresh = store
        .get_app(key)
        .await
        .map_err(|source| ReconcilerError::FetchOwner {
            key: key.clone(),
            source,
        })?;

    let Some(mut app) = fresh else {
        debug!(resource = %key, field = %field, "VisitorsApp deleted mid-pass, skipping status");
        return Ok(());
    };

    let status = app.status.get_or_insert_with(Default::default);
    if field.get(status) == Some(value) {
        debug!(resource = %key, field = %field, "status unchanged");
        return Ok(());
    }
    field.set(status, value);

    store
        .update_app_status(&app)
        .await
        .map_err(|source| ReconcilerError::StatusWrite {
            field,
            key: key.clone(),
            source,
        })?;

    observability::metrics::increment_status_writes();
    info!(resource = %key, field = %field, value, "status recorded");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::{VisitorsApp, VisitorsAppSpec, VisitorsAppStatus};
    use crate::store::{MockClusterStore, StoreError};
    use std::time::Duration;

    fn key() -> ObjectKey {
        ObjectKey::new("default", "acme")
    }

    fn app(backend_image: Option<&str>) -> VisitorsApp {
        let mut app = VisitorsApp::new(
            "acme",
            VisitorsAppSpec {
                size: 1,
                title: "t".to_string(),
            },
        );
        app.metadata.namespace = Some("default".to_string());
        app.metadata.resource_version = Some("42".to_string());
        app.status = Some(VisitorsAppStatus {
            backend_image: backend_image.map(str::to_string),
            frontend_image: None,
        });
        app
    }

    #[tokio::test]
    async fn test_writes_with_fetched_version() {
        let mut store = MockClusterStore::new();
        store.expect_get_app().returning(|_| Ok(Some(app(None))));
        store
            .expect_update_app_status()
            .withf(|app| {
                app.metadata.resource_version.as_deref() == Some("42")
                    && app.status.as_ref().and_then(|s| s.backend_image.as_deref())
                        == Some("backend:1")
            })
            .times(1)
            .returning(|_| Ok(()));

        record_status(&store, &key(), StatusField::BackendImage, "backend:1")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_unchanged_value_is_not_rewritten() {
        let mut store = MockClusterStore::new();
        store
            .expect_get_app()
            .returning(|_| Ok(Some(app(Some("backend:1")))));
        store.expect_update_app_status().never();

        record_status(&store, &key(), StatusField::BackendImage, "backend:1")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_vanished_owner_is_skipped() {
        let mut store = MockClusterStore::new();
        store.expect_get_app().returning(|_| Ok(None));
        store.expect_update_app_status().never();

        record_status(&store, &key(), StatusField::FrontendImage, "frontend:1")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_conflict_is_returned_for_immediate_requeue() {
        let mut store = MockClusterStore::new();
        store.expect_get_app().returning(|_| Ok(Some(app(None))));
        store.expect_update_app_status().times(1).returning(|_| {
            Err(StoreError::Conflict {
                kind: "VisitorsApp",
                key: ObjectKey::new("default", "acme"),
            })
        });

        let err = record_status(&store, &key(), StatusField::BackendImage, "backend:1")
            .await
            .unwrap_err();

        assert!(matches!(err, ReconcilerError::StatusWrite { .. }));
        assert_eq!(err.requeue_hint(), Some(Duration::ZERO));
    }
}
