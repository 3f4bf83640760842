//! # Ensure
//!
//! Create-if-absent for a single owned object. An object that already
//! exists is returned untouched; bringing it back in line is the drift
//! corrector's job, never this one's.

use super::ReconcilerError;
use crate::observability;
use crate::store::{ClusterStore, ManagedResource};
use tracing::{debug, info};

/// Result of [`ensure`]
#[derive(Debug)]
pub struct Ensured {
    /// The live object, if it existed before the call
    pub existing: Option<ManagedResource>,
    pub created: bool,
}

/// Make sure `desired` exists, creating it at most once
///
/// Lookup and creation failures are returned as-is and not retried here.
pub async fn ensure(
    store: &dyn ClusterStore,
    desired: &ManagedResource,
) -> Result<Ensured, ReconcilerError> {
    let kind = desired.kind();
    let key = desired.key();

    let existing = store
        .get(kind, &key)
        .await
        .map_err(|source| ReconcilerError::Lookup {
            kind,
            key: key.clone(),
            source,
        })?;

    if let Some(existing) = existing {
        debug!(kind = %kind, resource = %key, "already exists");
        return Ok(Ensured {
            existing: Some(existing),
            created: false,
        });
    }

    store
        .create(desired)
        .await
        .map_err(|source| ReconcilerError::Create {
            kind,
            key: key.clone(),
            source,
        })?;

    observability::metrics::increment_resources_created(kind.as_str());
    info!(kind = %kind, resource = %key, "created");

    Ok(Ensured {
        existing: None,
        created: true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MockClusterStore, ObjectKey, ResourceKind, StoreError};
    use k8s_openapi::api::core::v1::Service;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

    fn service() -> ManagedResource {
        ManagedResource::Service(Service {
            metadata: ObjectMeta {
                name: Some("acme-backend-service".to_string()),
                namespace: Some("default".to_string()),
                ..ObjectMeta::default()
            },
            ..Service::default()
        })
    }

    #[tokio::test]
    async fn test_absent_object_is_created_once() {
        let mut store = MockClusterStore::new();
        store.expect_get().times(1).returning(|_, _| Ok(None));
        store.expect_create().times(1).returning(|_| Ok(()));

        let ensured = ensure(&store, &service()).await.unwrap();

        assert!(ensured.created);
        assert!(ensured.existing.is_none());
    }

    #[tokio::test]
    async fn test_existing_object_is_left_alone() {
        let mut store = MockClusterStore::new();
        store
            .expect_get()
            .withf(|kind, key| {
                *kind == ResourceKind::Service
                    && *key == ObjectKey::new("default", "acme-backend-service")
            })
            .returning(|_, _| Ok(Some(service())));
        store.expect_create().never();
        store.expect_update().never();

        let ensured = ensure(&store, &service()).await.unwrap();

        assert!(!ensured.created);
        assert_eq!(ensured.existing, Some(service()));
    }

    #[tokio::test]
    async fn test_lookup_failure_does_not_create() {
        let mut store = MockClusterStore::new();
        store
            .expect_get()
            .returning(|_, _| Err(StoreError::Unavailable("timeout".to_string())));
        store.expect_create().never();

        let err = ensure(&store, &service()).await.unwrap_err();

        assert!(matches!(err, ReconcilerError::Lookup { .. }));
        assert_eq!(err.requeue_hint(), None);
    }

    #[tokio::test]
    async fn test_create_failure_is_returned() {
        let mut store = MockClusterStore::new();
        store.expect_get().returning(|_, _| Ok(None));
        store
            .expect_create()
            .times(1)
            .returning(|_| Err(StoreError::Unavailable("quota exceeded".to_string())));

        let err = ensure(&store, &service()).await.unwrap_err();

        assert!(matches!(err, ReconcilerError::Create { .. }));
    }
}
