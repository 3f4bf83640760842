//! # Drift
//!
//! Brings a tier's live replica count back to the desired one.
//!
//! Only the replica count is compared. Image, environment and port changes
//! made behind the operator's back are not detected.

use super::{ReconcilerError, Tier, Verdict};
use crate::observability;
use crate::store::{ClusterStore, ManagedResource, ObjectKey, ResourceKind};
use std::time::Duration;
use tracing::{debug, info};

/// Compare the live workload's replicas to `desired` and patch on mismatch
///
/// A missing workload is reported with a `retry_after` hint: it was ensured
/// earlier in the pass and may simply not be visible yet.
pub async fn correct_replicas(
    store: &dyn ClusterStore,
    tier: Tier,
    key: &ObjectKey,
    desired: i32,
    retry_after: Duration,
) -> Verdict {
    let found = match store.get(ResourceKind::Deployment, key).await {
        Ok(found) => found.and_then(ManagedResource::into_deployment),
        Err(source) => {
            return ReconcilerError::Lookup {
                kind: ResourceKind::Deployment,
                key: key.clone(),
                source,
            }
            .into()
        }
    };

    let Some(mut workload) = found else {
        return ReconcilerError::DependentMissing {
            tier,
            key: key.clone(),
            retry_after,
        }
        .into();
    };

    // An unset replica count means the API server default of 1
    let live = workload.spec.as_ref().and_then(|s| s.replicas).unwrap_or(1);
    if live == desired {
        debug!(tier = %tier, resource = %key, replicas = live, "no drift");
        return Verdict::Continue;
    }

    info!(tier = %tier, resource = %key, live, desired, "correcting replica drift");
    workload.spec.get_or_insert_with(Default::default).replicas = Some(desired);

    match store.update(&workload.into()).await {
        Ok(()) => {
            observability::metrics::increment_drift_corrections(tier.as_str());
            Verdict::RequeueImmediate
        }
        Err(source) => ReconcilerError::Update {
            kind: ResourceKind::Deployment,
            key: key.clone(),
            source,
        }
        .into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MockClusterStore, StoreError};
    use k8s_openapi::api::apps::v1::{Deployment, DeploymentSpec};
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

    fn key() -> ObjectKey {
        ObjectKey::new("default", "acme-backend")
    }

    fn workload(replicas: i32) -> ManagedResource {
        ManagedResource::Deployment(Deployment {
            metadata: ObjectMeta {
                name: Some("acme-backend".to_string()),
                namespace: Some("default".to_string()),
                resource_version: Some("7".to_string()),
                ..ObjectMeta::default()
            },
            spec: Some(DeploymentSpec {
                replicas: Some(replicas),
                ..DeploymentSpec::default()
            }),
            ..Deployment::default()
        })
    }

    #[tokio::test]
    async fn test_matching_replicas_is_a_no_op() {
        let mut store = MockClusterStore::new();
        store.expect_get().returning(|_, _| Ok(Some(workload(5))));
        store.expect_update().never();

        let verdict =
            correct_replicas(&store, Tier::Backend, &key(), 5, Duration::from_secs(5)).await;

        assert!(verdict.is_continue());
    }

    #[tokio::test]
    async fn test_mismatch_updates_and_requeues_immediately() {
        let mut store = MockClusterStore::new();
        store.expect_get().returning(|_, _| Ok(Some(workload(2))));
        store
            .expect_update()
            .withf(|resource| {
                let deployment = resource.as_deployment().unwrap();
                deployment.spec.as_ref().unwrap().replicas == Some(5)
                    && deployment.metadata.resource_version.as_deref() == Some("7")
            })
            .times(1)
            .returning(|_| Ok(()));

        let verdict =
            correct_replicas(&store, Tier::Backend, &key(), 5, Duration::from_secs(5)).await;

        assert!(matches!(verdict, Verdict::RequeueImmediate));
    }

    #[tokio::test]
    async fn test_missing_workload_hints_a_bounded_retry() {
        let mut store = MockClusterStore::new();
        store.expect_get().returning(|_, _| Ok(None));

        let verdict =
            correct_replicas(&store, Tier::Backend, &key(), 5, Duration::from_secs(5)).await;

        let Verdict::Error(err) = verdict else {
            panic!("expected an error verdict");
        };
        assert_eq!(err.requeue_hint(), Some(Duration::from_secs(5)));
    }

    #[tokio::test]
    async fn test_conflicting_update_is_surfaced() {
        let mut store = MockClusterStore::new();
        store.expect_get().returning(|_, _| Ok(Some(workload(2))));
        store.expect_update().times(1).returning(|_| {
            Err(StoreError::Conflict {
                kind: "Deployment",
                key: ObjectKey::new("default", "acme-backend"),
            })
        });

        let verdict =
            correct_replicas(&store, Tier::Backend, &key(), 5, Duration::from_secs(5)).await;

        let Verdict::Error(err) = verdict else {
            panic!("expected an error verdict");
        };
        assert!(matches!(err, ReconcilerError::Update { .. }));
        assert_eq!(err.requeue_hint(), Some(Duration::ZERO));
    }
}
