//! # Readiness
//!
//! Gate between tiers. A tier is ready when its workload reports exactly the
//! number of ready replicas the tier requires. Anything that prevents us from
//! seeing that, a missing workload or a failed lookup, reads as not ready.

use super::Tier;
use crate::store::{ClusterStore, ObjectKey, ResourceKind};
use tracing::{debug, warn};

pub async fn is_ready(store: &dyn ClusterStore, tier: Tier, key: &ObjectKey, required: i32) -> bool {
    let workload = match store.get(ResourceKind::Deployment, key).await {
        Ok(Some(resource)) => resource.into_deployment(),
        Ok(None) => None,
        Err(e) => {
            warn!(tier = %tier, resource = %key, error = %e, "readiness lookup failed, treating as not ready");
            return false;
        }
    };

    let Some(workload) = workload else {
        debug!(tier = %tier, resource = %key, "workload not found, not ready");
        return false;
    };

    let ready = workload
        .status
        .and_then(|s| s.ready_replicas)
        .unwrap_or(0);

    debug!(tier = %tier, resource = %key, ready, required, "readiness checked");
    ready == required
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{ManagedResource, MockClusterStore, StoreError};
    use k8s_openapi::api::apps::v1::{Deployment, DeploymentStatus};

    fn key() -> ObjectKey {
        ObjectKey::new("default", "mysql")
    }

    fn workload(ready: Option<i32>) -> ManagedResource {
        ManagedResource::Deployment(Deployment {
            status: Some(DeploymentStatus {
                ready_replicas: ready,
                ..DeploymentStatus::default()
            }),
            ..Deployment::default()
        })
    }

    async fn ready_with(result: Result<Option<ManagedResource>, StoreError>) -> bool {
        let mut store = MockClusterStore::new();
        store
            .expect_get()
            .times(1)
            .return_once(move |_, _| result);
        is_ready(&store, Tier::Persistence, &key(), 1).await
    }

    #[tokio::test]
    async fn test_lookup_error_is_not_ready() {
        assert!(!ready_with(Err(StoreError::Unavailable("down".to_string()))).await);
    }

    #[tokio::test]
    async fn test_missing_workload_is_not_ready() {
        assert!(!ready_with(Ok(None)).await);
    }

    #[tokio::test]
    async fn test_ready_only_at_required_count() {
        assert!(!ready_with(Ok(Some(workload(None)))).await);
        assert!(!ready_with(Ok(Some(workload(Some(0))))).await);
        assert!(ready_with(Ok(Some(workload(Some(1))))).await);
        assert!(!ready_with(Ok(Some(workload(Some(2))))).await);
    }
}
