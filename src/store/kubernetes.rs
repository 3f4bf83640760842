//! # Kubernetes Store
//!
//! [`ClusterStore`] backed by the Kubernetes API server.

use super::{ClusterStore, ManagedResource, ObjectKey, ResourceKind, StoreError};
use crate::constants::FIELD_MANAGER;
use crate::crd::VisitorsApp;
use async_trait::async_trait;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{Secret, Service};
use kube::api::{Api, Patch, PatchParams, PostParams};
use kube::Client;
use serde::de::DeserializeOwned;
use std::fmt::Debug;

/// Live cluster store
#[derive(Clone)]
pub struct KubeClusterStore {
    client: Client,
}

impl std::fmt::Debug for KubeClusterStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeClusterStore").finish_non_exhaustive()
    }
}

impl KubeClusterStore {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn api<K>(&self, namespace: &str) -> Api<K>
    where
        K: kube::Resource<Scope = k8s_openapi::NamespaceResourceScope>,
        <K as kube::Resource>::DynamicType: Default,
    {
        Api::namespaced(self.client.clone(), namespace)
    }
}

/// Translate a kube error into a store error, keeping 409s distinguishable
fn classify(kind: &'static str, key: &ObjectKey, err: kube::Error) -> StoreError {
    match err {
        kube::Error::Api(ref api_err) if api_err.code == 409 => {
            if api_err.reason == "AlreadyExists" {
                StoreError::AlreadyExists {
                    kind,
                    key: key.clone(),
                }
            } else {
                StoreError::Conflict {
                    kind,
                    key: key.clone(),
                }
            }
        }
        kube::Error::Api(ref api_err) if api_err.code == 422 => StoreError::Invalid {
            kind,
            key: key.clone(),
            reason: api_err.message.clone(),
        },
        other => StoreError::Kube(other),
    }
}

/// Params for a plain merge patch; server-side apply is never used
fn merge_patch_params() -> PatchParams {
    PatchParams {
        field_manager: Some(FIELD_MANAGER.to_string()),
        ..PatchParams::default()
    }
}

async fn get_opt<K>(api: &Api<K>, kind: &'static str, key: &ObjectKey) -> Result<Option<K>, StoreError>
where
    K: Clone + DeserializeOwned + Debug,
{
    match api.get(&key.name).await {
        Ok(obj) => Ok(Some(obj)),
        Err(kube::Error::Api(api_err)) if api_err.code == 404 => Ok(None),
        Err(e) => Err(classify(kind, key, e)),
    }
}

#[async_trait]
impl ClusterStore for KubeClusterStore {
    async fn get_app(&self, key: &ObjectKey) -> Result<Option<VisitorsApp>, StoreError> {
        let api: Api<VisitorsApp> = self.api(&key.namespace);
        get_opt(&api, "VisitorsApp", key).await
    }

    async fn update_app_status(&self, app: &VisitorsApp) -> Result<(), StoreError> {
        let key = ObjectKey::from_meta(&app.metadata)
            .ok_or_else(|| StoreError::Unavailable("VisitorsApp has no name or namespace".into()))?;
        let api: Api<VisitorsApp> = self.api(&key.namespace);

        // resourceVersion in a merge patch makes the write conditional:
        // the API server answers 409 if the object moved on since we read it
        let patch = serde_json::json!({
            "metadata": { "resourceVersion": app.metadata.resource_version },
            "status": app.status,
        });

        api.patch_status(
            &key.name,
            &merge_patch_params(),
            &Patch::Merge(&patch),
        )
        .await
        .map_err(|e| classify("VisitorsApp", &key, e))?;

        Ok(())
    }

    async fn get(
        &self,
        kind: ResourceKind,
        key: &ObjectKey,
    ) -> Result<Option<ManagedResource>, StoreError> {
        let found = match kind {
            ResourceKind::Secret => {
                let api: Api<Secret> = self.api(&key.namespace);
                get_opt(&api, kind.as_str(), key).await?.map(ManagedResource::from)
            }
            ResourceKind::Deployment => {
                let api: Api<Deployment> = self.api(&key.namespace);
                get_opt(&api, kind.as_str(), key).await?.map(ManagedResource::from)
            }
            ResourceKind::Service => {
                let api: Api<Service> = self.api(&key.namespace);
                get_opt(&api, kind.as_str(), key).await?.map(ManagedResource::from)
            }
        };
        Ok(found)
    }

    async fn create(&self, resource: &ManagedResource) -> Result<(), StoreError> {
        let key = resource.key();
        let kind = resource.kind().as_str();
        let pp = PostParams {
            field_manager: Some(FIELD_MANAGER.to_string()),
            ..PostParams::default()
        };

        let result = match resource {
            ManagedResource::Secret(obj) => {
                let api: Api<Secret> = self.api(&key.namespace);
                api.create(&pp, obj).await.map(|_| ())
            }
            ManagedResource::Deployment(obj) => {
                let api: Api<Deployment> = self.api(&key.namespace);
                api.create(&pp, obj).await.map(|_| ())
            }
            ManagedResource::Service(obj) => {
                let api: Api<Service> = self.api(&key.namespace);
                api.create(&pp, obj).await.map(|_| ())
            }
        };

        result.map_err(|e| classify(kind, &key, e))
    }

    async fn update(&self, resource: &ManagedResource) -> Result<(), StoreError> {
        let key = resource.key();
        let kind = resource.kind().as_str();
        let pp = PostParams {
            field_manager: Some(FIELD_MANAGER.to_string()),
            ..PostParams::default()
        };

        // replace() sends the object's resourceVersion, so stale writes are rejected
        let result = match resource {
            ManagedResource::Secret(obj) => {
                let api: Api<Secret> = self.api(&key.namespace);
                api.replace(&key.name, &pp, obj).await.map(|_| ())
            }
            ManagedResource::Deployment(obj) => {
                let api: Api<Deployment> = self.api(&key.namespace);
                api.replace(&key.name, &pp, obj).await.map(|_| ())
            }
            ManagedResource::Service(obj) => {
                let api: Api<Service> = self.api(&key.namespace);
                api.replace(&key.name, &pp, obj).await.map(|_| ())
            }
        };

        result.map_err(|e| classify(kind, &key, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_patch_is_a_plain_merge_patch() {
        let pp = merge_patch_params();
        assert_eq!(pp.field_manager.as_deref(), Some(FIELD_MANAGER));
        assert!(!pp.force);
        assert!(!pp.dry_run);
    }
}
