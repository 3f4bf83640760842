//! # In-Memory Store
//!
//! A [`ClusterStore`] that keeps everything in process. It mimics the parts
//! of API server behaviour the reconciler depends on: `resourceVersion`
//! bumps on every write, optimistic-concurrency conflicts, uid assignment and
//! owner-reference cascade deletion. It also records every mutation and can
//! be told to fail specific calls, which is what the tests lean on.

use super::{ClusterStore, ManagedResource, ObjectKey, ResourceKind, StoreError};
use crate::crd::VisitorsApp;
use async_trait::async_trait;
use k8s_openapi::api::apps::v1::DeploymentStatus;
use std::collections::{BTreeMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// A write observed by the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    Created(ResourceKind, ObjectKey),
    Updated(ResourceKind, ObjectKey),
    StatusUpdated(ObjectKey),
}

/// Store operations that can be made to fail on demand
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Fault {
    GetApp,
    Get(ResourceKind),
    Create(ResourceKind),
    Update(ResourceKind),
    StatusConflict,
}

#[derive(Debug, Default)]
struct State {
    apps: BTreeMap<ObjectKey, VisitorsApp>,
    objects: BTreeMap<(ResourceKind, ObjectKey), ManagedResource>,
    mutations: Vec<Mutation>,
    faults: HashSet<Fault>,
    next_version: u64,
}

impl State {
    fn bump(&mut self) -> String {
        self.next_version += 1;
        self.next_version.to_string()
    }
}

#[derive(Debug, Default)]
pub struct MemoryClusterStore {
    state: Mutex<State>,
}

impl MemoryClusterStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Create or replace a `VisitorsApp`, assigning uid, generation and resourceVersion
    pub fn put_app(&self, mut app: VisitorsApp) -> ObjectKey {
        let mut state = self.lock();
        let namespace = app
            .metadata
            .namespace
            .get_or_insert_with(|| "default".to_string())
            .clone();
        let name = app.metadata.name.clone().unwrap_or_default();
        let key = ObjectKey::new(namespace, name);

        let previous = state.apps.get(&key);
        let uid = previous
            .and_then(|p| p.metadata.uid.clone())
            .or_else(|| app.metadata.uid.clone())
            .unwrap_or_else(|| format!("uid-{}-{}", key.namespace, key.name));
        let generation = previous
            .and_then(|p| p.metadata.generation)
            .map_or(1, |g| g + 1);

        app.metadata.uid = Some(uid);
        app.metadata.generation = Some(generation);
        app.metadata.resource_version = Some(state.bump());
        state.apps.insert(key.clone(), app);
        key
    }

    /// Delete a `VisitorsApp` and, like the cluster garbage collector, every
    /// object whose controlling owner reference points at it
    pub fn delete_app(&self, key: &ObjectKey) {
        let mut state = self.lock();
        let Some(app) = state.apps.remove(key) else {
            return;
        };
        let uid = app.metadata.uid;
        state
            .objects
            .retain(|_, obj| obj.owner().map(|o| &o.uid) != uid.as_ref());
    }

    /// Set the observed ready replica count of a Deployment
    pub fn set_ready_replicas(&self, key: &ObjectKey, ready: i32) {
        let mut state = self.lock();
        let version = state.bump();
        if let Some(ManagedResource::Deployment(d)) =
            state.objects.get_mut(&(ResourceKind::Deployment, key.clone()))
        {
            d.status
                .get_or_insert_with(DeploymentStatus::default)
                .ready_replicas = Some(ready);
            d.metadata.resource_version = Some(version);
        }
    }

    /// Change a Deployment's replica count behind the reconciler's back
    pub fn set_replicas(&self, key: &ObjectKey, replicas: i32) {
        let mut state = self.lock();
        let version = state.bump();
        if let Some(ManagedResource::Deployment(d)) =
            state.objects.get_mut(&(ResourceKind::Deployment, key.clone()))
        {
            if let Some(spec) = d.spec.as_mut() {
                spec.replicas = Some(replicas);
            }
            d.metadata.resource_version = Some(version);
        }
    }

    /// Insert an object directly, bypassing the mutation log
    pub fn seed(&self, mut resource: ManagedResource) {
        let mut state = self.lock();
        resource.metadata_mut().resource_version = Some(state.bump());
        state
            .objects
            .insert((resource.kind(), resource.key()), resource);
    }

    #[must_use]
    pub fn app(&self, key: &ObjectKey) -> Option<VisitorsApp> {
        self.lock().apps.get(key).cloned()
    }

    #[must_use]
    pub fn object(&self, kind: ResourceKind, key: &ObjectKey) -> Option<ManagedResource> {
        self.lock().objects.get(&(kind, key.clone())).cloned()
    }

    /// Every owned object currently stored, ordered by kind then key
    #[must_use]
    pub fn objects(&self) -> Vec<ManagedResource> {
        self.lock().objects.values().cloned().collect()
    }

    #[must_use]
    pub fn mutations(&self) -> Vec<Mutation> {
        self.lock().mutations.clone()
    }

    pub fn clear_mutations(&self) {
        self.lock().mutations.clear();
    }

    /// Make `get_app` fail until [`Self::clear_faults`] is called
    pub fn fail_app_lookups(&self) {
        self.lock().faults.insert(Fault::GetApp);
    }

    pub fn fail_lookups(&self, kind: ResourceKind) {
        self.lock().faults.insert(Fault::Get(kind));
    }

    pub fn fail_creates(&self, kind: ResourceKind) {
        self.lock().faults.insert(Fault::Create(kind));
    }

    pub fn fail_updates(&self, kind: ResourceKind) {
        self.lock().faults.insert(Fault::Update(kind));
    }

    /// Make status writes fail as if another writer got there first
    pub fn conflict_status_updates(&self) {
        self.lock().faults.insert(Fault::StatusConflict);
    }

    pub fn clear_faults(&self) {
        self.lock().faults.clear();
    }
}

fn node_ports(resource: &ManagedResource) -> Vec<i32> {
    let ManagedResource::Service(service) = resource else {
        return Vec::new();
    };
    service
        .spec
        .iter()
        .flat_map(|spec| spec.ports.iter().flatten())
        .filter_map(|port| port.node_port)
        .collect()
}

fn injected(what: &str) -> StoreError {
    StoreError::Unavailable(format!("injected {what} failure"))
}

#[async_trait]
impl ClusterStore for MemoryClusterStore {
    async fn get_app(&self, key: &ObjectKey) -> Result<Option<VisitorsApp>, StoreError> {
        let state = self.lock();
        if state.faults.contains(&Fault::GetApp) {
            return Err(injected("get"));
        }
        Ok(state.apps.get(key).cloned())
    }

    async fn update_app_status(&self, app: &VisitorsApp) -> Result<(), StoreError> {
        let mut state = self.lock();
        let key = ObjectKey::from_meta(&app.metadata)
            .ok_or_else(|| StoreError::Unavailable("VisitorsApp has no name or namespace".into()))?;
        let conflict = StoreError::Conflict {
            kind: "VisitorsApp",
            key: key.clone(),
        };
        if state.faults.contains(&Fault::StatusConflict) {
            return Err(conflict);
        }

        let Some(current_version) = state
            .apps
            .get(&key)
            .map(|current| current.metadata.resource_version.clone())
        else {
            return Err(StoreError::Unavailable(format!("VisitorsApp {key} not found")));
        };
        if current_version != app.metadata.resource_version {
            return Err(conflict);
        }

        let version = state.bump();
        if let Some(current) = state.apps.get_mut(&key) {
            current.status.clone_from(&app.status);
            current.metadata.resource_version = Some(version);
        }
        state.mutations.push(Mutation::StatusUpdated(key));
        Ok(())
    }

    async fn get(
        &self,
        kind: ResourceKind,
        key: &ObjectKey,
    ) -> Result<Option<ManagedResource>, StoreError> {
        let state = self.lock();
        if state.faults.contains(&Fault::Get(kind)) {
            return Err(injected("get"));
        }
        Ok(state.objects.get(&(kind, key.clone())).cloned())
    }

    async fn create(&self, resource: &ManagedResource) -> Result<(), StoreError> {
        let mut state = self.lock();
        let kind = resource.kind();
        let key = resource.key();
        if state.faults.contains(&Fault::Create(kind)) {
            return Err(injected("create"));
        }
        if state.objects.contains_key(&(kind, key.clone())) {
            return Err(StoreError::AlreadyExists {
                kind: kind.as_str(),
                key,
            });
        }
        // Node ports are allocated cluster-wide, not per namespace
        for port in node_ports(resource) {
            if state.objects.values().any(|o| node_ports(o).contains(&port)) {
                return Err(StoreError::Invalid {
                    kind: kind.as_str(),
                    key,
                    reason: format!("provided port is already allocated: {port}"),
                });
            }
        }

        let mut stored = resource.clone();
        stored.metadata_mut().resource_version = Some(state.bump());
        state.objects.insert((kind, key.clone()), stored);
        state.mutations.push(Mutation::Created(kind, key));
        Ok(())
    }

    async fn update(&self, resource: &ManagedResource) -> Result<(), StoreError> {
        let mut state = self.lock();
        let kind = resource.kind();
        let key = resource.key();
        if state.faults.contains(&Fault::Update(kind)) {
            return Err(injected("update"));
        }

        let Some(current_version) = state
            .objects
            .get(&(kind, key.clone()))
            .map(|current| current.metadata().resource_version.clone())
        else {
            return Err(StoreError::Unavailable(format!("{kind} {key} not found")));
        };
        if current_version != resource.metadata().resource_version {
            return Err(StoreError::Conflict {
                kind: kind.as_str(),
                key,
            });
        }

        let mut stored = resource.clone();
        stored.metadata_mut().resource_version = Some(state.bump());
        state.objects.insert((kind, key.clone()), stored);
        state.mutations.push(Mutation::Updated(kind, key));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::VisitorsAppSpec;
    use k8s_openapi::api::core::v1::{Secret, Service, ServicePort, ServiceSpec};
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, OwnerReference};

    fn app(name: &str) -> VisitorsApp {
        let mut app = VisitorsApp::new(
            name,
            VisitorsAppSpec {
                size: 1,
                title: "t".to_string(),
            },
        );
        app.metadata.namespace = Some("default".to_string());
        app
    }

    fn owned_secret(name: &str, owner_uid: &str) -> ManagedResource {
        ManagedResource::Secret(Secret {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                namespace: Some("default".to_string()),
                owner_references: Some(vec![OwnerReference {
                    api_version: "visitors.octopilot.io/v1".to_string(),
                    kind: "VisitorsApp".to_string(),
                    name: "acme".to_string(),
                    uid: owner_uid.to_string(),
                    controller: Some(true),
                    block_owner_deletion: Some(true),
                }]),
                ..ObjectMeta::default()
            },
            ..Secret::default()
        })
    }

    #[tokio::test]
    async fn test_stale_update_is_rejected() {
        let store = MemoryClusterStore::new();
        store.seed(owned_secret("s", "u"));
        let key = ObjectKey::new("default", "s");

        let stale = store.object(ResourceKind::Secret, &key).unwrap();
        store.update(&stale).await.unwrap();

        let err = store.update(&stale).await.unwrap_err();
        assert!(err.is_conflict());
    }

    #[tokio::test]
    async fn test_create_twice_reports_already_exists() {
        let store = MemoryClusterStore::new();
        let secret = owned_secret("s", "u");
        store.create(&secret).await.unwrap();

        let err = store.create(&secret).await.unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists { .. }));
        assert_eq!(store.mutations().len(), 1);
    }

    fn node_port_service(namespace: &str, name: &str, node_port: Option<i32>) -> ManagedResource {
        ManagedResource::Service(Service {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                namespace: Some(namespace.to_string()),
                ..ObjectMeta::default()
            },
            spec: Some(ServiceSpec {
                type_: Some("NodePort".to_string()),
                ports: Some(vec![ServicePort {
                    port: 8000,
                    node_port,
                    ..ServicePort::default()
                }]),
                ..ServiceSpec::default()
            }),
            ..Service::default()
        })
    }

    #[tokio::test]
    async fn test_node_ports_are_allocated_cluster_wide() {
        let store = MemoryClusterStore::new();
        store
            .create(&node_port_service("team-a", "a", Some(30685)))
            .await
            .unwrap();

        let err = store
            .create(&node_port_service("team-b", "b", Some(30685)))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Invalid { .. }));

        // Unset node ports are assigned by the cluster and never collide
        store.create(&node_port_service("team-b", "c", None)).await.unwrap();
        store.create(&node_port_service("team-b", "d", None)).await.unwrap();
        assert_eq!(store.mutations().len(), 3);
    }

    #[tokio::test]
    async fn test_delete_app_cascades_to_owned_objects_only() {
        let store = MemoryClusterStore::new();
        let key = store.put_app(app("acme"));
        let uid = store.app(&key).unwrap().metadata.uid.unwrap();
        store.seed(owned_secret("mine", &uid));
        store.seed(owned_secret("theirs", "someone-else"));

        store.delete_app(&key);

        assert!(store.app(&key).is_none());
        let names: Vec<String> = store.objects().iter().map(|o| o.name().to_string()).collect();
        assert_eq!(names, vec!["theirs".to_string()]);
    }

    #[tokio::test]
    async fn test_status_update_bumps_resource_version() {
        let store = MemoryClusterStore::new();
        let key = store.put_app(app("acme"));
        let fetched = store.get_app(&key).await.unwrap().unwrap();

        store.update_app_status(&fetched).await.unwrap();

        let after = store.app(&key).unwrap();
        assert_ne!(after.metadata.resource_version, fetched.metadata.resource_version);
        assert!(store.update_app_status(&fetched).await.unwrap_err().is_conflict());
    }
}
