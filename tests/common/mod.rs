//! Common test fixtures for engine integration tests
//!
//! Builds `VisitorsApp` resources and reconciler contexts backed by the
//! in-memory cluster store.

#![allow(dead_code, reason = "each test binary uses a subset of the fixtures")]

use std::sync::Arc;
use visitors_operator::config::ControllerConfig;
use visitors_operator::controller::reconciler::Reconciler;
use visitors_operator::crd::{VisitorsApp, VisitorsAppSpec};
use visitors_operator::store::{ManagedResource, MemoryClusterStore, Mutation, ObjectKey};

pub const NAMESPACE: &str = "default";

pub fn visitors_app(name: &str, size: i32) -> VisitorsApp {
    let mut app = VisitorsApp::new(
        name,
        VisitorsAppSpec {
            size,
            title: format!("{name} visitors"),
        },
    );
    app.metadata.namespace = Some(NAMESPACE.to_string());
    app
}

pub fn key(name: &str) -> ObjectKey {
    ObjectKey::new(NAMESPACE, name)
}

/// A store holding one app, and a reconciler over it
pub fn setup(name: &str, size: i32) -> (Arc<MemoryClusterStore>, Reconciler, ObjectKey) {
    let store = Arc::new(MemoryClusterStore::new());
    let app_key = store.put_app(visitors_app(name, size));
    let ctx = Reconciler::new(store.clone(), &ControllerConfig::default());
    (store, ctx, app_key)
}

/// Like [`setup`], with the cluster choosing node ports
pub fn setup_without_node_ports(
    name: &str,
    size: i32,
) -> (Arc<MemoryClusterStore>, Reconciler, ObjectKey) {
    let mut config = ControllerConfig::default();
    config.manifests.backend_node_port = None;
    config.manifests.frontend_node_port = None;

    let store = Arc::new(MemoryClusterStore::new());
    let app_key = store.put_app(visitors_app(name, size));
    let ctx = Reconciler::new(store.clone(), &config);
    (store, ctx, app_key)
}

/// Report the persistence workload as ready
pub fn mysql_ready(store: &MemoryClusterStore) {
    store.set_ready_replicas(&key("mysql"), 1);
}

/// Names of stored objects, as `Kind/name`, sorted
pub fn object_names(store: &MemoryClusterStore) -> Vec<String> {
    let mut names: Vec<String> = store
        .objects()
        .iter()
        .map(|o: &ManagedResource| format!("{}/{}", o.kind(), o.name()))
        .collect();
    names.sort();
    names
}

pub fn replicas(store: &MemoryClusterStore, name: &str) -> Option<i32> {
    store
        .object(visitors_operator::store::ResourceKind::Deployment, &key(name))
        .and_then(ManagedResource::into_deployment)
        .and_then(|d| d.spec)
        .and_then(|s| s.replicas)
}

pub fn creates(mutations: &[Mutation]) -> usize {
    mutations
        .iter()
        .filter(|m| matches!(m, Mutation::Created(..)))
        .count()
}
