//! # Cluster Store
//!
//! The reconciler's only window onto cluster state. Every read and write the
//! engine performs goes through [`ClusterStore`], so the same pipeline runs
//! against the live API server ([`KubeClusterStore`]) and against the
//! in-memory store used by tests and dry runs ([`MemoryClusterStore`]).
//!
//! The store is eventually consistent and not transactional. Updates are
//! optimistic: an object whose `resourceVersion` is stale is rejected with
//! [`StoreError::Conflict`]. Cascading deletion of owned objects is the
//! cluster garbage collector's job and is driven purely by the owner
//! references the manifest builder stamps on each object.

mod kubernetes;
mod memory;

pub use kubernetes::KubeClusterStore;
pub use memory::{MemoryClusterStore, Mutation};

use crate::crd::VisitorsApp;
use async_trait::async_trait;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{Secret, Service};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, OwnerReference};
use std::fmt;
use thiserror::Error;

#[cfg(test)]
use mockall::automock;

/// Namespace and name of a namespaced object
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectKey {
    pub namespace: String,
    pub name: String,
}

impl ObjectKey {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Key of an object from its metadata, if both namespace and name are set
    #[must_use]
    pub fn from_meta(meta: &ObjectMeta) -> Option<Self> {
        Some(Self::new(meta.namespace.clone()?, meta.name.clone()?))
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// Kinds of objects owned by a `VisitorsApp`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ResourceKind {
    Secret,
    Deployment,
    Service,
}

impl ResourceKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ResourceKind::Secret => "Secret",
            ResourceKind::Deployment => "Deployment",
            ResourceKind::Service => "Service",
        }
    }

    /// Role the kind plays within a tier, used in stage names
    #[must_use]
    pub fn role(self) -> &'static str {
        match self {
            ResourceKind::Secret => "Secret",
            ResourceKind::Deployment => "Workload",
            ResourceKind::Service => "Service",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Any cluster object created and owned by a `VisitorsApp`
///
/// The wrapped object carries its identity and owner reference in
/// `metadata`, the desired state in `spec` (or `stringData` for secrets) and,
/// once read back from the store, the observed state in `status`.
#[derive(Debug, Clone, PartialEq)]
pub enum ManagedResource {
    Secret(Secret),
    Deployment(Deployment),
    Service(Service),
}

impl ManagedResource {
    #[must_use]
    pub fn kind(&self) -> ResourceKind {
        match self {
            ManagedResource::Secret(_) => ResourceKind::Secret,
            ManagedResource::Deployment(_) => ResourceKind::Deployment,
            ManagedResource::Service(_) => ResourceKind::Service,
        }
    }

    #[must_use]
    pub fn metadata(&self) -> &ObjectMeta {
        match self {
            ManagedResource::Secret(s) => &s.metadata,
            ManagedResource::Deployment(d) => &d.metadata,
            ManagedResource::Service(s) => &s.metadata,
        }
    }

    pub fn metadata_mut(&mut self) -> &mut ObjectMeta {
        match self {
            ManagedResource::Secret(s) => &mut s.metadata,
            ManagedResource::Deployment(d) => &mut d.metadata,
            ManagedResource::Service(s) => &mut s.metadata,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        self.metadata().name.as_deref().unwrap_or_default()
    }

    #[must_use]
    pub fn namespace(&self) -> &str {
        self.metadata().namespace.as_deref().unwrap_or_default()
    }

    #[must_use]
    pub fn key(&self) -> ObjectKey {
        ObjectKey::new(self.namespace(), self.name())
    }

    /// The controlling owner reference.
    ///
    /// This is a weak back-reference: it names the owning `VisitorsApp` so
    /// the garbage collector can cascade deletes, and never keeps the owner
    /// alive or grants access to it.
    #[must_use]
    pub fn owner(&self) -> Option<&OwnerReference> {
        self.metadata()
            .owner_references
            .as_ref()?
            .iter()
            .find(|r| r.controller == Some(true))
    }

    #[must_use]
    pub fn as_deployment(&self) -> Option<&Deployment> {
        match self {
            ManagedResource::Deployment(d) => Some(d),
            _ => None,
        }
    }

    #[must_use]
    pub fn into_deployment(self) -> Option<Deployment> {
        match self {
            ManagedResource::Deployment(d) => Some(d),
            _ => None,
        }
    }
}

impl From<Secret> for ManagedResource {
    fn from(value: Secret) -> Self {
        ManagedResource::Secret(value)
    }
}

impl From<Deployment> for ManagedResource {
    fn from(value: Deployment) -> Self {
        ManagedResource::Deployment(value)
    }
}

impl From<Service> for ManagedResource {
    fn from(value: Service) -> Self {
        ManagedResource::Service(value)
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    /// The object changed since it was read
    #[error("conflict writing {kind} {key}: object was modified")]
    Conflict { kind: &'static str, key: ObjectKey },
    #[error("{kind} {key} already exists")]
    AlreadyExists { kind: &'static str, key: ObjectKey },
    /// Rejected by API server validation, e.g. a node port already allocated
    #[error("{kind} {key} is invalid: {reason}")]
    Invalid {
        kind: &'static str,
        key: ObjectKey,
        reason: String,
    },
    #[error("Kubernetes API error: {0}")]
    Kube(#[from] kube::Error),
    #[error("cluster store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict { .. })
    }
}

/// Declarative object store the reconciler reads and writes through
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ClusterStore: Send + Sync {
    /// Fetch the owning `VisitorsApp`, `None` if it does not exist
    async fn get_app(&self, key: &ObjectKey) -> Result<Option<VisitorsApp>, StoreError>;

    /// Write `app.status`, failing with `Conflict` if `app` is stale
    async fn update_app_status(&self, app: &VisitorsApp) -> Result<(), StoreError>;

    /// Fetch an owned object, `None` if it does not exist
    async fn get(
        &self,
        kind: ResourceKind,
        key: &ObjectKey,
    ) -> Result<Option<ManagedResource>, StoreError>;

    /// Create an object, failing with `AlreadyExists` if the name is taken
    async fn create(&self, resource: &ManagedResource) -> Result<(), StoreError>;

    /// Replace an object, failing with `Conflict` if `resource` is stale
    async fn update(&self, resource: &ManagedResource) -> Result<(), StoreError>;
}
