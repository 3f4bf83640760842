//! # Manifests
//!
//! Pure builders for the desired state of every object a `VisitorsApp`
//! owns. Nothing here talks to the cluster: the same app and configuration
//! always produce the same objects.
//!
//! Every object carries the label set `{app, owner, tier}`. The same labels
//! are the Deployment selector, the pod template labels and the Service
//! selector, so a tier's Service always fronts that tier's pods.

use super::{ReconcilerError, Tier};
use crate::config::ManifestConfig;
use crate::constants::{BACKEND_PORT, FRONTEND_PORT, PERSISTENCE_PORT};
use crate::crd::VisitorsApp;
use crate::store::{ManagedResource, ObjectKey, ResourceKind};
use k8s_openapi::api::apps::v1::{Deployment, DeploymentSpec};
use k8s_openapi::api::core::v1::{
    Container, ContainerPort, EnvVar, EnvVarSource, PodSpec, PodTemplateSpec, Secret,
    SecretKeySelector, Service, ServicePort, ServiceSpec,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta, OwnerReference};
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use kube::Resource;
use std::collections::BTreeMap;

const SECRET_USERNAME_KEY: &str = "username";
const SECRET_PASSWORD_KEY: &str = "password";

/// Builds desired objects for one `VisitorsApp`
#[derive(Debug, Clone)]
pub struct ManifestBuilder<'a> {
    app: &'a VisitorsApp,
    config: &'a ManifestConfig,
    name: String,
    namespace: String,
    owner: OwnerReference,
}

impl<'a> ManifestBuilder<'a> {
    /// Fails if the app lacks the name, namespace or uid an owner reference needs
    pub fn new(app: &'a VisitorsApp, config: &'a ManifestConfig) -> Result<Self, ReconcilerError> {
        let key = ObjectKey::new(
            app.metadata.namespace.clone().unwrap_or_default(),
            app.metadata.name.clone().unwrap_or_default(),
        );
        let invalid = |reason: &str| ReconcilerError::InvalidSpec {
            key: key.clone(),
            reason: reason.to_string(),
        };

        let name = app
            .metadata
            .name
            .clone()
            .ok_or_else(|| invalid("metadata.name is missing"))?;
        let namespace = app
            .metadata
            .namespace
            .clone()
            .ok_or_else(|| invalid("metadata.namespace is missing"))?;
        let mut owner = app
            .controller_owner_ref(&())
            .ok_or_else(|| invalid("metadata.uid is missing"))?;
        // Foreground deletion of the app waits for its objects
        owner.block_owner_deletion = Some(true);

        Ok(Self {
            app,
            config,
            name,
            namespace,
            owner,
        })
    }

    pub fn workload_name(&self, tier: Tier) -> String {
        match tier {
            Tier::Persistence => self.config.persistence_workload_name.clone(),
            Tier::Backend | Tier::Frontend => format!("{}-{}", self.name, tier.as_str()),
        }
    }

    pub fn service_name(&self, tier: Tier) -> String {
        match tier {
            Tier::Persistence => self.config.persistence_service_name.clone(),
            Tier::Backend | Tier::Frontend => format!("{}-{}-service", self.name, tier.as_str()),
        }
    }

    pub fn workload_key(&self, tier: Tier) -> ObjectKey {
        ObjectKey::new(self.namespace.clone(), self.workload_name(tier))
    }

    /// Key of the object of `kind` in `tier`, if the tier has one
    pub fn key(&self, tier: Tier, kind: ResourceKind) -> Option<ObjectKey> {
        let name = match (tier, kind) {
            (Tier::Persistence, ResourceKind::Secret) => self.config.persistence_secret_name.clone(),
            (_, ResourceKind::Secret) => return None,
            (_, ResourceKind::Deployment) => self.workload_name(tier),
            (_, ResourceKind::Service) => self.service_name(tier),
        };
        Some(ObjectKey::new(self.namespace.clone(), name))
    }

    /// Container image the tier runs
    pub fn image(&self, tier: Tier) -> &str {
        match tier {
            Tier::Persistence => &self.config.persistence_image,
            Tier::Backend => &self.config.backend_image,
            Tier::Frontend => &self.config.frontend_image,
        }
    }

    pub fn labels(&self, tier: Tier) -> BTreeMap<String, String> {
        BTreeMap::from([
            ("app".to_string(), self.config.app_label.clone()),
            ("owner".to_string(), self.name.clone()),
            ("tier".to_string(), tier.as_str().to_string()),
        ])
    }

    /// Desired object of `kind` in `tier`, `None` for kinds the tier does not own
    pub fn build(&self, tier: Tier, kind: ResourceKind) -> Option<ManagedResource> {
        match (tier, kind) {
            (Tier::Persistence, ResourceKind::Secret) => Some(self.persistence_secret().into()),
            (_, ResourceKind::Secret) => None,
            (_, ResourceKind::Deployment) => Some(self.workload(tier).into()),
            (_, ResourceKind::Service) => Some(self.service(tier).into()),
        }
    }

    fn metadata(&self, name: String, tier: Tier) -> ObjectMeta {
        ObjectMeta {
            name: Some(name),
            namespace: Some(self.namespace.clone()),
            labels: Some(self.labels(tier)),
            owner_references: Some(vec![self.owner.clone()]),
            ..ObjectMeta::default()
        }
    }

    fn persistence_secret(&self) -> Secret {
        Secret {
            metadata: self.metadata(
                self.config.persistence_secret_name.clone(),
                Tier::Persistence,
            ),
            type_: Some("Opaque".to_string()),
            string_data: Some(BTreeMap::from([
                (
                    SECRET_USERNAME_KEY.to_string(),
                    self.config.database_username.clone(),
                ),
                (
                    SECRET_PASSWORD_KEY.to_string(),
                    self.config.database_password.clone(),
                ),
            ])),
            ..Secret::default()
        }
    }

    fn workload(&self, tier: Tier) -> Deployment {
        let labels = self.labels(tier);
        Deployment {
            metadata: self.metadata(self.workload_name(tier), tier),
            spec: Some(DeploymentSpec {
                replicas: Some(tier.desired_replicas(&self.app.spec)),
                selector: LabelSelector {
                    match_labels: Some(labels.clone()),
                    ..LabelSelector::default()
                },
                template: PodTemplateSpec {
                    metadata: Some(ObjectMeta {
                        labels: Some(labels),
                        ..ObjectMeta::default()
                    }),
                    spec: Some(PodSpec {
                        containers: vec![self.container(tier)],
                        ..PodSpec::default()
                    }),
                },
                ..DeploymentSpec::default()
            }),
            ..Deployment::default()
        }
    }

    fn container(&self, tier: Tier) -> Container {
        let (name, port, pull_policy, env) = match tier {
            Tier::Persistence => ("mysql", PERSISTENCE_PORT, None, self.persistence_env()),
            Tier::Backend => (
                "visitors-service",
                BACKEND_PORT,
                Some("Always".to_string()),
                self.backend_env(),
            ),
            Tier::Frontend => (
                "visitors-webui",
                FRONTEND_PORT,
                Some("Always".to_string()),
                self.frontend_env(),
            ),
        };

        Container {
            name: name.to_string(),
            image: Some(self.image(tier).to_string()),
            image_pull_policy: pull_policy,
            ports: Some(vec![ContainerPort {
                container_port: port,
                name: Some(tier.as_str().to_string()),
                ..ContainerPort::default()
            }]),
            env: Some(env),
            ..Container::default()
        }
    }

    fn persistence_env(&self) -> Vec<EnvVar> {
        vec![
            plain_env("MYSQL_ROOT_PASSWORD", &self.config.database_root_password),
            plain_env("MYSQL_DATABASE", &self.config.database_name),
            self.secret_env("MYSQL_USER", SECRET_USERNAME_KEY),
            self.secret_env("MYSQL_PASSWORD", SECRET_PASSWORD_KEY),
        ]
    }

    fn backend_env(&self) -> Vec<EnvVar> {
        vec![
            plain_env("MYSQL_DATABASE", &self.config.database_name),
            plain_env("MYSQL_SERVICE_HOST", &self.config.persistence_service_name),
            self.secret_env("MYSQL_USERNAME", SECRET_USERNAME_KEY),
            self.secret_env("MYSQL_PASSWORD", SECRET_PASSWORD_KEY),
        ]
    }

    fn frontend_env(&self) -> Vec<EnvVar> {
        vec![plain_env("REACT_APP_TITLE", &self.app.spec.title)]
    }

    fn secret_env(&self, name: &str, key: &str) -> EnvVar {
        EnvVar {
            name: name.to_string(),
            value_from: Some(EnvVarSource {
                secret_key_ref: Some(SecretKeySelector {
                    name: self.config.persistence_secret_name.clone(),
                    key: key.to_string(),
                    optional: None,
                }),
                ..EnvVarSource::default()
            }),
            ..EnvVar::default()
        }
    }

    fn service(&self, tier: Tier) -> Service {
        let (port, node_port, service_type, cluster_ip) = match tier {
            // Headless: MySQL is addressed through DNS only
            Tier::Persistence => (PERSISTENCE_PORT, None, None, Some("None".to_string())),
            Tier::Backend => (
                BACKEND_PORT,
                self.config.backend_node_port,
                Some("NodePort".to_string()),
                None,
            ),
            Tier::Frontend => (
                FRONTEND_PORT,
                self.config.frontend_node_port,
                Some("NodePort".to_string()),
                None,
            ),
        };

        Service {
            metadata: self.metadata(self.service_name(tier), tier),
            spec: Some(ServiceSpec {
                selector: Some(self.labels(tier)),
                ports: Some(vec![ServicePort {
                    port,
                    target_port: Some(IntOrString::Int(port)),
                    node_port,
                    protocol: Some("TCP".to_string()),
                    ..ServicePort::default()
                }]),
                type_: service_type,
                cluster_ip,
                ..ServiceSpec::default()
            }),
            ..Service::default()
        }
    }
}

fn plain_env(name: &str, value: &str) -> EnvVar {
    EnvVar {
        name: name.to_string(),
        value: Some(value.to_string()),
        ..EnvVar::default()
    }
}
