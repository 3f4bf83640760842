//! # Manifest Configuration
//!
//! Names, images, ports and database bootstrap values baked into the
//! objects the operator creates. The persistence tier is a singleton per
//! namespace, so its object names are fixed here instead of derived from the
//! `VisitorsApp` name.

use super::{env_var_optional, env_var_or_default_str};
use crate::constants::{
    APP_LABEL_VALUE, DEFAULT_BACKEND_IMAGE, DEFAULT_BACKEND_NODE_PORT, DEFAULT_DATABASE_NAME,
    DEFAULT_DATABASE_PASSWORD, DEFAULT_DATABASE_ROOT_PASSWORD, DEFAULT_DATABASE_USERNAME,
    DEFAULT_FRONTEND_IMAGE, DEFAULT_FRONTEND_NODE_PORT, DEFAULT_PERSISTENCE_IMAGE,
    DEFAULT_PERSISTENCE_SECRET_NAME, DEFAULT_PERSISTENCE_SERVICE_NAME,
    DEFAULT_PERSISTENCE_WORKLOAD_NAME,
};

#[derive(Clone, PartialEq, Eq)]
pub struct ManifestConfig {
    /// Value of the `app` label
    pub app_label: String,
    pub persistence_workload_name: String,
    pub persistence_service_name: String,
    pub persistence_secret_name: String,
    pub persistence_image: String,
    pub backend_image: String,
    pub frontend_image: String,
    /// `None` lets the cluster pick a node port
    pub backend_node_port: Option<i32>,
    pub frontend_node_port: Option<i32>,
    pub database_name: String,
    pub database_username: String,
    pub database_password: String,
    pub database_root_password: String,
}

impl std::fmt::Debug for ManifestConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManifestConfig")
            .field("app_label", &self.app_label)
            .field("persistence_workload_name", &self.persistence_workload_name)
            .field("persistence_service_name", &self.persistence_service_name)
            .field("persistence_secret_name", &self.persistence_secret_name)
            .field("persistence_image", &self.persistence_image)
            .field("backend_image", &self.backend_image)
            .field("frontend_image", &self.frontend_image)
            .field("backend_node_port", &self.backend_node_port)
            .field("frontend_node_port", &self.frontend_node_port)
            .field("database_name", &self.database_name)
            .field("database_username", &self.database_username)
            .field("database_password", &"***")
            .field("database_root_password", &"***")
            .finish()
    }
}

impl Default for ManifestConfig {
    fn default() -> Self {
        Self {
            app_label: APP_LABEL_VALUE.to_string(),
            persistence_workload_name: DEFAULT_PERSISTENCE_WORKLOAD_NAME.to_string(),
            persistence_service_name: DEFAULT_PERSISTENCE_SERVICE_NAME.to_string(),
            persistence_secret_name: DEFAULT_PERSISTENCE_SECRET_NAME.to_string(),
            persistence_image: DEFAULT_PERSISTENCE_IMAGE.to_string(),
            backend_image: DEFAULT_BACKEND_IMAGE.to_string(),
            frontend_image: DEFAULT_FRONTEND_IMAGE.to_string(),
            backend_node_port: Some(DEFAULT_BACKEND_NODE_PORT),
            frontend_node_port: Some(DEFAULT_FRONTEND_NODE_PORT),
            database_name: DEFAULT_DATABASE_NAME.to_string(),
            database_username: DEFAULT_DATABASE_USERNAME.to_string(),
            database_password: DEFAULT_DATABASE_PASSWORD.to_string(),
            database_root_password: DEFAULT_DATABASE_ROOT_PASSWORD.to_string(),
        }
    }
}

impl ManifestConfig {
    /// Load manifest settings from environment variables with defaults
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            app_label: env_var_or_default_str("APP_LABEL", APP_LABEL_VALUE),
            persistence_workload_name: env_var_or_default_str(
                "PERSISTENCE_WORKLOAD_NAME",
                DEFAULT_PERSISTENCE_WORKLOAD_NAME,
            ),
            persistence_service_name: env_var_or_default_str(
                "PERSISTENCE_SERVICE_NAME",
                DEFAULT_PERSISTENCE_SERVICE_NAME,
            ),
            persistence_secret_name: env_var_or_default_str(
                "PERSISTENCE_SECRET_NAME",
                DEFAULT_PERSISTENCE_SECRET_NAME,
            ),
            persistence_image: env_var_or_default_str(
                "PERSISTENCE_IMAGE",
                DEFAULT_PERSISTENCE_IMAGE,
            ),
            backend_image: env_var_or_default_str("BACKEND_IMAGE", DEFAULT_BACKEND_IMAGE),
            frontend_image: env_var_or_default_str("FRONTEND_IMAGE", DEFAULT_FRONTEND_IMAGE),
            backend_node_port: env_var_optional(
                "BACKEND_NODE_PORT",
                Some(DEFAULT_BACKEND_NODE_PORT),
            ),
            frontend_node_port: env_var_optional(
                "FRONTEND_NODE_PORT",
                Some(DEFAULT_FRONTEND_NODE_PORT),
            ),
            database_name: env_var_or_default_str("DATABASE_NAME", DEFAULT_DATABASE_NAME),
            database_username: env_var_or_default_str(
                "DATABASE_USERNAME",
                DEFAULT_DATABASE_USERNAME,
            ),
            database_password: env_var_or_default_str(
                "DATABASE_PASSWORD",
                DEFAULT_DATABASE_PASSWORD,
            ),
            database_root_password: env_var_or_default_str(
                "DATABASE_ROOT_PASSWORD",
                DEFAULT_DATABASE_ROOT_PASSWORD,
            ),
        }
    }
}
