//! # Configuration
//!
//! Controller, HTTP server and manifest settings, loaded from environment
//! variables. Environment variables are populated from a ConfigMap using
//! `envFrom` in the operator deployment.

mod controller;
mod manifests;
mod server;

pub use controller::ControllerConfig;
pub use manifests::ManifestConfig;
pub use server::ServerConfig;

/// Read environment variable or return default value
pub(crate) fn env_var_or_default<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Read environment variable as string or return default
pub(crate) fn env_var_or_default_str(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Read an optional numeric environment variable.
///
/// Unset keeps the default; an empty or `none` value disables the setting.
pub(crate) fn env_var_optional<T: std::str::FromStr>(key: &str, default: Option<T>) -> Option<T> {
    match std::env::var(key) {
        Ok(v) if v.is_empty() || v.eq_ignore_ascii_case("none") => None,
        Ok(v) => v.parse().ok().or(default),
        Err(_) => default,
    }
}
