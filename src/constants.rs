//! # Constants
//!
//! Shared constants used throughout the controller.
//!
//! These values represent reasonable defaults and can be overridden via
//! configuration or environment variables where applicable.

/// Default HTTP server port for metrics and health probes
pub const DEFAULT_METRICS_PORT: u16 = 5000;

/// Default HTTP server startup timeout (how long to wait for server to be ready)
pub const DEFAULT_SERVER_STARTUP_TIMEOUT_SECS: u64 = 10;

/// Default HTTP server readiness poll interval
pub const DEFAULT_SERVER_POLL_INTERVAL_MS: u64 = 50;

/// Delay before re-checking a dependency tier that is not ready yet (seconds)
pub const DEFAULT_READINESS_POLL_SECS: u64 = 5;

/// Delay before retrying when a workload we expect to exist is not visible yet (seconds)
pub const DEFAULT_DEPENDENT_MISSING_REQUEUE_SECS: u64 = 5;

/// Fibonacci error backoff floor (seconds)
pub const DEFAULT_ERROR_BACKOFF_MIN_SECS: u64 = 5;

/// Fibonacci error backoff ceiling (seconds)
pub const DEFAULT_ERROR_BACKOFF_MAX_SECS: u64 = 300;

/// Default exponential backoff starting value for watch stream errors (milliseconds)
pub const DEFAULT_BACKOFF_START_MS: u64 = 1000;

/// Default exponential backoff maximum value for watch stream errors (milliseconds)
pub const DEFAULT_BACKOFF_MAX_MS: u64 = 30_000;

/// Default delay before restarting watch stream after unknown errors (seconds)
pub const DEFAULT_WATCH_RESTART_DELAY_SECS: u64 = 5;

/// Default delay before restarting watch stream after it ends (seconds)
pub const DEFAULT_WATCH_RESTART_DELAY_AFTER_END_SECS: u64 = 1;

/// Default upper bound on VisitorsApp resources reconciled at the same time
pub const DEFAULT_MAX_CONCURRENT_RECONCILIATIONS: u16 = 10;

/// Field manager name used for server-side writes
pub const FIELD_MANAGER: &str = "visitors-operator";

/// Annotation used by `vactl reconcile` to force a reconciliation
pub const RECONCILE_ANNOTATION: &str = "visitors.octopilot.io/reconcile";

/// Value of the `app` label on every managed object
pub const APP_LABEL_VALUE: &str = "visitors";

/// Singleton names of the persistence tier objects
pub const DEFAULT_PERSISTENCE_WORKLOAD_NAME: &str = "mysql";
pub const DEFAULT_PERSISTENCE_SERVICE_NAME: &str = "mysql-service";
pub const DEFAULT_PERSISTENCE_SECRET_NAME: &str = "mysql-auth";

/// Container images per tier
pub const DEFAULT_PERSISTENCE_IMAGE: &str = "mysql:5.7";
pub const DEFAULT_BACKEND_IMAGE: &str = "jdob/visitors-service:1.0.0";
pub const DEFAULT_FRONTEND_IMAGE: &str = "jdob/visitors-webui:1.0.0";

/// Container ports per tier
pub const PERSISTENCE_PORT: i32 = 3306;
pub const BACKEND_PORT: i32 = 8000;
pub const FRONTEND_PORT: i32 = 3000;

/// Node ports exposing the backend and frontend outside the cluster
pub const DEFAULT_BACKEND_NODE_PORT: i32 = 30685;
pub const DEFAULT_FRONTEND_NODE_PORT: i32 = 30686;

/// Database bootstrap values
pub const DEFAULT_DATABASE_NAME: &str = "visitors";
pub const DEFAULT_DATABASE_USERNAME: &str = "visitors-user";
pub const DEFAULT_DATABASE_PASSWORD: &str = "visitors-pass";
pub const DEFAULT_DATABASE_ROOT_PASSWORD: &str = "password";
