//! # Error Policy
//!
//! Error handling and backoff logic for the controller watch loop.
//! This module handles reconciliation errors and watch stream errors.

use crate::controller::reconciler::{Reconciler, ReconcilerError};
use crate::crd::VisitorsApp;
use crate::observability;
use crate::store::ObjectKey;
use kube_runtime::controller::Action;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// Decide when a failed `VisitorsApp` is retried
///
/// Errors that carry a requeue hint (missing dependent, write conflict) use
/// it as-is. Everything else advances the resource's own Fibonacci backoff,
/// which is cleared by the next successful pass.
pub fn handle_reconciliation_error(
    obj: Arc<VisitorsApp>,
    error: &ReconcilerError,
    ctx: Arc<Reconciler>,
) -> Action {
    let key = ObjectKey::new(
        obj.metadata.namespace.as_deref().unwrap_or("default"),
        obj.metadata.name.as_deref().unwrap_or("unknown"),
    );

    let error_span = tracing::span!(
        tracing::Level::ERROR,
        "controller.watch.reconciliation_error",
        resource.name = key.name.as_str(),
        resource.namespace = key.namespace.as_str(),
        error = %error
    );
    let _error_guard = error_span.enter();

    observability::metrics::increment_reconciliation_errors();
    observability::metrics::increment_requeues(error.reason());

    if let Some(delay) = error.requeue_hint() {
        info!(
            reason = error.reason(),
            "Retrying {} in {}ms",
            key,
            delay.as_millis()
        );
        return Action::requeue(delay);
    }

    let (delay, error_count) = ctx.next_error_backoff(&key);
    let next_trigger_time = chrono::Utc::now()
        + chrono::Duration::from_std(delay).unwrap_or_else(|_| chrono::Duration::zero());

    error!("Reconciliation error for {}: {}", key, error);
    info!(
        "🔄 Retrying with Fibonacci backoff: {}s (error count: {}, trigger source: error-backoff)",
        delay.as_secs(),
        error_count
    );
    info!(
        "📅 Next retry scheduled: {} (in {}s, trigger source: error-backoff)",
        next_trigger_time.to_rfc3339(),
        delay.as_secs()
    );

    Action::requeue(delay)
}

/// How a watch stream error should be handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchErrorKind {
    Unauthorized,
    Expired,
    Throttled,
    NotFound,
    Other,
}

/// Classify a watch stream error from its debug rendering
#[must_use]
pub fn classify_watch_error(error_string: &str) -> WatchErrorKind {
    // 404 before 401: a plain-text 404 surfaces as a serde error mentioning WatchFailed
    let is_not_found = error_string.contains("ObjectNotFound")
        || error_string.contains("404")
        || error_string.contains("not found");
    let is_401 =
        (error_string.contains("401") || error_string.contains("Unauthorized")) && !is_not_found;
    let is_410 = error_string.contains("410")
        || error_string.contains("too old resource version")
        || error_string.contains("Expired")
        || error_string.contains("Gone");
    let is_429 = error_string.contains("429")
        || error_string.contains("storage is (re)initializing")
        || error_string.contains("TooManyRequests");

    if is_401 {
        WatchErrorKind::Unauthorized
    } else if is_410 {
        WatchErrorKind::Expired
    } else if is_429 {
        WatchErrorKind::Throttled
    } else if is_not_found {
        WatchErrorKind::NotFound
    } else {
        WatchErrorKind::Other
    }
}

/// Handle watch stream errors with appropriate classification and backoff
///
/// Returns `None` to filter out the error (allow restart) or `Some(())` to continue.
pub async fn handle_watch_stream_error(
    error_string: &str,
    backoff: &Arc<AtomicU64>,
    max_backoff_ms: u64,
    watch_restart_delay: Duration,
) -> Option<()> {
    let error_span = tracing::span!(
        tracing::Level::WARN,
        "controller.watch.error",
        error = %error_string
    );
    let _error_guard = error_span.enter();

    match classify_watch_error(error_string) {
        WatchErrorKind::Unauthorized => {
            error!("❌ Watch authentication failed (401 Unauthorized) - RBAC may have been revoked or token expired");
            error!("   Verify the operator's ClusterRole still grants list/watch on visitorsapps, deployments, services and secrets:");
            error!("      kubectl auth can-i watch visitorsapps --as=system:serviceaccount:<namespace>:visitors-operator --all-namespaces");
            warn!(
                "⏳ Waiting {}s before retrying watch (RBAC may need time to propagate)...",
                watch_restart_delay.as_secs()
            );
            tokio::time::sleep(watch_restart_delay).await;
            None
        }
        WatchErrorKind::Expired => {
            warn!("Watch resource version expired (410) - this is normal during pod restarts, watch will restart");
            None
        }
        WatchErrorKind::Throttled => {
            let current_backoff = backoff.load(Ordering::Relaxed);
            warn!(
                "API server storage reinitializing (429), backing off for {}ms before restart...",
                current_backoff
            );
            tokio::time::sleep(Duration::from_millis(current_backoff)).await;
            let new_backoff = current_backoff.saturating_mul(2).min(max_backoff_ms);
            backoff.store(new_backoff, Ordering::Relaxed);
            None
        }
        WatchErrorKind::NotFound => {
            warn!(
                "Resource not found (404) - this may be normal if a resource was deleted or the CRD is missing. Error: {}",
                error_string
            );
            Some(())
        }
        WatchErrorKind::Other => {
            error!("Controller stream error: {}", error_string);
            tokio::time::sleep(watch_restart_delay).await;
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ControllerConfig;
    use crate::crd::VisitorsAppSpec;
    use crate::store::{MemoryClusterStore, ResourceKind, StoreError};

    fn app() -> Arc<VisitorsApp> {
        let mut app = VisitorsApp::new(
            "acme",
            VisitorsAppSpec {
                size: 1,
                title: "t".to_string(),
            },
        );
        app.metadata.namespace = Some("default".to_string());
        Arc::new(app)
    }

    fn ctx() -> Arc<Reconciler> {
        Arc::new(Reconciler::new(
            Arc::new(MemoryClusterStore::new()),
            &ControllerConfig::default(),
        ))
    }

    fn transient() -> ReconcilerError {
        ReconcilerError::Lookup {
            kind: ResourceKind::Secret,
            key: ObjectKey::new("default", "mysql-auth"),
            source: StoreError::Unavailable("connection reset".to_string()),
        }
    }

    #[test]
    fn test_transient_errors_back_off_fibonacci() {
        let ctx = ctx();

        let delays: Vec<Action> = (0..4)
            .map(|_| handle_reconciliation_error(app(), &transient(), ctx.clone()))
            .collect();

        assert_eq!(
            delays,
            vec![
                Action::requeue(Duration::from_secs(5)),
                Action::requeue(Duration::from_secs(5)),
                Action::requeue(Duration::from_secs(10)),
                Action::requeue(Duration::from_secs(15)),
            ]
        );
    }

    #[test]
    fn test_hinted_errors_skip_the_backoff() {
        let ctx = ctx();
        let missing = ReconcilerError::DependentMissing {
            tier: crate::controller::reconciler::Tier::Backend,
            key: ObjectKey::new("default", "acme-backend"),
            retry_after: Duration::from_secs(5),
        };

        assert_eq!(
            handle_reconciliation_error(app(), &missing, ctx.clone()),
            Action::requeue(Duration::from_secs(5))
        );
        // The backoff was never advanced
        assert_eq!(
            ctx.next_error_backoff(&ObjectKey::new("default", "acme")),
            (Duration::from_secs(5), 1)
        );
    }

    #[test]
    fn test_watch_error_classification() {
        assert_eq!(
            classify_watch_error("Api(ErrorResponse { code: 401, reason: Unauthorized })"),
            WatchErrorKind::Unauthorized
        );
        assert_eq!(
            classify_watch_error("WatchFailed(Api(ErrorResponse { code: 410, reason: Expired }))"),
            WatchErrorKind::Expired
        );
        assert_eq!(
            classify_watch_error("TooManyRequests: storage is (re)initializing"),
            WatchErrorKind::Throttled
        );
        assert_eq!(
            classify_watch_error("WatchFailed(SerdeError(invalid type: integer `404`))"),
            WatchErrorKind::NotFound
        );
        assert_eq!(
            classify_watch_error("connection reset by peer"),
            WatchErrorKind::Other
        );
    }

    #[tokio::test]
    async fn test_throttling_doubles_backoff_up_to_max() {
        let backoff = Arc::new(AtomicU64::new(1));

        handle_watch_stream_error("429", &backoff, 3, Duration::ZERO).await;
        assert_eq!(backoff.load(Ordering::Relaxed), 2);
        handle_watch_stream_error("429", &backoff, 3, Duration::ZERO).await;
        assert_eq!(backoff.load(Ordering::Relaxed), 3);
    }
}
