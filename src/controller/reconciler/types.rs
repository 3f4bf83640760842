//! # Types
//!
//! Core types for the reconciler.

use super::Tier;
use crate::config::{ControllerConfig, ManifestConfig};
use crate::controller::backoff::FibonacciBackoff;
use crate::crd::StatusField;
use crate::store::{ClusterStore, ObjectKey, ResourceKind, StoreError};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReconcilerError {
    #[error("failed to fetch VisitorsApp {key}: {source}")]
    FetchOwner {
        key: ObjectKey,
        #[source]
        source: StoreError,
    },

    #[error("failed to look up {kind} {key}: {source}")]
    Lookup {
        kind: ResourceKind,
        key: ObjectKey,
        #[source]
        source: StoreError,
    },

    #[error("failed to create {kind} {key}: {source}")]
    Create {
        kind: ResourceKind,
        key: ObjectKey,
        #[source]
        source: StoreError,
    },

    /// A workload that an earlier stage ensured is not visible yet
    #[error("{tier} workload {key} not found, retrying in {}s", .retry_after.as_secs())]
    DependentMissing {
        tier: Tier,
        key: ObjectKey,
        retry_after: Duration,
    },

    #[error("failed to update {kind} {key}: {source}")]
    Update {
        kind: ResourceKind,
        key: ObjectKey,
        #[source]
        source: StoreError,
    },

    #[error("failed to record status.{field} on VisitorsApp {key}: {source}")]
    StatusWrite {
        field: StatusField,
        key: ObjectKey,
        #[source]
        source: StoreError,
    },

    #[error("invalid VisitorsApp {key}: {reason}")]
    InvalidSpec { key: ObjectKey, reason: String },
}

impl ReconcilerError {
    /// Requeue delay this error asks for, bypassing the error backoff
    ///
    /// A missing dependent gets a short fixed delay. A write that lost an
    /// optimistic-concurrency race is retried straight away against fresh
    /// state. Everything else returns `None` and is left to the
    /// per-resource Fibonacci backoff.
    #[must_use]
    pub fn requeue_hint(&self) -> Option<Duration> {
        match self {
            ReconcilerError::DependentMissing { retry_after, .. } => Some(*retry_after),
            ReconcilerError::Update { source, .. } | ReconcilerError::StatusWrite { source, .. }
                if source.is_conflict() =>
            {
                Some(Duration::ZERO)
            }
            ReconcilerError::Create {
                source: StoreError::AlreadyExists { .. },
                ..
            } => Some(Duration::ZERO),
            _ => None,
        }
    }

    /// Short label for metrics and logs
    #[must_use]
    pub fn reason(&self) -> &'static str {
        match self {
            ReconcilerError::DependentMissing { .. } => "dependent-missing",
            _ if self.requeue_hint().is_some() => "conflict",
            ReconcilerError::InvalidSpec { .. } => "invalid-spec",
            _ => "error-backoff",
        }
    }
}

/// Backoff state for a specific resource
/// Tracks error count and backoff calculator for progressive retries
#[derive(Debug, Clone)]
pub struct BackoffState {
    pub backoff: FibonacciBackoff,
    pub error_count: u32,
}

impl BackoffState {
    #[must_use]
    pub fn new(min_secs: u64, max_secs: u64) -> Self {
        Self {
            backoff: FibonacciBackoff::new(min_secs, max_secs),
            error_count: 0,
        }
    }

    pub fn increment_error(&mut self) {
        self.error_count += 1;
    }

    pub fn reset(&mut self) {
        self.error_count = 0;
        self.backoff.reset();
    }
}

/// Shared reconciliation context
///
/// Holds no cluster state: every pass re-reads everything through `store`.
/// The only state kept across passes is the per-resource error backoff,
/// which belongs to the error policy rather than to the engine.
#[derive(Clone)]
pub struct Reconciler {
    pub store: Arc<dyn ClusterStore>,
    pub manifests: ManifestConfig,
    /// Delay before re-checking a dependency tier that is not ready
    pub readiness_poll: Duration,
    /// Delay before retrying when an ensured workload is not visible yet
    pub dependent_missing_requeue: Duration,
    pub error_backoff_min_secs: u64,
    pub error_backoff_max_secs: u64,
    // Backoff state per resource, only touched from the error policy and on success
    pub backoff_states: Arc<Mutex<HashMap<ObjectKey, BackoffState>>>,
    // Last reconcile annotation value seen per resource
    pub manual_triggers: Arc<Mutex<HashMap<ObjectKey, String>>>,
}

impl std::fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler")
            .field("manifests", &self.manifests)
            .field("readiness_poll", &self.readiness_poll)
            .field("dependent_missing_requeue", &self.dependent_missing_requeue)
            .finish_non_exhaustive()
    }
}

impl Reconciler {
    #[must_use]
    pub fn new(store: Arc<dyn ClusterStore>, config: &ControllerConfig) -> Self {
        Self {
            store,
            manifests: config.manifests.clone(),
            readiness_poll: config.readiness_poll_duration(),
            dependent_missing_requeue: config.dependent_missing_requeue_duration(),
            error_backoff_min_secs: config.error_backoff_min_secs,
            error_backoff_max_secs: config.error_backoff_max_secs,
            backoff_states: Arc::new(Mutex::new(HashMap::new())),
            manual_triggers: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Advance the error backoff of `key`, returning the delay and error count
    pub fn next_error_backoff(&self, key: &ObjectKey) -> (Duration, u32) {
        let mut states = self
            .backoff_states
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let state = states.entry(key.clone()).or_insert_with(|| {
            BackoffState::new(self.error_backoff_min_secs, self.error_backoff_max_secs)
        });
        state.increment_error();
        (state.backoff.next_backoff(), state.error_count)
    }

    /// Label what triggered this pass of `key`
    ///
    /// The reconcile annotation stays on the object after `vactl reconcile`,
    /// so only a value not seen before counts as a manual trigger.
    pub fn trigger_source(&self, key: &ObjectKey, annotation: Option<&str>) -> &'static str {
        let Some(value) = annotation else {
            return "watch";
        };
        let mut seen = self
            .manual_triggers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if seen.get(key).map(String::as_str) == Some(value) {
            return "watch";
        }
        seen.insert(key.clone(), value.to_string());
        "manual-cli"
    }

    /// Forget the error backoff of `key` after a successful pass
    pub fn reset_backoff(&self, key: &ObjectKey) {
        let mut states = self
            .backoff_states
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(state) = states.get_mut(key) {
            state.reset();
        }
    }
}
