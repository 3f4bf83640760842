//! # Reconcile
//!
//! The reconciliation engine. One pass fetches the `VisitorsApp`, validates
//! it and walks the stage pipeline, stopping at the first stage that does
//! not return [`Verdict::Continue`].

use super::drift::correct_replicas;
use super::ensure::ensure;
use super::manifests::ManifestBuilder;
use super::pipeline::{pipeline, Stage};
use super::readiness::is_ready;
use super::status::record_status;
use super::validation::validate;
use super::{Reconciler, ReconcilerError, Verdict};
use crate::constants::RECONCILE_ANNOTATION;
use crate::crd::VisitorsApp;
use crate::observability;
use crate::store::ObjectKey;
use kube_runtime::controller::Action;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, info_span, Instrument};

/// Run one reconcile pass for the app at `key`
///
/// An app that no longer exists is a successful no-op: its owned objects
/// are removed by the cluster garbage collector.
pub async fn reconcile_app(ctx: &Reconciler, key: &ObjectKey) -> Verdict {
    let app = match ctx.store.get_app(key).await {
        Ok(Some(app)) => app,
        Ok(None) => {
            info!(resource = %key, "VisitorsApp not found, assuming deleted");
            return Verdict::Continue;
        }
        Err(source) => {
            return ReconcilerError::FetchOwner {
                key: key.clone(),
                source,
            }
            .into()
        }
    };

    if let Err(e) = validate(&app, key) {
        return e.into();
    }
    let builder = match ManifestBuilder::new(&app, &ctx.manifests) {
        Ok(builder) => builder,
        Err(e) => return e.into(),
    };

    for stage in pipeline() {
        let verdict = run_stage(ctx, &app, key, &builder, *stage).await;
        if !verdict.is_continue() {
            debug!(resource = %key, stage = %stage, verdict = verdict.label(), "pass stopped");
            return verdict;
        }
    }

    debug!(resource = %key, "converged");
    Verdict::Continue
}

async fn run_stage(
    ctx: &Reconciler,
    app: &VisitorsApp,
    key: &ObjectKey,
    builder: &ManifestBuilder<'_>,
    stage: Stage,
) -> Verdict {
    let store = ctx.store.as_ref();
    match stage {
        Stage::Ensure(tier, kind) => {
            let Some(desired) = builder.build(tier, kind) else {
                return Verdict::Continue;
            };
            match ensure(store, &desired).await {
                Ok(_) => Verdict::Continue,
                Err(e) => e.into(),
            }
        }
        Stage::AwaitReady(tier) => {
            let workload = builder.workload_key(tier);
            if is_ready(store, tier, &workload, tier.required_ready(&app.spec)).await {
                Verdict::Continue
            } else {
                info!(resource = %key, tier = %tier, "waiting for tier to become ready");
                Verdict::RequeueAfter(ctx.readiness_poll)
            }
        }
        Stage::RecordStatus(tier) => {
            let Some(field) = tier.status_field() else {
                return Verdict::Continue;
            };
            match record_status(store, key, field, builder.image(tier)).await {
                Ok(()) => Verdict::Continue,
                Err(e) => e.into(),
            }
        }
        Stage::CorrectDrift(tier) => {
            correct_replicas(
                store,
                tier,
                &builder.workload_key(tier),
                tier.desired_replicas(&app.spec),
                ctx.dependent_missing_requeue,
            )
            .await
        }
    }
}

/// kube-runtime entry point
///
/// Records metrics, clears the error backoff after a pass that did not fail
/// and translates the verdict into an [`Action`].
pub async fn reconcile(
    app: Arc<VisitorsApp>,
    ctx: Arc<Reconciler>,
) -> Result<Action, ReconcilerError> {
    let key = ObjectKey::new(
        app.metadata.namespace.clone().unwrap_or_default(),
        app.metadata.name.clone().unwrap_or_default(),
    );
    let trigger = ctx.trigger_source(
        &key,
        app.metadata
            .annotations
            .as_ref()
            .and_then(|a| a.get(RECONCILE_ANNOTATION))
            .map(String::as_str),
    );

    let span = info_span!(
        "reconcile",
        resource.name = key.name.as_str(),
        resource.namespace = key.namespace.as_str(),
        resource.version = app.metadata.resource_version.as_deref().unwrap_or("unknown"),
        trigger
    );

    observability::metrics::increment_reconciliations();
    let start = Instant::now();
    let verdict = reconcile_app(&ctx, &key).instrument(span).await;
    observability::metrics::observe_reconciliation_duration(start.elapsed().as_secs_f64());

    match &verdict {
        Verdict::Continue => ctx.reset_backoff(&key),
        Verdict::RequeueAfter(_) | Verdict::RequeueImmediate => {
            ctx.reset_backoff(&key);
            observability::metrics::increment_requeues(verdict.label());
        }
        Verdict::Error(e) => {
            error!(resource = %key, error = %e, "reconciliation failed");
        }
    }

    verdict.into_action()
}
