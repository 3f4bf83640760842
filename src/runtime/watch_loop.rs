//! # Watch Loop
//!
//! Controller watch loop that monitors `VisitorsApp` resources, plus the
//! Deployments, Services and Secrets they own, and triggers reconciliation
//! when any of them changes.

use crate::config::ControllerConfig;
use crate::controller::reconciler::{reconcile, Reconciler};
use crate::controller::server::ServerState;
use crate::crd::VisitorsApp;
use crate::runtime::error_policy::{handle_reconciliation_error, handle_watch_stream_error};
use futures::StreamExt;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{Secret, Service};
use kube::api::Api;
use kube::Client;
use kube_runtime::controller::Config as RuntimeConfig;
use kube_runtime::{watcher, Controller};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;
use tracing::{debug, info, warn, Instrument};

/// Resolves on the first SIGINT or SIGTERM
async fn shutdown_signal() {
    let interrupt = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for SIGINT: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = interrupt => {}
        () = terminate => {}
    }
}

/// Mark the server not ready, then stop every running controller
///
/// Readiness is cleared first so the watch loop sees it once the stream
/// drains and exits instead of restarting.
pub(crate) fn request_shutdown(server_state: &ServerState, shutdown: &Notify) {
    server_state.set_ready(false);
    shutdown.notify_waiters();
}

/// Run the controller watch loop
///
/// Handles graceful shutdown and restarts the watch when the stream ends.
/// kube-runtime guarantees at most one in-flight reconcile per `VisitorsApp`;
/// distinct apps run in parallel up to `max_concurrent_reconciliations`.
pub async fn run_watch_loop(
    client: Client,
    reconciler: Arc<Reconciler>,
    server_state: Arc<ServerState>,
    config: ControllerConfig,
) -> Result<(), anyhow::Error> {
    let backoff_duration_ms = Arc::new(AtomicU64::new(config.backoff_start_ms));

    let shutdown = Arc::new(Notify::new());
    let shutdown_server_state = server_state.clone();
    let shutdown_notify = shutdown.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        info!("Received shutdown signal (SIGINT/SIGTERM), initiating graceful shutdown...");
        request_shutdown(&shutdown_server_state, &shutdown_notify);
        info!("Marked server as not ready, waiting for in-flight reconciliations to complete...");
    });

    loop {
        // Created before the readiness check so a shutdown in between still fires it
        let shutdown_requested = shutdown.clone().notified_owned();
        if !server_state.ready() {
            info!("Shutdown requested, exiting watch loop");
            break;
        }

        let watch_span = tracing::span!(
            tracing::Level::INFO,
            "controller.watch",
            operation = "watch_loop"
        );

        info!(
            max_concurrent = config.max_concurrent_reconciliations,
            "Starting controller watch loop..."
        );

        let apps: Api<VisitorsApp> = Api::all(client.clone());
        let backoff = backoff_duration_ms.clone();
        let backoff_start_ms = config.backoff_start_ms;
        let backoff_max_ms = config.backoff_max_ms;
        let restart_delay = config.watch_restart_delay_duration();

        Controller::new(apps, watcher::Config::default().any_semantic())
            .owns(Api::<Deployment>::all(client.clone()), watcher::Config::default())
            .owns(Api::<Service>::all(client.clone()), watcher::Config::default())
            .owns(Api::<Secret>::all(client.clone()), watcher::Config::default())
            .with_config(RuntimeConfig::default().concurrency(config.max_concurrent_reconciliations))
            .graceful_shutdown_on(shutdown_requested)
            .run(reconcile, handle_reconciliation_error, reconciler.clone())
            .filter_map(move |event| {
                let backoff = backoff.clone();
                async move {
                    match &event {
                        Ok((obj, action)) => {
                            backoff.store(backoff_start_ms, Ordering::Relaxed);
                            debug!(resource = %obj.name, action = ?action, "watch.event.reconciled");
                            Some(event)
                        }
                        Err(e) => {
                            let error_string = format!("{e:?}");
                            handle_watch_stream_error(
                                &error_string,
                                &backoff,
                                backoff_max_ms,
                                restart_delay,
                            )
                            .await
                            .map(|()| event)
                        }
                    }
                }
            })
            .for_each(|_| futures::future::ready(()))
            .instrument(watch_span)
            .await;

        if !server_state.ready() {
            info!("Shutdown requested, exiting watch loop");
            break;
        }

        let delay = config.watch_restart_delay_after_end_duration();
        warn!(
            "Controller watch stream ended, restarting in {} seconds...",
            delay.as_secs()
        );
        tokio::time::sleep(delay).await;
    }

    info!("Controller stopped gracefully");
    Ok(())
}
