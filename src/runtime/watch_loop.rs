//! # Watch Loop
//!
//! Runs the Email and EmailSenderConfig controllers side by side and
//! triggers reconciliation when changes are detected.
//!
//! The Email controller also watches EmailSenderConfig objects: a config
//! that appears or changes re-triggers the pending Emails that reference it.

use crate::constants::{
    DEFAULT_WATCH_BACKOFF_MAX_MS, DEFAULT_WATCH_BACKOFF_START_MS,
    DEFAULT_WATCH_RESTART_DELAY_SECS,
};
use crate::controller::reconciler::{
    emails_referencing, reconcile_email, reconcile_sender_config, revalidation_due_in,
    Reconciler, ReconcilerError,
};
use crate::controller::server::ServerState;
use crate::crd::{Email, EmailSenderConfig};
use crate::observability::metrics;
use crate::runtime::error_policy::{handle_reconciliation_error, handle_watch_stream_error};
use futures::StreamExt;
use kube::api::Api;
use kube::{Client, Resource, ResourceExt};
use kube_runtime::controller::{self, Action};
use kube_runtime::{watcher, Controller};
use std::fmt::Debug;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn, Instrument, Span};

/// Run both controllers until shutdown
///
/// A controller stream that ends without a shutdown request is restarted.
pub async fn run_watch_loop(
    client: Client,
    reconciler: Arc<Reconciler>,
    server_state: Arc<ServerState>,
) -> Result<(), anyhow::Error> {
    info!("Starting controller watch loop...");

    // Set up shutdown signal handler - mark server as not ready when SIGTERM/SIGINT received
    let shutdown_server_state = Arc::clone(&server_state);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received shutdown signal (SIGINT/SIGTERM), initiating graceful shutdown...");
        }
        shutdown_server_state.set_ready(false);
        info!("Marked server as not ready, waiting for in-flight reconciliations to complete...");
    });

    let namespace = reconciler.config.watch_namespace.clone();
    match namespace.as_deref() {
        Some(ns) => info!("Watching namespace '{}'", ns),
        None => info!("Watching all namespaces"),
    }

    loop {
        if !server_state.ready() {
            info!("Shutdown requested, exiting watch loop");
            break;
        }

        let watch_span = tracing::span!(
            tracing::Level::INFO,
            "controller.watch",
            operation = "watch_loop"
        );

        let emails: Api<Email> = scoped_api(client.clone(), namespace.as_deref());
        let configs: Api<EmailSenderConfig> = scoped_api(client.clone(), namespace.as_deref());
        let controller_config = controller::Config::default()
            .concurrency(reconciler.config.max_concurrent_reconciliations);

        let email_controller =
            Controller::new(emails, watcher::Config::default().any_semantic());
        let email_store = email_controller.store();
        let email_future = email_controller
            .watches(configs.clone(), watcher::Config::default(), move |config| {
                emails_referencing(&config, email_store.state())
            })
            .with_config(controller_config.clone())
            .shutdown_on_signal()
            .run(
                reconcile_email_event,
                handle_reconciliation_error::<Email>,
                Arc::clone(&reconciler),
            )
            .for_each(log_controller_event("Email"));

        let config_future = Controller::new(configs, watcher::Config::default().any_semantic())
            .with_config(controller_config)
            .shutdown_on_signal()
            .run(
                reconcile_sender_config_event,
                handle_reconciliation_error::<EmailSenderConfig>,
                Arc::clone(&reconciler),
            )
            .for_each(log_controller_event("EmailSenderConfig"));

        futures::future::join(email_future, config_future)
            .instrument(watch_span)
            .await;

        if !server_state.ready() {
            info!("Shutdown requested, exiting watch loop");
            break;
        }

        warn!(
            "Controller watch stream ended, restarting in {} seconds...",
            DEFAULT_WATCH_RESTART_DELAY_SECS
        );
        tokio::time::sleep(std::time::Duration::from_secs(
            DEFAULT_WATCH_RESTART_DELAY_SECS,
        ))
        .await;
    }

    info!("Controller stopped gracefully");
    Ok(())
}

fn scoped_api<K>(client: Client, namespace: Option<&str>) -> Api<K>
where
    K: Resource<Scope = k8s_openapi::NamespaceResourceScope, DynamicType = ()>,
{
    match namespace {
        Some(ns) => Api::namespaced(client, ns),
        None => Api::all(client),
    }
}

/// Per-reconcile span handed to the reconcilers
fn reconcile_span<K>(obj: &K) -> Span
where
    K: Resource<DynamicType = ()>,
{
    let kind = K::kind(&());
    tracing::info_span!(
        "controller.watch.reconcile",
        resource.kind = kind.as_ref(),
        resource.name = obj.name_any().as_str(),
        resource.namespace = obj.namespace().as_deref().unwrap_or("default"),
        resource.version = obj.resource_version().as_deref().unwrap_or("unknown"),
        resource.generation = obj.meta().generation.unwrap_or(0),
    )
}

async fn reconcile_email_event(
    email: Arc<Email>,
    ctx: Arc<Reconciler>,
) -> Result<Action, ReconcilerError> {
    let span = reconcile_span(email.as_ref());
    let start = Instant::now();
    metrics::increment_reconciliations("Email");

    let result = reconcile_email(&email, &ctx, &span).await;
    metrics::observe_reconciliation_duration("Email", start.elapsed().as_secs_f64());

    let outcome = result?;
    debug!(parent: &span, outcome = ?outcome, "watch.event.reconciled");
    // Emails are never revisited on a timer
    Ok(Action::await_change())
}

async fn reconcile_sender_config_event(
    config: Arc<EmailSenderConfig>,
    ctx: Arc<Reconciler>,
) -> Result<Action, ReconcilerError> {
    let span = reconcile_span(config.as_ref());

    // Our own status write triggers a watch event; do not trial-send again for it
    if let Some(remaining) = revalidation_due_in(&config, chrono::Utc::now()) {
        debug!(
            parent: &span,
            remaining_secs = remaining.as_secs(),
            "Skipping validation - spec unchanged and next validation not yet due"
        );
        return Ok(Action::requeue(remaining));
    }

    let start = Instant::now();
    metrics::increment_reconciliations("EmailSenderConfig");

    let result = reconcile_sender_config(&config, &ctx, &span).await;
    metrics::observe_reconciliation_duration(
        "EmailSenderConfig",
        start.elapsed().as_secs_f64(),
    );

    let status = result?;
    debug!(parent: &span, validation.status = %status, "watch.event.reconciled");
    Ok(Action::requeue(
        ctx.config.sender_config_revalidation_duration(),
    ))
}

/// Consume controller events, classifying watch errors
fn log_controller_event<T, E>(
    kind: &'static str,
) -> impl FnMut(
    Result<T, controller::Error<E, watcher::Error>>,
) -> futures::future::BoxFuture<'static, ()>
where
    T: Debug + Send + 'static,
    E: std::error::Error + Send + 'static,
{
    let backoff = Arc::new(AtomicU64::new(DEFAULT_WATCH_BACKOFF_START_MS));
    move |event| {
        let backoff = Arc::clone(&backoff);
        Box::pin(async move {
            match event {
                Ok(obj) => {
                    backoff.store(DEFAULT_WATCH_BACKOFF_START_MS, Ordering::Relaxed);
                    debug!(resource.kind = kind, object = ?obj, "watch.event.success");
                }
                // Already logged and requeued by the error policy
                Err(controller::Error::ReconcilerFailed(e, obj)) => {
                    debug!(
                        resource.kind = kind,
                        object = %obj,
                        error = %e,
                        "watch.event.reconciliation_failed"
                    );
                }
                Err(controller::Error::ObjectNotFound(obj)) => {
                    debug!(resource.kind = kind, object = %obj, "watch.event.object_gone");
                }
                Err(e) => {
                    let error_string = format!("{e:?}");
                    handle_watch_stream_error(
                        &error_string,
                        &backoff,
                        DEFAULT_WATCH_BACKOFF_MAX_MS,
                        DEFAULT_WATCH_RESTART_DELAY_SECS,
                    )
                    .await;
                }
            }
        })
    }
}
