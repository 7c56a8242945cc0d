//! # Error Policy
//!
//! Error handling for the controller watch loops.
//! This module handles reconciliation errors and watch stream errors.

use crate::config::ControllerConfig;
use crate::controller::reconciler::{Reconciler, ReconcilerError};
use crate::observability;
use kube::Resource;
use kube_runtime::controller::Action;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// Requeue a failed reconcile after a fixed delay
///
/// Version conflicts are retried quickly with a fresh read of the object;
/// everything else waits for the configured error delay.
pub fn handle_reconciliation_error<K>(
    obj: Arc<K>,
    error: &ReconcilerError,
    ctx: Arc<Reconciler>,
) -> Action
where
    K: Resource<DynamicType = ()>,
{
    let kind = K::kind(&());
    let name = obj.meta().name.as_deref().unwrap_or("unknown");
    let namespace = obj.meta().namespace.as_deref().unwrap_or("default");

    // Create error span for reconciliation errors
    let error_span = tracing::span!(
        tracing::Level::ERROR,
        "controller.watch.reconciliation_error",
        resource.kind = kind.as_ref(),
        resource.name = name,
        resource.namespace = namespace,
        error = %error
    );
    let _error_guard = error_span.enter();

    observability::metrics::increment_reconciliation_errors(&kind);

    let delay = requeue_delay(error, &ctx.config);
    if error.is_conflict() {
        info!(
            "{} {}/{} changed during reconciliation, retrying in {}s",
            kind,
            namespace,
            name,
            delay.as_secs()
        );
    } else {
        error!("Reconciliation error for {} {}/{}: {}", kind, namespace, name, error);
        info!("Retrying in {}s", delay.as_secs());
    }

    Action::requeue(delay)
}

/// Delay before a failed reconcile is retried
#[must_use]
pub fn requeue_delay(error: &ReconcilerError, config: &ControllerConfig) -> Duration {
    if error.is_conflict() {
        config.conflict_requeue_duration()
    } else {
        config.reconciliation_error_requeue_duration()
    }
}

/// Class of a watch stream failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchErrorKind {
    /// 401: RBAC revoked or service account token expired
    Unauthorized,
    /// 404: CRD missing or object deleted
    NotFound,
    /// 410: resource version too old, the watcher relists
    Expired,
    /// 429: API server throttling or storage reinitializing
    Throttled,
    Other,
}

/// Classify a watch error from its debug representation
#[must_use]
pub fn classify_watch_error(error_string: &str) -> WatchErrorKind {
    // Check 404 before 401: a plain-text 404 body surfaces as a serde error
    // whose chain also mentions WatchFailed
    let is_not_found = error_string.contains("ObjectNotFound")
        || error_string.contains("404")
        || error_string.contains("not found");
    if is_not_found {
        return WatchErrorKind::NotFound;
    }
    if error_string.contains("401") || error_string.contains("Unauthorized") {
        return WatchErrorKind::Unauthorized;
    }
    if error_string.contains("410")
        || error_string.contains("too old resource version")
        || error_string.contains("Expired")
        || error_string.contains("Gone")
    {
        return WatchErrorKind::Expired;
    }
    if error_string.contains("429")
        || error_string.contains("storage is (re)initializing")
        || error_string.contains("TooManyRequests")
    {
        return WatchErrorKind::Throttled;
    }
    WatchErrorKind::Other
}

/// Log a watch stream error and pause the stream where the class calls for it
pub async fn handle_watch_stream_error(
    error_string: &str,
    backoff: &AtomicU64,
    max_backoff_ms: u64,
    watch_restart_delay_secs: u64,
) -> WatchErrorKind {
    let error_span = tracing::span!(
        tracing::Level::WARN,
        "controller.watch.error",
        error = %error_string
    );
    let _error_guard = error_span.enter();

    let kind = classify_watch_error(error_string);
    match kind {
        WatchErrorKind::Unauthorized => {
            error!(
                "Watch authentication failed (401 Unauthorized) - RBAC may have been revoked or token expired"
            );
            error!("Verify the ClusterRole grants list/watch on emails and emailsenderconfigs:");
            error!(
                "  kubectl auth can-i watch emails.email.hermes.sender --as=system:serviceaccount:<namespace>:hermes-mail-controller"
            );
            warn!(
                "Waiting {}s before retrying watch (RBAC may need time to propagate)...",
                watch_restart_delay_secs
            );
            tokio::time::sleep(Duration::from_secs(watch_restart_delay_secs)).await;
        }
        WatchErrorKind::Expired => {
            warn!(error_type = "410", "watch.error.resource_version_expired");
        }
        WatchErrorKind::Throttled => {
            let current_backoff = backoff.load(Ordering::Relaxed);
            warn!(
                "API server throttling (429), backing off for {}ms...",
                current_backoff
            );
            tokio::time::sleep(Duration::from_millis(current_backoff)).await;
            backoff.store(
                current_backoff.saturating_mul(2).min(max_backoff_ms),
                Ordering::Relaxed,
            );
        }
        WatchErrorKind::NotFound => {
            warn!(
                "Resource not found (404) - normal for deleted objects, otherwise check that the CRDs are installed. Error: {}",
                error_string
            );
        }
        WatchErrorKind::Other => {
            error!("Controller stream error: {}", error_string);
            tokio::time::sleep(Duration::from_secs(watch_restart_delay_secs)).await;
        }
    }
    kind
}
