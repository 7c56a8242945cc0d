//! # Email Reconciler
//!
//! Drives an `Email` from `""` to exactly one terminal delivery status.
//!
//! An Email is dispatched at most once: a terminal status at entry ends the
//! reconcile before any read, send or write. Otherwise the referenced
//! `EmailSenderConfig` decides whether a send may happen at all, the
//! credential is resolved, the message is handed to the provider selected by
//! the config, and the outcome is persisted with a conditional status patch.
//!
//! Once the provider has been called the outcome is final. A version
//! conflict on the status write re-reads the Email and re-applies the same
//! status; it never goes back through the send.

use super::types::{send_failure, EmailOutcome, Reconciler, ReconcilerError};
use crate::constants::MAX_STATUS_WRITE_ATTEMPTS;
use crate::credentials::{resolve_api_token, ApiToken, CredentialError};
use crate::crd::{DeliveryStatus, Email, EmailSenderConfig, EmailStatus};
use crate::observability::metrics;
use crate::provider::{MessageDescriptor, ProviderKind};
use kube::ResourceExt;
use kube_runtime::reflector::ObjectRef;
use std::sync::Arc;
use tracing::{debug, info, warn, Span};

/// Reconcile one Email
///
/// A missing EmailSenderConfig is not an error: the Email stays `""` and is
/// picked up again when the config appears.
pub async fn reconcile_email(
    email: &Email,
    ctx: &Reconciler,
    span: &Span,
) -> Result<EmailOutcome, ReconcilerError> {
    let namespace = email
        .metadata
        .namespace
        .as_deref()
        .ok_or(ReconcilerError::MissingMetadata("namespace"))?;

    let current = email.delivery_status();
    if current.is_terminal() {
        debug!(
            parent: span,
            delivery.status = %current,
            "Email already has a terminal delivery status, skipping"
        );
        return Ok(EmailOutcome::AlreadyTerminal);
    }

    let config_name = email.spec.sender_config_ref.as_str();
    let config = match ctx.store.get_sender_config(namespace, config_name).await {
        Ok(config) => config,
        Err(e) if e.is_not_found() => {
            info!(
                parent: span,
                sender_config = config_name,
                "EmailSenderConfig not found, waiting for it to be created"
            );
            return Ok(EmailOutcome::AwaitingSenderConfig);
        }
        Err(e) => return Err(e.into()),
    };

    let status = deliver(email, &config, namespace, ctx, span).await?;
    if let Some(recorded) = persist_status(email, namespace, &status, ctx, span).await? {
        return Ok(EmailOutcome::Recorded(recorded));
    }

    metrics::increment_emails_delivered(status.delivery_status.as_str());
    match status.delivery_status {
        DeliveryStatus::Sent => info!(
            parent: span,
            message.id = status.message_id.as_deref().unwrap_or(""),
            "Email sent"
        ),
        other => warn!(
            parent: span,
            delivery.status = %other,
            error = status.error.as_deref().unwrap_or(""),
            "Email not delivered"
        ),
    }

    Ok(EmailOutcome::Recorded(status.delivery_status))
}

/// Write `status`, re-applying it on top of newer versions of the Email
///
/// Returns `Some(existing)` when another writer recorded a terminal status
/// first; that status is kept.
async fn persist_status(
    email: &Email,
    namespace: &str,
    status: &EmailStatus,
    ctx: &Reconciler,
    span: &Span,
) -> Result<Option<DeliveryStatus>, ReconcilerError> {
    let name = email
        .metadata
        .name
        .as_deref()
        .ok_or(ReconcilerError::MissingMetadata("name"))?;

    let mut fresh: Option<Email> = None;
    for attempt in 1..=MAX_STATUS_WRITE_ATTEMPTS {
        let target = fresh.as_ref().unwrap_or(email);
        match ctx.store.update_email_status(target, status).await {
            Ok(()) => return Ok(None),
            Err(e) if e.is_conflict() => {
                debug!(
                    parent: span,
                    attempt,
                    "Email changed while dispatching, re-reading before writing status again"
                );
                let latest = ctx.store.get_email(namespace, name).await?;
                let existing = latest.delivery_status();
                if existing.is_terminal() {
                    warn!(
                        parent: span,
                        delivery.status = %existing,
                        "Email status was recorded by another writer, keeping it"
                    );
                    return Ok(Some(existing));
                }
                fresh = Some(latest);
            }
            Err(e) => return Err(e.into()),
        }
    }

    Err(ReconcilerError::StatusWriteExhausted {
        attempts: MAX_STATUS_WRITE_ATTEMPTS,
    })
}

/// Decide the terminal status, sending the message when the config allows it
async fn deliver(
    email: &Email,
    config: &EmailSenderConfig,
    namespace: &str,
    ctx: &Reconciler,
    span: &Span,
) -> Result<EmailStatus, ReconcilerError> {
    let generation = email.metadata.generation;

    let validation = config.validation_status();
    if validation.blocks_delivery() {
        let reason = config
            .status
            .as_ref()
            .and_then(|s| s.error.as_deref())
            .unwrap_or("no details recorded");
        return Ok(EmailStatus::sender_config_error(
            format!(
                "EmailSenderConfig {} is not usable (status '{}'): {}",
                config.name_any(),
                validation,
                reason
            ),
            generation,
        ));
    }

    let kind = match config.spec.provider.parse::<ProviderKind>() {
        Ok(kind) => kind,
        Err(e) => return Ok(EmailStatus::failed(e.to_string(), generation)),
    };

    let (token, credential_issue) = match resolve_api_token(
        ctx.store.as_ref(),
        namespace,
        &config.spec.credential_ref,
        span,
    )
    .await
    {
        Ok(token) => (token, None),
        Err(e @ CredentialError::Transport { .. }) => return Err(e.into()),
        Err(e) => {
            // The provider rejects the empty token and the rejection is recorded
            warn!(parent: span, error = %e, "API token unavailable, sending without one");
            (ApiToken::default(), Some(e))
        }
    };

    let message = MessageDescriptor {
        token,
        subject: email.spec.subject.clone(),
        body: email.spec.body.clone(),
        from: config.spec.sender_address.clone(),
        to: email.spec.recipient_address.clone(),
    };

    debug!(
        parent: span,
        provider = %kind,
        sender_config.status = %validation,
        "Dispatching email"
    );

    Ok(match ctx.providers.send(kind, &message).await {
        Ok(message_id) => EmailStatus::sent(message_id, generation),
        Err(e) => EmailStatus::failed(send_failure(&e, credential_issue.as_ref()), generation),
    })
}

/// Emails to re-trigger when `config` changes
///
/// Only Emails still at `""` in the config's namespace that reference it by
/// name; terminal Emails are never dispatched again.
pub fn emails_referencing(
    config: &EmailSenderConfig,
    emails: impl IntoIterator<Item = Arc<Email>>,
) -> Vec<ObjectRef<Email>> {
    let namespace = config.namespace();
    let name = config.name_any();
    emails
        .into_iter()
        .filter(|email| {
            email.namespace() == namespace
                && email.spec.sender_config_ref == name
                && !email.delivery_status().is_terminal()
        })
        .map(|email| ObjectRef::from_obj(email.as_ref()))
        .collect()
}
