//! # EmailSenderConfig Reconciler
//!
//! Validates a sender configuration against its provider and persists the
//! verdict.
//!
//! Validation is re-derived from scratch on every reconcile:
//!
//! 1. Unrecognized provider → `Unknown Provider` (credentials are not read)
//! 2. Credential resolution; a missing Secret or an unreachable API server
//!    aborts the reconcile without writing status
//! 3. MailerSend: trial send from the sender address to itself
//!    Mailgun: the sender address must carry a domain (no network call)
//! 4. The verdict is written with a conditional status patch
//!
//! The watch wrapper uses [`revalidation_due_in`] to avoid repeating the
//! trial send for status-only events between scheduled validations.

use super::types::{send_failure, Reconciler, ReconcilerError};
use crate::constants::{DEFAULT_SENDER_CONFIG_REVALIDATION_SECS, TRIAL_MESSAGE_TEXT};
use crate::credentials::{resolve_api_token, ApiToken};
use crate::crd::{EmailSenderConfig, EmailSenderConfigStatus, ValidationStatus};
use crate::observability::metrics;
use crate::provider::{EmailAddress, MessageDescriptor, ProviderKind, Verification};
use chrono::{DateTime, Utc};
use std::time::Duration;
use tracing::{debug, info, warn, Span};

/// Validate one EmailSenderConfig and persist the verdict
pub async fn reconcile_sender_config(
    config: &EmailSenderConfig,
    ctx: &Reconciler,
    span: &Span,
) -> Result<ValidationStatus, ReconcilerError> {
    let namespace = config
        .metadata
        .namespace
        .as_deref()
        .ok_or(ReconcilerError::MissingMetadata("namespace"))?;

    let (status, error) = validate(config, namespace, ctx, span).await?;

    let now = Utc::now();
    let next = next_validation_at(now, ctx.config.sender_config_revalidation_duration());
    let new_status = EmailSenderConfigStatus {
        status,
        error,
        observed_generation: config.metadata.generation,
        last_validation_time: Some(now.to_rfc3339()),
        next_validation_time: Some(next.to_rfc3339()),
    };

    ctx.store
        .update_sender_config_status(config, &new_status)
        .await?;
    metrics::increment_sender_config_validations(status.as_str());

    match status {
        ValidationStatus::Ok => info!(
            parent: span,
            validation.status = %status,
            "EmailSenderConfig validated"
        ),
        _ => warn!(
            parent: span,
            validation.status = %status,
            error = new_status.error.as_deref().unwrap_or(""),
            "EmailSenderConfig failed validation"
        ),
    }

    Ok(status)
}

/// Compute the verdict and its error text
async fn validate(
    config: &EmailSenderConfig,
    namespace: &str,
    ctx: &Reconciler,
    span: &Span,
) -> Result<(ValidationStatus, Option<String>), ReconcilerError> {
    let kind = match config.spec.provider.parse::<ProviderKind>() {
        Ok(kind) => kind,
        Err(e) => {
            debug!(parent: span, provider = config.spec.provider.as_str(), "Unknown provider");
            return Ok((ValidationStatus::UnknownProvider, Some(e.to_string())));
        }
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
        Err(e) if e.is_fatal() => return Err(e.into()),
        Err(e) => {
            warn!(parent: span, error = %e, "API token unavailable, validating without one");
            (ApiToken::default(), Some(e))
        }
    };

    let sender = config.spec.sender_address.as_str();
    match kind.verification() {
        Verification::TrialSend => {
            let trial = MessageDescriptor {
                token,
                subject: TRIAL_MESSAGE_TEXT.to_string(),
                body: TRIAL_MESSAGE_TEXT.to_string(),
                from: sender.to_string(),
                to: sender.to_string(),
            };
            debug!(parent: span, provider = %kind, "Sending trial message");
            Ok(match ctx.providers.send(kind, &trial).await {
                Ok(_) => (ValidationStatus::Ok, None),
                Err(e) => (
                    ValidationStatus::Error,
                    Some(send_failure(&e, credential_issue.as_ref())),
                ),
            })
        }
        Verification::Trusted => Ok(match EmailAddress::parse(sender) {
            Ok(_) => (ValidationStatus::Ok, None),
            Err(e) => (ValidationStatus::Error, Some(e.to_string())),
        }),
    }
}

/// When a verdict computed at `now` should be re-derived
fn next_validation_at(now: DateTime<Utc>, period: Duration) -> DateTime<Utc> {
    chrono::Duration::from_std(period)
        .ok()
        .and_then(|period| now.checked_add_signed(period))
        .unwrap_or_else(|| {
            i64::try_from(DEFAULT_SENDER_CONFIG_REVALIDATION_SECS)
                .map_or(now, |secs| now + chrono::Duration::seconds(secs))
        })
}

/// Time left until `config` is due for another validation
///
/// `None` means validate now: `spec` was edited since the last verdict, no
/// verdict was written yet, or the scheduled time has passed.
#[must_use]
pub fn revalidation_due_in(config: &EmailSenderConfig, now: DateTime<Utc>) -> Option<Duration> {
    let status = config.status.as_ref()?;
    if status.observed_generation.is_none()
        || status.observed_generation != config.metadata.generation
    {
        return None;
    }
    let next = DateTime::parse_from_rfc3339(status.next_validation_time.as_deref()?).ok()?;
    (next.with_timezone(&Utc) - now)
        .to_std()
        .ok()
        .filter(|remaining| !remaining.is_zero())
}
