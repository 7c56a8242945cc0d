//! # Types
//!
//! Core types for the reconcilers.

use crate::config::ControllerConfig;
use crate::credentials::CredentialError;
use crate::provider::{ProviderError, ProviderRegistry};
use crate::store::{ObjectStore, StoreError};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReconcilerError {
    /// Credential lookup failed in a way the scheduler should retry
    #[error("credential resolution failed: {0}")]
    Credential(#[from] CredentialError),
    /// Reading or writing a resource failed
    #[error("object store operation failed: {0}")]
    Store(#[from] StoreError),
    /// Resource handed to the reconciler lacks name or namespace
    #[error("resource is missing metadata.{0}")]
    MissingMetadata(&'static str),
    /// Outcome is known but every status write hit a version conflict
    #[error("status write still conflicting after {attempts} attempts")]
    StatusWriteExhausted { attempts: u32 },
}

impl ReconcilerError {
    /// Whether the error is an optimistic-concurrency conflict on a status write
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, ReconcilerError::Store(e) if e.is_conflict())
    }
}

/// Error text for a failed send, led by the credential problem behind it
pub(super) fn send_failure(
    error: &ProviderError,
    credential_issue: Option<&CredentialError>,
) -> String {
    match credential_issue {
        Some(issue) => format!("{issue}; {error}"),
        None => error.to_string(),
    }
}

/// Reconcile outcome of an Email, used for logging and tests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailOutcome {
    /// Status was already terminal; nothing was sent or written
    AlreadyTerminal,
    /// Referenced EmailSenderConfig does not exist yet; nothing was written
    AwaitingSenderConfig,
    /// Terminal status written
    Recorded(crate::crd::DeliveryStatus),
}

/// Shared context handed to every reconcile
#[derive(Clone)]
pub struct Reconciler {
    pub store: Arc<dyn ObjectStore>,
    pub providers: ProviderRegistry,
    pub config: ControllerConfig,
}

impl std::fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler")
            .field("providers", &self.providers)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Reconciler {
    #[must_use]
    pub fn new(
        store: Arc<dyn ObjectStore>,
        providers: ProviderRegistry,
        config: ControllerConfig,
    ) -> Self {
        Self {
            store,
            providers,
            config,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_classification() {
        let conflict = ReconcilerError::Store(StoreError::Conflict {
            kind: "Email",
            namespace: "default".into(),
            name: "welcome".into(),
        });
        assert!(conflict.is_conflict());

        let not_found = ReconcilerError::Store(StoreError::NotFound {
            kind: "Email",
            namespace: "default".into(),
            name: "welcome".into(),
        });
        assert!(!not_found.is_conflict());
        assert!(!ReconcilerError::MissingMetadata("name").is_conflict());
        assert!(!ReconcilerError::StatusWriteExhausted { attempts: 5 }.is_conflict());
    }

    #[test]
    fn test_send_failure_leads_with_the_credential_issue() {
        let rejected = ProviderError::Rejected {
            provider: crate::provider::ProviderKind::MailerSend,
            status: 401,
            message: "Unauthenticated.".into(),
        };
        let issue = CredentialError::InvalidEncoding {
            namespace: "default".into(),
            name: "cred1".into(),
            key: "apiToken",
        };

        let text = send_failure(&rejected, Some(&issue));
        assert!(text.starts_with("secret default/cred1 key 'apiToken' is not valid UTF-8; "));
        assert!(text.ends_with("Unauthenticated."));
        assert_eq!(send_failure(&rejected, None), rejected.to_string());
    }
}
