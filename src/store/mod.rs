//! # Object Store
//!
//! Abstract interface over the persistent objects the reconcilers read and
//! write.
//!
//! The controller only needs a handful of operations: read an `Email`, an
//! `EmailSenderConfig` or a `Secret`, and patch the status of either CRD. Status patches carry
//! the `resourceVersion` the reconciler observed, so a concurrent
//! modification surfaces as [`StoreError::Conflict`] instead of silently
//! overwriting.
//!
//! [`KubeStore`] is the Kubernetes API implementation used at runtime.

mod kube_store;

pub use kube_store::KubeStore;

use crate::crd::{Email, EmailSenderConfig, EmailSenderConfigStatus, EmailStatus};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::Secret;
use thiserror::Error;

/// Failure of an object store operation
#[derive(Debug, Error)]
pub enum StoreError {
    /// Object does not exist
    #[error("{kind} {namespace}/{name} not found")]
    NotFound {
        kind: &'static str,
        namespace: String,
        name: String,
    },
    /// Object was modified since it was read (resourceVersion mismatch)
    #[error("{kind} {namespace}/{name} was modified concurrently")]
    Conflict {
        kind: &'static str,
        namespace: String,
        name: String,
    },
    /// Object lacks metadata the operation needs (name, namespace)
    #[error("{kind} is missing metadata.{field}")]
    MissingMetadata {
        kind: &'static str,
        field: &'static str,
    },
    /// Store unreachable or any other failure
    #[error("object store request failed: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl StoreError {
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }

    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict { .. })
    }
}

/// Persistent object access used by both reconcilers
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Get an Email by name
    async fn get_email(&self, namespace: &str, name: &str) -> Result<Email, StoreError>;

    /// Get an EmailSenderConfig by name
    async fn get_sender_config(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<EmailSenderConfig, StoreError>;

    /// Get a Secret by name
    async fn get_secret(&self, namespace: &str, name: &str) -> Result<Secret, StoreError>;

    /// Replace the status of `email`, conditional on its resourceVersion
    async fn update_email_status(
        &self,
        email: &Email,
        status: &EmailStatus,
    ) -> Result<(), StoreError>;

    /// Replace the status of `config`, conditional on its resourceVersion
    async fn update_sender_config_status(
        &self,
        config: &EmailSenderConfig,
        status: &EmailSenderConfigStatus,
    ) -> Result<(), StoreError>;
}
