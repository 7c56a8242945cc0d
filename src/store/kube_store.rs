//! # Kubernetes Object Store
//!
//! [`ObjectStore`] backed by the Kubernetes API server.

use super::{ObjectStore, StoreError};
use crate::constants::FIELD_MANAGER;
use crate::crd::{Email, EmailSenderConfig, EmailSenderConfigStatus, EmailStatus};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::Secret;
use kube::api::{Api, Patch, PatchParams};
use kube::{Client, Resource};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Debug;
use tracing::debug;

/// Object store talking to the Kubernetes API
#[derive(Clone)]
pub struct KubeStore {
    client: Client,
}

impl std::fmt::Debug for KubeStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeStore").finish_non_exhaustive()
    }
}

impl KubeStore {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    async fn get<K>(
        &self,
        kind: &'static str,
        namespace: &str,
        name: &str,
    ) -> Result<K, StoreError>
    where
        K: Resource<Scope = k8s_openapi::NamespaceResourceScope, DynamicType = ()>
            + Clone
            + DeserializeOwned
            + Debug,
    {
        let api: Api<K> = Api::namespaced(self.client.clone(), namespace);
        api.get(name)
            .await
            .map_err(|e| classify(e, kind, namespace, name))
    }

    /// Merge-patch the status subresource
    ///
    /// `metadata.resourceVersion` is part of the patch body, which makes the
    /// API server reject the write with 409 when the object changed since
    /// `obj` was read.
    async fn patch_status<K, S>(
        &self,
        kind: &'static str,
        obj: &K,
        status: &S,
    ) -> Result<(), StoreError>
    where
        K: Resource<Scope = k8s_openapi::NamespaceResourceScope, DynamicType = ()>
            + Clone
            + DeserializeOwned
            + Debug,
        S: Serialize,
    {
        let meta = obj.meta();
        let name = meta
            .name
            .as_deref()
            .ok_or(StoreError::MissingMetadata { kind, field: "name" })?;
        let namespace = meta.namespace.as_deref().ok_or(StoreError::MissingMetadata {
            kind,
            field: "namespace",
        })?;

        let patch = serde_json::json!({
            "metadata": {
                "resourceVersion": meta.resource_version,
            },
            "status": status,
        });

        debug!(
            resource.kind = kind,
            resource.name = name,
            resource.namespace = namespace,
            resource.version = meta.resource_version.as_deref().unwrap_or("unknown"),
            "Patching status"
        );

        let api: Api<K> = Api::namespaced(self.client.clone(), namespace);
        api.patch_status(name, &PatchParams::apply(FIELD_MANAGER), &Patch::Merge(patch))
            .await
            .map(|_| ())
            .map_err(|e| classify(e, kind, namespace, name))
    }
}

/// Map API errors onto the store taxonomy
fn classify(error: kube::Error, kind: &'static str, namespace: &str, name: &str) -> StoreError {
    match error {
        kube::Error::Api(api_err) if api_err.code == 404 => StoreError::NotFound {
            kind,
            namespace: namespace.to_string(),
            name: name.to_string(),
        },
        kube::Error::Api(api_err) if api_err.code == 409 => StoreError::Conflict {
            kind,
            namespace: namespace.to_string(),
            name: name.to_string(),
        },
        other => StoreError::Transport(Box::new(other)),
    }
}

#[async_trait]
impl ObjectStore for KubeStore {
    async fn get_email(&self, namespace: &str, name: &str) -> Result<Email, StoreError> {
        self.get("Email", namespace, name).await
    }

    async fn get_sender_config(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<EmailSenderConfig, StoreError> {
        self.get("EmailSenderConfig", namespace, name).await
    }

    async fn get_secret(&self, namespace: &str, name: &str) -> Result<Secret, StoreError> {
        self.get("Secret", namespace, name).await
    }

    async fn update_email_status(
        &self,
        email: &Email,
        status: &EmailStatus,
    ) -> Result<(), StoreError> {
        self.patch_status("Email", email, status).await
    }

    async fn update_sender_config_status(
        &self,
        config: &EmailSenderConfig,
        status: &EmailSenderConfigStatus,
    ) -> Result<(), StoreError> {
        self.patch_status("EmailSenderConfig", config, status).await
    }
}
