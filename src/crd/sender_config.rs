//! # EmailSenderConfig CRD
//!
//! A named sending identity: which provider to use, which address to send
//! from, and which Secret holds the API token.

use super::status::{EmailSenderConfigStatus, ValidationStatus};
use kube::CustomResource;
use serde::{Deserialize, Serialize};

/// EmailSenderConfig Custom Resource Definition
///
/// `provider` is kept as a free-form string so that a typo is stored as
/// written and reported as `Unknown Provider` instead of being rejected by
/// the API server.
///
/// # Example
///
/// ```yaml
/// apiVersion: email.hermes.sender/v1
/// kind: EmailSenderConfig
/// metadata:
///   name: cfg1
///   namespace: default
/// spec:
///   provider: mailersender
///   senderAddress: a@example.com
///   credentialRef: cred1
/// ```
#[derive(CustomResource, Debug, Clone, Deserialize, Serialize, schemars::JsonSchema)]
#[kube(
    kind = "EmailSenderConfig",
    group = "email.hermes.sender",
    version = "v1",
    namespaced,
    status = "EmailSenderConfigStatus",
    shortname = "esc",
    printcolumn = r#"{"name":"Provider", "type":"string", "jsonPath":".spec.provider"}"#,
    printcolumn = r#"{"name":"Sender", "type":"string", "jsonPath":".spec.senderAddress"}"#,
    printcolumn = r#"{"name":"Status", "type":"string", "jsonPath":".status.status"}"#,
    printcolumn = r#"{"name":"Validated", "type":"date", "jsonPath":".status.lastValidationTime"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct EmailSenderConfigSpec {
    /// Provider identifier: `mailersender` or `mailgun`
    pub provider: String,
    /// Address messages are sent from. Mailgun derives its sending domain from it.
    #[serde(alias = "senderEmail")]
    pub sender_address: String,
    /// Name of a Secret in the same namespace holding the token under `apiToken`
    #[serde(alias = "apiTokenSecretRef")]
    #[schemars(length(min = 1))]
    pub credential_ref: String,
}

impl EmailSenderConfig {
    /// Verdict of the last validation, `Unvalidated` when none was written yet
    #[must_use]
    pub fn validation_status(&self) -> ValidationStatus {
        self.status
            .as_ref()
            .map(|s| s.status)
            .unwrap_or_default()
    }
}
