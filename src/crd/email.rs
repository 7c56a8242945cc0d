//! # Email CRD
//!
//! One outbound message intent.

use super::status::{DeliveryStatus, EmailStatus};
use kube::CustomResource;
use serde::{Deserialize, Serialize};

/// Email Custom Resource Definition
///
/// # Example
///
/// ```yaml
/// apiVersion: email.hermes.sender/v1
/// kind: Email
/// metadata:
///   name: welcome
///   namespace: default
/// spec:
///   subject: hi
///   body: there
///   recipientAddress: b@example.com
///   senderConfigRef: cfg1
/// ```
#[derive(CustomResource, Debug, Clone, Deserialize, Serialize, schemars::JsonSchema)]
#[kube(
    kind = "Email",
    group = "email.hermes.sender",
    version = "v1",
    namespaced,
    status = "EmailStatus",
    shortname = "em",
    printcolumn = r#"{"name":"Status", "type":"string", "jsonPath":".status.deliveryStatus"}"#,
    printcolumn = r#"{"name":"Recipient", "type":"string", "jsonPath":".spec.recipientAddress"}"#,
    printcolumn = r#"{"name":"Sender", "type":"string", "jsonPath":".spec.senderConfigRef"}"#,
    printcolumn = r#"{"name":"Age", "type":"date", "jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct EmailSpec {
    /// Subject line
    pub subject: String,
    /// Plain-text body
    pub body: String,
    /// Recipient address
    #[serde(alias = "recipientEmail")]
    #[schemars(length(min = 3))]
    pub recipient_address: String,
    /// Name of an EmailSenderConfig in the same namespace
    #[schemars(length(min = 1))]
    pub sender_config_ref: String,
}

impl Email {
    /// Current delivery status, `Unset` when no status has been written yet
    #[must_use]
    pub fn delivery_status(&self) -> DeliveryStatus {
        self.status
            .as_ref()
            .map(|s| s.delivery_status)
            .unwrap_or_default()
    }
}
