//! # Status Types
//!
//! Status payloads for `Email` and `EmailSenderConfig`, and the two state
//! machines they carry.
//!
//! Both state enums serialize to the exact strings users see in
//! `kubectl get`, including the empty string for "not yet reconciled" and the
//! space in `Unknown Provider`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Delivery state of an `Email`
///
/// Every value other than `Unset` is terminal: the controller never
/// dispatches an `Email` that has left `Unset`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, schemars::JsonSchema)]
pub enum DeliveryStatus {
    /// Not reconciled yet
    #[default]
    #[serde(rename = "")]
    Unset,
    /// Provider accepted the message
    Sent,
    /// Provider (or local address validation) rejected the message
    Error,
    /// The referenced EmailSenderConfig was unusable when the Email was reconciled
    EmailSenderConfigError,
}

impl DeliveryStatus {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        !matches!(self, DeliveryStatus::Unset)
    }

    /// Get string representation (also used as metric label)
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            DeliveryStatus::Unset => "",
            DeliveryStatus::Sent => "Sent",
            DeliveryStatus::Error => "Error",
            DeliveryStatus::EmailSenderConfigError => "EmailSenderConfigError",
        }
    }
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validation state of an `EmailSenderConfig`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, schemars::JsonSchema)]
pub enum ValidationStatus {
    /// Not validated yet
    #[default]
    #[serde(rename = "")]
    Unvalidated,
    Ok,
    Error,
    #[serde(rename = "Unknown Provider")]
    UnknownProvider,
}

impl ValidationStatus {
    /// A config in this state must never be used for a real send
    #[must_use]
    pub fn blocks_delivery(self) -> bool {
        matches!(
            self,
            ValidationStatus::Error | ValidationStatus::UnknownProvider
        )
    }

    /// Get string representation (also used as metric label)
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ValidationStatus::Unvalidated => "",
            ValidationStatus::Ok => "Ok",
            ValidationStatus::Error => "Error",
            ValidationStatus::UnknownProvider => "Unknown Provider",
        }
    }
}

impl fmt::Display for ValidationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status of the Email resource
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct EmailStatus {
    /// Delivery outcome. Empty until the controller has handled the Email.
    #[serde(default)]
    pub delivery_status: DeliveryStatus,
    /// Message identifier issued by the provider (only when Sent)
    #[serde(default)]
    pub message_id: Option<String>,
    /// Error text reported by the provider or the controller
    #[serde(default)]
    pub error: Option<String>,
    /// Generation the outcome was recorded for
    #[serde(default)]
    pub observed_generation: Option<i64>,
    /// When deliveryStatus last changed (RFC3339)
    #[serde(default)]
    pub last_transition_time: Option<String>,
}

impl EmailStatus {
    /// Provider accepted the message. An empty id is not recorded.
    #[must_use]
    pub fn sent(message_id: String, generation: Option<i64>) -> Self {
        Self {
            delivery_status: DeliveryStatus::Sent,
            message_id: Some(message_id).filter(|id| !id.is_empty()),
            error: None,
            observed_generation: generation,
            last_transition_time: Some(chrono::Utc::now().to_rfc3339()),
        }
    }

    #[must_use]
    pub fn failed(error: String, generation: Option<i64>) -> Self {
        Self {
            delivery_status: DeliveryStatus::Error,
            message_id: None,
            error: Some(error),
            observed_generation: generation,
            last_transition_time: Some(chrono::Utc::now().to_rfc3339()),
        }
    }

    #[must_use]
    pub fn sender_config_error(error: String, generation: Option<i64>) -> Self {
        Self {
            delivery_status: DeliveryStatus::EmailSenderConfigError,
            message_id: None,
            error: Some(error),
            observed_generation: generation,
            last_transition_time: Some(chrono::Utc::now().to_rfc3339()),
        }
    }
}

/// Status of the EmailSenderConfig resource
///
/// Re-derived on every validation; nothing here is carried over from the
/// previous status.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct EmailSenderConfigStatus {
    /// Verdict of the most recent validation
    #[serde(default)]
    pub status: ValidationStatus,
    /// Why validation failed (only when status is Error or Unknown Provider)
    #[serde(default)]
    pub error: Option<String>,
    /// Generation the verdict was computed for
    #[serde(default)]
    pub observed_generation: Option<i64>,
    /// Last validation time (RFC3339)
    #[serde(default)]
    pub last_validation_time: Option<String>,
    /// Next scheduled validation time (RFC3339)
    /// Used to persist the revalidation schedule across watch restarts
    #[serde(default)]
    pub next_validation_time: Option<String>,
}
