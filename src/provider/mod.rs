//! # Provider Gateway
//!
//! Abstract interface for email delivery providers.
//!
//! Every backend implements [`EmailProvider`]: it maps a [`MessageDescriptor`]
//! onto its own HTTP API and returns the provider-issued message id or a
//! typed [`ProviderError`].
//!
//! Backends are selected by [`ProviderKind`], a closed enum parsed from the
//! free-form `provider` string of an `EmailSenderConfig`. The
//! [`ProviderRegistry`] maps every kind to a backend with an exhaustive
//! `match`, so adding a variant without a backend does not compile.

pub mod address;
pub mod mailersend;
pub mod mailgun;

pub use address::{AddressError, EmailAddress};
pub use mailersend::MailerSendProvider;
pub use mailgun::MailgunProvider;

use crate::config::ControllerConfig;
use crate::credentials::ApiToken;
use crate::observability::metrics;
use anyhow::Result;
use async_trait::async_trait;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;

/// Supported providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    /// MailerSend (`mailersender`)
    MailerSend,
    /// Mailgun (`mailgun`)
    Mailgun,
}

/// How a sender configuration for a provider is validated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verification {
    /// Send a real trial message from the sender address to itself
    TrialSend,
    /// No free verification path; only local checks are performed
    Trusted,
}

impl ProviderKind {
    /// All supported providers
    pub const ALL: [ProviderKind; 2] = [ProviderKind::MailerSend, ProviderKind::Mailgun];

    /// Identifier as written in `EmailSenderConfig.spec.provider`
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ProviderKind::MailerSend => "mailersender",
            ProviderKind::Mailgun => "mailgun",
        }
    }

    #[must_use]
    pub fn verification(self) -> Verification {
        match self {
            ProviderKind::MailerSend => Verification::TrialSend,
            // Mailgun's address validation API is a paid feature
            ProviderKind::Mailgun => Verification::Trusted,
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Provider identifier that matches no [`ProviderKind`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown provider '{0}', expected one of: mailersender, mailgun")]
pub struct UnknownProvider(pub String);

impl FromStr for ProviderKind {
    type Err = UnknownProvider;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProviderKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownProvider(s.to_string()))
    }
}

/// Normalized message handed to a provider, built fresh for every attempt
#[derive(Debug, Clone)]
pub struct MessageDescriptor {
    pub token: ApiToken,
    pub subject: String,
    pub body: String,
    pub from: String,
    pub to: String,
}

#[derive(Debug, Error)]
pub enum ProviderError {
    /// Address cannot be used with this provider (configuration error)
    #[error(transparent)]
    InvalidAddress(#[from] AddressError),
    /// Request did not complete: connect failure, timeout, TLS
    #[error("{provider} request failed: {source}")]
    Transport {
        provider: ProviderKind,
        #[source]
        source: reqwest::Error,
    },
    /// Provider answered with a non-success status
    #[error("{provider} rejected the message (HTTP {status}): {message}")]
    Rejected {
        provider: ProviderKind,
        status: u16,
        message: String,
    },
    /// Provider answered with success but the body could not be understood
    #[error("{provider} returned an unexpected response: {message}")]
    InvalidResponse {
        provider: ProviderKind,
        message: String,
    },
}

impl ProviderError {
    /// Short label for metrics
    #[must_use]
    pub fn outcome(&self) -> &'static str {
        match self {
            ProviderError::InvalidAddress(_) => "invalid_address",
            ProviderError::Transport { .. } => "transport_error",
            ProviderError::Rejected { .. } => "rejected",
            ProviderError::InvalidResponse { .. } => "invalid_response",
        }
    }
}

/// Provider trait for email delivery backends
#[async_trait]
pub trait EmailProvider: Send + Sync {
    /// Which provider this backend talks to
    fn kind(&self) -> ProviderKind;

    /// Send one message, returning the provider-issued message id
    async fn send(&self, message: &MessageDescriptor) -> Result<String, ProviderError>;
}

/// One backend per [`ProviderKind`]
#[derive(Clone)]
pub struct ProviderRegistry {
    mailersend: Arc<dyn EmailProvider>,
    mailgun: Arc<dyn EmailProvider>,
}

impl fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("mailersend", &self.mailersend.kind())
            .field("mailgun", &self.mailgun.kind())
            .finish()
    }
}

impl ProviderRegistry {
    #[must_use]
    pub fn new(mailersend: Arc<dyn EmailProvider>, mailgun: Arc<dyn EmailProvider>) -> Self {
        Self {
            mailersend,
            mailgun,
        }
    }

    /// Build the HTTP backends from controller configuration
    pub fn from_config(config: &ControllerConfig) -> Result<Self> {
        let mailersend =
            MailerSendProvider::new(&config.mailersend_api_url, config.mailersend_timeout())?;
        let mailgun = MailgunProvider::new(&config.mailgun_api_url, config.mailgun_timeout())?;
        Ok(Self::new(Arc::new(mailersend), Arc::new(mailgun)))
    }

    /// Backend for `kind`
    #[must_use]
    pub fn get(&self, kind: ProviderKind) -> &dyn EmailProvider {
        match kind {
            ProviderKind::MailerSend => self.mailersend.as_ref(),
            ProviderKind::Mailgun => self.mailgun.as_ref(),
        }
    }

    /// Send through the backend for `kind`, recording request metrics
    pub async fn send(
        &self,
        kind: ProviderKind,
        message: &MessageDescriptor,
    ) -> Result<String, ProviderError> {
        let start = Instant::now();
        let result = self.get(kind).send(message).await;
        let outcome = match &result {
            Ok(_) => "success",
            Err(e) => e.outcome(),
        };
        metrics::observe_provider_request(kind.as_str(), outcome, start.elapsed().as_secs_f64());
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_providers() {
        assert_eq!(
            "mailersender".parse::<ProviderKind>(),
            Ok(ProviderKind::MailerSend)
        );
        assert_eq!("mailgun".parse::<ProviderKind>(), Ok(ProviderKind::Mailgun));
    }

    #[test]
    fn test_parse_unknown_provider() {
        let err = "typo".parse::<ProviderKind>().unwrap_err();
        assert_eq!(err, UnknownProvider("typo".to_string()));
        assert!(err.to_string().contains("'typo'"));
        // Identifiers are matched exactly
        assert!("Mailgun".parse::<ProviderKind>().is_err());
        assert!("".parse::<ProviderKind>().is_err());
    }

    #[test]
    fn test_every_kind_round_trips_through_its_identifier() {
        for kind in ProviderKind::ALL {
            assert_eq!(kind.as_str().parse::<ProviderKind>(), Ok(kind));
        }
    }

    #[test]
    fn test_registry_has_a_backend_for_every_kind() {
        let registry = ProviderRegistry::from_config(&ControllerConfig::default()).unwrap();
        for kind in ProviderKind::ALL {
            assert_eq!(registry.get(kind).kind(), kind);
        }
    }

    #[test]
    fn test_verification_strategy() {
        assert_eq!(
            ProviderKind::MailerSend.verification(),
            Verification::TrialSend
        );
        assert_eq!(ProviderKind::Mailgun.verification(), Verification::Trusted);
    }
}
