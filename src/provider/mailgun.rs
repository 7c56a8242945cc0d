//! # Mailgun Backend
//!
//! Sends through the Mailgun messages API (`POST /v3/{domain}/messages`).
//!
//! The sending domain is taken from the sender address, so a malformed
//! sender is rejected locally with [`ProviderError::InvalidAddress`] before
//! any request is made. Authentication is HTTP basic auth with the fixed
//! user `api` and the API key as password. The request body is
//! `application/x-www-form-urlencoded`.
//!
//! References:
//! - [Mailgun Messages API](https://documentation.mailgun.com/docs/mailgun/api-reference/openapi-final/tag/Messages/)

use super::{EmailAddress, EmailProvider, MessageDescriptor, ProviderError, ProviderKind};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const BASIC_AUTH_USER: &str = "api";

#[derive(Debug, Serialize)]
struct SendMessageForm<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct SendMessageResponse {
    id: String,
    #[serde(default)]
    message: String,
}

/// Mailgun REST client
#[derive(Debug, Clone)]
pub struct MailgunProvider {
    http_client: Client,
    base_url: String,
}

impl MailgunProvider {
    /// Create a client for `base_url` with a per-request timeout
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create Mailgun HTTP client")?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn messages_url(&self, domain: &str) -> String {
        format!("{}/v3/{}/messages", self.base_url, domain)
    }
}

#[async_trait]
impl EmailProvider for MailgunProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Mailgun
    }

    async fn send(&self, message: &MessageDescriptor) -> Result<String, ProviderError> {
        let sender = EmailAddress::parse(&message.from)?;
        let url = self.messages_url(sender.domain());
        let form = SendMessageForm {
            from: &message.from,
            to: &message.to,
            subject: &message.subject,
            text: &message.body,
        };

        debug!(provider = "mailgun", domain = sender.domain(), "Sending email");

        let response = self
            .http_client
            .post(&url)
            .basic_auth(BASIC_AUTH_USER, Some(message.token.expose()))
            .form(&form)
            .send()
            .await
            .map_err(|source| ProviderError::Transport {
                provider: ProviderKind::Mailgun,
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(ProviderError::Rejected {
                provider: ProviderKind::Mailgun,
                status: status.as_u16(),
                message: error_text,
            });
        }

        let body: SendMessageResponse =
            response
                .json()
                .await
                .map_err(|e| ProviderError::InvalidResponse {
                    provider: ProviderKind::Mailgun,
                    message: e.to_string(),
                })?;

        debug!(
            provider = "mailgun",
            message.id = %body.id,
            response = %body.message,
            "Email accepted"
        );
        Ok(body.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::ApiToken;

    fn descriptor(from: &str) -> MessageDescriptor {
        MessageDescriptor {
            token: ApiToken::new("key"),
            subject: "s".to_string(),
            body: "b".to_string(),
            from: from.to_string(),
            to: "a@example.com".to_string(),
        }
    }

    #[test]
    fn test_messages_url_uses_sender_domain() {
        let provider = MailgunProvider::new("https://api.mailgun.net/", Duration::from_secs(10))
            .unwrap();
        assert_eq!(
            provider.messages_url("mg.example.com"),
            "https://api.mailgun.net/v3/mg.example.com/messages"
        );
    }

    #[tokio::test]
    async fn test_sender_without_domain_fails_before_any_request() {
        // Unroutable base URL: reaching the network would surface as Transport
        let provider =
            MailgunProvider::new("http://127.0.0.1:9", Duration::from_secs(1)).unwrap();
        let err = provider.send(&descriptor("no-at-sign")).await.unwrap_err();
        assert!(matches!(err, ProviderError::InvalidAddress(_)));
    }
}
