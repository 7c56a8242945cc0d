//! # MailerSend Backend
//!
//! Sends through the MailerSend REST API (`POST /v1/email`).
//!
//! Authentication is a bearer token. A successful send answers `202
//! Accepted` with an empty body; the message id is carried in the
//! `X-Message-Id` response header.
//!
//! MailerSend only accepts a bare `user@domain` in `email`; a display name
//! travels in the separate `name` field. Addresses are split locally and a
//! malformed one is rejected with [`ProviderError::InvalidAddress`] before
//! any request is made.
//!
//! References:
//! - [MailerSend Email API](https://developers.mailersend.com/api/v1/email.html)

use super::{EmailAddress, EmailProvider, MessageDescriptor, ProviderError, ProviderKind};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

const MESSAGE_ID_HEADER: &str = "x-message-id";

#[derive(Debug, Serialize)]
struct Recipient<'a> {
    email: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
}

impl<'a> From<EmailAddress<'a>> for Recipient<'a> {
    fn from(address: EmailAddress<'a>) -> Self {
        Self {
            email: address.address(),
            name: address.name(),
        }
    }
}

#[derive(Debug, Serialize)]
struct SendEmailRequest<'a> {
    from: Recipient<'a>,
    to: [Recipient<'a>; 1],
    subject: &'a str,
    text: &'a str,
}

/// MailerSend REST client
#[derive(Debug, Clone)]
pub struct MailerSendProvider {
    http_client: Client,
    base_url: String,
}

impl MailerSendProvider {
    /// Create a client for `base_url` with a per-request timeout
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create MailerSend HTTP client")?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl EmailProvider for MailerSendProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::MailerSend
    }

    async fn send(&self, message: &MessageDescriptor) -> Result<String, ProviderError> {
        let url = format!("{}/v1/email", self.base_url);
        let body = SendEmailRequest {
            from: EmailAddress::parse(&message.from)?.into(),
            to: [EmailAddress::parse(&message.to)?.into()],
            subject: &message.subject,
            text: &message.body,
        };

        debug!(provider = "mailersender", url = %url, "Sending email");

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(message.token.expose())
            .json(&body)
            .send()
            .await
            .map_err(|source| ProviderError::Transport {
                provider: ProviderKind::MailerSend,
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(ProviderError::Rejected {
                provider: ProviderKind::MailerSend,
                status: status.as_u16(),
                message: error_text,
            });
        }

        // A missing header is not an error: MailerSend omits it for queued
        // bulk sends, and the email was still accepted
        let message_id = response
            .headers()
            .get(MESSAGE_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string();

        debug!(
            provider = "mailersender",
            message.id = %message_id,
            "Email accepted"
        );
        Ok(message_id)
    }
}
