//! Pact contract tests for the MailerSend Email API
//!
//! These tests define the contract between the Hermes mail controller and
//! MailerSend. The real `MailerSendProvider` is pointed at a Pact mock server.

mod common;

use common::init_rustls;
use hermes_mail_controller::credentials::ApiToken;
use hermes_mail_controller::provider::{
    EmailProvider, MailerSendProvider, MessageDescriptor, ProviderError,
};
use pact_consumer::prelude::*;
use serde_json::json;
use std::time::Duration;

fn message(token: &str) -> MessageDescriptor {
    MessageDescriptor {
        token: ApiToken::new(token),
        subject: "hi".to_string(),
        body: "there".to_string(),
        from: "a@example.com".to_string(),
        to: "b@example.com".to_string(),
    }
}

fn provider(mock_server: &dyn ValidatingMockServer) -> MailerSendProvider {
    MailerSendProvider::new(mock_server.url().as_str(), Duration::from_secs(5))
        .expect("Failed to create MailerSend provider")
}

#[tokio::test]
async fn test_mailersend_send_email_contract() {
    init_rustls();
    let mut pact_builder = PactBuilder::new("Hermes-Mail-Controller", "MailerSend");

    pact_builder.interaction("send an email", "", |mut i| {
        i.given("the API token is valid and the sender domain is verified");
        i.request
            .method("POST")
            .path("/v1/email")
            .header("authorization", "Bearer mlsn.test-token")
            .header("content-type", "application/json")
            .json_body(json!({
                "from": { "email": "a@example.com" },
                "to": [{ "email": "b@example.com" }],
                "subject": "hi",
                "text": "there"
            }));
        i.response
            .status(202)
            .header("x-message-id", "5e42957d51f1d94a1070a733");
        i
    });

    let mock_server = pact_builder.start_mock_server(None, None);
    let message_id = provider(mock_server.as_ref())
        .send(&message("mlsn.test-token"))
        .await
        .expect("Send should be accepted");

    assert_eq!(message_id, "5e42957d51f1d94a1070a733");
}

#[tokio::test]
async fn test_mailersend_unauthenticated_contract() {
    init_rustls();
    let mut pact_builder = PactBuilder::new("Hermes-Mail-Controller", "MailerSend");

    pact_builder.interaction("send an email with an empty API token", "", |mut i| {
        i.given("no API token is presented");
        i.request
            .method("POST")
            .path("/v1/email")
            .header("content-type", "application/json");
        i.response
            .status(401)
            .header("content-type", "application/json")
            .json_body(json!({ "message": "Unauthenticated." }));
        i
    });

    let mock_server = pact_builder.start_mock_server(None, None);
    let err = provider(mock_server.as_ref())
        .send(&message(""))
        .await
        .unwrap_err();

    match err {
        ProviderError::Rejected {
            status, message, ..
        } => {
            assert_eq!(status, 401);
            assert!(message.contains("Unauthenticated."));
        }
        other => panic!("Expected Rejected, got {other:?}"),
    }
}

#[tokio::test]
async fn test_mailersend_validation_error_contract() {
    init_rustls();
    let mut pact_builder = PactBuilder::new("Hermes-Mail-Controller", "MailerSend");

    pact_builder.interaction("send an email from an unverified domain", "", |mut i| {
        i.given("the sender domain is not verified");
        i.request
            .method("POST")
            .path("/v1/email")
            .header("authorization", "Bearer mlsn.test-token");
        i.response
            .status(422)
            .header("content-type", "application/json")
            .json_body(json!({
                "message": "The from.email domain must be verified in your account to send emails. #MS42207",
                "errors": {
                    "from.email": [
                        "The from.email domain must be verified in your account to send emails. #MS42207"
                    ]
                }
            }));
        i
    });

    let mock_server = pact_builder.start_mock_server(None, None);
    let err = provider(mock_server.as_ref())
        .send(&message("mlsn.test-token"))
        .await
        .unwrap_err();

    assert!(matches!(err, ProviderError::Rejected { status: 422, .. }));
    assert!(err.to_string().contains("#MS42207"));
}
