//! # Hermes Mail Controller
//!
//! A Kubernetes controller that sends email declared as custom resources.
//!
//! ## Overview
//!
//! 1. **Validating sender configurations** - Each `EmailSenderConfig` is checked
//!    against its provider (a trial send for MailerSend, an address check for
//!    Mailgun) and the verdict is written to its status
//! 2. **Dispatching emails** - Each `Email` is sent exactly once through the
//!    provider of the `EmailSenderConfig` it references, and the outcome is
//!    written to its status
//!
//! ## Features
//!
//! - **Providers**: MailerSend and Mailgun
//! - **Credential indirection**: API tokens are read from a `Secret` in the same namespace
//! - **Multi-namespace**: Watches all namespaces unless `WATCH_NAMESPACE` is set
//! - **Prometheus metrics**: Exposes metrics for monitoring and observability
//! - **Health checks**: HTTP endpoints for liveness and readiness checks

use anyhow::Result;
use hermes_mail_controller::runtime::{initialization::initialize, watch_loop::run_watch_loop};

#[tokio::main]
async fn main() -> Result<()> {
    let init = initialize().await?;
    run_watch_loop(init.client, init.reconciler, init.server_state).await
}
