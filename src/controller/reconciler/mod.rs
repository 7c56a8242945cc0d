//! # Reconciler
//!
//! Core reconciliation logic for `Email` and `EmailSenderConfig` resources.
//!
//! The two reconcilers never call each other. The Email reconciler only
//! reads the status the EmailSenderConfig reconciler persisted.
//!
//! ## Reconciliation Flow
//!
//! EmailSenderConfig:
//! 1. Parse the provider
//! 2. Resolve the API token from the referenced Secret
//! 3. Validate (trial send or local address check)
//! 4. Update status and schedule the next validation
//!
//! Email:
//! 1. Skip if the delivery status is already terminal
//! 2. Read the referenced EmailSenderConfig and its verdict
//! 3. Resolve the API token and send through the provider
//! 4. Update status once

pub mod email;
pub mod sender_config;
pub mod types;

// Re-export public API
pub use email::{emails_referencing, reconcile_email};
pub use sender_config::{reconcile_sender_config, revalidation_due_in};
pub use types::{EmailOutcome, Reconciler, ReconcilerError};
