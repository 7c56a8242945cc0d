//! # Custom Resource Definitions
//!
//! CRD types for the Hermes mail controller (API group `email.hermes.sender/v1`).
//!
//! ## Module Structure
//!
//! - `email.rs` - `Email`, one outbound message intent
//! - `sender_config.rs` - `EmailSenderConfig`, a reusable sending identity
//! - `status.rs` - status payloads and the delivery/validation state machines

mod email;
mod sender_config;
mod status;

// Re-export all public types
pub use email::{Email, EmailSpec};
pub use sender_config::{EmailSenderConfig, EmailSenderConfigSpec};
pub use status::{DeliveryStatus, EmailSenderConfigStatus, EmailStatus, ValidationStatus};
