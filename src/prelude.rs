//! # Prelude
//!
//! Re-exports commonly used types and traits for convenience.
//!
//! ## Usage
//!
//! ```rust
//! use hermes_mail_controller::prelude::*;
//! ```

// CRD types - most commonly used
pub use crate::crd::*;

// Provider trait and registry - needed for implementing or mocking providers
pub use crate::provider::{
    EmailProvider, MessageDescriptor, ProviderError, ProviderKind, ProviderRegistry,
};

// Object store seam
pub use crate::store::{KubeStore, ObjectStore, StoreError};

// Reconciler types - core controller functionality
pub use crate::controller::reconciler::{
    reconcile_email, reconcile_sender_config, EmailOutcome, Reconciler, ReconcilerError,
};

// Credentials
pub use crate::credentials::{ApiToken, CredentialError};

// Config types - for configuration management
pub use crate::config::{ControllerConfig, ServerConfig};
