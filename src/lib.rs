//! Hermes Mail Controller Library
//!
//! This library provides the core functionality for the Hermes mail controller.
//! Tests are included in the module files and under `tests/`.
//!
//! ## Quick Start
//!
//! ```rust
//! use hermes_mail_controller::prelude::*;
//! ```
//!
//! This brings commonly used types and traits into scope. For more specific imports,
//! use the individual modules.

// Re-export modules so they can be tested
pub mod config;
pub mod constants;
pub mod controller;
pub mod crd;
pub mod credentials;
pub mod observability;
pub mod prelude;
pub mod provider;
pub mod runtime;
pub mod store;
