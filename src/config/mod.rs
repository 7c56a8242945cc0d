//! # Configuration
//!
//! Controller and server settings, read once from the environment at startup.

mod controller;

pub use controller::{ControllerConfig, ServerConfig};
