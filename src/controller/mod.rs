//! # Controller
//!
//! Core controller modules for the Hermes mail controller.
//!
//! - `reconciler`: Email and EmailSenderConfig reconciliation logic
//! - `server`: HTTP server for metrics and health checks

pub mod reconciler;
pub mod server;
