//! # Runtime
//!
//! Process-level plumbing around the reconcilers.
//!
//! - `initialization`: rustls, tracing, metrics, HTTP server, clients
//! - `watch_loop`: the two kube-runtime controllers
//! - `error_policy`: requeue policy and watch error classification

pub mod error_policy;
pub mod initialization;
pub mod watch_loop;
