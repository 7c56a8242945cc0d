//! # Constants
//!
//! Shared constants used throughout the controller.
//!
//! These values represent reasonable defaults and can be overridden via
//! configuration or environment variables where applicable.

/// Field manager recorded on every status patch
pub const FIELD_MANAGER: &str = "hermes-mail-controller";

/// Key inside the referenced Secret that holds the provider API token
pub const API_TOKEN_KEY: &str = "apiToken";

/// Default HTTP server port for metrics and health checks
pub const DEFAULT_METRICS_PORT: u16 = 5000;

/// Default HTTP server startup timeout (how long to wait for server to be ready)
pub const DEFAULT_SERVER_STARTUP_TIMEOUT_SECS: u64 = 10;

/// Default HTTP server readiness poll interval
pub const DEFAULT_SERVER_POLL_INTERVAL_MS: u64 = 50;

/// Default requeue interval for reconciliation errors (seconds)
pub const DEFAULT_RECONCILIATION_ERROR_REQUEUE_SECS: u64 = 60;

/// Default requeue interval after an optimistic-concurrency conflict (seconds)
pub const DEFAULT_CONFLICT_REQUEUE_SECS: u64 = 1;

/// Default period between trial validations of an EmailSenderConfig (seconds)
///
/// Each MailerSend validation sends a real message.
pub const DEFAULT_SENDER_CONFIG_REVALIDATION_SECS: u64 = 36_000;

/// Lower bound for the revalidation period (seconds)
pub const MIN_SENDER_CONFIG_REVALIDATION_SECS: u64 = 60;

/// Attempts at writing an Email status after the provider was called
pub const MAX_STATUS_WRITE_ATTEMPTS: u32 = 5;

/// Default number of objects reconciled in parallel per controller
pub const DEFAULT_MAX_CONCURRENT_RECONCILIATIONS: u16 = 10;

/// MailerSend public API
pub const DEFAULT_MAILERSEND_API_URL: &str = "https://api.mailersend.com";

/// MailerSend request timeout (seconds)
pub const DEFAULT_MAILERSEND_TIMEOUT_SECS: u64 = 5;

/// Mailgun public API (US region)
pub const DEFAULT_MAILGUN_API_URL: &str = "https://api.mailgun.net";

/// Mailgun request timeout (seconds)
pub const DEFAULT_MAILGUN_TIMEOUT_SECS: u64 = 10;

/// Subject and body of the trial message used to validate a sender configuration
pub const TRIAL_MESSAGE_TEXT: &str = "test";

/// Initial backoff after a throttled watch stream (milliseconds)
pub const DEFAULT_WATCH_BACKOFF_START_MS: u64 = 1_000;

/// Upper bound of the watch stream backoff (milliseconds)
pub const DEFAULT_WATCH_BACKOFF_MAX_MS: u64 = 30_000;

/// Pause before a watch is retried after an authentication or unknown error (seconds)
pub const DEFAULT_WATCH_RESTART_DELAY_SECS: u64 = 5;
