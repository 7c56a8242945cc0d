//! # Controller Configuration
//!
//! Controller-level settings loaded from environment variables.

use std::time::Duration;

/// Controller-level configuration
///
/// All settings have sensible defaults and can be overridden via environment variables.
/// Environment variables are populated from a ConfigMap using `envFrom` in the deployment.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Reconciliation error requeue interval (seconds)
    /// How long to wait before retrying a failed reconciliation
    pub reconciliation_error_requeue_secs: u64,
    /// Requeue interval after a resourceVersion conflict on a status patch (seconds)
    pub conflict_requeue_secs: u64,
    /// How often an EmailSenderConfig is re-validated against its provider (seconds)
    pub sender_config_revalidation_secs: u64,
    /// Maximum concurrent reconciliations per controller
    pub max_concurrent_reconciliations: u16,
    /// Namespace to watch. `None` watches all namespaces.
    pub watch_namespace: Option<String>,
    /// Base URL of the MailerSend API
    pub mailersend_api_url: String,
    /// MailerSend request timeout (seconds)
    pub mailersend_timeout_secs: u64,
    /// Base URL of the Mailgun API (use https://api.eu.mailgun.net for EU domains)
    pub mailgun_api_url: String,
    /// Mailgun request timeout (seconds)
    pub mailgun_timeout_secs: u64,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        use crate::constants::*;
        Self {
            reconciliation_error_requeue_secs: DEFAULT_RECONCILIATION_ERROR_REQUEUE_SECS,
            conflict_requeue_secs: DEFAULT_CONFLICT_REQUEUE_SECS,
            sender_config_revalidation_secs: DEFAULT_SENDER_CONFIG_REVALIDATION_SECS,
            max_concurrent_reconciliations: DEFAULT_MAX_CONCURRENT_RECONCILIATIONS,
            watch_namespace: None,
            mailersend_api_url: DEFAULT_MAILERSEND_API_URL.to_string(),
            mailersend_timeout_secs: DEFAULT_MAILERSEND_TIMEOUT_SECS,
            mailgun_api_url: DEFAULT_MAILGUN_API_URL.to_string(),
            mailgun_timeout_secs: DEFAULT_MAILGUN_TIMEOUT_SECS,
        }
    }
}

impl ControllerConfig {
    /// Load configuration from environment variables with defaults
    pub fn from_env() -> Self {
        use crate::constants::*;
        Self {
            reconciliation_error_requeue_secs: env_var_or_default(
                "RECONCILIATION_ERROR_REQUEUE_SECS",
                DEFAULT_RECONCILIATION_ERROR_REQUEUE_SECS,
            ),
            conflict_requeue_secs: env_var_or_default(
                "CONFLICT_REQUEUE_SECS",
                DEFAULT_CONFLICT_REQUEUE_SECS,
            ),
            sender_config_revalidation_secs: env_var_or_default(
                "SENDER_CONFIG_REVALIDATION_SECS",
                DEFAULT_SENDER_CONFIG_REVALIDATION_SECS,
            )
            .max(MIN_SENDER_CONFIG_REVALIDATION_SECS),
            max_concurrent_reconciliations: env_var_or_default(
                "MAX_CONCURRENT_RECONCILIATIONS",
                DEFAULT_MAX_CONCURRENT_RECONCILIATIONS,
            ),
            watch_namespace: std::env::var("WATCH_NAMESPACE")
                .ok()
                .filter(|ns| !ns.trim().is_empty()),
            mailersend_api_url: env_var_or_default_str(
                "MAILERSEND_API_URL",
                DEFAULT_MAILERSEND_API_URL,
            ),
            mailersend_timeout_secs: env_var_or_default(
                "MAILERSEND_TIMEOUT_SECS",
                DEFAULT_MAILERSEND_TIMEOUT_SECS,
            ),
            mailgun_api_url: env_var_or_default_str("MAILGUN_API_URL", DEFAULT_MAILGUN_API_URL),
            mailgun_timeout_secs: env_var_or_default(
                "MAILGUN_TIMEOUT_SECS",
                DEFAULT_MAILGUN_TIMEOUT_SECS,
            ),
        }
    }

    /// Get reconciliation error requeue duration
    pub fn reconciliation_error_requeue_duration(&self) -> Duration {
        Duration::from_secs(self.reconciliation_error_requeue_secs)
    }

    /// Get conflict requeue duration
    pub fn conflict_requeue_duration(&self) -> Duration {
        Duration::from_secs(self.conflict_requeue_secs)
    }

    /// Get sender config revalidation period, never shorter than
    /// `MIN_SENDER_CONFIG_REVALIDATION_SECS`
    pub fn sender_config_revalidation_duration(&self) -> Duration {
        Duration::from_secs(
            self.sender_config_revalidation_secs
                .max(crate::constants::MIN_SENDER_CONFIG_REVALIDATION_SECS),
        )
    }

    /// Get MailerSend request timeout
    pub fn mailersend_timeout(&self) -> Duration {
        Duration::from_secs(self.mailersend_timeout_secs)
    }

    /// Get Mailgun request timeout
    pub fn mailgun_timeout(&self) -> Duration {
        Duration::from_secs(self.mailgun_timeout_secs)
    }
}

/// Server-level configuration (metrics and health checks)
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// HTTP server port for metrics and health checks
    pub metrics_port: u16,
    /// How long to wait for the server to bind (seconds)
    pub startup_timeout_secs: u64,
    /// Readiness poll interval while waiting for the server (milliseconds)
    pub poll_interval_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        use crate::constants::*;
        Self {
            metrics_port: DEFAULT_METRICS_PORT,
            startup_timeout_secs: DEFAULT_SERVER_STARTUP_TIMEOUT_SECS,
            poll_interval_ms: DEFAULT_SERVER_POLL_INTERVAL_MS,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults
    pub fn from_env() -> Self {
        use crate::constants::*;
        Self {
            metrics_port: env_var_or_default("METRICS_PORT", DEFAULT_METRICS_PORT),
            startup_timeout_secs: env_var_or_default(
                "SERVER_STARTUP_TIMEOUT_SECS",
                DEFAULT_SERVER_STARTUP_TIMEOUT_SECS,
            ),
            poll_interval_ms: env_var_or_default(
                "SERVER_POLL_INTERVAL_MS",
                DEFAULT_SERVER_POLL_INTERVAL_MS,
            ),
        }
    }
}

/// Read environment variable or return default value
fn env_var_or_default<T: std::str::FromStr>(key: &str, default: T) -> T
where
    <T as std::str::FromStr>::Err: std::fmt::Debug,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Read environment variable as string or return default
fn env_var_or_default_str(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
