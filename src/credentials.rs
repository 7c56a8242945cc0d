//! # Credential Resolver
//!
//! Reads the provider API token from the Secret an `EmailSenderConfig`
//! references by name.
//!
//! The lookup is always scoped to the namespace of the referencing resource.
//! Callers decide how to react to each failure: [`CredentialError::is_fatal`]
//! separates failures that should abort the reconcile (the scheduler will
//! retry) from those where the reconcile continues with an empty token.

use crate::constants::API_TOKEN_KEY;
use crate::store::{ObjectStore, StoreError};
use std::fmt;
use thiserror::Error;
use tracing::{debug, Span};
use zeroize::Zeroizing;

/// Provider API token, wiped from memory on drop
#[derive(Clone, Default)]
pub struct ApiToken(Zeroizing<String>);

impl ApiToken {
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(Zeroizing::new(token.into()))
    }

    #[must_use]
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for ApiToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            f.write_str("ApiToken(<empty>)")
        } else {
            f.write_str("ApiToken(***)")
        }
    }
}

#[derive(Debug, Error)]
pub enum CredentialError {
    /// Reference is blank
    #[error("credential reference is empty")]
    EmptyName,
    /// Secret does not exist
    #[error("secret {namespace}/{name} not found")]
    NotFound { namespace: String, name: String },
    /// Secret exists but has no token under the expected key
    #[error("secret {namespace}/{name} does not contain key '{key}'")]
    MissingField {
        namespace: String,
        name: String,
        key: &'static str,
    },
    /// Token bytes are not valid UTF-8
    #[error("secret {namespace}/{name} key '{key}' is not valid UTF-8")]
    InvalidEncoding {
        namespace: String,
        name: String,
        key: &'static str,
    },
    /// Object store unreachable
    #[error("failed to read secret {namespace}/{name}: {source}")]
    Transport {
        namespace: String,
        name: String,
        #[source]
        source: StoreError,
    },
}

impl CredentialError {
    /// Whether the reconcile should abort and let the scheduler retry
    ///
    /// `MissingField`, `InvalidEncoding` and `EmptyName` are soft: retrying
    /// cannot fix them and the provider will reject the empty token anyway.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            CredentialError::NotFound { .. } | CredentialError::Transport { .. }
        )
    }
}

/// Resolve the API token stored in Secret `name` in `namespace`
pub async fn resolve_api_token(
    store: &dyn ObjectStore,
    namespace: &str,
    name: &str,
    span: &Span,
) -> Result<ApiToken, CredentialError> {
    if name.trim().is_empty() {
        return Err(CredentialError::EmptyName);
    }

    let secret = store.get_secret(namespace, name).await.map_err(|e| {
        if e.is_not_found() {
            CredentialError::NotFound {
                namespace: namespace.to_string(),
                name: name.to_string(),
            }
        } else {
            CredentialError::Transport {
                namespace: namespace.to_string(),
                name: name.to_string(),
                source: e,
            }
        }
    })?;

    let value = match secret.data.as_ref().and_then(|data| data.get(API_TOKEN_KEY)) {
        Some(bytes) => String::from_utf8(bytes.0.clone()).map_err(|_| {
            CredentialError::InvalidEncoding {
                namespace: namespace.to_string(),
                name: name.to_string(),
                key: API_TOKEN_KEY,
            }
        })?,
        // stringData is write-only on a real API server, but fixtures and
        // dry-run objects may still carry it
        None => secret
            .string_data
            .as_ref()
            .and_then(|data| data.get(API_TOKEN_KEY))
            .cloned()
            .ok_or_else(|| CredentialError::MissingField {
                namespace: namespace.to_string(),
                name: name.to_string(),
                key: API_TOKEN_KEY,
            })?,
    };

    debug!(parent: span, secret.name = name, "Resolved API token from secret");
    Ok(ApiToken::new(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_debug_is_redacted() {
        let token = ApiToken::new("mlsn.secret");
        assert_eq!(format!("{token:?}"), "ApiToken(***)");
        assert_eq!(format!("{:?}", ApiToken::default()), "ApiToken(<empty>)");
    }

    #[test]
    fn test_fatality_classification() {
        assert!(CredentialError::NotFound {
            namespace: "default".into(),
            name: "cred1".into()
        }
        .is_fatal());
        assert!(!CredentialError::MissingField {
            namespace: "default".into(),
            name: "cred1".into(),
            key: API_TOKEN_KEY
        }
        .is_fatal());
        assert!(!CredentialError::InvalidEncoding {
            namespace: "default".into(),
            name: "cred1".into(),
            key: API_TOKEN_KEY
        }
        .is_fatal());
        assert!(!CredentialError::EmptyName.is_fatal());
    }
}
