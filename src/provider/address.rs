//! # Address Parsing
//!
//! Validated split of an email address into local part and domain.
//!
//! Accepts a bare `user@domain` or the display form `Name <user@domain>`.
//! This is a structural check only (one `@`, both sides non-empty), not an
//! RFC 5322 validator: the provider remains the authority on deliverability.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    #[error("address '{0}' has no '@' separator")]
    MissingSeparator(String),
    #[error("address '{0}' contains more than one '@'")]
    MultipleSeparators(String),
    #[error("address '{0}' has an empty local part")]
    EmptyLocalPart(String),
    #[error("address '{0}' has an empty domain")]
    EmptyDomain(String),
}

/// Borrowed view of a parsed address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmailAddress<'a> {
    name: Option<&'a str>,
    address: &'a str,
    local: &'a str,
    domain: &'a str,
}

impl<'a> EmailAddress<'a> {
    pub fn parse(raw: &'a str) -> Result<Self, AddressError> {
        let trimmed = raw.trim();
        let (name, addr) = match (trimmed.rfind('<'), trimmed.strip_suffix('>')) {
            (Some(open), Some(inner)) => {
                let name = trimmed[..open].trim().trim_matches('"').trim();
                (Some(name).filter(|n| !n.is_empty()), inner[open + 1..].trim())
            }
            _ => (None, trimmed),
        };

        let (local, domain) = addr
            .split_once('@')
            .ok_or_else(|| AddressError::MissingSeparator(raw.to_string()))?;

        if domain.contains('@') {
            return Err(AddressError::MultipleSeparators(raw.to_string()));
        }
        if local.trim().is_empty() {
            return Err(AddressError::EmptyLocalPart(raw.to_string()));
        }
        if domain.trim().is_empty() {
            return Err(AddressError::EmptyDomain(raw.to_string()));
        }

        Ok(Self {
            name,
            address: addr,
            local,
            domain,
        })
    }

    /// Display name of the `Name <user@domain>` form
    #[must_use]
    pub fn name(&self) -> Option<&'a str> {
        self.name
    }

    /// Bare `user@domain`, without display name or angle brackets
    #[must_use]
    pub fn address(&self) -> &'a str {
        self.address
    }

    #[must_use]
    pub fn local(&self) -> &'a str {
        self.local
    }

    #[must_use]
    pub fn domain(&self) -> &'a str {
        self.domain
    }
}
