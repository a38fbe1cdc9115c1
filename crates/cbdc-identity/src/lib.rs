//! CBDC Identity - Caller identity parsing
//!
//! The platform hands the ledger an opaque caller token: a
//! base64-encoded certificate-subject string of the form
//! `x509::<subject-attributes>::<issuer-attributes>`. This crate is the
//! single place that string is taken apart; everything downstream works
//! with the typed [`ClientIdentity`] it produces.
//!
//! Parsing is side-effect-free. The caller decides how to react to
//! failure.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type for identity parsing
pub type Result<T> = std::result::Result<T, IdentityError>;

/// Failures decoding an identity token
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    /// The token is not valid base64, or decodes to non-UTF-8 bytes
    #[error("identity token is not valid base64-encoded text: {message}")]
    InvalidEncoding { message: String },

    /// The decoded string does not match the expected structure
    #[error("malformed identity string: {reason}")]
    Malformed { reason: String },
}

impl IdentityError {
    fn malformed(reason: impl Into<String>) -> Self {
        Self::Malformed {
            reason: reason.into(),
        }
    }
}

/// The typed attributes derived from a caller's identity token
///
/// Derived per call and used transiently for authorization decisions;
/// never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientIdentity {
    /// The opaque token this identity was parsed from
    pub id: String,
    /// Subject common name with any `@domain` qualifier stripped
    pub user_name: String,
    /// Organizational affiliation (the access-control grouping unit)
    pub org: String,
    /// Subject organizational unit, when present
    pub org_unit: Option<String>,
}

impl ClientIdentity {
    /// Parse an opaque identity token.
    ///
    /// Organization resolution order: subject `O=`, then the domain part
    /// of an `@`-qualified subject `CN=`, then issuer `O=`.
    pub fn parse(raw: &str) -> Result<Self> {
        let decoded_bytes = BASE64
            .decode(raw)
            .map_err(|err| IdentityError::InvalidEncoding {
                message: err.to_string(),
            })?;
        let decoded =
            String::from_utf8(decoded_bytes).map_err(|_| IdentityError::InvalidEncoding {
                message: "decoded token is not UTF-8".to_string(),
            })?;

        let rest = decoded
            .strip_prefix("x509::")
            .ok_or_else(|| IdentityError::malformed("missing x509:: prefix"))?;

        let mut parts = rest.split("::");
        let subject = parts
            .next()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| IdentityError::malformed("missing subject attributes"))?;
        let issuer = parts.next();

        let common_name = attribute(subject, "CN")
            .ok_or_else(|| IdentityError::malformed("subject has no CN attribute"))?;

        let (user_name, cn_domain) = match common_name.split_once('@') {
            Some((local, domain)) => (local.to_string(), Some(domain.to_string())),
            None => (common_name.clone(), None),
        };

        let org = attribute(subject, "O")
            .or(cn_domain)
            .or_else(|| issuer.and_then(|attrs| attribute(attrs, "O")))
            .ok_or_else(|| IdentityError::malformed("no organization attribute resolvable"))?;

        Ok(Self {
            id: raw.to_string(),
            user_name,
            org,
            org_unit: attribute(subject, "OU"),
        })
    }
}

/// Extract the value of `KEY=` from a comma-separated attribute list.
fn attribute(attributes: &str, key: &str) -> Option<String> {
    attributes.split(',').find_map(|pair| {
        let (k, v) = pair.trim().split_once('=')?;
        (k == key && !v.is_empty()).then(|| v.to_string())
    })
}
