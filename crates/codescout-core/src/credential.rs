//! Access credentials and their storage fingerprints.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// A personal access token identifying the caller to the remote service.
#[derive(Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Credential(String);

impl Credential {
    /// Wrap a raw token. Surrounding whitespace is dropped.
    pub fn new(token: impl Into<String>) -> Self {
        let token: String = token.into();
        Self(token.trim().to_string())
    }

    /// The empty credential.
    pub fn empty() -> Self {
        Self(String::new())
    }

    /// Whether no token is set.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The raw token, for attaching to outgoing requests.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Stable fingerprint used to namespace cached entries.
    pub fn id(&self) -> CredentialId {
        CredentialId::from_token(&self.0)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            write!(f, "Credential(<empty>)")
        } else {
            write!(f, "Credential({})", self.id().short())
        }
    }
}

impl From<&str> for Credential {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Credential {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// A SHA-256 fingerprint of a credential, hex encoded.
///
/// Hex digits never contain the cache key separator, so a namespaced key can
/// always be split back into its owner and logical key.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CredentialId(String);

impl CredentialId {
    /// Compute the fingerprint of a raw token.
    pub fn from_token(token: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(token.as_bytes());
        Self(hex::encode(hasher.finalize()))
    }

    /// Parse a fingerprint previously produced by [`CredentialId::as_str`].
    pub fn from_hex(s: &str) -> Option<Self> {
        let bytes = hex::decode(s).ok()?;
        if bytes.len() != 32 {
            return None;
        }
        Some(Self(s.to_ascii_lowercase()))
    }

    /// Full hex representation.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 12 hex digits, for logs.
    pub fn short(&self) -> &str {
        &self.0[..12]
    }
}

impl fmt::Debug for CredentialId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CredentialId({})", self.short())
    }
}

impl fmt::Display for CredentialId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
