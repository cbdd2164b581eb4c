//! Typed wrapper for asset checksums.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// A validated SHA-256 digest (64 lowercase hex characters).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Sha256Digest(String);

impl Sha256Digest {
    /// Validate and wrap a hex digest string.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not exactly 64 ASCII hex characters.
    pub fn new(s: impl Into<String>) -> Result<Self, ChecksumError> {
        let s = s.into();
        if s.len() != 64 {
            return Err(ChecksumError::WrongLength(s.len()));
        }
        if !s.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ChecksumError::NotHex(s));
        }
        Ok(Self(s.to_lowercase()))
    }

    /// Compute the digest of a byte slice.
    pub fn compute(data: &[u8]) -> Self {
        use sha2::{Digest, Sha256};
        let mut hasher = Sha256::new();
        hasher.update(data);
        Self(hex::encode(hasher.finalize()))
    }

    /// Return the digest as a hex string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// An error validating a checksum string.
#[derive(Debug, thiserror::Error)]
pub enum ChecksumError {
    /// Wrong number of characters for a SHA-256 hex digest.
    #[error("expected 64 hex characters, got {0}")]
    WrongLength(usize),
    /// Contains non-hex characters.
    #[error("not a hex string: {0:?}")]
    NotHex(String),
}

impl fmt::Display for Sha256Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Sha256Digest {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for Sha256Digest {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::new(s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compute_and_validate_round_trip() {
        let d = Sha256Digest::compute(b"hello world");
        assert_eq!(d.as_str().len(), 64);
        assert_eq!(Sha256Digest::new(d.as_str()).unwrap(), d);
    }

    #[test]
    fn rejects_wrong_length() {
        assert!(Sha256Digest::new("abc").is_err());
    }

    #[test]
    fn rejects_non_hex() {
        assert!(Sha256Digest::new("z".repeat(64)).is_err());
    }
}
