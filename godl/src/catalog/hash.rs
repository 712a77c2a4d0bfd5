//! Hex-encoded content digest as published in the release catalog.
//!
//! The catalog carries digests as text and may leave them blank, so
//! [`HexDigest`] does not validate on construction. Decoding is an explicit,
//! fallible step, and comparison against raw digest bytes always goes through
//! it: malformed text simply never matches.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A hex-encoded digest string, possibly empty or malformed.
///
/// # Examples
///
/// ```
/// use godl::catalog::hash::HexDigest;
///
/// let digest = HexDigest::from("00ff");
/// assert!(digest.matches(&[0x00, 0xff]));
/// assert!(!HexDigest::from("not hex").matches(&[0x00, 0xff]));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HexDigest(String);

impl HexDigest {
    /// Encode raw digest bytes as lowercase hex.
    #[must_use]
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(hex::encode(bytes))
    }

    /// Return the digest text exactly as stored.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Return true when no digest was published.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Decode the hex text into digest bytes.
    ///
    /// # Errors
    ///
    /// Returns [`hex::FromHexError`] when the text has odd length or contains
    /// non-hex characters.
    pub fn decode(&self) -> Result<Vec<u8>, hex::FromHexError> {
        hex::decode(&self.0)
    }

    /// Compare against raw digest bytes.
    ///
    /// Returns false when the stored text cannot be decoded or decodes to a
    /// different length.
    #[must_use]
    pub fn matches(&self, other: &[u8]) -> bool {
        self.decode()
            .is_ok_and(|own| own.len() == other.len() && own == other)
    }
}

impl From<&str> for HexDigest {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for HexDigest {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl AsRef<str> for HexDigest {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HexDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
