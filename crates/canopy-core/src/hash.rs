//! Content fingerprints.
//!
//! Archives are addressed by the SHA-512/256 digest of the raw file bytes,
//! hex-encoded in lowercase (64 characters).

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha512_256};
use std::fmt;

use crate::error::{ValidationError, ValidationResult};

/// Length in hex characters of a content digest.
pub const CONTENT_HASH_LEN: usize = 64;

/// A validated, lowercase hex content digest.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContentHash(String);

impl ContentHash {
    /// Hash raw file bytes.
    #[must_use]
    pub fn digest(bytes: impl AsRef<[u8]>) -> Self {
        let digest = Sha512_256::digest(bytes.as_ref());
        Self(hex::encode(digest))
    }

    /// Parse an externally supplied hex digest.
    ///
    /// Uppercase hex is accepted and normalised to lowercase.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidHash`] if the input is not
    /// exactly [`CONTENT_HASH_LEN`] hex characters.
    pub fn parse(raw: &str) -> ValidationResult<Self> {
        if raw.len() != CONTENT_HASH_LEN {
            return Err(ValidationError::InvalidHash(format!(
                "expected {CONTENT_HASH_LEN} hex characters, got {}",
                raw.len()
            )));
        }
        if !raw.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(ValidationError::InvalidHash(
                "digest contains non-hex characters".to_owned(),
            ));
        }
        Ok(Self(raw.to_ascii_lowercase()))
    }

    /// The hex digest.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ContentHash {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ContentHash> for String {
    fn from(hash: ContentHash) -> Self {
        hash.0
    }
}

impl std::str::FromStr for ContentHash {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_is_stable() {
        let a = ContentHash::digest("fmt.Println(`hello`)");
        let b = ContentHash::digest(b"fmt.Println(`hello`)");
        assert_eq!(a, b);
        assert_eq!(a.as_str().len(), CONTENT_HASH_LEN);
    }

    #[test]
    fn test_digest_differs_per_content() {
        assert_ne!(ContentHash::digest("a"), ContentHash::digest("b"));
    }

    #[test]
    fn test_known_vector() {
        // SHA-512/256 of the empty string.
        assert_eq!(
            ContentHash::digest("").as_str(),
            "c672b8d1ef56ed28ab87c3622c5114069bdd3ad7b8f9737498d0c01ecef0967a"
        );
    }

    #[test]
    fn test_parse_normalises_case() {
        let lower = ContentHash::digest("hello");
        let upper = lower.as_str().to_ascii_uppercase();
        assert_eq!(ContentHash::parse(&upper).unwrap(), lower);
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(matches!(
            ContentHash::parse("abc"),
            Err(ValidationError::InvalidHash(_))
        ));
        let not_hex = "z".repeat(CONTENT_HASH_LEN);
        assert!(matches!(
            ContentHash::parse(&not_hex),
            Err(ValidationError::InvalidHash(_))
        ));
    }

    #[test]
    fn test_serde_validates() {
        let hash = ContentHash::digest("x");
        let json = serde_json::to_string(&hash).unwrap();
        let back: ContentHash = serde_json::from_str(&json).unwrap();
        assert_eq!(back, hash);
        assert!(serde_json::from_str::<ContentHash>("\"nope\"").is_err());
    }
}
