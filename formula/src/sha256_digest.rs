//! SHA-256 digest newtype for artefact verification.
//!
//! Validates that the value is a 64-character lowercase hexadecimal string
//! representing a 256-bit hash digest. Literals that still carry the
//! `REPLACE_WITH` marker are recognised separately so that unfilled
//! manifests can be reported as pending rather than corrupt.

use crate::error::{FormulaError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Expected length of a hex-encoded SHA-256 digest.
pub const DIGEST_HEX_LEN: usize = 64;

/// Prefix marking an unfilled checksum in a manifest.
pub const PLACEHOLDER_PREFIX: &str = "REPLACE_WITH";

/// A validated hex-encoded SHA-256 digest string.
///
/// # Examples
///
/// ```
/// use domaindetails_formula::sha256_digest::Sha256Digest;
///
/// let hex = "a".repeat(64);
/// let digest = Sha256Digest::try_from(hex.as_str()).expect("valid digest");
/// assert_eq!(digest.as_str().len(), 64);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Sha256Digest(String);

impl Sha256Digest {
    /// Return the digest as a hex string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parse a checksum literal from a manifest.
    ///
    /// `subject` names what the checksum belongs to and appears in errors.
    ///
    /// # Errors
    ///
    /// Returns [`FormulaError::PlaceholderChecksum`] for placeholder
    /// literals and [`FormulaError::InvalidSha256Digest`] for anything else
    /// that is not a 64-character lowercase hex string.
    pub fn parse_literal(subject: &str, value: &str) -> Result<Self> {
        if is_placeholder(value) {
            return Err(FormulaError::PlaceholderChecksum {
                subject: subject.to_owned(),
                value: value.to_owned(),
            });
        }
        Self::try_from(value)
    }
}

/// Whether `value` is an unfilled checksum placeholder.
#[must_use]
pub fn is_placeholder(value: &str) -> bool {
    value.starts_with(PLACEHOLDER_PREFIX)
}

impl TryFrom<&str> for Sha256Digest {
    type Error = FormulaError;

    fn try_from(value: &str) -> Result<Self> {
        validate_sha256(value)?;
        Ok(Self(value.to_owned()))
    }
}

impl TryFrom<String> for Sha256Digest {
    type Error = FormulaError;

    fn try_from(value: String) -> Result<Self> {
        validate_sha256(&value)?;
        Ok(Self(value))
    }
}

impl From<Sha256Digest> for String {
    fn from(digest: Sha256Digest) -> Self {
        digest.0
    }
}

impl AsRef<str> for Sha256Digest {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Sha256Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Validate that `value` is a well-formed hex-encoded SHA-256 digest.
fn validate_sha256(value: &str) -> Result<()> {
    if value.len() != DIGEST_HEX_LEN {
        return Err(FormulaError::InvalidSha256Digest {
            reason: format!(
                "expected {DIGEST_HEX_LEN} hex characters, got {}",
                value.chars().count()
            ),
        });
    }
    if let Some(bad) = value.chars().find(|c| !c.is_ascii_hexdigit()) {
        return Err(FormulaError::InvalidSha256Digest {
            reason: format!("non-hex character '{bad}'"),
        });
    }
    if value.chars().any(|c| c.is_ascii_uppercase()) {
        return Err(FormulaError::InvalidSha256Digest {
            reason: "digest must be lowercase".to_owned(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_valid_sixty_four_char_hex() {
        assert!(Sha256Digest::try_from("a".repeat(64).as_str()).is_ok());
    }

    #[test]
    fn rejects_too_short() {
        assert!(Sha256Digest::try_from("abcdef").is_err());
    }

    #[test]
    fn reports_length_of_overlong_literal() {
        let literal = "a".repeat(65);
        let err = Sha256Digest::try_from(literal.as_str()).expect_err("65 characters");
        assert!(err.to_string().contains("got 65"), "{err}");
    }

    #[test]
    fn accepts_source_tarball_checksum() {
        let literal = "a7ac0c70b6f3c10a2ca4840431a0b0c46927658a3512fcca093545dd0022dae7";
        assert!(Sha256Digest::try_from(literal).is_ok());
    }

    #[test]
    fn rejects_non_hex_characters() {
        let mut bad = "a".repeat(63);
        bad.push('g');
        assert!(Sha256Digest::try_from(bad.as_str()).is_err());
    }

    #[test]
    fn rejects_uppercase_hex() {
        let err = Sha256Digest::try_from("A".repeat(64).as_str()).expect_err("uppercase");
        assert!(err.to_string().contains("lowercase"));
    }

    #[test]
    fn placeholder_literal_is_reported_as_placeholder() {
        let err = Sha256Digest::parse_literal(
            "darwin-arm64",
            "REPLACE_WITH_ACTUAL_SHA256_FOR_DARWIN_ARM64",
        )
        .expect_err("placeholder");
        assert!(matches!(err, FormulaError::PlaceholderChecksum { .. }));
    }
}
