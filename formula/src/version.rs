//! Release version newtype.
//!
//! Versions are stored without the `v` prefix; the git tag is derived from
//! the version rather than declared separately, so the two cannot drift.

use crate::error::{FormulaError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A validated release version such as `1.0.1`.
///
/// # Examples
///
/// ```
/// use domaindetails_formula::version::Version;
///
/// let version = Version::try_from("1.0.1").expect("valid version");
/// assert_eq!(version.tag(), "v1.0.1");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Version(String);

impl Version {
    /// Return the version as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Return the git tag for this version (`v<version>`).
    #[must_use]
    pub fn tag(&self) -> String {
        format!("v{}", self.0)
    }
}

fn validate_version(value: &str) -> Result<()> {
    let reject = |reason: &str| {
        Err(FormulaError::InvalidVersion {
            value: value.to_owned(),
            reason: reason.to_owned(),
        })
    };

    if value.is_empty() {
        return reject("version must not be empty");
    }
    if value.starts_with('v') || value.starts_with('V') {
        return reject("declare the version without the tag prefix");
    }
    if value.chars().any(|c| c.is_whitespace() || c == '/') {
        return reject("version must not contain whitespace or '/'");
    }
    if !value.starts_with(|c: char| c.is_ascii_digit()) {
        return reject("version must start with a digit");
    }
    Ok(())
}

impl TryFrom<&str> for Version {
    type Error = FormulaError;

    fn try_from(value: &str) -> Result<Self> {
        validate_version(value)?;
        Ok(Self(value.to_owned()))
    }
}

impl TryFrom<String> for Version {
    type Error = FormulaError;

    fn try_from(value: String) -> Result<Self> {
        validate_version(&value)?;
        Ok(Self(value))
    }
}

impl From<Version> for String {
    fn from(version: Version) -> Self {
        version.0
    }
}

impl AsRef<str> for Version {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
