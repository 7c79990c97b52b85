//! GitHub repository slug.

use crate::error::{FormulaError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A validated `owner/name` repository slug.
///
/// # Examples
///
/// ```
/// use domaindetails_formula::repository::RepoSlug;
///
/// let repo = RepoSlug::try_from("simplebytes-com/domaindetails-cli").expect("valid slug");
/// assert_eq!(repo.owner(), "simplebytes-com");
/// assert_eq!(
///     repo.github_url(),
///     "https://github.com/simplebytes-com/domaindetails-cli"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RepoSlug {
    owner: String,
    name: String,
}

impl RepoSlug {
    /// The owning user or organisation.
    #[must_use]
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// The repository name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The repository web URL on GitHub.
    #[must_use]
    pub fn github_url(&self) -> String {
        format!("https://github.com/{self}")
    }
}

impl TryFrom<&str> for RepoSlug {
    type Error = FormulaError;

    fn try_from(value: &str) -> Result<Self> {
        let invalid = || FormulaError::InvalidRepository {
            value: value.to_owned(),
        };
        let (owner, name) = value.split_once('/').ok_or_else(invalid)?;
        let well_formed = |part: &str| {
            !part.is_empty()
                && part
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        };
        if !well_formed(owner) || !well_formed(name) {
            return Err(invalid());
        }
        Ok(Self {
            owner: owner.to_owned(),
            name: name.to_owned(),
        })
    }
}

impl TryFrom<String> for RepoSlug {
    type Error = FormulaError;

    fn try_from(value: String) -> Result<Self> {
        Self::try_from(value.as_str())
    }
}

impl From<RepoSlug> for String {
    fn from(slug: RepoSlug) -> Self {
        slug.to_string()
    }
}

impl fmt::Display for RepoSlug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}
