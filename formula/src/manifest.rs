//! Formula manifest schema and loading.
//!
//! A manifest is the TOML rendition of a package formula: descriptive
//! metadata, the prebuilt release (version, URL template, per-platform
//! checksums), an optional source build recipe, and smoke tests. Checksum
//! literals are kept verbatim so that [`crate::validation`] can report
//! malformed values instead of the loader refusing the whole file.
//!
//! ```toml
//! name = "domaindetails"
//! desc = "Domain RDAP and WHOIS lookup CLI tool"
//! homepage = "https://domaindetails.com"
//! license = "MIT"
//! repository = "simplebytes-com/domaindetails-cli"
//!
//! [prebuilt]
//! version = "1.0.0"
//!
//! [prebuilt.checksums]
//! darwin-arm64 = "<64 hex characters>"
//! ```

use crate::error::{FormulaError, Result};
use crate::platform::Platform;
use crate::recipe::BuildRecipe;
use crate::release::{DEFAULT_URL_TEMPLATE, ReleaseArtefact, TemplateContext, expand_template};
use crate::repository::RepoSlug;
use crate::smoke::SmokeTest;
use crate::version::Version;
use camino::{Utf8Path, Utf8PathBuf};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The manifest shipped with this workspace.
const BUNDLED_MANIFEST: &str = include_str!("../domaindetails.toml");

/// A package formula in manifest form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FormulaManifest {
    /// Package name.
    pub name: String,
    /// One-line description.
    pub desc: String,
    /// Project homepage.
    pub homepage: String,
    /// SPDX license identifier.
    pub license: String,
    /// Repository publishing the releases.
    pub repository: RepoSlug,
    /// Installed executable name; defaults to [`Self::name`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub binary: Option<String>,
    /// Homebrew tap repository, if the formula is published to one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tap: Option<RepoSlug>,
    /// Prebuilt release artefacts.
    pub prebuilt: PrebuiltRelease,
    /// Build-from-source recipe.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<BuildRecipe>,
    /// Post-install smoke tests.
    #[serde(default, rename = "test")]
    pub tests: Vec<SmokeTest>,
}

/// The prebuilt section of a manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PrebuiltRelease {
    /// Release version.
    pub version: Version,
    /// Download URL template.
    #[serde(default = "default_url_template")]
    pub url_template: String,
    /// Checksum literals keyed by platform key (`darwin-arm64`, ...).
    #[serde(default)]
    pub checksums: BTreeMap<String, String>,
}

fn default_url_template() -> String {
    DEFAULT_URL_TEMPLATE.to_owned()
}

impl FormulaManifest {
    /// Parse a manifest from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`FormulaError::ParseManifest`] if the TOML is malformed or a
    /// typed field (version, repository) fails validation.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| FormulaError::ParseManifest {
            reason: e.to_string(),
        })
    }

    /// Read and parse a manifest file.
    ///
    /// # Errors
    ///
    /// Returns [`FormulaError::ReadManifest`] if the file cannot be read, or
    /// any error from [`Self::from_toml_str`].
    pub fn load(path: &Utf8Path) -> Result<Self> {
        debug!("loading formula manifest from {path}");
        let text = std::fs::read_to_string(path).map_err(|e| FormulaError::ReadManifest {
            path: path.to_owned(),
            reason: e.to_string(),
        })?;
        Self::from_toml_str(&text)
    }

    /// Return the `domaindetails` manifest compiled into this crate.
    ///
    /// # Errors
    ///
    /// Returns an error only if the bundled manifest has been edited into an
    /// unparseable state.
    pub fn bundled() -> Result<Self> {
        Self::from_toml_str(BUNDLED_MANIFEST)
    }

    /// The installed executable name.
    #[must_use]
    pub fn binary_name(&self) -> &str {
        self.binary.as_deref().unwrap_or(&self.name)
    }

    /// The Ruby class name Homebrew derives from the formula name.
    ///
    /// # Examples
    ///
    /// ```
    /// use domaindetails_formula::manifest::FormulaManifest;
    ///
    /// let manifest = FormulaManifest::bundled().expect("bundled manifest parses");
    /// assert_eq!(manifest.class_name(), "Domaindetails");
    /// ```
    #[must_use]
    pub fn class_name(&self) -> String {
        self.name
            .split(['-', '_'])
            .filter(|part| !part.is_empty())
            .map(|part| {
                let mut chars = part.chars();
                chars.next().map_or_else(String::new, |first| {
                    first.to_uppercase().chain(chars).collect::<String>()
                })
            })
            .collect()
    }

    /// The smoke tests to run: those declared, or the version and help checks.
    #[must_use]
    pub fn smoke_tests(&self) -> Vec<SmokeTest> {
        if self.tests.is_empty() {
            SmokeTest::defaults()
        } else {
            self.tests.clone()
        }
    }

    /// Build the release artefact descriptor for one platform.
    ///
    /// # Errors
    ///
    /// Returns [`FormulaError::MissingChecksum`] if the platform has no
    /// checksum entry, or [`FormulaError::Template`] if the URL template is
    /// malformed.
    pub fn prebuilt_artefact(&self, platform: Platform) -> Result<ReleaseArtefact> {
        let key = platform.key();
        let sha256 = self
            .prebuilt
            .checksums
            .get(&key)
            .cloned()
            .ok_or(FormulaError::MissingChecksum { platform: key })?;
        let url = self.prebuilt_url(platform)?;
        Ok(ReleaseArtefact {
            platform,
            version: self.prebuilt.version.clone(),
            url,
            sha256,
        })
    }

    /// Expand the download URL for one platform.
    ///
    /// # Errors
    ///
    /// Returns [`FormulaError::Template`] if the URL template is malformed.
    pub fn prebuilt_url(&self, platform: Platform) -> Result<String> {
        expand_template(
            &self.prebuilt.url_template,
            &TemplateContext {
                repository: &self.repository,
                binary: self.binary_name(),
                version: &self.prebuilt.version,
                platform,
            },
        )
    }

    /// Build descriptors for every supported platform.
    ///
    /// # Errors
    ///
    /// Fails on the first platform that [`Self::prebuilt_artefact`] rejects.
    pub fn prebuilt_artefacts(&self) -> Result<Vec<ReleaseArtefact>> {
        Platform::all()
            .iter()
            .map(|platform| self.prebuilt_artefact(*platform))
            .collect()
    }

    /// Return the source build recipe.
    ///
    /// # Errors
    ///
    /// Returns [`FormulaError::NoSourceRecipe`] if none is declared.
    pub fn source_recipe(&self) -> Result<&BuildRecipe> {
        self.source.as_ref().ok_or_else(|| FormulaError::NoSourceRecipe {
            name: self.name.clone(),
        })
    }

    /// Return where the binary is installed under `prefix`.
    #[must_use]
    pub fn install_path(&self, prefix: &Utf8Path) -> Utf8PathBuf {
        prefix.join("bin").join(self.binary_name())
    }
}
