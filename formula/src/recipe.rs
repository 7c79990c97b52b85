//! Build-from-source recipe.
//!
//! The packaged tool is a Go program that reads its version banner from
//! three package-level variables (`version`, `commit`, `date`) injected at
//! link time. A recipe names the tagged source tarball, the tools required
//! to build it, and optionally a branch for head builds.

use crate::version::Version;
use serde::{Deserialize, Serialize};

/// Default Go package path containing the `main` package.
pub const DEFAULT_PACKAGE: &str = "./cmd/domaindetails";

/// Default branch used for head builds.
pub const DEFAULT_HEAD_BRANCH: &str = "main";

/// Value of the `commit` variable when the commit is unknown.
pub const UNKNOWN_COMMIT: &str = "none";

/// Recipe for building the binary from source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BuildRecipe {
    /// Version of the tagged source release.
    pub version: Version,
    /// Source tarball URL.
    pub url: String,
    /// Checksum literal for the source tarball.
    pub sha256: String,
    /// Tools that must be present to build.
    #[serde(default = "default_build_dependencies")]
    pub build_dependencies: Vec<String>,
    /// Go package path passed to `go build`.
    #[serde(default = "default_package")]
    pub package: String,
    /// Link-time variable injection.
    #[serde(default)]
    pub ldflags: LinkerFlags,
    /// Branch source for head builds.
    #[serde(default)]
    pub head: Option<HeadSource>,
}

fn default_build_dependencies() -> Vec<String> {
    vec!["go".to_owned()]
}

fn default_package() -> String {
    DEFAULT_PACKAGE.to_owned()
}

/// Branch checkout used for head builds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HeadSource {
    /// Git clone URL.
    pub url: String,
    /// Branch to build.
    #[serde(default = "default_head_branch")]
    pub branch: String,
}

fn default_head_branch() -> String {
    DEFAULT_HEAD_BRANCH.to_owned()
}

/// Where a source build takes its code from. Exactly one is used per build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildSource {
    /// The checksummed tarball for the tagged release.
    Release {
        /// Tarball URL.
        url: String,
        /// Checksum literal.
        sha256: String,
        /// Release version.
        version: Version,
    },
    /// The tip of a branch.
    Head(HeadSource),
}

impl BuildRecipe {
    /// Return the tagged-release build source.
    #[must_use]
    pub fn release_source(&self) -> BuildSource {
        BuildSource::Release {
            url: self.url.clone(),
            sha256: self.sha256.clone(),
            version: self.version.clone(),
        }
    }

    /// Return the head build source, if one is declared.
    #[must_use]
    pub fn head_source(&self) -> Option<BuildSource> {
        self.head.clone().map(BuildSource::Head)
    }
}

/// Linker flag configuration for stamping build metadata into the binary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LinkerFlags {
    /// Go package holding the version variables.
    pub variable_package: String,
    /// Strip the symbol table and DWARF data (`-s -w`).
    pub strip: bool,
}

impl Default for LinkerFlags {
    fn default() -> Self {
        Self {
            variable_package: "main".to_owned(),
            strip: true,
        }
    }
}

/// Build metadata stamped into the binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildStamp<'a> {
    /// Version string (`dev` for untagged builds).
    pub version: &'a str,
    /// Short commit hash, or [`UNKNOWN_COMMIT`].
    pub commit: &'a str,
    /// Build timestamp.
    pub date: &'a str,
}

impl LinkerFlags {
    /// Render the `-ldflags` argument for `go build`.
    ///
    /// # Examples
    ///
    /// ```
    /// use domaindetails_formula::recipe::{BuildStamp, LinkerFlags};
    ///
    /// let flags = LinkerFlags::default().render(&BuildStamp {
    ///     version: "1.0.1",
    ///     commit: "none",
    ///     date: "2024-12-01T00:00:00Z",
    /// });
    /// assert_eq!(
    ///     flags,
    ///     "-s -w -X main.version=1.0.1 -X main.commit=none -X main.date=2024-12-01T00:00:00Z"
    /// );
    /// ```
    #[must_use]
    pub fn render(&self, stamp: &BuildStamp<'_>) -> String {
        let package = &self.variable_package;
        let mut parts = Vec::with_capacity(8);
        if self.strip {
            parts.push("-s -w".to_owned());
        }
        parts.push(format!("-X {package}.version={}", stamp.version));
        parts.push(format!("-X {package}.commit={}", stamp.commit));
        parts.push(format!("-X {package}.date={}", stamp.date));
        parts.join(" ")
    }
}
