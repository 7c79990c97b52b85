//! Release artefact naming and download URL construction.
//!
//! Archive names follow `<binary>-<version>-<os>-<arch>.tar.gz` and are
//! published under the `v<version>` release tag. URLs are expanded from a
//! template so that a manifest can point at a mirror without restating the
//! naming policy.

use crate::error::{FormulaError, Result};
use crate::platform::Platform;
use crate::repository::RepoSlug;
use crate::version::Version;

/// The fixed file extension for release archives.
pub const ARCHIVE_EXTENSION: &str = ".tar.gz";

/// Default download URL template for GitHub release assets.
pub const DEFAULT_URL_TEMPLATE: &str = "https://github.com/{repository}/releases/download/v{version}/{binary}-{version}-{os}-{arch}.tar.gz";

/// Descriptor for one downloadable prebuilt archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseArtefact {
    /// The platform the archive was built for.
    pub platform: Platform,
    /// The release version.
    pub version: Version,
    /// Fully expanded download URL.
    pub url: String,
    /// Checksum literal as declared in the manifest.
    pub sha256: String,
}

/// Return the archive filename for a binary, version, and platform.
///
/// # Examples
///
/// ```
/// use domaindetails_formula::platform::{Arch, Os, Platform};
/// use domaindetails_formula::release::archive_name;
/// use domaindetails_formula::version::Version;
///
/// let version = Version::try_from("1.0.0").expect("valid");
/// let name = archive_name("domaindetails", &version, Platform::new(Os::Linux, Arch::Amd64));
/// assert_eq!(name, "domaindetails-1.0.0-linux-amd64.tar.gz");
/// ```
#[must_use]
pub fn archive_name(binary: &str, version: &Version, platform: Platform) -> String {
    format!(
        "{binary}-{version}-{}-{}{ARCHIVE_EXTENSION}",
        platform.os(),
        platform.arch()
    )
}

/// Values substituted into a URL template.
#[derive(Debug, Clone, Copy)]
pub struct TemplateContext<'a> {
    /// Repository slug (`{repository}`).
    pub repository: &'a RepoSlug,
    /// Binary name (`{binary}`).
    pub binary: &'a str,
    /// Release version (`{version}`).
    pub version: &'a Version,
    /// Target platform (`{os}`, `{arch}`).
    pub platform: Platform,
}

/// Expand a download URL template.
///
/// # Errors
///
/// Returns [`FormulaError::Template`] if the template contains an unknown
/// placeholder or an unterminated `{`.
///
/// # Examples
///
/// ```
/// use domaindetails_formula::platform::{Arch, Os, Platform};
/// use domaindetails_formula::release::{DEFAULT_URL_TEMPLATE, TemplateContext, expand_template};
/// use domaindetails_formula::repository::RepoSlug;
/// use domaindetails_formula::version::Version;
///
/// let repository = RepoSlug::try_from("simplebytes-com/domaindetails-cli").expect("valid");
/// let version = Version::try_from("1.0.0").expect("valid");
/// let url = expand_template(
///     DEFAULT_URL_TEMPLATE,
///     &TemplateContext {
///         repository: &repository,
///         binary: "domaindetails",
///         version: &version,
///         platform: Platform::new(Os::Darwin, Arch::Arm64),
///     },
/// )
/// .expect("known placeholders");
/// assert_eq!(
///     url,
///     "https://github.com/simplebytes-com/domaindetails-cli/releases/download/v1.0.0/domaindetails-1.0.0-darwin-arm64.tar.gz"
/// );
/// ```
pub fn expand_template(template: &str, context: &TemplateContext<'_>) -> Result<String> {
    let mut expanded = String::with_capacity(template.len() + 32);
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        let (literal, tail) = rest.split_at(start);
        expanded.push_str(literal);
        let end = tail.find('}').ok_or_else(|| FormulaError::Template {
            template: template.to_owned(),
            reason: "unterminated placeholder".to_owned(),
        })?;
        let key = tail.get(1..end).unwrap_or_default();
        match key {
            "repository" => expanded.push_str(&context.repository.to_string()),
            "binary" => expanded.push_str(context.binary),
            "version" => expanded.push_str(context.version.as_str()),
            "os" => expanded.push_str(context.platform.os().as_str()),
            "arch" => expanded.push_str(context.platform.arch().as_str()),
            other => {
                return Err(FormulaError::Template {
                    template: template.to_owned(),
                    reason: format!("unknown placeholder {{{other}}}"),
                });
            }
        }
        rest = tail.get(end + 1..).unwrap_or_default();
    }
    expanded.push_str(rest);
    Ok(expanded)
}
