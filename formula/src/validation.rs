//! Internal consistency checks for formula manifests.
//!
//! Validation never repairs a manifest. Every problem becomes a
//! [`Finding`]; callers decide whether warnings block a release.
//!
//! Checked properties:
//!
//! - each prebuilt download URL is well formed (`https`, a host, no
//!   whitespace, `.tar.gz` suffix);
//! - the declared version appears exactly twice in each URL: once as the
//!   `v<version>` tag segment and once in the archive filename;
//! - every supported platform has a checksum that is a valid SHA-256 hex
//!   digest (unfilled placeholders are warnings);
//! - the source recipe points at its own tag, has a valid checksum, at least
//!   one build dependency, and a named head branch;
//! - smoke tests have arguments and expectations.

use crate::error::FormulaError;
use crate::manifest::FormulaManifest;
use crate::platform::Platform;
use crate::recipe::BuildRecipe;
use crate::release::ARCHIVE_EXTENSION;
use crate::sha256_digest::{Sha256Digest, is_placeholder};
use crate::version::Version;
use std::fmt;

/// How serious a finding is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    /// The manifest is usable but incomplete.
    Warning,
    /// The manifest would produce a broken or unverifiable installation.
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Warning => f.write_str("warning"),
            Self::Error => f.write_str("error"),
        }
    }
}

/// One problem found in a manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    /// Severity of the problem.
    pub severity: Severity,
    /// The manifest element concerned (`prebuilt darwin-arm64`, `source`, ...).
    pub subject: String,
    /// Human-readable description.
    pub message: String,
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}: {}", self.severity, self.subject, self.message)
    }
}

/// The outcome of validating a manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    findings: Vec<Finding>,
}

impl ValidationReport {
    /// All findings in check order.
    #[must_use]
    pub fn findings(&self) -> &[Finding] {
        &self.findings
    }

    /// Whether no error-level findings were recorded.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.error_count() == 0
    }

    /// Number of error-level findings.
    #[must_use]
    pub fn error_count(&self) -> usize {
        self.count(Severity::Error)
    }

    /// Number of warning-level findings.
    #[must_use]
    pub fn warning_count(&self) -> usize {
        self.count(Severity::Warning)
    }

    fn count(&self, severity: Severity) -> usize {
        self.findings
            .iter()
            .filter(|finding| finding.severity == severity)
            .count()
    }

    fn push(&mut self, severity: Severity, subject: &str, message: impl Into<String>) {
        self.findings.push(Finding {
            severity,
            subject: subject.to_owned(),
            message: message.into(),
        });
    }
}

/// Validate a manifest.
///
/// # Examples
///
/// ```
/// use domaindetails_formula::manifest::FormulaManifest;
/// use domaindetails_formula::validation::validate;
///
/// let manifest = FormulaManifest::bundled().expect("bundled manifest parses");
/// let report = validate(&manifest);
/// // The bundled tap checksums are placeholders until the release job runs.
/// assert!(report.is_valid());
/// assert_eq!(report.warning_count(), 4);
/// ```
#[must_use]
pub fn validate(manifest: &FormulaManifest) -> ValidationReport {
    let mut report = ValidationReport::default();
    check_binary_name(manifest, &mut report);
    check_prebuilt(manifest, &mut report);
    if let Some(recipe) = &manifest.source {
        check_source(recipe, &mut report);
    }
    check_smoke_tests(manifest, &mut report);
    report
}

fn check_binary_name(manifest: &FormulaManifest, report: &mut ValidationReport) {
    let binary = manifest.binary_name();
    if binary.is_empty() || binary.contains(['/', '\\']) || binary.contains(char::is_whitespace)
    {
        report.push(
            Severity::Error,
            "binary",
            format!("\"{binary}\" is not a valid executable name"),
        );
    }
}

fn check_prebuilt(manifest: &FormulaManifest, report: &mut ValidationReport) {
    let version = &manifest.prebuilt.version;
    for platform in Platform::all() {
        let subject = format!("prebuilt {platform}");
        match manifest.prebuilt_url(*platform) {
            Ok(url) => {
                check_url(&url, &subject, report);
                check_version_placement(&url, version, manifest.binary_name(), &subject, report);
            }
            Err(err) => report.push(Severity::Error, &subject, err.to_string()),
        }
        match manifest.prebuilt.checksums.get(&platform.key()) {
            Some(literal) => check_checksum(literal, &subject, report),
            None => report.push(Severity::Error, &subject, "no checksum declared"),
        }
    }

    for key in manifest.prebuilt.checksums.keys() {
        if key.parse::<Platform>().is_err() {
            report.push(
                Severity::Warning,
                "prebuilt",
                format!("checksum declared for unknown platform \"{key}\""),
            );
        }
    }
}

fn check_source(recipe: &BuildRecipe, report: &mut ValidationReport) {
    let subject = "source";
    check_url(&recipe.url, subject, report);
    if !recipe.url.contains(&recipe.version.tag()) {
        report.push(
            Severity::Error,
            subject,
            format!(
                "source URL does not reference tag {}",
                recipe.version.tag()
            ),
        );
    }
    check_checksum(&recipe.sha256, subject, report);

    if recipe.build_dependencies.is_empty() {
        report.push(Severity::Error, subject, "no build dependencies declared");
    }
    if recipe.package.trim().is_empty() {
        report.push(Severity::Error, subject, "no Go package path declared");
    }

    if let Some(head) = &recipe.head {
        if head.branch.trim().is_empty() {
            report.push(Severity::Error, "source head", "head branch is empty");
        }
        if head.url.trim().is_empty() {
            report.push(Severity::Error, "source head", "head clone URL is empty");
        }
    }
}

fn check_smoke_tests(manifest: &FormulaManifest, report: &mut ValidationReport) {
    if manifest.tests.is_empty() {
        report.push(
            Severity::Warning,
            "test",
            "no smoke tests declared; the --version and --help checks will be used",
        );
    }
    for (index, test) in manifest.tests.iter().enumerate() {
        let subject = format!("test #{}", index + 1);
        if test.args.is_empty() {
            report.push(Severity::Error, &subject, "smoke test has no arguments");
        }
        if test.expect.is_empty() {
            report.push(
                Severity::Warning,
                &subject,
                "smoke test has no expected output; only the exit status is checked",
            );
        }
    }
}

fn check_checksum(literal: &str, subject: &str, report: &mut ValidationReport) {
    if is_placeholder(literal) {
        report.push(
            Severity::Warning,
            subject,
            format!("checksum is a placeholder ({literal})"),
        );
        return;
    }
    if let Err(FormulaError::InvalidSha256Digest { reason }) = Sha256Digest::try_from(literal) {
        report.push(Severity::Error, subject, format!("invalid checksum: {reason}"));
    }
}

fn check_url(url: &str, subject: &str, report: &mut ValidationReport) {
    let Some(rest) = url.strip_prefix("https://") else {
        report.push(Severity::Error, subject, format!("URL is not https: {url}"));
        return;
    };
    if url.contains(char::is_whitespace) {
        report.push(Severity::Error, subject, format!("URL contains whitespace: {url}"));
    }
    let host = rest.split('/').next().unwrap_or_default();
    if host.is_empty() {
        report.push(Severity::Error, subject, format!("URL has no host: {url}"));
    }
    if !url.ends_with(ARCHIVE_EXTENSION) {
        report.push(
            Severity::Error,
            subject,
            format!("URL does not end in {ARCHIVE_EXTENSION}: {url}"),
        );
    }
}

fn check_version_placement(
    url: &str,
    version: &Version,
    binary: &str,
    subject: &str,
    report: &mut ValidationReport,
) {
    let path = url.strip_prefix("https://").unwrap_or(url);
    let segments: Vec<&str> = path.split('/').skip(1).collect();
    let (filename, directories): (&str, &[&str]) = segments
        .split_last()
        .map_or(("", &[]), |(last, rest)| (*last, rest));
    let tag = version.tag();

    let tag_segments = directories.iter().filter(|segment| **segment == tag).count();
    if tag_segments != 1 {
        report.push(
            Severity::Error,
            subject,
            format!("expected one {tag} path segment, found {tag_segments}"),
        );
    }

    let in_path: usize = directories
        .iter()
        .map(|segment| segment.matches(version.as_str()).count())
        .sum();
    if in_path != 1 {
        report.push(
            Severity::Error,
            subject,
            format!(
                "version {version} appears {in_path} times in the release path, expected once"
            ),
        );
    }

    let prefix = format!("{binary}-{version}-");
    if !filename.starts_with(&prefix) {
        report.push(
            Severity::Error,
            subject,
            format!("archive name \"{filename}\" does not start with \"{prefix}\""),
        );
    }

    let in_filename = filename.matches(version.as_str()).count();
    if in_filename != 1 {
        report.push(
            Severity::Error,
            subject,
            format!(
                "version {version} appears {in_filename} times in archive name \"{filename}\", expected once"
            ),
        );
    }
}
