//! Install pipeline orchestration.
//!
//! An installation follows exactly one path, chosen up front from the CLI
//! flags: the prebuilt archive, a build of the tagged source tarball, or a
//! build of the head branch. A failure on the chosen path aborts the
//! install; there is no fallback to another path.
//!
//! After the binary is acquired it is staged into `<prefix>/bin`, smoke
//! tested (unless skipped), and recorded in an install receipt.

use crate::builder::Builder;
use crate::deps::CommandExecutor;
use crate::download::ArtefactDownloader;
use crate::error::{InstallerError, Result};
use crate::extraction::ArchiveExtractor;
use crate::output::Progress;
use crate::prebuilt::fetch_prebuilt;
use crate::receipt::{InstallReceipt, receipt_path};
use crate::smoke::{SmokeContext, run_smoke_tests};
use crate::stager::Stager;
use crate::timestamp::now_utc_iso8601;
use camino::{Utf8Path, Utf8PathBuf};
use domaindetails_formula::error::FormulaError;
use domaindetails_formula::manifest::FormulaManifest;
use domaindetails_formula::platform::Platform;
use domaindetails_formula::recipe::{BuildRecipe, BuildSource};
use domaindetails_formula::sha256_digest::is_placeholder;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which install path to take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstallMethod {
    /// Download the prebuilt archive for the host platform.
    Prebuilt,
    /// Build the tagged source release.
    Source,
    /// Build the tip of the head branch.
    Head,
}

impl InstallMethod {
    /// Select the method from the `--build-from-source` and `--head` flags.
    ///
    /// `--head` implies a source build.
    ///
    /// # Examples
    ///
    /// ```
    /// use domaindetails_installer::pipeline::InstallMethod;
    ///
    /// assert_eq!(InstallMethod::from_flags(false, false), InstallMethod::Prebuilt);
    /// assert_eq!(InstallMethod::from_flags(true, false), InstallMethod::Source);
    /// assert_eq!(InstallMethod::from_flags(false, true), InstallMethod::Head);
    /// ```
    #[must_use]
    pub const fn from_flags(build_from_source: bool, head: bool) -> Self {
        match (build_from_source, head) {
            (_, true) => Self::Head,
            (true, false) => Self::Source,
            (false, false) => Self::Prebuilt,
        }
    }
}

impl fmt::Display for InstallMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Prebuilt => f.write_str("prebuilt"),
            Self::Source => f.write_str("source"),
            Self::Head => f.write_str("head"),
        }
    }
}

/// Options for one installation.
#[derive(Debug, Clone, Copy)]
pub struct InstallOptions {
    /// Install path to take.
    pub method: InstallMethod,
    /// Run the manifest smoke tests after staging.
    pub run_tests: bool,
    /// Replace an existing binary.
    pub force: bool,
}

/// What an installation would do, resolved without side effects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallPlan {
    /// Install path.
    pub method: InstallMethod,
    /// Version to be installed; `HEAD` for head builds.
    pub version: String,
    /// Host platform.
    pub platform: Platform,
    /// Archive URL or clone URL.
    pub source: String,
    /// Final binary location.
    pub target: Utf8PathBuf,
}

/// Resolve the install plan for `method` on `platform`.
///
/// # Errors
///
/// Returns [`InstallerError::Formula`] when the manifest cannot satisfy the
/// method: no checksum for the platform, a malformed URL template, or no
/// source or head recipe.
pub fn plan(
    manifest: &FormulaManifest,
    method: InstallMethod,
    platform: Platform,
    prefix: &Utf8Path,
) -> Result<InstallPlan> {
    let (version, source) = match method {
        InstallMethod::Prebuilt => {
            let artefact = manifest.prebuilt_artefact(platform)?;
            if is_placeholder(&artefact.sha256) {
                warn!(
                    "checksum for {} is a placeholder; installation will be refused",
                    platform.key()
                );
            }
            (artefact.version.to_string(), artefact.url)
        }
        InstallMethod::Source => {
            let recipe = manifest.source_recipe()?;
            (recipe.version.to_string(), recipe.url.clone())
        }
        InstallMethod::Head => {
            let recipe = manifest.source_recipe()?;
            let head = recipe.head.as_ref().ok_or_else(|| no_head(manifest))?;
            ("HEAD".to_owned(), format!("{} ({})", head.url, head.branch))
        }
    };
    Ok(InstallPlan {
        method,
        version,
        platform,
        source,
        target: manifest.install_path(prefix),
    })
}

fn no_head(manifest: &FormulaManifest) -> InstallerError {
    FormulaError::NoHeadSource {
        name: manifest.name.clone(),
    }
    .into()
}

/// External collaborators of an installation.
#[derive(Clone, Copy)]
pub struct Collaborators<'a> {
    /// Fetches archives.
    pub downloader: &'a dyn ArtefactDownloader,
    /// Unpacks archives.
    pub extractor: &'a dyn ArchiveExtractor,
    /// Runs `go`, `git`, and the installed binary.
    pub executor: &'a dyn CommandExecutor,
}

/// Result of a completed installation.
#[derive(Debug, Clone)]
pub struct InstallOutcome {
    /// The receipt written for this installation.
    pub receipt: InstallReceipt,
    /// Number of smoke tests that passed; zero when skipped.
    pub tests_passed: usize,
}

/// A binary produced by one of the install paths.
struct Acquired {
    path: Utf8PathBuf,
    version: String,
    sha256: Option<String>,
    commit: Option<String>,
    _work_dir: tempfile::TempDir,
}

/// Install the manifest's binary under `prefix`.
///
/// # Errors
///
/// Returns [`InstallerError::AlreadyInstalled`] when a binary exists and
/// `force` is unset, and otherwise any error from the chosen install path,
/// staging, smoke tests, or receipt writing. Nothing is installed when the
/// acquisition step fails.
pub fn install(
    manifest: &FormulaManifest,
    platform: Platform,
    prefix: &Utf8Path,
    options: InstallOptions,
    collaborators: Collaborators<'_>,
    progress: &mut Progress<'_>,
) -> Result<InstallOutcome> {
    let binary = manifest.binary_name();
    let stager = Stager::new(prefix.to_owned(), binary);
    let receipt_file = receipt_path(prefix, &manifest.name);

    if !options.force && stager.install_path().exists() {
        let version = InstallReceipt::read(&receipt_file)?
            .map_or_else(|| "unknown".to_owned(), |receipt| receipt.version);
        return Err(InstallerError::AlreadyInstalled {
            path: stager.install_path(),
            version,
        });
    }
    stager.prepare()?;

    let acquired = match options.method {
        InstallMethod::Prebuilt => acquire_prebuilt(manifest, platform, collaborators, progress)?,
        InstallMethod::Source => {
            let recipe = manifest.source_recipe()?;
            acquire_build(recipe, &recipe.release_source(), binary, collaborators, progress)?
        }
        InstallMethod::Head => {
            let recipe = manifest.source_recipe()?;
            let source = recipe.head_source().ok_or_else(|| no_head(manifest))?;
            acquire_build(recipe, &source, binary, collaborators, progress)?
        }
    };

    // A receipt vouches for the staged binary, so the old one goes before
    // the binary is replaced.
    InstallReceipt::remove(&receipt_file)?;
    progress.step(format!("Installing to {}...", stager.install_path()));
    let installed = stager.stage(&acquired.path)?;

    let tests_passed = if options.run_tests {
        progress.step("Running smoke tests...");
        run_smoke_tests(
            collaborators.executor,
            &installed,
            &manifest.smoke_tests(),
            SmokeContext {
                version: &acquired.version,
                name: binary,
            },
        )?
    } else {
        progress.warn(format!("smoke tests skipped; {installed} is unverified"));
        0
    };

    let receipt = InstallReceipt {
        name: manifest.name.clone(),
        version: acquired.version,
        method: options.method,
        platform: platform.key(),
        binary_path: installed,
        sha256: acquired.sha256,
        commit: acquired.commit,
        installed_at: now_utc_iso8601(),
        installer_version: env!("CARGO_PKG_VERSION").to_owned(),
    };
    receipt.write(&receipt_file)?;
    info!("wrote install receipt {receipt_file}");

    Ok(InstallOutcome {
        receipt,
        tests_passed,
    })
}

fn acquire_prebuilt(
    manifest: &FormulaManifest,
    platform: Platform,
    collaborators: Collaborators<'_>,
    progress: &mut Progress<'_>,
) -> Result<Acquired> {
    let artefact = manifest.prebuilt_artefact(platform)?;
    let fetched = fetch_prebuilt(
        &artefact,
        manifest.binary_name(),
        collaborators.downloader,
        collaborators.extractor,
        progress,
    )?;
    Ok(Acquired {
        path: fetched.path().to_owned(),
        version: artefact.version.to_string(),
        sha256: Some(fetched.sha256.to_string()),
        commit: None,
        _work_dir: fetched.into_work_dir(),
    })
}

fn acquire_build(
    recipe: &BuildRecipe,
    source: &BuildSource,
    binary: &str,
    collaborators: Collaborators<'_>,
    progress: &mut Progress<'_>,
) -> Result<Acquired> {
    let work_dir = tempfile::Builder::new()
        .prefix("domaindetails-build-")
        .tempdir()?;
    let work_path = Utf8PathBuf::try_from(work_dir.path().to_path_buf()).map_err(|err| {
        InstallerError::BuildFailed {
            reason: format!("build directory is not valid UTF-8: {err}"),
        }
    })?;

    let builder = Builder::new(
        collaborators.executor,
        collaborators.downloader,
        collaborators.extractor,
    );
    let result = builder.build(recipe, source, binary, &work_path, progress)?;
    let commit = matches!(source, BuildSource::Head(_)).then_some(result.commit);

    Ok(Acquired {
        path: result.binary_path,
        version: result.version,
        sha256: result.source_sha256.map(|digest| digest.to_string()),
        commit,
        _work_dir: work_dir,
    })
}

/// Remove the installed binary and its receipt.
///
/// # Errors
///
/// Returns [`InstallerError::BinaryMissing`] if no binary is installed; the
/// receipt is removed regardless.
pub fn uninstall(manifest: &FormulaManifest, prefix: &Utf8Path) -> Result<Utf8PathBuf> {
    InstallReceipt::remove(&receipt_path(prefix, &manifest.name))?;
    let removed = Stager::new(prefix.to_owned(), manifest.binary_name()).remove()?;
    info!("removed {removed}");
    Ok(removed)
}

/// Run the smoke tests against an existing installation.
///
/// The expected version comes from the install receipt when present, and
/// from the manifest's prebuilt version otherwise.
///
/// # Errors
///
/// Returns [`InstallerError::BinaryMissing`] or
/// [`InstallerError::SmokeTestFailed`] as [`run_smoke_tests`] does.
pub fn test_installed(
    manifest: &FormulaManifest,
    prefix: &Utf8Path,
    executor: &dyn CommandExecutor,
) -> Result<usize> {
    let binary = manifest.install_path(prefix);
    let version = InstallReceipt::read(&receipt_path(prefix, &manifest.name))?
        .map_or_else(|| manifest.prebuilt.version.to_string(), |r| r.version);
    run_smoke_tests(
        executor,
        &binary,
        &manifest.smoke_tests(),
        SmokeContext {
            version: &version,
            name: manifest.binary_name(),
        },
    )
}

/// Installation state under a prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstallStatus {
    /// Formula name.
    pub name: String,
    /// Where the binary is or would be installed.
    pub binary_path: Utf8PathBuf,
    /// Whether the binary exists.
    pub installed: bool,
    /// Receipt of the last installation, if any.
    pub receipt: Option<InstallReceipt>,
}

impl InstallStatus {
    /// Format the status for display.
    #[must_use]
    pub fn display_text(&self) -> String {
        match (&self.receipt, self.installed) {
            (Some(receipt), true) => format!(
                "{} {} installed at {} ({}, {}, {})",
                self.name,
                receipt.version,
                self.binary_path,
                receipt.method,
                receipt.platform,
                receipt.installed_at
            ),
            (None, true) => format!(
                "{} installed at {} (no install receipt)",
                self.name, self.binary_path
            ),
            (_, false) => format!("{} is not installed at {}", self.name, self.binary_path),
        }
    }
}

/// Report the installation state under `prefix`.
///
/// # Errors
///
/// Returns [`InstallerError::Receipt`] if a receipt exists but is corrupt.
pub fn status(manifest: &FormulaManifest, prefix: &Utf8Path) -> Result<InstallStatus> {
    let binary_path = manifest.install_path(prefix);
    Ok(InstallStatus {
        name: manifest.name.clone(),
        installed: binary_path.is_file(),
        binary_path,
        receipt: InstallReceipt::read(&receipt_path(prefix, &manifest.name))?,
    })
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
