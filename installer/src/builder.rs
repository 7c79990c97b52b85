//! Go build orchestration for source and head installs.
//!
//! A release build downloads the tagged source tarball, verifies it against
//! the recipe checksum, and unpacks it. A head build shallow-clones the
//! declared branch. Both then run `go build` with linker flags that stamp
//! the version, commit, and build date into the binary.

use crate::deps::{CommandExecutor, check_build_dependencies};
use crate::download::ArtefactDownloader;
use crate::error::{InstallerError, Result};
use crate::extraction::{ArchiveExtractor, single_root};
use crate::git::{clone_head, short_commit};
use crate::output::Progress;
use crate::timestamp::build_timestamp;
use crate::verification::verify_checksum;
use camino::{Utf8Path, Utf8PathBuf};
use domaindetails_formula::recipe::{BuildRecipe, BuildSource, BuildStamp, HeadSource, UNKNOWN_COMMIT};
use domaindetails_formula::sha256_digest::Sha256Digest;
use domaindetails_formula::version::Version;
use log::{debug, info};

/// Prefix of the version stamped into head builds.
pub const HEAD_VERSION_PREFIX: &str = "HEAD-";

/// Result of a successful build.
#[derive(Debug, Clone)]
pub struct BuildResult {
    /// Path to the compiled executable.
    pub binary_path: Utf8PathBuf,
    /// Version stamped into the binary.
    pub version: String,
    /// Commit stamped into the binary.
    pub commit: String,
    /// Verified checksum of the source tarball, for release builds.
    pub source_sha256: Option<Sha256Digest>,
}

/// Collaborators used by the builder.
pub struct Builder<'a> {
    executor: &'a dyn CommandExecutor,
    downloader: &'a dyn ArtefactDownloader,
    extractor: &'a dyn ArchiveExtractor,
}

/// A checked-out module ready for `go build`.
struct Checkout {
    module_root: Utf8PathBuf,
    version: String,
    commit: String,
    source_sha256: Option<Sha256Digest>,
}

impl<'a> Builder<'a> {
    /// Create a new builder with the given collaborators.
    #[must_use]
    pub fn new(
        executor: &'a dyn CommandExecutor,
        downloader: &'a dyn ArtefactDownloader,
        extractor: &'a dyn ArchiveExtractor,
    ) -> Self {
        Self {
            executor,
            downloader,
            extractor,
        }
    }

    /// Build `binary` from `source` inside `work_dir`.
    ///
    /// `work_dir` must be empty or absent; the caller owns its lifetime.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::MissingBuildDependency`] if a build tool is
    /// absent, the download, verification, or git errors of the fetch step,
    /// and [`InstallerError::BuildFailed`] carrying the compiler's stderr.
    pub fn build(
        &self,
        recipe: &BuildRecipe,
        source: &BuildSource,
        binary: &str,
        work_dir: &Utf8Path,
        progress: &mut Progress<'_>,
    ) -> Result<BuildResult> {
        progress.step("Checking build dependencies...");
        check_build_dependencies(self.executor, &required_tools(recipe, source))?;

        let checkout = match source {
            BuildSource::Release {
                url,
                sha256,
                version,
            } => self.fetch_release(url, sha256, version, work_dir, progress)?,
            BuildSource::Head(head) => self.checkout_head(head, work_dir, progress)?,
        };

        let output_dir = work_dir.join("out");
        std::fs::create_dir_all(&output_dir)?;
        let binary_path = output_dir.join(binary);
        let date = build_timestamp();
        let ldflags = recipe.ldflags.render(&BuildStamp {
            version: &checkout.version,
            commit: &checkout.commit,
            date: &date,
        });

        progress.step(format!("Building {binary} {}...", checkout.version));
        self.go_build(&checkout.module_root, &ldflags, &binary_path, &recipe.package)?;
        info!("built {binary_path}");

        Ok(BuildResult {
            binary_path,
            version: checkout.version,
            commit: checkout.commit,
            source_sha256: checkout.source_sha256,
        })
    }

    fn fetch_release(
        &self,
        url: &str,
        sha256: &str,
        version: &Version,
        work_dir: &Utf8Path,
        progress: &mut Progress<'_>,
    ) -> Result<Checkout> {
        let expected = Sha256Digest::parse_literal("source tarball", sha256)?;
        std::fs::create_dir_all(work_dir)?;
        let tarball = work_dir.join(format!("{}.tar.gz", version.tag()));

        progress.step(format!("Downloading source {}...", version.tag()));
        self.downloader.download(url, tarball.as_std_path())?;
        progress.step("Verifying checksum...");
        verify_checksum(tarball.as_std_path(), &expected)?;

        let src_dir = work_dir.join("src");
        std::fs::create_dir_all(&src_dir)?;
        let extracted = self
            .extractor
            .extract(tarball.as_std_path(), src_dir.as_std_path())?;
        let module_root = match single_root(&extracted) {
            Some(root) => src_dir.join(root.to_string_lossy().as_ref()),
            None => src_dir,
        };
        ensure_go_module(&module_root)?;

        Ok(Checkout {
            module_root,
            version: version.to_string(),
            commit: UNKNOWN_COMMIT.to_owned(),
            source_sha256: Some(expected),
        })
    }

    fn checkout_head(
        &self,
        head: &HeadSource,
        work_dir: &Utf8Path,
        progress: &mut Progress<'_>,
    ) -> Result<Checkout> {
        let module_root = work_dir.join("src");
        progress.step(format!("Cloning {} ({})...", head.url, head.branch));
        clone_head(self.executor, head, &module_root)?;
        let commit = short_commit(self.executor, &module_root)?;
        ensure_go_module(&module_root)?;

        Ok(Checkout {
            module_root,
            version: format!("{HEAD_VERSION_PREFIX}{commit}"),
            commit,
            source_sha256: None,
        })
    }

    fn go_build(
        &self,
        module_root: &Utf8Path,
        ldflags: &str,
        binary_path: &Utf8Path,
        package: &str,
    ) -> Result<()> {
        debug!("go build -ldflags {ldflags:?} in {module_root}");
        let output = self.executor.run(
            "go",
            &build_args(ldflags, binary_path, package),
            Some(module_root),
        )?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(InstallerError::BuildFailed {
                reason: stderr.trim().to_owned(),
            });
        }
        if !binary_path.is_file() {
            return Err(InstallerError::BuildFailed {
                reason: format!("go build succeeded but {binary_path} was not produced"),
            });
        }
        Ok(())
    }
}

/// Arguments passed to `go` for a build.
#[must_use]
pub fn build_args<'a>(ldflags: &'a str, binary_path: &'a Utf8Path, package: &'a str) -> [&'a str; 7] {
    [
        "build",
        "-trimpath",
        "-ldflags",
        ldflags,
        "-o",
        binary_path.as_str(),
        package,
    ]
}

/// Tools to probe before building; head builds also need `git`.
fn required_tools(recipe: &BuildRecipe, source: &BuildSource) -> Vec<String> {
    let mut tools = recipe.build_dependencies.clone();
    if matches!(source, BuildSource::Head(_)) && !tools.iter().any(|tool| tool == "git") {
        tools.push("git".to_owned());
    }
    tools
}

fn ensure_go_module(module_root: &Utf8Path) -> Result<()> {
    if module_root.join("go.mod").is_file() {
        return Ok(());
    }
    Err(InstallerError::BuildFailed {
        reason: format!("no go.mod found in {module_root}"),
    })
}
