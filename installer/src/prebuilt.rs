//! Prebuilt archive download and verification.
//!
//! The prebuilt path downloads the release archive for the host platform,
//! verifies its SHA-256 checksum against the manifest, unpacks it, and
//! locates the executable. Work happens inside a temporary directory that
//! lives as long as the returned [`FetchedBinary`].
//!
//! Any failure is fatal. The caller does not fall back to a source build;
//! the user picks the install path explicitly.

use crate::download::ArtefactDownloader;
use crate::error::{InstallerError, Result};
use crate::extraction::{ArchiveExtractor, find_binary};
use crate::output::Progress;
use crate::verification::verify_checksum;
use camino::{Utf8Path, Utf8PathBuf};
use domaindetails_formula::release::{ReleaseArtefact, archive_name};
use domaindetails_formula::sha256_digest::Sha256Digest;
use log::{debug, info};
use tempfile::TempDir;

/// A verified binary unpacked into a temporary directory.
#[derive(Debug)]
pub struct FetchedBinary {
    path: Utf8PathBuf,
    /// Checksum the archive was verified against.
    pub sha256: Sha256Digest,
    work_dir: TempDir,
}

/// Download, verify, and unpack the prebuilt archive for one platform.
///
/// The checksum literal is parsed before any network access, so placeholder
/// or malformed checksums refuse to install without downloading anything.
///
/// # Errors
///
/// Returns [`InstallerError::Formula`] for an unusable checksum literal,
/// [`InstallerError::Download`], [`InstallerError::Verification`], or
/// [`InstallerError::Extraction`] when the corresponding step fails, and
/// [`InstallerError::BinaryNotInArchive`] if the archive lacks the binary.
pub fn fetch_prebuilt(
    artefact: &ReleaseArtefact,
    binary: &str,
    downloader: &dyn ArtefactDownloader,
    extractor: &dyn ArchiveExtractor,
    progress: &mut Progress<'_>,
) -> Result<FetchedBinary> {
    let subject = format!("prebuilt archive for {}", artefact.platform);
    let expected = Sha256Digest::parse_literal(&subject, &artefact.sha256)?;

    let work_dir = tempfile::Builder::new()
        .prefix("domaindetails-prebuilt-")
        .tempdir()?;
    let archive_file = archive_name(binary, &artefact.version, artefact.platform);
    let archive_path = work_dir.path().join(&archive_file);

    progress.step(format!("Downloading {archive_file}..."));
    downloader.download(&artefact.url, &archive_path)?;

    progress.step("Verifying checksum...");
    verify_checksum(&archive_path, &expected)?;
    info!("verified {archive_file} against {expected}");

    let unpack_dir = work_dir.path().join("unpacked");
    std::fs::create_dir_all(&unpack_dir)?;
    progress.step("Extracting archive...");
    let extracted = extractor.extract(&archive_path, &unpack_dir)?;
    debug!("extracted {} entries", extracted.len());

    let relative = find_binary(&extracted, binary).ok_or_else(|| {
        InstallerError::BinaryNotInArchive {
            name: binary.to_owned(),
        }
    })?;
    let path = Utf8PathBuf::try_from(unpack_dir.join(relative)).map_err(|err| {
        InstallerError::StagingFailed {
            reason: format!("unpacked path is not valid UTF-8: {err}"),
        }
    })?;

    Ok(FetchedBinary {
        path,
        sha256: expected,
        work_dir,
    })
}

impl FetchedBinary {
    /// Path of the unpacked executable.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Hand the temporary directory holding the binary to the caller.
    ///
    /// The binary is deleted when the returned directory is dropped.
    #[must_use]
    pub fn into_work_dir(self) -> TempDir {
        self.work_dir
    }
}
