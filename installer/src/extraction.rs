//! Archive extraction for release and source tarballs.
//!
//! Extracts `.tar.gz` archives to a target directory with path traversal
//! protection to prevent zip-slip attacks.

use flate2::read::GzDecoder;
use std::path::{Component, Path, PathBuf};

/// Trait for extracting archives, enabling test mocking.
///
/// # Examples
///
/// ```
/// use domaindetails_installer::extraction::TarGzExtractor;
///
/// let extractor = TarGzExtractor;
/// // Use extractor.extract(archive_path, dest_dir) in production
/// ```
#[cfg_attr(test, mockall::automock)]
pub trait ArchiveExtractor {
    /// Extract the archive at `archive_path` into `dest_dir`.
    ///
    /// Returns the relative paths of the entries that were extracted.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionError::PathTraversal`] if any entry attempts to
    /// escape the destination directory, [`ExtractionError::EmptyArchive`]
    /// if no files are found, and [`ExtractionError::Io`] on I/O failures.
    fn extract(&self, archive_path: &Path, dest_dir: &Path)
    -> Result<Vec<PathBuf>, ExtractionError>;
}

/// Errors arising from archive extraction.
#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    /// I/O error during extraction, including a corrupt gzip stream.
    #[error("extraction I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A path in the archive attempts to traverse outside the destination.
    #[error("path traversal detected: {path}")]
    PathTraversal {
        /// The offending path from the archive entry.
        path: String,
    },

    /// The archive contains no files.
    #[error("archive contains no files")]
    EmptyArchive,
}

/// Default extractor using the `flate2` and `tar` crates.
///
/// Validates each entry path before extraction.
#[derive(Debug, Clone, Copy, Default)]
pub struct TarGzExtractor;

impl ArchiveExtractor for TarGzExtractor {
    fn extract(
        &self,
        archive_path: &Path,
        dest_dir: &Path,
    ) -> Result<Vec<PathBuf>, ExtractionError> {
        let file = std::fs::File::open(archive_path)?;
        let mut archive = tar::Archive::new(GzDecoder::new(file));
        archive.set_preserve_permissions(true);
        let mut extracted = Vec::new();
        std::fs::create_dir_all(dest_dir)?;

        for entry_result in archive.entries()? {
            let mut entry = entry_result?;
            let entry_path = entry.path()?.into_owned();

            validate_entry_path(&entry_path)?;

            // `unpack_in` also refuses to write through a symlink planted by
            // an earlier entry.
            if !entry.unpack_in(dest_dir)? {
                return Err(ExtractionError::PathTraversal {
                    path: entry_path.display().to_string(),
                });
            }

            if entry.header().entry_type().is_file() {
                extracted.push(entry_path);
            }
        }

        if extracted.is_empty() {
            return Err(ExtractionError::EmptyArchive);
        }

        Ok(extracted)
    }
}

/// Validate that a tar entry path does not escape the destination
/// directory via `..` components or absolute paths.
fn validate_entry_path(path: &Path) -> Result<(), ExtractionError> {
    let escapes = path.is_absolute()
        || path
            .components()
            .any(|component| matches!(component, Component::ParentDir | Component::Prefix(_)));
    if escapes {
        return Err(ExtractionError::PathTraversal {
            path: path.display().to_string(),
        });
    }
    Ok(())
}

/// Locate the entry whose file name is `binary` among extracted paths.
///
/// The shallowest match wins so that a top-level binary is preferred over
/// one nested inside a documentation or vendor directory.
#[must_use]
pub fn find_binary<'a>(extracted: &'a [PathBuf], binary: &str) -> Option<&'a Path> {
    extracted
        .iter()
        .filter(|path| path.file_name().is_some_and(|name| name == binary))
        .min_by_key(|path| path.components().count())
        .map(PathBuf::as_path)
}

/// Return the single top-level directory of an unpacked source tarball.
///
/// GitHub tag archives unpack into `<repo>-<version>/`; builds run there.
#[must_use]
pub fn single_root(extracted: &[PathBuf]) -> Option<PathBuf> {
    let mut roots = extracted.iter().filter_map(|path| match path.components().next() {
        Some(Component::Normal(first)) if path.components().count() > 1 => {
            Some(PathBuf::from(first))
        }
        _ => None,
    });
    let first = roots.next()?;
    roots.all(|root| root == first).then_some(first)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{ArchiveEntry, tar_gz_with};
    use rstest::rstest;

    #[test]
    fn extract_real_archive() {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        let archive_path = temp_dir.path().join("test.tar.gz");
        let dest_dir = temp_dir.path().join("out");
        std::fs::create_dir_all(&dest_dir).expect("create dest");
        tar_gz_with(
            &archive_path,
            &[ArchiveEntry::executable("domaindetails", b"#!/bin/sh\n")],
        );

        let files = TarGzExtractor
            .extract(&archive_path, &dest_dir)
            .expect("extract");
        assert_eq!(files, vec![PathBuf::from("domaindetails")]);
        assert!(dest_dir.join("domaindetails").exists());
    }

    #[test]
    fn corrupt_archive_is_an_io_error() {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        let archive_path = temp_dir.path().join("corrupt.tar.gz");
        std::fs::write(&archive_path, b"not gzip at all").expect("write");

        let result = TarGzExtractor.extract(&archive_path, temp_dir.path());
        assert!(matches!(result, Err(ExtractionError::Io(_))));
    }

    #[test]
    fn extract_empty_archive() {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        let archive_path = temp_dir.path().join("empty.tar.gz");
        tar_gz_with(&archive_path, &[]);

        let result = TarGzExtractor.extract(&archive_path, temp_dir.path());
        assert!(matches!(result, Err(ExtractionError::EmptyArchive)));
    }

    #[rstest]
    #[case::parent_dir("../escape.txt")]
    #[case::nested_parent("foo/../../escape.txt")]
    #[case::absolute("/etc/passwd")]
    fn rejects_path_traversal(#[case] bad_path: &str) {
        let result = validate_entry_path(Path::new(bad_path));
        assert!(
            matches!(result, Err(ExtractionError::PathTraversal { .. })),
            "expected PathTraversal for {bad_path}"
        );
    }

    #[cfg(unix)]
    #[test]
    fn refuses_to_write_through_planted_symlink() {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        let outside = temp_dir.path().join("outside");
        std::fs::create_dir_all(&outside).expect("create outside");
        let archive_path = temp_dir.path().join("symlink.tar.gz");
        let dest_dir = temp_dir.path().join("out");

        let file = std::fs::File::create(&archive_path).expect("create archive");
        let encoder = flate2::write::GzEncoder::new(file, flate2::Compression::default());
        let mut builder = tar::Builder::new(encoder);
        let mut link = tar::Header::new_gnu();
        link.set_entry_type(tar::EntryType::Symlink);
        link.set_size(0);
        link.set_mode(0o777);
        link.set_link_name(&outside).expect("link name");
        link.set_cksum();
        builder
            .append_data(&mut link, "link", std::io::empty())
            .expect("append link");
        let payload = b"#!/bin/sh\n";
        let mut header = tar::Header::new_gnu();
        header.set_size(u64::try_from(payload.len()).expect("payload size"));
        header.set_mode(0o755);
        header.set_cksum();
        builder
            .append_data(&mut header, "link/domaindetails", &payload[..])
            .expect("append payload");
        builder
            .into_inner()
            .expect("finish tar")
            .finish()
            .expect("finish gzip");

        let result = TarGzExtractor.extract(&archive_path, &dest_dir);
        assert!(result.is_err(), "expected extraction to fail: {result:?}");
        assert!(!outside.join("domaindetails").exists());
    }

    #[test]
    fn accepts_normal_paths() {
        assert!(validate_entry_path(Path::new("bin/domaindetails")).is_ok());
    }

    #[test]
    fn find_binary_prefers_shallowest_match() {
        let extracted = vec![
            PathBuf::from("docs/domaindetails"),
            PathBuf::from("domaindetails"),
            PathBuf::from("LICENSE"),
        ];
        assert_eq!(
            find_binary(&extracted, "domaindetails"),
            Some(Path::new("domaindetails"))
        );
    }

    #[test]
    fn find_binary_ignores_similar_names() {
        let extracted = vec![PathBuf::from("domaindetails.sha256")];
        assert_eq!(find_binary(&extracted, "domaindetails"), None);
    }

    #[rstest]
    #[case::single(
        &["domaindetails-cli-1.0.1/go.mod", "domaindetails-cli-1.0.1/cmd/domaindetails/main.go"],
        Some("domaindetails-cli-1.0.1")
    )]
    #[case::mixed(&["a/go.mod", "b/go.mod"], None)]
    #[case::flat(&["go.mod"], None)]
    fn single_root_detects_tag_archive_layout(
        #[case] paths: &[&str],
        #[case] expected: Option<&str>,
    ) {
        let extracted: Vec<PathBuf> = paths.iter().map(PathBuf::from).collect();
        assert_eq!(single_root(&extracted), expected.map(PathBuf::from));
    }
}
