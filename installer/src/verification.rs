//! Checksum verification for downloaded archives.
//!
//! A downloaded archive is hashed before anything is unpacked from it. On a
//! mismatch the archive is discarded and installation stops; there is no
//! retry and no fallback to another install path.

use domaindetails_formula::sha256_digest::Sha256Digest;
use log::debug;
use sha2::{Digest, Sha256};
use std::fs;
use std::io::Read;
use std::path::Path;

/// Errors arising from checksum verification.
#[derive(Debug, thiserror::Error)]
pub enum VerificationError {
    /// The archive digest differs from the declared checksum.
    #[error("checksum mismatch: expected {expected}, got {actual}")]
    Mismatch {
        /// Declared digest.
        expected: String,
        /// Digest of the downloaded bytes.
        actual: String,
    },

    /// The archive could not be read for hashing.
    #[error("failed to hash {path}: {source}")]
    Read {
        /// Path of the archive.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Compute the lowercase hex SHA-256 digest of a file.
///
/// # Errors
///
/// Returns [`VerificationError::Read`] if the file cannot be read.
pub fn compute_sha256(path: &Path) -> Result<String, VerificationError> {
    let read_error = |source| VerificationError::Read {
        path: path.display().to_string(),
        source,
    };
    let mut file = fs::File::open(path).map_err(read_error)?;
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8192];
    loop {
        let bytes_read = file.read(&mut buffer).map_err(read_error)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(buffer.get(..bytes_read).unwrap_or_default());
    }
    Ok(format!("{:x}", hasher.finalize()))
}

/// Verify that the file at `path` hashes to `expected`.
///
/// # Errors
///
/// Returns [`VerificationError::Mismatch`] when the digests differ.
pub fn verify_checksum(path: &Path, expected: &Sha256Digest) -> Result<(), VerificationError> {
    let actual = compute_sha256(path)?;
    if actual != expected.as_str() {
        return Err(VerificationError::Mismatch {
            expected: expected.to_string(),
            actual,
        });
    }
    debug!("checksum verified for {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const EMPTY_SHA256: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

    #[test]
    fn hashes_empty_file() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("empty");
        fs::write(&path, b"").expect("write");
        assert_eq!(compute_sha256(&path).expect("hash"), EMPTY_SHA256);
    }

    #[test]
    fn matching_digest_verifies() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("empty");
        fs::write(&path, b"").expect("write");
        let expected = Sha256Digest::try_from(EMPTY_SHA256).expect("valid digest");
        assert!(verify_checksum(&path, &expected).is_ok());
    }

    #[test]
    fn mismatch_reports_both_digests() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("tampered");
        fs::write(&path, b"tampered content").expect("write");
        let expected = Sha256Digest::try_from(EMPTY_SHA256).expect("valid digest");

        let err = verify_checksum(&path, &expected).expect_err("mismatch");
        match err {
            VerificationError::Mismatch { expected, actual } => {
                assert_eq!(expected, EMPTY_SHA256);
                assert_ne!(actual, EMPTY_SHA256);
                assert_eq!(actual.len(), 64);
            }
            other => panic!("expected Mismatch, got {other:?}"),
        }
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let err = compute_sha256(&dir.path().join("absent")).expect_err("missing");
        assert!(matches!(err, VerificationError::Read { .. }));
    }
}
