//! Error types for the domaindetails installer.
//!
//! This module defines semantic error variants that provide actionable guidance
//! to users when installation fails. Each error includes recovery hints where
//! applicable.

use crate::download::DownloadError;
use crate::extraction::ExtractionError;
use crate::verification::VerificationError;
use camino::Utf8PathBuf;
use domaindetails_formula::FormulaError;
use thiserror::Error;

/// Errors that can occur during installation, build, or verification.
#[derive(Debug, Error)]
pub enum InstallerError {
    /// The formula manifest is invalid or incomplete for the requested action.
    #[error(transparent)]
    Formula(#[from] FormulaError),

    /// The installer configuration file could not be read or parsed.
    #[error("invalid configuration {path}: {reason}")]
    Config {
        /// Path to the configuration file.
        path: Utf8PathBuf,
        /// Description of the failure.
        reason: String,
    },

    /// No install prefix was given and none could be derived.
    #[error("could not determine an install prefix; pass --prefix or set DOMAINDETAILS_PREFIX")]
    PrefixUnavailable,

    /// Downloading an archive failed.
    #[error(transparent)]
    Download(#[from] DownloadError),

    /// Unpacking an archive failed.
    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    /// The downloaded archive did not match its declared checksum.
    #[error(transparent)]
    Verification(#[from] VerificationError),

    /// The archive unpacked cleanly but did not contain the binary.
    #[error("archive does not contain an executable named {name}")]
    BinaryNotInArchive {
        /// Expected executable name.
        name: String,
    },

    /// A build tool required for a source build is not available.
    #[error("{tool} is required to build from source but was not found: {reason}")]
    MissingBuildDependency {
        /// Name of the missing tool.
        tool: String,
        /// Why the probe failed.
        reason: String,
    },

    /// The source build command failed.
    #[error("build from source failed: {reason}")]
    BuildFailed {
        /// Build tool output or failure description.
        reason: String,
    },

    /// Git clone or query operation failed.
    #[error("git {operation} failed: {message}")]
    Git {
        /// The git operation that failed (clone, rev-parse, ...).
        operation: &'static str,
        /// Description of the failure.
        message: String,
    },

    /// An external command did not finish in time.
    #[error("{program} timed out after {seconds} seconds")]
    CommandTimeout {
        /// The program that was killed.
        program: String,
        /// Timeout that elapsed.
        seconds: u64,
    },

    /// The install directory exists but is not writable.
    #[error("install directory {path} is not writable: {reason}")]
    TargetNotWritable {
        /// Path to the non-writable directory.
        path: Utf8PathBuf,
        /// Description of the underlying I/O error.
        reason: String,
    },

    /// Placing the binary into the prefix failed.
    #[error("staging failed: {reason}")]
    StagingFailed {
        /// Description of the staging failure.
        reason: String,
    },

    /// A binary is already installed and `--force` was not given.
    #[error("{path} already exists (version {version}); pass --force to replace it")]
    AlreadyInstalled {
        /// Installed binary path.
        path: Utf8PathBuf,
        /// Version recorded in the install receipt.
        version: String,
    },

    /// The binary to test or remove is not where it should be.
    #[error("no executable found at {path}")]
    BinaryMissing {
        /// Expected binary path.
        path: Utf8PathBuf,
    },

    /// A post-install smoke test did not produce the expected output.
    #[error("smoke test `{command}` failed: {reason}")]
    SmokeTestFailed {
        /// The command line that was run.
        command: String,
        /// What was wrong with the result.
        reason: String,
    },

    /// The install receipt could not be read or written.
    #[error("install receipt {path}: {reason}")]
    Receipt {
        /// Receipt path.
        path: Utf8PathBuf,
        /// Description of the failure.
        reason: String,
    },

    /// Manifest validation reported errors.
    #[error("manifest has {errors} error(s)")]
    InvalidManifest {
        /// Number of error-level findings.
        errors: usize,
    },

    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to write output.
    #[error("failed to write output")]
    WriteFailed {
        /// The underlying error that caused the write to fail.
        #[source]
        source: std::io::Error,
    },

    /// Test stub received an unexpected or mismatched command invocation.
    #[cfg(any(test, feature = "test-support"))]
    #[error("stub mismatch: {message}")]
    StubMismatch {
        /// Description of what was expected versus what was received.
        message: String,
    },
}

/// Result type alias using [`InstallerError`].
pub type Result<T> = std::result::Result<T, InstallerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_build_dependency_names_the_tool() {
        let err = InstallerError::MissingBuildDependency {
            tool: "go".to_owned(),
            reason: "No such file or directory".to_owned(),
        };
        let msg = err.to_string();
        assert!(msg.starts_with("go is required"));
        assert!(msg.contains("No such file"));
    }

    #[test]
    fn already_installed_suggests_force() {
        let err = InstallerError::AlreadyInstalled {
            path: Utf8PathBuf::from("/usr/local/bin/domaindetails"),
            version: "1.0.0".to_owned(),
        };
        assert!(err.to_string().contains("--force"));
    }

    #[test]
    fn verification_errors_are_transparent() {
        let err = InstallerError::from(VerificationError::Mismatch {
            expected: "a".repeat(64),
            actual: "b".repeat(64),
        });
        assert!(err.to_string().starts_with("checksum mismatch"));
    }

    #[test]
    fn write_failed_preserves_source() {
        let err = InstallerError::WriteFailed {
            source: std::io::Error::other("broken pipe"),
        };
        assert!(std::error::Error::source(&err).is_some());
    }
}
