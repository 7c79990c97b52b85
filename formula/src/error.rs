//! Error types for formula metadata.
//!
//! Each variant names the rejected input and the constraint it violated so
//! that manifest authors can fix the offending field directly.

use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors arising from invalid formula values or unreadable manifests.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormulaError {
    /// The OS is outside the supported set.
    #[error("unsupported platform \"{value}\"; expected one of: {expected}")]
    UnsupportedPlatform {
        /// The rejected OS or platform key.
        value: String,
        /// Comma-separated list of accepted values.
        expected: String,
    },

    /// A version string is empty or syntactically invalid.
    #[error("invalid version \"{value}\": {reason}")]
    InvalidVersion {
        /// The rejected version string.
        value: String,
        /// Description of the validation failure.
        reason: String,
    },

    /// A repository slug is not of the form `owner/name`.
    #[error("invalid repository \"{value}\": expected owner/name")]
    InvalidRepository {
        /// The rejected slug.
        value: String,
    },

    /// A SHA-256 digest is not a valid 64-character hex string.
    #[error("invalid SHA-256 digest: {reason}")]
    InvalidSha256Digest {
        /// Description of the validation failure.
        reason: String,
    },

    /// A checksum literal is still an unfilled placeholder.
    #[error("checksum for {subject} is a placeholder: {value}")]
    PlaceholderChecksum {
        /// What the checksum belongs to (platform key or `source`).
        subject: String,
        /// The placeholder literal.
        value: String,
    },

    /// The manifest has no checksum entry for a platform.
    #[error("no checksum declared for platform {platform}")]
    MissingChecksum {
        /// The platform key without an entry.
        platform: String,
    },

    /// A URL template contains an unknown placeholder or is unterminated.
    #[error("invalid URL template \"{template}\": {reason}")]
    Template {
        /// The offending template.
        template: String,
        /// Description of the failure.
        reason: String,
    },

    /// The manifest declares no source build recipe.
    #[error("manifest for {name} declares no source build recipe")]
    NoSourceRecipe {
        /// Formula name.
        name: String,
    },

    /// The manifest source recipe has no head branch.
    #[error("manifest for {name} declares no head source")]
    NoHeadSource {
        /// Formula name.
        name: String,
    },

    /// The manifest file could not be read.
    #[error("failed to read manifest {path}: {reason}")]
    ReadManifest {
        /// Path of the manifest.
        path: Utf8PathBuf,
        /// Description of the I/O failure.
        reason: String,
    },

    /// The manifest TOML could not be parsed.
    #[error("failed to parse manifest: {reason}")]
    ParseManifest {
        /// Description of the parse failure.
        reason: String,
    },

    /// Writing formula text failed.
    #[error("failed to render formula text")]
    Render(#[from] std::fmt::Error),
}

/// Result type alias using [`FormulaError`].
pub type Result<T> = std::result::Result<T, FormulaError>;
