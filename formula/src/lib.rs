//! Release and build metadata for the `domaindetails` CLI.
//!
//! This crate models what a package formula declares about the tool: where
//! the prebuilt archives live for each platform, which checksums they must
//! match, how to build from source, and how to smoke-test an installation.
//! It performs no network or process I/O; the installer crate drives those
//! steps from the values defined here.
//!
//! # Modules
//!
//! - [`error`] - Validation and loading errors
//! - [`manifest`] - TOML manifest schema and the bundled manifest
//! - [`platform`] - OS and architecture selection
//! - [`recipe`] - Build-from-source recipe and linker flags
//! - [`release`] - Archive naming and download URL templates
//! - [`render`] - Homebrew formula text generation
//! - [`repository`] - GitHub repository slug
//! - [`sha256_digest`] - SHA-256 digest newtype
//! - [`smoke`] - Post-install smoke tests
//! - [`validation`] - Manifest consistency checks
//! - [`version`] - Release version newtype

pub mod error;
pub mod manifest;
pub mod platform;
pub mod recipe;
pub mod release;
pub mod render;
pub mod repository;
pub mod sha256_digest;
pub mod smoke;
pub mod validation;
pub mod version;

pub use error::{FormulaError, Result};
pub use manifest::FormulaManifest;
pub use platform::Platform;
