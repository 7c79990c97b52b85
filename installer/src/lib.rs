//! domaindetails installer library.
//!
//! This crate installs the `domaindetails` CLI described by a release
//! manifest: it downloads and verifies the prebuilt archive, or builds the
//! tagged release or head branch with Go, then stages the binary into a
//! prefix and smoke-tests it. It is used by the `domaindetails-installer`
//! binary and can be driven programmatically with substitute downloaders,
//! extractors, and command executors.
//!
//! # Modules
//!
//! - [`builder`] - Go build orchestration for source and head installs
//! - [`cli`] - Command-line argument definitions
//! - [`config`] - Layered configuration (flags, environment, config file)
//! - [`deps`] - External command execution and build tool probing
//! - [`dirs`] - Directory resolution abstraction for platform-specific paths
//! - [`download`] - HTTP archive download
//! - [`error`] - Semantic error types with recovery hints
//! - [`extraction`] - `.tar.gz` extraction with path traversal protection
//! - [`git`] - Shallow clones and commit lookup for head builds
//! - [`output`] - Progress reporting and shell snippet generation
//! - [`pipeline`] - Install, uninstall, test, and status orchestration
//! - [`prebuilt`] - Prebuilt archive download and verification
//! - [`receipt`] - Install receipts
//! - [`smoke`] - Post-install smoke tests
//! - [`stager`] - Atomic placement of the binary into the prefix
//! - [`timestamp`] - UTC timestamps for receipts and build stamps
//! - [`verification`] - SHA-256 checksum verification

pub mod builder;
pub mod cli;
pub mod config;
pub mod deps;
pub mod dirs;
pub mod download;
pub mod error;
pub mod extraction;
pub mod git;
pub mod output;
pub mod pipeline;
pub mod prebuilt;
pub mod receipt;
pub mod smoke;
pub mod stager;
pub mod timestamp;
pub mod verification;

#[cfg(any(test, feature = "test-support"))]
pub mod test_utils;
