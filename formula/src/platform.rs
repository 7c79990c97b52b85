//! Platform selection for prebuilt release artefacts.
//!
//! Releases are published for macOS and Linux, each on arm64 and amd64. Any
//! architecture that is not arm is treated as amd64, mirroring how the
//! release matrix was cut: there is no third architecture to fall through to.

use crate::error::{FormulaError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Operating systems with published release artefacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Os {
    /// macOS.
    Darwin,
    /// Linux.
    Linux,
}

impl Os {
    /// Return the OS component used in archive names.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Darwin => "darwin",
            Self::Linux => "linux",
        }
    }

    /// Parse an OS name as reported by `std::env::consts::OS` or as written
    /// in archive names.
    ///
    /// # Errors
    ///
    /// Returns [`FormulaError::UnsupportedPlatform`] for anything other than
    /// macOS or Linux.
    pub fn parse(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "darwin" | "macos" | "osx" => Ok(Self::Darwin),
            "linux" => Ok(Self::Linux),
            _ => Err(FormulaError::UnsupportedPlatform {
                value: value.to_owned(),
                expected: "darwin, linux".to_owned(),
            }),
        }
    }
}

impl fmt::Display for Os {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// CPU architectures with published release artefacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Arch {
    /// 64-bit ARM (Apple silicon, Graviton, ...).
    Arm64,
    /// Everything else; published as amd64.
    Amd64,
}

impl Arch {
    /// Return the architecture component used in archive names.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Arm64 => "arm64",
            Self::Amd64 => "amd64",
        }
    }

    /// Classify an architecture name. Arm variants map to [`Arch::Arm64`];
    /// every other value maps to [`Arch::Amd64`].
    #[must_use]
    pub fn classify(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "aarch64" | "arm64" | "arm" => Self::Arm64,
            _ => Self::Amd64,
        }
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An OS and architecture pair selecting one release artefact.
///
/// # Examples
///
/// ```
/// use domaindetails_formula::platform::{Arch, Os, Platform};
///
/// let platform = Platform::from_parts("macos", "aarch64").expect("supported");
/// assert_eq!(platform, Platform::new(Os::Darwin, Arch::Arm64));
/// assert_eq!(platform.key(), "darwin-arm64");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Platform {
    os: Os,
    arch: Arch,
}

const ALL_PLATFORMS: [Platform; 4] = [
    Platform::new(Os::Darwin, Arch::Arm64),
    Platform::new(Os::Darwin, Arch::Amd64),
    Platform::new(Os::Linux, Arch::Arm64),
    Platform::new(Os::Linux, Arch::Amd64),
];

impl Platform {
    /// Create a platform from its components.
    #[must_use]
    pub const fn new(os: Os, arch: Arch) -> Self {
        Self { os, arch }
    }

    /// Build a platform from free-form OS and architecture names.
    ///
    /// # Errors
    ///
    /// Returns [`FormulaError::UnsupportedPlatform`] when the OS is not
    /// supported. Architectures never fail: non-arm values select amd64.
    pub fn from_parts(os: &str, arch: &str) -> Result<Self> {
        Ok(Self::new(Os::parse(os)?, Arch::classify(arch)))
    }

    /// Return the platform of the running host.
    ///
    /// # Errors
    ///
    /// Returns [`FormulaError::UnsupportedPlatform`] on hosts other than
    /// macOS or Linux.
    pub fn current() -> Result<Self> {
        Self::from_parts(std::env::consts::OS, std::env::consts::ARCH)
    }

    /// Every supported platform, in publication order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &ALL_PLATFORMS
    }

    /// The operating system.
    #[must_use]
    pub const fn os(self) -> Os {
        self.os
    }

    /// The CPU architecture.
    #[must_use]
    pub const fn arch(self) -> Arch {
        self.arch
    }

    /// Return the `<os>-<arch>` key used in archive names and manifests.
    #[must_use]
    pub fn key(self) -> String {
        format!("{}-{}", self.os, self.arch)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.os, self.arch)
    }
}

impl FromStr for Platform {
    type Err = FormulaError;

    fn from_str(value: &str) -> Result<Self> {
        Self::all()
            .iter()
            .copied()
            .find(|platform| platform.key() == value)
            .ok_or_else(|| FormulaError::UnsupportedPlatform {
                value: value.to_owned(),
                expected: Self::all()
                    .iter()
                    .map(|platform| platform.key())
                    .collect::<Vec<_>>()
                    .join(", "),
            })
    }
}

impl TryFrom<String> for Platform {
    type Error = FormulaError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Platform> for String {
    fn from(platform: Platform) -> Self {
        platform.key()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::macos_arm("macos", "aarch64", "darwin-arm64")]
    #[case::macos_intel("macos", "x86_64", "darwin-amd64")]
    #[case::linux_arm("linux", "aarch64", "linux-arm64")]
    #[case::linux_intel("linux", "x86_64", "linux-amd64")]
    #[case::linux_other("linux", "riscv64", "linux-amd64")]
    #[case::darwin_alias("Darwin", "arm64", "darwin-arm64")]
    fn from_parts_selects_expected_key(#[case] os: &str, #[case] arch: &str, #[case] key: &str) {
        let platform = Platform::from_parts(os, arch).expect("supported OS");
        assert_eq!(platform.key(), key);
    }

    #[test]
    fn rejects_windows() {
        let err = Platform::from_parts("windows", "x86_64").expect_err("unsupported");
        assert!(matches!(err, FormulaError::UnsupportedPlatform { .. }));
    }

    #[test]
    fn all_lists_four_platforms_in_order() {
        let keys: Vec<String> = Platform::all().iter().map(|p| p.key()).collect();
        assert_eq!(
            keys,
            ["darwin-arm64", "darwin-amd64", "linux-arm64", "linux-amd64"]
        );
    }

    #[test]
    fn parses_keys_back() {
        for platform in Platform::all() {
            let parsed: Platform = platform.key().parse().expect("known key");
            assert_eq!(parsed, *platform);
        }
    }

    #[test]
    fn unknown_key_lists_expected_keys() {
        let err = "freebsd-amd64".parse::<Platform>().expect_err("unknown key");
        assert!(err.to_string().contains("linux-amd64"));
    }
}
