//! Installer configuration.
//!
//! Settings come from four layers, highest precedence first: command-line
//! flags, the `DOMAINDETAILS_PREFIX` / `DOMAINDETAILS_MANIFEST` environment
//! variables, an optional `config.toml` in the user config directory, and
//! built-in defaults (`~/.local`, the bundled manifest).

use crate::dirs::{BaseDirs, config_file};
use crate::deps::DEFAULT_COMMAND_TIMEOUT;
use crate::download::DEFAULT_DOWNLOAD_TIMEOUT;
use crate::error::{InstallerError, Result};
use crate::stager::default_prefix;
use camino::{Utf8Path, Utf8PathBuf};
use log::debug;
use serde::Deserialize;
use std::time::Duration;

/// Environment variable overriding the install prefix.
pub const PREFIX_ENV: &str = "DOMAINDETAILS_PREFIX";

/// Environment variable overriding the manifest path.
pub const MANIFEST_ENV: &str = "DOMAINDETAILS_MANIFEST";

/// Contents of `config.toml`.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct InstallerConfig {
    /// Install prefix; the binary goes to `<prefix>/bin`.
    pub prefix: Option<Utf8PathBuf>,
    /// Manifest to use instead of the bundled one.
    pub manifest: Option<Utf8PathBuf>,
    /// Global timeout for archive downloads.
    pub download_timeout_secs: Option<u64>,
    /// Timeout for external commands (`go`, `git`, smoke tests).
    pub command_timeout_secs: Option<u64>,
}

impl InstallerConfig {
    /// Parse configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::Config`] naming `path` on malformed input or
    /// unknown keys.
    pub fn from_toml_str(text: &str, path: &Utf8Path) -> Result<Self> {
        toml::from_str(text).map_err(|e| InstallerError::Config {
            path: path.to_owned(),
            reason: e.to_string(),
        })
    }

    /// Load `config.toml` from the user config directory, if present.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::Config`] if the file exists but is invalid.
    pub fn load(dirs: &dyn BaseDirs) -> Result<Self> {
        Self::load_with(dirs, |path| match std::fs::read_to_string(path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        })
    }

    /// Load configuration using the supplied file reader.
    ///
    /// Exists so tests can simulate the file system.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::Config`] if reading or parsing fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use camino::Utf8PathBuf;
    /// use domaindetails_installer::config::InstallerConfig;
    /// use domaindetails_installer::dirs::BaseDirs;
    ///
    /// struct FixedDirs;
    ///
    /// impl BaseDirs for FixedDirs {
    ///     fn home_dir(&self) -> Option<Utf8PathBuf> {
    ///         Some(Utf8PathBuf::from("/home/user"))
    ///     }
    ///
    ///     fn config_dir(&self) -> Option<Utf8PathBuf> {
    ///         Some(Utf8PathBuf::from("/home/user/.config"))
    ///     }
    /// }
    ///
    /// let config = InstallerConfig::load_with(&FixedDirs, |_| {
    ///     Ok(Some("prefix = \"/opt/domaindetails\"\n".to_owned()))
    /// })?;
    /// assert_eq!(config.prefix, Some(Utf8PathBuf::from("/opt/domaindetails")));
    /// # Ok::<(), domaindetails_installer::error::InstallerError>(())
    /// ```
    pub fn load_with<F>(dirs: &dyn BaseDirs, reader: F) -> Result<Self>
    where
        F: FnOnce(&Utf8Path) -> std::io::Result<Option<String>>,
    {
        let Some(path) = config_file(dirs) else {
            return Ok(Self::default());
        };
        match reader(&path) {
            Ok(Some(text)) => {
                debug!("loaded configuration from {path}");
                Self::from_toml_str(&text, &path)
            }
            Ok(None) => Ok(Self::default()),
            Err(e) => Err(InstallerError::Config {
                path,
                reason: e.to_string(),
            }),
        }
    }
}

/// Values given on the command line.
#[derive(Clone, Debug, Default)]
pub struct CliOverrides {
    /// `--prefix`.
    pub prefix: Option<Utf8PathBuf>,
    /// `--manifest`.
    pub manifest: Option<Utf8PathBuf>,
}

/// Fully resolved settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Settings {
    /// Install prefix.
    pub prefix: Utf8PathBuf,
    /// Manifest path, or `None` for the bundled manifest.
    pub manifest: Option<Utf8PathBuf>,
    /// Download timeout.
    pub download_timeout: Duration,
    /// External command timeout.
    pub command_timeout: Duration,
}

impl Settings {
    /// Merge all configuration layers.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::PrefixUnavailable`] when no layer supplies a
    /// prefix and no home directory exists.
    pub fn resolve(cli: &CliOverrides, file: &InstallerConfig, dirs: &dyn BaseDirs) -> Result<Self> {
        let prefix = cli
            .prefix
            .clone()
            .or_else(|| env_path(PREFIX_ENV))
            .or_else(|| file.prefix.clone())
            .or_else(|| default_prefix(dirs.home_dir().as_deref()))
            .ok_or(InstallerError::PrefixUnavailable)?;

        Ok(Self {
            prefix,
            manifest: resolve_manifest(cli, file),
            download_timeout: file
                .download_timeout_secs
                .map_or(DEFAULT_DOWNLOAD_TIMEOUT, Duration::from_secs),
            command_timeout: file
                .command_timeout_secs
                .map_or(DEFAULT_COMMAND_TIMEOUT, Duration::from_secs),
        })
    }
}

/// Resolve the manifest path alone, for commands that install nothing.
///
/// `None` selects the bundled manifest.
#[must_use]
pub fn resolve_manifest(cli: &CliOverrides, file: &InstallerConfig) -> Option<Utf8PathBuf> {
    cli.manifest
        .clone()
        .or_else(|| env_path(MANIFEST_ENV))
        .or_else(|| file.manifest.clone())
}

fn env_path(name: &str) -> Option<Utf8PathBuf> {
    std::env::var(name)
        .ok()
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
        .map(Utf8PathBuf::from)
}
