//! Directory resolution abstraction for platform-specific paths.
//!
//! The installer needs the home directory (for the default `~/.local`
//! prefix) and the user configuration directory (for `config.toml`).
//! Routing both through [`BaseDirs`] lets tests substitute fixed paths.

use camino::Utf8PathBuf;

/// Name of the installer's directory under the user config directory.
pub const APP_DIR: &str = "domaindetails-installer";

/// Source of per-user base directories.
#[cfg_attr(test, mockall::automock)]
pub trait BaseDirs {
    /// The user's home directory.
    fn home_dir(&self) -> Option<Utf8PathBuf>;

    /// The user's configuration directory (e.g. `~/.config` on Linux).
    fn config_dir(&self) -> Option<Utf8PathBuf>;
}

/// The installer's configuration file path.
#[must_use]
pub fn config_file(dirs: &dyn BaseDirs) -> Option<Utf8PathBuf> {
    dirs.config_dir()
        .map(|dir| dir.join(APP_DIR).join("config.toml"))
}

/// [`BaseDirs`] backed by `directories-next`.
///
/// Directories that are not valid UTF-8 are treated as unavailable.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemBaseDirs;

impl BaseDirs for SystemBaseDirs {
    fn home_dir(&self) -> Option<Utf8PathBuf> {
        directories_next::BaseDirs::new()
            .and_then(|dirs| Utf8PathBuf::try_from(dirs.home_dir().to_path_buf()).ok())
    }

    fn config_dir(&self) -> Option<Utf8PathBuf> {
        directories_next::BaseDirs::new()
            .and_then(|dirs| Utf8PathBuf::try_from(dirs.config_dir().to_path_buf()).ok())
    }
}
