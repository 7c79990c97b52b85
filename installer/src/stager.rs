//! Placing the binary into the install prefix.
//!
//! The binary is copied next to its destination under a temporary name and
//! then renamed over it, so an interrupted install never leaves a partially
//! written executable at `<prefix>/bin/<binary>`.

use crate::error::{InstallerError, Result};
use camino::{Utf8Path, Utf8PathBuf};
use log::debug;
use std::fs;

/// Handles staging of a single binary into `<prefix>/bin`.
#[derive(Debug, Clone)]
pub struct Stager {
    prefix: Utf8PathBuf,
    binary: String,
}

impl Stager {
    /// Create a new stager for `binary` under `prefix`.
    #[must_use]
    pub fn new(prefix: Utf8PathBuf, binary: &str) -> Self {
        Self {
            prefix,
            binary: binary.to_owned(),
        }
    }

    /// Return the `bin` directory under the prefix.
    #[must_use]
    pub fn bin_dir(&self) -> Utf8PathBuf {
        self.prefix.join("bin")
    }

    /// Return the final path of the installed binary.
    #[must_use]
    pub fn install_path(&self) -> Utf8PathBuf {
        self.bin_dir().join(&self.binary)
    }

    /// Ensure the bin directory exists and is writable.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::TargetNotWritable`] if the directory cannot
    /// be created or written.
    pub fn prepare(&self) -> Result<()> {
        let bin_dir = self.bin_dir();
        let not_writable = |e: std::io::Error| InstallerError::TargetNotWritable {
            path: bin_dir.clone(),
            reason: e.to_string(),
        };

        fs::create_dir_all(&bin_dir).map_err(not_writable)?;

        let probe = bin_dir.join(format!(".{}-install-probe", self.binary));
        fs::write(&probe, b"probe").map_err(not_writable)?;
        if let Err(e) = fs::remove_file(&probe) {
            debug!("could not remove {probe}: {e}");
        }
        Ok(())
    }

    /// Install the executable at `source` as `<prefix>/bin/<binary>`.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::BinaryMissing`] if `source` does not exist
    /// and [`InstallerError::StagingFailed`] if the copy or rename fails.
    pub fn stage(&self, source: &Utf8Path) -> Result<Utf8PathBuf> {
        if !source.is_file() {
            return Err(InstallerError::BinaryMissing {
                path: source.to_owned(),
            });
        }

        let dest = self.install_path();
        let partial = self.bin_dir().join(format!(".{}.partial", self.binary));
        let staging_error = |action: &str, e: std::io::Error| InstallerError::StagingFailed {
            reason: format!("failed to {action} {source} to {dest}: {e}"),
        };

        fs::copy(source, &partial).map_err(|e| staging_error("copy", e))?;
        set_executable(&partial).map_err(|e| staging_error("mark executable", e))?;
        if let Err(e) = fs::rename(&partial, &dest) {
            if let Err(cleanup) = fs::remove_file(&partial) {
                debug!("could not remove {partial}: {cleanup}");
            }
            return Err(staging_error("move", e));
        }
        debug!("staged {source} at {dest}");
        Ok(dest)
    }

    /// Remove the installed binary.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::BinaryMissing`] if nothing is installed and
    /// [`InstallerError::Io`] if removal fails.
    pub fn remove(&self) -> Result<Utf8PathBuf> {
        let path = self.install_path();
        if !path.exists() {
            return Err(InstallerError::BinaryMissing { path });
        }
        fs::remove_file(&path)?;
        Ok(path)
    }
}

#[cfg(unix)]
fn set_executable(path: &Utf8Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, fs::Permissions::from_mode(0o755))
}

#[cfg(not(unix))]
fn set_executable(_path: &Utf8Path) -> std::io::Result<()> {
    Ok(())
}

/// Return the default install prefix (`~/.local`).
#[must_use]
pub fn default_prefix(home: Option<&Utf8Path>) -> Option<Utf8PathBuf> {
    home.map(|home| home.join(".local"))
}
