//! Install receipts.
//!
//! A receipt records what was installed where, so that `status`, `test`,
//! and `uninstall` can act without re-deriving the install. It lives at
//! `<prefix>/share/<name>/install-receipt.json`.

use crate::error::{InstallerError, Result};
use crate::pipeline::InstallMethod;
use camino::{Utf8Path, Utf8PathBuf};
use log::debug;
use serde::{Deserialize, Serialize};
use std::fs;

/// File name of the receipt.
pub const RECEIPT_FILE: &str = "install-receipt.json";

/// Record of a completed installation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallReceipt {
    /// Formula name.
    pub name: String,
    /// Installed version.
    pub version: String,
    /// Which install path produced the binary.
    pub method: InstallMethod,
    /// Platform key such as `darwin-arm64`.
    pub platform: String,
    /// Location of the installed binary.
    pub binary_path: Utf8PathBuf,
    /// Verified archive checksum, if an archive was involved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
    /// Commit stamped into a source build.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit: Option<String>,
    /// UTC install time.
    pub installed_at: String,
    /// Version of the installer that wrote the receipt.
    pub installer_version: String,
}

/// Return the receipt path for `name` under `prefix`.
#[must_use]
pub fn receipt_path(prefix: &Utf8Path, name: &str) -> Utf8PathBuf {
    prefix.join("share").join(name).join(RECEIPT_FILE)
}

impl InstallReceipt {
    /// Write the receipt as pretty JSON, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::Receipt`] if the file cannot be written.
    pub fn write(&self, path: &Utf8Path) -> Result<()> {
        let receipt_error = |reason: String| InstallerError::Receipt {
            path: path.to_owned(),
            reason,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| receipt_error(e.to_string()))?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|e| receipt_error(e.to_string()))?;
        fs::write(path, format!("{json}\n")).map_err(|e| receipt_error(e.to_string()))
    }

    /// Read a receipt if one exists.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::Receipt`] if the file exists but cannot be
    /// read or parsed.
    pub fn read(path: &Utf8Path) -> Result<Option<Self>> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(InstallerError::Receipt {
                    path: path.to_owned(),
                    reason: e.to_string(),
                });
            }
        };
        serde_json::from_str(&text)
            .map(Some)
            .map_err(|e| InstallerError::Receipt {
                path: path.to_owned(),
                reason: e.to_string(),
            })
    }

    /// Delete the receipt and its directory if it becomes empty.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::Receipt`] if the file exists but cannot be
    /// removed.
    pub fn remove(path: &Utf8Path) -> Result<()> {
        match fs::remove_file(path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => {
                return Err(InstallerError::Receipt {
                    path: path.to_owned(),
                    reason: e.to_string(),
                });
            }
        }
        if let Some(parent) = path.parent() {
            // Only succeeds when empty.
            if fs::remove_dir(parent).is_err() {
                debug!("kept non-empty {parent}");
            }
        }
        Ok(())
    }
}
