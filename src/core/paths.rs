use std::path::{Path, PathBuf};

use crate::core::error::{LauncherError, LauncherResult};

pub const APP_DIR_NAME: &str = "mikiho-launcher";
pub const MODPACK_NAME: &str = "geccopack";
pub const MANIFEST_FILE: &str = "manifest.json";
pub const OPTIONS_FILE: &str = "options.json";
const STAGING_DIR: &str = ".staging";

/// Well-known on-disk locations, all derived from one per-user config root.
///
/// ```text
/// <config_root>/mikiho-launcher/
///   options.json
///   .staging/<uuid>/      (in-flight installs)
///   geccopack/            (installed bundle)
///     manifest.json
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LauncherPaths {
    app_dir: PathBuf,
}

impl LauncherPaths {
    /// Resolve paths under the per-OS user configuration directory.
    pub fn from_user_config() -> LauncherResult<Self> {
        let root = dirs::config_dir().ok_or(LauncherError::ConfigDirUnavailable)?;
        Ok(Self::with_root(root))
    }

    /// Resolve paths under an explicit config root. A relative root is
    /// anchored at the current directory so launch paths stay absolute.
    pub fn with_root(config_root: impl AsRef<Path>) -> Self {
        let root = config_root.as_ref();
        let root = std::path::absolute(root).unwrap_or_else(|_| root.to_path_buf());
        Self {
            app_dir: root.join(APP_DIR_NAME),
        }
    }

    pub fn app_dir(&self) -> &Path {
        &self.app_dir
    }

    pub fn bundle_dir(&self) -> PathBuf {
        self.app_dir.join(MODPACK_NAME)
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.bundle_dir().join(MANIFEST_FILE)
    }

    pub fn options_path(&self) -> PathBuf {
        self.app_dir.join(OPTIONS_FILE)
    }

    /// Parent of per-install staging directories. Lives next to the bundle so
    /// the final rename never crosses a filesystem boundary.
    pub fn staging_root(&self) -> PathBuf {
        self.app_dir.join(STAGING_DIR)
    }
}
