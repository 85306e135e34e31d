use std::path::Path;

use tracing::warn;

use crate::core::error::{LauncherError, LauncherResult};

/// Recursively copy `source` into `destination`.
///
/// Only directories and regular files are copied; symlinks found in the
/// source tree are skipped. Returns the number of files copied.
pub fn copy_dir_recursive(source: &Path, destination: &Path) -> LauncherResult<usize> {
    std::fs::create_dir_all(destination).map_err(|e| LauncherError::io(destination, e))?;

    let mut copied = 0;
    let entries = std::fs::read_dir(source).map_err(|e| LauncherError::io(source, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| LauncherError::io(source, e))?;
        let src_path = entry.path();
        let dst_path = destination.join(entry.file_name());
        let file_type = entry
            .file_type()
            .map_err(|e| LauncherError::io(&src_path, e))?;

        if file_type.is_dir() {
            copied += copy_dir_recursive(&src_path, &dst_path)?;
        } else if file_type.is_file() {
            std::fs::copy(&src_path, &dst_path).map_err(|e| LauncherError::io(&dst_path, e))?;
            copied += 1;
        } else {
            warn!("Skipping non-regular entry {:?}", src_path);
        }
    }

    Ok(copied)
}
