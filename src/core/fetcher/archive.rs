// ─── Archive Extraction ───
// Unpacks zip and tar.gz bundles. Entries are confined to the destination and
// symbolic/hard links are never materialized.

use std::fs::File;
use std::io::Read;
use std::path::{Component, Path, PathBuf};

use tracing::{debug, warn};

use super::locator::ArchiveKind;
use crate::core::error::{LauncherError, LauncherResult};

const S_IFMT: u32 = 0o170000;
const S_IFLNK: u32 = 0o120000;

/// Detect the archive format from the file header.
pub fn sniff_file(path: &Path) -> LauncherResult<Option<ArchiveKind>> {
    let mut header = [0u8; 4];
    let mut file = File::open(path).map_err(|e| LauncherError::io(path, e))?;
    let read = file
        .read(&mut header)
        .map_err(|e| LauncherError::io(path, e))?;
    Ok(ArchiveKind::sniff(&header[..read]))
}

pub fn extract(archive_path: &Path, kind: ArchiveKind, dest: &Path) -> LauncherResult<usize> {
    std::fs::create_dir_all(dest).map_err(|e| LauncherError::io(dest, e))?;
    let count = match kind {
        ArchiveKind::Zip => extract_zip(archive_path, dest)?,
        ArchiveKind::TarGz => extract_tar_gz(archive_path, dest)?,
    };
    debug!("Extracted {} entries from {:?} into {:?}", count, archive_path, dest);
    Ok(count)
}

fn extract_zip(zip_path: &Path, dest: &Path) -> LauncherResult<usize> {
    let zip_file = File::open(zip_path).map_err(|e| LauncherError::io(zip_path, e))?;
    let mut archive = zip::ZipArchive::new(zip_file)?;
    let mut written = 0;

    for index in 0..archive.len() {
        let mut zipped = archive.by_index(index)?;

        if zipped
            .unix_mode()
            .is_some_and(|mode| mode & S_IFMT == S_IFLNK)
        {
            warn!("Skipping symlink entry in archive: {}", zipped.name());
            continue;
        }

        let rel_path = zipped.enclosed_name().ok_or_else(|| LauncherError::Fetch {
            locator: zip_path.display().to_string(),
            reason: format!("zip entry escapes destination: {}", zipped.name()),
        })?;
        if rel_path.as_os_str().is_empty() {
            continue;
        }

        let out_path = dest.join(rel_path);
        if zipped.is_dir() {
            std::fs::create_dir_all(&out_path).map_err(|e| LauncherError::io(&out_path, e))?;
            continue;
        }

        if let Some(parent) = out_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| LauncherError::io(parent, e))?;
        }

        let mut out = File::create(&out_path).map_err(|e| LauncherError::io(&out_path, e))?;
        std::io::copy(&mut zipped, &mut out).map_err(|e| LauncherError::io(&out_path, e))?;
        drop(out);

        #[cfg(unix)]
        if let Some(mode) = zipped.unix_mode().filter(|mode| mode & 0o777 != 0) {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(mode & 0o777);
            std::fs::set_permissions(&out_path, perms)
                .map_err(|e| LauncherError::io(&out_path, e))?;
        }

        written += 1;
    }

    Ok(written)
}

fn extract_tar_gz(tar_path: &Path, dest: &Path) -> LauncherResult<usize> {
    let file = File::open(tar_path).map_err(|e| LauncherError::io(tar_path, e))?;
    let mut archive = tar::Archive::new(flate2::read::GzDecoder::new(file));
    let mut written = 0;

    let entries = archive
        .entries()
        .map_err(|e| LauncherError::io(tar_path, e))?;
    for entry in entries {
        let mut entry = entry.map_err(|e| LauncherError::io(tar_path, e))?;
        let entry_type = entry.header().entry_type();
        let raw_path = entry
            .path()
            .map_err(|e| LauncherError::io(tar_path, e))?
            .into_owned();

        if entry_type.is_symlink() || entry_type.is_hard_link() {
            warn!("Skipping link entry in archive: {:?}", raw_path);
            continue;
        }

        let rel_path = confined_path(&raw_path).ok_or_else(|| LauncherError::Fetch {
            locator: tar_path.display().to_string(),
            reason: format!("tar entry escapes destination: {}", raw_path.display()),
        })?;
        if rel_path.as_os_str().is_empty() {
            continue;
        }

        let out_path = dest.join(rel_path);
        if entry_type.is_dir() {
            std::fs::create_dir_all(&out_path).map_err(|e| LauncherError::io(&out_path, e))?;
            continue;
        }
        if !entry_type.is_file() {
            debug!("Skipping special tar entry {:?} ({:?})", raw_path, entry_type);
            continue;
        }

        if let Some(parent) = out_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| LauncherError::io(parent, e))?;
        }
        entry
            .unpack(&out_path)
            .map_err(|e| LauncherError::io(&out_path, e))?;
        written += 1;
    }

    Ok(written)
}

/// Keep only normal components; `None` if the path is absolute or climbs out.
fn confined_path(path: &Path) -> Option<PathBuf> {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => out.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    Some(out)
}
