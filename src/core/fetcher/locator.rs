// ─── Source Locators ───
// Parses the manifest `url` field into a closed set of fetch strategies.

use std::path::{Path, PathBuf};

use reqwest::Url;

use crate::core::error::{LauncherError, LauncherResult};

/// Archive formats the fetcher can unpack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    Zip,
    TarGz,
}

impl ArchiveKind {
    /// Guess the format from a file name or URL path.
    pub fn from_name(name: &str) -> Option<Self> {
        let lower = name.to_ascii_lowercase();
        if lower.ends_with(".zip") {
            Some(Self::Zip)
        } else if lower.ends_with(".tar.gz") || lower.ends_with(".tgz") {
            Some(Self::TarGz)
        } else {
            None
        }
    }

    /// Identify the format from the leading bytes of a file.
    pub fn sniff(header: &[u8]) -> Option<Self> {
        if header.starts_with(b"PK\x03\x04") || header.starts_with(b"PK\x05\x06") {
            Some(Self::Zip)
        } else if header.starts_with(&[0x1f, 0x8b]) {
            Some(Self::TarGz)
        } else {
            None
        }
    }

    fn from_query(value: &str, raw: &str) -> LauncherResult<Self> {
        match value.to_ascii_lowercase().as_str() {
            "zip" => Ok(Self::Zip),
            "tar.gz" | "tgz" => Ok(Self::TarGz),
            _ => Err(LauncherError::UnsupportedLocator(raw.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    /// Remote archive over HTTP(S). `kind` is `None` when the URL carries no
    /// hint and the format must be sniffed after download.
    RemoteArchive { url: Url, kind: Option<ArchiveKind> },
    /// Git repository, optionally pinned to a branch, tag or commit.
    Git { url: String, reference: Option<String> },
    /// Directory on the local filesystem, copied as-is.
    LocalDir(PathBuf),
    /// Archive on the local filesystem.
    LocalArchive { path: PathBuf, kind: ArchiveKind },
}

impl Locator {
    pub fn parse(raw: &str) -> LauncherResult<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(LauncherError::UnsupportedLocator(raw.to_string()));
        }

        if let Some(rest) = trimmed.strip_prefix("git::") {
            return parse_git(rest, raw);
        }
        if let Some(rest) = trimmed.strip_prefix("git+") {
            return parse_git(rest, raw);
        }

        let lower = trimmed.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            return parse_http(trimmed, raw);
        }

        if lower.starts_with("file://") {
            let url =
                Url::parse(trimmed).map_err(|_| LauncherError::UnsupportedLocator(raw.into()))?;
            let path = url
                .to_file_path()
                .map_err(|_| LauncherError::UnsupportedLocator(raw.into()))?;
            return Ok(local(path));
        }

        if Path::new(trimmed).is_absolute() {
            return Ok(local(PathBuf::from(trimmed)));
        }

        Err(LauncherError::UnsupportedLocator(raw.to_string()))
    }
}

fn local(path: PathBuf) -> Locator {
    match ArchiveKind::from_name(&path.to_string_lossy()) {
        Some(kind) => Locator::LocalArchive { path, kind },
        None => Locator::LocalDir(path),
    }
}

fn parse_http(trimmed: &str, raw: &str) -> LauncherResult<Locator> {
    let mut url = Url::parse(trimmed).map_err(|_| LauncherError::UnsupportedLocator(raw.into()))?;

    if url.path().to_ascii_lowercase().ends_with(".git") {
        return parse_git(trimmed, raw);
    }

    let mut forced = None;
    let mut kept = Vec::new();
    for (key, value) in url.query_pairs() {
        if key == "archive" {
            forced = Some(ArchiveKind::from_query(&value, raw)?);
        } else {
            kept.push((key.into_owned(), value.into_owned()));
        }
    }

    // The `archive` hint is ours, not the server's.
    if forced.is_some() {
        if kept.is_empty() {
            url.set_query(None);
        } else {
            url.query_pairs_mut().clear().extend_pairs(kept.iter());
        }
    }

    let kind = forced.or_else(|| ArchiveKind::from_name(url.path()));
    Ok(Locator::RemoteArchive { url, kind })
}

fn parse_git(rest: &str, raw: &str) -> LauncherResult<Locator> {
    let (base, query) = rest.split_once('?').unwrap_or((rest, ""));
    if base.trim().is_empty() {
        return Err(LauncherError::UnsupportedLocator(raw.to_string()));
    }

    let reference = query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == "ref")
        .map(|(_, value)| value.to_string())
        .filter(|value| !value.is_empty());

    Ok(Locator::Git {
        url: base.to_string(),
        reference,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_zip_by_extension() {
        let locator = Locator::parse("https://archive.hicz.net/geccopack/pack.zip").unwrap();
        match locator {
            Locator::RemoteArchive { url, kind } => {
                assert_eq!(url.as_str(), "https://archive.hicz.net/geccopack/pack.zip");
                assert_eq!(kind, Some(ArchiveKind::Zip));
            }
            other => panic!("unexpected locator: {other:?}"),
        }
    }

    #[test]
    fn archive_query_hint_is_stripped() {
        let locator = Locator::parse("https://host/download?id=7&archive=tgz").unwrap();
        match locator {
            Locator::RemoteArchive { url, kind } => {
                assert_eq!(url.as_str(), "https://host/download?id=7");
                assert_eq!(kind, Some(ArchiveKind::TarGz));
            }
            other => panic!("unexpected locator: {other:?}"),
        }
    }

    #[test]
    fn http_without_hint_is_sniffed_later() {
        let locator = Locator::parse("https://host/latest").unwrap();
        assert!(matches!(locator, Locator::RemoteArchive { kind: None, .. }));
    }

    #[test]
    fn unknown_archive_hint_is_rejected() {
        assert!(matches!(
            Locator::parse("https://host/pack?archive=rar"),
            Err(LauncherError::UnsupportedLocator(_))
        ));
    }

    #[test]
    fn git_forms() {
        assert_eq!(
            Locator::parse("git::https://github.com/mikimou/geccopack?ref=v2").unwrap(),
            Locator::Git {
                url: "https://github.com/mikimou/geccopack".into(),
                reference: Some("v2".into()),
            }
        );
        assert_eq!(
            Locator::parse("https://github.com/mikimou/geccopack.git").unwrap(),
            Locator::Git {
                url: "https://github.com/mikimou/geccopack.git".into(),
                reference: None,
            }
        );
        assert!(matches!(
            Locator::parse("git+ssh://git@host/pack.git").unwrap(),
            Locator::Git { .. }
        ));
    }

    #[cfg(unix)]
    #[test]
    fn local_paths() {
        assert_eq!(
            Locator::parse("file:///srv/packs/gecco").unwrap(),
            Locator::LocalDir(PathBuf::from("/srv/packs/gecco"))
        );
        assert_eq!(
            Locator::parse("/srv/packs/gecco.tar.gz").unwrap(),
            Locator::LocalArchive {
                path: PathBuf::from("/srv/packs/gecco.tar.gz"),
                kind: ArchiveKind::TarGz,
            }
        );
    }

    #[test]
    fn unsupported_schemes() {
        for raw in ["", "ftp://host/pack.zip", "s3::bucket/pack", "relative/dir"] {
            assert!(
                matches!(Locator::parse(raw), Err(LauncherError::UnsupportedLocator(_))),
                "{raw} should be unsupported"
            );
        }
    }

    #[test]
    fn sniffing() {
        assert_eq!(ArchiveKind::sniff(b"PK\x03\x04rest"), Some(ArchiveKind::Zip));
        assert_eq!(ArchiveKind::sniff(&[0x1f, 0x8b, 0x08]), Some(ArchiveKind::TarGz));
        assert_eq!(ArchiveKind::sniff(b"<html>"), None);
    }
}
