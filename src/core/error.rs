use std::path::PathBuf;
use thiserror::Error;

/// Central error type for the launcher core.
/// Every module returns `Result<T, LauncherError>`.
#[derive(Debug, Error)]
pub enum LauncherError {
    // ── Configuration ───────────────────────────────────
    #[error("Per-user configuration directory is unavailable")]
    ConfigDirUnavailable,

    // ── IO ──────────────────────────────────────────────
    #[error("IO error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    // ── Decoding ────────────────────────────────────────
    #[error("Failed to decode {what}: {source}")]
    Decode {
        what: String,
        source: serde_json::Error,
    },

    // ── Network / fetch ─────────────────────────────────
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Download failed for {url}: HTTP {status}")]
    DownloadFailed { url: String, status: u16 },

    #[error("Unsupported source locator: {0}")]
    UnsupportedLocator(String),

    #[error("Fetch failed for {locator}: {reason}")]
    Fetch { locator: String, reason: String },

    #[error("SHA-256 mismatch for {url}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        url: String,
        expected: String,
        actual: String,
    },

    // ── Archive ─────────────────────────────────────────
    #[error("Zip extraction error: {0}")]
    Zip(#[from] zip::result::ZipError),

    // ── Sync control ────────────────────────────────────
    #[error("A modpack sync is already in progress")]
    SyncInProgress,

    #[error("Operation cancelled")]
    Cancelled,

    // ── Launch planning ─────────────────────────────────
    #[error("No installed modpack manifest; sync the modpack first")]
    NoManifest,

    #[error("Manifest has no command template")]
    EmptyTemplate,

    #[error("Command template resolved to an empty executable path")]
    EmptyExecutable,

    #[error("Memory allocation must be a positive number of megabytes, got {0}")]
    InvalidMemory(u32),

    // ── Process ─────────────────────────────────────────
    #[error("Failed to start {program:?}: {source}")]
    Start {
        program: PathBuf,
        source: std::io::Error,
    },

    // ── Generic ─────────────────────────────────────────
    #[error("{0}")]
    Other(String),
}

/// Convenience alias used throughout the crate.
pub type LauncherResult<T> = Result<T, LauncherError>;

impl LauncherError {
    /// Whether this error belongs to the fetch/transport family.
    pub fn is_fetch_failure(&self) -> bool {
        matches!(
            self,
            LauncherError::Http(_)
                | LauncherError::DownloadFailed { .. }
                | LauncherError::UnsupportedLocator(_)
                | LauncherError::Fetch { .. }
                | LauncherError::ChecksumMismatch { .. }
                | LauncherError::Zip(_)
        )
    }

    /// Short wording for the front end, without internal paths.
    pub fn user_message(&self) -> &'static str {
        match self {
            LauncherError::NoManifest
            | LauncherError::EmptyTemplate
            | LauncherError::EmptyExecutable
            | LauncherError::InvalidMemory(_)
            | LauncherError::Start { .. } => "could not start game",
            LauncherError::ConfigDirUnavailable => "could not find the configuration directory",
            _ => "could not update content",
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        LauncherError::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<std::io::Error> for LauncherError {
    fn from(source: std::io::Error) -> Self {
        LauncherError::Io {
            path: PathBuf::new(),
            source,
        }
    }
}

// ── Serialization for front-end IPC ─────────────────────
// Front-end bridges need the error type to implement `Serialize`.
impl serde::Serialize for LauncherError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}
