use serde::{Deserialize, Serialize};

use crate::core::error::{LauncherError, LauncherResult};

/// Describes one installable modpack bundle.
///
/// The same document shape is served remotely and persisted as
/// `<bundle>/manifest.json` once the bundle it describes is installed:
///
/// ```json
/// {"version": "1.0.1", "url": "https://host/pack.zip", "command": ["{{java}}", "-Xmx{{ram}}M"]}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModpackManifest {
    /// Opaque version token, compared by exact equality.
    pub version: String,
    /// Source locator handed to the content fetcher.
    pub url: String,
    /// Launch command template. Absent means no launch template yet.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub command: Vec<String>,
    /// Optional hex SHA-256 of the downloaded archive.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
}

impl ModpackManifest {
    pub fn new(version: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            url: url.into(),
            command: Vec::new(),
            sha256: None,
        }
    }

    pub fn with_command<I, S>(mut self, command: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.command = command.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_sha256(mut self, sha256: impl Into<String>) -> Self {
        self.sha256 = Some(sha256.into());
        self
    }

    /// Decode a manifest document. `what` names the source for error context.
    pub fn from_json(bytes: &[u8], what: &str) -> LauncherResult<Self> {
        serde_json::from_slice(bytes).map_err(|source| LauncherError::Decode {
            what: what.to_string(),
            source,
        })
    }

    pub fn to_json(&self) -> LauncherResult<Vec<u8>> {
        serde_json::to_vec_pretty(self).map_err(|source| LauncherError::Decode {
            what: "modpack manifest".into(),
            source,
        })
    }

    pub fn has_launch_template(&self) -> bool {
        !self.command.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_is_optional_on_the_wire() {
        let json = br#"{"version": "1.0.0", "url": "https://example.com/pack.zip"}"#;
        let manifest = ModpackManifest::from_json(json, "test").unwrap();
        assert_eq!(manifest.version, "1.0.0");
        assert!(manifest.command.is_empty());
        assert!(manifest.sha256.is_none());
        assert!(!manifest.has_launch_template());
    }

    #[test]
    fn empty_command_and_checksum_are_omitted_when_encoding() {
        let manifest = ModpackManifest::new("2", "file:///srv/pack");
        let encoded = String::from_utf8(manifest.to_json().unwrap()).unwrap();
        assert!(!encoded.contains("command"));
        assert!(!encoded.contains("sha256"));
    }

    #[test]
    fn malformed_document_is_a_decode_error() {
        let err = ModpackManifest::from_json(b"{\"version\": 3", "remote manifest").unwrap_err();
        match err {
            LauncherError::Decode { what, .. } => assert_eq!(what, "remote manifest"),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
