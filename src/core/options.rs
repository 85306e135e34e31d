use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::error::{LauncherError, LauncherResult};
use crate::core::launch::LaunchParameters;

/// Persisted user preferences, stored as `options.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LauncherOptions {
    #[serde(default)]
    pub nickname: String,
    /// Memory allocation in megabytes; zero means "not chosen yet".
    #[serde(default)]
    pub ram: u32,
}

impl LauncherOptions {
    /// Load options; a missing file yields the zero-valued defaults.
    pub async fn load(path: &Path) -> LauncherResult<Self> {
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(LauncherError::io(path, e)),
        };

        serde_json::from_slice(&bytes).map_err(|source| LauncherError::Decode {
            what: "options file".into(),
            source,
        })
    }

    pub async fn save(&self, path: &Path) -> LauncherResult<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| LauncherError::io(parent, e))?;
        }

        let json = serde_json::to_vec(self).map_err(|source| LauncherError::Decode {
            what: "options file".into(),
            source,
        })?;
        tokio::fs::write(path, json)
            .await
            .map_err(|e| LauncherError::io(path, e))
    }

    pub fn launch_parameters(&self) -> LauncherResult<LaunchParameters> {
        LaunchParameters::new(self.nickname.clone(), self.ram)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let options = LauncherOptions::load(&dir.path().join("options.json"))
            .await
            .unwrap();
        assert_eq!(options, LauncherOptions::default());
        assert!(options.launch_parameters().is_err());
    }

    #[tokio::test]
    async fn save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("mikiho-launcher").join("options.json");
        let options = LauncherOptions {
            nickname: "Aria".into(),
            ram: 4096,
        };
        options.save(&path).await.unwrap();

        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            r#"{"nickname":"Aria","ram":4096}"#
        );
        let loaded = LauncherOptions::load(&path).await.unwrap();
        assert_eq!(loaded, options);
        assert_eq!(
            loaded.launch_parameters().unwrap(),
            LaunchParameters {
                nickname: "Aria".into(),
                memory_mb: 4096,
            }
        );
    }
}
