// ─── Launch Planner ───
// Turns the installed manifest's command template into a concrete command.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::core::error::{LauncherError, LauncherResult};
use crate::core::manifest::ManifestStore;

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

pub const NICK_PLACEHOLDER: &str = "nick";
pub const RAM_PLACEHOLDER: &str = "ram";
pub const BUNDLE_DIR_PLACEHOLDER: &str = "mcdir";
pub const JAVA_PLACEHOLDER: &str = "java";

/// User-supplied values for one launch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchParameters {
    pub nickname: String,
    /// Heap ceiling for the game runtime, in megabytes.
    pub memory_mb: u32,
}

impl LaunchParameters {
    pub fn new(nickname: impl Into<String>, memory_mb: u32) -> LauncherResult<Self> {
        if memory_mb == 0 {
            return Err(LauncherError::InvalidMemory(memory_mb));
        }
        Ok(Self {
            nickname: nickname.into(),
            memory_mb,
        })
    }
}

/// Concrete command produced for every launch; never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedCommand {
    pub executable: PathBuf,
    pub arguments: Vec<String>,
    pub working_dir: PathBuf,
}

/// Location of the Java runtime shipped inside the bundle, relative to its root.
pub fn bundled_runtime_relative_path() -> PathBuf {
    let base = Path::new("runtime").join("java-runtime-gamma");
    if cfg!(target_os = "windows") {
        base.join("windows-x64")
            .join("java-runtime-gamma")
            .join("bin")
            .join("java.exe")
    } else if cfg!(target_os = "macos") {
        base.join("mac-os")
            .join("java-runtime-gamma")
            .join("jre.bundle")
            .join("Contents")
            .join("Home")
            .join("bin")
            .join("java")
    } else {
        base.join("linux")
            .join("java-runtime-gamma")
            .join("bin")
            .join("java")
    }
}

pub struct LaunchPlanner {
    bundle_dir: PathBuf,
    store: ManifestStore,
}

impl LaunchPlanner {
    pub fn new(bundle_dir: PathBuf, store: ManifestStore) -> Self {
        Self { bundle_dir, store }
    }

    /// Resolve the installed manifest's template for `params`.
    pub async fn resolve(&self, params: &LaunchParameters) -> LauncherResult<ResolvedCommand> {
        let manifest = self.store.load().await?.ok_or(LauncherError::NoManifest)?;
        debug!(
            "Resolving launch template of modpack {} ({} tokens)",
            manifest.version,
            manifest.command.len()
        );
        resolve_template(&manifest.command, params, &self.bundle_dir)
    }
}

/// Substitute placeholders in every token of `template`.
///
/// The first resolved token is the executable, the rest are arguments. A
/// relative executable containing a path separator is taken relative to the
/// bundle root; a bare program name is left for PATH lookup at spawn time.
pub fn resolve_template(
    template: &[String],
    params: &LaunchParameters,
    bundle_dir: &Path,
) -> LauncherResult<ResolvedCommand> {
    if template.is_empty() {
        return Err(LauncherError::EmptyTemplate);
    }
    if params.memory_mb == 0 {
        return Err(LauncherError::InvalidMemory(params.memory_mb));
    }

    let values = PlaceholderValues {
        nickname: &params.nickname,
        memory: params.memory_mb.to_string(),
        bundle_dir: bundle_dir.to_string_lossy().into_owned(),
        java: bundle_dir
            .join(bundled_runtime_relative_path())
            .to_string_lossy()
            .into_owned(),
    };

    let mut resolved = template.iter().map(|token| substitute(token, &values));
    let program = resolved.next().unwrap_or_default();
    if program.trim().is_empty() {
        return Err(LauncherError::EmptyExecutable);
    }

    let program = PathBuf::from(program);
    let executable = if program.is_relative() && program.components().count() > 1 {
        bundle_dir.join(program)
    } else {
        program
    };

    Ok(ResolvedCommand {
        executable,
        arguments: resolved.collect(),
        working_dir: bundle_dir.to_path_buf(),
    })
}

struct PlaceholderValues<'a> {
    nickname: &'a str,
    memory: String,
    bundle_dir: String,
    java: String,
}

impl PlaceholderValues<'_> {
    fn lookup(&self, name: &str) -> Option<&str> {
        match name.trim() {
            NICK_PLACEHOLDER => Some(self.nickname),
            RAM_PLACEHOLDER => Some(&self.memory),
            BUNDLE_DIR_PLACEHOLDER => Some(&self.bundle_dir),
            JAVA_PLACEHOLDER => Some(&self.java),
            _ => None,
        }
    }
}

/// Single left-to-right pass; substituted text is never rescanned, so a
/// nickname like `{{ram}}` stays literal.
fn substitute(token: &str, values: &PlaceholderValues<'_>) -> String {
    let mut out = String::with_capacity(token.len());
    let mut rest = token;

    while let Some(start) = rest.find(OPEN) {
        out.push_str(&rest[..start]);
        let after = &rest[start + OPEN.len()..];

        let Some(end) = after.find(CLOSE) else {
            out.push_str(&rest[start..]);
            return out;
        };

        let name = &after[..end];
        if name.contains(OPEN) {
            // "{{a{{nick}}": the first opener is literal
            out.push_str(OPEN);
            rest = after;
            continue;
        }

        match values.lookup(name) {
            Some(value) => out.push_str(value),
            None => {
                warn!("Unknown placeholder {{{{{}}}}} left as-is", name);
                out.push_str(&rest[start..start + OPEN.len() + end + CLOSE.len()]);
            }
        }
        rest = &after[end + CLOSE.len()..];
    }

    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::manifest::ModpackManifest;
    use tempfile::TempDir;

    fn template(tokens: &[&str]) -> Vec<String> {
        tokens.iter().map(|t| t.to_string()).collect()
    }

    fn values() -> PlaceholderValues<'static> {
        PlaceholderValues {
            nickname: "Aria",
            memory: "2048".into(),
            bundle_dir: "/tmp/bundle".into(),
            java: "/tmp/bundle/java".into(),
        }
    }

    #[test]
    fn resolves_java_ram_and_nick() {
        let bundle = Path::new("/tmp/bundle");
        let params = LaunchParameters::new("Aria", 2048).unwrap();
        let cmd = resolve_template(
            &template(&["{{java}}", "-Xmx{{ram}}M", "-Duser={{nick}}"]),
            &params,
            bundle,
        )
        .unwrap();

        assert!(cmd.executable.starts_with(bundle));
        assert!(cmd.executable.ends_with(bundled_runtime_relative_path()));
        assert_eq!(cmd.arguments, vec!["-Xmx2048M", "-Duser=Aria"]);
        assert_eq!(cmd.working_dir, bundle);
    }

    #[test]
    fn empty_template_fails_regardless_of_parameters() {
        let params = LaunchParameters {
            nickname: String::new(),
            memory_mb: 0,
        };
        assert!(matches!(
            resolve_template(&[], &params, Path::new("/tmp/bundle")),
            Err(LauncherError::EmptyTemplate)
        ));
    }

    #[test]
    fn zero_memory_is_rejected() {
        assert!(matches!(
            LaunchParameters::new("Aria", 0),
            Err(LauncherError::InvalidMemory(0))
        ));
    }

    #[test]
    fn blank_executable_is_rejected() {
        let params = LaunchParameters::new("", 1024).unwrap();
        assert!(matches!(
            resolve_template(&template(&["{{nick}}", "-jar"]), &params, Path::new("/b")),
            Err(LauncherError::EmptyExecutable)
        ));
    }

    #[test]
    fn relative_executable_is_anchored_to_bundle() {
        let params = LaunchParameters::new("Aria", 1024).unwrap();
        let bundle = Path::new("/tmp/bundle");

        let nested = resolve_template(&template(&["bin/start.sh"]), &params, bundle).unwrap();
        assert_eq!(nested.executable, bundle.join("bin/start.sh"));

        let bare = resolve_template(&template(&["java"]), &params, bundle).unwrap();
        assert_eq!(bare.executable, PathBuf::from("java"));
        assert!(bare.arguments.is_empty());
    }

    #[test]
    fn substituted_values_are_not_rescanned() {
        let values = PlaceholderValues {
            nickname: "{{ram}}",
            ..values()
        };
        assert_eq!(substitute("--username={{nick}}", &values), "--username={{ram}}");
    }

    #[test]
    fn unknown_and_unterminated_placeholders_stay_literal() {
        let values = values();
        assert_eq!(substitute("{{token}}-{{nick}}", &values), "{{token}}-Aria");
        assert_eq!(substitute("-Dx={{nick", &values), "-Dx={{nick");
        assert_eq!(substitute("{{a{{nick}}", &values), "{{aAria");
        assert_eq!(substitute("{{ ram }}", &values), "2048");
        assert_eq!(substitute("--gameDir={{mcdir}}", &values), "--gameDir=/tmp/bundle");
        assert_eq!(substitute("no placeholders", &values), "no placeholders");
    }

    #[tokio::test]
    async fn resolve_without_manifest_is_no_manifest() {
        let dir = TempDir::new().unwrap();
        let bundle = dir.path().join("geccopack");
        let planner = LaunchPlanner::new(bundle.clone(), ManifestStore::new(bundle.join("manifest.json")));
        let params = LaunchParameters::new("Aria", 2048).unwrap();
        assert!(matches!(
            planner.resolve(&params).await,
            Err(LauncherError::NoManifest)
        ));
    }

    #[tokio::test]
    async fn resolve_reads_persisted_template() {
        let dir = TempDir::new().unwrap();
        let bundle = dir.path().join("geccopack");
        let store = ManifestStore::new(bundle.join("manifest.json"));
        store
            .save(&ModpackManifest::new("1", "file:///srv/pack").with_command(["java", "-Xmx{{ram}}M"]))
            .await
            .unwrap();

        let planner = LaunchPlanner::new(bundle.clone(), store.clone());
        let cmd = planner
            .resolve(&LaunchParameters::new("Aria", 4096).unwrap())
            .await
            .unwrap();
        assert_eq!(cmd.arguments, vec!["-Xmx4096M"]);
        assert_eq!(cmd.working_dir, bundle);

        store.save(&ModpackManifest::new("2", "file:///srv/pack")).await.unwrap();
        assert!(matches!(
            planner.resolve(&LaunchParameters::new("Aria", 4096).unwrap()).await,
            Err(LauncherError::EmptyTemplate)
        ));
    }
}
