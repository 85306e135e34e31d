// ─── Front-end Commands ───
// The operations a launcher window (or the CLI) binds to. Long-running work
// runs on its own Tokio task so the caller's event loop never blocks.

use std::sync::Arc;

use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::core::error::{LauncherError, LauncherResult};
use crate::core::launch::{GameProcess, LaunchParameters, LogLine, ProcessLauncher};
use crate::core::options::LauncherOptions;
use crate::core::state::LauncherState;
use crate::core::sync::SyncOutcome;

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// Check the remote manifest and install the modpack if it changed.
pub async fn check_modpack(
    state: Arc<LauncherState>,
    cancel: CancellationToken,
) -> LauncherResult<SyncOutcome> {
    let engine = state.sync_engine.clone();
    let result = tokio::spawn(async move { engine.check_and_sync(&cancel).await })
        .await
        .map_err(|e| LauncherError::Other(format!("Task join error: {e}")))?;

    if let Err(err) = &result {
        error!("{}: {}", err.user_message(), err);
    }
    result
}

/// Resolve the installed launch template and start the game.
///
/// Returns once the process is spawned. `log_sink` receives the game's
/// output lines when set.
pub async fn launch_game(
    state: Arc<LauncherState>,
    nickname: String,
    ram: u32,
    log_sink: Option<UnboundedSender<LogLine>>,
) -> LauncherResult<GameProcess> {
    let result = tokio::spawn(async move {
        let params = LaunchParameters::new(nickname, ram)?;
        let command = state.launch_planner().resolve(&params).await?;

        let mut launcher = ProcessLauncher::new();
        if let Some(sink) = log_sink {
            launcher = launcher.with_log_sink(sink);
        }
        launcher.start(&command)
    })
    .await
    .map_err(|e| LauncherError::Other(format!("Task join error: {e}")))?;

    if let Err(err) = &result {
        error!("{}: {}", err.user_message(), err);
    }
    result
}

pub async fn save_options(state: &LauncherState, nickname: String, ram: u32) -> LauncherResult<()> {
    let options = LauncherOptions { nickname, ram };
    options.save(&state.paths.options_path()).await?;
    info!("Saved launcher options");
    Ok(())
}

pub async fn load_options(state: &LauncherState) -> LauncherResult<LauncherOptions> {
    LauncherOptions::load(&state.paths.options_path()).await
}
