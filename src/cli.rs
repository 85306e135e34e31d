use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::commands;
use crate::core::error::LauncherResult;
use crate::core::launch::LogStream;
use crate::core::state::{LauncherConfig, LauncherState};
use crate::core::sync::{SyncOutcome, DEFAULT_MANIFEST_URL};

#[derive(Debug, Parser)]
#[command(name = "mikiho-launcher", version, about = "Modpack updater and game launcher")]
pub struct Cli {
    /// Override the per-user configuration root.
    #[arg(long, env = "MIKIHO_CONFIG_DIR", global = true)]
    pub config_dir: Option<PathBuf>,

    /// URL of the published modpack manifest.
    #[arg(long, env = "MIKIHO_MANIFEST_URL", default_value = DEFAULT_MANIFEST_URL, global = true)]
    pub manifest_url: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Update the installed modpack if the remote version changed.
    Sync,
    /// Start the game from the installed modpack.
    Launch {
        /// Nickname; defaults to the saved option.
        #[arg(long)]
        nickname: Option<String>,
        /// Memory in MB; defaults to the saved option.
        #[arg(long)]
        ram: Option<u32>,
        /// Sync the modpack before launching.
        #[arg(long)]
        sync: bool,
        /// Stream game output here and wait for it to exit.
        #[arg(long)]
        attach: bool,
    },
    /// Show or change the saved launch options.
    Options {
        #[arg(long)]
        nickname: Option<String>,
        #[arg(long)]
        ram: Option<u32>,
    },
}

pub async fn execute(cli: Cli) -> LauncherResult<ExitCode> {
    let config = LauncherConfig::new(cli.config_dir, Some(cli.manifest_url))?;
    let state = Arc::new(LauncherState::new(config)?);

    match cli.command {
        Command::Sync => {
            sync(&state).await?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Launch {
            nickname,
            ram,
            sync: sync_first,
            attach,
        } => {
            if sync_first {
                sync(&state).await?;
            }

            let saved = commands::load_options(&state).await?;
            let nickname = nickname.unwrap_or(saved.nickname);
            let ram = ram.unwrap_or(saved.ram);

            if !attach {
                let process = commands::launch_game(state, nickname, ram, None).await?;
                println!("Game started (PID {:?})", process.id());
                return Ok(ExitCode::SUCCESS);
            }

            let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
            let mut process = commands::launch_game(state, nickname, ram, Some(tx)).await?;
            let printer = tokio::spawn(async move {
                while let Some(line) = rx.recv().await {
                    match line.stream {
                        LogStream::Stdout => println!("{}", line.line),
                        LogStream::Stderr => eprintln!("{}", line.line),
                    }
                }
            });
            let status = process.wait().await?;
            let _ = printer.await;
            let ran_for = chrono::Utc::now() - process.started_at();
            info!(
                "{:?} exited with {} after {}s",
                process.program(),
                status,
                ran_for.num_seconds()
            );
            Ok(if status.success() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Command::Options { nickname, ram } => {
            let mut options = commands::load_options(&state).await?;
            if nickname.is_some() || ram.is_some() {
                options.nickname = nickname.unwrap_or(options.nickname);
                options.ram = ram.unwrap_or(options.ram);
                commands::save_options(&state, options.nickname.clone(), options.ram).await?;
            }
            println!("nickname = {:?}", options.nickname);
            println!("ram      = {} MB", options.ram);
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn sync(state: &Arc<LauncherState>) -> LauncherResult<()> {
    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling modpack sync");
            on_interrupt.cancel();
        }
    });

    match commands::check_modpack(state.clone(), cancel).await? {
        SyncOutcome::UpToDate { version } => {
            info!("Modpack {} is up to date", version);
            println!("Modpack is up to date ({version})");
        }
        SyncOutcome::Updated { previous, current } => {
            println!(
                "Modpack updated: {} -> {current}",
                previous.as_deref().unwrap_or("none")
            );
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_launch_flags() {
        let cli = Cli::try_parse_from([
            "mikiho-launcher",
            "--config-dir",
            "/tmp/cfg",
            "launch",
            "--nickname",
            "Aria",
            "--ram",
            "2048",
            "--sync",
        ])
        .unwrap();

        assert_eq!(cli.config_dir, Some(PathBuf::from("/tmp/cfg")));
        match cli.command {
            Command::Launch {
                nickname,
                ram,
                sync,
                attach,
            } => {
                assert_eq!(nickname.as_deref(), Some("Aria"));
                assert_eq!(ram, Some(2048));
                assert!(sync);
                assert!(!attach);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn clap_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
