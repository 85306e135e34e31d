// ─── Launch Task ───
// Spawns the game process from a resolved command.

use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};

#[cfg(target_os = "windows")]
use std::os::windows::process::CommandExt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};

use super::planner::ResolvedCommand;
use crate::core::error::{LauncherError, LauncherResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogStream {
    Stdout,
    Stderr,
}

/// One line of game output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogLine {
    pub stream: LogStream,
    pub line: String,
}

/// Starts games detached from the host's console.
#[derive(Debug, Default, Clone)]
pub struct ProcessLauncher {
    log_sink: Option<UnboundedSender<LogLine>>,
}

impl ProcessLauncher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Relay the child's stdout/stderr to `sink` line by line. The channel is
    /// unbounded so a slow observer never stalls the game.
    pub fn with_log_sink(mut self, sink: UnboundedSender<LogLine>) -> Self {
        self.log_sink = Some(sink);
        self
    }

    /// Spawn `command` and return immediately.
    ///
    /// Must be called from within a Tokio runtime. The child keeps running
    /// when the returned handle is dropped.
    pub fn start(&self, command: &ResolvedCommand) -> LauncherResult<GameProcess> {
        let mut cmd = std::process::Command::new(&command.executable);
        cmd.args(&command.arguments);
        cmd.current_dir(&command.working_dir);
        cmd.stdin(Stdio::null());
        configure_platform_spawn(&mut cmd);

        if self.log_sink.is_some() {
            cmd.stdout(Stdio::piped());
            cmd.stderr(Stdio::piped());
        } else {
            cmd.stdout(Stdio::null());
            cmd.stderr(Stdio::null());
        }

        info!("Launching game: {:?}", command.executable);
        debug!("Command (copy/paste): {}", format_command_for_logs(&cmd));

        let mut child = tokio::process::Command::from(cmd)
            .spawn()
            .map_err(|source| LauncherError::Start {
                program: command.executable.clone(),
                source,
            })?;

        if let Some(sink) = &self.log_sink {
            if let Some(stdout) = child.stdout.take() {
                relay_lines(stdout, LogStream::Stdout, sink.clone());
            }
            if let Some(stderr) = child.stderr.take() {
                relay_lines(stderr, LogStream::Stderr, sink.clone());
            }
        }

        let process = GameProcess {
            pid: child.id(),
            child,
            program: command.executable.clone(),
            started_at: Utc::now(),
        };
        info!("Game started (PID {:?})", process.pid);
        Ok(process)
    }
}

/// Handle to a running game. Waiting and termination are explicit.
#[derive(Debug)]
pub struct GameProcess {
    child: tokio::process::Child,
    pid: Option<u32>,
    program: PathBuf,
    started_at: DateTime<Utc>,
}

impl GameProcess {
    pub fn id(&self) -> Option<u32> {
        self.pid
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Wait for the game to exit.
    pub async fn wait(&mut self) -> LauncherResult<ExitStatus> {
        let status = self
            .child
            .wait()
            .await
            .map_err(|e| LauncherError::io(&self.program, e))?;
        info!("Game process {:?} exited with {}", self.pid, status);
        Ok(status)
    }

    /// Exit status if the game has already finished.
    pub fn try_wait(&mut self) -> LauncherResult<Option<ExitStatus>> {
        self.child
            .try_wait()
            .map_err(|e| LauncherError::io(&self.program, e))
    }

    /// Forcefully terminate the game and reap it.
    pub async fn kill(&mut self) -> LauncherResult<()> {
        warn!("Force closing game process {:?}", self.pid);
        self.child
            .kill()
            .await
            .map_err(|e| LauncherError::io(&self.program, e))
    }
}

fn relay_lines<R>(reader: R, stream: LogStream, sink: UnboundedSender<LogLine>)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(reader).lines();
        let mut observer_gone = false;
        // Keep draining after the observer goes away so the pipe never fills.
        while let Ok(Some(line)) = lines.next_line().await {
            match stream {
                LogStream::Stdout => debug!("[game][stdout] {}", line),
                LogStream::Stderr => warn!("[game][stderr] {}", line),
            }
            if !observer_gone && sink.send(LogLine { stream, line }).is_err() {
                observer_gone = true;
            }
        }
    });
}

fn configure_platform_spawn(cmd: &mut std::process::Command) {
    #[cfg(target_os = "windows")]
    {
        const CREATE_NO_WINDOW: u32 = 0x08000000;
        const CREATE_NEW_PROCESS_GROUP: u32 = 0x00000200;
        cmd.creation_flags(CREATE_NO_WINDOW | CREATE_NEW_PROCESS_GROUP);

        // Terminal-related vars can make Java/LWJGL treat the process as a
        // virtual terminal session.
        cmd.env_remove("WT_SESSION");
        cmd.env_remove("TERM");
        cmd.env_remove("ConEmuANSI");
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        // Own process group: terminal signals aimed at the launcher skip the game.
        cmd.process_group(0);
    }
}

fn format_command_for_logs(cmd: &std::process::Command) -> String {
    let program = shell_escape(&cmd.get_program().to_string_lossy());
    let args = cmd
        .get_args()
        .map(|arg| shell_escape(&arg.to_string_lossy()))
        .collect::<Vec<_>>()
        .join(" ");

    if args.is_empty() {
        program
    } else {
        format!("{} {}", program, args)
    }
}

fn shell_escape(raw: &str) -> String {
    if raw.is_empty() {
        return "\"\"".to_string();
    }

    if raw.chars().all(|ch| {
        ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.' | '/' | ':' | '\\' | '=')
    }) {
        return raw.to_string();
    }

    format!("\"{}\"", raw.replace('"', "\\\""))
}
