use std::ffi::OsString;
use std::path::Path;
use std::process::Stdio;

use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::core::error::{LauncherError, LauncherResult};

/// Checkout of `url` (optionally at `reference`) into the empty directory `dest`.
pub async fn clone_into(
    url: &str,
    reference: Option<&str>,
    dest: &Path,
    cancel: &CancellationToken,
) -> LauncherResult<()> {
    info!("Cloning {} (ref {:?}) into {:?}", url, reference, dest);

    let shallow = run_git(url, clone_args(url, reference, dest, true), cancel).await;
    match (shallow, reference) {
        (Ok(()), _) => Ok(()),
        // `--branch` only accepts branch and tag names; commits need a full clone.
        (Err(LauncherError::Fetch { .. }), Some(rev)) if looks_like_commit(rev) => {
            debug!("Shallow clone failed for {}, retrying with full history", rev);
            if dest.exists() {
                tokio::fs::remove_dir_all(dest)
                    .await
                    .map_err(|e| LauncherError::io(dest, e))?;
            }
            run_git(url, clone_args(url, None, dest, false), cancel).await?;
            run_git(url, checkout_args(dest, rev), cancel).await
        }
        (Err(err), _) => Err(err),
    }
}

fn clone_args(url: &str, reference: Option<&str>, dest: &Path, shallow: bool) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec![
        "-c".into(),
        "core.symlinks=false".into(),
        "clone".into(),
        "--quiet".into(),
    ];
    if shallow {
        args.push("--depth".into());
        args.push("1".into());
    }
    if let Some(reference) = reference {
        args.push("--branch".into());
        args.push(reference.into());
    }
    args.push("--".into());
    args.push(url.into());
    args.push(dest.as_os_str().to_owned());
    args
}

fn checkout_args(dest: &Path, rev: &str) -> Vec<OsString> {
    vec![
        "-C".into(),
        dest.as_os_str().to_owned(),
        "-c".into(),
        "core.symlinks=false".into(),
        "checkout".into(),
        "--quiet".into(),
        rev.into(),
    ]
}

fn looks_like_commit(rev: &str) -> bool {
    (7..=40).contains(&rev.len()) && rev.chars().all(|c| c.is_ascii_hexdigit())
}

async fn run_git(url: &str, args: Vec<OsString>, cancel: &CancellationToken) -> LauncherResult<()> {
    let mut cmd = Command::new("git");
    cmd.args(&args)
        .env("GIT_TERMINAL_PROMPT", "0")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    #[cfg(target_os = "windows")]
    {
        const CREATE_NO_WINDOW: u32 = 0x08000000;
        cmd.creation_flags(CREATE_NO_WINDOW);
    }

    let child = cmd.spawn().map_err(|e| LauncherError::Fetch {
        locator: url.to_string(),
        reason: format!("git is not available: {e}"),
    })?;

    let output = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(LauncherError::Cancelled),
        output = child.wait_with_output() => output.map_err(|e| LauncherError::Fetch {
            locator: url.to_string(),
            reason: format!("git did not finish: {e}"),
        })?,
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(LauncherError::Fetch {
            locator: url.to_string(),
            reason: format!("git exited with {}: {}", output.status, stderr.trim()),
        });
    }

    Ok(())
}
