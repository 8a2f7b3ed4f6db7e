// src/exec/process.rs

//! Shell command runner shared by every command-backed collaborator.

use std::process::Stdio;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::config::CommandSettings;

/// Captured output of a finished command.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: Option<i32>,
    pub success: bool,
}

impl CommandOutput {
    /// Short, single-line description of a failure for logs and alerts.
    pub fn failure_detail(&self) -> String {
        let code = self
            .exit_code
            .map(|c| c.to_string())
            .unwrap_or_else(|| "signal".to_string());
        let stderr = last_line(&self.stderr);
        if stderr.is_empty() {
            format!("exit code {code}")
        } else {
            format!("exit code {code}: {stderr}")
        }
    }
}

fn last_line(s: &str) -> &str {
    s.lines()
        .rev()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or("")
}

/// Build a shell command appropriate for the platform.
fn shell_command(cmd: &str) -> Command {
    if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(cmd);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(cmd);
        c
    }
}

/// Run `settings.cmd` through the shell, feeding `stdin` and exporting `env`.
///
/// The child is killed if it outlives `settings.timeout` (or if the returned
/// future is dropped). A non-zero exit is *not* an error here; callers decide
/// what a failed command means via [`CommandOutput::success`].
pub async fn run_command(
    settings: &CommandSettings,
    stdin: Option<&str>,
    env: &[(&str, &str)],
) -> Result<CommandOutput> {
    run_with_timeout(&settings.cmd, settings.timeout, stdin, env).await
}

pub async fn run_with_timeout(
    cmd_line: &str,
    timeout: Duration,
    stdin: Option<&str>,
    env: &[(&str, &str)],
) -> Result<CommandOutput> {
    let mut cmd = shell_command(cmd_line);
    cmd.stdin(if stdin.is_some() {
        Stdio::piped()
    } else {
        Stdio::null()
    })
    .stdout(Stdio::piped())
    .stderr(Stdio::piped())
    .kill_on_drop(true);

    for (key, value) in env {
        cmd.env(key, value);
    }

    debug!(cmd = %cmd_line, "spawning collaborator command");

    let mut child = cmd
        .spawn()
        .with_context(|| format!("spawning command '{cmd_line}'"))?;

    if let Some(input) = stdin {
        if let Some(mut pipe) = child.stdin.take() {
            let input = input.to_string();
            tokio::spawn(async move {
                if let Err(e) = pipe.write_all(input.as_bytes()).await {
                    debug!(error = %e, "command closed stdin early");
                }
            });
        }
    }

    let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(res) => res.with_context(|| format!("waiting for command '{cmd_line}'"))?,
        Err(_) => {
            warn!(cmd = %cmd_line, timeout_ms = timeout.as_millis() as u64, "command timed out");
            bail!("command '{cmd_line}' timed out after {timeout:?}");
        }
    };

    Ok(CommandOutput {
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        exit_code: output.status.code(),
        success: output.status.success(),
    })
}
