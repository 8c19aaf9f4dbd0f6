//! Process plumbing shared by the `control` CLI and the `mapper` sidecar.
//!
//! Both binaries spend their lives shelling out to other programs
//! (`docker compose`, `ufw`, `java -jar BlueMap-cli.jar`). This crate holds
//! the one way they do it: spawn, collect stdout/stderr, and turn a non-zero
//! exit into a typed [`ProcessError`]. It also carries the env-var parsing
//! helpers and the logger setup so both binaries behave the same.

use log::{debug, warn};
use std::io;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;

/// Output captured from a finished external command.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// stdout followed by stderr, the way a terminal would have shown them.
    pub fn combined(&self) -> String {
        let mut text = self.stdout.clone();
        if !self.stderr.is_empty() {
            if !text.is_empty() && !text.ends_with('\n') {
                text.push('\n');
            }
            text.push_str(&self.stderr);
        }
        text
    }

    pub fn success(&self) -> bool {
        self.status.success()
    }
}

#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("failed to launch `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("`{command}` exited with {status}")]
    Failed {
        command: String,
        status: ExitStatus,
        output: String,
    },

    #[error("`{command}` did not finish within {timeout:?}")]
    TimedOut { command: String, timeout: Duration },
}

impl ProcessError {
    /// Exit code of the failed command, if it ran to completion.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            ProcessError::Failed { status, .. } => status.code(),
            _ => None,
        }
    }

    /// Whatever the command printed before failing.
    pub fn output(&self) -> &str {
        match self {
            ProcessError::Failed { output, .. } => output,
            _ => "",
        }
    }
}

/// Renders a program and its arguments as a single shell-like line for logs.
pub fn format_command<S: AsRef<str>>(program: &str, args: &[S]) -> String {
    let mut line = program.to_string();
    for arg in args {
        line.push(' ');
        line.push_str(arg.as_ref());
    }
    line
}

/// Runs a command to completion and captures its output.
///
/// A non-zero exit status is reported as [`ProcessError::Failed`] with the
/// combined output attached.
pub async fn run_command<S: AsRef<str>>(
    program: &str,
    args: &[S],
) -> Result<CommandOutput, ProcessError> {
    let command = format_command(program, args);
    debug!("Running: {}", command);

    let output = Command::new(program)
        .args(args.iter().map(AsRef::as_ref))
        .stdin(Stdio::null())
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|source| ProcessError::Spawn {
            program: program.to_string(),
            source,
        })?;

    let captured = CommandOutput {
        status: output.status,
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    };

    if captured.success() {
        Ok(captured)
    } else {
        Err(ProcessError::Failed {
            command,
            status: captured.status,
            output: captured.combined(),
        })
    }
}

/// Same as [`run_command`], but gives up after `timeout`.
///
/// The child is killed when the timeout fires.
pub async fn run_command_with_timeout<S: AsRef<str>>(
    program: &str,
    args: &[S],
    timeout: Duration,
) -> Result<CommandOutput, ProcessError> {
    match tokio::time::timeout(timeout, run_command(program, args)).await {
        Ok(result) => result,
        Err(_) => Err(ProcessError::TimedOut {
            command: format_command(program, args),
            timeout,
        }),
    }
}

/// Runs a command with the caller's stdio attached and waits for it.
///
/// Used for long-running foreground programs whose output should stream
/// straight to the terminal.
pub async fn run_foreground<S: AsRef<str>>(
    program: &str,
    args: &[S],
) -> Result<ExitStatus, ProcessError> {
    let command = format_command(program, args);
    debug!("Running in foreground: {}", command);

    let status = Command::new(program)
        .args(args.iter().map(AsRef::as_ref))
        .kill_on_drop(true)
        .status()
        .await
        .map_err(|source| ProcessError::Spawn {
            program: program.to_string(),
            source,
        })?;

    if status.success() {
        Ok(status)
    } else {
        Err(ProcessError::Failed {
            command,
            status,
            output: String::new(),
        })
    }
}

/// Parses a whole number of seconds, falling back to `default` when the
/// value is missing or malformed.
pub fn parse_secs(name: &str, value: Option<&str>, default: Duration) -> Duration {
    match value.map(str::trim) {
        None | Some("") => default,
        Some(raw) => match raw.parse::<u64>() {
            Ok(secs) => Duration::from_secs(secs),
            Err(_) => {
                warn!(
                    "Ignoring {}={:?}: expected whole seconds, using {}s",
                    name,
                    raw,
                    default.as_secs()
                );
                default
            }
        },
    }
}

/// Parses a boolean flag. Accepts `true/false`, `1/0`, `yes/no`, `on/off`.
pub fn parse_flag(name: &str, value: Option<&str>, default: bool) -> bool {
    let Some(raw) = value.map(str::trim) else {
        return default;
    };
    match raw.to_ascii_lowercase().as_str() {
        "" => default,
        "true" | "1" | "yes" | "on" => true,
        "false" | "0" | "no" | "off" => false,
        _ => {
            warn!("Ignoring {}={:?}: expected a boolean, using {}", name, raw, default);
            default
        }
    }
}

/// Initializes `env_logger`, defaulting to `info` when `RUST_LOG` is unset.
pub fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
}
