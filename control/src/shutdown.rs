//! Graceful shutdown of the game server ahead of a container stop.
//!
//! The server is asked to hold world saves, given time to flush, asked to
//! resume, and given a final grace period. Every step is attempted at most
//! once and a failing step never blocks the hard stop that follows: the
//! sequence degrades to "continue with shutdown" and records a warning.

use crate::console::ServerConsole;
use log::{debug, info, warn};
use shared::ProcessError;
use std::time::Duration;
use tokio::time::sleep;

pub const SAVE_HOLD_UNAVAILABLE: &str =
    "pre-stop save command unavailable; continuing with shutdown";
pub const SAVE_RESUME_FAILED: &str = "save resume failed; continuing with shutdown";

pub const DEFAULT_HOLD_WAIT: Duration = Duration::from_secs(2);
pub const DEFAULT_SHUTDOWN_GRACE: Duration = Duration::from_secs(3);

/// Timing and verbosity for one shutdown sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShutdownConfig {
    /// How long to wait after `save hold` before resuming
    pub hold_wait: Duration,
    /// How long to wait after `save resume` before handing back to the caller
    pub shutdown_grace: Duration,
    /// Log failed save commands as warnings instead of debug lines
    pub verbose: bool,
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            hold_wait: DEFAULT_HOLD_WAIT,
            shutdown_grace: DEFAULT_SHUTDOWN_GRACE,
            verbose: false,
        }
    }
}

/// Where a shutdown sequence stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownStep {
    /// Nothing to save; the server was not running
    NotRunning,
    /// `save hold` failed, so nothing else was attempted
    SaveHoldFailed,
    /// Saves were held but `save resume` failed
    SaveResumeFailed,
    /// Both save commands went through
    Completed,
}

impl ShutdownStep {
    pub fn warning(self) -> Option<&'static str> {
        match self {
            ShutdownStep::SaveHoldFailed => Some(SAVE_HOLD_UNAVAILABLE),
            ShutdownStep::SaveResumeFailed => Some(SAVE_RESUME_FAILED),
            ShutdownStep::NotRunning | ShutdownStep::Completed => None,
        }
    }
}

/// Result of one shutdown sequence. Not persisted anywhere.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShutdownAttempt {
    pub held_save: bool,
    pub resumed_save: bool,
    pub warnings: Vec<String>,
}

impl ShutdownAttempt {
    pub fn step(&self) -> ShutdownStep {
        match (self.held_save, self.resumed_save) {
            (true, true) => ShutdownStep::Completed,
            (true, false) => ShutdownStep::SaveResumeFailed,
            _ if !self.warnings.is_empty() => ShutdownStep::SaveHoldFailed,
            _ => ShutdownStep::NotRunning,
        }
    }
}

/// Runs the save-hold / save-resume sequence against a [`ServerConsole`].
#[derive(Debug, Clone, Default)]
pub struct ShutdownCoordinator {
    config: ShutdownConfig,
}

impl ShutdownCoordinator {
    pub fn new(config: ShutdownConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ShutdownConfig {
        &self.config
    }

    /// Gives the server a chance to flush its world before it is stopped.
    ///
    /// 1. Returns an empty attempt if the server is not running
    /// 2. Sends `save hold`, then waits `hold_wait`
    /// 3. Sends `save resume`, then waits `shutdown_grace`
    ///
    /// A failed command records a warning and returns immediately, skipping
    /// every later wait and command. This never returns an error.
    pub async fn attempt_graceful_shutdown(&self, console: &dyn ServerConsole) -> ShutdownAttempt {
        let mut attempt = ShutdownAttempt::default();

        if !console.is_running().await {
            debug!("Server is not running, skipping pre-stop save");
            return attempt;
        }

        info!("Holding world saves before shutdown");
        if let Err(e) = console.send_command(&["save", "hold"]).await {
            self.record_failure(&mut attempt, ShutdownStep::SaveHoldFailed, &e);
            return attempt;
        }
        attempt.held_save = true;
        sleep(self.config.hold_wait).await;

        info!("Resuming world saves");
        if let Err(e) = console.send_command(&["save", "resume"]).await {
            self.record_failure(&mut attempt, ShutdownStep::SaveResumeFailed, &e);
            return attempt;
        }
        attempt.resumed_save = true;
        sleep(self.config.shutdown_grace).await;

        info!("Pre-stop save sequence finished");
        attempt
    }

    fn record_failure(&self, attempt: &mut ShutdownAttempt, step: ShutdownStep, error: &ProcessError) {
        let Some(warning) = step.warning() else {
            return;
        };

        if self.config.verbose {
            warn!("{} ({})", warning, error);
            let output = error.output().trim_end();
            if !output.is_empty() {
                for line in output.lines() {
                    warn!("  {}", line);
                }
            }
        } else {
            debug!("{} ({})", warning, error);
        }

        attempt.warnings.push(warning.to_string());
    }
}
