//! # Server Control Library
//!
//! Lifecycle management for a containerized Bedrock game server and its
//! optional map-rendering sidecar. Everything here drives external tools:
//! `docker compose` for the containers, `ufw` for the firewall, and the
//! server's own `send-command` entry point for in-band administration.
//!
//! ## Core Responsibilities
//!
//! ### Graceful Shutdown
//! Before the server container is stopped, the world is given a chance to
//! flush to disk. The [`shutdown::ShutdownCoordinator`] asks the server to
//! hold saves, waits, asks it to resume, and waits again. It is fail-open:
//! if either save command fails, a warning is recorded and the stop goes
//! ahead anyway. Data-loss risk from a skipped save is accepted; a stop that
//! never happens is not.
//!
//! ### Container Lifecycle
//! `start`, `stop`, `restart`, `restart-mapper` and `status` map onto
//! `docker compose` subcommands. `stop` and `restart` both run the same
//! shutdown sequence before the hard stop.
//!
//! ### Firewall
//! When a port rule is configured, `start` opens it and `stop` closes it.
//! Firewall failures are logged and never abort the lifecycle command.
//!
//! ## Module Organization
//!
//! ### Shutdown Module (`shutdown`)
//! The save-hold / save-resume sequence and the [`shutdown::ShutdownAttempt`]
//! it produces.
//!
//! ### Console Module (`console`)
//! The [`console::ServerConsole`] seam used by the shutdown sequence, and its
//! `docker compose` implementation.
//!
//! ### Commands Module (`commands`)
//! The CLI command set and the [`commands::Controller`] that runs it.
//!
//! ### Config Module (`config`)
//! Environment-driven settings: timings (`SAVE_HOLD_WAIT`,
//! `SHUTDOWN_GRACE_PERIOD`), verbosity (`VERBOSE_SAVE_ERRORS`), and the
//! compose project and service names.
//!
//! ## Timing
//!
//! The sequence is strictly sequential. Both waits are fixed and
//! configurable (2s and 3s by default); they are not a poll for save
//! completion. The command step itself has no timeout of its own.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use control::commands::Controller;
//! use control::config::ControlConfig;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let controller = Controller::new(ControlConfig::from_env());
//!
//!     // Saves are held and resumed before the container stops
//!     let attempt = controller.stop().await?;
//!     for warning in &attempt.warnings {
//!         eprintln!("{}", warning);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod commands;
pub mod config;
pub mod console;
pub mod error;
pub mod firewall;
pub mod shutdown;

pub use error::ControlError;
