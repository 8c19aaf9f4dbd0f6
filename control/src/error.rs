use shared::ProcessError;
use thiserror::Error;

/// Failures of the container-level lifecycle commands.
///
/// The save sequence that runs before a stop never produces one of these.
#[derive(Debug, Error)]
pub enum ControlError {
    #[error("failed to start services: {0}")]
    Start(#[source] ProcessError),

    #[error("failed to stop `{service}`: {source}")]
    Stop {
        service: String,
        #[source]
        source: ProcessError,
    },

    #[error("failed to restart `{service}`: {source}")]
    Restart {
        service: String,
        #[source]
        source: ProcessError,
    },

    #[error("failed to query service status: {0}")]
    Status(#[source] ProcessError),
}
