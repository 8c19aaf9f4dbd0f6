//! Opens and closes the server's port with `ufw`.
//!
//! Firewall changes are best effort: a failure is logged and the lifecycle
//! command carries on.

use log::{info, warn};
use shared::run_command;

#[derive(Debug, Clone)]
pub struct Firewall {
    program: String,
    port: String,
}

impl Firewall {
    pub fn new(program: impl Into<String>, port: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            port: port.into(),
        }
    }

    pub fn port(&self) -> &str {
        &self.port
    }

    pub fn open_args(&self) -> Vec<String> {
        vec!["allow".to_string(), self.port.clone()]
    }

    pub fn close_args(&self) -> Vec<String> {
        vec!["delete".to_string(), "allow".to_string(), self.port.clone()]
    }

    /// Returns whether the rule was added.
    pub async fn open(&self) -> bool {
        self.apply("open", &self.open_args()).await
    }

    /// Returns whether the rule was removed.
    pub async fn close(&self) -> bool {
        self.apply("close", &self.close_args()).await
    }

    async fn apply(&self, action: &str, args: &[String]) -> bool {
        match run_command(&self.program, args).await {
            Ok(_) => {
                info!("Firewall: {} {}", action, self.port);
                true
            }
            Err(e) => {
                warn!("Could not {} firewall port {}: {}", action, self.port, e);
                false
            }
        }
    }
}
