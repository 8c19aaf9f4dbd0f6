//! The lifecycle commands exposed by the `control` binary.

use crate::config::ControlConfig;
use crate::console::{Compose, ComposeConsole};
use crate::error::ControlError;
use crate::firewall::Firewall;
use crate::shutdown::{ShutdownAttempt, ShutdownCoordinator};
use clap::Subcommand;
use log::{info, warn};

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Start the server and mapper containers
    Start,
    /// Save the world, then stop the server container
    Stop,
    /// Stop (with the save sequence) and start again
    Restart,
    /// Restart only the map renderer
    #[command(alias = "mapper-restart")]
    RestartMapper,
    /// Show container status
    Status,
}

/// What `status` found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusReport {
    pub server_service: String,
    pub server_running: bool,
    pub ps_output: String,
}

impl StatusReport {
    pub fn summary(&self) -> String {
        let state = if self.server_running {
            "running"
        } else {
            "stopped"
        };
        format!("Server `{}` is {}", self.server_service, state)
    }
}

/// Runs lifecycle commands against one compose project.
pub struct Controller {
    config: ControlConfig,
    compose: Compose,
    console: ComposeConsole,
    coordinator: ShutdownCoordinator,
    firewall: Option<Firewall>,
}

impl Controller {
    pub fn new(config: ControlConfig) -> Self {
        let compose = Compose::new(config.compose_bin.clone(), config.compose_file.clone());
        let console = ComposeConsole::new(compose.clone(), config.server_service.clone());
        let coordinator = ShutdownCoordinator::new(config.shutdown);
        let firewall = config
            .firewall_port
            .as_ref()
            .map(|port| Firewall::new(config.ufw_bin.clone(), port.clone()));

        Self {
            config,
            compose,
            console,
            coordinator,
            firewall,
        }
    }

    pub fn config(&self) -> &ControlConfig {
        &self.config
    }

    pub async fn run(&self, command: Command) -> Result<(), ControlError> {
        match command {
            Command::Start => self.start().await,
            Command::Stop => self.stop().await.map(|_| ()),
            Command::Restart => self.restart().await.map(|_| ()),
            Command::RestartMapper => self.restart_mapper().await,
            Command::Status => {
                let report = self.status().await?;
                let ps = report.ps_output.trim_end();
                if !ps.is_empty() {
                    println!("{}", ps);
                }
                println!("{}", report.summary());
                Ok(())
            }
        }
    }

    pub async fn start(&self) -> Result<(), ControlError> {
        if let Some(firewall) = &self.firewall {
            firewall.open().await;
        }

        info!("Starting services");
        self.compose.up().await.map_err(ControlError::Start)?;
        info!("Services started");
        Ok(())
    }

    /// Runs the save sequence, then stops the server container.
    ///
    /// The container stop happens whatever the save sequence reported.
    pub async fn stop(&self) -> Result<ShutdownAttempt, ControlError> {
        let attempt = self
            .coordinator
            .attempt_graceful_shutdown(&self.console)
            .await;

        if !attempt.warnings.is_empty() && !self.config.shutdown.verbose {
            info!("Pre-stop save skipped; set VERBOSE_SAVE_ERRORS=true for details");
        }

        let service = &self.config.server_service;
        info!("Stopping {}", service);
        self.compose
            .stop(service)
            .await
            .map_err(|source| ControlError::Stop {
                service: service.clone(),
                source,
            })?;

        if let Some(firewall) = &self.firewall {
            firewall.close().await;
        }

        info!("{} stopped", service);
        Ok(attempt)
    }

    pub async fn restart(&self) -> Result<ShutdownAttempt, ControlError> {
        let attempt = self.stop().await?;
        self.start().await?;
        Ok(attempt)
    }

    pub async fn restart_mapper(&self) -> Result<(), ControlError> {
        let service = &self.config.mapper_service;
        info!("Restarting {}", service);
        self.compose
            .restart(service)
            .await
            .map_err(|source| ControlError::Restart {
                service: service.clone(),
                source,
            })?;
        Ok(())
    }

    pub async fn status(&self) -> Result<StatusReport, ControlError> {
        let ps = self.compose.ps().await.map_err(ControlError::Status)?;
        let server_running = match self.compose.running_services().await {
            Ok(services) => services.contains(&self.config.server_service),
            Err(e) => {
                warn!("Could not list running services: {}", e);
                false
            }
        };

        Ok(StatusReport {
            server_service: self.config.server_service.clone(),
            server_running,
            ps_output: ps.stdout,
        })
    }
}
