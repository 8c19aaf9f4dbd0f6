//! Access to the running server through `docker compose`.

use async_trait::async_trait;
use log::debug;
use shared::{run_command, CommandOutput, ProcessError};

/// In-band access to a running server instance.
///
/// The shutdown sequence only ever talks to the server through this trait,
/// so it can be driven without a container runtime.
#[async_trait]
pub trait ServerConsole: Send + Sync {
    /// Whether the instance is currently up
    async fn is_running(&self) -> bool;

    /// Sends an administrative command. Success means exit status zero.
    async fn send_command(&self, args: &[&str]) -> Result<CommandOutput, ProcessError>;
}

/// A `docker compose` invocation bound to one project file.
#[derive(Debug, Clone)]
pub struct Compose {
    program: String,
    file: Option<String>,
}

impl Compose {
    pub fn new(program: impl Into<String>, file: Option<String>) -> Self {
        Self {
            program: program.into(),
            file,
        }
    }

    /// Full argument list for `compose <args>`, including `-f` when set.
    pub fn args<S: AsRef<str>>(&self, args: &[S]) -> Vec<String> {
        let mut full = vec!["compose".to_string()];
        if let Some(file) = &self.file {
            full.push("-f".to_string());
            full.push(file.clone());
        }
        full.extend(args.iter().map(|a| a.as_ref().to_string()));
        full
    }

    pub async fn run<S: AsRef<str>>(&self, args: &[S]) -> Result<CommandOutput, ProcessError> {
        run_command(&self.program, self.args(args).as_slice()).await
    }

    pub async fn up(&self) -> Result<CommandOutput, ProcessError> {
        self.run(&["up", "-d"]).await
    }

    pub async fn stop(&self, service: &str) -> Result<CommandOutput, ProcessError> {
        self.run(&["stop", service]).await
    }

    pub async fn restart(&self, service: &str) -> Result<CommandOutput, ProcessError> {
        self.run(&["restart", service]).await
    }

    pub async fn ps(&self) -> Result<CommandOutput, ProcessError> {
        self.run(&["ps"]).await
    }

    pub async fn running_services(&self) -> Result<Vec<String>, ProcessError> {
        let output = self
            .run(&["ps", "--status", "running", "--services"])
            .await?;
        Ok(parse_services(&output.stdout))
    }
}

/// One service name per non-empty line.
pub fn parse_services(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}

/// [`ServerConsole`] for a compose service whose image ships `send-command`.
#[derive(Debug, Clone)]
pub struct ComposeConsole {
    compose: Compose,
    service: String,
}

impl ComposeConsole {
    pub fn new(compose: Compose, service: impl Into<String>) -> Self {
        Self {
            compose,
            service: service.into(),
        }
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    fn exec_args(&self, args: &[&str]) -> Vec<String> {
        let mut full = vec![
            "exec".to_string(),
            "-T".to_string(),
            self.service.clone(),
            "send-command".to_string(),
        ];
        full.extend(args.iter().map(|a| a.to_string()));
        full
    }
}

#[async_trait]
impl ServerConsole for ComposeConsole {
    async fn is_running(&self) -> bool {
        match self.compose.running_services().await {
            Ok(services) => services.iter().any(|s| s == &self.service),
            Err(e) => {
                debug!("Could not query running services: {}", e);
                false
            }
        }
    }

    async fn send_command(&self, args: &[&str]) -> Result<CommandOutput, ProcessError> {
        self.compose.run(self.exec_args(args).as_slice()).await
    }
}
