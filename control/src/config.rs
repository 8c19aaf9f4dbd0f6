//! Runtime configuration for the control CLI, read from the environment.

use crate::shutdown::{ShutdownConfig, DEFAULT_HOLD_WAIT, DEFAULT_SHUTDOWN_GRACE};
use shared::{parse_flag, parse_secs};

pub const DEFAULT_COMPOSE_BIN: &str = "docker";
pub const DEFAULT_UFW_BIN: &str = "ufw";
pub const DEFAULT_SERVER_SERVICE: &str = "bedrock";
pub const DEFAULT_MAPPER_SERVICE: &str = "mapper";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlConfig {
    /// Program providing the `compose` subcommand
    pub compose_bin: String,
    /// Passed as `-f` when set
    pub compose_file: Option<String>,
    pub server_service: String,
    pub mapper_service: String,
    /// Port rule (e.g. `19132/udp`) opened on start and closed on stop
    pub firewall_port: Option<String>,
    pub ufw_bin: String,
    pub shutdown: ShutdownConfig,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            compose_bin: DEFAULT_COMPOSE_BIN.to_string(),
            compose_file: None,
            server_service: DEFAULT_SERVER_SERVICE.to_string(),
            mapper_service: DEFAULT_MAPPER_SERVICE.to_string(),
            firewall_port: None,
            ufw_bin: DEFAULT_UFW_BIN.to_string(),
            shutdown: ShutdownConfig::default(),
        }
    }
}

impl ControlConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the config from any variable source. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        Self {
            compose_bin: get("COMPOSE_BIN").unwrap_or_else(|| DEFAULT_COMPOSE_BIN.to_string()),
            compose_file: get("COMPOSE_FILE"),
            server_service: get("SERVER_SERVICE")
                .unwrap_or_else(|| DEFAULT_SERVER_SERVICE.to_string()),
            mapper_service: get("MAPPER_SERVICE")
                .unwrap_or_else(|| DEFAULT_MAPPER_SERVICE.to_string()),
            firewall_port: get("FIREWALL_PORT"),
            ufw_bin: get("UFW_BIN").unwrap_or_else(|| DEFAULT_UFW_BIN.to_string()),
            shutdown: ShutdownConfig {
                hold_wait: parse_secs(
                    "SAVE_HOLD_WAIT",
                    get("SAVE_HOLD_WAIT").as_deref(),
                    DEFAULT_HOLD_WAIT,
                ),
                shutdown_grace: parse_secs(
                    "SHUTDOWN_GRACE_PERIOD",
                    get("SHUTDOWN_GRACE_PERIOD").as_deref(),
                    DEFAULT_SHUTDOWN_GRACE,
                ),
                verbose: parse_flag(
                    "VERBOSE_SAVE_ERRORS",
                    get("VERBOSE_SAVE_ERRORS").as_deref(),
                    false,
                ),
            },
        }
    }
}
