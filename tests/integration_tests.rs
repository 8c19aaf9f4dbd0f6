//! Integration tests across the control CLI, the shutdown sequence and the
//! mapper pipeline.
//!
//! Container and firewall tools are replaced with small shell scripts that
//! record their arguments, so the full command flow runs without Docker.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// SHUTDOWN SEQUENCE TESTS
mod shutdown_tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;
    use async_trait::async_trait;
    use control::console::ServerConsole;
    use control::shutdown::{
        ShutdownAttempt, ShutdownConfig, ShutdownCoordinator, ShutdownStep,
        SAVE_HOLD_UNAVAILABLE,
    };
    use shared::{CommandOutput, ProcessError};
    use std::process::ExitStatus;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::time::Instant;

    struct ScriptedConsole {
        running: bool,
        fail_hold: bool,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ServerConsole for ScriptedConsole {
        async fn is_running(&self) -> bool {
            self.running
        }

        async fn send_command(&self, args: &[&str]) -> Result<CommandOutput, ProcessError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_hold && args == ["save", "hold"] {
                return Err(ProcessError::TimedOut {
                    command: "send-command save hold".to_string(),
                    timeout: Duration::from_secs(1),
                });
            }
            Ok(CommandOutput {
                status: ExitStatus::default(),
                stdout: String::new(),
                stderr: String::new(),
            })
        }
    }

    fn two_and_three() -> ShutdownCoordinator {
        ShutdownCoordinator::new(ShutdownConfig {
            hold_wait: Duration::from_secs(2),
            shutdown_grace: Duration::from_secs(3),
            verbose: false,
        })
    }

    /// Running server, both commands succeed: about five seconds in total
    #[tokio::test(start_paused = true)]
    async fn full_save_sequence_takes_both_waits() {
        let console = ScriptedConsole {
            running: true,
            fail_hold: false,
            calls: AtomicUsize::new(0),
        };
        let start = Instant::now();

        let attempt = two_and_three().attempt_graceful_shutdown(&console).await;

        assert_eq!(
            attempt,
            ShutdownAttempt {
                held_save: true,
                resumed_save: true,
                warnings: vec![],
            }
        );
        assert_eq!(console.calls.load(Ordering::SeqCst), 2);
        assert_approx_eq!(start.elapsed().as_secs_f64(), 5.0, 0.1);
    }

    /// Save hold unavailable: one warning, no waiting at all
    #[tokio::test(start_paused = true)]
    async fn failed_hold_returns_immediately() {
        let console = ScriptedConsole {
            running: true,
            fail_hold: true,
            calls: AtomicUsize::new(0),
        };
        let start = Instant::now();

        let attempt = two_and_three().attempt_graceful_shutdown(&console).await;

        assert_eq!(attempt.warnings, vec![SAVE_HOLD_UNAVAILABLE.to_string()]);
        assert_eq!(attempt.step(), ShutdownStep::SaveHoldFailed);
        assert_eq!(console.calls.load(Ordering::SeqCst), 1);
        assert_approx_eq!(start.elapsed().as_secs_f64(), 0.0, 0.1);
    }
}

/// CONTROL CLI TESTS
#[cfg(unix)]
mod control_tests {
    use super::*;
    use control::commands::{Command, Controller};
    use control::config::ControlConfig;
    use control::shutdown::{ShutdownConfig, ShutdownStep, SAVE_HOLD_UNAVAILABLE};
    use control::ControlError;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::TempDir;

    /// Stand-in for `docker` and `ufw` that appends each invocation to a log
    struct FakeTools {
        dir: TempDir,
    }

    impl FakeTools {
        fn new(running: &str, hold_exit: i32, up_exit: i32) -> Self {
            let dir = tempfile::tempdir().unwrap();
            let log = dir.path().join("calls.log");

            let docker = format!(
                r#"#!/bin/sh
echo "docker $*" >> "{log}"
case "$*" in
  *"ps --status running --services") printf '{running}' ;;
  "compose ps") printf 'NAME STATUS\n' ;;
  *"send-command save hold") exit {hold_exit} ;;
  "compose up -d") exit {up_exit} ;;
esac
exit 0
"#,
                log = log.display(),
            );
            write_script(&dir.path().join("docker"), &docker);

            let ufw = format!("#!/bin/sh\necho \"ufw $*\" >> \"{}\"\n", log.display());
            write_script(&dir.path().join("ufw"), &ufw);

            Self { dir }
        }

        fn config(&self) -> ControlConfig {
            ControlConfig {
                compose_bin: self.path("docker"),
                ufw_bin: self.path("ufw"),
                shutdown: ShutdownConfig {
                    hold_wait: Duration::ZERO,
                    shutdown_grace: Duration::ZERO,
                    verbose: true,
                },
                ..ControlConfig::default()
            }
        }

        fn path(&self, name: &str) -> String {
            self.dir.path().join(name).display().to_string()
        }

        /// Every recorded call except the running-services probes
        fn calls(&self) -> Vec<String> {
            fs::read_to_string(self.dir.path().join("calls.log"))
                .unwrap_or_default()
                .lines()
                .filter(|line| !line.ends_with("--services"))
                .map(String::from)
                .collect()
        }
    }

    fn write_script(path: &Path, body: &str) {
        fs::write(path, body).unwrap();
        fs::set_permissions(path, fs::Permissions::from_mode(0o755)).unwrap();
    }

    #[tokio::test]
    async fn stop_saves_before_stopping_container() {
        let tools = FakeTools::new("bedrock\\nmapper\\n", 0, 0);
        let controller = Controller::new(tools.config());

        let attempt = controller.stop().await.unwrap();

        assert_eq!(attempt.step(), ShutdownStep::Completed);
        assert_eq!(
            tools.calls(),
            vec![
                "docker compose exec -T bedrock send-command save hold",
                "docker compose exec -T bedrock send-command save resume",
                "docker compose stop bedrock",
            ]
        );
    }

    #[tokio::test]
    async fn stop_goes_ahead_when_save_hold_fails() {
        let tools = FakeTools::new("bedrock\\n", 1, 0);
        let controller = Controller::new(tools.config());

        let attempt = controller.stop().await.unwrap();

        assert_eq!(attempt.warnings, vec![SAVE_HOLD_UNAVAILABLE.to_string()]);
        assert_eq!(
            tools.calls(),
            vec![
                "docker compose exec -T bedrock send-command save hold",
                "docker compose stop bedrock",
            ]
        );
    }

    #[tokio::test]
    async fn stop_skips_save_when_server_is_down() {
        let tools = FakeTools::new("mapper\\n", 0, 0);
        let controller = Controller::new(tools.config());

        let attempt = controller.stop().await.unwrap();

        assert_eq!(attempt.step(), ShutdownStep::NotRunning);
        assert_eq!(tools.calls(), vec!["docker compose stop bedrock"]);
    }

    #[tokio::test]
    async fn restart_toggles_firewall_around_compose() {
        let tools = FakeTools::new("", 0, 0);
        let controller = Controller::new(ControlConfig {
            firewall_port: Some("19132/udp".to_string()),
            compose_file: Some("stack.yml".to_string()),
            ..tools.config()
        });

        controller.run(Command::Restart).await.unwrap();

        assert_eq!(
            tools.calls(),
            vec![
                "docker compose -f stack.yml stop bedrock",
                "ufw delete allow 19132/udp",
                "ufw allow 19132/udp",
                "docker compose -f stack.yml up -d",
            ]
        );
    }

    #[tokio::test]
    async fn restart_mapper_restarts_only_the_mapper() {
        let tools = FakeTools::new("bedrock\\n", 0, 0);
        let controller = Controller::new(tools.config());

        controller.run(Command::RestartMapper).await.unwrap();

        assert_eq!(tools.calls(), vec!["docker compose restart mapper"]);
    }

    #[tokio::test]
    async fn status_reports_server_state() {
        let tools = FakeTools::new("bedrock\\n", 0, 0);
        let controller = Controller::new(tools.config());

        let report = controller.status().await.unwrap();

        assert!(report.server_running);
        assert_eq!(report.ps_output, "NAME STATUS\n");
        assert_eq!(report.summary(), "Server `bedrock` is running");
    }

    #[tokio::test]
    async fn failed_start_is_an_error() {
        let tools = FakeTools::new("", 0, 1);
        let controller = Controller::new(tools.config());

        let err = controller.start().await.unwrap_err();

        assert!(matches!(err, ControlError::Start(_)));
        assert!(err.to_string().starts_with("failed to start services"));
    }
}

/// MAPPER PIPELINE TESTS
mod mapper_tests {
    use super::*;
    use mapper::{MapperConfig, MapperError};

    fn layout(root: &Path) -> MapperConfig {
        MapperConfig {
            bedrock_world_dir: root.join("bedrock/worlds/world"),
            java_world_dir: root.join("mapper-output/java_world"),
            output_path: root.join("mapper-output/webroot"),
            config_dir: root.join("bluemap/config"),
            bluemap_jar: root.join("BlueMap-cli.jar"),
            skip_conversion: true,
            ..MapperConfig::default()
        }
    }

    fn read(path: PathBuf) -> String {
        fs::read_to_string(path).unwrap()
    }

    /// Pre-converted world and existing BlueMap config: no external tools run
    #[tokio::test]
    async fn prepare_configures_bluemap_for_existing_world() {
        let root = tempfile::tempdir().unwrap();
        let cfg = layout(root.path());

        fs::write(&cfg.bluemap_jar, b"jar").unwrap();
        fs::create_dir_all(&cfg.bedrock_world_dir).unwrap();
        fs::create_dir_all(&cfg.java_world_dir).unwrap();
        fs::create_dir_all(&cfg.config_dir).unwrap();
        fs::write(
            cfg.config_dir.join("core.conf"),
            "accept-download: false\nrender-thread-count: 1\n",
        )
        .unwrap();
        fs::write(cfg.config_dir.join("webserver.conf"), "port: 8100\nwebroot: web\n").unwrap();

        mapper::prepare(&cfg).await.unwrap();

        assert!(read(cfg.config_dir.join("core.conf")).contains("accept-download: true"));
        assert_eq!(
            read(cfg.config_dir.join("webserver.conf")),
            format!("port: 8100\nwebroot: \"{}\"\n", cfg.output_path.display())
        );

        let map_conf = read(cfg.config_dir.join("maps/bedrock.conf"));
        assert!(map_conf.contains(&format!("world: \"{}\"", cfg.java_world_dir.display())));
        assert!(cfg.output_path.is_dir());
    }

    #[tokio::test]
    async fn prepare_fails_without_bluemap_jar() {
        let root = tempfile::tempdir().unwrap();
        let cfg = layout(root.path());

        let err = mapper::prepare(&cfg).await.unwrap_err();

        assert!(matches!(err, MapperError::JarNotFound(ref path) if path == &cfg.bluemap_jar));
    }
}
