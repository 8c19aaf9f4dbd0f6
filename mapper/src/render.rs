//! Running BlueMap: one-off renders, the foreground webserver, and the
//! periodic re-render loop.

use crate::bluemap::bluemap_args;
use crate::config::MapperConfig;
use crate::error::MapperError;
use log::{error, info};
use shared::{format_command, run_command, run_foreground};
use tokio::time::{interval, MissedTickBehavior};

/// Forces a full render (`-r -f`) and logs BlueMap's output.
pub async fn render_map(cfg: &MapperConfig) -> Result<(), MapperError> {
    info!("Starting BlueMap render...");
    let args = bluemap_args(cfg, &["-r", "-f"]);

    match run_command(&cfg.java_bin, &args).await {
        Ok(output) => {
            for line in output.stdout.trim().lines() {
                info!("  {}", line);
            }
            info!("Render complete!");
            Ok(())
        }
        Err(e) => {
            error!("BlueMap render failed: {}", e);
            let output = e.output().trim();
            if !output.is_empty() {
                error!("Output:");
                for line in output.lines() {
                    error!("  {}", line);
                }
            }
            Err(e.into())
        }
    }
}

/// Renders once and then serves the map (`-r -w`) until BlueMap exits or
/// Ctrl+C is received.
pub async fn start_bluemap(cfg: &MapperConfig) -> Result<(), MapperError> {
    info!("Starting BlueMap with integrated webserver...");
    let args = bluemap_args(cfg, &["-r", "-w"]);

    info!("Command: {}", format_command(&cfg.java_bin, &args));
    info!("BlueMap will render the map and then start the webserver");
    info!("Press Ctrl+C to stop");

    tokio::select! {
        result = run_foreground(&cfg.java_bin, &args) => {
            result.map(|_| ()).map_err(|e| {
                error!("BlueMap failed: {}", e);
                MapperError::from(e)
            })
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received interrupt, shutting down...");
            Ok(())
        }
    }
}

/// Re-renders every `render_interval`. A failed render is logged and tried
/// again on the next tick; this never returns.
pub async fn periodic_render_loop(cfg: &MapperConfig) {
    info!(
        "Entering periodic render loop (interval: {}s)",
        cfg.render_interval.as_secs()
    );

    let mut timer = interval(cfg.render_interval);
    timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

    // The first tick fires immediately
    timer.tick().await;

    loop {
        timer.tick().await;
        info!("Starting periodic re-render...");
        if let Err(e) = render_map(cfg).await {
            error!("Periodic render failed: {}", e);
            info!("Will retry at next interval");
        }
    }
}
