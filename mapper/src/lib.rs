//! # Map Sidecar
//!
//! Renders the Bedrock world as a browsable web map with BlueMap.
//!
//! The pipeline is linear:
//! 1. Create the output and config directories, check the JAR and world exist
//! 2. Produce a Java-layout copy of the world with an external converter
//!    (skipped when a converted world already exists and conversion is
//!    disabled)
//! 3. Generate BlueMap's default config on first run and patch it to point
//!    at our output directory and converted world
//! 4. Either start BlueMap's own webserver in the foreground, or render once
//!    and re-render on a timer
//!
//! No world data is parsed in this crate; all of that belongs to the
//! converter and to BlueMap.

pub mod bluemap;
pub mod config;
pub mod error;
pub mod render;
pub mod world;

pub use config::{MapperArgs, MapperConfig};
pub use error::MapperError;

use log::info;

/// Logs the effective settings.
pub fn log_banner(cfg: &MapperConfig) {
    info!("{}", "=".repeat(60));
    info!("BlueMap Mapper for Minecraft Bedrock");
    info!("{}", "=".repeat(60));
    info!("Bedrock world: {}", cfg.bedrock_world_dir.display());
    info!("Java world (converted): {}", cfg.java_world_dir.display());
    info!("Output path: {}", cfg.output_path.display());
    info!("Config dir: {}", cfg.config_dir.display());
    info!("BlueMap JAR: {}", cfg.bluemap_jar.display());
    info!("Render threads: {}", cfg.render_threads);
    info!("Ambient light: {}", bluemap::format_float(cfg.ambient_light));
    info!("Skip conversion: {}", cfg.skip_conversion);
    info!("{}", "=".repeat(60));
}

/// Prepares the world and BlueMap config without starting any renderer.
pub async fn prepare(cfg: &MapperConfig) -> Result<(), MapperError> {
    world::ensure_directories(cfg)?;
    world::validate_environment(cfg)?;
    world::convert_world(cfg).await?;
    bluemap::generate_bluemap_config(cfg).await?;
    bluemap::write_map_config(cfg)?;
    Ok(())
}

/// Runs the whole sidecar. Returns when BlueMap exits or on Ctrl+C.
pub async fn run(cfg: &MapperConfig) -> Result<(), MapperError> {
    log_banner(cfg);
    prepare(cfg).await?;

    if cfg.no_webserver {
        render::render_map(cfg).await?;
        tokio::select! {
            _ = render::periodic_render_loop(cfg) => {}
            _ = tokio::signal::ctrl_c() => {
                info!("Received interrupt signal, shutting down...");
            }
        }
        Ok(())
    } else {
        info!("Starting BlueMap render and webserver...");
        render::start_bluemap(cfg).await
    }
}
