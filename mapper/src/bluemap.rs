//! BlueMap configuration: first-run generation and in-place patching.

use crate::config::MapperConfig;
use crate::error::MapperError;
use log::{info, warn};
use regex::{NoExpand, Regex};
use shared::{run_command_with_timeout, ProcessError};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// BlueMap's first run writes its default config, then may keep serving.
pub const CONFIG_GENERATION_TIMEOUT: Duration = Duration::from_secs(10);

/// `java -jar <jar> -c <config dir> <extra…>`
pub fn bluemap_args(cfg: &MapperConfig, extra: &[&str]) -> Vec<String> {
    let mut args = vec![
        "-jar".to_string(),
        cfg.bluemap_jar.display().to_string(),
        "-c".to_string(),
        cfg.config_dir.display().to_string(),
    ];
    args.extend(extra.iter().map(|a| a.to_string()));
    args
}

/// Formats a float the way BlueMap's HOCON examples write them (`1.0`, `0.25`).
pub fn format_float(value: f32) -> String {
    if value.fract() == 0.0 {
        format!("{:.1}", value)
    } else {
        value.to_string()
    }
}

/// Replaces every `key: value` line (quoted or bare value), or appends one.
pub fn set_conf_line(content: &str, key: &str, value: &str) -> String {
    let pattern = format!(r#"(?m)^[ \t]*{}:[ \t]*(?:"[^"]*"|\S+)[ \t]*$"#, regex::escape(key));
    replace_or_append(content, &pattern, &format!("{}: {}", key, value))
}

fn replace_or_append(content: &str, pattern: &str, line: &str) -> String {
    let Ok(re) = Regex::new(pattern) else {
        return content.to_string();
    };

    if re.is_match(content) {
        return re.replace_all(content, NoExpand(line)).into_owned();
    }

    let mut updated = content.to_string();
    if !updated.is_empty() && !updated.ends_with('\n') {
        updated.push('\n');
    }
    updated.push_str(line);
    updated.push('\n');
    updated
}

fn replace_all(content: &str, pattern: &str, replacement: &str) -> String {
    match Regex::new(pattern) {
        Ok(re) => re.replace_all(content, NoExpand(replacement)).into_owned(),
        Err(_) => content.to_string(),
    }
}

/// Accepts BlueMap's download terms and sets the render thread count.
pub fn patch_core_conf(content: &str, render_threads: u32) -> String {
    let accepted = content.replace("accept-download: false", "accept-download: true");
    replace_all(
        &accepted,
        r"render-thread-count:\s*\d+",
        &format!("render-thread-count: {}", render_threads),
    )
}

fn quoted(path: &Path) -> String {
    format!("\"{}\"", path.display())
}

fn patch_file<F>(path: &Path, patch: F) -> Result<bool, MapperError>
where
    F: FnOnce(&str) -> String,
{
    if !path.exists() {
        return Ok(false);
    }
    let content = fs::read_to_string(path).map_err(MapperError::io("reading", path))?;
    fs::write(path, patch(&content)).map_err(MapperError::io("writing", path))?;
    Ok(true)
}

/// Generates BlueMap's default config on first run, then points it at our
/// output directory.
pub async fn generate_bluemap_config(cfg: &MapperConfig) -> Result<(), MapperError> {
    let core_conf = cfg.config_dir.join("core.conf");

    if !core_conf.exists() {
        info!("Generating default BlueMap configuration...");
        let args = bluemap_args(cfg, &[]);
        match run_command_with_timeout(&cfg.java_bin, &args, CONFIG_GENERATION_TIMEOUT).await {
            Ok(_) => info!("Default configuration generated"),
            Err(ProcessError::TimedOut { .. }) => {
                info!("Config generation timed out (this is expected if webserver started)")
            }
            Err(e @ ProcessError::Failed { .. }) => {
                info!(
                    "Config generation returned exit code {} (may be OK)",
                    e.exit_code()
                        .map_or_else(|| "unknown".to_string(), |code| code.to_string())
                )
            }
            Err(e) => return Err(e.into()),
        }
    }

    if patch_file(&core_conf, |content| {
        patch_core_conf(content, cfg.render_threads)
    })? {
        info!("core.conf updated");
    }

    let webroot = quoted(&cfg.output_path);
    for name in ["webserver.conf", "webapp.conf"] {
        let path = cfg.config_dir.join(name);
        if patch_file(&path, |content| set_conf_line(content, "webroot", &webroot))? {
            info!("{} updated with webroot: {}", name, cfg.output_path.display());
        }
    }

    let storage_root = cfg.output_path.join("maps");
    let file_storage = cfg.config_dir.join("storages").join("file.conf");
    if patch_file(&file_storage, |content| {
        set_conf_line(content, "root", &quoted(&storage_root))
    })? {
        info!("storages/file.conf updated with root: {}", storage_root.display());
    }

    Ok(())
}

/// Fills an existing map config with our id, name, world and lighting.
pub fn map_config_from_template(cfg: &MapperConfig, template: &str) -> String {
    let content = replace_all(template, r#"id:\s*"[^"]*""#, &format!("id: \"{}\"", cfg.map_id));
    let content = replace_all(
        &content,
        r#"name:\s*"[^"]*""#,
        &format!("name: \"{}\"", cfg.map_name),
    );
    let content = replace_all(
        &content,
        r#"world:\s*"[^"]*""#,
        &format!("world: {}", quoted(&cfg.java_world_dir)),
    );
    replace_or_append(
        &content,
        r"(?m)^[ \t]*ambient-light:[ \t]*[0-9]*\.?[0-9]+[ \t]*$",
        &format!("ambient-light: {}", format_float(cfg.ambient_light)),
    )
}

pub fn default_map_config(cfg: &MapperConfig) -> String {
    format!(
        r##"##                          ##
##         BlueMap          ##
##        Map-Config        ##
##                          ##

# The id of this map
id: "{id}"

# The display name of this map
name: "{name}"

# The world/save-folder of this map (converted from Bedrock)
world: "{world}"

# The dimension of the world
dimension: "minecraft:overworld"

# The position of this map in the web-application
sorting: 0

# The start position for this map
# (the position where the players camera is when opening the map)
start-pos: {{x: 0, z: 0}}

# The color of the sky
sky-color: "#7dabff"

# Defines the ambient light
ambient-light: {ambient}

# Defines the view-distance for hires tiles
hires-view-distance: {hires}

# Defines the view-distance for lowres tiles
lowres-view-distance: {lowres}

# Whether edges should be rendered
render-edges: true

# Whether the highres layer should be saved
save-hires-layer: true

# Remove caves below this Y-level (Bedrock typically uses -64)
remove-caves-below-y: {min_y}
"##,
        id = cfg.map_id,
        name = cfg.map_name,
        world = cfg.java_world_dir.display(),
        ambient = format_float(cfg.ambient_light),
        hires = cfg.hires_view_distance,
        lowres = cfg.lowres_view_distance,
        min_y = cfg.min_y,
    )
}

/// Writes `maps/<id>.conf`.
///
/// When another map config is already present and ours is not, the first
/// one (by name) is used as the template so BlueMap's own defaults survive.
pub fn write_map_config(cfg: &MapperConfig) -> Result<PathBuf, MapperError> {
    let maps_dir = cfg.config_dir.join("maps");
    let map_conf = maps_dir.join(format!("{}.conf", cfg.map_id));

    if !map_conf.exists() {
        if let Some(template) = first_map_config(&maps_dir)? {
            info!(
                "Using {} as template for map config",
                template.file_name().unwrap_or_default().to_string_lossy()
            );
            let sample = fs::read_to_string(&template).map_err(MapperError::io("reading", &template))?;
            fs::write(&map_conf, map_config_from_template(cfg, &sample))
                .map_err(MapperError::io("writing", &map_conf))?;
            info!(
                "Map configuration written to {} (from template)",
                map_conf.display()
            );
            return Ok(map_conf);
        }
    }

    fs::write(&map_conf, default_map_config(cfg)).map_err(MapperError::io("writing", &map_conf))?;
    info!("Map configuration written to {}", map_conf.display());
    Ok(map_conf)
}

fn first_map_config(maps_dir: &Path) -> Result<Option<PathBuf>, MapperError> {
    if !maps_dir.is_dir() {
        return Ok(None);
    }

    let entries = fs::read_dir(maps_dir).map_err(MapperError::io("listing", maps_dir))?;
    let mut configs: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.extension().is_some_and(|ext| ext == "conf"))
        .collect();
    configs.sort();

    if configs.len() > 1 {
        warn!("Several map configs found, using the first as template");
    }
    Ok(configs.into_iter().next())
}
