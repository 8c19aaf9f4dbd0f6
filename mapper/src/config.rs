//! Mapper settings. Every flag can also come from the environment.

use crate::error::MapperError;
use clap::Parser;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_BLUEMAP_JAR: &str = "/opt/bluemap/BlueMap-cli.jar";

#[derive(Parser, Debug, Clone)]
#[command(
    author,
    version,
    about = "Convert Bedrock worlds to Java format and render with BlueMap's built-in web server.",
    long_about = None
)]
pub struct MapperArgs {
    /// Path to Bedrock world directory
    #[arg(long, env = "BEDROCK_WORLD_DIR", default_value = "/bedrock/worlds/world")]
    pub bedrock_world_dir: PathBuf,

    /// Where the converted Java world is stored (default: next to the output, `java_<world name>`)
    #[arg(long, env = "JAVA_WORLD_DIR")]
    pub java_world_dir: Option<PathBuf>,

    /// Directory where rendered map files are written
    #[arg(long, env = "OUTPUT_PATH", default_value = "mapper-output/webroot")]
    pub output_path: PathBuf,

    /// BlueMap configuration directory
    #[arg(long, env = "CONFIG_DIR", default_value = "/opt/bluemap/config")]
    pub config_dir: PathBuf,

    /// Number of threads for rendering (0 = all cores)
    #[arg(long, env = "BLUEMAP_RENDER_THREADS", default_value = "2")]
    pub render_threads: u32,

    /// Seconds between automatic re-renders
    #[arg(long, env = "RENDER_INTERVAL", default_value = "3600")]
    pub render_interval: u64,

    /// Ambient light for the generated map config
    #[arg(long, env = "BLUEMAP_AMBIENT_LIGHT", default_value = "1.0")]
    pub ambient_light: f32,

    /// Path to BlueMap CLI JAR file
    #[arg(long, env = "BLUEMAP_JAR", default_value = DEFAULT_BLUEMAP_JAR)]
    pub bluemap_jar: PathBuf,

    /// Java launcher used to run BlueMap
    #[arg(long, env = "JAVA_BIN", default_value = "java")]
    pub java_bin: String,

    /// Skip Bedrock to Java conversion if already done
    #[arg(long, env = "SKIP_CONVERSION")]
    pub skip_conversion: bool,

    /// Converter command, called as `<cmd> <bedrock dir> <java dir>`
    #[arg(long, env = "CONVERTER_CMD")]
    pub converter_cmd: Option<String>,

    /// Render on a timer instead of starting the BlueMap webserver
    #[arg(long, env = "MAPPER_NO_WEBSERVER")]
    pub no_webserver: bool,
}

impl MapperArgs {
    pub fn into_config(self) -> Result<MapperConfig, MapperError> {
        let cwd = std::env::current_dir().map_err(MapperError::io("reading working directory", "."))?;
        let home = std::env::var_os("HOME").map(PathBuf::from);
        Ok(self.into_config_in(&cwd, home.as_deref()))
    }

    /// Resolves relative paths against `cwd` and `~` against `home`.
    pub fn into_config_in(self, cwd: &Path, home: Option<&Path>) -> MapperConfig {
        let output_path = normalize_output_path(&self.output_path, cwd, home);
        let java_world_dir = self
            .java_world_dir
            .unwrap_or_else(|| default_java_world_dir(&output_path, &self.bedrock_world_dir));

        MapperConfig {
            bedrock_world_dir: self.bedrock_world_dir,
            java_world_dir,
            output_path,
            config_dir: self.config_dir,
            bluemap_jar: self.bluemap_jar,
            java_bin: self.java_bin,
            render_threads: self.render_threads,
            render_interval: Duration::from_secs(self.render_interval.max(1)),
            skip_conversion: self.skip_conversion,
            converter_cmd: self.converter_cmd.filter(|cmd| !cmd.trim().is_empty()),
            no_webserver: self.no_webserver,
            ambient_light: self.ambient_light,
            ..MapperConfig::default()
        }
    }
}

/// Fully resolved mapper settings.
#[derive(Debug, Clone, PartialEq)]
pub struct MapperConfig {
    pub bedrock_world_dir: PathBuf,
    pub java_world_dir: PathBuf,
    pub output_path: PathBuf,
    pub config_dir: PathBuf,
    pub bluemap_jar: PathBuf,
    pub java_bin: String,
    pub render_threads: u32,
    pub render_interval: Duration,
    pub skip_conversion: bool,
    pub converter_cmd: Option<String>,
    pub no_webserver: bool,

    // Map settings
    pub map_id: String,
    pub map_name: String,
    pub min_y: i32,
    pub hires_view_distance: u32,
    pub lowres_view_distance: u32,
    pub ambient_light: f32,
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            bedrock_world_dir: PathBuf::from("/bedrock/worlds/world"),
            java_world_dir: PathBuf::from("mapper-output/java_world"),
            output_path: PathBuf::from("mapper-output/webroot"),
            config_dir: PathBuf::from("/opt/bluemap/config"),
            bluemap_jar: PathBuf::from(DEFAULT_BLUEMAP_JAR),
            java_bin: "java".to_string(),
            render_threads: 2,
            render_interval: Duration::from_secs(3600),
            skip_conversion: false,
            converter_cmd: None,
            no_webserver: false,
            map_id: "bedrock".to_string(),
            map_name: "Bedrock World".to_string(),
            min_y: -64,
            hires_view_distance: 5,
            lowres_view_distance: 7,
            ambient_light: 1.0,
        }
    }
}

/// Expands `~`, makes the path absolute, and makes sure it ends in `webroot`.
pub fn normalize_output_path(path: &Path, cwd: &Path, home: Option<&Path>) -> PathBuf {
    let expanded = match (path.strip_prefix("~"), home) {
        (Ok(rest), Some(home)) => home.join(rest),
        _ => path.to_path_buf(),
    };

    let absolute = if expanded.is_absolute() {
        expanded
    } else {
        cwd.join(expanded)
    };

    if absolute.file_name().is_some_and(|name| name == "webroot") {
        absolute
    } else {
        absolute.join("webroot")
    }
}

/// `<output parent>/java_<bedrock world name>`
pub fn default_java_world_dir(output_path: &Path, bedrock_world_dir: &Path) -> PathBuf {
    let world_name = bedrock_world_dir
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "world".to_string());
    let parent = output_path.parent().unwrap_or(output_path);
    parent.join(format!("java_{}", world_name))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(extra: &[&str]) -> MapperArgs {
        MapperArgs::try_parse_from(std::iter::once("mapper").chain(extra.iter().copied()))
            .unwrap()
    }

    #[test]
    fn test_normalize_appends_webroot() {
        let cwd = Path::new("/srv/mc");
        assert_eq!(
            normalize_output_path(Path::new("mapper-output"), cwd, None),
            PathBuf::from("/srv/mc/mapper-output/webroot")
        );
        assert_eq!(
            normalize_output_path(Path::new("/data/webroot"), cwd, None),
            PathBuf::from("/data/webroot")
        );
    }

    #[test]
    fn test_normalize_expands_home() {
        let cwd = Path::new("/srv/mc");
        let home = Path::new("/home/ops");
        assert_eq!(
            normalize_output_path(Path::new("~/maps"), cwd, Some(home)),
            PathBuf::from("/home/ops/maps/webroot")
        );
    }

    #[test]
    fn test_default_java_world_dir() {
        let java = default_java_world_dir(
            Path::new("/srv/mc/mapper-output/webroot"),
            Path::new("/bedrock/worlds/Survival"),
        );
        assert_eq!(java, PathBuf::from("/srv/mc/mapper-output/java_Survival"));
    }

    #[test]
    fn test_flag_values_flow_into_config() {
        let config = args(&[
            "--bedrock-world-dir",
            "/worlds/island",
            "--output-path",
            "out",
            "--render-threads",
            "4",
            "--render-interval",
            "0",
            "--ambient-light",
            "0.5",
            "--skip-conversion",
            "--converter-cmd",
            " ",
        ])
        .into_config_in(Path::new("/srv"), None);

        assert_eq!(config.output_path, PathBuf::from("/srv/out/webroot"));
        assert_eq!(config.java_world_dir, PathBuf::from("/srv/out/java_island"));
        assert_eq!(config.render_threads, 4);
        assert_eq!(config.render_interval, Duration::from_secs(1));
        assert_eq!(config.ambient_light, 0.5);
        assert!(config.skip_conversion);
        assert_eq!(config.converter_cmd, None);
        assert_eq!(config.map_id, "bedrock");
    }

    #[test]
    fn test_explicit_java_world_dir_wins() {
        let config = args(&["--java-world-dir", "/converted/world"])
            .into_config_in(Path::new("/srv"), None);
        assert_eq!(config.java_world_dir, PathBuf::from("/converted/world"));
        assert_eq!(config.bluemap_jar, PathBuf::from(DEFAULT_BLUEMAP_JAR));
    }
}
