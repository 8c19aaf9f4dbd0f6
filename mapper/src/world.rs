//! Preparing the world the renderer reads.
//!
//! The Bedrock world is never parsed here. Conversion to the Java layout
//! BlueMap understands is delegated to an external converter command.

use crate::config::MapperConfig;
use crate::error::MapperError;
use log::{error, info, warn};
use shared::run_command;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Creates the output, config and `config/maps` directories.
pub fn ensure_directories(cfg: &MapperConfig) -> Result<(), MapperError> {
    for dir in [
        cfg.output_path.clone(),
        cfg.config_dir.clone(),
        cfg.config_dir.join("maps"),
    ] {
        fs::create_dir_all(&dir).map_err(MapperError::io("creating directory", &dir))?;
    }
    Ok(())
}

/// Checks that the BlueMap JAR and the Bedrock world exist.
pub fn validate_environment(cfg: &MapperConfig) -> Result<(), MapperError> {
    if !cfg.bluemap_jar.exists() {
        return Err(MapperError::JarNotFound(cfg.bluemap_jar.clone()));
    }

    if !cfg.bedrock_world_dir.exists() {
        error!(
            "Bedrock world directory not found at {}",
            cfg.bedrock_world_dir.display()
        );
        if let Some(parent) = cfg.bedrock_world_dir.parent() {
            if let Ok(entries) = fs::read_dir(parent) {
                info!("Available directories in parent:");
                for entry in entries.flatten() {
                    info!("  - {}", entry.path().display());
                }
            }
        }
        return Err(MapperError::WorldNotFound(cfg.bedrock_world_dir.clone()));
    }

    Ok(())
}

/// Whether files can be created in `dir`.
pub fn is_writable(dir: &Path) -> bool {
    tempfile::tempfile_in(dir).is_ok()
}

/// The world directory the converter should read.
///
/// Holds the temporary snapshot, if one was needed; it is removed on drop.
#[derive(Debug)]
pub struct WorldSource {
    path: PathBuf,
    snapshot: Option<TempDir>,
}

impl WorldSource {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_snapshot(&self) -> bool {
        self.snapshot.is_some()
    }
}

/// Returns a writable copy of the world when the original is read-only.
pub fn prepare_world_source(bedrock_world_dir: &Path) -> Result<WorldSource, MapperError> {
    if is_writable(bedrock_world_dir) {
        return Ok(WorldSource {
            path: bedrock_world_dir.to_path_buf(),
            snapshot: None,
        });
    }

    info!("Bedrock world is read-only; creating writable snapshot for conversion...");
    let snapshot = tempfile::Builder::new()
        .prefix("bedrock-world-snapshot-")
        .tempdir()
        .map_err(MapperError::io("creating snapshot directory", std::env::temp_dir()))?;

    let name = bedrock_world_dir
        .file_name()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("world"));
    let path = snapshot.path().join(name);
    copy_dir_all(bedrock_world_dir, &path)
        .map_err(MapperError::io("copying world snapshot", &path))?;
    info!("Snapshot created at: {}", path.display());

    Ok(WorldSource {
        path,
        snapshot: Some(snapshot),
    })
}

fn copy_dir_all(src: &Path, dst: &Path) -> io::Result<()> {
    fs::create_dir_all(dst)?;
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let target = dst.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_dir_all(&entry.path(), &target)?;
        } else {
            fs::copy(entry.path(), &target)?;
            // Copies inherit read-only bits; the snapshot has to be writable
            let mut perms = fs::metadata(&target)?.permissions();
            #[allow(clippy::permissions_set_readonly_false)]
            perms.set_readonly(false);
            fs::set_permissions(&target, perms)?;
        }
    }
    Ok(())
}

/// Splits the converter command line into program and arguments.
pub fn converter_invocation(cmd: &str, source: &Path, target: &Path) -> Option<(String, Vec<String>)> {
    let mut parts = cmd.split_whitespace().map(String::from);
    let program = parts.next()?;
    let mut args: Vec<String> = parts.collect();
    args.push(source.display().to_string());
    args.push(target.display().to_string());
    Some((program, args))
}

/// Produces the Java world BlueMap renders, converting if needed.
pub async fn convert_world(cfg: &MapperConfig) -> Result<PathBuf, MapperError> {
    let java_exists = cfg.java_world_dir.exists();

    if java_exists && cfg.skip_conversion {
        info!(
            "Java world already exists at {}, skipping conversion",
            cfg.java_world_dir.display()
        );
        return Ok(cfg.java_world_dir.clone());
    }

    let Some(converter) = cfg.converter_cmd.as_deref() else {
        if java_exists {
            warn!(
                "No converter configured; rendering existing world at {}",
                cfg.java_world_dir.display()
            );
            return Ok(cfg.java_world_dir.clone());
        }
        return Err(MapperError::NoConverter(cfg.java_world_dir.clone()));
    };

    info!("{}", "=".repeat(60));
    info!("Converting Bedrock world to Java Edition format...");
    info!("Source (Bedrock): {}", cfg.bedrock_world_dir.display());
    info!("Target (Java): {}", cfg.java_world_dir.display());
    info!("{}", "=".repeat(60));

    let source = prepare_world_source(&cfg.bedrock_world_dir)?;

    if java_exists {
        info!("Removing existing Java world at {}", cfg.java_world_dir.display());
        fs::remove_dir_all(&cfg.java_world_dir)
            .map_err(MapperError::io("removing old Java world", &cfg.java_world_dir))?;
    }

    let Some((program, args)) = converter_invocation(converter, source.path(), &cfg.java_world_dir)
    else {
        return Err(MapperError::NoConverter(cfg.java_world_dir.clone()));
    };

    info!("This may take a while depending on world size...");
    let output = run_command(&program, &args).await.map_err(|e| {
        error!("Conversion failed: {}", e);
        for line in e.output().lines() {
            error!("  {}", line);
        }
        e
    })?;
    for line in output.stdout.lines() {
        info!("  {}", line);
    }

    if source.is_snapshot() {
        info!("Removing conversion snapshot");
    }
    drop(source);

    info!("Conversion complete!");
    info!("Java world created at: {}", cfg.java_world_dir.display());
    Ok(cfg.java_world_dir.clone())
}
