use shared::ProcessError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MapperError {
    #[error("BlueMap JAR not found at {}", .0.display())]
    JarNotFound(PathBuf),

    #[error("Bedrock world not found: {}", .0.display())]
    WorldNotFound(PathBuf),

    #[error("no converted world at {} and no converter configured", .0.display())]
    NoConverter(PathBuf),

    #[error("{action} failed on {}: {source}", .path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Process(#[from] ProcessError),
}

impl MapperError {
    pub(crate) fn io(action: &'static str, path: impl Into<PathBuf>) -> impl FnOnce(io::Error) -> Self {
        let path = path.into();
        move |source| MapperError::Io {
            action,
            path,
            source,
        }
    }
}
