use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LogError {
    #[error("log file error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("rotation period must be positive")]
    InvalidRotation,
    #[error("invalid rotation suffix {0:?}")]
    InvalidSuffix(String),
    #[error("logger already initialized")]
    AlreadyInitialized,
    #[error("failed to install tracing subscriber: {0}")]
    Subscriber(String),
}

impl LogError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        LogError::Io {
            path: path.into(),
            source,
        }
    }
}
