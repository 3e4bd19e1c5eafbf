/// Error types for backend commands and configuration loading.
use compact_str::CompactString;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Failure of a single backend command.
///
/// Every backend response carries a `Result<_, BackendError>` so that a
/// failure is distinguishable from a request that is still pending.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    #[error("Permission denied: {0}")]
    PermissionDenied(CompactString),

    #[error("Not found: {0}")]
    NotFound(CompactString),

    /// The request was cancelled before it produced a result.
    #[error("Cancelled")]
    Cancelled,

    #[error("{0}")]
    Other(String),
}

impl BackendError {
    /// Map an I/O error on `path` to the matching error kind.
    pub fn from_io(path: &str, err: &io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(CompactString::new(path)),
            io::ErrorKind::NotFound => Self::NotFound(CompactString::new(path)),
            _ => Self::Other(format!("{path}: {err}")),
        }
    }

    /// `true` for user-initiated cancellation, which is never shown as a notice.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Failure to load a session configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Config parse error: {0}")]
    Parse(#[from] serde_json::Error),
}
