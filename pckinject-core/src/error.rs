//! Error types for pckinject-core.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise from layout resolution.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Underlying I/O failure while inspecting a native project directory.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A platform name that is neither `android` nor `ios`.
    #[error("unknown platform '{0}'; expected: android, ios")]
    UnknownPlatform(String),
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> CoreError {
    CoreError::Io {
        path: path.into(),
        source,
    }
}
