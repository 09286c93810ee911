//! Error types for pckinject-sync.

use std::path::PathBuf;

use thiserror::Error;

use pckinject_core::CoreError;
use pckinject_pbx::PbxError;

/// All errors that can arise from installing a bundle.
///
/// A missing bundle source is not in here: it is the non-fatal
/// [`crate::StageOutcome::SourceMissing`] outcome.
#[derive(Debug, Error)]
pub enum SyncError {
    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The project descriptor could not be parsed, lacks a structural anchor,
    /// or would be left with broken links.
    #[error("project descriptor {path}: {source}")]
    Descriptor {
        path: PathBuf,
        #[source]
        source: PbxError,
    },

    /// The iOS project has no `<App>.xcodeproj/project.pbxproj`.
    #[error("no Xcode project descriptor found under {ios_root}")]
    DescriptorNotFound { ios_root: PathBuf },

    /// Layout resolution failed.
    #[error("layout error: {0}")]
    Layout(#[from] CoreError),

    /// Report serialization error.
    #[error("report JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience constructor for [`SyncError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::Io {
        path: path.into(),
        source,
    }
}

/// Convenience constructor for [`SyncError::Descriptor`].
pub(crate) fn descriptor_err(path: impl Into<PathBuf>, source: PbxError) -> SyncError {
    SyncError::Descriptor {
        path: path.into(),
        source,
    }
}
