//! Read-only view of what is installed under a project root.
//!
//! Nothing here writes to disk. A descriptor that fails to parse or fails
//! the integrity check is reported as [`Registration::Invalid`] rather than
//! returned as an error, so `status` can describe a broken project.

use std::path::{Path, PathBuf};

use serde::Serialize;

use pckinject_core::{layout, AssetBundle, Platform};
use pckinject_pbx::{ObjectId, ProjectGraph};

use crate::error::{io_err, SyncError};

/// Source and destination presence for one platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BundleStatus {
    pub platform: Platform,
    pub source: PathBuf,
    pub source_exists: bool,
    pub destination: PathBuf,
    pub destination_exists: bool,
}

impl BundleStatus {
    fn inspect(project_root: &Path, platform: Platform) -> Self {
        let bundle = AssetBundle::resolve(project_root, platform);
        Self {
            platform,
            source: bundle.source().path().to_path_buf(),
            source_exists: bundle.source_exists(),
            destination: bundle.destination().to_path_buf(),
            destination_exists: bundle.destination().exists(),
        }
    }
}

/// Whether the Xcode project lists the bundle file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Registration {
    NoDescriptor,
    Unregistered { descriptor: PathBuf },
    Registered { descriptor: PathBuf, file_ref: ObjectId },
    Invalid { descriptor: PathBuf, reason: String },
}

impl Registration {
    pub fn label(&self) -> &'static str {
        match self {
            Registration::NoDescriptor => "no descriptor",
            Registration::Unregistered { .. } => "unregistered",
            Registration::Registered { .. } => "registered",
            Registration::Invalid { .. } => "invalid",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusReport {
    pub project_root: PathBuf,
    pub bundles: Vec<BundleStatus>,
    pub registration: Registration,
}

/// Inspect `project_root` without modifying it.
pub fn inspect(project_root: &Path) -> Result<StatusReport, SyncError> {
    let bundles = Platform::all()
        .iter()
        .map(|p| BundleStatus::inspect(project_root, *p))
        .collect();

    let registration = match layout::find_descriptor(project_root)? {
        None => Registration::NoDescriptor,
        Some(descriptor) => registration_of(descriptor)?,
    };

    Ok(StatusReport {
        project_root: project_root.to_path_buf(),
        bundles,
        registration,
    })
}

fn registration_of(descriptor: PathBuf) -> Result<Registration, SyncError> {
    let text = std::fs::read_to_string(&descriptor).map_err(|e| io_err(&descriptor, e))?;
    let graph = match ProjectGraph::parse(&text) {
        Ok(graph) => graph,
        Err(e) => {
            return Ok(Registration::Invalid {
                descriptor,
                reason: e.to_string(),
            })
        }
    };
    if let Err(e) = graph.check_integrity() {
        return Ok(Registration::Invalid {
            descriptor,
            reason: e.to_string(),
        });
    }

    Ok(match graph.find_file(layout::BUNDLE_FILE) {
        Some(file_ref) => Registration::Registered {
            file_ref: file_ref.clone(),
            descriptor,
        },
        None => Registration::Unregistered { descriptor },
    })
}
