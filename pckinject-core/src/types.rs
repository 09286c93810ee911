//! Domain types for bundle installation.
//!
//! Bundles are resolved from a project root; their paths are never configured per call.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::layout;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// A native platform the bundle is installed into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// Directory-based install: the bundle tree is mirrored into app assets.
    Android,
    /// Graph-based install: the packed file is registered in the Xcode project.
    Ios,
}

impl Platform {
    /// Every supported platform, in pipeline order.
    pub fn all() -> &'static [Platform] {
        &[Platform::Android, Platform::Ios]
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Platform::Android => write!(f, "android"),
            Platform::Ios => write!(f, "ios"),
        }
    }
}

impl FromStr for Platform {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "android" => Ok(Platform::Android),
            "ios" => Ok(Platform::Ios),
            other => Err(CoreError::UnknownPlatform(other.to_string())),
        }
    }
}

/// Where the bundle comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "path", rename_all = "lowercase")]
pub enum BundleSource {
    /// An exported directory tree (Android).
    Directory(PathBuf),
    /// A single packed file (iOS).
    File(PathBuf),
}

impl BundleSource {
    pub fn path(&self) -> &Path {
        match self {
            BundleSource::Directory(p) | BundleSource::File(p) => p,
        }
    }
}

// ---------------------------------------------------------------------------
// AssetBundle
// ---------------------------------------------------------------------------

/// A bundle resolved against one project root for one platform.
///
/// Fields are private: the destination is a pure function of the platform and
/// can only be obtained through [`AssetBundle::resolve`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssetBundle {
    platform: Platform,
    source: BundleSource,
    destination: PathBuf,
}

impl AssetBundle {
    /// Resolve the fixed source and destination paths for `platform`.
    pub fn resolve(project_root: &Path, platform: Platform) -> Self {
        match platform {
            Platform::Android => Self {
                platform,
                source: BundleSource::Directory(layout::android_source(project_root)),
                destination: layout::android_destination(project_root),
            },
            Platform::Ios => Self {
                platform,
                source: BundleSource::File(layout::ios_source(project_root)),
                destination: layout::ios_destination(project_root),
            },
        }
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn source(&self) -> &BundleSource {
        &self.source
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// `true` when the source path exists on disk.
    pub fn source_exists(&self) -> bool {
        self.source.path().exists()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
