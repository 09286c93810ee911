//! Fixed directory layout of a mobile project that embeds a Godot export.
//!
//! ```text
//! <root>/
//!   assets/godot/
//!     godot-files/main/          (Android bundle tree)
//!     main.pck                   (iOS packed bundle)
//!   android/app/src/main/assets/
//!     main/                      (mirrored bundle tree)
//!   ios/
//!     main.pck                   (copied bundle)
//!     <App>.xcodeproj/project.pbxproj
//! ```
//!
//! None of these are configurable; they are the conventions the engine
//! runtime expects to find at launch.

use std::path::{Path, PathBuf};

use crate::error::{io_err, CoreError};

pub const ENGINE_DIR: &str = "godot";
pub const BUNDLE_DIR: &str = "godot-files";
pub const BUNDLE_ENTRY: &str = "main";
pub const BUNDLE_FILE: &str = "main.pck";

pub const ANDROID_ROOT: &str = "android";
pub const IOS_ROOT: &str = "ios";

pub const DESCRIPTOR_FILE: &str = "project.pbxproj";
pub const XCODEPROJ_EXT: &str = "xcodeproj";
/// CocoaPods workspace project; never the app descriptor.
pub const PODS_PROJECT: &str = "Pods.xcodeproj";

pub fn engine_assets_dir(root: &Path) -> PathBuf {
    root.join("assets").join(ENGINE_DIR)
}

/// `<root>/assets/godot/godot-files/main`
pub fn android_source(root: &Path) -> PathBuf {
    engine_assets_dir(root).join(BUNDLE_DIR).join(BUNDLE_ENTRY)
}

/// `<root>/android/app/src/main/assets`
pub fn android_assets_dir(root: &Path) -> PathBuf {
    root.join(ANDROID_ROOT)
        .join("app")
        .join("src")
        .join("main")
        .join("assets")
}

/// `<root>/android/app/src/main/assets/main`
pub fn android_destination(root: &Path) -> PathBuf {
    android_assets_dir(root).join(BUNDLE_ENTRY)
}

/// `<root>/assets/godot/main.pck`
pub fn ios_source(root: &Path) -> PathBuf {
    engine_assets_dir(root).join(BUNDLE_FILE)
}

pub fn ios_root(root: &Path) -> PathBuf {
    root.join(IOS_ROOT)
}

/// `<root>/ios/main.pck`
pub fn ios_destination(root: &Path) -> PathBuf {
    ios_root(root).join(BUNDLE_FILE)
}

/// Locate `<root>/ios/<App>.xcodeproj/project.pbxproj`.
///
/// Candidates are considered in name order; `Pods.xcodeproj` and bundles
/// without a descriptor inside are skipped. Returns `Ok(None)` when the iOS
/// root is missing or holds no app project.
pub fn find_descriptor(root: &Path) -> Result<Option<PathBuf>, CoreError> {
    let dir = ios_root(root);
    if !dir.is_dir() {
        return Ok(None);
    }

    let mut candidates: Vec<PathBuf> = std::fs::read_dir(&dir)
        .map_err(|e| io_err(&dir, e))?
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().map(|t| t.is_dir()).unwrap_or(false))
        .map(|e| e.path())
        .filter(|p| {
            p.extension().is_some_and(|ext| ext == XCODEPROJ_EXT)
                && p.file_name().is_some_and(|n| n != PODS_PROJECT)
        })
        .collect();
    candidates.sort();

    Ok(candidates
        .into_iter()
        .map(|p| p.join(DESCRIPTOR_FILE))
        .find(|p| p.is_file()))
}
