//! Android pipeline: mirror the bundle tree into the app's assets.

use std::path::Path;

use pckinject_core::{layout, AssetBundle, Platform};

use crate::error::{io_err, SyncError};
use crate::events::{Stage, StageEvent, StageOutcome};
use crate::mirror::{mirror, source_metadata, MirrorOutcome};

/// Install the bundle under `<root>/android/app/src/main/assets/main`.
///
/// A missing bundle source is recorded as [`StageOutcome::SourceMissing`]
/// and leaves the Android tree untouched.
pub fn run(project_root: &Path) -> Result<Vec<StageEvent>, SyncError> {
    let bundle = AssetBundle::resolve(project_root, Platform::Android);
    let source = bundle.source().path();

    if source_metadata(source)?.is_none() {
        let event = StageEvent::new(
            Stage::AndroidMirror,
            Platform::Android,
            StageOutcome::SourceMissing {
                path: source.to_path_buf(),
            },
        );
        return Ok(vec![event.emit()]);
    }

    let assets = layout::android_assets_dir(project_root);
    std::fs::create_dir_all(&assets).map_err(|e| io_err(&assets, e))?;

    let outcome = match mirror(source, bundle.destination())? {
        MirrorOutcome::SourceMissing { path } => StageOutcome::SourceMissing { path },
        MirrorOutcome::Mirrored { files, directories } => StageOutcome::Mirrored {
            destination: bundle.destination().to_path_buf(),
            files,
            directories,
        },
    };
    Ok(vec![
        StageEvent::new(Stage::AndroidMirror, Platform::Android, outcome).emit(),
    ])
}
