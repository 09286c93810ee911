//! One-directional directory mirroring.

use std::path::{Path, PathBuf};

use serde::Serialize;
use walkdir::WalkDir;

use crate::error::{io_err, SyncError};
use crate::writer::copy_file;

/// Result of a [`mirror`] call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MirrorOutcome {
    /// Nothing to mirror; the destination was not touched.
    SourceMissing { path: PathBuf },
    /// The source tree was copied. Counts include the destination root.
    Mirrored { files: usize, directories: usize },
}

/// Make `destination` contain every entry of `source`.
///
/// Files are copied byte for byte, overwriting what is there. Entries that
/// exist only under `destination` are left alone. Symlinks are followed, so
/// a broken link fails the copy. A `source` that is a regular file is
/// copied to `destination` as a single file.
pub fn mirror(source: &Path, destination: &Path) -> Result<MirrorOutcome, SyncError> {
    let Some(meta) = source_metadata(source)? else {
        tracing::warn!(path = %source.display(), "mirror source missing; skipping");
        return Ok(MirrorOutcome::SourceMissing {
            path: source.to_path_buf(),
        });
    };

    if meta.is_file() {
        copy_file(source, destination)?;
        return Ok(MirrorOutcome::Mirrored {
            files: 1,
            directories: 0,
        });
    }

    let mut files = 0;
    let mut directories = 0;
    for entry in WalkDir::new(source)
        .follow_links(true)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| walk_err(source, e))?;
        let relative = entry
            .path()
            .strip_prefix(source)
            .unwrap_or_else(|_| Path::new(""));
        let target = destination.join(relative);

        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&target).map_err(|e| io_err(&target, e))?;
            directories += 1;
        } else {
            copy_file(entry.path(), &target)?;
            files += 1;
        }
    }

    tracing::debug!(
        source = %source.display(),
        destination = %destination.display(),
        files,
        directories,
        "mirrored"
    );
    Ok(MirrorOutcome::Mirrored { files, directories })
}

/// Metadata of a bundle source, following symlinks.
///
/// `None` only when nothing exists at `path`. A dangling symlink or an
/// unreadable parent is an error rather than an absent source.
pub(crate) fn source_metadata(path: &Path) -> Result<Option<std::fs::Metadata>, SyncError> {
    match std::fs::symlink_metadata(path) {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(io_err(path, e)),
    }
    std::fs::metadata(path).map(Some).map_err(|e| io_err(path, e))
}

fn walk_err(root: &Path, e: walkdir::Error) -> SyncError {
    let path = e.path().unwrap_or(root).to_path_buf();
    let source = e
        .into_io_error()
        .unwrap_or_else(|| std::io::Error::new(std::io::ErrorKind::Other, "filesystem loop"));
    io_err(path, source)
}
