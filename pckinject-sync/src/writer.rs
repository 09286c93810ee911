//! Atomic file writes.
//!
//! ## `atomic_write` protocol
//!
//! 1. Compare the new bytes with what is on disk → skip if identical.
//! 2. Ensure the parent directory exists.
//! 3. Write to `<path>.pckinject.tmp`.
//! 4. Rename to the final path (atomic on POSIX).
//!
//! On a failed rename the temporary file is removed and the original is left
//! as it was.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{io_err, SyncError};

// ---------------------------------------------------------------------------
// Write result
// ---------------------------------------------------------------------------

/// Outcome of an individual file write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteResult {
    /// File was written (content changed or did not previously exist).
    Written { path: PathBuf },
    /// File was skipped; the on-disk bytes already match.
    Unchanged { path: PathBuf },
}

impl WriteResult {
    pub fn path(&self) -> &Path {
        match self {
            WriteResult::Written { path } | WriteResult::Unchanged { path } => path,
        }
    }
}

// ---------------------------------------------------------------------------
// atomic_write
// ---------------------------------------------------------------------------

/// Atomically replace `path` with `content`.
pub fn atomic_write(path: &Path, content: &[u8]) -> Result<WriteResult, SyncError> {
    atomic_write_with_tmp(path, content, &tmp_path(path))
}

fn tmp_path(path: &Path) -> PathBuf {
    PathBuf::from(format!("{}.pckinject.tmp", path.display()))
}

fn atomic_write_with_tmp(path: &Path, content: &[u8], tmp: &Path) -> Result<WriteResult, SyncError> {
    match std::fs::read(path) {
        Ok(existing) if existing == content => {
            tracing::debug!(path = %path.display(), "unchanged");
            return Ok(WriteResult::Unchanged {
                path: path.to_path_buf(),
            });
        }
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(io_err(path, e)),
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
    }
    if let Some(tmp_parent) = tmp.parent() {
        std::fs::create_dir_all(tmp_parent).map_err(|e| io_err(tmp_parent, e))?;
    }
    std::fs::write(tmp, content).map_err(|e| io_err(tmp, e))?;

    if let Err(e) = std::fs::rename(tmp, path) {
        let _ = std::fs::remove_file(tmp);
        return Err(io_err(path, e));
    }

    tracing::debug!(path = %path.display(), bytes = content.len(), "wrote");
    Ok(WriteResult::Written {
        path: path.to_path_buf(),
    })
}

// ---------------------------------------------------------------------------
// copy_file
// ---------------------------------------------------------------------------

/// Copy `source` over `destination`, creating parent directories.
///
/// Returns the number of bytes copied. Errors name the side that failed:
/// opening or reading the source reports `source`, creating or writing the
/// destination reports `destination`.
pub fn copy_file(source: &Path, destination: &Path) -> Result<u64, SyncError> {
    let mut reader = File::open(source).map_err(|e| io_err(source, e))?;
    if reader.metadata().map_err(|e| io_err(source, e))?.is_dir() {
        return Err(io_err(
            source,
            io::Error::new(io::ErrorKind::InvalidInput, "expected a file, found a directory"),
        ));
    }

    if let Some(parent) = destination.parent() {
        std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
    }
    let mut writer = File::create(destination).map_err(|e| io_err(destination, e))?;
    io::copy(&mut reader, &mut writer).map_err(|e| io_err(destination, e))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn first_write_returns_written() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("project.pbxproj");
        let result = atomic_write(&path, b"hello").unwrap();
        assert!(matches!(result, WriteResult::Written { .. }));
        assert_eq!(fs::read(&path).unwrap(), b"hello");
    }

    #[test]
    fn same_content_returns_unchanged_and_keeps_mtime() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("file");
        atomic_write(&path, b"same").unwrap();
        let mtime = fs::metadata(&path).unwrap().modified().unwrap();

        let result = atomic_write(&path, b"same").unwrap();
        assert!(matches!(result, WriteResult::Unchanged { .. }));
        assert_eq!(fs::metadata(&path).unwrap().modified().unwrap(), mtime);
    }

    #[test]
    fn changed_content_returns_written() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("file");
        atomic_write(&path, b"v1").unwrap();
        let result = atomic_write(&path, b"v2").unwrap();
        assert!(matches!(result, WriteResult::Written { .. }));
        assert_eq!(fs::read(&path).unwrap(), b"v2");
    }

    #[test]
    fn tmp_file_removed_after_write() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("clean");
        atomic_write(&path, b"data").unwrap();
        assert!(!tmp_path(&path).exists(), ".pckinject.tmp must be cleaned up");
    }

    #[test]
    fn creates_parent_directories() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("ios").join("App.xcodeproj").join("project.pbxproj");
        atomic_write(&path, b"content").unwrap();
        assert!(path.exists());
    }

    #[test]
    fn copy_file_overwrites_and_counts_bytes() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("main.pck");
        let dst = tmp.path().join("ios").join("main.pck");
        fs::create_dir_all(dst.parent().unwrap()).unwrap();
        fs::write(&dst, b"stale contents").unwrap();
        fs::write(&src, b"PCK\0").unwrap();

        assert_eq!(copy_file(&src, &dst).unwrap(), 4);
        assert_eq!(fs::read(&dst).unwrap(), b"PCK\0");
    }

    #[test]
    fn copy_file_names_missing_source() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("absent.pck");
        let err = copy_file(&src, &tmp.path().join("out.pck")).unwrap_err();
        match err {
            SyncError::Io { path, .. } => assert_eq!(path, src),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn copy_file_names_blocked_destination() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("main.pck");
        fs::write(&src, b"GDPC").unwrap();
        let dst = tmp.path().join("ios").join("main.pck");
        fs::create_dir_all(&dst).unwrap();

        match copy_file(&src, &dst).unwrap_err() {
            SyncError::Io { path, .. } => assert_eq!(path, dst),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(fs::read(&src).unwrap(), b"GDPC");
    }

    #[test]
    fn copy_file_rejects_directory_source() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("main.pck");
        fs::create_dir_all(&src).unwrap();

        match copy_file(&src, &tmp.path().join("out.pck")).unwrap_err() {
            SyncError::Io { path, .. } => assert_eq!(path, src),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    #[cfg(unix)]
    fn rename_failure_leaves_original_and_cleans_tmp() {
        use std::os::unix::fs::PermissionsExt;

        let root = TempDir::new().unwrap();
        let readonly_dir = root.path().join("readonly");
        fs::create_dir_all(&readonly_dir).unwrap();

        let path = readonly_dir.join("project.pbxproj");
        fs::write(&path, "original").unwrap();

        let mut perms = fs::metadata(&readonly_dir).unwrap().permissions();
        perms.set_mode(0o555);
        fs::set_permissions(&readonly_dir, perms).unwrap();

        let tmp_dir = TempDir::new().unwrap();
        let tmp = tmp_dir.path().join("project.pbxproj.pckinject.tmp");

        let result = atomic_write_with_tmp(&path, b"new content", &tmp);

        let mut perms = fs::metadata(&readonly_dir).unwrap().permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&readonly_dir, perms).unwrap();

        // Running as root ignores directory permissions.
        if result.is_ok() {
            return;
        }
        assert_eq!(fs::read_to_string(&path).unwrap(), "original");
        assert!(!tmp.exists(), ".pckinject.tmp should be cleaned up");
    }
}
