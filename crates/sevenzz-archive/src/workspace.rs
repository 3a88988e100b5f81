//! Scratch directories for staged extraction and additions.
//!
//! A [`Staging`] directory is removed when dropped, on success and failure
//! alike.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use walkdir::WalkDir;

use crate::error::{Error, Result};

const STAGING_PREFIX: &str = "sevenzz-";

pub struct Staging {
    dir: TempDir,
}

/// One file found under a staging directory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StagedFile {
    pub path: PathBuf,
    /// Path relative to the staging root, `/`-separated.
    pub relative: String,
    pub is_dir: bool,
}

/// What [`place_file`] did with its source.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Placement {
    Moved,
    SkippedExisting,
}

impl Staging {
    pub fn new() -> Result<Self> {
        let dir = tempfile::Builder::new().prefix(STAGING_PREFIX).tempdir()?;
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Every file and directory below the root, parents before children.
    pub fn entries(&self) -> Result<Vec<StagedFile>> {
        let root = self.dir.path();
        let mut out = Vec::new();
        for entry in WalkDir::new(root).min_depth(1).sort_by_file_name() {
            let entry = entry.map_err(|e| Error::Io(e.into()))?;
            let Ok(relative) = entry.path().strip_prefix(root) else {
                continue;
            };
            out.push(StagedFile {
                path: entry.path().to_path_buf(),
                relative: relative_string(relative),
                is_dir: entry.file_type().is_dir(),
            });
        }
        Ok(out)
    }

    /// Write `data` to `name` below the root, creating parents.
    pub fn write(&self, name: &str, data: &[u8]) -> Result<PathBuf> {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, data)?;
        Ok(path)
    }
}

fn relative_string(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Move `src` to `dest`, creating parent directories.
///
/// An existing `dest` is replaced only when `overwrite` is set; otherwise it
/// is left alone and reported as skipped.
pub fn place_file(src: &Path, dest: &Path, overwrite: bool) -> Result<Placement> {
    if fs::symlink_metadata(dest).is_ok() {
        if !overwrite {
            tracing::warn!(path = %dest.display(), "destination exists, skipping");
            return Ok(Placement::SkippedExisting);
        }
        fs::remove_file(dest).map_err(|source| Error::Move {
            from: src.to_path_buf(),
            to: dest.to_path_buf(),
            source,
        })?;
    }
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }
    move_file(src, dest)?;
    Ok(Placement::Moved)
}

/// Rename, falling back to copy and delete across filesystems.
pub fn move_file(src: &Path, dest: &Path) -> Result<()> {
    if fs::rename(src, dest).is_ok() {
        return Ok(());
    }
    let to_move_error = |source| Error::Move {
        from: src.to_path_buf(),
        to: dest.to_path_buf(),
        source,
    };
    fs::copy(src, dest).map_err(to_move_error)?;
    fs::remove_file(src).map_err(to_move_error)?;
    Ok(())
}

/// Recursively copy `src` (file or directory) to `dest`.
pub fn copy_tree(src: &Path, dest: &Path) -> Result<()> {
    if src.is_file() {
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(src, dest)?;
        return Ok(());
    }

    for entry in WalkDir::new(src) {
        let entry = entry.map_err(|e| Error::Io(e.into()))?;
        let Ok(relative) = entry.path().strip_prefix(src) else {
            continue;
        };
        let target = dest.join(relative);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}
