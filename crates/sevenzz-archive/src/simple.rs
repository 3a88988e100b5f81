//! One-call helpers over [`SevenZipFile`].

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::archive::SevenZipFile;
use crate::config::{CompressionConfig, Preset};
use crate::error::{Error, Result};
use crate::extract::ExtractionReport;
use crate::listing::ArchiveSummary;

const ARCHIVE_SUFFIX: &str = ".7z";

/// Overview of an archive file.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ArchiveInfo {
    pub path: PathBuf,
    /// Lower-cased extension including the dot, e.g. `.7z`.
    pub format: String,
    /// Size of the archive file itself.
    pub archive_size: u64,
    pub files: Vec<String>,
    pub summary: ArchiveSummary,
}

fn require_archive(path: &Path) -> Result<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(Error::ArchiveNotFound {
            path: path.to_path_buf(),
        })
    }
}

fn require_source(path: &Path) -> Result<()> {
    if path.exists() {
        Ok(())
    } else {
        Err(Error::SourceNotFound {
            path: path.to_path_buf(),
        })
    }
}

/// Create `archive` from `sources`, replacing any existing file.
pub fn create_archive<P: AsRef<Path>>(
    archive: impl AsRef<Path>,
    sources: &[P],
    preset: Preset,
    password: Option<&str>,
) -> Result<()> {
    for source in sources {
        require_source(source.as_ref())?;
    }
    let mut config = CompressionConfig::from(preset);
    if let Some(password) = password {
        config = config.password(password);
    }
    let writer = SevenZipFile::create(archive.as_ref(), config)?;
    for source in sources {
        writer.add(source, None)?;
    }
    Ok(())
}

pub fn extract_archive(
    archive: impl AsRef<Path>,
    dest: impl AsRef<Path>,
    overwrite: bool,
) -> Result<ExtractionReport> {
    SevenZipFile::open(archive.as_ref())?.extract(dest, overwrite)
}

pub fn list_archive(archive: impl AsRef<Path>) -> Result<Vec<String>> {
    SevenZipFile::open(archive.as_ref())?.namelist()
}

/// Whether every member passes the integrity check.
pub fn test_archive(archive: impl AsRef<Path>) -> Result<bool> {
    Ok(SevenZipFile::open(archive.as_ref())?.testzip()?.is_none())
}

pub fn get_archive_info(archive: impl AsRef<Path>) -> Result<ArchiveInfo> {
    let path = archive.as_ref();
    require_archive(path)?;
    let entries = SevenZipFile::open(path)?.infolist()?;

    Ok(ArchiveInfo {
        path: path.to_path_buf(),
        format: path
            .extension()
            .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()))
            .unwrap_or_default(),
        archive_size: path.metadata()?.len(),
        files: entries.iter().map(|e| e.filename.clone()).collect(),
        summary: ArchiveSummary::from_entries(&entries),
    })
}

/// `<path>.7z`, keeping the full original name.
fn default_output(input: &Path) -> PathBuf {
    // `components()` drops a trailing separator.
    let mut name = OsString::from(input.components().as_path());
    name.push(ARCHIVE_SUFFIX);
    PathBuf::from(name)
}

/// Compress one file; defaults to `<file>.7z` beside it.
pub fn compress_file(
    input: impl AsRef<Path>,
    output: Option<&Path>,
    preset: Preset,
) -> Result<PathBuf> {
    let input = input.as_ref();
    require_source(input)?;
    let output = output.map_or_else(|| default_output(input), Path::to_path_buf);
    create_archive(&output, &[input], preset, None)?;
    Ok(output)
}

/// Compress a directory tree; defaults to `<dir>.7z` beside it.
pub fn compress_directory(
    input: impl AsRef<Path>,
    output: Option<&Path>,
    preset: Preset,
) -> Result<PathBuf> {
    let input = input.as_ref();
    require_source(input)?;
    if !input.is_dir() {
        return Err(Error::InvalidInput(format!(
            "path is not a directory: {}",
            input.display()
        )));
    }
    let output = output.map_or_else(|| default_output(input), Path::to_path_buf);
    create_archive(&output, &[input], preset, None)?;
    Ok(output)
}
