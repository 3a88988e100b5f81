use std::fmt;
use std::fs;
use std::io::{self, Cursor, Read, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use tracing::{debug, error};

use crate::config::CompressionConfig;
use crate::entry::ArchiveEntry;
use crate::error::{Error, Result};
use crate::extract::{ExtractionReport, extract_archive_with};
use crate::listing::{ArchiveSummary, parse_listing};
use crate::options::ExtractOptions;
use crate::runner::{Archiver, SevenZip};
use crate::workspace::{Staging, copy_tree};

/// Name reported by [`SevenZipFile::testzip`] when the failing member
/// cannot be identified.
pub const UNKNOWN_MEMBER: &str = "unknown_file";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Mode {
    Read,
    Write,
    Append,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Read => "r",
            Self::Write => "w",
            Self::Append => "a",
        })
    }
}

impl FromStr for Mode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "r" => Ok(Self::Read),
            "w" => Ok(Self::Write),
            "a" => Ok(Self::Append),
            other => Err(Error::InvalidInput(format!(
                "mode must be 'r', 'w' or 'a', got '{other}'"
            ))),
        }
    }
}

/// A 7z archive on disk, driven through an [`Archiver`].
///
/// Listing operations re-read the archive each time; nothing is cached.
#[derive(Debug)]
pub struct SevenZipFile {
    path: PathBuf,
    mode: Mode,
    config: CompressionConfig,
    archiver: Box<dyn Archiver>,
}

impl SevenZipFile {
    /// Open an existing archive for reading.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if !path.is_file() {
            return Err(Error::ArchiveNotFound { path });
        }
        Ok(Self::with_mode(path, Mode::Read, CompressionConfig::default()))
    }

    /// Start a new archive, removing any file already at `path`.
    pub fn create(path: impl Into<PathBuf>, config: CompressionConfig) -> Result<Self> {
        let path = path.into();
        if path.is_file() {
            fs::remove_file(&path)?;
        }
        Ok(Self::with_mode(path, Mode::Write, config))
    }

    /// Add to an archive, creating it on first write if needed.
    pub fn append(path: impl Into<PathBuf>, config: CompressionConfig) -> Result<Self> {
        Ok(Self::with_mode(path.into(), Mode::Append, config))
    }

    /// Open `path` in a mode given as `"r"`, `"w"` or `"a"`.
    pub fn open_with_mode(
        path: impl Into<PathBuf>,
        mode: &str,
        config: CompressionConfig,
    ) -> Result<Self> {
        match mode.parse::<Mode>()? {
            Mode::Read => Self::open(path),
            Mode::Write => Self::create(path, config),
            Mode::Append => Self::append(path, config),
        }
    }

    fn with_mode(path: PathBuf, mode: Mode, config: CompressionConfig) -> Self {
        Self {
            path,
            mode,
            config,
            archiver: Box::new(SevenZip::new()),
        }
    }

    /// Replace the archiver used for all operations.
    pub fn with_archiver(mut self, archiver: impl Archiver + 'static) -> Self {
        self.archiver = Box::new(archiver);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn config(&self) -> &CompressionConfig {
        &self.config
    }

    fn ensure_exists(&self) -> Result<()> {
        if self.path.is_file() {
            Ok(())
        } else {
            Err(Error::ArchiveNotFound {
                path: self.path.clone(),
            })
        }
    }

    fn ensure_readable(&self, operation: &'static str) -> Result<()> {
        if self.mode == Mode::Write {
            return Err(Error::InvalidMode {
                operation,
                mode: self.mode,
            });
        }
        self.ensure_exists()
    }

    fn ensure_writable(&self, operation: &'static str) -> Result<()> {
        if self.mode == Mode::Read {
            return Err(Error::InvalidMode {
                operation,
                mode: self.mode,
            });
        }
        Ok(())
    }

    /// Records for every member, in archive order.
    pub fn infolist(&self) -> Result<Vec<ArchiveEntry>> {
        self.ensure_exists()?;
        let listing = self
            .archiver
            .list_detailed(&self.path)
            .map_err(|e| Error::operation("list archive", e))?;
        Ok(parse_listing(&listing)
            .into_iter()
            .filter(|entry| !entry.filename.is_empty())
            .collect())
    }

    pub fn getmembers(&self) -> Result<Vec<ArchiveEntry>> {
        self.infolist()
    }

    pub fn namelist(&self) -> Result<Vec<String>> {
        Ok(self.infolist()?.into_iter().map(|e| e.filename).collect())
    }

    pub fn getnames(&self) -> Result<Vec<String>> {
        self.namelist()
    }

    /// Record for `name`, if present. A trailing `/` is ignored.
    pub fn find(&self, name: &str) -> Result<Option<ArchiveEntry>> {
        let wanted = name.trim_end_matches('/');
        let mut entries = self.infolist()?.into_iter();
        Ok(entries
            .find(|e| e.filename == name || e.filename.trim_end_matches('/') == wanted))
    }

    pub fn getinfo(&self, name: &str) -> Result<ArchiveEntry> {
        self.find(name)?.ok_or_else(|| Error::MemberNotFound {
            name: name.to_string(),
        })
    }

    pub fn getmember(&self, name: &str) -> Result<ArchiveEntry> {
        self.getinfo(name)
    }

    pub fn contains(&self, name: &str) -> Result<bool> {
        Ok(self.find(name)?.is_some())
    }

    pub fn iter(&self) -> Result<std::vec::IntoIter<String>> {
        Ok(self.namelist()?.into_iter())
    }

    pub fn summary(&self) -> Result<ArchiveSummary> {
        Ok(ArchiveSummary::from_entries(&self.infolist()?))
    }

    /// Extract everything below `dest`.
    pub fn extract(&self, dest: impl AsRef<Path>, overwrite: bool) -> Result<ExtractionReport> {
        self.extract_with(dest, &ExtractOptions::default().overwrite(overwrite))
    }

    /// Extract `members` (or everything) below `dest`, replacing existing files.
    pub fn extractall(
        &self,
        dest: impl AsRef<Path>,
        members: Option<&[String]>,
    ) -> Result<ExtractionReport> {
        let mut options = ExtractOptions::default().overwrite(true);
        options.members = members.map(<[String]>::to_vec);
        self.extract_with(dest, &options)
    }

    pub fn extract_with(
        &self,
        dest: impl AsRef<Path>,
        options: &ExtractOptions,
    ) -> Result<ExtractionReport> {
        self.ensure_readable("extract")?;
        extract_archive_with(&*self.archiver, &self.path, dest.as_ref(), options)
    }

    /// Contents of one member.
    pub fn read(&self, name: &str) -> Result<Vec<u8>> {
        self.ensure_readable("read")?;
        let entry = self.getinfo(name)?;
        self.archiver
            .read_member(&self.path, &entry.filename)
            .map_err(|e| Error::operation("read member", e))
    }

    /// Reader over one member's contents.
    pub fn open_member(&self, name: &str) -> Result<MemberReader> {
        Ok(MemberReader {
            name: name.to_string(),
            inner: Cursor::new(self.read(name)?),
        })
    }

    /// Add a file or directory, stored as `arcname` when given.
    pub fn add(&self, path: impl AsRef<Path>, arcname: Option<&str>) -> Result<()> {
        self.ensure_writable("add")?;
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::SourceNotFound {
                path: path.to_path_buf(),
            });
        }

        match arcname {
            Some(arcname) => {
                let arcname = arcname.trim_matches('/');
                if arcname.is_empty() {
                    return Err(Error::InvalidInput("arcname must not be empty".into()));
                }
                let staging = Staging::new()?;
                copy_tree(path, &staging.path().join(arcname))?;
                self.add_staged(&staging, arcname)
            }
            None => {
                debug!(source = %path.display(), archive = %self.path.display(), "adding");
                self.archiver
                    .add(&self.path, &[path.to_path_buf()], &self.config, None)
                    .map_err(|e| Error::operation("add to archive", e))
            }
        }
    }

    /// Store `data` as member `name`.
    pub fn writestr(&self, name: &str, data: impl AsRef<[u8]>) -> Result<()> {
        self.ensure_writable("write")?;
        let name = name.trim_matches('/');
        if name.is_empty() {
            return Err(Error::InvalidInput("member name must not be empty".into()));
        }
        let staging = Staging::new()?;
        staging.write(name, data.as_ref())?;
        self.add_staged(&staging, name)
    }

    /// Writer whose bytes become member `name`.
    ///
    /// The member is added by [`MemberWriter::finish`], or when the writer is
    /// dropped; a failure on drop can only be logged.
    pub fn open_member_writer(&self, name: &str) -> Result<MemberWriter<'_>> {
        self.ensure_writable("write")?;
        if name.trim_matches('/').is_empty() {
            return Err(Error::InvalidInput("member name must not be empty".into()));
        }
        Ok(MemberWriter {
            archive: self,
            name: name.to_string(),
            buffer: Vec::new(),
            committed: false,
        })
    }

    fn add_staged(&self, staging: &Staging, name: &str) -> Result<()> {
        let archive = std::path::absolute(&self.path)?;
        debug!(member = name, archive = %archive.display(), "adding staged member");
        self.archiver
            .add(
                &archive,
                &[PathBuf::from(name)],
                &self.config,
                Some(staging.path()),
            )
            .map_err(|e| Error::operation("add to archive", e))
    }

    /// First member that fails the integrity check, or `None` if all pass.
    pub fn testzip(&self) -> Result<Option<String>> {
        self.ensure_exists()?;
        match self.archiver.test(&self.path) {
            Ok(()) => Ok(None),
            Err(e @ sevenzz_platform::Error::NonZeroExit { .. }) => {
                let diagnostic = format!("{}\n{}", e.diagnostic(), stdout_of(&e));
                Ok(Some(
                    failing_member(&diagnostic).unwrap_or(UNKNOWN_MEMBER).to_string(),
                ))
            }
            Err(e) => Err(e.into()),
        }
    }
}

fn stdout_of(err: &sevenzz_platform::Error) -> &str {
    match err {
        sevenzz_platform::Error::NonZeroExit { stdout, .. } => stdout,
        _ => "",
    }
}

/// Pull the member name out of an integrity-check diagnostic.
///
/// Handles `ERROR: <name>` and `ERROR: <reason> : <name>` lines.
pub(crate) fn failing_member(diagnostic: &str) -> Option<&str> {
    diagnostic.lines().find_map(|line| {
        let line = line.trim();
        let rest = line
            .strip_prefix("ERROR:")
            .or_else(|| line.strip_prefix("Error:"))?
            .trim();
        let name = rest.rsplit_once(" : ").map_or(rest, |(_, name)| name).trim();
        (!name.is_empty()).then_some(name)
    })
}

/// Buffered reader over one member's contents.
#[derive(Debug)]
pub struct MemberReader {
    name: String,
    inner: Cursor<Vec<u8>>,
}

impl MemberReader {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.inner.get_ref().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.inner.into_inner()
    }
}

impl Read for MemberReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

/// Buffers writes for one member and adds it to the archive on completion.
#[derive(Debug)]
pub struct MemberWriter<'a> {
    archive: &'a SevenZipFile,
    name: String,
    buffer: Vec<u8>,
    committed: bool,
}

impl MemberWriter<'_> {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Bytes written so far.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Add the buffered bytes to the archive.
    pub fn finish(mut self) -> Result<()> {
        self.commit()
    }

    fn commit(&mut self) -> Result<()> {
        self.committed = true;
        let data = std::mem::take(&mut self.buffer);
        self.archive.writestr(&self.name, data)
    }
}

impl Write for MemberWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for MemberWriter<'_> {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        if let Err(e) = self.commit() {
            error!(member = %self.name, error = %e, "failed to add member on drop");
        }
    }
}
