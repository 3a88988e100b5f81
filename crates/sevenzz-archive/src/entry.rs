use std::fmt;

use serde::Serialize;

use crate::field::{self, DateTimeTuple, has_trailing_separator};

/// Semantic type of an archive member.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    #[default]
    File,
    Directory,
    Symlink,
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::File => "file",
            Self::Directory => "directory",
            Self::Symlink => "symlink",
        })
    }
}

/// Metadata for one archive member.
///
/// The modification time is held both as broken-down fields and as epoch
/// seconds; the setters keep the two in step.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ArchiveEntry {
    pub filename: String,
    original_filename: String,
    pub uncompressed_size: u64,
    pub compressed_size: u64,
    modified: Option<DateTimeTuple>,
    modified_epoch: Option<f64>,
    pub created: Option<f64>,
    pub accessed: Option<f64>,
    pub method: String,
    pub crc32: u32,
    pub solid: bool,
    pub encrypted: bool,
    pub kind: EntryKind,
    /// Raw attribute field, e.g. `A` or `D drwxr-xr-x`.
    pub attributes: String,
    pub unix_mode: Option<u32>,
    pub link_target: Option<String>,
    pub owner_uid: Option<u32>,
    pub owner_gid: Option<u32>,
    pub owner_name: Option<String>,
    pub group_name: Option<String>,
    pub host_os: Option<String>,
    pub block: Option<u64>,
    pub volume_index: Option<u64>,
    pub comment: String,
    #[serde(skip)]
    pub extra: Vec<u8>,
}

/// Per-member fields of a zip-style central directory record.
#[derive(Clone, Debug, Default)]
pub struct ZipStyleInfo {
    pub filename: String,
    pub file_size: u64,
    pub compress_size: u64,
    pub date_time: (i32, u32, u32, u32, u32, u32),
    pub compress_type: u16,
    pub crc: u32,
    pub comment: Vec<u8>,
    pub extra: Vec<u8>,
    /// High 16 bits carry the Unix mode when the archive was made on Unix.
    pub external_attr: u32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TarMemberKind {
    #[default]
    Regular,
    Directory,
    Symlink,
    Hardlink,
    Other,
}

/// Per-member fields of a tar header.
#[derive(Clone, Debug, Default)]
pub struct TarStyleInfo {
    pub name: String,
    pub size: u64,
    pub mtime: f64,
    pub mode: u32,
    pub uid: u32,
    pub gid: u32,
    pub uname: String,
    pub gname: String,
    pub kind: TarMemberKind,
    pub linkname: String,
}

impl ArchiveEntry {
    pub fn new(filename: impl Into<String>) -> Self {
        let filename = filename.into();
        Self {
            original_filename: filename.clone(),
            filename,
            ..Self::default()
        }
    }

    /// The name as first seen, before any rename.
    pub fn original_filename(&self) -> &str {
        &self.original_filename
    }

    pub fn modified(&self) -> Option<DateTimeTuple> {
        self.modified
    }

    pub fn modified_epoch(&self) -> Option<f64> {
        self.modified_epoch
    }

    pub fn set_modified_from_datetime(&mut self, datetime: DateTimeTuple) {
        self.modified_epoch = datetime.to_local_epoch();
        self.modified = Some(datetime);
    }

    pub fn set_modified_from_epoch(&mut self, epoch: f64) {
        self.modified = DateTimeTuple::from_local_epoch(epoch);
        self.modified_epoch = self.modified.map(|_| epoch);
    }

    pub fn clear_modified(&mut self) {
        self.modified = None;
        self.modified_epoch = None;
    }

    /// Store an already-paired result of [`field::parse_datetime`].
    pub(crate) fn set_modified_parsed(&mut self, parsed: (Option<DateTimeTuple>, Option<f64>)) {
        (self.modified, self.modified_epoch) = parsed;
    }

    pub fn with_sizes(mut self, uncompressed: u64, compressed: u64) -> Self {
        self.uncompressed_size = uncompressed;
        self.compressed_size = compressed;
        self
    }

    pub fn with_kind(mut self, kind: EntryKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into();
        self
    }

    pub fn with_modified(mut self, datetime: DateTimeTuple) -> Self {
        self.set_modified_from_datetime(datetime);
        self
    }

    /// Fraction of space saved: `1 - packed/unpacked`.
    ///
    /// `0.0` for empty members; `1.0` when a non-empty member reports no
    /// packed bytes (solid-block members are listed that way). Not clamped:
    /// a member that grew when packed gives a negative ratio.
    pub fn compression_ratio(&self) -> f64 {
        if self.uncompressed_size == 0 {
            0.0
        } else if self.compressed_size == 0 {
            1.0
        } else {
            1.0 - self.compressed_size as f64 / self.uncompressed_size as f64
        }
    }

    pub fn compression_percentage(&self) -> f64 {
        self.compression_ratio() * 100.0
    }

    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory || has_trailing_separator(&self.filename)
    }

    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }

    pub fn is_symlink(&self) -> bool {
        self.kind == EntryKind::Symlink
    }

    pub fn attribute_flags(&self) -> u32 {
        field::parse_attribute_flags(&self.attributes)
    }

    /// Final path component; a trailing separator is ignored.
    pub fn basename(&self) -> &str {
        let name = self.filename.trim_end_matches('/');
        name.rsplit_once('/').map_or(name, |(_, base)| base)
    }

    /// Everything before the final path component, or `""` at top level.
    pub fn dirname(&self) -> &str {
        let name = self.filename.trim_end_matches('/');
        name.rsplit_once('/').map_or("", |(dir, _)| dir)
    }

    /// Check the record's invariants without failing.
    pub fn validate(&self) -> bool {
        if self.filename.is_empty() {
            return false;
        }
        if let Some(datetime) = self.modified {
            if !datetime.is_valid() {
                return false;
            }
        }
        if self.kind == EntryKind::Directory {
            let mode_says_dir = self.unix_mode.is_some_and(field::mode_is_dir);
            let flags_say_dir = self.attribute_flags() & field::ATTR_DIRECTORY != 0;
            if !(has_trailing_separator(&self.filename) || flags_say_dir || mode_says_dir) {
                return false;
            }
        }
        true
    }

    pub fn from_zip_info(info: ZipStyleInfo) -> Self {
        let mut entry = Self::new(info.filename);
        entry.uncompressed_size = info.file_size;
        entry.compressed_size = info.compress_size;
        entry.set_modified_from_datetime(info.date_time.into());
        entry.method = info.compress_type.to_string();
        entry.crc32 = info.crc;
        entry.comment = String::from_utf8_lossy(&info.comment).into_owned();
        entry.extra = info.extra;

        let mode = info.external_attr >> 16;
        entry.unix_mode = (mode != 0).then_some(mode);
        entry.kind = if has_trailing_separator(&entry.filename) {
            EntryKind::Directory
        } else if entry.unix_mode.is_some_and(field::mode_is_symlink) {
            EntryKind::Symlink
        } else {
            EntryKind::File
        };
        entry.attributes = match entry.kind {
            EntryKind::Directory => "D".to_string(),
            _ => "A".to_string(),
        };
        entry
    }

    pub fn from_tar_info(info: TarStyleInfo) -> Self {
        let mut entry = Self::new(info.name);
        entry.uncompressed_size = info.size;
        entry.compressed_size = info.size;
        entry.set_modified_from_epoch(info.mtime);
        entry.unix_mode = Some(info.mode);
        entry.owner_uid = Some(info.uid);
        entry.owner_gid = Some(info.gid);
        entry.owner_name = (!info.uname.is_empty()).then_some(info.uname);
        entry.group_name = (!info.gname.is_empty()).then_some(info.gname);

        entry.kind = match info.kind {
            TarMemberKind::Directory => EntryKind::Directory,
            TarMemberKind::Symlink => EntryKind::Symlink,
            TarMemberKind::Regular | TarMemberKind::Hardlink | TarMemberKind::Other => {
                EntryKind::File
            }
        };
        if matches!(info.kind, TarMemberKind::Symlink | TarMemberKind::Hardlink)
            && !info.linkname.is_empty()
        {
            entry.link_target = Some(info.linkname);
        }
        entry.attributes = match entry.kind {
            EntryKind::Directory => "D".to_string(),
            _ => "A".to_string(),
        };
        entry
    }
}

impl fmt::Display for ArchiveEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} bytes)", self.filename, self.uncompressed_size)
    }
}
