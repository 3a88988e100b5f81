//! Archive listing, filename sanitization and extraction over an external
//! 7-Zip binary.
//!
//! # Architecture
//!
//! - `field.rs` - Raw listing field parsers and type classification
//! - `entry.rs` - Per-member record model
//! - `listing.rs` - Technical listing parser and summaries
//! - `sanitize.rs` - Filename rules for constrained filesystems
//! - `extract.rs` - Extraction with sanitizing fallbacks
//! - `archive.rs` - The `SevenZipFile` archive object
//! - `runner.rs` - The `Archiver` process seam
//! - `simple.rs` - One-call helpers

pub use archive::{MemberReader, MemberWriter, Mode, SevenZipFile};
pub use config::{CompressionConfig, CompressionLevel, Preset};
pub use entry::{ArchiveEntry, EntryKind, TarMemberKind, TarStyleInfo, ZipStyleInfo};
pub use error::{Error, Result};
pub use extract::{ExtractionReport, ExtractionStrategy, extract_archive_with, is_filename_error};
pub use field::{
    DateTimeTuple, classify_entry_type, parse_attribute_flags, parse_datetime, parse_integer,
};
pub use listing::{ArchiveSummary, parse_listing};
pub use options::ExtractOptions;
pub use runner::{Archiver, SevenZip};
pub use sanitize::{
    SanitizationMapping, Sanitizer, TargetPlatform, get_sanitization_mapping, needs_sanitization,
    sanitize_filename, sanitize_path,
};

pub mod archive;
pub mod config;
pub mod entry;
mod error;
pub mod extract;
pub mod field;
pub mod listing;
pub mod options;
pub mod runner;
pub mod sanitize;
pub mod simple;
mod workspace;
