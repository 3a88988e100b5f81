//! Parser for the archiver's technical listing (`l -slt`).
//!
//! The listing is a header followed by member blocks, each introduced by a
//! line of ten dashes and made of `Key = Value` lines.

use std::collections::HashMap;

use serde::Serialize;

use crate::entry::{ArchiveEntry, EntryKind};
use crate::field::{self, parse_integer};

/// Line that opens each member block.
pub const ENTRY_DELIMITER: &str = "----------";

/// Dominant method reported for an archive without members.
pub const EMPTY_METHOD: &str = "empty";

/// Dominant method reported when no file records a method.
pub const UNKNOWN_METHOD: &str = "unknown";

/// Parse a full technical listing into records, in archive order.
///
/// Blocks without a `Path` line still produce a record with an empty
/// filename. A block with no `Key = Value` line at all (blank lines or
/// trailing archiver chatter after a delimiter) is noise and yields nothing.
pub fn parse_listing(text: &str) -> Vec<ArchiveEntry> {
    split_blocks(text)
        .into_iter()
        .filter_map(|block| parse_block(&block))
        .collect()
}

fn split_blocks(text: &str) -> Vec<Vec<&str>> {
    let mut blocks = Vec::new();
    let mut current: Option<Vec<&str>> = None;

    for line in text.split('\n') {
        let line = line.strip_suffix('\r').unwrap_or(line);
        if line.trim_end() == ENTRY_DELIMITER {
            if let Some(block) = current.take() {
                blocks.push(block);
            }
            current = Some(Vec::new());
        } else if let Some(block) = current.as_mut() {
            block.push(line);
        }
    }
    blocks.extend(current);
    blocks
}

/// Split a `Key = Value` line. Only the single space after `=` belongs to
/// the separator; the rest of the value is kept verbatim.
fn split_field(line: &str) -> Option<(&str, &str)> {
    let (key, value) = line.split_once('=')?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    Some((key, value.strip_prefix(' ').unwrap_or(value)))
}

fn parse_block(lines: &[&str]) -> Option<ArchiveEntry> {
    let fields: HashMap<&str, &str> = lines.iter().filter_map(|line| split_field(line)).collect();
    if fields.is_empty() {
        return None;
    }
    let get = |key: &str| fields.get(key).copied().unwrap_or("");
    let optional = |key: &str| {
        fields
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    };

    let mut entry = ArchiveEntry::new(get("Path"));
    entry.uncompressed_size = parse_integer(get("Size"), 10, 0);
    entry.compressed_size = parse_integer(get("Packed Size"), 10, 0);
    entry.set_modified_parsed(field::parse_datetime(get("Modified")));
    entry.created = field::parse_epoch(get("Created"));
    entry.accessed = field::parse_epoch(get("Accessed"));

    entry.attributes = get("Attributes").trim().to_string();
    entry.unix_mode = field::parse_unix_mode(&entry.attributes);
    entry.crc32 = u32::try_from(parse_integer(get("CRC"), 16, 0)).unwrap_or(0);
    entry.method = get("Method").trim().to_string();
    entry.solid = get("Solid").trim() == "+";
    entry.encrypted = get("Encrypted").trim() == "+";
    entry.comment = get("Comment").to_string();
    entry.host_os = optional("Host OS").map(str::to_string);
    entry.block = optional("Block").map(|v| parse_integer(v, 10, 0));
    entry.volume_index = optional("Volume Index").map(|v| parse_integer(v, 10, 0));
    entry.link_target = optional("Symbolic Link").map(str::to_string);

    entry.kind = field::classify_entry_type(&entry.attributes, &entry.filename);
    if entry.kind == EntryKind::File
        && (entry.link_target.is_some() || entry.unix_mode.is_some_and(field::mode_is_symlink))
    {
        entry.kind = EntryKind::Symlink;
    }
    Some(entry)
}

/// Aggregate figures over a set of records.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ArchiveSummary {
    pub file_count: usize,
    pub directory_count: usize,
    pub symlink_count: usize,
    pub total_entry_count: usize,
    pub total_uncompressed_size: u64,
    pub total_compressed_size: u64,
    pub compression_ratio: f64,
    pub dominant_method: String,
    pub solid: bool,
    pub encrypted: bool,
}

impl ArchiveSummary {
    pub fn from_entries(entries: &[ArchiveEntry]) -> Self {
        let mut summary = Self {
            total_entry_count: entries.len(),
            ..Self::default()
        };
        // Insertion order decides ties.
        let mut methods: Vec<(&str, usize)> = Vec::new();

        for entry in entries {
            summary.solid |= entry.solid;
            summary.encrypted |= entry.encrypted;
            match entry.kind {
                EntryKind::Directory => {
                    summary.directory_count += 1;
                    continue;
                }
                EntryKind::Symlink => {
                    summary.symlink_count += 1;
                    continue;
                }
                EntryKind::File => summary.file_count += 1,
            }

            summary.total_uncompressed_size += entry.uncompressed_size;
            summary.total_compressed_size += entry.compressed_size;
            if !entry.method.is_empty() {
                match methods.iter_mut().find(|(m, _)| *m == entry.method) {
                    Some((_, count)) => *count += 1,
                    None => methods.push((entry.method.as_str(), 1)),
                }
            }
        }

        if summary.total_uncompressed_size > 0 {
            summary.compression_ratio = 1.0
                - summary.total_compressed_size as f64 / summary.total_uncompressed_size as f64;
        }

        summary.dominant_method = if entries.is_empty() {
            EMPTY_METHOD.to_string()
        } else {
            let mut best: Option<(&str, usize)> = None;
            for &(method, count) in &methods {
                if best.is_none_or(|(_, top)| count > top) {
                    best = Some((method, count));
                }
            }
            best.map_or(UNKNOWN_METHOD, |(method, _)| method).to_string()
        };
        summary
    }

    pub fn compression_percentage(&self) -> f64 {
        self.compression_ratio * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
7-Zip (z) 24.08 (x64) : Copyright (c) 1999-2024 Igor Pavlov : 2024-08-11

Scanning the drive for archives:
1 file, 512 bytes (1 KiB)

Listing archive: test.7z

--
Path = test.7z
Type = 7z
Physical Size = 512
Headers Size = 154
Method = LZMA2:19
Solid = +
Blocks = 1

----------
Path = test.txt
Size = 1024
Packed Size = 358
Modified = 2024-01-15 10:30:45
Attributes = A
CRC = 12345678
Encrypted = -
Method = LZMA2:19
Block = 0

----------
Path = folder
Size = 0
Packed Size = 0
Modified = 2024-01-15 10:30:00
Attributes = D
CRC =
Encrypted = -
Method =
Block =
";

    #[test]
    fn parses_sample_listing() {
        let entries = parse_listing(SAMPLE);
        assert_eq!(entries.len(), 2);

        let file = &entries[0];
        assert_eq!(file.filename, "test.txt");
        assert_eq!(file.uncompressed_size, 1024);
        assert_eq!(file.compressed_size, 358);
        assert_eq!(file.method, "LZMA2:19");
        assert_eq!(file.crc32, 0x1234_5678);
        assert_eq!(file.block, Some(0));
        assert!(!file.encrypted);
        assert!(file.is_file());
        assert_eq!(file.modified().unwrap().as_tuple(), (2024, 1, 15, 10, 30, 45));

        let dir = &entries[1];
        assert_eq!(dir.filename, "folder");
        assert!(dir.is_dir());
        assert_eq!(dir.crc32, 0);
        assert_eq!(dir.block, None);
        assert!(dir.validate());
    }

    #[test]
    fn archive_header_is_not_an_entry() {
        let entries = parse_listing(SAMPLE);
        assert!(entries.iter().all(|e| e.filename != "test.7z"));
    }

    #[test]
    fn summary_of_sample() {
        let summary = ArchiveSummary::from_entries(&parse_listing(SAMPLE));
        assert_eq!(summary.file_count, 1);
        assert_eq!(summary.directory_count, 1);
        assert_eq!(summary.total_entry_count, 2);
        assert_eq!(summary.total_uncompressed_size, 1024);
        assert_eq!(summary.total_compressed_size, 358);
        assert!((summary.compression_ratio - 0.6504).abs() < 1e-3);
        assert_eq!(summary.dominant_method, "LZMA2:19");
    }

    #[test]
    fn empty_summary() {
        let summary = ArchiveSummary::from_entries(&[]);
        assert_eq!(summary.total_entry_count, 0);
        assert_eq!(summary.compression_ratio, 0.0);
        assert_eq!(summary.dominant_method, EMPTY_METHOD);
    }

    #[test]
    fn dominant_method_tie_goes_to_first() {
        let entries = vec![
            ArchiveEntry::new("a").with_method("PPMD"),
            ArchiveEntry::new("b").with_method("LZMA2"),
            ArchiveEntry::new("c").with_method("LZMA2"),
            ArchiveEntry::new("d").with_method("PPMD"),
            ArchiveEntry::new("e"),
        ];
        let summary = ArchiveSummary::from_entries(&entries);
        assert_eq!(summary.dominant_method, "PPMD");

        let no_methods = ArchiveSummary::from_entries(&[ArchiveEntry::new("a")]);
        assert_eq!(no_methods.dominant_method, UNKNOWN_METHOD);
    }

    #[test]
    fn empty_values_and_missing_path() {
        let text = "----------\nSize = \nModified = \nAttributes = \n";
        let entries = parse_listing(text);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].filename, "");
        assert_eq!(entries[0].uncompressed_size, 0);
        assert!(entries[0].modified().is_none());
    }

    #[test]
    fn blocks_without_fields_are_skipped() {
        let text = "----------\n\n----------\nPath = a.txt\n----------\n";
        let names: Vec<_> = parse_listing(text).into_iter().map(|e| e.filename).collect();
        assert_eq!(names, ["a.txt"]);
    }

    #[test]
    fn crlf_listing() {
        let text = "----------\r\nPath = dir\\file.txt\r\nSize = 5\r\nAttributes = A\r\n";
        let entries = parse_listing(text);
        assert_eq!(entries[0].filename, "dir\\file.txt");
        assert_eq!(entries[0].uncompressed_size, 5);
    }

    #[test]
    fn preserves_spaces_and_unicode() {
        let text = "----------\nPath = my   file  .txt\n----------\nPath = 文档/ファイル.txt\n----------\nPath = a = b.txt\n";
        let names: Vec<_> = parse_listing(text).into_iter().map(|e| e.filename).collect();
        assert_eq!(names, ["my   file  .txt", "文档/ファイル.txt", "a = b.txt"]);
    }

    #[test]
    fn delimiter_like_names_round_trip() {
        let text = "----------\nPath = ----------.txt\n";
        assert_eq!(parse_listing(text)[0].filename, "----------.txt");
    }

    #[test]
    fn unix_attributes_and_links() {
        let text = "\
----------
Path = bin/tool
Attributes = A -rwxr-xr-x
Host OS = Unix
----------
Path = lib/libfoo.so
Attributes = A lrwxrwxrwx
Symbolic Link = libfoo.so.1
----------
Path = share
Attributes = D drwxr-xr-x
";
        let entries = parse_listing(text);
        assert_eq!(entries[0].unix_mode, Some(0o100755));
        assert_eq!(entries[0].host_os.as_deref(), Some("Unix"));
        assert!(entries[0].is_file());
        assert!(entries[1].is_symlink());
        assert_eq!(entries[1].link_target.as_deref(), Some("libfoo.so.1"));
        assert!(entries[2].is_dir());

        let summary = ArchiveSummary::from_entries(&entries);
        assert_eq!(summary.symlink_count, 1);
        assert_eq!(summary.file_count, 1);
    }

    #[test]
    fn solid_and_encrypted_flags() {
        let text = "----------\nPath = a\nSolid = +\nEncrypted = +\n";
        let entries = parse_listing(text);
        assert!(entries[0].solid);
        assert!(entries[0].encrypted);
        let summary = ArchiveSummary::from_entries(&entries);
        assert!(summary.solid && summary.encrypted);
    }
}
