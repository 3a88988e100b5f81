//! Parsers for the raw text fields of a technical listing.
//!
//! None of these fail: malformed input degrades to a default so one corrupt
//! entry never aborts a whole listing.

use chrono::{Datelike, Local, NaiveDate, NaiveDateTime, TimeZone, Timelike};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::entry::EntryKind;

pub const ATTR_READONLY: u32 = 0x01;
pub const ATTR_HIDDEN: u32 = 0x02;
pub const ATTR_SYSTEM: u32 = 0x04;
pub const ATTR_DIRECTORY: u32 = 0x10;
pub const ATTR_ARCHIVE: u32 = 0x20;

const S_IFMT: u32 = 0o170000;
const S_IFDIR: u32 = 0o040000;
const S_IFREG: u32 = 0o100000;
const S_IFLNK: u32 = 0o120000;

static DATETIME_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?<year>\d{4})[-/](?<month>\d{1,2})[-/](?<day>\d{1,2})(?:[ T](?<hour>\d{1,2}):(?<minute>\d{2})(?::(?<second>\d{2})(?:\.\d+)?)?)?$",
    )
    .unwrap()
});

/// Broken-down modification time, as stored in zip-style entry records.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct DateTimeTuple {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
}

impl DateTimeTuple {
    pub const MIN_YEAR: i32 = 1980;
    pub const MAX_YEAR: i32 = 2107;

    pub fn new(year: i32, month: u32, day: u32, hour: u32, minute: u32, second: u32) -> Self {
        Self {
            year,
            month,
            day,
            hour,
            minute,
            second,
        }
    }

    pub fn as_tuple(&self) -> (i32, u32, u32, u32, u32, u32) {
        (
            self.year,
            self.month,
            self.day,
            self.hour,
            self.minute,
            self.second,
        )
    }

    /// Calendar-valid and inside the zip-representable year range.
    pub fn is_valid(&self) -> bool {
        (Self::MIN_YEAR..=Self::MAX_YEAR).contains(&self.year) && self.to_naive().is_some()
    }

    pub fn to_naive(&self) -> Option<NaiveDateTime> {
        NaiveDate::from_ymd_opt(self.year, self.month, self.day)?
            .and_hms_opt(self.hour, self.minute, self.second)
    }

    /// POSIX seconds of this wall-clock time in the local timezone.
    pub fn to_local_epoch(&self) -> Option<f64> {
        let naive = self.to_naive()?;
        // Wall-clock times skipped by a DST jump resolve to the next valid instant.
        let local = Local
            .from_local_datetime(&naive)
            .earliest()
            .or_else(|| {
                Local
                    .from_local_datetime(&(naive + chrono::Duration::hours(1)))
                    .earliest()
            })?;
        Some(local.timestamp() as f64 + f64::from(local.timestamp_subsec_nanos()) / 1e9)
    }

    /// Local wall-clock fields of a POSIX timestamp; sub-second part dropped.
    pub fn from_local_epoch(epoch: f64) -> Option<Self> {
        if !epoch.is_finite() {
            return None;
        }
        let secs = epoch.floor() as i64;
        let local = Local.timestamp_opt(secs, 0).single()?;
        Some(Self::new(
            local.year(),
            local.month(),
            local.day(),
            local.hour(),
            local.minute(),
            local.second(),
        ))
    }
}

impl From<(i32, u32, u32, u32, u32, u32)> for DateTimeTuple {
    fn from(t: (i32, u32, u32, u32, u32, u32)) -> Self {
        Self::new(t.0, t.1, t.2, t.3, t.4, t.5)
    }
}

/// Parse an unsigned integer in `radix`, returning `default` on any failure.
///
/// Empty text, fractional values and signs all count as failures. Base-16
/// input may carry a `0x` prefix.
pub fn parse_integer(raw: &str, radix: u32, default: u64) -> u64 {
    let text = raw.trim();
    let text = if radix == 16 {
        text.strip_prefix("0x")
            .or_else(|| text.strip_prefix("0X"))
            .unwrap_or(text)
    } else {
        text
    };
    if text.is_empty() || text.starts_with('+') {
        return default;
    }
    u64::from_str_radix(text, radix).unwrap_or(default)
}

/// Parse a listing timestamp into its fields and local epoch seconds.
///
/// Accepts `YYYY-MM-DD`, `YYYY-MM-DD HH:MM[:SS[.fraction]]` and the same
/// with `/` as date separator. Fractions are truncated. Returns
/// `(None, None)` for anything else, including impossible dates.
pub fn parse_datetime(raw: &str) -> (Option<DateTimeTuple>, Option<f64>) {
    let Some(caps) = DATETIME_REGEX.captures(raw.trim()) else {
        return (None, None);
    };
    let num = |name: &str| caps.name(name).map_or(Some(0), |m| m.as_str().parse::<u32>().ok());

    let (Some(month), Some(day), Some(hour), Some(minute), Some(second)) = (
        num("month"),
        num("day"),
        num("hour"),
        num("minute"),
        num("second"),
    ) else {
        return (None, None);
    };
    let Ok(year) = caps["year"].parse::<i32>() else {
        return (None, None);
    };

    let fields = DateTimeTuple::new(year, month, day, hour, minute, second);
    match fields.to_local_epoch() {
        Some(epoch) => (Some(fields), Some(epoch)),
        None => (None, None),
    }
}

/// Parse an epoch-only view of a listing timestamp (`Created`, `Accessed`).
pub fn parse_epoch(raw: &str) -> Option<f64> {
    parse_datetime(raw).1
}

/// Fold attribute letters into a Windows attribute bitmask.
///
/// Only the first whitespace-separated token is read; listings of Unix
/// archives append a mode string such as `-rw-r--r--` after the letters.
pub fn parse_attribute_flags(raw: &str) -> u32 {
    let letters = raw.split_whitespace().next().unwrap_or("");
    letters.chars().fold(0, |acc, c| {
        acc | match c {
            'R' => ATTR_READONLY,
            'H' => ATTR_HIDDEN,
            'S' => ATTR_SYSTEM,
            'D' => ATTR_DIRECTORY,
            'A' => ATTR_ARCHIVE,
            _ => 0,
        }
    })
}

/// Decode an `ls -l` style mode string (`drwxr-xr-x`) carried in the
/// attribute field into `st_mode` bits.
pub fn parse_unix_mode(raw: &str) -> Option<u32> {
    let mode = raw
        .split_whitespace()
        .find(|token| token.len() == 10 && token.is_ascii())?;
    let bytes = mode.as_bytes();

    let file_type = match bytes[0] {
        b'-' => S_IFREG,
        b'd' => S_IFDIR,
        b'l' => S_IFLNK,
        _ => return None,
    };

    let mut perms = 0u32;
    for (i, &b) in bytes[1..].iter().enumerate() {
        let expected = b"rwxrwxrwx"[i];
        let bit = 1 << (8 - i);
        match b {
            b'-' => {}
            b if b == expected => perms |= bit,
            b's' | b'S' if i == 2 || i == 5 => {
                perms |= if i == 2 { 0o4000 } else { 0o2000 };
                if b == b's' {
                    perms |= bit;
                }
            }
            b't' | b'T' if i == 8 => {
                perms |= 0o1000;
                if b == b't' {
                    perms |= bit;
                }
            }
            _ => return None,
        }
    }
    Some(file_type | perms)
}

pub(crate) fn mode_is_dir(mode: u32) -> bool {
    mode & S_IFMT == S_IFDIR
}

pub(crate) fn mode_is_symlink(mode: u32) -> bool {
    mode & S_IFMT == S_IFLNK
}

/// Whether `name` ends with a path separator.
pub fn has_trailing_separator(name: &str) -> bool {
    name.ends_with('/') || name.ends_with('\\')
}

/// Classify an entry from its attribute field and name.
///
/// Directory wins over link: a directory attribute or trailing separator
/// makes a directory; a `->` arrow (leading, or ` -> ` inside the name) makes
/// a link; everything else is a file.
pub fn classify_entry_type(attributes: &str, name: &str) -> EntryKind {
    if parse_attribute_flags(attributes) & ATTR_DIRECTORY != 0 || has_trailing_separator(name) {
        EntryKind::Directory
    } else if name.starts_with("->") || name.contains(" -> ") {
        EntryKind::Symlink
    } else {
        EntryKind::File
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_integer_valid() {
        assert_eq!(parse_integer("123", 10, 0), 123);
        assert_eq!(parse_integer("0", 10, 0), 0);
        assert_eq!(parse_integer("ABCD", 16, 0), 0xABCD);
        assert_eq!(parse_integer("ff", 16, 0), 255);
        assert_eq!(parse_integer("0x1F", 16, 0), 31);
        assert_eq!(parse_integer(" 42 ", 10, 0), 42);
    }

    #[test]
    fn parse_integer_invalid() {
        assert_eq!(parse_integer("", 10, 0), 0);
        assert_eq!(parse_integer("invalid", 10, 0), 0);
        assert_eq!(parse_integer("123.45", 10, 0), 0);
        assert_eq!(parse_integer("-5", 10, 7), 7);
        assert_eq!(parse_integer("+5", 10, 7), 7);
        assert_eq!(parse_integer("", 10, 42), 42);
        assert_eq!(parse_integer("invalid", 10, 99), 99);
    }

    #[test]
    fn parse_datetime_standard() {
        let (fields, epoch) = parse_datetime("2024-01-15 10:30:45");
        assert_eq!(fields.unwrap().as_tuple(), (2024, 1, 15, 10, 30, 45));

        let back = DateTimeTuple::from_local_epoch(epoch.unwrap()).unwrap();
        assert_eq!(back, fields.unwrap());
    }

    #[test]
    fn parse_datetime_variants() {
        let date_only = parse_datetime("2024-01-15").0.unwrap();
        assert_eq!(date_only.as_tuple(), (2024, 1, 15, 0, 0, 0));

        let fractional = parse_datetime("2024-01-15 10:30:45.1234567").0.unwrap();
        assert_eq!(fractional.as_tuple(), (2024, 1, 15, 10, 30, 45));

        let slashes = parse_datetime("2024/01/15 10:30:45").0.unwrap();
        assert_eq!(slashes.as_tuple(), (2024, 1, 15, 10, 30, 45));
    }

    #[test]
    fn parse_datetime_fractional_truncates_epoch() {
        let whole = parse_datetime("2024-01-15 10:30:45").1.unwrap();
        let fractional = parse_datetime("2024-01-15 10:30:45.999").1.unwrap();
        assert_eq!(whole, fractional);
    }

    #[test]
    fn parse_datetime_invalid() {
        assert_eq!(parse_datetime(""), (None, None));
        assert_eq!(parse_datetime("invalid"), (None, None));
        assert_eq!(parse_datetime("2024-13-01 10:30:45"), (None, None));
        assert_eq!(parse_datetime("2023-02-29"), (None, None));
        assert_eq!(parse_datetime("2024-01-15 25:00:00"), (None, None));
    }

    #[test]
    fn attribute_flags() {
        assert_eq!(parse_attribute_flags("A"), 0x20);
        assert_eq!(parse_attribute_flags("D"), 0x10);
        assert_eq!(parse_attribute_flags("RA"), 0x21);
        assert_eq!(parse_attribute_flags("DA") & 0x30, 0x30);
        assert_eq!(parse_attribute_flags(""), 0);
        assert_eq!(parse_attribute_flags("X"), 0);
        assert_eq!(parse_attribute_flags("A -rw-r--r--"), ATTR_ARCHIVE);
    }

    #[test]
    fn unix_mode_strings() {
        assert_eq!(parse_unix_mode("A -rw-r--r--"), Some(0o100644));
        assert_eq!(parse_unix_mode("D drwxr-xr-x"), Some(0o040755));
        assert_eq!(parse_unix_mode("A lrwxrwxrwx"), Some(0o120777));
        assert_eq!(parse_unix_mode("A -rwsr-xr-x"), Some(0o104755));
        assert_eq!(parse_unix_mode("A"), None);
        assert_eq!(parse_unix_mode(""), None);
    }

    #[test]
    fn classify() {
        assert_eq!(classify_entry_type("A", "file.txt"), EntryKind::File);
        assert_eq!(classify_entry_type("D", "dirname"), EntryKind::Directory);
        assert_eq!(classify_entry_type("A", "dirname/"), EntryKind::Directory);
        assert_eq!(classify_entry_type("A", "link -> target"), EntryKind::Symlink);
        assert_eq!(classify_entry_type("A", "-> target"), EntryKind::Symlink);
        assert_eq!(classify_entry_type("A", "a->b.txt"), EntryKind::File);
    }

    #[test]
    fn tuple_validity() {
        assert!(DateTimeTuple::new(2024, 1, 15, 10, 30, 45).is_valid());
        assert!(!DateTimeTuple::new(1979, 1, 15, 10, 30, 45).is_valid());
        assert!(!DateTimeTuple::new(2108, 1, 15, 10, 30, 45).is_valid());
        assert!(!DateTimeTuple::new(2024, 2, 30, 0, 0, 0).is_valid());
        assert!(!DateTimeTuple::new(2024, 1, 15, 10, 30, 60).is_valid());
    }
}
