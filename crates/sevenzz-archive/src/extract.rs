//! Extraction with fallback for names the destination filesystem rejects.
//!
//! 1. Extract directly.
//! 2. If that fails with a filename-related diagnostic on a constrained
//!    target, build a rename table from the listing, extract everything into
//!    a staging directory and move each file to its sanitized name.
//! 3. If the staged extraction fails too, pull members out one at a time.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::entry::ArchiveEntry;
use crate::error::{Error, Result};
use crate::listing::parse_listing;
use crate::options::ExtractOptions;
use crate::runner::Archiver;
use crate::sanitize::{SanitizationMapping, Sanitizer, TargetPlatform};
use crate::workspace::{Placement, Staging, place_file};

/// Diagnostic fragments that indicate the filesystem refused a name.
const FILENAME_ERROR_PATTERNS: [&str; 10] = [
    "cannot create",
    "cannot use name",
    "invalid name",
    "the filename, directory name, or volume label syntax is incorrect",
    "the system cannot find the path specified",
    "cannot find the path",
    "access is denied",
    "filename too long",
    "path too long",
    "illegal characters in name",
];

const REPORTED_FAILURES: usize = 10;
const LOGGED_FAILURES: usize = 5;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExtractionStrategy {
    /// Extracted as-is.
    Direct,
    /// Extracted to staging, then moved under sanitized names.
    StagedRename,
    /// Extracted member by member under sanitized names.
    PerFile,
}

/// What an extraction did.
#[derive(Clone, Debug, PartialEq)]
pub struct ExtractionReport {
    pub strategy: ExtractionStrategy,
    /// Renames applied; empty for [`ExtractionStrategy::Direct`].
    pub renamed: SanitizationMapping,
    /// Files placed by the fallback strategies.
    pub extracted: usize,
    /// Destinations left untouched because they already existed.
    pub skipped: Vec<PathBuf>,
    /// Members that could not be extracted, with the reason.
    pub failed: Vec<(String, String)>,
}

impl ExtractionReport {
    fn direct() -> Self {
        Self {
            strategy: ExtractionStrategy::Direct,
            renamed: SanitizationMapping::default(),
            extracted: 0,
            skipped: Vec::new(),
            failed: Vec::new(),
        }
    }

    fn fallback(strategy: ExtractionStrategy) -> Self {
        Self {
            strategy,
            ..Self::direct()
        }
    }

    pub fn is_sanitized(&self) -> bool {
        self.strategy != ExtractionStrategy::Direct
    }
}

/// Whether an archiver diagnostic means the destination rejected a name.
///
/// Always false on an unconstrained target.
pub fn is_filename_error(diagnostic: &str, target: TargetPlatform) -> bool {
    if !target.is_constrained() {
        return false;
    }
    let lower = diagnostic.to_lowercase();
    FILENAME_ERROR_PATTERNS.iter().any(|p| lower.contains(p))
}

/// Extract `archive` into `dest`, sanitizing names when the destination
/// filesystem refuses them.
pub fn extract_archive_with<A>(
    archiver: &A,
    archive: &Path,
    dest: &Path,
    options: &ExtractOptions,
) -> Result<ExtractionReport>
where
    A: Archiver + ?Sized,
{
    fs::create_dir_all(dest)?;
    let members = options.members.as_deref();

    let source = match archiver.extract(archive, dest, members, options.overwrite) {
        Ok(()) => {
            debug!(archive = %archive.display(), dest = %dest.display(), "extracted directly");
            return Ok(ExtractionReport::direct());
        }
        Err(e) => e,
    };

    let diagnostic = source.diagnostic();
    if !is_filename_error(&diagnostic, options.target) {
        return Err(Error::Extraction { diagnostic, source });
    }

    info!(
        archive = %archive.display(),
        "direct extraction hit a filename error, retrying with sanitized names"
    );
    Fallback {
        archiver,
        archive,
        dest,
        options,
        sanitizer: Sanitizer::new(options.target),
    }
    .run(&diagnostic)
}

struct Fallback<'a, A: ?Sized> {
    archiver: &'a A,
    archive: &'a Path,
    dest: &'a Path,
    options: &'a ExtractOptions,
    sanitizer: Sanitizer,
}

impl<A: Archiver + ?Sized> Fallback<'_, A> {
    fn run(&self, diagnostic: &str) -> Result<ExtractionReport> {
        let listing = self
            .archiver
            .list_detailed(self.archive)
            .map_err(|e| Error::operation("list archive", e))?;
        let entries: Vec<ArchiveEntry> = parse_listing(&listing)
            .into_iter()
            .filter(|e| !e.filename.is_empty() && self.options.selects(&e.filename))
            .collect();
        let names: Vec<&str> = entries.iter().map(|e| e.filename.as_str()).collect();

        let problematic: Vec<String> = names
            .iter()
            .filter(|n| self.sanitizer.needs_sanitization(n))
            .map(|n| n.to_string())
            .collect();
        if problematic.is_empty() {
            return Err(Error::FilenameCompatibility {
                message: format!(
                    "No problematic filenames detected, but extraction failed: {}",
                    diagnostic.trim()
                ),
                problematic,
                sanitized: false,
            });
        }

        let mapping = self.sanitizer.sanitization_mapping(&names);
        if mapping.is_empty() {
            return Err(Error::FilenameCompatibility {
                message: "Unable to generate filename sanitization mapping".to_string(),
                problematic,
                sanitized: false,
            });
        }
        for (original, sanitized) in mapping.iter() {
            warn!("renaming '{original}' -> '{sanitized}'");
        }
        warn!("{} filename(s) will be renamed for compatibility", mapping.len());

        let staging = Staging::new()?;
        match self.archiver.extract(
            self.archive,
            staging.path(),
            self.options.members.as_deref(),
            true,
        ) {
            Ok(()) => self.move_staged(&staging, mapping),
            Err(e) => {
                warn!(
                    error = %e.diagnostic().trim(),
                    "staged extraction failed, extracting files one by one"
                );
                drop(staging);
                let directories: HashSet<&str> = entries
                    .iter()
                    .filter(|e| e.is_dir())
                    .map(|e| e.filename.as_str())
                    .collect();
                self.extract_each(mapping, &directories, problematic)
            }
        }
    }

    fn move_staged(
        &self,
        staging: &Staging,
        mapping: SanitizationMapping,
    ) -> Result<ExtractionReport> {
        // Listings may use `\`; staged paths are always `/`-joined.
        let by_slash: HashMap<String, String> = mapping
            .iter()
            .map(|(original, sanitized)| {
                (
                    original.replace('\\', "/").trim_end_matches('/').to_string(),
                    sanitized.trim_end_matches('/').to_string(),
                )
            })
            .collect();

        let mut report = ExtractionReport::fallback(ExtractionStrategy::StagedRename);
        for staged in staging.entries()? {
            let mapped = by_slash.get(&staged.relative).map(String::as_str);
            if staged.is_dir {
                let target = match mapped {
                    Some(name) => name.to_string(),
                    None => self.sanitizer.sanitize_path(&staged.relative).0,
                };
                if is_empty_dir(&staged.path) {
                    fs::create_dir_all(self.dest.join(target))?;
                }
                continue;
            }

            let target = self.dest.join(mapped.unwrap_or(&staged.relative));
            match place_file(&staged.path, &target, self.options.overwrite)? {
                Placement::Moved => report.extracted += 1,
                Placement::SkippedExisting => report.skipped.push(target),
            }
        }
        report.renamed = mapping;
        info!(
            extracted = report.extracted,
            skipped = report.skipped.len(),
            "extracted with sanitized filenames"
        );
        Ok(report)
    }

    fn extract_each(
        &self,
        mapping: SanitizationMapping,
        directories: &HashSet<&str>,
        problematic: Vec<String>,
    ) -> Result<ExtractionReport> {
        let mut report = ExtractionReport::fallback(ExtractionStrategy::PerFile);

        for (original, sanitized) in mapping.iter() {
            let target = self.dest.join(sanitized.trim_end_matches('/'));
            if directories.contains(original) {
                if let Err(e) = fs::create_dir_all(&target) {
                    report.failed.push((original.to_string(), e.to_string()));
                }
                continue;
            }
            match self.extract_one(original, &target) {
                Ok(Placement::Moved) => report.extracted += 1,
                Ok(Placement::SkippedExisting) => report.skipped.push(target),
                Err(e) => report.failed.push((original.to_string(), e.to_string())),
            }
        }

        for (name, reason) in report.failed.iter().take(LOGGED_FAILURES) {
            warn!("failed to extract '{name}': {reason}");
        }

        // Skipped destinations are not extractions.
        if report.extracted == 0 {
            let failed: Vec<&str> = report
                .failed
                .iter()
                .take(REPORTED_FAILURES)
                .map(|(name, _)| name.as_str())
                .collect();
            let mut message = format!(
                "Unable to extract any files even with sanitization. Failed files: {}",
                failed.join(", ")
            );
            if !report.skipped.is_empty() {
                message.push_str(&format!(
                    " ({} existing destination(s) skipped)",
                    report.skipped.len()
                ));
            }
            return Err(Error::FilenameCompatibility {
                message,
                problematic,
                sanitized: true,
            });
        }

        info!(
            extracted = report.extracted,
            failed = report.failed.len(),
            "extracted files individually with sanitized filenames"
        );
        report.renamed = mapping;
        Ok(report)
    }

    fn extract_one(&self, member: &str, target: &Path) -> Result<Placement> {
        let data = self
            .archiver
            .read_member(self.archive, member)
            .map_err(|e| Error::operation("read member", e))?;
        let mut temp = tempfile::NamedTempFile::new()?;
        temp.write_all(&data)?;
        temp.flush()?;
        let temp = temp.into_temp_path();
        place_file(&temp, target, self.options.overwrite)
    }
}

fn is_empty_dir(path: &Path) -> bool {
    fs::read_dir(path).is_ok_and(|mut entries| entries.next().is_none())
}
