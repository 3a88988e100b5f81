//! Filename sanitization for filesystems that reject names archives may carry.
//!
//! Rules applied on a constrained target:
//!
//! - control characters and `<>:"/\|?*` become `_`
//! - reserved device stems (`CON`, `COM1`, ...) gain a `_file` suffix
//! - trailing spaces and dots are stripped
//! - `..` segments are neutralized
//! - components longer than 255 characters are shortened with a hash tag
//!
//! On an unconstrained target every function here is a no-op.

use std::collections::{HashMap, HashSet};

use sevenzz_platform::OS;
use sha2::{Digest, Sha256};

use crate::field::has_trailing_separator;

pub const MAX_COMPONENT_LEN: usize = 255;
pub const REPLACEMENT_CHAR: char = '_';
pub const RESERVED_SUFFIX: &str = "_file";
pub const EMPTY_PLACEHOLDER: &str = "unnamed_file";

const FORBIDDEN_CHARS: [char; 9] = ['<', '>', ':', '"', '/', '\\', '|', '?', '*'];
const HASH_TAG_LEN: usize = 8;
// Longer "extensions" are treated as part of the stem when shortening.
const MAX_EXTENSION_LEN: usize = 32;

const RESERVED_NAMES: [&str; 22] = [
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

/// Filesystem naming rules to sanitize against.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TargetPlatform {
    /// Win32 naming rules.
    Windows,
    /// Anything goes except `/` and NUL; nothing is rewritten.
    Unconstrained,
}

impl TargetPlatform {
    pub fn host() -> Self {
        Self::from_os(OS::current())
    }

    pub fn from_os(os: OS) -> Self {
        if os.restricts_filenames() {
            Self::Windows
        } else {
            Self::Unconstrained
        }
    }

    pub fn is_constrained(self) -> bool {
        matches!(self, Self::Windows)
    }
}

impl Default for TargetPlatform {
    fn default() -> Self {
        Self::host()
    }
}

/// Original name to sanitized name, in the order the names were seen.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SanitizationMapping {
    pairs: Vec<(String, String)>,
    index: HashMap<String, usize>,
}

impl SanitizationMapping {
    fn insert(&mut self, original: String, sanitized: String) {
        self.index.insert(original.clone(), self.pairs.len());
        self.pairs.push((original, sanitized));
    }

    pub fn get(&self, original: &str) -> Option<&str> {
        self.index
            .get(original)
            .map(|&i| self.pairs[i].1.as_str())
    }

    pub fn contains_key(&self, original: &str) -> bool {
        self.index.contains_key(original)
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(o, s)| (o.as_str(), s.as_str()))
    }

    pub fn originals(&self) -> impl Iterator<Item = &str> {
        self.pairs.iter().map(|(o, _)| o.as_str())
    }
}

/// Applies the naming rules of one [`TargetPlatform`].
#[derive(Clone, Copy, Debug, Default)]
pub struct Sanitizer {
    target: TargetPlatform,
}

impl Sanitizer {
    pub fn new(target: TargetPlatform) -> Self {
        Self { target }
    }

    pub fn target(&self) -> TargetPlatform {
        self.target
    }

    /// Whether any path component of `name` breaks the target's rules.
    pub fn needs_sanitization(&self, name: &str) -> bool {
        self.target.is_constrained() && components(name).any(component_is_invalid)
    }

    /// Rewrite a single name component. Separators are treated as ordinary
    /// forbidden characters.
    ///
    /// A result already present in `existing` gets a `_N` counter before its
    /// extension, counting up from 1 until unique.
    pub fn sanitize_filename(&self, name: &str, existing: &HashSet<String>) -> (String, bool) {
        if !self.target.is_constrained() {
            return (name.to_string(), false);
        }
        let mut candidate = clean_component(name);
        if existing.contains(&candidate) {
            candidate = with_unique_counter(&candidate, existing);
        }
        let changed = candidate != name;
        (candidate, changed)
    }

    /// Sanitize every component of `path`, dropping empty and `.` components,
    /// and rejoin with `/`.
    ///
    /// Also returns each changed component with its replacement.
    pub fn sanitize_path(&self, path: &str) -> (String, HashMap<String, String>) {
        let mut changes = HashMap::new();
        let mut parts = Vec::new();
        let no_siblings = HashSet::new();

        for component in components(path) {
            let (clean, changed) = self.sanitize_filename(component, &no_siblings);
            if changed {
                changes.insert(component.to_string(), clean.clone());
            }
            parts.push(clean);
        }
        (parts.join("/"), changes)
    }

    /// Build the rename table for a whole listing.
    ///
    /// Only names that need rewriting become keys. Every sanitized value is
    /// distinct from all other values and from the names left untouched.
    pub fn sanitization_mapping<S: AsRef<str>>(&self, names: &[S]) -> SanitizationMapping {
        let mut mapping = SanitizationMapping::default();
        if !self.target.is_constrained() {
            return mapping;
        }

        let mut assigned: HashSet<String> = names
            .iter()
            .map(AsRef::as_ref)
            .filter(|name| !self.needs_sanitization(name))
            .map(normalize_separators)
            .collect();

        // Normalized original path -> assigned path, so members below a
        // renamed directory follow it.
        let mut rewritten: HashMap<String, String> = HashMap::new();

        for name in names.iter().map(AsRef::as_ref) {
            if mapping.contains_key(name) || !self.needs_sanitization(name) {
                continue;
            }
            let normalized = normalize_separators(name);
            let mut candidate = match renamed_ancestor(&normalized, &rewritten) {
                Some((assigned_dir, rest)) => {
                    let (rest, _) = self.sanitize_path(rest);
                    format!("{assigned_dir}/{rest}")
                }
                None => self.sanitize_path(name).0,
            };
            if candidate.is_empty() {
                candidate = EMPTY_PLACEHOLDER.to_string();
            }
            if assigned.contains(&candidate) {
                candidate = with_unique_leaf(&candidate, &assigned);
            }
            assigned.insert(candidate.clone());
            rewritten.insert(normalized, candidate.clone());

            if has_trailing_separator(name) {
                candidate.push('/');
            }
            if candidate != name {
                mapping.insert(name.to_string(), candidate);
            }
        }
        mapping
    }
}

/// [`Sanitizer::needs_sanitization`] for the host platform.
pub fn needs_sanitization(name: &str) -> bool {
    Sanitizer::default().needs_sanitization(name)
}

/// [`Sanitizer::sanitize_filename`] for the host platform.
pub fn sanitize_filename(name: &str, existing: &HashSet<String>) -> (String, bool) {
    Sanitizer::default().sanitize_filename(name, existing)
}

/// [`Sanitizer::sanitize_path`] for the host platform.
pub fn sanitize_path(path: &str) -> (String, HashMap<String, String>) {
    Sanitizer::default().sanitize_path(path)
}

/// [`Sanitizer::sanitization_mapping`] for the host platform.
pub fn get_sanitization_mapping<S: AsRef<str>>(names: &[S]) -> SanitizationMapping {
    Sanitizer::default().sanitization_mapping(names)
}

fn components(path: &str) -> impl Iterator<Item = &str> {
    path.split(['/', '\\'])
        .filter(|c| !c.is_empty() && *c != ".")
}

/// Closest ancestor of `path` already given a new name, with the rest of
/// `path` below it.
fn renamed_ancestor<'a>(
    path: &'a str,
    rewritten: &'a HashMap<String, String>,
) -> Option<(&'a str, &'a str)> {
    path.rmatch_indices('/').find_map(|(i, _)| {
        rewritten
            .get(&path[..i])
            .map(|assigned| (assigned.as_str(), &path[i + 1..]))
    })
}

fn normalize_separators(path: &str) -> String {
    components(path).collect::<Vec<_>>().join("/")
}

fn is_forbidden(c: char) -> bool {
    (c as u32) < 32 || FORBIDDEN_CHARS.contains(&c)
}

fn is_reserved(name: &str) -> bool {
    let stem = name.split('.').next().unwrap_or(name);
    RESERVED_NAMES.iter().any(|r| r.eq_ignore_ascii_case(stem))
}

fn component_is_invalid(component: &str) -> bool {
    component == ".."
        || component.chars().any(is_forbidden)
        || is_reserved(component)
        || component.ends_with([' ', '.'])
        || component.chars().count() > MAX_COMPONENT_LEN
}

fn clean_component(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for (i, segment) in name.split(['/', '\\']).enumerate() {
        if i > 0 {
            out.push(REPLACEMENT_CHAR);
        }
        if segment == ".." {
            out.push(REPLACEMENT_CHAR);
        } else {
            out.extend(
                segment
                    .chars()
                    .map(|c| if is_forbidden(c) { REPLACEMENT_CHAR } else { c }),
            );
        }
    }

    let mut out = out.trim_end_matches([' ', '.']).to_string();
    if out.is_empty() {
        out = EMPTY_PLACEHOLDER.to_string();
    }
    if is_reserved(&out) {
        let split = out.find('.').unwrap_or(out.len());
        out.insert_str(split, RESERVED_SUFFIX);
    }
    if out.chars().count() > MAX_COMPONENT_LEN {
        out = shorten(&out, name);
    }
    out
}

/// Split at the last dot, as long as it is not the first character.
fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(i) if i > 0 && name[i..].chars().count() <= MAX_EXTENSION_LEN => {
            (&name[..i], &name[i..])
        }
        _ => (name, ""),
    }
}

fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((i, _)) => &s[..i],
        None => s,
    }
}

fn shorten(candidate: &str, original: &str) -> String {
    let digest = hex::encode(Sha256::digest(original.as_bytes()));
    let tag = &digest[..HASH_TAG_LEN];
    let (stem, ext) = split_extension(candidate);
    let budget = MAX_COMPONENT_LEN - ext.chars().count() - 1 - HASH_TAG_LEN;
    format!("{}{REPLACEMENT_CHAR}{tag}{ext}", truncate_chars(stem, budget))
}

fn with_counter(stem: &str, ext: &str, n: usize) -> String {
    let suffix = format!("_{n}");
    let budget = MAX_COMPONENT_LEN.saturating_sub(ext.chars().count() + suffix.len());
    format!("{}{suffix}{ext}", truncate_chars(stem, budget))
}

fn with_unique_counter(name: &str, taken: &HashSet<String>) -> String {
    let (stem, ext) = split_extension(name);
    let mut n = 1;
    loop {
        let candidate = with_counter(stem, ext, n);
        if !taken.contains(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

/// Disambiguate the last component of a `/`-joined path against `taken`.
fn with_unique_leaf(path: &str, taken: &HashSet<String>) -> String {
    let (dir, leaf) = match path.rfind('/') {
        Some(i) => path.split_at(i + 1),
        None => ("", path),
    };
    let (stem, ext) = split_extension(leaf);
    let mut n = 1;
    loop {
        let candidate = format!("{dir}{}", with_counter(stem, ext, n));
        if !taken.contains(&candidate) {
            return candidate;
        }
        n += 1;
    }
}
