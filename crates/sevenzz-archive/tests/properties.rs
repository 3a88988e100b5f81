use std::collections::HashSet;

use proptest::prelude::*;
use sevenzz_archive::{ArchiveEntry, Sanitizer, TargetPlatform, parse_listing};

fn windows() -> Sanitizer {
    Sanitizer::new(TargetPlatform::Windows)
}

fn awkward_name() -> impl Strategy<Value = String> {
    prop::string::string_regex(r#"[a-zA-Z0-9 ._<>:"|?*\\/\x01-]{0,40}|(CON|aux|Lpt1|nul)(\.[a-z]{1,3})?|[a-z]{250,270}(\.txt)?"#)
        .unwrap()
}

proptest! {
    #[test]
    fn sanitize_filename_is_idempotent(name in awkward_name()) {
        let s = windows();
        let none = HashSet::new();
        let (once, _) = s.sanitize_filename(&name, &none);
        let (twice, changed) = s.sanitize_filename(&once, &none);
        prop_assert_eq!(&twice, &once);
        prop_assert!(!changed);
        prop_assert!(!s.needs_sanitization(&once));
    }

    #[test]
    fn sanitize_filename_noop_when_unconstrained(name in any::<String>()) {
        let s = Sanitizer::new(TargetPlatform::Unconstrained);
        let (out, changed) = s.sanitize_filename(&name, &HashSet::new());
        prop_assert_eq!(out, name);
        prop_assert!(!changed);
    }

    #[test]
    fn sanitized_names_fit_length_limit(name in awkward_name()) {
        let (out, _) = windows().sanitize_filename(&name, &HashSet::new());
        prop_assert!(out.chars().count() <= 255);
        prop_assert!(!out.is_empty());
    }

    #[test]
    fn mapping_values_are_distinct(names in prop::collection::vec(awkward_name(), 0..20)) {
        let mapping = windows().sanitization_mapping(&names);
        let mut seen = HashSet::new();
        for (original, sanitized) in mapping.iter() {
            prop_assert_ne!(original, sanitized);
            prop_assert!(seen.insert(sanitized.to_string()), "duplicate value {}", sanitized);
        }
    }

    #[test]
    fn compression_ratio_in_unit_interval(unpacked in 1u64..u64::MAX / 2, fraction in 0.0f64..=1.0) {
        let packed = (unpacked as f64 * fraction) as u64;
        let ratio = ArchiveEntry::new("a").with_sizes(unpacked, packed.min(unpacked)).compression_ratio();
        prop_assert!((0.0..=1.0).contains(&ratio));
    }

    #[test]
    fn interior_spaces_survive_parsing(spaces in 1usize..12, stem in "[a-z]{1,8}") {
        let name = format!("{stem}{}end.txt", " ".repeat(spaces));
        let text = format!("----------\nPath = {name}\nSize = 3\nAttributes = A\n");
        let entries = parse_listing(&text);
        prop_assert_eq!(entries.len(), 1);
        prop_assert_eq!(&entries[0].filename, &name);
    }

    #[test]
    fn parsing_is_deterministic(names in prop::collection::vec("[a-z/]{1,12}", 1..10)) {
        let text: String = names
            .iter()
            .map(|n| format!("----------\nPath = {n}\nSize = 10\nPacked Size = 4\nAttributes = A\n"))
            .collect();
        let first = parse_listing(&text);
        let second = parse_listing(&text);
        prop_assert_eq!(&first, &second);
        let parsed: Vec<&str> = first.iter().map(|e| e.filename.as_str()).collect();
        let expected: Vec<&str> = names.iter().map(String::as_str).collect();
        prop_assert_eq!(parsed, expected);
        for entry in &first {
            prop_assert_eq!(entry.is_dir(), entry.filename.ends_with('/'));
        }
    }
}
