//! Property-based tests for `ls -la` listing parsing

use droidlink_core::parser::parse_listing;
use proptest::prelude::*;

/// Generates a remote directory, with or without a trailing slash
fn arb_directory() -> impl Strategy<Value = String> {
    (prop::collection::vec("[a-z0-9_]{1,8}", 0..4), any::<bool>()).prop_map(
        |(segments, trailing)| {
            let mut dir: String = segments.iter().map(|s| format!("/{s}")).collect();
            if dir.is_empty() || trailing {
                dir.push('/');
            }
            dir
        },
    )
}

/// Generates an entry name without whitespace, never `.` or `..`
fn arb_name() -> impl Strategy<Value = String> {
    prop::string::string_regex("[A-Za-z0-9_][A-Za-z0-9_.-]{0,20}")
        .unwrap()
        .prop_filter("dot entries are skipped", |s| s != "." && s != "..")
}

/// Generates a permission string for a file, directory or link
fn arb_permissions() -> impl Strategy<Value = String> {
    ("[-dl]", "[r-][w-][x-][r-][w-][x-][r-][w-][x-]").prop_map(|(kind, mode)| kind + &mode)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Entry paths join the directory and the name with exactly one slash
    #[test]
    fn entry_path_joins_once(
        dir in arb_directory(),
        name in arb_name(),
        perms in arb_permissions(),
        size in 0u64..10_000_000,
    ) {
        let output = format!("total 8\n{perms} 2 root sdcard_rw {size} Mar 14 09:26 {name}\n");
        let entries = parse_listing(&dir, &output);

        prop_assert_eq!(entries.len(), 1);
        let entry = &entries[0];
        prop_assert_eq!(&entry.path, &format!("{}/{}", dir.trim_end_matches('/'), name));
        prop_assert!(!entry.path.contains("//"));
        prop_assert_eq!(&entry.name, &name);
        prop_assert_eq!(entry.size, size);
        prop_assert_eq!(entry.is_directory, perms.starts_with('d'));
    }

    /// Names with inner spaces survive as a single entry
    #[test]
    fn spaced_names_are_kept_whole(
        first in "[a-z]{1,6}",
        second in "[a-z]{1,6}",
    ) {
        let name = format!("{first} {second}");
        let output = format!("-rw-rw---- 1 u0_a1 u0_a1 12 2024-03-14 09:26 {name}\n");
        let entries = parse_listing("/sdcard", &output);

        prop_assert_eq!(entries.len(), 1);
        prop_assert_eq!(&entries[0].name, &name);
        prop_assert_eq!(&entries[0].path, &format!("/sdcard/{name}"));
    }

    /// Arbitrary text never panics and never yields dot entries
    #[test]
    fn parsing_is_total(output in "\\PC{0,200}(\n\\PC{0,80}){0,5}") {
        let entries = parse_listing("/", &output);
        prop_assert!(entries.iter().all(|e| e.name != "." && e.name != ".."));
    }
}
