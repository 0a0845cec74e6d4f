//! Property-based tests for core security validation.
//!
//! These tests use proptest to generate arbitrary inputs and verify
//! security properties hold across a wide range of cases.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use proptest::prelude::*;
use safex_core::ExtractionError;
use safex_core::SecurityConfig;
use safex_core::copy::CopyBuffer;
use safex_core::copy::copy_with_budget;
use safex_core::security::ByteBudget;
use safex_core::security::is_path_safe;
use safex_core::security::validate_entry_path;
use safex_core::security::validate_path;
use safex_core::types::DestDir;
use safex_core::types::SafePath;
use safex_core::types::SafeSymlink;
use tempfile::TempDir;

fn create_test_dest() -> (TempDir, DestDir) {
    let temp = TempDir::new().expect("failed to create temp dir");
    let dest = DestDir::new(temp.path()).expect("failed to create dest");
    (temp, dest)
}

proptest! {
    /// Any path with a `..` component should be rejected.
    #[test]
    fn prop_parent_traversal_rejected(
        prefix in "([a-z]+[/\\\\]){0,5}",
        suffix in "([a-z]+/?){0,5}"
    ) {
        let path = format!("{prefix}../{suffix}");
        prop_assert!(!validate_entry_path(&path), "path with .. accepted: {path}");
    }

    /// Absolute paths should be rejected in both separator styles.
    #[test]
    fn prop_absolute_rejected(
        components in prop::collection::vec("[a-zA-Z0-9_.-]{1,20}", 0..5),
        separator in prop::sample::select(vec!["/", "\\"])
    ) {
        let path = format!("{separator}{}", components.join("/"));
        prop_assert!(!validate_entry_path(&path), "absolute path accepted: {path}");
    }

    /// Drive-letter prefixes should be rejected.
    #[test]
    fn prop_drive_letter_rejected(
        drive in "[a-zA-Z]",
        rest in "([a-z]+/){0,3}[a-z]+"
    ) {
        let path = format!("{drive}:/{rest}");
        prop_assert!(!validate_entry_path(&path));
    }

    /// Outside Windows a drive-like name is only refused in first position.
    #[test]
    #[cfg(not(windows))]
    fn prop_drive_like_later_component_accepted(
        head in "[a-z]{1,8}",
        drive in "[a-zA-Z]",
        rest in "[a-z]{0,8}"
    ) {
        let path = format!("{head}/{drive}:{rest}");
        prop_assert!(validate_entry_path(&path), "later component rejected: {path}");
    }

    /// Well-formed relative paths should be accepted.
    #[test]
    fn prop_valid_relative_paths_accepted(
        components in prop::collection::vec("[a-zA-Z0-9_-]{1,20}", 1..5)
    ) {
        let path = components.join("/");
        prop_assert!(validate_entry_path(&path), "valid path rejected: {path}");
    }

    /// Paths over the configured length should be rejected.
    #[test]
    fn prop_length_limit_enforced(limit in 1usize..64, extra in 1usize..16) {
        let config = SecurityConfig {
            max_path_length: limit,
            ..SecurityConfig::default()
        };
        let ok = "a".repeat(limit);
        let long = "a".repeat(limit + extra);
        prop_assert!(validate_path(&ok, &config).is_ok());
        let rejected = matches!(
            validate_path(&long, &config),
            Err(ExtractionError::InvalidPath { .. })
        );
        prop_assert!(rejected);
    }

    /// Accepted paths normalize to a relative path without `..`.
    #[test]
    fn prop_normalized_paths_stay_relative(
        components in prop::collection::vec("(\\.|[a-z]{1,8})", 1..6)
    ) {
        let raw = components.join("/");
        let safe = SafePath::parse(&raw, 4096).unwrap();
        prop_assert!(safe.as_path().is_relative());
        prop_assert!(
            safe.as_path()
                .components()
                .all(|c| matches!(c, std::path::Component::Normal(_)))
        );
    }

    /// A resolved path under the root is safe; a sibling sharing the
    /// root's prefix is not.
    #[test]
    fn prop_boundary_prefix(
        root in "/[a-z]{1,8}",
        sibling_suffix in "[a-z-]{1,8}",
        tail in "[a-z]{1,8}"
    ) {
        let with_separator = format!("{root}/");
        let inside = format!("{root}/{tail}");
        let sibling = format!("{root}{sibling_suffix}/{tail}");
        prop_assert!(is_path_safe(&inside, &with_separator));
        prop_assert!(!is_path_safe(&sibling, &with_separator));
        prop_assert!(!is_path_safe(&root, &with_separator));
    }

    /// `add_bytes` fails exactly on the call that crosses the total limit,
    /// and the counter equals the true sum of charged bytes.
    #[test]
    fn prop_budget_total_crossing(
        chunks in prop::collection::vec(1u64..1000, 1..50),
        limit in 1u64..20_000
    ) {
        let mut budget = ByteBudget::new(0, limit);
        let mut sum = 0u64;

        for chunk in &chunks {
            sum += chunk;
            let result = budget.add_bytes(*chunk);
            if sum > limit {
                let crossed = matches!(result, Err(ExtractionError::TotalTooLarge { .. }));
                prop_assert!(crossed);
                break;
            }
            prop_assert!(result.is_ok());
        }

        prop_assert_eq!(budget.total_bytes(), sum);
    }

    /// `current_entry_bytes` counts only bytes since the last `start_entry`.
    #[test]
    fn prop_budget_entry_counter_resets(
        entries in prop::collection::vec(prop::collection::vec(0u64..500, 0..10), 1..10)
    ) {
        let mut budget = ByteBudget::new(0, 0);
        let mut total = 0u64;

        for chunks in &entries {
            budget.start_entry();
            for chunk in chunks {
                budget.add_bytes(*chunk).unwrap();
            }
            let entry_sum: u64 = chunks.iter().sum();
            total += entry_sum;
            prop_assert_eq!(budget.current_entry_bytes(), entry_sum);
        }

        prop_assert_eq!(budget.total_bytes(), total);
    }

    /// Declared sizes at the entry limit pass; one byte more does not.
    #[test]
    fn prop_declared_size_boundary(max in 1u64..1_000_000) {
        let budget = ByteBudget::new(max, 0);
        prop_assert!(budget.add_entry_size(max).is_ok());
        let rejected = matches!(
            budget.add_entry_size(max + 1),
            Err(ExtractionError::EntryTooLarge { size, max: m }) if size == max + 1 && m == max
        );
        prop_assert!(rejected);
    }

    /// Negative signed limits behave as unlimited.
    #[test]
    fn prop_signed_limits_clamped(limit in i64::MIN..0, chunk in 0u64..u64::from(u32::MAX)) {
        let mut budget = ByteBudget::from_signed(limit, limit);
        prop_assert!(budget.add_entry_size(chunk).is_ok());
        prop_assert!(budget.add_bytes(chunk).is_ok());
    }

    /// Copying never writes past the entry limit.
    #[test]
    fn prop_copy_respects_entry_limit(
        data in prop::collection::vec(any::<u8>(), 0..200_000),
        limit in 1u64..150_000
    ) {
        let mut budget = ByteBudget::new(limit, 0);
        let mut buffer = CopyBuffer::new();
        let mut output = Vec::new();

        let result = copy_with_budget(&mut &data[..], &mut output, &mut budget, &mut buffer);

        prop_assert!(output.len() as u64 <= limit);
        if data.len() as u64 <= limit {
            prop_assert_eq!(result.unwrap(), data.len() as u64);
            prop_assert_eq!(&output, &data);
        } else {
            let rejected = matches!(result, Err(ExtractionError::EntryTooLarge { .. }));
            prop_assert!(rejected);
        }
    }

    /// Symlink targets that climb above the root are always rejected.
    #[test]
    fn prop_symlink_escape_detection(
        depth in 0usize..4,
        extra in 1usize..4,
        name in "[a-z]{1,8}"
    ) {
        let (_temp, dest) = create_test_dest();
        let config = SecurityConfig::default().with_symlinks(true);

        let mut link = vec!["d"; depth];
        link.push("link");
        let link = SafePath::parse(&link.join("/"), 4096).unwrap();
        let parent = dest.join(link.as_path().parent().unwrap());
        let target = format!("{}{name}", "../".repeat(depth + extra));

        let result = SafeSymlink::validate(&link, &target, &parent, &dest, &config);
        let rejected = matches!(result, Err(ExtractionError::BoundaryEscape { .. }));
        prop_assert!(rejected, "escaping target accepted: {target}");
    }

    /// Symlinks are refused whatever the target when disabled.
    #[test]
    fn prop_symlink_disabled_always_rejected(target in "[a-z./]{1,20}") {
        let (_temp, dest) = create_test_dest();
        let config = SecurityConfig::default();
        let link = SafePath::parse("link", 4096).unwrap();

        let result = SafeSymlink::validate(&link, &target, dest.as_path(), &dest, &config);
        prop_assert!(result.is_err());
    }
}
