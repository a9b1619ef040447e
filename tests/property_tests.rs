//! Property-based tests for the access gate and the patch engine.
//!
//! These tests use proptest to verify invariants hold across
//! randomly generated inputs.

use proptest::prelude::*;

use pagewright::core::types::PageContent;
use pagewright::engine::AccessPolicy;
use pagewright::patch::{apply, parse, ApplyOutcome, Hunk, LineTag, Patch, PatchLine};

/// Strategy for project names.
fn project_name() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9-]{0,12}"
}

/// Strategy for access patterns: plain names, regexes, and invalid regexes
/// that fall back to literal matching.
fn pattern() -> impl Strategy<Value = String> {
    prop_oneof![
        project_name(),
        "[a-z]{1,4}-\\.\\*",
        "[a-z]{1,4}\\.\\*",
        "[a-z]{1,4}\\(",
        "[a-z]{1,4}\\[",
    ]
}

/// Strategy for the text of a single page or patch line.
fn line_text() -> impl Strategy<Value = String> {
    "[a-z0-9 ]{0,12}"
}

fn patch_line() -> impl Strategy<Value = PatchLine> {
    (
        prop_oneof![Just(LineTag::Context), Just(LineTag::Add), Just(LineTag::Remove)],
        line_text(),
    )
        .prop_map(|(tag, text)| PatchLine { tag, text })
}

/// Strategy for structurally valid single-file patches.
fn valid_patch() -> impl Strategy<Value = Patch> {
    prop::collection::vec(prop::collection::vec(patch_line(), 1..8), 1..4).prop_map(|hunks| {
        Patch {
            old_path: "Title".into(),
            new_path: "Title".into(),
            hunks: hunks
                .into_iter()
                .enumerate()
                .map(|(i, lines)| Hunk::from_lines(1 + i * 20, 1 + i * 20, lines))
                .collect(),
        }
    })
}

fn page() -> impl Strategy<Value = PageContent> {
    prop::collection::vec(line_text(), 0..30).prop_map(PageContent::new)
}

// =============================================================================
// Access gate
// =============================================================================

proptest! {
    #[test]
    fn deny_wins_over_any_allow(
        project in project_name(),
        allow in prop::collection::vec(pattern(), 0..5),
        deny in prop::collection::vec(pattern(), 0..5),
    ) {
        // The project itself is always a matching deny pattern.
        let mut deny = deny;
        deny.push(project.clone());
        let mut allow = allow;
        allow.push(".*".to_string());
        allow.push(project.clone());

        let policy = AccessPolicy::new(&allow, &deny);
        prop_assert!(!policy.is_writable(&project));
    }

    #[test]
    fn empty_allow_list_is_never_writable(
        project in project_name(),
        deny in prop::collection::vec(pattern(), 0..5),
    ) {
        let policy = AccessPolicy::new([] as [&str; 0], &deny);
        prop_assert!(!policy.is_writable(&project));
    }

    #[test]
    fn listed_project_is_writable_unless_denied(
        project in project_name(),
        others in prop::collection::vec(project_name(), 0..5),
    ) {
        let mut allow = others.clone();
        allow.push(project.clone());
        let deny: Vec<String> = others.into_iter().filter(|o| o != &project).collect();

        let policy = AccessPolicy::new(&allow, &deny);
        prop_assert!(policy.is_writable(&project));
    }
}

// =============================================================================
// Patch parsing
// =============================================================================

proptest! {
    #[test]
    fn parse_preserves_tags_and_order(patch in valid_patch()) {
        let text = patch.to_string();
        let parsed = parse(&text).unwrap();

        prop_assert_eq!(parsed.hunks.len(), patch.hunks.len());
        for (parsed, original) in parsed.hunks.iter().zip(&patch.hunks) {
            prop_assert_eq!(&parsed.lines, &original.lines);
            prop_assert_eq!(parsed.old, original.old);
            prop_assert_eq!(parsed.new, original.new);
        }
    }

    #[test]
    fn parse_never_panics(raw in "(?s).{0,200}") {
        let _ = parse(&raw);
    }
}

// =============================================================================
// Patch application
// =============================================================================

proptest! {
    #[test]
    fn apply_is_deterministic(current in page(), patch in valid_patch()) {
        prop_assert_eq!(apply(&current, &patch), apply(&current, &patch));
    }

    #[test]
    fn matching_hunk_applies(
        before in prop::collection::vec(line_text(), 0..10),
        context in prop::collection::vec(line_text(), 1..4),
        removed in line_text(),
        added in line_text(),
        after in prop::collection::vec(line_text(), 0..10),
    ) {
        let mut lines = before.clone();
        lines.extend(context.iter().cloned());
        lines.push(removed.clone());
        lines.extend(after.iter().cloned());
        let current = PageContent::new(lines);

        let mut hunk_lines: Vec<PatchLine> = context.iter().map(PatchLine::context).collect();
        hunk_lines.push(PatchLine::remove(removed));
        hunk_lines.push(PatchLine::add(added.clone()));
        let start = before.len() + 1;
        let patch = Patch {
            old_path: "Title".into(),
            new_path: "Title".into(),
            hunks: vec![Hunk::from_lines(start, start, hunk_lines)],
        };

        let ApplyOutcome::Applied { content, changes } = apply(&current, &patch) else {
            return Err(TestCaseError::fail("expected the hunk to apply"));
        };

        let mut expected = before;
        expected.extend(context);
        expected.push(added);
        expected.extend(after);
        prop_assert_eq!(content.lines(), expected.as_slice());
        prop_assert_eq!((changes.added, changes.removed), (1, 1));
    }
}
