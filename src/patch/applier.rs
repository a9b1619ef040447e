//! patch::applier
//!
//! Applies a [`Patch`] to a page, or explains why it cannot.
//!
//! # Semantics
//!
//! Hunks are applied in order. For each hunk, its context and remove lines
//! must appear as one contiguous run in the current content, at or after the
//! end of the previous hunk's match. The search starts at the position the
//! hunk header declares (shifted by the drift observed on earlier hunks) and
//! widens one line at a time in both directions, up to [`SEARCH_WINDOW`]
//! lines away. Add lines are inserted in place, remove lines are dropped,
//! context lines pass through.
//!
//! If any hunk cannot be located, nothing is applied and a
//! [`ConflictReport`] is produced.
//!
//! # Diagnostics
//!
//! The report checks every context line of every hunk for existence anywhere
//! in the current content and lists the absent ones as
//! `Expected context line not found: "<text>"`. The check is file-wide, not
//! hunk-local: a context line that exists elsewhere in the page is not
//! reported even if it is missing at the hunk's position.
//!
//! # Invariants
//!
//! - Application is all-or-nothing
//! - The result is a pure function of the current content and the patch

use serde::Serialize;
use thiserror::Error;

use super::{ChangeSummary, Hunk, Patch};
use crate::core::types::PageContent;

/// Maximum distance, in lines, between a hunk's expected position and the
/// position where it is accepted.
pub const SEARCH_WINDOW: usize = 100;

/// Result of applying a patch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// Every hunk was located and applied.
    Applied {
        content: PageContent,
        changes: ChangeSummary,
    },
    /// At least one hunk could not be located; nothing was applied.
    Conflict(ConflictReport),
}

/// Why a patch could not be applied.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
pub struct ConflictReport {
    /// 1-based index of the first hunk that could not be located.
    pub failed_hunk: usize,
    /// Total number of hunks in the patch.
    pub hunk_count: usize,
    /// Header of the failed hunk.
    pub header: String,
    /// Mismatch descriptions, in patch order.
    pub diagnostics: Vec<String>,
}

impl ConflictReport {
    fn new(patch: &Patch, current: &PageContent, failed: usize) -> Self {
        let diagnostics = patch
            .context_lines()
            .filter(|line| !current.contains_line(line))
            .map(|line| format!("Expected context line not found: \"{line}\""))
            .collect();

        Self {
            failed_hunk: failed + 1,
            hunk_count: patch.hunks.len(),
            header: patch.hunks[failed].header(),
            diagnostics,
        }
    }

    /// Human-readable conflict message ending with a remediation step.
    pub fn render(&self) -> String {
        let mut out = format!(
            "Failed to apply patch: hunk {} of {} ({}) does not match the current page content.\n",
            self.failed_hunk, self.hunk_count, self.header
        );
        for diagnostic in &self.diagnostics {
            out.push_str(diagnostic);
            out.push('\n');
        }
        out.push_str(
            "The page may have changed since the patch was generated (stale content), \
             or the patch may differ from the page in whitespace or line endings.\n",
        );
        out.push_str("Re-fetch the current page content and regenerate the patch against it.");
        out
    }
}

impl std::fmt::Display for ConflictReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.render())
    }
}

/// Apply `patch` to `current`.
///
/// # Example
///
/// ```
/// use pagewright::core::types::PageContent;
/// use pagewright::patch::{apply, parse, ApplyOutcome};
///
/// let patch = parse("--- a/T\n+++ b/T\n@@ -1,2 +1,2 @@\n T\n-line9\n+line10\n").unwrap();
/// let current = PageContent::from(["T", "line1"]);
///
/// let ApplyOutcome::Conflict(report) = apply(&current, &patch) else {
///     panic!("expected conflict");
/// };
/// assert_eq!(report.failed_hunk, 1);
/// ```
pub fn apply(current: &PageContent, patch: &Patch) -> ApplyOutcome {
    let source = current.lines();
    let mut output: Vec<String> = Vec::with_capacity(source.len());
    let mut cursor = 0usize;
    let mut drift = 0isize;

    for (index, hunk) in patch.hunks.iter().enumerate() {
        let old: Vec<&str> = hunk.old_lines().collect();
        let declared = declared_position(hunk);
        let expected = clamp(declared as isize + drift, cursor, source.len());

        let Some(found) = locate(source, &old, expected, cursor) else {
            return ApplyOutcome::Conflict(ConflictReport::new(patch, current, index));
        };

        output.extend(source[cursor..found].iter().cloned());
        output.extend(hunk.new_lines().map(str::to_string));
        cursor = found + old.len();
        drift = found as isize - declared as isize;
    }
    output.extend(source[cursor..].iter().cloned());

    ApplyOutcome::Applied {
        content: PageContent::new(output),
        changes: patch.change_summary(),
    }
}

/// 0-based index where the hunk's old lines are expected to start.
///
/// A hunk with no old lines inserts *after* line `start`, so its index is
/// `start` itself; otherwise `start` is the 1-based first old line.
fn declared_position(hunk: &Hunk) -> usize {
    if hunk.old_lines().next().is_none() {
        hunk.old.start
    } else {
        hunk.old.start.saturating_sub(1)
    }
}

fn clamp(value: isize, low: usize, high: usize) -> usize {
    if value < low as isize {
        low
    } else if value > high as isize {
        high
    } else {
        value as usize
    }
}

/// Find the start of `old` in `source`, nearest to `expected` first.
fn locate(source: &[String], old: &[&str], expected: usize, floor: usize) -> Option<usize> {
    if old.is_empty() {
        return Some(expected);
    }

    let matches_at = |start: usize| {
        start >= floor
            && start + old.len() <= source.len()
            && source[start..start + old.len()]
                .iter()
                .zip(old)
                .all(|(have, want)| have == want)
    };

    for distance in 0..=SEARCH_WINDOW {
        let forward = expected + distance;
        if matches_at(forward) {
            return Some(forward);
        }
        if distance > 0 {
            if let Some(backward) = expected.checked_sub(distance) {
                if matches_at(backward) {
                    return Some(backward);
                }
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patch::{parse, PatchLine};

    fn page(lines: &[&str]) -> PageContent {
        PageContent::from(lines)
    }

    fn applied(outcome: ApplyOutcome) -> (Vec<String>, ChangeSummary) {
        match outcome {
            ApplyOutcome::Applied { content, changes } => (content.into_lines(), changes),
            ApplyOutcome::Conflict(report) => panic!("unexpected conflict: {report}"),
        }
    }

    fn conflict(outcome: ApplyOutcome) -> ConflictReport {
        match outcome {
            ApplyOutcome::Conflict(report) => report,
            ApplyOutcome::Applied { content, .. } => {
                panic!("unexpected success: {:?}", content.lines())
            }
        }
    }

    #[test]
    fn replaces_a_line() {
        let patch = parse(
            "--- a/Title\n+++ b/Title\n@@ -1,3 +1,3 @@\n Title\n-line1\n+line1 edited\n line2\n",
        )
        .unwrap();
        let (lines, changes) = applied(apply(&page(&["Title", "line1", "line2"]), &patch));
        assert_eq!(lines, vec!["Title", "line1 edited", "line2"]);
        assert_eq!(changes, ChangeSummary { added: 1, removed: 1 });
    }

    #[test]
    fn tolerates_offset_from_declared_position() {
        let patch = parse("--- a/T\n+++ b/T\n@@ -2,2 +2,2 @@\n b\n-c\n+C\n").unwrap();
        let current = page(&["T", "new1", "new2", "a", "b", "c", "d"]);
        let (lines, _) = applied(apply(&current, &patch));
        assert_eq!(lines, vec!["T", "new1", "new2", "a", "b", "C", "d"]);
    }

    #[test]
    fn prefers_match_nearest_to_declared_position() {
        let patch = parse("--- a/T\n+++ b/T\n@@ -5,1 +5,1 @@\n-x\n+y\n").unwrap();
        let current = page(&["T", "x", "a", "b", "x", "c"]);
        let (lines, _) = applied(apply(&current, &patch));
        assert_eq!(lines, vec!["T", "x", "a", "b", "y", "c"]);
    }

    #[test]
    fn applies_multiple_hunks_with_drift() {
        let raw = "--- a/T\n+++ b/T\n\
                   @@ -1,2 +1,4 @@\n T\n+i1\n+i2\n a\n\
                   @@ -4,2 +6,1 @@\n c\n-d\n";
        let patch = parse(raw).unwrap();
        let current = page(&["T", "a", "b", "c", "d", "e"]);
        let (lines, changes) = applied(apply(&current, &patch));
        assert_eq!(lines, vec!["T", "i1", "i2", "a", "b", "c", "e"]);
        assert_eq!(changes, ChangeSummary { added: 2, removed: 1 });
    }

    #[test]
    fn later_hunk_cannot_match_before_earlier_one() {
        let raw = "--- a/T\n+++ b/T\n@@ -3,1 +3,1 @@\n-x\n+y\n@@ -1,1 +1,1 @@\n-x\n+z\n";
        let patch = parse(raw).unwrap();
        let current = page(&["T", "q", "x"]);
        let report = conflict(apply(&current, &patch));
        assert_eq!(report.failed_hunk, 2);
        assert_eq!(report.hunk_count, 2);
    }

    #[test]
    fn pure_insertion_hunk() {
        let patch = parse("--- a/T\n+++ b/T\n@@ -1,0 +2,1 @@\n+inserted\n").unwrap();
        let (lines, changes) = applied(apply(&page(&["T", "a"]), &patch));
        assert_eq!(lines, vec!["T", "inserted", "a"]);
        assert_eq!(changes, ChangeSummary { added: 1, removed: 0 });
    }

    #[test]
    fn insertion_past_end_is_clamped() {
        let patch = parse("--- a/T\n+++ b/T\n@@ -40,0 +41,1 @@\n+tail\n").unwrap();
        let (lines, _) = applied(apply(&page(&["T"]), &patch));
        assert_eq!(lines, vec!["T", "tail"]);
    }

    #[test]
    fn deletes_lines() {
        let patch = parse("--- a/T\n+++ b/T\n@@ -2,2 +2,0 @@\n-a\n-b\n").unwrap();
        let (lines, changes) = applied(apply(&page(&["T", "a", "b", "c"]), &patch));
        assert_eq!(lines, vec!["T", "c"]);
        assert_eq!(changes, ChangeSummary { added: 0, removed: 2 });
    }

    #[test]
    fn reports_missing_context_lines() {
        let patch = parse("--- a/T\n+++ b/T\n@@ -1,3 +1,3 @@\n Title\n-line1\n+x\n line9\n").unwrap();
        let report = conflict(apply(&page(&["Title", "line1", "line2"]), &patch));
        assert_eq!(
            report.diagnostics,
            vec!["Expected context line not found: \"line9\"".to_string()]
        );
        let message = report.to_string();
        assert!(message.contains("Expected context line not found: \"line9\""));
        assert!(message.contains("stale content"));
        assert!(message.contains("whitespace or line endings"));
        assert!(message.ends_with("regenerate the patch against it."));
    }

    #[test]
    fn context_check_is_file_wide() {
        // "b" exists elsewhere, so only "zzz" is reported even though the
        // hunk fails at its own position.
        let patch = parse("--- a/T\n+++ b/T\n@@ -2,3 +2,3 @@\n b\n-q\n+r\n zzz\n").unwrap();
        let report = conflict(apply(&page(&["T", "a", "b", "c"]), &patch));
        assert_eq!(
            report.diagnostics,
            vec!["Expected context line not found: \"zzz\"".to_string()]
        );
    }

    #[test]
    fn conflict_without_missing_context_still_explains() {
        let patch = parse("--- a/T\n+++ b/T\n@@ -2,1 +2,1 @@\n-gone\n+new\n").unwrap();
        let report = conflict(apply(&page(&["T", "a"]), &patch));
        assert!(report.diagnostics.is_empty());
        assert!(report.to_string().contains("hunk 1 of 1 (@@ -2,1 +2,1 @@)"));
    }

    #[test]
    fn whitespace_differences_conflict() {
        let patch = parse("--- a/T\n+++ b/T\n@@ -2,1 +2,1 @@\n-a \n+b\n").unwrap();
        assert!(matches!(
            apply(&page(&["T", "a"]), &patch),
            ApplyOutcome::Conflict(_)
        ));
    }

    #[test]
    fn match_outside_window_conflicts() {
        let mut lines = vec!["T".to_string()];
        lines.extend((0..SEARCH_WINDOW + 10).map(|i| format!("filler {i}")));
        lines.push("target".to_string());
        let current = PageContent::new(lines);

        let patch = Patch {
            old_path: "T".into(),
            new_path: "T".into(),
            hunks: vec![Hunk::from_lines(
                1,
                1,
                vec![PatchLine::remove("target"), PatchLine::add("changed")],
            )],
        };
        assert!(matches!(apply(&current, &patch), ApplyOutcome::Conflict(_)));
    }

    #[test]
    fn repeated_application_is_identical() {
        let patch = parse("--- a/T\n+++ b/T\n@@ -2,1 +2,1 @@\n-a\n+b\n").unwrap();
        let current = page(&["T", "a"]);
        assert_eq!(apply(&current, &patch), apply(&current, &patch));
    }

    #[test]
    fn empty_page_accepts_insertion() {
        let patch = parse("--- a/T\n+++ b/T\n@@ -0,0 +1,2 @@\n+T\n+body\n").unwrap();
        let (lines, _) = applied(apply(&PageContent::default(), &patch));
        assert_eq!(lines, vec!["T", "body"]);
    }
}
