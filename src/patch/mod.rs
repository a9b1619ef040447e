//! patch
//!
//! Unified-diff model, parser, and applier.
//!
//! # Model
//!
//! A [`Patch`] is one logical edit request against exactly one page. It is an
//! ordered sequence of [`Hunk`]s; each hunk carries the source-range anchor
//! from its `@@ -a,b +c,d @@` header and an ordered sequence of tagged
//! [`PatchLine`]s.
//!
//! # Modules
//!
//! - [`parser`]: raw unified-diff text to [`Patch`]
//! - [`applier`]: [`Patch`] + current page lines to [`ApplyOutcome`]
//!
//! # Serialization
//!
//! `Display` on [`Patch`] renders canonical unified-diff text. Parsing that
//! text yields a patch with the same hunks, tags, and line order.
//!
//! # Example
//!
//! ```
//! use pagewright::core::types::PageContent;
//! use pagewright::patch::{apply, parse, ApplyOutcome};
//!
//! let patch = parse("--- a/Title\n+++ b/Title\n@@ -1,3 +1,3 @@\n Title\n-line1\n+line1 edited\n line2\n").unwrap();
//! let current = PageContent::from(["Title", "line1", "line2"]);
//!
//! match apply(&current, &patch) {
//!     ApplyOutcome::Applied { content, changes } => {
//!         assert_eq!(content.lines(), &["Title", "line1 edited", "line2"]);
//!         assert_eq!((changes.added, changes.removed), (1, 1));
//!     }
//!     ApplyOutcome::Conflict(report) => panic!("{report}"),
//! }
//! ```

pub mod applier;
pub mod parser;

pub use applier::{apply, ApplyOutcome, ConflictReport, SEARCH_WINDOW};
pub use parser::{parse, PatchFormatError, VALID_PATCH_EXAMPLE};

use serde::Serialize;
use std::fmt;

/// Tag carried by each line of a hunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LineTag {
    /// Unchanged line, used to locate and validate the hunk position.
    Context,
    /// Line inserted by the patch.
    Add,
    /// Line dropped by the patch.
    Remove,
}

impl LineTag {
    /// The unified-diff prefix character for this tag.
    pub fn prefix(self) -> char {
        match self {
            LineTag::Context => ' ',
            LineTag::Add => '+',
            LineTag::Remove => '-',
        }
    }
}

/// One tagged line of a hunk, stored without its prefix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct PatchLine {
    pub tag: LineTag,
    pub text: String,
}

impl PatchLine {
    pub fn context(text: impl Into<String>) -> Self {
        Self {
            tag: LineTag::Context,
            text: text.into(),
        }
    }

    pub fn add(text: impl Into<String>) -> Self {
        Self {
            tag: LineTag::Add,
            text: text.into(),
        }
    }

    pub fn remove(text: impl Into<String>) -> Self {
        Self {
            tag: LineTag::Remove,
            text: text.into(),
        }
    }

    /// Whether this line must exist in the current content (context or remove).
    pub fn is_old_side(&self) -> bool {
        matches!(self.tag, LineTag::Context | LineTag::Remove)
    }

    /// Whether this line appears in the new content (context or add).
    pub fn is_new_side(&self) -> bool {
        matches!(self.tag, LineTag::Context | LineTag::Add)
    }
}

/// Source-range anchor from a hunk header.
///
/// Line numbers are 1-based as written in the diff. A `start` of 0 with a
/// `len` of 0 means "before the first line".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct HunkRange {
    pub start: usize,
    pub len: usize,
}

impl fmt::Display for HunkRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.start, self.len)
    }
}

/// A contiguous block of a unified diff.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Hunk {
    pub old: HunkRange,
    pub new: HunkRange,
    pub lines: Vec<PatchLine>,
}

impl Hunk {
    /// Build a hunk whose header ranges are derived from its lines.
    pub fn from_lines(old_start: usize, new_start: usize, lines: Vec<PatchLine>) -> Self {
        let old_len = lines.iter().filter(|l| l.is_old_side()).count();
        let new_len = lines.iter().filter(|l| l.is_new_side()).count();
        Self {
            old: HunkRange {
                start: old_start,
                len: old_len,
            },
            new: HunkRange {
                start: new_start,
                len: new_len,
            },
            lines,
        }
    }

    /// Lines expected in the current content, in order.
    pub fn old_lines(&self) -> impl Iterator<Item = &str> {
        self.lines
            .iter()
            .filter(|l| l.is_old_side())
            .map(|l| l.text.as_str())
    }

    /// Lines produced in the new content, in order.
    pub fn new_lines(&self) -> impl Iterator<Item = &str> {
        self.lines
            .iter()
            .filter(|l| l.is_new_side())
            .map(|l| l.text.as_str())
    }

    /// Number of lines with the given tag.
    pub fn count(&self, tag: LineTag) -> usize {
        self.lines.iter().filter(|l| l.tag == tag).count()
    }

    /// The `@@ -a,b +c,d @@` header for this hunk.
    pub fn header(&self) -> String {
        format!("@@ -{} +{} @@", self.old, self.new)
    }
}

/// A parsed single-page unified diff.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Patch {
    /// Path from the `---` header (without any `a/` prefix).
    pub old_path: String,
    /// Path from the `+++` header (without any `b/` prefix).
    pub new_path: String,
    pub hunks: Vec<Hunk>,
}

impl Patch {
    /// Added/removed line counts summed over all hunks.
    pub fn change_summary(&self) -> ChangeSummary {
        ChangeSummary {
            added: self.hunks.iter().map(|h| h.count(LineTag::Add)).sum(),
            removed: self.hunks.iter().map(|h| h.count(LineTag::Remove)).sum(),
        }
    }

    /// Every context line across all hunks, in patch order.
    pub fn context_lines(&self) -> impl Iterator<Item = &str> {
        self.hunks.iter().flat_map(|h| {
            h.lines
                .iter()
                .filter(|l| l.tag == LineTag::Context)
                .map(|l| l.text.as_str())
        })
    }
}

impl fmt::Display for Patch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- a/{}", self.old_path)?;
        writeln!(f, "+++ b/{}", self.new_path)?;
        for hunk in &self.hunks {
            writeln!(f, "{}", hunk.header())?;
            for line in &hunk.lines {
                writeln!(f, "{}{}", line.tag.prefix(), line.text)?;
            }
        }
        Ok(())
    }
}

/// Lines added and removed by an applied patch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ChangeSummary {
    pub added: usize,
    pub removed: usize,
}

impl fmt::Display for ChangeSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} added, {} removed", self.added, self.removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_hunk() -> Hunk {
        Hunk::from_lines(
            1,
            1,
            vec![
                PatchLine::context("Title"),
                PatchLine::remove("line1"),
                PatchLine::add("line1 edited"),
                PatchLine::context("line2"),
            ],
        )
    }

    #[test]
    fn hunk_ranges_derived_from_lines() {
        let hunk = sample_hunk();
        assert_eq!(hunk.old, HunkRange { start: 1, len: 3 });
        assert_eq!(hunk.new, HunkRange { start: 1, len: 3 });
        assert_eq!(hunk.header(), "@@ -1,3 +1,3 @@");
    }

    #[test]
    fn old_and_new_sides() {
        let hunk = sample_hunk();
        assert_eq!(
            hunk.old_lines().collect::<Vec<_>>(),
            vec!["Title", "line1", "line2"]
        );
        assert_eq!(
            hunk.new_lines().collect::<Vec<_>>(),
            vec!["Title", "line1 edited", "line2"]
        );
    }

    #[test]
    fn change_summary_sums_hunks() {
        let patch = Patch {
            old_path: "Title".into(),
            new_path: "Title".into(),
            hunks: vec![
                sample_hunk(),
                Hunk::from_lines(9, 9, vec![PatchLine::add("x"), PatchLine::add("y")]),
            ],
        };
        let summary = patch.change_summary();
        assert_eq!(summary, ChangeSummary { added: 3, removed: 1 });
        assert_eq!(summary.to_string(), "3 added, 1 removed");
    }

    #[test]
    fn display_renders_unified_diff() {
        let patch = Patch {
            old_path: "Title".into(),
            new_path: "Title".into(),
            hunks: vec![sample_hunk()],
        };
        assert_eq!(
            patch.to_string(),
            "--- a/Title\n+++ b/Title\n@@ -1,3 +1,3 @@\n Title\n-line1\n+line1 edited\n line2\n"
        );
    }

    #[test]
    fn context_lines_in_patch_order() {
        let patch = Patch {
            old_path: "p".into(),
            new_path: "p".into(),
            hunks: vec![
                sample_hunk(),
                Hunk::from_lines(5, 5, vec![PatchLine::context("tail")]),
            ],
        };
        assert_eq!(
            patch.context_lines().collect::<Vec<_>>(),
            vec!["Title", "line2", "tail"]
        );
    }

    #[test]
    fn line_tag_prefixes() {
        assert_eq!(LineTag::Context.prefix(), ' ');
        assert_eq!(LineTag::Add.prefix(), '+');
        assert_eq!(LineTag::Remove.prefix(), '-');
    }
}
