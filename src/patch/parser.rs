//! patch::parser
//!
//! Turns raw unified-diff text into a structured [`Patch`].
//!
//! # Accepted format
//!
//! Exactly one file section: a `--- ` line immediately followed by a `+++ `
//! line, then one or more hunks introduced by `@@ -a[,b] +c[,d] @@`. Lines
//! before the first file header (`diff --git`, `index ...`) are ignored.
//!
//! Inside a hunk every line must start with ` `, `+`, `-`, or `\` (the
//! `\ No newline at end of file` marker, which is skipped). A completely
//! empty line inside the declared hunk length is read as an empty context
//! line, since editors and language models commonly strip the single space
//! from blank context lines. Past the declared length it separates hunks.
//!
//! Declared hunk lengths otherwise only tell a removed line that happens to
//! start with `-- ` apart from the next file header. Inside the declared
//! length, `--- ` / `+++ ` still start a new section when a hunk header
//! follows, so an overstated count cannot hide a second file. A line
//! starting with `@@` always opens a new hunk. Hunk placement relies on the
//! content match.
//!
//! # Invariants
//!
//! - A parsed patch has exactly one file section and at least one hunk
//! - Every hunk has at least one line
//! - Line tags and order are preserved exactly as written

use thiserror::Error;

use super::{Hunk, HunkRange, LineTag, Patch, PatchLine};

/// Example of a valid patch, included in format error messages.
pub const VALID_PATCH_EXAMPLE: &str = "\
--- a/Page title
+++ b/Page title
@@ -1,3 +1,3 @@
 Page title
-old line
+new line
 unchanged line
";

/// Errors from patch parsing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatchFormatError {
    #[error("no file section found (expected '--- ' and '+++ ' header lines)")]
    NoFileSection,

    #[error("patch contains {0} file sections; exactly one page can be edited per call")]
    MultipleFileSections(usize),

    #[error("file section has no hunks")]
    NoHunks,

    #[error("invalid hunk header at line {line}: {text:?}")]
    InvalidHunkHeader { line: usize, text: String },

    #[error("hunk {hunk} has no lines")]
    EmptyHunk { hunk: usize },

    #[error("unexpected line {line} in hunk {hunk}: {text:?} (lines must start with ' ', '+' or '-')")]
    UnexpectedLine {
        line: usize,
        hunk: usize,
        text: String,
    },
}

impl PatchFormatError {
    /// Error message followed by an example of the accepted format.
    pub fn with_example(&self) -> String {
        format!(
            "{}\n\nExpected a single-file unified diff, for example:\n\n{}",
            self, VALID_PATCH_EXAMPLE
        )
    }
}

/// In-progress hunk with the remaining declared line budget.
struct OpenHunk {
    hunk: Hunk,
    old_remaining: usize,
    new_remaining: usize,
}

impl OpenHunk {
    fn within_declared_length(&self) -> bool {
        self.old_remaining > 0 || self.new_remaining > 0
    }

    fn push(&mut self, line: PatchLine) {
        if line.is_old_side() {
            self.old_remaining = self.old_remaining.saturating_sub(1);
        }
        if line.is_new_side() {
            self.new_remaining = self.new_remaining.saturating_sub(1);
        }
        self.hunk.lines.push(line);
    }
}

/// A `---`/`+++` section and its hunks.
struct Section {
    old_path: String,
    new_path: String,
    hunks: Vec<Hunk>,
}

/// Parse unified-diff text into a single-page [`Patch`].
///
/// # Errors
///
/// - [`PatchFormatError::NoFileSection`] if there is no `---`/`+++` header
/// - [`PatchFormatError::MultipleFileSections`] if more than one file is touched
/// - [`PatchFormatError::NoHunks`], [`PatchFormatError::EmptyHunk`],
///   [`PatchFormatError::InvalidHunkHeader`], [`PatchFormatError::UnexpectedLine`]
///   for structurally malformed hunks
///
/// # Example
///
/// ```
/// use pagewright::patch::{parse, LineTag};
///
/// let patch = parse("--- a/T\n+++ b/T\n@@ -2 +2 @@\n-old\n+new\n").unwrap();
/// assert_eq!(patch.hunks.len(), 1);
/// assert_eq!(patch.hunks[0].lines[0].tag, LineTag::Remove);
/// ```
pub fn parse(raw: &str) -> Result<Patch, PatchFormatError> {
    let mut lines: Vec<&str> = raw.lines().collect();
    while lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }

    let mut sections: Vec<Section> = Vec::new();
    let mut open: Option<OpenHunk> = None;
    let mut hunk_number = 0;

    let mut i = 0;
    while i < lines.len() {
        let line = lines[i];
        let line_number = i + 1;

        let in_declared_body = open.as_ref().is_some_and(OpenHunk::within_declared_length);

        // Inside a declared body only a header followed by a hunk header
        // starts a new section; otherwise `---`/`+++` are body lines.
        let starts_section = if in_declared_body {
            is_file_header(&lines, i) && lines.get(i + 2).is_some_and(|l| l.starts_with("@@"))
        } else {
            is_file_header(&lines, i)
        };
        if starts_section {
            close_hunk(&mut open, &mut sections)?;
            sections.push(Section {
                old_path: header_path(&line[4..], "a/"),
                new_path: header_path(&lines[i + 1][4..], "b/"),
                hunks: Vec::new(),
            });
            i += 2;
            continue;
        }

        // `diff --git` preamble of a following file section.
        if !in_declared_body && line.starts_with("diff ") {
            close_hunk(&mut open, &mut sections)?;
            i += 1;
            continue;
        }

        if line.starts_with("@@") {
            if sections.is_empty() {
                return Err(PatchFormatError::NoFileSection);
            }
            close_hunk(&mut open, &mut sections)?;
            let (old, new) =
                parse_hunk_header(line).ok_or_else(|| PatchFormatError::InvalidHunkHeader {
                    line: line_number,
                    text: line.to_string(),
                })?;
            hunk_number += 1;
            open = Some(OpenHunk {
                hunk: Hunk {
                    old,
                    new,
                    lines: Vec::new(),
                },
                old_remaining: old.len,
                new_remaining: new.len,
            });
            i += 1;
            continue;
        }

        // Outside a hunk, preamble (`diff --git`, `index`, mode lines) and
        // text between a file header and its first hunk are skipped.
        if let Some(current) = open.as_mut() {
            // A blank line after the declared counts separates hunks.
            if line.is_empty() && !in_declared_body {
                i += 1;
                continue;
            }
            match body_line(line) {
                BodyLine::Line(patch_line) => current.push(patch_line),
                BodyLine::Marker => {}
                BodyLine::Invalid => {
                    return Err(PatchFormatError::UnexpectedLine {
                        line: line_number,
                        hunk: hunk_number,
                        text: line.to_string(),
                    })
                }
            }
        }
        i += 1;
    }
    close_hunk(&mut open, &mut sections)?;

    match sections.len() {
        0 => Err(PatchFormatError::NoFileSection),
        1 => {
            let section = sections.remove(0);
            if section.hunks.is_empty() {
                return Err(PatchFormatError::NoHunks);
            }
            Ok(Patch {
                old_path: section.old_path,
                new_path: section.new_path,
                hunks: section.hunks,
            })
        }
        n => Err(PatchFormatError::MultipleFileSections(n)),
    }
}

fn is_file_header(lines: &[&str], i: usize) -> bool {
    lines[i].starts_with("--- ") && lines.get(i + 1).is_some_and(|l| l.starts_with("+++ "))
}

/// Strip the conventional `a/`/`b/` prefix and any trailing timestamp.
fn header_path(raw: &str, prefix: &str) -> String {
    let path = raw.split('\t').next().unwrap_or(raw).trim();
    path.strip_prefix(prefix).unwrap_or(path).to_string()
}

fn close_hunk(
    open: &mut Option<OpenHunk>,
    sections: &mut [Section],
) -> Result<(), PatchFormatError> {
    if let Some(done) = open.take() {
        let section_hunks = match sections.last_mut() {
            Some(section) => &mut section.hunks,
            None => return Err(PatchFormatError::NoFileSection),
        };
        if done.hunk.lines.is_empty() {
            return Err(PatchFormatError::EmptyHunk {
                hunk: section_hunks.len() + 1,
            });
        }
        section_hunks.push(done.hunk);
    }
    Ok(())
}

enum BodyLine {
    Line(PatchLine),
    Marker,
    Invalid,
}

fn body_line(line: &str) -> BodyLine {
    let mut chars = line.chars();
    let tag = match chars.next() {
        None => return BodyLine::Line(PatchLine::context("")),
        Some(' ') => LineTag::Context,
        Some('+') => LineTag::Add,
        Some('-') => LineTag::Remove,
        Some('\\') => return BodyLine::Marker,
        Some(_) => return BodyLine::Invalid,
    };
    BodyLine::Line(PatchLine {
        tag,
        text: chars.as_str().to_string(),
    })
}

/// Parse `@@ -a[,b] +c[,d] @@[ section]`.
fn parse_hunk_header(line: &str) -> Option<(HunkRange, HunkRange)> {
    let rest = line.strip_prefix("@@ -")?;
    let (old, rest) = rest.split_once(' ')?;
    let rest = rest.strip_prefix('+')?;
    let (new, rest) = rest.split_once(' ').unwrap_or((rest, ""));
    if !rest.starts_with("@@") {
        return None;
    }
    Some((parse_range(old)?, parse_range(new)?))
}

fn parse_range(s: &str) -> Option<HunkRange> {
    match s.split_once(',') {
        Some((start, len)) => Some(HunkRange {
            start: start.parse().ok()?,
            len: len.parse().ok()?,
        }),
        None => Some(HunkRange {
            start: s.parse().ok()?,
            len: 1,
        }),
    }
}
