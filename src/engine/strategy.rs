//! engine::strategy
//!
//! Edit kinds and the pure transform from fetched content to candidate
//! content.
//!
//! # Architecture
//!
//! A [`MutationRequest`] is plain data: the target page, the selected
//! [`Edit`], and the title-change permission. [`apply_strategy`] turns the
//! request plus the freshly fetched lines into candidate lines, so the retry
//! loop never needs to know which edit kind it is driving.
//!
//! Every candidate passes through the title guard before it is returned.
//!
//! # Invariants
//!
//! - `apply_strategy` is pure: same request and same input, same result
//! - Nothing from a previous attempt is consulted

use thiserror::Error;

use super::guard::{guard_title, TitleChangeRejected};
use crate::core::types::{PageContent, PageTitle, ProjectName};
use crate::patch::{apply, ApplyOutcome, ChangeSummary, ConflictReport, Patch};
use crate::store::Mutator;

/// The edit a request performs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Edit {
    /// Insert lines after the first line equal to `target_line_text`,
    /// or at the end of the page if no line matches.
    InsertAfterAnchor {
        target_line_text: String,
        lines: PageContent,
    },
    /// Replace the whole page.
    Overwrite { new_content: PageContent },
    /// Apply a parsed unified diff.
    ApplyPatch { patch: Patch },
}

impl Edit {
    /// Short name used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Edit::InsertAfterAnchor { .. } => "insert",
            Edit::Overwrite { .. } => "overwrite",
            Edit::ApplyPatch { .. } => "apply_diff",
        }
    }
}

/// A fully resolved mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationRequest {
    pub project: ProjectName,
    pub title: PageTitle,
    pub edit: Edit,
    pub allow_title_change: bool,
    pub retry_limit: u32,
}

impl MutationRequest {
    /// Total attempts allowed: the first plus `retry_limit` retries.
    pub fn max_attempts(&self) -> u32 {
        self.retry_limit.saturating_add(1)
    }
}

/// Why a candidate could not be produced from the fetched content.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    #[error(transparent)]
    Conflict(#[from] ConflictReport),

    #[error(transparent)]
    TitleChange(#[from] TitleChangeRejected),
}

/// Produce candidate content for `request` from `current`.
///
/// Returns the candidate and, for edits that add or remove lines against
/// the fetched content, a change summary.
///
/// # Example
///
/// ```
/// use pagewright::core::types::{PageContent, PageTitle, ProjectName};
/// use pagewright::engine::strategy::{apply_strategy, Edit, MutationRequest};
///
/// let request = MutationRequest {
///     project: ProjectName::new("main").unwrap(),
///     title: PageTitle::new("Title").unwrap(),
///     edit: Edit::InsertAfterAnchor {
///         target_line_text: "missing".into(),
///         lines: PageContent::from(["tail"]),
///     },
///     allow_title_change: false,
///     retry_limit: 0,
/// };
///
/// let (content, _) = apply_strategy(&request, &PageContent::from(["Title", "a"])).unwrap();
/// assert_eq!(content.lines(), &["Title", "a", "tail"]);
/// ```
pub fn apply_strategy(
    request: &MutationRequest,
    current: &PageContent,
) -> Result<(PageContent, Option<ChangeSummary>), EditError> {
    let (candidate, changes) = match &request.edit {
        Edit::InsertAfterAnchor {
            target_line_text,
            lines,
        } => {
            let at = current
                .position(target_line_text)
                .map_or(current.len(), |i| i + 1);
            let mut out = current.lines().to_vec();
            out.splice(at..at, lines.lines().iter().cloned());
            let changes = ChangeSummary {
                added: lines.len(),
                removed: 0,
            };
            (PageContent::new(out), Some(changes))
        }
        Edit::Overwrite { new_content } => (new_content.clone(), None),
        Edit::ApplyPatch { patch } => match apply(current, patch) {
            ApplyOutcome::Applied { content, changes } => (content, Some(changes)),
            ApplyOutcome::Conflict(report) => return Err(report.into()),
        },
    };

    guard_title(
        &candidate,
        request.title.as_str(),
        request.allow_title_change,
    )?;
    Ok((candidate, changes))
}

impl Mutator for MutationRequest {
    type Output = Option<ChangeSummary>;
    type Error = EditError;

    fn mutate(&self, current: &PageContent) -> Result<(PageContent, Self::Output), EditError> {
        apply_strategy(self, current)
    }
}
