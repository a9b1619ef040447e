//! engine::guard
//!
//! Title-stability guard for candidate page content.
//!
//! The first line of a page is its title. Unless the caller explicitly
//! allows it, a mutation must not change that line. The guard runs after
//! the candidate content has been produced and before it is submitted.

use serde::Serialize;
use thiserror::Error;

use crate::core::types::PageContent;

/// A candidate would change the page title without permission.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error(
    "Title change detected but not allowed. Current title: '{expected}', New first line: '{observed}'. \
     Set allowTitleChange to true if you want to change the title."
)]
pub struct TitleChangeRejected {
    pub expected: String,
    pub observed: String,
}

/// Check that `content` keeps `expected_title` as its first line.
///
/// Empty content passes: there is no first line to compare.
///
/// # Example
///
/// ```
/// use pagewright::core::types::PageContent;
/// use pagewright::engine::guard::guard_title;
///
/// let renamed = PageContent::from(["NewTitle", "body"]);
/// assert!(guard_title(&renamed, "Title", true).is_ok());
///
/// let err = guard_title(&renamed, "Title", false).unwrap_err();
/// assert_eq!(err.observed, "NewTitle");
/// ```
pub fn guard_title(
    content: &PageContent,
    expected_title: &str,
    allow_title_change: bool,
) -> Result<(), TitleChangeRejected> {
    if allow_title_change {
        return Ok(());
    }
    match content.first() {
        Some(first) if first != expected_title => Err(TitleChangeRejected {
            expected: expected_title.to_string(),
            observed: first.to_string(),
        }),
        _ => Ok(()),
    }
}
