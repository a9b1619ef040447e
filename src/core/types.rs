//! core::types
//!
//! Strong types for core domain concepts.
//!
//! # Types
//!
//! - [`ProjectName`] - Validated wiki project name
//! - [`PageTitle`] - Validated page title
//! - [`PageContent`] - Ordered sequence of page lines
//! - [`Revision`] - Content fingerprint used for compare-and-swap writes
//!
//! # Validation
//!
//! These types enforce validity at construction time. Invalid values
//! cannot be represented, preventing entire classes of bugs.
//!
//! # Examples
//!
//! ```
//! use pagewright::core::types::{PageContent, PageTitle, ProjectName, Revision};
//!
//! let project = ProjectName::new("team-notes").unwrap();
//! let title = PageTitle::new("Weekly sync").unwrap();
//! let content = PageContent::from_text("Weekly sync\nagenda");
//!
//! assert_eq!(content.first(), Some("Weekly sync"));
//! assert_eq!(Revision::of(&content), Revision::of(&content.clone()));
//!
//! assert!(ProjectName::new("").is_err());
//! assert!(PageTitle::new("two\nlines").is_err());
//! # let _ = (project, title);
//! ```

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid project name: {0}")]
    InvalidProjectName(String),

    #[error("invalid page title: {0}")]
    InvalidPageTitle(String),
}

/// A validated project name.
///
/// Project names are single path segments on the remote wiki:
/// - Cannot be empty
/// - Cannot contain `/` or `\`
/// - Cannot contain whitespace or ASCII control characters
/// - Cannot be `.` or `..`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ProjectName(String);

impl ProjectName {
    /// Create a new validated project name.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidProjectName` if the name is not a single,
    /// printable path segment.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        Self::validate(&name)?;
        Ok(Self(name))
    }

    fn validate(name: &str) -> Result<(), TypeError> {
        if name.is_empty() {
            return Err(TypeError::InvalidProjectName(
                "project name cannot be empty".into(),
            ));
        }
        if name == "." || name == ".." {
            return Err(TypeError::InvalidProjectName(format!(
                "project name cannot be '{name}'"
            )));
        }
        if name.contains('/') || name.contains('\\') {
            return Err(TypeError::InvalidProjectName(
                "project name cannot contain path separators".into(),
            ));
        }
        if name.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(TypeError::InvalidProjectName(
                "project name cannot contain whitespace or control characters".into(),
            ));
        }
        Ok(())
    }

    /// Get the project name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ProjectName {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ProjectName> for String {
    fn from(name: ProjectName) -> Self {
        name.0
    }
}

impl std::fmt::Display for ProjectName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for ProjectName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A validated page title.
///
/// The title is also the expected first line of the page, so it must be
/// a single non-empty line.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PageTitle(String);

impl PageTitle {
    /// Create a new validated page title.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidPageTitle` if the title is empty, blank,
    /// or spans more than one line.
    pub fn new(title: impl Into<String>) -> Result<Self, TypeError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(TypeError::InvalidPageTitle(
                "page title cannot be blank".into(),
            ));
        }
        if title.contains('\n') || title.contains('\r') {
            return Err(TypeError::InvalidPageTitle(
                "page title must be a single line".into(),
            ));
        }
        Ok(Self(title))
    }

    /// Get the title as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for PageTitle {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PageTitle> for String {
    fn from(title: PageTitle) -> Self {
        title.0
    }
}

impl std::fmt::Display for PageTitle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for PageTitle {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Ordered sequence of page lines.
///
/// This is the unit of both reads and writes. It is fetched fresh for
/// every mutation attempt and never cached across attempts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageContent(Vec<String>);

impl PageContent {
    /// Create content from already-split lines.
    pub fn new(lines: Vec<String>) -> Self {
        Self(lines)
    }

    /// Split newline-separated text into lines.
    ///
    /// Splitting is on `\n` only, so `"a\n"` yields `["a", ""]`. Callers
    /// that send text for insertion or replacement get exactly the lines
    /// they wrote.
    pub fn from_text(text: &str) -> Self {
        Self(text.split('\n').map(str::to_string).collect())
    }

    /// Join the lines back into one text body.
    pub fn to_text(&self) -> String {
        self.0.join("\n")
    }

    /// Get the lines as a slice.
    pub fn lines(&self) -> &[String] {
        &self.0
    }

    /// Consume into the underlying lines.
    pub fn into_lines(self) -> Vec<String> {
        self.0
    }

    /// Get the first line (the page title on a well-formed page).
    pub fn first(&self) -> Option<&str> {
        self.0.first().map(String::as_str)
    }

    /// Number of lines.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no lines at all.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether any line has exactly this text.
    pub fn contains_line(&self, text: &str) -> bool {
        self.0.iter().any(|line| line == text)
    }

    /// Index of the first line with exactly this text.
    pub fn position(&self, text: &str) -> Option<usize> {
        self.0.iter().position(|line| line == text)
    }
}

impl From<Vec<String>> for PageContent {
    fn from(lines: Vec<String>) -> Self {
        Self(lines)
    }
}

impl From<&[&str]> for PageContent {
    fn from(lines: &[&str]) -> Self {
        Self(lines.iter().map(|s| s.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for PageContent {
    fn from(lines: [&str; N]) -> Self {
        Self(lines.iter().map(|s| s.to_string()).collect())
    }
}

/// Content fingerprint of a page.
///
/// A SHA-256 hash over the page lines. Two fetches that return the same
/// lines produce the same revision, so a compare-and-swap write can detect
/// any intervening change without the remote keeping version counters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Revision(String);

impl Revision {
    /// Compute the revision of a line sequence.
    pub fn of(content: &PageContent) -> Self {
        let mut hasher = Sha256::new();
        for line in content.lines() {
            hasher.update(line.as_bytes());
            hasher.update(b"\n");
        }
        hasher.update(content.len().to_le_bytes());
        Self(hex::encode(hasher.finalize()))
    }

    /// Get the revision as a hex string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Abbreviated form for log output.
    pub fn short(&self) -> &str {
        &self.0[..12.min(self.0.len())]
    }
}

impl std::fmt::Display for Revision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
