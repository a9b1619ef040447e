//! store::traits
//!
//! Page store trait and the fetch-mutate-swap commit cycle.
//!
//! # Design
//!
//! The `PageStore` trait is async because store operations involve I/O.
//! It exposes two primitives: `fetch` returns the current lines of a page
//! with their [`Revision`], and `compare_and_swap` writes new lines only if
//! the stored revision still equals the one the caller read.
//!
//! [`commit`] builds the mutation cycle on top of those primitives: fetch,
//! run a [`Mutator`] on the fresh lines, then swap against the fetched
//! revision. A lost race surfaces as [`StoreError::Conflict`]; the mutator's
//! own refusal surfaces as [`CommitError::Rejected`].
//!
//! # Example
//!
//! ```
//! use pagewright::core::types::{PageContent, PageTitle, ProjectName};
//! use pagewright::store::mock::MockStore;
//! use pagewright::store::{commit, Mutator};
//!
//! struct Append(&'static str);
//!
//! impl Mutator for Append {
//!     type Output = ();
//!     type Error = std::convert::Infallible;
//!
//!     fn mutate(&self, current: &PageContent) -> Result<(PageContent, ()), Self::Error> {
//!         let mut lines = current.lines().to_vec();
//!         lines.push(self.0.to_string());
//!         Ok((PageContent::new(lines), ()))
//!     }
//! }
//!
//! # tokio_test::block_on(async {
//! let project = ProjectName::new("main").unwrap();
//! let title = PageTitle::new("Title").unwrap();
//! let store = MockStore::new().with_page(&project, &title, ["Title"]);
//!
//! commit(&store, &project, &title, &Append("tail")).await.unwrap();
//! assert_eq!(store.page(&project, &title).unwrap().lines(), &["Title", "tail"]);
//! # });
//! ```

use async_trait::async_trait;
use thiserror::Error;

use crate::core::types::{PageContent, PageTitle, ProjectName, Revision};

/// Errors from store operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The page does not exist.
    #[error("page not found: {project}/{title}")]
    NotFound { project: String, title: String },

    /// The page changed between fetch and swap.
    #[error("page was modified concurrently (expected revision {expected}, found {actual})")]
    Conflict { expected: String, actual: String },

    /// Local storage failure.
    #[error("storage error: {0}")]
    Io(String),

    /// Remote transport failure.
    #[error("transport error: {0}")]
    Transport(String),
}

impl StoreError {
    pub(crate) fn not_found(project: &ProjectName, title: &PageTitle) -> Self {
        StoreError::NotFound {
            project: project.to_string(),
            title: title.to_string(),
        }
    }

    pub(crate) fn conflict(expected: &Revision, actual: &Revision) -> Self {
        StoreError::Conflict {
            expected: expected.short().to_string(),
            actual: actual.short().to_string(),
        }
    }
}

/// A fetched page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub lines: PageContent,
    pub revision: Revision,
}

impl Page {
    /// Wrap lines with their computed revision.
    pub fn new(lines: PageContent) -> Self {
        let revision = Revision::of(&lines);
        Self { lines, revision }
    }
}

/// Backing store for wiki pages.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`; independent mutations may run
/// concurrently against the same store.
#[async_trait]
pub trait PageStore: Send + Sync {
    /// Store name for diagnostics (e.g., "dir", "mock").
    fn name(&self) -> &'static str;

    /// Fetch the current lines of a page.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the page does not exist
    /// - `Io` / `Transport` if the store cannot be read
    async fn fetch(&self, project: &ProjectName, title: &PageTitle) -> Result<Page, StoreError>;

    /// Replace a page's lines if its revision still equals `expected`.
    ///
    /// Returns the revision of the written lines.
    ///
    /// # Errors
    ///
    /// - `Conflict` if the page changed since `expected` was read
    /// - `NotFound` if the page no longer exists
    async fn compare_and_swap(
        &self,
        project: &ProjectName,
        title: &PageTitle,
        expected: &Revision,
        lines: &PageContent,
    ) -> Result<Revision, StoreError>;
}

/// Produces new page lines from the freshly fetched ones.
pub trait Mutator: Send + Sync {
    /// Extra result handed back on a successful commit.
    type Output: Send;
    /// Reason the mutator refuses to produce content.
    type Error: std::error::Error + Send + Sync + 'static;

    fn mutate(&self, current: &PageContent) -> Result<(PageContent, Self::Output), Self::Error>;
}

/// A successful commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Committed<T> {
    /// Revision of the written lines.
    pub revision: Revision,
    /// Number of lines written.
    pub line_count: usize,
    pub output: T,
}

/// Failure of one commit cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitError<E> {
    /// The mutator refused the fetched content.
    Rejected(E),
    /// Fetch or swap failed.
    Store(StoreError),
}

impl<E> From<StoreError> for CommitError<E> {
    fn from(err: StoreError) -> Self {
        CommitError::Store(err)
    }
}

impl<E: std::fmt::Display> std::fmt::Display for CommitError<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommitError::Rejected(e) => write!(f, "{e}"),
            CommitError::Store(e) => write!(f, "{e}"),
        }
    }
}

impl<E: std::error::Error + 'static> std::error::Error for CommitError<E> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CommitError::Rejected(e) => Some(e),
            CommitError::Store(e) => Some(e),
        }
    }
}

/// Fetch a page, apply `mutator` to it, and swap the result in.
///
/// The swap is conditioned on the revision that was fetched in this same
/// call, so content read by an earlier call is never reused.
pub async fn commit<S, M>(
    store: &S,
    project: &ProjectName,
    title: &PageTitle,
    mutator: &M,
) -> Result<Committed<M::Output>, CommitError<M::Error>>
where
    S: PageStore + ?Sized,
    M: Mutator,
{
    let page = store.fetch(project, title).await?;
    let (lines, output) = mutator
        .mutate(&page.lines)
        .map_err(CommitError::Rejected)?;
    let revision = store
        .compare_and_swap(project, title, &page.revision, &lines)
        .await?;
    Ok(Committed {
        revision,
        line_count: lines.len(),
        output,
    })
}
