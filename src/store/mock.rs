//! store::mock
//!
//! Mock page store for deterministic testing.
//!
//! # Design
//!
//! The mock store keeps pages in memory and records every call. Failures
//! are scripted: a queue of one-shot [`FailOn`] entries is consumed in
//! order, and an optional persistent failure fires on every matching call
//! once the queue is empty.
//!
//! [`FailOn::ConcurrentEdit`] simulates another writer: at the next swap the
//! stored lines are replaced before the revision check, so the swap reports
//! a conflict exactly as a real lost race would.
//!
//! # Example
//!
//! ```
//! use pagewright::core::types::{PageContent, PageTitle, ProjectName};
//! use pagewright::store::mock::{FailOn, MockStore};
//! use pagewright::store::{PageStore, StoreError};
//!
//! # tokio_test::block_on(async {
//! let project = ProjectName::new("main").unwrap();
//! let title = PageTitle::new("Title").unwrap();
//! let store = MockStore::new()
//!     .with_page(&project, &title, ["Title", "body"])
//!     .fail_next(FailOn::Fetch(StoreError::Transport("timeout".into())));
//!
//! assert!(store.fetch(&project, &title).await.is_err());
//!
//! let page = store.fetch(&project, &title).await.unwrap();
//! assert_eq!(page.lines.lines(), &["Title", "body"]);
//! assert_eq!(store.fetch_count(), 2);
//! # });
//! ```

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use super::traits::{Page, PageStore, StoreError};
use crate::core::types::{PageContent, PageTitle, ProjectName, Revision};

/// Mock page store for testing.
///
/// Thread-safe via internal `Arc<Mutex<...>>` wrapping.
#[derive(Debug, Clone)]
pub struct MockStore {
    /// Internal state shared across clones.
    inner: Arc<Mutex<MockStoreInner>>,
}

/// Internal mutable state.
#[derive(Debug, Default)]
struct MockStoreInner {
    /// Stored pages by (project, title).
    pages: HashMap<(String, String), PageContent>,
    /// One-shot failures, consumed in order.
    scripted: VecDeque<FailOn>,
    /// Failure applied on every matching call after the script runs out.
    always: Option<FailOn>,
    /// Recorded operations for verification.
    operations: Vec<MockOperation>,
}

/// A scripted failure.
#[derive(Debug, Clone)]
pub enum FailOn {
    /// Fail a fetch with the given error.
    Fetch(StoreError),
    /// Fail a compare-and-swap with the given error.
    Swap(StoreError),
    /// Replace the stored lines just before the next swap.
    ConcurrentEdit(PageContent),
}

/// Recorded operation for test verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockOperation {
    Fetch {
        project: String,
        title: String,
    },
    CompareAndSwap {
        project: String,
        title: String,
        expected: Revision,
        lines: PageContent,
    },
}

enum Stage {
    Fetch,
    Swap,
}

impl MockStore {
    /// Create a new empty mock store.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(MockStoreInner::default())),
        }
    }

    /// Seed a page.
    pub fn with_page(
        self,
        project: &ProjectName,
        title: &PageTitle,
        lines: impl Into<PageContent>,
    ) -> Self {
        self.put_page(project, title, lines);
        self
    }

    /// Queue a one-shot failure.
    pub fn fail_next(self, fail: FailOn) -> Self {
        self.push_failure(fail);
        self
    }

    /// Fail every matching call once the one-shot queue is empty.
    pub fn fail_always(self, fail: FailOn) -> Self {
        {
            let mut inner = self.inner.lock().unwrap();
            inner.always = Some(fail);
        }
        self
    }

    /// Queue a one-shot failure on a shared store.
    pub fn push_failure(&self, fail: FailOn) {
        let mut inner = self.inner.lock().unwrap();
        inner.scripted.push_back(fail);
    }

    /// Clear all scripted and persistent failures.
    pub fn clear_failures(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.scripted.clear();
        inner.always = None;
    }

    /// Overwrite a page directly, bypassing revision checks.
    pub fn put_page(&self, project: &ProjectName, title: &PageTitle, lines: impl Into<PageContent>) {
        let mut inner = self.inner.lock().unwrap();
        inner.pages.insert(key(project, title), lines.into());
    }

    /// Get a page's lines (for test verification).
    pub fn page(&self, project: &ProjectName, title: &PageTitle) -> Option<PageContent> {
        let inner = self.inner.lock().unwrap();
        inner.pages.get(&key(project, title)).cloned()
    }

    /// Get all recorded operations.
    pub fn operations(&self) -> Vec<MockOperation> {
        let inner = self.inner.lock().unwrap();
        inner.operations.clone()
    }

    /// Number of fetch calls made.
    pub fn fetch_count(&self) -> usize {
        self.operations()
            .iter()
            .filter(|op| matches!(op, MockOperation::Fetch { .. }))
            .count()
    }

    /// Number of compare-and-swap calls made.
    pub fn swap_count(&self) -> usize {
        self.operations()
            .iter()
            .filter(|op| matches!(op, MockOperation::CompareAndSwap { .. }))
            .count()
    }

    fn record(&self, op: MockOperation) {
        let mut inner = self.inner.lock().unwrap();
        inner.operations.push(op);
    }

    /// Take the next failure that applies to `stage`, if any.
    fn take_failure(&self, stage: Stage) -> Option<FailOn> {
        let mut inner = self.inner.lock().unwrap();
        let applies = |fail: &FailOn| match (fail, &stage) {
            (FailOn::Fetch(_), Stage::Fetch) => true,
            (FailOn::Swap(_) | FailOn::ConcurrentEdit(_), Stage::Swap) => true,
            _ => false,
        };
        if let Some(index) = inner.scripted.iter().position(|f| applies(f)) {
            return inner.scripted.remove(index);
        }
        if inner.scripted.is_empty() {
            return inner.always.clone().filter(|f| applies(f));
        }
        None
    }
}

impl Default for MockStore {
    fn default() -> Self {
        Self::new()
    }
}

fn key(project: &ProjectName, title: &PageTitle) -> (String, String) {
    (project.to_string(), title.to_string())
}

#[async_trait]
impl PageStore for MockStore {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn fetch(&self, project: &ProjectName, title: &PageTitle) -> Result<Page, StoreError> {
        self.record(MockOperation::Fetch {
            project: project.to_string(),
            title: title.to_string(),
        });

        if let Some(FailOn::Fetch(e)) = self.take_failure(Stage::Fetch) {
            return Err(e);
        }

        let inner = self.inner.lock().unwrap();
        inner
            .pages
            .get(&key(project, title))
            .cloned()
            .map(Page::new)
            .ok_or_else(|| StoreError::not_found(project, title))
    }

    async fn compare_and_swap(
        &self,
        project: &ProjectName,
        title: &PageTitle,
        expected: &Revision,
        lines: &PageContent,
    ) -> Result<Revision, StoreError> {
        self.record(MockOperation::CompareAndSwap {
            project: project.to_string(),
            title: title.to_string(),
            expected: expected.clone(),
            lines: lines.clone(),
        });

        match self.take_failure(Stage::Swap) {
            Some(FailOn::Swap(e)) => return Err(e),
            Some(FailOn::ConcurrentEdit(edited)) => self.put_page(project, title, edited),
            _ => {}
        }

        let mut inner = self.inner.lock().unwrap();
        let stored = inner
            .pages
            .get_mut(&key(project, title))
            .ok_or_else(|| StoreError::not_found(project, title))?;
        let actual = Revision::of(stored);
        if &actual != expected {
            return Err(StoreError::conflict(expected, &actual));
        }
        *stored = lines.clone();
        Ok(Revision::of(lines))
    }
}
