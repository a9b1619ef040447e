//! store::dir
//!
//! Page store backed by a local directory tree.
//!
//! # Storage
//!
//! - `<root>/<project>/<encoded title>.txt` - Page lines, one per line
//! - `<root>/<project>/<encoded title>.lock` - OS-level exclusive lock
//!
//! Titles are percent-encoded where they would otherwise escape the project
//! directory or collide with hidden files: `%`, `/`, `\`, a leading `.`,
//! and control characters.
//!
//! # Invariants
//!
//! - A swap holds the page lock from revision check through rename
//! - Writes go to a temporary file that is renamed over the page, so a
//!   reader never observes a partially written page
//! - File I/O runs on the blocking pool, never on an async worker
//!
//! # Example
//!
//! ```
//! use pagewright::core::types::{PageContent, PageTitle, ProjectName};
//! use pagewright::store::{DirStore, PageStore};
//!
//! # tokio_test::block_on(async {
//! let dir = tempfile::tempdir().unwrap();
//! let store = DirStore::new(dir.path());
//! let project = ProjectName::new("main").unwrap();
//! let title = PageTitle::new("Title").unwrap();
//!
//! store.create_page(&project, &title, &PageContent::from(["Title"])).unwrap();
//! let page = store.fetch(&project, &title).await.unwrap();
//! assert_eq!(page.lines.first(), Some("Title"));
//! # });
//! ```

use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use fs2::FileExt;

use super::traits::{Page, PageStore, StoreError};
use crate::core::types::{PageContent, PageTitle, ProjectName, Revision};

/// Directory-backed page store.
#[derive(Debug, Clone)]
pub struct DirStore {
    root: PathBuf,
}

impl DirStore {
    /// Create a store rooted at `root`. The directory is created lazily.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory of the store.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the file holding a page.
    pub fn page_path(&self, project: &ProjectName, title: &PageTitle) -> PathBuf {
        self.root
            .join(project.as_str())
            .join(format!("{}.txt", encode_title(title.as_str())))
    }

    fn lock_path(&self, project: &ProjectName, title: &PageTitle) -> PathBuf {
        self.root
            .join(project.as_str())
            .join(format!("{}.lock", encode_title(title.as_str())))
    }

    /// Create or replace a page without a revision check.
    ///
    /// Used to seed pages; mutations go through `compare_and_swap`.
    pub fn create_page(
        &self,
        project: &ProjectName,
        title: &PageTitle,
        lines: &PageContent,
    ) -> Result<Revision, StoreError> {
        let _lock = PageLock::acquire(&self.lock_path(project, title))?;
        write_atomic(&self.page_path(project, title), lines)?;
        Ok(Revision::of(lines))
    }
}

#[async_trait]
impl PageStore for DirStore {
    fn name(&self) -> &'static str {
        "dir"
    }

    async fn fetch(&self, project: &ProjectName, title: &PageTitle) -> Result<Page, StoreError> {
        let path = self.page_path(project, title);
        let (p, t) = (project.clone(), title.clone());
        run_blocking(move || match read_page(&path)? {
            Some(lines) => Ok(Page::new(lines)),
            None => Err(StoreError::not_found(&p, &t)),
        })
        .await
    }

    async fn compare_and_swap(
        &self,
        project: &ProjectName,
        title: &PageTitle,
        expected: &Revision,
        lines: &PageContent,
    ) -> Result<Revision, StoreError> {
        let path = self.page_path(project, title);
        let lock_path = self.lock_path(project, title);
        let (p, t) = (project.clone(), title.clone());
        let expected = expected.clone();
        let lines = lines.clone();

        run_blocking(move || {
            let _lock = PageLock::acquire(&lock_path)?;
            let current = read_page(&path)?.ok_or_else(|| StoreError::not_found(&p, &t))?;
            let actual = Revision::of(&current);
            if actual != expected {
                tracing::debug!(page = %path.display(), "revision mismatch at swap");
                return Err(StoreError::conflict(&expected, &actual));
            }
            write_atomic(&path, &lines)?;
            Ok(Revision::of(&lines))
        })
        .await
    }
}

/// Exclusive per-page lock, released on drop.
#[derive(Debug)]
struct PageLock {
    file: File,
}

impl PageLock {
    fn acquire(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| io_error("cannot create", parent, e))?;
        }
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .map_err(|e| io_error("cannot open", path, e))?;
        file.lock_exclusive()
            .map_err(|e| io_error("cannot lock", path, e))?;
        Ok(Self { file })
    }
}

impl Drop for PageLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}

async fn run_blocking<T, F>(f: F) -> Result<T, StoreError>
where
    F: FnOnce() -> Result<T, StoreError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| StoreError::Io(format!("store task failed: {e}")))?
}

fn io_error(action: &str, path: &Path, err: std::io::Error) -> StoreError {
    StoreError::Io(format!("{action} {}: {err}", path.display()))
}

/// Read a page file. `None` if it does not exist.
fn read_page(path: &Path) -> Result<Option<PageContent>, StoreError> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(Some(decode_lines(&text))),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(io_error("cannot read", path, e)),
    }
}

fn write_atomic(path: &Path, lines: &PageContent) -> Result<(), StoreError> {
    let tmp = path.with_extension("txt.tmp");
    let mut file = File::create(&tmp).map_err(|e| io_error("cannot create", &tmp, e))?;
    file.write_all(encode_lines(lines).as_bytes())
        .and_then(|()| file.sync_all())
        .map_err(|e| io_error("cannot write", &tmp, e))?;
    fs::rename(&tmp, path).map_err(|e| io_error("cannot replace", path, e))
}

/// Every line is newline-terminated so that no lines and one empty line
/// stay distinguishable on disk.
fn encode_lines(lines: &PageContent) -> String {
    let mut text = String::new();
    for line in lines.lines() {
        text.push_str(line);
        text.push('\n');
    }
    text
}

fn decode_lines(text: &str) -> PageContent {
    if text.is_empty() {
        return PageContent::default();
    }
    PageContent::from_text(text.strip_suffix('\n').unwrap_or(text))
}

/// Encode a title as a single file name segment.
pub fn encode_title(title: &str) -> String {
    let mut out = String::with_capacity(title.len());
    for (i, c) in title.chars().enumerate() {
        match c {
            '%' | '/' | '\\' => out.push_str(&format!("%{:02X}", c as u32)),
            '.' if i == 0 => out.push_str("%2E"),
            c if c.is_ascii_control() => out.push_str(&format!("%{:02X}", c as u32)),
            c => out.push(c),
        }
    }
    out
}
