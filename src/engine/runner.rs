//! engine::runner
//!
//! Retry controller - drives the commit cycle for one mutation request.
//!
//! # Architecture
//!
//! ```text
//! Pending -> Attempting -> { Succeeded, Retrying -> Attempting, Exhausted }
//! ```
//!
//! Each attempt calls [`commit`], which fetches fresh content, runs the
//! request's strategy on it, and swaps the candidate in against the fetched
//! revision. Any failure inside an attempt (store error, lost race, patch
//! conflict, title guard) is recorded and retried until the budget of
//! `retry_limit + 1` attempts is spent.
//!
//! Terminal failures that do not depend on page state (access denied,
//! malformed patch) never reach this module; the facade rejects them first.
//!
//! # Invariants
//!
//! - Attempts are strictly sequential
//! - Every attempt re-fetches; no content is carried between attempts
//! - `retry_limit = 0` means exactly one attempt
//! - Cancellation is observed before an attempt starts, never mid-attempt
//! - All retry state is local to one call

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

use super::gate::DenyReason;
use super::guard::TitleChangeRejected;
use super::strategy::{EditError, MutationRequest};
pub use crate::core::config::DEFAULT_RETRY_LIMIT;
use crate::core::types::Revision;
use crate::patch::{ChangeSummary, PatchFormatError};
use crate::store::{commit, CommitError, PageStore, StoreError};

/// Retry settings applied when a request does not override them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries used when a request leaves `retry_limit` unset.
    pub default_retry_limit: u32,
    /// Fixed delay between attempts. Zero retries immediately.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            default_retry_limit: DEFAULT_RETRY_LIMIT,
            backoff: Duration::ZERO,
        }
    }
}

/// Shared cancellation flag.
///
/// Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. No new attempt starts afterwards.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Per-call attempt bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryState {
    pub attempts: u32,
    pub max_attempts: u32,
    pub last_error: Option<AttemptError>,
}

impl RetryState {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            attempts: 0,
            max_attempts,
            last_error: None,
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.attempts >= self.max_attempts
    }
}

/// Failure of a single attempt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttemptError {
    #[error(transparent)]
    Edit(#[from] EditError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<CommitError<EditError>> for AttemptError {
    fn from(err: CommitError<EditError>) -> Self {
        match err {
            CommitError::Rejected(e) => AttemptError::Edit(e),
            CommitError::Store(e) => AttemptError::Store(e),
        }
    }
}

/// Terminal failure of a mutation request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MutationError {
    /// The access gate refused the project. No attempt was made.
    #[error("Project '{project}' is not writable: {reason}")]
    AccessDenied { project: String, reason: DenyReason },

    /// The patch text is malformed. No attempt was made.
    #[error("Invalid patch format: {}", .0.with_example())]
    PatchFormat(PatchFormatError),

    /// The replacement content changes the title. No attempt was made.
    #[error(transparent)]
    TitleChangeRejected(TitleChangeRejected),

    /// Every attempt failed.
    #[error("Failed to update page after {attempts} attempts. Last error: {last_error}")]
    Exhausted {
        attempts: u32,
        max_attempts: u32,
        last_error: AttemptError,
    },

    /// The caller cancelled before the next attempt.
    #[error("Mutation cancelled after {attempts} attempt(s){}", last_error_suffix(.last_error))]
    Cancelled {
        attempts: u32,
        last_error: Option<AttemptError>,
    },
}

fn last_error_suffix(last_error: &Option<AttemptError>) -> String {
    match last_error {
        Some(e) => format!(". Last error: {e}"),
        None => String::new(),
    }
}

impl MutationError {
    /// Attempts consumed before the failure.
    pub fn attempts(&self) -> u32 {
        match self {
            MutationError::Exhausted { attempts, .. } | MutationError::Cancelled { attempts, .. } => {
                *attempts
            }
            _ => 0,
        }
    }

    /// The failure of the last attempt, if any attempt ran.
    pub fn last_error(&self) -> Option<&AttemptError> {
        match self {
            MutationError::Exhausted { last_error, .. } => Some(last_error),
            MutationError::Cancelled { last_error, .. } => last_error.as_ref(),
            _ => None,
        }
    }
}

/// Result of a successful mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MutationSummary {
    pub project: String,
    pub title: String,
    pub attempts: u32,
    pub max_attempts: u32,
    pub changes: Option<ChangeSummary>,
    pub revision: Revision,
}

/// Run `request` against `store` until it commits or the budget is spent.
///
/// # Errors
///
/// - [`MutationError::Exhausted`] with the last attempt's failure
/// - [`MutationError::Cancelled`] if `cancel` was set before an attempt
pub async fn mutate_with_retry(
    store: &dyn PageStore,
    request: &MutationRequest,
    backoff: Duration,
    cancel: &CancelFlag,
) -> Result<MutationSummary, MutationError> {
    let mut state = RetryState::new(request.max_attempts());

    loop {
        if cancel.is_cancelled() {
            tracing::info!(
                project = %request.project,
                title = %request.title,
                attempts = state.attempts,
                "mutation cancelled"
            );
            return Err(MutationError::Cancelled {
                attempts: state.attempts,
                last_error: state.last_error,
            });
        }

        state.attempts += 1;
        tracing::debug!(
            project = %request.project,
            title = %request.title,
            edit = request.edit.kind(),
            attempt = state.attempts,
            max_attempts = state.max_attempts,
            store = store.name(),
            "starting attempt"
        );

        match commit(store, &request.project, &request.title, request).await {
            Ok(committed) => {
                tracing::info!(
                    project = %request.project,
                    title = %request.title,
                    attempt = state.attempts,
                    revision = committed.revision.short(),
                    "page updated"
                );
                return Ok(MutationSummary {
                    project: request.project.to_string(),
                    title: request.title.to_string(),
                    attempts: state.attempts,
                    max_attempts: state.max_attempts,
                    changes: committed.output,
                    revision: committed.revision,
                });
            }
            Err(err) => {
                let err = AttemptError::from(err);
                if state.is_exhausted() {
                    tracing::warn!(
                        project = %request.project,
                        title = %request.title,
                        attempt = state.attempts,
                        max_attempts = state.max_attempts,
                        error = %err,
                        "attempt failed, giving up"
                    );
                    return Err(MutationError::Exhausted {
                        attempts: state.attempts,
                        max_attempts: state.max_attempts,
                        last_error: err,
                    });
                }
                tracing::warn!(
                    project = %request.project,
                    title = %request.title,
                    attempt = state.attempts,
                    max_attempts = state.max_attempts,
                    error = %err,
                    "attempt failed, retrying"
                );
                state.last_error = Some(err);
                if !backoff.is_zero() {
                    tokio::time::sleep(backoff).await;
                }
            }
        }
    }
}
