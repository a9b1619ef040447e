//! engine
//!
//! Page mutation engine: Gate -> Strategy -> Guard -> Commit, with retries.
//!
//! # Architecture
//!
//! The engine turns a caller's edit description into new page content and
//! commits it through an injected [`PageStore`](crate::store::PageStore):
//!
//! 1. **Gate**: refuse projects the access policy does not allow
//! 2. **Strategy**: build candidate lines from freshly fetched content
//! 3. **Guard**: refuse candidates that change the page title
//! 4. **Commit**: compare-and-swap against the fetched revision
//! 5. **Retry**: repeat 2-4 on failure, up to `retry_limit + 1` attempts
//!
//! # Invariants
//!
//! - The engine never constructs a store or reads the environment
//! - Gating happens before any store call
//! - No page content is shared between calls or between attempts
//!
//! # Modules
//!
//! - [`gate`]: Access policy and allow/deny matching
//! - [`guard`]: Title-stability guard
//! - [`strategy`]: Edit kinds and the content transform
//! - [`runner`]: Retry controller
//! - [`api`]: `Engine` facade with the three entry points
//! - [`report`]: Uniform caller-facing result

pub mod api;
pub mod gate;
pub mod guard;
pub mod report;
pub mod runner;
pub mod strategy;

pub use api::{DiffRequest, Engine, EngineConfig, InsertRequest, OverwriteRequest};
pub use gate::{AccessPolicy, DenyReason, GateResult, Pattern};
pub use guard::{guard_title, TitleChangeRejected};
pub use report::{FailureKind, MutationReport, Operation};
pub use runner::{
    mutate_with_retry, AttemptError, CancelFlag, MutationError, MutationSummary, RetryPolicy,
    RetryState, DEFAULT_RETRY_LIMIT,
};
pub use strategy::{apply_strategy, Edit, EditError, MutationRequest};
