//! Pagewright - safe, retrying edits to collaborative wiki pages
//!
//! Pagewright changes pages in a shared wiki on behalf of automated agents.
//! Every change passes an access gate, is computed against the page's
//! current content, is checked so that a page cannot be silently renamed,
//! and is committed with compare-and-swap so concurrent edits are retried
//! instead of lost.
//!
//! # Architecture
//!
//! The codebase follows a layered architecture:
//!
//! - [`cli`] - Command-line interface layer (parses args, delegates to engine)
//! - [`engine`] - Gate → Resolve → Retry loop around the three mutations
//! - [`patch`] - Unified diff parsing and fuzzy hunk application
//! - [`store`] - Page store abstraction with mock and on-disk backends
//! - [`core`] - Domain types and configuration
//! - [`ui`] - Output formatting
//!
//! # Correctness Invariants
//!
//! 1. A project outside the allow list, or matched by a deny pattern, is
//!    never written
//! 2. A patch is applied in full or not at all
//! 3. The first line of a page equals its title unless a rename is allowed
//! 4. A write only lands if the page is unchanged since it was read

pub mod cli;
pub mod core;
pub mod engine;
pub mod patch;
pub mod store;
pub mod ui;
