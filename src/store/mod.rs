//! store
//!
//! Abstraction for page storage (the remote wiki, a local directory, ...).
//!
//! # Architecture
//!
//! The `PageStore` trait is the engine's only window onto page content.
//! The engine never constructs a store itself; callers hand one in.
//!
//! - Store operations are invoked only after the access gate has passed
//! - Store failures never leave a page partially written
//! - Content is fetched fresh for every commit cycle
//!
//! # Modules
//!
//! - `traits`: `PageStore`, `Mutator`, and the [`commit`] cycle
//! - [`dir`]: Pages as files under a root directory
//! - [`mock`]: In-memory store for deterministic testing

pub mod dir;
pub mod mock;
mod traits;

pub use dir::DirStore;
pub use traits::*;
