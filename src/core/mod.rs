//! core
//!
//! Core domain types and configuration for Pagewright.
//!
//! # Modules
//!
//! - [`types`] - Strong types: ProjectName, PageTitle, PageContent, Revision
//! - [`config`] - Configuration schema and loading
//!
//! # Design Principles
//!
//! - Strong typing prevents invalid states at compile time
//! - Schemas are strict and self-describing

pub mod config;
pub mod types;
