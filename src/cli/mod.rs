//! cli
//!
//! Command-line interface layer for Pagewright.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Install the log subscriber and load configuration
//! - Delegate to command handlers
//! - Does NOT edit pages directly
//!
//! # Architecture
//!
//! The CLI layer is thin. It parses arguments via clap, resolves
//! configuration into a [`Context`], and dispatches to the
//! [`crate::engine`] for execution. All page changes flow through the
//! engine's gated, retrying entry points.

pub mod args;
pub mod commands;

pub use args::Cli;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::core::config::Config;
use crate::core::types::ProjectName;
use crate::engine::{Engine, EngineConfig};
use crate::store::DirStore;
use crate::ui::output::{self, Verbosity};

/// Execution context for commands.
///
/// Contains the loaded configuration and global settings derived from CLI
/// flags.
#[derive(Debug, Clone)]
pub struct Context {
    /// Loaded configuration with environment overrides applied.
    pub config: Config,
    /// `--store` override.
    pub store: Option<PathBuf>,
    /// Output verbosity.
    pub verbosity: Verbosity,
    /// JSON output enabled.
    pub json: bool,
}

impl Context {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            store: None,
            verbosity: Verbosity::Normal,
            json: false,
        }
    }

    /// Page store root: `--store`, then config, then `~/.pagewright/pages`.
    pub fn store_root(&self) -> Result<PathBuf> {
        if let Some(root) = &self.store {
            return Ok(root.clone());
        }
        if let Some(root) = self.config.store_root() {
            return Ok(root.to_path_buf());
        }
        Config::default_store_root().context("Failed to determine page store location")
    }

    /// Resolve the target project: the explicit one, else the configured
    /// default.
    pub fn project(&self, explicit: Option<&str>) -> Result<ProjectName> {
        let name = explicit.or(self.config.project()).context(
            "No project given. Pass --project or set `project` in the config file",
        )?;
        ProjectName::new(name).context("Invalid project name")
    }

    /// Build an engine over the directory store.
    pub fn engine(&self) -> Result<Engine> {
        let root = self.store_root()?;
        tracing::debug!(root = %root.display(), "using directory store");
        Ok(Engine::new(
            Arc::new(DirStore::new(root)),
            EngineConfig::from(&self.config),
        ))
    }
}

/// Install the stderr log subscriber.
///
/// `RUST_LOG` overrides the level chosen by `--debug` / `--quiet`.
fn init_tracing(verbosity: Verbosity) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("pagewright={}", verbosity.log_level())));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .try_init();
}

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`.
pub fn run() -> Result<ExitCode> {
    let cli = Cli::parse_args();
    let verbosity = Verbosity::from_flags(cli.quiet, cli.debug);
    init_tracing(verbosity);

    let loaded = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    for warning in &loaded.warnings {
        match &warning.path {
            Some(path) => output::warn(
                format!("{} ({})", warning.message, path.display()),
                verbosity,
            ),
            None => output::warn(&warning.message, verbosity),
        }
    }

    let ctx = Context {
        config: loaded.config,
        store: cli.store.clone(),
        verbosity,
        json: cli.json,
    };

    // Dispatch to command handler
    commands::dispatch(cli.command, &ctx)
}
