//! config command - Inspect the effective configuration

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use serde::Serialize;

use crate::cli::Context;
use crate::core::config::Config;
use crate::ui::output;

/// Settings after file, environment, and flag overrides are resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EffectiveConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    pub retry_limit: u32,
    pub retry_backoff_ms: u64,
    pub allow: Vec<String>,
    pub deny: Vec<String>,
    pub store_root: PathBuf,
}

/// Resolve the effective configuration for `ctx`.
pub fn effective(ctx: &Context) -> Result<EffectiveConfig> {
    let config = &ctx.config;
    Ok(EffectiveConfig {
        config_path: config.path().map(PathBuf::from),
        project: config.project().map(str::to_string),
        retry_limit: config.retry_limit(),
        retry_backoff_ms: u64::try_from(config.retry_backoff().as_millis()).unwrap_or(u64::MAX),
        allow: config.allow_patterns(),
        deny: config.deny_patterns().to_vec(),
        store_root: ctx.store_root()?,
    })
}

/// Print the effective configuration as TOML (or JSON with `--json`).
pub fn show(ctx: &Context) -> Result<()> {
    let effective = effective(ctx)?;
    if ctx.json {
        return output::json(&effective);
    }
    let text = toml::to_string_pretty(&effective).context("Failed to render configuration")?;
    print!("{}", text);
    Ok(())
}

/// Print the config file in use, or where one would be looked for.
pub fn path(ctx: &Context) -> Result<()> {
    let path = match ctx.config.path() {
        Some(path) => path.to_path_buf(),
        None => Config::default_config_path().context("Failed to determine config location")?,
    };
    if ctx.json {
        return output::json(&serde_json::json!({
            "path": path,
            "loaded": ctx.config.path().is_some(),
        }));
    }
    println!("{}", path.display());
    Ok(())
}
