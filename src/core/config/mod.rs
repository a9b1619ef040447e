//! core::config
//!
//! Configuration schema and loading.
//!
//! # Precedence
//!
//! Configuration values are resolved in this order (later overrides earlier):
//! 1. Default values
//! 2. Config file
//! 3. Environment variables
//! 4. CLI flags (not handled here)
//!
//! # Config File Locations
//!
//! Searched in order:
//! 1. An explicit path (the `--config` flag); it must exist
//! 2. `$PAGEWRIGHT_CONFIG` if set
//! 3. `$XDG_CONFIG_HOME/pagewright/config.toml`
//! 4. `~/.pagewright/config.toml` (canonical location)
//!
//! # Environment Overrides
//!
//! - `PAGEWRIGHT_PROJECT` - default project
//! - `PAGEWRIGHT_EDITABLE_PROJECTS` - comma-separated allow list, replaces
//!   `access.allow`
//! - `PAGEWRIGHT_DEFAULT_RETRY_LIMIT` - non-negative integer
//! - `PAGEWRIGHT_STORE_ROOT` - page store root directory
//!
//! This is the only module that reads the process environment.
//!
//! # Example
//!
//! ```no_run
//! use pagewright::core::config::Config;
//!
//! let result = Config::load(None).unwrap();
//! let config = result.config;
//!
//! println!("Retry limit: {}", config.retry_limit());
//! println!("Editable: {}", config.allow_patterns().join(", "));
//! ```

pub mod schema;

pub use schema::{AccessConfig, FileConfig, StoreConfig};

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Retries after the first attempt when nothing else is configured.
pub const DEFAULT_RETRY_LIMIT: u32 = 3;

/// Environment variable naming an explicit config file.
pub const ENV_CONFIG: &str = "PAGEWRIGHT_CONFIG";
pub const ENV_PROJECT: &str = "PAGEWRIGHT_PROJECT";
pub const ENV_EDITABLE_PROJECTS: &str = "PAGEWRIGHT_EDITABLE_PROJECTS";
pub const ENV_DEFAULT_RETRY_LIMIT: &str = "PAGEWRIGHT_DEFAULT_RETRY_LIMIT";
pub const ENV_STORE_ROOT: &str = "PAGEWRIGHT_STORE_ROOT";

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("invalid config value: {0}")]
    InvalidValue(String),

    #[error("home directory not found")]
    NoHomeDir,
}

/// Warnings generated during config loading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigWarning {
    /// The warning message.
    pub message: String,
    /// The path that triggered the warning, if any.
    pub path: Option<PathBuf>,
}

/// Result of loading configuration.
#[derive(Debug)]
pub struct ConfigLoadResult {
    /// The loaded configuration.
    pub config: Config,
    /// Any warnings generated during loading.
    pub warnings: Vec<ConfigWarning>,
}

/// Configuration from all sources, with environment overrides applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    /// Effective settings
    pub file: FileConfig,
    /// Path to the config file (if one was loaded)
    path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from the default locations and the process
    /// environment.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be parsed, if an
    /// explicit path does not exist, or if an environment value is invalid.
    /// Missing default config files are not an error (defaults are used).
    pub fn load(explicit: Option<&Path>) -> Result<ConfigLoadResult, ConfigError> {
        Self::load_from(explicit, |key| std::env::var(key).ok(), dirs::home_dir())
    }

    /// Load configuration with an injected environment and home directory.
    pub fn load_from<E>(
        explicit: Option<&Path>,
        env: E,
        home: Option<PathBuf>,
    ) -> Result<ConfigLoadResult, ConfigError>
    where
        E: Fn(&str) -> Option<String>,
    {
        let mut warnings = Vec::new();

        let (mut file, path) = match explicit {
            Some(path) => (Self::read_config(path)?, Some(path.to_path_buf())),
            None => Self::search(&env, home.as_deref(), &mut warnings)?,
        };
        file.validate()?;
        Self::apply_env(&mut file, &env)?;

        let config = Config { file, path };
        if config.allow_patterns().is_empty() {
            warnings.push(ConfigWarning {
                message: "no editable projects configured; every project is read-only".into(),
                path: config.path.clone(),
            });
        }

        Ok(ConfigLoadResult { config, warnings })
    }

    /// Find and read the first config file in the search order.
    fn search<E>(
        env: &E,
        home: Option<&Path>,
        warnings: &mut Vec<ConfigWarning>,
    ) -> Result<(FileConfig, Option<PathBuf>), ConfigError>
    where
        E: Fn(&str) -> Option<String>,
    {
        // 1. Check $PAGEWRIGHT_CONFIG
        if let Some(path) = env(ENV_CONFIG) {
            let path = PathBuf::from(path);
            if path.exists() {
                let config = Self::read_config(&path)?;
                return Ok((config, Some(path)));
            }
            warnings.push(ConfigWarning {
                message: format!("{ENV_CONFIG} points to a missing file; ignoring it"),
                path: Some(path),
            });
        }

        // 2. Check $XDG_CONFIG_HOME/pagewright/config.toml
        if let Some(xdg_home) = env("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_home).join("pagewright/config.toml");
            if path.exists() {
                let config = Self::read_config(&path)?;
                return Ok((config, Some(path)));
            }
        }

        // 3. Check ~/.pagewright/config.toml
        if let Some(home) = home {
            let path = home.join(".pagewright/config.toml");
            if path.exists() {
                let config = Self::read_config(&path)?;
                return Ok((config, Some(path)));
            }
        }

        Ok((FileConfig::default(), None))
    }

    /// Read and parse a config file.
    fn read_config(path: &Path) -> Result<FileConfig, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    fn apply_env<E>(file: &mut FileConfig, env: &E) -> Result<(), ConfigError>
    where
        E: Fn(&str) -> Option<String>,
    {
        if let Some(project) = env(ENV_PROJECT) {
            crate::core::types::ProjectName::new(project.as_str())
                .map_err(|e| ConfigError::InvalidValue(format!("{ENV_PROJECT}: {e}")))?;
            file.project = Some(project);
        }

        if let Some(list) = env(ENV_EDITABLE_PROJECTS) {
            let allow = parse_project_list(&list);
            file.access.get_or_insert_with(AccessConfig::default).allow = Some(allow);
        }

        if let Some(raw) = env(ENV_DEFAULT_RETRY_LIMIT) {
            let limit = raw.trim().parse::<u32>().map_err(|_| {
                ConfigError::InvalidValue(format!(
                    "{ENV_DEFAULT_RETRY_LIMIT} must be a non-negative integer, got '{raw}'"
                ))
            })?;
            file.retry_limit = Some(limit);
        }

        if let Some(root) = env(ENV_STORE_ROOT) {
            file.store.get_or_insert_with(StoreConfig::default).root = Some(PathBuf::from(root));
        }

        Ok(())
    }

    /// Wrap already-resolved settings (no file, no environment).
    pub fn from_file(file: FileConfig) -> Self {
        Self { file, path: None }
    }

    /// Get the canonical config path.
    ///
    /// Returns `~/.pagewright/config.toml`.
    pub fn default_config_path() -> Result<PathBuf, ConfigError> {
        let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
        Ok(home.join(".pagewright/config.toml"))
    }

    /// Get the default page store root.
    ///
    /// Returns `~/.pagewright/pages`.
    pub fn default_store_root() -> Result<PathBuf, ConfigError> {
        let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
        Ok(home.join(".pagewright/pages"))
    }

    /// Path of the config file that was loaded, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    // =========================================================================
    // Accessor methods with defaults
    // =========================================================================

    /// Get the default project.
    pub fn project(&self) -> Option<&str> {
        self.file.project.as_deref()
    }

    /// Get the default retry limit.
    ///
    /// Defaults to 3 if not configured.
    pub fn retry_limit(&self) -> u32 {
        self.file.retry_limit.unwrap_or(DEFAULT_RETRY_LIMIT)
    }

    /// Get the delay between attempts.
    ///
    /// Defaults to no delay.
    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.file.retry_backoff_ms.unwrap_or(0))
    }

    /// Get the allow patterns.
    ///
    /// When no allow list is configured, only the default project is
    /// editable. With no default project either, nothing is.
    pub fn allow_patterns(&self) -> Vec<String> {
        match self.file.access.as_ref().and_then(|a| a.allow.as_ref()) {
            Some(allow) => allow.clone(),
            None => self.project().map(|p| vec![p.to_string()]).unwrap_or_default(),
        }
    }

    /// Get the deny patterns.
    pub fn deny_patterns(&self) -> &[String] {
        self.file
            .access
            .as_ref()
            .map(|a| a.deny.as_slice())
            .unwrap_or(&[])
    }

    /// Get the configured page store root.
    pub fn store_root(&self) -> Option<&Path> {
        self.file.store.as_ref().and_then(|s| s.root.as_deref())
    }
}

/// Split a comma-separated project list, trimming entries and dropping
/// empty ones.
pub fn parse_project_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn env_of(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn no_env() -> impl Fn(&str) -> Option<String> {
        env_of(&[])
    }

    #[test]
    fn load_empty_defaults() {
        let result = Config::load_from(None, no_env(), None).unwrap();
        let config = result.config;

        assert_eq!(config.project(), None);
        assert_eq!(config.retry_limit(), 3);
        assert_eq!(config.retry_backoff(), Duration::ZERO);
        assert!(config.allow_patterns().is_empty());
        assert!(config.deny_patterns().is_empty());
        assert!(config.path().is_none());
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn load_explicit_path() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("custom.toml");
        fs::write(&path, "project = \"main\"\nretry_limit = 1\n").unwrap();

        let result = Config::load_from(Some(&path), no_env(), None).unwrap();

        assert_eq!(result.config.project(), Some("main"));
        assert_eq!(result.config.retry_limit(), 1);
        assert_eq!(result.config.path(), Some(path.as_path()));
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn explicit_missing_path_is_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("missing.toml");

        let result = Config::load_from(Some(&path), no_env(), None);
        assert!(matches!(result, Err(ConfigError::ReadError { .. })));
    }

    #[test]
    fn load_from_env_path() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        fs::write(&path, "project = \"docs\"").unwrap();

        let env = env_of(&[(ENV_CONFIG, path.to_str().unwrap())]);
        let result = Config::load_from(None, env, None).unwrap();

        assert_eq!(result.config.project(), Some("docs"));
    }

    #[test]
    fn missing_env_path_warns_and_falls_through() {
        let temp = TempDir::new().unwrap();
        let home = temp.path().to_path_buf();
        fs::create_dir_all(home.join(".pagewright")).unwrap();
        fs::write(home.join(".pagewright/config.toml"), "project = \"home\"").unwrap();

        let env = env_of(&[(ENV_CONFIG, "/nonexistent/config.toml")]);
        let result = Config::load_from(None, env, Some(home)).unwrap();

        assert_eq!(result.config.project(), Some("home"));
        assert!(result.warnings[0].message.contains(ENV_CONFIG));
    }

    #[test]
    fn xdg_takes_precedence_over_home() {
        let temp = TempDir::new().unwrap();
        let xdg = temp.path().join("xdg");
        let home = temp.path().join("home");
        fs::create_dir_all(xdg.join("pagewright")).unwrap();
        fs::create_dir_all(home.join(".pagewright")).unwrap();
        fs::write(xdg.join("pagewright/config.toml"), "project = \"xdg\"").unwrap();
        fs::write(home.join(".pagewright/config.toml"), "project = \"home\"").unwrap();

        let env = env_of(&[("XDG_CONFIG_HOME", xdg.to_str().unwrap())]);
        let result = Config::load_from(None, env, Some(home)).unwrap();

        assert_eq!(result.config.project(), Some("xdg"));
    }

    #[test]
    fn allow_defaults_to_project() {
        let env = env_of(&[(ENV_PROJECT, "main")]);
        let config = Config::load_from(None, env, None).unwrap().config;
        assert_eq!(config.allow_patterns(), vec!["main".to_string()]);
    }

    #[test]
    fn editable_projects_env_replaces_allow() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        fs::write(&path, "[access]\nallow = [\"file\"]\ndeny = [\"x\"]").unwrap();

        let env = env_of(&[(ENV_EDITABLE_PROJECTS, " a, ,b ,")]);
        let config = Config::load_from(Some(&path), env, None).unwrap().config;

        assert_eq!(config.allow_patterns(), vec!["a".to_string(), "b".to_string()]);
        assert_eq!(config.deny_patterns(), &["x".to_string()]);
    }

    #[test]
    fn retry_limit_env_override() {
        let env = env_of(&[(ENV_DEFAULT_RETRY_LIMIT, "0")]);
        let config = Config::load_from(None, env, None).unwrap().config;
        assert_eq!(config.retry_limit(), 0);
    }

    #[test]
    fn invalid_retry_limit_env_rejected() {
        for bad in ["-1", "abc", ""] {
            let env = env_of(&[(ENV_DEFAULT_RETRY_LIMIT, bad)]);
            let result = Config::load_from(None, env, None);
            assert!(
                matches!(result, Err(ConfigError::InvalidValue(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn invalid_project_env_rejected() {
        let env = env_of(&[(ENV_PROJECT, "a/b")]);
        assert!(Config::load_from(None, env, None).is_err());
    }

    #[test]
    fn store_root_env_override() {
        let env = env_of(&[(ENV_STORE_ROOT, "/srv/pages")]);
        let config = Config::load_from(None, env, None).unwrap().config;
        assert_eq!(config.store_root(), Some(Path::new("/srv/pages")));
    }

    #[test]
    fn parse_error_names_path() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        fs::write(&path, "retry_limit = \"many\"").unwrap();

        let err = Config::load_from(Some(&path), no_env(), None).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
        assert!(err.to_string().contains("config.toml"));
    }

    #[test]
    fn project_list_parsing() {
        assert_eq!(parse_project_list("a,b"), vec!["a", "b"]);
        assert_eq!(parse_project_list(" a , b "), vec!["a", "b"]);
        assert!(parse_project_list(" , ,").is_empty());
    }
}
