//! core::config::schema
//!
//! Configuration file schema.
//!
//! # Validation
//!
//! Values are validated after parsing: the default project must be a valid
//! project name and pattern lists must not contain empty entries. Retry
//! counts are unsigned, so a negative value fails at parse time.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::core::types::ProjectName;

/// Contents of `config.toml`.
///
/// # Example
///
/// ```toml
/// project = "main"
/// retry_limit = 3
/// retry_backoff_ms = 0
///
/// [access]
/// allow = ["main", "team-.*"]
/// deny = ["archive"]
///
/// [store]
/// root = "/var/lib/pagewright"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    /// Default project for commands that omit `--project`
    pub project: Option<String>,

    /// Default number of retries after the first attempt
    pub retry_limit: Option<u32>,

    /// Fixed delay between attempts, in milliseconds
    pub retry_backoff_ms: Option<u64>,

    /// Which projects may be mutated
    pub access: Option<AccessConfig>,

    /// Where pages are stored
    pub store: Option<StoreConfig>,
}

impl FileConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(project) = &self.project {
            ProjectName::new(project.as_str())
                .map_err(|e| ConfigError::InvalidValue(format!("project: {e}")))?;
        }
        if let Some(access) = &self.access {
            access.validate()?;
        }
        Ok(())
    }
}

/// Access policy patterns.
///
/// Each entry is a regular expression matched against the whole project
/// name; an entry that is not a valid regex matches literally.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct AccessConfig {
    /// Editable projects. When unset, only the default project is editable.
    pub allow: Option<Vec<String>>,

    /// Projects that are never editable, whatever `allow` says
    pub deny: Vec<String>,
}

impl AccessConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let allow = self.allow.iter().flatten();
        if allow.chain(&self.deny).any(|p| p.is_empty()) {
            return Err(ConfigError::InvalidValue(
                "access patterns cannot be empty".into(),
            ));
        }
        Ok(())
    }
}

/// Page store settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    /// Root directory of the page tree
    pub root: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_full_config() {
        let config: FileConfig = toml::from_str(
            r#"
            project = "main"
            retry_limit = 5
            retry_backoff_ms = 250

            [access]
            allow = ["main", "team-.*"]
            deny = ["archive"]

            [store]
            root = "/tmp/pages"
            "#,
        )
        .unwrap();

        assert_eq!(config.project.as_deref(), Some("main"));
        assert_eq!(config.retry_limit, Some(5));
        assert_eq!(config.retry_backoff_ms, Some(250));
        let access = config.access.as_ref().unwrap();
        assert_eq!(access.allow.as_deref(), Some(&["main".to_string(), "team-.*".to_string()][..]));
        assert_eq!(access.deny, vec!["archive".to_string()]);
        assert_eq!(
            config.store.unwrap().root,
            Some(PathBuf::from("/tmp/pages"))
        );
    }

    #[test]
    fn empty_config_is_default() {
        let config: FileConfig = toml::from_str("").unwrap();
        assert_eq!(config, FileConfig::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn negative_retry_limit_fails_to_parse() {
        let result: Result<FileConfig, _> = toml::from_str("retry_limit = -1");
        assert!(result.is_err());
    }

    #[test]
    fn unknown_fields_rejected() {
        let result: Result<FileConfig, _> = toml::from_str("unknown = true");
        assert!(result.is_err());

        let result: Result<FileConfig, _> = toml::from_str("[access]\nallowed = []");
        assert!(result.is_err());
    }

    #[test]
    fn invalid_project_rejected() {
        let config = FileConfig {
            project: Some("has space".into()),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidValue(_))));
    }

    #[test]
    fn empty_pattern_rejected() {
        let config = FileConfig {
            access: Some(AccessConfig {
                allow: None,
                deny: vec![String::new()],
            }),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn allow_unset_differs_from_empty() {
        let unset: FileConfig = toml::from_str("[access]\ndeny = []").unwrap();
        let empty: FileConfig = toml::from_str("[access]\nallow = []").unwrap();
        assert_eq!(unset.access.unwrap().allow, None);
        assert_eq!(empty.access.unwrap().allow, Some(vec![]));
    }
}
