//! Pipeline configuration.
//!
//! # Responsibility
//! - Describe the knobs the pipeline reads: learned-stage threshold, example
//!   policy, item source endpoint and cache location.
//! - Load them from JSON or, for the item source, from the environment.
//!
//! # Invariants
//! - A config returned by `from_json_str`/`from_file`/`from_env` has passed
//!   `validate`.
//! - An item source in the config file wins over the environment.

use crate::extract::ExamplePolicy;
use crate::knowledge::DEFAULT_LEARNED_STAGE;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

pub const ITEM_API_URL_ENV: &str = "JPSTUDY_ITEM_API_URL";
pub const ITEM_API_TOKEN_ENV: &str = "JPSTUDY_ITEM_API_TOKEN";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, message: String },
    InvalidJson(serde_json::Error),
    MissingEnv(&'static str),
    InvalidValue { field: &'static str, message: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, message } => {
                write!(f, "failed to read config `{}`: {message}", path.display())
            }
            Self::InvalidJson(err) => write!(f, "invalid pipeline config JSON: {err}"),
            Self::MissingEnv(name) => write!(f, "environment variable `{name}` is not set"),
            Self::InvalidValue { field, message } => {
                write!(f, "invalid config value for `{field}`: {message}")
            }
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidJson(err) => Some(err),
            Self::Io { .. } | Self::MissingEnv(_) | Self::InvalidValue { .. } => None,
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(value: serde_json::Error) -> Self {
        Self::InvalidJson(value)
    }
}

/// Endpoint of the external item catalogue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemSourceConfig {
    pub base_url: String,
    #[serde(default)]
    pub api_token: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl ItemSourceConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_token: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
        self
    }

    /// Reads `JPSTUDY_ITEM_API_URL` (required) and `JPSTUDY_ITEM_API_TOKEN`.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> ConfigResult<Self> {
        let base_url = lookup(ITEM_API_URL_ENV).ok_or(ConfigError::MissingEnv(ITEM_API_URL_ENV))?;
        let mut config = Self::new(base_url);
        config.api_token = lookup(ITEM_API_TOKEN_ENV).filter(|token| !token.trim().is_empty());
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.base_url.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "item_source.base_url",
                message: "must not be empty".to_string(),
            });
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "item_source.timeout_secs",
                message: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

/// Top-level pipeline settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default = "default_learned_stage")]
    pub learned_stage: i32,
    #[serde(default)]
    pub example_policy: ExamplePolicy,
    #[serde(default)]
    pub item_source: Option<ItemSourceConfig>,
    #[serde(default)]
    pub cache_path: Option<PathBuf>,
}

fn default_learned_stage() -> i32 {
    DEFAULT_LEARNED_STAGE
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            learned_stage: DEFAULT_LEARNED_STAGE,
            example_policy: ExamplePolicy::default(),
            item_source: None,
            cache_path: None,
        }
    }
}

impl PipelineConfig {
    pub fn from_json_str(json: &str) -> ConfigResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|err| ConfigError::Io {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
        Self::from_json_str(&json)
    }

    /// Item source to fetch from: the configured one, else the environment.
    ///
    /// Returns `None` when neither names an endpoint.
    pub fn item_source_or_env(&self) -> ConfigResult<Option<ItemSourceConfig>> {
        self.item_source_or_lookup(|name| std::env::var(name).ok())
    }

    fn item_source_or_lookup(
        &self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> ConfigResult<Option<ItemSourceConfig>> {
        if let Some(source) = &self.item_source {
            return Ok(Some(source.clone()));
        }
        if lookup(ITEM_API_URL_ENV).is_none() {
            return Ok(None);
        }
        ItemSourceConfig::from_lookup(lookup).map(Some)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if let Some(source) = &self.item_source {
            source.validate()?;
        }
        if self
            .cache_path
            .as_ref()
            .is_some_and(|path| path.as_os_str().is_empty())
        {
            return Err(ConfigError::InvalidValue {
                field: "cache_path",
                message: "must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{
        ConfigError, ItemSourceConfig, PipelineConfig, ITEM_API_TOKEN_ENV, ITEM_API_URL_ENV,
    };
    use crate::extract::ExamplePolicy;
    use std::collections::HashMap;

    #[test]
    fn empty_json_uses_defaults() {
        let config = PipelineConfig::from_json_str("{}").unwrap();
        assert_eq!(config, PipelineConfig::default());
        assert_eq!(config.learned_stage, 1);
        assert_eq!(config.example_policy, ExamplePolicy::FirstSeen);
    }

    #[test]
    fn parses_full_config() {
        let config = PipelineConfig::from_json_str(
            r#"{
                "learned_stage": 4,
                "example_policy": "greatest_tag",
                "item_source": {"base_url": "https://items.test/v2/subjects", "api_token": "t"},
                "cache_path": "/tmp/items.sqlite3"
            }"#,
        )
        .unwrap();
        assert_eq!(config.learned_stage, 4);
        assert_eq!(config.example_policy, ExamplePolicy::GreatestTag);
        let source = config.item_source.unwrap();
        assert_eq!(source.timeout_secs, 30);
        assert_eq!(source.api_token.as_deref(), Some("t"));
    }

    #[test]
    fn rejects_invalid_values() {
        let err = PipelineConfig::from_json_str(
            r#"{"item_source": {"base_url": "  ", "timeout_secs": 5}}"#,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                field: "item_source.base_url",
                ..
            }
        ));

        let mut source = ItemSourceConfig::new("https://items.test");
        source.timeout_secs = 0;
        assert!(source.validate().is_err());

        assert!(matches!(
            PipelineConfig::from_json_str("{"),
            Err(ConfigError::InvalidJson(_))
        ));
    }

    #[test]
    fn env_lookup_requires_url_and_ignores_blank_token() {
        let empty: HashMap<&str, String> = HashMap::new();
        let err = ItemSourceConfig::from_lookup(|name| empty.get(name).cloned()).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnv(ITEM_API_URL_ENV)));

        let vars = HashMap::from([
            (ITEM_API_URL_ENV, "https://items.test".to_string()),
            (ITEM_API_TOKEN_ENV, " ".to_string()),
        ]);
        let config = ItemSourceConfig::from_lookup(|name| vars.get(name).cloned()).unwrap();
        assert_eq!(config.base_url, "https://items.test");
        assert_eq!(config.api_token, None);
    }

    #[test]
    fn file_source_wins_over_environment() {
        let vars = HashMap::from([(ITEM_API_URL_ENV, "https://env.test".to_string())]);
        let lookup = |name: &str| vars.get(name).cloned();

        let none = PipelineConfig::default()
            .item_source_or_lookup(|_| None)
            .unwrap();
        assert_eq!(none, None);

        let from_env = PipelineConfig::default()
            .item_source_or_lookup(lookup)
            .unwrap()
            .unwrap();
        assert_eq!(from_env.base_url, "https://env.test");

        let configured = PipelineConfig {
            item_source: Some(ItemSourceConfig::new("https://file.test")),
            ..PipelineConfig::default()
        };
        let chosen = configured.item_source_or_lookup(lookup).unwrap().unwrap();
        assert_eq!(chosen.base_url, "https://file.test");
    }

    #[test]
    fn from_file_reads_json_and_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jpstudy.json");
        std::fs::write(&path, r#"{"learned_stage": 2, "cache_path": "items.sqlite3"}"#).unwrap();

        let config = PipelineConfig::from_file(&path).unwrap();
        assert_eq!(config.learned_stage, 2);
        assert_eq!(config.cache_path, Some(std::path::PathBuf::from("items.sqlite3")));

        let missing = dir.path().join("absent.json");
        match PipelineConfig::from_file(&missing).unwrap_err() {
            ConfigError::Io { path, .. } => assert_eq!(path, missing),
            other => panic!("unexpected error: {other}"),
        }
    }
}
