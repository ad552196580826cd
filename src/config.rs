//! Configuration for docket.
//!
//! Settings are read from `docket.toml` and layered file → environment → CLI.
//!
//! # Configuration File Format
//!
//! ```toml
//! [collection]
//! sort = "newest_first"
//!
//! [resolver]
//! create_missing = true
//! redirect_to_first = true
//!
//! [pagination]
//! page_size = 20
//!
//! [logging]
//! level = "info"
//! format = "text"
//! ```
//!
//! # Environment
//!
//! - `DOCKET_PAGE_SIZE` overrides `pagination.page_size`
//! - `DOCKET_LOG` overrides `logging.level`

use crate::coordinator::ResolverPolicy;
use crate::errors::ConfigError;
use crate::model::SortOrder;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the configuration file looked up in the working directory.
pub const CONFIG_FILE: &str = "docket.toml";

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Output format for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogFormat::Text => write!(f, "text"),
            LogFormat::Json => write!(f, "json"),
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            _ => anyhow::bail!("Invalid log format '{}'. Valid values: text, json", s),
        }
    }
}

/// How the collection is ordered.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CollectionSection {
    #[serde(default)]
    pub sort: SortOrder,
}

/// What the resolver may do when nothing matches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverSection {
    /// Create an entity for an unmatched counterpart
    #[serde(default = "default_true")]
    pub create_missing: bool,
    /// Redirect a stale or empty selector to the first item
    #[serde(default = "default_true")]
    pub redirect_to_first: bool,
}

fn default_true() -> bool {
    true
}

impl Default for ResolverSection {
    fn default() -> Self {
        Self {
            create_missing: true,
            redirect_to_first: true,
        }
    }
}

/// Paginated listing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginationSection {
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

fn default_page_size() -> usize {
    20
}

impl Default for PaginationSection {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSection {
    /// Level or `EnvFilter` directive
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

/// Contents of `docket.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocketToml {
    #[serde(default)]
    pub collection: CollectionSection,
    #[serde(default)]
    pub resolver: ResolverSection,
    #[serde(default)]
    pub pagination: PaginationSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

impl DocketToml {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse docket.toml")
    }

    /// Load `docket.toml` from `dir`, or defaults if it doesn't exist.
    pub fn load_or_default(dir: &Path) -> Result<Self> {
        let config_path = dir.join(CONFIG_FILE);
        if config_path.exists() {
            Self::load(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize docket.toml")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    pub fn policy(&self) -> ResolverPolicy {
        ResolverPolicy::default()
            .with_create_missing(self.resolver.create_missing)
            .with_redirect_to_first(self.resolver.redirect_to_first)
    }

    /// Check values that parse but make no sense.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut problems = Vec::new();

        if self.pagination.page_size == 0 {
            problems.push(ConfigError::InvalidPageSize(0));
        }
        if !is_valid_log_level(&self.logging.level) {
            problems.push(ConfigError::InvalidLogLevel(self.logging.level.clone()));
        }

        problems
    }
}

/// Accepts a bare level or an `EnvFilter` directive list whose levels are known.
fn is_valid_log_level(level: &str) -> bool {
    let level = level.trim();
    if level.is_empty() {
        return false;
    }
    level.split(',').all(|directive| {
        let value = directive.rsplit('=').next().unwrap_or(directive).trim();
        LOG_LEVELS.contains(&value.to_lowercase().as_str())
    })
}

/// Effective configuration.
///
/// It merges settings from:
/// 1. docket.toml file
/// 2. Environment variables
/// 3. CLI arguments
#[derive(Debug, Clone, Default)]
pub struct DocketConfig {
    /// File the settings came from, if any
    pub path: Option<PathBuf>,
    /// Parsed docket.toml configuration
    pub toml: DocketToml,
    /// Environment override for page_size
    pub env_page_size: Option<usize>,
    /// Environment override for the log level
    pub env_log: Option<String>,
    /// CLI override: verbose mode
    pub verbose: bool,
    /// CLI override for the log format
    pub cli_log_format: Option<LogFormat>,
    /// CLI override for page_size
    pub cli_page_size: Option<usize>,
}

impl DocketConfig {
    /// Load from an explicit path, or from `docket.toml` in `dir` if present.
    pub fn load(explicit: Option<&Path>, dir: &Path) -> Result<Self> {
        let (path, toml) = match explicit {
            Some(path) => (Some(path.to_path_buf()), DocketToml::load(path)?),
            None => {
                let candidate = dir.join(CONFIG_FILE);
                let path = candidate.exists().then_some(candidate);
                (path, DocketToml::load_or_default(dir)?)
            }
        };
        Ok(Self {
            path,
            toml,
            ..Self::default()
        })
    }

    /// Apply environment overrides read through `lookup`.
    pub fn with_env<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup("DOCKET_PAGE_SIZE") {
            let size = raw
                .trim()
                .parse::<usize>()
                .with_context(|| format!("Invalid DOCKET_PAGE_SIZE '{}'", raw))?;
            self.env_page_size = Some(size);
        }
        self.env_log = lookup("DOCKET_LOG").filter(|value| !value.trim().is_empty());
        Ok(self)
    }

    /// Apply CLI overrides.
    pub fn with_cli_args(
        mut self,
        verbose: bool,
        log_format: Option<LogFormat>,
        page_size: Option<usize>,
    ) -> Self {
        self.verbose = verbose;
        self.cli_log_format = log_format;
        self.cli_page_size = page_size;
        self
    }

    /// Get page_size (CLI → env → file).
    pub fn page_size(&self) -> usize {
        self.cli_page_size
            .or(self.env_page_size)
            .unwrap_or(self.toml.pagination.page_size)
    }

    /// Get the log filter (verbose → env → file).
    pub fn log_level(&self) -> String {
        if self.verbose {
            return "debug".to_string();
        }
        self.env_log
            .clone()
            .unwrap_or_else(|| self.toml.logging.level.clone())
    }

    /// Get the log format (CLI → file).
    pub fn log_format(&self) -> LogFormat {
        self.cli_log_format.unwrap_or(self.toml.logging.format)
    }

    pub fn sort(&self) -> SortOrder {
        self.toml.collection.sort
    }

    pub fn policy(&self) -> ResolverPolicy {
        self.toml.policy()
    }

    /// Validate the effective settings.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut problems = self.toml.validate();

        let page_size = self.page_size();
        if page_size == 0 && self.toml.pagination.page_size != 0 {
            problems.push(ConfigError::InvalidPageSize(page_size));
        }
        if let Some(ref level) = self.env_log
            && !is_valid_log_level(level)
        {
            problems.push(ConfigError::InvalidValue {
                field: "DOCKET_LOG".to_string(),
                value: level.clone(),
            });
        }

        problems
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = DocketToml::parse("").unwrap();
        assert_eq!(config.collection.sort, SortOrder::NewestFirst);
        assert!(config.resolver.create_missing);
        assert!(config.resolver.redirect_to_first);
        assert_eq!(config.pagination.page_size, 20);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, LogFormat::Text);
        assert!(config.validate().is_empty());
    }

    #[test]
    fn test_parse_full_file() {
        let config = DocketToml::parse(
            r#"
[collection]
sort = "oldest_first"

[resolver]
create_missing = false

[pagination]
page_size = 50

[logging]
level = "docket=debug,warn"
format = "json"
"#,
        )
        .unwrap();

        assert_eq!(config.collection.sort, SortOrder::OldestFirst);
        assert!(!config.policy().create_missing);
        assert!(config.policy().redirect_to_first);
        assert_eq!(config.pagination.page_size, 50);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert!(config.validate().is_empty());
    }

    #[test]
    fn test_parse_rejects_unknown_sort() {
        let result = DocketToml::parse("[collection]\nsort = \"sideways\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_reports_bad_values() {
        let config = DocketToml::parse("[pagination]\npage_size = 0\n[logging]\nlevel = \"loud\"\n")
            .unwrap();
        let problems = config.validate();
        assert_eq!(
            problems,
            vec![
                ConfigError::InvalidPageSize(0),
                ConfigError::InvalidLogLevel("loud".to_string()),
            ]
        );
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        let mut config = DocketToml::default();
        config.pagination.page_size = 7;
        config.save(&path).unwrap();

        let loaded = DocketToml::load(&path).unwrap();
        assert_eq!(loaded.pagination.page_size, 7);
    }

    #[test]
    fn test_load_or_default_without_file() {
        let dir = tempdir().unwrap();
        let config = DocketToml::load_or_default(dir.path()).unwrap();
        assert_eq!(config.pagination.page_size, 20);
    }

    #[test]
    fn test_load_explicit_missing_file_fails() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        let err = DocketConfig::load(Some(&missing), dir.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn test_layering_file_env_cli() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            "[pagination]\npage_size = 10\n[logging]\nlevel = \"warn\"\n",
        )
        .unwrap();

        let config = DocketConfig::load(None, dir.path()).unwrap();
        assert!(config.path.is_some());
        assert_eq!(config.page_size(), 10);
        assert_eq!(config.log_level(), "warn");

        let config = config
            .with_env(env(&[("DOCKET_PAGE_SIZE", "30"), ("DOCKET_LOG", "error")]))
            .unwrap();
        assert_eq!(config.page_size(), 30);
        assert_eq!(config.log_level(), "error");

        let config = config.with_cli_args(true, Some(LogFormat::Json), Some(5));
        assert_eq!(config.page_size(), 5);
        assert_eq!(config.log_level(), "debug");
        assert_eq!(config.log_format(), LogFormat::Json);
    }

    #[test]
    fn test_env_page_size_must_be_numeric() {
        let err = DocketConfig::default()
            .with_env(env(&[("DOCKET_PAGE_SIZE", "lots")]))
            .unwrap_err();
        assert!(err.to_string().contains("DOCKET_PAGE_SIZE"));
    }

    #[test]
    fn test_validate_effective_overrides() {
        let config = DocketConfig::default()
            .with_env(env(&[("DOCKET_LOG", "chatty")]))
            .unwrap()
            .with_cli_args(false, None, Some(0));
        let problems = config.validate();
        assert!(problems.contains(&ConfigError::InvalidPageSize(0)));
        assert!(problems.contains(&ConfigError::InvalidValue {
            field: "DOCKET_LOG".to_string(),
            value: "chatty".to_string(),
        }));
    }

    #[test]
    fn test_log_format_from_str() {
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert!("xml".parse::<LogFormat>().is_err());
    }
}
