//! Analyzer configuration
//!
//! Values come from, in increasing precedence:
//! - built-in defaults
//! - a TOML file (`--config PATH`, else `./squidlog.toml` when present)
//! - `SQUIDLOG_*` environment variables

use crate::error::AnalyzerError;
use crate::ingest::{FormatSelector, StreamingConfig};
use crate::parsers::RegexFormatConfig;
use crate::registry::FormatRegistry;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Config file picked up from the working directory when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "squidlog.toml";

pub const ENV_LOG_PATH: &str = "SQUIDLOG_LOG_PATH";
pub const ENV_REPORTS_DIR: &str = "SQUIDLOG_REPORTS_DIR";
pub const ENV_FORMAT: &str = "SQUIDLOG_FORMAT";
pub const ENV_LOG_LEVEL: &str = "SQUIDLOG_LOG_LEVEL";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive; `RUST_LOG` wins when set
    pub level: String,
    /// `pretty` or `json`
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: "pretty".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Access log analysed when no file is named on the command line
    pub log_path: PathBuf,
    /// Where rendered reports are written
    pub reports_dir: PathBuf,
    pub report_title: String,
    pub max_users: usize,
    pub max_sites: usize,
    /// Users left out of the top-users ranking
    pub excluded_users: Vec<String>,
    /// Domains left out of the top-sites ranking
    pub excluded_domains: Vec<String>,
    pub format: FormatSelector,
    pub streaming: StreamingConfig,
    pub logging: LoggingConfig,
    /// Extra regex grammars, registered after the built-ins
    pub formats: Vec<RegexFormatConfig>,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            log_path: PathBuf::from("/var/log/squid/access.log"),
            reports_dir: PathBuf::from("/var/www/slam"),
            report_title: "Squid Usage Report".to_string(),
            max_users: 10,
            max_sites: 20,
            excluded_users: vec!["proxy".to_string(), "admin".to_string()],
            excluded_domains: vec![
                "localhost".to_string(),
                "127.0.0.1".to_string(),
                "::1".to_string(),
            ],
            format: FormatSelector::Auto,
            streaming: StreamingConfig::default(),
            logging: LoggingConfig::default(),
            formats: Vec::new(),
        }
    }
}

impl AnalyzerConfig {
    /// Config file `load` reads: `path` when given, else `./squidlog.toml`
    /// if it exists
    pub fn locate(path: Option<&Path>) -> Option<PathBuf> {
        match path {
            Some(path) => Some(path.to_path_buf()),
            None => Some(PathBuf::from(DEFAULT_CONFIG_FILE)).filter(|local| local.exists()),
        }
    }

    /// Load from the located file or the defaults, then apply environment
    /// overrides and validate
    pub fn load(path: Option<&Path>) -> Result<Self, AnalyzerError> {
        let mut config = match Self::locate(path) {
            Some(file) => Self::load_from_file(&file)?,
            None => Self::default(),
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    pub fn load_from_file(path: &Path) -> Result<Self, AnalyzerError> {
        let content = fs::read_to_string(path)
            .map_err(|e| AnalyzerError::io("read", &path.display().to_string(), &e))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, AnalyzerError> {
        toml::from_str(content).map_err(|e| AnalyzerError::configuration("config file", e.to_string()))
    }

    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| env::var(key).ok());
    }

    /// Apply overrides from any key lookup; empty values are ignored
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let value_of = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(value) = value_of(ENV_LOG_PATH) {
            self.log_path = PathBuf::from(value);
        }
        if let Some(value) = value_of(ENV_REPORTS_DIR) {
            self.reports_dir = PathBuf::from(value);
        }
        if let Some(value) = value_of(ENV_FORMAT) {
            self.format = FormatSelector::from(value);
        }
        if let Some(value) = value_of(ENV_LOG_LEVEL) {
            self.logging.level = value;
        }
    }

    /// Registry with the built-ins plus every `[[formats]]` entry
    pub fn registry(&self) -> Result<FormatRegistry, AnalyzerError> {
        FormatRegistry::with_custom(&self.formats)
    }

    pub fn validate(&self) -> Result<(), AnalyzerError> {
        if self.max_users == 0 {
            return Err(AnalyzerError::configuration("max_users", "must be greater than zero"));
        }
        if self.max_sites == 0 {
            return Err(AnalyzerError::configuration("max_sites", "must be greater than zero"));
        }
        if self.streaming.sample_size == 0 {
            return Err(AnalyzerError::configuration(
                "streaming.sample_size",
                "must be greater than zero",
            ));
        }
        if self.streaming.buffer_size == 0 {
            return Err(AnalyzerError::configuration(
                "streaming.buffer_size",
                "must be greater than zero",
            ));
        }
        if !matches!(self.logging.format.as_str(), "pretty" | "json") {
            return Err(AnalyzerError::configuration(
                "logging.format",
                format!("expected 'pretty' or 'json', got '{}'", self.logging.format),
            ));
        }

        let registry = self.registry()?;
        if let FormatSelector::Named(name) = &self.format {
            registry
                .resolve(name)
                .map_err(|e| AnalyzerError::configuration("format", e.to_string()))?;
        }
        registry
            .resolve(&self.streaming.default_format)
            .map_err(|e| AnalyzerError::configuration("streaming.default_format", e.to_string()))?;

        Ok(())
    }

    pub fn excluded_user_set(&self) -> HashSet<String> {
        self.excluded_users.iter().cloned().collect()
    }

    pub fn excluded_domain_set(&self) -> HashSet<String> {
        self.excluded_domains.iter().cloned().collect()
    }
}
