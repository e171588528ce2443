//! Configuration for check reporting
//!
//! Loaded once at startup from a TOML file (default `/etc/sn1ff/check.toml`).
//! Every field has a default so a missing file is not an error.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::{Result, Sn1ffError};

/// Default location of the configuration file
pub const DEFAULT_CONFIG_PATH: &str = "/etc/sn1ff/check.toml";

/// Top-level check reporting configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CheckConfig {
    /// How to reach the collector
    #[serde(default)]
    pub collector: CollectorConfig,

    /// Local record storage
    #[serde(default)]
    pub records: RecordsConfig,

    /// Logging
    #[serde(default)]
    pub log: LogConfig,
}

/// Collector invocation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectorConfig {
    /// Collector executable, looked up on PATH unless absolute
    #[serde(default = "default_program")]
    pub program: String,

    /// Arguments placed before the begin/end directives
    #[serde(default)]
    pub args: Vec<String>,

    /// Upper bound on a single collector invocation
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Remote sn1ff server host; submissions stay local when unset
    #[serde(default)]
    pub remote_host: Option<String>,
}

/// Local record settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordsConfig {
    /// Directory the collector opens records in (default `$HOME/sn1ff`)
    #[serde(default)]
    pub dir: Option<PathBuf>,

    /// Age after which an unsubmitted record is swept
    #[serde(default = "default_orphan_max_age_mins")]
    pub orphan_max_age_mins: u64,
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogConfig {
    /// Minimum level (`error`, `warn`, `info`, `debug`, `trace`)
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_program() -> String {
    "sn1ff_client".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_orphan_max_age_mins() -> u64 {
    24 * 60
}

fn default_log_level() -> String {
    "info".to_string()
}

impl CheckConfig {
    /// Load configuration from `path` or use defaults when it does not exist
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            Sn1ffError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let config: Self = toml::from_str(&content).map_err(|e| {
            Sn1ffError::Config(format!("Failed to parse {}: {}", path.display(), e))
        })?;
        config
            .collector
            .validate()
            .map_err(|e| Sn1ffError::Config(format!("{}: {}", path.display(), e)))?;
        Ok(config)
    }

    /// Write the default configuration to `path`, creating parent directories
    pub fn write_default(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(&Self::default()).map_err(|e| {
            Sn1ffError::Config(format!("Failed to serialize config: {}", e))
        })?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

impl CollectorConfig {
    /// Reject settings that would make every collector call fail
    pub fn validate(&self) -> Result<()> {
        if self.timeout_secs == 0 {
            return Err(Sn1ffError::Config(
                "collector.timeout_secs must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

impl RecordsConfig {
    /// Resolve the record directory, falling back to `$HOME/sn1ff`
    pub fn resolve_dir(&self) -> Result<PathBuf> {
        match &self.dir {
            Some(dir) => Ok(dir.clone()),
            None => dirs::home_dir()
                .map(|home| home.join("sn1ff"))
                .ok_or_else(|| {
                    Sn1ffError::Config("Could not determine home directory".to_string())
                }),
        }
    }

    /// Saturates, so a huge value means "never sweep" rather than wrapping
    pub fn orphan_max_age(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.orphan_max_age_mins.saturating_mul(60))
    }
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
            args: Vec::new(),
            timeout_secs: default_timeout_secs(),
            remote_host: None,
        }
    }
}

impl Default for RecordsConfig {
    fn default() -> Self {
        Self {
            dir: None,
            orphan_max_age_mins: default_orphan_max_age_mins(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}
