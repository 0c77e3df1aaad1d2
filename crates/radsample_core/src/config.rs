//! Runtime configuration loaded from TOML.
//!
//! # Invariants
//! - Every field has a default; a missing config file yields `CoreConfig::default()`.
//! - `migration.batch_size` is at least 1 after loading.

use crate::ingest::parser::CleaningMode;
use crate::logging::default_log_level;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

const DEFAULT_SOURCE_FILE: &str = "nms_strontium90_milk_ssn_strontium90_lait.csv";
const DEFAULT_DATABASE_FILE: &str = "milk_samples.db";
const DEFAULT_MAX_ROWS: usize = 100;
const DEFAULT_BATCH_SIZE: usize = 100;

#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        path: Option<PathBuf>,
        source: toml::de::Error,
    },
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "cannot read config `{}`: {source}", path.display())
            }
            Self::Parse {
                path: Some(path),
                source,
            } => write!(f, "invalid config `{}`: {source}", path.display()),
            Self::Parse { path: None, source } => write!(f, "invalid config: {source}"),
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse { source, .. } => Some(source),
            Self::Invalid(_) => None,
        }
    }
}

/// Top-level configuration for the ingestion pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    pub data: DataConfig,
    pub database: DatabaseConfig,
    pub migration: MigrationConfig,
    pub logging: LoggingConfig,
}

/// Flat-file source and output settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub source_path: PathBuf,
    /// Directory receiving `samples_<id>.csv` files on save.
    pub output_dir: PathBuf,
    /// Row bound for file-backed loads; `None` reads the whole source.
    pub max_rows: Option<usize>,
    pub cleaning: CleaningMode,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            source_path: PathBuf::from(DEFAULT_SOURCE_FILE),
            output_dir: PathBuf::from("."),
            max_rows: Some(DEFAULT_MAX_ROWS),
            cleaning: CleaningMode::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_DATABASE_FILE),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MigrationConfig {
    pub batch_size: usize,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// Absolute directory for rolling log files; `None` disables file logging.
    pub dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level().to_string(),
            dir: None,
        }
    }
}

/// Loads configuration from `path`, falling back to defaults when absent.
pub fn load_config(path: &Path) -> Result<CoreConfig, ConfigError> {
    if !path.exists() {
        return Ok(CoreConfig::default());
    }

    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let config: CoreConfig = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: Some(path.to_path_buf()),
        source,
    })?;
    validate(config)
}

/// Parses configuration from TOML text.
pub fn parse_config(contents: &str) -> Result<CoreConfig, ConfigError> {
    let config: CoreConfig =
        toml::from_str(contents).map_err(|source| ConfigError::Parse { path: None, source })?;
    validate(config)
}

fn validate(config: CoreConfig) -> Result<CoreConfig, ConfigError> {
    if config.migration.batch_size == 0 {
        return Err(ConfigError::Invalid(
            "migration.batch_size must be at least 1".to_string(),
        ));
    }
    Ok(config)
}
