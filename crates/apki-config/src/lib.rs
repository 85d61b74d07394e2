//! apki Configuration Management
//!
//! Provides configuration loading with support for:
//! - Global config: `~/.apki/config.toml`
//! - Local config: `.apki/config.toml` (in the working directory)
//! - CLI overrides via `ConfigOverrides`
//!
//! Configuration is merged in order: global → local → CLI overrides.

mod error;
mod loader;

pub use error::ConfigError;
pub use loader::ConfigLoader;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default store location, relative to the working directory.
pub const DEFAULT_STORE_PATH: &str = ".apki/graph.db";

/// Root configuration for apki.
///
/// Represents the fully merged configuration from all sources.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct ApkiConfig {
    /// Quad store configuration
    pub storage: StorageConfig,

    /// Package metadata source
    pub source: SourceConfig,

    /// Path query limits
    pub query: QueryConfig,

    /// Bootstrap behavior
    pub bootstrap: BootstrapConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Storage configuration for the quad store.
///
/// # Example TOML
///
/// ```toml
/// [storage]
/// backend = "sqlite"  # or "memory"
/// path = "/var/lib/apki/graph.db"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct StorageConfig {
    /// Store backend
    pub backend: BackendType,

    /// Database file (sqlite backend only)
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: BackendType::default(),
            path: PathBuf::from(DEFAULT_STORE_PATH),
        }
    }
}

/// Store backend selection.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BackendType {
    /// Single-file SQLite database (default)
    #[default]
    Sqlite,
    /// In-process store, discarded on exit
    Memory,
}

impl std::fmt::Display for BackendType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite => write!(f, "sqlite"),
            Self::Memory => write!(f, "memory"),
        }
    }
}

impl std::str::FromStr for BackendType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sqlite" => Ok(Self::Sqlite),
            "memory" | "mem" => Ok(Self::Memory),
            _ => Err(ConfigError::UnknownBackend(s.to_string())),
        }
    }
}

/// Where package records come from.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct SourceConfig {
    /// JSON package index used for the bootstrap build
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<PathBuf>,
}

/// Bounds applied to every path query.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct QueryConfig {
    /// Maximum number of steps in one query
    pub max_steps: usize,

    /// Maximum size of the working set after any step
    pub max_frontier: usize,

    /// Per-query deadline in milliseconds (0 disables)
    pub timeout_ms: u64,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            max_steps: 16,
            max_frontier: 100_000,
            timeout_ms: 5_000,
        }
    }
}

impl QueryConfig {
    /// Deadline as a duration, `None` when disabled.
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_ms > 0).then(|| Duration::from_millis(self.timeout_ms))
    }
}

/// Bootstrap configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct BootstrapConfig {
    /// How to treat a store that already holds a completed build
    pub policy: BootstrapPolicy,
}

/// Rebuild policy for a completed store.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BootstrapPolicy {
    /// Never rebuild a completed store (default)
    #[default]
    Snapshot,
    /// Rebuild when the package source has changed
    Fingerprint,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable text format
    #[default]
    Text,
    /// JSON structured logging
    Json,
}

/// CLI overrides for configuration values.
///
/// Used to apply command-line arguments over file-based config.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    /// Override store path
    pub store_path: Option<PathBuf>,

    /// Override backend type
    pub backend: Option<BackendType>,

    /// Override package index
    pub index: Option<PathBuf>,

    /// Override log level
    pub log_level: Option<String>,
}

impl ApkiConfig {
    /// Apply CLI overrides to this configuration.
    pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) {
        if let Some(ref path) = overrides.store_path {
            self.storage.path = path.clone();
        }

        if let Some(backend) = overrides.backend {
            self.storage.backend = backend;
        }

        if let Some(ref index) = overrides.index {
            self.source.index = Some(index.clone());
        }

        if let Some(ref level) = overrides.log_level {
            self.logging.level = level.clone();
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.storage.backend == BackendType::Sqlite && self.storage.path.as_os_str().is_empty()
        {
            return Err(ConfigError::validation("storage.path", "required for the sqlite backend"));
        }
        if self.query.max_steps == 0 {
            return Err(ConfigError::validation("query.max_steps", "must be greater than zero"));
        }
        if self.query.max_frontier == 0 {
            return Err(ConfigError::validation("query.max_frontier", "must be greater than zero"));
        }
        Ok(())
    }

    /// Get the effective store path for a working directory.
    pub fn store_path(&self, workspace_root: &Path) -> PathBuf {
        if self.storage.path.is_absolute() {
            self.storage.path.clone()
        } else {
            workspace_root.join(&self.storage.path)
        }
    }

    /// Get the effective package index path, if one is configured.
    pub fn index_path(&self, workspace_root: &Path) -> Option<PathBuf> {
        self.source.index.as_ref().map(|index| {
            if index.is_absolute() {
                index.clone()
            } else {
                workspace_root.join(index)
            }
        })
    }
}
