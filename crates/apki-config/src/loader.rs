//! Configuration loader with inheritance support.
//!
//! Loads configuration from multiple sources and merges them:
//! 1. Global config: `~/.apki/config.toml`
//! 2. Local config: `.apki/config.toml` (in the working directory)
//! 3. CLI overrides
//!
//! Later sources override earlier ones.

use crate::error::ConfigError;
use crate::{
    ApkiConfig, BackendType, BootstrapConfig, BootstrapPolicy, ConfigOverrides, LoggingConfig,
    QueryConfig, SourceConfig, StorageConfig, DEFAULT_STORE_PATH,
};
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// Configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Global configuration directory name.
const GLOBAL_CONFIG_DIR: &str = ".apki";

/// Local configuration directory name.
const LOCAL_CONFIG_DIR: &str = ".apki";

/// Configuration loader with global/local inheritance.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Global config directory (e.g., `~/.apki`)
    global_config_dir: Option<PathBuf>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Create a new configuration loader.
    ///
    /// Automatically detects the global config directory (`~/.apki`).
    pub fn new() -> Self {
        Self {
            global_config_dir: dirs::home_dir().map(|h| h.join(GLOBAL_CONFIG_DIR)),
        }
    }

    /// Create a loader with a custom global config directory.
    pub fn with_global_dir(global_dir: impl Into<PathBuf>) -> Self {
        Self {
            global_config_dir: Some(global_dir.into()),
        }
    }

    /// Get the global config file path.
    pub fn global_config_path(&self) -> Option<PathBuf> {
        self.global_config_dir
            .as_ref()
            .map(|d| d.join(CONFIG_FILE_NAME))
    }

    /// Get the local config file path for a working directory.
    pub fn local_config_path(&self, workspace_root: &Path) -> PathBuf {
        workspace_root.join(LOCAL_CONFIG_DIR).join(CONFIG_FILE_NAME)
    }

    /// Load configuration with optional CLI overrides.
    ///
    /// Merges config in order: global → local → overrides.
    pub fn load(
        &self,
        workspace_root: &Path,
        overrides: Option<&ConfigOverrides>,
    ) -> Result<ApkiConfig, ConfigError> {
        let mut config = ApkiConfig::default();

        if let Some(global_config) = self.load_global()? {
            config = merge_configs(config, global_config);
        }

        if let Some(local_config) = self.load_local(workspace_root)? {
            config = merge_configs(config, local_config);
        }

        if let Some(ovr) = overrides {
            config.apply_overrides(ovr);
        }

        Ok(config)
    }

    /// Load configuration from one explicit file, then apply overrides.
    ///
    /// Global and local files are not consulted.
    pub fn load_file(
        &self,
        path: &Path,
        overrides: Option<&ConfigOverrides>,
    ) -> Result<ApkiConfig, ConfigError> {
        debug!("Loading config from {:?}", path);
        let mut config = merge_configs(ApkiConfig::default(), load_config_file(path)?);
        if let Some(ovr) = overrides {
            config.apply_overrides(ovr);
        }
        Ok(config)
    }

    /// Load only the global configuration.
    pub fn load_global(&self) -> Result<Option<ApkiConfig>, ConfigError> {
        let Some(global_path) = self.global_config_path() else {
            debug!("No home directory found, skipping global config");
            return Ok(None);
        };

        if !global_path.exists() {
            trace!("Global config not found at {:?}", global_path);
            return Ok(None);
        }

        debug!("Loading global config from {:?}", global_path);
        load_config_file(&global_path).map(Some)
    }

    /// Load only the local configuration.
    pub fn load_local(&self, workspace_root: &Path) -> Result<Option<ApkiConfig>, ConfigError> {
        let local_path = self.local_config_path(workspace_root);

        if !local_path.exists() {
            trace!("Local config not found at {:?}", local_path);
            return Ok(None);
        }

        debug!("Loading local config from {:?}", local_path);
        load_config_file(&local_path).map(Some)
    }

    /// Save configuration to the local config file.
    pub fn save_local(&self, workspace_root: &Path, config: &ApkiConfig) -> Result<(), ConfigError> {
        let local_path = self.local_config_path(workspace_root);
        save_config_file(&local_path, config)
    }

    /// Initialize global configuration.
    ///
    /// Creates `~/.apki/config.toml` with default configuration.
    pub fn init_global(&self) -> Result<PathBuf, ConfigError> {
        let Some(ref global_dir) = self.global_config_dir else {
            return Err(ConfigError::NoHomeDir);
        };
        init_config_file(&global_dir.join(CONFIG_FILE_NAME))
    }

    /// Initialize local configuration.
    ///
    /// Creates `.apki/config.toml` with default configuration.
    pub fn init_local(&self, workspace_root: &Path) -> Result<PathBuf, ConfigError> {
        init_config_file(&self.local_config_path(workspace_root))
    }
}

/// Write the default configuration unless the file already exists.
fn init_config_file(path: &Path) -> Result<PathBuf, ConfigError> {
    if !path.exists() {
        save_config_file(path, &ApkiConfig::default())?;
    }
    Ok(path.to_path_buf())
}

/// Load a configuration file from disk.
fn load_config_file(path: &Path) -> Result<ApkiConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;

    toml::from_str(&content).map_err(|e| ConfigError::parse(path, e))
}

/// Save a configuration file to disk.
fn save_config_file(path: &Path, config: &ApkiConfig) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        if !parent.exists() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::create_dir(parent, e))?;
        }
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))
}

/// Merge two configurations, with `overlay` taking precedence.
///
/// Overlay fields still at their default value keep the base value, so a
/// partial file only changes what it names. A consequence is that a later
/// layer cannot put a field back to its default once an earlier layer changed
/// it (a local `backend = "sqlite"` does not undo a global `"memory"`); use
/// `--backend`/`--store` or an explicit `--config` file for that.
fn merge_configs(base: ApkiConfig, overlay: ApkiConfig) -> ApkiConfig {
    ApkiConfig {
        storage: merge_storage(base.storage, overlay.storage),
        source: merge_source(base.source, overlay.source),
        query: merge_query(base.query, overlay.query),
        bootstrap: merge_bootstrap(base.bootstrap, overlay.bootstrap),
        logging: merge_logging(base.logging, overlay.logging),
    }
}

fn merge_storage(base: StorageConfig, overlay: StorageConfig) -> StorageConfig {
    StorageConfig {
        backend: if overlay.backend != BackendType::default() {
            overlay.backend
        } else {
            base.backend
        },
        path: if overlay.path != Path::new(DEFAULT_STORE_PATH) {
            overlay.path
        } else {
            base.path
        },
    }
}

fn merge_source(base: SourceConfig, overlay: SourceConfig) -> SourceConfig {
    SourceConfig {
        index: overlay.index.or(base.index),
    }
}

fn merge_query(base: QueryConfig, overlay: QueryConfig) -> QueryConfig {
    let defaults = QueryConfig::default();
    QueryConfig {
        max_steps: if overlay.max_steps != defaults.max_steps {
            overlay.max_steps
        } else {
            base.max_steps
        },
        max_frontier: if overlay.max_frontier != defaults.max_frontier {
            overlay.max_frontier
        } else {
            base.max_frontier
        },
        timeout_ms: if overlay.timeout_ms != defaults.timeout_ms {
            overlay.timeout_ms
        } else {
            base.timeout_ms
        },
    }
}

fn merge_bootstrap(base: BootstrapConfig, overlay: BootstrapConfig) -> BootstrapConfig {
    BootstrapConfig {
        policy: if overlay.policy != BootstrapPolicy::default() {
            overlay.policy
        } else {
            base.policy
        },
    }
}

fn merge_logging(base: LoggingConfig, overlay: LoggingConfig) -> LoggingConfig {
    let defaults = LoggingConfig::default();
    LoggingConfig {
        level: if overlay.level != defaults.level {
            overlay.level
        } else {
            base.level
        },
        format: if overlay.format != defaults.format {
            overlay.format
        } else {
            base.format
        },
    }
}
