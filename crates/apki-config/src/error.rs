//! Configuration error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading, checking or writing apki configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A config file or directory could not be read, written or created
    #[error("failed to {action} '{path}': {source}")]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A config file is not valid TOML or has fields of the wrong type
    #[error("invalid config file '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// `~/.apki` cannot be located
    #[error("could not determine home directory for the global config")]
    NoHomeDir,

    /// Backend name given on the command line or in `storage.backend`
    #[error("unknown storage backend '{0}' (expected sqlite or memory)")]
    UnknownBackend(String),

    /// A loaded configuration that [`ApkiConfig::validate`](crate::ApkiConfig::validate) rejects
    #[error("invalid configuration: {key} {reason}")]
    Validation {
        key: &'static str,
        reason: &'static str,
    },
}

impl ConfigError {
    pub fn read_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::io("read config file", path, source)
    }

    pub fn write_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::io("write config file", path, source)
    }

    pub fn create_dir(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::io("create config directory", path, source)
    }

    pub fn parse(path: impl Into<PathBuf>, source: toml::de::Error) -> Self {
        Self::Parse {
            path: path.into(),
            source,
        }
    }

    pub fn validation(key: &'static str, reason: &'static str) -> Self {
        Self::Validation { key, reason }
    }

    fn io(action: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            action,
            path: path.into(),
            source,
        }
    }
}
