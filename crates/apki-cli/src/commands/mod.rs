//! CLI command implementations
//!
//! This module contains all apki CLI command implementations.

pub mod build;
pub mod config;
pub mod deps;
pub mod path;
pub mod show;
pub mod stats;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use apki_config::{ApkiConfig, BackendType, BootstrapPolicy, ConfigLoader};
use apki_core::{
    open_store, GraphError, GraphService, JsonIndexSource, PackageGraph, PackageRecord,
    PackageSource, QueryLimits, RebuildPolicy, SourceError, StoreConfig,
};

use crate::GlobalOptions;

/// Directory that relative config paths are resolved against.
pub fn workspace_root() -> Result<PathBuf> {
    std::env::current_dir().context("Failed to get current directory")
}

/// Load configuration: an explicit file, or global -> local, then CLI overrides.
pub fn load_config(global: &GlobalOptions) -> Result<ApkiConfig> {
    let workspace = workspace_root()?;
    let loader = ConfigLoader::new();
    let overrides = global.to_config_overrides();

    let config = match global.config {
        Some(ref path) => loader.load_file(path, Some(&overrides)),
        None => loader.load(&workspace, Some(&overrides)),
    }
    .context("Failed to load configuration")?;

    config.validate().context("Invalid configuration")?;
    Ok(config)
}

/// Store settings for the configured backend.
pub fn store_config(config: &ApkiConfig, workspace: &Path) -> StoreConfig {
    match config.storage.backend {
        BackendType::Sqlite => StoreConfig::sqlite(config.store_path(workspace)),
        BackendType::Memory => StoreConfig::memory(),
    }
}

pub fn query_limits(config: &ApkiConfig) -> QueryLimits {
    QueryLimits {
        max_steps: config.query.max_steps,
        max_frontier: config.query.max_frontier,
        timeout: config.query.timeout(),
    }
}

pub fn rebuild_policy(config: &ApkiConfig) -> RebuildPolicy {
    match config.bootstrap.policy {
        BootstrapPolicy::Snapshot => RebuildPolicy::Snapshot,
        BootstrapPolicy::Fingerprint => RebuildPolicy::Fingerprint,
    }
}

/// Source used when no package index is configured.
///
/// A completed store never consults it; building fails with a clear message.
struct MissingIndex;

impl PackageSource for MissingIndex {
    fn describe(&self) -> String {
        "no package index".to_string()
    }

    fn load(&self) -> Result<Vec<PackageRecord>, SourceError> {
        Err(SourceError::Unavailable(
            "no package index configured (pass --index or set source.index)".to_string(),
        ))
    }
}

pub fn package_source(config: &ApkiConfig, workspace: &Path) -> Arc<dyn PackageSource> {
    match config.index_path(workspace) {
        Some(path) => Arc::new(JsonIndexSource::new(path)),
        None => Arc::new(MissingIndex),
    }
}

/// Open the configured store and wrap it in a graph service.
pub async fn open_service(config: &ApkiConfig) -> Result<Arc<GraphService>> {
    let workspace = workspace_root()?;
    let store_config = store_config(config, &workspace);

    let store = tokio::task::spawn_blocking(move || open_store(&store_config))
        .await
        .context("Store task failed")?
        .map_err(GraphError::from)
        .context("Failed to open quad store")?;

    let graph = PackageGraph::new(store, rebuild_policy(config));
    Ok(Arc::new(GraphService::new(
        Arc::new(graph),
        package_source(config, &workspace),
        query_limits(config),
    )))
}

/// Run blocking graph work off the async runtime.
pub async fn with_service<T, F>(service: &Arc<GraphService>, f: F) -> Result<T>
where
    F: FnOnce(&GraphService) -> Result<T, GraphError> + Send + 'static,
    T: Send + 'static,
{
    let service = Arc::clone(service);
    let result = tokio::task::spawn_blocking(move || f(&service))
        .await
        .context("Graph task failed")?;
    Ok(result?)
}

/// Print an info message (respects quiet flag).
pub fn print_info(message: &str, quiet: bool) {
    if !quiet {
        eprintln!("{}", message);
    }
}

/// Print a value as pretty JSON on stdout.
pub fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
