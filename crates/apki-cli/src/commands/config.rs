//! Config command - View and manage configuration
//!
//! - Show the effective configuration
//! - Create a default config file (local or global)
//! - Show configuration file paths

use std::path::PathBuf;

use anyhow::{Context, Result};
use apki_config::{ApkiConfig, ConfigLoader};
use clap::Subcommand;
use serde::Serialize;

use super::{print_json, workspace_root};
use crate::GlobalOptions;

/// Config management commands
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show the effective configuration after all overrides
    Show(ShowArgs),

    /// Create a config file with default values
    Init(InitArgs),

    /// Show configuration file paths
    Path(PathArgs),
}

/// Arguments for the show command
#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Output as JSON
    #[arg(long)]
    json: bool,
}

/// Arguments for the init command
#[derive(clap::Args, Debug)]
pub struct InitArgs {
    /// Create the global config (~/.apki/config.toml) instead of the local one
    #[arg(long)]
    global: bool,
}

/// Arguments for the path command
#[derive(clap::Args, Debug)]
pub struct PathArgs {
    /// Output as JSON
    #[arg(long)]
    json: bool,
}

/// Configuration paths
#[derive(Debug, Clone, Serialize)]
pub struct ConfigPaths {
    /// Global config file path
    pub global: Option<PathBuf>,
    /// Local config file path
    pub local: PathBuf,
    /// Explicit config file from --config
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explicit: Option<PathBuf>,
    /// Whether global config exists
    pub global_exists: bool,
    /// Whether local config exists
    pub local_exists: bool,
}

/// Execute the config command
pub async fn execute(cmd: ConfigCommand, config: ApkiConfig, global: GlobalOptions) -> Result<()> {
    match cmd {
        ConfigCommand::Show(args) => execute_show(args, &config),
        ConfigCommand::Init(args) => execute_init(args, &global),
        ConfigCommand::Path(args) => execute_path(args, &global),
    }
}

fn execute_show(args: ShowArgs, config: &ApkiConfig) -> Result<()> {
    if args.json {
        return print_json(config);
    }
    print!("{}", toml::to_string_pretty(config)?);
    Ok(())
}

fn execute_init(args: InitArgs, global: &GlobalOptions) -> Result<()> {
    let loader = ConfigLoader::new();
    let path = if args.global {
        loader.init_global()
    } else {
        loader.init_local(&workspace_root()?)
    }
    .context("Failed to create config file")?;

    if !global.quiet {
        println!("Config file: {}", path.display());
    }
    Ok(())
}

fn execute_path(args: PathArgs, global: &GlobalOptions) -> Result<()> {
    let loader = ConfigLoader::new();
    let global_path = loader.global_config_path();
    let local_path = loader.local_config_path(&workspace_root()?);

    let paths = ConfigPaths {
        global_exists: global_path.as_ref().map(|p| p.exists()).unwrap_or(false),
        local_exists: local_path.exists(),
        global: global_path,
        local: local_path,
        explicit: global.config.clone(),
    };

    if args.json {
        return print_json(&paths);
    }

    println!("Configuration Paths");
    println!("===================\n");

    if let Some(ref gp) = paths.global {
        println!("Global: {} ({})", gp.display(), exists_label(paths.global_exists));
    } else {
        println!("Global: not available (no home directory)");
    }
    println!(
        "Local:  {} ({})",
        paths.local.display(),
        exists_label(paths.local_exists)
    );
    if let Some(ref explicit) = paths.explicit {
        println!("Explicit: {} (overrides global and local)", explicit.display());
    }

    Ok(())
}

fn exists_label(exists: bool) -> &'static str {
    if exists {
        "exists"
    } else {
        "not found"
    }
}
