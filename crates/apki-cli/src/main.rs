//! apki CLI - Package relationship graph queries
//!
//! Builds a persistent graph of provide / depend / install-if relationships
//! from a package index and answers dependency questions over it.
//!
//! # Usage
//!
//! ```bash
//! # Build the graph from a JSON package index
//! apki --index APKINDEX.json build
//!
//! # Packages satisfying the dependencies of curl
//! apki deps curl
//!
//! # Graph size
//! apki stats --json
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use apki_config::{ApkiConfig, BackendType, ConfigOverrides, LogFormat, LoggingConfig};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod boundary;
mod commands;
mod progress;

/// apki - Package relationship graph
#[derive(Parser, Debug)]
#[command(name = "apki")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalOptions,
}

/// Global options available to all commands
#[derive(Args, Debug, Clone)]
struct GlobalOptions {
    /// Path to configuration file (skips global and local config)
    #[arg(long, short = 'c', global = true, env = "APKI_CONFIG")]
    config: Option<PathBuf>,

    /// Quad store database file
    #[arg(long, short = 's', global = true, env = "APKI_STORE")]
    store: Option<PathBuf>,

    /// Store backend (sqlite, memory)
    #[arg(long, global = true, env = "APKI_BACKEND", value_parser = parse_backend)]
    backend: Option<BackendType>,

    /// JSON package index used to build the graph
    #[arg(long, short = 'i', global = true, env = "APKI_INDEX")]
    index: Option<PathBuf>,

    /// Enable verbose output
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    quiet: bool,
}

/// Parse backend type from string
fn parse_backend(s: &str) -> Result<BackendType, String> {
    s.parse()
        .map_err(|e: apki_config::ConfigError| e.to_string())
}

impl GlobalOptions {
    /// Convert global options to config overrides
    pub fn to_config_overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            store_path: self.store.clone(),
            backend: self.backend,
            index: self.index.clone(),
            log_level: if self.quiet {
                Some("error".to_string())
            } else if self.verbose {
                Some("debug".to_string())
            } else {
                None
            },
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build the package graph (no-op when already built)
    Build(commands::build::BuildArgs),

    /// Show node and quad counts
    Stats(commands::stats::StatsArgs),

    /// List packages providing the dependencies of a package
    Deps(commands::deps::DepsArgs),

    /// Run a multi-step path query
    Path(commands::path::PathArgs),

    /// Show the outgoing relationships of a package
    Show(commands::show::ShowArgs),

    /// View and manage configuration
    #[command(subcommand)]
    Config(commands::config::ConfigCommand),
}

/// Install the global tracing subscriber on stderr.
///
/// `RUST_LOG` takes precedence over the configured level.
fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let result = match logging.format {
        LogFormat::Text => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_ansi(true)
            .try_init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init(),
    };
    if let Err(e) = result {
        eprintln!("warning: failed to install log subscriber: {}", e);
    }
}

async fn run(command: Commands, config: ApkiConfig, global: GlobalOptions) -> Result<()> {
    match command {
        Commands::Build(args) => commands::build::execute(args, config, global).await,
        Commands::Stats(args) => commands::stats::execute(args, config, global).await,
        Commands::Deps(args) => commands::deps::execute(args, config, global).await,
        Commands::Path(args) => commands::path::execute(args, config, global).await,
        Commands::Show(args) => commands::show::execute(args, config, global).await,
        Commands::Config(cmd) => commands::config::execute(cmd, config, global).await,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = commands::load_config(&cli.global);

    // Logging follows the loaded config; a broken config still gets default logging
    let mut logging = match config {
        Ok(ref config) => config.logging.clone(),
        Err(_) => LoggingConfig::default(),
    };
    if let Some(level) = cli.global.to_config_overrides().log_level {
        logging.level = level;
    }
    init_tracing(&logging);

    let result = match config {
        Ok(config) => run(cli.command, config, cli.global).await,
        Err(err) => Err(err),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => boundary::report(&err),
    }
}
