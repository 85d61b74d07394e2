//! Stats command - Show graph size

use anyhow::Result;
use apki_config::ApkiConfig;
use clap::Args;

use super::build::bootstrap;
use super::{open_service, print_json, with_service};
use crate::GlobalOptions;

/// Arguments for the stats command
#[derive(Args, Debug)]
pub struct StatsArgs {
    /// Output as JSON
    #[arg(long)]
    json: bool,
}

/// Execute the stats command
pub async fn execute(args: StatsArgs, config: ApkiConfig, global: GlobalOptions) -> Result<()> {
    let service = open_service(&config).await?;
    bootstrap(&service, global.quiet || args.json).await?;

    let stats = with_service(&service, |service| service.get_stats()).await?;

    if args.json {
        return print_json(&stats);
    }

    println!("Nodes: {}", stats.nodes);
    println!("Quads: {}", stats.quads);
    Ok(())
}
