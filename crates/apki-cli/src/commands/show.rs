//! Show command - Outgoing relationships of a package with raw labels

use anyhow::Result;
use apki_config::ApkiConfig;
use clap::Args;

use super::build::bootstrap;
use super::{open_service, print_info, print_json, with_service};
use crate::GlobalOptions;

/// Arguments for the show command
#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Package name
    package: String,

    /// Output as JSON
    #[arg(long)]
    json: bool,
}

/// Execute the show command
pub async fn execute(args: ShowArgs, config: ApkiConfig, global: GlobalOptions) -> Result<()> {
    let quiet = global.quiet || args.json;
    let service = open_service(&config).await?;
    bootstrap(&service, quiet).await?;

    let package = args.package.clone();
    let quads = with_service(&service, move |service| service.describe(&package)).await?;

    if args.json {
        return print_json(&quads);
    }

    if quads.is_empty() {
        print_info(&format!("Package '{}' not found", args.package), quiet);
        return Ok(());
    }
    println!("{}", args.package);
    for quad in &quads {
        println!("  {:<10} {:<30} ({})", quad.predicate, quad.object, quad.label);
    }
    Ok(())
}
