//! Deps command - Packages providing the dependencies of a package
//!
//! With `--hops N` the (depend, provide) hop is repeated N times, reaching
//! the providers of the providers' dependencies.

use anyhow::Result;
use apki_config::ApkiConfig;
use clap::Args;

use super::build::bootstrap;
use super::{open_service, print_info, print_json, with_service};
use crate::GlobalOptions;

/// Arguments for the deps command
#[derive(Args, Debug)]
pub struct DepsArgs {
    /// Package name
    package: String,

    /// Number of dependency hops to follow
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u64).range(1..))]
    hops: u64,

    /// Output as JSON
    #[arg(long)]
    json: bool,
}

/// Execute the deps command
pub async fn execute(args: DepsArgs, config: ApkiConfig, global: GlobalOptions) -> Result<()> {
    let quiet = global.quiet || args.json;
    let service = open_service(&config).await?;
    bootstrap(&service, quiet).await?;

    let package = args.package.clone();
    let hops = usize::try_from(args.hops).unwrap_or(usize::MAX);
    let dependents = with_service(&service, move |service| {
        service.get_transitive_dependents(&package, hops)
    })
    .await?;

    if args.json {
        return print_json(&dependents);
    }

    if dependents.dependencies.is_empty() {
        print_info(&format!("No dependencies found for '{}'", args.package), quiet);
        return Ok(());
    }
    for name in &dependents.dependencies {
        println!("{}", name);
    }
    Ok(())
}
