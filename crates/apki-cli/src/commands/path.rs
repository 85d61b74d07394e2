//! Path command - Run an arbitrary multi-step path query
//!
//! Steps are written `<direction>:<predicate>`, e.g.
//! `apki path curl --step out:depend --step in:provide`.

use anyhow::Result;
use apki_config::ApkiConfig;
use apki_core::{GraphError, PathQuery, Step};
use clap::Args;
use serde::Serialize;

use super::build::bootstrap;
use super::{open_service, print_json, with_service};
use crate::GlobalOptions;

/// Arguments for the path command
#[derive(Args, Debug)]
pub struct PathArgs {
    /// Start value (package or capability name)
    start: String,

    /// Traversal step, repeatable (out:depend, in:provide, out:install-if, ...)
    #[arg(long = "step", required = true)]
    steps: Vec<String>,

    /// Output as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Serialize)]
struct PathOutput {
    query: String,
    values: Vec<String>,
}

/// Build the query from CLI arguments.
fn parse_query(start: &str, steps: &[String]) -> Result<PathQuery, GraphError> {
    let mut query = PathQuery::new(start);
    for raw in steps {
        query = query.step(raw.parse::<Step>()?);
    }
    Ok(query)
}

/// Execute the path command
pub async fn execute(args: PathArgs, config: ApkiConfig, global: GlobalOptions) -> Result<()> {
    // Reject malformed steps before touching the store
    let query = parse_query(&args.start, &args.steps)?;

    let service = open_service(&config).await?;
    bootstrap(&service, global.quiet || args.json).await?;

    let result = {
        let query = query.clone();
        with_service(&service, move |service| service.query(&query)).await?
    };
    let values = result.sorted();

    if args.json {
        return print_json(&PathOutput {
            query: query.to_string(),
            values,
        });
    }

    for value in &values {
        println!("{}", value);
    }
    Ok(())
}
