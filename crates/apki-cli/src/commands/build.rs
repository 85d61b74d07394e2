//! Build command - Run the bootstrap build and report what happened

use std::sync::Arc;

use anyhow::Result;
use apki_config::ApkiConfig;
use apki_core::{BootstrapOutcome, GraphService, RebuildReason};
use clap::Args;
use serde::Serialize;

use super::{open_service, print_info, print_json, with_service};
use crate::progress::{self, BuildBar};
use crate::GlobalOptions;

/// Arguments for the build command
#[derive(Args, Debug)]
pub struct BuildArgs {
    /// Output as JSON
    #[arg(long)]
    json: bool,
}

/// Machine-readable build summary
#[derive(Debug, Serialize)]
struct BuildSummary {
    outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<&'static str>,
    records: u64,
    quads: u64,
    nodes: u64,
}

fn reason_str(reason: RebuildReason) -> &'static str {
    match reason {
        RebuildReason::Incomplete => "incomplete",
        RebuildReason::Stale => "stale",
        RebuildReason::Empty => "empty",
    }
}

/// One-line description of a bootstrap outcome.
pub fn describe_outcome(outcome: &BootstrapOutcome) -> String {
    match outcome {
        BootstrapOutcome::AlreadyReady => "Graph ready".to_string(),
        BootstrapOutcome::Reused(marker) => format!(
            "Using existing graph ({} records, {} quads)",
            marker.record_count, marker.quad_count
        ),
        BootstrapOutcome::Built(report) => format!(
            "Built graph ({} records, {} quads)",
            report.records, report.quads
        ),
        BootstrapOutcome::Rebuilt { reason, report } => format!(
            "Rebuilt graph, previous build was {} ({} records, {} quads)",
            reason_str(*reason),
            report.records,
            report.quads
        ),
    }
}

/// Make sure the graph is built, drawing a progress bar while indexing.
pub async fn bootstrap(service: &Arc<GraphService>, quiet: bool) -> Result<BootstrapOutcome> {
    let outcome = with_service(service, move |service| {
        let bar = BuildBar::new(quiet);
        service.bootstrap(Some(&bar))
    })
    .await?;

    if matches!(
        outcome,
        BootstrapOutcome::Built(_) | BootstrapOutcome::Rebuilt { .. }
    ) {
        print_info(&describe_outcome(&outcome), quiet);
    }
    Ok(outcome)
}

/// Execute the build command
pub async fn execute(args: BuildArgs, config: ApkiConfig, global: GlobalOptions) -> Result<()> {
    let quiet = global.quiet || args.json;
    let service = open_service(&config).await?;

    let pb = progress::spinner("Checking graph...", quiet);
    let line = pb.clone();
    let outcome = with_service(&service, move |service| {
        let bar = BuildBar::over_spinner(line, quiet);
        service.bootstrap(Some(&bar))
    })
    .await;
    let outcome = match outcome {
        Ok(outcome) => outcome,
        Err(err) => {
            progress::clear_spinner(pb);
            return Err(err);
        }
    };
    let stats = with_service(&service, |service| service.get_stats()).await?;

    if args.json {
        let (outcome_name, reason, records, quads) = match &outcome {
            BootstrapOutcome::AlreadyReady => ("ready", None, 0, stats.quads),
            BootstrapOutcome::Reused(marker) => {
                ("reused", None, marker.record_count, marker.quad_count)
            }
            BootstrapOutcome::Built(report) => {
                ("built", None, report.records as u64, report.quads as u64)
            }
            BootstrapOutcome::Rebuilt { reason, report } => (
                "rebuilt",
                Some(reason_str(*reason)),
                report.records as u64,
                report.quads as u64,
            ),
        };
        progress::clear_spinner(pb);
        return print_json(&BuildSummary {
            outcome: outcome_name,
            reason,
            records,
            quads,
            nodes: stats.nodes,
        });
    }

    let message = format!("{}, {} nodes", describe_outcome(&outcome), stats.nodes);
    match outcome {
        BootstrapOutcome::Rebuilt {
            reason: RebuildReason::Incomplete,
            ..
        } => progress::finish_spinner_warn(pb, &message),
        _ => progress::finish_spinner(pb, &message),
    }
    if quiet {
        println!("{}", message);
    }
    Ok(())
}
