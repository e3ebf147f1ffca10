//! SQL validation command implementation

use anyhow::Result;
use lo_core::{ExploreStatus, ValidationReport};
use lo_validate::{
    build_model, CancelToken, DiscoveryOptions, ProfiledQuery, SqlOptions, SqlValidator,
};
use std::time::Duration;

use crate::cli::{GlobalArgs, OutputFormat, SqlArgs};
use crate::commands::common::{self, ExitCode, EXIT_VALIDATION_FAILED};

/// Execute the sql command
pub async fn execute(args: &SqlArgs, global: &GlobalArgs) -> Result<()> {
    let api = common::build_client(global)?;
    let selector = common::build_selector(&args.explores)?;

    let discovery = DiscoveryOptions {
        ignore_hidden: args.ignore_hidden,
        include_dimensions: true,
    };
    let model = build_model(api.as_ref(), &args.model, &selector, &discovery)
        .await
        .map_err(common::engine_failure)?;

    let cancel = CancelToken::new();
    common::wire_interrupt(cancel.clone());

    let options = SqlOptions {
        concurrency: args.concurrency,
        timeout: args.timeout.map(Duration::from_secs),
        fail_fast: args.fail_fast,
        chunk_size: args.chunk_size,
        runtime_threshold: args.runtime_threshold,
        ..SqlOptions::default()
    };

    if global.output == OutputFormat::Text {
        println!(
            "Validating {} explore(s) in model '{}'...\n",
            model.active_explores().count(),
            model.name
        );
    }

    let (report, slow_queries) = SqlValidator::new(api, options).validate(&model, cancel).await;

    match global.output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => {
            print_report(&report);
            if args.profile {
                print_profile(&slow_queries);
            }
        }
    }

    if !report.passed() {
        return Err(ExitCode(EXIT_VALIDATION_FAILED).into());
    }
    Ok(())
}

fn print_report(report: &ValidationReport) {
    for result in &report.explores {
        match result.status {
            ExploreStatus::Passed => println!("  ✓ {}", result.explore),
            ExploreStatus::Skipped => {
                let reason = result
                    .skip_reason
                    .map(|reason| reason.to_string())
                    .unwrap_or_default();
                println!("  - {} ({})", result.explore, reason);
            }
            _ => {
                println!("  ✗ {} [{}]", result.explore, result.status);
                for issue in &result.errors {
                    match &issue.dimension {
                        Some(dimension) => println!("      {}: {}", dimension, issue.message),
                        None => println!("      {}", issue.message),
                    }
                    if let Some(url) = &issue.lookml_url {
                        println!("        {}", url);
                    }
                }
            }
        }
    }

    println!(
        "\nExplores: {} tested, dimensions: {}, queries issued: {}, dimensions flagged: {}",
        report.stats.explores_tested,
        report.stats.dimensions_tested,
        report.stats.queries_issued,
        report.stats.dimensions_flagged
    );
}

/// Print queries the profiler retained, slowest first.
fn print_profile(slow_queries: &[ProfiledQuery]) {
    println!();
    if slow_queries.is_empty() {
        println!("No queries exceeded the profiler threshold.");
        return;
    }
    println!(
        "{:<10} {:<40} {:>12} {:<12}",
        "Type", "Name", "Runtime (s)", "Query ID"
    );
    for query in slow_queries {
        println!(
            "{:<10} {:<40} {:>12.1} {:<12}",
            query.kind, query.name, query.runtime, query.query_id
        );
        if let Some(url) = &query.explore_url {
            println!("           {}", url);
        }
    }
}
