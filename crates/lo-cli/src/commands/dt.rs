//! Data test command implementation

use anyhow::Result;
use lo_validate::{build_model, DataTestResult, DataTestValidator, DiscoveryOptions};

use crate::cli::{DtArgs, GlobalArgs, OutputFormat};
use crate::commands::common::{self, ExitCode, EXIT_VALIDATION_FAILED};

/// Execute the dt command
pub async fn execute(args: &DtArgs, global: &GlobalArgs) -> Result<()> {
    let api = common::build_client(global)?;
    let selector = common::build_selector(&args.explores)?;

    // Tests are matched by explore name; dimensions are not needed.
    let discovery = DiscoveryOptions {
        ignore_hidden: false,
        include_dimensions: false,
    };
    let model = build_model(api.as_ref(), &args.model, &selector, &discovery)
        .await
        .map_err(common::engine_failure)?;

    let validator = DataTestValidator::new(api);
    let tests = validator
        .get_tests(&model)
        .await
        .map_err(common::engine_failure)?;

    if global.output == OutputFormat::Text {
        println!("Running {} data test(s)...\n", tests.len());
    }

    let results = validator
        .validate(&tests)
        .await
        .map_err(common::engine_failure)?;

    let failed = results.iter().filter(|r| !r.passed).count();
    match global.output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&results)?),
        OutputFormat::Text => print_results(&results, failed),
    }

    if failed > 0 {
        return Err(ExitCode(EXIT_VALIDATION_FAILED).into());
    }
    Ok(())
}

fn print_results(results: &[DataTestResult], failed: usize) {
    for result in results {
        if result.passed {
            println!("  ✓ {}", result.test.name);
        } else {
            println!("  ✗ {}", result.test.name);
            for error in &result.errors {
                println!("      {}", error.message);
            }
        }
    }
    println!();
    println!("Passed: {}, Failed: {}", results.len() - failed, failed);
}
