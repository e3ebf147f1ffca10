//! Content validation command implementation

use anyhow::Result;
use lo_core::ModelName;
use lo_validate::{build_model, ContentError, ContentValidator, DiscoveryOptions};

use crate::cli::{ContentArgs, GlobalArgs, OutputFormat};
use crate::commands::common::{self, ExitCode, EXIT_VALIDATION_FAILED};

/// Execute the content command
pub async fn execute(args: &ContentArgs, global: &GlobalArgs) -> Result<()> {
    let api = common::build_client(global)?;
    let selector = common::build_selector(&args.explores)?;

    // Content errors are matched by explore name; dimensions are not needed.
    let discovery = DiscoveryOptions {
        ignore_hidden: false,
        include_dimensions: false,
    };
    let model = build_model(api.as_ref(), &args.model, &selector, &discovery)
        .await
        .map_err(common::engine_failure)?;

    let validator = ContentValidator::new(api, args.exclude_personal, &args.folders);
    let errors = validator
        .validate(&model)
        .await
        .map_err(common::engine_failure)?;

    match global.output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&errors)?),
        OutputFormat::Text => print_errors(&model.name, &errors),
    }

    if !errors.is_empty() {
        return Err(ExitCode(EXIT_VALIDATION_FAILED).into());
    }
    Ok(())
}

fn print_errors(model: &ModelName, errors: &[ContentError]) {
    if errors.is_empty() {
        println!("  ✓ No broken content references model '{}'", model);
        return;
    }
    for error in errors {
        let title = error.title.as_deref().unwrap_or("untitled");
        println!("  ✗ {} '{}' ({})", error.content_type, title, error.url);
        if let Some(tile_title) = &error.tile_title {
            println!("      tile: {}", tile_title);
        }
        println!("      {}.{}: {}", error.model, error.explore, error.message);
    }
    println!("\nFound {} content error(s)", errors.len());
}
