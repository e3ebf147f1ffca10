//! Shared utilities for CLI commands

use anyhow::{Context, Result};
use lo_api::{HttpPlatform, PlatformClient};
use lo_core::ExploreSelector;
use lo_validate::{CancelToken, ValidateError};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::cli::GlobalArgs;

/// Validation ran to completion and found errors.
pub(crate) const EXIT_VALIDATION_FAILED: i32 = 102;
/// The platform API failed mid-run.
pub(crate) const EXIT_API_FAILURE: i32 = 101;
/// The run could not even start: discovery or selection failed.
pub(crate) const EXIT_RUN_FAILURE: i32 = 100;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Error type representing a non-zero process exit code.
///
/// Use `return Err(ExitCode(N).into())` instead of `std::process::exit(N)`
/// so that RAII destructors run and cleanup happens properly.
#[derive(Debug)]
pub(crate) struct ExitCode(pub(crate) i32);

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Intentionally empty: ExitCode is control flow, not a user-facing
        // error. The command printed its diagnostics before returning it.
        write!(f, "")
    }
}

impl std::error::Error for ExitCode {}

/// Build the platform client from global CLI arguments.
pub(crate) fn build_client(global: &GlobalArgs) -> Result<Arc<dyn PlatformClient>> {
    let base_url = global
        .base_url
        .as_deref()
        .context("no base URL set (use --base-url or LOOKOUT_BASE_URL)")?;
    let api_token = global
        .api_token
        .as_deref()
        .context("no API token set (use --api-token or LOOKOUT_API_TOKEN)")?;
    let client = HttpPlatform::new(base_url, api_token, REQUEST_TIMEOUT)
        .context("Failed to build the platform client")?;
    Ok(Arc::new(client))
}

/// Parse `model/explore` filter arguments into a selector.
///
/// No filters means every explore is selected.
pub(crate) fn build_selector(explores: &[String]) -> Result<ExploreSelector> {
    if explores.is_empty() {
        return Ok(ExploreSelector::all());
    }
    ExploreSelector::parse(explores).context("Invalid explore filter")
}

/// Cancel the run when the user hits Ctrl-C.
pub(crate) fn wire_interrupt(cancel: CancelToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::warn!("interrupt received, cancelling validation");
            cancel.cancel();
        }
    });
}

/// Report an engine error and map it to the matching exit code.
pub(crate) fn engine_failure(error: ValidateError) -> anyhow::Error {
    let code = match &error {
        ValidateError::Api(_) => EXIT_API_FAILURE,
        ValidateError::Discovery(_) => EXIT_RUN_FAILURE,
    };
    eprintln!("Error: {:#}", anyhow::Error::new(error));
    ExitCode(code).into()
}
