//! Model graph discovery and filtering.
//!
//! Builds the immutable [`Model`] a run validates: fetch the explore list,
//! apply the caller's selectors, fetch dimensions concurrently, and drop
//! dimensions that opted out. Discovery failures are fatal; nothing here
//! retries.

use crate::error::{ValidateError, ValidateResult};
use futures::future::join_all;
use lo_api::PlatformClient;
use lo_core::{Dimension, Explore, ExploreSelector, Model, SkipReason};

/// How much of the model graph to materialize.
#[derive(Debug, Clone)]
pub struct DiscoveryOptions {
    /// Drop hidden dimensions before validation.
    pub ignore_hidden: bool,
    /// Fetch dimensions for each kept explore. Content and data-test runs
    /// only need explore names and leave this off.
    pub include_dimensions: bool,
}

impl Default for DiscoveryOptions {
    fn default() -> Self {
        Self {
            ignore_hidden: false,
            include_dimensions: true,
        }
    }
}

/// Build the model graph for a validation run.
///
/// Zero selected explores is an error: a run over nothing would report a
/// pass it never earned. Explores whose dimensions all filter away are
/// kept, marked skipped, and reported as such.
pub async fn build_model(
    api: &dyn PlatformClient,
    model_name: &str,
    selector: &ExploreSelector,
    opts: &DiscoveryOptions,
) -> ValidateResult<Model> {
    let metadata = api.fetch_model(model_name).await?;
    let name = metadata.name;

    let selected: Vec<_> = metadata
        .explores
        .into_iter()
        .filter(|e| selector.is_selected(name.as_str(), e.name.as_str()))
        .map(|e| e.name)
        .collect();
    if selected.is_empty() {
        return Err(ValidateError::Discovery(format!(
            "no explores in model '{}' match the given selectors",
            name
        )));
    }

    let mut explores: Vec<Explore> = selected
        .iter()
        .map(|explore| Explore::new(explore.clone(), name.clone()))
        .collect();
    if !opts.include_dimensions {
        return Ok(Model { name, explores });
    }

    let fetches = selected
        .iter()
        .map(|explore| api.fetch_dimensions(name.as_str(), explore.as_str()));
    let responses = join_all(fetches).await;

    for (explore, response) in explores.iter_mut().zip(responses) {
        for meta in response? {
            let dimension = Dimension {
                name: meta.name,
                model_name: name.clone(),
                explore_name: explore.name.clone(),
                type_: meta.type_,
                tags: meta.tags,
                sql: meta.sql,
                is_hidden: meta.hidden,
                url: meta
                    .lookml_link
                    .map(|link| format!("{}{}", api.base_url(), link)),
            };
            if dimension.is_ignored() || (opts.ignore_hidden && dimension.is_hidden) {
                continue;
            }
            explore.dimensions.push(dimension);
        }
        if explore.dimensions.is_empty() {
            log::warn!(
                "explore '{}.{}' has no dimensions left to validate and will be skipped",
                name,
                explore.name
            );
            explore.skipped = Some(SkipReason::NoDimensions);
        }
    }

    Ok(Model { name, explores })
}

#[cfg(test)]
#[path = "discovery_test.rs"]
mod tests;
