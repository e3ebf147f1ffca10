//! Explore selection filters.
//!
//! Filters take the form `model_name/explore_name`, where `*` matches one or
//! more characters (`ecommerce/*` selects every explore in `ecommerce`). A
//! leading `-` turns a filter into an exclusion, which always wins over
//! inclusions.

use crate::error::{CoreError, CoreResult};
use regex::Regex;

/// A single parsed filter: `-` exclusion flag plus an anchored pattern.
#[derive(Debug, Clone)]
struct Filter {
    exclude: bool,
    pattern: Regex,
}

/// Compiled explore filters.
///
/// A `model/explore` pair is rejected as soon as any exclusion matches.
/// Otherwise it must match at least one positive filter; if no positive
/// filters were given, everything is selected.
#[derive(Debug, Clone, Default)]
pub struct ExploreSelector {
    filters: Vec<Filter>,
}

impl ExploreSelector {
    /// A selector that keeps every explore.
    pub fn all() -> Self {
        Self::default()
    }

    /// Parse a list of filter strings.
    pub fn parse(filters: &[String]) -> CoreResult<Self> {
        let mut parsed = Vec::with_capacity(filters.len());
        for raw in filters {
            let (exclude, selector) = match raw.strip_prefix('-') {
                Some(rest) => (true, rest),
                None => (false, raw.as_str()),
            };
            parsed.push(Filter {
                exclude,
                pattern: compile_selector(raw, selector)?,
            });
        }
        Ok(Self { filters: parsed })
    }

    /// Whether the given model/explore pair is selected.
    pub fn is_selected(&self, model: &str, explore: &str) -> bool {
        let test = format!("{}/{}", model, explore);
        let mut included: Option<bool> = None;
        for filter in &self.filters {
            if filter.exclude {
                if filter.pattern.is_match(&test) {
                    return false;
                }
            } else if included == Some(true) {
                continue;
            } else {
                included = Some(filter.pattern.is_match(&test));
            }
        }
        included.unwrap_or(true)
    }
}

/// Compile a `model_name/explore_name` selector into an anchored regex.
fn compile_selector(raw: &str, selector: &str) -> CoreResult<Regex> {
    let invalid = |reason: String| CoreError::InvalidSelector {
        selector: raw.to_string(),
        reason,
    };

    let parts: Vec<&str> = selector.split('/').collect();
    if parts.len() != 2 || parts[0].is_empty() || parts[1].is_empty() {
        return Err(invalid(
            "expected the format 'model_name/explore_name' \
             (use 'model_name/*' to select all explores in a model)"
            .to_string(),
        ));
    }

    let escaped: Vec<String> = selector.split('*').map(regex::escape).collect();
    let pattern = format!("^{}$", escaped.join(".+?"));
    Regex::new(&pattern).map_err(|e| invalid(e.to_string()))
}

#[cfg(test)]
#[path = "selector_test.rs"]
mod tests;
