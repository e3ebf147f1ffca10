//! Model graph types discovered from the platform.
//!
//! A [`Model`] owns the explores selected for a validation run, each explore
//! owns the dimensions that survived filtering. The graph is immutable once
//! discovery completes; validation results are accumulated separately in
//! [`report`](crate::report) types.

use crate::dimension_name::DimensionName;
use crate::explore_name::ExploreName;
use crate::model_name::ModelName;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// Tag that excludes a dimension from validation.
pub const IGNORE_MARKER: &str = "lookout: ignore";

/// Regex matching the ignore marker inside a SQL fragment
static IGNORE_SQL_RE: OnceLock<Regex> = OnceLock::new();

/// Get the compiled ignore-marker regex (built once, reused)
fn ignore_sql_regex() -> &'static Regex {
    IGNORE_SQL_RE.get_or_init(|| Regex::new(r"(?i)lookout\s*:\s*ignore").expect("valid regex"))
}

/// A queryable dimension inside an explore.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dimension {
    pub name: DimensionName,
    pub model_name: ModelName,
    pub explore_name: ExploreName,
    /// Field type as reported by the platform (string, number, time, ...)
    #[serde(rename = "type")]
    pub type_: String,
    #[serde(default)]
    pub tags: Vec<String>,
    /// SQL fragment backing this dimension.
    pub sql: String,
    #[serde(default)]
    pub is_hidden: bool,
    /// Link to the dimension's definition in the modeling UI, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl Dimension {
    /// Whether this dimension opts out of validation.
    ///
    /// A dimension is ignored when its SQL contains the marker (any casing,
    /// optional whitespace around the colon) or its tags contain it exactly.
    pub fn is_ignored(&self) -> bool {
        ignore_sql_regex().is_match(&self.sql) || self.tags.iter().any(|t| t == IGNORE_MARKER)
    }
}

/// Why an explore was excluded from querying.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// No dimensions were left to validate after filtering.
    NoDimensions,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NoDimensions => write!(f, "no_dimensions"),
        }
    }
}

/// An explore and the dimensions selected for validation.
///
/// Dimension order follows the model's declaration order; the isolation
/// engine depends on it for deterministic splits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Explore {
    pub name: ExploreName,
    pub model_name: ModelName,
    #[serde(default)]
    pub dimensions: Vec<Dimension>,
    /// Set when the explore will not be queried.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skipped: Option<SkipReason>,
}

impl Explore {
    /// Create an explore with no dimensions attached yet.
    pub fn new(name: ExploreName, model_name: ModelName) -> Self {
        Self {
            name,
            model_name,
            dimensions: Vec::new(),
            skipped: None,
        }
    }

    /// Names of the dimensions in declaration order.
    pub fn dimension_names(&self) -> Vec<DimensionName> {
        self.dimensions.iter().map(|d| d.name.clone()).collect()
    }

    pub fn is_skipped(&self) -> bool {
        self.skipped.is_some()
    }
}

/// A model and its selected explores. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Model {
    pub name: ModelName,
    pub explores: Vec<Explore>,
}

impl Model {
    pub fn get_explore(&self, name: &str) -> Option<&Explore> {
        self.explores.iter().find(|e| e.name == *name)
    }

    /// Explores that will actually be queried.
    pub fn active_explores(&self) -> impl Iterator<Item = &Explore> {
        self.explores.iter().filter(|e| !e.is_skipped())
    }

    /// Total dimensions across non-skipped explores.
    pub fn dimension_count(&self) -> usize {
        self.active_explores().map(|e| e.dimensions.len()).sum()
    }
}

#[cfg(test)]
#[path = "model_test.rs"]
mod tests;
