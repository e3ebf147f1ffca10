//! Aggregated results of a validation run.
//!
//! Results are collected per explore while queries run in whatever order the
//! scheduler finishes them, then frozen into a [`ValidationReport`] whose
//! ordering does not depend on completion order.

use crate::dimension_name::DimensionName;
use crate::explore_name::ExploreName;
use crate::model::SkipReason;
use crate::model_name::ModelName;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

/// Terminal status of a single explore.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExploreStatus {
    /// Every probed dimension set completed without database errors.
    Passed,
    /// At least one failing dimension set was confirmed.
    Errored,
    /// Isolation could not finish; recorded findings may be partial.
    Incomplete,
    /// The run was cancelled before this explore finished.
    Cancelled,
    /// The explore had nothing to validate and was never queried.
    Skipped,
}

impl fmt::Display for ExploreStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ExploreStatus::Passed => "passed",
            ExploreStatus::Errored => "errored",
            ExploreStatus::Incomplete => "incomplete",
            ExploreStatus::Cancelled => "cancelled",
            ExploreStatus::Skipped => "skipped",
        };
        f.write_str(s)
    }
}

/// A single SQL finding, tied to an explore and optionally to one dimension.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SqlIssue {
    pub model: ModelName,
    pub explore: ExploreName,
    /// `None` for explore-level findings (fail-fast probes, killed queries).
    pub dimension: Option<DimensionName>,
    /// Verbatim database error message.
    pub message: String,
    /// Generated SQL for the failing query, when the platform reports it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sql: Option<String>,
    /// 1-based line in the generated SQL where the error occurred.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_number: Option<u32>,
    /// Link to the offending dimension's definition, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lookml_url: Option<String>,
    /// Link to reproduce the failing query in the explore UI.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explore_url: Option<String>,
}

/// Result of validating a single explore.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExploreResult {
    pub model: ModelName,
    pub explore: ExploreName,
    pub status: ExploreStatus,
    /// Confirmed findings, sorted by dimension then message.
    pub errors: Vec<SqlIssue>,
    /// Set when the status is [`ExploreStatus::Skipped`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_reason: Option<SkipReason>,
}

impl ExploreResult {
    pub fn passed(model: ModelName, explore: ExploreName) -> Self {
        Self {
            model,
            explore,
            status: ExploreStatus::Passed,
            errors: Vec::new(),
            skip_reason: None,
        }
    }

    pub fn errored(model: ModelName, explore: ExploreName, errors: Vec<SqlIssue>) -> Self {
        Self::with_errors(model, explore, ExploreStatus::Errored, errors)
    }

    pub fn incomplete(model: ModelName, explore: ExploreName, errors: Vec<SqlIssue>) -> Self {
        Self::with_errors(model, explore, ExploreStatus::Incomplete, errors)
    }

    pub fn cancelled(model: ModelName, explore: ExploreName, errors: Vec<SqlIssue>) -> Self {
        Self::with_errors(model, explore, ExploreStatus::Cancelled, errors)
    }

    pub fn skipped(model: ModelName, explore: ExploreName, reason: SkipReason) -> Self {
        Self {
            model,
            explore,
            status: ExploreStatus::Skipped,
            errors: Vec::new(),
            skip_reason: Some(reason),
        }
    }

    fn with_errors(
        model: ModelName,
        explore: ExploreName,
        status: ExploreStatus,
        mut errors: Vec<SqlIssue>,
    ) -> Self {
        // Issuance order varies between runs; the frozen result must not.
        errors.sort_by(|a, b| {
            (a.dimension.as_ref(), &a.message).cmp(&(b.dimension.as_ref(), &b.message))
        });
        Self {
            model,
            explore,
            status,
            errors,
            skip_reason: None,
        }
    }

    /// Distinct dimensions named by this result's findings.
    pub fn flagged_dimensions(&self) -> Vec<&DimensionName> {
        let mut seen = BTreeSet::new();
        for issue in &self.errors {
            if let Some(dimension) = &issue.dimension {
                seen.insert(dimension);
            }
        }
        seen.into_iter().collect()
    }
}

/// Counters accumulated over a full run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    /// Non-skipped explores submitted to the scheduler.
    pub explores_tested: usize,
    /// Dimensions across those explores.
    pub dimensions_tested: usize,
    /// Remote query executions, including retries of expired jobs.
    pub queries_issued: usize,
    /// Distinct dimensions confirmed as failing.
    pub dimensions_flagged: usize,
}

/// Full report for one model's validation run.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub model: ModelName,
    /// Per-explore results, sorted by explore name.
    pub explores: Vec<ExploreResult>,
    pub stats: RunStats,
    pub generated_at: DateTime<Utc>,
}

impl ValidationReport {
    /// Freeze per-explore results into a deterministic report.
    pub fn new(model: ModelName, mut results: Vec<ExploreResult>, stats: RunStats) -> Self {
        results.sort_by(|a, b| a.explore.cmp(&b.explore));
        Self {
            model,
            explores: results,
            stats,
            generated_at: Utc::now(),
        }
    }

    /// Whether the run passed overall.
    ///
    /// Errored, incomplete, and cancelled explores all fail the run: a result
    /// that might be hiding an error is not a pass.
    pub fn passed(&self) -> bool {
        self.explores.iter().all(|e| {
            !matches!(
                e.status,
                ExploreStatus::Errored | ExploreStatus::Incomplete | ExploreStatus::Cancelled
            )
        })
    }

    /// Every finding across all explores, in report order.
    pub fn issues(&self) -> impl Iterator<Item = &SqlIssue> {
        self.explores.iter().flat_map(|e| e.errors.iter())
    }
}

#[cfg(test)]
#[path = "report_test.rs"]
mod tests;
