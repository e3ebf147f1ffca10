//! Minimal failing dimension set search.
//!
//! A failing set is narrowed by probing contiguous halves recursively. A
//! failing singleton is a confirmed minimal group; a passing set is
//! discarded whole, so a fault that only appears when two passing subsets
//! are combined goes undetected. That trade buys the O(log n) query budget
//! for the common single-culprit case.

use crate::error::ExecutorError;
use crate::executor::{DbFailure, QueryExecutor, QueryOutcome};
use crate::query::ValidationQuery;
use futures::future::{join_all, BoxFuture};
use futures::FutureExt;
use lo_api::QueryMode;
use lo_core::{DimensionName, Explore, ExploreResult, SkipReason, SqlIssue};
use std::collections::HashMap;

/// Default maximum dimensions per generated query.
pub const DEFAULT_CHUNK_SIZE: usize = 500;

/// Per-explore isolation policy.
#[derive(Debug, Clone)]
pub struct IsolateOptions {
    /// Stop after the full-set probe and report explore-level errors
    /// without isolating dimensions.
    pub fail_fast: bool,
    /// Dimension sets larger than this are isolated in independent chunks.
    pub chunk_size: usize,
}

impl Default for IsolateOptions {
    fn default() -> Self {
        Self {
            fail_fast: false,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

/// Findings accumulated while isolating one dimension set.
#[derive(Debug, Default)]
struct Isolation {
    /// Confirmed minimal groups. `None` marks an explore-level failure.
    failures: Vec<(Option<DimensionName>, DbFailure)>,
    /// A probe was killed in the database somewhere under this set.
    killed: bool,
    /// First terminal interruption, if any.
    interrupted: Option<ExecutorError>,
}

impl Isolation {
    fn confirmed(dimension: Option<DimensionName>, failure: DbFailure) -> Self {
        Self {
            failures: vec![(dimension, failure)],
            ..Self::default()
        }
    }

    fn killed() -> Self {
        Self {
            killed: true,
            ..Self::default()
        }
    }

    fn interrupted(error: ExecutorError) -> Self {
        Self {
            interrupted: Some(error),
            ..Self::default()
        }
    }

    fn merge(mut self, other: Self) -> Self {
        self.failures.extend(other.failures);
        self.killed |= other.killed;
        self.interrupted = match (self.interrupted, other.interrupted) {
            // Cancellation outranks transport trouble when both halves fail
            // to finish.
            (Some(mine), Some(theirs)) => {
                if matches!(theirs, ExecutorError::Cancelled) {
                    Some(theirs)
                } else {
                    Some(mine)
                }
            }
            (mine, theirs) => mine.or(theirs),
        };
        self
    }
}

/// Validate one explore end to end.
///
/// Skipped explores return immediately without querying. Everything else
/// starts from a full-set probe, so a clean explore costs exactly one
/// remote query.
pub async fn isolate_explore(
    executor: &QueryExecutor,
    explore: &Explore,
    opts: &IsolateOptions,
) -> ExploreResult {
    if let Some(reason) = explore.skipped {
        return ExploreResult::skipped(explore.model_name.clone(), explore.name.clone(), reason);
    }
    if explore.dimensions.is_empty() {
        return ExploreResult::skipped(
            explore.model_name.clone(),
            explore.name.clone(),
            SkipReason::NoDimensions,
        );
    }

    let full = ValidationQuery::new(
        explore.model_name.clone(),
        explore.name.clone(),
        explore.dimension_names(),
    );
    let probes = full
        .chunked(opts.chunk_size)
        .into_iter()
        .map(|chunk| probe(executor, chunk, opts.fail_fast));
    let isolation = join_all(probes)
        .await
        .into_iter()
        .fold(Isolation::default(), Isolation::merge);

    finish(explore, isolation)
}

/// Probe one dimension set and drill into it when it fails.
async fn probe(executor: &QueryExecutor, query: ValidationQuery, fail_fast: bool) -> Isolation {
    let mode = if query.is_singleton() {
        QueryMode::Single
    } else {
        QueryMode::Batch
    };
    match executor.execute(&query, mode).await {
        Ok(QueryOutcome::Success) => Isolation::default(),
        Ok(QueryOutcome::DatabaseError(failure)) => {
            if fail_fast {
                Isolation::confirmed(None, failure)
            } else {
                isolate_failing(executor, query, failure).await
            }
        }
        Ok(QueryOutcome::Killed) => Isolation::killed(),
        Err(error) => Isolation::interrupted(error),
    }
}

/// Narrow a set known to fail down to its minimal failing groups.
fn isolate_failing<'a>(
    executor: &'a QueryExecutor,
    query: ValidationQuery,
    failure: DbFailure,
) -> BoxFuture<'a, Isolation> {
    async move {
        if query.is_singleton() {
            let dimension = query.dimensions()[0].clone();
            return Isolation::confirmed(Some(dimension), failure);
        }

        // The platform sometimes names the field it suspects. Confirm the
        // hint alone before trusting it; a hint that passes alone falls
        // back to bisection of the full set.
        if let Some(hint) = hinted_dimension(&query, &failure) {
            let single = ValidationQuery::new(
                query.model.clone(),
                query.explore.clone(),
                vec![hint.clone()],
            );
            match executor.execute(&single, QueryMode::Single).await {
                Ok(QueryOutcome::Success) => {
                    log::debug!(
                        "hint '{}' passed alone in {}.{}, bisecting instead",
                        hint,
                        query.model,
                        query.explore
                    );
                }
                Ok(QueryOutcome::DatabaseError(single_failure)) => {
                    let isolation = Isolation::confirmed(Some(hint.clone()), single_failure);
                    let rest: Vec<DimensionName> = query
                        .dimensions()
                        .iter()
                        .filter(|d| **d != hint)
                        .cloned()
                        .collect();
                    if rest.is_empty() {
                        return isolation;
                    }
                    // The remainder is not assumed failing; it gets its own
                    // probe before any further descent.
                    let rest_query =
                        ValidationQuery::new(query.model.clone(), query.explore.clone(), rest);
                    return isolation.merge(probe(executor, rest_query, false).await);
                }
                Ok(QueryOutcome::Killed) => return Isolation::killed(),
                Err(error) => return Isolation::interrupted(error),
            }
        }

        let (left, right) = query.split();
        let (left_isolation, right_isolation) =
            tokio::join!(probe(executor, left, false), probe(executor, right, false));
        left_isolation.merge(right_isolation)
    }
    .boxed()
}

/// The failure's hint field, when it names a dimension in the probed set.
fn hinted_dimension(query: &ValidationQuery, failure: &DbFailure) -> Option<DimensionName> {
    let hint = failure.hint_field()?;
    query
        .dimensions()
        .iter()
        .find(|d| d.as_str() == hint)
        .cloned()
}

/// Freeze accumulated findings into the explore's result.
fn finish(explore: &Explore, isolation: Isolation) -> ExploreResult {
    let model = explore.model_name.clone();
    let name = explore.name.clone();

    let urls: HashMap<&DimensionName, &String> = explore
        .dimensions
        .iter()
        .filter_map(|d| d.url.as_ref().map(|url| (&d.name, url)))
        .collect();

    let mut issues = Vec::new();
    for (dimension, failure) in &isolation.failures {
        for error in &failure.errors {
            issues.push(SqlIssue {
                model: model.clone(),
                explore: name.clone(),
                dimension: dimension.clone(),
                message: error.full_message(),
                sql: failure.sql.clone(),
                line_number: error.sql_error_loc.and_then(|loc| loc.line),
                lookml_url: dimension
                    .as_ref()
                    .and_then(|d| urls.get(d).map(|url| (*url).clone())),
                explore_url: failure.explore_url.clone(),
            });
        }
    }
    if isolation.killed {
        issues.push(SqlIssue {
            model: model.clone(),
            explore: name.clone(),
            dimension: None,
            message: format!(
                "Couldn't finish testing {}.{} because the validation query was killed in the database.",
                model, name
            ),
            sql: None,
            line_number: None,
            lookml_url: None,
            explore_url: None,
        });
    }

    match isolation.interrupted {
        Some(ExecutorError::Cancelled) => ExploreResult::cancelled(model, name, issues),
        Some(error) => {
            log::warn!("validation of {}.{} did not finish: {}", model, name, error);
            ExploreResult::incomplete(model, name, issues)
        }
        None if issues.is_empty() => ExploreResult::passed(model, name),
        None => ExploreResult::errored(model, name, issues),
    }
}

#[cfg(test)]
#[path = "isolate_test.rs"]
mod tests;
