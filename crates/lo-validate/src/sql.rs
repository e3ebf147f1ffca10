//! End-to-end SQL validation.

use crate::executor::{
    ExecutorOptions, ProfiledQuery, QueryExecutor, DEFAULT_CONCURRENCY, DEFAULT_EXPIRED_RETRIES,
    DEFAULT_EXPIRED_WAIT, DEFAULT_POLL_INTERVAL, DEFAULT_RUNTIME_THRESHOLD,
    DEFAULT_TRANSPORT_RETRIES,
};
use crate::isolate::{IsolateOptions, DEFAULT_CHUNK_SIZE};
use crate::scheduler::{run_explores, spawn_watchdog, CancelToken};
use lo_api::PlatformClient;
use lo_core::{Model, RunStats, ValidationReport};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

/// Tunable policy for a SQL validation run.
#[derive(Debug, Clone)]
pub struct SqlOptions {
    /// Ceiling on concurrently in-flight queries across the whole run.
    pub concurrency: usize,
    /// Cancel the run when this much wall time elapses.
    pub timeout: Option<Duration>,
    /// Report explore-level failures without isolating dimensions.
    pub fail_fast: bool,
    /// Maximum dimensions per generated query.
    pub chunk_size: usize,
    pub poll_interval: Duration,
    pub transport_retries: usize,
    pub expired_wait: Duration,
    pub expired_retries: usize,
    /// Runtime in seconds above which a query feeds the profiler.
    pub runtime_threshold: f64,
}

impl Default for SqlOptions {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            timeout: None,
            fail_fast: false,
            chunk_size: DEFAULT_CHUNK_SIZE,
            poll_interval: DEFAULT_POLL_INTERVAL,
            transport_retries: DEFAULT_TRANSPORT_RETRIES,
            expired_wait: DEFAULT_EXPIRED_WAIT,
            expired_retries: DEFAULT_EXPIRED_RETRIES,
            runtime_threshold: DEFAULT_RUNTIME_THRESHOLD,
        }
    }
}

impl SqlOptions {
    fn executor_options(&self) -> ExecutorOptions {
        ExecutorOptions {
            poll_interval: self.poll_interval,
            transport_retries: self.transport_retries,
            expired_wait: self.expired_wait,
            expired_retries: self.expired_retries,
            runtime_threshold: self.runtime_threshold,
        }
    }

    fn isolate_options(&self) -> IsolateOptions {
        IsolateOptions {
            fail_fast: self.fail_fast,
            chunk_size: self.chunk_size,
        }
    }
}

/// Runs SQL validation for a model and freezes the report.
pub struct SqlValidator {
    api: Arc<dyn PlatformClient>,
    options: SqlOptions,
}

impl SqlValidator {
    pub fn new(api: Arc<dyn PlatformClient>, options: SqlOptions) -> Self {
        Self { api, options }
    }

    /// Validate every explore of the model.
    ///
    /// Returns the frozen report plus the probes the profiler retained.
    /// Cancelling the token stops new submissions; explores that were cut
    /// short are reported, never dropped.
    pub async fn validate(
        &self,
        model: &Model,
        cancel: CancelToken,
    ) -> (ValidationReport, Vec<ProfiledQuery>) {
        let executor = Arc::new(QueryExecutor::new(
            Arc::clone(&self.api),
            cancel.clone(),
            self.options.concurrency,
            self.options.executor_options(),
        ));
        let watchdog = self
            .options
            .timeout
            .map(|timeout| spawn_watchdog(cancel.clone(), timeout));

        let results =
            run_explores(Arc::clone(&executor), model, &self.options.isolate_options()).await;

        if let Some(watchdog) = watchdog {
            watchdog.abort();
        }

        let mut flagged = BTreeSet::new();
        for result in &results {
            for dimension in result.flagged_dimensions() {
                flagged.insert((result.explore.clone(), dimension.clone()));
            }
        }
        let stats = RunStats {
            explores_tested: model.active_explores().count(),
            dimensions_tested: model.dimension_count(),
            queries_issued: executor.queries_issued(),
            dimensions_flagged: flagged.len(),
        };

        let report = ValidationReport::new(model.name.clone(), results, stats);
        let slow_queries = executor.slow_queries().await;
        (report, slow_queries)
    }
}

#[cfg(test)]
#[path = "sql_test.rs"]
mod tests;
