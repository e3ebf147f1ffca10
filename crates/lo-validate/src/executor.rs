//! Single-query lifecycle: submit, poll, classify.
//!
//! The executor owns every retry and ceiling decision. Callers see three
//! terminal outcomes (`Success`, `DatabaseError`, `Killed`) or a terminal
//! [`ExecutorError`]; transient transport failures and expired jobs are
//! retried internally and never escape.

use crate::error::ExecutorError;
use crate::query::ValidationQuery;
use crate::scheduler::CancelToken;
use lo_api::{JobHandle, JobState, PlatformClient, QueryError, QueryMode};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, Semaphore};
use tokio::time::Instant;

/// Default ceiling on concurrently in-flight queries.
pub const DEFAULT_CONCURRENCY: usize = 10;

/// Default delay between polls of a pending job.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Default transport retries per submission or poll.
pub const DEFAULT_TRANSPORT_RETRIES: usize = 2;

/// How long a job may sit in the expired state before a resubmission.
pub const DEFAULT_EXPIRED_WAIT: Duration = Duration::from_secs(300);

/// How many times an expired job is resubmitted before giving up.
pub const DEFAULT_EXPIRED_RETRIES: usize = 1;

/// Runtime in seconds above which a query is retained for the profiler.
pub const DEFAULT_RUNTIME_THRESHOLD: f64 = 5.0;

/// Base delay before the first transport retry; doubles per attempt.
const RETRY_BASE_DELAY: Duration = Duration::from_millis(500);

/// Tunable executor policy.
#[derive(Debug, Clone)]
pub struct ExecutorOptions {
    pub poll_interval: Duration,
    pub transport_retries: usize,
    pub expired_wait: Duration,
    pub expired_retries: usize,
    pub runtime_threshold: f64,
}

impl Default for ExecutorOptions {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            transport_retries: DEFAULT_TRANSPORT_RETRIES,
            expired_wait: DEFAULT_EXPIRED_WAIT,
            expired_retries: DEFAULT_EXPIRED_RETRIES,
            runtime_threshold: DEFAULT_RUNTIME_THRESHOLD,
        }
    }
}

/// Database failure details extracted from an errored query task.
#[derive(Debug, Clone, PartialEq)]
pub struct DbFailure {
    /// Reported errors with dev-mode warnings already filtered out.
    pub errors: Vec<QueryError>,
    /// Generated SQL of the failing query, when the platform reports it.
    pub sql: Option<String>,
    /// Link to reproduce the query in the explore UI.
    pub explore_url: Option<String>,
}

impl DbFailure {
    /// First offending-field hint named by the errors, if any.
    pub fn hint_field(&self) -> Option<&str> {
        self.errors
            .iter()
            .filter_map(|e| e.field_name.as_deref())
            .find(|f| !f.is_empty())
    }
}

/// Terminal outcome of one probe query.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutcome {
    /// The probe compiled and ran without database errors.
    Success,
    /// The database rejected the generated SQL.
    DatabaseError(DbFailure),
    /// The database or an admin killed the query. Terminal; never recursed
    /// into, reported at explore level.
    Killed,
}

/// A probe whose runtime crossed the profiling threshold.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfiledQuery {
    /// `"explore"` for multi-column probes, `"dimension"` for single-column
    /// confirmations.
    pub kind: &'static str,
    pub name: String,
    /// Runtime in seconds as reported by the platform.
    pub runtime: f64,
    pub query_id: String,
    pub explore_url: Option<String>,
}

/// Executes probe queries against the platform under a shared ceiling.
///
/// One permit covers the whole submit-to-terminal window of a single query.
/// Callers must not hold a permit across recursive descents; the isolation
/// engine acquires per probe, so a ceiling of one cannot deadlock.
pub struct QueryExecutor {
    api: Arc<dyn PlatformClient>,
    cancel: CancelToken,
    permits: Semaphore,
    opts: ExecutorOptions,
    queries_issued: AtomicUsize,
    slow_queries: Mutex<Vec<ProfiledQuery>>,
}

impl QueryExecutor {
    pub fn new(
        api: Arc<dyn PlatformClient>,
        cancel: CancelToken,
        concurrency: usize,
        opts: ExecutorOptions,
    ) -> Self {
        Self {
            api,
            cancel,
            permits: Semaphore::new(concurrency.max(1)),
            opts,
            queries_issued: AtomicUsize::new(0),
            slow_queries: Mutex::new(Vec::new()),
        }
    }

    /// Total remote submissions so far, resubmissions of expired jobs
    /// included.
    pub fn queries_issued(&self) -> usize {
        self.queries_issued.load(Ordering::Relaxed)
    }

    /// Probes retained by the profiler, slowest first.
    pub async fn slow_queries(&self) -> Vec<ProfiledQuery> {
        let mut slow = self.slow_queries.lock().await.clone();
        slow.sort_by(|a, b| b.runtime.total_cmp(&a.runtime));
        slow
    }

    /// Run one probe to a terminal outcome.
    pub async fn execute(
        &self,
        query: &ValidationQuery,
        mode: QueryMode,
    ) -> Result<QueryOutcome, ExecutorError> {
        if self.cancel.is_cancelled() {
            return Err(ExecutorError::Cancelled);
        }
        let _permit = tokio::select! {
            // The semaphore is never closed while the executor lives.
            permit = self.permits.acquire() => permit.map_err(|_| ExecutorError::Cancelled)?,
            () = self.cancel.cancelled() => return Err(ExecutorError::Cancelled),
        };
        if self.cancel.is_cancelled() {
            return Err(ExecutorError::Cancelled);
        }

        let fields = query.field_names();
        let mut handle = self.submit(query, &fields, mode).await?;
        let mut resubmissions = 0usize;
        let mut expired_since: Option<Instant> = None;
        let mut poll_failures = 0usize;

        loop {
            if self.cancel.is_cancelled() {
                // Best-effort: the run is already tearing down.
                let _ = self.api.cancel_job(&handle).await;
                return Err(ExecutorError::Cancelled);
            }

            let state = match self.api.poll_job(&handle).await {
                Ok(state) => {
                    poll_failures = 0;
                    state
                }
                Err(err) if err.is_retryable() && poll_failures < self.opts.transport_retries => {
                    poll_failures += 1;
                    if self.backoff(poll_failures).await.is_err() {
                        let _ = self.api.cancel_job(&handle).await;
                        return Err(ExecutorError::Cancelled);
                    }
                    continue;
                }
                Err(err) => return Err(ExecutorError::Transport(err)),
            };

            match state {
                JobState::Added | JobState::Running => {
                    expired_since = None;
                }
                JobState::Expired => {
                    let since = *expired_since.get_or_insert_with(Instant::now);
                    if since.elapsed() >= self.opts.expired_wait {
                        if resubmissions < self.opts.expired_retries {
                            resubmissions += 1;
                            log::debug!(
                                "query task {} expired, resubmitting ({}/{})",
                                handle.task_id,
                                resubmissions,
                                self.opts.expired_retries
                            );
                            handle = self.submit(query, &fields, mode).await?;
                            expired_since = None;
                        } else {
                            return Err(ExecutorError::Timeout {
                                elapsed_secs: since.elapsed().as_secs_f64(),
                            });
                        }
                    }
                }
                JobState::Killed => return Ok(QueryOutcome::Killed),
                JobState::Complete { data } => {
                    self.record_runtime(query, &handle, data.runtime).await;
                    return Ok(QueryOutcome::Success);
                }
                JobState::Error { data } => {
                    self.record_runtime(query, &handle, data.runtime).await;
                    let errors = data.valid_errors();
                    if errors.is_empty() {
                        // Only dev-mode warnings were reported.
                        return Ok(QueryOutcome::Success);
                    }
                    return Ok(QueryOutcome::DatabaseError(DbFailure {
                        errors,
                        sql: data.sql,
                        explore_url: handle.explore_url.clone(),
                    }));
                }
            }

            if self.sleep(self.opts.poll_interval).await.is_err() {
                let _ = self.api.cancel_job(&handle).await;
                return Err(ExecutorError::Cancelled);
            }
        }
    }

    /// Submit with bounded transport retry. Counts successful submissions.
    async fn submit(
        &self,
        query: &ValidationQuery,
        fields: &[String],
        mode: QueryMode,
    ) -> Result<JobHandle, ExecutorError> {
        let mut attempt = 0usize;
        loop {
            if self.cancel.is_cancelled() {
                return Err(ExecutorError::Cancelled);
            }
            match self
                .api
                .submit_query(query.model.as_str(), query.explore.as_str(), fields, mode)
                .await
            {
                Ok(handle) => {
                    self.queries_issued.fetch_add(1, Ordering::Relaxed);
                    return Ok(handle);
                }
                Err(err) if err.is_retryable() && attempt < self.opts.transport_retries => {
                    attempt += 1;
                    log::debug!(
                        "submitting query for {}.{} failed ({}), retrying",
                        query.model,
                        query.explore,
                        err
                    );
                    self.backoff(attempt).await?;
                }
                Err(err) => return Err(ExecutorError::Transport(err)),
            }
        }
    }

    /// Sleep for the retry delay of the given attempt, waking on cancel.
    async fn backoff(&self, attempt: usize) -> Result<(), ExecutorError> {
        let delay = RETRY_BASE_DELAY * 2u32.pow(attempt.saturating_sub(1) as u32);
        self.sleep(delay).await
    }

    async fn sleep(&self, duration: Duration) -> Result<(), ExecutorError> {
        tokio::select! {
            () = tokio::time::sleep(duration) => Ok(()),
            () = self.cancel.cancelled() => Err(ExecutorError::Cancelled),
        }
    }

    async fn record_runtime(
        &self,
        query: &ValidationQuery,
        handle: &JobHandle,
        runtime: Option<f64>,
    ) {
        let runtime = match runtime {
            Some(runtime) if runtime > self.opts.runtime_threshold => runtime,
            _ => return,
        };
        let (kind, name) = if query.is_singleton() {
            ("dimension", query.dimensions()[0].to_string())
        } else {
            ("explore", query.explore.to_string())
        };
        self.slow_queries.lock().await.push(ProfiledQuery {
            kind,
            name,
            runtime,
            query_id: handle.query_id.clone(),
            explore_url: handle.explore_url.clone(),
        });
    }
}

#[cfg(test)]
#[path = "executor_test.rs"]
mod tests;
