//! Scripted platform client shared by the engine tests.

use async_trait::async_trait;
use lo_api::{
    ApiError, ApiResult, CompleteData, ContentValidation, DataTest, DataTestOutcome,
    DimensionMetadata, ErrorData, Folder, JobHandle, JobState, ModelMetadata, PlatformClient,
    QueryError, QueryMode,
};
use lo_core::{Dimension, DimensionName, Explore, ExploreName, ModelName};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

/// Scripted terminal state for a submitted query.
#[derive(Debug, Clone)]
pub(crate) enum Script {
    /// Complete without errors.
    Pass,
    /// Complete, reporting the given runtime in seconds.
    SlowPass(f64),
    /// Finish with database errors.
    Fail(Vec<QueryError>),
    /// Finish with database errors and the given runtime.
    SlowFail(f64, Vec<QueryError>),
    /// The database killed the query.
    Kill,
    /// The task fell out of the queue; polls report `expired` forever.
    Expire,
    /// Every poll of this task fails with a transport error.
    PollTransport,
}

type ScriptKey = (String, Vec<String>);

#[derive(Debug)]
struct TaskState {
    script: Script,
    pending_left: u32,
    finished: bool,
}

#[derive(Debug, Default)]
struct Inner {
    scripts: HashMap<ScriptKey, VecDeque<Script>>,
    pending_polls: u32,
    submit_failures: u32,
    poll_failures: u32,
    tasks: HashMap<String, TaskState>,
    next_id: u64,
    submissions: Vec<ScriptKey>,
    cancelled: Vec<String>,
    models: HashMap<String, ModelMetadata>,
    dimensions: HashMap<(String, String), Vec<DimensionMetadata>>,
    failing_dimension_fetches: HashSet<(String, String)>,
    folders: Vec<Folder>,
    content: Option<ContentValidation>,
    data_tests: Vec<DataTest>,
    data_test_outcomes: HashMap<String, Vec<DataTestOutcome>>,
}

/// In-memory [`PlatformClient`] driven by per-dimension-set scripts.
///
/// Each submission of a dimension set consumes the next queued script for
/// it; an unscripted submission passes. The stub tracks every submission
/// and the in-flight high-water mark between submit and terminal poll.
pub(crate) struct StubPlatform {
    base_url: String,
    inner: Mutex<Inner>,
    in_flight: AtomicUsize,
    high_water: AtomicUsize,
}

impl StubPlatform {
    pub(crate) fn new() -> Self {
        Self {
            base_url: "https://bi.example.com".to_string(),
            inner: Mutex::new(Inner::default()),
            in_flight: AtomicUsize::new(0),
            high_water: AtomicUsize::new(0),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap()
    }

    /// Queue a terminal state for the next submission of this dimension set.
    pub(crate) fn script(&self, explore: &str, fields: &[&str], script: Script) {
        let key = (
            explore.to_string(),
            fields.iter().map(|f| f.to_string()).collect(),
        );
        self.lock().scripts.entry(key).or_default().push_back(script);
    }

    /// Answer this many polls per task with `running` before the terminal
    /// state.
    pub(crate) fn set_pending_polls(&self, polls: u32) {
        self.lock().pending_polls = polls;
    }

    /// Fail the next `count` submissions with a transport error.
    pub(crate) fn fail_submissions(&self, count: u32) {
        self.lock().submit_failures = count;
    }

    /// Fail the next `count` polls with a transport error.
    pub(crate) fn fail_polls(&self, count: u32) {
        self.lock().poll_failures = count;
    }

    /// Every submission so far as `(explore, fields)` pairs, in order.
    pub(crate) fn submissions(&self) -> Vec<ScriptKey> {
        self.lock().submissions.clone()
    }

    pub(crate) fn submission_count(&self) -> usize {
        self.lock().submissions.len()
    }

    /// Highest number of queries in flight at once.
    pub(crate) fn high_water_mark(&self) -> usize {
        self.high_water.load(Ordering::SeqCst)
    }

    /// Task ids the engine asked to cancel.
    pub(crate) fn cancelled_jobs(&self) -> Vec<String> {
        self.lock().cancelled.clone()
    }

    pub(crate) fn add_model(&self, model: ModelMetadata) {
        self.lock().models.insert(model.name.to_string(), model);
    }

    pub(crate) fn set_dimensions(
        &self,
        model: &str,
        explore: &str,
        dimensions: Vec<DimensionMetadata>,
    ) {
        self.lock()
            .dimensions
            .insert((model.to_string(), explore.to_string()), dimensions);
    }

    /// Make the dimension fetch for this explore fail with a transport
    /// error.
    pub(crate) fn fail_dimension_fetch(&self, model: &str, explore: &str) {
        self.lock()
            .failing_dimension_fetches
            .insert((model.to_string(), explore.to_string()));
    }

    pub(crate) fn set_folders(&self, folders: Vec<Folder>) {
        self.lock().folders = folders;
    }

    pub(crate) fn set_content(&self, content: ContentValidation) {
        self.lock().content = Some(content);
    }

    pub(crate) fn set_data_tests(&self, tests: Vec<DataTest>) {
        self.lock().data_tests = tests;
    }

    pub(crate) fn set_data_test_outcome(&self, test: &str, outcomes: Vec<DataTestOutcome>) {
        self.lock()
            .data_test_outcomes
            .insert(test.to_string(), outcomes);
    }
}

#[async_trait]
impl PlatformClient for StubPlatform {
    async fn fetch_model(&self, model: &str) -> ApiResult<ModelMetadata> {
        tokio::task::yield_now().await;
        self.lock().models.get(model).cloned().ok_or(ApiError::Http {
            status: 404,
            body: format!("model {} not found", model),
        })
    }

    async fn fetch_dimensions(
        &self,
        model: &str,
        explore: &str,
    ) -> ApiResult<Vec<DimensionMetadata>> {
        tokio::task::yield_now().await;
        let key = (model.to_string(), explore.to_string());
        let inner = self.lock();
        if inner.failing_dimension_fetches.contains(&key) {
            return Err(ApiError::Transport("connection reset by peer".to_string()));
        }
        Ok(inner.dimensions.get(&key).cloned().unwrap_or_default())
    }

    async fn submit_query(
        &self,
        _model: &str,
        explore: &str,
        dimensions: &[String],
        _mode: QueryMode,
    ) -> ApiResult<JobHandle> {
        tokio::task::yield_now().await;
        let mut inner = self.lock();
        if inner.submit_failures > 0 {
            inner.submit_failures -= 1;
            return Err(ApiError::Transport("connection reset by peer".to_string()));
        }

        let key = (explore.to_string(), dimensions.to_vec());
        inner.submissions.push(key.clone());
        let script = inner
            .scripts
            .get_mut(&key)
            .and_then(|queue| queue.pop_front())
            .unwrap_or(Script::Pass);

        inner.next_id += 1;
        let id = inner.next_id;
        let pending_left = inner.pending_polls;
        inner.tasks.insert(
            format!("task-{}", id),
            TaskState {
                script,
                pending_left,
                finished: false,
            },
        );

        let in_flight = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.high_water.fetch_max(in_flight, Ordering::SeqCst);

        Ok(JobHandle {
            query_id: format!("query-{}", id),
            task_id: format!("task-{}", id),
            explore_url: Some(format!("{}/x/{}", self.base_url, id)),
        })
    }

    async fn poll_job(&self, handle: &JobHandle) -> ApiResult<JobState> {
        tokio::task::yield_now().await;
        let mut inner = self.lock();
        if inner.poll_failures > 0 {
            inner.poll_failures -= 1;
            return Err(ApiError::Transport("connection reset by peer".to_string()));
        }
        let task = inner.tasks.get_mut(&handle.task_id).ok_or(ApiError::Http {
            status: 404,
            body: format!("unknown task {}", handle.task_id),
        })?;

        if matches!(task.script, Script::PollTransport) {
            return Err(ApiError::Transport("connection reset by peer".to_string()));
        }
        if task.pending_left > 0 {
            task.pending_left -= 1;
            return Ok(JobState::Running);
        }

        let state = match &task.script {
            Script::Pass => JobState::Complete {
                data: CompleteData {
                    id: Some(handle.query_id.clone()),
                    runtime: None,
                },
            },
            Script::SlowPass(runtime) => JobState::Complete {
                data: CompleteData {
                    id: Some(handle.query_id.clone()),
                    runtime: Some(*runtime),
                },
            },
            Script::Fail(errors) => error_state(handle, None, errors.clone()),
            Script::SlowFail(runtime, errors) => error_state(handle, Some(*runtime), errors.clone()),
            Script::Kill => JobState::Killed,
            Script::Expire => JobState::Expired,
            Script::PollTransport => unreachable!("handled above"),
        };

        let terminal = !matches!(state, JobState::Added | JobState::Running | JobState::Expired);
        if terminal && !task.finished {
            task.finished = true;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
        }
        Ok(state)
    }

    async fn cancel_job(&self, handle: &JobHandle) -> ApiResult<()> {
        self.lock().cancelled.push(handle.task_id.clone());
        Ok(())
    }

    async fn content_validation(&self) -> ApiResult<ContentValidation> {
        tokio::task::yield_now().await;
        self.lock().content.clone().ok_or(ApiError::Http {
            status: 404,
            body: "no content validation scripted".to_string(),
        })
    }

    async fn all_folders(&self) -> ApiResult<Vec<Folder>> {
        tokio::task::yield_now().await;
        Ok(self.lock().folders.clone())
    }

    async fn all_data_tests(&self, model: &str) -> ApiResult<Vec<DataTest>> {
        tokio::task::yield_now().await;
        Ok(self
            .lock()
            .data_tests
            .iter()
            .filter(|t| t.model_name == model)
            .cloned()
            .collect())
    }

    async fn run_data_test(&self, _model: &str, test: &str) -> ApiResult<Vec<DataTestOutcome>> {
        tokio::task::yield_now().await;
        Ok(self
            .lock()
            .data_test_outcomes
            .get(test)
            .cloned()
            .unwrap_or_default())
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }
}

fn error_state(handle: &JobHandle, runtime: Option<f64>, errors: Vec<QueryError>) -> JobState {
    JobState::Error {
        data: ErrorData {
            id: Some(handle.query_id.clone()),
            runtime,
            sql: Some("SELECT 1".to_string()),
            errors: Some(errors),
            error: None,
        },
    }
}

/// A database error naming no hint field.
pub(crate) fn db_error(message: &str) -> QueryError {
    QueryError {
        message: message.to_string(),
        message_details: None,
        sql_error_loc: None,
        field_name: None,
    }
}

/// A database error hinting at the given field.
pub(crate) fn db_error_with_hint(message: &str, field: &str) -> QueryError {
    QueryError {
        field_name: Some(field.to_string()),
        ..db_error(message)
    }
}

/// An explore fixture with the given dimensions.
pub(crate) fn explore(model: &str, name: &str, dimensions: &[&str]) -> Explore {
    let mut explore = Explore::new(ExploreName::new(name), ModelName::new(model));
    for dim in dimensions {
        explore.dimensions.push(Dimension {
            name: DimensionName::new(*dim),
            model_name: ModelName::new(model),
            explore_name: ExploreName::new(name),
            type_: "string".to_string(),
            tags: Vec::new(),
            sql: format!("${{TABLE}}.{}", dim),
            is_hidden: false,
            url: None,
        });
    }
    explore
}

/// Dimension metadata with plain defaults.
pub(crate) fn dimension_meta(name: &str) -> DimensionMetadata {
    DimensionMetadata {
        name: DimensionName::new(name),
        type_: "string".to_string(),
        tags: Vec::new(),
        sql: format!("${{TABLE}}.{}", name),
        hidden: false,
        lookml_link: None,
    }
}
