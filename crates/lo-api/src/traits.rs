//! Platform client trait definition

use crate::error::ApiResult;
use crate::types::{
    ContentValidation, DataTest, DataTestOutcome, DimensionMetadata, Folder, JobHandle, JobState,
    ModelMetadata, QueryMode,
};
use async_trait::async_trait;

/// Remote BI platform abstraction for Lookout
///
/// Implementations must be Send + Sync; the validation engine shares one
/// client across many concurrent tasks behind an `Arc`.
///
/// The client performs no retries of its own. Query submission and polling
/// retry policy belongs to the executor; discovery calls are fatal on
/// failure.
#[async_trait]
pub trait PlatformClient: Send + Sync {
    /// Fetch a model and its explore list
    async fn fetch_model(&self, model: &str) -> ApiResult<ModelMetadata>;

    /// Fetch all dimensions of an explore
    async fn fetch_dimensions(&self, model: &str, explore: &str)
        -> ApiResult<Vec<DimensionMetadata>>;

    /// Compile and submit an asynchronous validation query over the given
    /// dimensions, returning a handle for polling
    async fn submit_query(
        &self,
        model: &str,
        explore: &str,
        dimensions: &[String],
        mode: QueryMode,
    ) -> ApiResult<JobHandle>;

    /// Poll the current state of a submitted query
    async fn poll_job(&self, handle: &JobHandle) -> ApiResult<JobState>;

    /// Best-effort cancellation of an in-flight query
    async fn cancel_job(&self, handle: &JobHandle) -> ApiResult<()>;

    /// Run the platform's content validation sweep
    async fn content_validation(&self) -> ApiResult<ContentValidation>;

    /// Fetch the full folder tree
    async fn all_folders(&self) -> ApiResult<Vec<Folder>>;

    /// Fetch the data tests defined in a model
    async fn all_data_tests(&self, model: &str) -> ApiResult<Vec<DataTest>>;

    /// Run a single data test
    async fn run_data_test(&self, model: &str, test: &str) -> ApiResult<Vec<DataTestOutcome>>;

    /// Base URL of the platform, used to build links in reports
    fn base_url(&self) -> &str;
}
