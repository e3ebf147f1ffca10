//! HTTP implementation of the platform client.

use crate::error::{ApiError, ApiResult};
use crate::traits::PlatformClient;
use crate::types::{
    ContentValidation, DataTest, DataTestOutcome, DimensionMetadata, Folder, JobHandle, JobState,
    ModelMetadata, QueryMode,
};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Platform client over HTTP with bearer-token authentication.
pub struct HttpPlatform {
    client: reqwest::Client,
    base_url: String,
    api_url: String,
}

#[derive(Serialize)]
struct CreateQueryBody<'a> {
    model: &'a str,
    explore: &'a str,
    fields: &'a [String],
    mode: QueryMode,
    /// Validation queries never fetch rows.
    limit: u32,
    filter_expression: &'a str,
}

#[derive(Deserialize)]
struct CreateQueryResponse {
    id: String,
    #[serde(default)]
    explore_url: Option<String>,
}

#[derive(Serialize)]
struct CreateTaskBody<'a> {
    query_id: &'a str,
    result_format: &'a str,
}

#[derive(Deserialize)]
struct CreateTaskResponse {
    id: String,
}

impl HttpPlatform {
    /// Create a client for the given base URL and pre-issued API token.
    ///
    /// `request_timeout` bounds a single HTTP request, not a query's
    /// lifetime; long-running queries are polled, not held open.
    pub fn new(base_url: &str, api_token: &str, request_timeout: Duration) -> ApiResult<Self> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", api_token))
            .map_err(|e| ApiError::Config(format!("invalid API token: {}", e)))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .connect_timeout(CONNECT_TIMEOUT)
            .default_headers(headers)
            .build()
            .map_err(|e| ApiError::Config(e.to_string()))?;

        let base_url = base_url.trim_end_matches('/').to_string();
        let api_url = format!("{}/api", base_url);
        Ok(Self {
            client,
            base_url,
            api_url,
        })
    }

    /// Map a non-success status to an error, preserving the response body.
    async fn check(response: reqwest::Response) -> ApiResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::Http {
                status: status.as_u16(),
                body,
            })
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: String) -> ApiResult<T> {
        let response = self.client.get(&url).send().await?;
        let parsed = Self::check(response).await?.json().await?;
        Ok(parsed)
    }
}

#[async_trait]
impl PlatformClient for HttpPlatform {
    async fn fetch_model(&self, model: &str) -> ApiResult<ModelMetadata> {
        log::debug!("Fetching model {}", model);
        self.get_json(format!("{}/models/{}", self.api_url, model))
            .await
    }

    async fn fetch_dimensions(
        &self,
        model: &str,
        explore: &str,
    ) -> ApiResult<Vec<DimensionMetadata>> {
        log::debug!("Fetching dimensions for {}/{}", model, explore);
        self.get_json(format!(
            "{}/models/{}/explores/{}/dimensions",
            self.api_url, model, explore
        ))
        .await
    }

    async fn submit_query(
        &self,
        model: &str,
        explore: &str,
        dimensions: &[String],
        mode: QueryMode,
    ) -> ApiResult<JobHandle> {
        let body = CreateQueryBody {
            model,
            explore,
            fields: dimensions,
            mode,
            limit: 0,
            filter_expression: "1=2",
        };
        let response = self
            .client
            .post(format!("{}/queries", self.api_url))
            .json(&body)
            .send()
            .await?;
        let query: CreateQueryResponse = Self::check(response).await?.json().await?;

        let response = self
            .client
            .post(format!("{}/query_tasks", self.api_url))
            .query(&[("cache", "false")])
            .json(&CreateTaskBody {
                query_id: &query.id,
                result_format: "json_detail",
            })
            .send()
            .await?;
        let task: CreateTaskResponse = Self::check(response).await?.json().await?;

        log::debug!(
            "Submitted query {} for {}/{} (n={})",
            task.id,
            model,
            explore,
            dimensions.len()
        );
        Ok(JobHandle {
            query_id: query.id,
            task_id: task.id,
            explore_url: query.explore_url,
        })
    }

    async fn poll_job(&self, handle: &JobHandle) -> ApiResult<JobState> {
        self.get_json(format!("{}/query_tasks/{}", self.api_url, handle.task_id))
            .await
    }

    async fn cancel_job(&self, handle: &JobHandle) -> ApiResult<()> {
        log::debug!("Cancelling query task {}", handle.task_id);
        let response = self
            .client
            .delete(format!("{}/query_tasks/{}", self.api_url, handle.task_id))
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn content_validation(&self) -> ApiResult<ContentValidation> {
        log::debug!("Starting content validation sweep");
        let response = self
            .client
            .post(format!("{}/content_validation", self.api_url))
            .send()
            .await?;
        let parsed = Self::check(response).await?.json().await?;
        Ok(parsed)
    }

    async fn all_folders(&self) -> ApiResult<Vec<Folder>> {
        self.get_json(format!("{}/folders", self.api_url)).await
    }

    async fn all_data_tests(&self, model: &str) -> ApiResult<Vec<DataTest>> {
        self.get_json(format!("{}/models/{}/data_tests", self.api_url, model))
            .await
    }

    async fn run_data_test(&self, model: &str, test: &str) -> ApiResult<Vec<DataTestOutcome>> {
        log::debug!("Running data test {} ({})", test, model);
        self.get_json(format!(
            "{}/models/{}/data_tests/{}/run",
            self.api_url, model, test
        ))
        .await
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }
}
