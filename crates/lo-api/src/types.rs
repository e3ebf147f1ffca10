//! Wire types for the platform API.
//!
//! Deserialization is liberal: optional fields default instead of failing,
//! because the platform's payloads vary across versions and result formats.

use lo_core::{DimensionName, ExploreName, ModelName};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Dev-mode notices the platform reports alongside real errors. They do not
/// indicate a database failure and are filtered out before classification.
const DEV_MODE_WARNINGS: [&str; 2] = [
    "Note: This query contains derived tables with conditional SQL for Development Mode. \
     Query results in Production Mode might be different.",
    "Note: This query contains derived tables with Development Mode filters. \
     Query results in Production Mode might be different.",
];

/// Shape of the generated probe query.
///
/// `Batch` selects every submitted dimension in one query; `Single` is the
/// one-column confirmation shape. The mode changes how many columns the
/// platform compiles into SQL, never which errors are detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryMode {
    Batch,
    Single,
}

/// Handle to a submitted query job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobHandle {
    /// Id of the compiled query.
    pub query_id: String,
    /// Id of the asynchronous task executing it.
    pub task_id: String,
    /// Link to reproduce the query in the explore UI, when provided.
    pub explore_url: Option<String>,
}

/// State of a query task, as reported by a poll.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum JobState {
    /// Queued, not yet picked up.
    Added,
    /// Executing in the database.
    Running,
    /// The task fell out of the platform's queue without completing.
    Expired,
    /// The database or an admin killed the query.
    Killed,
    /// Finished without errors.
    Complete { data: CompleteData },
    /// Finished with database errors.
    Error { data: ErrorData },
}

impl JobState {
    /// Whether the task has not yet reached a terminal state.
    pub fn is_pending(&self) -> bool {
        matches!(self, JobState::Added | JobState::Running)
    }

    /// Runtime in seconds, when the payload reports one.
    pub fn runtime(&self) -> Option<f64> {
        match self {
            JobState::Complete { data } => data.runtime,
            JobState::Error { data } => data.runtime,
            _ => None,
        }
    }
}

/// Payload of a completed query task.
#[derive(Debug, Clone, Deserialize)]
pub struct CompleteData {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub runtime: Option<f64>,
}

/// Payload of an errored query task.
///
/// Older API versions report a single `error` string; newer ones report a
/// structured `errors` list. Both shapes decode into this struct.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorData {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub runtime: Option<f64>,
    #[serde(default)]
    pub sql: Option<String>,
    #[serde(default)]
    pub errors: Option<Vec<QueryError>>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ErrorData {
    /// All reported errors, normalizing the single-error legacy shape.
    pub fn all_errors(&self) -> Vec<QueryError> {
        if let Some(errors) = &self.errors {
            errors.clone()
        } else if let Some(message) = &self.error {
            vec![QueryError {
                message: message.clone(),
                message_details: None,
                sql_error_loc: None,
                field_name: None,
            }]
        } else {
            Vec::new()
        }
    }

    /// Reported errors with dev-mode warnings filtered out.
    ///
    /// An empty result means the query only produced warnings and should
    /// count as a success.
    pub fn valid_errors(&self) -> Vec<QueryError> {
        self.all_errors()
            .into_iter()
            .filter(|e| !DEV_MODE_WARNINGS.contains(&e.message.as_str()))
            .collect()
    }
}

/// A single SQL error reported by the platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryError {
    pub message: String,
    #[serde(default)]
    pub message_details: Option<String>,
    #[serde(default)]
    pub sql_error_loc: Option<ErrorSqlLocation>,
    /// Field the platform suspects caused the error. A hint, not a verdict.
    #[serde(default)]
    pub field_name: Option<String>,
}

impl QueryError {
    /// Message and details joined into one line.
    pub fn full_message(&self) -> String {
        match &self.message_details {
            Some(details) if !details.is_empty() => format!("{} {}", self.message, details),
            _ => self.message.clone(),
        }
    }
}

/// Position within the generated SQL where an error occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorSqlLocation {
    #[serde(default)]
    pub line: Option<u32>,
    #[serde(default)]
    pub column: Option<u32>,
    #[serde(default)]
    pub character: Option<u32>,
}

/// A model's explore list, as discovered from the platform.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelMetadata {
    pub name: ModelName,
    #[serde(default)]
    pub explores: Vec<ExploreMetadata>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExploreMetadata {
    pub name: ExploreName,
}

/// A dimension as discovered from the platform.
#[derive(Debug, Clone, Deserialize)]
pub struct DimensionMetadata {
    pub name: DimensionName,
    #[serde(rename = "type")]
    pub type_: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub sql: String,
    #[serde(default)]
    pub hidden: bool,
    /// Path to the dimension's definition, relative to the base URL.
    #[serde(default)]
    pub lookml_link: Option<String>,
}

/// Content ids appear as strings or numbers depending on the content type.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ContentId {
    Text(String),
    Number(i64),
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentId::Text(s) => f.write_str(s),
            ContentId::Number(n) => write!(f, "{}", n),
        }
    }
}

/// Result of the platform's content validation sweep.
#[derive(Debug, Clone, Deserialize)]
pub struct ContentValidation {
    #[serde(default)]
    pub content_with_errors: Vec<ContentItem>,
}

/// One piece of broken content with its validation errors.
#[derive(Debug, Clone, Deserialize)]
pub struct ContentItem {
    #[serde(default)]
    pub look: Option<ContentDetails>,
    #[serde(default)]
    pub dashboard: Option<ContentDetails>,
    #[serde(default)]
    pub dashboard_element: Option<TileDetails>,
    #[serde(default)]
    pub dashboard_filter: Option<TileDetails>,
    #[serde(default)]
    pub errors: Vec<ContentValidatorError>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContentDetails {
    pub id: ContentId,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub folder: Option<FolderRef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TileDetails {
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FolderRef {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// A single error inside a broken piece of content.
#[derive(Debug, Clone, Deserialize)]
pub struct ContentValidatorError {
    pub model_name: String,
    pub explore_name: String,
    pub message: String,
    #[serde(default)]
    pub field_name: Option<String>,
}

/// A folder in the platform's content tree.
#[derive(Debug, Clone, Deserialize)]
pub struct Folder {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub is_personal: bool,
    #[serde(default)]
    pub is_personal_descendant: bool,
}

/// A data test defined in the model.
#[derive(Debug, Clone, Deserialize)]
pub struct DataTest {
    pub name: String,
    pub model_name: String,
    pub explore_name: String,
    #[serde(default)]
    pub query_url_params: Option<String>,
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default)]
    pub line: Option<u32>,
}

/// Result of running a single data test.
#[derive(Debug, Clone, Deserialize)]
pub struct DataTestOutcome {
    pub test_name: String,
    pub success: bool,
    #[serde(default)]
    pub errors: Vec<DataTestWireError>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataTestWireError {
    #[serde(rename = "model_id")]
    pub model: String,
    pub explore: String,
    pub message: String,
}

#[cfg(test)]
#[path = "types_test.rs"]
mod tests;
