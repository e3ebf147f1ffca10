//! lo-api - Platform API layer for Lookout
//!
//! This crate defines the `PlatformClient` trait the validation engine is
//! written against, the wire types it exchanges, and the HTTP implementation
//! used in production.

pub mod error;
pub mod http;
pub mod traits;
pub mod types;

pub use error::{ApiError, ApiResult};
pub use http::HttpPlatform;
pub use traits::PlatformClient;
pub use types::{
    CompleteData, ContentDetails, ContentId, ContentItem, ContentValidation,
    ContentValidatorError, DataTest, DataTestOutcome, DataTestWireError, DimensionMetadata,
    ErrorData, ErrorSqlLocation, ExploreMetadata, Folder, FolderRef, JobHandle, JobState,
    ModelMetadata, QueryError, QueryMode, TileDetails,
};
