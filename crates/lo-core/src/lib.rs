//! lo-core - Core library for Lookout
//!
//! This crate provides the shared types used across all Lookout components:
//! strongly-typed names, the model graph discovered from the platform,
//! explore selectors, and the aggregated validation report.

pub mod dimension_name;
pub mod error;
pub mod explore_name;
pub mod model;
pub mod model_name;
mod newtype_string;
pub mod report;
pub mod selector;

pub use dimension_name::DimensionName;
pub use error::{CoreError, CoreResult};
pub use explore_name::ExploreName;
pub use model::{Dimension, Explore, Model, SkipReason};
pub use model_name::ModelName;
pub use report::{
    ExploreResult, ExploreStatus, RunStats, SqlIssue, ValidationReport,
};
pub use selector::ExploreSelector;
