//! lo-validate - Validation engine for Lookout
//!
//! This crate turns a discovered model graph into validation verdicts: it
//! probes explores with generated SQL queries, isolates failing dimension
//! sets, checks saved content, and runs model data tests. Everything is
//! written against the `PlatformClient` trait so the engine never knows
//! which transport feeds it.

pub mod content;
pub mod discovery;
pub mod error;
pub mod executor;
pub mod isolate;
pub mod query;
pub mod scheduler;
pub mod sql;

#[cfg(test)]
pub(crate) mod test_utils;

pub use content::{ContentError, ContentKind, ContentValidator, TileKind};
pub use data_tests::{DataTestError, DataTestResult, DataTestValidator, SelectedDataTest};
pub use discovery::{build_model, DiscoveryOptions};
pub use error::{ExecutorError, ValidateError, ValidateResult};
pub use executor::{
    DbFailure, ExecutorOptions, ProfiledQuery, QueryExecutor, QueryOutcome, DEFAULT_CONCURRENCY,
    DEFAULT_RUNTIME_THRESHOLD,
};
pub use isolate::{isolate_explore, IsolateOptions, DEFAULT_CHUNK_SIZE};
pub use query::ValidationQuery;
pub use scheduler::{run_explores, spawn_watchdog, CancelToken};
pub use sql::{SqlOptions, SqlValidator};
