//! CLI command implementations

pub(crate) mod common;
pub(crate) mod content;
pub(crate) mod dt;
pub(crate) mod sql;
