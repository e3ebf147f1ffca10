//! CLI argument definitions using clap derive API

use clap::{Args, Parser, Subcommand, ValueEnum};
use lo_validate::{DEFAULT_CHUNK_SIZE, DEFAULT_CONCURRENCY, DEFAULT_RUNTIME_THRESHOLD};

/// Lookout - continuous-integration validation for BI models
#[derive(Parser, Debug)]
#[command(name = "lo")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all commands
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Base URL of the platform instance
    #[arg(long, global = true, env = "LOOKOUT_BASE_URL")]
    pub base_url: Option<String>,

    /// API token used to authenticate against the platform
    #[arg(long, global = true, env = "LOOKOUT_API_TOKEN", hide_env_values = true)]
    pub api_token: Option<String>,

    /// Output format
    #[arg(long, global = true, value_enum, default_value = "text")]
    pub output: OutputFormat,
}

/// Report output formats
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable per-explore lines
    Text,
    /// Machine-readable JSON
    Json,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate the SQL of a model's dimensions
    Sql(SqlArgs),

    /// Find saved content broken by a model
    Content(ContentArgs),

    /// Run the data tests defined in a model
    Dt(DtArgs),
}

/// Arguments for the sql command
#[derive(Args, Debug)]
pub struct SqlArgs {
    /// Model to validate
    pub model: String,

    /// Limit validation to these explores (repeatable)
    #[arg(short = 'e', long = "explores", value_name = "MODEL/EXPLORE")]
    pub explores: Vec<String>,

    /// Ceiling on concurrently running queries
    #[arg(long, default_value_t = DEFAULT_CONCURRENCY)]
    pub concurrency: usize,

    /// Report explore-level errors without isolating dimensions
    #[arg(long)]
    pub fail_fast: bool,

    /// Skip hidden dimensions
    #[arg(long)]
    pub ignore_hidden: bool,

    /// Cancel the run after this many seconds
    #[arg(long, value_name = "SECONDS")]
    pub timeout: Option<u64>,

    /// Maximum dimensions per generated query
    #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
    pub chunk_size: usize,

    /// Print the slowest queries after the run
    #[arg(long)]
    pub profile: bool,

    /// Runtime in seconds above which a query is profiled
    #[arg(long, default_value_t = DEFAULT_RUNTIME_THRESHOLD)]
    pub runtime_threshold: f64,
}

/// Arguments for the content command
#[derive(Args, Debug)]
pub struct ContentArgs {
    /// Model to validate
    pub model: String,

    /// Limit validation to these explores (repeatable)
    #[arg(short = 'e', long = "explores", value_name = "MODEL/EXPLORE")]
    pub explores: Vec<String>,

    /// Skip content in personal folders
    #[arg(long)]
    pub exclude_personal: bool,

    /// Folder ids to inspect; prefix with '-' to exclude one (repeatable)
    #[arg(long = "folders", value_name = "FOLDER_ID", allow_hyphen_values = true)]
    pub folders: Vec<String>,
}

/// Arguments for the dt command
#[derive(Args, Debug)]
pub struct DtArgs {
    /// Model whose data tests to run
    pub model: String,

    /// Limit tests to these explores (repeatable)
    #[arg(short = 'e', long = "explores", value_name = "MODEL/EXPLORE")]
    pub explores: Vec<String>,
}

#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;
