//! Lookout CLI - continuous-integration validation for BI models

use clap::Parser;

mod cli;
mod commands;

use cli::Cli;
use commands::{content, dt, sql};

#[tokio::main]
async fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let result = match &cli.command {
        cli::Commands::Sql(args) => sql::execute(args, &cli.global).await,
        cli::Commands::Content(args) => content::execute(args, &cli.global).await,
        cli::Commands::Dt(args) => dt::execute(args, &cli.global).await,
    };

    if let Err(error) = result {
        let code = match error.downcast_ref::<commands::common::ExitCode>() {
            Some(exit) => exit.0,
            None => {
                eprintln!("Error: {:#}", error);
                1
            }
        };
        std::process::exit(code);
    }
}
