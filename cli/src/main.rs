use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;

use mediabench::cli::Cli;
use mediabench::dispatch::run;
use mediabench_core::create_default_registry;

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Init logging
    let log_level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let registry = create_default_registry(&cli.tool_paths())
        .context("Failed to register built-in operations")?;

    run(&cli, &registry)
}
