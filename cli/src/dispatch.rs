use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::CommandFactory;

use mediabench_core::{ProcessingResult, Registry};

use crate::cli::{Cli, Command};
use crate::report::{exit_status, render, render_operations};

/// Resolves subcommands against a registry and runs them.
pub struct Dispatcher<'a> {
    registry: &'a Registry,
}

impl<'a> Dispatcher<'a> {
    pub fn new(registry: &'a Registry) -> Self {
        Self { registry }
    }

    /// Run one command. Errors mean the command could not be started at
    /// all; operation failures come back inside the result.
    pub fn dispatch(&self, command: &Command) -> Result<ProcessingResult> {
        let request = command
            .to_request()
            .with_context(|| format!("Invalid parameters for {}", command.key()))?;
        let operation = self.registry.resolve(command.key())?;

        log::info!("Running {} ({})", command.key(), operation.name());
        let result = operation.execute(&request);
        log::debug!("{} finished: success={}", command.key(), result.success());

        Ok(result)
    }
}

/// Entry point shared by `main` and tests.
pub fn run(cli: &Cli, registry: &Registry) -> Result<ExitCode> {
    let Some(command) = &cli.command else {
        Cli::command().print_help()?;
        println!("\n{}", "=".repeat(60));
        print!("{}", render_operations(&registry.describe()));
        return Ok(ExitCode::SUCCESS);
    };

    let result = Dispatcher::new(registry).dispatch(command)?;
    println!("\n{}", render(&result));
    Ok(ExitCode::from(exit_status(&result)))
}
