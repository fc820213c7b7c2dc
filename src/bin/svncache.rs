//! svncache CLI Binary
//!
//! Command-line interface for the Subversion working-copy status cache.

use anyhow::Context;
use clap::Parser;
use std::process;
use svncache::logging::init_logging;
use svncache::tooling::cli::{Cli, CliContext, Commands};

fn run(cli: &Cli) -> anyhow::Result<Option<String>> {
    let mut config = CliContext::load_config(&cli.workspace, cli.config.as_deref())
        .context("Error loading configuration")?;
    config.logging = cli.logging_config(&config.logging);
    init_logging(Some(&config.logging)).context("Error initializing logging")?;

    if let Commands::Watch { batch_window_ms } = &cli.command {
        CliContext::watch(cli.workspace.clone(), config, *batch_window_ms)?;
        return Ok(None);
    }

    let context = CliContext::new(cli.workspace.clone(), config)
        .context("Error opening working copy")?;
    let output = context.execute(&cli.command)?;
    Ok(Some(output))
}

fn main() {
    let cli = Cli::parse();

    match run(&cli) {
        Ok(Some(output)) => println!("{}", output),
        Ok(None) => {}
        Err(e) => {
            eprintln!("Error: {:#}", e);
            process::exit(1);
        }
    }
}
