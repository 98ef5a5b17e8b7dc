// src/bin/movefork.rs

//! Command-line entry point for `movefork`.

use anyhow::Result;
use clap::Parser;
use colored::*;
use movefork::cli::{Cli, Command, handlers};

/// Sets up logging, parses arguments, dispatches, and reports errors in one place.
fn main() {
    env_logger::init();

    if let Err(e) = run_cli(Cli::parse()) {
        eprintln!("\n{}: {:#}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run_cli(cli: Cli) -> Result<()> {
    log::debug!("CLI args parsed: {:?}", cli);

    match cli.command {
        Command::Keygen(args) => handlers::keygen::handle(args),
        Command::Scenario(args) => handlers::scenario::handle(args),
    }
}
