// src/cli/mod.rs

use clap::{Parser, Subcommand};

/// Per-subcommand arguments.
pub mod args;
/// One handler per subcommand.
pub mod handlers;

use args::{KeygenArgs, ScenarioArgs};

/// movefork: runs Move packages against a disposable local fork of a live network.
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about,
    styles = clap::builder::Styles::styled()
        .header(clap::builder::styling::AnsiColor::Yellow.on_default().bold())
        .usage(clap::builder::styling::AnsiColor::Yellow.on_default().bold())
        .literal(clap::builder::styling::AnsiColor::Cyan.on_default().bold())
        .placeholder(clap::builder::styling::AnsiColor::Green.on_default()),
)]
#[command(disable_help_subcommand = true)]
pub struct Cli {
    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print a freshly generated account as JSON.
    Keygen(KeygenArgs),
    /// Fork, fund a sender, publish and call a package, then tear everything down.
    Scenario(ScenarioArgs),
}
