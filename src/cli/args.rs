// src/cli/args.rs

use crate::models::Network;
use clap::Args;
use std::path::PathBuf;

/// Arguments for `movefork keygen`.
#[derive(Args, Debug, Default)]
pub struct KeygenArgs {
    /// Number of accounts to generate.
    #[arg(long, short = 'n', default_value_t = 1)]
    pub count: usize,
}

/// Arguments for `movefork scenario`.
#[derive(Args, Debug)]
pub struct ScenarioArgs {
    /// Configuration file. Defaults to `movefork.toml` in the working directory.
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    /// Network to fork. Overrides the configuration.
    #[arg(long)]
    pub network: Option<Network>,

    /// Path to the toolchain binary. Overrides the configuration.
    #[arg(long)]
    pub binary: Option<PathBuf>,

    /// Keep the session directory after the scenario finishes.
    #[arg(long)]
    pub keep_session: bool,

    /// Amount credited to the generated sender.
    #[arg(long, default_value_t = 100_000_000)]
    pub fund_amount: u64,

    /// Move package to compile and publish from the sender.
    #[arg(long, short)]
    pub package: Option<PathBuf>,

    /// Named addresses for the package (e.g., "admin=0x1").
    #[arg(long, value_delimiter = ',', num_args = 1..)]
    pub named_addresses: Vec<String>,

    /// Named address that resolves to the generated sender.
    #[arg(long)]
    pub sender_address_name: Option<String>,

    /// Compile the package in dev mode.
    #[arg(long)]
    pub dev: bool,

    /// Entry function to run after publishing (e.g., "0xcafe::vault::deposit").
    #[arg(long, short)]
    pub function: Option<String>,

    /// Typed arguments for the entry function (e.g., "u64:10").
    #[arg(long, num_args = 1.., allow_hyphen_values = true)]
    pub args: Vec<String>,

    /// Type arguments for the entry function.
    #[arg(long, num_args = 1..)]
    pub type_args: Vec<String>,

    /// Maximum gas for the entry function.
    #[arg(long)]
    pub max_gas: Option<u64>,

    /// View function to call last.
    #[arg(long)]
    pub view: Option<String>,

    /// Typed arguments for the view function.
    #[arg(long, num_args = 1.., allow_hyphen_values = true)]
    pub view_args: Vec<String>,

    /// Type arguments for the view function.
    #[arg(long, num_args = 1..)]
    pub view_type_args: Vec<String>,
}

#[cfg(test)]
mod tests {
    use crate::cli::{Cli, Command};
    use clap::Parser;

    #[test]
    fn test_scenario_args_parse() {
        let cli = Cli::try_parse_from([
            "movefork",
            "scenario",
            "--network",
            "testnet",
            "--package",
            "pkg",
            "--named-addresses",
            "admin=0x1,vault=0x2",
            "--function",
            "0x2::vault::deposit",
            "--args",
            "u64:10",
            "bool:true",
        ])
        .unwrap();

        let Command::Scenario(args) = cli.command else {
            panic!("expected the scenario command");
        };
        assert_eq!(args.network, Some(crate::models::Network::Testnet));
        assert_eq!(args.named_addresses, vec!["admin=0x1", "vault=0x2"]);
        assert_eq!(args.args, vec!["u64:10", "bool:true"]);
        assert_eq!(args.fund_amount, 100_000_000);
    }

    #[test]
    fn test_keygen_count() {
        let cli = Cli::try_parse_from(["movefork", "keygen", "-n", "3"]).unwrap();
        assert!(matches!(cli.command, Command::Keygen(ref a) if a.count == 3));
    }
}
