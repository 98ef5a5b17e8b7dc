// src/cli/handlers/scenario.rs

use crate::{
    cli::args::ScenarioArgs,
    core::{
        accounts::AccountFactory,
        config_loader,
        move_args::{self, MoveArg},
        session::Session,
    },
    models::{PublishOptions, RunOptions, SessionConfig, ViewOptions},
};
use anyhow::{Context, Result, anyhow};
use colored::*;
use serde::Serialize;
use std::collections::BTreeMap;

/// Runs one end-to-end scenario. The session is destroyed when this returns, on every path.
pub fn handle(args: ScenarioArgs) -> Result<()> {
    let config = build_config(&args)?;
    let session = Session::create(config).context("Failed to fork the network")?;
    println!(
        "{} {} ({})",
        "Session".green().bold(),
        session.path().display(),
        session.network()
    );

    let sender = session
        .create_funded_account(&AccountFactory::default(), args.fund_amount)
        .context("Failed to create a funded sender")?;
    print_section("sender", &sender)?;

    if let Some(package_dir) = &args.package {
        let mut named_addresses = parse_named_addresses(&args.named_addresses)?;
        if let Some(name) = &args.sender_address_name {
            named_addresses.insert(name.clone(), sender.address.clone());
        }
        let published = session.compile_and_publish(&PublishOptions {
            package_dir: package_dir.clone(),
            sender: sender.address.clone(),
            private_key: sender.private_key_hex.clone(),
            named_addresses,
            dev: args.dev,
            ..Default::default()
        })?;
        print_section("publish", &published)?;
        if !published.success {
            return Err(anyhow!("Publishing '{}' did not succeed.", package_dir.display()));
        }
    }

    if let Some(function_id) = &args.function {
        let run = session.run(&RunOptions {
            function_id: function_id.clone(),
            sender: sender.address.clone(),
            private_key: sender.private_key_hex.clone(),
            type_args: args.type_args.clone(),
            args: typed_args(&args.args)?,
            max_gas: args.max_gas,
        })?;
        print_section("run", &run)?;
    }

    if let Some(function_id) = &args.view {
        let view = session.view(&ViewOptions {
            function_id: function_id.clone(),
            type_args: args.view_type_args.clone(),
            args: typed_args(&args.view_args)?,
        })?;
        print_section("view", &view.value)?;
    }

    session.destroy();
    Ok(())
}

fn build_config(args: &ScenarioArgs) -> Result<SessionConfig> {
    let mut config = config_loader::load_config(args.config.as_deref())?;
    if let Some(network) = args.network {
        config.network = network;
    }
    if let Some(binary) = &args.binary {
        config.binary_path = binary.clone();
    }
    if args.keep_session {
        config.keep_session = true;
    }
    Ok(config)
}

/// Validates `type:value` arguments before anything is spawned and re-encodes them.
fn typed_args(raw: &[String]) -> Result<Vec<String>> {
    let parsed = raw
        .iter()
        .map(|arg| arg.parse::<MoveArg>())
        .collect::<Result<Vec<_>, _>>()?;
    Ok(move_args::encode_args(&parsed))
}

/// Parses `name=address` pairs. Later duplicates win.
fn parse_named_addresses(pairs: &[String]) -> Result<BTreeMap<String, String>> {
    pairs
        .iter()
        .map(|pair| {
            let (name, address) = pair
                .split_once('=')
                .ok_or_else(|| anyhow!("Invalid named address '{}', expected name=address.", pair))?;
            Ok((name.trim().to_string(), address.trim().to_string()))
        })
        .collect()
}

fn print_section(title: &str, value: &impl Serialize) -> Result<()> {
    println!("\n--- {} ---", title.yellow());
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_named_addresses() {
        let parsed =
            parse_named_addresses(&["admin=0x1".to_string(), " vault = 0xcafe ".to_string()])
                .unwrap();
        assert_eq!(parsed.get("admin").map(String::as_str), Some("0x1"));
        assert_eq!(parsed.get("vault").map(String::as_str), Some("0xcafe"));

        assert!(parse_named_addresses(&["admin".to_string()]).is_err());
    }

    #[test]
    fn test_typed_args_are_validated() {
        let encoded = typed_args(&["u64:10".to_string(), "bool:true".to_string()]).unwrap();
        assert_eq!(encoded, vec!["u64:10", "bool:true"]);

        assert!(typed_args(&["u8:300".to_string()]).is_err());
        assert!(typed_args(&["10".to_string()]).is_err());
    }
}
