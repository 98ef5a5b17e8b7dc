// src/cli/handlers/keygen.rs

use crate::{cli::args::KeygenArgs, core::accounts::AccountFactory};
use anyhow::Result;

/// Prints `count` fresh accounts, one pretty JSON object each.
pub fn handle(args: KeygenArgs) -> Result<()> {
    let factory = AccountFactory::default();
    for _ in 0..args.count {
        let account = factory.create_account()?;
        println!("{}", serde_json::to_string_pretty(&account)?);
    }
    Ok(())
}
