// src/core/mod.rs

/// Ephemeral keypairs and address derivation.
pub mod accounts;
/// Build directory bookkeeping.
pub mod build_dirs;
/// Argument vectors for each toolchain command.
pub mod commands;
/// Configuration file and environment loading.
pub mod config_loader;
/// JSON envelope extraction.
pub mod envelope;
/// Turns command output into typed results.
pub mod interpreter;
/// `type:value` argument encoding.
pub mod move_args;
/// Session and build directory paths.
pub mod paths;
/// The session lifecycle.
pub mod session;
/// VM status decoding.
pub mod vm_status;
