//! Local test harness for Move packages: forks a live network into a disposable
//! session directory and drives the `aptos` CLI against it.

/// Argument parsing and handlers for the `movefork` binary.
pub mod cli;
/// Defaults and environment variable names.
pub mod constants;
/// Session logic, output interpretation and argument encoding.
pub mod core;
/// Plain data: configuration, operation options and results.
pub mod models;
/// Process execution.
pub mod system;

pub use crate::core::accounts::AccountFactory;
pub use crate::core::session::{Session, SessionError};
pub use crate::models::{Network, SessionConfig};
