//! # System Interaction Layer
//!
//! The boundary between session logic and the operating system.
//!
//! ## Modules
//!
//! - **`executor`**: spawns the toolchain binary with an explicit argument vector, captures
//!   both streams, and enforces the timeout and output ceiling. The `ProcessRunner` trait
//!   lets tests substitute a recording fake.

pub mod executor;
