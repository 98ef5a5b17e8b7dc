// src/cli/handlers/mod.rs

/// `movefork keygen`.
pub mod keygen;
/// `movefork scenario`.
pub mod scenario;
