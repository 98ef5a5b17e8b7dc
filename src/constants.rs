// src/constants.rs

/// The executable looked up on `PATH` when no binary path is configured.
pub const DEFAULT_BINARY_NAME: &str = "aptos";

/// Per-command timeout applied when the configuration does not set one.
pub const DEFAULT_TIMEOUT_MS: u64 = 120_000;

/// Ceiling for each captured output stream of a single command.
pub const DEFAULT_MAX_OUTPUT_BYTES: usize = 16 * 1024 * 1024;

/// The configuration file picked up from the working directory when no path is given.
pub const DEFAULT_CONFIG_FILENAME: &str = "movefork.toml";

/// Prefix of generated session directories (inside the system temp dir).
pub const SESSION_DIR_PREFIX: &str = "movefork-session-";

/// Name of the build directory the compiler writes inside a package.
pub const BUILD_DIR_NAME: &str = "build";

/// Overrides `binary_path`.
pub const ENV_BINARY: &str = "MOVEFORK_BIN";
/// Overrides `network`.
pub const ENV_NETWORK: &str = "MOVEFORK_NETWORK";
/// Overrides `api_key`.
pub const ENV_API_KEY: &str = "MOVEFORK_API_KEY";
/// Overrides `timeout_ms`.
pub const ENV_TIMEOUT_MS: &str = "MOVEFORK_TIMEOUT_MS";
