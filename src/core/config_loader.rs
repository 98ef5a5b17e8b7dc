//! # Config Loader
//!
//! Builds a `SessionConfig` from up to three layers, lowest priority first:
//! built-in defaults, a `movefork.toml` file, and `MOVEFORK_*` environment variables.
//! Path fields expand `~` and `$VAR` after all layers are applied.

use crate::{
    constants::{DEFAULT_CONFIG_FILENAME, ENV_API_KEY, ENV_BINARY, ENV_NETWORK, ENV_TIMEOUT_MS},
    core::paths::{self, PathError},
    models::{Network, SessionConfig},
};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors while loading `movefork.toml` and its overrides.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not read configuration file '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse TOML file at '{path}': {source}")]
    TomlParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("Environment variable {var}='{value}' is invalid: {message}")]
    InvalidEnv {
        var: &'static str,
        value: String,
        message: String,
    },
    #[error(transparent)]
    Path(#[from] PathError),
}

/// Loads the configuration.
///
/// With an explicit `path` the file must exist. Without one, `movefork.toml` in the
/// working directory is used when present and defaults apply otherwise.
pub fn load_config(path: Option<&Path>) -> Result<SessionConfig, ConfigError> {
    let config = match path {
        Some(p) => read_config_file(p)?,
        None => {
            let default_path = Path::new(DEFAULT_CONFIG_FILENAME);
            if default_path.is_file() {
                read_config_file(default_path)?
            } else {
                log::debug!("No {} found, using defaults.", DEFAULT_CONFIG_FILENAME);
                SessionConfig::default()
            }
        }
    };

    let lookup = |var: &str| std::env::var(var).ok();
    let config = apply_env_overrides(config, lookup)?;
    expand_config_paths(config, lookup)
}

/// Reads and parses one TOML file.
pub fn read_config_file(path: &Path) -> Result<SessionConfig, ConfigError> {
    log::debug!("Loading configuration from '{}'", path.display());
    let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Applies `MOVEFORK_*` overrides. `lookup` abstracts the environment for tests.
pub fn apply_env_overrides<F>(mut config: SessionConfig, lookup: F) -> Result<SessionConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(bin) = lookup(ENV_BINARY).filter(|v| !v.is_empty()) {
        config.binary_path = PathBuf::from(bin);
    }
    if let Some(network) = lookup(ENV_NETWORK).filter(|v| !v.is_empty()) {
        config.network = network
            .parse::<Network>()
            .map_err(|message| ConfigError::InvalidEnv {
                var: ENV_NETWORK,
                value: network.clone(),
                message,
            })?;
    }
    if let Some(key) = lookup(ENV_API_KEY).filter(|v| !v.is_empty()) {
        config.api_key = Some(key);
    }
    if let Some(timeout) = lookup(ENV_TIMEOUT_MS).filter(|v| !v.is_empty()) {
        config.timeout_ms = timeout
            .trim()
            .parse()
            .map_err(|e: std::num::ParseIntError| ConfigError::InvalidEnv {
                var: ENV_TIMEOUT_MS,
                value: timeout.clone(),
                message: e.to_string(),
            })?;
    }
    Ok(config)
}

/// Expands `~` and `$VAR` in the path fields. `lookup` abstracts the environment for tests.
pub fn expand_config_paths<F>(mut config: SessionConfig, lookup: F) -> Result<SessionConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    config.binary_path = paths::expand_path_with(&config.binary_path.to_string_lossy(), &lookup)?;
    if let Some(session_path) = &config.session_path {
        config.session_path = Some(paths::expand_path_with(
            &session_path.to_string_lossy(),
            &lookup,
        )?);
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var| map.get(var).cloned()
    }

    #[test]
    fn test_read_config_file() {
        // --- Setup ---
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
network = "testnet"
binary_path = "/opt/aptos/bin/aptos"
timeout_ms = 5000
keep_session = true

[env]
RUST_BACKTRACE = "1"
"#
        )
        .unwrap();

        // --- Execute ---
        let config = read_config_file(file.path()).unwrap();

        // --- Assert ---
        assert_eq!(config.network, Network::Testnet);
        assert_eq!(config.binary_path, PathBuf::from("/opt/aptos/bin/aptos"));
        assert_eq!(config.timeout_ms, 5000);
        assert!(config.keep_session);
        assert!(!config.quiet);
        assert_eq!(config.env.get("RUST_BACKTRACE").map(String::as_str), Some("1"));
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "netwrk = \"devnet\"").unwrap();
        let err = read_config_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::TomlParse { .. }));
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let err = load_config(Some(Path::new("/no/such/movefork.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_env_overrides_win() {
        let config = apply_env_overrides(
            SessionConfig::default(),
            env_of(&[
                (ENV_BINARY, "/usr/local/bin/aptos"),
                (ENV_NETWORK, "Devnet"),
                (ENV_API_KEY, "key-123"),
                (ENV_TIMEOUT_MS, "9000"),
            ]),
        )
        .unwrap();

        assert_eq!(config.binary_path, PathBuf::from("/usr/local/bin/aptos"));
        assert_eq!(config.network, Network::Devnet);
        assert_eq!(config.api_key.as_deref(), Some("key-123"));
        assert_eq!(config.timeout_ms, 9000);
    }

    #[test]
    fn test_invalid_env_values() {
        let err = apply_env_overrides(SessionConfig::default(), env_of(&[(ENV_NETWORK, "moon")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnv { var: ENV_NETWORK, .. }));

        let err =
            apply_env_overrides(SessionConfig::default(), env_of(&[(ENV_TIMEOUT_MS, "soon")]))
                .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnv { var: ENV_TIMEOUT_MS, .. }));
    }

    #[test]
    fn test_config_paths_are_expanded() {
        let config = SessionConfig::default()
            .with_binary_path("~/.local/bin/aptos")
            .with_session_path("$SCRATCH/fork");

        let expanded = expand_config_paths(
            config,
            env_of(&[("HOME", "/home/dev"), ("SCRATCH", "/tmp/scratch")]),
        )
        .unwrap();

        assert_eq!(expanded.binary_path, PathBuf::from("/home/dev/.local/bin/aptos"));
        assert_eq!(expanded.session_path, Some(PathBuf::from("/tmp/scratch/fork")));

        let err = expand_config_paths(
            SessionConfig::default().with_session_path("$MISSING/fork"),
            env_of(&[]),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Path(_)));
    }

    #[test]
    fn test_defaults_without_overrides() {
        let config = apply_env_overrides(SessionConfig::default(), env_of(&[])).unwrap();
        assert_eq!(config, SessionConfig::default());
        assert_eq!(config.network, Network::Mainnet);
        assert_eq!(config.binary_path, PathBuf::from("aptos"));
        assert_eq!(config.timeout_ms, 120_000);
        assert!(config.session_path.is_none());
    }
}
