// src/core/paths.rs

use crate::constants::{BUILD_DIR_NAME, SESSION_DIR_PREFIX};
use std::env::VarError;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;
use uuid::Uuid;

/// Path template errors.
#[derive(Error, Debug)]
pub enum PathError {
    #[error("Failed to expand path template '{template}': {message}")]
    Expansion { template: String, message: String },
}

/// A fresh, unique session directory path inside the system temp dir.
/// The directory itself is not created; the fork command does that.
pub fn generate_session_path() -> PathBuf {
    std::env::temp_dir().join(format!("{}{}", SESSION_DIR_PREFIX, Uuid::new_v4()))
}

/// Where the compiler writes artifacts for a package: the custom output dir when given,
/// `<package>/build` otherwise.
pub fn resolve_build_dir(package_dir: &Path, output_dir: Option<&Path>) -> PathBuf {
    match output_dir {
        Some(dir) => dir.to_path_buf(),
        None => package_dir.join(BUILD_DIR_NAME),
    }
}

/// Expands `~` and environment variables (`$VAR` / `${VAR}`) in a configured path.
pub fn expand_path(template: &str) -> Result<PathBuf, PathError> {
    expand_path_with(template, |var| std::env::var(var).ok())
}

/// Like `expand_path`, reading variables (and the home directory) through `lookup`.
/// A variable `lookup` does not know is an error, never an empty string.
pub fn expand_path_with<F>(template: &str, lookup: F) -> Result<PathBuf, PathError>
where
    F: Fn(&str) -> Option<String>,
{
    let home = lookup("HOME").or_else(|| lookup("USERPROFILE"));
    let expanded = shellexpand::full_with_context(
        template,
        move || home,
        |var| lookup(var).map(Some).ok_or(VarError::NotPresent),
    )
    .map_err(|e| PathError::Expansion {
        template: template.to_string(),
        message: e.to_string(),
    })?;
    Ok(PathBuf::from(expanded.into_owned()))
}

/// Removes a directory tree, treating "already gone" as success.
/// Other failures are logged and reported as `false`; they never propagate.
pub fn remove_dir_best_effort(path: &Path) -> bool {
    match fs::remove_dir_all(path) {
        Ok(()) => {
            log::debug!("Removed '{}'", path.display());
            true
        }
        Err(e) if e.kind() == ErrorKind::NotFound => true,
        Err(e) => {
            log::warn!("Could not remove '{}': {}", path.display(), e);
            false
        }
    }
}
