//! # Session
//!
//! One forked, disposable execution environment. A session owns its directory on disk and
//! every build directory its compile/publish calls leave behind, and deletes them in
//! `destroy`.
//!
//! Lifecycle: `create` forks the network and returns an alive session (a failed fork never
//! yields a session). Every operation requires the session to be alive. `destroy` is
//! terminal and idempotent; after it, operations fail before any process is spawned.

use crate::{
    core::{
        accounts::{AccountError, AccountFactory},
        build_dirs::BuildDirs,
        commands,
        envelope::{self, Envelope, EnvelopeError},
        interpreter::{self, MalformedOutput},
        paths,
    },
    models::{
        Account, CompileOptions, CompileResult, FundOptions, FundResult, Network, PublishOptions,
        RunOptions, ScriptOptions, SessionConfig, TransactionResult, ViewOptions, ViewResourceOptions,
        ViewResult,
    },
    system::executor::{
        CommandOutput, ExecOptions, ExecutionError, ProcessRunner, SystemRunner, render_command,
    },
};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;

/// Everything a session operation can fail with.
#[derive(Error, Debug)]
pub enum SessionError {
    /// The session was already torn down.
    #[error("Session '{path}' has been destroyed; '{operation}' is no longer available.")]
    Destroyed {
        operation: &'static str,
        path: PathBuf,
    },
    /// The toolchain could not be run, failed, or was killed.
    #[error(transparent)]
    Execution(#[from] ExecutionError),
    /// The compiler rejected the package. `diagnostics` holds its stderr.
    #[error("Compilation of package '{package}' failed:\n{diagnostics}")]
    Compilation {
        package: PathBuf,
        diagnostics: String,
        #[source]
        source: Option<ExecutionError>,
    },
    /// A read command exited cleanly but printed no JSON.
    #[error(transparent)]
    Parse(#[from] EnvelopeError),
    /// The toolchain answered with an `Error` envelope.
    #[error("The toolchain reported an error: {reason}")]
    Rejected { reason: String, raw: String },
    /// The session directory could not be created or inspected.
    #[error("Could not prepare session directory '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Account generation failed.
    #[error(transparent)]
    Account(#[from] AccountError),
}

/// Where a session is in its life. There is no way back from `Destroyed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Alive,
    Destroyed,
}

/// The mutable part of a session. Guarded so tracking stays consistent; the
/// subprocess calls themselves run outside the lock.
#[derive(Debug)]
struct SessionState {
    lifecycle: Lifecycle,
    build_dirs: BuildDirs,
}

/// A disposable fork of a live network, driven through the toolchain binary.
///
/// Dropping a session destroys it.
pub struct Session {
    config: SessionConfig,
    path: PathBuf,
    runner: Arc<dyn ProcessRunner>,
    state: Mutex<SessionState>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("path", &self.path)
            .field("network", &self.config.network)
            .field("state", &*self.state())
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Forks the configured network with the real toolchain binary.
    pub fn create(config: SessionConfig) -> Result<Self, SessionError> {
        Self::create_with_runner(config, Arc::new(SystemRunner))
    }

    /// Forks the configured network through `runner`.
    ///
    /// When the fork command fails, a generated session directory is removed again and the
    /// error is returned; a caller-supplied directory is left as it was.
    pub fn create_with_runner(
        config: SessionConfig,
        runner: Arc<dyn ProcessRunner>,
    ) -> Result<Self, SessionError> {
        let generated = config.session_path.is_none();
        let path = config
            .session_path
            .clone()
            .unwrap_or_else(paths::generate_session_path);

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| SessionError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let cleanup = scopeguard::guard(path.clone(), move |p| {
            if generated {
                paths::remove_dir_best_effort(&p);
            }
        });

        let args = commands::init_args(&path, config.network, config.api_key.as_deref());
        announce(&config, &args);
        runner.execute(&config.binary_path, &args, &exec_options(&config))?;

        let path = scopeguard::ScopeGuard::into_inner(cleanup);
        if !config.quiet {
            log::info!("Forked {} into session '{}'", config.network, path.display());
        }

        Ok(Self {
            config,
            path,
            runner,
            state: Mutex::new(SessionState {
                lifecycle: Lifecycle::Alive,
                build_dirs: BuildDirs::new(),
            }),
        })
    }

    // --- ACCESSORS ---

    /// The session directory on disk.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The network this session forked.
    pub fn network(&self) -> Network {
        self.config.network
    }

    /// The configuration the session was created with.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// `false` once `destroy` has run.
    pub fn is_alive(&self) -> bool {
        self.state().lifecycle == Lifecycle::Alive
    }

    /// Build directories that `destroy` will remove.
    pub fn tracked_build_dirs(&self) -> Vec<PathBuf> {
        self.state().build_dirs.snapshot()
    }

    // --- OPERATIONS ---

    /// Compiles a package with metadata. The build directory is tracked on success and
    /// removed immediately on failure.
    pub fn compile(&self, options: &CompileOptions) -> Result<CompileResult, SessionError> {
        self.ensure_alive("compile")?;
        let build_dir =
            paths::resolve_build_dir(&options.package_dir, options.output_dir.as_deref());

        let output = match self.invoke(commands::compile_args(options)) {
            Ok(output) => output,
            Err(e) => {
                self.discard_build_dir(&build_dir);
                return Err(compilation_failure(&options.package_dir, e));
            }
        };

        let module_ids = match envelope::classify(&output.stdout) {
            Envelope::Success(payload) => interpreter::module_ids(&payload),
            Envelope::Failure(reason) => {
                self.discard_build_dir(&build_dir);
                return Err(SessionError::Compilation {
                    package: options.package_dir.clone(),
                    diagnostics: reason,
                    source: None,
                });
            }
            Envelope::Malformed(_) => {
                log::warn!(
                    "Compile output for '{}' had no JSON payload; assuming no module ids.",
                    options.package_dir.display()
                );
                Vec::new()
            }
        };

        self.track_build_dir(build_dir.clone());
        Ok(CompileResult {
            module_ids,
            build_dir,
            raw: output.stdout,
        })
    }

    /// Publishes a package into the fork. The build directory stays tracked on success and
    /// is removed when the command fails, so a retry starts from a clean build.
    pub fn publish(&self, options: &PublishOptions) -> Result<TransactionResult, SessionError> {
        self.ensure_alive("publish")?;
        let build_dir =
            paths::resolve_build_dir(&options.package_dir, options.output_dir.as_deref());

        let output = match self.invoke(commands::publish_args(&self.path, options)) {
            Ok(output) => output,
            Err(e) => {
                self.discard_build_dir(&build_dir);
                return Err(e.into());
            }
        };
        self.track_build_dir(build_dir);

        let on_malformed = if self.config.strict_publish_output {
            MalformedOutput::Unsuccessful
        } else {
            MalformedOutput::Optimistic
        };
        Ok(interpreter::interpret_transaction(output, on_malformed))
    }

    /// `compile` followed by `publish`. Each step cleans up after its own failure.
    pub fn compile_and_publish(
        &self,
        options: &PublishOptions,
    ) -> Result<TransactionResult, SessionError> {
        self.compile(&options.compile_options())?;
        self.publish(options)
    }

    /// Runs an entry function. A zero exit with a failed transaction is a result, not an error.
    pub fn run(&self, options: &RunOptions) -> Result<TransactionResult, SessionError> {
        self.ensure_alive("run")?;
        let output = self.invoke(commands::run_args(&self.path, options))?;
        Ok(interpreter::interpret_transaction(
            output,
            MalformedOutput::Unsuccessful,
        ))
    }

    /// Runs a Move script as a transaction. Malformed output counts as a failure.
    pub fn run_script(&self, options: &ScriptOptions) -> Result<TransactionResult, SessionError> {
        self.ensure_alive("run_script")?;
        let output = self.invoke(commands::run_script_args(&self.path, options))?;
        Ok(interpreter::interpret_transaction(
            output,
            MalformedOutput::Unsuccessful,
        ))
    }

    /// Calls a view function. Either a value comes back or the whole call fails.
    pub fn view(&self, options: &ViewOptions) -> Result<ViewResult, SessionError> {
        self.ensure_alive("view")?;
        let output = self.invoke(commands::view_args(&self.path, options))?;
        read_payload(output)
    }

    /// Credits `amount` to an account inside the fork.
    pub fn fund(&self, options: &FundOptions) -> Result<FundResult, SessionError> {
        self.ensure_alive("fund")?;
        let output = self.invoke(commands::fund_args(&self.path, options))?;
        Ok(FundResult {
            success: true,
            raw: output.stdout,
        })
    }

    /// Reads one resource stored under an account.
    pub fn view_resource(&self, options: &ViewResourceOptions) -> Result<ViewResult, SessionError> {
        self.ensure_alive("view_resource")?;
        let output = self.invoke(commands::view_resource_args(&self.path, options))?;
        read_payload(output)
    }

    /// Generates a fresh account and funds it inside the fork.
    pub fn create_funded_account(
        &self,
        factory: &AccountFactory,
        amount: u64,
    ) -> Result<Account, SessionError> {
        self.ensure_alive("create_funded_account")?;
        let account = factory.create_account()?;
        self.fund(&FundOptions {
            account: account.address.clone(),
            amount,
        })?;
        Ok(account)
    }

    /// Removes every tracked build directory and, unless `keep_session` is set, the session
    /// directory. Best-effort and idempotent: only the first call does anything.
    pub fn destroy(&self) {
        let build_dirs = {
            let mut state = self.state();
            if state.lifecycle == Lifecycle::Destroyed {
                return;
            }
            state.lifecycle = Lifecycle::Destroyed;
            state.build_dirs.drain()
        };

        for dir in &build_dirs {
            paths::remove_dir_best_effort(dir);
        }
        if self.config.keep_session {
            log::debug!("Keeping session directory '{}'", self.path.display());
        } else {
            paths::remove_dir_best_effort(&self.path);
        }

        if !self.config.quiet {
            log::info!(
                "Destroyed session '{}' ({} build dir(s) removed)",
                self.path.display(),
                build_dirs.len()
            );
        }
    }

    // --- INTERNALS ---

    fn state(&self) -> MutexGuard<'_, SessionState> {
        // Tracking data stays valid even if a holder panicked.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn ensure_alive(&self, operation: &'static str) -> Result<(), SessionError> {
        match self.state().lifecycle {
            Lifecycle::Alive => Ok(()),
            Lifecycle::Destroyed => Err(SessionError::Destroyed {
                operation,
                path: self.path.clone(),
            }),
        }
    }

    fn invoke(&self, args: Vec<String>) -> Result<CommandOutput, ExecutionError> {
        announce(&self.config, &args);
        self.runner
            .execute(&self.config.binary_path, &args, &exec_options(&self.config))
    }

    /// Tracks `dir` for teardown. If `destroy` ran while the command was in flight, the
    /// set has already been drained, so the directory is removed here instead.
    fn track_build_dir(&self, dir: PathBuf) {
        let mut state = self.state();
        if state.lifecycle == Lifecycle::Destroyed {
            log::warn!(
                "Session was destroyed during the command; removing build dir '{}'",
                dir.display()
            );
            paths::remove_dir_best_effort(&dir);
            return;
        }
        log::debug!("Tracking build dir '{}'", dir.display());
        state.build_dirs.track(dir);
    }

    fn discard_build_dir(&self, dir: &Path) {
        paths::remove_dir_best_effort(dir);
        self.state().build_dirs.untrack(dir);
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.destroy();
    }
}

fn exec_options(config: &SessionConfig) -> ExecOptions {
    ExecOptions {
        timeout: config.timeout(),
        cwd: None,
        env: config.env.clone(),
        allow_non_zero_exit: false,
        max_output_bytes: config.max_output_bytes,
    }
}

fn announce(config: &SessionConfig, args: &[String]) {
    if config.quiet {
        return;
    }
    log::info!("→ {}", render_command(&config.binary_path, args));
}

/// A compile failure with diagnostics becomes `Compilation`; without any, the raw
/// execution error surfaces unchanged.
fn compilation_failure(package: &Path, error: ExecutionError) -> SessionError {
    if error.stderr().trim().is_empty() {
        return SessionError::Execution(error);
    }
    SessionError::Compilation {
        package: package.to_path_buf(),
        diagnostics: error.stderr().to_string(),
        source: Some(error),
    }
}

fn read_payload(output: CommandOutput) -> Result<ViewResult, SessionError> {
    match envelope::classify(&output.stdout) {
        Envelope::Success(value) => Ok(ViewResult {
            value,
            raw: output.stdout,
        }),
        Envelope::Failure(reason) => Err(SessionError::Rejected {
            reason,
            raw: output.stdout,
        }),
        Envelope::Malformed(raw) => Err(SessionError::Parse(EnvelopeError { raw })),
    }
}
