// EN: src/system/executor.rs

use crate::constants::{DEFAULT_MAX_OUTPUT_BYTES, DEFAULT_TIMEOUT_MS};
use std::collections::HashMap;
use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};
use std::process::{Command as StdCommand, Stdio};
use std::sync::{Arc, Mutex, PoisonError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;

/// How often a running child is polled for completion.
const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// How long to wait for the stream readers once the child is gone.
const READER_GRACE: Duration = Duration::from_millis(500);

/// Flags whose value must never reach logs or error messages.
const SECRET_FLAGS: &[&str] = &["--private-key", "--api-key"];

/// Failure of one child process. Every variant names the rendered command.
#[derive(Error, Debug)]
pub enum ExecutionError {
    /// The binary could not be started.
    #[error("Command '{command}' could not be executed: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
    /// The child exited with a failure code, or was killed by a signal.
    #[error("Command '{command}' exited with a non-zero error code ({}).", display_code(.exit_code))]
    NonZeroExit {
        command: String,
        exit_code: Option<i32>,
        stdout: String,
        stderr: String,
    },
    /// The child ran past its timeout and was killed.
    #[error("Command '{command}' timed out after {timeout_ms} ms and was killed.")]
    TimedOut {
        command: String,
        timeout_ms: u128,
        stdout: String,
        stderr: String,
    },
    /// The child printed more than the output ceiling and was killed.
    #[error("Command '{command}' produced more than {limit} bytes of output and was killed.")]
    OutputTooLarge {
        command: String,
        limit: usize,
        stdout: String,
        stderr: String,
    },
    /// Polling the child failed.
    #[error("Failed while waiting for command '{command}': {source}")]
    Wait {
        command: String,
        #[source]
        source: std::io::Error,
    },
}

fn display_code(code: &Option<i32>) -> String {
    code.map(|c| c.to_string())
        .unwrap_or_else(|| "terminated by signal".to_string())
}

impl ExecutionError {
    /// The rendered command line, secrets masked.
    pub fn command(&self) -> &str {
        match self {
            ExecutionError::Spawn { command, .. }
            | ExecutionError::NonZeroExit { command, .. }
            | ExecutionError::TimedOut { command, .. }
            | ExecutionError::OutputTooLarge { command, .. }
            | ExecutionError::Wait { command, .. } => command,
        }
    }

    /// The child's exit code, when it ran to completion on its own.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            ExecutionError::NonZeroExit { exit_code, .. } => *exit_code,
            _ => None,
        }
    }

    /// Whatever stdout was captured. Empty when the child never ran.
    pub fn stdout(&self) -> &str {
        match self {
            ExecutionError::NonZeroExit { stdout, .. }
            | ExecutionError::TimedOut { stdout, .. }
            | ExecutionError::OutputTooLarge { stdout, .. } => stdout,
            _ => "",
        }
    }

    /// Whatever stderr was captured.
    pub fn stderr(&self) -> &str {
        match self {
            ExecutionError::NonZeroExit { stderr, .. }
            | ExecutionError::TimedOut { stderr, .. }
            | ExecutionError::OutputTooLarge { stderr, .. } => stderr,
            _ => "",
        }
    }
}

/// Captured result of one finished command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Captured stdout, lossily decoded.
    pub stdout: String,
    /// Captured stderr, lossily decoded.
    pub stderr: String,
    /// `0` unless `allow_non_zero_exit` was set.
    pub exit_code: i32,
}

/// Everything that shapes a single invocation besides the argument vector.
/// The ambient environment is inherited; `env` only overrides entries for the child.
#[derive(Debug, Clone)]
pub struct ExecOptions {
    /// The child is killed once this elapses.
    pub timeout: Duration,
    /// Working directory. Inherited when `None`.
    pub cwd: Option<PathBuf>,
    /// Extra variables for the child.
    pub env: HashMap<String, String>,
    /// Return the output instead of `NonZeroExit`.
    pub allow_non_zero_exit: bool,
    /// Combined ceiling for both streams.
    pub max_output_bytes: usize,
}

impl Default for ExecOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            cwd: None,
            env: HashMap::new(),
            allow_non_zero_exit: false,
            max_output_bytes: DEFAULT_MAX_OUTPUT_BYTES,
        }
    }
}

/// The seam between the session and the operating system.
pub trait ProcessRunner: Send + Sync {
    /// Runs `program` with `args` passed verbatim, never through a shell.
    fn execute(
        &self,
        program: &Path,
        args: &[String],
        options: &ExecOptions,
    ) -> Result<CommandOutput, ExecutionError>;
}

/// Runs commands as real child processes.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl ProcessRunner for SystemRunner {
    fn execute(
        &self,
        program: &Path,
        args: &[String],
        options: &ExecOptions,
    ) -> Result<CommandOutput, ExecutionError> {
        execute_and_capture(program, args, options)
    }
}

/// Renders a command line for logs and errors, shell-quoted, with secrets masked.
pub fn render_command(program: &Path, args: &[String]) -> String {
    let mut parts = Vec::with_capacity(args.len() + 1);
    parts.push(program.to_string_lossy().into_owned());
    let mut mask_next = false;
    for arg in args {
        if mask_next {
            parts.push("****".to_string());
            mask_next = false;
            continue;
        }
        mask_next = SECRET_FLAGS.contains(&arg.as_str());
        parts.push(arg.clone());
    }
    shlex::try_join(parts.iter().map(String::as_str)).unwrap_or_else(|_| parts.join(" "))
}

/// Executes a command, capturing both streams, and blocks until it finishes,
/// times out, or overflows the output ceiling. On timeout or overflow the child is killed.
pub fn execute_and_capture(
    program: &Path,
    args: &[String],
    options: &ExecOptions,
) -> Result<CommandOutput, ExecutionError> {
    let rendered = render_command(program, args);
    log::debug!("Executing: {}", rendered);

    let mut command = StdCommand::new(program);
    command
        .args(args)
        .envs(&options.env)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    if let Some(cwd) = &options.cwd {
        command.current_dir(dunce::simplified(cwd));
    }

    let mut child = command.spawn().map_err(|e| ExecutionError::Spawn {
        command: rendered.clone(),
        source: e,
    })?;

    let overflow = Arc::new(AtomicBool::new(false));
    let stdout_reader = child
        .stdout
        .take()
        .map(|s| spawn_reader(s, options.max_output_bytes, overflow.clone()));
    let stderr_reader = child
        .stderr
        .take()
        .map(|s| spawn_reader(s, options.max_output_bytes, overflow.clone()));

    let deadline = Instant::now() + options.timeout;

    // Non-blocking wait loop so the deadline and the output ceiling can be enforced.
    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) => {
                let timed_out = Instant::now() >= deadline;
                let overflowed = overflow.load(Ordering::SeqCst);
                if timed_out || overflowed {
                    log::debug!(
                        "Killing child process (PID: {}): {}",
                        child.id(),
                        if timed_out { "timeout" } else { "output ceiling" }
                    );
                    if let Err(e) = child.kill() {
                        log::warn!("Failed to kill child process {}: {}", child.id(), e);
                    }
                    child.wait().ok();
                    let grace = Instant::now() + READER_GRACE;
                    let (stdout, _) = collect(stdout_reader.as_ref(), grace);
                    let (stderr, _) = collect(stderr_reader.as_ref(), grace);
                    return Err(if timed_out {
                        ExecutionError::TimedOut {
                            command: rendered,
                            timeout_ms: options.timeout.as_millis(),
                            stdout,
                            stderr,
                        }
                    } else {
                        ExecutionError::OutputTooLarge {
                            command: rendered,
                            limit: options.max_output_bytes,
                            stdout,
                            stderr,
                        }
                    });
                }
                thread::sleep(POLL_INTERVAL);
            }
            Err(e) => {
                child.kill().ok();
                child.wait().ok();
                return Err(ExecutionError::Wait {
                    command: rendered,
                    source: e,
                });
            }
        }
    };

    // A background grandchild can keep a pipe open after the child exits.
    let grace = Instant::now() + READER_GRACE;
    let (stdout, stdout_closed) = collect(stdout_reader.as_ref(), grace);
    let (stderr, stderr_closed) = collect(stderr_reader.as_ref(), grace);
    if !(stdout_closed && stderr_closed) {
        log::warn!(
            "Output of '{}' was still open {} ms after the process exited; keeping what was captured.",
            rendered,
            READER_GRACE.as_millis()
        );
    }

    if overflow.load(Ordering::SeqCst) {
        return Err(ExecutionError::OutputTooLarge {
            command: rendered,
            limit: options.max_output_bytes,
            stdout,
            stderr,
        });
    }

    log::debug!("Command finished with status {}", status);
    log::trace!("stdout:\n{}", stdout);
    log::trace!("stderr:\n{}", stderr);

    if !status.success() && !options.allow_non_zero_exit {
        return Err(ExecutionError::NonZeroExit {
            command: rendered,
            exit_code: status.code(),
            stdout,
            stderr,
        });
    }

    Ok(CommandOutput {
        stdout,
        stderr,
        exit_code: status.code().unwrap_or(-1),
    })
}

/// One captured stream: bytes land in `buffer` as they are read, `closed` fires at EOF.
struct StreamReader {
    buffer: Arc<Mutex<Vec<u8>>>,
    closed: Receiver<()>,
}

/// Drains a pipe on its own thread. Bytes past `limit` are discarded and flag the overflow.
fn spawn_reader<R: Read + Send + 'static>(
    mut reader: R,
    limit: usize,
    overflow: Arc<AtomicBool>,
) -> StreamReader {
    let buffer = Arc::new(Mutex::new(Vec::new()));
    let (tx, rx) = mpsc::channel();
    let sink = buffer.clone();
    thread::spawn(move || {
        let mut chunk = [0u8; 8192];
        loop {
            match reader.read(&mut chunk) {
                Ok(0) => break,
                Ok(n) => {
                    let mut captured = sink.lock().unwrap_or_else(PoisonError::into_inner);
                    let room = limit.saturating_sub(captured.len());
                    if n > room {
                        captured.extend_from_slice(&chunk[..room]);
                        overflow.store(true, Ordering::SeqCst);
                    } else {
                        captured.extend_from_slice(&chunk[..n]);
                    }
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(_) => break,
            }
        }
        // The receiver may have given up already.
        tx.send(()).ok();
    });
    StreamReader {
        buffer,
        closed: rx,
    }
}

/// Waits until `until` for the stream to close, then returns what was captured and
/// whether the stream actually reached EOF.
fn collect(reader: Option<&StreamReader>, until: Instant) -> (String, bool) {
    let Some(reader) = reader else {
        return (String::new(), true);
    };
    let wait = until.saturating_duration_since(Instant::now());
    let closed = !matches!(
        reader.closed.recv_timeout(wait),
        Err(RecvTimeoutError::Timeout)
    );
    let bytes = reader
        .buffer
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .clone();
    (String::from_utf8_lossy(&bytes).into_owned(), closed)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn sh(script: &str) -> Vec<String> {
        vec!["-c".to_string(), script.to_string()]
    }

    #[test]
    fn test_captures_both_streams() {
        let output = execute_and_capture(
            Path::new("sh"),
            &sh("echo out; echo err 1>&2"),
            &ExecOptions::default(),
        )
        .unwrap();

        assert_eq!(output.stdout, "out\n");
        assert_eq!(output.stderr, "err\n");
        assert_eq!(output.exit_code, 0);
    }

    #[test]
    fn test_non_zero_exit_is_an_error_with_streams() {
        let err = execute_and_capture(
            Path::new("sh"),
            &sh("echo partial; echo broken 1>&2; exit 3"),
            &ExecOptions::default(),
        )
        .unwrap_err();

        assert!(matches!(err, ExecutionError::NonZeroExit { .. }));
        assert_eq!(err.exit_code(), Some(3));
        assert_eq!(err.stdout(), "partial\n");
        assert_eq!(err.stderr(), "broken\n");
    }

    #[test]
    fn test_non_zero_exit_allowed() {
        let options = ExecOptions {
            allow_non_zero_exit: true,
            ..Default::default()
        };
        let output = execute_and_capture(Path::new("sh"), &sh("exit 7"), &options).unwrap();
        assert_eq!(output.exit_code, 7);
    }

    #[test]
    fn test_timeout_kills_the_child() {
        let options = ExecOptions {
            timeout: Duration::from_millis(200),
            ..Default::default()
        };
        let started = Instant::now();
        let err = execute_and_capture(Path::new("sh"), &sh("exec sleep 10"), &options).unwrap_err();

        assert!(matches!(err, ExecutionError::TimedOut { .. }));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_background_child_holding_the_pipe_keeps_captured_output() {
        let started = Instant::now();
        let output = execute_and_capture(
            Path::new("sh"),
            &sh("echo partial; echo warn 1>&2; sleep 5 & exit 0"),
            &ExecOptions::default(),
        )
        .unwrap();

        assert_eq!(output.stdout.trim(), "partial");
        assert_eq!(output.stderr.trim(), "warn");
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[test]
    fn test_missing_binary_is_a_spawn_error() {
        let err = execute_and_capture(
            Path::new("/definitely/not/a/real/binary"),
            &[],
            &ExecOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ExecutionError::Spawn { .. }));
        assert_eq!(err.exit_code(), None);
    }

    #[test]
    fn test_env_overrides_and_cwd() {
        let dir = tempfile::tempdir().unwrap();
        let mut env = HashMap::new();
        env.insert("MOVEFORK_TEST_VALUE".to_string(), "forty-two".to_string());
        let options = ExecOptions {
            env,
            cwd: Some(dir.path().to_path_buf()),
            ..Default::default()
        };

        let output =
            execute_and_capture(Path::new("sh"), &sh("echo $MOVEFORK_TEST_VALUE; pwd"), &options)
                .unwrap();

        let mut lines = output.stdout.lines();
        assert_eq!(lines.next(), Some("forty-two"));
        let reported = PathBuf::from(lines.next().unwrap());
        assert_eq!(
            reported.canonicalize().unwrap(),
            dir.path().canonicalize().unwrap()
        );
    }

    #[test]
    fn test_output_ceiling() {
        let options = ExecOptions {
            max_output_bytes: 64,
            ..Default::default()
        };
        let err = execute_and_capture(
            Path::new("sh"),
            &sh("i=0; while [ $i -lt 200 ]; do echo 0123456789; i=$((i+1)); done"),
            &options,
        )
        .unwrap_err();

        assert!(matches!(err, ExecutionError::OutputTooLarge { limit: 64, .. }));
        assert!(err.stdout().len() <= 64);
    }

    #[test]
    fn test_render_command_masks_secrets() {
        let args: Vec<String> = ["move", "run", "--private-key", "0xdeadbeef", "--args", "u64:1"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let rendered = render_command(Path::new("aptos"), &args);

        assert!(!rendered.contains("deadbeef"));
        assert!(rendered.contains("--private-key '****'") || rendered.contains("--private-key ****"));
        assert!(rendered.ends_with("u64:1"));
    }
}
