// src/models.rs

use crate::constants::{DEFAULT_BINARY_NAME, DEFAULT_MAX_OUTPUT_BYTES, DEFAULT_TIMEOUT_MS};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

// --- NETWORK SELECTION ---

/// The networks a session can fork from. `Mainnet` is the primary network.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    /// The production network.
    #[default]
    Mainnet,
    /// The public test network.
    Testnet,
    /// The developer network, reset periodically.
    Devnet,
}

impl Network {
    /// The lowercase name the toolchain expects.
    pub fn as_str(&self) -> &'static str {
        match self {
            Network::Mainnet => "mainnet",
            Network::Testnet => "testnet",
            Network::Devnet => "devnet",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Network {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mainnet" => Ok(Network::Mainnet),
            "testnet" => Ok(Network::Testnet),
            "devnet" => Ok(Network::Devnet),
            other => Err(format!(
                "Unknown network '{}'. Expected one of: mainnet, testnet, devnet.",
                other
            )),
        }
    }
}

// --- SESSION CONFIGURATION ---

/// Everything a session needs before it forks. Immutable once the session exists.
/// Deserializable from `movefork.toml`; every field is optional there.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    /// Network to fork.
    pub network: Network,
    /// A bare name is resolved through `PATH`.
    pub binary_path: PathBuf,
    /// Per-command timeout.
    pub timeout_ms: u64,
    /// Generated under the temp dir when absent.
    pub session_path: Option<PathBuf>,
    /// Leave the session directory on disk after `destroy`.
    pub keep_session: bool,
    /// Suppress the per-command `info!` lines.
    pub quiet: bool,
    /// Passed to the fork command to lift rate limits.
    pub api_key: Option<String>,
    /// Environment overrides for every command, on top of the inherited environment.
    pub env: HashMap<String, String>,
    /// A command printing more than this is killed.
    pub max_output_bytes: usize,
    /// Report unparseable publish output as unsuccessful instead of trusting the exit code.
    pub strict_publish_output: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            network: Network::default(),
            binary_path: PathBuf::from(DEFAULT_BINARY_NAME),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            session_path: None,
            keep_session: false,
            quiet: false,
            api_key: None,
            env: HashMap::new(),
            max_output_bytes: DEFAULT_MAX_OUTPUT_BYTES,
            strict_publish_output: false,
        }
    }
}

impl SessionConfig {
    /// The per-command timeout as a `Duration`.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Sets `network`.
    pub fn with_network(mut self, network: Network) -> Self {
        self.network = network;
        self
    }

    /// Sets `binary_path`.
    pub fn with_binary_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.binary_path = path.into();
        self
    }

    /// Sets `timeout_ms`.
    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Forks into `path` instead of a generated directory.
    pub fn with_session_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.session_path = Some(path.into());
        self
    }

    /// Sets `keep_session`.
    pub fn with_keep_session(mut self, keep: bool) -> Self {
        self.keep_session = keep;
        self
    }

    /// Sets `quiet`.
    pub fn with_quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    /// Sets `api_key`.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Adds one environment override.
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Sets `strict_publish_output`.
    pub fn with_strict_publish_output(mut self, strict: bool) -> Self {
        self.strict_publish_output = strict;
        self
    }
}

// --- OPERATION OPTIONS ---
// What callers hand to the session. Every field maps to one CLI flag.

/// Switches for `move compile`.
#[derive(Debug, Clone, Default)]
pub struct CompileOptions {
    /// Directory holding `Move.toml`.
    pub package_dir: PathBuf,
    /// Named address assignments, serialized as `name=addr,...`.
    pub named_addresses: BTreeMap<String, String>,
    /// Build output location. Defaults to `<package_dir>/build`.
    pub output_dir: Option<PathBuf>,
    /// Use git dependencies already on disk.
    pub skip_fetch_latest_git_deps: bool,
    /// Use the package's dev addresses and dependencies.
    pub dev: bool,
}

/// How much of the build output is uploaded alongside the bytecode.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum IncludedArtifacts {
    /// Bytecode only.
    None,
    /// Bytecode plus a trimmed package metadata.
    Sparse,
    /// Everything, including sources.
    All,
}

impl IncludedArtifacts {
    /// The lowercase name the toolchain expects.
    pub fn as_str(&self) -> &'static str {
        match self {
            IncludedArtifacts::None => "none",
            IncludedArtifacts::Sparse => "sparse",
            IncludedArtifacts::All => "all",
        }
    }
}

/// Publishing rebuilds the package, so the build switches of `CompileOptions` apply here too.
#[derive(Debug, Clone, Default)]
pub struct PublishOptions {
    /// Directory holding `Move.toml`.
    pub package_dir: PathBuf,
    /// Address of the signing account.
    pub sender: String,
    /// Hex private key of `sender`. Masked in every rendered command line.
    pub private_key: String,
    /// Named address assignments, serialized as `name=addr,...`.
    pub named_addresses: BTreeMap<String, String>,
    /// Left to the toolchain default when `None`.
    pub included_artifacts: Option<IncludedArtifacts>,
    /// Publish even if the package exceeds the size limit.
    pub override_size_check: bool,
    /// Build output location. Defaults to `<package_dir>/build`.
    pub output_dir: Option<PathBuf>,
    /// Use git dependencies already on disk.
    pub skip_fetch_latest_git_deps: bool,
    /// Use the package's dev addresses and dependencies.
    pub dev: bool,
}

impl PublishOptions {
    /// The compile step that `compile_and_publish` runs before publishing.
    pub fn compile_options(&self) -> CompileOptions {
        CompileOptions {
            package_dir: self.package_dir.clone(),
            named_addresses: self.named_addresses.clone(),
            output_dir: self.output_dir.clone(),
            skip_fetch_latest_git_deps: self.skip_fetch_latest_git_deps,
            dev: self.dev,
        }
    }
}

/// An entry function call.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Fully qualified entry function, e.g. `0x1::coin::transfer`.
    pub function_id: String,
    /// Address of the signing account.
    pub sender: String,
    /// Hex private key of `sender`. Masked in every rendered command line.
    pub private_key: String,
    /// Type arguments, e.g. `0x1::aptos_coin::AptosCoin`.
    pub type_args: Vec<String>,
    /// Pre-encoded `type:value` arguments (see `core::move_args`).
    pub args: Vec<String>,
    /// Gas ceiling. Left to the toolchain when `None`.
    pub max_gas: Option<u64>,
}

/// A script is either Move source to compile on the fly or an already compiled blob.
#[derive(Debug, Clone)]
pub enum ScriptSource {
    /// A `.move` script file.
    Source(PathBuf),
    /// A compiled `.mv` script.
    Compiled(PathBuf),
}

/// A script transaction.
#[derive(Debug, Clone)]
pub struct ScriptOptions {
    /// What to run.
    pub script: ScriptSource,
    /// Address of the signing account.
    pub sender: String,
    /// Hex private key of `sender`. Masked in every rendered command line.
    pub private_key: String,
    /// Type arguments, e.g. `0x1::aptos_coin::AptosCoin`.
    pub type_args: Vec<String>,
    /// Pre-encoded `type:value` arguments.
    pub args: Vec<String>,
    /// Gas ceiling. Left to the toolchain when `None`.
    pub max_gas: Option<u64>,
}

/// A read-only view function call.
#[derive(Debug, Clone, Default)]
pub struct ViewOptions {
    /// Fully qualified function, `<address>::<module>::<function>`.
    pub function_id: String,
    /// Type arguments, e.g. `0x1::aptos_coin::AptosCoin`.
    pub type_args: Vec<String>,
    /// Pre-encoded `type:value` arguments.
    pub args: Vec<String>,
}

/// A faucet transfer inside the fork.
#[derive(Debug, Clone, Default)]
pub struct FundOptions {
    /// Target account address.
    pub account: String,
    /// Amount in octas.
    pub amount: u64,
}

/// A single resource lookup.
#[derive(Debug, Clone, Default)]
pub struct ViewResourceOptions {
    /// Target account address.
    pub account: String,
    /// Fully qualified struct tag, e.g. `0x1::account::Account`.
    pub resource: String,
}

// --- INTERPRETED RESULTS ---

/// A successful compilation.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct CompileResult {
    /// Fully qualified ids of the compiled modules.
    pub module_ids: Vec<String>,
    /// Tracked until the session is destroyed.
    pub build_dir: PathBuf,
    /// Stdout exactly as printed.
    pub raw: String,
}

/// Outcome of a state-changing operation (publish, run, run-script).
/// `success` is the transaction's verdict, independent of the process exit code.
#[derive(Serialize, Debug, Clone, Default, PartialEq)]
pub struct TransactionResult {
    /// The verdict reported by the toolchain.
    pub success: bool,
    /// Hash of the submitted transaction.
    pub transaction_hash: Option<String>,
    /// Accepts both numbers and numeric strings from the output.
    pub gas_used: Option<u64>,
    /// The status line as printed, e.g. `Executed successfully`.
    pub vm_status: Option<String>,
    /// Decoded from `vm_status` when the transaction failed.
    pub vm_failure: Option<VmFailure>,
    /// Emitted events, empty when the output had none.
    pub events: Vec<Value>,
    /// Write set changes, empty when the output had none.
    pub changes: Vec<Value>,
    /// Stdout exactly as printed.
    pub raw: String,
    /// Stderr exactly as printed.
    pub raw_stderr: String,
}

/// The payload of a read operation.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ViewResult {
    /// The `Result` payload, unwrapped.
    pub value: Value,
    /// Stdout exactly as printed.
    pub raw: String,
}

impl ViewResult {
    /// The payload as a list, which is how view functions return their values.
    pub fn values(&self) -> &[Value] {
        self.value.as_array().map(Vec::as_slice).unwrap_or_default()
    }
}

/// Outcome of a funding call.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct FundResult {
    /// The verdict reported by the toolchain.
    pub success: bool,
    /// Stdout exactly as printed.
    pub raw: String,
}

// --- VM FAILURE DETAIL ---

/// Canonical error categories encoded in the high bits of an abort code.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AbortCategory {
    /// `0x1`
    InvalidArgument,
    /// `0x2`
    OutOfRange,
    /// `0x3`
    InvalidState,
    /// `0x4`
    Unauthenticated,
    /// `0x5`
    PermissionDenied,
    /// `0x6`
    NotFound,
    /// `0x7`
    Aborted,
    /// `0x8`
    AlreadyExists,
    /// `0x9`
    ResourceExhausted,
    /// `0xA`
    Cancelled,
    /// `0xB`
    Internal,
    /// `0xC`
    NotImplemented,
    /// `0xD`
    Unavailable,
}

impl AbortCategory {
    /// Maps the category byte (`code >> 16`) to its class. Unknown bytes yield `None`.
    pub fn from_byte(byte: u64) -> Option<Self> {
        use AbortCategory::*;
        Some(match byte {
            0x1 => InvalidArgument,
            0x2 => OutOfRange,
            0x3 => InvalidState,
            0x4 => Unauthenticated,
            0x5 => PermissionDenied,
            0x6 => NotFound,
            0x7 => Aborted,
            0x8 => AlreadyExists,
            0x9 => ResourceExhausted,
            0xA => Cancelled,
            0xB => Internal,
            0xC => NotImplemented,
            0xD => Unavailable,
            _ => return None,
        })
    }

    /// The category of a full abort code, read from its category byte.
    pub fn from_code(code: u64) -> Option<Self> {
        Self::from_byte(code >> 16)
    }

    /// The lowercase name the toolchain expects.
    pub fn as_str(&self) -> &'static str {
        use AbortCategory::*;
        match self {
            InvalidArgument => "INVALID_ARGUMENT",
            OutOfRange => "OUT_OF_RANGE",
            InvalidState => "INVALID_STATE",
            Unauthenticated => "UNAUTHENTICATED",
            PermissionDenied => "PERMISSION_DENIED",
            NotFound => "NOT_FOUND",
            Aborted => "ABORTED",
            AlreadyExists => "ALREADY_EXISTS",
            ResourceExhausted => "RESOURCE_EXHAUSTED",
            Cancelled => "CANCELLED",
            Internal => "INTERNAL",
            NotImplemented => "NOT_IMPLEMENTED",
            Unavailable => "UNAVAILABLE",
        }
    }
}

impl fmt::Display for AbortCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decoded description of why a transaction did not succeed.
/// Absent fields mean the upstream format did not carry them.
#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct VmFailure {
    /// The raw status when nothing more specific matched.
    pub status: String,
    /// The abort code exactly as the tool printed it.
    pub abort_code: Option<String>,
    /// Symbolic abort constant, e.g. `EINSUFFICIENT_BALANCE`.
    pub abort_name: Option<String>,
    /// From the category byte of the abort code.
    pub category: Option<AbortCategory>,
    /// The low 16 bits of the abort code.
    pub reason: Option<u64>,
    /// Module where the abort happened.
    pub location: Option<String>,
    /// The status name for non-abort failures, e.g. `OUT_OF_GAS`.
    pub error_type: Option<String>,
    /// Human-readable description, when present.
    pub message: Option<String>,
}

impl VmFailure {
    /// A failure that only carries its status text.
    pub fn from_status(status: impl Into<String>) -> Self {
        Self {
            status: status.into(),
            ..Default::default()
        }
    }
}

// --- ACCOUNTS ---

/// An ephemeral identity. Owned by the caller; sessions never keep a copy.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Account {
    /// `0x`-prefixed, 64 hex digits.
    pub address: String,
    /// `0x`-prefixed Ed25519 secret key.
    pub private_key_hex: String,
    /// `0x`-prefixed Ed25519 public key.
    pub public_key_hex: String,
}
