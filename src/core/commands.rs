// src/core/commands.rs

// Argument vectors for every toolchain invocation a session makes.
// Pure functions: nothing here runs a process.

use crate::{
    core::move_args::serialize_named_addresses,
    models::{
        CompileOptions, FundOptions, Network, PublishOptions, RunOptions, ScriptOptions,
        ScriptSource, ViewOptions, ViewResourceOptions,
    },
};
use std::collections::BTreeMap;
use std::path::Path;

/// Small accumulator so optional flags read as one line each.
#[derive(Debug, Default)]
struct ArgList(Vec<String>);

impl ArgList {
    fn new(base: &[&str]) -> Self {
        Self(base.iter().map(|s| s.to_string()).collect())
    }

    fn opt(mut self, flag: &str, value: impl AsRef<str>) -> Self {
        self.0.push(flag.to_string());
        self.0.push(value.as_ref().to_string());
        self
    }

    fn path(self, flag: &str, value: &Path) -> Self {
        self.opt(flag, value.to_string_lossy())
    }

    fn opt_if(self, flag: &str, value: Option<impl AsRef<str>>) -> Self {
        match value {
            Some(v) => self.opt(flag, v),
            None => self,
        }
    }

    fn flag_if(mut self, flag: &str, enabled: bool) -> Self {
        if enabled {
            self.0.push(flag.to_string());
        }
        self
    }

    fn named_addresses(self, named: &BTreeMap<String, String>) -> Self {
        if named.is_empty() {
            self
        } else {
            self.opt("--named-addresses", serialize_named_addresses(named))
        }
    }

    /// Variadic flags: `--flag v1 v2 ...`, omitted entirely when there are no values.
    fn rest(mut self, flag: &str, values: &[String]) -> Self {
        if !values.is_empty() {
            self.0.push(flag.to_string());
            self.0.extend(values.iter().cloned());
        }
        self
    }

    fn finish(self) -> Vec<String> {
        self.0
    }
}

/// `move sim init`: forks `network` into `session`.
pub fn init_args(session: &Path, network: Network, api_key: Option<&str>) -> Vec<String> {
    ArgList::new(&["move", "sim", "init"])
        .path("--path", session)
        .opt("--network", network.as_str())
        .opt_if("--api-key", api_key)
        .finish()
}

/// `move compile`. Compilation does not touch the session.
pub fn compile_args(options: &CompileOptions) -> Vec<String> {
    ArgList::new(&["move", "compile", "--save-metadata"])
        .path("--package-dir", &options.package_dir)
        .named_addresses(&options.named_addresses)
        .opt_if(
            "--output-dir",
            options.output_dir.as_deref().map(|p| p.to_string_lossy()),
        )
        .flag_if("--skip-fetch-latest-git-deps", options.skip_fetch_latest_git_deps)
        .flag_if("--dev", options.dev)
        .finish()
}

/// `move publish` against the session.
pub fn publish_args(session: &Path, options: &PublishOptions) -> Vec<String> {
    ArgList::new(&["move", "publish"])
        .path("--session", session)
        .path("--package-dir", &options.package_dir)
        .opt("--sender-account", &options.sender)
        .opt("--private-key", &options.private_key)
        .flag_if("--assume-yes", true)
        .named_addresses(&options.named_addresses)
        .opt_if(
            "--included-artifacts",
            options.included_artifacts.map(|a| a.as_str()),
        )
        .flag_if("--override-size-check", options.override_size_check)
        .opt_if(
            "--output-dir",
            options.output_dir.as_deref().map(|p| p.to_string_lossy()),
        )
        .flag_if("--skip-fetch-latest-git-deps", options.skip_fetch_latest_git_deps)
        .flag_if("--dev", options.dev)
        .finish()
}

/// `move run` against the session.
pub fn run_args(session: &Path, options: &RunOptions) -> Vec<String> {
    ArgList::new(&["move", "run"])
        .path("--session", session)
        .opt("--function-id", &options.function_id)
        .opt("--sender-account", &options.sender)
        .opt("--private-key", &options.private_key)
        .flag_if("--assume-yes", true)
        .opt_if("--max-gas", options.max_gas.map(|g| g.to_string()))
        .rest("--type-args", &options.type_args)
        .rest("--args", &options.args)
        .finish()
}

/// `move run-script`, from source or from a compiled blob.
pub fn run_script_args(session: &Path, options: &ScriptOptions) -> Vec<String> {
    let list = ArgList::new(&["move", "run-script"]).path("--session", session);
    let list = match &options.script {
        ScriptSource::Source(path) => list.path("--script-path", path),
        ScriptSource::Compiled(path) => list.path("--compiled-script-path", path),
    };
    list.opt("--sender-account", &options.sender)
        .opt("--private-key", &options.private_key)
        .flag_if("--assume-yes", true)
        .opt_if("--max-gas", options.max_gas.map(|g| g.to_string()))
        .rest("--type-args", &options.type_args)
        .rest("--args", &options.args)
        .finish()
}

/// `move view` against the session.
pub fn view_args(session: &Path, options: &ViewOptions) -> Vec<String> {
    ArgList::new(&["move", "view"])
        .path("--session", session)
        .opt("--function-id", &options.function_id)
        .rest("--type-args", &options.type_args)
        .rest("--args", &options.args)
        .finish()
}

/// `move sim fund`.
pub fn fund_args(session: &Path, options: &FundOptions) -> Vec<String> {
    ArgList::new(&["move", "sim", "fund"])
        .path("--session", session)
        .opt("--account", &options.account)
        .opt("--amount", options.amount.to_string())
        .finish()
}

/// `move sim view-resource`.
pub fn view_resource_args(session: &Path, options: &ViewResourceOptions) -> Vec<String> {
    ArgList::new(&["move", "sim", "view-resource"])
        .path("--session", session)
        .opt("--account", &options.account)
        .opt("--resource", &options.resource)
        .finish()
}
