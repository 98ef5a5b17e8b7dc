//! # VM Status Decoder
//!
//! Normalizes the failure descriptions the toolchain prints into a single `VmFailure`.
//! The formats differ by invocation mode (local session vs. remote REST style), so
//! decoding walks an ordered table of patterns, richest first, and stops at the first match.
//! Input that matches nothing is kept verbatim as the status.

use crate::models::{AbortCategory, VmFailure};
use lazy_static::lazy_static;
use regex::{Captures, Regex};

/// One entry of the decoding table.
struct StatusPattern {
    name: &'static str,
    regex: Regex,
    extract: fn(&Captures<'_>) -> VmFailure,
}

lazy_static! {
    static ref PATTERNS: Vec<StatusPattern> = vec![
        // status ABORTED with code 65542 [and message ...] in 0x1::coin
        StatusPattern {
            name: "session-abort",
            regex: literal_regex(r"(?s)status ABORTED with code (\d+)(?: and message (.+?))? in (\S+)\s*$"),
            extract: extract_session_abort,
        },
        // status ABORTED of type Execution with sub status 65542
        StatusPattern {
            name: "session-sub-status",
            regex: literal_regex(r"status (ABORTED) of type (\w+) with sub status (\d+)"),
            extract: extract_sub_status,
        },
        // status OUT_OF_GAS of type Execution [with message ...]
        StatusPattern {
            name: "session-typed",
            regex: literal_regex(r"(?s)status (\w+) of type (\w+)(?: with message (.+?))?\s*$"),
            extract: extract_typed,
        },
        // Move abort in 0x1::coin: EINSUFFICIENT_BALANCE(0x10006): description
        StatusPattern {
            name: "remote-abort",
            regex: literal_regex(r"(?s)Move abort in (\S+?): (.+?)\s*$"),
            extract: extract_remote_abort,
        },
        // Transaction failed to execute: detail
        StatusPattern {
            name: "generic-failed",
            regex: literal_regex(r"(?is)\bfailed\b[^:]*:\s*(.+?)\s*$"),
            extract: extract_generic_failed,
        },
    ];

    static ref ABORT_DETAIL_RE: Regex =
        literal_regex(r"(?s)^(\w+)\((0x[0-9a-fA-F]+|\d+)\)(?::\s*(.+))?$");
    static ref ABORT_TOKEN_RE: Regex = literal_regex(r"(?s)^(\w+)(?::\s*(.+))?$");
}

/// Compiles one of the fixed patterns above. They are literals, so failure is a bug.
#[allow(clippy::unwrap_used)]
fn literal_regex(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap()
}

// --- PUBLIC API ---

/// Decodes a VM status string. Never fails: unknown formats come back as `{status: input}`.
pub fn decode_vm_status(status: &str) -> VmFailure {
    for pattern in PATTERNS.iter() {
        if let Some(caps) = pattern.regex.captures(status) {
            log::trace!("VM status matched pattern '{}'", pattern.name);
            return (pattern.extract)(&caps);
        }
    }
    VmFailure::from_status(status)
}

/// Splits a canonically encoded abort code into its category and reason.
///
/// Accepts decimal or `0x`-prefixed hex. Returns `None` when the code does not parse
/// or its category byte is not one of the known classes.
pub fn decode_abort_code(code: &str) -> Option<(AbortCategory, u64)> {
    let value = parse_code(code)?;
    let category = AbortCategory::from_code(value)?;
    Some((category, value & 0xFFFF))
}

fn parse_code(code: &str) -> Option<u64> {
    let code = code.trim();
    match code.strip_prefix("0x").or_else(|| code.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16).ok(),
        None => code.parse().ok(),
    }
}

// --- EXTRACTORS ---

fn text(caps: &Captures<'_>, index: usize) -> Option<String> {
    caps.get(index)
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
}

fn with_abort_code(mut failure: VmFailure, code: String) -> VmFailure {
    if let Some((category, reason)) = decode_abort_code(&code) {
        failure.category = Some(category);
        failure.reason = Some(reason);
    }
    failure.abort_code = Some(code);
    failure
}

fn extract_session_abort(caps: &Captures<'_>) -> VmFailure {
    let failure = VmFailure {
        status: "ABORTED".to_string(),
        message: text(caps, 2),
        location: text(caps, 3),
        ..Default::default()
    };
    with_abort_code(failure, caps[1].to_string())
}

fn extract_sub_status(caps: &Captures<'_>) -> VmFailure {
    let failure = VmFailure {
        status: caps[1].to_string(),
        error_type: text(caps, 2),
        ..Default::default()
    };
    with_abort_code(failure, caps[3].to_string())
}

fn extract_typed(caps: &Captures<'_>) -> VmFailure {
    VmFailure {
        status: caps[1].to_string(),
        error_type: text(caps, 2),
        message: text(caps, 3),
        ..Default::default()
    }
}

fn extract_remote_abort(caps: &Captures<'_>) -> VmFailure {
    let mut failure = VmFailure {
        status: "Move abort".to_string(),
        location: text(caps, 1),
        ..Default::default()
    };
    let detail = caps[2].trim();

    // ENAME(0x10006)[: description]
    if let Some(d) = ABORT_DETAIL_RE.captures(detail) {
        failure.abort_name = text(&d, 1);
        failure.message = text(&d, 3);
        return with_abort_code(failure, d[2].to_string());
    }

    // 0x10006 | 65542 | ENAME, optionally followed by ": description"
    if let Some(d) = ABORT_TOKEN_RE.captures(detail) {
        let token = d[1].to_string();
        failure.message = text(&d, 2);
        if parse_code(&token).is_none() {
            failure.abort_name = Some(token.clone());
        }
        return with_abort_code(failure, token);
    }

    failure.message = Some(detail.to_string());
    failure
}

fn extract_generic_failed(caps: &Captures<'_>) -> VmFailure {
    VmFailure {
        status: "FAILED".to_string(),
        message: text(caps, 1),
        ..Default::default()
    }
}
