//! # Output Interpreter
//!
//! Turns the raw stdout of a finished command into typed results. The process exit code
//! and the transaction verdict are separate facts: a zero exit can still carry a failed
//! transaction, which is reported as `success: false` with a decoded `VmFailure`.

use crate::{
    core::{
        envelope::{self, Envelope},
        vm_status,
    },
    models::TransactionResult,
    system::executor::CommandOutput,
};
use serde_json::Value;

/// What a write operation reports when stdout holds no recoverable JSON, or JSON
/// without a boolean `success` flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MalformedOutput {
    /// Trust the zero exit code.
    Optimistic,
    /// Report the transaction as unsuccessful with every field absent.
    Unsuccessful,
}

/// Interprets the output of publish, run and run-script.
pub fn interpret_transaction(output: CommandOutput, on_malformed: MalformedOutput) -> TransactionResult {
    let mut result = match envelope::classify(&output.stdout) {
        Envelope::Success(payload) => transaction_from_payload(&payload, on_malformed),
        Envelope::Failure(reason) => TransactionResult {
            success: false,
            vm_failure: Some(vm_status::decode_vm_status(&reason)),
            vm_status: Some(reason),
            ..Default::default()
        },
        Envelope::Malformed(_) => {
            let success = on_malformed == MalformedOutput::Optimistic;
            log::warn!(
                "Command exited successfully but printed no JSON; reporting success={}",
                success
            );
            TransactionResult {
                success,
                ..Default::default()
            }
        }
    };
    result.raw = output.stdout;
    result.raw_stderr = output.stderr;
    result
}

fn transaction_from_payload(payload: &Value, on_malformed: MalformedOutput) -> TransactionResult {
    let success = match payload.get("success").and_then(Value::as_bool) {
        Some(flag) => flag,
        None => {
            let assumed = on_malformed == MalformedOutput::Optimistic;
            log::warn!(
                "Command output has no success flag; reporting success={}",
                assumed
            );
            assumed
        }
    };
    let vm_status = payload
        .get("vm_status")
        .and_then(Value::as_str)
        .map(str::to_string);
    let vm_failure = if success {
        None
    } else {
        vm_status.as_deref().map(vm_status::decode_vm_status)
    };

    TransactionResult {
        success,
        transaction_hash: payload
            .get("transaction_hash")
            .and_then(Value::as_str)
            .map(str::to_string),
        gas_used: payload.get("gas_used").and_then(envelope::as_u64_lenient),
        vm_status,
        vm_failure,
        events: array_field(payload, "events"),
        changes: array_field(payload, "changes"),
        ..Default::default()
    }
}

fn array_field(payload: &Value, key: &str) -> Vec<Value> {
    payload
        .get(key)
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default()
}

/// Module identifiers from a compile payload. Absent or empty lists are valid.
pub fn module_ids(payload: &Value) -> Vec<String> {
    let list = match payload {
        Value::Array(items) => Some(items),
        other => other.get("module_ids").and_then(Value::as_array),
    };
    list.map(|items| {
        items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AbortCategory;
    use serde_json::json;

    fn output(stdout: &str) -> CommandOutput {
        CommandOutput {
            stdout: stdout.to_string(),
            stderr: "warning: something".to_string(),
            exit_code: 0,
        }
    }

    #[test]
    fn test_successful_transaction() {
        let stdout = json!({
            "Result": {
                "transaction_hash": "0xabc",
                "gas_used": "504",
                "success": true,
                "vm_status": "Executed successfully",
                "events": [{"type": "0x1::coin::Deposit"}],
                "changes": [{"address": "0x1"}, {"address": "0x2"}]
            }
        })
        .to_string();

        let result = interpret_transaction(output(&stdout), MalformedOutput::Unsuccessful);

        assert!(result.success);
        assert_eq!(result.transaction_hash.as_deref(), Some("0xabc"));
        assert_eq!(result.gas_used, Some(504));
        assert_eq!(result.vm_failure, None);
        assert_eq!(result.events.len(), 1);
        assert_eq!(result.changes.len(), 2);
        assert_eq!(result.raw, stdout);
        assert_eq!(result.raw_stderr, "warning: something");
    }

    #[test]
    fn test_failed_transaction_decodes_vm_status() {
        let stdout = json!({
            "Result": {
                "success": false,
                "gas_used": 12,
                "vm_status": "status ABORTED with code 65542 in 0x1::coin"
            }
        })
        .to_string();

        let result = interpret_transaction(output(&stdout), MalformedOutput::Optimistic);

        assert!(!result.success);
        assert_eq!(result.gas_used, Some(12));
        let failure = result.vm_failure.unwrap();
        assert_eq!(failure.status, "ABORTED");
        assert_eq!(failure.category, Some(AbortCategory::InvalidArgument));
        assert_eq!(failure.location.as_deref(), Some("0x1::coin"));
    }

    #[test]
    fn test_error_envelope_is_a_logical_failure() {
        let stdout = "{\"Error\":\"Move abort in 0x1::coin: EINSUFFICIENT_BALANCE(0x10006)\"}";
        let result = interpret_transaction(output(stdout), MalformedOutput::Optimistic);

        assert!(!result.success);
        assert_eq!(
            result.vm_failure.unwrap().abort_name.as_deref(),
            Some("EINSUFFICIENT_BALANCE")
        );
    }

    #[test]
    fn test_malformed_output_policies() {
        let optimistic = interpret_transaction(output("Done."), MalformedOutput::Optimistic);
        assert!(optimistic.success);
        assert_eq!(optimistic.raw, "Done.");

        let strict = interpret_transaction(output("Done."), MalformedOutput::Unsuccessful);
        assert!(!strict.success);
        assert_eq!(strict.gas_used, None);
        assert_eq!(strict.vm_status, None);
        assert_eq!(strict.vm_failure, None);
    }

    #[test]
    fn test_payload_without_success_flag_follows_policy() {
        let stdout = "{\"Result\":{\"transaction_hash\":\"0xabc\"}}";

        let optimistic = interpret_transaction(output(stdout), MalformedOutput::Optimistic);
        assert!(optimistic.success);
        assert_eq!(optimistic.transaction_hash.as_deref(), Some("0xabc"));
        assert_eq!(optimistic.vm_failure, None);

        let strict = interpret_transaction(output(stdout), MalformedOutput::Unsuccessful);
        assert!(!strict.success);
        assert_eq!(strict.transaction_hash.as_deref(), Some("0xabc"));

        let not_a_bool = "{\"Result\":{\"success\":\"yes\"}}";
        assert!(interpret_transaction(output(not_a_bool), MalformedOutput::Optimistic).success);
        assert!(!interpret_transaction(output(not_a_bool), MalformedOutput::Unsuccessful).success);
    }

    #[test]
    fn test_module_ids() {
        assert_eq!(
            module_ids(&json!({"module_ids": ["0x1::foo", "0x1::bar"]})),
            vec!["0x1::foo".to_string(), "0x1::bar".to_string()]
        );
        assert_eq!(module_ids(&json!(["0x1::foo"])), vec!["0x1::foo".to_string()]);
        assert!(module_ids(&json!({})).is_empty());
        assert!(module_ids(&json!({"module_ids": []})).is_empty());
    }
}
