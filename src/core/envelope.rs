//! # Envelope
//!
//! The toolchain wraps its structured output in a top-level JSON object holding either a
//! `Result` (success payload) or an `Error` (failure reason). Informational log lines may
//! precede the JSON, so extraction falls back to the first `{` or `[` in the text.

use serde_json::Value;
use thiserror::Error;

/// Stdout carried no JSON at all.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Could not find a JSON payload in the command output: {raw}")]
pub struct EnvelopeError {
    /// The full, untouched text that failed to parse.
    pub raw: String,
}

/// The classified form of one command's stdout.
#[derive(Debug, Clone, PartialEq)]
pub enum Envelope {
    /// A payload, already unwrapped from its `Result` key when present.
    Success(Value),
    /// The tool reported a logical error through the `Error` key.
    Failure(String),
    /// No JSON could be recovered from the text.
    Malformed(String),
}

/// Parses the JSON payload out of raw stdout.
pub fn extract_json(raw: &str) -> Result<Value, EnvelopeError> {
    let trimmed = raw.trim();
    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        return Ok(value);
    }

    // Leading log lines: retry from each object or array opener, earliest first.
    let parsed = trimmed
        .match_indices(['{', '['])
        .find_map(|(offset, _)| serde_json::from_str::<Value>(&trimmed[offset..]).ok());
    if let Some(value) = parsed {
        return Ok(value);
    }

    Err(EnvelopeError {
        raw: raw.to_string(),
    })
}

/// Returns the nested `Result` value when present, otherwise the value itself.
pub fn unwrap_result(value: Value) -> Value {
    match value {
        Value::Object(mut map) if map.contains_key("Result") => {
            map.remove("Result").unwrap_or(Value::Null)
        }
        other => other,
    }
}

/// `true` when the value is an object carrying an `Error` key.
pub fn is_error_envelope(value: &Value) -> bool {
    value.as_object().is_some_and(|map| map.contains_key("Error"))
}

/// Extracts and classifies stdout in one pass.
pub fn classify(raw: &str) -> Envelope {
    match extract_json(raw) {
        Ok(value) if is_error_envelope(&value) => {
            let reason = match &value["Error"] {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            Envelope::Failure(reason)
        }
        Ok(value) => Envelope::Success(unwrap_result(value)),
        Err(e) => Envelope::Malformed(e.raw),
    }
}

/// Reads a non-negative integer that the tool may print either as a number or a numeric string.
pub fn as_u64_lenient(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_plain_json() {
        let value = extract_json("  {\"Result\": 1}\n").unwrap();
        assert_eq!(value, json!({"Result": 1}));
    }

    #[test]
    fn test_extract_after_log_lines() {
        let raw = "Compiling...\n{\"Result\":{\"module_ids\":[\"0x1::foo\"]}}";
        let value = unwrap_result(extract_json(raw).unwrap());
        assert_eq!(value["module_ids"], json!(["0x1::foo"]));
    }

    #[test]
    fn test_extract_array_after_log_lines() {
        let raw = "INCLUDING DEPENDENCY MoveStdlib\n[\"0x1::a\", \"0x1::b\"]";
        assert_eq!(extract_json(raw).unwrap(), json!(["0x1::a", "0x1::b"]));
    }

    #[test]
    fn test_extract_skips_brackets_in_log_lines() {
        let raw = "[warn] fetching {latest} deps\n{\"Result\":true}";
        assert_eq!(extract_json(raw).unwrap(), json!({"Result": true}));
    }

    #[test]
    fn test_extract_failure_keeps_raw_text() {
        let raw = "Transaction submitted, no JSON here";
        let err = extract_json(raw).unwrap_err();
        assert_eq!(err.raw, raw);
    }

    #[test]
    fn test_error_envelope_is_not_unwrapped() {
        let value = extract_json("{\"Error\":\"boom\"}").unwrap();
        assert!(is_error_envelope(&value));
        assert_eq!(unwrap_result(value.clone()), value);
    }

    #[test]
    fn test_classify_variants() {
        assert_eq!(
            classify("{\"Result\":{\"success\":true}}"),
            Envelope::Success(json!({"success": true}))
        );
        assert_eq!(
            classify("noise\n{\"Error\":\"Unexpected error: boom\"}"),
            Envelope::Failure("Unexpected error: boom".to_string())
        );
        assert_eq!(
            classify("{\"Error\":{\"code\":1}}"),
            Envelope::Failure("{\"code\":1}".to_string())
        );
        assert_eq!(
            classify("Done."),
            Envelope::Malformed("Done.".to_string())
        );
    }

    #[test]
    fn test_lenient_u64() {
        assert_eq!(as_u64_lenient(&json!(42)), Some(42));
        assert_eq!(as_u64_lenient(&json!("42")), Some(42));
        assert_eq!(as_u64_lenient(&json!(-1)), None);
        assert_eq!(as_u64_lenient(&json!("n/a")), None);
    }
}
