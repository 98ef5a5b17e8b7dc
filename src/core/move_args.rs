// EN: src/core/move_args.rs

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const U256_MAX: &str =
    "115792089237316195423570985008687907853269984665640564039457584007913129639935";

/// Why an argument could not be encoded or decoded.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MoveArgError {
    #[error("Argument '{0}' is not of the form 'type:value'.")]
    MissingSeparator(String),
    #[error("Unsupported argument type '{0}'.")]
    UnknownType(String),
    #[error("Invalid {kind} value '{value}'.")]
    InvalidValue { kind: &'static str, value: String },
}

/// A Move-level value argument as passed on the command line (`type:value`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveArg {
    /// An account address, `0x` followed by hex digits.
    Address(String),
    /// `true` or `false`.
    Bool(bool),
    /// Unsigned 8-bit integer.
    U8(u8),
    /// Unsigned 16-bit integer.
    U16(u16),
    /// Unsigned 32-bit integer.
    U32(u32),
    /// Unsigned 64-bit integer.
    U64(u64),
    /// Unsigned 128-bit integer.
    U128(u128),
    /// Decimal digits, checked to fit in 256 bits.
    U256(String),
    /// UTF-8 text, passed through as is.
    String(String),
    /// Hex-encoded bytes, `0x` prefix optional.
    Hex(String),
}

impl MoveArg {
    /// The type name used before the `:`.
    pub fn type_tag(&self) -> &'static str {
        match self {
            MoveArg::Address(_) => "address",
            MoveArg::Bool(_) => "bool",
            MoveArg::U8(_) => "u8",
            MoveArg::U16(_) => "u16",
            MoveArg::U32(_) => "u32",
            MoveArg::U64(_) => "u64",
            MoveArg::U128(_) => "u128",
            MoveArg::U256(_) => "u256",
            MoveArg::String(_) => "string",
            MoveArg::Hex(_) => "hex",
        }
    }

    /// The value as the toolchain expects it after the `:`.
    pub fn value_literal(&self) -> String {
        match self {
            MoveArg::Address(v) | MoveArg::U256(v) | MoveArg::String(v) | MoveArg::Hex(v) => {
                v.clone()
            }
            MoveArg::Bool(v) => v.to_string(),
            MoveArg::U8(v) => v.to_string(),
            MoveArg::U16(v) => v.to_string(),
            MoveArg::U32(v) => v.to_string(),
            MoveArg::U64(v) => v.to_string(),
            MoveArg::U128(v) => v.to_string(),
        }
    }

    /// The `type:value` form the toolchain expects after `--args`.
    pub fn encode(&self) -> String {
        format!("{}:{}", self.type_tag(), self.value_literal())
    }

    /// Validated constructor for an address.
    pub fn address(value: impl Into<String>) -> Result<Self, MoveArgError> {
        let value = value.into();
        if is_hex(&value) {
            Ok(MoveArg::Address(value))
        } else {
            Err(MoveArgError::InvalidValue {
                kind: "address",
                value,
            })
        }
    }

    /// Validated constructor for a decimal u256.
    pub fn u256(value: impl Into<String>) -> Result<Self, MoveArgError> {
        let value = value.into();
        if fits_u256(&value) {
            Ok(MoveArg::U256(value))
        } else {
            Err(MoveArgError::InvalidValue {
                kind: "u256",
                value,
            })
        }
    }

    /// Validated constructor for a byte vector given in hex.
    pub fn hex(value: impl Into<String>) -> Result<Self, MoveArgError> {
        let value = value.into();
        let digits = value.strip_prefix("0x").unwrap_or(&value);
        if hex::decode(digits).is_ok() {
            Ok(MoveArg::Hex(value))
        } else {
            Err(MoveArgError::InvalidValue { kind: "hex", value })
        }
    }
}

impl fmt::Display for MoveArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl FromStr for MoveArg {
    type Err = MoveArgError;

    /// Parses `type:value`. Only the first `:` separates, so string values may contain colons.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, value) = s
            .split_once(':')
            .ok_or_else(|| MoveArgError::MissingSeparator(s.to_string()))?;

        fn number<T: FromStr>(kind: &'static str, value: &str) -> Result<T, MoveArgError> {
            value.parse().map_err(|_| MoveArgError::InvalidValue {
                kind,
                value: value.to_string(),
            })
        }

        match kind {
            "address" => MoveArg::address(value),
            "bool" => number("bool", value).map(MoveArg::Bool),
            "u8" => number("u8", value).map(MoveArg::U8),
            "u16" => number("u16", value).map(MoveArg::U16),
            "u32" => number("u32", value).map(MoveArg::U32),
            "u64" => number("u64", value).map(MoveArg::U64),
            "u128" => number("u128", value).map(MoveArg::U128),
            "u256" => MoveArg::u256(value),
            "string" => Ok(MoveArg::String(value.to_string())),
            "hex" => MoveArg::hex(value),
            other => Err(MoveArgError::UnknownType(other.to_string())),
        }
    }
}

/// Encodes a list of arguments for `--args`.
pub fn encode_args(args: &[MoveArg]) -> Vec<String> {
    args.iter().map(MoveArg::encode).collect()
}

/// Serializes named addresses as `name=address` pairs joined by commas.
pub fn serialize_named_addresses(named: &BTreeMap<String, String>) -> String {
    named
        .iter()
        .map(|(name, address)| format!("{}={}", name, address))
        .collect::<Vec<_>>()
        .join(",")
}

fn is_hex(value: &str) -> bool {
    let digits = value.strip_prefix("0x").unwrap_or(value);
    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_hexdigit())
}

fn fits_u256(value: &str) -> bool {
    if value.is_empty() || !value.chars().all(|c| c.is_ascii_digit()) {
        return false;
    }
    let significant = value.trim_start_matches('0');
    match significant.len().cmp(&U256_MAX.len()) {
        std::cmp::Ordering::Less => true,
        std::cmp::Ordering::Equal => significant <= U256_MAX,
        std::cmp::Ordering::Greater => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_then_decode_every_primitive() {
        let samples = vec![
            MoveArg::address("0x1").unwrap(),
            MoveArg::Bool(true),
            MoveArg::U8(255),
            MoveArg::U16(65_535),
            MoveArg::U32(4_000_000_000),
            MoveArg::U64(1000),
            MoveArg::U128(u128::MAX),
            MoveArg::u256(U256_MAX).unwrap(),
            MoveArg::String("hello: world".to_string()),
            MoveArg::hex("0xcafe").unwrap(),
        ];

        for arg in samples {
            let encoded = arg.encode();
            let decoded: MoveArg = encoded.parse().unwrap();
            assert_eq!(decoded, arg, "round trip failed for '{}'", encoded);
            assert_eq!(decoded.type_tag(), arg.type_tag());
        }
    }

    #[test]
    fn test_encode_shapes() {
        assert_eq!(MoveArg::U64(1000).encode(), "u64:1000");
        assert_eq!(MoveArg::address("0x1").unwrap().encode(), "address:0x1");
        assert_eq!(MoveArg::Bool(false).to_string(), "bool:false");
    }

    #[test]
    fn test_decode_rejects_bad_input() {
        assert_eq!(
            "1000".parse::<MoveArg>(),
            Err(MoveArgError::MissingSeparator("1000".to_string()))
        );
        assert_eq!(
            "f64:1.5".parse::<MoveArg>(),
            Err(MoveArgError::UnknownType("f64".to_string()))
        );
        assert!("u8:256".parse::<MoveArg>().is_err());
        assert!("address:0xzz".parse::<MoveArg>().is_err());
        assert!("hex:0xabc".parse::<MoveArg>().is_err());
        assert!(
            format!("u256:{}0", U256_MAX)
                .parse::<MoveArg>()
                .is_err()
        );
        assert!(
            "u256:115792089237316195423570985008687907853269984665640564039457584007913129639936"
                .parse::<MoveArg>()
                .is_err()
        );
    }

    #[test]
    fn test_named_addresses_serialization() {
        let mut named = BTreeMap::new();
        named.insert("vault".to_string(), "0xcafe".to_string());
        named.insert("admin".to_string(), "0x1".to_string());

        assert_eq!(serialize_named_addresses(&named), "admin=0x1,vault=0xcafe");
        assert_eq!(serialize_named_addresses(&BTreeMap::new()), "");
    }
}
