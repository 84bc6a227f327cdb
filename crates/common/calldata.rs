//! ABI encoding for constructor arguments and contract calls.
//!
//! Only the types the bootstrap needs are supported: `address`, `uintN`,
//! `bool`, `string`, `bytes` and dynamic arrays of those.

use bytes::Bytes;
use ethereum_types::{Address, U256};
use serde::{Deserialize, Serialize};

use crate::utils::keccak;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Value {
    Address(Address),
    Uint(U256),
    Bool(bool),
    String(String),
    Bytes(Bytes),
    Array(Vec<Value>),
}

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum CalldataEncodeError {
    #[error("Malformed function signature: {0}")]
    MalformedSignature(String),
    #[error("Wrong number of arguments: signature expects {expected}, got {got}")]
    WrongArgumentLength { expected: usize, got: usize },
    #[error("Argument {index} does not match parameter type `{expected}`")]
    TypeMismatch { index: usize, expected: String },
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CalldataDecodeError {
    #[error("Return data too short: expected at least 32 bytes, got {0}")]
    TooShort(usize),
    #[error("Returned word is not a left-padded address")]
    NotAnAddress,
}

impl Value {
    fn is_dynamic(&self) -> bool {
        matches!(self, Value::String(_) | Value::Bytes(_) | Value::Array(_))
    }

    fn matches_type(&self, param: &str) -> bool {
        if let Some(inner) = param.strip_suffix("[]") {
            return match self {
                Value::Array(items) => items.iter().all(|item| item.matches_type(inner)),
                _ => false,
            };
        }
        match self {
            Value::Address(_) => param == "address",
            Value::Uint(_) => param.starts_with("uint"),
            Value::Bool(_) => param == "bool",
            Value::String(_) => param == "string",
            Value::Bytes(_) => param == "bytes",
            Value::Array(_) => false,
        }
    }

    fn encode_into(&self, out: &mut Vec<u8>) {
        match self {
            Value::Address(address) => {
                out.extend_from_slice(&[0u8; 12]);
                out.extend_from_slice(address.as_bytes());
            }
            Value::Uint(value) => out.extend_from_slice(&value.to_big_endian()),
            Value::Bool(value) => {
                out.extend_from_slice(&U256::from(u8::from(*value)).to_big_endian())
            }
            Value::String(value) => encode_bytes(value.as_bytes(), out),
            Value::Bytes(value) => encode_bytes(value, out),
            Value::Array(items) => {
                out.extend_from_slice(&U256::from(items.len()).to_big_endian());
                out.extend_from_slice(&encode_tuple(items));
            }
        }
    }
}

fn encode_bytes(data: &[u8], out: &mut Vec<u8>) {
    out.extend_from_slice(&U256::from(data.len()).to_big_endian());
    out.extend_from_slice(data);
    let padding = (32 - data.len() % 32) % 32;
    out.extend(std::iter::repeat_n(0u8, padding));
}

/// Head/tail encoding of a sequence of values, as used for both
/// function arguments and constructor arguments.
pub fn encode_tuple(values: &[Value]) -> Vec<u8> {
    let head_size = 32 * values.len();
    let mut head = Vec::with_capacity(head_size);
    let mut tail = Vec::new();

    for value in values {
        if value.is_dynamic() {
            let offset = head_size + tail.len();
            head.extend_from_slice(&U256::from(offset).to_big_endian());
            value.encode_into(&mut tail);
        } else {
            value.encode_into(&mut head);
        }
    }

    head.extend_from_slice(&tail);
    head
}

fn parse_signature(signature: &str) -> Result<(String, Vec<String>), CalldataEncodeError> {
    let malformed = || CalldataEncodeError::MalformedSignature(signature.to_owned());
    let open = signature.find('(').ok_or_else(malformed)?;
    let inner = signature
        .get(open + 1..)
        .and_then(|rest| rest.strip_suffix(')'))
        .ok_or_else(malformed)?;
    let name = signature.get(..open).ok_or_else(malformed)?.trim().to_owned();
    if name.is_empty() || inner.contains('(') {
        return Err(malformed());
    }
    let params = if inner.trim().is_empty() {
        Vec::new()
    } else {
        inner.split(',').map(|param| param.trim().to_owned()).collect()
    };
    Ok((name, params))
}

pub fn compute_function_selector(signature: &str) -> Result<[u8; 4], CalldataEncodeError> {
    let (name, params) = parse_signature(signature)?;
    let normalized = format!("{name}({})", params.join(","));
    let hash = keccak(normalized.as_bytes());
    let mut selector = [0u8; 4];
    selector.copy_from_slice(&hash.as_bytes()[..4]);
    Ok(selector)
}

pub fn encode_calldata(signature: &str, values: &[Value]) -> Result<Vec<u8>, CalldataEncodeError> {
    let (_, params) = parse_signature(signature)?;
    if params.len() != values.len() {
        return Err(CalldataEncodeError::WrongArgumentLength {
            expected: params.len(),
            got: values.len(),
        });
    }
    for (index, (param, value)) in params.iter().zip(values).enumerate() {
        if !value.matches_type(param) {
            return Err(CalldataEncodeError::TypeMismatch {
                index,
                expected: param.clone(),
            });
        }
    }

    let mut calldata = compute_function_selector(signature)?.to_vec();
    calldata.extend_from_slice(&encode_tuple(values));
    Ok(calldata)
}

/// Decodes the first 32-byte return word as an address.
pub fn decode_address(return_data: &[u8]) -> Result<Address, CalldataDecodeError> {
    let word = return_data
        .get(..32)
        .ok_or(CalldataDecodeError::TooShort(return_data.len()))?;
    if word[..12].iter().any(|b| *b != 0) {
        return Err(CalldataDecodeError::NotAnAddress);
    }
    Ok(Address::from_slice(&word[12..]))
}
