//! Byte encodings for the primary table and the three secondary indices.
//!
//! The central subtlety is [`encode_value_key`]: values live in a key space
//! ordered non-negative integers < negative integers < hashed strings <
//! inline strings, so that range queries over integers can be split into two
//! monotone sub-scans (see `query::rows_by_minmax`).

use crate::error::{Result, StoreError};

pub const MAX_PROP_LEN: usize = 350;
pub const LARGE_STRING_SIZE: usize = 128;
pub const MAX_INT_VAL: i64 = i64::MAX;
pub const MIN_INT_VAL: i64 = i64::MIN;
pub const PK_MAX: u64 = u64::MAX - 1;

const MARK_NEG: u8 = 0x80;
const MARK_HASH: u8 = 0x81;
const MARK_STR: u8 = 0x82;

/// A stored value: either a signed 64-bit integer or an arbitrary byte
/// string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Int(i64),
    Bytes(Vec<u8>),
}

impl Value {
    pub fn str(s: impl Into<String>) -> Self { Value::Bytes(s.into().into_bytes()) }
}

/// 128-bit opaque identifier, encoded at the API boundary as 32 lowercase
/// hex characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Iden(pub [u8; 16]);

impl Iden {
    pub fn from_hex(hex: &str) -> Result<Self> {
        if hex.len() != 32 {
            return Err(StoreError::BadIden(format!("expected 32 hex chars, got {}", hex.len())));
        }
        let mut out = [0u8; 16];
        for i in 0..16 {
            let byte = u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16)
                .map_err(|_| StoreError::BadIden(hex.to_string()))?;
            out[i] = byte;
        }
        Ok(Iden(out))
    }

    pub fn to_hex(&self) -> String {
        let mut s = String::with_capacity(32);
        for b in self.0 {
            s.push_str(&format!("{:02x}", b));
        }
        s
    }
}

/// An IPVT row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub iden: Iden,
    pub prop: Vec<u8>,
    pub value: Value,
    pub timestamp: i64,
}

pub fn hash64(bytes: &[u8]) -> u64 {
    let digest = blake3::hash(bytes);
    u64::from_be_bytes(digest.as_bytes()[0..8].try_into().unwrap())
}

/// Sign-biased big-endian encoding: flips the sign bit so that unsigned
/// byte-lexicographic order matches signed numeric order.
pub fn encode_biased_i64(v: i64) -> [u8; 8] { ((v as u64) ^ 0x8000_0000_0000_0000).to_be_bytes() }

pub fn decode_biased_i64(bytes: &[u8; 8]) -> i64 { (u64::from_be_bytes(*bytes) ^ 0x8000_0000_0000_0000) as i64 }

pub fn encode_timestamp(t: i64) -> [u8; 8] { encode_biased_i64(t) }
pub fn decode_timestamp(bytes: &[u8; 8]) -> i64 { decode_biased_i64(bytes) }

pub fn encode_iden(iden: &Iden) -> [u8; 16] { iden.0 }
pub fn decode_iden(bytes: &[u8; 16]) -> Iden { Iden(*bytes) }

/// Length-prefixed (u16 BE) so a decoder can skip the field without
/// interpreting its contents.
pub fn encode_prop(prop: &[u8]) -> Result<Vec<u8>> {
    if prop.len() > MAX_PROP_LEN {
        return Err(StoreError::PropTooLong { max: MAX_PROP_LEN, got: prop.len() });
    }
    let mut out = Vec::with_capacity(2 + prop.len());
    out.extend_from_slice(&(prop.len() as u16).to_be_bytes());
    out.extend_from_slice(prop);
    Ok(out)
}

/// Decodes a length-prefixed prop from the front of `bytes`, returning the
/// prop and the number of bytes consumed.
pub fn decode_prop(bytes: &[u8]) -> (Vec<u8>, usize) {
    let len = u16::from_be_bytes([bytes[0], bytes[1]]) as usize;
    (bytes[2..2 + len].to_vec(), 2 + len)
}

pub fn encode_pk_key(pk: u64) -> [u8; 8] { pk.to_be_bytes() }
pub fn decode_pk_key(bytes: &[u8; 8]) -> u64 { u64::from_be_bytes(*bytes) }
pub fn encode_pk_value(pk: u64) -> [u8; 8] { pk.to_be_bytes() }
pub fn decode_pk_value(bytes: &[u8]) -> u64 { u64::from_be_bytes(bytes[0..8].try_into().unwrap()) }

/// Order-preserving key encoding for a value. Region layout, low to high:
/// non-negative integers, negative integers (reverse magnitude order within
/// the region), hashed long strings, inline short strings.
pub fn encode_value_key(v: &Value) -> Vec<u8> {
    match v {
        Value::Int(n) if *n >= 0 => (*n as u64).to_be_bytes().to_vec(),
        Value::Int(n) => {
            let mag = n.unsigned_abs();
            let mut out = vec![MARK_NEG];
            out.extend_from_slice(&mag.to_be_bytes());
            out
        }
        Value::Bytes(b) if b.len() < LARGE_STRING_SIZE => {
            let mut out = vec![MARK_STR];
            out.extend_from_slice(b);
            out
        }
        Value::Bytes(b) => {
            let mut out = vec![MARK_HASH];
            out.extend_from_slice(&hash64(b).to_be_bytes());
            out
        }
    }
}

pub fn value_key_is_hashed(key: &[u8]) -> bool { key.first() == Some(&MARK_HASH) }

/// Full-fidelity encoding for the primary table payload: tag byte, then a
/// fixed 8 bytes for an integer or a u32-length-prefixed run for bytes.
pub fn encode_value_value(v: &Value) -> Vec<u8> {
    match v {
        Value::Int(n) => {
            let mut out = vec![0u8];
            out.extend_from_slice(&n.to_be_bytes());
            out
        }
        Value::Bytes(b) => {
            let mut out = vec![1u8];
            out.extend_from_slice(&(b.len() as u32).to_be_bytes());
            out.extend_from_slice(b);
            out
        }
    }
}

fn decode_value_value(bytes: &[u8]) -> (Value, usize) {
    match bytes[0] {
        0 => {
            let n = i64::from_be_bytes(bytes[1..9].try_into().unwrap());
            (Value::Int(n), 9)
        }
        1 => {
            let len = u32::from_be_bytes(bytes[1..5].try_into().unwrap()) as usize;
            (Value::Bytes(bytes[5..5 + len].to_vec()), 5 + len)
        }
        tag => unreachable!("unknown value tag {tag}"),
    }
}

/// Encodes a full row payload: `iden(16) || prop || value || timestamp(8)`.
pub fn encode_row_payload(row: &Row) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    out.extend_from_slice(&encode_iden(&row.iden));
    out.extend_from_slice(&encode_prop(&row.prop)?);
    out.extend_from_slice(&encode_value_value(&row.value));
    out.extend_from_slice(&encode_timestamp(row.timestamp));
    Ok(out)
}

pub fn decode_row_payload(bytes: &[u8]) -> Row {
    let iden = decode_iden(bytes[0..16].try_into().unwrap());
    let mut off = 16;
    let (prop, consumed) = decode_prop(&bytes[off..]);
    off += consumed;
    let (value, consumed) = decode_value_value(&bytes[off..]);
    off += consumed;
    let timestamp = decode_timestamp(bytes[off..off + 8].try_into().unwrap());
    Row { iden, prop, value, timestamp }
}

pub fn check_int_range(v: i64) -> Result<()> {
    if !(MIN_INT_VAL..=MAX_INT_VAL).contains(&v) {
        return Err(StoreError::IntOutOfRange(v as i128));
    }
    Ok(())
}
