//! # Value Model
//!
//! The tagged universe a MessagePack stream decodes into, plus the
//! auxiliary `Ext`, `Raw`, and `Timestamp` types.
//!
//! `Map` is a `Vec<(Value, Value)>` rather than a `HashMap` — it must
//! preserve wire order and tolerate non-hashable keys (e.g. nested `Array`),
//! and duplicate keys resolve last-write-wins on insert, not on lookup.

use bytes::Bytes;

use crate::error::Error;
use crate::timestamp;

/// A decoded (or to-be-encoded) MessagePack value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Nil,
    Bool(bool),
    /// Signed 64-bit integer — covers all `fixint`/`int8..64` and the subset
    /// of `uint8..64` that fits in `i64`.
    Int(i64),
    /// `uint64` values exceeding `i64::MAX`. Kept as a distinct variant
    /// rather than widening `Int` so both directions round-trip exactly.
    UInt(u64),
    Float64(f64),
    Str(String),
    Bin(Bytes),
    Array(Vec<Value>),
    Map(Vec<(Value, Value)>),
    Ext(Ext),
    Timestamp(Timestamp),
    /// Packer-only: splice `data` into the output verbatim, bypassing the
    /// dispatcher entirely. Decoding never produces this variant.
    Raw(Raw),
}

impl Value {
    /// Insert `key`/`val` into a `Map` honoring last-write-wins, or push
    /// onto an `Array`. Used internally by the unpacker's frame reduction;
    /// public because it is also the natural way to build a `Map` by hand.
    pub fn map_insert(entries: &mut Vec<(Value, Value)>, key: Value, val: Value) {
        if let Some(slot) = entries.iter_mut().find(|(k, _)| *k == key) {
            slot.1 = val;
        } else {
            entries.push((key, val));
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        match i64::try_from(v) {
            Ok(v) => Value::Int(v),
            Err(_) => Value::UInt(v),
        }
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float64(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_owned())
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bin(Bytes::from(v))
    }
}

/// A MessagePack extension value: an application-defined `code` plus its
/// raw payload. `code == -1` with a canonical length is the reserved
/// timestamp extension (see [`Timestamp`]).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ext {
    pub code: i8,
    pub data: Bytes,
}

impl Ext {
    pub fn new(code: i8, data: impl Into<Bytes>) -> Self {
        Ext {
            code,
            data: data.into(),
        }
    }

    /// Whether this ext's code and payload length match the timestamp
    /// reservation (`code == -1`, `len ∈ {4, 8, 12}`).
    pub fn is_timestamp(&self) -> bool {
        self.code == -1 && matches!(self.data.len(), 4 | 8 | 12)
    }

    /// Decode this ext as a timestamp. Fails if it is not timestamp-shaped
    /// or the payload is malformed.
    pub fn to_timestamp(&self) -> Result<Timestamp, Error> {
        if self.code != -1 {
            return Err(Error::Value(format!(
                "ext code {} is not the timestamp extension",
                self.code
            )));
        }
        timestamp::decode(&self.data)
    }

    /// Apply the decoder's default ext policy: timestamp-shaped exts become
    /// [`Value::Timestamp`], everything else passes through as
    /// [`Value::Ext`].
    pub fn default_decode(self) -> Value {
        if self.is_timestamp() {
            if let Ok(ts) = timestamp::decode(&self.data) {
                return Value::Timestamp(ts);
            }
        }
        Value::Ext(self)
    }
}

/// A packer-only pass-through wrapper: `data` is spliced into the output
/// verbatim, bypassing type dispatch. Never produced by the decoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raw {
    pub data: Bytes,
}

impl Raw {
    pub fn new(data: impl Into<Bytes>) -> Self {
        Raw { data: data.into() }
    }
}

/// An absolute instant: seconds since the Unix epoch plus a nanosecond
/// fraction. Mirrors MessagePack's reserved `-1` extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timestamp {
    pub seconds: i64,
    pub nanoseconds: u32,
}

impl Timestamp {
    pub fn new(seconds: i64, nanoseconds: u32) -> Self {
        Timestamp {
            seconds,
            nanoseconds,
        }
    }
}

impl PartialOrd for Timestamp {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Timestamp {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (self.seconds, self.nanoseconds).cmp(&(other.seconds, other.nanoseconds))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_insert_last_write_wins() {
        let mut entries = Vec::new();
        Value::map_insert(&mut entries, Value::Int(1), Value::Str("a".into()));
        Value::map_insert(&mut entries, Value::Int(1), Value::Str("b".into()));
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].1, Value::Str("b".into()));
    }

    #[test]
    fn timestamp_ordering() {
        let a = Timestamp::new(10, 500);
        let b = Timestamp::new(10, 600);
        let c = Timestamp::new(11, 0);
        assert!(a < b);
        assert!(b < c);
        assert!(a < c);
    }

    #[test]
    fn ext_timestamp_detection() {
        let ext = Ext::new(-1, vec![0u8; 4]);
        assert!(ext.is_timestamp());
        let ext = Ext::new(-1, vec![0u8; 5]);
        assert!(!ext.is_timestamp());
        let ext = Ext::new(5, vec![0u8; 4]);
        assert!(!ext.is_timestamp());
    }
}
