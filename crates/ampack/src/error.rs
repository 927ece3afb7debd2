//! # Error Taxonomy
//!
//! A single error enum covering the packer, the unpacker, and the facade
//! functions. Mirrors the three-way split (`TypeError` / `ValueError` /
//! `MemoryError`) that a dynamically-typed host would raise, collapsed into
//! one Rust type per the usual `thiserror` convention.

use thiserror::Error;

/// Errors produced by packing or unpacking a MessagePack value.
#[derive(Debug, Error)]
pub enum Error {
    /// A value's kind cannot be encoded, or a callback returned the wrong kind.
    #[error("{0}")]
    Type(String),

    /// A malformed or out-of-range value: bad header, size limit, extra data, etc.
    #[error("{0}")]
    Value(String),

    /// A container push would exceed the fixed decode/encode stack depth.
    #[error("Deeply nested object")]
    DepthLimit,

    /// Buffer or container allocation failed.
    ///
    /// Never constructed by this crate: `Vec`'s growth path aborts the
    /// process on allocation failure rather than returning a `Result`, so
    /// there is no fallible site here that would produce this variant. Kept
    /// for parity with the distilled taxonomy's `MemoryError` and for
    /// embedders who want a stable match arm if a future fallible-allocation
    /// path is added.
    #[error("out of memory")]
    Memory,

    /// Propagated from a `FileUnpacker`'s underlying reader.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn size_limit(kind: &str, len: usize, limit: usize) -> Self {
        Error::Value(format!("{kind} size {len} is too big (> {limit})"))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
