//! # ampack
//!
//! A pure-Rust MessagePack codec: an iterative packer and a chunk-resumable
//! streaming unpacker, built around a single [`Value`] data model.
//!
//! ## Crate structure
//!
//! - [`wire`] — Header byte table, big-endian encode helpers, width selection
//! - [`queue`] — `ByteQueue`, the chunked FIFO the unpacker reads from
//! - [`value`] — The `Value` model plus `Ext`, `Raw`, `Timestamp`
//! - [`packer`] — Iterative encoder: `Value` → bytes
//! - [`unpacker`] — The decode state machine (`Unpacker`)
//! - [`file_unpacker`] — `Unpacker` wrapped around a `std::io::Read` source
//! - [`cache`] — Direct-mapped map-key string cache
//! - [`timestamp`] — Timestamp extension codec and civil-calendar conversion
//! - [`limits`] — Configurable decode size guards
//! - [`error`] — Crate error type

pub mod cache;
pub mod error;
pub mod file_unpacker;
pub mod limits;
pub mod packer;
pub mod queue;
pub mod timestamp;
pub mod unpacker;
pub mod value;
pub mod wire;

pub use error::{Error, Result};
pub use file_unpacker::FileUnpacker;
pub use limits::Limits;
pub use packer::Packer;
pub use unpacker::{ExtHook, Unpacker};
pub use value::{Ext, Raw, Timestamp, Value};

use bytes::Bytes;

/// Encode a single value with the default packer configuration.
pub fn packb(value: &Value) -> Result<Vec<u8>> {
    packer::packb(value)
}

/// Decode exactly one value from `bytes`. Fails with [`Error::Value`] if the
/// buffer holds more than one value ("Extra data") or fewer than one
/// ("Incomplete MessagePack format").
pub fn unpackb(bytes: &[u8]) -> Result<Value> {
    let mut unpacker = Unpacker::new();
    unpacker.feed(Bytes::copy_from_slice(bytes));
    let value = match unpacker.next_value()? {
        Some(v) => v,
        None => return Err(Error::Value("Incomplete MessagePack format".to_string())),
    };
    if unpacker.remaining() > 0 {
        return Err(Error::Value("Extra data".to_string()));
    }
    Ok(value)
}
