//! # UnpackerCore
//!
//! The decode state machine. Reads header+payload from a [`ByteQueue`] via
//! [`wire`], producing [`Value`] leaves or pushing a bounded [`DecodeFrame`]
//! for containers. Every readiness check happens *before* any cursor commit
//! past the header byte — on insufficient bytes the queue is left exactly as
//! it was, so feeding more and retrying never re-reads or double-counts
//! anything.

use bytes::Bytes;

use crate::cache::StringCache;
use crate::error::{Error, Result};
use crate::limits::Limits;
use crate::queue::ByteQueue;
use crate::value::{Ext, Value};
use crate::wire;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FrameMode {
    Seq,
    MapKey,
    MapValue,
}

/// One entry of the unpacker's explicit traversal stack. Only the fields
/// relevant to `mode` are populated; the others sit at their empty default.
struct DecodeFrame {
    mode: FrameMode,
    declared_len: usize,
    index: usize,
    seq_items: Vec<Value>,
    map_entries: Vec<(Value, Value)>,
    pending_key: Option<Value>,
}

impl DecodeFrame {
    fn seq(declared_len: usize) -> Self {
        DecodeFrame {
            mode: FrameMode::Seq,
            declared_len,
            index: 0,
            seq_items: Vec::with_capacity(declared_len.min(64)),
            map_entries: Vec::new(),
            pending_key: None,
        }
    }

    fn map(declared_len: usize) -> Self {
        DecodeFrame {
            mode: FrameMode::MapKey,
            declared_len,
            index: 0,
            seq_items: Vec::new(),
            map_entries: Vec::with_capacity(declared_len.min(64)),
            pending_key: None,
        }
    }
}

enum StepOutcome {
    Value(Value),
    ContainerStarted,
    NeedMoreBytes,
}

/// Callback applied to every decoded `Ext`. Default policy (no hook
/// installed) maps timestamp-shaped exts to [`Value::Timestamp`] and passes
/// everything else through as [`Value::Ext`].
pub type ExtHook = dyn FnMut(Ext) -> Value;

/// Incremental MessagePack decoder.
pub struct Unpacker {
    queue: ByteQueue,
    stack: Vec<DecodeFrame>,
    cache: StringCache,
    limits: Limits,
    tuple: bool,
    ext_hook: Option<Box<ExtHook>>,
}

impl Default for Unpacker {
    fn default() -> Self {
        Self::new()
    }
}

impl Unpacker {
    pub fn new() -> Self {
        Unpacker {
            queue: ByteQueue::new(),
            stack: Vec::new(),
            cache: StringCache::new(),
            limits: Limits::default(),
            tuple: false,
            ext_hook: None,
        }
    }

    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    /// Whether decoded arrays are treated as the embedder's "tuple" kind.
    /// Rust's `Vec<Value>` backs both representations identically; this flag
    /// only exists for API parity with the distilled surface (see
    /// `DESIGN.md`'s Open Question resolution) and has no effect on the
    /// decode algorithm itself.
    pub fn with_tuple(mut self, tuple: bool) -> Self {
        self.tuple = tuple;
        self
    }

    pub fn tuple_mode(&self) -> bool {
        self.tuple
    }

    pub fn with_ext_hook(mut self, hook: impl FnMut(Ext) -> Value + 'static) -> Self {
        self.ext_hook = Some(Box::new(hook));
        self
    }

    /// Queue raw bytes for decoding. Cheap: chunks are stored by reference
    /// count, never copied here.
    pub fn feed(&mut self, chunk: impl Into<Bytes>) {
        let chunk = chunk.into();
        tracing::trace!(len = chunk.len(), "feeding chunk");
        self.queue.append(chunk);
    }

    /// Unread byte count still queued.
    pub fn remaining(&self) -> usize {
        self.queue.remaining()
    }

    /// Drop all queued bytes and in-progress containers.
    pub fn reset(&mut self) {
        self.queue.reset();
        self.stack.clear();
    }

    /// Decode and return the next complete value, or `Ok(None)` if the
    /// queue doesn't yet hold enough bytes. Safe to call again after
    /// feeding more data — no partial progress is lost across a `None`.
    pub fn next_value(&mut self) -> Result<Option<Value>> {
        loop {
            match self.step()? {
                StepOutcome::NeedMoreBytes => return Ok(None),
                StepOutcome::ContainerStarted => continue,
                StepOutcome::Value(value) => {
                    if let Some(result) = self.reduce(value)? {
                        return Ok(Some(result));
                    }
                }
            }
        }
    }

    /// An iterator over every value the queue can currently yield, stopping
    /// cleanly when bytes run out. An error poisons the iterator: the error
    /// is yielded once, then the iterator ends.
    pub fn values(&mut self) -> Values<'_> {
        Values {
            unpacker: self,
            poisoned: false,
        }
    }

    fn finish_ext(&mut self, code: i8, data: Bytes) -> Value {
        let ext = Ext::new(code, data);
        match &mut self.ext_hook {
            Some(hook) => hook(ext),
            None => ext.default_decode(),
        }
    }

    fn read_str_payload(&mut self, header_len: usize, len: usize) -> Result<Option<Value>> {
        if !self.queue.has_n(header_len + len) {
            return Ok(None);
        }
        self.queue.advance_first(header_len);
        let bytes = self.queue.read(len);
        let in_map_key = matches!(
            self.stack.last(),
            Some(frame) if matches!(frame.mode, FrameMode::MapKey)
        );
        let decoded = if in_map_key {
            self.cache.decode_str(&bytes)
        } else {
            std::str::from_utf8(&bytes).map(str::to_owned)
        };
        let s = decoded.map_err(|e| Error::Value(format!("invalid utf-8 in string: {e}")))?;
        Ok(Some(Value::Str(s)))
    }

    fn start_container(&mut self, header_len: usize, len: usize, is_map: bool) -> Result<StepOutcome> {
        if !self.queue.has_n(header_len) {
            return Ok(StepOutcome::NeedMoreBytes);
        }
        self.queue.advance_first(header_len);
        if len == 0 {
            let empty = if is_map {
                Value::Map(Vec::new())
            } else {
                Value::Array(Vec::new())
            };
            return Ok(StepOutcome::Value(empty));
        }
        if self.stack.len() >= self.limits.max_depth {
            return Err(Error::DepthLimit);
        }
        tracing::trace!(len, is_map, "pushing decode frame");
        self.stack.push(if is_map {
            DecodeFrame::map(len)
        } else {
            DecodeFrame::seq(len)
        });
        Ok(StepOutcome::ContainerStarted)
    }

    fn step(&mut self) -> Result<StepOutcome> {
        if !self.queue.has_n(1) {
            return Ok(StepOutcome::NeedMoreBytes);
        }
        let byte = self.queue.peek_byte();
        let header = wire::Header::decode(byte)
            .ok_or_else(|| Error::Value("encountered reserved header byte 0xc1".to_string()))?;

        let value = match header {
            wire::Header::PosFixInt(v) => {
                self.queue.advance_first(1);
                Value::Int(v as i64)
            }
            wire::Header::NegFixInt(v) => {
                self.queue.advance_first(1);
                Value::Int(v as i64)
            }
            wire::Header::Nil => {
                self.queue.advance_first(1);
                Value::Nil
            }
            wire::Header::False => {
                self.queue.advance_first(1);
                Value::Bool(false)
            }
            wire::Header::True => {
                self.queue.advance_first(1);
                Value::Bool(true)
            }
            wire::Header::Uint { width } => {
                if !self.queue.has_n(1 + width as usize) {
                    return Ok(StepOutcome::NeedMoreBytes);
                }
                self.queue.advance_first(1);
                let bytes = self.queue.read(width as usize);
                Value::from(read_be_uint(&bytes, width))
            }
            wire::Header::Int { width } => {
                if !self.queue.has_n(1 + width as usize) {
                    return Ok(StepOutcome::NeedMoreBytes);
                }
                self.queue.advance_first(1);
                let bytes = self.queue.read(width as usize);
                Value::Int(read_be_int(&bytes, width))
            }
            wire::Header::Float32 => {
                if !self.queue.has_n(5) {
                    return Ok(StepOutcome::NeedMoreBytes);
                }
                self.queue.advance_first(1);
                let bytes = self.queue.read(4);
                Value::Float64(f32::from_be_bytes(bytes[..4].try_into().unwrap()) as f64)
            }
            wire::Header::Float64 => {
                if !self.queue.has_n(9) {
                    return Ok(StepOutcome::NeedMoreBytes);
                }
                self.queue.advance_first(1);
                let bytes = self.queue.read(8);
                Value::Float64(f64::from_be_bytes(bytes[..8].try_into().unwrap()))
            }
            wire::Header::FixStr { len } => match self.read_str_payload(1, len as usize)? {
                Some(v) => v,
                None => return Ok(StepOutcome::NeedMoreBytes),
            },
            wire::Header::Str { size_bytes } => {
                let len = match self.queue.peek_size(size_bytes) {
                    Some(l) => l as usize,
                    None => return Ok(StepOutcome::NeedMoreBytes),
                };
                if len > self.limits.max_bytes_len {
                    return Err(Error::size_limit("string", len, self.limits.max_bytes_len));
                }
                match self.read_str_payload(1 + size_bytes as usize, len)? {
                    Some(v) => v,
                    None => return Ok(StepOutcome::NeedMoreBytes),
                }
            }
            wire::Header::Bin { size_bytes } => {
                let len = match self.queue.peek_size(size_bytes) {
                    Some(l) => l as usize,
                    None => return Ok(StepOutcome::NeedMoreBytes),
                };
                if len > self.limits.max_bytes_len {
                    return Err(Error::size_limit("bin", len, self.limits.max_bytes_len));
                }
                let header_len = 1 + size_bytes as usize;
                if !self.queue.has_n(header_len + len) {
                    return Ok(StepOutcome::NeedMoreBytes);
                }
                self.queue.advance_first(header_len);
                Value::Bin(self.queue.read(len))
            }
            wire::Header::Ext { size_bytes } => {
                let len = match self.queue.peek_size(size_bytes) {
                    Some(l) => l as usize,
                    None => return Ok(StepOutcome::NeedMoreBytes),
                };
                if len > self.limits.max_ext_len {
                    return Err(Error::size_limit("ext", len, self.limits.max_ext_len));
                }
                let header_len = 1 + size_bytes as usize;
                if !self.queue.has_n(header_len + 1 + len) {
                    return Ok(StepOutcome::NeedMoreBytes);
                }
                self.queue.advance_first(header_len);
                let code = self.queue.read(1)[0] as i8;
                let data = self.queue.read(len);
                self.finish_ext(code, data)
            }
            wire::Header::FixExt { len } => {
                if !self.queue.has_n(1 + 1 + len as usize) {
                    return Ok(StepOutcome::NeedMoreBytes);
                }
                self.queue.advance_first(1);
                let code = self.queue.read(1)[0] as i8;
                let data = self.queue.read(len as usize);
                self.finish_ext(code, data)
            }
            wire::Header::FixArray { len } => {
                return self.start_container(1, len as usize, false);
            }
            wire::Header::Array { size_bytes } => {
                let len = match self.queue.peek_size(size_bytes) {
                    Some(l) => l as usize,
                    None => return Ok(StepOutcome::NeedMoreBytes),
                };
                if len > self.limits.max_array_len {
                    return Err(Error::size_limit("array", len, self.limits.max_array_len));
                }
                return self.start_container(1 + size_bytes as usize, len, false);
            }
            wire::Header::FixMap { len } => {
                return self.start_container(1, len as usize, true);
            }
            wire::Header::Map { size_bytes } => {
                let len = match self.queue.peek_size(size_bytes) {
                    Some(l) => l as usize,
                    None => return Ok(StepOutcome::NeedMoreBytes),
                };
                if len > self.limits.max_map_len {
                    return Err(Error::size_limit("map", len, self.limits.max_map_len));
                }
                return self.start_container(1 + size_bytes as usize, len, true);
            }
        };

        Ok(StepOutcome::Value(value))
    }

    /// Fold a freshly decoded leaf (or completed container) into the
    /// enclosing frame, promoting all the way to the root when every
    /// enclosing container also completes. `Ok(None)` means the value was
    /// absorbed but the outermost container is still open.
    fn reduce(&mut self, mut value: Value) -> Result<Option<Value>> {
        loop {
            let Some(frame) = self.stack.last_mut() else {
                return Ok(Some(value));
            };
            match frame.mode {
                FrameMode::Seq => {
                    frame.seq_items.push(value);
                    frame.index += 1;
                    if frame.index == frame.declared_len {
                        let frame = self.stack.pop().unwrap();
                        value = Value::Array(frame.seq_items);
                        continue;
                    }
                    return Ok(None);
                }
                FrameMode::MapKey => {
                    frame.pending_key = Some(value);
                    frame.mode = FrameMode::MapValue;
                    return Ok(None);
                }
                FrameMode::MapValue => {
                    let key = frame
                        .pending_key
                        .take()
                        .expect("MapValue frame always holds a pending key");
                    Value::map_insert(&mut frame.map_entries, key, value);
                    frame.index += 1;
                    frame.mode = FrameMode::MapKey;
                    if frame.index == frame.declared_len {
                        let frame = self.stack.pop().unwrap();
                        value = Value::Map(frame.map_entries);
                        continue;
                    }
                    return Ok(None);
                }
            }
        }
    }
}

fn read_be_uint(bytes: &[u8], width: u8) -> u64 {
    match width {
        1 => bytes[0] as u64,
        2 => u16::from_be_bytes([bytes[0], bytes[1]]) as u64,
        4 => u32::from_be_bytes(bytes[..4].try_into().unwrap()) as u64,
        8 => u64::from_be_bytes(bytes[..8].try_into().unwrap()),
        _ => unreachable!("width is always 1, 2, 4, or 8"),
    }
}

fn read_be_int(bytes: &[u8], width: u8) -> i64 {
    match width {
        1 => bytes[0] as i8 as i64,
        2 => i16::from_be_bytes([bytes[0], bytes[1]]) as i64,
        4 => i32::from_be_bytes(bytes[..4].try_into().unwrap()) as i64,
        8 => i64::from_be_bytes(bytes[..8].try_into().unwrap()),
        _ => unreachable!("width is always 1, 2, 4, or 8"),
    }
}

/// Iterator over the values a feeding [`Unpacker`] can currently produce.
pub struct Values<'a> {
    unpacker: &'a mut Unpacker,
    poisoned: bool,
}

impl<'a> Iterator for Values<'a> {
    type Item = Result<Value>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.poisoned {
            return None;
        }
        match self.unpacker.next_value() {
            Ok(Some(v)) => Some(Ok(v)),
            Ok(None) => None,
            Err(e) => {
                self.poisoned = true;
                Some(Err(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_fixstr() {
        let mut u = Unpacker::new();
        u.feed(Bytes::from_static(&[0xa5, 0x68, 0x65, 0x6c, 0x6c, 0x6f]));
        assert_eq!(u.next_value().unwrap(), Some(Value::Str("hello".into())));
    }

    #[test]
    fn insufficient_bytes_returns_none_without_losing_progress() {
        let mut u = Unpacker::new();
        u.feed(Bytes::from_static(&[0x93, 0x01, 0x02]));
        assert_eq!(u.next_value().unwrap(), None);
        u.feed(Bytes::from_static(&[0x03]));
        assert_eq!(
            u.next_value().unwrap(),
            Some(Value::Array(vec![Value::Int(1), Value::Int(2), Value::Int(3)]))
        );
    }

    #[test]
    fn chunk_boundaries_of_one_byte_each() {
        let mut u = Unpacker::new();
        for byte in [0x93u8, 0x01, 0x02, 0x03] {
            u.feed(Bytes::from_static(match byte {
                0x93 => &[0x93],
                0x01 => &[0x01],
                0x02 => &[0x02],
                _ => &[0x03],
            }));
        }
        assert_eq!(
            u.next_value().unwrap(),
            Some(Value::Array(vec![Value::Int(1), Value::Int(2), Value::Int(3)]))
        );
    }

    #[test]
    fn reserved_byte_is_hard_error() {
        let mut u = Unpacker::new();
        u.feed(Bytes::from_static(&[0xc1]));
        assert!(u.next_value().is_err());
    }

    #[test]
    fn decodes_fixext8_timestamp() {
        let mut u = Unpacker::new();
        u.feed(Bytes::from_static(&[
            0xd7, 0xff, 0x00, 0x00, 0x00, 0x00, 0x68, 0x7b, 0xfb, 0x10,
        ]));
        let v = u.next_value().unwrap().unwrap();
        assert!(matches!(v, Value::Timestamp(_)));
    }

    #[test]
    fn decodes_nested_map_with_bool_and_int() {
        let mut u = Unpacker::new();
        u.feed(Bytes::from_static(&[
            0x82, 0xa7, 0x63, 0x6f, 0x6d, 0x70, 0x61, 0x63, 0x74, 0xc3, 0xa6, 0x73, 0x63, 0x68,
            0x65, 0x6d, 0x61, 0x00,
        ]));
        let v = u.next_value().unwrap().unwrap();
        assert_eq!(
            v,
            Value::Map(vec![
                (Value::Str("compact".into()), Value::Bool(true)),
                (Value::Str("schema".into()), Value::Int(0)),
            ])
        );
    }

    #[test]
    fn map_keys_use_string_cache() {
        let mut u = Unpacker::new();
        u.feed(Bytes::from_static(&[0x81, 0xa2, 0x69, 0x64, 0x01]));
        let v = u.next_value().unwrap().unwrap();
        assert_eq!(v, Value::Map(vec![(Value::Str("id".into()), Value::Int(1))]));
    }

    #[test]
    fn deeply_nested_array_hits_depth_limit() {
        let mut u = Unpacker::new();
        let mut bytes = Vec::new();
        for _ in 0..33 {
            bytes.push(0x91u8);
        }
        bytes.push(0x90); // innermost empty array
        u.feed(Bytes::from(bytes));
        assert!(matches!(u.next_value().unwrap_err(), Error::DepthLimit));
    }

    #[test]
    fn tuple_flag_round_trips_but_does_not_change_shape() {
        let mut u = Unpacker::new().with_tuple(true);
        assert!(u.tuple_mode());
        u.feed(Bytes::from_static(&[0x90]));
        assert_eq!(u.next_value().unwrap(), Some(Value::Array(vec![])));
    }

    #[test]
    fn values_iterator_stops_cleanly() {
        let mut u = Unpacker::new();
        u.feed(Bytes::from_static(&[0x01, 0x02]));
        let collected: Vec<_> = u.values().collect::<Result<Vec<_>>>().unwrap();
        assert_eq!(collected, vec![Value::Int(1), Value::Int(2)]);
    }

    #[test]
    fn reset_drops_partial_state() {
        let mut u = Unpacker::new();
        u.feed(Bytes::from_static(&[0x93, 0x01]));
        assert_eq!(u.next_value().unwrap(), None);
        u.reset();
        assert_eq!(u.remaining(), 0);
    }
}
