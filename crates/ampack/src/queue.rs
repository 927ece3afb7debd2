//! # ByteQueue
//!
//! A FIFO of immutable byte chunks with a read cursor. Feeding bytes in
//! arbitrary boundaries and decoding incrementally means reads routinely
//! span more than one chunk; the fast path returns a zero-copy
//! [`bytes::Bytes`] slice when a read lies entirely within the head chunk,
//! the slow path assembles a contiguous copy across chunks.

use std::collections::VecDeque;

use bytes::Bytes;

/// Ordered FIFO of byte chunks plus a cursor into the head chunk.
#[derive(Debug, Default)]
pub struct ByteQueue {
    chunks: VecDeque<Bytes>,
    pos: usize,
    total_remaining: usize,
}

impl ByteQueue {
    pub fn new() -> Self {
        ByteQueue {
            chunks: VecDeque::new(),
            pos: 0,
            total_remaining: 0,
        }
    }

    /// Append a chunk. Empty chunks are a no-op.
    pub fn append(&mut self, chunk: impl Into<Bytes>) {
        let chunk = chunk.into();
        if chunk.is_empty() {
            return;
        }
        self.total_remaining += chunk.len();
        self.chunks.push_back(chunk);
    }

    /// Drop all queued bytes and reset the cursor.
    pub fn reset(&mut self) {
        self.chunks.clear();
        self.pos = 0;
        self.total_remaining = 0;
    }

    /// Total unread bytes across every chunk.
    pub fn remaining(&self) -> usize {
        self.total_remaining
    }

    /// Whether at least `n` unread bytes are queued.
    pub fn has_n(&self, n: usize) -> bool {
        self.total_remaining >= n
    }

    /// The byte at the cursor. Caller must ensure `has_n(1)`.
    pub fn peek_byte(&self) -> u8 {
        self.chunks[0][self.pos]
    }

    /// Zero-copy slice of `n` bytes iff they lie entirely in the head chunk.
    pub fn read_fast(&mut self, n: usize) -> Option<Bytes> {
        let head = self.chunks.front()?;
        if self.pos + n <= head.len() {
            let slice = head.slice(self.pos..self.pos + n);
            self.advance_first(n);
            Some(slice)
        } else {
            None
        }
    }

    /// Owned copy of `n` bytes, assembled across chunks if necessary.
    /// Advances the cursor past them. Panics if fewer than `n` bytes are
    /// queued — callers must check `has_n(n)` first.
    pub fn read_copy(&mut self, n: usize) -> Bytes {
        let mut buf = Vec::with_capacity(n);
        let mut remaining = n;
        while remaining > 0 {
            let head = self
                .chunks
                .front()
                .expect("read_copy: queue underflow, caller did not check has_n");
            let avail = head.len() - self.pos;
            let take = avail.min(remaining);
            buf.extend_from_slice(&head[self.pos..self.pos + take]);
            self.advance_first(take);
            remaining -= take;
        }
        Bytes::from(buf)
    }

    /// Read `n` bytes, preferring the zero-copy fast path.
    pub fn read(&mut self, n: usize) -> Bytes {
        match self.read_fast(n) {
            Some(b) => b,
            None => self.read_copy(n),
        }
    }

    /// Advance the cursor by `n` bytes, popping exhausted chunks.
    pub fn advance_first(&mut self, n: usize) {
        let mut remaining = n;
        while remaining > 0 {
            let head_len = self.chunks.front().map(|c| c.len()).unwrap_or(0);
            let avail = head_len - self.pos;
            if avail > remaining {
                self.pos += remaining;
                self.total_remaining -= remaining;
                remaining = 0;
            } else {
                self.total_remaining -= avail;
                remaining -= avail;
                self.chunks.pop_front();
                self.pos = 0;
            }
        }
    }

    /// Peek `n` bytes starting `offset` bytes past the cursor, without
    /// consuming anything. Returns `None` if fewer than `offset + n` bytes
    /// are queued.
    fn peek_at(&self, offset: usize, n: usize) -> Option<[u8; 4]> {
        if self.total_remaining < offset + n {
            return None;
        }
        let mut out = [0u8; 4];
        let mut skip = self.pos + offset;
        let mut written = 0;
        for chunk in &self.chunks {
            if skip >= chunk.len() {
                skip -= chunk.len();
                continue;
            }
            let start = skip;
            let avail = chunk.len() - start;
            let take = avail.min(n - written);
            out[written..written + take].copy_from_slice(&chunk[start..start + take]);
            written += take;
            skip = 0;
            if written == n {
                break;
            }
        }
        Some(out)
    }

    /// Read a 1/2/4-byte big-endian length positioned immediately after the
    /// (not-yet-consumed) header byte at the cursor. Does not consume
    /// anything; callers that want to skip the header + prefix should call
    /// [`ByteQueue::skip_size`] afterward.
    pub fn peek_size(&self, size_bytes: u8) -> Option<u32> {
        let n = size_bytes as usize;
        let buf = self.peek_at(1, n)?;
        Some(match n {
            1 => buf[0] as u32,
            2 => u16::from_be_bytes([buf[0], buf[1]]) as u32,
            4 => u32::from_be_bytes(buf),
            _ => unreachable!("size_bytes must be 1, 2, or 4"),
        })
    }

    /// Advance past the header byte and its `size_bytes`-byte length prefix.
    pub fn skip_size(&mut self, size_bytes: u8) {
        self.advance_first(1 + size_bytes as usize);
    }
}
