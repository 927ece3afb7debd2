//! # StringCache
//!
//! A fixed-size, direct-mapped cache of short map-key strings. Decoding a
//! map key revalidates the same handful of key strings over and over
//! (`"id"`, `"name"`, `"type"`, ...); caching the UTF-8-validated form by a
//! cheap non-cryptographic hash skips that revalidation on a hit.
//!
//! Scoped per-[`crate::Unpacker`] rather than module-global (see
//! `DESIGN.md`'s Open Question resolution) — this sidesteps the original
//! implementation's single-interpreter GC-sweep eviction protocol, which has
//! no clean Rust equivalent without unsafe global state or a process-wide
//! lock. The cache is simply dropped with its owning `Unpacker`.
//!
//! This is a pure optimization: a conforming implementation may omit it
//! entirely without any behavioral difference in decoded output.

pub const CACHE_TABLE_SIZE: usize = 512;
pub const MAX_CACHE_LEN: usize = 16;

#[derive(Debug, Clone, Default)]
struct CacheEntry {
    hash: u32,
    len: u16,
    bytes: [u8; MAX_CACHE_LEN],
    value: Option<String>,
}

/// Direct-mapped map-key string cache.
pub struct StringCache {
    entries: Vec<CacheEntry>,
}

impl Default for StringCache {
    fn default() -> Self {
        Self::new()
    }
}

impl StringCache {
    pub fn new() -> Self {
        StringCache {
            entries: vec![CacheEntry::default(); CACHE_TABLE_SIZE],
        }
    }

    /// Decode `data` as a UTF-8 string, consulting (and updating) the cache
    /// for payloads of `len <= MAX_CACHE_LEN`. Longer strings bypass the
    /// cache entirely.
    pub fn decode_str(&mut self, data: &[u8]) -> Result<String, std::str::Utf8Error> {
        if data.len() > MAX_CACHE_LEN {
            return std::str::from_utf8(data).map(str::to_owned);
        }

        let hash = xxhash32(data, 0);
        let idx = (hash & (CACHE_TABLE_SIZE as u32 - 1)) as usize;
        let entry = &mut self.entries[idx];

        if entry.hash == hash && entry.len as usize == data.len() && &entry.bytes[..data.len()] == data {
            if let Some(cached) = &entry.value {
                return Ok(cached.clone());
            }
        }

        let decoded = std::str::from_utf8(data)?.to_owned();
        entry.hash = hash;
        entry.len = data.len() as u16;
        entry.bytes[..data.len()].copy_from_slice(data);
        entry.value = Some(decoded.clone());
        Ok(decoded)
    }
}

/// xxHash32-like mixing function: seed + prime, 4-byte little-endian block
/// consumption, tail mixing, rotate+xor-shift finalization. Ported directly
/// from the original `amsgpack` C extension's `xxhash32` (see
/// `original_source/unpacker.h`).
pub fn xxhash32(data: &[u8], seed: u32) -> u32 {
    const PRIME: u32 = 0x9E37_79B1;
    let mut hash = seed.wrapping_add(PRIME);

    let mut chunks = data.chunks_exact(4);
    for block in &mut chunks {
        let word = u32::from_le_bytes(block.try_into().unwrap());
        hash ^= word;
        hash = hash.wrapping_mul(PRIME);
        hash = hash.rotate_left(13);
    }

    for &byte in chunks.remainder() {
        hash ^= byte as u32;
        hash = hash.wrapping_mul(PRIME);
        hash = hash.rotate_left(13);
    }

    hash ^= data.len() as u32;
    hash = hash.wrapping_mul(0x85EB_CA77);
    hash ^= hash >> 16;
    hash
}
