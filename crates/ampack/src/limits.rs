//! # Decode Size Guards
//!
//! The distilled limits are implementation-chosen defaults, not part of the
//! wire format — exposed here as a plain `Copy` struct so embedders can raise
//! or lower them instead of forking the decoder. See `DESIGN.md` for the
//! resolved "dict length bound" open question.

/// Bounds enforced by [`crate::Unpacker`] while decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Limits {
    /// Maximum byte length of a `Str` or `Bin` payload.
    pub max_bytes_len: usize,
    /// Maximum byte length of an `Ext` payload.
    pub max_ext_len: usize,
    /// Maximum element count of an `Array`.
    pub max_array_len: usize,
    /// Maximum entry count of a `Map`.
    pub max_map_len: usize,
    /// Maximum container nesting depth (shared by packer and unpacker).
    pub max_depth: usize,
}

/// 128 MiB.
pub const DEFAULT_MAX_BYTES_LEN: usize = 128 * 1024 * 1024;
/// 128 MiB - 1 (ext length prefix is biased by one `fixext` byte layout quirk
/// in the original implementation; kept for wire compatibility).
pub const DEFAULT_MAX_EXT_LEN: usize = 128 * 1024 * 1024 - 1;
/// 10,000,000 elements.
pub const DEFAULT_MAX_ARRAY_LEN: usize = 10_000_000;
/// 100,000 entries.
pub const DEFAULT_MAX_MAP_LEN: usize = 100_000;
/// 32 frames.
pub const DEFAULT_MAX_DEPTH: usize = 32;

impl Default for Limits {
    fn default() -> Self {
        Limits {
            max_bytes_len: DEFAULT_MAX_BYTES_LEN,
            max_ext_len: DEFAULT_MAX_EXT_LEN,
            max_array_len: DEFAULT_MAX_ARRAY_LEN,
            max_map_len: DEFAULT_MAX_MAP_LEN,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec() {
        let l = Limits::default();
        assert_eq!(l.max_bytes_len, 128 * 1024 * 1024);
        assert_eq!(l.max_array_len, 10_000_000);
        assert_eq!(l.max_map_len, 100_000);
        assert_eq!(l.max_depth, 32);
    }
}
