//! # Wire Codec
//!
//! Pure functions mapping MessagePack header bytes to value-kind tags and
//! back. No I/O and no allocation here beyond what `BufMut` does — this
//! module exists so the packer and unpacker never duplicate the header
//! table in two places.
//!
//! ## Header table
//!
//! ```text
//! 0x00..=0x7f  positive fixint
//! 0xe0..=0xff  negative fixint
//! 0x80..=0x8f  fixmap   (len 0..15)
//! 0x90..=0x9f  fixarray (len 0..15)
//! 0xa0..=0xbf  fixstr   (len 0..31)
//! 0xc0  nil       0xc1  (reserved, hard error)   0xc2  false   0xc3  true
//! 0xc4/0xc5/0xc6  bin 8/16/32
//! 0xc7/0xc8/0xc9  ext 8/16/32
//! 0xca  float32   0xcb  float64
//! 0xcc/0xcd/0xce/0xcf  uint 8/16/32/64
//! 0xd0/0xd1/0xd2/0xd3  int 8/16/32/64
//! 0xd4..=0xd8  fixext 1/2/4/8/16
//! 0xd9/0xda/0xdb  str 8/16/32
//! 0xdc/0xdd  array 16/32
//! 0xde/0xdf  map 16/32
//! ```

use bytes::BufMut;

pub const NIL: u8 = 0xc0;
pub const RESERVED: u8 = 0xc1;
pub const FALSE: u8 = 0xc2;
pub const TRUE: u8 = 0xc3;
pub const BIN8: u8 = 0xc4;
pub const BIN16: u8 = 0xc5;
pub const BIN32: u8 = 0xc6;
pub const EXT8: u8 = 0xc7;
pub const EXT16: u8 = 0xc8;
pub const EXT32: u8 = 0xc9;
pub const FLOAT32: u8 = 0xca;
pub const FLOAT64: u8 = 0xcb;
pub const UINT8: u8 = 0xcc;
pub const UINT16: u8 = 0xcd;
pub const UINT32: u8 = 0xce;
pub const UINT64: u8 = 0xcf;
pub const INT8: u8 = 0xd0;
pub const INT16: u8 = 0xd1;
pub const INT32: u8 = 0xd2;
pub const INT64: u8 = 0xd3;
pub const FIXEXT1: u8 = 0xd4;
pub const FIXEXT2: u8 = 0xd5;
pub const FIXEXT4: u8 = 0xd6;
pub const FIXEXT8: u8 = 0xd7;
pub const FIXEXT16: u8 = 0xd8;
pub const STR8: u8 = 0xd9;
pub const STR16: u8 = 0xda;
pub const STR32: u8 = 0xdb;
pub const ARRAY16: u8 = 0xdc;
pub const ARRAY32: u8 = 0xdd;
pub const MAP16: u8 = 0xde;
pub const MAP32: u8 = 0xdf;

pub const FIXMAP_LOW: u8 = 0x80;
pub const FIXMAP_HIGH: u8 = 0x8f;
pub const FIXARRAY_LOW: u8 = 0x90;
pub const FIXARRAY_HIGH: u8 = 0x9f;
pub const FIXSTR_LOW: u8 = 0xa0;
pub const FIXSTR_HIGH: u8 = 0xbf;
pub const POS_FIXINT_HIGH: u8 = 0x7f;
pub const NEG_FIXINT_LOW: u8 = 0xe0;

/// The decoded shape of a header byte: what follows it on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Header {
    PosFixInt(u8),
    NegFixInt(i8),
    Nil,
    False,
    True,
    Bin { size_bytes: u8 },
    Ext { size_bytes: u8 },
    Float32,
    Float64,
    Uint { width: u8 },
    Int { width: u8 },
    FixExt { len: u8 },
    Str { size_bytes: u8 },
    FixStr { len: u8 },
    FixArray { len: u8 },
    FixMap { len: u8 },
    Array { size_bytes: u8 },
    Map { size_bytes: u8 },
}

impl Header {
    /// Classify a header byte. The only byte that is a hard decode error is
    /// `0xc1`, surfaced by the caller (this function reports it as `None`
    /// so the unpacker can attach its own message).
    pub fn decode(byte: u8) -> Option<Header> {
        Some(match byte {
            0x00..=POS_FIXINT_HIGH => Header::PosFixInt(byte),
            NEG_FIXINT_LOW..=0xff => Header::NegFixInt(byte as i8),
            FIXMAP_LOW..=FIXMAP_HIGH => Header::FixMap {
                len: byte - FIXMAP_LOW,
            },
            FIXARRAY_LOW..=FIXARRAY_HIGH => Header::FixArray {
                len: byte - FIXARRAY_LOW,
            },
            FIXSTR_LOW..=FIXSTR_HIGH => Header::FixStr {
                len: byte - FIXSTR_LOW,
            },
            NIL => Header::Nil,
            RESERVED => return None,
            FALSE => Header::False,
            TRUE => Header::True,
            BIN8 => Header::Bin { size_bytes: 1 },
            BIN16 => Header::Bin { size_bytes: 2 },
            BIN32 => Header::Bin { size_bytes: 4 },
            EXT8 => Header::Ext { size_bytes: 1 },
            EXT16 => Header::Ext { size_bytes: 2 },
            EXT32 => Header::Ext { size_bytes: 4 },
            FLOAT32 => Header::Float32,
            FLOAT64 => Header::Float64,
            UINT8 => Header::Uint { width: 1 },
            UINT16 => Header::Uint { width: 2 },
            UINT32 => Header::Uint { width: 4 },
            UINT64 => Header::Uint { width: 8 },
            INT8 => Header::Int { width: 1 },
            INT16 => Header::Int { width: 2 },
            INT32 => Header::Int { width: 4 },
            INT64 => Header::Int { width: 8 },
            FIXEXT1 => Header::FixExt { len: 1 },
            FIXEXT2 => Header::FixExt { len: 2 },
            FIXEXT4 => Header::FixExt { len: 4 },
            FIXEXT8 => Header::FixExt { len: 8 },
            FIXEXT16 => Header::FixExt { len: 16 },
            STR8 => Header::Str { size_bytes: 1 },
            STR16 => Header::Str { size_bytes: 2 },
            STR32 => Header::Str { size_bytes: 4 },
            ARRAY16 => Header::Array { size_bytes: 2 },
            ARRAY32 => Header::Array { size_bytes: 4 },
            MAP16 => Header::Map { size_bytes: 2 },
            MAP32 => Header::Map { size_bytes: 4 },
        })
    }
}

// ─── Encode helpers (big-endian, explicit byte order) ───────────────────────

#[inline]
pub fn put_u8_tagged(buf: &mut impl BufMut, tag: u8, v: u8) {
    buf.put_u8(tag);
    buf.put_u8(v);
}

#[inline]
pub fn put_u16(buf: &mut impl BufMut, tag: u8, v: u16) {
    buf.put_u8(tag);
    buf.put_slice(&v.to_be_bytes());
}

#[inline]
pub fn put_u32(buf: &mut impl BufMut, tag: u8, v: u32) {
    buf.put_u8(tag);
    buf.put_slice(&v.to_be_bytes());
}

#[inline]
pub fn put_u64(buf: &mut impl BufMut, tag: u8, v: u64) {
    buf.put_u8(tag);
    buf.put_slice(&v.to_be_bytes());
}

#[inline]
pub fn put_f64(buf: &mut impl BufMut, tag: u8, v: f64) {
    buf.put_u8(tag);
    buf.put_slice(&v.to_be_bytes());
}

/// Smallest unsigned width (in bytes: 0 = fixint, 1, 2, 4, 8) that holds `v`.
/// `0` means "no width byte needed, fixint applies".
pub fn uint_width(v: u64) -> u8 {
    if v < 0x80 {
        0
    } else if v <= u8::MAX as u64 {
        1
    } else if v <= u16::MAX as u64 {
        2
    } else if v <= u32::MAX as u64 {
        4
    } else {
        8
    }
}

/// Smallest signed width for a negative value, mirroring [`uint_width`].
/// `0` means "fixint applies" (`v >= -32`).
pub fn neg_int_width(v: i64) -> u8 {
    if v >= -32 {
        0
    } else if v >= i8::MIN as i64 {
        1
    } else if v >= i16::MIN as i64 {
        2
    } else if v >= i32::MIN as i64 {
        4
    } else {
        8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_fixints() {
        assert_eq!(Header::decode(0x00), Some(Header::PosFixInt(0)));
        assert_eq!(Header::decode(0x7f), Some(Header::PosFixInt(0x7f)));
        assert_eq!(Header::decode(0xff), Some(Header::NegFixInt(-1)));
        assert_eq!(Header::decode(0xe0), Some(Header::NegFixInt(-32)));
    }

    #[test]
    fn decode_reserved_is_none() {
        assert_eq!(Header::decode(0xc1), None);
    }

    #[test]
    fn decode_fixcontainers() {
        assert_eq!(Header::decode(0x80), Some(Header::FixMap { len: 0 }));
        assert_eq!(Header::decode(0x8f), Some(Header::FixMap { len: 15 }));
        assert_eq!(Header::decode(0x90), Some(Header::FixArray { len: 0 }));
        assert_eq!(Header::decode(0x9f), Some(Header::FixArray { len: 15 }));
        assert_eq!(Header::decode(0xa0), Some(Header::FixStr { len: 0 }));
        assert_eq!(Header::decode(0xbf), Some(Header::FixStr { len: 31 }));
    }

    #[test]
    fn decode_explicit_widths() {
        assert_eq!(Header::decode(0xcc), Some(Header::Uint { width: 1 }));
        assert_eq!(Header::decode(0xcf), Some(Header::Uint { width: 8 }));
        assert_eq!(Header::decode(0xd3), Some(Header::Int { width: 8 }));
        assert_eq!(Header::decode(0xd7), Some(Header::FixExt { len: 8 }));
    }

    #[test]
    fn uint_width_boundaries() {
        assert_eq!(uint_width(0), 0);
        assert_eq!(uint_width(127), 0);
        assert_eq!(uint_width(128), 1);
        assert_eq!(uint_width(255), 1);
        assert_eq!(uint_width(256), 2);
        assert_eq!(uint_width(u16::MAX as u64), 2);
        assert_eq!(uint_width(u16::MAX as u64 + 1), 4);
        assert_eq!(uint_width(u32::MAX as u64), 4);
        assert_eq!(uint_width(u32::MAX as u64 + 1), 8);
    }

    #[test]
    fn neg_int_width_boundaries() {
        assert_eq!(neg_int_width(-1), 0);
        assert_eq!(neg_int_width(-32), 0);
        assert_eq!(neg_int_width(-33), 1);
        assert_eq!(neg_int_width(i8::MIN as i64), 1);
        assert_eq!(neg_int_width(i8::MIN as i64 - 1), 2);
        assert_eq!(neg_int_width(i16::MIN as i64), 2);
        assert_eq!(neg_int_width(i16::MIN as i64 - 1), 4);
        assert_eq!(neg_int_width(i32::MIN as i64), 4);
        assert_eq!(neg_int_width(i32::MIN as i64 - 1), 8);
    }
}
