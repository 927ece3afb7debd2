//! End-to-end byte-level scenarios, independent of the inline unit tests.

use ampack::{packb, unpackb, Ext, Limits, Timestamp, Unpacker, Value};
use bytes::Bytes;

#[test]
fn packb_compact_schema_map() {
    let value = Value::Map(vec![
        (Value::Str("compact".into()), Value::Bool(true)),
        (Value::Str("schema".into()), Value::Int(0)),
    ]);
    let bytes = packb(&value).unwrap();
    assert_eq!(
        bytes,
        vec![
            0x82, 0xa7, b'c', b'o', b'm', b'p', b'a', b'c', b't', 0xc3, 0xa6, b's', b'c', b'h',
            b'e', b'm', b'a', 0x00,
        ]
    );
}

#[test]
fn unpackb_fixstr_hello() {
    let bytes = [0xa5, 0x68, 0x65, 0x6c, 0x6c, 0x6f];
    assert_eq!(unpackb(&bytes).unwrap(), Value::Str("hello".into()));
}

#[test]
fn array_decodes_across_chunk_boundaries() {
    let mut unpacker = Unpacker::new();
    unpacker.feed(Bytes::from_static(&[0x93, 0x01]));
    assert_eq!(unpacker.next_value().unwrap(), None);
    unpacker.feed(Bytes::from_static(&[0x02, 0x03]));
    assert_eq!(
        unpacker.next_value().unwrap(),
        Some(Value::Array(vec![Value::Int(1), Value::Int(2), Value::Int(3)]))
    );
}

#[test]
fn reserved_byte_0xc1_is_rejected() {
    assert!(unpackb(&[0xc1]).is_err());
}

#[test]
fn fixext8_timestamp_decodes() {
    let bytes = [0xd7, 0xff, 0x00, 0x00, 0x00, 0x00, 0x68, 0x7b, 0xfb, 0x10];
    let value = unpackb(&bytes).unwrap();
    assert_eq!(value, Value::Timestamp(Timestamp::new(1_752_955_664, 0)));
}

#[test]
fn tuple_mode_decodes_arrays_the_same_way() {
    let mut unpacker = Unpacker::new().with_tuple(true);
    unpacker.feed(Bytes::from_static(&[0x92, 0x01, 0x02]));
    assert_eq!(
        unpacker.next_value().unwrap(),
        Some(Value::Array(vec![Value::Int(1), Value::Int(2)]))
    );
}

#[test]
fn packb_fixext1_ext_value() {
    let ext = Ext::new(1, Bytes::from_static(&[0xaa, 0xbb]));
    let bytes = packb(&Value::Ext(ext)).unwrap();
    assert_eq!(bytes, vec![0xd5, 0x01, 0xaa, 0xbb]);
}

#[test]
fn extra_data_after_a_complete_value_is_an_error() {
    let mut bytes = packb(&Value::Int(1)).unwrap();
    bytes.push(0x02);
    let err = unpackb(&bytes).unwrap_err();
    assert_eq!(err.to_string(), "Extra data");
}

#[test]
fn incomplete_stream_is_an_error() {
    let err = unpackb(&[0x93, 0x01]).unwrap_err();
    assert_eq!(err.to_string(), "Incomplete MessagePack format");
}

#[test]
fn custom_limits_reject_oversized_arrays() {
    let limits = Limits {
        max_array_len: 2,
        ..Limits::default()
    };
    let mut unpacker = Unpacker::new().with_limits(limits);
    // fixarray of length 3 (0x93), oversized against the custom limit
    unpacker.feed(Bytes::from_static(&[0x93, 0x01, 0x02, 0x03]));
    assert!(unpacker.next_value().is_err());
}

#[test]
fn ext_hook_overrides_default_timestamp_policy() {
    let mut unpacker = Unpacker::new().with_ext_hook(|ext| Value::Ext(ext));
    unpacker.feed(Bytes::from_static(&[
        0xd7, 0xff, 0x00, 0x00, 0x00, 0x00, 0x68, 0x7b, 0xfb, 0x10,
    ]));
    let value = unpacker.next_value().unwrap().unwrap();
    assert!(matches!(value, Value::Ext(_)));
}

#[test]
fn nested_value_round_trips_through_packb_unpackb() {
    let value = Value::Array(vec![
        Value::Map(vec![(Value::Str("k".into()), Value::UInt(u64::MAX))]),
        Value::Bin(Bytes::from_static(b"\x00\x01\x02")),
        Value::Float64(1.5),
        Value::Nil,
    ]);
    let bytes = packb(&value).unwrap();
    assert_eq!(unpackb(&bytes).unwrap(), value);
}
