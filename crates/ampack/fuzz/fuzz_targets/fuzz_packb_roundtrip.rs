#![no_main]

use ampack::Value;
use libfuzzer_sys::fuzz_target;

/// Build a small `Value` tree out of the fuzz input, then check that
/// `unpackb(packb(v)) == v` holds and neither direction panics.
fuzz_target!(|data: &[u8]| {
    let value = build_value(data, 0);
    let Ok(bytes) = ampack::packb(&value) else {
        return;
    };
    let decoded = ampack::unpackb(&bytes).expect("packb output must decode");
    assert_eq!(decoded, value);
});

fn build_value(data: &[u8], depth: u32) -> Value {
    let Some((&tag, rest)) = data.split_first() else {
        return Value::Nil;
    };
    if depth >= 8 {
        return Value::Int(tag as i64);
    }
    match tag % 6 {
        0 => Value::Nil,
        1 => Value::Bool(tag % 2 == 0),
        2 => Value::Int(tag as i64 - 128),
        3 => Value::Str(String::from_utf8_lossy(&rest[..rest.len().min(8)]).into_owned()),
        4 => {
            let count = (tag as usize % 4).min(rest.len());
            let items = (0..count)
                .map(|i| build_value(&rest[i..], depth + 1))
                .collect();
            Value::Array(items)
        }
        _ => Value::Map(vec![(
            Value::Str("k".to_string()),
            build_value(rest, depth + 1),
        )]),
    }
}
