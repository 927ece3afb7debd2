#![no_main]

use ampack::Unpacker;
use libfuzzer_sys::fuzz_target;

/// Fuzz the streaming decoder fed one byte at a time. Exercises the
/// suspend/resume path on every possible chunk boundary of the input.
///
/// Must never panic, and must decode the same values a one-shot feed of the
/// whole input would.
fuzz_target!(|data: &[u8]| {
    let mut incremental = Unpacker::new();
    let mut incremental_values = Vec::new();
    for &byte in data {
        incremental.feed(vec![byte]);
        while let Ok(Some(v)) = incremental.next_value() {
            incremental_values.push(v);
        }
    }

    let mut whole = Unpacker::new();
    whole.feed(data.to_vec());
    let mut whole_values = Vec::new();
    while let Ok(Some(v)) = whole.next_value() {
        whole_values.push(v);
    }

    assert_eq!(incremental_values, whole_values);
});
