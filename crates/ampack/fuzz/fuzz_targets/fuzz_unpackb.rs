#![no_main]

use libfuzzer_sys::fuzz_target;

/// Fuzz the one-shot decode facade. Must never panic regardless of input;
/// an `Err` is an expected outcome for most byte strings.
fuzz_target!(|data: &[u8]| {
    let _ = ampack::unpackb(data);
});
