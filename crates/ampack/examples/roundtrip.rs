//! Encode a small value, print its wire bytes, then decode it back.
//!
//! ```sh
//! cargo run --example roundtrip
//! ```

use ampack::{packb, unpackb, Value};

fn main() -> Result<(), ampack::Error> {
    tracing_subscriber::fmt::init();

    let value = Value::Map(vec![
        (Value::Str("compact".into()), Value::Bool(true)),
        (Value::Str("schema".into()), Value::Int(0)),
    ]);

    let bytes = packb(&value)?;
    println!("packed {} bytes: {:02x?}", bytes.len(), bytes);

    let decoded = unpackb(&bytes)?;
    assert_eq!(decoded, value);
    println!("round-trip ok: {decoded:?}");

    Ok(())
}
