#![no_main]

use bytes::Bytes;
use hotline_protocol::core::field_block::{DecodeMode, FieldBlock};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let strict = FieldBlock::from_bytes(data, DecodeMode::Strict);
    let lenient = FieldBlock::from_bytes(data, DecodeMode::Lenient);

    // Copying and zero-copy decoding must agree
    let shared = FieldBlock::from_shared(&Bytes::copy_from_slice(data), DecodeMode::Lenient);
    assert_eq!(lenient.as_ref().ok(), shared.as_ref().ok());

    // Anything strict accepts re-encodes to the same bytes
    if let Ok(block) = strict {
        let encoded = block.to_bytes().expect("decoded block always fits");
        assert_eq!(&encoded[..], data);
    }
});
