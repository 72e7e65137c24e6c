#![no_main]

use bytes::BytesMut;
use hotline_protocol::core::codec::TransactionCodec;
use libfuzzer_sys::fuzz_target;
use tokio_util::codec::{Decoder, Encoder};

fuzz_target!(|data: &[u8]| {
    let mut codec = TransactionCodec::default();
    let mut buf = BytesMut::from(data);

    // Drain every complete frame; errors are fine, panics are not
    while let Ok(Some(tx)) = codec.decode(&mut buf) {
        let mut out = BytesMut::new();
        let _ = codec.encode(tx, &mut out);
    }
});
