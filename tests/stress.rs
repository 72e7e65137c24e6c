#![allow(clippy::unwrap_used)]

use bytes::BytesMut;
use hotline_protocol::core::codec::TransactionCodec;
use hotline_protocol::core::field::{Field, FieldId};
use hotline_protocol::core::field_block::{DecodeMode, FieldBlock};
use hotline_protocol::core::transaction::{Transaction, TransactionType};
use tokio_util::codec::{Decoder, Encoder};

#[test]
fn stress_transaction_encode_decode_large_series() {
    // Burst of transactions through one buffer; nothing may leak between frames
    let mut codec = TransactionCodec::new(16 * 1024 * 1024, DecodeMode::Strict);
    let mut buf = BytesMut::new();

    for size in [0usize, 1, 64, 512, 4096, 65535] {
        for i in 0..500u32 {
            let mut tx = Transaction::with_fields(
                TransactionType::SEND_INSTANT_MSG,
                vec![
                    Field::from_u32(FieldId::USER_ID, i),
                    Field::new(FieldId::DATA, vec![0u8; size]).unwrap(),
                ],
            )
            .unwrap();
            tx.id = i;
            codec.encode(tx, &mut buf).unwrap();
        }
        for i in 0..500u32 {
            let decoded = codec.decode(&mut buf).unwrap().unwrap();
            assert_eq!(decoded.id, i);
            assert_eq!(decoded.field(FieldId::DATA).unwrap().data().len(), size);
        }
        assert!(buf.is_empty());
    }
}

#[test]
fn stress_wide_field_block() {
    let fields: Vec<Field> = (0..20_000u32)
        .map(|i| Field::from_u16(FieldId::USER_ICON_ID, i as u16))
        .collect();
    let block = FieldBlock::from_fields(fields).unwrap();

    let bytes = block.to_bytes().unwrap();
    assert_eq!(bytes.len(), block.encoded_len());

    let decoded = FieldBlock::from_bytes(&bytes, DecodeMode::Strict).unwrap();
    assert_eq!(decoded.get_all(FieldId::USER_ICON_ID).count(), 20_000);
    assert_eq!(decoded, block);
}
