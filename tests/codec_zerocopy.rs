//! Integration tests for zero-copy transaction framing
//!
//! These tests validate that the transaction codec splits frames out of the
//! read buffer without copying field payloads, and that partial input never
//! consumes bytes.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use bytes::{Bytes, BytesMut};
use hotline_protocol::core::codec::TransactionCodec;
use hotline_protocol::core::field::{Field, FieldId};
use hotline_protocol::core::field_block::{DecodeMode, FieldBlock};
use hotline_protocol::core::transaction::{Transaction, TransactionType, TRANSACTION_HEADER_LEN};
use hotline_protocol::error::ProtocolError;
use tokio_util::codec::{Decoder, Encoder};

fn chat(text: &str) -> Transaction {
    Transaction::with_fields(TransactionType::CHAT_SEND, vec![Field::text(FieldId::DATA, text).unwrap()])
        .unwrap()
}

#[test]
fn test_decoded_payload_shares_read_buffer() {
    let mut codec = TransactionCodec::default();
    let bytes = chat("shared payload").to_bytes().unwrap();

    let mut buffer = BytesMut::from(&bytes[..]);
    let start = buffer.as_ptr() as usize;
    let end = start + buffer.len();

    let decoded = codec.decode(&mut buffer).unwrap().expect("complete frame");
    let payload = decoded.field(FieldId::DATA).unwrap().data();
    let at = payload.as_ptr() as usize;

    assert_eq!(&payload[..], b"shared payload");
    assert!(at >= start && at + payload.len() <= end, "payload was copied");
    assert!(buffer.is_empty());
}

#[test]
fn test_partial_header_preserves_buffer() {
    let mut codec = TransactionCodec::default();
    let mut buffer = BytesMut::from(&[0x00, 0x00, 0x00, 0x69, 0x00][..]);

    assert!(codec.decode(&mut buffer).unwrap().is_none());
    assert_eq!(buffer.len(), 5);
}

#[test]
fn test_partial_body_preserves_buffer() {
    let mut codec = TransactionCodec::default();
    let bytes = chat("not yet").to_bytes().unwrap();
    let cut = TRANSACTION_HEADER_LEN + 3;

    let mut buffer = BytesMut::from(&bytes[..cut]);
    assert!(codec.decode(&mut buffer).unwrap().is_none());
    assert_eq!(buffer.len(), cut);
}

#[test]
fn test_back_to_back_frames() {
    let mut codec = TransactionCodec::default();
    let mut buffer = BytesMut::new();
    for text in ["one", "two", "three"] {
        codec.encode(chat(text), &mut buffer).unwrap();
    }

    let mut texts = Vec::new();
    while let Some(tx) = codec.decode(&mut buffer).unwrap() {
        texts.push(tx.field(FieldId::DATA).unwrap().as_str_lossy().into_owned());
    }
    assert_eq!(texts, vec!["one", "two", "three"]);
    assert!(buffer.is_empty());
}

#[test]
fn test_encode_matches_to_bytes() {
    let mut codec = TransactionCodec::default();
    let mut tx = chat("same bytes");
    tx.id = 77;

    let mut buffer = BytesMut::new();
    codec.encode(tx.clone(), &mut buffer).unwrap();
    assert_eq!(buffer.freeze(), tx.to_bytes().unwrap());
}

#[test]
fn test_zero_length_body_is_empty_block() {
    let mut codec = TransactionCodec::default();
    let mut header = [0u8; TRANSACTION_HEADER_LEN];
    header[2..4].copy_from_slice(&500u16.to_be_bytes());

    let mut buffer = BytesMut::from(&header[..]);
    let tx = codec.decode(&mut buffer).unwrap().unwrap();
    assert_eq!(tx.kind, TransactionType::KEEP_ALIVE);
    assert!(tx.fields.is_empty());
}

#[test]
fn test_oversized_body_rejected_before_buffering() {
    let mut codec = TransactionCodec::new(16, DecodeMode::Lenient);
    let mut header = [0u8; TRANSACTION_HEADER_LEN];
    header[12..16].copy_from_slice(&64u32.to_be_bytes());
    header[16..20].copy_from_slice(&64u32.to_be_bytes());

    let mut buffer = BytesMut::from(&header[..]);
    assert!(matches!(
        codec.decode(&mut buffer),
        Err(ProtocolError::OversizedTransaction(64))
    ));
}

#[test]
fn test_oversized_encode_rejected() {
    let mut codec = TransactionCodec::new(8, DecodeMode::Lenient);
    let mut buffer = BytesMut::new();
    assert!(matches!(
        codec.encode(chat("far too long for eight"), &mut buffer),
        Err(ProtocolError::OversizedTransaction(_))
    ));
    assert!(buffer.is_empty());
}

#[test]
fn test_multi_part_framing_rejected() {
    let mut codec = TransactionCodec::default();
    let mut header = [0u8; TRANSACTION_HEADER_LEN];
    header[12..16].copy_from_slice(&100u32.to_be_bytes());
    header[16..20].copy_from_slice(&10u32.to_be_bytes());

    let mut buffer = BytesMut::from(&header[..]);
    assert!(matches!(
        codec.decode(&mut buffer),
        Err(ProtocolError::UnsupportedFraming { total: 100, data: 10 })
    ));
}

#[test]
fn test_strict_codec_rejects_trailing_bytes() {
    let block = FieldBlock::from_fields(vec![Field::from_u16(FieldId::USER_ICON_ID, 414)]).unwrap();
    let mut body = block.to_bytes().unwrap().to_vec();
    body.push(0xEE);

    let tx = Transaction::new(TransactionType::SET_CLIENT_USER_INFO, FieldBlock::new());
    let header = tx.header(body.len()).unwrap().to_bytes();
    let frame = Bytes::from([&header[..], &body[..]].concat());

    let mut strict = TransactionCodec::new(1024, DecodeMode::Strict);
    assert!(matches!(
        strict.decode(&mut BytesMut::from(&frame[..])),
        Err(ProtocolError::TrailingBytes(1))
    ));

    let mut lenient = TransactionCodec::new(1024, DecodeMode::Lenient);
    let decoded = lenient.decode(&mut BytesMut::from(&frame[..])).unwrap().unwrap();
    assert_eq!(decoded.fields, block);
}
