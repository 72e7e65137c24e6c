use bytes::BytesMut;
use criterion::{criterion_group, criterion_main, BatchSize, Criterion, Throughput};
use hotline_protocol::core::codec::TransactionCodec;
use hotline_protocol::core::field::{Field, FieldId};
use hotline_protocol::core::transaction::{Transaction, TransactionType};
use tokio_util::codec::{Decoder, Encoder};

#[allow(clippy::unwrap_used)]
fn chat(size: usize) -> Transaction {
    Transaction::with_fields(
        TransactionType::CHAT_SEND,
        vec![Field::new(FieldId::DATA, vec![b'a'; size]).unwrap()],
    )
    .unwrap()
}

#[allow(clippy::unwrap_used)]
fn bench_transaction_encode_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("transaction_encode_decode");
    let payload_sizes = [64usize, 512, 4096, 65535];

    for &size in &payload_sizes {
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_function(format!("encode_{size}b"), |b| {
            b.iter_batched(
                || chat(size),
                |tx| {
                    let mut buf = BytesMut::with_capacity(size + 32);
                    let mut codec = TransactionCodec::default();
                    codec.encode(tx, &mut buf).unwrap();
                },
                BatchSize::SmallInput,
            )
        });

        let mut encoded = BytesMut::new();
        TransactionCodec::default().encode(chat(size), &mut encoded).unwrap();
        let encoded = encoded.freeze();

        group.bench_function(format!("decode_{size}b"), |b| {
            b.iter_batched(
                || BytesMut::from(&encoded[..]),
                |mut buf| {
                    let mut codec = TransactionCodec::default();
                    assert!(codec.decode(&mut buf).unwrap().is_some());
                },
                BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

criterion_group!(benches, bench_transaction_encode_decode);
criterion_main!(benches);
