use bytes::{BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};
use tracing::{debug, warn};

use crate::config::MAX_TRANSACTION_SIZE;
use crate::core::field_block::{DecodeMode, FieldBlock};
use crate::core::transaction::{Transaction, TransactionHeader, TRANSACTION_HEADER_LEN};
use crate::error::{ProtocolError, Result};

/// Frames [`Transaction`]s over a byte stream.
///
/// Decoding waits until a full header and body are buffered, then hands the
/// body to the field-block decoder without copying.
#[derive(Debug, Clone, Copy)]
pub struct TransactionCodec {
    max_body_size: usize,
    mode: DecodeMode,
}

impl Default for TransactionCodec {
    fn default() -> Self {
        Self::new(MAX_TRANSACTION_SIZE, DecodeMode::default())
    }
}

impl TransactionCodec {
    pub fn new(max_body_size: usize, mode: DecodeMode) -> Self {
        Self {
            max_body_size,
            mode,
        }
    }

    pub fn decode_mode(&self) -> DecodeMode {
        self.mode
    }
}

impl Decoder for TransactionCodec {
    type Item = Transaction;
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        if src.len() < TRANSACTION_HEADER_LEN {
            src.reserve(TRANSACTION_HEADER_LEN - src.len());
            return Ok(None);
        }

        let header = TransactionHeader::parse(src)?;
        let body_len = header.body_len()?;
        if body_len > self.max_body_size {
            warn!(body_len, max = self.max_body_size, kind = %header.kind, "Rejecting oversized transaction");
            return Err(ProtocolError::OversizedTransaction(body_len));
        }

        let frame_len = TRANSACTION_HEADER_LEN + body_len;
        if src.len() < frame_len {
            src.reserve(frame_len - src.len());
            return Ok(None);
        }

        let frame = src.split_to(frame_len).freeze();
        let body = frame.slice(TRANSACTION_HEADER_LEN..);
        // Some peers send a zero-length body rather than a zero count
        let fields = if body.is_empty() {
            FieldBlock::new()
        } else {
            FieldBlock::from_shared(&body, self.mode)?
        };

        debug!(kind = %header.kind, id = header.id, fields = fields.len(), "Decoded transaction");
        Ok(Some(Transaction::from_parts(header, fields)))
    }
}

impl Encoder<Transaction> for TransactionCodec {
    type Error = ProtocolError;

    fn encode(&mut self, item: Transaction, dst: &mut BytesMut) -> Result<()> {
        let body = item.fields.to_bytes()?;
        if body.len() > self.max_body_size {
            return Err(ProtocolError::OversizedTransaction(body.len()));
        }
        let header = item.header(body.len())?.to_bytes();

        dst.reserve(header.len() + body.len());
        dst.put_slice(&header);
        dst.put_slice(&body);
        debug!(kind = %item.kind, id = item.id, bytes = header.len() + body.len(), "Encoded transaction");
        Ok(())
    }
}
