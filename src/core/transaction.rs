//! # Transactions
//!
//! Session-level framing around a single field block.
//!
//! ```text
//! [flags u8][is_reply u8][type u16][id u32][error_code u32][total_size u32][data_size u32][field block]
//! ```
//!
//! The body is always exactly one field block. Multi-part transactions
//! (`total_size != data_size`) are not reassembled here.

use bytes::Bytes;
use std::fmt;
use tracing::warn;

use crate::core::field::{Field, FieldId};
use crate::core::field_block::{DecodeMode, FieldBlock};
use crate::error::{ProtocolError, Result};

/// Length of the fixed transaction header
pub const TRANSACTION_HEADER_LEN: usize = 20;

/// Transaction type code.
///
/// Like [`FieldId`], an open newtype: only a representative subset of the
/// registry is named, other codes frame and dispatch the same way.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransactionType(pub u16);

macro_rules! transaction_registry {
    ($($name:ident = $value:literal => $label:literal,)*) => {
        impl TransactionType {
            $(pub const $name: TransactionType = TransactionType($value);)*

            pub fn name(self) -> Option<&'static str> {
                match self.0 {
                    $($value => Some($label),)*
                    _ => None,
                }
            }
        }
    };
}

transaction_registry! {
    ERROR = 100 => "Error",
    GET_MSGS = 101 => "GetMsgs",
    NEW_MSG = 102 => "NewMsg",
    OLD_POST_NEWS = 103 => "OldPostNews",
    SERVER_MSG = 104 => "ServerMsg",
    CHAT_SEND = 105 => "ChatSend",
    CHAT_MSG = 106 => "ChatMsg",
    LOGIN = 107 => "Login",
    SEND_INSTANT_MSG = 108 => "SendInstantMsg",
    SHOW_AGREEMENT = 109 => "ShowAgreement",
    DISCONNECT_USER = 110 => "DisconnectUser",
    AGREED = 121 => "Agreed",
    GET_USER_NAME_LIST = 300 => "GetUserNameList",
    NOTIFY_CHANGE_USER = 301 => "NotifyChangeUser",
    NOTIFY_DELETE_USER = 302 => "NotifyDeleteUser",
    GET_CLIENT_INFO_TEXT = 303 => "GetClientInfoText",
    SET_CLIENT_USER_INFO = 304 => "SetClientUserInfo",
    NEW_USER = 350 => "NewUser",
    DELETE_USER = 351 => "DeleteUser",
    GET_USER = 352 => "GetUser",
    SET_USER = 353 => "SetUser",
    USER_ACCESS = 354 => "UserAccess",
    USER_BROADCAST = 355 => "UserBroadcast",
    KEEP_ALIVE = 500 => "KeepAlive",
}

impl From<u16> for TransactionType {
    fn from(value: u16) -> Self {
        TransactionType(value)
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "Unknown({})", self.0),
        }
    }
}

impl fmt::Debug for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TransactionType({}, {})", self.0, self)
    }
}

/// Decoded fixed-size transaction header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransactionHeader {
    pub flags: u8,
    pub is_reply: bool,
    pub kind: TransactionType,
    pub id: u32,
    pub error_code: u32,
    pub total_size: u32,
    pub data_size: u32,
}

impl TransactionHeader {
    /// Parse the header from the first 20 bytes of `input`
    pub fn parse(input: &[u8]) -> Result<Self> {
        let header: &[u8; TRANSACTION_HEADER_LEN] = input
            .get(..TRANSACTION_HEADER_LEN)
            .and_then(|h| h.try_into().ok())
            .ok_or(ProtocolError::TruncatedInput {
                needed: TRANSACTION_HEADER_LEN,
                available: input.len(),
            })?;

        let be_u32 = |at: usize| u32::from_be_bytes([header[at], header[at + 1], header[at + 2], header[at + 3]]);

        Ok(Self {
            flags: header[0],
            is_reply: header[1] != 0,
            kind: TransactionType(u16::from_be_bytes([header[2], header[3]])),
            id: be_u32(4),
            error_code: be_u32(8),
            total_size: be_u32(12),
            data_size: be_u32(16),
        })
    }

    pub fn to_bytes(&self) -> [u8; TRANSACTION_HEADER_LEN] {
        let parts: [&[u8]; 7] = [
            &[self.flags],
            &[u8::from(self.is_reply)],
            &self.kind.0.to_be_bytes(),
            &self.id.to_be_bytes(),
            &self.error_code.to_be_bytes(),
            &self.total_size.to_be_bytes(),
            &self.data_size.to_be_bytes(),
        ];
        let mut out = [0u8; TRANSACTION_HEADER_LEN];
        out.copy_from_slice(&parts.concat());
        out
    }

    /// Body length, rejecting multi-part framing
    pub fn body_len(&self) -> Result<usize> {
        if self.total_size != self.data_size {
            return Err(ProtocolError::UnsupportedFraming {
                total: self.total_size,
                data: self.data_size,
            });
        }
        Ok(self.data_size as usize)
    }
}

/// One protocol message: header metadata plus exactly one field block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub flags: u8,
    pub is_reply: bool,
    pub kind: TransactionType,
    pub id: u32,
    pub error_code: u32,
    pub fields: FieldBlock,
}

impl Transaction {
    /// New request with id 0; the session assigns ids when sending
    pub fn new(kind: impl Into<TransactionType>, fields: FieldBlock) -> Self {
        Self {
            flags: 0,
            is_reply: false,
            kind: kind.into(),
            id: 0,
            error_code: 0,
            fields,
        }
    }

    /// Build a request from a list of fields
    pub fn with_fields(kind: impl Into<TransactionType>, fields: Vec<Field>) -> Result<Self> {
        Ok(Self::new(kind, FieldBlock::from_fields(fields)?))
    }

    /// Reply to `self`, echoing its type and id
    pub fn reply(&self, fields: FieldBlock) -> Self {
        Self {
            flags: 0,
            is_reply: true,
            kind: self.kind,
            id: self.id,
            error_code: 0,
            fields,
        }
    }

    /// Error reply carrying a human-readable message in the error field
    pub fn error_reply(&self, error_code: u32, message: &str) -> Result<Self> {
        let fields = FieldBlock::from_fields(vec![Field::text(FieldId::ERROR, message)?])?;
        Ok(Self {
            error_code,
            ..self.reply(fields)
        })
    }

    pub fn field(&self, id: FieldId) -> Option<&Field> {
        self.fields.get(id)
    }

    /// Header describing this transaction once its body is `body_len` bytes
    pub fn header(&self, body_len: usize) -> Result<TransactionHeader> {
        let size = u32::try_from(body_len).map_err(|_| ProtocolError::OversizedTransaction(body_len))?;
        Ok(TransactionHeader {
            flags: self.flags,
            is_reply: self.is_reply,
            kind: self.kind,
            id: self.id,
            error_code: self.error_code,
            total_size: size,
            data_size: size,
        })
    }

    pub fn to_bytes(&self) -> Result<Bytes> {
        let body = self.fields.to_bytes()?;
        let header = self.header(body.len())?.to_bytes();
        Ok(Bytes::from([&header[..], &body[..]].concat()))
    }

    /// Decode a complete transaction. `input` must hold exactly one message;
    /// bytes past the declared body are [`ProtocolError::TrailingBytes`] in
    /// strict mode and ignored with a warning in lenient mode.
    pub fn from_bytes(input: &[u8], mode: DecodeMode) -> Result<Self> {
        let header = TransactionHeader::parse(input)?;
        let body_len = header.body_len()?;
        let body = &input[TRANSACTION_HEADER_LEN..];
        if body.len() < body_len {
            return Err(ProtocolError::TruncatedInput {
                needed: TRANSACTION_HEADER_LEN + body_len,
                available: input.len(),
            });
        }

        let trailing = body.len() - body_len;
        if trailing > 0 {
            match mode {
                DecodeMode::Strict => return Err(ProtocolError::TrailingBytes(trailing)),
                DecodeMode::Lenient => {
                    warn!(trailing, kind = %header.kind, "Ignoring bytes after transaction body")
                }
            }
        }
        let fields = decode_body(&body[..body_len], mode)?;
        Ok(Self::from_parts(header, fields))
    }

    pub(crate) fn from_parts(header: TransactionHeader, fields: FieldBlock) -> Self {
        Self {
            flags: header.flags,
            is_reply: header.is_reply,
            kind: header.kind,
            id: header.id,
            error_code: header.error_code,
            fields,
        }
    }
}

/// Some peers send a zero-length body rather than a zero count
fn decode_body(body: &[u8], mode: DecodeMode) -> Result<FieldBlock> {
    if body.is_empty() {
        return Ok(FieldBlock::new());
    }
    FieldBlock::from_bytes(body, mode)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    #[test]
    fn test_chat_send_layout() {
        let mut tx = Transaction::with_fields(
            TransactionType::CHAT_SEND,
            vec![Field::text(FieldId::DATA, "hi").unwrap()],
        )
        .unwrap();
        tx.id = 3;

        let bytes = tx.to_bytes().unwrap();
        assert_eq!(
            &bytes[..],
            &[
                0x00, 0x00, // flags, is_reply
                0x00, 0x69, // type 105
                0x00, 0x00, 0x00, 0x03, // id
                0x00, 0x00, 0x00, 0x00, // error code
                0x00, 0x00, 0x00, 0x08, // total size
                0x00, 0x00, 0x00, 0x08, // data size
                0x00, 0x01, 0x00, 0x65, 0x00, 0x02, 0x68, 0x69,
            ]
        );
        assert_eq!(Transaction::from_bytes(&bytes, DecodeMode::Strict).unwrap(), tx);
    }

    #[test]
    fn test_reply_echoes_request() {
        let mut request = Transaction::new(TransactionType::GET_USER, FieldBlock::new());
        request.id = 42;
        let reply = request.reply(FieldBlock::new());
        assert!(reply.is_reply);
        assert_eq!(reply.id, 42);
        assert_eq!(reply.kind, TransactionType::GET_USER);

        let err = request.error_reply(1, "no such account").unwrap();
        assert_eq!(err.error_code, 1);
        assert_eq!(&err.field(FieldId::ERROR).unwrap().data()[..], b"no such account");
    }

    #[test]
    fn test_zero_length_body() {
        let header = TransactionHeader {
            flags: 0,
            is_reply: true,
            kind: TransactionType::KEEP_ALIVE,
            id: 9,
            error_code: 0,
            total_size: 0,
            data_size: 0,
        };
        let tx = Transaction::from_bytes(&header.to_bytes(), DecodeMode::Strict).unwrap();
        assert!(tx.fields.is_empty());
        assert!(tx.is_reply);
    }

    #[test]
    fn test_multi_part_rejected() {
        let header = TransactionHeader {
            flags: 0,
            is_reply: false,
            kind: TransactionType::NEW_MSG,
            id: 1,
            error_code: 0,
            total_size: 100,
            data_size: 50,
        };
        assert!(matches!(
            header.body_len(),
            Err(ProtocolError::UnsupportedFraming {
                total: 100,
                data: 50
            })
        ));
    }

    #[test]
    fn test_truncated_body() {
        let tx = Transaction::with_fields(
            TransactionType::CHAT_SEND,
            vec![Field::text(FieldId::DATA, "hello").unwrap()],
        )
        .unwrap();
        let bytes = tx.to_bytes().unwrap();
        let result = Transaction::from_bytes(&bytes[..bytes.len() - 1], DecodeMode::Lenient);
        assert!(matches!(result, Err(ProtocolError::TruncatedInput { .. })));
    }

    #[test]
    fn test_unknown_type_round_trips() {
        let tx = Transaction::new(TransactionType(0x7777), FieldBlock::new());
        let decoded = Transaction::from_bytes(&tx.to_bytes().unwrap(), DecodeMode::Strict).unwrap();
        assert_eq!(decoded.kind.0, 0x7777);
        assert_eq!(decoded.kind.name(), None);
    }

    #[test]
    fn test_bytes_after_message() {
        let tx = Transaction::with_fields(
            TransactionType::CHAT_SEND,
            vec![Field::text(FieldId::DATA, "hi").unwrap()],
        )
        .unwrap();
        let mut bytes = tx.to_bytes().unwrap().to_vec();
        bytes.extend_from_slice(&[0x00, 0x00, 0x01]);

        assert!(matches!(
            Transaction::from_bytes(&bytes, DecodeMode::Strict),
            Err(ProtocolError::TrailingBytes(3))
        ));
        assert_eq!(Transaction::from_bytes(&bytes, DecodeMode::Lenient).unwrap(), tx);
    }
}
