//! # hotline-protocol
//!
//! Wire-level building blocks for Hotline clients and tools:
//!
//! - Field codec and field blocks, bit-exact with other implementations
//! - Transaction framing and a Tokio codec
//! - Account records and their credential-safe wire form
//! - Connection handshake, a transaction dispatcher and a minimal client
//!
//! The codec and credential functions are pure and hold no global state;
//! they can be called from any thread. Logging goes through `tracing` and
//! stays silent until the application installs a subscriber.
//!
//! ## Example
//!
//! ```rust
//! use hotline_protocol::{Account, AccessBitmap, Field, FieldBlock, FieldId};
//! use hotline_protocol::core::field_block::DecodeMode;
//!
//! let field = Field::new(FieldId::DATA, &b"hi"[..]).unwrap();
//! assert_eq!(&field.to_bytes()[..], &[0x00, 0x65, 0x00, 0x02, 0x68, 0x69]);
//!
//! let account = Account::new("bob", "Bob", AccessBitmap::default());
//! let block = FieldBlock::from_bytes(&account.to_bytes().unwrap(), DecodeMode::Strict).unwrap();
//! assert_eq!(block.len(), 3);
//! ```

pub mod account;
pub mod config;
pub mod core;
pub mod error;
pub mod protocol;
pub mod service;
pub mod utils;

pub use account::{Account, AccessBitmap, AccountRecord, Credential};
pub use crate::core::codec::TransactionCodec;
pub use crate::core::field::{Field, FieldId};
pub use crate::core::field_block::{DecodeMode, FieldBlock};
pub use crate::core::transaction::{Transaction, TransactionType};
pub use error::{ProtocolError, Result};
