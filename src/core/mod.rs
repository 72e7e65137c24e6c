//! # Core Protocol Components
//!
//! Field codec, field blocks and transaction framing.
//!
//! ## Components
//! - **Field**: typed, length-prefixed value and the field id registry
//! - **FieldBlock**: counted, ordered sequence of fields
//! - **Transaction**: 20-byte header wrapping one field block
//! - **Codec**: Tokio codec for framing transactions over byte streams
//! - **FileInfo**: the `FileNameWithInfo` field payload
//!
//! ## Wire Format
//! ```text
//! Field:       [id u16][size u16][data]
//! FieldBlock:  [count u16][Field]*count
//! Transaction: [flags u8][is_reply u8][type u16][id u32][error u32][total u32][size u32][FieldBlock]
//! ```
//!
//! Every integer is big-endian.

pub mod codec;
pub mod field;
pub mod field_block;
pub mod file_info;
pub mod transaction;
