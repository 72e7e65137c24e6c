//! # Field-Block Serializer
//!
//! An ordered, counted sequence of fields:
//!
//! ```text
//! [count: u16][Field]*count
//! ```
//!
//! Used as the body of every transaction and as the standalone encoding of an
//! account record. Order is kept exactly as given and duplicate ids are legal.

use bytes::Bytes;
use tracing::{debug, warn};

use crate::core::field::{Field, FieldId};
use crate::error::{ProtocolError, Result};

/// Length of the field count prefix
pub const COUNT_LEN: usize = 2;

/// Most fields a 16-bit count can describe
pub const MAX_FIELD_COUNT: usize = u16::MAX as usize;

/// How to treat bytes left over after the declared number of fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecodeMode {
    /// Reject with [`ProtocolError::TrailingBytes`]
    Strict,
    /// Log a warning and ignore the excess; the transaction header already
    /// bounds the message
    #[default]
    Lenient,
}

/// Serialize `fields` as a counted block, preserving order
pub fn serialize_fields(fields: &[Field]) -> Result<Bytes> {
    let count = u16::try_from(fields.len()).map_err(|_| ProtocolError::CountOverflow(fields.len()))?;

    let serialized: Vec<Bytes> = fields.iter().map(Field::to_bytes).collect();
    let count_bytes = count.to_be_bytes();
    let parts = std::iter::once(&count_bytes[..]).chain(serialized.iter().map(|b| &b[..]));

    let bytes = Bytes::from(parts.collect::<Vec<_>>().concat());
    debug!(fields = fields.len(), bytes = bytes.len(), "Serialized field block");
    Ok(bytes)
}

/// Decode a counted block from `input`, copying field payloads
pub fn deserialize_fields(input: &[u8], mode: DecodeMode) -> Result<Vec<Field>> {
    decode_with(input, mode, Field::from_bytes)
}

fn decode_with<B, F>(input: &B, mode: DecodeMode, decode_field: F) -> Result<Vec<Field>>
where
    B: AsRef<[u8]> + ?Sized,
    F: Fn(&B, usize) -> Result<(Field, usize)>,
{
    let raw = input.as_ref();
    let [count_hi, count_lo, ..] = *raw else {
        return Err(ProtocolError::TruncatedInput {
            needed: COUNT_LEN,
            available: raw.len(),
        });
    };
    let count = usize::from(u16::from_be_bytes([count_hi, count_lo]));

    // Every field needs at least its header, so never trust the count for capacity
    let mut fields = Vec::with_capacity(count.min(raw.len() / 4));
    let mut offset = COUNT_LEN;
    for _ in 0..count {
        let (field, consumed) = decode_field(input, offset)?;
        offset += consumed;
        fields.push(field);
    }

    let trailing = raw.len() - offset;
    if trailing > 0 {
        match mode {
            DecodeMode::Strict => return Err(ProtocolError::TrailingBytes(trailing)),
            DecodeMode::Lenient => {
                warn!(trailing, count, "Ignoring trailing bytes after field block")
            }
        }
    }

    Ok(fields)
}

/// Owned, ordered field sequence whose length always fits the wire count
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldBlock {
    fields: Vec<Field>,
}

impl FieldBlock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_fields(fields: Vec<Field>) -> Result<Self> {
        if fields.len() > MAX_FIELD_COUNT {
            return Err(ProtocolError::CountOverflow(fields.len()));
        }
        Ok(Self { fields })
    }

    /// Append a field, failing once the block is full
    pub fn push(&mut self, field: Field) -> Result<()> {
        if self.fields.len() >= MAX_FIELD_COUNT {
            return Err(ProtocolError::CountOverflow(self.fields.len() + 1));
        }
        self.fields.push(field);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Field> {
        self.fields.iter()
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn into_fields(self) -> Vec<Field> {
        self.fields
    }

    /// First field carrying `id`
    pub fn get(&self, id: FieldId) -> Option<&Field> {
        self.fields.iter().find(|f| f.id() == id)
    }

    /// Every field carrying `id`, in wire order
    pub fn get_all(&self, id: FieldId) -> impl Iterator<Item = &Field> + '_ {
        self.fields.iter().filter(move |f| f.id() == id)
    }

    /// Bytes this block occupies once serialized
    pub fn encoded_len(&self) -> usize {
        COUNT_LEN + self.fields.iter().map(Field::encoded_len).sum::<usize>()
    }

    pub fn to_bytes(&self) -> Result<Bytes> {
        serialize_fields(&self.fields)
    }

    pub fn from_bytes(input: &[u8], mode: DecodeMode) -> Result<Self> {
        deserialize_fields(input, mode).map(|fields| Self { fields })
    }

    /// Decode without copying payloads; fields share `input`'s buffer
    pub fn from_shared(input: &Bytes, mode: DecodeMode) -> Result<Self> {
        decode_with(input, mode, Field::from_shared).map(|fields| Self { fields })
    }
}

impl<'a> IntoIterator for &'a FieldBlock {
    type Item = &'a Field;
    type IntoIter = std::slice::Iter<'a, Field>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

impl IntoIterator for FieldBlock {
    type Item = Field;
    type IntoIter = std::vec::IntoIter<Field>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}
