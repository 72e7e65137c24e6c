//! # Field Codec
//!
//! A field is the smallest typed unit on the wire:
//!
//! ```text
//! [id: u16][size: u16][data: size bytes]
//! ```
//!
//! All integers are big-endian. The size is always derived from the payload,
//! never stored separately, so a `Field` can not be built with a mismatched
//! size. Field ids are not validated against the registry when decoding;
//! unknown ids pass through untouched.

use bytes::Bytes;
use std::fmt;

use crate::error::{ProtocolError, Result};

/// Length of the `[id][size]` header preceding every field payload
pub const FIELD_HEADER_LEN: usize = 4;

/// Largest payload a 16-bit size can describe
pub const MAX_FIELD_DATA_LEN: usize = u16::MAX as usize;

/// Field type code.
///
/// Open newtype over the wire value. Known codes are available as associated
/// constants and have a name in the registry table; any other value is still a
/// valid id.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldId(pub u16);

macro_rules! field_registry {
    ($($name:ident = $value:literal => $label:literal,)*) => {
        impl FieldId {
            $(pub const $name: FieldId = FieldId($value);)*

            /// Registry name for this id, `None` for codes not in the table
            pub fn name(self) -> Option<&'static str> {
                match self.0 {
                    $($value => Some($label),)*
                    _ => None,
                }
            }
        }
    };
}

field_registry! {
    ERROR = 100 => "Error",
    DATA = 101 => "Data",
    USER_NAME = 102 => "UserName",
    USER_ID = 103 => "UserId",
    USER_ICON_ID = 104 => "UserIconId",
    USER_LOGIN = 105 => "UserLogin",
    USER_PASSWORD = 106 => "UserPassword",
    REF_NUM = 107 => "RefNum",
    TRANSFER_SIZE = 108 => "TransferSize",
    CHAT_OPTIONS = 109 => "ChatOptions",
    USER_ACCESS = 110 => "UserAccess",
    USER_ALIAS = 111 => "UserAlias",
    USER_FLAGS = 112 => "UserFlags",
    OPTIONS = 113 => "Options",
    CHAT_ID = 114 => "ChatId",
    CHAT_SUBJECT = 115 => "ChatSubject",
    WAITING_COUNT = 116 => "WaitingCount",
    VERSION = 160 => "Version",
    COMMUNITY_BANNER_ID = 161 => "CommunityBannerId",
    SERVER_NAME = 162 => "ServerName",
    FILE_NAME_WITH_INFO = 200 => "FileNameWithInfo",
    FILE_NAME = 201 => "FileName",
    FILE_PATH = 202 => "FilePath",
    FILE_TYPE_STRING = 205 => "FileTypeString",
    FILE_CREATOR_STRING = 206 => "FileCreatorString",
    FILE_SIZE = 207 => "FileSize",
    FILE_CREATE_DATE = 208 => "FileCreateDate",
    FILE_MODIFY_DATE = 209 => "FileModifyDate",
    FILE_COMMENT = 210 => "FileComment",
    FILE_NEW_NAME = 211 => "FileNewName",
    FILE_NEW_PATH = 212 => "FileNewPath",
    FILE_TYPE = 213 => "FileType",
    QUOTING_MSG = 214 => "QuotingMsg",
    AUTOMATIC_RESPONSE = 215 => "AutomaticResponse",
    FOLDER_ITEM_COUNT = 220 => "FolderItemCount",
    USERNAME_WITH_INFO = 300 => "UsernameWithInfo",
    NEWS_ART_LIST_DATA = 321 => "NewsArtListData",
    NEWS_CAT_NAME = 322 => "NewsCatName",
    NEWS_CAT_LIST_DATA_15 = 323 => "NewsCatListData15",
    NEWS_PATH = 325 => "NewsPath",
    NEWS_ART_ID = 326 => "NewsArtId",
    NEWS_ART_DATA_FLAV = 327 => "NewsArtDataFlav",
    NEWS_ART_TITLE = 328 => "NewsArtTitle",
    NEWS_ART_POSTER = 329 => "NewsArtPoster",
    NEWS_ART_DATE = 330 => "NewsArtDate",
    NEWS_ART_PREV_ART = 331 => "NewsArtPrevArt",
    NEWS_ART_NEXT_ART = 332 => "NewsArtNextArt",
    NEWS_ART_DATA = 333 => "NewsArtData",
    NEWS_ART_FLAGS = 334 => "NewsArtFlags",
    NEWS_ART_PARENT_ART = 335 => "NewsArtParentArt",
    NEWS_ART_1ST_CHILD_ART = 336 => "NewsArt1stChildArt",
    NEWS_ART_RECURSE_DEL = 337 => "NewsArtRecurseDel",
}

impl From<u16> for FieldId {
    fn from(value: u16) -> Self {
        FieldId(value)
    }
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "Unknown({})", self.0),
        }
    }
}

impl fmt::Debug for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FieldId({}, {})", self.0, self)
    }
}

/// A typed, length-prefixed value
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Field {
    id: FieldId,
    data: Bytes,
}

impl Field {
    /// Build a field, rejecting payloads a 16-bit size can not describe
    pub fn new(id: impl Into<FieldId>, data: impl Into<Bytes>) -> Result<Self> {
        let data = data.into();
        if data.len() > MAX_FIELD_DATA_LEN {
            return Err(ProtocolError::SizeOverflow(data.len()));
        }
        Ok(Self {
            id: id.into(),
            data,
        })
    }

    /// Field holding UTF-8 text verbatim
    pub fn text(id: impl Into<FieldId>, text: &str) -> Result<Self> {
        Self::new(id, Bytes::copy_from_slice(text.as_bytes()))
    }

    /// Two-byte big-endian integer field
    pub fn from_u16(id: impl Into<FieldId>, value: u16) -> Self {
        Self {
            id: id.into(),
            data: Bytes::copy_from_slice(&value.to_be_bytes()),
        }
    }

    /// Four-byte big-endian integer field
    pub fn from_u32(id: impl Into<FieldId>, value: u32) -> Self {
        Self {
            id: id.into(),
            data: Bytes::copy_from_slice(&value.to_be_bytes()),
        }
    }

    pub fn id(&self) -> FieldId {
        self.id
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }

    /// Payload size as written on the wire
    pub fn size(&self) -> u16 {
        // Bounded by the constructors
        self.data.len() as u16
    }

    /// Bytes this field occupies once serialized
    pub fn encoded_len(&self) -> usize {
        FIELD_HEADER_LEN + self.data.len()
    }

    pub fn into_data(self) -> Bytes {
        self.data
    }

    /// The `[id][size]` header
    pub fn header(&self) -> [u8; FIELD_HEADER_LEN] {
        let [id_hi, id_lo] = self.id.0.to_be_bytes();
        let [size_hi, size_lo] = self.size().to_be_bytes();
        [id_hi, id_lo, size_hi, size_lo]
    }

    /// Serialize to `[id][size][data]`
    pub fn to_bytes(&self) -> Bytes {
        Bytes::from([&self.header()[..], &self.data[..]].concat())
    }

    /// Decode one field starting at `offset`.
    ///
    /// Returns the field and the number of bytes it consumed. The payload is
    /// copied out of `input`.
    pub fn from_bytes(input: &[u8], offset: usize) -> Result<(Self, usize)> {
        let remaining = input.get(offset..).unwrap_or_default();
        let (id, consumed) = parse_header(remaining)?;
        let data = Bytes::copy_from_slice(&remaining[FIELD_HEADER_LEN..consumed]);
        Ok((Self { id, data }, consumed))
    }

    /// Zero-copy variant of [`Field::from_bytes`]; the payload shares `input`'s buffer
    pub fn from_shared(input: &Bytes, offset: usize) -> Result<(Self, usize)> {
        let remaining = input.get(offset..).unwrap_or_default();
        let (id, consumed) = parse_header(remaining)?;
        let data = input.slice(offset + FIELD_HEADER_LEN..offset + consumed);
        Ok((Self { id, data }, consumed))
    }

    /// Interpret a 2-byte payload as an integer
    pub fn as_u16(&self) -> Result<u16> {
        match self.data[..] {
            [hi, lo] => Ok(u16::from_be_bytes([hi, lo])),
            _ => Err(self.invalid_value()),
        }
    }

    /// Interpret a 4-byte payload as an integer
    pub fn as_u32(&self) -> Result<u32> {
        match self.data[..] {
            [a, b, c, d] => Ok(u32::from_be_bytes([a, b, c, d])),
            _ => Err(self.invalid_value()),
        }
    }

    /// Integer fields are sent as either 2 or 4 bytes depending on the peer
    pub fn as_integer(&self) -> Result<u32> {
        match self.data.len() {
            2 => self.as_u16().map(u32::from),
            4 => self.as_u32(),
            _ => Err(self.invalid_value()),
        }
    }

    pub fn as_str_lossy(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.data)
    }

    fn invalid_value(&self) -> ProtocolError {
        ProtocolError::InvalidFieldValue {
            id: self.id,
            len: self.data.len(),
        }
    }
}

/// Validate the header at the start of `input` against the bytes available.
/// Returns the id and the total length of the field including its header.
fn parse_header(input: &[u8]) -> Result<(FieldId, usize)> {
    let [id_hi, id_lo, size_hi, size_lo, ..] = *input else {
        return Err(ProtocolError::TruncatedInput {
            needed: FIELD_HEADER_LEN,
            available: input.len(),
        });
    };

    let id = FieldId(u16::from_be_bytes([id_hi, id_lo]));
    let total = FIELD_HEADER_LEN + usize::from(u16::from_be_bytes([size_hi, size_lo]));
    if input.len() < total {
        return Err(ProtocolError::TruncatedInput {
            needed: total,
            available: input.len(),
        });
    }

    Ok((id, total))
}
