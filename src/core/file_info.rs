//! `FileNameWithInfo` payload carried in field 200 of file listings.
//!
//! ```text
//! [type 4][creator 4][file size u32][reserved 4][name script 2][name size u16][name]
//! ```

use bytes::Bytes;

use crate::core::field::{Field, FieldId};
use crate::error::{ProtocolError, Result};

const FIXED_LEN: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileNameWithInfo {
    /// Four-character file type code, e.g. `TEXT` or `fldr`
    pub file_type: [u8; 4],
    pub creator: [u8; 4],
    pub file_size: u32,
    pub name_script: [u8; 2],
    pub name: Bytes,
}

impl FileNameWithInfo {
    pub fn to_bytes(&self) -> Result<Bytes> {
        let name_len = u16::try_from(self.name.len()).map_err(|_| ProtocolError::SizeOverflow(self.name.len()))?;
        let parts: [&[u8]; 7] = [
            &self.file_type,
            &self.creator,
            &self.file_size.to_be_bytes(),
            &[0, 0, 0, 0],
            &self.name_script,
            &name_len.to_be_bytes(),
            &self.name[..],
        ];
        Ok(Bytes::from(parts.concat()))
    }

    pub fn from_bytes(input: &[u8]) -> Result<Self> {
        let truncated = |needed| ProtocolError::TruncatedInput {
            needed,
            available: input.len(),
        };
        let fixed: &[u8; FIXED_LEN] = input
            .get(..FIXED_LEN)
            .and_then(|f| f.try_into().ok())
            .ok_or_else(|| truncated(FIXED_LEN))?;

        let name_len = usize::from(u16::from_be_bytes([fixed[18], fixed[19]]));
        let name = input
            .get(FIXED_LEN..FIXED_LEN + name_len)
            .ok_or_else(|| truncated(FIXED_LEN + name_len))?;

        Ok(Self {
            file_type: [fixed[0], fixed[1], fixed[2], fixed[3]],
            creator: [fixed[4], fixed[5], fixed[6], fixed[7]],
            file_size: u32::from_be_bytes([fixed[8], fixed[9], fixed[10], fixed[11]]),
            name_script: [fixed[16], fixed[17]],
            name: Bytes::copy_from_slice(name),
        })
    }

    pub fn to_field(&self) -> Result<Field> {
        Field::new(FieldId::FILE_NAME_WITH_INFO, self.to_bytes()?)
    }

    pub fn from_field(field: &Field) -> Result<Self> {
        if field.id() != FieldId::FILE_NAME_WITH_INFO {
            return Err(ProtocolError::InvalidFieldValue {
                id: field.id(),
                len: field.data().len(),
            });
        }
        Self::from_bytes(field.data())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    fn readme() -> FileNameWithInfo {
        FileNameWithInfo {
            file_type: *b"TEXT",
            creator: *b"ttxt",
            file_size: 1234,
            name_script: [0, 0],
            name: Bytes::from_static(b"README"),
        }
    }

    #[test]
    fn test_layout() {
        let bytes = readme().to_bytes().unwrap();
        assert_eq!(bytes.len(), 26);
        assert_eq!(&bytes[..4], b"TEXT");
        assert_eq!(&bytes[8..12], &1234u32.to_be_bytes());
        assert_eq!(&bytes[12..16], &[0, 0, 0, 0]);
        assert_eq!(&bytes[18..20], &[0x00, 0x06]);
        assert_eq!(&bytes[20..], b"README");
    }

    #[test]
    fn test_through_field() {
        let field = readme().to_field().unwrap();
        assert_eq!(FileNameWithInfo::from_field(&field).unwrap(), readme());
    }

    #[test]
    fn test_short_name_rejected() {
        let bytes = readme().to_bytes().unwrap();
        assert!(matches!(
            FileNameWithInfo::from_bytes(&bytes[..24]),
            Err(ProtocolError::TruncatedInput {
                needed: 26,
                available: 24
            })
        ));
    }
}
