use std::fmt;

use crate::core::field::FieldId;
use crate::error::{ProtocolError, Result};

/// Width of the access bitmap on the wire
pub const ACCESS_BITMAP_LEN: usize = 8;

/// Fixed-width permission bitmap.
///
/// Bits are numbered from the most significant bit of the first byte, the
/// way the protocol documents them. The codec treats the bitmap as opaque
/// bytes; only administrative tooling interprets individual bits.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct AccessBitmap([u8; ACCESS_BITMAP_LEN]);

impl AccessBitmap {
    pub fn new(bytes: [u8; ACCESS_BITMAP_LEN]) -> Self {
        Self(bytes)
    }

    /// Parse the payload of a user-access field
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        bytes
            .try_into()
            .map(Self)
            .map_err(|_| ProtocolError::InvalidFieldValue {
                id: FieldId::USER_ACCESS,
                len: bytes.len(),
            })
    }

    pub fn as_bytes(&self) -> &[u8; ACCESS_BITMAP_LEN] {
        &self.0
    }

    /// Bits past the end of the bitmap read as unset
    pub fn get(&self, bit: usize) -> bool {
        self.0
            .get(bit / 8)
            .is_some_and(|byte| byte & (0x80 >> (bit % 8)) != 0)
    }

    /// Bits past the end of the bitmap are ignored
    pub fn set(&mut self, bit: usize, enabled: bool) {
        if let Some(byte) = self.0.get_mut(bit / 8) {
            let mask = 0x80 >> (bit % 8);
            if enabled {
                *byte |= mask;
            } else {
                *byte &= !mask;
            }
        }
    }
}

impl fmt::Debug for AccessBitmap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccessBitmap(")?;
        for byte in self.0 {
            write!(f, "{byte:08b}")?;
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn test_bit_numbering() {
        let mut access = AccessBitmap::default();
        access.set(0, true);
        access.set(9, true);
        assert_eq!(access.as_bytes(), &[0x80, 0x40, 0, 0, 0, 0, 0, 0]);
        assert!(access.get(0));
        assert!(access.get(9));
        assert!(!access.get(1));

        access.set(0, false);
        assert_eq!(access.as_bytes()[0], 0);
    }

    #[test]
    fn test_out_of_range_bits() {
        let mut access = AccessBitmap::default();
        access.set(64, true);
        assert_eq!(access, AccessBitmap::default());
        assert!(!access.get(1000));
    }

    #[test]
    fn test_from_slice_width() {
        assert!(AccessBitmap::from_slice(&[0xFF; 8]).is_ok());
        assert!(matches!(
            AccessBitmap::from_slice(&[0xFF; 7]),
            Err(ProtocolError::InvalidFieldValue { len: 7, .. })
        ));
    }
}
