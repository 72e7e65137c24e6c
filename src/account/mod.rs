//! # Accounts
//!
//! User identity records and their wire representation.
//!
//! The account record of truth lives with whoever stores accounts. What goes
//! on the wire is a derived field block, built on demand:
//!
//! 1. user name, raw bytes
//! 2. user login, obfuscated with [`obfuscate`]
//! 3. user access bitmap, verbatim
//! 4. user password, a single `x` byte, present only when a password is set
//!
//! Neither the hash nor any plaintext is ever sent.

pub mod access;
pub mod credential;

use bytes::Bytes;
use tracing::debug;

use crate::core::field::{Field, FieldId};
use crate::core::field_block::FieldBlock;
use crate::error::{ProtocolError, Result};

pub use access::{AccessBitmap, ACCESS_BITMAP_LEN};
pub use credential::{hash_password, obfuscate, verify_password, Credential};

/// Login used when a connection does not supply one
pub const GUEST_LOGIN: &str = "guest";

/// Payload of the user-password field advertising that a password is set
pub const PASSWORD_PLACEHOLDER: &[u8] = b"x";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub login: String,
    pub name: String,
    pub credential: Credential,
    pub access: AccessBitmap,
}

impl Account {
    /// Account without a password
    pub fn new(login: impl Into<String>, name: impl Into<String>, access: AccessBitmap) -> Self {
        Self {
            login: login.into(),
            name: name.into(),
            credential: Credential::none(),
            access,
        }
    }

    pub fn with_credential(mut self, credential: Credential) -> Self {
        self.credential = credential;
        self
    }

    /// Replace the password, rehashing it. An empty password clears it.
    pub fn set_password(&mut self, plaintext: &str, cost: u32) -> Result<()> {
        self.credential = Credential::from_plaintext(plaintext, cost)?;
        debug!(login = %self.login, has_password = self.credential.has_password(), "Password changed");
        Ok(())
    }

    pub fn verify_password(&self, candidate: &str) -> Result<bool> {
        self.credential.verify(candidate)
    }

    /// Wire fields in their fixed order: name, login, access, then the
    /// optional password placeholder
    pub fn wire_fields(&self) -> Result<Vec<Field>> {
        let mut fields = vec![
            Field::text(FieldId::USER_NAME, &self.name)?,
            Field::new(FieldId::USER_LOGIN, obfuscate(self.login.as_bytes()))?,
            Field::new(FieldId::USER_ACCESS, Bytes::copy_from_slice(self.access.as_bytes()))?,
        ];
        if self.credential.has_password() {
            fields.push(Field::new(FieldId::USER_PASSWORD, PASSWORD_PLACEHOLDER)?);
        }
        Ok(fields)
    }

    pub fn to_block(&self) -> Result<FieldBlock> {
        FieldBlock::from_fields(self.wire_fields()?)
    }

    /// Serialized account record
    pub fn to_bytes(&self) -> Result<Bytes> {
        self.to_block()?.to_bytes()
    }
}

/// Account as received from a peer.
///
/// Only reports whether a password is set; the placeholder carries nothing else.
/// `login` and `name` are lossy UTF-8 for display. Classic clients send
/// MacRoman, so the exact bytes are kept in `raw_login` and `raw_name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountRecord {
    pub login: String,
    pub name: String,
    /// Login with the obfuscation removed
    pub raw_login: Bytes,
    pub raw_name: Bytes,
    pub access: AccessBitmap,
    pub has_password: bool,
}

impl AccountRecord {
    pub fn from_block(block: &FieldBlock) -> Result<Self> {
        let required = |id| block.get(id).ok_or(ProtocolError::MissingField(id));

        let name = required(FieldId::USER_NAME)?;
        let login = required(FieldId::USER_LOGIN)?;
        let access = required(FieldId::USER_ACCESS)?;

        let raw_login = Bytes::from(obfuscate(login.data()));
        Ok(Self {
            login: String::from_utf8_lossy(&raw_login).into_owned(),
            name: name.as_str_lossy().into_owned(),
            raw_login,
            raw_name: name.data().clone(),
            access: AccessBitmap::from_slice(access.data())?,
            has_password: block.get(FieldId::USER_PASSWORD).is_some(),
        })
    }
}
