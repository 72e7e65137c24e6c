//! Password hashing and the legacy login obfuscation.
//!
//! Passwords are stored as bcrypt hashes. Hashing is deliberately slow;
//! callers on a latency-sensitive path should run it on a blocking pool
//! (`tokio::task::spawn_blocking`). Every function here is pure and safe to
//! call from many threads at once.

use std::fmt;
use tracing::{debug, error, warn};

use crate::error::{constants, ProtocolError, Result};

/// Lowest bcrypt cost; fast enough for tests
pub const MIN_COST: u32 = 4;

/// Highest bcrypt cost the algorithm accepts
pub const MAX_COST: u32 = 31;

/// Cost used when the configuration does not choose one
pub const DEFAULT_COST: u32 = 10;

/// Byte-wise one's complement used for logins and passwords on the wire.
///
/// Not encryption. Applying it twice returns the input.
pub fn obfuscate(bytes: &[u8]) -> Vec<u8> {
    bytes.iter().map(|b| !b).collect()
}

/// Salted bcrypt hash of `plaintext`.
///
/// A hashing failure is returned, never papered over with a weaker encoding.
pub fn hash_password(plaintext: &[u8], cost: u32) -> Result<String> {
    if !(MIN_COST..=MAX_COST).contains(&cost) {
        return Err(ProtocolError::PasswordHash(constants::ERR_BCRYPT_COST.to_string()));
    }
    bcrypt::hash(plaintext, cost).map_err(|e| {
        error!(error = %e, cost, "Password hashing failed");
        ProtocolError::from(e)
    })
}

/// Check `candidate` against a stored hash.
///
/// A mismatch is `Ok(false)`. `Err` means the hash itself could not be
/// processed, e.g. a malformed or truncated hash string.
pub fn verify_password(hash: &str, candidate: &[u8]) -> Result<bool> {
    bcrypt::verify(candidate, hash).map_err(|e| {
        error!(error = %e, "Password verification failed");
        ProtocolError::from(e)
    })
}

/// Whether an account has a password, and if so its hash.
///
/// The "no password" state is explicit rather than a hash of the empty
/// string, so deciding whether to advertise a password needs no hashing work.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credential {
    hash: Option<String>,
}

impl Credential {
    /// Account without a password
    pub fn none() -> Self {
        Self::default()
    }

    /// Hash `plaintext`; an empty password yields [`Credential::none`]
    pub fn from_plaintext(plaintext: &str, cost: u32) -> Result<Self> {
        if plaintext.is_empty() {
            return Ok(Self::none());
        }
        Ok(Self {
            hash: Some(hash_password(plaintext.as_bytes(), cost)?),
        })
    }

    /// Classify a hash loaded from storage.
    ///
    /// Older account stores keep a hash of the empty string for accounts
    /// without a password; such hashes become [`Credential::none`]. Anything
    /// that does not verify against the empty password, including an empty or
    /// malformed hash, counts as a password being set.
    pub fn from_stored_hash(hash: &str) -> Self {
        match bcrypt::verify(b"", hash) {
            Ok(true) => {
                debug!("Stored hash matches empty password");
                Self::none()
            }
            Ok(false) => Self {
                hash: Some(hash.to_string()),
            },
            Err(e) => {
                warn!(error = %e, "Stored hash is unreadable, treating the password as set");
                Self {
                    hash: Some(hash.to_string()),
                }
            }
        }
    }

    pub fn has_password(&self) -> bool {
        self.hash.is_some()
    }

    /// Stored hash, for persisting the account record
    pub fn hash(&self) -> Option<&str> {
        self.hash.as_deref()
    }

    /// Accounts without a password only accept an empty candidate
    pub fn verify(&self, candidate: &str) -> Result<bool> {
        match &self.hash {
            Some(hash) => verify_password(hash, candidate.as_bytes()),
            None => Ok(candidate.is_empty()),
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.hash {
            Some(_) => f.write_str("Credential(<hashed>)"),
            None => f.write_str("Credential(none)"),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    #[test]
    fn test_obfuscate_known_login() {
        assert_eq!(obfuscate(b"bob"), vec![0x9D, 0x90, 0x9D]);
        assert_eq!(obfuscate(&[0x00, 0xFF]), vec![0xFF, 0x00]);
        assert!(obfuscate(b"").is_empty());
    }

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password(b"hunter2", MIN_COST).expect("hash");
        assert!(hash.starts_with("$2"));
        assert!(verify_password(&hash, b"hunter2").unwrap());
        assert!(!verify_password(&hash, b"hunter3").unwrap());
    }

    #[test]
    fn test_hash_is_salted() {
        let a = hash_password(b"same", MIN_COST).unwrap();
        let b = hash_password(b"same", MIN_COST).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_cost_out_of_range() {
        assert!(matches!(hash_password(b"pw", 3), Err(ProtocolError::PasswordHash(_))));
        assert!(matches!(hash_password(b"pw", 32), Err(ProtocolError::PasswordHash(_))));
    }

    #[test]
    fn test_malformed_hash_is_error_not_mismatch() {
        assert!(matches!(
            verify_password("not-a-bcrypt-hash", b"pw"),
            Err(ProtocolError::PasswordHash(_))
        ));
    }

    #[test]
    fn test_credential_states() {
        let none = Credential::from_plaintext("", MIN_COST).unwrap();
        assert!(!none.has_password());
        assert!(none.verify("").unwrap());
        assert!(!none.verify("guess").unwrap());

        let set = Credential::from_plaintext("s3cret", MIN_COST).unwrap();
        assert!(set.has_password());
        assert!(set.verify("s3cret").unwrap());
        assert!(!set.verify("").unwrap());
    }

    #[test]
    fn test_stored_hash_classification() {
        let empty_hash = hash_password(b"", MIN_COST).unwrap();
        assert!(!Credential::from_stored_hash(&empty_hash).has_password());

        let real = hash_password(b"pw", MIN_COST).unwrap();
        let credential = Credential::from_stored_hash(&real);
        assert_eq!(credential.hash(), Some(real.as_str()));
    }

    #[test]
    fn test_unreadable_stored_hash_counts_as_set() {
        for stored in ["", "garbage"] {
            let credential = Credential::from_stored_hash(stored);
            assert!(credential.has_password(), "{stored:?} should count as set");
            assert_eq!(credential.hash(), Some(stored));
            assert!(matches!(credential.verify("pw"), Err(ProtocolError::PasswordHash(_))));
        }
    }

    #[test]
    fn test_debug_hides_hash() {
        let set = Credential::from_plaintext("pw", MIN_COST).unwrap();
        let shown = format!("{set:?}");
        assert!(!shown.contains("$2"));
    }
}
