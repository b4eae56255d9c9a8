//! Unique code derivation
//!
//! A code is the first [`CODE_LEN`] lowercase hex characters of
//! `SHA-256(chat_id.to_string() + salt)`. It is short enough to be typed into
//! a web form and is not a credential: 40 bits leave a real birthday-collision
//! chance once the user base reaches the hundreds of thousands, so the website
//! must treat a code as a lookup hint, not as proof of identity.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Number of hex characters kept from the digest
pub const CODE_LEN: usize = 10;

/// Short printable code a user pastes into the website.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UniqueCode(String);

impl UniqueCode {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for UniqueCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for UniqueCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Derive the unique code for a chat.
///
/// Same `(chat_id, salt)` always yields the same code. Rotating the salt
/// changes every code at once.
pub fn derive_code(chat_id: i64, salt: &SecretString) -> UniqueCode {
    derive_code_raw(chat_id, salt.expose_secret())
}

fn derive_code_raw(chat_id: i64, salt: &str) -> UniqueCode {
    let mut hasher = Sha256::new();
    hasher.update(chat_id.to_string().as_bytes());
    hasher.update(salt.as_bytes());
    let mut digest = hex::encode(hasher.finalize());
    digest.truncate(CODE_LEN);
    UniqueCode(digest)
}
