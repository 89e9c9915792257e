//! # Account Identifiers
//!
//! An account is addressed by a 20-byte identifier derived from the public
//! key that controls it:
//!
//! ```text
//! public_key (32 bytes)
//!     -> BLAKE3(public_key)[..20]            -> AccountId
//!     -> base58(0x00 || id || checksum[..4]) -> rN7n7otQDd6FczFgLdSqtcsAUxDkw6fzRH
//! ```
//!
//! The checksum is the first four bytes of a double SHA-256 over the version
//! byte and the id. Addresses use the Ripple base58 alphabet, so every
//! address begins with `r`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::config::{ACCOUNT_ADDRESS_VERSION, ACCOUNT_ID_LENGTH};
use crate::crypto::hash::{blake3_hash, double_sha256};
use crate::crypto::keys::PublicKey;

/// Errors that can occur when parsing an account address.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AccountError {
    /// The string is not valid base58 in the Ripple alphabet.
    #[error("base58 decode error: {0}")]
    Base58Decode(String),

    /// The decoded payload has the wrong length.
    #[error("invalid address length: expected {expected} bytes, got {got}")]
    InvalidLength { expected: usize, got: usize },

    /// The version byte is not the account-address version.
    #[error("invalid address version byte: {0:#04x}")]
    InvalidVersion(u8),

    /// The trailing four bytes do not match the checksum.
    #[error("address checksum mismatch")]
    BadChecksum,
}

/// A 20-byte account identifier.
///
/// Ordered bytewise, which is the order multi-signers must appear in.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct AccountId([u8; ACCOUNT_ID_LENGTH]);

impl AccountId {
    /// The all-zero account. Pseudo-transactions are issued from it.
    pub const ZERO: AccountId = AccountId([0u8; ACCOUNT_ID_LENGTH]);

    /// Wrap raw bytes.
    pub fn from_bytes(bytes: [u8; ACCOUNT_ID_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Wrap a slice, returning `None` unless it is exactly 20 bytes.
    pub fn from_slice(slice: &[u8]) -> Option<Self> {
        slice.try_into().ok().map(Self)
    }

    /// Derive the account controlled by a public key.
    pub fn from_public_key(pk: &PublicKey) -> Self {
        let digest = blake3_hash(pk.as_bytes());
        let mut id = [0u8; ACCOUNT_ID_LENGTH];
        id.copy_from_slice(&digest[..ACCOUNT_ID_LENGTH]);
        Self(id)
    }

    pub fn as_bytes(&self) -> &[u8; ACCOUNT_ID_LENGTH] {
        &self.0
    }

    /// Encode as a base58-check address.
    pub fn to_address(&self) -> String {
        let mut payload = Vec::with_capacity(1 + ACCOUNT_ID_LENGTH + 4);
        payload.push(ACCOUNT_ADDRESS_VERSION);
        payload.extend_from_slice(&self.0);
        let checksum = double_sha256(&payload);
        payload.extend_from_slice(&checksum[..4]);
        bs58::encode(payload)
            .with_alphabet(bs58::Alphabet::RIPPLE)
            .into_string()
    }

    /// Parse a base58-check address.
    pub fn from_address(addr: &str) -> Result<Self, AccountError> {
        let decoded = bs58::decode(addr)
            .with_alphabet(bs58::Alphabet::RIPPLE)
            .into_vec()
            .map_err(|e| AccountError::Base58Decode(e.to_string()))?;

        let expected = 1 + ACCOUNT_ID_LENGTH + 4;
        if decoded.len() != expected {
            return Err(AccountError::InvalidLength {
                expected,
                got: decoded.len(),
            });
        }
        if decoded[0] != ACCOUNT_ADDRESS_VERSION {
            return Err(AccountError::InvalidVersion(decoded[0]));
        }

        let (body, checksum) = decoded.split_at(1 + ACCOUNT_ID_LENGTH);
        if double_sha256(body)[..4] != *checksum {
            return Err(AccountError::BadChecksum);
        }

        let mut id = [0u8; ACCOUNT_ID_LENGTH];
        id.copy_from_slice(&body[1..]);
        Ok(Self(id))
    }
}

impl FromStr for AccountId {
    type Err = AccountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_address(s)
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_address())
    }
}

impl fmt::Debug for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccountId({})", self.to_address())
    }
}

impl Serialize for AccountId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.serialize_str(&self.to_address())
        } else {
            self.0.serialize(serializer)
        }
    }
}

impl<'de> Deserialize<'de> for AccountId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            let s = String::deserialize(deserializer)?;
            Self::from_address(&s).map_err(serde::de::Error::custom)
        } else {
            let bytes = <[u8; ACCOUNT_ID_LENGTH]>::deserialize(deserializer)?;
            Ok(Self(bytes))
        }
    }
}
