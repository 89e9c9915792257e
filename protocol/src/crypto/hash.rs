//! # Hashing Utilities
//!
//! Cryptographic hash functions used by the transaction model:
//!
//! - **SHA-512-half** - the first 32 bytes of SHA-512. Every transaction
//!   digest (signing, multi-signing, identity) is a SHA-512-half over a
//!   4-byte domain prefix followed by canonical bytes.
//!
//! - **BLAKE3** - used to derive 20-byte account identifiers from public
//!   keys. Nothing on the signing path depends on it.
//!
//! - **double SHA-256** - only for the 4-byte checksum of base58 addresses.
//!
//! Every digest over transaction bytes goes through [`prefixed_hash`], so the
//! signing and identity digests of the same bytes never coincide.

use sha2::{Digest, Sha256, Sha512};

/// Compute the SHA-256 hash of the input data.
pub fn sha256(data: &[u8]) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().to_vec()
}

/// Compute the double-SHA-256 hash: `SHA-256(SHA-256(data))`.
///
/// Only used for address checksums.
pub fn double_sha256(data: &[u8]) -> Vec<u8> {
    sha256(&sha256(data))
}

/// SHA-512 truncated to its first 32 bytes.
///
/// # Example
///
/// ```
/// use tessera_protocol::crypto::sha512_half;
///
/// let digest = sha512_half(b"tessera");
/// assert_eq!(digest.len(), 32);
/// ```
pub fn sha512_half(data: &[u8]) -> [u8; 32] {
    sha512_half_multi(&[data])
}

/// SHA-512-half over several slices, fed sequentially without concatenating.
pub fn sha512_half_multi(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Sha512::new();
    for part in parts {
        hasher.update(part);
    }
    let full = hasher.finalize();
    let mut output = [0u8; 32];
    output.copy_from_slice(&full[..32]);
    output
}

/// Domain-separated digest: `SHA-512-half(prefix || data)`.
pub fn prefixed_hash(prefix: &[u8; 4], data: &[u8]) -> [u8; 32] {
    sha512_half_multi(&[prefix.as_slice(), data])
}

/// Compute the BLAKE3 hash of the input data.
pub fn blake3_hash(data: &[u8]) -> [u8; 32] {
    *blake3::hash(data).as_bytes()
}
