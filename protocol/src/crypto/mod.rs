//! # Cryptographic Primitives
//!
//! Everything security-related in the transaction model flows through here:
//!
//! - **Ed25519** for signatures.
//! - **SHA-512-half** for every transaction digest.
//! - **BLAKE3** for deriving account identifiers from public keys.
//!
//! These are thin, type-safe wrappers around audited implementations.

pub mod hash;
pub mod keys;
pub mod signatures;

pub use hash::{blake3_hash, double_sha256, prefixed_hash, sha256, sha512_half};
pub use keys::{PublicKey, Signature, TxKeypair};
pub use signatures::{verify_raw, SignatureError};
