//! Domain-separated transaction digests.
//!
//! | Digest        | Prefix  | Input                                      |
//! |---------------|---------|--------------------------------------------|
//! | signing       | `STX\0` | canonical bytes minus signature fields      |
//! | multi-signing | `SMT\0` | signing bytes followed by the signer id     |
//! | identity      | `TXN\0` | full canonical bytes                        |
//!
//! All three are SHA-512-half.

use super::builder::Transaction;
use super::codec;
use super::types::TxId;
use crate::config::{HASH_PREFIX_TRANSACTION_ID, HASH_PREFIX_TX_MULTI_SIGN, HASH_PREFIX_TX_SIGN};
use crate::crypto::hash::{prefixed_hash, sha512_half_multi};
use crate::identity::AccountId;

/// Digest a single signer signs.
pub fn signing_digest(tx: &Transaction) -> [u8; 32] {
    prefixed_hash(&HASH_PREFIX_TX_SIGN, &codec::encode_for_signing(tx))
}

/// Digest one multi-signer signs: the signing bytes bound to that signer.
pub fn multi_signing_digest(tx: &Transaction, signer: &AccountId) -> [u8; 32] {
    let body = codec::encode_for_signing(tx);
    sha512_half_multi(&[&HASH_PREFIX_TX_MULTI_SIGN[..], &body[..], &signer.as_bytes()[..]])
}

/// Identity digest over the full canonical bytes.
pub(crate) fn compute_id(tx: &Transaction) -> TxId {
    TxId(prefixed_hash(&HASH_PREFIX_TRANSACTION_ID, &codec::encode(tx)))
}
