//! Sterilization: encode, decode, then attach the identity digest.
//!
//! The round trip guarantees the fields survive canonical encoding and that
//! the type's template accepts them. The returned copy is frozen; the input
//! is left untouched.

use tracing::debug;

use super::builder::Transaction;
use super::codec;
use super::digest::compute_id;
use super::error::TxError;

/// Produce the sterilized copy of `tx`.
///
/// Idempotent: sterilizing a sterilized transaction yields an equal value
/// with the same id.
pub fn sterilize(tx: &Transaction) -> Result<Transaction, TxError> {
    let bytes = codec::encode(tx);
    let mut copy = codec::decode(&bytes)?;
    let id = compute_id(&copy);
    copy.id = Some(id);
    debug!(tx_id = %id, tx_type = %copy.tx_type(), size = bytes.len(), "transaction sterilized");
    Ok(copy)
}
