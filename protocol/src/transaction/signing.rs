//! Producing signatures.
//!
//! Single-signing writes `SigningPubKey` and then `TxnSignature`; the key is
//! part of the signed bytes, the signature is not. Multi-signing leaves the
//! top-level key empty and collects one [`Signer`] entry per co-signer in
//! the `Signers` array, each over its own account-bound digest.

use tracing::debug;

use super::builder::Transaction;
use super::digest::{multi_signing_digest, signing_digest};
use super::error::TxError;
use super::fields::{FieldId, FieldSet, InnerObject};
use crate::config::MAX_MULTI_SIGNERS;
use crate::crypto::keys::TxKeypair;
use crate::crypto::signatures::sign_to_bytes;
use crate::identity::AccountId;

/// One entry of a `Signers` array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signer {
    pub account: AccountId,
    /// Wire-form public key as carried in the entry.
    pub signing_pub_key: Vec<u8>,
    pub signature: Vec<u8>,
}

impl Signer {
    /// The `Signer` inner object. Fails when a blob is too long to encode.
    pub fn to_inner(&self) -> Result<InnerObject, TxError> {
        let mut fields = FieldSet::new();
        fields.set_account(FieldId::Account, self.account)?;
        fields.set_blob(FieldId::SigningPubKey, self.signing_pub_key.clone())?;
        fields.set_blob(FieldId::TxnSignature, self.signature.clone())?;
        Ok(InnerObject::new(FieldId::Signer, fields))
    }

    pub fn from_inner(obj: &InnerObject) -> Result<Self, TxError> {
        if obj.kind != FieldId::Signer {
            return Err(TxError::malformed(format!("{} is not a signer entry", obj.kind)));
        }
        Ok(Self {
            account: obj.fields.get_account(FieldId::Account)?,
            signing_pub_key: obj.fields.get_blob(FieldId::SigningPubKey)?.to_vec(),
            signature: obj.fields.get_blob(FieldId::TxnSignature)?.to_vec(),
        })
    }
}

/// The signer entries a transaction carries, in stored order.
pub fn signers(tx: &Transaction) -> Result<Vec<Signer>, TxError> {
    match tx.fields().get(FieldId::Signers) {
        None => Ok(Vec::new()),
        Some(_) => tx
            .fields()
            .get_array(FieldId::Signers)?
            .iter()
            .map(Signer::from_inner)
            .collect(),
    }
}

/// Sign `tx` in place as its single signer.
pub fn sign_transaction(tx: &mut Transaction, keypair: &TxKeypair) -> Result<(), TxError> {
    if tx.is_sterilized() {
        return Err(TxError::Sterilized);
    }
    tx.fields_mut()
        .set_blob(FieldId::SigningPubKey, keypair.public_key().to_wire())?;
    let digest = signing_digest(tx);
    let signature = sign_to_bytes(keypair, &digest);
    tx.fields_mut().set_blob(FieldId::TxnSignature, signature)?;
    debug!(tx_type = %tx.tx_type(), "transaction signed");
    Ok(())
}

/// Produce the multi-sign entry `signer` contributes to `tx`.
///
/// `keypair` must be the key the ledger holds for `signer`.
pub fn sign_for(tx: &Transaction, keypair: &TxKeypair, signer: AccountId) -> Signer {
    let digest = multi_signing_digest(tx, &signer);
    Signer {
        account: signer,
        signing_pub_key: keypair.public_key().to_wire(),
        signature: sign_to_bytes(keypair, &digest),
    }
}

/// Attach a multi-sign entry, keeping the array sorted by account.
pub fn add_signer(tx: &mut Transaction, signer: Signer) -> Result<(), TxError> {
    if tx.is_sterilized() {
        return Err(TxError::Sterilized);
    }
    let mut entries = signers(tx)?;
    if entries.len() >= MAX_MULTI_SIGNERS {
        return Err(TxError::SignerSetInvalid(format!(
            "at most {} signers",
            MAX_MULTI_SIGNERS
        )));
    }
    let pos = match entries.binary_search_by(|s| s.account.cmp(&signer.account)) {
        Ok(_) => {
            return Err(TxError::SignerSetInvalid(format!(
                "duplicate signer {}",
                signer.account
            )))
        }
        Err(pos) => pos,
    };
    entries.insert(pos, signer);
    let array = entries
        .iter()
        .map(Signer::to_inner)
        .collect::<Result<Vec<_>, _>>()?;
    tx.fields_mut().set_array(FieldId::Signers, array)?;
    debug!(signers = entries.len(), "multi-sign entry added");
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
