//! Signature verification.
//!
//! [`check_sign`] picks the single- or multi-signature path from the
//! presence of a `Signers` array. The multi-signature path runs every
//! structural check on the signer set before it touches a key or a
//! signature:
//!
//! 1. signer count in `[1, 8]`, strictly ascending, never the transaction
//!    account, top-level `SigningPubKey` empty;
//! 2. every signer is on the account's signer list;
//! 3. every signer's embedded key matches the key the ledger holds for it
//!    and its signature verifies over its account-bound digest;
//! 4. the summed weight reaches the list's quorum.
//!
//! Failures come back as a [`CheckResult`], never a panic, so a batch of
//! transactions can be verified without one bad entry stopping the rest.

use std::collections::HashMap;

use parking_lot::RwLock;
use rayon::prelude::*;
use tracing::{debug, warn};

use super::builder::Transaction;
use super::digest::{multi_signing_digest, signing_digest};
use super::error::{CheckResult, ErrorKind};
use super::fields::FieldId;
use super::signing::{signers, Signer};
use crate::config::{MAX_MULTI_SIGNERS, MIN_MULTI_SIGNERS};
use crate::crypto::keys::PublicKey;
use crate::crypto::signatures::verify_raw;
use crate::identity::AccountId;

// ---------------------------------------------------------------------------
// Signer lists
// ---------------------------------------------------------------------------

/// One weighted member of an account's signer list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignerEntry {
    pub account: AccountId,
    pub weight: u16,
}

/// The multi-signing policy an account has set on the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignerList {
    pub quorum: u32,
    pub entries: Vec<SignerEntry>,
}

impl SignerList {
    fn weight_of(&self, account: &AccountId) -> Option<u16> {
        self.entries
            .iter()
            .find(|e| e.account == *account)
            .map(|e| e.weight)
    }
}

/// Ledger lookups the multi-signature path needs.
pub trait SignerListSource {
    /// The signer list `account` has set, if any.
    fn signer_list(&self, account: &AccountId) -> Option<SignerList>;

    /// The public key the ledger holds for `account`, if any.
    fn signing_key(&self, account: &AccountId) -> Option<PublicKey>;
}

/// A source with no signer lists, for callers that only single-sign.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSignerLists;

impl SignerListSource for NoSignerLists {
    fn signer_list(&self, _account: &AccountId) -> Option<SignerList> {
        None
    }

    fn signing_key(&self, _account: &AccountId) -> Option<PublicKey> {
        None
    }
}

/// In-memory signer lists and keys, safe to share across verifier threads.
#[derive(Debug, Default)]
pub struct MemorySignerLists {
    lists: RwLock<HashMap<AccountId, SignerList>>,
    keys: RwLock<HashMap<AccountId, PublicKey>>,
}

impl MemorySignerLists {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_signer_list(&self, account: AccountId, list: SignerList) {
        self.lists.write().insert(account, list);
    }

    pub fn set_signing_key(&self, account: AccountId, key: PublicKey) {
        self.keys.write().insert(account, key);
    }

    /// Register a key under the account it derives.
    pub fn register_key(&self, key: PublicKey) -> AccountId {
        let account = AccountId::from_public_key(&key);
        self.set_signing_key(account, key);
        account
    }
}

impl SignerListSource for MemorySignerLists {
    fn signer_list(&self, account: &AccountId) -> Option<SignerList> {
        self.lists.read().get(account).cloned()
    }

    fn signing_key(&self, account: &AccountId) -> Option<PublicKey> {
        self.keys.read().get(account).cloned()
    }
}

// ---------------------------------------------------------------------------
// check_sign
// ---------------------------------------------------------------------------

/// Verify the signature(s) on `tx`.
pub fn check_sign<S>(tx: &Transaction, allow_multi_sign: bool, source: &S) -> CheckResult
where
    S: SignerListSource + ?Sized,
{
    let result = if tx.fields().contains(FieldId::Signers) {
        check_multi_sign(tx, allow_multi_sign, source)
    } else {
        check_single_sign(tx)
    };
    if result.ok {
        debug!(tx_type = %tx.tx_type(), "signature check passed");
    } else {
        warn!(tx_type = %tx.tx_type(), reason = %result.reason, "signature check failed");
    }
    result
}

/// Run [`check_sign`] over a batch in parallel. Results line up with `txs`.
pub fn verify_batch<S>(txs: &[Transaction], allow_multi_sign: bool, source: &S) -> Vec<CheckResult>
where
    S: SignerListSource + Sync + ?Sized,
{
    txs.par_iter()
        .map(|tx| check_sign(tx, allow_multi_sign, source))
        .collect()
}

fn check_single_sign(tx: &Transaction) -> CheckResult {
    let key = tx.signing_pub_key();
    if key.is_empty() {
        return CheckResult::fail(ErrorKind::SignatureInvalid, "no public key");
    }
    let Some(signature) = tx.signature() else {
        return CheckResult::fail(ErrorKind::SignatureInvalid, "invalid signature");
    };
    match verify_raw(key, &signing_digest(tx), signature) {
        Ok(()) => CheckResult::pass(),
        Err(_) => CheckResult::fail(ErrorKind::SignatureInvalid, "invalid signature"),
    }
}

fn signer_set_invalid(reason: impl Into<String>) -> CheckResult {
    CheckResult::fail(ErrorKind::SignerSetInvalid, reason)
}

fn signature_invalid(reason: impl Into<String>) -> CheckResult {
    CheckResult::fail(ErrorKind::SignatureInvalid, reason)
}

fn check_multi_sign<S>(tx: &Transaction, allow_multi_sign: bool, source: &S) -> CheckResult
where
    S: SignerListSource + ?Sized,
{
    if !allow_multi_sign {
        return signature_invalid("multi-signing not allowed");
    }

    let entries: Vec<Signer> = match signers(tx) {
        Ok(entries) => entries,
        Err(e) => return signer_set_invalid(format!("malformed signer entry: {e}")),
    };
    let Ok(account) = tx.account() else {
        return signer_set_invalid("transaction has no account");
    };

    if entries.len() < MIN_MULTI_SIGNERS || entries.len() > MAX_MULTI_SIGNERS {
        return signer_set_invalid(format!("invalid signer count {}", entries.len()));
    }
    for pair in entries.windows(2) {
        if pair[0].account == pair[1].account {
            return signer_set_invalid(format!("duplicate signer {}", pair[0].account));
        }
        if pair[0].account > pair[1].account {
            return signer_set_invalid("signers are not sorted");
        }
    }
    if entries.iter().any(|s| s.account == account) {
        return signer_set_invalid("transaction account cannot co-sign");
    }
    if !tx.signing_pub_key().is_empty() {
        return signer_set_invalid("signing key must be empty when multi-signing");
    }

    let Some(list) = source.signer_list(&account) else {
        return signer_set_invalid(format!("{account} has no signer list"));
    };
    let mut weights = Vec::with_capacity(entries.len());
    for signer in &entries {
        match list.weight_of(&signer.account) {
            Some(w) => weights.push(u32::from(w)),
            None => {
                return signer_set_invalid(format!("{} is not on the signer list", signer.account))
            }
        }
    }

    for signer in &entries {
        let Some(ledger_key) = source.signing_key(&signer.account) else {
            return signature_invalid(format!("{} has no key on the ledger", signer.account));
        };
        if ledger_key.to_wire() != signer.signing_pub_key {
            return signature_invalid(format!("key mismatch for signer {}", signer.account));
        }
        let digest = multi_signing_digest(tx, &signer.account);
        if verify_raw(&signer.signing_pub_key, &digest, &signer.signature).is_err() {
            return signature_invalid(format!("invalid signature from {}", signer.account));
        }
    }

    let total: u32 = weights.iter().sum();
    if total < list.quorum {
        return signer_set_invalid(format!("weight {} below quorum {}", total, list.quorum));
    }
    CheckResult::pass()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
