//! Ledger-independent validity checks.
//!
//! Everything here can be decided from the transaction alone. Checks that
//! need ledger state (balances, sequence gaps, signer lists) belong to the
//! signature engine or to the caller.

use tracing::debug;

use super::builder::Transaction;
use super::codec::encoded_field_len;
use super::error::{CheckResult, ErrorKind};
use super::fields::{FieldId, FieldSet, FieldValue};
use super::formats::{check_template, Scope};
use crate::config::{MAX_MEMO_SIZE, MAX_MULTI_SIGNERS, MIN_MULTI_SIGNERS};

/// Pseudo-transactions are synthesized by the node and never accepted from
/// outside. Decided by type alone.
pub fn is_pseudo_tx(tx: &Transaction) -> bool {
    tx.tx_type().is_pseudo()
}

/// Run every local rule, stopping at the first failure.
pub fn passes_local_checks(tx: &Transaction) -> CheckResult {
    let result = run_checks(tx).err().unwrap_or_else(CheckResult::pass);
    if !result.ok {
        debug!(tx_type = %tx.tx_type(), reason = %result.reason, "local check failed");
    }
    result
}

fn fail(reason: impl Into<String>) -> CheckResult {
    CheckResult::fail(ErrorKind::LocalCheckFailed, reason)
}

fn run_checks(tx: &Transaction) -> Result<(), CheckResult> {
    if is_pseudo_tx(tx) {
        return Err(fail(format!("{} is a pseudo-transaction", tx.tx_type())));
    }

    let fields = tx.fields();
    check_template(tx.tx_type(), Scope::TopLevel, fields, !tx.sub_txs.is_empty())
        .map_err(|e| fail(e.to_string()))?;

    if let Ok(signers) = fields.get_array(FieldId::Signers) {
        if signers.len() < MIN_MULTI_SIGNERS || signers.len() > MAX_MULTI_SIGNERS {
            return Err(CheckResult::fail(
                ErrorKind::SignerSetInvalid,
                format!("invalid signer count {}", signers.len()),
            ));
        }
        if !tx.signing_pub_key().is_empty() {
            return Err(fail("multi-signed transaction carries a signing key"));
        }
    }
    if tx.signature().is_some() && tx.signing_pub_key().is_empty() {
        return Err(fail("signature without a signing key"));
    }

    check_memos(fields)?;
    check_sub_txs(tx)
}

/// Characters RFC 3986 allows unescaped in a URL, plus `%`.
fn is_url_char(c: u8) -> bool {
    c.is_ascii_alphanumeric() || b"-._~:/?#[]@!$&'()*+,;=%".contains(&c)
}

fn check_memos(fields: &FieldSet) -> Result<(), CheckResult> {
    let Some(value) = fields.get(FieldId::Memos) else {
        return Ok(());
    };
    let size = encoded_field_len(FieldId::Memos, value);
    if size > MAX_MEMO_SIZE {
        return Err(fail(format!(
            "memos are {} bytes, limit is {}",
            size, MAX_MEMO_SIZE
        )));
    }

    let memos = fields.get_array(FieldId::Memos).map_err(|e| fail(e.to_string()))?;
    for memo in memos {
        for (field, value) in memo.fields.iter() {
            match field {
                FieldId::MemoData => {}
                FieldId::MemoType | FieldId::MemoFormat => {
                    let ok = matches!(
                        value,
                        FieldValue::Blob(b) if b.iter().all(|c| is_url_char(*c))
                    );
                    if !ok {
                        return Err(fail(format!(
                            "{} holds characters outside the URL set",
                            field
                        )));
                    }
                }
                other => return Err(fail(format!("{} is not allowed in a memo", other))),
            }
        }
    }
    Ok(())
}

fn check_sub_txs(tx: &Transaction) -> Result<(), CheckResult> {
    if tx.sub_txs.is_empty() {
        return Ok(());
    }
    if !tx.tx_type().is_compound() {
        return Err(fail(format!("{} cannot own sub-transactions", tx.tx_type())));
    }
    if let Ok(limit) = tx.fields().get_u32(FieldId::OperationCount) {
        if tx.sub_txs.len() > limit as usize {
            return Err(fail(format!(
                "{} sub-transactions exceed OperationCount {}",
                tx.sub_txs.len(),
                limit
            )));
        }
    }
    for child in &tx.sub_txs {
        if child.tx_type().is_pseudo() {
            return Err(fail("pseudo-transaction inside a compound transaction"));
        }
        check_template(
            child.tx_type(),
            Scope::SubTransaction,
            child.fields(),
            !child.sub_txs.is_empty(),
        )
        .map_err(|e| fail(format!("sub-transaction: {e}")))?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::AccountId;
    use crate::transaction::error::TxError;
    use crate::transaction::fields::InnerObject;
    use crate::transaction::types::TxType;

    fn base(
        tx_type: TxType,
        extra: impl FnOnce(&mut FieldSet) -> Result<(), TxError>,
    ) -> Transaction {
        Transaction::new(tx_type, |f| {
            f.set_u32(FieldId::Sequence, 1)?;
            f.set_u64(FieldId::Fee, 10)?;
            f.set_account(FieldId::Account, AccountId::from_bytes([1; 20]))?;
            f.set_blob(FieldId::SigningPubKey, vec![0xED; 33])?;
            extra(f)
        })
        .unwrap()
    }

    fn memo(kind: &[u8], data: &[u8]) -> InnerObject {
        let mut f = FieldSet::new();
        f.set_blob(FieldId::MemoType, kind.to_vec()).unwrap();
        f.set_blob(FieldId::MemoData, data.to_vec()).unwrap();
        InnerObject::new(FieldId::Memo, f)
    }

    #[test]
    fn plain_transaction_passes() {
        let tx = base(TxType::AccountSet, |_| Ok(()));
        assert!(passes_local_checks(&tx).ok);
    }

    #[test]
    fn pseudo_types_fail() {
        let tx = base(TxType::Amendment, |f| {
            f.set_u32(FieldId::LedgerSequence, 5)?;
            f.set_hash256(FieldId::Amendment, [1; 32])
        });
        assert!(is_pseudo_tx(&tx));
        let r = passes_local_checks(&tx);
        assert_eq!(r.kind, Some(ErrorKind::LocalCheckFailed));
    }

    #[test]
    fn missing_required_field_fails() {
        let tx = base(TxType::Payment, |f| f.set_u64(FieldId::Amount, 5));
        assert!(!passes_local_checks(&tx).ok);
    }

    #[test]
    fn signers_with_signing_key_fail() {
        let tx = base(TxType::AccountSet, |f| {
            let mut s = FieldSet::new();
            s.set_account(FieldId::Account, AccountId::from_bytes([2; 20]))?;
            s.set_blob(FieldId::SigningPubKey, vec![0xED; 33])?;
            s.set_blob(FieldId::TxnSignature, vec![1; 64])?;
            f.set_array(FieldId::Signers, vec![InnerObject::new(FieldId::Signer, s)])
        });
        assert!(!passes_local_checks(&tx).ok);
    }

    #[test]
    fn signature_without_key_fails() {
        let tx = base(TxType::AccountSet, |f| {
            f.set_blob(FieldId::SigningPubKey, Vec::new())?;
            f.set_blob(FieldId::TxnSignature, vec![1; 64])
        });
        assert!(!passes_local_checks(&tx).ok);
    }

    #[test]
    fn memo_rules() {
        let ok = base(TxType::AccountSet, |f| {
            f.set_array(FieldId::Memos, vec![memo(b"text/plain", b"hi there")])
        });
        assert!(passes_local_checks(&ok).ok);

        let bad_chars = base(TxType::AccountSet, |f| {
            f.set_array(FieldId::Memos, vec![memo(b"text plain", b"x")])
        });
        assert!(!passes_local_checks(&bad_chars).ok);

        let too_big = base(TxType::AccountSet, |f| {
            f.set_array(FieldId::Memos, vec![memo(b"t", &[0u8; 1100])])
        });
        assert!(!passes_local_checks(&too_big).ok);
    }

    #[test]
    fn url_character_set() {
        assert!(b"https://x.org/a?b=c&d=%20".iter().all(|c| is_url_char(*c)));
        assert!(!is_url_char(b' '));
        assert!(!is_url_char(b'"'));
    }
}
