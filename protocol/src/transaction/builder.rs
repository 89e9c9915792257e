//! The [`Transaction`] value and its construction paths.
//!
//! A transaction is built from bytes ([`Transaction::from_bytes`]), from a
//! field-assembly callback ([`Transaction::new`]) or from JSON (see
//! [`super::json`]). None of these set the identity digest: only
//! [`super::sterilize`] does, after an encode/decode round trip proves the
//! fields survive canonical encoding.

use std::collections::BTreeSet;
use std::fmt;

use super::codec;
use super::error::TxError;
use super::fields::{FieldId, FieldSet, FieldValue, InnerObject};
use super::formats::{self, Scope};
use super::types::{TxId, TxType};
use crate::identity::AccountId;

// ---------------------------------------------------------------------------
// Transaction
// ---------------------------------------------------------------------------

/// A signed unit of state-change intent.
///
/// `fields` always holds `TransactionType`. The `SubTransactions` array is
/// kept in `sub_txs` instead and rebuilt on encode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub(super) tx_type: TxType,
    pub(super) fields: FieldSet,
    pub(super) sub_txs: Vec<Transaction>,
    /// Set once by the sterilizer; frozen afterwards.
    pub(super) id: Option<TxId>,
}

impl Transaction {
    /// Build a transaction by letting `assemble` fill in its fields.
    ///
    /// `TransactionType` is set from `tx_type` and cannot be overridden. A
    /// `SubTransactions` array written by the callback becomes the child
    /// list, bounded by `OperationCount` when one is set. Template
    /// conformance is not checked here; sterilization does it.
    ///
    /// ```
    /// use tessera_protocol::identity::AccountId;
    /// use tessera_protocol::transaction::{FieldId, Transaction, TxType};
    ///
    /// let tx = Transaction::new(TxType::AccountSet, |f| {
    ///     f.set_u32(FieldId::Sequence, 1)?;
    ///     f.set_u64(FieldId::Fee, 10)?;
    ///     f.set_account(FieldId::Account, AccountId::from_bytes([7; 20]))?;
    ///     f.set_blob(FieldId::SigningPubKey, Vec::new())
    /// })
    /// .unwrap();
    /// assert!(tx.id().is_none());
    /// ```
    pub fn new<F>(tx_type: TxType, assemble: F) -> Result<Self, TxError>
    where
        F: FnOnce(&mut FieldSet) -> Result<(), TxError>,
    {
        let mut fields = FieldSet::new();
        assemble(&mut fields)?;
        fields.insert(FieldId::TransactionType, FieldValue::UInt16(tx_type.code()));
        let sub_txs = take_sub_txs(&mut fields)?;
        check_operation_count(&fields, sub_txs.len())?;
        Ok(Self {
            tx_type,
            fields,
            sub_txs,
            id: None,
        })
    }

    /// Decode canonical bytes. The result is not sterilized.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, TxError> {
        codec::decode(bytes)
    }

    /// Turn a decoded field set into a transaction, checking its template.
    pub(crate) fn from_field_set(mut fields: FieldSet, scope: Scope) -> Result<Self, TxError> {
        let code = match fields.get(FieldId::TransactionType) {
            None => return Err(TxError::MissingType),
            Some(_) => fields.get_u16(FieldId::TransactionType)?,
        };
        let tx_type =
            TxType::from_code(code).ok_or_else(|| TxError::UnknownType(code.to_string()))?;
        let sub_txs = take_sub_txs(&mut fields)?;
        formats::check_template(tx_type, scope, &fields, !sub_txs.is_empty())?;
        check_operation_count(&fields, sub_txs.len())?;
        Ok(Self {
            tx_type,
            fields,
            sub_txs,
            id: None,
        })
    }

    /// The full field set, with `SubTransactions` rebuilt from the children.
    pub(crate) fn to_field_set(&self) -> FieldSet {
        let mut out = self.fields.clone();
        if !self.sub_txs.is_empty() {
            let children = self
                .sub_txs
                .iter()
                .map(|child| InnerObject::new(FieldId::Transaction, child.to_field_set()))
                .collect();
            out.insert(FieldId::SubTransactions, FieldValue::Array(children));
        }
        out
    }

    // -- accessors ----------------------------------------------------------

    pub fn tx_type(&self) -> TxType {
        self.tx_type
    }

    pub fn fields(&self) -> &FieldSet {
        &self.fields
    }

    pub(crate) fn fields_mut(&mut self) -> &mut FieldSet {
        &mut self.fields
    }

    /// The identity digest, `None` until sterilized.
    pub fn id(&self) -> Option<TxId> {
        self.id
    }

    /// The identity digest, or [`TxError::Unsterilized`].
    pub fn require_id(&self) -> Result<TxId, TxError> {
        self.id.ok_or(TxError::Unsterilized)
    }

    pub fn is_sterilized(&self) -> bool {
        self.id.is_some()
    }

    pub fn sequence(&self) -> Result<u32, TxError> {
        self.fields.get_u32(FieldId::Sequence)
    }

    pub fn account(&self) -> Result<AccountId, TxError> {
        self.fields.get_account(FieldId::Account)
    }

    /// The top-level signing key; empty when absent or multi-signed.
    pub fn signing_pub_key(&self) -> &[u8] {
        self.fields.get_blob(FieldId::SigningPubKey).unwrap_or(&[])
    }

    pub fn signature(&self) -> Option<&[u8]> {
        self.fields.get_blob(FieldId::TxnSignature).ok()
    }

    /// Every account the transaction names, including signers, tables and
    /// children.
    pub fn mentioned_accounts(&self) -> BTreeSet<AccountId> {
        let mut out = BTreeSet::new();
        self.collect_accounts(&mut out);
        out
    }

    fn collect_accounts(&self, out: &mut BTreeSet<AccountId>) {
        self.fields.collect_accounts(out);
        for child in &self.sub_txs {
            child.collect_accounts(out);
        }
    }

    /// True for transactions relayed from another chain, which carry the
    /// origin account, ledger and hash chain links.
    pub fn is_cross_chain_upload(&self) -> bool {
        [
            FieldId::OriginalAddress,
            FieldId::TxnLgrSeq,
            FieldId::CurTxHash,
            FieldId::FutureTxHash,
        ]
        .into_iter()
        .all(|f| self.fields.contains(f))
    }

    // -- mutation -----------------------------------------------------------

    fn ensure_mutable(&self) -> Result<(), TxError> {
        if self.is_sterilized() {
            return Err(TxError::Sterilized);
        }
        Ok(())
    }

    pub fn set_sequence(&mut self, seq: u32) -> Result<(), TxError> {
        self.ensure_mutable()?;
        self.fields.set_u32(FieldId::Sequence, seq)
    }

    /// Set any field the transaction does not manage itself.
    pub fn set_field(&mut self, field: FieldId, value: FieldValue) -> Result<(), TxError> {
        self.ensure_mutable()?;
        if matches!(field, FieldId::TransactionType | FieldId::SubTransactions) {
            return Err(TxError::FieldType {
                field: field.name(),
                expected: "a field not managed by the transaction",
            });
        }
        if let (FieldId::OperationCount, FieldValue::UInt32(limit)) = (field, &value) {
            if self.sub_txs.len() > *limit as usize {
                return Err(TxError::LocalCheckFailed(format!(
                    "{} sub-transactions exceed OperationCount {}",
                    self.sub_txs.len(),
                    limit
                )));
            }
        }
        self.fields.set(field, value)
    }
}

fn take_sub_txs(fields: &mut FieldSet) -> Result<Vec<Transaction>, TxError> {
    match fields.remove(FieldId::SubTransactions) {
        Some(FieldValue::Array(items)) => items
            .into_iter()
            .map(|item| Transaction::from_field_set(item.fields, Scope::SubTransaction))
            .collect(),
        _ => Ok(Vec::new()),
    }
}

/// Children may not outnumber a declared `OperationCount`.
fn check_operation_count(fields: &FieldSet, children: usize) -> Result<(), TxError> {
    match fields.get_u32(FieldId::OperationCount) {
        Ok(limit) if children > limit as usize => Err(TxError::LocalCheckFailed(format!(
            "{} sub-transactions exceed OperationCount {}",
            children, limit
        ))),
        _ => Ok(()),
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.id {
            Some(id) => write!(f, "{} {}", self.tx_type, id),
            None => write!(f, "{} (unsterilized)", self.tx_type),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn payment() -> Transaction {
        Transaction::new(TxType::Payment, |f| {
            f.set_u32(FieldId::Sequence, 5)?;
            f.set_u64(FieldId::Fee, 12)?;
            f.set_account(FieldId::Account, AccountId::from_bytes([1; 20]))?;
            f.set_account(FieldId::Destination, AccountId::from_bytes([2; 20]))?;
            f.set_u64(FieldId::Amount, 1_000)?;
            f.set_blob(FieldId::SigningPubKey, Vec::new())
        })
        .unwrap()
    }

    #[test]
    fn new_sets_type_field() {
        let tx = payment();
        assert_eq!(tx.tx_type(), TxType::Payment);
        assert_eq!(tx.fields().get_u16(FieldId::TransactionType).unwrap(), 0);
        assert_eq!(tx.sequence().unwrap(), 5);
        assert!(tx.id().is_none());
        assert_eq!(tx.require_id(), Err(TxError::Unsterilized));
    }

    #[test]
    fn callback_cannot_override_type() {
        let tx = Transaction::new(TxType::AccountSet, |f| f.set_u16(FieldId::TransactionType, 0))
            .unwrap();
        assert_eq!(tx.fields().get_u16(FieldId::TransactionType).unwrap(), 3);
    }

    #[test]
    fn bytes_round_trip() {
        let tx = payment();
        let bytes = codec::encode(&tx);
        let back = Transaction::from_bytes(&bytes).unwrap();
        assert_eq!(back, tx);
        assert_eq!(codec::encode(&back), bytes);
    }

    #[test]
    fn decode_rejects_missing_and_unknown_type() {
        // Sequence only.
        assert_eq!(
            Transaction::from_bytes(&[0x24, 0, 0, 0, 1]),
            Err(TxError::MissingType)
        );
        // TransactionType = 999.
        assert!(matches!(
            Transaction::from_bytes(&[0x12, 0x03, 0xE7]),
            Err(TxError::UnknownType(_))
        ));
    }

    #[test]
    fn mentioned_accounts_cover_every_account_field() {
        let tx = payment();
        let accounts = tx.mentioned_accounts();
        assert_eq!(accounts.len(), 2);
        assert!(accounts.contains(&AccountId::from_bytes([2; 20])));
    }

    #[test]
    fn cross_chain_upload_needs_all_four_fields() {
        let mut tx = payment();
        assert!(!tx.is_cross_chain_upload());
        let origin = FieldValue::Account(AccountId::from_bytes([3; 20]));
        tx.set_field(FieldId::OriginalAddress, origin).unwrap();
        tx.set_field(FieldId::TxnLgrSeq, FieldValue::UInt32(9)).unwrap();
        tx.set_field(FieldId::CurTxHash, FieldValue::Hash256([1; 32])).unwrap();
        assert!(!tx.is_cross_chain_upload());
        tx.set_field(FieldId::FutureTxHash, FieldValue::Hash256([2; 32])).unwrap();
        assert!(tx.is_cross_chain_upload());
    }

    #[test]
    fn managed_fields_are_not_settable() {
        let mut tx = payment();
        assert!(tx
            .set_field(FieldId::TransactionType, FieldValue::UInt16(3))
            .is_err());
        assert!(tx
            .set_field(FieldId::SubTransactions, FieldValue::Array(Vec::new()))
            .is_err());
    }

    fn child(op: u16) -> InnerObject {
        let mut f = FieldSet::new();
        f.set_u16(FieldId::TransactionType, TxType::SqlStatement.code()).unwrap();
        f.set_u16(FieldId::OpType, op).unwrap();
        InnerObject::new(FieldId::Transaction, f)
    }

    fn sql_transaction(count: u32, children: Vec<InnerObject>) -> Result<Transaction, TxError> {
        Transaction::new(TxType::SqlTransaction, move |f| {
            f.set_u32(FieldId::Sequence, 1)?;
            f.set_u64(FieldId::Fee, 10)?;
            f.set_account(FieldId::Account, AccountId::from_bytes([1; 20]))?;
            f.set_blob(FieldId::SigningPubKey, Vec::new())?;
            f.set_u32(FieldId::OperationCount, count)?;
            f.set_array(FieldId::SubTransactions, children)
        })
    }

    #[test]
    fn callback_children_are_bounded_by_operation_count() {
        let tx = sql_transaction(3, vec![child(6), child(7), child(8)]).unwrap();
        assert_eq!(tx.sub_txs().len(), 3);

        assert!(matches!(
            sql_transaction(1, vec![child(6), child(7), child(8)]),
            Err(TxError::LocalCheckFailed(_))
        ));
    }

    #[test]
    fn decode_rejects_children_beyond_operation_count() {
        let mut tx = sql_transaction(3, vec![child(6), child(7), child(8)]).unwrap();
        assert!(matches!(
            tx.set_field(FieldId::OperationCount, FieldValue::UInt32(1)),
            Err(TxError::LocalCheckFailed(_))
        ));

        // OperationCount is (UInt32, 50): header 0x20 0x32, then 4 bytes.
        let mut bytes = codec::encode(&tx);
        let at = bytes
            .windows(6)
            .position(|w| w == [0x20, 0x32, 0, 0, 0, 3])
            .unwrap();
        bytes[at + 5] = 1;
        assert!(matches!(
            Transaction::from_bytes(&bytes),
            Err(TxError::LocalCheckFailed(_))
        ));
    }

    #[test]
    fn display_shows_state() {
        assert_eq!(payment().to_string(), "Payment (unsterilized)");
    }
}
