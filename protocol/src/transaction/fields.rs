//! The field registry and the typed field container.
//!
//! Every piece of data a transaction carries lives in a [`FieldSet`], keyed
//! by a [`FieldId`]. Each `FieldId` has a fixed wire type and code, and the
//! set is ordered by `(type code, field code)` so that iteration order *is*
//! canonical encoding order. No insertion-order state exists anywhere.
//!
//! Access is checked: asking for a `u32` from a blob field, or for a field
//! that is absent, is an error value rather than a cast.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use super::error::TxError;
use crate::config::MAX_VL_LENGTH;
use crate::identity::AccountId;

// ---------------------------------------------------------------------------
// FieldType
// ---------------------------------------------------------------------------

/// Wire types a field may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FieldType {
    UInt16,
    UInt32,
    UInt64,
    Hash256,
    Blob,
    Account,
    Object,
    Array,
}

impl FieldType {
    pub const fn code(self) -> u8 {
        match self {
            Self::UInt16 => 1,
            Self::UInt32 => 2,
            Self::UInt64 => 3,
            Self::Hash256 => 5,
            Self::Blob => 7,
            Self::Account => 8,
            Self::Object => 14,
            Self::Array => 15,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::UInt16 => "UInt16",
            Self::UInt32 => "UInt32",
            Self::UInt64 => "UInt64",
            Self::Hash256 => "Hash256",
            Self::Blob => "Blob",
            Self::Account => "AccountID",
            Self::Object => "Object",
            Self::Array => "Array",
        }
    }
}

// ---------------------------------------------------------------------------
// FieldId
// ---------------------------------------------------------------------------

/// Every field the transaction model knows about.
///
/// Declared in canonical order; the `Ord` impl goes through
/// [`FieldId::sort_key`] regardless.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldId {
    // UInt16
    TransactionType,
    OpType,
    // UInt32
    Flags,
    Sequence,
    LedgerSequence,
    LastLedgerSequence,
    ReferenceFeeUnits,
    OperationCount,
    TxnLgrSeq,
    // UInt64
    Amount,
    BaseFee,
    Fee,
    // Hash256
    Amendment,
    CurTxHash,
    FutureTxHash,
    // Blob
    SigningPubKey,
    TxnSignature,
    MemoType,
    MemoData,
    MemoFormat,
    TableName,
    NameInDb,
    Raw,
    ContractData,
    // Account
    Account,
    Owner,
    Destination,
    OriginalAddress,
    ContractAddress,
    // Inner objects
    Memo,
    Signer,
    Table,
    Transaction,
    // Arrays
    Signers,
    Memos,
    Tables,
    SubTransactions,
}

impl FieldId {
    /// Every field, in canonical order.
    pub const ALL: [FieldId; 37] = [
        Self::TransactionType,
        Self::OpType,
        Self::Flags,
        Self::Sequence,
        Self::LedgerSequence,
        Self::LastLedgerSequence,
        Self::ReferenceFeeUnits,
        Self::OperationCount,
        Self::TxnLgrSeq,
        Self::Amount,
        Self::BaseFee,
        Self::Fee,
        Self::Amendment,
        Self::CurTxHash,
        Self::FutureTxHash,
        Self::SigningPubKey,
        Self::TxnSignature,
        Self::MemoType,
        Self::MemoData,
        Self::MemoFormat,
        Self::TableName,
        Self::NameInDb,
        Self::Raw,
        Self::ContractData,
        Self::Account,
        Self::Owner,
        Self::Destination,
        Self::OriginalAddress,
        Self::ContractAddress,
        Self::Memo,
        Self::Signer,
        Self::Table,
        Self::Transaction,
        Self::Signers,
        Self::Memos,
        Self::Tables,
        Self::SubTransactions,
    ];

    /// `(wire type, field code)`.
    pub const fn codes(self) -> (FieldType, u8) {
        use FieldType::*;
        match self {
            Self::TransactionType => (UInt16, 2),
            Self::OpType => (UInt16, 20),
            Self::Flags => (UInt32, 2),
            Self::Sequence => (UInt32, 4),
            Self::LedgerSequence => (UInt32, 6),
            Self::LastLedgerSequence => (UInt32, 27),
            Self::ReferenceFeeUnits => (UInt32, 30),
            Self::OperationCount => (UInt32, 50),
            Self::TxnLgrSeq => (UInt32, 51),
            Self::Amount => (UInt64, 1),
            Self::BaseFee => (UInt64, 5),
            Self::Fee => (UInt64, 8),
            Self::Amendment => (Hash256, 19),
            Self::CurTxHash => (Hash256, 30),
            Self::FutureTxHash => (Hash256, 31),
            Self::SigningPubKey => (Blob, 3),
            Self::TxnSignature => (Blob, 4),
            Self::MemoType => (Blob, 12),
            Self::MemoData => (Blob, 13),
            Self::MemoFormat => (Blob, 14),
            Self::TableName => (Blob, 20),
            Self::NameInDb => (Blob, 21),
            Self::Raw => (Blob, 22),
            Self::ContractData => (Blob, 23),
            Self::Account => (FieldType::Account, 1),
            Self::Owner => (FieldType::Account, 2),
            Self::Destination => (FieldType::Account, 3),
            Self::OriginalAddress => (FieldType::Account, 20),
            Self::ContractAddress => (FieldType::Account, 21),
            Self::Memo => (Object, 10),
            Self::Signer => (Object, 16),
            Self::Table => (Object, 20),
            Self::Transaction => (Object, 21),
            Self::Signers => (Array, 3),
            Self::Memos => (Array, 9),
            Self::Tables => (Array, 20),
            Self::SubTransactions => (Array, 21),
        }
    }

    pub const fn field_type(self) -> FieldType {
        self.codes().0
    }

    pub const fn code(self) -> u8 {
        self.codes().1
    }

    /// Canonical sort key.
    pub const fn sort_key(self) -> (u8, u8) {
        (self.field_type().code(), self.code())
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::TransactionType => "TransactionType",
            Self::OpType => "OpType",
            Self::Flags => "Flags",
            Self::Sequence => "Sequence",
            Self::LedgerSequence => "LedgerSequence",
            Self::LastLedgerSequence => "LastLedgerSequence",
            Self::ReferenceFeeUnits => "ReferenceFeeUnits",
            Self::OperationCount => "OperationCount",
            Self::TxnLgrSeq => "TxnLgrSeq",
            Self::Amount => "Amount",
            Self::BaseFee => "BaseFee",
            Self::Fee => "Fee",
            Self::Amendment => "Amendment",
            Self::CurTxHash => "CurTxHash",
            Self::FutureTxHash => "FutureTxHash",
            Self::SigningPubKey => "SigningPubKey",
            Self::TxnSignature => "TxnSignature",
            Self::MemoType => "MemoType",
            Self::MemoData => "MemoData",
            Self::MemoFormat => "MemoFormat",
            Self::TableName => "TableName",
            Self::NameInDb => "NameInDB",
            Self::Raw => "Raw",
            Self::ContractData => "ContractData",
            Self::Account => "Account",
            Self::Owner => "Owner",
            Self::Destination => "Destination",
            Self::OriginalAddress => "OriginalAddress",
            Self::ContractAddress => "ContractAddress",
            Self::Memo => "Memo",
            Self::Signer => "Signer",
            Self::Table => "Table",
            Self::Transaction => "Transaction",
            Self::Signers => "Signers",
            Self::Memos => "Memos",
            Self::Tables => "Tables",
            Self::SubTransactions => "SubTransactions",
        }
    }

    /// Look up a field by its wire codes.
    pub fn from_codes(type_code: u8, field_code: u8) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|f| f.sort_key() == (type_code, field_code))
    }

    /// Look up a field by its JSON name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.name() == name)
    }

    /// Fields excluded from the signing digest.
    pub const fn is_signing_field(self) -> bool {
        !matches!(self, Self::TxnSignature | Self::Signers)
    }

    /// The only inner-object kind an array field admits.
    pub const fn inner_kind(self) -> Option<FieldId> {
        match self {
            Self::Signers => Some(Self::Signer),
            Self::Memos => Some(Self::Memo),
            Self::Tables => Some(Self::Table),
            Self::SubTransactions => Some(Self::Transaction),
            _ => None,
        }
    }
}

impl PartialOrd for FieldId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FieldId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// FieldValue
// ---------------------------------------------------------------------------

/// An inner object stored inside an array field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InnerObject {
    /// Which inner-object field wraps this element (`Signer`, `Memo`, ...).
    pub kind: FieldId,
    pub fields: FieldSet,
}

impl InnerObject {
    pub fn new(kind: FieldId, fields: FieldSet) -> Self {
        Self { kind, fields }
    }
}

/// A typed field value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    UInt16(u16),
    UInt32(u32),
    UInt64(u64),
    Hash256([u8; 32]),
    Blob(Vec<u8>),
    Account(AccountId),
    Array(Vec<InnerObject>),
}

impl FieldValue {
    pub fn field_type(&self) -> FieldType {
        match self {
            Self::UInt16(_) => FieldType::UInt16,
            Self::UInt32(_) => FieldType::UInt32,
            Self::UInt64(_) => FieldType::UInt64,
            Self::Hash256(_) => FieldType::Hash256,
            Self::Blob(_) => FieldType::Blob,
            Self::Account(_) => FieldType::Account,
            Self::Array(_) => FieldType::Array,
        }
    }
}

// ---------------------------------------------------------------------------
// FieldSet
// ---------------------------------------------------------------------------

/// Ordered, typed field container.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldSet {
    fields: BTreeMap<FieldId, FieldValue>,
}

impl FieldSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn contains(&self, field: FieldId) -> bool {
        self.fields.contains_key(&field)
    }

    pub fn get(&self, field: FieldId) -> Option<&FieldValue> {
        self.fields.get(&field)
    }

    pub fn remove(&mut self, field: FieldId) -> Option<FieldValue> {
        self.fields.remove(&field)
    }

    /// Iterate in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (FieldId, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (*k, v))
    }

    /// Field ids present, in canonical order.
    pub fn ids(&self) -> impl Iterator<Item = FieldId> + '_ {
        self.fields.keys().copied()
    }

    /// Insert or replace a value, checking it against the field's wire type.
    ///
    /// Array values must only hold the field's own inner-object kind.
    pub fn set(&mut self, field: FieldId, value: FieldValue) -> Result<(), TxError> {
        if field.field_type() == FieldType::Object {
            return Err(TxError::FieldType {
                field: field.name(),
                expected: "top-level value (inner objects live inside arrays)",
            });
        }
        if value.field_type() != field.field_type() {
            return Err(TxError::FieldType {
                field: field.name(),
                expected: field.field_type().name(),
            });
        }
        if let FieldValue::Blob(bytes) = &value {
            if bytes.len() > MAX_VL_LENGTH {
                return Err(TxError::malformed(format!(
                    "{} is {} bytes, longer than {}",
                    field,
                    bytes.len(),
                    MAX_VL_LENGTH
                )));
            }
        }
        if let FieldValue::Array(items) = &value {
            let kind = field.inner_kind();
            if items.iter().any(|item| Some(item.kind) != kind) {
                return Err(TxError::FieldType {
                    field: field.name(),
                    expected: "array of its own inner-object kind",
                });
            }
        }
        self.fields.insert(field, value);
        Ok(())
    }

    /// Insert without type checks, for values built from typed parts.
    pub(crate) fn insert(&mut self, field: FieldId, value: FieldValue) {
        self.fields.insert(field, value);
    }

    pub fn set_u16(&mut self, field: FieldId, v: u16) -> Result<(), TxError> {
        self.set(field, FieldValue::UInt16(v))
    }

    pub fn set_u32(&mut self, field: FieldId, v: u32) -> Result<(), TxError> {
        self.set(field, FieldValue::UInt32(v))
    }

    pub fn set_u64(&mut self, field: FieldId, v: u64) -> Result<(), TxError> {
        self.set(field, FieldValue::UInt64(v))
    }

    pub fn set_hash256(&mut self, field: FieldId, v: [u8; 32]) -> Result<(), TxError> {
        self.set(field, FieldValue::Hash256(v))
    }

    pub fn set_blob(&mut self, field: FieldId, v: impl Into<Vec<u8>>) -> Result<(), TxError> {
        self.set(field, FieldValue::Blob(v.into()))
    }

    pub fn set_account(&mut self, field: FieldId, v: AccountId) -> Result<(), TxError> {
        self.set(field, FieldValue::Account(v))
    }

    pub fn set_array(&mut self, field: FieldId, v: Vec<InnerObject>) -> Result<(), TxError> {
        self.set(field, FieldValue::Array(v))
    }

    fn require(&self, field: FieldId) -> Result<&FieldValue, TxError> {
        self.fields
            .get(&field)
            .ok_or(TxError::MissingField(field.name()))
    }

    fn mismatch(field: FieldId, expected: FieldType) -> TxError {
        TxError::FieldType {
            field: field.name(),
            expected: expected.name(),
        }
    }

    pub fn get_u16(&self, field: FieldId) -> Result<u16, TxError> {
        match self.require(field)? {
            FieldValue::UInt16(v) => Ok(*v),
            _ => Err(Self::mismatch(field, FieldType::UInt16)),
        }
    }

    pub fn get_u32(&self, field: FieldId) -> Result<u32, TxError> {
        match self.require(field)? {
            FieldValue::UInt32(v) => Ok(*v),
            _ => Err(Self::mismatch(field, FieldType::UInt32)),
        }
    }

    pub fn get_u64(&self, field: FieldId) -> Result<u64, TxError> {
        match self.require(field)? {
            FieldValue::UInt64(v) => Ok(*v),
            _ => Err(Self::mismatch(field, FieldType::UInt64)),
        }
    }

    pub fn get_hash256(&self, field: FieldId) -> Result<[u8; 32], TxError> {
        match self.require(field)? {
            FieldValue::Hash256(v) => Ok(*v),
            _ => Err(Self::mismatch(field, FieldType::Hash256)),
        }
    }

    pub fn get_blob(&self, field: FieldId) -> Result<&[u8], TxError> {
        match self.require(field)? {
            FieldValue::Blob(v) => Ok(v),
            _ => Err(Self::mismatch(field, FieldType::Blob)),
        }
    }

    pub fn get_account(&self, field: FieldId) -> Result<AccountId, TxError> {
        match self.require(field)? {
            FieldValue::Account(v) => Ok(*v),
            _ => Err(Self::mismatch(field, FieldType::Account)),
        }
    }

    pub fn get_array(&self, field: FieldId) -> Result<&[InnerObject], TxError> {
        match self.require(field)? {
            FieldValue::Array(v) => Ok(v),
            _ => Err(Self::mismatch(field, FieldType::Array)),
        }
    }

    /// Add every account-typed value, recursing into arrays.
    pub fn collect_accounts(&self, out: &mut BTreeSet<AccountId>) {
        for (_, value) in self.iter() {
            match value {
                FieldValue::Account(id) => {
                    out.insert(*id);
                }
                FieldValue::Array(items) => {
                    for item in items {
                        item.fields.collect_accounts(out);
                    }
                }
                _ => {}
            }
        }
    }
}
