//! Per-type field templates.
//!
//! A template lists which fields a transaction type admits and which of
//! those it requires. Decoding, sterilization and local checks all consult
//! the same table, so a field the template does not name is rejected no
//! matter which path the transaction arrived by.

use super::error::TxError;
use super::fields::{FieldId, FieldSet, FieldValue, InnerObject};
use super::types::TxType;

/// Whether a template field must be present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    Required,
    Optional,
}

/// Where a field set sits in the transaction tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// A transaction submitted on its own.
    TopLevel,
    /// A child held in a parent's `SubTransactions` array.
    SubTransaction,
}

use Requirement::{Optional, Required};

const COMMON: &[(FieldId, Requirement)] = &[
    (FieldId::TransactionType, Required),
    (FieldId::Flags, Optional),
    (FieldId::Sequence, Required),
    (FieldId::LastLedgerSequence, Optional),
    (FieldId::TxnLgrSeq, Optional),
    (FieldId::Fee, Required),
    (FieldId::CurTxHash, Optional),
    (FieldId::FutureTxHash, Optional),
    (FieldId::SigningPubKey, Required),
    (FieldId::TxnSignature, Optional),
    (FieldId::Account, Required),
    (FieldId::OriginalAddress, Optional),
    (FieldId::Signers, Optional),
    (FieldId::Memos, Optional),
];

/// Fields a child transaction can never carry.
const FORBIDDEN_IN_CHILD: &[FieldId] = &[
    FieldId::SubTransactions,
    FieldId::TxnSignature,
    FieldId::Signers,
];

/// Type-specific fields.
pub fn type_fields(tx_type: TxType) -> &'static [(FieldId, Requirement)] {
    match tx_type {
        TxType::Payment => &[(FieldId::Destination, Required), (FieldId::Amount, Required)],
        TxType::AccountSet => &[],
        TxType::TableListSet => &[
            (FieldId::OpType, Required),
            (FieldId::Raw, Optional),
            (FieldId::Owner, Optional),
            (FieldId::Tables, Required),
        ],
        TxType::SqlStatement => &[
            (FieldId::OpType, Required),
            (FieldId::Raw, Optional),
            (FieldId::Owner, Required),
            (FieldId::Tables, Required),
        ],
        TxType::SqlTransaction => &[
            (FieldId::OperationCount, Required),
            (FieldId::SubTransactions, Optional),
        ],
        TxType::Contract => &[
            (FieldId::OperationCount, Optional),
            (FieldId::Amount, Optional),
            (FieldId::ContractData, Optional),
            (FieldId::ContractAddress, Required),
            (FieldId::SubTransactions, Optional),
        ],
        TxType::Amendment => &[
            (FieldId::LedgerSequence, Required),
            (FieldId::Amendment, Required),
        ],
        TxType::SetFee => &[
            (FieldId::LedgerSequence, Required),
            (FieldId::ReferenceFeeUnits, Required),
            (FieldId::BaseFee, Required),
        ],
    }
}

/// How `field` is treated for `tx_type` at `scope`, or `None` when the
/// template does not admit it.
pub fn requirement(tx_type: TxType, scope: Scope, field: FieldId) -> Option<Requirement> {
    let found = COMMON
        .iter()
        .chain(type_fields(tx_type))
        .find(|(f, _)| *f == field)
        .map(|(_, r)| *r)?;

    match scope {
        Scope::TopLevel => Some(found),
        Scope::SubTransaction if FORBIDDEN_IN_CHILD.contains(&field) => None,
        Scope::SubTransaction if field == FieldId::TransactionType => Some(Required),
        Scope::SubTransaction => Some(Optional),
    }
}

/// Check a transaction's fields against its template.
///
/// `has_sub_txs` stands in for the `SubTransactions` array, which the
/// transaction keeps outside its field set.
pub fn check_template(
    tx_type: TxType,
    scope: Scope,
    fields: &FieldSet,
    has_sub_txs: bool,
) -> Result<(), TxError> {
    for field in fields.ids() {
        if requirement(tx_type, scope, field).is_none() {
            return Err(TxError::malformed(format!(
                "field {} is not allowed in {}",
                field, tx_type
            )));
        }
    }
    if has_sub_txs && requirement(tx_type, scope, FieldId::SubTransactions).is_none() {
        return Err(TxError::malformed(format!(
            "{} cannot carry sub-transactions",
            tx_type
        )));
    }

    for field in FieldId::ALL {
        if requirement(tx_type, scope, field) == Some(Required) {
            let present = if field == FieldId::SubTransactions {
                has_sub_txs
            } else {
                fields.contains(field)
            };
            if !present {
                return Err(TxError::MissingField(field.name()));
            }
        }
    }

    for (_, value) in fields.iter() {
        if let FieldValue::Array(items) = value {
            for item in items {
                check_inner(item)?;
            }
        }
    }
    Ok(())
}

/// Template of the leaf inner objects (`Signer`, `Memo`, `Table`).
pub fn inner_fields(kind: FieldId) -> &'static [(FieldId, Requirement)] {
    match kind {
        FieldId::Signer => &[
            (FieldId::SigningPubKey, Required),
            (FieldId::TxnSignature, Required),
            (FieldId::Account, Required),
        ],
        FieldId::Memo => &[
            (FieldId::MemoType, Optional),
            (FieldId::MemoData, Optional),
            (FieldId::MemoFormat, Optional),
        ],
        FieldId::Table => &[
            (FieldId::TableName, Required),
            (FieldId::NameInDb, Optional),
        ],
        _ => &[],
    }
}

/// Check a leaf inner object against its template. `Transaction` inner
/// objects are checked when they are turned into child transactions.
pub fn check_inner(obj: &InnerObject) -> Result<(), TxError> {
    if obj.kind == FieldId::Transaction {
        return Ok(());
    }
    let template = inner_fields(obj.kind);
    for field in obj.fields.ids() {
        if !template.iter().any(|(f, _)| *f == field) {
            return Err(TxError::malformed(format!(
                "field {} is not allowed in {}",
                field, obj.kind
            )));
        }
    }
    for (field, req) in template {
        if *req == Required && !obj.fields.contains(*field) {
            return Err(TxError::MissingField(field.name()));
        }
    }
    Ok(())
}
