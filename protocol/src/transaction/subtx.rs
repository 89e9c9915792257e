//! The sub-transaction tree.
//!
//! Compound types (`SQLTransaction` and `Contract`) own an ordered list of
//! child transactions. Children are one level deep,
//! keep insertion order and are never shared between parents.

use super::builder::Transaction;
use super::error::TxError;
use super::fields::FieldId;
use super::formats::{check_template, Scope};
use super::types::TxType;

/// Transactions a contract emitted while executing, as recorded in its
/// execution metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContractExecution {
    pub emitted: Vec<Transaction>,
}

impl ContractExecution {
    pub fn new(emitted: Vec<Transaction>) -> Self {
        Self { emitted }
    }
}

impl Transaction {
    /// Append a child transaction.
    ///
    /// Fails when the parent is sterilized or cannot own children, when the
    /// child would break the nesting rules, or when the parent's
    /// `OperationCount` is already reached.
    pub fn add_sub_tx(&mut self, mut child: Transaction) -> Result<(), TxError> {
        if self.is_sterilized() {
            return Err(TxError::Sterilized);
        }
        if !self.tx_type.is_compound() {
            return Err(TxError::LocalCheckFailed(format!(
                "{} cannot own sub-transactions",
                self.tx_type
            )));
        }
        if child.tx_type.is_pseudo() {
            return Err(TxError::LocalCheckFailed(
                "pseudo-transaction cannot be a sub-transaction".into(),
            ));
        }
        check_template(
            child.tx_type,
            Scope::SubTransaction,
            &child.fields,
            !child.sub_txs.is_empty(),
        )
        .map_err(|e| TxError::LocalCheckFailed(format!("sub-transaction: {e}")))?;

        if let Ok(limit) = self.fields.get_u32(FieldId::OperationCount) {
            if self.sub_txs.len() >= limit as usize {
                return Err(TxError::LocalCheckFailed(format!(
                    "OperationCount {} reached",
                    limit
                )));
            }
        }

        child.id = None;
        self.sub_txs.push(child);
        Ok(())
    }

    /// Children in insertion order.
    pub fn sub_txs(&self) -> &[Transaction] {
        &self.sub_txs
    }
}

/// Flatten `tx` into the transactions that touch storage.
///
/// With `name_in_db` (hex), table-bearing entries that do not name that
/// table are dropped.
pub fn get_txs(
    tx: &Transaction,
    name_in_db: Option<&str>,
    contract_meta: Option<&ContractExecution>,
) -> Vec<Transaction> {
    let mut out: Vec<Transaction> = match tx.tx_type() {
        TxType::SqlTransaction => tx.sub_txs.clone(),
        TxType::Contract => {
            let mut all = tx.sub_txs.clone();
            if let Some(meta) = contract_meta {
                all.extend(meta.emitted.iter().cloned());
            }
            all
        }
        _ => vec![tx.clone()],
    };

    if let Some(name) = name_in_db {
        let wanted = hex::decode(name).ok();
        out.retain(|t| names_table(t, wanted.as_deref()));
    }
    out
}

fn names_table(tx: &Transaction, wanted: Option<&[u8]>) -> bool {
    let Ok(tables) = tx.fields().get_array(FieldId::Tables) else {
        return true;
    };
    let Some(wanted) = wanted else {
        return false;
    };
    tables.iter().any(|t| {
        t.fields
            .get_blob(FieldId::NameInDb)
            .map(|n| n == wanted)
            .unwrap_or(false)
    })
}
