//! # TxDb - Transaction Record Store
//!
//! Persists [`MetaRecord`]s in sled's embedded key-value store.
//!
//! ## Tree Layout
//!
//! | Tree           | Key                                      | Value               |
//! |----------------|------------------------------------------|---------------------|
//! | `transactions` | `tx_id` (32B)                            | `bincode(MetaRecord)` |
//! | `account_txs`  | `account` (20B) `ledger` (4B BE) `seq` (4B BE) | `tx_id` (32B) |
//!
//! Ledger and sequence numbers are big-endian so that a prefix scan over an
//! account returns its transactions in ledger order.
//!
//! ## Atomicity
//!
//! An upsert writes the record and its index entry in one sled transaction
//! across both trees. Replacing a record moves its index entry; a record
//! whose raw bytes differ from the stored ones under the same id is refused.

use std::path::Path;

use sled::transaction::{ConflictableTransactionError, TransactionError};
use sled::{Db, Transactional, Tree};
use tracing::{debug, warn};

use crate::identity::AccountId;
use crate::transaction::{MetaRecord, TxError, TxId};

// ---------------------------------------------------------------------------
// Error Type
// ---------------------------------------------------------------------------

/// Errors that can occur during database operations.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("conflicting record for {0}")]
    Conflict(String),
}

pub type DbResult<T> = Result<T, DbError>;

impl From<TransactionError<DbError>> for DbError {
    fn from(e: TransactionError<DbError>) -> Self {
        match e {
            TransactionError::Abort(inner) => inner,
            TransactionError::Storage(inner) => DbError::Sled(inner),
        }
    }
}

impl From<DbError> for TxError {
    fn from(e: DbError) -> Self {
        TxError::PersistenceConflict(e.to_string())
    }
}

// ---------------------------------------------------------------------------
// TxStore
// ---------------------------------------------------------------------------

/// A session that persists transaction records, one atomic upsert each.
pub trait TxStore {
    /// Insert or replace the record keyed by its transaction id.
    fn upsert(&self, record: &MetaRecord) -> Result<(), TxError>;

    /// Look a record up by transaction id.
    fn get(&self, id: &TxId) -> Result<Option<MetaRecord>, TxError>;
}

// ---------------------------------------------------------------------------
// SledTxStore
// ---------------------------------------------------------------------------

/// sled-backed [`TxStore`].
///
/// sled trees are safe for concurrent use, so the store can be shared via
/// `Arc<SledTxStore>`.
#[derive(Debug, Clone)]
pub struct SledTxStore {
    db: Db,
    transactions: Tree,
    account_txs: Tree,
}

fn index_key(record: &MetaRecord) -> Vec<u8> {
    let mut key = Vec::with_capacity(28);
    key.extend_from_slice(record.account.as_bytes());
    key.extend_from_slice(&record.ledger_seq.to_be_bytes());
    key.extend_from_slice(&record.sequence.to_be_bytes());
    key
}

fn encode_record(record: &MetaRecord) -> DbResult<Vec<u8>> {
    bincode::serialize(record).map_err(|e| DbError::Serialization(e.to_string()))
}

fn decode_record(bytes: &[u8]) -> DbResult<MetaRecord> {
    bincode::deserialize(bytes).map_err(|e| DbError::Serialization(e.to_string()))
}

impl SledTxStore {
    /// Open or create a store at the given filesystem path.
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let db = sled::open(path)?;
        Self::from_db(db)
    }

    /// A store that lives in memory and disappears when dropped.
    pub fn open_temporary() -> DbResult<Self> {
        let db = sled::Config::new().temporary(true).open()?;
        Self::from_db(db)
    }

    fn from_db(db: Db) -> DbResult<Self> {
        let transactions = db.open_tree("transactions")?;
        let account_txs = db.open_tree("account_txs")?;
        Ok(Self {
            db,
            transactions,
            account_txs,
        })
    }

    fn put(&self, record: &MetaRecord) -> DbResult<()> {
        let value = encode_record(record)?;
        let new_index = index_key(record);
        let id = record.tx_id.0;

        (&self.transactions, &self.account_txs).transaction(|(txs, idx)| {
            if let Some(old) = txs.get(&id[..])? {
                let old = decode_record(&old).map_err(ConflictableTransactionError::Abort)?;
                if old.raw != record.raw {
                    return Err(ConflictableTransactionError::Abort(DbError::Conflict(
                        record.tx_id.to_hex(),
                    )));
                }
                idx.remove(index_key(&old))?;
            }
            txs.insert(&id[..], value.as_slice())?;
            idx.insert(new_index.as_slice(), &id[..])?;
            Ok(())
        })?;
        Ok(())
    }

    fn fetch(&self, id: &TxId) -> DbResult<Option<MetaRecord>> {
        self.transactions
            .get(id.as_bytes())?
            .map(|bytes| decode_record(&bytes))
            .transpose()
    }

    /// Every record `account` issued, in ledger then sequence order.
    pub fn by_account(&self, account: &AccountId) -> DbResult<Vec<MetaRecord>> {
        let mut out = Vec::new();
        for entry in self.account_txs.scan_prefix(account.as_bytes()) {
            let (_key, id) = entry?;
            let id: [u8; 32] = id
                .as_ref()
                .try_into()
                .map_err(|_| DbError::Serialization("invalid index entry".into()))?;
            if let Some(record) = self.fetch(&TxId(id))? {
                out.push(record);
            }
        }
        Ok(out)
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    /// Block until all pending writes are durable.
    pub fn flush(&self) -> DbResult<()> {
        self.db.flush()?;
        Ok(())
    }
}

impl TxStore for SledTxStore {
    fn upsert(&self, record: &MetaRecord) -> Result<(), TxError> {
        match self.put(record) {
            Ok(()) => {
                debug!(
                    tx_id = %record.tx_id,
                    ledger_seq = record.ledger_seq,
                    status = %record.status,
                    "transaction record stored"
                );
                Ok(())
            }
            Err(e) => {
                warn!(tx_id = %record.tx_id, error = %e, "transaction record rejected");
                Err(e.into())
            }
        }
    }

    fn get(&self, id: &TxId) -> Result<Option<MetaRecord>, TxError> {
        Ok(self.fetch(id)?)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::{get_meta_sql, sterilize, FieldId, Transaction, TxStatus, TxType};

    fn record(account: AccountId, seq: u32, ledger: u32, status: TxStatus) -> MetaRecord {
        let tx = Transaction::new(TxType::AccountSet, |f| {
            f.set_u32(FieldId::Sequence, seq)?;
            f.set_u64(FieldId::Fee, 10)?;
            f.set_account(FieldId::Account, account)?;
            f.set_blob(FieldId::SigningPubKey, Vec::new())
        })
        .unwrap();
        let tx = sterilize(&tx).unwrap();
        get_meta_sql(&tx, ledger, status, b"meta").unwrap()
    }

    #[test]
    fn open_temporary_store() {
        let store = SledTxStore::open_temporary().expect("should create temp store");
        assert!(store.is_empty());
    }

    #[test]
    fn open_persistent_store() {
        let dir = tempfile::tempdir().expect("tempdir");
        let rec = record(AccountId::from_bytes([1; 20]), 1, 10, TxStatus::Validated);
        {
            let store = SledTxStore::open(dir.path()).expect("should open store");
            store.upsert(&rec).unwrap();
            store.flush().unwrap();
        }
        let store = SledTxStore::open(dir.path()).expect("should reopen store");
        assert_eq!(store.get(&rec.tx_id).unwrap(), Some(rec));
    }

    #[test]
    fn upsert_replaces_and_moves_index() {
        let store = SledTxStore::open_temporary().unwrap();
        let account = AccountId::from_bytes([2; 20]);
        let held = record(account, 1, 5, TxStatus::Held);
        store.upsert(&held).unwrap();

        let mut validated = held.clone();
        validated.status = TxStatus::Validated;
        validated.ledger_seq = 6;
        store.upsert(&validated).unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(store.get(&held.tx_id).unwrap().unwrap().status, TxStatus::Validated);
        let listed = store.by_account(&account).unwrap();
        assert_eq!(listed, vec![validated]);
    }

    #[test]
    fn differing_raw_bytes_conflict() {
        let store = SledTxStore::open_temporary().unwrap();
        let rec = record(AccountId::from_bytes([3; 20]), 1, 5, TxStatus::New);
        store.upsert(&rec).unwrap();

        let mut forged = rec.clone();
        forged.raw.push(0);
        let err = store.upsert(&forged).unwrap_err();
        assert!(matches!(err, TxError::PersistenceConflict(_)));
        assert_eq!(store.get(&rec.tx_id).unwrap(), Some(rec));
    }

    #[test]
    fn by_account_is_ledger_ordered() {
        let store = SledTxStore::open_temporary().unwrap();
        let account = AccountId::from_bytes([4; 20]);
        let later = record(account, 2, 20, TxStatus::Validated);
        let earlier = record(account, 1, 10, TxStatus::Validated);
        let other = record(AccountId::from_bytes([5; 20]), 1, 1, TxStatus::Validated);
        store.upsert(&later).unwrap();
        store.upsert(&other).unwrap();
        store.upsert(&earlier).unwrap();

        let listed: Vec<u32> = store
            .by_account(&account)
            .unwrap()
            .iter()
            .map(|r| r.ledger_seq)
            .collect();
        assert_eq!(listed, vec![10, 20]);
    }

    #[test]
    fn missing_record_is_none() {
        let store = SledTxStore::open_temporary().unwrap();
        assert!(store.get(&TxId([0; 32])).unwrap().is_none());
    }
}
