//! Persistence lifecycle: status codes and the per-transaction record.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::builder::Transaction;
use super::codec;
use super::error::TxError;
use super::types::{TxId, TxType};
use crate::config::META_SQL_INSERT_REPLACE_HEADER;
use crate::identity::AccountId;

// ---------------------------------------------------------------------------
// TxStatus
// ---------------------------------------------------------------------------

/// Where a transaction stands relative to the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TxStatus {
    /// Seen, not yet applied.
    New,
    /// Conflicted with another transaction.
    Conflict,
    /// Held for a later ledger.
    Held,
    /// In a validated ledger.
    Validated,
    /// Included in a ledger that is not yet validated.
    Included,
    Unknown,
}

impl TxStatus {
    pub const ALL: [TxStatus; 6] = [
        Self::New,
        Self::Conflict,
        Self::Held,
        Self::Validated,
        Self::Included,
        Self::Unknown,
    ];

    pub const fn code(self) -> char {
        match self {
            Self::New => 'N',
            Self::Conflict => 'C',
            Self::Held => 'H',
            Self::Validated => 'V',
            Self::Included => 'I',
            Self::Unknown => 'U',
        }
    }

    /// Lenient lookup: anything outside the vocabulary is `Unknown`.
    pub fn from_code(code: char) -> Self {
        Self::try_from(code).unwrap_or(Self::Unknown)
    }

    /// Map an outcome label reported by the ledger engine.
    pub fn from_outcome(outcome: &str) -> Self {
        match outcome {
            "new" => Self::New,
            "conflict" => Self::Conflict,
            "held" => Self::Held,
            "validated" => Self::Validated,
            "included" => Self::Included,
            _ => Self::Unknown,
        }
    }
}

impl TryFrom<char> for TxStatus {
    type Error = TxError;

    fn try_from(code: char) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|s| s.code() == code)
            .ok_or(TxError::InvalidStatus(code))
    }
}

impl fmt::Display for TxStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

// ---------------------------------------------------------------------------
// MetaRecord
// ---------------------------------------------------------------------------

/// One row of the transaction table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaRecord {
    pub tx_id: TxId,
    pub tx_type: TxType,
    pub account: AccountId,
    pub sequence: u32,
    pub ledger_seq: u32,
    pub status: TxStatus,
    /// Full canonical bytes.
    pub raw: Vec<u8>,
    /// Opaque execution metadata.
    pub meta: Vec<u8>,
}

impl MetaRecord {
    /// The `VALUES` tuple matching [`META_SQL_INSERT_REPLACE_HEADER`].
    pub fn to_sql_values(&self) -> String {
        format!(
            "('{}', '{}', '{}', {}, {}, '{}', X'{}', X'{}')",
            self.tx_id.to_hex(),
            self.tx_type.name(),
            self.account,
            self.sequence,
            self.ledger_seq,
            self.status.code(),
            hex::encode_upper(&self.raw),
            hex::encode_upper(&self.meta),
        )
    }

    /// A complete `INSERT OR REPLACE` statement for this record.
    pub fn to_sql(&self) -> String {
        format!("{}{};", META_SQL_INSERT_REPLACE_HEADER, self.to_sql_values())
    }
}

/// Build the persistence record for a sterilized transaction.
pub fn get_meta_sql(
    tx: &Transaction,
    ledger_seq: u32,
    status: TxStatus,
    meta: &[u8],
) -> Result<MetaRecord, TxError> {
    Ok(MetaRecord {
        tx_id: tx.require_id()?,
        tx_type: tx.tx_type(),
        account: tx.account()?,
        sequence: tx.sequence()?,
        ledger_seq,
        status,
        raw: codec::encode(tx),
        meta: meta.to_vec(),
    })
}

/// [`get_meta_sql`] for a transaction in a validated ledger.
pub fn get_meta_sql_validated(
    tx: &Transaction,
    ledger_seq: u32,
    meta: &[u8],
) -> Result<MetaRecord, TxError> {
    get_meta_sql(tx, ledger_seq, TxStatus::Validated, meta)
}
