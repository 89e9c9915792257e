//! Core type definitions for transactions.
//!
//! These types form the vocabulary of every transaction on the network.
//! They are intentionally small and `Copy` to stay off the heap on the
//! hot validation path.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::error::TxError;

// ---------------------------------------------------------------------------
// TxType
// ---------------------------------------------------------------------------

/// Discriminant for the operation a transaction represents.
///
/// The type determines which fields the template admits, whether the
/// transaction may own sub-transactions, and whether it may ever be
/// submitted from outside the node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TxType {
    /// Value transfer between two accounts.
    Payment,
    /// Account settings change.
    AccountSet,
    /// Create, drop or re-grant a table.
    TableListSet,
    /// A single SQL statement against a table.
    SqlStatement,
    /// Several SQL statements applied atomically.
    SqlTransaction,
    /// Smart-contract deployment or call.
    Contract,
    /// Ledger amendment marker (system-generated).
    Amendment,
    /// Fee schedule marker (system-generated).
    SetFee,
}

impl TxType {
    /// Every type, in code order.
    pub const ALL: [TxType; 8] = [
        Self::Payment,
        Self::AccountSet,
        Self::TableListSet,
        Self::SqlStatement,
        Self::SqlTransaction,
        Self::Contract,
        Self::Amendment,
        Self::SetFee,
    ];

    /// The 16-bit wire code.
    pub const fn code(self) -> u16 {
        match self {
            Self::Payment => 0,
            Self::AccountSet => 3,
            Self::TableListSet => 21,
            Self::SqlStatement => 22,
            Self::SqlTransaction => 23,
            Self::Contract => 30,
            Self::Amendment => 100,
            Self::SetFee => 101,
        }
    }

    /// Look up a wire code. Unknown codes are not defaulted.
    pub fn from_code(code: u16) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.code() == code)
    }

    /// The canonical name used in JSON and persistence records.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Payment => "Payment",
            Self::AccountSet => "AccountSet",
            Self::TableListSet => "TableListSet",
            Self::SqlStatement => "SQLStatement",
            Self::SqlTransaction => "SQLTransaction",
            Self::Contract => "Contract",
            Self::Amendment => "EnableAmendment",
            Self::SetFee => "SetFee",
        }
    }

    /// Table-family types carry a `Tables` array.
    pub fn is_table_type(self) -> bool {
        matches!(
            self,
            Self::TableListSet | Self::SqlStatement | Self::SqlTransaction
        )
    }

    pub fn is_contract_type(self) -> bool {
        self == Self::Contract
    }

    /// Types that may own sub-transactions. Single-statement table types
    /// carry their payload inline.
    pub fn is_compound(self) -> bool {
        matches!(self, Self::SqlTransaction | Self::Contract)
    }

    /// System-synthesized types that must never arrive from outside.
    pub fn is_pseudo(self) -> bool {
        matches!(self, Self::Amendment | Self::SetFee)
    }
}

impl fmt::Display for TxType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TxType {
    type Err = TxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.name() == s)
            .ok_or_else(|| TxError::UnknownType(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// TxId
// ---------------------------------------------------------------------------

/// A 256-bit transaction identity digest.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TxId(pub [u8; 32]);

impl TxId {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Upper-case hex, the form used in persistence records.
    pub fn to_hex(&self) -> String {
        hex::encode_upper(self.0)
    }
}

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TxId({})", self.to_hex())
    }
}
