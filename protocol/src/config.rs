//! # Protocol Configuration & Constants
//!
//! Every magic number in Tessera lives here. If you're hardcoding a constant
//! somewhere else, move it here.
//!
//! These values are part of the wire contract: the hash prefixes, field
//! limits and signer bounds feed directly into transaction identity. Changing
//! any of them after launch forks the network.

// ---------------------------------------------------------------------------
// Protocol Version
// ---------------------------------------------------------------------------

/// The full version string of the transaction model.
pub const PROTOCOL_VERSION: &str = "0.1.0";

// ---------------------------------------------------------------------------
// Hash Prefixes
// ---------------------------------------------------------------------------

/// Domain tag for the transaction identity digest: `"TXN\0"`.
pub const HASH_PREFIX_TRANSACTION_ID: [u8; 4] = *b"TXN\0";

/// Domain tag for the single-signer signing digest: `"STX\0"`.
pub const HASH_PREFIX_TX_SIGN: [u8; 4] = *b"STX\0";

/// Domain tag for the per-signer multi-signing digest: `"SMT\0"`.
pub const HASH_PREFIX_TX_MULTI_SIGN: [u8; 4] = *b"SMT\0";

// ---------------------------------------------------------------------------
// Cryptographic Parameters
// ---------------------------------------------------------------------------

/// Ed25519 secret key length in bytes.
pub const SIGNING_KEY_LENGTH: usize = 32;

/// Raw Ed25519 verifying key length in bytes.
pub const VERIFYING_KEY_LENGTH: usize = 32;

/// Wire length of a public key: one type byte followed by the raw key.
pub const PUBLIC_KEY_WIRE_LENGTH: usize = 33;

/// Type byte that marks an Ed25519 key on the wire.
pub const ED25519_KEY_PREFIX: u8 = 0xED;

/// Ed25519 signature length. Always 64 bytes.
pub const SIGNATURE_LENGTH: usize = 64;

/// Digest output length. SHA-512-half and BLAKE3 both give 32 bytes.
pub const HASH_OUTPUT_LENGTH: usize = 32;

/// Account identifiers are 20 bytes.
pub const ACCOUNT_ID_LENGTH: usize = 20;

/// Version byte prepended to account IDs before base58-check encoding.
pub const ACCOUNT_ADDRESS_VERSION: u8 = 0x00;

// ---------------------------------------------------------------------------
// Multi-signing
// ---------------------------------------------------------------------------

/// Fewest signers a multi-signed transaction may carry.
pub const MIN_MULTI_SIGNERS: usize = 1;

/// Most signers a multi-signed transaction may carry.
pub const MAX_MULTI_SIGNERS: usize = 8;

// ---------------------------------------------------------------------------
// Encoding Limits
// ---------------------------------------------------------------------------

/// Largest payload the variable-length prefix can describe.
pub const MAX_VL_LENGTH: usize = 918_744;

/// Maximum serialized size of the `Memos` array.
pub const MAX_MEMO_SIZE: usize = 1024;

// ---------------------------------------------------------------------------
// Persistence
// ---------------------------------------------------------------------------

/// Fixed statement header that precedes rendered persistence records.
pub const META_SQL_INSERT_REPLACE_HEADER: &str = "INSERT OR REPLACE INTO Transactions \
     (TransID, TransType, FromAcct, FromSeq, LedgerSeq, Status, RawTxn, TxnMeta) VALUES ";
