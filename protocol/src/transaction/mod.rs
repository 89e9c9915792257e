//! # Transaction Module
//!
//! The canonical signed transaction: its fields, binary encoding, digests,
//! signatures, validity checks and persistence record.
//!
//! ## Architecture
//!
//! ```text
//! fields.rs        - Field registry and the ordered, typed FieldSet
//! formats.rs       - Per-type templates (required / optional fields)
//! codec.rs         - Canonical binary encode / decode
//! digest.rs        - Signing, multi-signing and identity digests
//! builder.rs       - The Transaction value and its construction paths
//! json.rs          - JSON form
//! signing.rs       - Single signatures and multi-sign entries
//! verification.rs  - check_sign, signer lists, parallel batch verification
//! sterilize.rs     - Encode/decode round trip that fixes the id
//! local_checks.rs  - Ledger-independent validity rules
//! subtx.rs         - Sub-transaction tree and storage flattening
//! lifecycle.rs     - Status codes and the persistence record
//! ```
//!
//! ## Transaction Lifecycle
//!
//! 1. **Build** from bytes, a field callback or JSON.
//! 2. **Sign** with [`sign_transaction`], or collect [`Signer`] entries.
//! 3. **Sterilize** with [`sterilize`]; only now is [`Transaction::id`] set.
//! 4. **Check** with [`passes_local_checks`] and [`check_sign`].
//! 5. **Record** with [`get_meta_sql`] and hand the [`MetaRecord`] to a
//!    [`crate::storage::TxStore`].

pub mod builder;
pub mod codec;
pub mod digest;
pub mod error;
pub mod fields;
pub mod formats;
pub mod json;
pub mod lifecycle;
pub mod local_checks;
pub mod signing;
pub mod sterilize;
pub mod subtx;
pub mod types;
pub mod verification;

pub use builder::Transaction;
pub use digest::{multi_signing_digest, signing_digest};
pub use error::{CheckResult, ErrorKind, TxError};
pub use fields::{FieldId, FieldSet, FieldType, FieldValue, InnerObject};
pub use lifecycle::{get_meta_sql, get_meta_sql_validated, MetaRecord, TxStatus};
pub use local_checks::{is_pseudo_tx, passes_local_checks};
pub use signing::{add_signer, sign_for, sign_transaction, signers, Signer};
pub use sterilize::sterilize;
pub use subtx::{get_txs, ContractExecution};
pub use types::{TxId, TxType};
pub use verification::{
    check_sign, verify_batch, MemorySignerLists, NoSignerLists, SignerEntry, SignerList,
    SignerListSource,
};
